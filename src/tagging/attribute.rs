/// A named observation on one item of a sequence, with its value
///
/// This type is used both to build training corpora and to tag new input.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    /// Attribute name
    pub name: String,
    /// Value of the attribute
    pub value: f64,
}

impl Attribute {
    /// Create a new attribute with a name and value
    pub fn new<T: Into<String>>(name: T, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    /// Binary attribute with value `1.0`
    pub fn flag<T: Into<String>>(name: T) -> Self {
        Self::new(name, 1.0)
    }
}

impl From<String> for Attribute {
    fn from(name: String) -> Self {
        Self::flag(name)
    }
}

impl From<&str> for Attribute {
    fn from(name: &str) -> Self {
        Self::flag(name)
    }
}

impl<S: Into<String>> From<(S, f64)> for Attribute {
    fn from((name, value): (S, f64)) -> Self {
        Self::new(name, value)
    }
}

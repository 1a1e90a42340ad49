use super::features::{feature_difference, squared_norm};
use crate::traits::ExampleOutput;

/// An attribute id with its value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttributeValue {
    /// Attribute id
    pub id: u32,
    /// Value of the attribute
    pub value: f64,
}

impl AttributeValue {
    pub fn new(id: u32, value: f64) -> Self {
        Self { id, value }
    }
}

/// An item consists of an array of attributes
pub type Item = Vec<AttributeValue>;

/// Input of the tagging task: a sequence of items
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sequence {
    items: Vec<Item>,
}

impl Sequence {
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            items: Vec::with_capacity(cap),
        }
    }

    pub fn push(&mut self, item: Item) {
        self.items.push(item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }
}

impl From<Vec<Item>> for Sequence {
    fn from(items: Vec<Item>) -> Self {
        Self { items }
    }
}

/// Label ids of a sequence; `None` marks a position without annotation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Tags {
    labels: Vec<Option<u32>>,
}

impl Tags {
    /// Fully annotated tags
    pub fn new(labels: Vec<u32>) -> Self {
        Self {
            labels: labels.into_iter().map(Some).collect(),
        }
    }

    pub fn partial(labels: Vec<Option<u32>>) -> Self {
        Self { labels }
    }

    /// `len` positions, none of them annotated
    pub fn unknown(len: usize) -> Self {
        Self {
            labels: vec![None; len],
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, t: usize) -> Option<u32> {
        self.labels.get(t).copied().flatten()
    }

    pub fn is_annotated(&self, t: usize) -> bool {
        self.get(t).is_some()
    }

    pub fn is_complete(&self) -> bool {
        self.labels.iter().all(Option::is_some)
    }

    pub fn labels(&self) -> &[Option<u32>] {
        &self.labels
    }

    /// Label ids, if every position is annotated
    pub fn to_complete(&self) -> Option<Vec<u32>> {
        self.labels.iter().copied().collect()
    }

    /// Number of positions annotated in both and labeled differently
    pub fn hamming(&self, other: &Tags) -> usize {
        self.labels
            .iter()
            .zip(&other.labels)
            .filter(|(a, b)| matches!((a, b), (Some(a), Some(b)) if a != b))
            .count()
    }
}

impl ExampleOutput<Sequence> for Tags {
    fn create_new_object(&self) -> Self {
        Tags::unknown(self.len())
    }

    fn feature_vector_length_squared(&self, input: &Sequence, other: &Self) -> f64 {
        squared_norm(&feature_difference(input, self, other))
    }
}

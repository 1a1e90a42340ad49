use super::attribute::Attribute;
use super::dataset::{AttributeValue, Item, Sequence, Tags};
use super::dictionary::Dictionary;
use super::model::TaggerModel;
use crate::error::{Error, Result};

/// Training data for the tagging task, with the string dictionaries it was
/// interned through.
#[derive(Debug, Clone, Default)]
pub struct TaggingCorpus {
    attrs: Dictionary,
    labels: Dictionary,
    inputs: Vec<Sequence>,
    outputs: Vec<Tags>,
}

impl TaggingCorpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fully labeled sequence
    pub fn append<I, L>(&mut self, xseq: &[I], yseq: &[L]) -> Result<()>
    where
        I: AsRef<[Attribute]>,
        L: AsRef<str>,
    {
        let yseq: Vec<Option<&str>> = yseq.iter().map(|y| Some(y.as_ref())).collect();
        self.append_partial(xseq, &yseq)
    }

    /// Append a partially labeled sequence; `None` leaves a position
    /// unannotated.
    pub fn append_partial<I, L>(&mut self, xseq: &[I], yseq: &[Option<L>]) -> Result<()>
    where
        I: AsRef<[Attribute]>,
        L: AsRef<str>,
    {
        if xseq.len() != yseq.len() {
            return Err(Error::InvalidExample(format!(
                "xseq and yseq must have the same length ({} != {})",
                xseq.len(),
                yseq.len()
            )));
        }
        if xseq.is_empty() {
            return Err(Error::InvalidExample(
                "empty sequences are not allowed".to_string(),
            ));
        }

        let mut input = Sequence::with_capacity(xseq.len());
        for item in xseq {
            let item: Item = item
                .as_ref()
                .iter()
                .map(|attr| AttributeValue::new(self.attrs.get_or_insert(&attr.name), attr.value))
                .collect();
            input.push(item);
        }
        let output = Tags::partial(
            yseq.iter()
                .map(|y| y.as_ref().map(|y| self.labels.get_or_insert(y.as_ref())))
                .collect(),
        );

        self.inputs.push(input);
        self.outputs.push(output);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.attrs.clear();
        self.labels.clear();
        self.inputs.clear();
        self.outputs.clear();
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    pub fn inputs(&self) -> &[Sequence] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Tags] {
        &self.outputs
    }

    pub fn attributes(&self) -> &Dictionary {
        &self.attrs
    }

    pub fn labels(&self) -> &Dictionary {
        &self.labels
    }

    /// A zero-weight model sized for this corpus
    pub fn new_model(&self) -> TaggerModel {
        TaggerModel::new(self.attrs.len(), self.labels.len())
    }

    /// Intern an unlabeled sequence for tagging; unknown attributes are
    /// dropped.
    pub fn encode<I: AsRef<[Attribute]>>(&self, xseq: &[I]) -> Sequence {
        let mut input = Sequence::with_capacity(xseq.len());
        for item in xseq {
            let item: Item = item
                .as_ref()
                .iter()
                .filter_map(|attr| {
                    self.attrs
                        .id(&attr.name)
                        .map(|id| AttributeValue::new(id, attr.value))
                })
                .collect();
            input.push(item);
        }
        input
    }

    /// Label names of `tags`
    pub fn decode(&self, tags: &Tags) -> Vec<Option<&str>> {
        tags.labels()
            .iter()
            .map(|l| l.and_then(|l| self.labels.name(l)))
            .collect()
    }
}

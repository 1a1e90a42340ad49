use super::attribute::Attribute;
use super::corpus::TaggingCorpus;
use super::inference::ViterbiInference;
use super::model::TaggerModel;
use crate::error::{Error, Result};
use crate::traits::Inference;

/// The tagger predicts label sequences for attribute sequences with a
/// trained model
#[derive(Debug, Clone, Copy)]
pub struct Tagger<'a> {
    model: &'a TaggerModel,
    corpus: &'a TaggingCorpus,
}

impl<'a> Tagger<'a> {
    /// `corpus` supplies the dictionaries `model` was trained with.
    pub fn new(model: &'a TaggerModel, corpus: &'a TaggingCorpus) -> Self {
        Self { model, corpus }
    }

    /// Predict the label sequence for the item sequence.
    pub fn tag<T: AsRef<[Attribute]>>(&self, xseq: &[T]) -> Result<Vec<&'a str>> {
        if xseq.is_empty() {
            return Ok(Vec::new());
        }

        let input = self.corpus.encode(xseq);
        let tags = ViterbiInference.inference(self.model, &input)?;
        tags.labels()
            .iter()
            .map(|l| {
                l.and_then(|l| self.corpus.labels().name(l))
                    .ok_or_else(|| Error::Inference(format!("unknown label id {:?}", l)))
            })
            .collect()
    }
}

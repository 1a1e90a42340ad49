use rand::rngs::StdRng;
use rand::seq::{index, SliceRandom};

use crate::error::{Error, Result};

/// Positionally aligned inputs and outputs.
#[derive(Debug)]
pub struct Corpus<'a, I, O> {
    inputs: &'a [I],
    outputs: &'a [O],
}

// Manual impls: deriving would require `I: Clone` and `O: Clone`.
impl<'a, I, O> Clone for Corpus<'a, I, O> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, I, O> Copy for Corpus<'a, I, O> {}

impl<'a, I, O> Corpus<'a, I, O> {
    pub fn new(inputs: &'a [I], outputs: &'a [O]) -> Result<Self> {
        if inputs.len() != outputs.len() {
            return Err(Error::DatasetMismatch {
                inputs: inputs.len(),
                outputs: outputs.len(),
            });
        }
        Ok(Self { inputs, outputs })
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    pub fn get(&self, index: usize) -> (&'a I, &'a O) {
        (&self.inputs[index], &self.outputs[index])
    }
}

/// A second corpus mixed into training with its own sampling weight.
///
/// At epoch `e` the effective weight is `max(0, weight + e * weight_step)`
/// and `round(weight_e * len)` of its examples join the epoch.
#[derive(Debug)]
pub struct WeightedCorpus<'a, I, O> {
    corpus: Corpus<'a, I, O>,
    weight: f64,
    weight_step: f64,
}

impl<'a, I, O> WeightedCorpus<'a, I, O> {
    pub fn new(corpus: Corpus<'a, I, O>, weight: f64, weight_step: f64) -> Result<Self> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(Error::InvalidParameter(
                "corpus weight must be non-negative".to_string(),
            ));
        }
        if !weight_step.is_finite() {
            return Err(Error::InvalidParameter(
                "corpus weight step must be finite".to_string(),
            ));
        }
        Ok(Self {
            corpus,
            weight,
            weight_step,
        })
    }

    pub fn corpus(&self) -> &Corpus<'a, I, O> {
        &self.corpus
    }

    pub fn weight_at(&self, epoch: usize) -> f64 {
        (self.weight + epoch as f64 * self.weight_step).max(0.0)
    }

    /// Number of examples drawn at `epoch`.
    pub fn sample_size(&self, epoch: usize) -> usize {
        (self.weight_at(epoch) * self.corpus.len() as f64).round() as usize
    }
}

/// Location of an example in one of the corpora of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExampleRef {
    Primary(usize),
    Secondary(usize),
}

/// Processing order of one epoch.
///
/// Primary examples come in identity order followed by the sampled secondary
/// examples; the whole list is shuffled when `rng` is given. All randomness
/// comes from `rng`, so a seeded generator reproduces the order exactly.
pub(crate) fn epoch_order(
    primary_len: usize,
    secondary: Option<(usize, usize)>,
    mut rng: Option<&mut StdRng>,
) -> Vec<ExampleRef> {
    let mut order: Vec<ExampleRef> = (0..primary_len).map(ExampleRef::Primary).collect();

    if let Some((len, count)) = secondary {
        if len > 0 && count > 0 {
            for _ in 0..count / len {
                order.extend((0..len).map(ExampleRef::Secondary));
            }
            let remainder = count % len;
            if remainder > 0 {
                match rng.as_deref_mut() {
                    Some(rng) => order.extend(
                        index::sample(rng, len, remainder)
                            .into_iter()
                            .map(ExampleRef::Secondary),
                    ),
                    None => order.extend((0..remainder).map(ExampleRef::Secondary)),
                }
            }
        }
    }

    if let Some(rng) = rng {
        if order.len() > 1 {
            order.shuffle(rng);
        }
    }
    order
}

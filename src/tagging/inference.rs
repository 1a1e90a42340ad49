use super::dataset::{Sequence, Tags};
use super::lattice::Lattice;
use super::model::TaggerModel;
use crate::error::{Error, Result};
use crate::traits::{Inference, UpdateTargetSelector};

/// Viterbi search for [`TaggerModel`].
///
/// The loss of the loss-augmented searches is the Hamming distance to the
/// reference, which decomposes over positions and so folds into the state
/// scores of the lattice.
#[derive(Debug, Clone, Copy, Default)]
pub struct ViterbiInference;

impl ViterbiInference {
    pub fn new() -> Self {
        ViterbiInference
    }

    fn decode(model: &TaggerModel, mut lattice: Lattice) -> Result<Tags> {
        lattice
            .viterbi(model.transition_weights())
            .map(|(labels, _)| Tags::new(labels))
            .ok_or_else(|| Error::Inference("no label sequence has a finite score".to_string()))
    }

    /// Add `weight` to every label at `t` that differs from `reference`.
    fn add_hamming(lattice: &mut Lattice, t: usize, reference: u32, weight: f64) {
        for (l, score) in lattice.state.row_mut(t).iter_mut().enumerate() {
            if l != reference as usize {
                *score += weight;
            }
        }
    }
}

impl Inference<Sequence, Tags, TaggerModel> for ViterbiInference {
    fn inference(&self, model: &TaggerModel, input: &Sequence) -> Result<Tags> {
        Self::decode(model, Lattice::new(model.state_scores(input)))
    }

    fn partial_inference(
        &self,
        model: &TaggerModel,
        input: &Sequence,
        partial: &Tags,
    ) -> Result<Tags> {
        model.check_tags(input, partial)?;
        let mut lattice = Lattice::new(model.state_scores(input));
        for (t, label) in partial.labels().iter().enumerate() {
            if let Some(label) = *label {
                lattice.constrain(t, label);
            }
        }
        Self::decode(model, lattice)
    }

    fn loss_augmented_inference(
        &self,
        model: &TaggerModel,
        input: &Sequence,
        reference: &Tags,
        loss_weight: f64,
    ) -> Result<Tags> {
        model.check_tags(input, reference)?;
        let mut lattice = Lattice::new(model.state_scores(input));
        for (t, label) in reference.labels().iter().enumerate() {
            if let Some(label) = *label {
                Self::add_hamming(&mut lattice, t, label, loss_weight);
            }
        }
        Self::decode(model, lattice)
    }

    fn loss_augmented_inference_weighted(
        &self,
        model: &TaggerModel,
        input: &Sequence,
        partial: &Tags,
        reference: &Tags,
        annotated_weight: f64,
        non_annotated_weight: f64,
    ) -> Result<Tags> {
        model.check_tags(input, partial)?;
        model.check_tags(input, reference)?;
        let mut lattice = Lattice::new(model.state_scores(input));
        for (t, label) in reference.labels().iter().enumerate() {
            if let Some(label) = *label {
                let weight = if partial.is_annotated(t) {
                    annotated_weight
                } else {
                    non_annotated_weight
                };
                Self::add_hamming(&mut lattice, t, label, weight);
            }
        }
        Self::decode(model, lattice)
    }

    /// `score(selected) - score(reference) + sqrt(hamming(reference, selected))`,
    /// zero when the selected output agrees with the reference.
    fn calculate_suffer_loss(
        &self,
        model: &TaggerModel,
        input: &Sequence,
        reference: &Tags,
        predicted: &Tags,
        selector: &dyn UpdateTargetSelector<Tags>,
    ) -> f64 {
        let selected = selector.select(reference, predicted);
        let num_diff = reference.hamming(selected);
        if num_diff == 0 {
            return 0.0;
        }
        model.score(input, selected) - model.score(input, reference) + (num_diff as f64).sqrt()
    }
}

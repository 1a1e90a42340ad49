use ndarray::Array2;

use super::dataset::{Sequence, Tags};
use super::features::{feature_difference, FeatureKey};
use crate::error::{Error, Result};
use crate::traits::Model;

/// Weights of a first-order linear-chain tagger.
///
/// State weights form an `[attributes][labels]` matrix, transition weights a
/// `[labels][labels]` matrix. Averaging is lazy: every update adds
/// `k * delta` to a second accumulator, where `k` is the number of examples
/// processed before it, so `w - sum / n` is the mean of the `n` per-example
/// weight snapshots.
#[derive(Debug, Clone, PartialEq)]
pub struct TaggerModel {
    state: Array2<f64>,
    trans: Array2<f64>,
    summed_state: Array2<f64>,
    summed_trans: Array2<f64>,
    steps: u64,
}

impl TaggerModel {
    pub fn new(num_attrs: usize, num_labels: usize) -> Self {
        Self {
            state: Array2::zeros((num_attrs, num_labels)),
            trans: Array2::zeros((num_labels, num_labels)),
            summed_state: Array2::zeros((num_attrs, num_labels)),
            summed_trans: Array2::zeros((num_labels, num_labels)),
            steps: 0,
        }
    }

    pub fn num_attrs(&self) -> usize {
        self.state.nrows()
    }

    pub fn num_labels(&self) -> usize {
        self.trans.nrows()
    }

    pub fn state_weights(&self) -> &Array2<f64> {
        &self.state
    }

    pub fn transition_weights(&self) -> &Array2<f64> {
        &self.trans
    }

    /// L2 norm of all weights
    pub fn feature_norm(&self) -> f64 {
        self.state
            .iter()
            .chain(self.trans.iter())
            .map(|w| w * w)
            .sum::<f64>()
            .sqrt()
    }

    /// `[T][L]` state scores of `seq`. Attributes unknown to the model are
    /// ignored.
    pub fn state_scores(&self, seq: &Sequence) -> Array2<f64> {
        let num_labels = self.num_labels();
        let mut scores = Array2::zeros((seq.len(), num_labels));
        for (t, item) in seq.items().iter().enumerate() {
            let mut row = scores.row_mut(t);
            for attr in item {
                let aid = attr.id as usize;
                if aid < self.num_attrs() {
                    row.scaled_add(attr.value, &self.state.row(aid));
                }
            }
        }
        scores
    }

    /// Score of `tags` on `seq`; unannotated positions contribute nothing.
    pub fn score(&self, seq: &Sequence, tags: &Tags) -> f64 {
        let mut score = 0.0;
        for (t, item) in seq.items().iter().enumerate().take(tags.len()) {
            if let Some(label) = tags.get(t) {
                let lid = label as usize;
                if lid >= self.num_labels() {
                    continue;
                }
                for attr in item {
                    let aid = attr.id as usize;
                    if aid < self.num_attrs() {
                        score += self.state[[aid, lid]] * attr.value;
                    }
                }
                if t > 0 {
                    if let Some(prev) = tags.get(t - 1) {
                        if (prev as usize) < self.num_labels() {
                            score += self.trans[[prev as usize, lid]];
                        }
                    }
                }
            }
        }
        score
    }

    pub(crate) fn check_tags(&self, seq: &Sequence, tags: &Tags) -> Result<()> {
        if tags.len() != seq.len() {
            return Err(Error::Model(format!(
                "tag sequence has {} positions, input has {}",
                tags.len(),
                seq.len()
            )));
        }
        if let Some(label) = tags
            .labels()
            .iter()
            .flatten()
            .find(|&&l| l as usize >= self.num_labels())
        {
            return Err(Error::Model(format!("label id {} out of range", label)));
        }
        Ok(())
    }

    fn check_feature(&self, key: &FeatureKey) -> Result<()> {
        let in_range = match *key {
            FeatureKey::State { attr, .. } => (attr as usize) < self.num_attrs(),
            FeatureKey::Transition { .. } => true,
        };
        if in_range {
            Ok(())
        } else {
            Err(Error::Model(format!("feature {:?} out of range", key)))
        }
    }
}

impl Model<Sequence, Tags> for TaggerModel {
    fn update(
        &mut self,
        input: &Sequence,
        target: &Tags,
        predicted: &Tags,
        rate: f64,
    ) -> Result<f64> {
        self.check_tags(input, target)?;
        self.check_tags(input, predicted)?;
        let diff = feature_difference(input, target, predicted);
        for key in diff.keys() {
            self.check_feature(key)?;
        }

        let k = self.steps as f64;
        for (key, value) in diff {
            let delta = rate * value;
            match key {
                FeatureKey::State { attr, label } => {
                    let idx = [attr as usize, label as usize];
                    self.state[idx] += delta;
                    self.summed_state[idx] += k * delta;
                }
                FeatureKey::Transition { prev, label } => {
                    let idx = [prev as usize, label as usize];
                    self.trans[idx] += delta;
                    self.summed_trans[idx] += k * delta;
                }
            }
        }

        Ok(target.hamming(predicted) as f64)
    }

    fn sum_updates(&mut self, iteration: u64) {
        self.steps = iteration;
    }

    fn average(&mut self, iterations: u64) {
        if iterations == 0 {
            return;
        }
        let scale = -1.0 / iterations as f64;
        self.state.scaled_add(scale, &self.summed_state);
        self.trans.scaled_add(scale, &self.summed_trans);
        self.summed_state.fill(0.0);
        self.summed_trans.fill(0.0);
        self.steps = 0;
    }
}

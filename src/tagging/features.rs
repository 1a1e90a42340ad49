use std::collections::BTreeMap;

use super::dataset::{Sequence, Tags};

/// A feature of the linear-chain model
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FeatureKey {
    /// State feature: (attribute, label)
    State { attr: u32, label: u32 },
    /// Transition feature: (previous label, label)
    Transition { prev: u32, label: u32 },
}

/// Sparse feature vector, ordered by key so iteration is deterministic.
pub type FeatureVector = BTreeMap<FeatureKey, f64>;

/// Add `scale * phi(seq, tags)` to `counts`.
///
/// State features fire with the attribute value, transition features with
/// `1.0`. Positions without a label contribute nothing, nor do transitions
/// touching them.
pub fn accumulate(seq: &Sequence, tags: &Tags, scale: f64, counts: &mut FeatureVector) {
    let seq_len = seq.len().min(tags.len());

    for (t, item) in seq.items().iter().enumerate().take(seq_len) {
        if let Some(label) = tags.get(t) {
            for attr in item {
                *counts
                    .entry(FeatureKey::State {
                        attr: attr.id,
                        label,
                    })
                    .or_insert(0.0) += scale * attr.value;
            }
        }
    }

    for t in 1..seq_len {
        if let (Some(prev), Some(label)) = (tags.get(t - 1), tags.get(t)) {
            *counts
                .entry(FeatureKey::Transition { prev, label })
                .or_insert(0.0) += scale;
        }
    }
}

/// `phi(seq, a) - phi(seq, b)` with zero entries removed.
pub fn feature_difference(seq: &Sequence, a: &Tags, b: &Tags) -> FeatureVector {
    let mut diff = FeatureVector::new();
    accumulate(seq, a, 1.0, &mut diff);
    accumulate(seq, b, -1.0, &mut diff);
    diff.retain(|_, v| *v != 0.0);
    diff
}

pub fn squared_norm(features: &FeatureVector) -> f64 {
    features.values().map(|v| v * v).sum()
}

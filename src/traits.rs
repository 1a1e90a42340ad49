//! Capability contracts supplied by a task domain.
//!
//! The training engine never inspects inputs, outputs or weights directly. A
//! task (sequence tagging, dependency parsing, coreference) implements these
//! traits and the update strategies in [`crate::train`] drive them.

use crate::error::Result;

/// A structured label assignment over an input of type `I`.
///
/// Outputs may be partially annotated; what "unknown" means is up to the
/// task, the engine only forwards such outputs to
/// [`Inference::partial_inference`].
pub trait ExampleOutput<I: ?Sized>: Clone {
    /// A blank output with the same shape as `self`.
    fn create_new_object(&self) -> Self;

    /// Squared Euclidean norm of `phi(input, self) - phi(input, other)`.
    fn feature_vector_length_squared(&self, input: &I, other: &Self) -> f64;
}

/// Weight vector of a structured linear model plus the bookkeeping needed for
/// iterate averaging.
pub trait Model<I: ?Sized, O>: Clone {
    /// Move the weights by `rate * (phi(input, target) - phi(input, predicted))`
    /// and return the loss between the two outputs for reporting.
    ///
    /// This is the only place weights change. An `Err` must leave the weights
    /// untouched.
    fn update(&mut self, input: &I, target: &O, predicted: &O, rate: f64) -> Result<f64>;

    /// Record that example number `iteration` (1-based, counted across epochs)
    /// has been processed. Called exactly once per example, after `update`.
    fn sum_updates(&mut self, iteration: u64);

    /// Replace the weights with the mean of the per-iteration weight snapshots.
    fn average(&mut self, iterations: u64);
}

/// Picks which of `reference` and `predicted` the margin is measured against.
pub trait UpdateTargetSelector<O> {
    fn select<'a>(&self, reference: &'a O, predicted: &'a O) -> &'a O;
}

/// Always nominates the predicted output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PredictionBasedUpdate;

impl<O> UpdateTargetSelector<O> for PredictionBasedUpdate {
    fn select<'a>(&self, _reference: &'a O, predicted: &'a O) -> &'a O {
        predicted
    }
}

/// Task-supplied search over outputs.
///
/// Implementations hold no per-example state between calls and must be
/// deterministic: the same model and input always give the same output, and
/// ties in every search are broken in a fixed structural order.
pub trait Inference<I: ?Sized, O, M> {
    /// Highest scoring output under `model`.
    fn inference(&self, model: &M, input: &I) -> Result<O>;

    /// Complete `partial` by filling its unknown positions with the highest
    /// scoring assignment. Annotated positions of the result must equal the
    /// corresponding positions of `partial`.
    fn partial_inference(&self, model: &M, input: &I, partial: &O) -> Result<O>;

    /// Output maximizing `score(output) + loss_weight * loss(output, reference)`.
    fn loss_augmented_inference(
        &self,
        model: &M,
        input: &I,
        reference: &O,
        loss_weight: f64,
    ) -> Result<O>;

    /// Like [`loss_augmented_inference`](Self::loss_augmented_inference), but
    /// positions annotated in `partial` weigh their loss by
    /// `annotated_weight` and the remaining positions by
    /// `non_annotated_weight`. The loss is measured against `reference`, the
    /// completion of `partial`.
    fn loss_augmented_inference_weighted(
        &self,
        model: &M,
        input: &I,
        partial: &O,
        reference: &O,
        annotated_weight: f64,
        non_annotated_weight: f64,
    ) -> Result<O>;

    /// Passive-Aggressive suffer loss of `predicted` against `reference`,
    /// measured on the side nominated by `selector`.
    fn calculate_suffer_loss(
        &self,
        model: &M,
        input: &I,
        reference: &O,
        predicted: &O,
        selector: &dyn UpdateTargetSelector<O>,
    ) -> f64;
}

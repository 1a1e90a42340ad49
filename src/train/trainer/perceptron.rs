use std::borrow::Cow;

use super::{StepContext, UpdateStrategy};
use crate::error::{Error, Result};
use crate::traits::{ExampleOutput, Inference, Model};

/// Builds the pair of outputs a Perceptron update moves between.
///
/// `correct` is the training output as given, `reference` is `correct`
/// completed by partial inference when partial annotation is enabled (and
/// `correct` itself otherwise). The returned pair is `(target, predicted)`:
/// the update moves the weights toward `target` and away from `predicted`.
pub trait PredictionStrategy<I, O: Clone, M, F: ?Sized> {
    fn name(&self) -> &'static str;

    fn begin_epoch(&mut self, _epoch: usize) {}

    fn predict<'r>(
        &self,
        inference: &F,
        model: &M,
        input: &I,
        correct: &'r O,
        reference: &'r O,
    ) -> Result<(Cow<'r, O>, O)>;
}

/// Target is the reference, prediction is the plain best output.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Plain;

impl<I, O, M, F> PredictionStrategy<I, O, M, F> for Plain
where
    O: Clone,
    F: Inference<I, O, M> + ?Sized,
{
    fn name(&self) -> &'static str {
        "Perceptron"
    }

    fn predict<'r>(
        &self,
        inference: &F,
        model: &M,
        input: &I,
        _correct: &'r O,
        reference: &'r O,
    ) -> Result<(Cow<'r, O>, O)> {
        let predicted = inference.inference(model, input)?;
        Ok((Cow::Borrowed(reference), predicted))
    }
}

/// Target is the reference, prediction maximizes
/// `score + loss_weight * loss(output, reference)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LossAugmented {
    loss_weight: f64,
}

impl LossAugmented {
    pub fn new(loss_weight: f64) -> Result<Self> {
        Ok(Self {
            loss_weight: check_weight("loss_weight", loss_weight)?,
        })
    }

    pub fn loss_weight(&self) -> f64 {
        self.loss_weight
    }
}

impl<I, O, M, F> PredictionStrategy<I, O, M, F> for LossAugmented
where
    O: Clone,
    F: Inference<I, O, M> + ?Sized,
{
    fn name(&self) -> &'static str {
        "Loss-Augmented Perceptron"
    }

    fn predict<'r>(
        &self,
        inference: &F,
        model: &M,
        input: &I,
        _correct: &'r O,
        reference: &'r O,
    ) -> Result<(Cow<'r, O>, O)> {
        let predicted =
            inference.loss_augmented_inference(model, input, reference, self.loss_weight)?;
        Ok((Cow::Borrowed(reference), predicted))
    }
}

/// Loss weight of positions left unannotated in a partially labeled output.
///
/// At epoch `e` the weight is `initial + e * step`, never more than the
/// annotated loss weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NonAnnotatedWeight {
    initial: f64,
    step: f64,
}

impl NonAnnotatedWeight {
    pub fn new(initial: f64, step: f64) -> Result<Self> {
        Ok(Self {
            initial: check_weight("loss_non_annotated_weight", initial)?,
            step: check_weight("loss_non_annotated_weight_step", step)?,
        })
    }

    pub fn at_epoch(&self, epoch: usize, annotated_weight: f64) -> f64 {
        (self.initial + epoch as f64 * self.step).min(annotated_weight)
    }
}

/// Shared state of the two direct-loss variants.
#[derive(Debug, Clone, Copy, PartialEq)]
struct DirectLoss {
    loss_weight: f64,
    non_annotated: Option<NonAnnotatedWeight>,
    non_annotated_weight: Option<f64>,
}

impl DirectLoss {
    fn new(loss_weight: f64) -> Result<Self> {
        Ok(Self {
            loss_weight: check_weight("loss_weight", loss_weight)?,
            non_annotated: None,
            non_annotated_weight: None,
        })
    }

    fn begin_epoch(&mut self, epoch: usize) {
        self.non_annotated_weight = self
            .non_annotated
            .map(|w| w.at_epoch(epoch, self.loss_weight));
    }

    /// Loss-augmented inference with every weight multiplied by `sign`.
    fn augmented<I, O, M, F>(
        &self,
        sign: f64,
        inference: &F,
        model: &M,
        input: &I,
        correct: &O,
        reference: &O,
    ) -> Result<O>
    where
        F: Inference<I, O, M> + ?Sized,
    {
        match self.non_annotated_weight {
            Some(non_annotated) => inference.loss_augmented_inference_weighted(
                model,
                input,
                correct,
                reference,
                sign * self.loss_weight,
                sign * non_annotated,
            ),
            None => {
                inference.loss_augmented_inference(model, input, reference, sign * self.loss_weight)
            }
        }
    }
}

/// Moves toward a "better" output, the best under
/// `score - loss_weight * loss(output, reference)`, and away from the plain
/// best prediction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TowardBetter {
    inner: DirectLoss,
}

impl TowardBetter {
    pub fn new(loss_weight: f64) -> Result<Self> {
        Ok(Self {
            inner: DirectLoss::new(loss_weight)?,
        })
    }

    /// Weigh the loss at unannotated positions separately.
    pub fn with_non_annotated_weight(mut self, weight: NonAnnotatedWeight) -> Self {
        self.inner.non_annotated = Some(weight);
        self.inner.begin_epoch(0);
        self
    }

    pub fn loss_weight(&self) -> f64 {
        self.inner.loss_weight
    }

    /// Non-annotated loss weight in effect for the current epoch.
    pub fn non_annotated_weight(&self) -> Option<f64> {
        self.inner.non_annotated_weight
    }
}

impl<I, O, M, F> PredictionStrategy<I, O, M, F> for TowardBetter
where
    O: Clone,
    F: Inference<I, O, M> + ?Sized,
{
    fn name(&self) -> &'static str {
        "Toward-Better Perceptron"
    }

    fn begin_epoch(&mut self, epoch: usize) {
        self.inner.begin_epoch(epoch);
    }

    fn predict<'r>(
        &self,
        inference: &F,
        model: &M,
        input: &I,
        correct: &'r O,
        reference: &'r O,
    ) -> Result<(Cow<'r, O>, O)> {
        let worse = inference.inference(model, input)?;
        let better = self
            .inner
            .augmented(-1.0, inference, model, input, correct, reference)?;
        Ok((Cow::Owned(better), worse))
    }
}

/// Moves toward the plain best prediction and away from a "worse" output,
/// the best under `score + loss_weight * loss(output, reference)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AwayFromWorse {
    inner: DirectLoss,
}

impl AwayFromWorse {
    pub fn new(loss_weight: f64) -> Result<Self> {
        Ok(Self {
            inner: DirectLoss::new(loss_weight)?,
        })
    }

    /// Weigh the loss at unannotated positions separately.
    pub fn with_non_annotated_weight(mut self, weight: NonAnnotatedWeight) -> Self {
        self.inner.non_annotated = Some(weight);
        self.inner.begin_epoch(0);
        self
    }

    pub fn loss_weight(&self) -> f64 {
        self.inner.loss_weight
    }

    pub fn non_annotated_weight(&self) -> Option<f64> {
        self.inner.non_annotated_weight
    }
}

impl<I, O, M, F> PredictionStrategy<I, O, M, F> for AwayFromWorse
where
    O: Clone,
    F: Inference<I, O, M> + ?Sized,
{
    fn name(&self) -> &'static str {
        "Away-From-Worse Perceptron"
    }

    fn begin_epoch(&mut self, epoch: usize) {
        self.inner.begin_epoch(epoch);
    }

    fn predict<'r>(
        &self,
        inference: &F,
        model: &M,
        input: &I,
        correct: &'r O,
        reference: &'r O,
    ) -> Result<(Cow<'r, O>, O)> {
        let best = inference.inference(model, input)?;
        let worse = self
            .inner
            .augmented(1.0, inference, model, input, correct, reference)?;
        Ok((Cow::Owned(best), worse))
    }
}

fn check_weight(name: &str, weight: f64) -> Result<f64> {
    if !weight.is_finite() || weight < 0.0 {
        return Err(Error::InvalidParameter(format!(
            "{} must be non-negative",
            name
        )));
    }
    Ok(weight)
}

/// Perceptron update rule, parameterized by how the target and the
/// prediction are obtained.
#[derive(Debug, Clone, PartialEq)]
pub struct Perceptron<P> {
    prediction: P,
    partial_annotation: bool,
}

impl<P> Perceptron<P> {
    pub fn new(prediction: P) -> Self {
        Self {
            prediction,
            partial_annotation: false,
        }
    }

    /// Complete partially annotated outputs with partial inference before
    /// using them as reference.
    pub fn with_partial_annotation(mut self, enabled: bool) -> Self {
        self.partial_annotation = enabled;
        self
    }

    pub fn partial_annotation(&self) -> bool {
        self.partial_annotation
    }

    pub fn prediction(&self) -> &P {
        &self.prediction
    }
}

impl Perceptron<Plain> {
    pub fn plain() -> Self {
        Self::new(Plain)
    }
}

impl Perceptron<LossAugmented> {
    pub fn loss_augmented(loss_weight: f64) -> Result<Self> {
        Ok(Self::new(LossAugmented::new(loss_weight)?))
    }
}

impl Perceptron<TowardBetter> {
    pub fn toward_better(loss_weight: f64) -> Result<Self> {
        Ok(Self::new(TowardBetter::new(loss_weight)?))
    }
}

impl Perceptron<AwayFromWorse> {
    pub fn away_from_worse(loss_weight: f64) -> Result<Self> {
        Ok(Self::new(AwayFromWorse::new(loss_weight)?))
    }
}

impl<I, O, M, F, P> UpdateStrategy<I, O, M, F> for Perceptron<P>
where
    O: ExampleOutput<I>,
    M: Model<I, O>,
    F: Inference<I, O, M> + ?Sized,
    P: PredictionStrategy<I, O, M, F>,
{
    fn name(&self) -> &'static str {
        self.prediction.name()
    }

    fn begin_epoch(&mut self, epoch: usize) {
        self.prediction.begin_epoch(epoch);
    }

    fn train_one_example(
        &mut self,
        inference: &F,
        model: &mut M,
        input: &I,
        output: &O,
        step: &StepContext,
    ) -> Result<f64> {
        let reference = if self.partial_annotation {
            Cow::Owned(inference.partial_inference(model, input, output)?)
        } else {
            Cow::Borrowed(output)
        };
        let (target, predicted) = self
            .prediction
            .predict(inference, model, input, output, &reference)?;

        // Updates run even for a zero loss so the averaging sums stay aligned.
        let loss = model.update(input, &target, &predicted, step.learning_rate)?;
        model.sum_updates(step.iteration);
        Ok(loss)
    }
}

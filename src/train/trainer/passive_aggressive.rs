use std::borrow::Cow;

use super::{StepContext, UpdateStrategy};
use crate::error::{Error, Result};
use crate::traits::{ExampleOutput, Inference, Model, PredictionBasedUpdate, UpdateTargetSelector};

/// Step size (`tau`) of a Passive-Aggressive update.
pub trait StepSize {
    fn name(&self) -> &'static str;

    /// `suffer_loss` is the structural loss of the prediction, `dist_sq` the
    /// squared norm of the feature difference between reference and
    /// prediction.
    fn tau(&self, suffer_loss: f64, dist_sq: f64) -> f64;
}

/// PA (no slack): `tau = loss / ||diff||^2`, zero when `||diff||^2 == 0`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Pa;

impl StepSize for Pa {
    fn name(&self) -> &'static str {
        "PA"
    }

    fn tau(&self, suffer_loss: f64, dist_sq: f64) -> f64 {
        if dist_sq == 0.0 {
            0.0
        } else {
            suffer_loss / dist_sq
        }
    }
}

/// PA-I (soft margin): `tau = min(C, loss / ||diff||^2)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaI {
    c: f64,
}

impl PaI {
    pub fn new(c: f64) -> Result<Self> {
        Ok(Self {
            c: check_aggressiveness(c)?,
        })
    }

    pub fn c(&self) -> f64 {
        self.c
    }
}

impl StepSize for PaI {
    fn name(&self) -> &'static str {
        "PA-I"
    }

    fn tau(&self, suffer_loss: f64, dist_sq: f64) -> f64 {
        Pa.tau(suffer_loss, dist_sq).min(self.c)
    }
}

/// PA-II (squared slack): `tau = loss / (||diff||^2 + 1/(2C))`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaII {
    c: f64,
}

impl PaII {
    pub fn new(c: f64) -> Result<Self> {
        Ok(Self {
            c: check_aggressiveness(c)?,
        })
    }

    pub fn c(&self) -> f64 {
        self.c
    }
}

impl StepSize for PaII {
    fn name(&self) -> &'static str {
        "PA-II"
    }

    fn tau(&self, suffer_loss: f64, dist_sq: f64) -> f64 {
        suffer_loss / (dist_sq + 1.0 / (2.0 * self.c))
    }
}

fn check_aggressiveness(c: f64) -> Result<f64> {
    if !c.is_finite() || c <= 0.0 {
        return Err(Error::InvalidParameter("c must be positive".to_string()));
    }
    Ok(c)
}

/// Passive-Aggressive update rule.
///
/// The prediction is the plain best output; the reference is the training
/// output, completed by partial inference when partial annotation is enabled.
/// The learning rate of the step context is not used, `tau` takes its place.
#[derive(Debug, Clone, PartialEq)]
pub struct PassiveAggressive<T, S = PredictionBasedUpdate> {
    step_size: T,
    selector: S,
    partial_annotation: bool,
}

impl<T: StepSize> PassiveAggressive<T> {
    pub fn new(step_size: T) -> Self {
        Self {
            step_size,
            selector: PredictionBasedUpdate,
            partial_annotation: false,
        }
    }
}

impl PassiveAggressive<Pa> {
    pub fn pa() -> Self {
        Self::new(Pa)
    }
}

impl PassiveAggressive<PaI> {
    pub fn pa1(c: f64) -> Result<Self> {
        Ok(Self::new(PaI::new(c)?))
    }
}

impl PassiveAggressive<PaII> {
    pub fn pa2(c: f64) -> Result<Self> {
        Ok(Self::new(PaII::new(c)?))
    }
}

impl<T, S> PassiveAggressive<T, S> {
    /// Replace the update target selector.
    pub fn with_selector<S2>(self, selector: S2) -> PassiveAggressive<T, S2> {
        PassiveAggressive {
            step_size: self.step_size,
            selector,
            partial_annotation: self.partial_annotation,
        }
    }

    pub fn with_partial_annotation(mut self, enabled: bool) -> Self {
        self.partial_annotation = enabled;
        self
    }

    pub fn partial_annotation(&self) -> bool {
        self.partial_annotation
    }

    pub fn step_size(&self) -> &T {
        &self.step_size
    }
}

impl<I, O, M, F, T, S> UpdateStrategy<I, O, M, F> for PassiveAggressive<T, S>
where
    O: ExampleOutput<I>,
    M: Model<I, O>,
    F: Inference<I, O, M> + ?Sized,
    T: StepSize,
    S: UpdateTargetSelector<O>,
{
    fn name(&self) -> &'static str {
        self.step_size.name()
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
        let predicted = inference.inference(model, input)?;

        let suffer_loss =
            inference.calculate_suffer_loss(model, input, &reference, &predicted, &self.selector);
        let dist_sq = reference.feature_vector_length_squared(input, &predicted);
        let tau = self.step_size.tau(suffer_loss, dist_sq);

        let loss = model.update(input, &reference, &predicted, tau)?;
        model.sum_updates(step.iteration);
        Ok(loss)
    }
}

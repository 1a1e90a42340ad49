use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::corpus::{epoch_order, Corpus, ExampleRef, WeightedCorpus};
use super::params::TrainerParams;
use crate::error::{Error, Result};
use crate::listener::{EpochReport, Progress, TrainingListener};
use crate::traits::{ExampleOutput, Inference, Model};

mod algorithm;
mod passive_aggressive;
mod perceptron;

pub use self::algorithm::{Algorithm, AlgorithmParams, PaType};
pub use self::passive_aggressive::{Pa, PaI, PaII, PassiveAggressive, StepSize};
pub use self::perceptron::{
    AwayFromWorse, LossAugmented, NonAnnotatedWeight, Perceptron, Plain, PredictionStrategy,
    TowardBetter,
};

/// Per-example state handed to an [`UpdateStrategy`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepContext {
    /// Zero-based epoch index
    pub epoch: usize,
    /// One-based index of this example across the whole run; the value
    /// strategies pass to [`Model::sum_updates`]
    pub iteration: u64,
    /// Learning rate after applying the schedule
    pub learning_rate: f64,
}

/// A rule turning one labeled example into a model update.
///
/// Implementations call [`Model::update`] followed by exactly one
/// [`Model::sum_updates`] and return the loss reported by the update.
pub trait UpdateStrategy<I, O, M, F: ?Sized> {
    fn name(&self) -> &'static str;

    /// Called before the first example of every epoch.
    fn begin_epoch(&mut self, _epoch: usize) {}

    fn train_one_example(
        &mut self,
        inference: &F,
        model: &mut M,
        input: &I,
        output: &O,
        step: &StepContext,
    ) -> Result<f64>;
}

impl<I, O, M, F: ?Sized, S: UpdateStrategy<I, O, M, F> + ?Sized> UpdateStrategy<I, O, M, F>
    for Box<S>
{
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn begin_epoch(&mut self, epoch: usize) {
        (**self).begin_epoch(epoch)
    }

    fn train_one_example(
        &mut self,
        inference: &F,
        model: &mut M,
        input: &I,
        output: &O,
        step: &StepContext,
    ) -> Result<f64> {
        (**self).train_one_example(inference, model, input, output, step)
    }
}

/// How a run ended. None of these is a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainingStatus {
    /// Every configured epoch ran
    Completed,
    /// `before_training` vetoed the run
    AbortedBeforeStart,
    /// `before_epoch` vetoed this epoch, which did not run
    StoppedBeforeEpoch { epoch: usize },
    /// `after_epoch` stopped the run after this epoch
    StoppedAfterEpoch { epoch: usize },
}

/// Outcome of [`Trainer::train`].
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSummary {
    pub status: TrainingStatus,
    pub epochs_completed: usize,
    /// Examples processed over the whole run
    pub iterations: u64,
    /// Summed loss of each completed epoch
    pub epoch_losses: Vec<f64>,
    /// Whether an explicit seed made the example order reproducible
    pub reproducible: bool,
    /// Whether the model weights were replaced by their average
    pub averaged: bool,
}

impl TrainingSummary {
    fn new(reproducible: bool) -> Self {
        Self {
            status: TrainingStatus::Completed,
            epochs_completed: 0,
            iterations: 0,
            epoch_losses: Vec::new(),
            reproducible,
            averaged: false,
        }
    }

    /// Whether a listener ended the run early.
    pub fn stopped_early(&self) -> bool {
        self.status != TrainingStatus::Completed
    }
}

/// Epoch controller driving an [`UpdateStrategy`] over a corpus.
///
/// The loop is strictly sequential: each example is fully processed before
/// the next one starts, and the model is only touched through the strategy.
#[derive(Debug)]
pub struct Trainer<S> {
    params: TrainerParams,
    strategy: S,
    rng: StdRng,
}

impl<S> Trainer<S> {
    pub fn new(strategy: S) -> Self {
        Self::with_params(strategy, TrainerParams::default())
    }

    pub fn with_params(strategy: S, params: TrainerParams) -> Self {
        let rng = Self::make_rng(params.seed());
        Self {
            params,
            strategy,
            rng,
        }
    }

    /// Get training parameters
    pub fn params(&self) -> &TrainerParams {
        &self.params
    }

    /// Get training parameters for mutation
    pub fn params_mut(&mut self) -> &mut TrainerParams {
        &mut self.params
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    pub fn strategy_mut(&mut self) -> &mut S {
        &mut self.strategy
    }

    /// Set number of epochs (builder pattern)
    pub fn with_epochs(mut self, epochs: usize) -> Result<Self> {
        self.params.set_epochs(epochs)?;
        Ok(self)
    }

    /// Set base learning rate (builder pattern)
    pub fn with_learning_rate(mut self, learning_rate: f64) -> Result<Self> {
        self.params.set_learning_rate(learning_rate)?;
        Ok(self)
    }

    /// Set shuffling of the example order (builder pattern)
    pub fn with_randomize(mut self, enabled: bool) -> Self {
        self.params.set_randomize(enabled);
        self
    }

    /// Set weight averaging (builder pattern)
    pub fn with_averaging(mut self, enabled: bool) -> Self {
        self.params.set_average_weights(enabled);
        self
    }

    /// Set shuffle seed (builder pattern)
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.params.set_seed(Some(seed));
        self
    }

    fn make_rng(seed: Option<u64>) -> StdRng {
        match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Train on a single corpus.
    ///
    /// `inputs` and `outputs` must have the same length; the check happens
    /// before the listener or the model is touched.
    pub fn train<I, O, M, F, L>(
        &mut self,
        inference: &F,
        model: &mut M,
        inputs: &[I],
        outputs: &[O],
        listener: &mut L,
    ) -> Result<TrainingSummary>
    where
        O: ExampleOutput<I>,
        M: Model<I, O>,
        F: Inference<I, O, M> + ?Sized,
        S: UpdateStrategy<I, O, M, F>,
        L: TrainingListener<F, M> + ?Sized,
    {
        let corpus = Corpus::new(inputs, outputs)?;
        self.train_weighted(inference, model, corpus, None, listener)
    }

    /// Train on a primary corpus, optionally mixed with a weighted secondary
    /// corpus sampled anew every epoch.
    pub fn train_weighted<I, O, M, F, L>(
        &mut self,
        inference: &F,
        model: &mut M,
        primary: Corpus<'_, I, O>,
        secondary: Option<WeightedCorpus<'_, I, O>>,
        listener: &mut L,
    ) -> Result<TrainingSummary>
    where
        O: ExampleOutput<I>,
        M: Model<I, O>,
        F: Inference<I, O, M> + ?Sized,
        S: UpdateStrategy<I, O, M, F>,
        L: TrainingListener<F, M> + ?Sized,
    {
        self.params.validate()?;
        let secondary_len = secondary.as_ref().map_or(0, |c| c.corpus().len());
        if primary.is_empty() && secondary_len == 0 {
            return Err(Error::EmptyDataset);
        }

        let seed = self.params.seed();
        let randomize = self.params.randomize();
        let reproducible = seed.is_some() || !randomize;
        self.rng = Self::make_rng(seed);
        if randomize && seed.is_none() {
            warn!("No shuffle seed given; the example order of this run is not reproducible");
        }

        let mut summary = TrainingSummary::new(reproducible);

        if !listener.before_training(inference, model) {
            info!("Training aborted before the first epoch");
            summary.status = TrainingStatus::AbortedBeforeStart;
            return Ok(summary);
        }

        let epochs = self.params.epochs();
        let base_rate = self.params.learning_rate();
        let schedule = self.params.learning_rate_update();
        let interval = self.params.progress_interval();
        let mut iteration: u64 = 0;

        info!(
            "Training with {} for {} epochs ({} primary examples, {} secondary)",
            self.strategy.name(),
            epochs,
            primary.len(),
            secondary_len
        );

        for epoch in 0..epochs {
            if !listener.before_epoch(inference, model, epoch, iteration) {
                summary.status = TrainingStatus::StoppedBeforeEpoch { epoch };
                break;
            }

            self.strategy.begin_epoch(epoch);

            let sampled = secondary
                .as_ref()
                .map(|c| (c.corpus().len(), c.sample_size(epoch)));
            let rng = if randomize { Some(&mut self.rng) } else { None };
            let order = epoch_order(primary.len(), sampled, rng);
            debug!("Epoch {}: {} examples scheduled", epoch + 1, order.len());

            let mut epoch_loss = 0.0;
            for (processed, example) in order.iter().enumerate() {
                let (input, output) = match *example {
                    ExampleRef::Primary(i) => primary.get(i),
                    // `order` only holds secondary refs when a secondary corpus exists
                    ExampleRef::Secondary(i) => match &secondary {
                        Some(c) => c.corpus().get(i),
                        None => continue,
                    },
                };

                let step = StepContext {
                    epoch,
                    iteration: iteration + 1,
                    learning_rate: schedule.rate(base_rate, epoch, iteration + 1),
                };
                let loss = self
                    .strategy
                    .train_one_example(inference, model, input, output, &step)?;
                epoch_loss += loss;
                iteration += 1;

                if interval > 0 && iteration % interval == 0 {
                    let progress = Progress {
                        epoch,
                        iteration,
                        processed: processed + 1,
                        scheduled: order.len(),
                        loss: epoch_loss,
                    };
                    listener.progress_report(inference, model, &progress);
                }
            }

            summary.epochs_completed += 1;
            summary.epoch_losses.push(epoch_loss);
            summary.iterations = iteration;

            let report = EpochReport {
                epoch,
                loss: epoch_loss,
                iteration,
                examples: order.len(),
            };
            if !listener.after_epoch(inference, model, &report) {
                summary.status = TrainingStatus::StoppedAfterEpoch { epoch };
                break;
            }
        }

        if self.params.average_weights() && iteration > 0 {
            debug!("Averaging weights over {} iterations", iteration);
            model.average(iteration);
            summary.averaged = true;
        }

        listener.after_training(inference, model);
        info!(
            "Training finished after {} epochs and {} iterations ({:?})",
            summary.epochs_completed, summary.iterations, summary.status
        );

        Ok(summary)
    }
}

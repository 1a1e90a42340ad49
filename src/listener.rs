//! Observers of a training run.
//!
//! A listener sees the run through four bracketing hooks and a progress hook.
//! `before_training`, `before_epoch` and `after_epoch` return `false` to stop
//! the run; `progress_report` can only observe.

use log::{debug, info};

/// Snapshot handed to [`TrainingListener::progress_report`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    /// Zero-based epoch index
    pub epoch: usize,
    /// Examples processed since the start of the run
    pub iteration: u64,
    /// Examples processed in the current epoch
    pub processed: usize,
    /// Examples scheduled for the current epoch
    pub scheduled: usize,
    /// Loss accumulated in the current epoch so far
    pub loss: f64,
}

/// Summary handed to [`TrainingListener::after_epoch`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochReport {
    /// Zero-based epoch index
    pub epoch: usize,
    /// Sum of the per-example losses of the epoch
    pub loss: f64,
    /// Examples processed since the start of the run
    pub iteration: u64,
    /// Examples processed in this epoch
    pub examples: usize,
}

impl EpochReport {
    /// Mean loss per example, zero for an empty epoch.
    pub fn mean_loss(&self) -> f64 {
        if self.examples == 0 {
            0.0
        } else {
            self.loss / self.examples as f64
        }
    }
}

/// Observer with veto power over a training run.
///
/// `F` is the inference type and `M` the model type of the run. Every hook
/// has a permissive default.
pub trait TrainingListener<F: ?Sized, M: ?Sized> {
    /// Returning `false` aborts the run before any epoch starts.
    fn before_training(&mut self, _inference: &F, _model: &M) -> bool {
        true
    }

    /// Returning `false` stops the run; the epoch does not start.
    fn before_epoch(&mut self, _inference: &F, _model: &M, _epoch: usize, _iteration: u64) -> bool {
        true
    }

    fn progress_report(&mut self, _inference: &F, _model: &M, _progress: &Progress) {}

    /// Returning `false` stops the run after this epoch.
    fn after_epoch(&mut self, _inference: &F, _model: &M, _report: &EpochReport) -> bool {
        true
    }

    fn after_training(&mut self, _inference: &F, _model: &M) {}
}

/// Listener that never interferes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopListener;

impl<F: ?Sized, M: ?Sized> TrainingListener<F, M> for NoopListener {}

/// Reports progress through the `log` facade.
#[derive(Debug, Clone, Default)]
pub struct LoggingListener {
    total_epochs: Option<usize>,
}

impl LoggingListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Include the total number of epochs in epoch reports.
    pub fn with_total_epochs(mut self, epochs: usize) -> Self {
        self.total_epochs = Some(epochs);
        self
    }
}

impl<F: ?Sized, M: ?Sized> TrainingListener<F, M> for LoggingListener {
    fn before_training(&mut self, _inference: &F, _model: &M) -> bool {
        info!("Training started");
        true
    }

    fn progress_report(&mut self, _inference: &F, _model: &M, progress: &Progress) {
        debug!(
            "Epoch {}: {}/{} examples, loss = {:.6}, iteration {}",
            progress.epoch + 1,
            progress.processed,
            progress.scheduled,
            progress.loss,
            progress.iteration
        );
    }

    fn after_epoch(&mut self, _inference: &F, _model: &M, report: &EpochReport) -> bool {
        match self.total_epochs {
            Some(total) => info!(
                "Epoch {}/{}: loss = {:.6} ({:.6} per example)",
                report.epoch + 1,
                total,
                report.loss,
                report.mean_loss()
            ),
            None => info!(
                "Epoch {}: loss = {:.6} ({:.6} per example)",
                report.epoch + 1,
                report.loss,
                report.mean_loss()
            ),
        }
        true
    }

    fn after_training(&mut self, _inference: &F, _model: &M) {
        info!("Training completed");
    }
}

/// Stops the run once the mean loss per example of an epoch drops below
/// `epsilon`.
#[derive(Debug, Clone)]
pub struct ConvergenceListener {
    epsilon: f64,
    converged_at: Option<usize>,
}

impl ConvergenceListener {
    pub fn new(epsilon: f64) -> Self {
        Self {
            epsilon,
            converged_at: None,
        }
    }

    /// Epoch after which the run converged, if it did.
    pub fn converged_at(&self) -> Option<usize> {
        self.converged_at
    }
}

impl<F: ?Sized, M: ?Sized> TrainingListener<F, M> for ConvergenceListener {
    fn after_epoch(&mut self, _inference: &F, _model: &M, report: &EpochReport) -> bool {
        if report.mean_loss() < self.epsilon {
            info!("Converged at epoch {}", report.epoch + 1);
            self.converged_at = Some(report.epoch);
            return false;
        }
        true
    }
}

/// Keeps a deep copy of the model as it stood after the epoch with the lowest
/// loss.
#[derive(Debug, Clone)]
pub struct LowestLossSnapshot<M> {
    best: Option<(usize, f64, M)>,
}

impl<M> LowestLossSnapshot<M> {
    pub fn new() -> Self {
        Self { best: None }
    }

    /// Epoch index and loss of the snapshot.
    pub fn best_epoch(&self) -> Option<(usize, f64)> {
        self.best.as_ref().map(|(epoch, loss, _)| (*epoch, *loss))
    }

    pub fn model(&self) -> Option<&M> {
        self.best.as_ref().map(|(_, _, model)| model)
    }

    pub fn into_model(self) -> Option<M> {
        self.best.map(|(_, _, model)| model)
    }
}

impl<M> Default for LowestLossSnapshot<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: ?Sized, M: Clone> TrainingListener<F, M> for LowestLossSnapshot<M> {
    fn after_epoch(&mut self, _inference: &F, model: &M, report: &EpochReport) -> bool {
        let improved = match &self.best {
            Some((_, loss, _)) => report.loss < *loss,
            None => true,
        };
        if improved {
            self.best = Some((report.epoch, report.loss, model.clone()));
        }
        true
    }
}

/// Fans every hook out to several listeners. All of them observe each event;
/// a single veto stops the run.
pub struct ListenerChain<'a, F: ?Sized, M: ?Sized> {
    listeners: Vec<&'a mut dyn TrainingListener<F, M>>,
}

impl<'a, F: ?Sized, M: ?Sized> ListenerChain<'a, F, M> {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn push(mut self, listener: &'a mut dyn TrainingListener<F, M>) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl<'a, F: ?Sized, M: ?Sized> Default for ListenerChain<'a, F, M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, F: ?Sized, M: ?Sized> TrainingListener<F, M> for ListenerChain<'a, F, M> {
    fn before_training(&mut self, inference: &F, model: &M) -> bool {
        self.listeners
            .iter_mut()
            .fold(true, |go, l| l.before_training(inference, model) && go)
    }

    fn before_epoch(&mut self, inference: &F, model: &M, epoch: usize, iteration: u64) -> bool {
        self.listeners.iter_mut().fold(true, |go, l| {
            l.before_epoch(inference, model, epoch, iteration) && go
        })
    }

    fn progress_report(&mut self, inference: &F, model: &M, progress: &Progress) {
        for l in self.listeners.iter_mut() {
            l.progress_report(inference, model, progress);
        }
    }

    fn after_epoch(&mut self, inference: &F, model: &M, report: &EpochReport) -> bool {
        self.listeners
            .iter_mut()
            .fold(true, |go, l| l.after_epoch(inference, model, report) && go)
    }

    fn after_training(&mut self, inference: &F, model: &M) {
        for l in self.listeners.iter_mut() {
            l.after_training(inference, model);
        }
    }
}

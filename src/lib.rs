//! Online learning for structured prediction
//!
//! This library trains linear models over structured outputs (label
//! sequences, trees, coreference links) with margin-based update rules: the
//! Perceptron family (plain, loss-augmented, toward-better, away-from-worse)
//! and the Passive-Aggressive family (PA, PA-I, PA-II). Search and feature
//! extraction stay with the task, which plugs in through the [`Model`],
//! [`Inference`] and [`ExampleOutput`] traits. A linear-chain sequence tagger
//! ships in [`tagging`].
//!
//! # Examples
//!
//! ```no_run
//! use structlearn::listener::LoggingListener;
//! use structlearn::tagging::{Attribute, TaggingCorpus, Tagger, ViterbiInference};
//! use structlearn::train::{PassiveAggressive, Trainer};
//!
//! let mut corpus = TaggingCorpus::new();
//! let xseq = vec![
//!     vec![Attribute::new("walk", 1.0)],
//!     vec![Attribute::new("shop", 1.0)],
//! ];
//! corpus.append(&xseq, &["sunny", "rainy"])?;
//!
//! let mut model = corpus.new_model();
//! let mut trainer = Trainer::new(PassiveAggressive::pa1(1.0)?)
//!     .with_epochs(20)?
//!     .with_seed(1);
//! trainer.train(
//!     &ViterbiInference,
//!     &mut model,
//!     corpus.inputs(),
//!     corpus.outputs(),
//!     &mut LoggingListener::new(),
//! )?;
//!
//! let tagger = Tagger::new(&model, &corpus);
//! let labels = tagger.tag(&xseq)?;
//! # Ok::<(), structlearn::Error>(())
//! ```

mod error;
pub mod listener;
pub mod tagging;
pub mod train;
mod traits;

pub use self::error::{Error, Result};
pub use self::listener::{EpochReport, Progress, TrainingListener};
pub use self::traits::{
    ExampleOutput, Inference, Model, PredictionBasedUpdate, UpdateTargetSelector,
};
pub use self::train::{Algorithm, Trainer};

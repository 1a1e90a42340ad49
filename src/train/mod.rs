//! Training loop and update rules
//!
//! This module contains the epoch controller, the Perceptron and
//! Passive-Aggressive update strategies it drives, and their configuration.

mod corpus;
mod params;
mod trainer;

// Re-export public types
pub use self::corpus::{Corpus, ExampleRef, WeightedCorpus};
pub use self::params::{LearningRate, TrainerParams};
pub use self::trainer::{
    Algorithm, AlgorithmParams, AwayFromWorse, LossAugmented, NonAnnotatedWeight, Pa, PaI, PaII,
    PaType, PassiveAggressive, Perceptron, Plain, PredictionStrategy, StepContext, StepSize,
    TowardBetter, Trainer, TrainingStatus, TrainingSummary, UpdateStrategy,
};

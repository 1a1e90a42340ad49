use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::super::params::{parse_bool, parse_value};
use super::passive_aggressive::{Pa, PaI, PaII, PassiveAggressive};
use super::perceptron::{
    AwayFromWorse, LossAugmented, NonAnnotatedWeight, Perceptron, Plain, TowardBetter,
};
use super::UpdateStrategy;
use crate::error::{Error, Result};
use crate::traits::{ExampleOutput, Inference, Model};

/// PA variants for Passive Aggressive training.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaType {
    /// PA (no slack)
    Pa,
    /// PA-I (soft margin)
    PaI,
    /// PA-II (squared slack)
    PaII,
}

/// Update rule selected by configuration.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Perceptron,
    LossAugmentedPerceptron,
    TowardBetterPerceptron,
    AwayFromWorsePerceptron,
    PassiveAggressive(PaType),
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Algorithm::Perceptron => "perceptron",
            Algorithm::LossAugmentedPerceptron => "loss-augmented",
            Algorithm::TowardBetterPerceptron => "toward-better",
            Algorithm::AwayFromWorsePerceptron => "away-from-worse",
            Algorithm::PassiveAggressive(PaType::Pa) => "pa",
            Algorithm::PassiveAggressive(PaType::PaI) => "pa1",
            Algorithm::PassiveAggressive(PaType::PaII) => "pa2",
        };
        f.write_str(name)
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "perceptron" | "ap" => Ok(Algorithm::Perceptron),
            "loss-augmented" => Ok(Algorithm::LossAugmentedPerceptron),
            "toward-better" => Ok(Algorithm::TowardBetterPerceptron),
            "away-from-worse" => Ok(Algorithm::AwayFromWorsePerceptron),
            "pa" => Ok(Algorithm::PassiveAggressive(PaType::Pa)),
            "pa1" | "pa-i" => Ok(Algorithm::PassiveAggressive(PaType::PaI)),
            "pa2" | "pa-ii" => Ok(Algorithm::PassiveAggressive(PaType::PaII)),
            _ => Err(Error::InvalidParameter(format!(
                "unknown algorithm: {}",
                s
            ))),
        }
    }
}

/// Hyperparameters of the update rule, as supplied by an external caller.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct AlgorithmParams {
    algorithm: Algorithm,
    partial_annotation: bool,
    loss_weight: f64,
    loss_non_annotated_weight: Option<f64>,
    loss_non_annotated_weight_step: f64,
    c: Option<f64>,
}

impl Default for AlgorithmParams {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::Perceptron,
            partial_annotation: false,
            loss_weight: 1.0,
            loss_non_annotated_weight: None,
            loss_non_annotated_weight_step: 0.0,
            c: None,
        }
    }
}

impl AlgorithmParams {
    pub fn new(algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            ..Self::default()
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn set_algorithm(&mut self, algorithm: Algorithm) {
        self.algorithm = algorithm;
    }

    pub fn partial_annotation(&self) -> bool {
        self.partial_annotation
    }

    pub fn set_partial_annotation(&mut self, enabled: bool) {
        self.partial_annotation = enabled;
    }

    pub fn loss_weight(&self) -> f64 {
        self.loss_weight
    }

    pub fn set_loss_weight(&mut self, weight: f64) -> Result<()> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(Error::InvalidParameter(
                "loss_weight must be non-negative".to_string(),
            ));
        }
        self.loss_weight = weight;
        Ok(())
    }

    pub fn loss_non_annotated_weight(&self) -> Option<f64> {
        self.loss_non_annotated_weight
    }

    /// A negative weight turns the differentiated loss off.
    pub fn set_loss_non_annotated_weight(&mut self, weight: f64) -> Result<()> {
        if !weight.is_finite() {
            return Err(Error::InvalidParameter(
                "loss_non_annotated_weight must be finite".to_string(),
            ));
        }
        self.loss_non_annotated_weight = if weight >= 0.0 { Some(weight) } else { None };
        Ok(())
    }

    pub fn loss_non_annotated_weight_step(&self) -> f64 {
        self.loss_non_annotated_weight_step
    }

    pub fn set_loss_non_annotated_weight_step(&mut self, step: f64) -> Result<()> {
        if !step.is_finite() || step < 0.0 {
            return Err(Error::InvalidParameter(
                "loss_non_annotated_weight_step must be non-negative".to_string(),
            ));
        }
        self.loss_non_annotated_weight_step = step;
        Ok(())
    }

    pub fn c(&self) -> Option<f64> {
        self.c
    }

    pub fn set_c(&mut self, c: f64) -> Result<()> {
        if !c.is_finite() || c <= 0.0 {
            return Err(Error::InvalidParameter("c must be positive".to_string()));
        }
        self.c = Some(c);
        Ok(())
    }

    /// Set a parameter from its string form.
    pub fn set(&mut self, name: &str, value: &str) -> Result<()> {
        match name {
            "algorithm" => {
                self.set_algorithm(value.parse()?);
                Ok(())
            }
            "partial_annotation" => {
                self.set_partial_annotation(parse_bool(name, value)?);
                Ok(())
            }
            "loss_weight" => self.set_loss_weight(parse_value(name, value)?),
            "loss_non_annotated_weight" => {
                self.set_loss_non_annotated_weight(parse_value(name, value)?)
            }
            "loss_non_annotated_weight_step" => {
                self.set_loss_non_annotated_weight_step(parse_value(name, value)?)
            }
            "c" => self.set_c(parse_value(name, value)?),
            _ => Err(Error::UnknownParameter(name.to_string())),
        }
    }

    /// Get a parameter in its string form.
    pub fn get(&self, name: &str) -> Result<String> {
        let value = match name {
            "algorithm" => self.algorithm.to_string(),
            "partial_annotation" => self.partial_annotation.to_string(),
            "loss_weight" => self.loss_weight.to_string(),
            "loss_non_annotated_weight" => match self.loss_non_annotated_weight {
                Some(weight) => weight.to_string(),
                None => "-1".to_string(),
            },
            "loss_non_annotated_weight_step" => self.loss_non_annotated_weight_step.to_string(),
            "c" => match self.c {
                Some(c) => c.to_string(),
                None => "none".to_string(),
            },
            _ => return Err(Error::UnknownParameter(name.to_string())),
        };
        Ok(value)
    }

    fn aggressiveness(&self) -> Result<f64> {
        self.c.ok_or(Error::MissingParameter("c"))
    }

    fn non_annotated(&self) -> Result<Option<NonAnnotatedWeight>> {
        self.loss_non_annotated_weight
            .map(|w| NonAnnotatedWeight::new(w, self.loss_non_annotated_weight_step))
            .transpose()
    }

    /// Build the configured update strategy.
    ///
    /// Fails when a required hyperparameter is missing, e.g. `c` for PA-I and
    /// PA-II.
    pub fn build<I, O, M, F>(&self) -> Result<Box<dyn UpdateStrategy<I, O, M, F>>>
    where
        O: ExampleOutput<I> + 'static,
        M: Model<I, O> + 'static,
        F: Inference<I, O, M> + ?Sized + 'static,
        I: 'static,
    {
        let partial = self.partial_annotation;
        let strategy: Box<dyn UpdateStrategy<I, O, M, F>> = match self.algorithm {
            Algorithm::Perceptron => {
                Box::new(Perceptron::new(Plain).with_partial_annotation(partial))
            }
            Algorithm::LossAugmentedPerceptron => Box::new(
                Perceptron::new(LossAugmented::new(self.loss_weight)?)
                    .with_partial_annotation(partial),
            ),
            Algorithm::TowardBetterPerceptron => {
                let mut prediction = TowardBetter::new(self.loss_weight)?;
                if let Some(weight) = self.non_annotated()? {
                    prediction = prediction.with_non_annotated_weight(weight);
                }
                Box::new(Perceptron::new(prediction).with_partial_annotation(partial))
            }
            Algorithm::AwayFromWorsePerceptron => {
                let mut prediction = AwayFromWorse::new(self.loss_weight)?;
                if let Some(weight) = self.non_annotated()? {
                    prediction = prediction.with_non_annotated_weight(weight);
                }
                Box::new(Perceptron::new(prediction).with_partial_annotation(partial))
            }
            Algorithm::PassiveAggressive(PaType::Pa) => {
                Box::new(PassiveAggressive::new(Pa).with_partial_annotation(partial))
            }
            Algorithm::PassiveAggressive(PaType::PaI) => Box::new(
                PassiveAggressive::new(PaI::new(self.aggressiveness()?)?)
                    .with_partial_annotation(partial),
            ),
            Algorithm::PassiveAggressive(PaType::PaII) => Box::new(
                PassiveAggressive::new(PaII::new(self.aggressiveness()?)?)
                    .with_partial_annotation(partial),
            ),
        };
        Ok(strategy)
    }
}

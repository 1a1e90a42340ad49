use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Learning-rate update strategy of the Perceptron family.
///
/// Every schedule is a deterministic function of the zero-based epoch and the
/// one-based global iteration.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LearningRate {
    /// Constant rate
    None,
    /// `rate / (1 + epoch)`
    InverseEpoch,
    /// `rate / sqrt(iteration)`
    InverseSqrtIteration,
    /// `rate * decay^epoch`
    Exponential { decay: f64 },
    /// `rate * gamma^(epoch / every)`
    Step { every: usize, gamma: f64 },
}

impl LearningRate {
    /// Rate to use for the example at `iteration` of `epoch`.
    pub fn rate(&self, base: f64, epoch: usize, iteration: u64) -> f64 {
        match *self {
            LearningRate::None => base,
            LearningRate::InverseEpoch => base / (1.0 + epoch as f64),
            LearningRate::InverseSqrtIteration => base / (iteration.max(1) as f64).sqrt(),
            LearningRate::Exponential { decay } => base * decay.powi(epoch as i32),
            LearningRate::Step { every, gamma } => base * gamma.powi((epoch / every) as i32),
        }
    }

    pub fn validate(&self) -> Result<()> {
        match *self {
            LearningRate::Exponential { decay } if !(decay > 0.0 && decay <= 1.0) => Err(
                Error::InvalidParameter("exponential decay must be in (0, 1]".to_string()),
            ),
            LearningRate::Step { every, .. } if every == 0 => Err(Error::InvalidParameter(
                "step schedule period must be at least 1".to_string(),
            )),
            LearningRate::Step { gamma, .. } if !(gamma > 0.0 && gamma <= 1.0) => Err(
                Error::InvalidParameter("step schedule gamma must be in (0, 1]".to_string()),
            ),
            _ => Ok(()),
        }
    }
}

impl Default for LearningRate {
    fn default() -> Self {
        LearningRate::None
    }
}

impl fmt::Display for LearningRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LearningRate::None => write!(f, "none"),
            LearningRate::InverseEpoch => write!(f, "inverse-epoch"),
            LearningRate::InverseSqrtIteration => write!(f, "inverse-sqrt-iteration"),
            LearningRate::Exponential { decay } => write!(f, "exponential:{}", decay),
            LearningRate::Step { every, gamma } => write!(f, "step:{}:{}", every, gamma),
        }
    }
}

/// Parses the [`Display`](fmt::Display) form, e.g. `none`, `exponential:0.9`
/// or `step:5:0.5`.
impl FromStr for LearningRate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.trim().split(':');
        let name = parts.next().unwrap_or_default().to_ascii_lowercase();
        let args: Vec<&str> = parts.collect();
        let schedule = match (name.as_str(), args.as_slice()) {
            ("none", []) => LearningRate::None,
            ("inverse-epoch", []) => LearningRate::InverseEpoch,
            ("inverse-sqrt-iteration", []) => LearningRate::InverseSqrtIteration,
            ("exponential", [decay]) => LearningRate::Exponential {
                decay: parse_value("learning_rate_update", decay)?,
            },
            ("step", [every, gamma]) => LearningRate::Step {
                every: parse_value("learning_rate_update", every)?,
                gamma: parse_value("learning_rate_update", gamma)?,
            },
            _ => {
                return Err(Error::InvalidParameter(format!(
                    "unknown learning rate update strategy: {}",
                    s
                )))
            }
        };
        schedule.validate()?;
        Ok(schedule)
    }
}

pub(crate) fn parse_value<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::InvalidParameter(format!("invalid value for {}: {}", name, value)))
}

/// Parameters of the epoch controller.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct TrainerParams {
    epochs: usize,
    learning_rate: f64,
    randomize: bool,
    average_weights: bool,
    learning_rate_update: LearningRate,
    seed: Option<u64>,
    progress_interval: u64,
}

impl Default for TrainerParams {
    fn default() -> Self {
        Self {
            epochs: 10,
            learning_rate: 1.0,
            randomize: true,
            average_weights: true,
            learning_rate_update: LearningRate::None,
            seed: None,
            progress_interval: 1000,
        }
    }
}

impl TrainerParams {
    pub fn epochs(&self) -> usize {
        self.epochs
    }

    pub fn set_epochs(&mut self, epochs: usize) -> Result<()> {
        if epochs < 1 {
            return Err(Error::InvalidParameter(
                "epochs must be at least 1".to_string(),
            ));
        }
        self.epochs = epochs;
        Ok(())
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn set_learning_rate(&mut self, learning_rate: f64) -> Result<()> {
        if !learning_rate.is_finite() || learning_rate <= 0.0 {
            return Err(Error::InvalidParameter(
                "learning_rate must be positive".to_string(),
            ));
        }
        self.learning_rate = learning_rate;
        Ok(())
    }

    pub fn randomize(&self) -> bool {
        self.randomize
    }

    pub fn set_randomize(&mut self, enabled: bool) {
        self.randomize = enabled;
    }

    pub fn average_weights(&self) -> bool {
        self.average_weights
    }

    pub fn set_average_weights(&mut self, enabled: bool) {
        self.average_weights = enabled;
    }

    pub fn learning_rate_update(&self) -> LearningRate {
        self.learning_rate_update
    }

    pub fn set_learning_rate_update(&mut self, schedule: LearningRate) -> Result<()> {
        schedule.validate()?;
        self.learning_rate_update = schedule;
        Ok(())
    }

    /// Shuffle seed. Without one, shuffled runs are not reproducible.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn set_seed(&mut self, seed: Option<u64>) {
        self.seed = seed;
    }

    /// Number of examples between two progress reports, zero disables them.
    pub fn progress_interval(&self) -> u64 {
        self.progress_interval
    }

    pub fn set_progress_interval(&mut self, interval: u64) {
        self.progress_interval = interval;
    }

    /// Set a parameter from its string form.
    pub fn set(&mut self, name: &str, value: &str) -> Result<()> {
        match name {
            "epochs" | "max_iterations" => self.set_epochs(parse_value(name, value)?),
            "learning_rate" => self.set_learning_rate(parse_value(name, value)?),
            "randomize" | "shuffle" => {
                self.set_randomize(parse_bool(name, value)?);
                Ok(())
            }
            "average" | "average_weights" => {
                self.set_average_weights(parse_bool(name, value)?);
                Ok(())
            }
            "learning_rate_update" => self.set_learning_rate_update(value.parse()?),
            "seed" => {
                let seed = match value.trim() {
                    "" | "none" => None,
                    v => Some(parse_value(name, v)?),
                };
                self.set_seed(seed);
                Ok(())
            }
            "progress_interval" => {
                self.set_progress_interval(parse_value(name, value)?);
                Ok(())
            }
            _ => Err(Error::UnknownParameter(name.to_string())),
        }
    }

    /// Get a parameter in its string form.
    pub fn get(&self, name: &str) -> Result<String> {
        let value = match name {
            "epochs" | "max_iterations" => self.epochs.to_string(),
            "learning_rate" => self.learning_rate.to_string(),
            "randomize" | "shuffle" => self.randomize.to_string(),
            "average" | "average_weights" => self.average_weights.to_string(),
            "learning_rate_update" => self.learning_rate_update.to_string(),
            "seed" => match self.seed {
                Some(seed) => seed.to_string(),
                None => "none".to_string(),
            },
            "progress_interval" => self.progress_interval.to_string(),
            _ => return Err(Error::UnknownParameter(name.to_string())),
        };
        Ok(value)
    }

    /// Re-check every value; parameters deserialized from outside bypass the
    /// setters.
    pub fn validate(&self) -> Result<()> {
        if self.epochs < 1 {
            return Err(Error::InvalidParameter(
                "epochs must be at least 1".to_string(),
            ));
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(Error::InvalidParameter(
                "learning_rate must be positive".to_string(),
            ));
        }
        self.learning_rate_update.validate()
    }
}

pub(crate) fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::InvalidParameter(format!(
            "invalid value for {}: {}",
            name, value
        ))),
    }
}

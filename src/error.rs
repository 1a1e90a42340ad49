//! Error types for the training engine

/// Error of the training engine or the tagging task
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("inputs and outputs must have the same length (inputs: {inputs}, outputs: {outputs})")]
    DatasetMismatch { inputs: usize, outputs: usize },

    #[error("no training data")]
    EmptyDataset,

    #[error("invalid example: {0}")]
    InvalidExample(String),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("model update failed: {0}")]
    Model(String),
}

impl Error {
    /// Whether the error was raised while validating configuration, i.e. before
    /// any example was processed.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::InvalidParameter(_)
                | Error::UnknownParameter(_)
                | Error::MissingParameter(_)
                | Error::DatasetMismatch { .. }
                | Error::EmptyDataset
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

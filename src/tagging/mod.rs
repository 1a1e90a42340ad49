//! First-order linear-chain sequence tagging
//!
//! A complete task domain for the training engine: attribute sequences as
//! input, label sequences (possibly partially annotated) as output, a dense
//! weight model with lazy averaging and exact Viterbi search.

mod attribute;
mod corpus;
mod dataset;
mod dictionary;
mod features;
mod inference;
mod lattice;
mod model;
mod tagger;

pub use self::attribute::Attribute;
pub use self::corpus::TaggingCorpus;
pub use self::dataset::{AttributeValue, Item, Sequence, Tags};
pub use self::dictionary::Dictionary;
pub use self::features::{FeatureKey, FeatureVector};
pub use self::inference::ViterbiInference;
pub use self::model::TaggerModel;
pub use self::tagger::Tagger;

/// Dataset and feature compilation
///
/// Vocabulary construction, canonical record filtering and the one-hot
/// feature matrix.

pub mod dataset;
pub mod features;
pub mod vocabulary;

pub use dataset::{load_dataset, CanonicalRecord, DatasetBuilder};
pub use features::{FeatureEncoder, FeatureMatrix, FeatureRow, FeatureSchema, WEEKDAY_LABELS};
pub use vocabulary::{Vocabulary, VocabularyBuilder};

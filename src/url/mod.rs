//! URL extraction and featurization

pub mod extractor;
pub mod features;

pub use extractor::UrlExtractor;
pub use features::{UrlFeaturizer, UrlFeatures};

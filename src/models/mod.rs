//! Model loading, classifiers and verdict fusion

pub mod aggregator;
pub mod classifier;
pub mod engine;
pub mod loader;
pub mod output;

pub use aggregator::{Assessment, VerdictAggregator, DECISION_THRESHOLD};
pub use classifier::{Classifier, OnnxTextClassifier, OnnxUrlClassifier};
pub use engine::{OnnxScoringEngine, ScoringEngine, ScoringLimits};
pub use loader::ModelLoader;

//! Wire types for the scoring pipeline

pub mod alert;
pub mod request;
pub mod verdict;

pub use alert::FraudAlert;
pub use request::ScoringRequest;
pub use verdict::{ErrorReply, Reply, ScoringVerdict};

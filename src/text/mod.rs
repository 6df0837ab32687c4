//! Text preprocessing for the message text model

pub mod normalizer;
pub mod porter;
pub mod stopwords;

pub use normalizer::TextNormalizer;
pub use porter::PorterStemmer;

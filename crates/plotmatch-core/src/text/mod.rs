pub mod normalizer;
pub mod stem;
pub mod stopwords;

pub use normalizer::{DEFAULT_BOILERPLATE, Normalizer, NormalizerConfig};

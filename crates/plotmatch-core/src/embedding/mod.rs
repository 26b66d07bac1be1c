pub mod lexicon;
pub mod model;
pub mod params;
pub mod vector;

pub use lexicon::Lexicon;
pub use model::{EmbeddingModel, TermStats};
pub use params::Hyperparameters;

pub mod generation;

pub use generation::{present, GenerationRequest, GenerationResult, TEMPLATE_MODEL};

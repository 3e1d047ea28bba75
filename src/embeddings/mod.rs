// Embedding provider clients
// Each submodule wraps one remote embedding API behind a small typed surface.

pub mod openai;

pub use openai::{DEFAULT_EMBEDDING_DIMENSION, OpenAiClient};

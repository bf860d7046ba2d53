pub mod chat;
pub mod embeddings;

pub use chat::{ChatError, ChatProvider, OpenAiChat};
pub use embeddings::{EmbeddingError, EmbeddingGenerator, TextEmbedder};

pub mod api;
pub mod config;
pub mod database;
pub mod document;
pub mod llm;
pub mod pipeline;

// Re-export commonly used items
pub use config::Config;
pub use pipeline::{AnswerComposer, IngestionPipeline};

use std::env;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Process-wide configuration, built once at startup from the environment
/// and injected into every component. Business logic never reads env vars.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub qdrant_url: String,
    pub embedding_model: String,
    pub chat_model: String,
    pub embedding_dimension: u64,
    pub chunk_max_size: usize,
    pub chunk_overlap: usize,
    pub batch_size: usize,
    pub top_k: u64,
    pub question_max_len: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            openai_api_key: env::var("OPENAI_API_KEY")
                .map_err(|_| ConfigError::Missing("OPENAI_API_KEY"))?,
            qdrant_url: env::var("QDRANT_URL")
                .unwrap_or_else(|_| "http://localhost:6334".to_string()),
            embedding_model: env::var("EMBEDDING_MODEL")
                .unwrap_or_else(|_| "text-embedding-ada-002".to_string()),
            chat_model: env::var("CHAT_MODEL").unwrap_or_else(|_| "gpt-3.5-turbo".to_string()),
            embedding_dimension: parsed_var("EMBEDDING_DIMENSION", 1536)?,
            chunk_max_size: parsed_var("CHUNK_MAX_SIZE", 1000)?,
            chunk_overlap: parsed_var("CHUNK_OVERLAP", 200)?,
            batch_size: parsed_var("INGEST_BATCH_SIZE", 25)?,
            top_k: parsed_var("RETRIEVAL_TOP_K", 3)?,
            question_max_len: parsed_var("QUESTION_MAX_LEN", 500)?,
        })
    }
}

fn parsed_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}

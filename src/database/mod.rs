pub mod qdrant_config;
pub mod vector_db;

pub use qdrant_config::connect_qdrant;
pub use vector_db::{PassagePoint, ScoredPassage, VectorDb, VectorDbError, VectorIndex};

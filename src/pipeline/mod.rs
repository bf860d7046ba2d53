pub mod answer;
pub mod chunker;
pub mod ingest;

pub use answer::{AnswerComposer, AnswerError, FALLBACK_ANSWER};
pub use chunker::{split_pages, ChunkPolicy, InvalidChunkPolicy, Passage};
pub use ingest::{collection_name, IngestError, IngestionPipeline, Stage};

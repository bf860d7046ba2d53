use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::database::{PassagePoint, VectorDbError, VectorIndex};
use crate::document::{extract_pages, ExtractionError, PageRecord, UploadedDocument};
use crate::llm::{EmbeddingError, TextEmbedder};
use crate::pipeline::chunker::{split_pages, ChunkPolicy};

/// Pipeline stage names, reported with every ingestion failure. Chunking has
/// no variant: the policy is validated at startup, so splitting cannot fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Extraction,
    Embedding,
    Indexing,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Extraction => "extraction",
            Stage::Embedding => "embedding",
            Stage::Indexing => "indexing",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("unsupported media type {0:?}, expected application/pdf")]
    UnsupportedMediaType(String),
    #[error("extraction stage failed: {0}")]
    Extraction(#[from] ExtractionError),
    #[error("embedding stage failed: {0}")]
    Embedding(#[from] EmbeddingError),
    #[error("indexing stage failed: {0}")]
    Indexing(#[from] VectorDbError),
}

impl IngestError {
    pub fn stage(&self) -> Option<Stage> {
        match self {
            IngestError::UnsupportedMediaType(_) => None,
            IngestError::Extraction(_) => Some(Stage::Extraction),
            IngestError::Embedding(_) => Some(Stage::Embedding),
            IngestError::Indexing(_) => Some(Stage::Indexing),
        }
    }
}

/// Validate -> extract -> chunk -> embed -> index, one isolated collection
/// per document.
///
/// Batches are embedded and upserted in strict input order, each upsert
/// completing before the next batch is embedded. A failure partway through
/// leaves the batches already written in place: the collection stays
/// partially indexed, with no rollback and no way to resume it. Callers get
/// a fresh collection on retry.
pub struct IngestionPipeline {
    embedder: Arc<dyn TextEmbedder>,
    index: Arc<dyn VectorIndex>,
    policy: ChunkPolicy,
    batch_size: usize,
    dimension: u64,
}

impl IngestionPipeline {
    pub fn new(
        embedder: Arc<dyn TextEmbedder>,
        index: Arc<dyn VectorIndex>,
        policy: ChunkPolicy,
        batch_size: usize,
        dimension: u64,
    ) -> Self {
        Self {
            embedder,
            index,
            policy,
            batch_size: batch_size.max(1),
            dimension,
        }
    }

    /// Ingests one document and returns the name of the collection that now
    /// holds its passages.
    pub async fn ingest(&self, document: UploadedDocument) -> Result<String, IngestError> {
        if document.content_type != crate::document::PDF_CONTENT_TYPE {
            return Err(IngestError::UnsupportedMediaType(document.content_type));
        }

        let pages = extract_pages(document.bytes).await?;
        self.index_document(&document.file_name, &pages).await
    }

    async fn index_document(
        &self,
        file_name: &str,
        pages: &[PageRecord],
    ) -> Result<String, IngestError> {
        let passages = split_pages(pages, self.policy);
        let collection = collection_name(file_name);
        log::info!(
            "ingesting {:?}: {} pages, {} passages -> collection {}",
            file_name,
            pages.len(),
            passages.len(),
            collection
        );

        self.index.create_collection(&collection, self.dimension).await?;

        let total_batches = passages.len().div_ceil(self.batch_size);
        for (batch_no, batch) in passages.chunks(self.batch_size).enumerate() {
            let texts: Vec<String> = batch.iter().map(|p| p.text.clone()).collect();
            let vectors = self.embedder.embed_batch(&texts).await?;
            let points = batch
                .iter()
                .zip(vectors)
                .map(|(passage, vector)| PassagePoint {
                    text: passage.text.clone(),
                    page: passage.page,
                    vector,
                })
                .collect();
            self.index.upsert(&collection, points).await?;
            log::info!(
                "indexed batch {}/{} into {}",
                batch_no + 1,
                total_batches,
                collection
            );
        }

        Ok(collection)
    }
}

/// Derives a collection name from the filename: lowercased stem with
/// whitespace collapsed to underscores, plus a random suffix so concurrent
/// uploads of same-named files never share a collection.
pub fn collection_name(file_name: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}_{}", sanitize_stem(file_name), &suffix[..8])
}

fn sanitize_stem(file_name: &str) -> String {
    let stem = file_name
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(file_name);
    let mut sanitized = String::with_capacity(stem.len());
    for ch in stem.to_lowercase().chars() {
        if ch.is_whitespace() {
            sanitized.push('_');
        } else if ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' {
            sanitized.push(ch);
        }
    }
    if sanitized.is_empty() {
        "document".to_string()
    } else {
        sanitized
    }
}

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use qdrant_client::qdrant::{
    point_id::PointIdOptions, value::Kind, vectors_config::Config as VectorsVariant,
    with_payload_selector::SelectorOptions, CreateCollection, Distance, PointId, PointStruct,
    SearchPoints, UpsertPoints, Value, VectorParams, VectorsConfig, WithPayloadSelector,
};
use qdrant_client::Qdrant;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum VectorDbError {
    #[error("vector backend unreachable: {0}")]
    Unavailable(String),
    #[error("collection {0} not found")]
    CollectionNotFound(String),
    #[error("collection {name} holds {existing}-dimensional vectors, requested {requested}")]
    DimensionMismatch {
        name: String,
        existing: u64,
        requested: u64,
    },
    #[error("vector store operation failed: {0}")]
    Operation(String),
}

/// One passage ready for indexing: the text kept as payload plus its vector.
#[derive(Debug, Clone)]
pub struct PassagePoint {
    pub text: String,
    pub page: usize,
    pub vector: Vec<f32>,
}

/// One retrieval hit, descending-score order is the backend's.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPassage {
    pub text: String,
    pub score: f32,
}

/// Collection-scoped vector store: idempotent creation, batched appends,
/// k-nearest-neighbor search.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Idempotent. An existing collection must have the requested dimension,
    /// otherwise this fails with [`VectorDbError::DimensionMismatch`].
    async fn create_collection(&self, name: &str, dimension: u64) -> Result<(), VectorDbError>;

    /// Appends points. No dedup: collections are single-document and
    /// write-once, so duplicate passages within one ingestion are fine.
    async fn upsert(&self, collection: &str, points: Vec<PassagePoint>)
        -> Result<(), VectorDbError>;

    /// At most `limit` nearest neighbors by cosine similarity. An empty
    /// collection yields an empty result; a missing one fails with
    /// [`VectorDbError::CollectionNotFound`].
    async fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u64,
    ) -> Result<Vec<ScoredPassage>, VectorDbError>;
}

#[derive(Clone)]
pub struct VectorDb {
    client: Arc<Qdrant>,
}

impl VectorDb {
    pub fn new(client: Qdrant) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    async fn stored_dimension(&self, name: &str) -> Result<u64, VectorDbError> {
        let info = self
            .client
            .collection_info(name)
            .await
            .map_err(|e| classify(name, e))?;

        let vectors = info
            .result
            .and_then(|r| r.config)
            .and_then(|c| c.params)
            .and_then(|p| p.vectors_config)
            .and_then(|v| v.config);
        match vectors {
            Some(VectorsVariant::Params(params)) => Ok(params.size),
            _ => Err(VectorDbError::Operation(format!(
                "collection {} has an unsupported vector layout",
                name
            ))),
        }
    }
}

#[async_trait]
impl VectorIndex for VectorDb {
    async fn create_collection(&self, name: &str, dimension: u64) -> Result<(), VectorDbError> {
        let exists = self
            .client
            .collection_exists(name)
            .await
            .map_err(|e| classify(name, e))?;

        if exists {
            let existing = self.stored_dimension(name).await?;
            if existing != dimension {
                return Err(VectorDbError::DimensionMismatch {
                    name: name.to_string(),
                    existing,
                    requested: dimension,
                });
            }
            log::info!("collection {} already exists, skipping creation", name);
            return Ok(());
        }

        let vectors_config = VectorsConfig {
            config: Some(VectorsVariant::Params(VectorParams {
                size: dimension,
                distance: Distance::Cosine.into(),
                ..Default::default()
            })),
        };
        self.client
            .create_collection(CreateCollection {
                collection_name: name.to_string(),
                vectors_config: Some(vectors_config),
                ..Default::default()
            })
            .await
            .map_err(|e| classify(name, e))?;
        Ok(())
    }

    async fn upsert(
        &self,
        collection: &str,
        points: Vec<PassagePoint>,
    ) -> Result<(), VectorDbError> {
        let points: Vec<PointStruct> = points
            .into_iter()
            .map(|point| {
                let mut payload: HashMap<String, Value> = HashMap::new();
                payload.insert("text".to_string(), Value::from(point.text));
                payload.insert("page".to_string(), Value::from(point.page as i64));
                PointStruct {
                    id: Some(PointId {
                        point_id_options: Some(PointIdOptions::Uuid(
                            Uuid::new_v4().to_string(),
                        )),
                    }),
                    vectors: Some(point.vector.into()),
                    payload,
                }
            })
            .collect();

        self.client
            .upsert_points(UpsertPoints {
                collection_name: collection.to_string(),
                points,
                ..Default::default()
            })
            .await
            .map_err(|e| classify(collection, e))?;
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u64,
    ) -> Result<Vec<ScoredPassage>, VectorDbError> {
        let request = SearchPoints {
            collection_name: collection.to_string(),
            vector,
            limit,
            with_payload: Some(WithPayloadSelector {
                selector_options: Some(SelectorOptions::Enable(true)),
            }),
            ..Default::default()
        };

        let results = self
            .client
            .search_points(request)
            .await
            .map_err(|e| classify(collection, e))?;

        Ok(results
            .result
            .into_iter()
            .filter_map(|point| {
                let text = match point.payload.get("text").and_then(|v| v.kind.clone()) {
                    Some(Kind::StringValue(text)) => text,
                    _ => return None,
                };
                Some(ScoredPassage {
                    text,
                    score: point.score,
                })
            })
            .collect())
    }
}

/// Qdrant reports failures as status strings; sort them into the error
/// taxonomy the pipeline cares about.
fn classify(collection: &str, error: qdrant_client::QdrantError) -> VectorDbError {
    let message = error.to_string();
    let lowered = message.to_lowercase();
    if lowered.contains("doesn't exist") || lowered.contains("not found") {
        VectorDbError::CollectionNotFound(collection.to_string())
    } else if lowered.contains("transport error")
        || lowered.contains("connection refused")
        || lowered.contains("timed out")
        || lowered.contains("unavailable")
    {
        VectorDbError::Unavailable(message)
    } else {
        VectorDbError::Operation(message)
    }
}

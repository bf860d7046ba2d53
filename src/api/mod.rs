use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use validator::Validate;

use crate::document::{UploadedDocument, PDF_CONTENT_TYPE};
use crate::pipeline::{AnswerComposer, AnswerError, IngestError, IngestionPipeline};

// Uploads are whole PDFs; axum's 2 MB default is far too small.
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<IngestionPipeline>,
    composer: Arc<AnswerComposer>,
}

#[derive(Serialize)]
pub struct IngestResponse {
    #[serde(rename = "collectionId")]
    pub collection_id: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct QueryRequest {
    #[validate(length(min = 1, message = "question must not be empty"))]
    pub question: String,
    #[serde(rename = "collectionId")]
    #[validate(length(min = 1, message = "collectionId must not be empty"))]
    pub collection_id: String,
}

#[derive(Serialize)]
pub struct QueryResponse {
    pub answer: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

/// Create and configure the API router.
pub fn create_api(pipeline: Arc<IngestionPipeline>, composer: Arc<AnswerComposer>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ingest", post(ingest_handler))
        .route("/query", post(query_handler))
        .route("/health", get(health_check))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .with_state(AppState { pipeline, composer })
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

async fn ingest_handler(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let mut document = None;
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                if field.name() != Some("file") {
                    continue;
                }
                let file_name = field
                    .file_name()
                    .unwrap_or("document.pdf")
                    .to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = match field.bytes().await {
                    Ok(bytes) => bytes.to_vec(),
                    Err(e) => {
                        return error_response(
                            StatusCode::BAD_REQUEST,
                            format!("failed to read file field: {}", e),
                        )
                    }
                };
                document = Some(UploadedDocument {
                    file_name,
                    content_type,
                    bytes,
                });
            }
            Ok(None) => break,
            Err(e) => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    format!("malformed multipart body: {}", e),
                )
            }
        }
    }

    let Some(document) = document else {
        return error_response(StatusCode::BAD_REQUEST, "missing file field");
    };
    if document.content_type != PDF_CONTENT_TYPE {
        return error_response(StatusCode::BAD_REQUEST, "invalid file type, expected a PDF");
    }

    match state.pipeline.ingest(document).await {
        Ok(collection_id) => Json(IngestResponse { collection_id }).into_response(),
        Err(e @ IngestError::UnsupportedMediaType(_)) => {
            error_response(StatusCode::BAD_REQUEST, e.to_string())
        }
        Err(e) => {
            log::error!("ingestion failed: {}", e);
            let stage = e
                .stage()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("ingestion failed during the {} stage", stage),
            )
        }
    }
}

async fn query_handler(
    State(state): State<AppState>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("invalid request body: {}", rejection.body_text()),
            )
        }
    };
    if let Err(e) = request.validate() {
        return error_response(StatusCode::BAD_REQUEST, e.to_string());
    }

    match state
        .composer
        .answer(&request.collection_id, &request.question)
        .await
    {
        Ok(answer) => Json(QueryResponse { answer }).into_response(),
        Err(e @ (AnswerError::EmptyQuestion | AnswerError::EmptyCollectionId)) => {
            error_response(StatusCode::BAD_REQUEST, e.to_string())
        }
        Err(AnswerError::CollectionNotFound(name)) => {
            error_response(StatusCode::NOT_FOUND, format!("collection {} not found", name))
        }
        Err(e) => {
            // Provider-internal detail stays in the logs.
            log::error!("query failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
        }
    }
}

async fn health_check() -> Response {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
    .into_response()
}

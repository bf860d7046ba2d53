use std::time::Duration;

use qdrant_client::{config::QdrantConfig, Qdrant};

use crate::database::VectorDbError;

/// Connects to the Qdrant backend and verifies it is reachable.
///
/// Accepts URLs with or without a scheme and rewrites the REST port (6333) to
/// the gRPC port (6334), since this client speaks gRPC only.
pub async fn connect_qdrant(url: &str) -> Result<Qdrant, VectorDbError> {
    let host = match url.split_once("://") {
        Some((_, rest)) => rest,
        None => url,
    };
    let host = if let Some(stripped) = host.strip_suffix(":6333") {
        format!("{}:6334", stripped)
    } else {
        host.to_string()
    };
    let grpc_url = format!("http://{}", host);
    log::info!("connecting to Qdrant at {}", grpc_url);

    let mut config = QdrantConfig::from_url(&grpc_url);
    config.check_compatibility = false;
    config.timeout = Duration::from_secs(30);
    config.connect_timeout = Duration::from_secs(10);

    let client = Qdrant::new(config).map_err(|e| VectorDbError::Unavailable(e.to_string()))?;

    // Probe the connection once at startup so a dead backend fails loudly
    // here instead of on the first request.
    client
        .list_collections()
        .await
        .map_err(|e| VectorDbError::Unavailable(e.to_string()))?;
    log::info!("connected to Qdrant");
    Ok(client)
}

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use async_openai::{config::OpenAIConfig, Client};
use clap::Parser;
use dotenv::dotenv;
use tokio::net::TcpListener;

use pdf_rag_service::api;
use pdf_rag_service::database::{connect_qdrant, VectorDb};
use pdf_rag_service::llm::{EmbeddingGenerator, OpenAiChat};
use pdf_rag_service::pipeline::ChunkPolicy;
use pdf_rag_service::{AnswerComposer, Config, IngestionPipeline};

#[derive(Parser, Debug)]
#[command(author, version, about = "PDF question answering backed by Qdrant")]
struct Args {
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    #[arg(long, default_value_t = 3000)]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();
    let args = Args::parse();

    let config = Config::from_env().context("failed to load configuration")?;
    let policy = ChunkPolicy::new(config.chunk_max_size, config.chunk_overlap)
        .context("invalid chunk configuration")?;

    let qdrant = connect_qdrant(&config.qdrant_url)
        .await
        .context("failed to reach the vector index backend")?;
    let index = Arc::new(VectorDb::new(qdrant));

    let openai = Client::with_config(OpenAIConfig::new().with_api_key(config.openai_api_key.clone()));
    let embedder = Arc::new(EmbeddingGenerator::new(
        openai.clone(),
        config.embedding_model.clone(),
        config.embedding_dimension as usize,
    ));
    let chat = Arc::new(OpenAiChat::new(openai, config.chat_model.clone()));

    let pipeline = Arc::new(IngestionPipeline::new(
        embedder.clone(),
        index.clone(),
        policy,
        config.batch_size,
        config.embedding_dimension,
    ));
    let composer = Arc::new(AnswerComposer::new(
        embedder,
        index,
        chat,
        config.top_k,
        config.question_max_len,
    ));

    let app = api::create_api(pipeline, composer);
    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .context("invalid bind address")?;
    log::info!("listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

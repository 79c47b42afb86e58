//! docrag command-line entry point.
//!
//! No flags: ingests every supported file under `data/inputs`, prints the
//! ingest report and collection statistics, then runs one demonstration
//! query against the freshly built collection.

use std::sync::Arc;

use anyhow::Context;

use docrag::{
    EmbeddingProvider, GeminiChat, GeminiEmbedder, IngestionPipeline, Metric, QueryEngine,
    RecursiveChunker, Settings, SqliteVectorStore,
};

/// The directory ingested on every run.
const INPUT_DIR: &str = "data/inputs";

/// The demonstration question issued after ingestion.
const DEMO_QUESTION: &str = "What are the key points covered in these documents?";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let settings = Settings::from_env().context("configuration")?;

    let embedder = Arc::new(GeminiEmbedder::new(
        settings.google_api_key.clone(),
        settings.embedding_model.clone(),
    )?);
    let model = Arc::new(GeminiChat::new(
        settings.google_api_key.clone(),
        settings.llm_model.clone(),
        settings.temperature,
    )?);
    let store = Arc::new(
        SqliteVectorStore::open(
            settings.vector_store_path.join("docrag.db"),
            settings.collection_name.clone(),
            embedder.dimensions(),
            Metric::Cosine,
        )
        .await?,
    );
    let chunker = Arc::new(RecursiveChunker::new(settings.chunk_size, settings.chunk_overlap)?);

    let pipeline = IngestionPipeline::builder()
        .collection_name(settings.collection_name.clone())
        .chunker(chunker)
        .embedder(embedder.clone())
        .store(store.clone())
        .build()?;

    println!("Loading and ingesting documents from {INPUT_DIR}...");
    let report = pipeline.ingest_directory(INPUT_DIR).await?;
    println!(
        "  loaded {} document(s), skipped {}, failed {}",
        report.documents_loaded, report.files_skipped, report.files_failed
    );
    println!("  created {} chunk(s), added {} record(s)", report.chunks_created, report.records_added);

    let stats = pipeline.stats().await?;
    println!("Collection '{}' now holds {} record(s)", stats.collection_name, stats.count);

    let engine = QueryEngine::new(embedder, store, model, settings.top_k)?;
    println!("\nQuestion: {DEMO_QUESTION}");
    let answer = engine.answer(DEMO_QUESTION).await?;
    println!("Answer: {}", answer.text);

    if !answer.sources.is_empty() {
        println!("\nSources:");
        for (i, source) in answer.sources.iter().enumerate() {
            println!("  {}. [score={:.4}] {}", i + 1, source.score, source.chunk.source());
        }
    }

    Ok(())
}

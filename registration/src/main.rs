//! Startline registration worker.
//!
//! Reads one JSON submission per line on stdin, runs it through the
//! pipeline against `PostgreSQL`, and writes one JSON receipt (or error
//! payload) per line on stdout. HTTP transport lives elsewhere; this
//! binary is the pipeline's composition root.

use anyhow::Context;
use registration::{
    Config, ErrorResponse, MockFormRenderer, SubmissionRequest, SubmissionService,
};
use sqlx::postgres::PgPoolOptions;
use startline_core::environment::SystemClock;
use startline_postgres::{LatestRecordSeeder, PostgresRecordStore, PostgresSequenceStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_new(&config.log_level)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let pool = PgPoolOptions::new()
        .max_connections(config.postgres.max_connections)
        .min_connections(config.postgres.min_connections)
        .acquire_timeout(Duration::from_secs(config.postgres.connect_timeout))
        .idle_timeout(Duration::from_secs(config.postgres.idle_timeout))
        .connect(&config.postgres.url)
        .await
        .context("Failed to connect to PostgreSQL")?;

    let records = Arc::new(PostgresRecordStore::new(pool.clone()));
    records.migrate().await?;

    let sequences = Arc::new(PostgresSequenceStore::new(
        pool.clone(),
        Arc::new(LatestRecordSeeder::new(pool)),
    ));
    let renderer = Arc::new(MockFormRenderer::new(config.renderer.output_dir.clone()));
    let service = SubmissionService::new(sequences, records, renderer, Arc::new(SystemClock))
        .with_render_timeout(Duration::from_millis(config.renderer.timeout_ms));

    tracing::info!("Registration worker ready, reading submissions from stdin");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let request: SubmissionRequest = match serde_json::from_str(&line) {
            Ok(request) => request,
            Err(error) => {
                tracing::error!(error = %error, "Discarding unparseable submission line");
                continue;
            }
        };
        match service.submit(request).await {
            Ok(receipt) => println!("{}", serde_json::to_string(&receipt)?),
            Err(error) => {
                println!("{}", serde_json::to_string(&ErrorResponse::from(&error))?);
            }
        }
    }

    Ok(())
}

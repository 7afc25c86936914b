use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use shortlist_pipeline::config::Config;
use shortlist_pipeline::currency::HttpFxConverter;
use shortlist_pipeline::llm_client::GroqClient;
use shortlist_pipeline::models::intake::IntakeSubmission;
use shortlist_pipeline::store::AirtableStore;
use shortlist_pipeline::{Pipeline, PipelineSettings};

/// Runner for the shortlisting pipeline. With a path argument, reads an
/// intake submission from that JSON file and processes it; without one,
/// re-evaluates the existing applicant pool. The front door calls into the
/// same library API; this binary exists for operations and local runs.
#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.rust_log.clone())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting shortlist pipeline v{}", env!("CARGO_PKG_VERSION"));

    let store = Arc::new(AirtableStore::new(
        config.store_api_key.clone(),
        config.store_base_id.clone(),
    ));
    let fx = Arc::new(HttpFxConverter::new(config.fx_api_url.clone()));
    let completion = Arc::new(GroqClient::new(config.completion_api_key.clone()));

    let pipeline = Pipeline::new(store, fx, completion, PipelineSettings::from_config(&config));

    let outcome = match std::env::args().nth(1) {
        Some(path) => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("Could not read intake file '{path}'"))?;
            let submission: IntakeSubmission = serde_json::from_str(&raw)
                .with_context(|| format!("Intake file '{path}' is not a valid submission"))?;
            info!("Processing submission from {}", submission.full_name);
            pipeline.process_submission(submission).await?
        }
        None => {
            info!("No intake file given; re-evaluating the applicant pool");
            pipeline.run_shortlist().await?
        }
    };

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

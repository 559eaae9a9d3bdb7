mod config;
mod db;
mod errors;
mod interview;
mod jobs;
mod llm_client;
mod models;
mod routes;
mod speech;
mod state;
mod store;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::interview::analyzer::TranscriptAnalyzer;
use crate::interview::controller::SessionController;
use crate::interview::turn::TurnProcessor;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::speech::storage::AudioStore;
use crate::speech::tts::TtsClient;
use crate::speech::{HostedSpeech, SpeechSynthesizer};
use crate::state::AppState;
use crate::store::postgres::PgStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Interviewer API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL (runs pending migrations)
    let db = create_pool(&config.database_url).await?;
    let store = Arc::new(PgStore::new(db));

    // Initialize LLM client (transcription + chat)
    let llm = Arc::new(LlmClient::new(
        config.groq_api_key.clone(),
        config.groq_base_url.clone(),
    )?);
    info!("LLM client initialized (model: {})", llm_client::CHAT_MODEL);

    // Initialize speech synthesis (TTS + S3 / MinIO)
    let speech: Option<Arc<dyn SpeechSynthesizer>> = if config.speech_enabled {
        let tts = TtsClient::new(
            config.groq_api_key.clone(),
            config.groq_base_url.clone(),
            config.tts_voice.clone(),
        )?;
        let s3 = build_s3_client(&config).await;
        let audio = AudioStore::new(
            s3,
            config.s3_bucket.clone(),
            Duration::from_secs(config.audio_url_ttl_secs),
        );
        info!("Speech synthesis enabled (voice: {})", config.tts_voice);
        Some(Arc::new(HostedSpeech::new(tts, audio)))
    } else {
        info!("Speech synthesis disabled; replies are text-only");
        None
    };

    // Build the interview pipeline
    let turns = TurnProcessor::new(llm.clone(), llm.clone(), speech);
    let controller =
        SessionController::new(turns.clone(), TranscriptAnalyzer::new(llm), store.clone());

    // Build app state
    let state = AppState::new(store, turns, controller);

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins to the deployed frontend

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "interviewer-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}

use std::sync::Arc;

use anyhow::Context;

use trades_intake::config::AppConfig;
use trades_intake::conversation::ConversationOrchestrator;
use trades_intake::leads::LeadSink;
use trades_intake::llm::create_provider;
use trades_intake::server::build_router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Optional .env for local runs; real deployments set the environment.
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        eprintln!("  export OPENAI_API_KEY=sk-...");
        std::process::exit(1);
    });

    let sink = Arc::new(LeadSink::from_config(&config.leads));

    eprintln!("🔧 Trades Intake v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", config.llm.model);
    eprintln!("   Chat API: http://0.0.0.0:{}/api/ai", config.port);
    eprintln!("   Lead API: http://0.0.0.0:{}/api/log", config.port);
    eprintln!("   Leads: {}\n", sink.describe());

    let llm = create_provider(&config.llm);
    let orchestrator = Arc::new(ConversationOrchestrator::new(llm));
    let app = build_router(orchestrator, sink, config.max_body_bytes);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("Failed to bind port {}", config.port))?;
    tracing::info!(port = config.port, "Intake server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown requested");
        })
        .await
        .context("Server error")?;

    Ok(())
}

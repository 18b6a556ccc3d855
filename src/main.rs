use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use viva::agent::NatsAgent;
use viva::http::{create_router, AppState};
use viva::Config;

#[derive(Parser, Debug)]
#[command(name = "viva", about = "Real-time voice interview session service")]
struct Args {
    /// Path to the configuration file (without extension)
    #[arg(short, long, default_value = "config/viva")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)
        .with_context(|| format!("failed to load config from {}", args.config))?;

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));

    let agent = NatsAgent::connect(
        &cfg.nats.url,
        cfg.agent.open_timeout(),
        cfg.agent.completion_timeout(),
    )
    .await
    .context("failed to connect to the interview agent transport")?;

    let bind = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let state = AppState::new(Arc::new(agent), Arc::new(cfg));
    let router = create_router(state);

    info!("Listening on http://{}", bind);
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    axum::serve(listener, router)
        .await
        .context("http server error")?;

    Ok(())
}

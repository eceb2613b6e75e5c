use anyhow::Context;
use clap::Parser;
use minutes_api::{api, config, logging, pipeline::MinutesService};
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(
    name = "minutes-api",
    about = "Turn meeting transcripts into formatted minutes over HTTP"
)]
struct Cli {
    /// Port to listen on (overrides SERVER_PORT).
    #[arg(long)]
    port: Option<u16>,
    /// Directory for uploaded transcripts (overrides UPLOAD_FOLDER).
    #[arg(long)]
    upload_dir: Option<PathBuf>,
    /// Directory for rendered minutes (overrides OUTPUT_FOLDER).
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let env_file = config::load_env_file();
    logging::init_tracing();
    if let Some(path) = env_file {
        tracing::debug!(path = %path.display(), "Loaded .env file");
    }
    let config = config::init_config(config::Overrides {
        port: cli.port,
        upload_dir: cli.upload_dir,
        output_dir: cli.output_dir,
    })
    .context("Failed to load configuration")?;

    let config = Arc::new(config);
    let service = MinutesService::new(config.clone()).context("Failed to build LLM clients")?;
    service
        .ensure_directories()
        .await
        .context("Failed to create working directories")?;
    let app = api::create_router(Arc::new(service), config.max_upload_bytes);

    let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, config.server_port))
        .await
        .with_context(|| format!("Failed to bind port {}", config.server_port))?;
    tracing::info!("Listening on http://0.0.0.0:{}", config.server_port);
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

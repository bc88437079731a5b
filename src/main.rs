use anyhow::Result;
use clap::Parser;
use qweather_mcp_server::{Cli, Config, QWeather};
use rmcp::ServiceExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "qweather_mcp_server=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_cli(Cli::parse())?;
    tracing::info!(
        api_host = %config.api_host,
        key_id = config.credentials.key_id(),
        project_id = config.credentials.project_id(),
        "Starting QWeather MCP server"
    );

    let weather = QWeather::new(config)?;
    let server = weather.serve(rmcp::transport::stdio()).await?;
    tracing::info!("QWeather MCP server running on stdio");
    server.waiting().await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

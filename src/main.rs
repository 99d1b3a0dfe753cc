use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use onboarding_backend::{
    config::{Config, LogFormat},
    database::pool::{create_pool, run_migrations},
    repositories::Repositories,
    routes::build_router,
    services::{mail_service::HttpMailTransport, pdf_service::HttpPdfConverter},
    AppState,
};
use reqwest::Client;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter).with_target(false);
    match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.compact().try_init(),
    }
    .map_err(|e| anyhow::anyhow!("failed to initialise tracing: {}", e))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Arc::new(Config::from_env()?);
    init_tracing(config.log_format)?;

    let pool = create_pool(&config).await.context("connecting to database")?;
    run_migrations(&pool).await.context("running migrations")?;

    let http_client = Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .timeout(Duration::from_secs(60))
        .build()?;
    let mail_transport = Arc::new(HttpMailTransport::new(
        http_client.clone(),
        config.mail_relay_url.clone(),
        config.mail_relay_token.clone(),
    ));
    let pdf_converter = Arc::new(HttpPdfConverter::new(
        http_client,
        config.pdf_service_url.clone(),
        Duration::from_secs(config.pdf_timeout_secs),
    ));

    let state = AppState::new(
        config.clone(),
        Repositories::postgres(pool),
        mail_transport,
        pdf_converter,
    )?;
    let app = build_router(state)?;

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}

use std::net::SocketAddr;
use std::path::PathBuf;

use tracing::info;

use farmlink_api::{AppStateInner, build_router};

struct Config {
    db_path: PathBuf,
    host: String,
    port: u16,
}

impl Config {
    fn from_env() -> anyhow::Result<Self> {
        let db_path = std::env::var("FARMLINK_DB_PATH").unwrap_or_else(|_| "farmlink.db".into());
        let host = std::env::var("FARMLINK_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = std::env::var("FARMLINK_PORT")
            .unwrap_or_else(|_| "5000".into())
            .parse()?;

        Ok(Self {
            db_path: db_path.into(),
            host,
            port,
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "farmlink_server=debug,farmlink_api=debug,farmlink_db=info,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    let db = farmlink_db::Database::open(&config.db_path)?;
    let app = build_router(AppStateInner::new(db));

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("FarmLink server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let Ok(mut sigterm) =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        else {
            ctrl_c.await.ok();
            info!("Received Ctrl+C, shutting down...");
            return;
        };
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}

use credentials_api::config::Config;
use credentials_api::db::{self, CredentialsStorage};
use credentials_api::router::{ApiState, api_router};
use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = match Config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            init_tracing(&Config::default().basic.loglevel);
            error!(error = %e, "invalid configuration; refusing to start");
            return Err(e.into());
        }
    };
    init_tracing(&cfg.basic.loglevel);

    info!(
        database_url = %cfg.database.url,
        environment = %cfg.basic.environment,
        loglevel = %cfg.basic.loglevel,
        query_timeout_secs = cfg.database.query_timeout_secs
    );

    let pool = db::connect(&cfg.database).await?;
    info!(max_connections = cfg.database.max_connections, "database connection pool established");

    let storage = CredentialsStorage::new(pool, cfg.database.query_timeout());
    storage.init_schema().await?;

    let state = ApiState::new(storage, cfg.basic.environment.as_str());
    let app = api_router(state);

    let listener = TcpListener::bind(&cfg.basic.listen_addr).await?;
    info!(env = %cfg.basic.environment, "HTTP server listening on {}", cfg.basic.listen_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

fn init_tracing(loglevel: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(loglevel));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received, draining in-flight requests");
}

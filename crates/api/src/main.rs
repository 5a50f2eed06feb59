//! Order service entry point.

use api::config::{Config, LogFormat};
use api::clients::HttpUserClient;
use axum::Router;
use domain::InMemoryOrderRepository;
use order_store::PostgresOrderRepository;
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

#[tokio::main]
async fn main() {
    // 1. Load configuration and initialize tracing
    let config = Config::from_env();
    init_tracing(&config);

    // 2. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Build the user service client
    let users = HttpUserClient::new(&config.user_service_url, config.user_service_timeout)
        .expect("failed to build user service client");
    tracing::info!(
        url = %config.user_service_url,
        timeout_ms = config.user_service_timeout.as_millis() as u64,
        "user enrichment enabled"
    );

    // 4. Pick the order store and build the application
    let app: Router = match &config.database_url {
        Some(url) => {
            let repository =
                PostgresOrderRepository::connect(url, config.database_max_connections)
                    .await
                    .expect("failed to connect to database");
            repository
                .run_migrations()
                .await
                .expect("failed to run migrations");
            tracing::info!("using PostgreSQL order store");
            api::create_app(api::create_default_state(repository, users), metrics_handle)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, orders are kept in memory");
            api::create_app(
                api::create_default_state(InMemoryOrderRepository::new(), users),
                metrics_handle,
            )
        }
    };

    // 5. Start server
    let addr = config.addr();
    tracing::info!(%addr, "starting order service");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}

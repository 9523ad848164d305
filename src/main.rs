use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tradebook::application::services::consortium_service::ConsortiumService;
use tradebook::application::services::journal_service::JournalService;
use tradebook::application::state::{build_router, AppState};
use tradebook::auth::{Authenticator, SessionIssuer};
use tradebook::config::JournalConfig;
use tradebook::persistence::json_store::JsonStore;
use tradebook::persistence::{init_database, DatabaseConfig};
use tradebook::rate_limit::create_rate_limiter;
use tradebook::secrets::validate_secret_strength;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env is optional
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tradebook=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Tradebook journal server starting...");

    let config = JournalConfig::from_env();
    info!("Journal data directory: {}", config.data_dir.display());

    let pool = init_database(&DatabaseConfig::from_env()).await?;
    let consortium = ConsortiumService::new(pool.clone());

    match &config.consortium_admin_password {
        Some(password) => {
            if let Err(e) = validate_secret_strength(password, 8) {
                warn!("Weak CONSORTIUM_ADMIN_PASSWORD: {}", e);
            }
            consortium
                .ensure_admin(&config.consortium_admin_username, password)
                .await?;
        }
        None => warn!("CONSORTIUM_ADMIN_PASSWORD not set, no consortium admin seeded"),
    }

    let state = AppState {
        journal: Arc::new(JournalService::new(JsonStore::new(&config.data_dir))),
        consortium,
        auth: Authenticator::new(
            config.credentials.clone(),
            SessionIssuer::new(&config.session_secret, config.session_ttl),
        ),
        login_limiter: create_rate_limiter(config.login_rate_limit),
    };
    let app = build_router(state, config.max_body_bytes);

    info!("Listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;

    let shutdown_signal = async {
        let ctrl_c = async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Received Ctrl+C signal"),
                Err(e) => error!("Failed to install Ctrl+C handler: {}", e),
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut sig) => {
                    sig.recv().await;
                    info!("Received SIGTERM signal");
                }
                Err(e) => error!("Failed to install SIGTERM handler: {}", e),
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {},
            _ = terminate => {},
        }
    };

    info!("Server started successfully. Press Ctrl+C to stop.");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shutting down gracefully...");
    pool.close().await;

    info!("Shutdown complete");
    Ok(())
}

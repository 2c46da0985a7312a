use secrecy::ExposeSecret;
use service_core::error::AppError;
use service_core::observability::{init_tracing, install_prometheus_recorder};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tourney_auth::{
    build_router,
    config::{AuthConfig, MailTransport},
    db,
    services::{EmailProvider, LogEmailProvider, PgAccountStore, SmtpEmailProvider},
    utils::Password,
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Load configuration - fail fast if invalid
    let config = AuthConfig::from_env()?;

    init_tracing(
        &config.service_name,
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    )?;

    let metrics = install_prometheus_recorder()?;

    tracing::info!(
        service = %config.service_name,
        version = env!("CARGO_PKG_VERSION"),
        environment = ?config.environment,
        "Starting tournament auth service"
    );

    let pool = db::create_pool(&config.database).await?;
    db::run_migrations(&pool).await?;
    let store = Arc::new(PgAccountStore::new(pool));

    let email: Arc<dyn EmailProvider> = match (&config.mail.transport, &config.mail.smtp) {
        (MailTransport::Smtp, Some(smtp)) => Arc::new(
            SmtpEmailProvider::new(smtp, &config.mail.from)
                .map_err(|e| AppError::ConfigError(anyhow::Error::new(e)))?,
        ),
        (MailTransport::Smtp, None) => {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "MAIL_TRANSPORT=smtp requires SMTP settings"
            )))
        }
        (MailTransport::Log, _) => {
            tracing::info!("Using log-only email transport");
            Arc::new(LogEmailProvider)
        }
    };

    let state = AppState::new(config.clone(), store, email, metrics)?;

    if let Some(admin) = &config.bootstrap_admin {
        let password = Password::new(admin.password.expose_secret().to_string());
        state
            .auth_service
            .bootstrap_admin(&admin.email, password)
            .await?;
    }

    let app = build_router(state);

    let addr = config.common.socket_addr();

    let service_span = tracing::info_span!(
        "service",
        service = %config.service_name,
        environment = ?config.environment,
    );
    let _guard = service_span.enter();

    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}

use std::sync::Arc;

use anyhow::Result;
use aws_config::SdkConfig;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use attendance_api::{
    AppState,
    config::{ApiConfig, StoreBackend},
    repositories::{AttendanceRepository, DynamoRepository, MemoryRepository},
    routes,
};
use common::{
    database::{DatabaseConfig, init_client, load_sdk_config},
    notification::{LogNotifier, NotificationConfig, Notifier, SnsNotifier},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting attendance API service");

    let config = ApiConfig::from_env()?;
    let notification_config = NotificationConfig::from_env();

    let needs_aws =
        config.store == StoreBackend::Dynamodb || notification_config.topic_arn.is_some();
    let sdk_config = if needs_aws {
        Some(load_sdk_config().await)
    } else {
        None
    };

    let repository = init_repository(&config, sdk_config.as_ref()).await?;

    // Check store connectivity
    if repository.health_check().await? {
        info!("Attendance store connection successful");
    } else {
        anyhow::bail!("Failed to reach the attendance store");
    }

    let notifier = init_notifier(&notification_config, sdk_config.as_ref())?;

    info!("Attendance API service initialized successfully");

    let bind_address = config.bind_address();
    let app = routes::create_router(AppState::new(repository, notifier, config));

    let listener = TcpListener::bind(&bind_address).await?;
    info!("Attendance API service listening on {}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Attendance API service stopped");
    Ok(())
}

async fn init_repository(
    config: &ApiConfig,
    sdk_config: Option<&SdkConfig>,
) -> Result<Arc<dyn AttendanceRepository>> {
    match (config.store, sdk_config) {
        (StoreBackend::Dynamodb, Some(sdk_config)) => {
            let db_config = DatabaseConfig::from_env()?;
            let client = init_client(sdk_config, &db_config);
            info!("Using DynamoDB table {}", db_config.table_name);
            Ok(Arc::new(DynamoRepository::new(client, db_config.table_name)))
        }
        (StoreBackend::Dynamodb, None) => anyhow::bail!("AWS configuration was not loaded"),
        (StoreBackend::Memory, _) => {
            warn!("Using the in-memory store; records are lost on restart");
            Ok(Arc::new(MemoryRepository::new()))
        }
    }
}

fn init_notifier(
    config: &NotificationConfig,
    sdk_config: Option<&SdkConfig>,
) -> Result<Arc<dyn Notifier>> {
    match sdk_config {
        Some(sdk_config) if config.topic_arn.is_some() => {
            let notifier = SnsNotifier::new(sdk_config, config)?;
            info!("Publishing check-ins to {}", notifier.topic_arn());
            Ok(Arc::new(notifier))
        }
        _ => {
            warn!("SNS_TOPIC_ARN is not set; check-in notifications go to the log only");
            Ok(Arc::new(LogNotifier))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

mod config;
mod effects_stub;

use std::sync::Arc;

use hoster_effects::{AesGcmCipher, StoreBillingRecorder};
use sqlx::sqlite::SqlitePoolOptions;
use tracing_subscriber::EnvFilter;

use config::HosterConfig;
use effects_stub::{UnconfiguredCloudProviderFactory, UnconfiguredDockerPool, UnconfiguredPaymentProvider};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,tower_http=debug".parse().unwrap()))
        .init();
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    init_tracing();

    let config = HosterConfig::from_env()?;

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&config.storage_dsn)
        .await?;
    hoster_data_sqlx::run_migrations(&pool).await?;
    let store: Arc<dyn hoster_data::Store> = Arc::new(hoster_data_sqlx::SqliteStore::new(pool));

    let docker_pool: Arc<dyn hoster_effects::DockerNodePool> = Arc::new(UnconfiguredDockerPool);
    let cloud_provider_factory: Arc<dyn hoster_effects::CloudProviderFactory> = Arc::new(UnconfiguredCloudProviderFactory);
    let credential_cipher: Arc<dyn hoster_effects::CredentialCipher> =
        Arc::new(AesGcmCipher::new(&config.credential_encryption_key)?);
    let billing_recorder: Arc<dyn hoster_effects::BillingRecorder> = Arc::new(StoreBillingRecorder::new(store.clone()));
    let payment_provider: Arc<dyn hoster_effects::PaymentProvider> = Arc::new(UnconfiguredPaymentProvider);

    let extras = hoster_commands::Extras::new();
    extras.insert("base_domain", config.base_domain.clone());
    extras.insert("docker_pool", docker_pool.clone());
    extras.insert("credential_cipher", credential_cipher.clone());
    extras.insert("cloud_provider_factory", cloud_provider_factory.clone());
    extras.insert("billing_recorder", billing_recorder);

    let bus = hoster_commands::default_bus();

    let workers = hoster_workers::Workers::spawn(
        store.clone(),
        docker_pool,
        cloud_provider_factory,
        credential_cipher.clone(),
    );

    let state = hoster_api::ApiState::new(
        store,
        bus,
        extras,
        payment_provider,
        credential_cipher,
        config.gateway_secret.clone(),
    );
    let router = hoster_api::build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "hoster listening");

    let shutdown = shutdown_signal();
    axum::serve(listener, router).with_graceful_shutdown(shutdown).await?;

    workers.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("shutdown signal received");
}

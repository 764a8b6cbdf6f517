//! Reconciliation workers (C8): three independent, cancellable loops that
//! keep infrastructure state converging with what the store records.
//! Nothing here is reachable from the REST surface (C7) — workers only
//! ever talk to the store and the effect interfaces (C9).

pub mod cloud_provisioner;
pub mod invoice_generator;
pub mod node_health;
pub mod support;

pub use support::WorkerHandle;

use std::sync::Arc;
use std::time::Duration;

use hoster_data::Store;
use hoster_effects::{CloudProviderFactory, CredentialCipher, DockerNodePool};

pub const DEFAULT_NODE_HEALTH_PERIOD: Duration = Duration::from_secs(60);
pub const DEFAULT_CLOUD_PROVISIONER_PERIOD: Duration = Duration::from_secs(5);
pub const DEFAULT_INVOICE_GENERATOR_PERIOD: Duration = Duration::from_secs(24 * 60 * 60);

/// All three reconciliation loops, started together and stopped together.
pub struct Workers {
    node_health: WorkerHandle,
    cloud_provisioner: WorkerHandle,
    invoice_generator: WorkerHandle,
}

impl Workers {
    pub fn spawn(
        store: Arc<dyn Store>,
        docker_pool: Arc<dyn DockerNodePool>,
        cloud_provider_factory: Arc<dyn CloudProviderFactory>,
        credential_cipher: Arc<dyn CredentialCipher>,
    ) -> Self {
        Self {
            node_health: node_health::spawn(store.clone(), docker_pool.clone(), DEFAULT_NODE_HEALTH_PERIOD),
            cloud_provisioner: cloud_provisioner::spawn(
                store.clone(),
                cloud_provider_factory,
                credential_cipher,
                docker_pool,
                DEFAULT_CLOUD_PROVISIONER_PERIOD,
            ),
            invoice_generator: invoice_generator::spawn(store, DEFAULT_INVOICE_GENERATOR_PERIOD),
        }
    }

    /// Signal every loop to stop; each finishes its in-flight cycle first.
    pub async fn shutdown(self) {
        self.node_health.cancel();
        self.cloud_provisioner.cancel();
        self.invoice_generator.cancel();
        self.node_health.join().await;
        self.cloud_provisioner.join().await;
        self.invoice_generator.join().await;
    }
}

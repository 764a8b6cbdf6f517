use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Errors from Docker node pool / orchestrator calls. Kept deliberately
/// narrow — this is the boundary the store and REST surface never cross.
#[derive(Debug, Clone)]
pub struct DockerError(pub String);

impl std::fmt::Display for DockerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "docker error: {}", self.0)
    }
}

impl std::error::Error for DockerError {}

/// One `docker-compose`-style service definition resolved from a
/// template's compose spec, ready to hand to an orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposeSpec {
    pub raw_yaml: String,
    pub config_files: Vec<(String, String)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerInfo {
    pub container_id: String,
    pub service_name: String,
}

/// Per-node Docker client. Obtained from [`DockerNodePool::get_client`];
/// `Arc`-wrapped so it can be cached and shared across concurrent
/// reconciler cycles.
#[async_trait]
pub trait DockerOrchestrator: Send + Sync {
    async fn start_deployment(
        &self,
        deployment_reference_id: &str,
        compose: &ComposeSpec,
    ) -> Result<Vec<ContainerInfo>, DockerError>;

    async fn stop_deployment(&self, deployment_reference_id: &str) -> Result<(), DockerError>;

    async fn remove_deployment(&self, deployment_reference_id: &str) -> Result<(), DockerError>;
}

/// Lazily-populated, at-most-one-dial-per-node client cache, plus the ping
/// probe the node health checker uses.
#[async_trait]
pub trait DockerNodePool: Send + Sync {
    async fn get_client(
        &self,
        node_reference_id: &str,
    ) -> Result<Arc<dyn DockerOrchestrator>, DockerError>;

    async fn ping_node(&self, node_reference_id: &str) -> Result<(), DockerError>;
}

//! Placeholder adapters for the effect interfaces that have no concrete
//! implementation in this tree (C9 is intentionally traits-only beyond
//! credential encryption and billing). These exist purely so the binary
//! has something to wire into `Extras` and `Workers::spawn`; every method
//! returns a clear "not configured" error rather than touching a network.

use async_trait::async_trait;
use hoster_effects::{
    CheckoutSession, CloudError, CloudProvider, CloudProviderFactory, ComposeSpec, ContainerInfo,
    DockerError, DockerNodePool, DockerOrchestrator, InstanceHandle, InstanceSpec, PaymentError,
    PaymentProvider, PaymentStatus,
};
use std::sync::Arc;

pub struct UnconfiguredDockerPool;

#[async_trait]
impl DockerNodePool for UnconfiguredDockerPool {
    async fn get_client(&self, node_reference_id: &str) -> Result<Arc<dyn DockerOrchestrator>, DockerError> {
        Err(DockerError(format!("no docker orchestrator configured for node {node_reference_id}")))
    }

    async fn ping_node(&self, node_reference_id: &str) -> Result<(), DockerError> {
        Err(DockerError(format!("no docker orchestrator configured for node {node_reference_id}")))
    }
}

#[allow(dead_code)]
pub struct UnconfiguredDockerOrchestrator;

#[async_trait]
impl DockerOrchestrator for UnconfiguredDockerOrchestrator {
    async fn start_deployment(&self, _: &str, _: &ComposeSpec) -> Result<Vec<ContainerInfo>, DockerError> {
        Err(DockerError("no docker orchestrator configured".to_string()))
    }

    async fn stop_deployment(&self, _: &str) -> Result<(), DockerError> {
        Err(DockerError("no docker orchestrator configured".to_string()))
    }

    async fn remove_deployment(&self, _: &str) -> Result<(), DockerError> {
        Err(DockerError("no docker orchestrator configured".to_string()))
    }
}

pub struct UnconfiguredCloudProviderFactory;

impl CloudProviderFactory for UnconfiguredCloudProviderFactory {
    fn new_provider(&self, provider: &str, _decrypted_credentials: &str) -> Result<Box<dyn CloudProvider>, CloudError> {
        Err(CloudError(format!("no cloud provider integration configured for '{provider}'")))
    }
}

#[allow(dead_code)]
pub struct UnconfiguredCloudProvider;

#[async_trait]
impl CloudProvider for UnconfiguredCloudProvider {
    async fn create_instance(&self, _spec: &InstanceSpec) -> Result<InstanceHandle, CloudError> {
        Err(CloudError("no cloud provider integration configured".to_string()))
    }

    async fn destroy_instance(&self, _provider_instance_id: &str) -> Result<(), CloudError> {
        Err(CloudError("no cloud provider integration configured".to_string()))
    }
}

/// Used when `HOSTER_PAYMENT_PROVIDER_API_KEY` is unset — `invoice.pay` and
/// `invoice.verify-payment` surface a clear 500 instead of silently no-oping.
pub struct UnconfiguredPaymentProvider;

#[async_trait]
impl PaymentProvider for UnconfiguredPaymentProvider {
    async fn create_checkout_session(&self, _invoice_reference_id: &str, _total_cents: i64) -> Result<CheckoutSession, PaymentError> {
        Err(PaymentError("no payment provider configured".to_string()))
    }

    async fn check_status(&self, _session_id: &str) -> Result<PaymentStatus, PaymentError> {
        Err(PaymentError("no payment provider configured".to_string()))
    }
}

use async_trait::async_trait;

#[derive(Debug, Clone)]
pub struct CloudError(pub String);

impl std::fmt::Display for CloudError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cloud provider error: {}", self.0)
    }
}

impl std::error::Error for CloudError {}

#[derive(Debug, Clone)]
pub struct InstanceSpec {
    pub instance_name: String,
    pub region: String,
    pub size: String,
    pub ssh_public_key: String,
}

#[derive(Debug, Clone)]
pub struct InstanceHandle {
    pub provider_instance_id: String,
    pub public_ip: String,
}

/// A single cloud account's API surface: create and destroy compute
/// instances. One instance of this trait is scoped to one decrypted
/// credential.
#[async_trait]
pub trait CloudProvider: Send + Sync {
    async fn create_instance(&self, spec: &InstanceSpec) -> Result<InstanceHandle, CloudError>;
    async fn destroy_instance(&self, provider_instance_id: &str) -> Result<(), CloudError>;
}

/// Builds a [`CloudProvider`] for a named provider (`"aws"`, `"hetzner"`,
/// `"digitalocean"`, ...) from already-decrypted credentials.
pub trait CloudProviderFactory: Send + Sync {
    fn new_provider(
        &self,
        provider: &str,
        decrypted_credentials: &str,
    ) -> Result<Box<dyn CloudProvider>, CloudError>;
}

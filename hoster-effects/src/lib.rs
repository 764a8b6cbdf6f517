//! Narrow external-effect interfaces for Hoster (C9): Docker, cloud
//! providers, credential encryption, payment, and billing. Nothing in
//! `hoster-data` or `hoster-api` depends on this crate — only the command
//! handlers and reconciliation workers reach for these traits.

pub mod billing;
pub mod cloud;
pub mod crypto;
pub mod docker;
pub mod payment;

pub use billing::{BillingRecorder, StoreBillingRecorder};
pub use cloud::{CloudError, CloudProvider, CloudProviderFactory, InstanceHandle, InstanceSpec};
pub use crypto::{AesGcmCipher, CredentialCipher, CryptoError};
pub use docker::{ComposeSpec, ContainerInfo, DockerError, DockerNodePool, DockerOrchestrator};
pub use payment::{CheckoutSession, PaymentError, PaymentProvider, PaymentStatus};

use std::sync::Arc;

use hoster_commands::{CommandBus, Extras};
use hoster_data::Store;
use hoster_effects::{CredentialCipher, PaymentProvider};

/// Shared axum state: the store, the command bus and its extras for
/// dispatching on-enter commands after a transition, the payment provider
/// for the invoice custom actions, the credential cipher for `.encrypted()`
/// fields on create/update, and the optional gateway secret.
#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<dyn Store>,
    pub bus: CommandBus,
    pub extras: Extras,
    pub payment_provider: Arc<dyn PaymentProvider>,
    pub credential_cipher: Arc<dyn CredentialCipher>,
    pub gateway_secret: Option<String>,
}

impl ApiState {
    pub fn new(
        store: Arc<dyn Store>,
        bus: CommandBus,
        extras: Extras,
        payment_provider: Arc<dyn PaymentProvider>,
        credential_cipher: Arc<dyn CredentialCipher>,
        gateway_secret: Option<String>,
    ) -> Self {
        Self { store, bus, extras, payment_provider, credential_cipher, gateway_secret }
    }
}

use async_trait::async_trait;

#[derive(Debug, Clone)]
pub struct PaymentError(pub String);

impl std::fmt::Display for PaymentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "payment provider error: {}", self.0)
    }
}

impl std::error::Error for PaymentError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

#[derive(Debug, Clone)]
pub struct CheckoutSession {
    pub checkout_url: String,
    pub session_id: String,
}

/// Opaque REST client used only from the `invoice` resource's `pay` and
/// `verify-payment` custom action handlers — never from the generic CRUD
/// or transition surface.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn create_checkout_session(
        &self,
        invoice_reference_id: &str,
        total_cents: i64,
    ) -> Result<CheckoutSession, PaymentError>;

    async fn check_status(&self, session_id: &str) -> Result<PaymentStatus, PaymentError>;
}

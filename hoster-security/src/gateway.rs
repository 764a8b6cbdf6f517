use crate::error::SecurityError;
use crate::header::HeaderGetter;

/// Check the `X-APIGate-Secret` header against the configured shared
/// secret. When no secret is configured, the check is skipped entirely —
/// this deployment isn't sitting behind a gateway that sets one.
pub fn check_gateway_secret<H: HeaderGetter>(
    headers: &H,
    configured: Option<&str>,
) -> Result<(), SecurityError> {
    let Some(expected) = configured else {
        return Ok(());
    };
    match headers.header("X-APIGate-Secret") {
        Some(actual) if actual == expected => Ok(()),
        _ => Err(SecurityError::GatewaySecretMismatch),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn skips_check_when_unconfigured() {
        let headers: HashMap<&str, &str> = HashMap::new();
        assert!(check_gateway_secret(&headers, None).is_ok());
    }

    #[test]
    fn rejects_mismatched_secret() {
        let mut headers = HashMap::new();
        headers.insert("X-APIGate-Secret", "wrong");
        assert!(check_gateway_secret(&headers, Some("right")).is_err());
    }

    #[test]
    fn accepts_matching_secret() {
        let mut headers = HashMap::new();
        headers.insert("X-APIGate-Secret", "right");
        assert!(check_gateway_secret(&headers, Some("right")).is_ok());
    }
}

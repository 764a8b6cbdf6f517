use crate::header::HeaderGetter;
use crate::jwt::decode_bearer_claims;
use crate::plan_limits::PlanLimits;

/// The resolved request identity. Constructed once per request by
/// [`resolve`]; the internal numeric `user_id` is filled in afterwards by
/// the identity-resolution middleware, which upserts `external_user_id`
/// into the user table.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    external_user_id: Option<String>,
    pub plan_id: Option<String>,
    pub plan_limits: PlanLimits,
    pub key_id: Option<String>,
    pub organization_id: Option<String>,
    pub user_id: Option<i64>,
}

impl AuthContext {
    pub fn unauthenticated() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.external_user_id.as_deref().is_some_and(|s| !s.is_empty())
    }

    pub fn external_user_id(&self) -> Option<&str> {
        self.external_user_id.as_deref()
    }

    /// Attach the internal numeric id resolved by the identity-upsert
    /// middleware. Returns `self` for chaining into state construction.
    pub fn with_user_id(mut self, id: i64) -> Self {
        self.user_id = Some(id);
        self
    }
}

/// Resolve an [`AuthContext`] from request headers.
///
/// `X-User-ID` (plus its siblings) takes priority; if absent, falls back to
/// decoding (without verifying) the payload of a `Bearer` JWT in the
/// `Authorization` header. A context is authenticated iff a non-empty
/// external user id was obtained by either path.
pub fn resolve<H: HeaderGetter>(headers: &H) -> AuthContext {
    let header_user = headers.header("X-User-ID").filter(|s| !s.is_empty());
    let mut plan_id = headers.header("X-Plan-ID");
    let key_id = headers.header("X-Key-ID");
    let organization_id = headers.header("X-Organization-ID");

    let external_user_id = match header_user {
        Some(user) => Some(user),
        None => {
            let claims = headers
                .header("Authorization")
                .as_deref()
                .and_then(decode_bearer_claims);
            if let Some(claims) = claims {
                if plan_id.is_none() {
                    plan_id = claims.pid;
                }
                claims.sub
            } else {
                None
            }
        }
    };

    let plan_limits_raw = headers.header("X-Plan-Limits").unwrap_or_default();
    let (plan_limits, parse_error) = PlanLimits::parse(&plan_limits_raw);
    if let Some(message) = parse_error {
        tracing::warn!(%message, "rejecting malformed X-Plan-Limits header, using defaults");
    }

    AuthContext {
        external_user_id,
        plan_id,
        plan_limits,
        key_id,
        organization_id,
        user_id: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn trusted_header_takes_priority_over_bearer_token() {
        let mut headers = HashMap::new();
        headers.insert("X-User-ID", "user_A");
        let ctx = resolve(&headers);
        assert!(ctx.is_authenticated());
        assert_eq!(ctx.external_user_id(), Some("user_A"));
    }

    #[test]
    fn absent_user_header_falls_back_to_unverified_bearer_payload() {
        use base64::engine::general_purpose::URL_SAFE_NO_PAD;
        use base64::Engine;
        let header = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&serde_json::json!({"alg":"none"})).unwrap());
        let payload =
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&serde_json::json!({"sub":"user_B","pid":"pro"})).unwrap());
        let mut headers = HashMap::new();
        let auth = format!("Bearer {header}.{payload}.sig");
        headers.insert("Authorization", auth.as_str());
        let ctx = resolve(&headers);
        assert_eq!(ctx.external_user_id(), Some("user_B"));
        assert_eq!(ctx.plan_id.as_deref(), Some("pro"));
    }

    #[test]
    fn no_identity_source_is_unauthenticated() {
        let headers: HashMap<&str, &str> = HashMap::new();
        let ctx = resolve(&headers);
        assert!(!ctx.is_authenticated());
    }
}

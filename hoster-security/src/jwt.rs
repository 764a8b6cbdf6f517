use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::Value;

/// The two fields this system cares about in an unverified JWT payload.
#[derive(Debug, Clone, Default)]
pub struct UnverifiedClaims {
    pub sub: Option<String>,
    pub pid: Option<String>,
}

/// Decode a `Bearer <jwt>` header value's payload segment without
/// checking its signature. An upstream gateway is assumed to have already
/// validated the token; this only recovers `sub` and `pid` for routing
/// purposes when no trusted header was supplied directly.
pub fn decode_bearer_claims(auth_header: &str) -> Option<UnverifiedClaims> {
    let token = auth_header.strip_prefix("Bearer ")?;
    let mut segments = token.split('.');
    let _header = segments.next()?;
    let payload = segments.next()?;
    if segments.next().is_none() {
        return None;
    }

    let decoded = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let claims: Value = serde_json::from_slice(&decoded).ok()?;

    Some(UnverifiedClaims {
        sub: claims.get("sub").and_then(Value::as_str).map(str::to_string),
        pid: claims.get("pid").and_then(Value::as_str).map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_segment(value: &serde_json::Value) -> String {
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(value).unwrap())
    }

    #[test]
    fn decodes_sub_and_pid_from_payload() {
        let header = encode_segment(&serde_json::json!({"alg":"none"}));
        let payload = encode_segment(&serde_json::json!({"sub":"user_A","pid":"pro"}));
        let token = format!("Bearer {header}.{payload}.sig");
        let claims = decode_bearer_claims(&token).unwrap();
        assert_eq!(claims.sub.as_deref(), Some("user_A"));
        assert_eq!(claims.pid.as_deref(), Some("pro"));
    }

    #[test]
    fn rejects_non_bearer_scheme() {
        assert!(decode_bearer_claims("Basic abc.def.ghi").is_none());
    }

    #[test]
    fn rejects_malformed_segment_count() {
        assert!(decode_bearer_claims("Bearer onlyonepart").is_none());
    }
}

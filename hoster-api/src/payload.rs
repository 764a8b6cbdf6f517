use hoster_effects::CredentialCipher;
use hoster_schema::{Resource, Row};
use serde_json::Value;

use crate::error::ApiError;

/// Drops internal fields from an incoming create/patch body. Write-only
/// fields are left alone here — those are settable on input, just never
/// echoed back out (that stripping happens in `envelope`).
pub fn strip_internal(def: &Resource, mut payload: Row) -> Row {
    payload.retain(|key, _| !def.is_internal(key));
    payload
}

/// Replaces every `.encrypted()` field present in the payload with its
/// ciphertext, so the store never holds plaintext for columns like
/// `ssh_key.private_key_encrypted` or `cloud_credential.credentials_encrypted`.
/// Fields not present in this payload (e.g. an unrelated `patch`) are left
/// alone rather than erroring.
pub fn encrypt_fields(def: &Resource, cipher: &dyn CredentialCipher, mut payload: Row) -> Result<Row, ApiError> {
    for field in def.fields.iter().filter(|f| f.encrypted) {
        if let Some(Value::String(plaintext)) = payload.get(field.name) {
            let ciphertext = cipher.encrypt(plaintext).map_err(|err| ApiError::Internal(err.to_string()))?;
            payload.insert(field.name.to_string(), Value::String(ciphertext));
        }
    }
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hoster_schema::resource;
    use serde_json::json;

    #[test]
    fn drops_internal_fields_but_keeps_write_only() {
        let def = resource("ssh_key").expect("ssh_key resource exists");
        let mut payload = Row::new();
        payload.insert("creator_id".to_string(), json!(1));
        payload.insert("name".to_string(), json!("laptop"));
        payload.insert("public_key".to_string(), json!("ssh-ed25519 AAAA..."));
        payload.insert("private_key_encrypted".to_string(), json!("ciphertext"));

        let cleaned = strip_internal(def, payload);

        assert!(!cleaned.contains_key("creator_id"));
        assert!(cleaned.contains_key("name"));
        assert!(cleaned.contains_key("private_key_encrypted"));
    }

    #[test]
    fn encrypts_only_encrypted_fields_present_in_the_payload() {
        let def = resource("ssh_key").expect("ssh_key resource exists");
        let cipher = hoster_effects::AesGcmCipher::new(&[3u8; 32]).unwrap();
        let mut payload = Row::new();
        payload.insert("name".to_string(), json!("laptop"));
        payload.insert("private_key_encrypted".to_string(), json!("-----BEGIN KEY-----"));

        let encrypted = encrypt_fields(def, &cipher, payload).unwrap();

        assert_eq!(encrypted.get("name"), Some(&json!("laptop")));
        let ciphertext = encrypted.get("private_key_encrypted").and_then(Value::as_str).unwrap();
        assert_ne!(ciphertext, "-----BEGIN KEY-----");
        assert_eq!(cipher.decrypt(ciphertext).unwrap(), "-----BEGIN KEY-----");
    }

    #[test]
    fn leaves_missing_encrypted_fields_alone() {
        let def = resource("ssh_key").expect("ssh_key resource exists");
        let cipher = hoster_effects::AesGcmCipher::new(&[3u8; 32]).unwrap();
        let mut payload = Row::new();
        payload.insert("name".to_string(), json!("laptop"));

        let encrypted = encrypt_fields(def, &cipher, payload).unwrap();

        assert!(!encrypted.contains_key("private_key_encrypted"));
    }
}

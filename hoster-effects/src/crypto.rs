use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

#[derive(Debug, Clone)]
pub struct CryptoError(pub String);

impl std::fmt::Display for CryptoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "encryption error: {}", self.0)
    }
}

impl std::error::Error for CryptoError {}

/// `Encrypt`/`Decrypt` for write-only credential fields. The key is held
/// in process memory only, as the spec requires — never persisted
/// alongside the ciphertext it protects.
pub trait CredentialCipher: Send + Sync {
    fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError>;
    fn decrypt(&self, ciphertext: &str) -> Result<String, CryptoError>;
}

/// AES-256-GCM implementation. Ciphertext is stored as
/// `base64(nonce || tag || ciphertext)`, one random nonce per call.
pub struct AesGcmCipher {
    cipher: Aes256Gcm,
}

impl AesGcmCipher {
    /// `key` must be exactly 32 bytes (AES-256).
    pub fn new(key: &[u8]) -> Result<Self, CryptoError> {
        if key.len() != 32 {
            return Err(CryptoError(format!(
                "encryption key must be 32 bytes, got {}",
                key.len()
            )));
        }
        let key = Key::<Aes256Gcm>::from_slice(key);
        Ok(Self {
            cipher: Aes256Gcm::new(key),
        })
    }
}

impl CredentialCipher for AesGcmCipher {
    fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| CryptoError(format!("encrypt failed: {e}")))?;
        let mut out = Vec::with_capacity(nonce.len() + ciphertext.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(out))
    }

    fn decrypt(&self, ciphertext: &str) -> Result<String, CryptoError> {
        let raw = BASE64
            .decode(ciphertext)
            .map_err(|e| CryptoError(format!("invalid base64: {e}")))?;
        if raw.len() < 12 {
            return Err(CryptoError("ciphertext too short".to_string()));
        }
        let (nonce_bytes, ciphertext) = raw.split_at(12);
        let nonce = Nonce::from_slice(nonce_bytes);
        let plaintext = self
            .cipher
            .decrypt(nonce, ciphertext)
            .map_err(|e| CryptoError(format!("decrypt failed: {e}")))?;
        String::from_utf8(plaintext).map_err(|e| CryptoError(format!("invalid utf-8: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_cipher() -> AesGcmCipher {
        AesGcmCipher::new(&[7u8; 32]).unwrap()
    }

    #[test]
    fn round_trips_plaintext() {
        let cipher = test_cipher();
        let ciphertext = cipher.encrypt("super-secret-key").unwrap();
        assert_ne!(ciphertext, "super-secret-key");
        assert_eq!(cipher.decrypt(&ciphertext).unwrap(), "super-secret-key");
    }

    #[test]
    fn rejects_keys_of_the_wrong_length() {
        assert!(AesGcmCipher::new(&[1u8; 16]).is_err());
    }

    #[test]
    fn each_encryption_uses_a_fresh_nonce() {
        let cipher = test_cipher();
        let a = cipher.encrypt("same-plaintext").unwrap();
        let b = cipher.encrypt("same-plaintext").unwrap();
        assert_ne!(a, b);
    }
}

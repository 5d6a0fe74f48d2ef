//! Symmetric encryption for credential values at rest.
//!
//! Values are stored in the compact form `1:<nonce_b64>:<ciphertext_b64>`
//! (version-prefixed AES-256-GCM). The key comes from the `ENCRYPTION_KEY`
//! environment variable as 32 base64-encoded bytes and the cipher is
//! constructed once per process and passed to whatever needs it.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::Rng;

use crate::error::{DatabaseError, Result};

const KEY_SIZE: usize = 32;
const NONCE_SIZE: usize = 12;

/// Cipher for credential values stored in `api_credentials`.
#[derive(Clone)]
pub struct SecretCipher {
    key: [u8; KEY_SIZE],
}

impl std::fmt::Debug for SecretCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretCipher").finish_non_exhaustive()
    }
}

impl SecretCipher {
    /// Build a cipher from raw key bytes.
    pub fn new(key: [u8; KEY_SIZE]) -> Self {
        Self { key }
    }

    /// Build a cipher from the `ENCRYPTION_KEY` environment variable
    /// (32 bytes, base64).
    pub fn from_env() -> Result<Self> {
        let encoded = std::env::var("ENCRYPTION_KEY")
            .map_err(|_| DatabaseError::Cipher("ENCRYPTION_KEY not set".to_string()))?;
        let bytes = BASE64
            .decode(encoded.trim())
            .map_err(|e| DatabaseError::Cipher(format!("invalid ENCRYPTION_KEY encoding: {e}")))?;
        let key: [u8; KEY_SIZE] = bytes
            .try_into()
            .map_err(|_| DatabaseError::Cipher("ENCRYPTION_KEY must be 32 bytes".to_string()))?;
        Ok(Self::new(key))
    }

    /// Encrypt a value for storage.
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        let key = Key::<Aes256Gcm>::from_slice(&self.key);
        let cipher = Aes256Gcm::new(key);

        let nonce_bytes: [u8; NONCE_SIZE] = rand::thread_rng().gen();
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| DatabaseError::Cipher(format!("encryption failed: {e}")))?;

        Ok(format!(
            "1:{}:{}",
            BASE64.encode(nonce_bytes),
            BASE64.encode(ciphertext)
        ))
    }

    /// Decrypt a stored value.
    pub fn decrypt(&self, stored: &str) -> Result<String> {
        let parts: Vec<&str> = stored.split(':').collect();
        if parts.len() != 3 {
            return Err(DatabaseError::Cipher(
                "invalid encrypted value format".to_string(),
            ));
        }
        if parts[0] != "1" {
            return Err(DatabaseError::Cipher(format!(
                "unsupported encryption version: {}",
                parts[0]
            )));
        }

        let nonce_bytes = BASE64
            .decode(parts[1])
            .map_err(|e| DatabaseError::Cipher(format!("invalid nonce encoding: {e}")))?;
        if nonce_bytes.len() != NONCE_SIZE {
            return Err(DatabaseError::Cipher("invalid nonce size".to_string()));
        }
        let ciphertext = BASE64
            .decode(parts[2])
            .map_err(|e| DatabaseError::Cipher(format!("invalid ciphertext encoding: {e}")))?;

        let key = Key::<Aes256Gcm>::from_slice(&self.key);
        let cipher = Aes256Gcm::new(key);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let plaintext = cipher
            .decrypt(nonce, ciphertext.as_ref())
            .map_err(|e| DatabaseError::Cipher(format!("decryption failed: {e}")))?;

        String::from_utf8(plaintext)
            .map_err(|e| DatabaseError::Cipher(format!("invalid UTF-8: {e}")))
    }
}

//! AES-256-GCM custody of signing secrets.
//!
//! Sealed values are `base64(nonce).base64(tag).base64(ciphertext)` with a
//! fresh 96-bit nonce per encryption, so a value decrypts on its own.

use std::fmt;

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use rand::RngExt;

const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CipherError {
    #[error("encryption key must be base64 of exactly 32 bytes")]
    InvalidKey,
    #[error("sealed value is malformed")]
    Malformed,
    #[error("authentication failed")]
    Crypto,
}

#[derive(Clone)]
pub struct SecretCipher {
    cipher: Aes256Gcm,
}

impl fmt::Debug for SecretCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretCipher(..)")
    }
}

impl SecretCipher {
    /// Build from a base64-encoded 32-byte key.
    pub fn from_base64_key(encoded: &str) -> Result<Self, CipherError> {
        let key = BASE64
            .decode(encoded.trim())
            .map_err(|_| CipherError::InvalidKey)?;
        if key.len() != KEY_LEN {
            return Err(CipherError::InvalidKey);
        }
        let cipher = Aes256Gcm::new_from_slice(&key).map_err(|_| CipherError::InvalidKey)?;
        Ok(Self { cipher })
    }

    pub fn encrypt(&self, plaintext: &[u8]) -> Result<String, CipherError> {
        let nonce_bytes: [u8; NONCE_LEN] = rand::rng().random();
        let nonce = Nonce::from_slice(&nonce_bytes);
        let mut sealed = self
            .cipher
            .encrypt(nonce, plaintext)
            .map_err(|_| CipherError::Crypto)?;
        // aes-gcm appends the tag to the ciphertext.
        let tag = sealed.split_off(sealed.len() - TAG_LEN);
        Ok(format!(
            "{}.{}.{}",
            BASE64.encode(nonce_bytes),
            BASE64.encode(tag),
            BASE64.encode(sealed)
        ))
    }

    pub fn decrypt(&self, sealed: &str) -> Result<Vec<u8>, CipherError> {
        let mut parts = sealed.split('.');
        let (Some(nonce_b64), Some(tag_b64), Some(ct_b64), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(CipherError::Malformed);
        };
        let nonce_raw = BASE64.decode(nonce_b64).map_err(|_| CipherError::Malformed)?;
        let tag = BASE64.decode(tag_b64).map_err(|_| CipherError::Malformed)?;
        let mut ciphertext = BASE64.decode(ct_b64).map_err(|_| CipherError::Malformed)?;
        if nonce_raw.len() != NONCE_LEN || tag.len() != TAG_LEN {
            return Err(CipherError::Malformed);
        }
        ciphertext.extend_from_slice(&tag);
        self.cipher
            .decrypt(Nonce::from_slice(&nonce_raw), ciphertext.as_ref())
            .map_err(|_| CipherError::Crypto)
    }
}

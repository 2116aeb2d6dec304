//! Per-user key derivation and authenticated encryption of configuration payloads.
//!
//! Blob format: `v1.` followed by base64 of `nonce || ciphertext || tag`
//! (AES-256-GCM, 96-bit random nonce). The owning user id is bound as
//! associated data, so a blob moved onto another user's row fails to open.

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Key, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use rand::{rngs::OsRng, RngCore};
use sha2::Sha256;
use thiserror::Error;
use uuid::Uuid;

const BLOB_PREFIX: &str = "v1.";
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const KEY_CONTEXT: &[u8] = b"filter-config/v1/";

/// Minimum accepted length of the server secret, in bytes
pub const MIN_SECRET_LEN: usize = 32;

/// Environment variable holding the server secret
pub const SECRET_ENV_VAR: &str = "CONFIG_ENCRYPTION_SECRET";

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error)]
pub enum SecretError {
    #[error("Missing server secret: {0} is not set")]
    Missing(&'static str),

    #[error("Server secret too short: need at least {min} bytes, got {actual}")]
    TooShort { min: usize, actual: usize },
}

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("Encryption failed: {0}")]
    Encrypt(String),

    #[error("Unsupported blob format")]
    UnsupportedFormat,

    /// Tampered, truncated, or sealed under a different key
    #[error("Blob failed authentication")]
    Decrypt,

    #[error("Decrypted payload is not valid UTF-8")]
    InvalidUtf8,
}

/// Process-wide secret, loaded once at startup and never mutated.
#[derive(Clone)]
pub struct ServerSecret(Vec<u8>);

impl ServerSecret {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self, SecretError> {
        let bytes = bytes.into();
        if bytes.len() < MIN_SECRET_LEN {
            return Err(SecretError::TooShort {
                min: MIN_SECRET_LEN,
                actual: bytes.len(),
            });
        }
        Ok(Self(bytes))
    }

    pub fn from_env() -> Result<Self, SecretError> {
        let value = std::env::var(SECRET_ENV_VAR)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or(SecretError::Missing(SECRET_ENV_VAR))?;
        Self::new(value.into_bytes())
    }
}

impl std::fmt::Debug for ServerSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ServerSecret(<redacted>)")
    }
}

/// Key for one user's blob. Derived per operation, dropped with it.
pub struct UserKey {
    user_id: Uuid,
    bytes: [u8; 32],
}

impl UserKey {
    pub fn user_id(&self) -> Uuid {
        self.user_id
    }
}

impl std::fmt::Debug for UserKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "UserKey({}, <redacted>)", self.user_id)
    }
}

pub struct ConfigCipher {
    secret: ServerSecret,
}

impl ConfigCipher {
    pub fn new(secret: ServerSecret) -> Self {
        Self { secret }
    }

    /// HMAC-SHA256(secret, context || user_id). Deterministic per user.
    pub fn derive_key(&self, user_id: Uuid) -> Result<UserKey, CryptoError> {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(&self.secret.0)
            .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
        mac.update(KEY_CONTEXT);
        mac.update(user_id.as_bytes());

        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&mac.finalize().into_bytes());
        Ok(UserKey { user_id, bytes })
    }

    pub fn encrypt(&self, key: &UserKey, plaintext: &str) -> Result<String, CryptoError> {
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key.bytes));

        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let payload = Payload {
            msg: plaintext.as_bytes(),
            aad: key.user_id.as_bytes(),
        };
        let ciphertext = cipher
            .encrypt(nonce, payload)
            .map_err(|e| CryptoError::Encrypt(e.to_string()))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);

        Ok(format!("{}{}", BLOB_PREFIX, STANDARD.encode(sealed)))
    }

    /// Open a stored blob. An absent or blank blob is `Ok(None)`
    /// without touching the cipher.
    pub fn decrypt(&self, key: &UserKey, blob: Option<&str>) -> Result<Option<String>, CryptoError> {
        let blob = match blob.map(str::trim) {
            None | Some("") => return Ok(None),
            Some(blob) => blob,
        };

        let encoded = blob
            .strip_prefix(BLOB_PREFIX)
            .ok_or(CryptoError::UnsupportedFormat)?;
        let sealed = STANDARD.decode(encoded).map_err(|_| CryptoError::Decrypt)?;
        if sealed.len() < NONCE_LEN + TAG_LEN {
            return Err(CryptoError::Decrypt);
        }

        let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key.bytes));
        let payload = Payload {
            msg: ciphertext,
            aad: key.user_id.as_bytes(),
        };
        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce_bytes), payload)
            .map_err(|_| CryptoError::Decrypt)?;

        String::from_utf8(plaintext)
            .map(Some)
            .map_err(|_| CryptoError::InvalidUtf8)
    }
}

//! Batch-secret protection at rest.
//!
//! The rest of the workspace only ever sees [`BatchSecretProtector`]. A
//! deployment backed by an external key-management service implements the
//! trait against that service; [`LocalSecretProtector`] is the built-in
//! fallback that wraps secrets with ChaCha20-Poly1305 under a local master key.
//!
//! ## Envelope format
//!
//! `base64(nonce[12] || ciphertext || tag[16])`, AAD = [`ENVELOPE_AAD`].

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

use crate::{CryptoError, Result};

/// Master key size for the local protector.
pub const MASTER_KEY_SIZE: usize = 32;

/// ChaCha20-Poly1305 nonce size.
pub const NONCE_SIZE: usize = 12;

/// ChaCha20-Poly1305 tag size.
pub const TAG_SIZE: usize = 16;

/// Associated data binding envelopes to their purpose.
pub const ENVELOPE_AAD: &[u8] = b"hush v1 batch-secret";

/// Protect/unprotect contract for per-survey batch secrets.
#[async_trait]
pub trait BatchSecretProtector: Send + Sync {
    /// Wrap a plaintext secret for storage.
    async fn protect(&self, plaintext: &[u8]) -> Result<String>;

    /// Recover a plaintext secret from its stored envelope.
    async fn unprotect(&self, envelope: &str) -> Result<Zeroizing<Vec<u8>>>;
}

/// Local symmetric fallback protector.
pub struct LocalSecretProtector {
    key: Zeroizing<[u8; MASTER_KEY_SIZE]>,
}

impl LocalSecretProtector {
    pub fn new(key: [u8; MASTER_KEY_SIZE]) -> Self {
        Self {
            key: Zeroizing::new(key),
        }
    }

    /// Build from a master key given as hex.
    pub fn from_hex(key_hex: &str) -> Result<Self> {
        let bytes = Zeroizing::new(
            hex::decode(key_hex.trim())
                .map_err(|e| CryptoError::MalformedEnvelope(format!("master key hex: {e}")))?,
        );
        let key: [u8; MASTER_KEY_SIZE] =
            bytes
                .as_slice()
                .try_into()
                .map_err(|_| CryptoError::InvalidKeyLength {
                    expected: MASTER_KEY_SIZE,
                    actual: bytes.len(),
                })?;
        Ok(Self::new(key))
    }

    /// Generate a fresh random master key.
    pub fn generate_master_key() -> Zeroizing<[u8; MASTER_KEY_SIZE]> {
        let mut key = Zeroizing::new([0u8; MASTER_KEY_SIZE]);
        OsRng.fill_bytes(&mut key[..]);
        key
    }

    fn cipher(&self) -> ChaCha20Poly1305 {
        ChaCha20Poly1305::new(Key::from_slice(&self.key[..]))
    }
}

#[async_trait]
impl BatchSecretProtector for LocalSecretProtector {
    async fn protect(&self, plaintext: &[u8]) -> Result<String> {
        let mut nonce = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce);

        let ciphertext = self
            .cipher()
            .encrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: plaintext,
                    aad: ENVELOPE_AAD,
                },
            )
            .map_err(|_| CryptoError::Aead)?;

        let mut envelope = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        envelope.extend_from_slice(&nonce);
        envelope.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(envelope))
    }

    async fn unprotect(&self, envelope: &str) -> Result<Zeroizing<Vec<u8>>> {
        let raw = STANDARD
            .decode(envelope)
            .map_err(|e| CryptoError::MalformedEnvelope(e.to_string()))?;
        if raw.len() < NONCE_SIZE + TAG_SIZE {
            return Err(CryptoError::MalformedEnvelope(format!(
                "envelope too short: {} bytes",
                raw.len()
            )));
        }
        let (nonce, ciphertext) = raw.split_at(NONCE_SIZE);

        self.cipher()
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: ciphertext,
                    aad: ENVELOPE_AAD,
                },
            )
            .map(Zeroizing::new)
            .map_err(|_| CryptoError::Aead)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_protect_unprotect_roundtrip() {
        let protector = LocalSecretProtector::new([0x42; MASTER_KEY_SIZE]);
        let secret = [0x07u8; 32];
        let envelope = protector.protect(&secret).await.expect("protect");
        let recovered = protector.unprotect(&envelope).await.expect("unprotect");
        assert_eq!(recovered.as_slice(), &secret);
    }

    #[tokio::test]
    async fn test_envelope_hides_plaintext_and_is_randomized() {
        let protector = LocalSecretProtector::new([0x42; MASTER_KEY_SIZE]);
        let secret = [0x07u8; 32];
        let e1 = protector.protect(&secret).await.expect("protect");
        let e2 = protector.protect(&secret).await.expect("protect");
        assert_ne!(e1, e2);
        let raw = STANDARD.decode(&e1).expect("b64");
        assert_eq!(raw.len(), NONCE_SIZE + secret.len() + TAG_SIZE);
    }

    #[tokio::test]
    async fn test_wrong_master_key_fails() {
        let p1 = LocalSecretProtector::new([0x01; MASTER_KEY_SIZE]);
        let p2 = LocalSecretProtector::new([0x02; MASTER_KEY_SIZE]);
        let envelope = p1.protect(b"secret").await.expect("protect");
        assert!(matches!(p2.unprotect(&envelope).await, Err(CryptoError::Aead)));
    }

    #[tokio::test]
    async fn test_malformed_envelopes_rejected() {
        let protector = LocalSecretProtector::new([0x42; MASTER_KEY_SIZE]);
        assert!(matches!(
            protector.unprotect("not base64!").await,
            Err(CryptoError::MalformedEnvelope(_))
        ));
        assert!(matches!(
            protector.unprotect(&STANDARD.encode([0u8; 8])).await,
            Err(CryptoError::MalformedEnvelope(_))
        ));
    }

    #[test]
    fn test_from_hex() {
        let key_hex = hex::encode([0x11u8; MASTER_KEY_SIZE]);
        assert!(LocalSecretProtector::from_hex(&key_hex).is_ok());
        assert!(matches!(
            LocalSecretProtector::from_hex("abcd"),
            Err(CryptoError::InvalidKeyLength { expected: 32, actual: 2 })
        ));
        assert!(LocalSecretProtector::from_hex("zz").is_err());
    }
}

//! Blind access tokens.
//!
//! A token is `base64(nonce) "." base64(mac)` where `nonce` is 16 fresh
//! CSPRNG bytes and `mac = HMAC-SHA256(batch_secret, nonce)`. Tokens are
//! minted in bulk before any respondent is known, so none of them carries
//! provenance. Possession of the batch secret is necessary and sufficient to
//! mint or verify.
//!
//! Raw tokens are never persisted. Only [`hash_token`] output is stored, and
//! only after redemption.

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{CryptoError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Batch secret size (256 bits).
pub const BATCH_SECRET_SIZE: usize = 32;

/// Token nonce size.
pub const NONCE_SIZE: usize = 16;

/// HMAC-SHA256 output size.
pub const MAC_SIZE: usize = 32;

/// Separator between the nonce and mac segments.
const SEGMENT_SEPARATOR: char = '.';

/// Per-survey HMAC key. Zeroized on drop; `Debug` never prints the bytes.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct BatchSecret([u8; BATCH_SECRET_SIZE]);

impl BatchSecret {
    /// Restore a secret from unprotected bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; BATCH_SECRET_SIZE] =
            bytes
                .try_into()
                .map_err(|_| CryptoError::InvalidKeyLength {
                    expected: BATCH_SECRET_SIZE,
                    actual: bytes.len(),
                })?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; BATCH_SECRET_SIZE] {
        &self.0
    }
}

impl fmt::Debug for BatchSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BatchSecret(..)")
    }
}

/// SHA-256 of a raw token, as 64 lowercase hex characters.
///
/// The only form of a token that ever reaches storage.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct TokenHash(String);

impl TokenHash {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for TokenHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Hashes are unlinkable by themselves but still stay out of logs.
        f.write_str("TokenHash(..)")
    }
}

/// Generate a fresh 256-bit batch secret from the OS CSPRNG.
pub fn generate_batch_secret() -> BatchSecret {
    let mut secret = [0u8; BATCH_SECRET_SIZE];
    OsRng.fill_bytes(&mut secret);
    BatchSecret(secret)
}

/// Mint one token under `secret`.
///
/// Tokens are independent of each other; minting N of them in any order or
/// in parallel yields the same distribution.
pub fn generate_token(secret: &BatchSecret) -> Result<String> {
    let mut nonce = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce);

    let mac = keyed_mac(secret)?.chain_update(nonce).finalize().into_bytes();

    Ok(format!(
        "{}{SEGMENT_SEPARATOR}{}",
        URL_SAFE_NO_PAD.encode(nonce),
        URL_SAFE_NO_PAD.encode(mac)
    ))
}

/// Mint `count` tokens under `secret`.
pub fn generate_tokens(secret: &BatchSecret, count: usize) -> Result<Vec<String>> {
    (0..count).map(|_| generate_token(secret)).collect()
}

/// Check that `token` was minted under `secret`.
///
/// Any shape or encoding failure yields `false`. The mac comparison is
/// constant-time.
pub fn validate_token(token: &str, secret: &BatchSecret) -> bool {
    let mut parts = token.split(SEGMENT_SEPARATOR);
    let (Some(nonce_b64), Some(mac_b64), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };

    let Ok(nonce) = URL_SAFE_NO_PAD.decode(nonce_b64) else {
        return false;
    };
    let Ok(provided_mac) = URL_SAFE_NO_PAD.decode(mac_b64) else {
        return false;
    };
    if nonce.len() != NONCE_SIZE {
        return false;
    }

    let Ok(mac) = keyed_mac(secret) else {
        return false;
    };
    mac.chain_update(&nonce).verify_slice(&provided_mac).is_ok()
}

/// One-way ledger key for a token.
pub fn hash_token(token: &str) -> TokenHash {
    TokenHash(hex::encode(Sha256::digest(token.as_bytes())))
}

fn keyed_mac(secret: &BatchSecret) -> Result<HmacSha256> {
    <HmacSha256 as Mac>::new_from_slice(secret.as_bytes()).map_err(|_| {
        CryptoError::InvalidKeyLength {
            expected: BATCH_SECRET_SIZE,
            actual: secret.as_bytes().len(),
        }
    })
}

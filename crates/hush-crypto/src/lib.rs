//! # hush-crypto
//!
//! Cryptographic primitives behind the anonymous response pipeline.
//!
//! Every random draw in this crate comes from the operating system CSPRNG
//! (`rand::rngs::OsRng`). A general-purpose PRNG is never acceptable here: a
//! predictable generator would let an observer undo jitter or shuffling.
//!
//! ## Modules
//!
//! - [`token`]: Blind access tokens: batch secrets, HMAC-SHA256 mint/verify, ledger hashing
//! - [`jitter`]: Submission timestamp perturbation
//! - [`shuffle`]: Unbiased Fisher–Yates permutation for free-text answers
//! - [`protector`]: Batch-secret envelope contract and local ChaCha20-Poly1305 fallback

pub mod jitter;
pub mod protector;
pub mod shuffle;
pub mod token;

/// Failures from token, envelope and key handling.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// AEAD encryption or decryption failed (authentication tag mismatch).
    #[error("AEAD operation failed")]
    Aead,

    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    /// Ciphertext envelope could not be decoded.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),
}

pub type Result<T> = std::result::Result<T, CryptoError>;

#![deny(missing_docs)]
//! RSA over remote keys.
//!
//! This crate defines the two seams of the workspace:
//!
//! - [`KeyVaultClient`]: the asynchronous remote operations a key vault
//!   performs with a private key that never leaves it (sign a digest,
//!   decrypt a ciphertext).
//! - [`RsaAlgorithm`]: the synchronous RSA interface application code is
//!   written against, implemented both by local key pairs and by adapters
//!   over a [`KeyVaultContext`].
//!
//! It also carries the shared vocabulary: [`CryptoError`], [`ClientError`],
//! hash and padding selectors, [`RsaParameters`], and the digest and padding
//! helpers in [`hash`] and [`scheme`].

pub mod algorithm;
pub mod context;
pub mod hash;
pub mod params;
pub mod scheme;

pub use algorithm::{EncryptionPadding, HashAlgorithmName, KeySizes, SignaturePadding};
pub use context::{KeyVaultContext, jwa};
pub use params::RsaParameters;

use async_trait::async_trait;
use std::io::Read;
use thiserror::Error;

/// Errors from RSA operations (crate-local).
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum CryptoError {
    /// An argument, such as the backend context or a buffer range, is invalid.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The operation is not supported for this key, padding or algorithm.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// The object was used after it was disposed.
    /// The string is the type name.
    #[error("{0} is disposed")]
    Disposed(&'static str),

    /// The cryptographic operation failed. Remote failures carry the
    /// backend's [`ClientError`] as `source`.
    #[error("crypto operation failed: {message}")]
    OperationFailed {
        /// What failed.
        message: String,
        /// The underlying cause.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Reading a stream to digest failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl CryptoError {
    /// An [`OperationFailed`](CryptoError::OperationFailed) wrapping `source`.
    pub fn operation_failed(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        CryptoError::OperationFailed {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// An [`OperationFailed`](CryptoError::OperationFailed) with no underlying cause.
    pub fn failed(message: impl Into<String>) -> Self {
        CryptoError::OperationFailed {
            message: message.into(),
            source: None,
        }
    }

    /// The backend error behind an [`OperationFailed`](CryptoError::OperationFailed), if any.
    pub fn client_error(&self) -> Option<&ClientError> {
        match self {
            CryptoError::OperationFailed {
                source: Some(source),
                ..
            } => source.downcast_ref::<ClientError>(),
            _ => None,
        }
    }

    /// Whether this error stems from a cancelled remote call.
    pub fn is_cancelled(&self) -> bool {
        matches!(self.client_error(), Some(ClientError::Cancelled))
    }
}

/// Errors reported by a [`KeyVaultClient`].
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ClientError {
    /// A failure that may succeed on retry (throttling, network, timeout).
    #[error("transient backend error: {0}")]
    Transient(String),

    /// A failure that will not succeed on retry (key disabled, bad request).
    #[error("backend error: {0}")]
    Permanent(String),

    /// The caller is not authenticated or not authorized for the key.
    #[error("auth failed: {0}")]
    AuthFailed(String),

    /// The backend does not support the requested algorithm.
    #[error("unsupported by backend: {0}")]
    Unsupported(String),

    /// The call was cancelled before the backend answered.
    #[error("remote call cancelled")]
    Cancelled,

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl ClientError {
    /// Whether a retry could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, ClientError::Transient(_))
    }
}

/// Remote private-key operations on a key vault.
///
/// `key_id` is the backend's key identifier and `algorithm` a JWA name
/// (see [`jwa`]). Implementations own transport, authentication and retry.
#[async_trait]
pub trait KeyVaultClient: Send + Sync {
    /// Sign a digest (or, for `RSNULL`, a complete DigestInfo).
    async fn sign(
        &self,
        key_id: &str,
        algorithm: &str,
        digest: &[u8],
    ) -> Result<Vec<u8>, ClientError>;

    /// Decrypt a ciphertext.
    async fn decrypt(
        &self,
        key_id: &str,
        algorithm: &str,
        ciphertext: &[u8],
    ) -> Result<Vec<u8>, ClientError>;
}

/// The synchronous RSA interface.
///
/// Every method is blocking. Implementations backed by a remote key may
/// offer asynchronous variants of the private-key operations in addition.
pub trait RsaAlgorithm: Send + Sync {
    /// Key size in bits.
    fn key_size(&self) -> usize;

    /// Key sizes this implementation accepts.
    fn legal_key_sizes(&self) -> Vec<KeySizes>;

    /// Sign a precomputed digest.
    fn sign_hash(
        &self,
        hash: &[u8],
        hash_algorithm: &HashAlgorithmName,
        padding: SignaturePadding,
    ) -> Result<Vec<u8>, CryptoError>;

    /// Verify a signature over a precomputed digest.
    fn verify_hash(
        &self,
        hash: &[u8],
        signature: &[u8],
        hash_algorithm: &HashAlgorithmName,
        padding: SignaturePadding,
    ) -> Result<bool, CryptoError>;

    /// Encrypt with the public key.
    fn encrypt(&self, data: &[u8], padding: &EncryptionPadding) -> Result<Vec<u8>, CryptoError>;

    /// Decrypt with the private key.
    fn decrypt(&self, data: &[u8], padding: &EncryptionPadding) -> Result<Vec<u8>, CryptoError>;

    /// Export the key parameters, optionally including the private components.
    fn export_parameters(&self, include_private: bool) -> Result<RsaParameters, CryptoError>;

    /// Replace the key with `parameters`.
    fn import_parameters(&self, parameters: &RsaParameters) -> Result<(), CryptoError>;

    /// Hash `count` bytes of `data` starting at `offset`.
    fn hash_data(
        &self,
        data: &[u8],
        offset: usize,
        count: usize,
        hash_algorithm: &HashAlgorithmName,
    ) -> Result<Vec<u8>, CryptoError> {
        hash::hash_data(data, offset, count, hash_algorithm)
    }

    /// Hash a stream to its end.
    fn hash_reader(
        &self,
        reader: &mut dyn Read,
        hash_algorithm: &HashAlgorithmName,
    ) -> Result<Vec<u8>, CryptoError> {
        hash::hash_reader(reader, hash_algorithm)
    }

    /// Hash `data` and sign the digest.
    fn sign_data(
        &self,
        data: &[u8],
        hash_algorithm: &HashAlgorithmName,
        padding: SignaturePadding,
    ) -> Result<Vec<u8>, CryptoError> {
        let hash = self.hash_data(data, 0, data.len(), hash_algorithm)?;
        self.sign_hash(&hash, hash_algorithm, padding)
    }

    /// Hash `data` and verify `signature` over the digest.
    fn verify_data(
        &self,
        data: &[u8],
        signature: &[u8],
        hash_algorithm: &HashAlgorithmName,
        padding: SignaturePadding,
    ) -> Result<bool, CryptoError> {
        let hash = self.hash_data(data, 0, data.len(), hash_algorithm)?;
        self.verify_hash(&hash, signature, hash_algorithm, padding)
    }
}

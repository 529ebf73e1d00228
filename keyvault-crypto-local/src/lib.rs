#![deny(missing_docs)]
//! Software key vault for keyvault-rsa.
//!
//! [`LocalKeyVaultClient`] implements [`KeyVaultClient`] over an RSA key held
//! in memory, speaking the same JWA names a real key vault does. It counts
//! calls and can be told to fail, which makes it the test double for the
//! adapter. [`SoftwareRsa`] is a plain local key pair implementing
//! [`RsaAlgorithm`](keyvault_crypto::RsaAlgorithm), the reference the adapter
//! is compared against.

mod software;

pub use software::SoftwareRsa;

use async_trait::async_trait;
use keyvault_crypto::scheme::{decrypt_with, sign_with};
use keyvault_crypto::{
    ClientError, CryptoError, EncryptionPadding, HashAlgorithmName, KeyVaultClient,
    KeyVaultContext, RsaParameters, SignaturePadding, jwa,
};
use rsa::{Pkcs1v15Sign, RsaPrivateKey};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// A failure the client reports instead of answering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// [`ClientError::Transient`].
    Transient(String),
    /// [`ClientError::Permanent`].
    Permanent(String),
    /// [`ClientError::AuthFailed`].
    AuthFailed(String),
    /// [`ClientError::Cancelled`].
    Cancelled,
}

impl From<Fault> for ClientError {
    fn from(fault: Fault) -> Self {
        match fault {
            Fault::Transient(msg) => ClientError::Transient(msg),
            Fault::Permanent(msg) => ClientError::Permanent(msg),
            Fault::AuthFailed(msg) => ClientError::AuthFailed(msg),
            Fault::Cancelled => ClientError::Cancelled,
        }
    }
}

/// In-memory key vault holding a single RSA key.
pub struct LocalKeyVaultClient {
    key_id: String,
    key: RsaPrivateKey,
    latency: Duration,
    fault: Mutex<Option<Fault>>,
    sign_calls: AtomicUsize,
    decrypt_calls: AtomicUsize,
}

impl LocalKeyVaultClient {
    /// Default key identifier.
    pub const DEFAULT_KEY_ID: &'static str = "local/rsa-key";

    /// Serve operations with `key`.
    pub fn new(key: RsaPrivateKey) -> Self {
        Self {
            key_id: Self::DEFAULT_KEY_ID.into(),
            key,
            latency: Duration::ZERO,
            fault: Mutex::new(None),
            sign_calls: AtomicUsize::new(0),
            decrypt_calls: AtomicUsize::new(0),
        }
    }

    /// Serve operations with a freshly generated key.
    pub fn generate(bits: usize) -> Result<Self, CryptoError> {
        let key = RsaPrivateKey::new(&mut rand::thread_rng(), bits)
            .map_err(|e| CryptoError::operation_failed("key generation failed", e))?;
        Ok(Self::new(key))
    }

    /// Set the key identifier requests must name.
    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = key_id.into();
        self
    }

    /// Delay every answer by `latency`, like a network round trip.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// The key identifier.
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Public parameters of the held key.
    pub fn public_parameters(&self) -> RsaParameters {
        RsaParameters::from(&self.key.to_public_key())
    }

    /// A [`KeyVaultContext`] over this client.
    pub fn context(self: &Arc<Self>) -> KeyVaultContext {
        KeyVaultContext::new(self.clone(), self.key_id.clone(), &self.public_parameters())
    }

    /// Fail every following call with `fault` until [`clear_fault`](Self::clear_fault).
    pub fn fail_with(&self, fault: Fault) {
        *self.fault.lock().unwrap_or_else(PoisonError::into_inner) = Some(fault);
    }

    /// Answer calls normally again.
    pub fn clear_fault(&self) {
        *self.fault.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Number of sign requests received.
    pub fn sign_calls(&self) -> usize {
        self.sign_calls.load(Ordering::SeqCst)
    }

    /// Number of decrypt requests received.
    pub fn decrypt_calls(&self) -> usize {
        self.decrypt_calls.load(Ordering::SeqCst)
    }

    async fn round_trip(&self, key_id: &str) -> Result<(), ClientError> {
        tokio::task::yield_now().await;
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let fault = self
            .fault
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(fault) = fault {
            return Err(fault.into());
        }
        if key_id != self.key_id {
            return Err(ClientError::Permanent(format!("key not found: {key_id}")));
        }
        Ok(())
    }
}

impl std::fmt::Debug for LocalKeyVaultClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalKeyVaultClient")
            .field("key_id", &self.key_id)
            .field("latency", &self.latency)
            .field("sign_calls", &self.sign_calls())
            .field("decrypt_calls", &self.decrypt_calls())
            .finish_non_exhaustive()
    }
}

fn rejected(e: CryptoError) -> ClientError {
    ClientError::Permanent(e.to_string())
}

#[async_trait]
impl KeyVaultClient for LocalKeyVaultClient {
    async fn sign(
        &self,
        key_id: &str,
        algorithm: &str,
        digest: &[u8],
    ) -> Result<Vec<u8>, ClientError> {
        self.sign_calls.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(key_id, algorithm, len = digest.len(), "local vault sign");
        self.round_trip(key_id).await?;

        let hash = match algorithm {
            jwa::RS256 => HashAlgorithmName::SHA256,
            jwa::RS384 => HashAlgorithmName::SHA384,
            jwa::RS512 => HashAlgorithmName::SHA512,
            jwa::RSNULL => {
                return self
                    .key
                    .sign(Pkcs1v15Sign::new_unprefixed(), digest)
                    .map_err(|e| ClientError::Permanent(e.to_string()));
            }
            other => {
                return Err(ClientError::Unsupported(format!(
                    "signing algorithm {other}"
                )));
            }
        };
        sign_with(&self.key, digest, &hash, SignaturePadding::Pkcs1).map_err(rejected)
    }

    async fn decrypt(
        &self,
        key_id: &str,
        algorithm: &str,
        ciphertext: &[u8],
    ) -> Result<Vec<u8>, ClientError> {
        self.decrypt_calls.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(key_id, algorithm, len = ciphertext.len(), "local vault decrypt");
        self.round_trip(key_id).await?;

        let padding = match algorithm {
            jwa::RSA1_5 => EncryptionPadding::Pkcs1,
            jwa::RSA_OAEP => EncryptionPadding::OAEP_SHA1,
            jwa::RSA_OAEP_256 => EncryptionPadding::OAEP_SHA256,
            other => {
                return Err(ClientError::Unsupported(format!(
                    "decryption algorithm {other}"
                )));
            }
        };
        decrypt_with(&self.key, ciphertext, &padding).map_err(rejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyvault_crypto::hash::hash_data;
    use keyvault_crypto::scheme::{encrypt_with, verify_with};

    fn _assert_send_sync<T: Send + Sync>() {}

    fn client() -> Arc<LocalKeyVaultClient> {
        Arc::new(LocalKeyVaultClient::generate(1024).unwrap())
    }

    #[test]
    fn object_safety() {
        _assert_send_sync::<LocalKeyVaultClient>();
        let _: Arc<dyn KeyVaultClient> = client();
    }

    #[tokio::test]
    async fn signs_with_rs256() {
        let client = client();
        let digest = hash_data(b"data", 0, 4, &HashAlgorithmName::SHA256).unwrap();
        let sig = client
            .sign(LocalKeyVaultClient::DEFAULT_KEY_ID, jwa::RS256, &digest)
            .await
            .unwrap();
        let public = client.public_parameters().to_public_key().unwrap();
        assert!(
            verify_with(&public, &digest, &sig, &HashAlgorithmName::SHA256, SignaturePadding::Pkcs1)
                .unwrap()
        );
        assert_eq!(client.sign_calls(), 1);
        assert_eq!(client.decrypt_calls(), 0);
    }

    #[tokio::test]
    async fn decrypts_oaep_256() {
        let client = client();
        let public = client.public_parameters().to_public_key().unwrap();
        let ct = encrypt_with(&public, b"secret", &EncryptionPadding::OAEP_SHA256).unwrap();
        let pt = client
            .decrypt(client.key_id(), jwa::RSA_OAEP_256, &ct)
            .await
            .unwrap();
        assert_eq!(pt, b"secret");
        assert_eq!(client.decrypt_calls(), 1);
    }

    #[tokio::test]
    async fn unknown_key_is_permanent_error() {
        let client = client();
        let err = client.sign("other-key", jwa::RS256, &[0; 32]).await.unwrap_err();
        assert!(matches!(err, ClientError::Permanent(_)));
    }

    #[tokio::test]
    async fn unknown_algorithm_is_unsupported() {
        let client = client();
        let err = client
            .sign(client.key_id(), "PS256", &[0; 32])
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Unsupported(_)));
        let err = client
            .decrypt(client.key_id(), "RSA-OAEP-512", &[0; 128])
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Unsupported(_)));
    }

    #[tokio::test]
    async fn faults_fail_calls_until_cleared() {
        let client = client();
        client.fail_with(Fault::Transient("throttled".into()));
        let err = client
            .sign(client.key_id(), jwa::RS256, &[0; 32])
            .await
            .unwrap_err();
        assert!(err.is_transient());
        client.fail_with(Fault::Cancelled);
        let err = client
            .decrypt(client.key_id(), jwa::RSA1_5, &[0; 128])
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Cancelled));
        client.clear_fault();
        client
            .sign(client.key_id(), jwa::RS256, &[0; 32])
            .await
            .unwrap();
        assert_eq!(client.sign_calls(), 2);
    }

    #[tokio::test]
    async fn latency_delays_the_answer() {
        let client = Arc::new(
            LocalKeyVaultClient::generate(1024)
                .unwrap()
                .with_latency(Duration::from_millis(20)),
        );
        let started = std::time::Instant::now();
        client
            .sign(client.key_id(), jwa::RS256, &[0; 32])
            .await
            .unwrap();
        assert!(started.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn context_carries_identity_and_public_key() {
        let client = Arc::new(
            LocalKeyVaultClient::generate(1024)
                .unwrap()
                .with_key_id("https://vault.example/keys/k/1"),
        );
        let ctx = client.context();
        assert!(ctx.is_valid());
        assert_eq!(ctx.key_id(), "https://vault.example/keys/k/1");
        assert_eq!(ctx.key(), Some(&client.public_parameters()));
    }
}

use crate::bridge::BlockingBridge;
use crate::config::BridgeConfig;
use keyvault_crypto::hash::HashKind;
use keyvault_crypto::scheme::{encrypt_with, verify_with};
use keyvault_crypto::{
    ClientError, CryptoError, EncryptionPadding, HashAlgorithmName, KeySizes, KeyVaultContext,
    RsaAlgorithm, RsaParameters, SignaturePadding, hash,
};
use rsa::RsaPublicKey;
use rsa::traits::PublicKeyParts;
use std::io::Read;
use std::sync::{Arc, PoisonError, RwLock};

const TYPE_NAME: &str = "RsaKeyVault";

/// RSA whose private key lives in a key vault.
///
/// Operations that only need the public key (verify, encrypt, digest,
/// public export) run locally against a key cached at construction. Sign and
/// decrypt go to the vault through the [`KeyVaultContext`]; they are
/// available as async methods ([`sign_hash_async`](Self::sign_hash_async),
/// [`decrypt_async`](Self::decrypt_async)) and, through [`RsaAlgorithm`], as
/// blocking calls that are safe from any thread, inside or outside a Tokio
/// runtime.
///
/// Disposal is checked when an operation starts. Disposing while a remote
/// call is in flight does not interrupt it; calls that start afterwards fail
/// with [`CryptoError::Disposed`].
pub struct RsaKeyVault {
    context: KeyVaultContext,
    public_key: RwLock<Option<Arc<RsaPublicKey>>>,
    key_size: usize,
    bridge: BlockingBridge,
}

impl RsaKeyVault {
    /// Create an adapter over `context` with the default bridge configuration.
    pub fn new(context: KeyVaultContext) -> Result<Self, CryptoError> {
        Self::with_config(context, BridgeConfig::default())
    }

    /// Create an adapter over `context`.
    ///
    /// Fails with [`CryptoError::InvalidArgument`] if the context is empty or
    /// its key material is not a usable RSA public key. No remote call is made.
    pub fn with_config(context: KeyVaultContext, config: BridgeConfig) -> Result<Self, CryptoError> {
        let key = match context.key() {
            Some(key) if context.is_valid() => key,
            _ => {
                return Err(CryptoError::InvalidArgument(
                    "key vault context must not be the default".into(),
                ));
            }
        };
        let public_key = key.to_public_key()?;
        let key_size = public_key.n().bits();
        tracing::debug!(key_id = %context.key_id(), key_size, "created key vault RSA adapter");
        Ok(Self {
            context,
            public_key: RwLock::new(Some(Arc::new(public_key))),
            key_size,
            bridge: BlockingBridge::new(config),
        })
    }

    /// The remote key identifier.
    pub fn key_id(&self) -> &str {
        self.context.key_id()
    }

    /// Whether [`dispose`](Self::dispose) has been called.
    pub fn is_disposed(&self) -> bool {
        self.slot().is_none()
    }

    /// Release the cached public key. Later calls fail with
    /// [`CryptoError::Disposed`]; disposing again does nothing.
    pub fn dispose(&self) {
        let released = self
            .public_key
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if released.is_some() {
            tracing::debug!(key_id = %self.key_id(), "disposed key vault RSA adapter");
        }
    }

    /// Sign a precomputed digest in the vault.
    ///
    /// Only [`SignaturePadding::Pkcs1`] is supported; anything else fails with
    /// [`CryptoError::UnsupportedOperation`] without contacting the vault. A
    /// digest whose length does not match a known `hash_algorithm` fails with
    /// [`CryptoError::InvalidArgument`], also without contacting the vault.
    /// Vault failures surface as [`CryptoError::OperationFailed`] with the
    /// [`ClientError`] as source.
    pub async fn sign_hash_async(
        &self,
        hash: &[u8],
        hash_algorithm: &HashAlgorithmName,
        padding: SignaturePadding,
    ) -> Result<Vec<u8>, CryptoError> {
        self.check_disposed()?;
        if padding != SignaturePadding::Pkcs1 {
            return Err(CryptoError::UnsupportedOperation(format!(
                "key vault signing does not support {padding} padding"
            )));
        }
        // Unknown names are left to the vault to refuse.
        if let Ok(kind) = HashKind::from_name(hash_algorithm) {
            if hash.len() != kind.output_size() {
                return Err(CryptoError::InvalidArgument(format!(
                    "{hash_algorithm} digest must be {} bytes, got {}",
                    kind.output_size(),
                    hash.len()
                )));
            }
        }
        tracing::debug!(
            key_id = %self.key_id(),
            algorithm = %hash_algorithm,
            len = hash.len(),
            "signing digest in key vault"
        );
        self.context
            .sign_digest(hash, hash_algorithm)
            .await
            .map_err(|e| self.remote_failure("sign", e))
    }

    /// Decrypt in the vault. The vault decides which paddings it accepts.
    pub async fn decrypt_async(
        &self,
        data: &[u8],
        padding: &EncryptionPadding,
    ) -> Result<Vec<u8>, CryptoError> {
        self.check_disposed()?;
        tracing::debug!(
            key_id = %self.key_id(),
            padding = %padding,
            len = data.len(),
            "decrypting in key vault"
        );
        self.context
            .decrypt_data(data, padding)
            .await
            .map_err(|e| self.remote_failure("decrypt", e))
    }

    fn remote_failure(&self, operation: &'static str, error: ClientError) -> CryptoError {
        tracing::warn!(key_id = %self.key_id(), operation, error = %error, "key vault call failed");
        CryptoError::operation_failed("error calling key vault", error)
    }

    fn slot(&self) -> Option<Arc<RsaPublicKey>> {
        self.public_key
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn cached_key(&self) -> Result<Arc<RsaPublicKey>, CryptoError> {
        self.slot().ok_or(CryptoError::Disposed(TYPE_NAME))
    }

    fn check_disposed(&self) -> Result<(), CryptoError> {
        self.cached_key().map(drop)
    }
}

impl std::fmt::Debug for RsaKeyVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(TYPE_NAME)
            .field("key_id", &self.key_id())
            .field("key_size", &self.key_size)
            .field("disposed", &self.is_disposed())
            .finish_non_exhaustive()
    }
}

impl RsaAlgorithm for RsaKeyVault {
    fn key_size(&self) -> usize {
        self.key_size
    }

    fn legal_key_sizes(&self) -> Vec<KeySizes> {
        vec![KeySizes::fixed(self.key_size)]
    }

    fn sign_hash(
        &self,
        hash: &[u8],
        hash_algorithm: &HashAlgorithmName,
        padding: SignaturePadding,
    ) -> Result<Vec<u8>, CryptoError> {
        self.bridge
            .block_on(self.sign_hash_async(hash, hash_algorithm, padding))
    }

    fn verify_hash(
        &self,
        hash: &[u8],
        signature: &[u8],
        hash_algorithm: &HashAlgorithmName,
        padding: SignaturePadding,
    ) -> Result<bool, CryptoError> {
        let key = self.cached_key()?;
        verify_with(&key, hash, signature, hash_algorithm, padding)
    }

    fn encrypt(&self, data: &[u8], padding: &EncryptionPadding) -> Result<Vec<u8>, CryptoError> {
        let key = self.cached_key()?;
        encrypt_with(&key, data, padding)
    }

    fn decrypt(&self, data: &[u8], padding: &EncryptionPadding) -> Result<Vec<u8>, CryptoError> {
        self.bridge.block_on(self.decrypt_async(data, padding))
    }

    fn export_parameters(&self, include_private: bool) -> Result<RsaParameters, CryptoError> {
        self.check_disposed()?;
        if include_private {
            return Err(CryptoError::failed(
                "private keys cannot be exported by this provider",
            ));
        }
        self.context
            .key()
            .map(RsaParameters::public_only)
            .ok_or_else(|| CryptoError::InvalidArgument("key vault context has no key".into()))
    }

    fn import_parameters(&self, _parameters: &RsaParameters) -> Result<(), CryptoError> {
        self.check_disposed()?;
        Err(CryptoError::UnsupportedOperation(
            "key vault keys cannot be imported".into(),
        ))
    }

    fn hash_data(
        &self,
        data: &[u8],
        offset: usize,
        count: usize,
        hash_algorithm: &HashAlgorithmName,
    ) -> Result<Vec<u8>, CryptoError> {
        self.check_disposed()?;
        hash::hash_data(data, offset, count, hash_algorithm)
    }

    fn hash_reader(
        &self,
        reader: &mut dyn Read,
        hash_algorithm: &HashAlgorithmName,
    ) -> Result<Vec<u8>, CryptoError> {
        self.check_disposed()?;
        hash::hash_reader(reader, hash_algorithm)
    }
}

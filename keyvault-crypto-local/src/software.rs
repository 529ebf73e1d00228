//! A plain local RSA key pair.

use keyvault_crypto::scheme::{decrypt_with, encrypt_with, sign_with, verify_with};
use keyvault_crypto::{
    CryptoError, EncryptionPadding, HashAlgorithmName, KeySizes, RsaAlgorithm, RsaParameters,
    SignaturePadding,
};
use rsa::RsaPrivateKey;
use rsa::traits::PublicKeyParts;
use std::sync::{PoisonError, RwLock};

/// An RSA key pair held in process memory.
///
/// Implements [`RsaAlgorithm`] with no restrictions: any supported padding,
/// private export and import are all allowed.
pub struct SoftwareRsa {
    key: RwLock<RsaPrivateKey>,
}

impl SoftwareRsa {
    /// Generate a fresh key of `bits` bits.
    pub fn generate(bits: usize) -> Result<Self, CryptoError> {
        if !Self::legal_sizes().contains(bits) {
            return Err(CryptoError::InvalidArgument(format!(
                "{bits} is not a legal RSA key size"
            )));
        }
        let key = RsaPrivateKey::new(&mut rand::thread_rng(), bits)
            .map_err(|e| CryptoError::operation_failed("key generation failed", e))?;
        Ok(Self::from_private_key(key))
    }

    /// Wrap an existing private key.
    pub fn from_private_key(key: RsaPrivateKey) -> Self {
        Self {
            key: RwLock::new(key),
        }
    }

    /// A copy of the private key.
    pub fn private_key(&self) -> RsaPrivateKey {
        self.read().clone()
    }

    fn legal_sizes() -> KeySizes {
        KeySizes {
            min_size: 512,
            max_size: 16384,
            skip_size: 64,
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, RsaPrivateKey> {
        self.key.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for SoftwareRsa {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoftwareRsa")
            .field("key_size", &self.key_size())
            .finish_non_exhaustive()
    }
}

impl RsaAlgorithm for SoftwareRsa {
    fn key_size(&self) -> usize {
        self.read().n().bits()
    }

    fn legal_key_sizes(&self) -> Vec<KeySizes> {
        vec![Self::legal_sizes()]
    }

    fn sign_hash(
        &self,
        hash: &[u8],
        hash_algorithm: &HashAlgorithmName,
        padding: SignaturePadding,
    ) -> Result<Vec<u8>, CryptoError> {
        sign_with(&self.read(), hash, hash_algorithm, padding)
    }

    fn verify_hash(
        &self,
        hash: &[u8],
        signature: &[u8],
        hash_algorithm: &HashAlgorithmName,
        padding: SignaturePadding,
    ) -> Result<bool, CryptoError> {
        let public = self.read().to_public_key();
        verify_with(&public, hash, signature, hash_algorithm, padding)
    }

    fn encrypt(&self, data: &[u8], padding: &EncryptionPadding) -> Result<Vec<u8>, CryptoError> {
        let public = self.read().to_public_key();
        encrypt_with(&public, data, padding)
    }

    fn decrypt(&self, data: &[u8], padding: &EncryptionPadding) -> Result<Vec<u8>, CryptoError> {
        decrypt_with(&self.read(), data, padding)
    }

    fn export_parameters(&self, include_private: bool) -> Result<RsaParameters, CryptoError> {
        let key = self.read();
        Ok(if include_private {
            RsaParameters::from(&*key)
        } else {
            RsaParameters::from(&key.to_public_key())
        })
    }

    fn import_parameters(&self, parameters: &RsaParameters) -> Result<(), CryptoError> {
        let key = parameters.to_private_key()?;
        *self.key.write().unwrap_or_else(PoisonError::into_inner) = key;
        Ok(())
    }
}

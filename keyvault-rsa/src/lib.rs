#![deny(missing_docs)]
//! RSA backed by a remote key vault.
//!
//! [`RsaKeyVault`] implements [`RsaAlgorithm`] over a [`KeyVaultContext`]:
//! the private key never leaves the vault, and application code signs,
//! verifies, encrypts and decrypts as it would with a local key pair.
//!
//! ```no_run
//! use keyvault_rsa::{HashAlgorithmName, KeyVaultContext, RsaAlgorithm, RsaKeyVault, SignaturePadding};
//!
//! fn sign(context: KeyVaultContext, payload: &[u8]) -> Result<Vec<u8>, keyvault_rsa::CryptoError> {
//!     let rsa = RsaKeyVault::new(context)?;
//!     rsa.sign_data(payload, &HashAlgorithmName::SHA256, SignaturePadding::Pkcs1)
//! }
//! ```
//!
//! ## What runs where
//!
//! | Operation | Where |
//! |-----------|-------|
//! | sign | vault, PKCS#1 v1.5 only |
//! | decrypt | vault |
//! | verify, encrypt, digest, public export | locally, cached public key |
//! | private export, import | never |

mod bridge;
pub mod config;
mod vault;

pub use config::{BridgeConfig, BridgeStrategy};
pub use keyvault_crypto::{
    ClientError, CryptoError, EncryptionPadding, HashAlgorithmName, KeySizes, KeyVaultClient,
    KeyVaultContext, RsaAlgorithm, RsaParameters, SignaturePadding,
};
pub use vault::RsaKeyVault;

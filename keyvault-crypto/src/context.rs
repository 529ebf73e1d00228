//! The backend context handed to the RSA adapter.

use crate::{ClientError, EncryptionPadding, HashAlgorithmName, KeyVaultClient, RsaParameters};
use std::sync::Arc;

/// JSON Web Algorithm identifiers understood by key vault backends.
pub mod jwa {
    /// RSASSA-PKCS1-v1_5 with SHA-256.
    pub const RS256: &str = "RS256";
    /// RSASSA-PKCS1-v1_5 with SHA-384.
    pub const RS384: &str = "RS384";
    /// RSASSA-PKCS1-v1_5 with SHA-512.
    pub const RS512: &str = "RS512";
    /// RSASSA-PKCS1-v1_5 over a caller-built DigestInfo.
    pub const RSNULL: &str = "RSNULL";
    /// RSAES-PKCS1-v1_5.
    pub const RSA1_5: &str = "RSA1_5";
    /// RSAES-OAEP with SHA-1.
    pub const RSA_OAEP: &str = "RSA-OAEP";
    /// RSAES-OAEP with SHA-256.
    pub const RSA_OAEP_256: &str = "RSA-OAEP-256";
}

/// DER prefix of a SHA-1 DigestInfo, prepended for `RSNULL` signing.
const SHA1_DIGEST_INFO: [u8; 15] = [
    0x30, 0x21, 0x30, 0x09, 0x06, 0x05, 0x2b, 0x0e, 0x03, 0x02, 0x1a, 0x05, 0x00, 0x04, 0x14,
];

/// A remote key: its identifier, its public material and the client that
/// performs private-key operations on it.
///
/// `KeyVaultContext::default()` is the empty context; it is not
/// [valid](KeyVaultContext::is_valid) and cannot back an adapter. Clones
/// share the client.
#[derive(Clone, Default)]
pub struct KeyVaultContext {
    key_id: String,
    key: Option<RsaParameters>,
    client: Option<Arc<dyn KeyVaultClient>>,
}

impl KeyVaultContext {
    /// Create a context for `key_id`. Private components in `key`, if any,
    /// are discarded.
    pub fn new(
        client: Arc<dyn KeyVaultClient>,
        key_id: impl Into<String>,
        key: &RsaParameters,
    ) -> Self {
        Self {
            key_id: key_id.into(),
            key: Some(key.public_only()),
            client: Some(client),
        }
    }

    /// Whether the context carries both a client and key material.
    pub fn is_valid(&self) -> bool {
        self.client.is_some() && self.key.is_some()
    }

    /// The remote key identifier.
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// The public key material, `None` for the empty context.
    pub fn key(&self) -> Option<&RsaParameters> {
        self.key.as_ref()
    }

    /// Sign a precomputed digest remotely with PKCS#1 v1.5 padding.
    ///
    /// SHA-1 has no dedicated JWA, so its DigestInfo is built here and sent
    /// as `RSNULL`.
    pub async fn sign_digest(
        &self,
        digest: &[u8],
        hash_algorithm: &HashAlgorithmName,
    ) -> Result<Vec<u8>, ClientError> {
        let client = self.client()?;
        if *hash_algorithm == HashAlgorithmName::SHA1 {
            let mut digest_info = Vec::with_capacity(SHA1_DIGEST_INFO.len() + digest.len());
            digest_info.extend_from_slice(&SHA1_DIGEST_INFO);
            digest_info.extend_from_slice(digest);
            return client.sign(&self.key_id, jwa::RSNULL, &digest_info).await;
        }
        let algorithm = sign_algorithm(hash_algorithm)?;
        client.sign(&self.key_id, algorithm, digest).await
    }

    /// Decrypt remotely.
    pub async fn decrypt_data(
        &self,
        ciphertext: &[u8],
        padding: &EncryptionPadding,
    ) -> Result<Vec<u8>, ClientError> {
        let client = self.client()?;
        let algorithm = decrypt_algorithm(padding)?;
        client.decrypt(&self.key_id, algorithm, ciphertext).await
    }

    fn client(&self) -> Result<&Arc<dyn KeyVaultClient>, ClientError> {
        self.client
            .as_ref()
            .ok_or_else(|| ClientError::Permanent("key vault context has no client".into()))
    }
}

impl std::fmt::Debug for KeyVaultContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyVaultContext")
            .field("key_id", &self.key_id)
            .field("key", &self.key)
            .field("client", &self.client.as_ref().map(|_| "<dyn KeyVaultClient>"))
            .finish()
    }
}

fn sign_algorithm(hash_algorithm: &HashAlgorithmName) -> Result<&'static str, ClientError> {
    match hash_algorithm.as_str() {
        "SHA256" => Ok(jwa::RS256),
        "SHA384" => Ok(jwa::RS384),
        "SHA512" => Ok(jwa::RS512),
        _ => Err(ClientError::Unsupported(format!(
            "no signing algorithm for hash {hash_algorithm}"
        ))),
    }
}

fn decrypt_algorithm(padding: &EncryptionPadding) -> Result<&'static str, ClientError> {
    match padding {
        EncryptionPadding::Pkcs1 => Ok(jwa::RSA1_5),
        EncryptionPadding::Oaep(hash) if *hash == HashAlgorithmName::SHA1 => Ok(jwa::RSA_OAEP),
        EncryptionPadding::Oaep(hash) if *hash == HashAlgorithmName::SHA256 => {
            Ok(jwa::RSA_OAEP_256)
        }
        other => Err(ClientError::Unsupported(format!(
            "no decryption algorithm for padding {other}"
        ))),
    }
}

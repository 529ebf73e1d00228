//! Mapping of padding selectors onto `rsa` padding schemes.
//!
//! Both the remote-backed adapter and the software key pair go through these
//! functions, so local operations behave identically in both.

use crate::hash::HashKind;
use crate::{CryptoError, EncryptionPadding, HashAlgorithmName, SignaturePadding};
use rand::rngs::OsRng;
use rsa::{Oaep, Pkcs1v15Encrypt, Pkcs1v15Sign, Pss, RsaPrivateKey, RsaPublicKey};
use sha1::Sha1;
use sha2::{Sha256, Sha384, Sha512};

/// PKCS#1 v1.5 signature scheme with the DigestInfo prefix for `algorithm`.
pub fn pkcs1v15_sign(algorithm: &HashAlgorithmName) -> Result<Pkcs1v15Sign, CryptoError> {
    Ok(match HashKind::from_name(algorithm)? {
        HashKind::Sha1 => Pkcs1v15Sign::new::<Sha1>(),
        HashKind::Sha256 => Pkcs1v15Sign::new::<Sha256>(),
        HashKind::Sha384 => Pkcs1v15Sign::new::<Sha384>(),
        HashKind::Sha512 => Pkcs1v15Sign::new::<Sha512>(),
    })
}

/// PSS signature scheme over `algorithm`.
pub fn pss(algorithm: &HashAlgorithmName) -> Result<Pss, CryptoError> {
    Ok(match HashKind::from_name(algorithm)? {
        HashKind::Sha1 => Pss::new::<Sha1>(),
        HashKind::Sha256 => Pss::new::<Sha256>(),
        HashKind::Sha384 => Pss::new::<Sha384>(),
        HashKind::Sha512 => Pss::new::<Sha512>(),
    })
}

/// OAEP scheme over `algorithm`.
pub fn oaep(algorithm: &HashAlgorithmName) -> Result<Oaep, CryptoError> {
    Ok(match HashKind::from_name(algorithm)? {
        HashKind::Sha1 => Oaep::new::<Sha1>(),
        HashKind::Sha256 => Oaep::new::<Sha256>(),
        HashKind::Sha384 => Oaep::new::<Sha384>(),
        HashKind::Sha512 => Oaep::new::<Sha512>(),
    })
}

/// Verify a signature over a precomputed digest.
///
/// A signature that does not verify yields `Ok(false)`; only unsupported
/// hash names are errors.
pub fn verify_with(
    key: &RsaPublicKey,
    hash: &[u8],
    signature: &[u8],
    algorithm: &HashAlgorithmName,
    padding: SignaturePadding,
) -> Result<bool, CryptoError> {
    let verified = match padding {
        SignaturePadding::Pkcs1 => key.verify(pkcs1v15_sign(algorithm)?, hash, signature),
        SignaturePadding::Pss => key.verify(pss(algorithm)?, hash, signature),
    };
    Ok(verified.is_ok())
}

/// Encrypt with the public key.
pub fn encrypt_with(
    key: &RsaPublicKey,
    data: &[u8],
    padding: &EncryptionPadding,
) -> Result<Vec<u8>, CryptoError> {
    let mut rng = OsRng;
    let encrypted = match padding {
        EncryptionPadding::Pkcs1 => key.encrypt(&mut rng, Pkcs1v15Encrypt, data),
        EncryptionPadding::Oaep(hash) => key.encrypt(&mut rng, oaep(hash)?, data),
    };
    encrypted.map_err(|e| CryptoError::operation_failed("encryption failed", e))
}

/// Sign a precomputed digest with the private key.
pub fn sign_with(
    key: &RsaPrivateKey,
    hash: &[u8],
    algorithm: &HashAlgorithmName,
    padding: SignaturePadding,
) -> Result<Vec<u8>, CryptoError> {
    let signed = match padding {
        SignaturePadding::Pkcs1 => key.sign(pkcs1v15_sign(algorithm)?, hash),
        SignaturePadding::Pss => key.sign_with_rng(&mut OsRng, pss(algorithm)?, hash),
    };
    signed.map_err(|e| CryptoError::operation_failed("signing failed", e))
}

/// Decrypt with the private key.
pub fn decrypt_with(
    key: &RsaPrivateKey,
    data: &[u8],
    padding: &EncryptionPadding,
) -> Result<Vec<u8>, CryptoError> {
    let decrypted = match padding {
        EncryptionPadding::Pkcs1 => key.decrypt(Pkcs1v15Encrypt, data),
        EncryptionPadding::Oaep(hash) => key.decrypt(oaep(hash)?, data),
    };
    decrypted.map_err(|e| CryptoError::operation_failed("decryption failed", e))
}

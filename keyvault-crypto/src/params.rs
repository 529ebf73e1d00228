//! RSA key parameters as big-endian byte strings.

use crate::CryptoError;
use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use rsa::{BigUint, RsaPrivateKey, RsaPublicKey};
use zeroize::Zeroize;

/// RSA key parameters.
///
/// All integers are unsigned big-endian. The private components are `None`
/// for public-only parameters and are zeroed on drop. `Debug` never prints
/// them.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct RsaParameters {
    /// Modulus `n`.
    pub modulus: Vec<u8>,
    /// Public exponent `e`.
    pub exponent: Vec<u8>,
    /// Private exponent `d`.
    pub d: Option<Vec<u8>>,
    /// First prime `p`.
    pub p: Option<Vec<u8>>,
    /// Second prime `q`.
    pub q: Option<Vec<u8>>,
    /// `d mod (p - 1)`.
    pub dp: Option<Vec<u8>>,
    /// `d mod (q - 1)`.
    pub dq: Option<Vec<u8>>,
    /// `q^-1 mod p`.
    pub inverse_q: Option<Vec<u8>>,
}

impl RsaParameters {
    /// Public parameters from a modulus and exponent.
    pub fn public(modulus: Vec<u8>, exponent: Vec<u8>) -> Self {
        Self {
            modulus,
            exponent,
            d: None,
            p: None,
            q: None,
            dp: None,
            dq: None,
            inverse_q: None,
        }
    }

    /// Whether any private component is present.
    pub fn has_private(&self) -> bool {
        self.d.is_some()
            || self.p.is_some()
            || self.q.is_some()
            || self.dp.is_some()
            || self.dq.is_some()
            || self.inverse_q.is_some()
    }

    /// A copy holding only the modulus and exponent.
    pub fn public_only(&self) -> Self {
        Self::public(self.modulus.clone(), self.exponent.clone())
    }

    /// Build a public key. Invalid material fails with [`CryptoError::InvalidArgument`].
    pub fn to_public_key(&self) -> Result<RsaPublicKey, CryptoError> {
        if self.modulus.is_empty() || self.exponent.is_empty() {
            return Err(CryptoError::InvalidArgument(
                "RSA parameters are missing the modulus or exponent".into(),
            ));
        }
        let modulus = BigUint::from_bytes_be(&self.modulus);
        if modulus.bits() == 0 {
            return Err(CryptoError::InvalidArgument("RSA modulus is zero".into()));
        }
        RsaPublicKey::new(modulus, BigUint::from_bytes_be(&self.exponent))
            .map_err(|e| CryptoError::InvalidArgument(format!("invalid RSA public key: {e}")))
    }

    /// Build a private key. Requires `d`, `p` and `q`; the CRT values are
    /// recomputed rather than trusted.
    pub fn to_private_key(&self) -> Result<RsaPrivateKey, CryptoError> {
        let (Some(d), Some(p), Some(q)) = (&self.d, &self.p, &self.q) else {
            return Err(CryptoError::InvalidArgument(
                "RSA parameters do not contain a private key".into(),
            ));
        };
        let public = self.to_public_key()?;
        let mut key = RsaPrivateKey::from_components(
            public.n().clone(),
            public.e().clone(),
            BigUint::from_bytes_be(d),
            vec![BigUint::from_bytes_be(p), BigUint::from_bytes_be(q)],
        )
        .map_err(|e| CryptoError::InvalidArgument(format!("invalid RSA private key: {e}")))?;
        key.validate()
            .map_err(|e| CryptoError::InvalidArgument(format!("invalid RSA private key: {e}")))?;
        key.precompute()
            .map_err(|e| CryptoError::InvalidArgument(format!("invalid RSA private key: {e}")))?;
        Ok(key)
    }
}

impl From<&RsaPublicKey> for RsaParameters {
    fn from(key: &RsaPublicKey) -> Self {
        Self::public(key.n().to_bytes_be(), key.e().to_bytes_be())
    }
}

impl From<&RsaPrivateKey> for RsaParameters {
    fn from(key: &RsaPrivateKey) -> Self {
        let mut params = RsaParameters::from(&key.to_public_key());
        if let [p, q] = key.primes() {
            let one = BigUint::from(1u32);
            let two = BigUint::from(2u32);
            let d = key.d();
            params.dp = Some((d % &(p - &one)).to_bytes_be());
            params.dq = Some((d % &(q - &one)).to_bytes_be());
            // p is prime, so q^(p-2) mod p is the inverse of q.
            params.inverse_q = Some(q.modpow(&(p - &two), p).to_bytes_be());
            params.p = Some(p.to_bytes_be());
            params.q = Some(q.to_bytes_be());
        }
        params.d = Some(key.d().to_bytes_be());
        params
    }
}

impl std::fmt::Debug for RsaParameters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RsaParameters")
            .field("modulus_bits", &(self.modulus.len() * 8))
            .field("exponent", &self.exponent)
            .field("private", &self.has_private().then_some("[REDACTED]"))
            .finish()
    }
}

impl Drop for RsaParameters {
    fn drop(&mut self) {
        self.d.zeroize();
        self.p.zeroize();
        self.q.zeroize();
        self.dp.zeroize();
        self.dq.zeroize();
        self.inverse_q.zeroize();
    }
}

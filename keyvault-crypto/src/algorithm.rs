//! Per-call selectors: hash algorithm names, padding modes and key size ranges.

use std::borrow::Cow;
use std::fmt;

/// Name of a hash algorithm, compared case-sensitively.
///
/// The set of names is open: callers may build any name with
/// [`HashAlgorithmName::new`], and each operation decides whether it
/// supports it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HashAlgorithmName(Cow<'static, str>);

impl HashAlgorithmName {
    /// MD5. Never supported by this workspace, kept for callers that pass it through.
    pub const MD5: Self = Self(Cow::Borrowed("MD5"));
    /// SHA-1.
    pub const SHA1: Self = Self(Cow::Borrowed("SHA1"));
    /// SHA-256.
    pub const SHA256: Self = Self(Cow::Borrowed("SHA256"));
    /// SHA-384.
    pub const SHA384: Self = Self(Cow::Borrowed("SHA384"));
    /// SHA-512.
    pub const SHA512: Self = Self(Cow::Borrowed("SHA512"));

    /// Create a hash algorithm name from an arbitrary string.
    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    /// The name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HashAlgorithmName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HashAlgorithmName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Padding mode for signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignaturePadding {
    /// PKCS#1 v1.5 (RSASSA-PKCS1-v1_5).
    Pkcs1,
    /// RSASSA-PSS with MGF1 over the signing hash and a salt as long as the digest.
    Pss,
}

impl fmt::Display for SignaturePadding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignaturePadding::Pkcs1 => f.write_str("Pkcs1"),
            SignaturePadding::Pss => f.write_str("Pss"),
        }
    }
}

/// Padding mode for encryption and decryption.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EncryptionPadding {
    /// PKCS#1 v1.5 (RSAES-PKCS1-v1_5).
    Pkcs1,
    /// RSAES-OAEP with the given hash for both the label hash and MGF1.
    Oaep(HashAlgorithmName),
}

impl EncryptionPadding {
    /// OAEP with SHA-1.
    pub const OAEP_SHA1: Self = Self::Oaep(HashAlgorithmName::SHA1);
    /// OAEP with SHA-256.
    pub const OAEP_SHA256: Self = Self::Oaep(HashAlgorithmName::SHA256);
    /// OAEP with SHA-384.
    pub const OAEP_SHA384: Self = Self::Oaep(HashAlgorithmName::SHA384);
    /// OAEP with SHA-512.
    pub const OAEP_SHA512: Self = Self::Oaep(HashAlgorithmName::SHA512);
}

impl fmt::Display for EncryptionPadding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncryptionPadding::Pkcs1 => f.write_str("Pkcs1"),
            EncryptionPadding::Oaep(hash) => write!(f, "Oaep{hash}"),
        }
    }
}

/// A legal key size range, in bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeySizes {
    /// Smallest legal size.
    pub min_size: usize,
    /// Largest legal size.
    pub max_size: usize,
    /// Step between legal sizes; zero when `min_size == max_size`.
    pub skip_size: usize,
}

impl KeySizes {
    /// A range holding exactly one size.
    pub fn fixed(size: usize) -> Self {
        Self {
            min_size: size,
            max_size: size,
            skip_size: 0,
        }
    }

    /// Whether `size` falls inside this range.
    pub fn contains(&self, size: usize) -> bool {
        if size < self.min_size || size > self.max_size {
            return false;
        }
        if self.skip_size == 0 {
            return size == self.min_size || size == self.max_size;
        }
        (size - self.min_size) % self.skip_size == 0
    }
}

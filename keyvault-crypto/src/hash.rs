//! Digest computation dispatched by [`HashAlgorithmName`].
//!
//! Only SHA-1, SHA-256, SHA-384 and SHA-512 are recognised. Every other
//! name fails with [`CryptoError::UnsupportedOperation`].

use crate::{CryptoError, HashAlgorithmName};
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha384, Sha512};
use std::io::{self, Read, Write};

/// The closed set of digests this workspace computes locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashKind {
    /// SHA-1.
    Sha1,
    /// SHA-256.
    Sha256,
    /// SHA-384.
    Sha384,
    /// SHA-512.
    Sha512,
}

impl HashKind {
    /// Resolve a hash algorithm name.
    pub fn from_name(name: &HashAlgorithmName) -> Result<Self, CryptoError> {
        match name.as_str() {
            "SHA1" => Ok(HashKind::Sha1),
            "SHA256" => Ok(HashKind::Sha256),
            "SHA384" => Ok(HashKind::Sha384),
            "SHA512" => Ok(HashKind::Sha512),
            _ => Err(CryptoError::UnsupportedOperation(format!(
                "hash algorithm {name} is not supported"
            ))),
        }
    }

    /// Digest length in bytes.
    pub fn output_size(self) -> usize {
        match self {
            HashKind::Sha1 => 20,
            HashKind::Sha256 => 32,
            HashKind::Sha384 => 48,
            HashKind::Sha512 => 64,
        }
    }

    /// A fresh hasher for this digest.
    pub fn hasher(self) -> Hasher {
        match self {
            HashKind::Sha1 => Hasher::Sha1(Sha1::new()),
            HashKind::Sha256 => Hasher::Sha256(Sha256::new()),
            HashKind::Sha384 => Hasher::Sha384(Sha384::new()),
            HashKind::Sha512 => Hasher::Sha512(Sha512::new()),
        }
    }
}

/// Incremental hasher over one of the [`HashKind`] digests.
///
/// Implements [`Write`] so it can be fed with [`io::copy`].
#[derive(Clone)]
pub enum Hasher {
    /// SHA-1 state.
    Sha1(Sha1),
    /// SHA-256 state.
    Sha256(Sha256),
    /// SHA-384 state.
    Sha384(Sha384),
    /// SHA-512 state.
    Sha512(Sha512),
}

impl Hasher {
    /// Absorb more input.
    pub fn update(&mut self, data: &[u8]) {
        match self {
            Hasher::Sha1(h) => h.update(data),
            Hasher::Sha256(h) => h.update(data),
            Hasher::Sha384(h) => h.update(data),
            Hasher::Sha512(h) => h.update(data),
        }
    }

    /// Consume the hasher and return the digest.
    pub fn finalize(self) -> Vec<u8> {
        match self {
            Hasher::Sha1(h) => h.finalize().to_vec(),
            Hasher::Sha256(h) => h.finalize().to_vec(),
            Hasher::Sha384(h) => h.finalize().to_vec(),
            Hasher::Sha512(h) => h.finalize().to_vec(),
        }
    }
}

impl Write for Hasher {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Hash `count` bytes of `data` starting at `offset`.
///
/// Fails with [`CryptoError::InvalidArgument`] when the range does not fit
/// inside `data`.
pub fn hash_data(
    data: &[u8],
    offset: usize,
    count: usize,
    algorithm: &HashAlgorithmName,
) -> Result<Vec<u8>, CryptoError> {
    let kind = HashKind::from_name(algorithm)?;
    let slice = offset
        .checked_add(count)
        .and_then(|end| data.get(offset..end))
        .ok_or_else(|| {
            CryptoError::InvalidArgument(format!(
                "range {offset}+{count} exceeds buffer of {} bytes",
                data.len()
            ))
        })?;
    let mut hasher = kind.hasher();
    hasher.update(slice);
    Ok(hasher.finalize())
}

/// Hash everything `reader` yields until end of stream.
pub fn hash_reader(
    reader: &mut dyn Read,
    algorithm: &HashAlgorithmName,
) -> Result<Vec<u8>, CryptoError> {
    let mut hasher = HashKind::from_name(algorithm)?.hasher();
    io::copy(reader, &mut hasher)?;
    Ok(hasher.finalize())
}

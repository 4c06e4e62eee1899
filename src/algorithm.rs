use std::fmt;

use sha1::Sha1;
use sha2::{Digest, Sha256, Sha384, Sha512};

use crate::error::{CertSmithError, Result};
use crate::key::KeyPair;

/// Hash algorithms usable for certificate signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HashAlgorithm {
    Sha1,
    #[default]
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    /// Hashes `data` with this algorithm.
    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        match self {
            HashAlgorithm::Sha1 => Sha1::digest(data).to_vec(),
            HashAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
            HashAlgorithm::Sha384 => Sha384::digest(data).to_vec(),
            HashAlgorithm::Sha512 => Sha512::digest(data).to_vec(),
        }
    }

    /// Length of the digest in bytes.
    /// The digest as an ECDSA prehash for a curve with `field_len`-byte
    /// scalars: left-padded with zeros when shorter, which keeps its integer
    /// value unchanged.
    pub fn ecdsa_prehash(&self, data: &[u8], field_len: usize) -> Vec<u8> {
        let digest = self.digest(data);
        if digest.len() >= field_len {
            return digest;
        }
        let mut padded = vec![0u8; field_len - digest.len()];
        padded.extend_from_slice(&digest);
        padded
    }

    pub fn output_len(&self) -> usize {
        match self {
            HashAlgorithm::Sha1 => 20,
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Sha384 => 48,
            HashAlgorithm::Sha512 => 64,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HashAlgorithm::Sha1 => "SHA1",
            HashAlgorithm::Sha256 => "SHA256",
            HashAlgorithm::Sha384 => "SHA384",
            HashAlgorithm::Sha512 => "SHA512",
        };
        f.write_str(name)
    }
}

/// RSA signature padding scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RsaPadding {
    /// RSASSA-PKCS1-v1_5.
    #[default]
    Pkcs1,
    /// RSASSA-PSS with MGF1 over the same hash and a digest-sized salt.
    Pss,
}

/// Public-key algorithm family, without size or hash details.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAlgorithm {
    Rsa,
    Ecdsa,
    Dsa,
}

impl fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KeyAlgorithm::Rsa => "RSA",
            KeyAlgorithm::Ecdsa => "ECDSA",
            KeyAlgorithm::Dsa => "DSA",
        };
        f.write_str(name)
    }
}

/// ECDSA key sizes accepted by [`AlgorithmOptions::ecdsa`].
pub const ECDSA_KEY_SIZES: [u32; 5] = [160, 224, 256, 384, 512];

/// Key algorithm, key size and hash used to create a certificate.
///
/// Values are validated on construction and immutable afterwards; build
/// them with [`AlgorithmOptions::rsa`], [`AlgorithmOptions::ecdsa`],
/// [`AlgorithmOptions::dsa`] or their `*_with` variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmOptions {
    Rsa {
        key_size: u32,
        hash: HashAlgorithm,
        padding: RsaPadding,
    },
    Ecdsa {
        key_size: u32,
        hash: HashAlgorithm,
    },
    Dsa {
        key_size: u32,
        hash: HashAlgorithm,
    },
}

impl Default for AlgorithmOptions {
    /// ECDSA on P-256 with SHA-256.
    fn default() -> Self {
        AlgorithmOptions::Ecdsa {
            key_size: 256,
            hash: HashAlgorithm::Sha256,
        }
    }
}

impl AlgorithmOptions {
    /// RSA with SHA-256 and PKCS#1 v1.5 padding.
    pub fn rsa(key_size: u32) -> Result<Self> {
        Self::rsa_with(key_size, HashAlgorithm::Sha256, RsaPadding::Pkcs1)
    }

    /// RSA with an explicit hash and padding.
    pub fn rsa_with(key_size: u32, hash: HashAlgorithm, padding: RsaPadding) -> Result<Self> {
        check_multiple_of_1024("RSA", key_size)?;
        Ok(AlgorithmOptions::Rsa {
            key_size,
            hash,
            padding,
        })
    }

    /// ECDSA with the hash matched to the curve size.
    ///
    /// Sizes up to 256 use SHA-256, 384 uses SHA-384 and 512 uses SHA-512.
    pub fn ecdsa(key_size: u32) -> Result<Self> {
        let hash = match key_size {
            384 => HashAlgorithm::Sha384,
            512 => HashAlgorithm::Sha512,
            _ => HashAlgorithm::Sha256,
        };
        Self::ecdsa_with(key_size, hash)
    }

    /// ECDSA with an explicit hash.
    pub fn ecdsa_with(key_size: u32, hash: HashAlgorithm) -> Result<Self> {
        if !ECDSA_KEY_SIZES.contains(&key_size) {
            return Err(CertSmithError::InvalidArgument(format!(
                "ECDSA key size {key_size} must be one of 160 (legacy), 224, 256, 384, 512"
            )));
        }
        Ok(AlgorithmOptions::Ecdsa { key_size, hash })
    }

    /// DSA with SHA-256.
    pub fn dsa(key_size: u32) -> Result<Self> {
        Self::dsa_with(key_size, HashAlgorithm::Sha256)
    }

    /// DSA with an explicit hash.
    pub fn dsa_with(key_size: u32, hash: HashAlgorithm) -> Result<Self> {
        check_multiple_of_1024("DSA", key_size)?;
        Ok(AlgorithmOptions::Dsa { key_size, hash })
    }

    pub fn key_algorithm(&self) -> KeyAlgorithm {
        match self {
            AlgorithmOptions::Rsa { .. } => KeyAlgorithm::Rsa,
            AlgorithmOptions::Ecdsa { .. } => KeyAlgorithm::Ecdsa,
            AlgorithmOptions::Dsa { .. } => KeyAlgorithm::Dsa,
        }
    }

    pub fn key_size(&self) -> u32 {
        match self {
            AlgorithmOptions::Rsa { key_size, .. }
            | AlgorithmOptions::Ecdsa { key_size, .. }
            | AlgorithmOptions::Dsa { key_size, .. } => *key_size,
        }
    }

    pub fn hash(&self) -> HashAlgorithm {
        match self {
            AlgorithmOptions::Rsa { hash, .. }
            | AlgorithmOptions::Ecdsa { hash, .. }
            | AlgorithmOptions::Dsa { hash, .. } => *hash,
        }
    }

    /// RSA padding, or PKCS#1 v1.5 for the non-RSA variants.
    pub fn rsa_padding(&self) -> RsaPadding {
        match self {
            AlgorithmOptions::Rsa { padding, .. } => *padding,
            _ => RsaPadding::Pkcs1,
        }
    }

    /// Generates a fresh key pair matching these options.
    ///
    /// This is the only place the crate generates keys.
    pub fn create_key_pair(&self) -> Result<KeyPair> {
        match *self {
            AlgorithmOptions::Rsa { key_size, .. } => KeyPair::generate_rsa(key_size as usize),
            AlgorithmOptions::Ecdsa { key_size, .. } => KeyPair::generate_ecdsa(key_size),
            AlgorithmOptions::Dsa { key_size, .. } => KeyPair::generate_dsa(key_size),
        }
    }
}

fn check_multiple_of_1024(algorithm: &str, key_size: u32) -> Result<()> {
    if key_size == 0 || key_size % 1024 != 0 {
        return Err(CertSmithError::InvalidArgument(format!(
            "{algorithm} key size {key_size} is not a multiple of 1024"
        )));
    }
    Ok(())
}

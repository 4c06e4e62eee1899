//! Signature generators for the supported key types.
//!
//! A generator knows the DER `AlgorithmIdentifier` it signs under, how to
//! sign the TBS bytes, and the SubjectPublicKeyInfo of its key.

use const_oid::AssociatedOid;
use der::asn1::Any;
use der::{Decode, Encode};
use ecdsa::signature::hazmat::PrehashSigner;
use ecdsa::signature::{DigestSigner, RandomizedSigner, SignatureEncoding, Signer};
use rand_core::OsRng;
use rsa::RsaPrivateKey;
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha384, Sha512};
use tracing::debug;
use x509_cert::spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};

use crate::algorithm::{HashAlgorithm, RsaPadding};
use crate::asn1;
use crate::error::{CertSmithError, Result};
use crate::key::KeyPair;
use crate::oid;

/// dsa-with-sha1, absent parameters.
const DSA_WITH_SHA1_ALGORITHM_ID: [u8; 11] = [
    0x30, 0x09, 0x06, 0x07, 0x2A, 0x86, 0x48, 0xCE, 0x38, 0x04, 0x03,
];
/// id-dsa-with-sha256, absent parameters.
const DSA_WITH_SHA256_ALGORITHM_ID: [u8; 13] = [
    0x30, 0x0B, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x03, 0x02,
];

/// Produces certificate signatures.
pub trait SignatureGenerator {
    /// DER encoding of the signature `AlgorithmIdentifier`.
    fn signature_algorithm_identifier(&self) -> Result<Vec<u8>>;

    /// Signs `data`, returning the signature in its X.509 form.
    fn sign_data(&self, data: &[u8]) -> Result<Vec<u8>>;

    /// The signer's SubjectPublicKeyInfo.
    fn public_key(&self) -> Result<SubjectPublicKeyInfoOwned>;
}

/// Picks the generator for `key`.
///
/// `padding` is ignored for non-RSA keys. DSA keys sign with SHA-256 when
/// asked for a hash DSA does not support.
pub fn for_key_pair<'a>(
    key: &'a KeyPair,
    hash: HashAlgorithm,
    padding: RsaPadding,
) -> Result<Box<dyn SignatureGenerator + 'a>> {
    debug!(key = ?key, %hash, ?padding, "selecting signature generator");
    let generator: Box<dyn SignatureGenerator + 'a> = match key {
        KeyPair::Rsa(private) => Box::new(RsaSignatureGenerator::new(private, hash, padding)),
        KeyPair::Dsa(private) => {
            let hash = match hash {
                HashAlgorithm::Sha1 | HashAlgorithm::Sha256 => hash,
                other => {
                    debug!(requested = %other, "DSA key falls back to SHA256");
                    HashAlgorithm::Sha256
                }
            };
            Box::new(DsaSignatureGenerator::new(private, hash)?)
        }
        _ => Box::new(EcdsaSignatureGenerator::new(key, hash)?),
    };
    Ok(generator)
}

pub struct RsaSignatureGenerator<'a> {
    key: &'a RsaPrivateKey,
    hash: HashAlgorithm,
    padding: RsaPadding,
}

impl<'a> RsaSignatureGenerator<'a> {
    pub fn new(key: &'a RsaPrivateKey, hash: HashAlgorithm, padding: RsaPadding) -> Self {
        Self { key, hash, padding }
    }

    fn algorithm_identifier(&self) -> Result<AlgorithmIdentifierOwned> {
        let algorithm = match self.padding {
            RsaPadding::Pkcs1 => AlgorithmIdentifierOwned {
                oid: match self.hash {
                    HashAlgorithm::Sha1 => oid::SHA1_WITH_RSA_ENCRYPTION,
                    HashAlgorithm::Sha256 => oid::SHA256_WITH_RSA_ENCRYPTION,
                    HashAlgorithm::Sha384 => oid::SHA384_WITH_RSA_ENCRYPTION,
                    HashAlgorithm::Sha512 => oid::SHA512_WITH_RSA_ENCRYPTION,
                },
                parameters: Some(Any::null()),
            },
            RsaPadding::Pss => match self.hash {
                HashAlgorithm::Sha1 => rsa::pss::get_default_pss_signature_algo_id::<Sha1>()?,
                HashAlgorithm::Sha256 => rsa::pss::get_default_pss_signature_algo_id::<Sha256>()?,
                HashAlgorithm::Sha384 => rsa::pss::get_default_pss_signature_algo_id::<Sha384>()?,
                HashAlgorithm::Sha512 => rsa::pss::get_default_pss_signature_algo_id::<Sha512>()?,
            },
        };
        Ok(algorithm)
    }
}

impl SignatureGenerator for RsaSignatureGenerator<'_> {
    fn signature_algorithm_identifier(&self) -> Result<Vec<u8>> {
        Ok(self.algorithm_identifier()?.to_der()?)
    }

    fn sign_data(&self, data: &[u8]) -> Result<Vec<u8>> {
        let key = self.key.clone();
        let signature = match (self.padding, self.hash) {
            (RsaPadding::Pkcs1, HashAlgorithm::Sha1) => {
                rsa::pkcs1v15::SigningKey::<Sha1>::new(key).try_sign(data)?.to_vec()
            }
            (RsaPadding::Pkcs1, HashAlgorithm::Sha256) => {
                rsa::pkcs1v15::SigningKey::<Sha256>::new(key).try_sign(data)?.to_vec()
            }
            (RsaPadding::Pkcs1, HashAlgorithm::Sha384) => {
                rsa::pkcs1v15::SigningKey::<Sha384>::new(key).try_sign(data)?.to_vec()
            }
            (RsaPadding::Pkcs1, HashAlgorithm::Sha512) => {
                rsa::pkcs1v15::SigningKey::<Sha512>::new(key).try_sign(data)?.to_vec()
            }
            (RsaPadding::Pss, HashAlgorithm::Sha1) => rsa::pss::BlindedSigningKey::<Sha1>::new(key)
                .try_sign_with_rng(&mut OsRng, data)?
                .to_vec(),
            (RsaPadding::Pss, HashAlgorithm::Sha256) => {
                rsa::pss::BlindedSigningKey::<Sha256>::new(key)
                    .try_sign_with_rng(&mut OsRng, data)?
                    .to_vec()
            }
            (RsaPadding::Pss, HashAlgorithm::Sha384) => {
                rsa::pss::BlindedSigningKey::<Sha384>::new(key)
                    .try_sign_with_rng(&mut OsRng, data)?
                    .to_vec()
            }
            (RsaPadding::Pss, HashAlgorithm::Sha512) => {
                rsa::pss::BlindedSigningKey::<Sha512>::new(key)
                    .try_sign_with_rng(&mut OsRng, data)?
                    .to_vec()
            }
        };
        Ok(signature)
    }

    fn public_key(&self) -> Result<SubjectPublicKeyInfoOwned> {
        Ok(SubjectPublicKeyInfoOwned::from_key(self.key.to_public_key())?)
    }
}

/// ECDSA over P-224, P-256, P-384 or P-521.
///
/// The digest is computed here and signed as a prehash, so any of the
/// supported hashes can be paired with any curve.
pub struct EcdsaSignatureGenerator<'a> {
    key: &'a KeyPair,
    hash: HashAlgorithm,
    field_len: usize,
}

impl<'a> EcdsaSignatureGenerator<'a> {
    pub fn new(key: &'a KeyPair, hash: HashAlgorithm) -> Result<Self> {
        let field_len = key.public_key().ecdsa_field_len().ok_or_else(|| {
            CertSmithError::NotSupported(format!("{key:?} is not an ECDSA key"))
        })?;
        Ok(Self {
            key,
            hash,
            field_len,
        })
    }
}

impl SignatureGenerator for EcdsaSignatureGenerator<'_> {
    fn signature_algorithm_identifier(&self) -> Result<Vec<u8>> {
        let algorithm = AlgorithmIdentifierOwned {
            oid: match self.hash {
                HashAlgorithm::Sha1 => oid::ECDSA_WITH_SHA1,
                HashAlgorithm::Sha256 => oid::ECDSA_WITH_SHA256,
                HashAlgorithm::Sha384 => oid::ECDSA_WITH_SHA384,
                HashAlgorithm::Sha512 => oid::ECDSA_WITH_SHA512,
            },
            parameters: None,
        };
        Ok(algorithm.to_der()?)
    }

    fn sign_data(&self, data: &[u8]) -> Result<Vec<u8>> {
        let digest = self.hash.ecdsa_prehash(data, self.field_len);
        // fixed-width r || s
        let fixed = match self.key {
            KeyPair::EcdsaP224(key) => {
                let signature: p224::ecdsa::Signature = key.sign_prehash(&digest)?;
                signature.to_bytes().to_vec()
            }
            KeyPair::EcdsaP256(key) => {
                let signature: p256::ecdsa::Signature = key.sign_prehash(&digest)?;
                signature.to_bytes().to_vec()
            }
            KeyPair::EcdsaP384(key) => {
                let signature: p384::ecdsa::Signature = key.sign_prehash(&digest)?;
                signature.to_bytes().to_vec()
            }
            KeyPair::EcdsaP521(key) => {
                let key = p521::ecdsa::SigningKey::from_bytes(&key.to_bytes())?;
                let signature: p521::ecdsa::Signature = key.sign_prehash(&digest)?;
                signature.to_bytes().to_vec()
            }
            other => {
                return Err(CertSmithError::NotSupported(format!(
                    "{other:?} is not an ECDSA key"
                )));
            }
        };
        asn1::encode_p1363_signature(&fixed).ok_or_else(|| {
            CertSmithError::EncodingError("ECDSA signature has an odd length".to_string())
        })
    }

    fn public_key(&self) -> Result<SubjectPublicKeyInfoOwned> {
        self.key.public_key_info()
    }
}

/// DSA with SHA-1 or SHA-256.
pub struct DsaSignatureGenerator<'a> {
    key: &'a dsa::SigningKey,
    hash: HashAlgorithm,
}

impl<'a> DsaSignatureGenerator<'a> {
    pub fn new(key: &'a dsa::SigningKey, hash: HashAlgorithm) -> Result<Self> {
        match hash {
            HashAlgorithm::Sha1 | HashAlgorithm::Sha256 => Ok(Self { key, hash }),
            other => Err(CertSmithError::NotSupported(format!(
                "DSA signatures with {other} are not supported"
            ))),
        }
    }
}

impl SignatureGenerator for DsaSignatureGenerator<'_> {
    fn signature_algorithm_identifier(&self) -> Result<Vec<u8>> {
        match self.hash {
            HashAlgorithm::Sha1 => Ok(DSA_WITH_SHA1_ALGORITHM_ID.to_vec()),
            HashAlgorithm::Sha256 => Ok(DSA_WITH_SHA256_ALGORITHM_ID.to_vec()),
            other => Err(CertSmithError::NotSupported(format!(
                "DSA signatures with {other} are not supported"
            ))),
        }
    }

    fn sign_data(&self, data: &[u8]) -> Result<Vec<u8>> {
        let signature: dsa::Signature = match self.hash {
            HashAlgorithm::Sha1 => self.key.try_sign_digest(Sha1::new_with_prefix(data))?,
            HashAlgorithm::Sha256 => self.key.try_sign_digest(Sha256::new_with_prefix(data))?,
            other => {
                return Err(CertSmithError::NotSupported(format!(
                    "DSA signatures with {other} are not supported"
                )));
            }
        };
        Ok(asn1::encode_dss_signature(
            &signature.r().to_bytes_be(),
            &signature.s().to_bytes_be(),
        ))
    }

    fn public_key(&self) -> Result<SubjectPublicKeyInfoOwned> {
        crate::key::PublicKey::Dsa(self.key.verifying_key().clone()).to_spki()
    }
}

/// Maps a certificate's signature `AlgorithmIdentifier` back to the hash
/// and RSA padding needed to verify it.
pub fn hash_and_padding(
    algorithm: &AlgorithmIdentifierOwned,
) -> Result<(HashAlgorithm, RsaPadding)> {
    let pkcs1 = RsaPadding::Pkcs1;
    let found = match algorithm.oid {
        oid::SHA1_WITH_RSA_ENCRYPTION | oid::ECDSA_WITH_SHA1 | oid::DSA_WITH_SHA1 => {
            (HashAlgorithm::Sha1, pkcs1)
        }
        oid::SHA256_WITH_RSA_ENCRYPTION | oid::ECDSA_WITH_SHA256 | oid::DSA_WITH_SHA256 => {
            (HashAlgorithm::Sha256, pkcs1)
        }
        oid::SHA384_WITH_RSA_ENCRYPTION | oid::ECDSA_WITH_SHA384 => (HashAlgorithm::Sha384, pkcs1),
        oid::SHA512_WITH_RSA_ENCRYPTION | oid::ECDSA_WITH_SHA512 => (HashAlgorithm::Sha512, pkcs1),
        oid::ID_RSASSA_PSS => (pss_hash(algorithm)?, RsaPadding::Pss),
        other => {
            return Err(CertSmithError::NotSupported(format!(
                "unknown signature algorithm {other}"
            )));
        }
    };
    Ok(found)
}

fn pss_hash(algorithm: &AlgorithmIdentifierOwned) -> Result<HashAlgorithm> {
    let parameters = algorithm
        .parameters
        .as_ref()
        .ok_or_else(|| CertSmithError::DecodingError("RSASSA-PSS without parameters".into()))?;
    let encoded = parameters.to_der()?;
    let parameters = rsa::pkcs1::RsaPssParams::from_der(&encoded)?;
    let hash = parameters.hash.oid;
    if hash == Sha1::OID {
        Ok(HashAlgorithm::Sha1)
    } else if hash == Sha256::OID {
        Ok(HashAlgorithm::Sha256)
    } else if hash == Sha384::OID {
        Ok(HashAlgorithm::Sha384)
    } else if hash == Sha512::OID {
        Ok(HashAlgorithm::Sha512)
    } else {
        Err(CertSmithError::NotSupported(format!(
            "unknown RSASSA-PSS hash {hash}"
        )))
    }
}

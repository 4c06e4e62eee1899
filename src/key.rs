use std::fmt;

use const_oid::ObjectIdentifier;
use der::{Decode, Encode};
use ecdsa::signature::hazmat::PrehashVerifier;
use ecdsa::signature::{DigestVerifier, Verifier};
use p521::NistP521;
use pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, PrivateKeyInfo, SecretDocument};
use rand_core::OsRng;
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha384, Sha512};
use tracing::debug;
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::algorithm::{HashAlgorithm, KeyAlgorithm, RsaPadding};
use crate::asn1;
use crate::error::{CertSmithError, Result};
use crate::oid;
use crate::pem_utils;

/// A private key together with its public half.
///
/// Key material is zeroized on drop by the underlying RustCrypto types.
#[derive(Clone)]
pub enum KeyPair {
    Rsa(Box<RsaPrivateKey>),
    EcdsaP224(p224::ecdsa::SigningKey),
    EcdsaP256(p256::ecdsa::SigningKey),
    EcdsaP384(p384::ecdsa::SigningKey),
    EcdsaP521(ecdsa::SigningKey<NistP521>),
    Dsa(Box<dsa::SigningKey>),
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("KeyPair").field(&self.describe()).finish()
    }
}

impl KeyPair {
    /// Generate an RSA key pair with the specified number of bits.
    pub fn generate_rsa(bits: usize) -> Result<Self> {
        debug!(bits, "generating RSA key pair");
        let private = RsaPrivateKey::new(&mut OsRng, bits)?;
        Ok(KeyPair::Rsa(Box::new(private)))
    }

    /// Generate an ECDSA key pair on the NIST curve matching `key_size`.
    ///
    /// 512 selects P-521. 160-bit curves have no implementation and fail
    /// with `NotSupported`.
    pub fn generate_ecdsa(key_size: u32) -> Result<Self> {
        debug!(key_size, "generating ECDSA key pair");
        match key_size {
            224 => Ok(Self::generate_ecdsa_p224()),
            256 => Ok(Self::generate_ecdsa_p256()),
            384 => Ok(Self::generate_ecdsa_p384()),
            512 | 521 => Ok(Self::generate_ecdsa_p521()),
            _ => Err(CertSmithError::NotSupported(format!(
                "no ECDSA curve available for a {key_size}-bit key"
            ))),
        }
    }

    pub fn generate_ecdsa_p224() -> Self {
        KeyPair::EcdsaP224(p224::ecdsa::SigningKey::random(&mut OsRng))
    }

    pub fn generate_ecdsa_p256() -> Self {
        KeyPair::EcdsaP256(p256::ecdsa::SigningKey::random(&mut OsRng))
    }

    pub fn generate_ecdsa_p384() -> Self {
        KeyPair::EcdsaP384(p384::ecdsa::SigningKey::random(&mut OsRng))
    }

    pub fn generate_ecdsa_p521() -> Self {
        KeyPair::EcdsaP521(ecdsa::SigningKey::<NistP521>::random(&mut OsRng))
    }

    /// Generate a DSA key pair with fresh domain parameters.
    ///
    /// Supported sizes are 1024 (N=160), 2048 and 3072 (N=256). Parameter
    /// generation is slow, especially at 3072 bits.
    #[allow(deprecated)]
    pub fn generate_dsa(key_size: u32) -> Result<Self> {
        let size = match key_size {
            1024 => dsa::KeySize::DSA_1024_160,
            2048 => dsa::KeySize::DSA_2048_256,
            3072 => dsa::KeySize::DSA_3072_256,
            _ => {
                return Err(CertSmithError::NotSupported(format!(
                    "DSA key size {key_size} is not supported"
                )));
            }
        };
        debug!(key_size, "generating DSA domain parameters and key pair");
        let components = dsa::Components::generate(&mut OsRng, size);
        let signing_key = dsa::SigningKey::generate(&mut OsRng, components);
        Ok(KeyPair::Dsa(Box::new(signing_key)))
    }

    /// The algorithm family of this key.
    pub fn algorithm(&self) -> KeyAlgorithm {
        match self {
            KeyPair::Rsa(_) => KeyAlgorithm::Rsa,
            KeyPair::EcdsaP224(_)
            | KeyPair::EcdsaP256(_)
            | KeyPair::EcdsaP384(_)
            | KeyPair::EcdsaP521(_) => KeyAlgorithm::Ecdsa,
            KeyPair::Dsa(_) => KeyAlgorithm::Dsa,
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            KeyPair::Rsa(_) => "RSA",
            KeyPair::EcdsaP224(_) => "ECDSA P-224",
            KeyPair::EcdsaP256(_) => "ECDSA P-256",
            KeyPair::EcdsaP384(_) => "ECDSA P-384",
            KeyPair::EcdsaP521(_) => "ECDSA P-521",
            KeyPair::Dsa(_) => "DSA",
        }
    }

    /// The public half of this key pair.
    pub fn public_key(&self) -> PublicKey {
        match self {
            KeyPair::Rsa(private) => PublicKey::Rsa(RsaPublicKey::from(private.as_ref())),
            KeyPair::EcdsaP224(key) => PublicKey::EcdsaP224(*key.verifying_key()),
            KeyPair::EcdsaP256(key) => PublicKey::EcdsaP256(*key.verifying_key()),
            KeyPair::EcdsaP384(key) => PublicKey::EcdsaP384(*key.verifying_key()),
            KeyPair::EcdsaP521(key) => PublicKey::EcdsaP521(*key.verifying_key()),
            KeyPair::Dsa(key) => PublicKey::Dsa(key.verifying_key().clone()),
        }
    }

    /// SubjectPublicKeyInfo for the public half of this key pair.
    pub fn public_key_info(&self) -> Result<SubjectPublicKeyInfoOwned> {
        self.public_key().to_spki()
    }

    /// Exports the private key as PKCS#8 DER.
    pub fn to_pkcs8_der(&self) -> Result<SecretDocument> {
        let document = match self {
            KeyPair::Rsa(private) => private.to_pkcs8_der()?,
            KeyPair::EcdsaP224(key) => key.to_pkcs8_der()?,
            KeyPair::EcdsaP256(key) => key.to_pkcs8_der()?,
            KeyPair::EcdsaP384(key) => key.to_pkcs8_der()?,
            KeyPair::EcdsaP521(key) => key.to_pkcs8_der()?,
            KeyPair::Dsa(key) => key.to_pkcs8_der()?,
        };
        Ok(document)
    }

    /// Exports the private key as a PKCS#8 PEM string.
    pub fn to_pkcs8_pem(&self) -> Result<zeroize::Zeroizing<String>> {
        let document = self.to_pkcs8_der()?;
        Ok(zeroize::Zeroizing::new(pem_utils::der_to_pem(
            document.as_bytes(),
            "PRIVATE KEY",
        )))
    }

    /// Imports a private key from PKCS#8 DER.
    ///
    /// The key type is picked from the algorithm identifier, and for EC keys
    /// from the named curve parameter.
    pub fn from_pkcs8_der(der: &[u8]) -> Result<Self> {
        let info = PrivateKeyInfo::try_from(der)?;
        let algorithm = info.algorithm.oid;

        if algorithm == oid::ID_RSA_ENCRYPTION {
            return Ok(KeyPair::Rsa(Box::new(RsaPrivateKey::from_pkcs8_der(der)?)));
        }
        if algorithm == oid::ID_DSA {
            return Ok(KeyPair::Dsa(Box::new(dsa::SigningKey::from_pkcs8_der(der)?)));
        }
        if algorithm == oid::ID_EC_PUBLIC_KEY {
            let curve = info.algorithm.parameters_oid()?;
            return match curve {
                oid::SECP224R1 => Ok(KeyPair::EcdsaP224(
                    p224::ecdsa::SigningKey::from_pkcs8_der(der)?,
                )),
                oid::SECP256R1 => Ok(KeyPair::EcdsaP256(
                    p256::ecdsa::SigningKey::from_pkcs8_der(der)?,
                )),
                oid::SECP384R1 => Ok(KeyPair::EcdsaP384(
                    p384::ecdsa::SigningKey::from_pkcs8_der(der)?,
                )),
                oid::SECP521R1 => Ok(KeyPair::EcdsaP521(
                    ecdsa::SigningKey::<NistP521>::from_pkcs8_der(der)?,
                )),
                other => Err(CertSmithError::NotSupported(format!(
                    "unsupported named curve {other}"
                ))),
            };
        }

        Err(CertSmithError::NotSupported(format!(
            "unsupported private key algorithm {algorithm}"
        )))
    }

    /// Imports a private key from a PKCS#8 PEM string.
    pub fn from_pkcs8_pem(pem: &str) -> Result<Self> {
        let der = zeroize::Zeroizing::new(pem_utils::pem_to_der(pem)?);
        Self::from_pkcs8_der(&der)
    }
}

/// A public key taken from a key pair or a certificate.
#[derive(Debug, Clone, PartialEq)]
pub enum PublicKey {
    Rsa(RsaPublicKey),
    EcdsaP224(p224::ecdsa::VerifyingKey),
    EcdsaP256(p256::ecdsa::VerifyingKey),
    EcdsaP384(p384::ecdsa::VerifyingKey),
    EcdsaP521(ecdsa::VerifyingKey<NistP521>),
    Dsa(dsa::VerifyingKey),
}

impl PublicKey {
    /// Reads a public key out of a SubjectPublicKeyInfo.
    pub fn from_spki(spki: &SubjectPublicKeyInfoOwned) -> Result<Self> {
        let der = spki.to_der()?;
        let algorithm = spki.algorithm.oid;

        if algorithm == oid::ID_RSA_ENCRYPTION {
            return Ok(PublicKey::Rsa(RsaPublicKey::from_public_key_der(&der)?));
        }
        if algorithm == oid::ID_DSA {
            return Ok(PublicKey::Dsa(dsa::VerifyingKey::from_public_key_der(&der)?));
        }
        if algorithm == oid::ID_EC_PUBLIC_KEY {
            let curve = spki
                .algorithm
                .parameters
                .as_ref()
                .ok_or_else(|| {
                    CertSmithError::DecodingError("EC public key without a named curve".into())
                })?
                .decode_as::<ObjectIdentifier>()?;
            return match curve {
                oid::SECP224R1 => Ok(PublicKey::EcdsaP224(
                    p224::ecdsa::VerifyingKey::from_public_key_der(&der)?,
                )),
                oid::SECP256R1 => Ok(PublicKey::EcdsaP256(
                    p256::ecdsa::VerifyingKey::from_public_key_der(&der)?,
                )),
                oid::SECP384R1 => Ok(PublicKey::EcdsaP384(
                    p384::ecdsa::VerifyingKey::from_public_key_der(&der)?,
                )),
                oid::SECP521R1 => Ok(PublicKey::EcdsaP521(
                    ecdsa::VerifyingKey::<NistP521>::from_public_key_der(&der)?,
                )),
                other => Err(CertSmithError::NotSupported(format!(
                    "unsupported named curve {other}"
                ))),
            };
        }

        Err(CertSmithError::NotSupported(format!(
            "unsupported public key algorithm {algorithm}"
        )))
    }

    pub fn algorithm(&self) -> KeyAlgorithm {
        match self {
            PublicKey::Rsa(_) => KeyAlgorithm::Rsa,
            PublicKey::EcdsaP224(_)
            | PublicKey::EcdsaP256(_)
            | PublicKey::EcdsaP384(_)
            | PublicKey::EcdsaP521(_) => KeyAlgorithm::Ecdsa,
            PublicKey::Dsa(_) => KeyAlgorithm::Dsa,
        }
    }

    /// Size in bytes of the curve's field elements, for ECDSA keys.
    pub fn ecdsa_field_len(&self) -> Option<usize> {
        match self {
            PublicKey::EcdsaP224(_) => Some(28),
            PublicKey::EcdsaP256(_) => Some(32),
            PublicKey::EcdsaP384(_) => Some(48),
            PublicKey::EcdsaP521(_) => Some(66),
            _ => None,
        }
    }

    /// Encodes this key as a SubjectPublicKeyInfo.
    ///
    /// DSA keys are written by hand as `Dss-Parms { p, q, g }` plus
    /// `INTEGER y`; the other key types use their PKCS#8 encoders.
    pub fn to_spki(&self) -> Result<SubjectPublicKeyInfoOwned> {
        let spki = match self {
            PublicKey::Rsa(key) => SubjectPublicKeyInfoOwned::from_key(key.clone())?,
            PublicKey::EcdsaP224(key) => SubjectPublicKeyInfoOwned::from_key(*key)?,
            PublicKey::EcdsaP256(key) => SubjectPublicKeyInfoOwned::from_key(*key)?,
            PublicKey::EcdsaP384(key) => SubjectPublicKeyInfoOwned::from_key(*key)?,
            PublicKey::EcdsaP521(key) => SubjectPublicKeyInfoOwned::from_key(*key)?,
            PublicKey::Dsa(key) => {
                SubjectPublicKeyInfoOwned::from_der(&encode_dsa_public_key_info(key))?
            }
        };
        Ok(spki)
    }

    /// Verifies `signature` over `message`.
    ///
    /// `signature` is in its X.509 form: raw for RSA and DER
    /// `SEQUENCE { r, s }` for ECDSA and DSA. `padding` only applies to RSA.
    pub fn verify(
        &self,
        hash: HashAlgorithm,
        padding: RsaPadding,
        message: &[u8],
        signature: &[u8],
    ) -> Result<()> {
        self.verify_signature(hash, padding, message, signature)
            .map_err(|e| CertSmithError::VerificationFailed(e.to_string()))
    }

    fn verify_signature(
        &self,
        hash: HashAlgorithm,
        padding: RsaPadding,
        message: &[u8],
        signature: &[u8],
    ) -> std::result::Result<(), ecdsa::signature::Error> {
        match self {
            PublicKey::Rsa(key) => verify_rsa(key, hash, padding, message, signature),
            PublicKey::EcdsaP224(key) => {
                let signature = p224::ecdsa::Signature::from_der(signature)?;
                key.verify_prehash(&hash.ecdsa_prehash(message, 28), &signature)
            }
            PublicKey::EcdsaP256(key) => {
                let signature = p256::ecdsa::Signature::from_der(signature)?;
                key.verify_prehash(&hash.ecdsa_prehash(message, 32), &signature)
            }
            PublicKey::EcdsaP384(key) => {
                let signature = p384::ecdsa::Signature::from_der(signature)?;
                key.verify_prehash(&hash.ecdsa_prehash(message, 48), &signature)
            }
            PublicKey::EcdsaP521(key) => {
                let signature = ecdsa::Signature::<NistP521>::from_der(signature)?;
                key.verify_prehash(&hash.ecdsa_prehash(message, 66), &signature)
            }
            PublicKey::Dsa(key) => verify_dsa(key, hash, message, signature),
        }
    }
}

fn verify_rsa(
    key: &RsaPublicKey,
    hash: HashAlgorithm,
    padding: RsaPadding,
    message: &[u8],
    signature: &[u8],
) -> std::result::Result<(), ecdsa::signature::Error> {
    match padding {
        RsaPadding::Pkcs1 => {
            let signature = rsa::pkcs1v15::Signature::try_from(signature)?;
            match hash {
                HashAlgorithm::Sha1 => rsa::pkcs1v15::VerifyingKey::<Sha1>::new(key.clone())
                    .verify(message, &signature),
                HashAlgorithm::Sha256 => rsa::pkcs1v15::VerifyingKey::<Sha256>::new(key.clone())
                    .verify(message, &signature),
                HashAlgorithm::Sha384 => rsa::pkcs1v15::VerifyingKey::<Sha384>::new(key.clone())
                    .verify(message, &signature),
                HashAlgorithm::Sha512 => rsa::pkcs1v15::VerifyingKey::<Sha512>::new(key.clone())
                    .verify(message, &signature),
            }
        }
        RsaPadding::Pss => {
            let signature = rsa::pss::Signature::try_from(signature)?;
            match hash {
                HashAlgorithm::Sha1 => {
                    rsa::pss::VerifyingKey::<Sha1>::new(key.clone()).verify(message, &signature)
                }
                HashAlgorithm::Sha256 => {
                    rsa::pss::VerifyingKey::<Sha256>::new(key.clone()).verify(message, &signature)
                }
                HashAlgorithm::Sha384 => {
                    rsa::pss::VerifyingKey::<Sha384>::new(key.clone()).verify(message, &signature)
                }
                HashAlgorithm::Sha512 => {
                    rsa::pss::VerifyingKey::<Sha512>::new(key.clone()).verify(message, &signature)
                }
            }
        }
    }
}

fn verify_dsa(
    key: &dsa::VerifyingKey,
    hash: HashAlgorithm,
    message: &[u8],
    signature: &[u8],
) -> std::result::Result<(), ecdsa::signature::Error> {
    let signature = dsa::Signature::try_from(signature)?;
    match hash {
        HashAlgorithm::Sha1 => key.verify_digest(Sha1::new_with_prefix(message), &signature),
        HashAlgorithm::Sha256 => key.verify_digest(Sha256::new_with_prefix(message), &signature),
        HashAlgorithm::Sha384 => key.verify_digest(Sha384::new_with_prefix(message), &signature),
        HashAlgorithm::Sha512 => key.verify_digest(Sha512::new_with_prefix(message), &signature),
    }
}

/// `SEQUENCE { SEQUENCE { id-dsa, Dss-Parms }, BIT STRING { INTEGER y } }`
fn encode_dsa_public_key_info(key: &dsa::VerifyingKey) -> Vec<u8> {
    let components = key.components();
    let p = asn1::encode_unsigned_integer(&components.p().to_bytes_be());
    let q = asn1::encode_unsigned_integer(&components.q().to_bytes_be());
    let g = asn1::encode_unsigned_integer(&components.g().to_bytes_be());
    let parameters = asn1::encode_sequence(&[&p, &q, &g]);

    // 06 07 2A 86 48 CE 38 04 01
    let algorithm_oid = asn1::encode_tlv(0x06, oid::ID_DSA.as_bytes());
    let algorithm = asn1::encode_sequence(&[&algorithm_oid, &parameters]);

    let y = asn1::encode_unsigned_integer(&key.y().to_bytes_be());
    let mut bits = Vec::with_capacity(y.len() + 1);
    bits.push(0x00);
    bits.extend_from_slice(&y);
    let subject_public_key = asn1::encode_tlv(asn1::TAG_BIT_STRING, &bits);

    asn1::encode_sequence(&[&algorithm, &subject_public_key])
}

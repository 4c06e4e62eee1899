pub mod extensions;
pub mod name;
pub mod san;

use const_oid::ObjectIdentifier;
use der::{Decode, Encode, EncodePem};
use time::OffsetDateTime;
use x509_cert::certificate::CertificateInner;
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::error::{CertSmithError, Result};
use crate::key::{KeyPair, PublicKey};
use crate::lifetime::{self, CertificateLifetime};
use crate::{asn1, oid, pem_utils, pkcs12, signature};
use extensions::{BasicConstraints, ExtendedKeyUsage, ExtensionParam, SubjectAltName};
use name::DistinguishedName;
use san::SubjectAlternativeName;

/// Represents an X.509 certificate.
///
/// This struct provides methods to encode the certificate into DER or PEM
/// formats and to read back the fields the builder writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    /// The inner representation of the certificate.
    pub inner: CertificateInner,
}

impl Certificate {
    /// Encodes the certificate into DER format.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        self.inner
            .to_der()
            .map_err(|e| CertSmithError::EncodingError(e.to_string()))
    }

    /// Encodes the certificate into PEM format.
    pub fn to_pem(&self) -> Result<String> {
        self.inner
            .to_pem(pkcs8::LineEnding::LF)
            .map_err(|e| CertSmithError::EncodingError(e.to_string()))
    }

    pub fn from_der(der: &[u8]) -> Result<Self> {
        let inner = CertificateInner::from_der(der)
            .map_err(|e| CertSmithError::DecodingError(e.to_string()))?;
        Ok(Self { inner })
    }

    /// Parses a PEM `CERTIFICATE` block.
    pub fn from_pem(pem: &str) -> Result<Self> {
        Self::from_der(&pem_utils::pem_to_der_labelled(pem, "CERTIFICATE")?)
    }

    /// The subject as an X.509 `Name`.
    pub fn subject_name(&self) -> &x509_cert::name::Name {
        &self.inner.tbs_certificate.subject
    }

    pub fn issuer_name(&self) -> &x509_cert::name::Name {
        &self.inner.tbs_certificate.issuer
    }

    pub fn subject(&self) -> Result<DistinguishedName> {
        DistinguishedName::from_x509_name(self.subject_name())
    }

    pub fn issuer(&self) -> Result<DistinguishedName> {
        DistinguishedName::from_x509_name(self.issuer_name())
    }

    /// Big-endian magnitude of the serial number.
    pub fn serial_number(&self) -> Vec<u8> {
        asn1::trim_leading_zeros(self.inner.tbs_certificate.serial_number.as_bytes()).to_vec()
    }

    pub fn not_before(&self) -> OffsetDateTime {
        lifetime::decode_time(&self.inner.tbs_certificate.validity.not_before)
    }

    pub fn not_after(&self) -> OffsetDateTime {
        lifetime::decode_time(&self.inner.tbs_certificate.validity.not_after)
    }

    pub fn lifetime(&self) -> Result<CertificateLifetime> {
        CertificateLifetime::from_validity(&self.inner.tbs_certificate.validity)
    }

    /// All extensions, in certificate order.
    pub fn extensions(&self) -> Vec<ExtensionParam> {
        self.inner
            .tbs_certificate
            .extensions
            .iter()
            .flatten()
            .map(ExtensionParam::from_x509_extension)
            .collect()
    }

    /// The extension with the given OID, if present.
    pub fn extension(&self, oid: ObjectIdentifier) -> Option<ExtensionParam> {
        self.inner
            .tbs_certificate
            .extensions
            .iter()
            .flatten()
            .find(|ext| ext.extn_id == oid)
            .map(ExtensionParam::from_x509_extension)
    }

    /// The key id carried by the Subject Key Identifier extension.
    pub fn subject_key_identifier(&self) -> Result<Option<Vec<u8>>> {
        self.extension(oid::ID_CE_SUBJECT_KEY_IDENTIFIER)
            .map(|ext| {
                let key_id = der::asn1::OctetString::from_der(&ext.value)?;
                Ok(key_id.as_bytes().to_vec())
            })
            .transpose()
    }

    pub fn basic_constraints(&self) -> Result<Option<BasicConstraints>> {
        self.extension(oid::ID_CE_BASIC_CONSTRAINTS)
            .map(|ext| BasicConstraints::decode(&ext.value, ext.critical))
            .transpose()
    }

    pub fn subject_alternative_name(&self) -> Result<Option<SubjectAlternativeName>> {
        self.extension(oid::ID_CE_SUBJECT_ALT_NAME)
            .map(|ext| SubjectAltName::decode(&ext.value))
            .transpose()
    }

    pub fn extended_key_usage(&self) -> Result<Option<ExtendedKeyUsage>> {
        self.extension(oid::ID_CE_EXT_KEY_USAGE)
            .map(|ext| ExtendedKeyUsage::decode(&ext.value, ext.critical))
            .transpose()
    }

    pub fn public_key_info(&self) -> &SubjectPublicKeyInfoOwned {
        &self.inner.tbs_certificate.subject_public_key_info
    }

    pub fn public_key(&self) -> Result<PublicKey> {
        PublicKey::from_spki(self.public_key_info())
    }

    /// Whether issuer and subject names are identical.
    pub fn is_self_issued(&self) -> bool {
        self.subject_name() == self.issuer_name()
    }

    /// Checks the certificate signature against `public_key`.
    ///
    /// Fails with `VerificationFailed` when the signature does not match.
    /// The validity window is not checked.
    pub fn verify_signature(&self, public_key: &PublicKey) -> Result<()> {
        if self.inner.signature_algorithm != self.inner.tbs_certificate.signature {
            return Err(CertSmithError::VerificationFailed(
                "outer and inner signature algorithms differ".to_string(),
            ));
        }
        let (hash, padding) = signature::hash_and_padding(&self.inner.signature_algorithm)?;
        let tbs = self.inner.tbs_certificate.to_der()?;
        public_key.verify(hash, padding, &tbs, self.inner.signature.raw_bytes())
    }
}

/// A certificate together with the private key for its public key.
#[derive(Debug, Clone)]
pub struct CertificateWithPrivateKey {
    pub cert: Certificate,
    pub key: KeyPair,
}

impl CertificateWithPrivateKey {
    /// Exports certificate and key as a PKCS#12 blob protected by `password`.
    pub fn to_pkcs12(&self, password: &str) -> Result<Vec<u8>> {
        pkcs12::seal(&self.cert, &self.key, password)
    }

    pub fn from_pkcs12(blob: &[u8], password: &str) -> Result<Self> {
        pkcs12::open(blob, password)
    }

    /// Exports certificate and key together with the certificates of its
    /// issuers, nearest first. Issuer keys are never written.
    pub fn to_pkcs12_with_chain(&self, password: &str, chain: &[Certificate]) -> Result<Vec<u8>> {
        pkcs12::seal_with_chain(&self.cert, &self.key, chain, password)
    }

    /// Reads a blob written by [`Self::to_pkcs12_with_chain`], returning the
    /// issuer certificates alongside.
    pub fn from_pkcs12_with_chain(blob: &[u8], password: &str) -> Result<(Self, Vec<Certificate>)> {
        pkcs12::open_with_chain(blob, password)
    }

    /// PEM encoding of the private key, as PKCS#8.
    pub fn key_pem(&self) -> Result<zeroize::Zeroizing<String>> {
        self.key.to_pkcs8_pem()
    }
}

/// A certificate used to sign other certificates.
///
/// The private key is optional so that a certificate loaded without its
/// key can be passed around; issuing from it fails with `InvalidState`.
#[derive(Debug, Clone)]
pub struct IssuerCertificate {
    pub cert: Certificate,
    pub key: Option<KeyPair>,
}

impl IssuerCertificate {
    pub fn new(cert: Certificate, key: KeyPair) -> Self {
        Self {
            cert,
            key: Some(key),
        }
    }

    /// An issuer whose private key is not available.
    pub fn without_key(cert: Certificate) -> Self {
        Self { cert, key: None }
    }
}

impl From<CertificateWithPrivateKey> for IssuerCertificate {
    fn from(value: CertificateWithPrivateKey) -> Self {
        Self::new(value.cert, value.key)
    }
}

impl From<Certificate> for IssuerCertificate {
    fn from(value: Certificate) -> Self {
        Self::without_key(value)
    }
}

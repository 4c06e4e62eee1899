use x509_cert::Version;
use x509_cert::certificate::TbsCertificateInner;
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;
use x509_cert::spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};

use crate::asn1;
use crate::cert::extensions::ExtensionParam;
use crate::error::{CertSmithError, Result};
use crate::lifetime::CertificateLifetime;

/// Longest serial number RFC 5280 allows, in octets.
pub const MAX_SERIAL_LEN: usize = 20;

/// Represents the "To Be Signed" (TBS) portion of an X.509 certificate.
///
/// # Fields
/// * `serial_number` - Big-endian magnitude of the serial number.
/// * `issuer` - The issuer name, as it appears in the issuer's subject.
/// * `lifetime` - The validity window.
/// * `subject` - The subject name.
/// * `subject_public_key_info` - The subject's public key.
/// * `extensions` - Encoded extensions, in the order they are emitted.
#[derive(Debug, Clone)]
pub struct TbsCertificate {
    pub serial_number: Vec<u8>,
    pub issuer: Name,
    pub lifetime: CertificateLifetime,
    pub subject: Name,
    pub subject_public_key_info: SubjectPublicKeyInfoOwned,
    pub extensions: Vec<ExtensionParam>,
}

impl TbsCertificate {
    /// Converts into a `TbsCertificateInner` signed under `signature`.
    ///
    /// The serial number goes through the shared unsigned INTEGER encoding,
    /// so a magnitude with its high bit set keeps a positive sign.
    pub fn to_tbs_certificate_inner(
        &self,
        signature: AlgorithmIdentifierOwned,
    ) -> Result<TbsCertificateInner> {
        let magnitude = asn1::trim_leading_zeros(&self.serial_number);
        if magnitude.len() > MAX_SERIAL_LEN {
            return Err(CertSmithError::InvalidArgument(format!(
                "serial number is {} octets, at most {MAX_SERIAL_LEN} are allowed",
                magnitude.len()
            )));
        }
        let serial_number = SerialNumber::new(&asn1::unsigned_integer_contents(magnitude))?;

        let extensions = self
            .extensions
            .iter()
            .map(ExtensionParam::to_x509_extension)
            .collect::<Result<Vec<_>>>()?;

        Ok(TbsCertificateInner {
            version: Version::V3,
            serial_number,
            signature,
            issuer: self.issuer.clone(),
            validity: self.lifetime.to_validity()?,
            subject: self.subject.clone(),
            subject_public_key_info: self.subject_public_key_info.clone(),
            issuer_unique_id: None,
            subject_unique_id: None,
            extensions: (!extensions.is_empty()).then_some(extensions),
        })
    }

    /// Creates a `TbsCertificate` from a `TbsCertificateInner`.
    pub fn from_tbs_certificate_inner(inner: &TbsCertificateInner) -> Result<Self> {
        let extensions = inner
            .extensions
            .iter()
            .flatten()
            .map(ExtensionParam::from_x509_extension)
            .collect();

        Ok(Self {
            serial_number: asn1::trim_leading_zeros(inner.serial_number.as_bytes()).to_vec(),
            issuer: inner.issuer.clone(),
            lifetime: CertificateLifetime::from_validity(&inner.validity)?,
            subject: inner.subject.clone(),
            subject_public_key_info: inner.subject_public_key_info.clone(),
            extensions,
        })
    }
}

use std::fmt;
use std::str::FromStr;

use bon::Builder;
use const_oid::ObjectIdentifier;
use der::asn1::OctetString;
use der::{Decode, Encode};
use sha1::{Digest, Sha1};
use x509_cert::ext::Extension;
use x509_cert::spki::SubjectPublicKeyInfoOwned;

pub use der::flagset::FlagSet;
pub use x509_cert::ext::pkix::KeyUsages;

use super::san::SubjectAlternativeName;
use crate::asn1;
use crate::error::{CertSmithError, Result};
use crate::oid;

/// An X.509 v3 extension that knows its identifier, criticality and DER
/// value.
///
/// # Example
/// ```
/// use certsmith::cert::extensions::{BasicConstraints, X509Extension};
/// let bc = BasicConstraints::builder().is_ca(true).build();
/// assert_eq!(bc.encode().unwrap(), vec![0x30, 0x03, 0x01, 0x01, 0xFF]);
/// ```
pub trait X509Extension {
    /// The Object Identifier (OID) for the extension.
    fn oid(&self) -> ObjectIdentifier;

    fn is_critical(&self) -> bool;

    /// Encodes the extension value (the contents of `extnValue`).
    fn encode(&self) -> Result<Vec<u8>>;

    /// Encodes the whole extension into an [`ExtensionParam`].
    fn to_extension_param(&self) -> Result<ExtensionParam> {
        Ok(ExtensionParam {
            oid: self.oid(),
            critical: self.is_critical(),
            value: self.encode()?,
        })
    }
}

/// Represents an encoded X.509 extension.
///
/// # Fields
/// * `oid` - The object identifier of the extension.
/// * `critical` - Indicates if the extension is critical.
/// * `value` - The DER-encoded value of the extension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtensionParam {
    pub oid: ObjectIdentifier,
    pub critical: bool,
    /// DER-encoded extension value
    pub value: Vec<u8>,
}

impl ExtensionParam {
    pub fn new(oid: ObjectIdentifier, critical: bool, value: Vec<u8>) -> Self {
        Self {
            oid,
            critical,
            value,
        }
    }

    pub fn to_x509_extension(&self) -> Result<Extension> {
        Ok(Extension {
            extn_id: self.oid,
            critical: self.critical,
            extn_value: OctetString::new(self.value.clone())?,
        })
    }

    pub fn from_x509_extension(extension: &Extension) -> Self {
        Self {
            oid: extension.extn_id,
            critical: extension.critical,
            value: extension.extn_value.as_bytes().to_vec(),
        }
    }
}

/// Represents the Basic Constraints extension.
///
/// # Fields
/// * `is_ca` - Indicates if the certificate is a CA.
/// * `has_path_length` - Whether `path_length` is encoded. Only honoured
///   for CA certificates.
/// * `path_length` - The maximum number of intermediate CAs allowed.
/// * `critical` - Criticality of the extension.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Builder)]
pub struct BasicConstraints {
    #[builder(default)]
    pub is_ca: bool,
    #[builder(default)]
    pub has_path_length: bool,
    #[builder(default)]
    pub path_length: u8,
    #[builder(default)]
    pub critical: bool,
}

impl BasicConstraints {
    /// A CA without a path length constraint.
    pub fn ca() -> Self {
        Self {
            is_ca: true,
            ..Self::default()
        }
    }

    /// A CA allowing at most `path_length` intermediates below it.
    pub fn ca_with_path_length(path_length: u8) -> Self {
        Self {
            is_ca: true,
            has_path_length: true,
            path_length,
            ..Self::default()
        }
    }

    /// An end-entity certificate.
    pub fn end_entity() -> Self {
        Self::default()
    }

    /// Decodes an extension value.
    pub fn decode(value: &[u8], critical: bool) -> Result<Self> {
        let bc = x509_cert::ext::pkix::BasicConstraints::from_der(value)?;
        Ok(Self {
            is_ca: bc.ca,
            has_path_length: bc.path_len_constraint.is_some(),
            path_length: bc.path_len_constraint.unwrap_or_default(),
            critical,
        })
    }
}

impl X509Extension for BasicConstraints {
    fn oid(&self) -> ObjectIdentifier {
        oid::ID_CE_BASIC_CONSTRAINTS
    }

    fn is_critical(&self) -> bool {
        self.critical
    }

    /// `SEQUENCE { cA BOOLEAN DEFAULT FALSE, pathLenConstraint INTEGER OPTIONAL }`
    ///
    /// A non-CA encodes as an empty SEQUENCE.
    fn encode(&self) -> Result<Vec<u8>> {
        let mut contents = Vec::new();
        if self.is_ca {
            contents.extend_from_slice(&asn1::encode_tlv(asn1::TAG_BOOLEAN, &[0xFF]));
            if self.has_path_length {
                contents.extend_from_slice(&asn1::encode_unsigned_integer(&[self.path_length]));
            }
        }
        Ok(asn1::encode_tlv(asn1::TAG_SEQUENCE, &contents))
    }
}

/// How key usage flags are mapped onto the encoded bit string.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum KeyUsageMapping {
    /// Routes `DigitalSignature` to the keyEncipherment bit, matching the
    /// output existing consumers were built against.
    #[default]
    Compatible,
    /// Every flag maps to its own RFC 5280 bit.
    Rfc5280,
}

/// Represents the Key Usage extension. Always critical.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyUsage {
    pub usages: FlagSet<KeyUsages>,
    pub mapping: KeyUsageMapping,
}

impl KeyUsage {
    pub fn new(usages: impl Into<FlagSet<KeyUsages>>) -> Self {
        Self {
            usages: usages.into(),
            mapping: KeyUsageMapping::default(),
        }
    }

    pub fn with_mapping(mut self, mapping: KeyUsageMapping) -> Self {
        self.mapping = mapping;
        self
    }

    /// The flags that end up in the encoded bit string.
    pub fn encoded_usages(&self) -> FlagSet<KeyUsages> {
        match self.mapping {
            KeyUsageMapping::Rfc5280 => self.usages,
            KeyUsageMapping::Compatible => {
                if self.usages.contains(KeyUsages::DigitalSignature) {
                    (self.usages - KeyUsages::DigitalSignature) | KeyUsages::KeyEncipherment
                } else {
                    self.usages
                }
            }
        }
    }
}

impl X509Extension for KeyUsage {
    fn oid(&self) -> ObjectIdentifier {
        oid::ID_CE_KEY_USAGE
    }

    fn is_critical(&self) -> bool {
        true
    }

    fn encode(&self) -> Result<Vec<u8>> {
        Ok(x509_cert::ext::pkix::KeyUsage(self.encoded_usages()).to_der()?)
    }
}

/// A key purpose for the Extended Key Usage extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyPurpose {
    ClientAuthentication,
    ServerAuthentication,
    CodeSigning,
    TimeStamping,
    SecureEmail,
    IpSecurityTunnelTermination,
    IpSecurityUser,
    IpSecurityEndSystem,
    OcspSigning,
    SmartCardLogon,
    MacAddress,
    /// Any other purpose, passed through verbatim.
    Other(ObjectIdentifier),
}

impl KeyPurpose {
    pub fn oid(&self) -> ObjectIdentifier {
        match self {
            KeyPurpose::ClientAuthentication => oid::ID_KP_CLIENT_AUTH,
            KeyPurpose::ServerAuthentication => oid::ID_KP_SERVER_AUTH,
            KeyPurpose::CodeSigning => oid::ID_KP_CODE_SIGNING,
            KeyPurpose::TimeStamping => oid::ID_KP_TIME_STAMPING,
            KeyPurpose::SecureEmail => oid::ID_KP_EMAIL_PROTECTION,
            KeyPurpose::IpSecurityTunnelTermination => oid::ID_KP_IPSEC_TUNNEL,
            KeyPurpose::IpSecurityUser => oid::ID_KP_IPSEC_USER,
            KeyPurpose::IpSecurityEndSystem => oid::ID_KP_IPSEC_END_SYSTEM,
            KeyPurpose::OcspSigning => oid::ID_KP_OCSP_SIGNING,
            KeyPurpose::SmartCardLogon => oid::ID_KP_SMART_CARD_LOGON,
            KeyPurpose::MacAddress => oid::ID_KP_MAC_ADDRESS,
            KeyPurpose::Other(oid) => *oid,
        }
    }
}

impl From<ObjectIdentifier> for KeyPurpose {
    fn from(value: ObjectIdentifier) -> Self {
        match value {
            oid::ID_KP_CLIENT_AUTH => KeyPurpose::ClientAuthentication,
            oid::ID_KP_SERVER_AUTH => KeyPurpose::ServerAuthentication,
            oid::ID_KP_CODE_SIGNING => KeyPurpose::CodeSigning,
            oid::ID_KP_TIME_STAMPING => KeyPurpose::TimeStamping,
            oid::ID_KP_EMAIL_PROTECTION => KeyPurpose::SecureEmail,
            oid::ID_KP_IPSEC_TUNNEL => KeyPurpose::IpSecurityTunnelTermination,
            oid::ID_KP_IPSEC_USER => KeyPurpose::IpSecurityUser,
            oid::ID_KP_IPSEC_END_SYSTEM => KeyPurpose::IpSecurityEndSystem,
            oid::ID_KP_OCSP_SIGNING => KeyPurpose::OcspSigning,
            oid::ID_KP_SMART_CARD_LOGON => KeyPurpose::SmartCardLogon,
            oid::ID_KP_MAC_ADDRESS => KeyPurpose::MacAddress,
            other => KeyPurpose::Other(other),
        }
    }
}

impl From<KeyPurpose> for ObjectIdentifier {
    fn from(value: KeyPurpose) -> Self {
        value.oid()
    }
}

impl FromStr for KeyPurpose {
    type Err = CertSmithError;

    /// Accepts a symbolic name from the OID table (`"ServerAuthentication"`)
    /// or a dotted-decimal OID.
    fn from_str(s: &str) -> Result<Self> {
        let dotted = oid::from_name(s).unwrap_or(s);
        let parsed = ObjectIdentifier::new(dotted)
            .map_err(|e| CertSmithError::InvalidArgument(format!("key purpose {s:?}: {e}")))?;
        Ok(KeyPurpose::from(parsed))
    }
}

impl fmt::Display for KeyPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.oid())
    }
}

/// Represents the Extended Key Usage extension.
///
/// Duplicate purposes collapse to their first occurrence.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtendedKeyUsage {
    pub purposes: Vec<KeyPurpose>,
    pub critical: bool,
}

impl ExtendedKeyUsage {
    pub fn new(purposes: Vec<KeyPurpose>) -> Self {
        Self {
            purposes,
            critical: false,
        }
    }

    /// Purpose OIDs in first-seen order, without duplicates.
    pub fn oids(&self) -> Vec<ObjectIdentifier> {
        let mut oids: Vec<ObjectIdentifier> = Vec::with_capacity(self.purposes.len());
        for purpose in &self.purposes {
            let oid = purpose.oid();
            if !oids.contains(&oid) {
                oids.push(oid);
            }
        }
        oids
    }

    pub fn decode(value: &[u8], critical: bool) -> Result<Self> {
        let eku = x509_cert::ext::pkix::ExtendedKeyUsage::from_der(value)?;
        Ok(Self {
            purposes: eku.0.into_iter().map(KeyPurpose::from).collect(),
            critical,
        })
    }
}

impl X509Extension for ExtendedKeyUsage {
    fn oid(&self) -> ObjectIdentifier {
        oid::ID_CE_EXT_KEY_USAGE
    }

    fn is_critical(&self) -> bool {
        self.critical
    }

    fn encode(&self) -> Result<Vec<u8>> {
        if self.purposes.is_empty() {
            return Err(CertSmithError::InvalidArgument(
                "extended key usage has no purposes".to_string(),
            ));
        }
        Ok(x509_cert::ext::pkix::ExtendedKeyUsage(self.oids()).to_der()?)
    }
}

/// Represents the Subject Alternative Name extension. Always critical.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubjectAltName(pub SubjectAlternativeName);

impl SubjectAltName {
    pub fn decode(value: &[u8]) -> Result<SubjectAlternativeName> {
        let san = x509_cert::ext::pkix::SubjectAltName::from_der(value)?;
        SubjectAlternativeName::from_general_names(&san.0)
    }
}

impl X509Extension for SubjectAltName {
    fn oid(&self) -> ObjectIdentifier {
        oid::ID_CE_SUBJECT_ALT_NAME
    }

    fn is_critical(&self) -> bool {
        true
    }

    fn encode(&self) -> Result<Vec<u8>> {
        let names = self.0.to_general_names()?;
        Ok(x509_cert::ext::pkix::SubjectAltName(names).to_der()?)
    }
}

/// SHA-1 over the subjectPublicKey bits, as in RFC 5280 §4.2.1.2 method 1.
pub fn key_identifier(public_key_info: &SubjectPublicKeyInfoOwned) -> Vec<u8> {
    Sha1::digest(public_key_info.subject_public_key.raw_bytes()).to_vec()
}

/// Represents the Subject Key Identifier extension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubjectKeyIdentifier {
    pub key_identifier: Vec<u8>,
}

impl SubjectKeyIdentifier {
    pub fn from_public_key(public_key_info: &SubjectPublicKeyInfoOwned) -> Self {
        Self {
            key_identifier: key_identifier(public_key_info),
        }
    }
}

impl X509Extension for SubjectKeyIdentifier {
    fn oid(&self) -> ObjectIdentifier {
        oid::ID_CE_SUBJECT_KEY_IDENTIFIER
    }

    fn is_critical(&self) -> bool {
        false
    }

    fn encode(&self) -> Result<Vec<u8>> {
        let key_identifier = OctetString::new(self.key_identifier.clone())?;
        Ok(x509_cert::ext::pkix::SubjectKeyIdentifier(key_identifier).to_der()?)
    }
}

/// Represents the Authority Key Identifier extension, carrying only the
/// `keyIdentifier` field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthorityKeyIdentifier {
    pub key_identifier: Vec<u8>,
}

impl AuthorityKeyIdentifier {
    /// Takes the key id out of an issuer's raw Subject Key Identifier
    /// extension value (`04 len <key id>`).
    ///
    /// The two header bytes are stripped; anything that is not a short-form
    /// OCTET STRING with a matching length fails with `InvalidArgument`.
    pub fn from_issuer_subject_key_identifier(raw: &[u8]) -> Result<Self> {
        match raw {
            [asn1::TAG_OCTET_STRING, length, key_id @ ..]
                if *length < 0x80 && usize::from(*length) == key_id.len() && !key_id.is_empty() =>
            {
                Ok(Self {
                    key_identifier: key_id.to_vec(),
                })
            }
            _ => Err(CertSmithError::InvalidArgument(format!(
                "issuer subject key identifier is malformed ({} bytes)",
                raw.len()
            ))),
        }
    }

    pub fn from_public_key(public_key_info: &SubjectPublicKeyInfoOwned) -> Self {
        Self {
            key_identifier: key_identifier(public_key_info),
        }
    }

    pub fn decode(value: &[u8]) -> Result<Self> {
        let aki = x509_cert::ext::pkix::AuthorityKeyIdentifier::from_der(value)?;
        let key_identifier = aki.key_identifier.ok_or_else(|| {
            CertSmithError::DecodingError("authority key identifier without a key id".into())
        })?;
        Ok(Self {
            key_identifier: key_identifier.as_bytes().to_vec(),
        })
    }
}

impl X509Extension for AuthorityKeyIdentifier {
    fn oid(&self) -> ObjectIdentifier {
        oid::ID_CE_AUTHORITY_KEY_IDENTIFIER
    }

    fn is_critical(&self) -> bool {
        false
    }

    /// `SEQUENCE { [0] IMPLICIT keyIdentifier }`, i.e. `30 16 80 14 ...` for
    /// a 20-byte id.
    fn encode(&self) -> Result<Vec<u8>> {
        let aki = x509_cert::ext::pkix::AuthorityKeyIdentifier {
            key_identifier: Some(OctetString::new(self.key_identifier.clone())?),
            authority_cert_issuer: None,
            authority_cert_serial_number: None,
        };
        Ok(aki.to_der()?)
    }
}

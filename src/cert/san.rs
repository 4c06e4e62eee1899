use std::net::IpAddr;

use bon::Builder;
use der::asn1::{Any, Ia5String, OctetString, Utf8StringRef};
use x509_cert::ext::pkix::name::{GeneralName, OtherName};

use crate::error::{CertSmithError, Result};
use crate::oid;

/// Alternative identities for a certificate subject.
///
/// Entries are encoded by kind in a fixed order: DNS names, email
/// addresses, URIs, IP addresses, then user principal names. Order inside
/// each kind is kept.
#[derive(Clone, Debug, Default, PartialEq, Eq, Builder)]
pub struct SubjectAlternativeName {
    #[builder(default)]
    pub dns_names: Vec<String>,
    #[builder(default)]
    pub email_addresses: Vec<String>,
    #[builder(default)]
    pub uris: Vec<String>,
    #[builder(default)]
    pub ip_addresses: Vec<IpAddr>,
    #[builder(default)]
    pub user_principal_names: Vec<String>,
}

impl SubjectAlternativeName {
    pub fn add_dns_name(&mut self, dns_name: impl Into<String>) -> &mut Self {
        self.dns_names.push(dns_name.into());
        self
    }

    pub fn add_email_address(&mut self, email: impl Into<String>) -> &mut Self {
        self.email_addresses.push(email.into());
        self
    }

    pub fn add_uri(&mut self, uri: impl Into<String>) -> &mut Self {
        self.uris.push(uri.into());
        self
    }

    pub fn add_ip_address(&mut self, ip: IpAddr) -> &mut Self {
        self.ip_addresses.push(ip);
        self
    }

    pub fn add_user_principal_name(&mut self, upn: impl Into<String>) -> &mut Self {
        self.user_principal_names.push(upn.into());
        self
    }

    pub fn len(&self) -> usize {
        self.dns_names.len()
            + self.email_addresses.len()
            + self.uris.len()
            + self.ip_addresses.len()
            + self.user_principal_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Builds the `GeneralNames` for the extension value.
    ///
    /// Fails with `InvalidArgument` when there are no entries or an entry
    /// is not valid IA5 text.
    pub fn to_general_names(&self) -> Result<Vec<GeneralName>> {
        if self.is_empty() {
            return Err(CertSmithError::InvalidArgument(
                "subject alternative name has no entries".to_string(),
            ));
        }

        let mut names = Vec::with_capacity(self.len());
        for dns_name in &self.dns_names {
            names.push(GeneralName::DnsName(ia5("DNS name", dns_name)?));
        }
        for email in &self.email_addresses {
            names.push(GeneralName::Rfc822Name(ia5("email address", email)?));
        }
        for uri in &self.uris {
            names.push(GeneralName::UniformResourceIdentifier(ia5("URI", uri)?));
        }
        for ip in &self.ip_addresses {
            let octets = match ip {
                IpAddr::V4(v4) => v4.octets().to_vec(),
                IpAddr::V6(v6) => v6.octets().to_vec(),
            };
            names.push(GeneralName::IpAddress(OctetString::new(octets)?));
        }
        for upn in &self.user_principal_names {
            let value = Utf8StringRef::new(upn).and_then(|s| Any::encode_from(&s))?;
            names.push(GeneralName::OtherName(OtherName {
                type_id: oid::ID_USER_PRINCIPAL_NAME,
                value,
            }));
        }
        Ok(names)
    }

    /// Reads entries back from `GeneralNames`, skipping kinds this type does
    /// not model.
    pub fn from_general_names(names: &[GeneralName]) -> Result<Self> {
        let mut san = SubjectAlternativeName::default();
        for name in names {
            match name {
                GeneralName::DnsName(dns_name) => {
                    san.dns_names.push(dns_name.to_string());
                }
                GeneralName::Rfc822Name(email) => {
                    san.email_addresses.push(email.to_string());
                }
                GeneralName::UniformResourceIdentifier(uri) => {
                    san.uris.push(uri.to_string());
                }
                GeneralName::IpAddress(octets) => {
                    san.ip_addresses.push(decode_ip(octets.as_bytes())?);
                }
                GeneralName::OtherName(other) if other.type_id == oid::ID_USER_PRINCIPAL_NAME => {
                    let upn = std::str::from_utf8(other.value.value())
                        .map_err(|e| CertSmithError::DecodingError(e.to_string()))?;
                    san.user_principal_names.push(upn.to_string());
                }
                _ => {}
            }
        }
        Ok(san)
    }
}

fn ia5(kind: &str, value: &str) -> Result<Ia5String> {
    Ia5String::new(value)
        .map_err(|e| CertSmithError::InvalidArgument(format!("{kind} {value:?}: {e}")))
}

fn decode_ip(octets: &[u8]) -> Result<IpAddr> {
    if let Ok(v4) = <[u8; 4]>::try_from(octets) {
        return Ok(IpAddr::from(v4));
    }
    if let Ok(v6) = <[u8; 16]>::try_from(octets) {
        return Ok(IpAddr::from(v6));
    }
    Err(CertSmithError::DecodingError(format!(
        "IP address with {} octets",
        octets.len()
    )))
}

use std::fmt;

use bon::Builder;
use const_oid::ObjectIdentifier;
use der::asn1::{Any, Ia5StringRef, PrintableStringRef, SetOfVec, Utf8StringRef};
use tracing::trace;
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::name::{Name, RdnSequence, RelativeDistinguishedName};

use super::san::SubjectAlternativeName;
use crate::error::{CertSmithError, Result};
use crate::oid;

/// Distinguished name of a certificate subject or issuer.
///
/// [`fmt::Display`] renders the attributes in a fixed order:
/// `CN, DNQ, O, OU..., DC..., STREET, L, ST, PC, C, SERIALNUMBER, T`,
/// skipping empty ones and joining the rest with `", "`.
///
/// # Fields
/// * `common_name` - The common name (CN). May be left empty when a SAN DNS
///   name can stand in for it.
/// * `dn_qualifier` - The DN qualifier (DNQ).
/// * `organization` - The organization (O).
/// * `organizational_units` - Organizational units (OU), in order.
/// * `domain_components` - Domain components (DC), in order.
/// * `street` - The street address (STREET).
/// * `locality` - The locality or city (L).
/// * `state` - The state or province (ST).
/// * `postal_code` - The postal code (PC).
/// * `country` - The two-letter country code (C).
/// * `serial_number` - The subject serial number attribute.
/// * `title` - The title (T).
#[derive(Clone, Debug, Default, PartialEq, Eq, Builder)]
pub struct DistinguishedName {
    #[builder(default)]
    pub common_name: String,
    pub dn_qualifier: Option<String>,
    pub organization: Option<String>,
    #[builder(default)]
    pub organizational_units: Vec<String>,
    #[builder(default)]
    pub domain_components: Vec<String>,
    pub street: Option<String>,
    pub locality: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub serial_number: Option<String>,
    pub title: Option<String>,
}

type Attribute<'a> = (&'static str, ObjectIdentifier, StringKind, &'a str);

fn push_attribute<'a>(
    attributes: &mut Vec<Attribute<'a>>,
    label: &'static str,
    oid: ObjectIdentifier,
    kind: StringKind,
    value: Option<&'a String>,
) {
    if let Some(value) = value.filter(|value| !value.is_empty()) {
        attributes.push((label, oid, kind, value.as_str()));
    }
}

#[derive(Clone, Copy)]
enum StringKind {
    Utf8,
    Printable,
    Ia5,
}

impl DistinguishedName {
    /// Shorthand for a name holding only a common name.
    pub fn from_common_name(common_name: impl Into<String>) -> Self {
        Self {
            common_name: common_name.into(),
            ..Self::default()
        }
    }

    /// Fills in an empty common name from the first SAN DNS name.
    ///
    /// Fails with `InvalidArgument` when neither is available.
    pub fn resolve_common_name(&self, san: Option<&SubjectAlternativeName>) -> Result<Self> {
        if !self.common_name.is_empty() {
            return Ok(self.clone());
        }
        let dns_name = san.and_then(|san| san.dns_names.first()).ok_or_else(|| {
            CertSmithError::InvalidArgument(
                "distinguished name has no common name and there is no SAN DNS name to use"
                    .to_string(),
            )
        })?;
        Ok(Self {
            common_name: dns_name.clone(),
            ..self.clone()
        })
    }

    /// Attributes in display order with their short labels.
    fn attributes(&self) -> Vec<Attribute<'_>> {
        let mut attributes = Vec::new();
        let single = [
            ("CN", oid::AT_COMMON_NAME, StringKind::Utf8, Some(&self.common_name)),
            ("DNQ", oid::AT_DN_QUALIFIER, StringKind::Printable, self.dn_qualifier.as_ref()),
            ("O", oid::AT_ORGANIZATION, StringKind::Utf8, self.organization.as_ref()),
        ];
        for (label, oid, kind, value) in single {
            push_attribute(&mut attributes, label, oid, kind, value);
        }
        for value in &self.organizational_units {
            push_attribute(
                &mut attributes,
                "OU",
                oid::AT_ORGANIZATIONAL_UNIT,
                StringKind::Utf8,
                Some(value),
            );
        }
        for value in &self.domain_components {
            push_attribute(
                &mut attributes,
                "DC",
                oid::AT_DOMAIN_COMPONENT,
                StringKind::Ia5,
                Some(value),
            );
        }
        let trailing = [
            ("STREET", oid::AT_STREET, StringKind::Utf8, self.street.as_ref()),
            ("L", oid::AT_LOCALITY, StringKind::Utf8, self.locality.as_ref()),
            ("ST", oid::AT_STATE_OR_PROVINCE, StringKind::Utf8, self.state.as_ref()),
            ("PC", oid::AT_POSTAL_CODE, StringKind::Utf8, self.postal_code.as_ref()),
            ("C", oid::AT_COUNTRY, StringKind::Printable, self.country.as_ref()),
            (
                "SERIALNUMBER",
                oid::AT_SERIAL_NUMBER,
                StringKind::Printable,
                self.serial_number.as_ref(),
            ),
            ("T", oid::AT_TITLE, StringKind::Utf8, self.title.as_ref()),
        ];
        for (label, oid, kind, value) in trailing {
            push_attribute(&mut attributes, label, oid, kind, value);
        }
        attributes
    }

    /// Converts the distinguished name to an X.509 `Name`.
    ///
    /// Each attribute gets its own RDN. The RDN sequence runs from the last
    /// displayed attribute to the first, so the encoded name starts with the
    /// most general component (C before O before CN) and RFC 4514 renderers
    /// print it back in display order.
    pub fn to_x509_name(&self) -> Result<Name> {
        if self.common_name.is_empty() {
            return Err(CertSmithError::InvalidArgument(
                "distinguished name has an empty common name".to_string(),
            ));
        }

        let mut rdns = Vec::new();
        for (label, oid, kind, value) in self.attributes().into_iter().rev() {
            let encoded = match kind {
                StringKind::Utf8 => Utf8StringRef::new(value).and_then(|s| Any::encode_from(&s)),
                StringKind::Printable => {
                    PrintableStringRef::new(value).and_then(|s| Any::encode_from(&s))
                }
                StringKind::Ia5 => Ia5StringRef::new(value).and_then(|s| Any::encode_from(&s)),
            }
            .map_err(|e| {
                CertSmithError::InvalidArgument(format!("{label}={value:?} cannot be encoded: {e}"))
            })?;
            let attribute = AttributeTypeAndValue {
                oid,
                value: encoded,
            };
            rdns.push(RelativeDistinguishedName(SetOfVec::try_from(vec![attribute])?));
        }
        Ok(RdnSequence(rdns))
    }

    /// Reads a distinguished name back from an X.509 `Name`.
    ///
    /// Attributes this type has no field for are skipped.
    pub fn from_x509_name(name: &Name) -> Result<Self> {
        let mut dn = DistinguishedName::default();
        for rdn in name.0.iter().rev() {
            for attribute in rdn.0.iter() {
                let value = std::str::from_utf8(attribute.value.value())
                    .map_err(|e| CertSmithError::DecodingError(e.to_string()))?
                    .to_string();
                match attribute.oid {
                    oid::AT_COMMON_NAME => dn.common_name = value,
                    oid::AT_DN_QUALIFIER => dn.dn_qualifier = Some(value),
                    oid::AT_ORGANIZATION => dn.organization = Some(value),
                    oid::AT_ORGANIZATIONAL_UNIT => dn.organizational_units.push(value),
                    oid::AT_DOMAIN_COMPONENT => dn.domain_components.push(value),
                    oid::AT_STREET => dn.street = Some(value),
                    oid::AT_LOCALITY => dn.locality = Some(value),
                    oid::AT_STATE_OR_PROVINCE => dn.state = Some(value),
                    oid::AT_POSTAL_CODE => dn.postal_code = Some(value),
                    oid::AT_COUNTRY => dn.country = Some(value),
                    oid::AT_SERIAL_NUMBER => dn.serial_number = Some(value),
                    oid::AT_TITLE => dn.title = Some(value),
                    other => trace!(oid = %other, "skipping unknown name attribute"),
                }
            }
        }
        Ok(dn)
    }
}

impl fmt::Display for DistinguishedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, (label, _, _, value)) in self.attributes().into_iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{label}={}", escape_value(value))?;
        }
        Ok(())
    }
}

/// Escapes an attribute value the way RFC 4514 asks for.
fn escape_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    let last = value.chars().count().saturating_sub(1);
    for (index, c) in value.chars().enumerate() {
        let leading = index == 0 && (c == ' ' || c == '#');
        let trailing = index == last && c == ' ';
        if leading || trailing || matches!(c, ',' | '+' | '"' | '\\' | '<' | '>' | ';') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_order_is_stable() {
        let dn = DistinguishedName::builder()
            .common_name("a".to_string())
            .organization("b".to_string())
            .country("c".to_string())
            .build();
        assert_eq!(dn.to_string(), "CN=a, O=b, C=c");
        assert_eq!(dn.to_string(), "CN=a, O=b, C=c");
    }

    #[test]
    fn test_display_full_order() {
        let dn = DistinguishedName::builder()
            .title("Dr".to_string())
            .country("NL".to_string())
            .postal_code("1011".to_string())
            .state("NH".to_string())
            .locality("Amsterdam".to_string())
            .street("Main 1".to_string())
            .domain_components(vec!["example".to_string(), "com".to_string()])
            .organizational_units(vec!["Dev".to_string(), "Ops".to_string()])
            .organization("Crabs".to_string())
            .dn_qualifier("q1".to_string())
            .common_name("crab".to_string())
            .serial_number("42".to_string())
            .build();
        assert_eq!(
            dn.to_string(),
            "CN=crab, DNQ=q1, O=Crabs, OU=Dev, OU=Ops, DC=example, DC=com, STREET=Main 1, \
             L=Amsterdam, ST=NH, PC=1011, C=NL, SERIALNUMBER=42, T=Dr"
        );
    }

    #[test]
    fn test_empty_segments_are_skipped() {
        let dn = DistinguishedName::builder()
            .common_name("a".to_string())
            .organization(String::new())
            .organizational_units(vec![String::new(), "unit".to_string()])
            .build();
        assert_eq!(dn.to_string(), "CN=a, OU=unit");
    }

    #[test]
    fn test_special_characters_are_escaped() {
        let dn = DistinguishedName::from_common_name("Crabs, Inc.");
        assert_eq!(dn.to_string(), "CN=Crabs\\, Inc.");
    }

    #[test]
    fn test_common_name_from_san() {
        let dn = DistinguishedName::builder()
            .organization("Crabs".to_string())
            .build();
        let san = SubjectAlternativeName::builder()
            .dns_names(vec!["crabs.example".to_string(), "www.crabs.example".to_string()])
            .build();
        let resolved = dn.resolve_common_name(Some(&san)).unwrap();
        assert_eq!(resolved.common_name, "crabs.example");

        assert!(matches!(
            dn.resolve_common_name(None),
            Err(CertSmithError::InvalidArgument(_))
        ));
        assert!(matches!(
            dn.to_x509_name(),
            Err(CertSmithError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_x509_name_round_trip() {
        let dn = DistinguishedName::builder()
            .common_name("crab".to_string())
            .organization("Crab widgits SE".to_string())
            .organizational_units(vec!["Dev".to_string(), "Ops".to_string()])
            .domain_components(vec!["example".to_string(), "com".to_string()])
            .country("SE".to_string())
            .build();
        let name = dn.to_x509_name().unwrap();
        assert_eq!(name.0.len(), 7);
        assert_eq!(name.0[0].0.iter().next().unwrap().oid, oid::AT_COUNTRY);
        assert_eq!(name.0[6].0.iter().next().unwrap().oid, oid::AT_COMMON_NAME);
        assert_eq!(DistinguishedName::from_x509_name(&name).unwrap(), dn);
    }

    #[test]
    fn test_country_must_be_printable() {
        let dn = DistinguishedName::builder()
            .common_name("crab".to_string())
            .country("S@".to_string())
            .build();
        assert!(matches!(
            dn.to_x509_name(),
            Err(CertSmithError::InvalidArgument(_))
        ));
    }
}

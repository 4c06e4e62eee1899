//! Fixed object identifier table.
//!
//! Symbolic names map to dotted-decimal strings exactly as existing
//! verifiers expect them. The `ObjectIdentifier` constants below are the
//! same values in parsed form.

use const_oid::ObjectIdentifier;

/// TLS client authentication key purpose.
pub const CLIENT_AUTHENTICATION: &str = "1.3.6.1.5.5.7.3.2";
/// TLS server authentication key purpose.
pub const SERVER_AUTHENTICATION: &str = "1.3.6.1.5.5.7.3.1";
/// Code signing key purpose.
pub const CODE_SIGNING: &str = "1.3.6.1.5.5.7.3.3";
/// Secure email (S/MIME) key purpose.
pub const SECURE_EMAIL: &str = "1.3.6.1.5.5.7.3.4";
/// IPsec end system key purpose.
pub const IP_SECURITY_END_SYSTEM: &str = "1.3.6.1.5.5.7.3.5";
/// IPsec tunnel termination key purpose.
pub const IP_SECURITY_TUNNEL_TERMINATION: &str = "1.3.6.1.5.5.7.3.6";
/// IPsec user key purpose.
pub const IP_SECURITY_USER: &str = "1.3.6.1.5.5.7.3.7";
/// Time stamping key purpose.
pub const TIME_STAMPING: &str = "1.3.6.1.5.5.7.3.8";
/// OCSP signing key purpose.
pub const OCSP_SIGNING: &str = "1.3.6.1.5.5.7.3.9";
/// Microsoft smart card logon key purpose.
pub const SMART_CARD_LOGON: &str = "1.3.6.1.4.1.311.20.2.2";
/// MAC address key purpose.
pub const MAC_ADDRESS: &str = "1.3.6.1.1.1.1.22";
/// Microsoft user principal name, used as an `OtherName` type id.
pub const USER_PRINCIPAL_NAME: &str = "1.3.6.1.4.1.311.20.2.3";
/// rsaEncryption.
pub const RSA: &str = "1.2.840.113549.1.1.1";
/// id-dsa.
pub const DSA: &str = "1.2.840.10040.4.1";
/// id-ecPublicKey.
pub const EC: &str = "1.2.840.10045.2.1";
/// Subject key identifier extension.
pub const SUBJECT_KEY_IDENTIFIER: &str = "2.5.29.14";
/// Authority key identifier extension.
pub const AUTHORITY_KEY_IDENTIFIER: &str = "2.5.29.35";

pub const ID_KP_CLIENT_AUTH: ObjectIdentifier = ObjectIdentifier::new_unwrap(CLIENT_AUTHENTICATION);
pub const ID_KP_SERVER_AUTH: ObjectIdentifier = ObjectIdentifier::new_unwrap(SERVER_AUTHENTICATION);
pub const ID_KP_CODE_SIGNING: ObjectIdentifier = ObjectIdentifier::new_unwrap(CODE_SIGNING);
pub const ID_KP_EMAIL_PROTECTION: ObjectIdentifier = ObjectIdentifier::new_unwrap(SECURE_EMAIL);
pub const ID_KP_IPSEC_END_SYSTEM: ObjectIdentifier =
    ObjectIdentifier::new_unwrap(IP_SECURITY_END_SYSTEM);
pub const ID_KP_IPSEC_TUNNEL: ObjectIdentifier =
    ObjectIdentifier::new_unwrap(IP_SECURITY_TUNNEL_TERMINATION);
pub const ID_KP_IPSEC_USER: ObjectIdentifier = ObjectIdentifier::new_unwrap(IP_SECURITY_USER);
pub const ID_KP_TIME_STAMPING: ObjectIdentifier = ObjectIdentifier::new_unwrap(TIME_STAMPING);
pub const ID_KP_OCSP_SIGNING: ObjectIdentifier = ObjectIdentifier::new_unwrap(OCSP_SIGNING);
pub const ID_KP_SMART_CARD_LOGON: ObjectIdentifier = ObjectIdentifier::new_unwrap(SMART_CARD_LOGON);
pub const ID_KP_MAC_ADDRESS: ObjectIdentifier = ObjectIdentifier::new_unwrap(MAC_ADDRESS);
pub const ID_USER_PRINCIPAL_NAME: ObjectIdentifier =
    ObjectIdentifier::new_unwrap(USER_PRINCIPAL_NAME);

pub const ID_RSA_ENCRYPTION: ObjectIdentifier = ObjectIdentifier::new_unwrap(RSA);
pub const ID_DSA: ObjectIdentifier = ObjectIdentifier::new_unwrap(DSA);
pub const ID_EC_PUBLIC_KEY: ObjectIdentifier = ObjectIdentifier::new_unwrap(EC);
pub const ID_CE_SUBJECT_KEY_IDENTIFIER: ObjectIdentifier =
    ObjectIdentifier::new_unwrap(SUBJECT_KEY_IDENTIFIER);
pub const ID_CE_AUTHORITY_KEY_IDENTIFIER: ObjectIdentifier =
    ObjectIdentifier::new_unwrap(AUTHORITY_KEY_IDENTIFIER);
pub const ID_CE_BASIC_CONSTRAINTS: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.29.19");
pub const ID_CE_KEY_USAGE: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.29.15");
pub const ID_CE_EXT_KEY_USAGE: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.29.37");
pub const ID_CE_SUBJECT_ALT_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.29.17");

// Distinguished name attribute types.
pub const AT_COMMON_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.3");
pub const AT_SERIAL_NUMBER: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.5");
pub const AT_COUNTRY: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.6");
pub const AT_LOCALITY: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.7");
pub const AT_STATE_OR_PROVINCE: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.8");
pub const AT_STREET: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.9");
pub const AT_ORGANIZATION: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.10");
pub const AT_ORGANIZATIONAL_UNIT: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.11");
pub const AT_TITLE: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.12");
pub const AT_POSTAL_CODE: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.17");
pub const AT_DN_QUALIFIER: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.46");
pub const AT_DOMAIN_COMPONENT: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("0.9.2342.19200300.100.1.25");

// Signature algorithms.
pub const SHA1_WITH_RSA_ENCRYPTION: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.5");
pub const SHA256_WITH_RSA_ENCRYPTION: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.11");
pub const SHA384_WITH_RSA_ENCRYPTION: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.12");
pub const SHA512_WITH_RSA_ENCRYPTION: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.13");
pub const ID_RSASSA_PSS: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.10");
pub const ECDSA_WITH_SHA1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.4.1");
pub const ECDSA_WITH_SHA256: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.4.3.2");
pub const ECDSA_WITH_SHA384: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.4.3.3");
pub const ECDSA_WITH_SHA512: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.4.3.4");
pub const DSA_WITH_SHA1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10040.4.3");
pub const DSA_WITH_SHA256: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.3.2");

// Named curves.
pub const SECP224R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.33");
pub const SECP256R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.3.1.7");
pub const SECP384R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.34");
pub const SECP521R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.35");

/// Looks up the dotted-decimal value of a symbolic name from the table.
///
/// Names follow the table's own spelling (`"ClientAuthentication"`,
/// `"SmartCardLogon"`, `"Rsa"`, ...).
pub fn from_name(name: &str) -> Option<&'static str> {
    NAMED_OIDS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, oid)| *oid)
}

/// The symbolic name table, in declaration order.
pub const NAMED_OIDS: &[(&str, &str)] = &[
    ("ClientAuthentication", CLIENT_AUTHENTICATION),
    ("ServerAuthentication", SERVER_AUTHENTICATION),
    ("CodeSigning", CODE_SIGNING),
    ("TimeStamping", TIME_STAMPING),
    ("SecureEmail", SECURE_EMAIL),
    ("IPsecurityTunnelTermination", IP_SECURITY_TUNNEL_TERMINATION),
    ("IPsecurityUser", IP_SECURITY_USER),
    ("IPsecurityEndSystem", IP_SECURITY_END_SYSTEM),
    ("OCSPSigning", OCSP_SIGNING),
    ("SmartCardLogon", SMART_CARD_LOGON),
    ("MacAddress", MAC_ADDRESS),
    ("UserPrincipalName", USER_PRINCIPAL_NAME),
    ("Rsa", RSA),
    ("Dsa", DSA),
    ("Ec", EC),
    ("SubjectKeyIdentifier", SUBJECT_KEY_IDENTIFIER),
    ("AuthorityKeyIdentifier", AUTHORITY_KEY_IDENTIFIER),
];

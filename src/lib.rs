//! # CertSmith - X.509 Certificate Construction in Pure Rust
//!
//! CertSmith builds self-signed and chain-signed X.509 v3 certificates from a
//! declarative option set: distinguished name, subject alternative names,
//! key usage, extended key usage, basic constraints, validity window and
//! serial number. Every certificate is signed, checked against its issuer's
//! public key and round-tripped through a PKCS#12 container before it is
//! handed back together with its private key.
//!
//! ## Supported Key Types
//!
//! - **RSA**: any multiple of 1024 bits, PKCS#1 v1.5 or PSS signatures
//! - **ECDSA**: P-224, P-256, P-384 and P-521 (key size 512)
//! - **DSA**: 1024, 2048 and 3072-bit parameter sets
//!
//! Signatures use SHA-1, SHA-256, SHA-384 or SHA-512.
//!
//! ## Quick Start
//!
//! ### Generating a Self-Signed Certificate
//!
//! ```rust,no_run
//! use certsmith::{
//!     algorithm::AlgorithmOptions,
//!     builder::CertificateBuilder,
//!     cert::{extensions::KeyUsages, name::DistinguishedName, san::SubjectAlternativeName},
//!     lifetime::CertificateLifetime,
//! };
//!
//! # fn main() -> Result<(), certsmith::error::CertSmithError> {
//! let subject = DistinguishedName::builder()
//!     .common_name("example.com".to_string())
//!     .organization("Example Corp".to_string())
//!     .country("US".to_string())
//!     .build();
//!
//! let mut san = SubjectAlternativeName::default();
//! san.add_dns_name("example.com").add_dns_name("www.example.com");
//!
//! let built = CertificateBuilder::new()
//!     .with_distinguished_name(subject)
//!     .with_subject_alternative_name(san)
//!     .with_key_usage(KeyUsages::DigitalSignature)
//!     .with_algorithm_options(AlgorithmOptions::rsa(2048)?)
//!     .with_lifetime(CertificateLifetime::one_year()?)
//!     .build()?;
//!
//! println!("Certificate:\n{}", built.cert.to_pem()?);
//! # Ok(())
//! # }
//! ```
//!
//! ### Creating a Certificate Chain
//!
//! ```rust,no_run
//! use certsmith::{
//!     builder::CertificateBuilder,
//!     cert::{
//!         extensions::{BasicConstraints, KeyPurpose, KeyUsages},
//!         name::DistinguishedName,
//!     },
//! };
//!
//! # fn main() -> Result<(), certsmith::error::CertSmithError> {
//! let ca = CertificateBuilder::new()
//!     .with_distinguished_name(DistinguishedName::from_common_name("Example CA"))
//!     .with_basic_constraints(BasicConstraints::ca())
//!     .with_key_usage(KeyUsages::KeyCertSign | KeyUsages::CRLSign)
//!     .build()?;
//!
//! let server = CertificateBuilder::new()
//!     .with_distinguished_name(DistinguishedName::from_common_name("server.example.com"))
//!     .add_extended_key_usage([KeyPurpose::ServerAuthentication])
//!     .with_issuer(ca)
//!     .build()?;
//!
//! let pfx = server.to_pkcs12("changeit")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Every fallible call returns [`error::CertSmithError`]:
//!
//! ```rust
//! use certsmith::{algorithm::AlgorithmOptions, error::CertSmithError};
//!
//! match AlgorithmOptions::ecdsa(300) {
//!     Ok(_) => unreachable!(),
//!     Err(CertSmithError::InvalidArgument(msg)) => println!("Invalid key size: {}", msg),
//!     Err(e) => println!("Other error: {}", e),
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`builder`]: Certificate options, the fluent builder and `build_certificate`
//! - [`cert`]: Certificates, names, SANs and extension encoders
//! - [`algorithm`]: Key algorithm, key size and hash selection
//! - [`key`]: Key generation, PKCS#8 import/export and signature verification
//! - [`signature`]: Signature generators for RSA, ECDSA and DSA
//! - [`issuer`]: Signing certificates as self or as a CA
//! - [`lifetime`]: Certificate validity windows
//! - [`pkcs12`]: PKCS#12 packaging
//! - [`tbs_certificate`]: The to-be-signed certificate structure
//! - [`asn1`]: Hand-rolled DER primitives
//! - [`oid`]: Object identifiers
//! - [`error`]: Error types

pub mod algorithm;
pub mod asn1;
pub mod builder;
pub mod cert;
pub mod error;
pub mod issuer;
pub mod key;
pub mod lifetime;
pub mod oid;
pub mod pem_utils;
pub mod pkcs12;
pub mod signature;
pub mod tbs_certificate;

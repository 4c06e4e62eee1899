//! Assembling, signing and packaging certificates.
//!
//! A build runs in three steps: the options are collected on a
//! [`CertificateBuilder`] (or passed straight to [`build_certificate`]), the
//! TBS certificate and its extensions are assembled, then the issuer signs
//! it and the result is sealed into and reopened from a PKCS#12 container.

use bon::Builder;
use der::flagset::FlagSet;
use time::{Duration, OffsetDateTime};
use tracing::{debug, trace};
use x509_cert::ext::pkix::KeyUsages;
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::algorithm::AlgorithmOptions;
use crate::cert::extensions::{
    AuthorityKeyIdentifier, BasicConstraints, ExtendedKeyUsage, ExtensionParam, KeyPurpose,
    KeyUsage, KeyUsageMapping, SubjectAltName, SubjectKeyIdentifier, X509Extension,
};
use crate::cert::name::DistinguishedName;
use crate::cert::san::SubjectAlternativeName;
use crate::cert::{CertificateWithPrivateKey, IssuerCertificate};
use crate::error::{CertSmithError, Result};
use crate::issuer::{Issuer, SelfIssuer};
use crate::key::KeyPair;
use crate::lifetime::CertificateLifetime;
use crate::pkcs12;
use crate::tbs_certificate::TbsCertificate;

/// How far a chained certificate's NotBefore is moved back before it is
/// clamped to the issuer's validity.
pub const CHAINED_BACKDATE: Duration = Duration::days(1);

/// Everything needed to build one certificate.
///
/// # Fields
/// * `distinguished_name` - Subject name. May be left out when the SAN has
///   a DNS name to use as the common name.
/// * `subject_alternative_name` - Alternative subject identities.
/// * `basic_constraints` - Basic Constraints, omitted when `None`.
/// * `key_usage` - Key usage flags, omitted when empty.
/// * `key_usage_mapping` - How `key_usage` flags map to encoded bits.
/// * `extended_key_usage` - Key purposes, omitted when empty.
/// * `extended_key_usage_critical` - Criticality of Extended Key Usage.
/// * `lifetime` - Validity window. Defaults to 90 days from the build.
///   Chained builds start [`CHAINED_BACKDATE`] earlier, within the issuer's
///   window.
/// * `serial_number` - Big-endian serial. Unset or zero uses the current
///   Unix time in seconds.
/// * `issuer` - Signing certificate. Self-signed when `None`.
/// * `algorithm` - Key algorithm, size and hash.
/// * `key_pair` - Existing key to certify instead of generating one.
/// * `extensions` - Extra extensions, emitted after the built-in ones.
#[derive(Debug, Clone, Default, Builder)]
pub struct CertificateBuilderOptions {
    pub distinguished_name: Option<DistinguishedName>,
    pub subject_alternative_name: Option<SubjectAlternativeName>,
    pub basic_constraints: Option<BasicConstraints>,
    #[builder(default, into)]
    pub key_usage: FlagSet<KeyUsages>,
    #[builder(default)]
    pub key_usage_mapping: KeyUsageMapping,
    #[builder(default)]
    pub extended_key_usage: Vec<KeyPurpose>,
    #[builder(default)]
    pub extended_key_usage_critical: bool,
    pub lifetime: Option<CertificateLifetime>,
    pub serial_number: Option<Vec<u8>>,
    pub issuer: Option<IssuerCertificate>,
    #[builder(default)]
    pub algorithm: AlgorithmOptions,
    pub key_pair: Option<KeyPair>,
    #[builder(default)]
    pub extensions: Vec<ExtensionParam>,
}

/// Collects certificate options and builds certificates from them.
///
/// Setters return the same builder so calls can be chained; [`reset`]
/// replaces all options at once.
///
/// # Example
/// ```rust,no_run
/// use certsmith::builder::CertificateBuilder;
/// use certsmith::cert::extensions::KeyUsages;
/// use certsmith::cert::san::SubjectAlternativeName;
///
/// # fn main() -> Result<(), certsmith::error::CertSmithError> {
/// let mut san = SubjectAlternativeName::default();
/// san.add_dns_name("example.com");
///
/// let built = CertificateBuilder::new()
///     .with_subject_alternative_name(san)
///     .with_key_usage(KeyUsages::DigitalSignature)
///     .build()?;
/// println!("{}", built.cert.to_pem()?);
/// # Ok(())
/// # }
/// ```
///
/// [`reset`]: CertificateBuilder::reset
#[derive(Debug, Default)]
pub struct CertificateBuilder {
    options: CertificateBuilderOptions,
}

impl CertificateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: CertificateBuilderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CertificateBuilderOptions {
        &self.options
    }

    pub fn with_distinguished_name(&mut self, name: DistinguishedName) -> &mut Self {
        self.options.distinguished_name = Some(name);
        self
    }

    pub fn with_subject_alternative_name(&mut self, san: SubjectAlternativeName) -> &mut Self {
        self.options.subject_alternative_name = Some(san);
        self
    }

    pub fn with_basic_constraints(&mut self, basic_constraints: BasicConstraints) -> &mut Self {
        self.options.basic_constraints = Some(basic_constraints);
        self
    }

    pub fn with_key_usage(&mut self, key_usage: impl Into<FlagSet<KeyUsages>>) -> &mut Self {
        self.options.key_usage = key_usage.into();
        self
    }

    pub fn with_key_usage_mapping(&mut self, mapping: KeyUsageMapping) -> &mut Self {
        self.options.key_usage_mapping = mapping;
        self
    }

    /// Appends key purposes, skipping ones already present.
    pub fn add_extended_key_usage(
        &mut self,
        purposes: impl IntoIterator<Item = KeyPurpose>,
    ) -> &mut Self {
        for purpose in purposes {
            if !self.options.extended_key_usage.contains(&purpose) {
                self.options.extended_key_usage.push(purpose);
            }
        }
        self
    }

    pub fn with_extended_key_usage_critical(&mut self, critical: bool) -> &mut Self {
        self.options.extended_key_usage_critical = critical;
        self
    }

    pub fn with_lifetime(&mut self, lifetime: CertificateLifetime) -> &mut Self {
        self.options.lifetime = Some(lifetime);
        self
    }

    /// Sets the serial number from its big-endian bytes.
    pub fn with_serial_number(&mut self, serial_number: impl Into<Vec<u8>>) -> &mut Self {
        self.options.serial_number = Some(serial_number.into());
        self
    }

    pub fn with_serial(&mut self, serial_number: u64) -> &mut Self {
        self.with_serial_number(serial_number.to_be_bytes())
    }

    pub fn with_issuer(&mut self, issuer: impl Into<IssuerCertificate>) -> &mut Self {
        self.options.issuer = Some(issuer.into());
        self
    }

    pub fn with_algorithm_options(&mut self, algorithm: AlgorithmOptions) -> &mut Self {
        self.options.algorithm = algorithm;
        self
    }

    /// Certifies `key_pair` instead of generating a new key.
    pub fn with_key_pair(&mut self, key_pair: KeyPair) -> &mut Self {
        self.options.key_pair = Some(key_pair);
        self
    }

    pub fn add_extension(&mut self, extension: ExtensionParam) -> &mut Self {
        self.options.extensions.push(extension);
        self
    }

    /// Discards every option.
    pub fn reset(&mut self) -> &mut Self {
        self.options = CertificateBuilderOptions::default();
        self
    }

    /// Replaces every option with `options`.
    pub fn reset_with_options(&mut self, options: CertificateBuilderOptions) -> &mut Self {
        self.options = options;
        self
    }

    pub fn build(&self) -> Result<CertificateWithPrivateKey> {
        build_certificate(&self.options)
    }
}

/// Builds a certificate from `options`.
///
/// Self-signed when `options.issuer` is `None`; otherwise the issuer's key
/// signs, its subject becomes the issuer name, the Authority Key Identifier
/// is taken from its Subject Key Identifier and the lifetime is clamped to
/// its own.
///
/// # Errors
/// * `InvalidState` - no distinguished name and no SAN DNS name, or an
///   issuer without its private key.
/// * `NotSupported` - a key/hash pairing that cannot sign, or a reused key
///   pair that does not match `options.algorithm`.
/// * `InvalidArgument` - malformed option values, such as an empty SAN or
///   duplicate extensions.
/// * `VerificationFailed` - the signed certificate did not verify against
///   the issuer's public key.
pub fn build_certificate(options: &CertificateBuilderOptions) -> Result<CertificateWithPrivateKey> {
    let subject_dn = subject_name(options)?;
    let subject = subject_dn.to_x509_name()?;

    if let Some(issuer) = &options.issuer {
        issuer.signing_key()?;
    }

    let key = match &options.key_pair {
        Some(key) if key.algorithm() != options.algorithm.key_algorithm() => {
            return Err(CertSmithError::NotSupported(format!(
                "reused {} key cannot serve {} algorithm options",
                key.algorithm(),
                options.algorithm.key_algorithm()
            )));
        }
        Some(key) => key.clone(),
        None => options.algorithm.create_key_pair()?,
    };
    let public_key_info = key.public_key_info()?;

    let self_issuer;
    let issuer: &dyn Issuer = match &options.issuer {
        Some(issuer) => issuer,
        None => {
            self_issuer = SelfIssuer {
                name: subject.clone(),
                key: &key,
            };
            &self_issuer
        }
    };

    let mut lifetime = options.lifetime.unwrap_or_default();
    if let Some(outer) = issuer.lifetime()? {
        lifetime = lifetime.backdated(CHAINED_BACKDATE).clamp_to(&outer)?;
    }

    let extensions =
        assemble_extensions(options, &public_key_info, issuer.authority_key_identifier()?)?;

    let tbs = TbsCertificate {
        serial_number: serial_number(options.serial_number.as_deref()),
        issuer: issuer.issuer_name(),
        lifetime,
        subject,
        subject_public_key_info: public_key_info,
        extensions,
    };

    let cert = issuer.issue(&tbs, options.algorithm.hash(), options.algorithm.rsa_padding())?;

    let passphrase = pkcs12::ephemeral_passphrase();
    let blob = pkcs12::seal(&cert, &key, &passphrase)?;
    let built = pkcs12::open(&blob, &passphrase)?;

    debug!(
        subject = %subject_dn,
        not_after = %lifetime.not_after(),
        self_signed = options.issuer.is_none(),
        "built certificate"
    );
    Ok(built)
}

fn subject_name(options: &CertificateBuilderOptions) -> Result<DistinguishedName> {
    let san = options.subject_alternative_name.as_ref();
    match &options.distinguished_name {
        Some(name) => name.resolve_common_name(san),
        None if san.is_some_and(|san| !san.dns_names.is_empty()) => {
            DistinguishedName::default().resolve_common_name(san)
        }
        None => Err(CertSmithError::InvalidState(
            "missing a distinguished name".to_string(),
        )),
    }
}

/// The explicit serial, or the current Unix time when unset or zero.
fn serial_number(explicit: Option<&[u8]>) -> Vec<u8> {
    match explicit {
        Some(serial) if serial.iter().any(|b| *b != 0) => serial.to_vec(),
        _ => OffsetDateTime::now_utc()
            .unix_timestamp()
            .unsigned_abs()
            .to_be_bytes()
            .to_vec(),
    }
}

/// Extensions in emission order: BasicConstraints, KeyUsage,
/// SubjectAlternativeName, ExtendedKeyUsage, SubjectKeyIdentifier,
/// AuthorityKeyIdentifier, then extras.
fn assemble_extensions(
    options: &CertificateBuilderOptions,
    public_key_info: &SubjectPublicKeyInfoOwned,
    authority_key_identifier: Option<AuthorityKeyIdentifier>,
) -> Result<Vec<ExtensionParam>> {
    let mut built: Vec<Box<dyn X509Extension>> = Vec::new();
    if let Some(basic_constraints) = options.basic_constraints {
        built.push(Box::new(basic_constraints));
    }
    if !options.key_usage.is_empty() {
        built.push(Box::new(
            KeyUsage::new(options.key_usage).with_mapping(options.key_usage_mapping),
        ));
    }
    if let Some(san) = &options.subject_alternative_name {
        built.push(Box::new(SubjectAltName(san.clone())));
    }
    if !options.extended_key_usage.is_empty() {
        built.push(Box::new(ExtendedKeyUsage {
            purposes: options.extended_key_usage.clone(),
            critical: options.extended_key_usage_critical,
        }));
    }
    built.push(Box::new(SubjectKeyIdentifier::from_public_key(
        public_key_info,
    )));
    if let Some(aki) = authority_key_identifier {
        built.push(Box::new(aki));
    }

    let mut extensions = Vec::with_capacity(built.len() + options.extensions.len());
    for extension in &built {
        let param = extension.to_extension_param()?;
        trace!(oid = %param.oid, critical = param.critical, "assembled extension");
        extensions.push(param);
    }
    for extra in &options.extensions {
        trace!(oid = %extra.oid, critical = extra.critical, "adding extra extension");
        extensions.push(extra.clone());
    }

    for (index, extension) in extensions.iter().enumerate() {
        if extensions[..index].iter().any(|seen| seen.oid == extension.oid) {
            return Err(CertSmithError::InvalidArgument(format!(
                "extension {} appears more than once",
                extension.oid
            )));
        }
    }
    Ok(extensions)
}

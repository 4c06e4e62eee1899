use certsmith::algorithm::AlgorithmOptions;
use certsmith::builder::CertificateBuilder;
use certsmith::cert::CertificateWithPrivateKey;
use certsmith::cert::extensions::{BasicConstraints, KeyPurpose, KeyUsages};
use certsmith::cert::name::DistinguishedName;
use certsmith::cert::san::SubjectAlternativeName;
use certsmith::lifetime::CertificateLifetime;

pub fn generate_ca_cert() -> CertificateWithPrivateKey {
    generate_ca_cert_with(AlgorithmOptions::default(), CertificateLifetime::one_year().unwrap())
}

pub fn generate_ca_cert_with(
    algorithm: AlgorithmOptions,
    lifetime: CertificateLifetime,
) -> CertificateWithPrivateKey {
    let subject = DistinguishedName::builder()
        .common_name("myca.local".to_string())
        .organization("Crab widgits SE".to_string())
        .country("SE".to_string())
        .build();

    CertificateBuilder::new()
        .with_distinguished_name(subject)
        .with_basic_constraints(BasicConstraints::ca())
        .with_key_usage(KeyUsages::KeyCertSign | KeyUsages::CRLSign)
        .with_algorithm_options(algorithm)
        .with_lifetime(lifetime)
        .build()
        .unwrap()
}

pub fn server_builder(dns_name: &str) -> CertificateBuilder {
    let mut san = SubjectAlternativeName::default();
    san.add_dns_name(dns_name);

    let mut builder = CertificateBuilder::new();
    builder
        .with_distinguished_name(DistinguishedName::from_common_name(dns_name))
        .with_subject_alternative_name(san)
        .with_key_usage(KeyUsages::DigitalSignature)
        .add_extended_key_usage([KeyPurpose::ServerAuthentication]);
    builder
}

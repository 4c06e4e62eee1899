mod util;

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::Duration as StdDuration;

use certsmith::algorithm::{AlgorithmOptions, HashAlgorithm, RsaPadding};
use certsmith::builder::{
    CHAINED_BACKDATE, CertificateBuilder, CertificateBuilderOptions, build_certificate,
};
use certsmith::cert::extensions::{BasicConstraints, KeyPurpose, KeyUsages};
use certsmith::cert::name::DistinguishedName;
use certsmith::cert::san::SubjectAlternativeName;
use certsmith::cert::{CertificateWithPrivateKey, IssuerCertificate};
use certsmith::error::CertSmithError;
use certsmith::key::KeyPair;
use certsmith::lifetime::CertificateLifetime;
use certsmith::oid;
use time::{Duration, OffsetDateTime};

pub type Result<T> = std::result::Result<T, CertSmithError>;

fn self_signed(algorithm: AlgorithmOptions) -> Result<CertificateWithPrivateKey> {
    CertificateBuilder::new()
        .with_distinguished_name(DistinguishedName::from_common_name("crabs.crabs"))
        .with_algorithm_options(algorithm)
        .build()
}

fn assert_self_signed(built: &CertificateWithPrivateKey) -> Result<()> {
    let cert = &built.cert;
    assert!(cert.is_self_issued());
    assert_eq!(cert.issuer()?, cert.subject()?);
    assert!(cert.extension(oid::ID_CE_AUTHORITY_KEY_IDENTIFIER).is_none());
    assert!(cert.subject_key_identifier()?.is_some());
    cert.verify_signature(&cert.public_key()?)?;
    assert_eq!(cert.public_key()?, built.key.public_key());
    Ok(())
}

#[test]
fn self_signed_rsa() -> Result<()> {
    assert_self_signed(&self_signed(AlgorithmOptions::rsa(2048)?)?)
}

#[test]
fn self_signed_rsa_pss() -> Result<()> {
    let options = AlgorithmOptions::rsa_with(2048, HashAlgorithm::Sha384, RsaPadding::Pss)?;
    let built = self_signed(options)?;
    assert_eq!(built.cert.inner.signature_algorithm.oid, oid::ID_RSASSA_PSS);
    assert_self_signed(&built)
}

#[test]
fn self_signed_ecdsa_curves() -> Result<()> {
    for (key_size, signature) in [
        (224, oid::ECDSA_WITH_SHA256),
        (256, oid::ECDSA_WITH_SHA256),
        (384, oid::ECDSA_WITH_SHA384),
        (512, oid::ECDSA_WITH_SHA512),
    ] {
        let built = self_signed(AlgorithmOptions::ecdsa(key_size)?)?;
        assert_eq!(built.cert.inner.signature_algorithm.oid, signature);
        assert_self_signed(&built)?;
    }
    Ok(())
}

#[test]
fn self_signed_dsa() -> Result<()> {
    let built = self_signed(AlgorithmOptions::dsa(1024)?)?;
    assert_eq!(built.cert.inner.signature_algorithm.oid, oid::DSA_WITH_SHA256);
    assert_self_signed(&built)
}

#[test]
fn ecdsa_160_is_not_supported() -> Result<()> {
    assert!(matches!(
        self_signed(AlgorithmOptions::ecdsa(160)?),
        Err(CertSmithError::NotSupported(_))
    ));
    Ok(())
}

#[test]
fn ecdsa_key_size_validation() {
    assert!(matches!(
        AlgorithmOptions::ecdsa(300),
        Err(CertSmithError::InvalidArgument(_))
    ));
    assert!(AlgorithmOptions::ecdsa(384).is_ok());
}

#[test]
fn chained_certificate_links_to_issuer() -> Result<()> {
    let ca = util::generate_ca_cert();
    let ca_ski = ca.cert.subject_key_identifier()?.unwrap();

    let server = util::server_builder("server.myca.local")
        .with_algorithm_options(AlgorithmOptions::rsa(2048)?)
        .with_issuer(ca.clone())
        .build()?;

    assert_eq!(server.cert.issuer_name(), ca.cert.subject_name());
    assert!(!server.cert.is_self_issued());

    let aki = server
        .cert
        .extension(oid::ID_CE_AUTHORITY_KEY_IDENTIFIER)
        .unwrap();
    assert!(!aki.critical);
    assert_eq!(&aki.value[..4], &[0x30, 0x16, 0x80, 0x14]);
    assert_eq!(&aki.value[4..], ca_ski.as_slice());

    server.cert.verify_signature(&ca.cert.public_key()?)?;
    assert!(matches!(
        server.cert.verify_signature(&server.cert.public_key()?),
        Err(CertSmithError::VerificationFailed(_))
    ));

    // the CA signs with its own key type
    assert_eq!(server.cert.inner.signature_algorithm.oid, oid::ECDSA_WITH_SHA256);
    Ok(())
}

#[test]
fn chained_lifetime_is_clamped_to_issuer() -> Result<()> {
    let ca = util::generate_ca_cert_with(
        AlgorithmOptions::default(),
        CertificateLifetime::for_days(30)?,
    );
    let server = util::server_builder("short.myca.local")
        .with_lifetime(CertificateLifetime::five_years()?)
        .with_issuer(ca.clone())
        .build()?;

    assert!(server.cert.not_after() <= ca.cert.not_after());
    assert!(server.cert.not_before() >= ca.cert.not_before());
    Ok(())
}

#[test]
fn chained_lifetime_outside_issuer_is_rejected() -> Result<()> {
    let ca = util::generate_ca_cert();
    let start = ca.cert.not_after() + Duration::days(2);
    let lifetime = CertificateLifetime::new(start, start + Duration::days(10))?;
    assert!(matches!(
        util::server_builder("late.myca.local")
            .with_lifetime(lifetime)
            .with_issuer(ca)
            .build(),
        Err(CertSmithError::InvalidArgument(_))
    ));
    Ok(())
}

#[test]
fn issuer_without_private_key_is_invalid_state() {
    let ca = util::generate_ca_cert();
    let result = util::server_builder("nokey.myca.local")
        .with_issuer(IssuerCertificate::without_key(ca.cert))
        .build();
    assert!(matches!(result, Err(CertSmithError::InvalidState(_))));
}

#[test]
fn p521_issuer_signs_sha256_child() -> Result<()> {
    let ca = util::generate_ca_cert_with(
        AlgorithmOptions::ecdsa(512)?,
        CertificateLifetime::one_year()?,
    );
    let server = util::server_builder("p521.myca.local")
        .with_algorithm_options(AlgorithmOptions::ecdsa_with(256, HashAlgorithm::Sha256)?)
        .with_issuer(ca.clone())
        .build()?;

    assert_eq!(server.cert.inner.signature_algorithm.oid, oid::ECDSA_WITH_SHA256);
    server.cert.verify_signature(&ca.cert.public_key()?)?;
    Ok(())
}

#[test]
fn dsa_issuer_signs_sha384_children_with_sha256() -> Result<()> {
    let ca = util::generate_ca_cert_with(
        AlgorithmOptions::dsa(1024)?,
        CertificateLifetime::one_year()?,
    );
    for algorithm in [
        AlgorithmOptions::ecdsa_with(384, HashAlgorithm::Sha384)?,
        AlgorithmOptions::rsa_with(2048, HashAlgorithm::Sha384, RsaPadding::Pkcs1)?,
    ] {
        let server = util::server_builder("dsa.myca.local")
            .with_algorithm_options(algorithm)
            .with_issuer(ca.clone())
            .build()?;

        assert_eq!(server.cert.inner.signature_algorithm.oid, oid::DSA_WITH_SHA256);
        server.cert.verify_signature(&ca.cert.public_key()?)?;
    }
    Ok(())
}

#[test]
fn chained_not_after_never_exceeds_issuer() -> Result<()> {
    for algorithm in [
        AlgorithmOptions::rsa(2048)?,
        AlgorithmOptions::dsa(1024)?,
        AlgorithmOptions::default(),
    ] {
        let ca = util::generate_ca_cert_with(algorithm, CertificateLifetime::for_days(30)?);
        let server = util::server_builder("bounded.myca.local")
            .with_lifetime(CertificateLifetime::ten_years()?)
            .with_issuer(ca.clone())
            .build()?;

        assert_eq!(server.cert.not_after(), ca.cert.not_after(), "{algorithm:?} issuer");
        server.cert.verify_signature(&ca.cert.public_key()?)?;
    }
    Ok(())
}

#[test]
fn chained_not_before_is_backdated() -> Result<()> {
    let now = OffsetDateTime::now_utc();
    let ca = util::generate_ca_cert_with(
        AlgorithmOptions::default(),
        CertificateLifetime::new(now - Duration::days(10), now + Duration::days(365))?,
    );
    let requested = CertificateLifetime::new(now, now + Duration::days(30))?;
    let server = util::server_builder("backdated.myca.local")
        .with_lifetime(requested)
        .with_issuer(ca)
        .build()?;
    assert_eq!(server.cert.not_before(), requested.not_before() - CHAINED_BACKDATE);
    assert_eq!(server.cert.not_after(), requested.not_after());

    // a fresh issuer bounds the backdate
    let fresh = util::generate_ca_cert();
    let server = util::server_builder("fresh.myca.local")
        .with_issuer(fresh.clone())
        .build()?;
    assert_eq!(server.cert.not_before(), fresh.cert.not_before());

    // self-signed builds keep the requested start
    let built = CertificateBuilder::new()
        .with_distinguished_name(DistinguishedName::from_common_name("self.myca.local"))
        .with_lifetime(requested)
        .build()?;
    assert_eq!(built.cert.not_before(), requested.not_before());
    Ok(())
}

#[test]
fn every_san_kind_survives_a_build() -> Result<()> {
    let mut san = SubjectAlternativeName::default();
    san.add_dns_name("svc.myca.local")
        .add_email_address("ops@myca.local")
        .add_uri("https://svc.myca.local/")
        .add_ip_address(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 7)))
        .add_ip_address(IpAddr::V6(Ipv6Addr::LOCALHOST))
        .add_user_principal_name("svc@myca.local");

    let ca = util::generate_ca_cert();
    let server = CertificateBuilder::new()
        .with_distinguished_name(DistinguishedName::from_common_name("svc.myca.local"))
        .with_subject_alternative_name(san.clone())
        .with_issuer(ca)
        .build()?;

    assert_eq!(server.cert.subject_alternative_name()?, Some(san));
    Ok(())
}

#[test]
fn missing_distinguished_name_is_invalid_state() {
    assert!(matches!(
        CertificateBuilder::new().build(),
        Err(CertSmithError::InvalidState(_))
    ));
}

#[test]
fn common_name_comes_from_first_san_dns_name() -> Result<()> {
    let mut san = SubjectAlternativeName::default();
    san.add_dns_name("first.example").add_dns_name("second.example");
    let built = CertificateBuilder::new()
        .with_subject_alternative_name(san.clone())
        .build()?;

    assert_eq!(built.cert.subject()?.common_name, "first.example");
    let extension = built.cert.extension(oid::ID_CE_SUBJECT_ALT_NAME).unwrap();
    assert!(extension.critical);
    assert_eq!(built.cert.subject_alternative_name()?, Some(san));
    Ok(())
}

#[test]
fn distinguished_name_order_is_stable() -> Result<()> {
    let subject = DistinguishedName::builder()
        .common_name("a".to_string())
        .organization("b".to_string())
        .country("cc".to_string())
        .build();
    assert_eq!(subject.to_string(), "CN=a, O=b, C=cc");
    assert_eq!(subject.to_string(), subject.to_string());

    let built = CertificateBuilder::new()
        .with_distinguished_name(subject.clone())
        .build()?;
    assert_eq!(built.cert.subject()?, subject);
    assert_eq!(built.cert.subject()?.to_string(), "CN=a, O=b, C=cc");
    Ok(())
}

#[test]
fn serial_number_defaults_to_unix_seconds() -> Result<()> {
    let first = self_signed(AlgorithmOptions::default())?;
    std::thread::sleep(StdDuration::from_millis(1100));
    let second = self_signed(AlgorithmOptions::default())?;
    assert_ne!(first.cert.serial_number(), second.cert.serial_number());

    let zero = CertificateBuilder::new()
        .with_distinguished_name(DistinguishedName::from_common_name("zero"))
        .with_serial_number(vec![0u8])
        .build()?;
    assert_ne!(zero.cert.serial_number(), vec![0u8]);
    Ok(())
}

#[test]
fn explicit_serial_number_is_preserved() -> Result<()> {
    let serial = vec![0x8F, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
    let built = CertificateBuilder::new()
        .with_distinguished_name(DistinguishedName::from_common_name("serial"))
        .with_serial_number(serial.clone())
        .build()?;
    assert_eq!(built.cert.serial_number(), serial);
    Ok(())
}

#[test]
fn ninety_day_end_entity_self_verifies() -> Result<()> {
    let mut san = SubjectAlternativeName::default();
    san.add_dns_name("example.com");
    let options = CertificateBuilderOptions::builder()
        .basic_constraints(BasicConstraints::end_entity())
        .subject_alternative_name(san)
        .key_usage(KeyUsages::DigitalSignature)
        .lifetime(CertificateLifetime::for_days(90)?)
        .build();

    let built = build_certificate(&options)?;
    let cert = &built.cert;
    assert_eq!(cert.not_after() - cert.not_before(), Duration::days(90));
    cert.verify_signature(&cert.public_key()?)?;

    let basic_constraints = cert.basic_constraints()?.unwrap();
    assert!(!basic_constraints.is_ca);
    assert!(!basic_constraints.has_path_length);

    let key_usage = cert.extension(oid::ID_CE_KEY_USAGE).unwrap();
    assert!(key_usage.critical);
    Ok(())
}

#[test]
fn largest_path_length_reads_back() -> Result<()> {
    let built = CertificateBuilder::new()
        .with_distinguished_name(DistinguishedName::from_common_name("deep.ca"))
        .with_basic_constraints(BasicConstraints::ca_with_path_length(u8::MAX))
        .build()?;
    assert_eq!(
        built.cert.basic_constraints()?,
        Some(BasicConstraints::ca_with_path_length(u8::MAX))
    );
    Ok(())
}

#[test]
fn default_lifetime_is_ninety_days() -> Result<()> {
    let built = self_signed(AlgorithmOptions::default())?;
    assert_eq!(
        built.cert.not_after() - built.cert.not_before(),
        Duration::days(CertificateLifetime::DEFAULT_DAYS)
    );
    Ok(())
}

#[test]
fn extensions_follow_fixed_order() -> Result<()> {
    let ca = util::generate_ca_cert();
    let server = util::server_builder("order.myca.local")
        .with_basic_constraints(BasicConstraints::end_entity())
        .with_issuer(ca)
        .build()?;

    let oids: Vec<_> = server.cert.extensions().iter().map(|ext| ext.oid).collect();
    assert_eq!(
        oids,
        vec![
            oid::ID_CE_BASIC_CONSTRAINTS,
            oid::ID_CE_KEY_USAGE,
            oid::ID_CE_SUBJECT_ALT_NAME,
            oid::ID_CE_EXT_KEY_USAGE,
            oid::ID_CE_SUBJECT_KEY_IDENTIFIER,
            oid::ID_CE_AUTHORITY_KEY_IDENTIFIER,
        ]
    );
    assert_eq!(
        server.cert.extended_key_usage()?.unwrap().purposes,
        vec![KeyPurpose::ServerAuthentication]
    );
    Ok(())
}

#[test]
fn reused_key_pair_is_certified() -> Result<()> {
    let key = KeyPair::generate_ecdsa_p384();
    let built = CertificateBuilder::new()
        .with_distinguished_name(DistinguishedName::from_common_name("reuse"))
        .with_algorithm_options(AlgorithmOptions::ecdsa(384)?)
        .with_key_pair(key.clone())
        .build()?;
    assert_eq!(built.cert.public_key()?, key.public_key());
    Ok(())
}

#[test]
fn reused_key_pair_of_another_family_is_not_supported() -> Result<()> {
    let result = CertificateBuilder::new()
        .with_distinguished_name(DistinguishedName::from_common_name("reuse"))
        .with_algorithm_options(AlgorithmOptions::rsa(2048)?)
        .with_key_pair(KeyPair::generate_ecdsa_p256())
        .build();
    assert!(matches!(result, Err(CertSmithError::NotSupported(_))));
    Ok(())
}

#[test]
fn pkcs12_export_round_trips() -> Result<()> {
    let built = self_signed(AlgorithmOptions::default())?;
    let blob = built.to_pkcs12("changeit")?;

    let reopened = CertificateWithPrivateKey::from_pkcs12(&blob, "changeit")?;
    assert_eq!(reopened.cert, built.cert);
    assert_eq!(reopened.key.public_key(), built.key.public_key());

    assert!(matches!(
        CertificateWithPrivateKey::from_pkcs12(&blob, "wrong"),
        Err(CertSmithError::Pkcs12Error(_))
    ));
    Ok(())
}

#[test]
fn pkcs12_export_carries_issuer_chain() -> Result<()> {
    let ca = util::generate_ca_cert();
    let server = util::server_builder("pfx.myca.local")
        .with_issuer(ca.clone())
        .build()?;
    let blob = server.to_pkcs12_with_chain("changeit", std::slice::from_ref(&ca.cert))?;

    let (reopened, chain) = CertificateWithPrivateKey::from_pkcs12_with_chain(&blob, "changeit")?;
    assert_eq!(reopened.cert, server.cert);
    assert_eq!(reopened.key.public_key(), server.key.public_key());
    assert_eq!(chain, vec![ca.cert.clone()]);
    reopened.cert.verify_signature(&chain[0].public_key()?)?;

    // the plain reader still sees the end-entity certificate
    assert_eq!(CertificateWithPrivateKey::from_pkcs12(&blob, "changeit")?.cert, server.cert);
    Ok(())
}

#[test]
fn pem_round_trip() -> Result<()> {
    let built = self_signed(AlgorithmOptions::default())?;
    let pem = built.cert.to_pem()?;
    assert!(pem.starts_with("-----BEGIN CERTIFICATE-----"));
    assert_eq!(certsmith::cert::Certificate::from_pem(&pem)?, built.cert);

    let key = KeyPair::from_pkcs8_pem(&built.key_pem()?)?;
    assert_eq!(key.public_key(), built.key.public_key());
    Ok(())
}

#[test]
fn reset_discards_options() -> Result<()> {
    let mut builder = util::server_builder("reset.myca.local");
    builder.reset();
    assert!(matches!(
        builder.build(),
        Err(CertSmithError::InvalidState(_))
    ));

    let options = CertificateBuilderOptions::builder()
        .distinguished_name(DistinguishedName::from_common_name("again"))
        .build();
    let built = builder.reset_with_options(options).build()?;
    assert_eq!(built.cert.subject()?.common_name, "again");
    Ok(())
}

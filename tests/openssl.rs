mod util;

use std::net::{IpAddr, Ipv4Addr};

use certsmith::algorithm::{AlgorithmOptions, HashAlgorithm, RsaPadding};
use certsmith::builder::CertificateBuilder;
use certsmith::cert::CertificateWithPrivateKey;
use certsmith::cert::extensions::{BasicConstraints, KeyUsages};
use certsmith::cert::name::DistinguishedName;
use certsmith::cert::san::SubjectAlternativeName;
use der::Encode;
use openssl::nid::Nid;
use openssl::pkcs12::Pkcs12;
use openssl::x509::X509;
use regex::Regex;

fn to_openssl(built: &CertificateWithPrivateKey) -> X509 {
    X509::from_der(&built.cert.to_der().unwrap()).expect("Failed to parse DER")
}

fn self_signed(algorithm: AlgorithmOptions) -> CertificateWithPrivateKey {
    CertificateBuilder::new()
        .with_distinguished_name(DistinguishedName::from_common_name("crabs.crabs"))
        .with_algorithm_options(algorithm)
        .build()
        .unwrap()
}

#[test]
fn test_openssl_crate_validate_cert() {
    let ca_cert_with_key = util::generate_ca_cert();
    let server = util::server_builder("server.myca.local")
        .with_serial(1)
        .with_issuer(ca_cert_with_key.clone())
        .build()
        .unwrap();

    let x509 =
        X509::from_pem(server.cert.to_pem().unwrap().as_bytes()).expect("Failed to parse PEM");

    // Check subject
    let subject = x509
        .subject_name()
        .entries_by_nid(Nid::COMMONNAME)
        .next()
        .unwrap()
        .data()
        .as_utf8()
        .unwrap();
    assert_eq!(subject.to_string(), "server.myca.local", "Subject CN mismatch");

    // Check issuer
    let issuer = x509
        .issuer_name()
        .entries_by_nid(Nid::COMMONNAME)
        .next()
        .unwrap()
        .data()
        .as_utf8()
        .unwrap();
    assert_eq!(issuer.to_string(), "myca.local", "Issuer CN mismatch");

    assert_eq!(x509.version(), 2, "X509 version should be 3 (0-based index)");

    let serial = x509.serial_number().to_bn().unwrap().to_dec_str().unwrap();
    assert_eq!(serial.to_string(), "1", "Serial number should be 1");

    assert_eq!(x509.signature_algorithm().object().nid(), Nid::ECDSA_WITH_SHA256);

    let dns_names: Vec<String> = x509
        .subject_alt_names()
        .unwrap()
        .iter()
        .filter_map(|name| name.dnsname().map(str::to_string))
        .collect();
    assert_eq!(dns_names, vec!["server.myca.local".to_string()]);

    let ca_x509 = to_openssl(&ca_cert_with_key);
    assert!(x509.verify(&ca_x509.public_key().unwrap()).unwrap());
    assert!(!x509.verify(&x509.public_key().unwrap()).unwrap());
    assert_eq!(
        ca_x509.issued(&x509),
        openssl::x509::X509VerifyResult::OK,
        "CA should be recognised as the issuer"
    );
}

#[test]
fn test_openssl_reads_extensions() {
    let ca = util::generate_ca_cert();
    let server = util::server_builder("ext.myca.local")
        .with_basic_constraints(BasicConstraints::end_entity())
        .with_issuer(ca)
        .build()
        .unwrap();
    let text = String::from_utf8(to_openssl(&server).to_text().unwrap()).unwrap();

    let expect = |pattern: &str| {
        assert!(
            Regex::new(pattern).unwrap().is_match(&text),
            "{pattern} not found in:\n{text}"
        );
    };
    expect(r"X509v3 Basic Constraints:\s*\n\s*CA:FALSE");
    // DigitalSignature is written to the keyEncipherment bit
    expect(r"X509v3 Key Usage: critical\s*\n\s*Key Encipherment\s*\n");
    expect(r"X509v3 Subject Alternative Name: critical\s*\n\s*DNS:ext\.myca\.local");
    expect(r"X509v3 Extended Key Usage:\s*\n\s*TLS Web Server Authentication");
    expect(r"X509v3 Subject Key Identifier:\s*\n\s*([0-9A-F]{2}:){19}[0-9A-F]{2}");
    expect(r"X509v3 Authority Key Identifier:\s*\n\s*(keyid:)?([0-9A-F]{2}:){19}[0-9A-F]{2}");
}

#[test]
fn test_openssl_reads_every_san_kind() {
    let mut san = SubjectAlternativeName::default();
    san.add_dns_name("svc.myca.local")
        .add_email_address("ops@myca.local")
        .add_uri("https://svc.myca.local/")
        .add_ip_address(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 7)))
        .add_user_principal_name("svc@myca.local");
    let server = CertificateBuilder::new()
        .with_distinguished_name(DistinguishedName::from_common_name("svc.myca.local"))
        .with_subject_alternative_name(san)
        .with_issuer(util::generate_ca_cert())
        .build()
        .unwrap();

    let names = to_openssl(&server).subject_alt_names().unwrap();
    assert_eq!(names.len(), 5);
    assert_eq!(names.get(0).unwrap().dnsname(), Some("svc.myca.local"));
    assert_eq!(names.get(1).unwrap().email(), Some("ops@myca.local"));
    assert_eq!(names.get(2).unwrap().uri(), Some("https://svc.myca.local/"));
    assert_eq!(names.get(3).unwrap().ipaddress(), Some(&[10, 0, 0, 7][..]));
}

#[test]
fn test_openssl_ca_basic_constraints() {
    let ca = CertificateBuilder::new()
        .with_distinguished_name(DistinguishedName::from_common_name("pathlen.ca"))
        .with_basic_constraints(BasicConstraints::ca_with_path_length(2))
        .with_key_usage(KeyUsages::KeyCertSign)
        .build()
        .unwrap();
    let text = String::from_utf8(to_openssl(&ca).to_text().unwrap()).unwrap();
    assert!(Regex::new(r"CA:TRUE, pathlen:2").unwrap().is_match(&text));
}

#[test]
fn test_openssl_name_order() {
    let subject = DistinguishedName::builder()
        .common_name("crabs.crabs".to_string())
        .organization("Crab widgits SE".to_string())
        .country("SE".to_string())
        .build();
    let built = CertificateBuilder::new()
        .with_distinguished_name(subject)
        .build()
        .unwrap();
    let x509 = to_openssl(&built);
    let nids: Vec<Nid> = x509
        .subject_name()
        .entries()
        .map(|entry| entry.object().nid())
        .collect();
    assert_eq!(nids, vec![Nid::COUNTRYNAME, Nid::ORGANIZATIONNAME, Nid::COMMONNAME]);
}

#[test]
fn test_openssl_verifies_every_key_type() {
    for (algorithm, signature) in [
        (AlgorithmOptions::rsa(2048).unwrap(), Nid::SHA256WITHRSAENCRYPTION),
        (
            AlgorithmOptions::rsa_with(2048, HashAlgorithm::Sha512, RsaPadding::Pkcs1).unwrap(),
            Nid::SHA512WITHRSAENCRYPTION,
        ),
        (AlgorithmOptions::ecdsa(256).unwrap(), Nid::ECDSA_WITH_SHA256),
        (AlgorithmOptions::ecdsa(384).unwrap(), Nid::ECDSA_WITH_SHA384),
        (AlgorithmOptions::ecdsa(512).unwrap(), Nid::ECDSA_WITH_SHA512),
        (AlgorithmOptions::dsa(1024).unwrap(), Nid::DSA_WITH_SHA256),
    ] {
        let built = self_signed(algorithm);
        let x509 = to_openssl(&built);
        assert_eq!(x509.signature_algorithm().object().nid(), signature);
        assert!(
            x509.verify(&x509.public_key().unwrap()).unwrap(),
            "{algorithm:?} signature rejected by OpenSSL"
        );
    }
}

#[test]
fn test_openssl_verifies_rsa_pss() {
    let built = self_signed(
        AlgorithmOptions::rsa_with(2048, HashAlgorithm::Sha256, RsaPadding::Pss).unwrap(),
    );
    let x509 = to_openssl(&built);
    assert_eq!(x509.signature_algorithm().object().nid(), Nid::RSASSAPSS);
    assert!(x509.verify(&x509.public_key().unwrap()).unwrap());
}

#[test]
fn test_openssl_parses_pkcs12_export() {
    let ca = util::generate_ca_cert();
    let server = util::server_builder("p12.myca.local")
        .with_issuer(ca)
        .build()
        .unwrap();
    let blob = server.to_pkcs12("hunter2").unwrap();

    let parsed = Pkcs12::from_der(&blob).unwrap().parse2("hunter2").unwrap();
    let cert = parsed.cert.expect("PKCS#12 without certificate");
    assert_eq!(cert.to_der().unwrap(), server.cert.to_der().unwrap());

    let key = parsed.pkey.expect("PKCS#12 without private key");
    assert_eq!(
        key.public_key_to_der().unwrap(),
        server.cert.public_key_info().to_der().unwrap()
    );
}

#[test]
fn test_openssl_parses_pkcs12_chain() {
    let ca = util::generate_ca_cert();
    let server = util::server_builder("chain.myca.local")
        .with_issuer(ca.clone())
        .build()
        .unwrap();
    let blob = server
        .to_pkcs12_with_chain("hunter2", std::slice::from_ref(&ca.cert))
        .unwrap();

    let parsed = Pkcs12::from_der(&blob).unwrap().parse2("hunter2").unwrap();
    assert_eq!(
        parsed.cert.unwrap().to_der().unwrap(),
        server.cert.to_der().unwrap()
    );
    let chain = parsed.ca.expect("PKCS#12 without issuer certificates");
    assert_eq!(chain.len(), 1);
    assert_eq!(chain.get(0).unwrap().to_der().unwrap(), ca.cert.to_der().unwrap());
}

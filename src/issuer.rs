use der::asn1::BitString;
use der::{Decode, Encode};
use tracing::{debug, warn};
use x509_cert::certificate::CertificateInner;
use x509_cert::name::Name;
use x509_cert::spki::AlgorithmIdentifierOwned;

use crate::algorithm::{HashAlgorithm, RsaPadding};
use crate::cert::extensions::AuthorityKeyIdentifier;
use crate::cert::{Certificate, IssuerCertificate};
use crate::error::{CertSmithError, Result};
use crate::key::{KeyPair, PublicKey};
use crate::lifetime::CertificateLifetime;
use crate::oid;
use crate::signature;
use crate::tbs_certificate::TbsCertificate;

/// Represents an entity capable of issuing certificates.
///
/// This trait provides methods to retrieve issuer details and issue certificates.
pub trait Issuer {
    /// The name written into the issued certificate's issuer field.
    fn issuer_name(&self) -> Name;

    /// Returns the signing key of the issuer.
    ///
    /// Fails with `InvalidState` when the private key is not available.
    fn signing_key(&self) -> Result<&KeyPair>;

    /// The key issued certificates are verified against after signing.
    fn verifying_key(&self) -> Result<PublicKey> {
        Ok(self.signing_key()?.public_key())
    }

    /// The window issued certificates must stay inside, if any.
    fn lifetime(&self) -> Result<Option<CertificateLifetime>>;

    /// The Authority Key Identifier issued certificates carry, if any.
    fn authority_key_identifier(&self) -> Result<Option<AuthorityKeyIdentifier>>;

    /// Signs `tbs` and checks the result against [`Issuer::verifying_key`].
    ///
    /// `tbs.issuer` is expected to already hold [`Issuer::issuer_name`].
    /// Returns `VerificationFailed` instead of a certificate when the fresh
    /// signature does not verify.
    fn issue(
        &self,
        tbs: &TbsCertificate,
        hash: HashAlgorithm,
        padding: RsaPadding,
    ) -> Result<Certificate> {
        let generator = signature::for_key_pair(self.signing_key()?, hash, padding)?;
        let algorithm =
            AlgorithmIdentifierOwned::from_der(&generator.signature_algorithm_identifier()?)?;
        debug!(algorithm = %algorithm.oid, "signing certificate");

        let tbs_certificate = tbs.to_tbs_certificate_inner(algorithm.clone())?;
        let signature = generator.sign_data(&tbs_certificate.to_der()?)?;

        let cert = Certificate {
            inner: CertificateInner {
                tbs_certificate,
                signature_algorithm: algorithm,
                signature: BitString::from_bytes(&signature)?,
            },
        };
        cert.verify_signature(&self.verifying_key()?)?;
        Ok(cert)
    }
}

/// Issuer for self-signed certificates: the subject signs itself.
pub struct SelfIssuer<'a> {
    pub name: Name,
    pub key: &'a KeyPair,
}

impl Issuer for SelfIssuer<'_> {
    fn issuer_name(&self) -> Name {
        self.name.clone()
    }

    fn signing_key(&self) -> Result<&KeyPair> {
        Ok(self.key)
    }

    fn lifetime(&self) -> Result<Option<CertificateLifetime>> {
        Ok(None)
    }

    fn authority_key_identifier(&self) -> Result<Option<AuthorityKeyIdentifier>> {
        Ok(None)
    }
}

impl Issuer for IssuerCertificate {
    fn issuer_name(&self) -> Name {
        // The name of the issuer is the subject of the certificate
        self.cert.subject_name().clone()
    }

    fn signing_key(&self) -> Result<&KeyPair> {
        self.key.as_ref().ok_or_else(|| {
            CertSmithError::InvalidState("issuer certificate is missing its private key".into())
        })
    }

    fn verifying_key(&self) -> Result<PublicKey> {
        self.cert.public_key()
    }

    fn lifetime(&self) -> Result<Option<CertificateLifetime>> {
        self.cert.lifetime().map(Some)
    }

    fn authority_key_identifier(&self) -> Result<Option<AuthorityKeyIdentifier>> {
        let aki = match self.cert.extension(oid::ID_CE_SUBJECT_KEY_IDENTIFIER) {
            Some(ski) => AuthorityKeyIdentifier::from_issuer_subject_key_identifier(&ski.value)?,
            None => {
                warn!("issuer has no subject key identifier, deriving one from its public key");
                AuthorityKeyIdentifier::from_public_key(self.cert.public_key_info())
            }
        };
        Ok(Some(aki))
    }
}

//! PKCS#12 packaging of a certificate together with its private key.
//!
//! The builder seals every finished certificate into a container under a
//! throwaway passphrase and immediately reopens it, so the returned pair is
//! exactly what any PKCS#12 consumer would read back.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use p12_keystore::{KeyStore, KeyStoreEntry, PrivateKeyChain};
use rand_core::{OsRng, RngCore};
use tracing::trace;
use zeroize::Zeroizing;

use crate::cert::extensions::key_identifier;
use crate::cert::{Certificate, CertificateWithPrivateKey};
use crate::error::{CertSmithError, Result};
use crate::key::KeyPair;

const PASSPHRASE_ENTROPY: usize = 24;

/// Writes `cert` and `key` into a password-protected PKCS#12 blob.
///
/// The entry alias is the subject name and the local key id is the
/// certificate's subject key identifier.
pub fn seal(cert: &Certificate, key: &KeyPair, password: &str) -> Result<Vec<u8>> {
    seal_with_chain(cert, key, &[], password)
}

/// Like [`seal`], and also stores `issuers` after the end-entity
/// certificate. Issuer certificates go in without their private keys.
pub fn seal_with_chain(
    cert: &Certificate,
    key: &KeyPair,
    issuers: &[Certificate],
    password: &str,
) -> Result<Vec<u8>> {
    let chain = std::iter::once(cert)
        .chain(issuers)
        .map(to_keystore_certificate)
        .collect::<Result<Vec<_>>>()?;

    let local_key_id = match cert.subject_key_identifier()? {
        Some(ski) => ski,
        None => key_identifier(cert.public_key_info()),
    };
    let key_der = key.to_pkcs8_der()?;
    let chain = PrivateKeyChain::new(key_der.as_bytes(), local_key_id, chain);

    let alias = cert.subject()?.to_string();
    let mut keystore = KeyStore::new();
    keystore.add_entry(&alias, KeyStoreEntry::PrivateKeyChain(chain));
    trace!(%alias, issuers = issuers.len(), "sealing PKCS#12 container");

    keystore
        .writer(password)
        .write()
        .map_err(|e| CertSmithError::Pkcs12Error(e.to_string()))
}

fn to_keystore_certificate(cert: &Certificate) -> Result<p12_keystore::Certificate> {
    p12_keystore::Certificate::from_der(&cert.to_der()?)
        .map_err(|e| CertSmithError::Pkcs12Error(format!("certificate rejected: {e}")))
}

/// Reads the first private key entry and its end-entity certificate out of
/// a PKCS#12 blob.
pub fn open(blob: &[u8], password: &str) -> Result<CertificateWithPrivateKey> {
    open_with_chain(blob, password).map(|(built, _)| built)
}

/// Like [`open`], and also returns the issuer certificates stored with the
/// key, nearest issuer first.
///
/// Issuers are linked by name, so certificates that do not chain up from
/// the end-entity certificate are left out.
pub fn open_with_chain(
    blob: &[u8],
    password: &str,
) -> Result<(CertificateWithPrivateKey, Vec<Certificate>)> {
    let keystore = KeyStore::from_pkcs12(blob, password)
        .map_err(|e| CertSmithError::Pkcs12Error(e.to_string()))?;

    let (_, chain) = keystore
        .private_key_chain()
        .ok_or_else(|| CertSmithError::Pkcs12Error("no private key entry".to_string()))?;

    let (leaf, issuers) = chain
        .chain()
        .split_first()
        .ok_or_else(|| CertSmithError::Pkcs12Error("private key has no certificate".to_string()))?;

    let cert = Certificate::from_der(leaf.as_der())?;
    let key = KeyPair::from_pkcs8_der(chain.key())?;
    let issuers = issuers
        .iter()
        .map(|issuer| Certificate::from_der(issuer.as_der()))
        .collect::<Result<Vec<_>>>()?;
    Ok((CertificateWithPrivateKey { cert, key }, issuers))
}

/// A random passphrase for transient containers.
pub(crate) fn ephemeral_passphrase() -> Zeroizing<String> {
    let mut entropy = Zeroizing::new([0u8; PASSPHRASE_ENTROPY]);
    OsRng.fill_bytes(&mut entropy[..]);
    Zeroizing::new(STANDARD.encode(&entropy[..]))
}

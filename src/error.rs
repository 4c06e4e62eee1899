//! use certsmith::error::CertSmithError;

use thiserror::Error;

/// Represents errors that can occur while building certificates.
///
/// Every failure is raised at the point of detection; no partially built
/// certificate is ever returned alongside an error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CertSmithError {
    /// A malformed or out-of-range option value.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An algorithm, key type or key/hash pairing that is not supported.
    #[error("Not supported: {0}")]
    NotSupported(String),

    /// The builder or issuer is missing something required to proceed.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The freshly signed certificate did not verify against the issuer key.
    #[error("Verification failed: {0}")]
    VerificationFailed(String),

    /// Error during data encoding.
    #[error("Failed to encode data: {0}")]
    EncodingError(String),

    /// Error during data decoding.
    #[error("Failed to decode data: {0}")]
    DecodingError(String),

    /// Error during key generation.
    #[error("Key generation error: {0}")]
    KeyGenerationError(String),

    /// Error while writing or reading a PKCS#12 container.
    #[error("PKCS#12 error: {0}")]
    Pkcs12Error(String),
}

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, CertSmithError>;

impl From<der::Error> for CertSmithError {
    /// Converts a `der::Error` into a `CertSmithError`.
    fn from(err: der::Error) -> Self {
        CertSmithError::EncodingError(err.to_string())
    }
}

impl From<spki::Error> for CertSmithError {
    fn from(err: spki::Error) -> Self {
        CertSmithError::EncodingError(err.to_string())
    }
}

impl From<pkcs8::Error> for CertSmithError {
    fn from(err: pkcs8::Error) -> Self {
        CertSmithError::DecodingError(err.to_string())
    }
}

impl From<rsa::Error> for CertSmithError {
    fn from(err: rsa::Error) -> Self {
        CertSmithError::KeyGenerationError(err.to_string())
    }
}

impl From<ecdsa::signature::Error> for CertSmithError {
    fn from(err: ecdsa::signature::Error) -> Self {
        CertSmithError::EncodingError(err.to_string())
    }
}

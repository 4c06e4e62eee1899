use crate::error::{CertSmithError, Result};

/// Convert DER‑encoded data into a PEM‑encoded string with the provided label.
pub fn der_to_pem(der: &[u8], label: &str) -> String {
    let pem = pem::Pem::new(label, der);
    pem::encode_config(&pem, pem::EncodeConfig::new())
}

/// Convert a PEM‑encoded string to DER‑encoded bytes.
pub fn pem_to_der(pem_str: &str) -> Result<Vec<u8>> {
    let pem = pem::parse(pem_str).map_err(|e| CertSmithError::DecodingError(e.to_string()))?;
    Ok(pem.into_contents())
}

/// Like [`pem_to_der`], but rejects a block whose label is not `label`.
pub fn pem_to_der_labelled(pem_str: &str, label: &str) -> Result<Vec<u8>> {
    let pem = pem::parse(pem_str).map_err(|e| CertSmithError::DecodingError(e.to_string()))?;
    if pem.tag() != label {
        return Err(CertSmithError::DecodingError(format!(
            "expected a {label} PEM block, found {}",
            pem.tag()
        )));
    }
    Ok(pem.into_contents())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pem_label_is_checked() {
        let pem = der_to_pem(&[0x30, 0x00], "CERTIFICATE");
        assert!(pem.starts_with("-----BEGIN CERTIFICATE-----"));
        assert_eq!(pem_to_der(&pem).unwrap(), vec![0x30, 0x00]);
        assert_eq!(
            pem_to_der_labelled(&pem, "CERTIFICATE").unwrap(),
            vec![0x30, 0x00]
        );
        assert!(matches!(
            pem_to_der_labelled(&pem, "PRIVATE KEY"),
            Err(CertSmithError::DecodingError(_))
        ));
    }

    #[test]
    fn test_garbage_is_a_decoding_error() {
        assert!(matches!(
            pem_to_der("not pem"),
            Err(CertSmithError::DecodingError(_))
        ));
    }
}

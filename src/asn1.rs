//! Small DER building blocks shared by the signature encoders, the Basic
//! Constraints extension, serial numbers and the DSA public key.
//!
//! Everything structural (names, validity, extensions container) goes
//! through the `der` / `x509-cert` types; these helpers only cover the
//! places where the exact bytes are assembled by hand.

/// DER tag for INTEGER.
pub const TAG_INTEGER: u8 = 0x02;
/// DER tag for BIT STRING.
pub const TAG_BIT_STRING: u8 = 0x03;
/// DER tag for OCTET STRING.
pub const TAG_OCTET_STRING: u8 = 0x04;
/// DER tag for BOOLEAN.
pub const TAG_BOOLEAN: u8 = 0x01;
/// DER tag for a constructed SEQUENCE.
pub const TAG_SEQUENCE: u8 = 0x30;

/// Encodes a DER definite length.
///
/// Short form below 0x80, otherwise long form with the minimal number of
/// length octets.
pub fn encode_length(length: usize) -> Vec<u8> {
    if length < 0x80 {
        return vec![length as u8];
    }

    let bytes = length.to_be_bytes();
    let first = bytes
        .iter()
        .position(|b| *b != 0)
        .unwrap_or(bytes.len() - 1);
    let significant = &bytes[first..];

    let mut out = Vec::with_capacity(significant.len() + 1);
    out.push(0x80 | significant.len() as u8);
    out.extend_from_slice(significant);
    out
}

/// Wraps `contents` in a tag-length-value triple.
pub fn encode_tlv(tag: u8, contents: &[u8]) -> Vec<u8> {
    let length = encode_length(contents.len());
    let mut out = Vec::with_capacity(1 + length.len() + contents.len());
    out.push(tag);
    out.extend_from_slice(&length);
    out.extend_from_slice(contents);
    out
}

/// Returns the content octets of a DER INTEGER holding the unsigned
/// big-endian magnitude `magnitude`.
///
/// Leading zero octets are stripped and a single zero octet is prepended
/// when the high bit of the first remaining octet is set. An empty or
/// all-zero input yields the single octet `00`.
pub fn unsigned_integer_contents(magnitude: &[u8]) -> Vec<u8> {
    let first = magnitude.iter().position(|b| *b != 0);
    let trimmed = match first {
        Some(index) => &magnitude[index..],
        None => return vec![0x00],
    };

    let mut out = Vec::with_capacity(trimmed.len() + 1);
    if trimmed[0] & 0x80 != 0 {
        out.push(0x00);
    }
    out.extend_from_slice(trimmed);
    out
}

/// Encodes an unsigned big-endian magnitude as a complete DER INTEGER.
pub fn encode_unsigned_integer(magnitude: &[u8]) -> Vec<u8> {
    encode_tlv(TAG_INTEGER, &unsigned_integer_contents(magnitude))
}

/// Encodes the concatenation of already-encoded elements as a SEQUENCE.
pub fn encode_sequence(elements: &[&[u8]]) -> Vec<u8> {
    let contents: Vec<u8> = elements.iter().flat_map(|e| e.iter().copied()).collect();
    encode_tlv(TAG_SEQUENCE, &contents)
}

/// Encodes a DSA or ECDSA signature as `SEQUENCE { INTEGER r, INTEGER s }`.
///
/// `r` and `s` are unsigned big-endian values, e.g. the two halves of an
/// IEEE P1363 signature.
pub fn encode_dss_signature(r: &[u8], s: &[u8]) -> Vec<u8> {
    let r = encode_unsigned_integer(r);
    let s = encode_unsigned_integer(s);
    encode_sequence(&[&r, &s])
}

/// Splits a fixed-width `r || s` signature into halves and DER-encodes it.
pub fn encode_p1363_signature(signature: &[u8]) -> Option<Vec<u8>> {
    if signature.is_empty() || signature.len() % 2 != 0 {
        return None;
    }
    let (r, s) = signature.split_at(signature.len() / 2);
    Some(encode_dss_signature(r, s))
}

/// Strips leading zero octets from a big-endian integer, keeping at least
/// one octet.
pub fn trim_leading_zeros(bytes: &[u8]) -> &[u8] {
    match bytes.iter().position(|b| *b != 0) {
        Some(index) => &bytes[index..],
        None if bytes.is_empty() => bytes,
        None => &bytes[bytes.len() - 1..],
    }
}

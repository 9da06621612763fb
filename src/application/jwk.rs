//! JSON Web Key sets and their PEM rendering.
//!
//! Only RSA keys are rendered; they come out as a `PUBLIC KEY`
//! (SubjectPublicKeyInfo) block with 64-column lines and no trailing newline.

use base64::{
    Engine, alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig, general_purpose::STANDARD},
};
use serde::Deserialize;

use crate::app_error::{AppError, AppResult};

/// Base64url that tolerates padded and unpadded key components.
const BASE64_URL: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// OID 1.2.840.113549.1.1.1 (rsaEncryption).
const RSA_ENCRYPTION_OID: [u8; 11] = [
    0x06, 0x09, 0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x01,
];
const DER_NULL: [u8; 2] = [0x05, 0x00];

#[derive(Debug, Clone, Deserialize)]
pub struct Jwk {
    pub kty: String,
    #[serde(default)]
    pub kid: Option<String>,
    #[serde(default)]
    pub n: Option<String>,
    #[serde(default)]
    pub e: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JwkSet {
    #[serde(default)]
    pub keys: Vec<Jwk>,
}

impl JwkSet {
    /// PEM for the RSA key published under `kid`; `None` when there is none.
    pub fn pem_for_kid(&self, kid: &str) -> AppResult<Option<String>> {
        self.keys
            .iter()
            .find(|key| key.kty == "RSA" && key.kid.as_deref() == Some(kid))
            .map(Jwk::to_pem)
            .transpose()
    }
}

impl Jwk {
    pub fn to_pem(&self) -> AppResult<String> {
        let n = self.component("n", self.n.as_deref())?;
        let e = self.component("e", self.e.as_deref())?;

        let encoded = STANDARD.encode(rsa_public_key_der(&n, &e));
        let lines: Vec<&str> = encoded
            .as_bytes()
            .chunks(64)
            .filter_map(|line| std::str::from_utf8(line).ok())
            .collect();

        Ok(format!(
            "-----BEGIN PUBLIC KEY-----\n{}\n-----END PUBLIC KEY-----",
            lines.join("\n")
        ))
    }

    fn component(&self, name: &str, value: Option<&str>) -> AppResult<Vec<u8>> {
        let kid = self.kid.as_deref().unwrap_or_default();
        let value =
            value.ok_or_else(|| AppError::Upstream(format!("JWK {kid} has no {name} component")))?;
        BASE64_URL
            .decode(value)
            .map_err(|e| AppError::Upstream(format!("JWK {kid} has a malformed {name}: {e}")))
    }
}

// ============================================================================
// DER encoding
// ============================================================================

// SEQUENCE { SEQUENCE { rsaEncryption, NULL }, BIT STRING { SEQUENCE { n, e } } }
fn rsa_public_key_der(n: &[u8], e: &[u8]) -> Vec<u8> {
    let rsa_key = der_sequence(&[der_integer(n).as_slice(), der_integer(e).as_slice()]);

    let mut bit_string = Vec::with_capacity(rsa_key.len() + 1);
    bit_string.push(0x00); // no unused bits
    bit_string.extend_from_slice(&rsa_key);

    let algorithm = der_sequence(&[&RSA_ENCRYPTION_OID[..], &DER_NULL[..]]);
    der_sequence(&[algorithm.as_slice(), der_tlv(0x03, &bit_string).as_slice()])
}

fn der_tlv(tag: u8, content: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    let len = content.len();
    if len < 0x80 {
        out.push(len as u8);
    } else {
        let bytes = len.to_be_bytes();
        let skip = bytes.iter().take_while(|b| **b == 0).count();
        out.push(0x80 | (bytes.len() - skip) as u8);
        out.extend_from_slice(&bytes[skip..]);
    }
    out.extend_from_slice(content);
    out
}

/// Unsigned big-endian integer: leading zeros dropped, one added back when
/// the high bit is set.
fn der_integer(value: &[u8]) -> Vec<u8> {
    let start = value.iter().position(|b| *b != 0).unwrap_or(value.len());
    let digits = &value[start..];

    let mut content = Vec::with_capacity(digits.len() + 1);
    if digits.first().is_none_or(|b| b & 0x80 != 0) {
        content.push(0x00);
    }
    content.extend_from_slice(digits);
    der_tlv(0x02, &content)
}

fn der_sequence(items: &[&[u8]]) -> Vec<u8> {
    der_tlv(0x30, &items.concat())
}

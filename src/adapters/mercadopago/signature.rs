//! Mercado Pago webhook signature verification.
//!
//! The `x-signature` header looks like `ts=1704908010,v1=618c85...`. The
//! signed manifest is
//!
//! ```text
//! id:{data.id};request-id:{x-request-id};ts:{ts};
//! ```
//!
//! and `v1` is its hex HMAC-SHA256 under the webhook secret. The
//! `request-id` segment is omitted when the header is absent.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("missing x-signature header")]
    MissingHeader,

    #[error("malformed x-signature header")]
    Malformed,

    #[error("webhook secret is unusable")]
    InvalidSecret,

    #[error("signature mismatch")]
    Mismatch,
}

/// Parsed `x-signature` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    pub ts: String,
    pub v1: Vec<u8>,
}

impl SignatureHeader {
    pub fn parse(header: &str) -> Result<Self, SignatureError> {
        if header.trim().is_empty() {
            return Err(SignatureError::MissingHeader);
        }

        let mut ts = None;
        let mut v1 = None;
        for part in header.split(',') {
            let Some((key, value)) = part.split_once('=') else {
                continue;
            };
            match key.trim() {
                "ts" => ts = Some(value.trim().to_string()),
                "v1" => {
                    v1 = Some(hex::decode(value.trim()).map_err(|_| SignatureError::Malformed)?)
                }
                _ => {}
            }
        }

        match (ts, v1) {
            (Some(ts), Some(v1)) if !ts.is_empty() => Ok(Self { ts, v1 }),
            _ => Err(SignatureError::Malformed),
        }
    }
}

pub struct WebhookVerifier {
    secret: SecretString,
}

impl WebhookVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: SecretString::new(secret.into()),
        }
    }

    /// Check `header` against the manifest built from the notification's
    /// data id and request id.
    pub fn verify(
        &self,
        header: Option<&str>,
        request_id: Option<&str>,
        data_id: &str,
    ) -> Result<(), SignatureError> {
        let header = SignatureHeader::parse(header.ok_or(SignatureError::MissingHeader)?)?;
        let manifest = manifest(data_id, request_id, &header.ts);

        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| SignatureError::InvalidSecret)?;
        mac.update(manifest.as_bytes());
        let expected = mac.finalize().into_bytes();

        if expected.as_slice().ct_eq(&header.v1).unwrap_u8() != 1 {
            tracing::warn!(data_id, "Invalid Mercado Pago webhook signature");
            return Err(SignatureError::Mismatch);
        }
        Ok(())
    }
}

/// Alphanumeric ids are signed lowercased.
fn manifest(data_id: &str, request_id: Option<&str>, ts: &str) -> String {
    let mut out = format!("id:{};", data_id.to_lowercase());
    if let Some(request_id) = request_id.filter(|r| !r.is_empty()) {
        out.push_str(&format!("request-id:{};", request_id));
    }
    out.push_str(&format!("ts:{};", ts));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &str, data_id: &str, request_id: Option<&str>, ts: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(manifest(data_id, request_id, ts).as_bytes());
        format!("ts={},v1={}", ts, hex::encode(mac.finalize().into_bytes()))
    }

    #[test]
    fn manifest_layout() {
        assert_eq!(
            manifest("123", Some("req-1"), "1704908010"),
            "id:123;request-id:req-1;ts:1704908010;"
        );
        assert_eq!(manifest("ABC", None, "1"), "id:abc;ts:1;");
    }

    #[test]
    fn valid_signature_passes() {
        let verifier = WebhookVerifier::new("whsec");
        let header = sign("whsec", "123", Some("req-1"), "1704908010");
        assert_eq!(verifier.verify(Some(&header), Some("req-1"), "123"), Ok(()));
    }

    #[test]
    fn wrong_secret_fails() {
        let verifier = WebhookVerifier::new("whsec");
        let header = sign("other", "123", Some("req-1"), "1704908010");
        assert_eq!(
            verifier.verify(Some(&header), Some("req-1"), "123"),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn tampered_data_id_fails() {
        let verifier = WebhookVerifier::new("whsec");
        let header = sign("whsec", "123", None, "1704908010");
        assert_eq!(
            verifier.verify(Some(&header), None, "124"),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn missing_and_malformed_headers() {
        let verifier = WebhookVerifier::new("whsec");
        assert_eq!(
            verifier.verify(None, None, "1"),
            Err(SignatureError::MissingHeader)
        );
        assert_eq!(
            SignatureHeader::parse("ts=1"),
            Err(SignatureError::Malformed)
        );
        assert_eq!(
            SignatureHeader::parse("ts=1,v1=zz"),
            Err(SignatureError::Malformed)
        );
    }
}

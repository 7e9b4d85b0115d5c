//! Ad-platform conversions port.
//!
//! Browser events are relayed server-side with hashed contact details.
//! Hashing happens when the event is built so raw PII never reaches an
//! adapter.

use async_trait::async_trait;
use serde::Serialize;
use sha2::{Digest, Sha256};

#[async_trait]
pub trait ConversionsApi: Send + Sync {
    fn is_enabled(&self) -> bool;

    async fn send(&self, event: &ConversionEvent) -> Result<(), ConversionError>;
}

/// Unhashed contact details as posted by the browser.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawUserData {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Matching keys in the shape the Graph API expects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HashedUserData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_ip_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_user_agent: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub em: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ph: Vec<String>,
    #[serde(rename = "fn", skip_serializing_if = "Vec::is_empty")]
    pub first_name: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ln: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fbp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fbc: Option<String>,
}

impl HashedUserData {
    pub fn build(
        raw: &RawUserData,
        client_ip: Option<&str>,
        user_agent: Option<&str>,
        cookies: Option<&str>,
    ) -> Self {
        let phone_digits = raw
            .phone
            .as_deref()
            .map(|p| p.chars().filter(|c| c.is_ascii_digit()).collect::<String>());

        Self {
            client_ip_address: client_ip
                .map(str::trim)
                .filter(|ip| !ip.is_empty())
                .map(|ip| if ip == "::1" { "127.0.0.1".to_string() } else { ip.to_string() }),
            client_user_agent: user_agent
                .filter(|ua| !ua.is_empty())
                .map(str::to_string),
            em: hashed(raw.email.as_deref()),
            ph: hashed(phone_digits.as_deref()),
            first_name: hashed(raw.first_name.as_deref()),
            ln: hashed(raw.last_name.as_deref()),
            fbp: cookies.and_then(|c| cookie_value(c, &["_fbp", "fbp"])),
            fbc: cookies.and_then(|c| cookie_value(c, &["_fbc", "fbc"])),
        }
    }
}

/// SHA-256 hex of the trimmed, lowercased value.
pub fn hash_pii(value: &str) -> String {
    let normalized = value.trim().to_lowercase();
    hex::encode(Sha256::digest(normalized.as_bytes()))
}

fn hashed(value: Option<&str>) -> Vec<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| vec![hash_pii(v)])
        .unwrap_or_default()
}

fn cookie_value(cookies: &str, names: &[&str]) -> Option<String> {
    cookies
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| names.contains(&name.trim()))
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CustomData {
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionEvent {
    pub event_name: String,
    pub event_time: i64,
    /// Shared with the browser pixel for deduplication.
    pub event_id: String,
    pub action_source: &'static str,
    pub event_source_url: String,
    pub user_data: HashedUserData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_data: Option<CustomData>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConversionError {
    #[error("conversions API not configured")]
    NotConfigured,

    #[error("network error: {0}")]
    Network(String),

    #[error("conversions API rejected event ({status}): {message}")]
    Rejected { status: u16, message: String },
}

//! Facebook Conversions API configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct ConversionsConfig {
    pub pixel_id: Option<String>,

    pub access_token: Option<String>,

    /// Routes events to the Events Manager test tab when set
    pub test_event_code: Option<String>,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl ConversionsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Both the pixel and the token are needed before anything is forwarded
    pub fn is_configured(&self) -> bool {
        let present = |v: &Option<String>| v.as_ref().is_some_and(|s| !s.is_empty());
        present(&self.pixel_id) && present(&self.access_token)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.api_base_url.starts_with("https://") && !self.api_base_url.starts_with("http://") {
            return Err(ValidationError::InvalidUrl("CONVERSIONS__API_BASE_URL"));
        }
        Ok(())
    }
}

impl Default for ConversionsConfig {
    fn default() -> Self {
        Self {
            pixel_id: None,
            access_token: None,
            test_event_code: None,
            api_base_url: default_api_base_url(),
            api_version: default_api_version(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_api_base_url() -> String {
    "https://graph.facebook.com".to_string()
}

fn default_api_version() -> String {
    "v18.0".to_string()
}

fn default_timeout() -> u64 {
    10
}

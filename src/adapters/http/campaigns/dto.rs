//! HTTP DTOs for campaign endpoints.

use serde::{Deserialize, Serialize};

use crate::application::handlers::campaigns::GenerateMessageDraftResult;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiGenerateRequest {
    #[serde(default)]
    pub license_key: String,
    #[serde(default)]
    pub prompt: String,
    /// `friendly`, `professional`, `casual` or `formal`.
    #[serde(default)]
    pub tone: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AiGenerateResponse {
    pub generated_text: String,
    pub usage_today: u32,
    pub daily_limit: u32,
    pub remaining_today: u32,
}

impl From<GenerateMessageDraftResult> for AiGenerateResponse {
    fn from(result: GenerateMessageDraftResult) -> Self {
        Self {
            generated_text: result.generated_text,
            usage_today: result.usage_today,
            daily_limit: result.daily_limit,
            remaining_today: result.remaining_today,
        }
    }
}

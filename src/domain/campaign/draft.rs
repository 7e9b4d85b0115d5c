//! AI message drafting inputs.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::ValidationError;

/// Voice of the drafted WhatsApp message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    Friendly,
    Professional,
    Casual,
    Formal,
}

impl Tone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Friendly => "friendly",
            Tone::Professional => "professional",
            Tone::Casual => "casual",
            Tone::Formal => "formal",
        }
    }

    pub fn parse(raw: &str) -> Option<Tone> {
        match raw.trim().to_lowercase().as_str() {
            "friendly" => Some(Tone::Friendly),
            "professional" => Some(Tone::Professional),
            "casual" => Some(Tone::Casual),
            "formal" => Some(Tone::Formal),
            _ => None,
        }
    }

    /// Portuguese description used inside the system prompt.
    pub fn description(&self) -> &'static str {
        match self {
            Tone::Friendly => "amigável e acolhedor",
            Tone::Professional => "profissional e respeitoso",
            Tone::Casual => "descontraído e informal",
            Tone::Formal => "formal e educado",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the clinic wants the message to say.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftPrompt(String);

impl DraftPrompt {
    pub const MIN_CHARS: usize = 10;
    pub const MAX_CHARS: usize = 500;

    pub fn new(raw: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        let len = trimmed.chars().count();
        if len == 0 {
            return Err(ValidationError::empty_field("prompt"));
        }
        if !(Self::MIN_CHARS..=Self::MAX_CHARS).contains(&len) {
            return Err(ValidationError::out_of_range(
                "prompt",
                Self::MIN_CHARS as i64,
                Self::MAX_CHARS as i64,
                len as i64,
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A complete drafting request for the language model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftRequest {
    pub prompt: DraftPrompt,
    pub tone: Tone,
}

impl DraftRequest {
    pub fn new(prompt: DraftPrompt, tone: Tone) -> Self {
        Self { prompt, tone }
    }

    pub fn system_prompt(&self) -> String {
        format!(
            "Você é um assistente especializado em criar mensagens de WhatsApp para clínicas odontológicas brasileiras.

Diretrizes:
- Tom: {}
- Tamanho: máximo 150 palavras
- Formato: WhatsApp (usar emojis apropriados 😊 🦷 ✨)
- Incluir placeholder {{nome}} para personalização
- Incluir call-to-action claro
- Linguagem: Português brasileiro
- Objetivo: reativar pacientes inativos ou promover serviços
- Evitar ser invasivo ou insistente",
            self.tone.description()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_length_bounds() {
        assert!(DraftPrompt::new("curto").is_err());
        assert!(DraftPrompt::new("   ").is_err());
        assert!(DraftPrompt::new("x".repeat(501)).is_err());
        assert!(DraftPrompt::new("Lembrar pacientes da limpeza semestral").is_ok());
    }

    #[test]
    fn prompt_counts_characters_not_bytes() {
        // 10 characters, more than 10 bytes
        assert!(DraftPrompt::new("ãããããããããã").is_ok());
    }

    #[test]
    fn tone_defaults_to_friendly() {
        assert_eq!(Tone::default(), Tone::Friendly);
        assert_eq!(Tone::parse("FORMAL"), Some(Tone::Formal));
        assert_eq!(Tone::parse("angry"), None);
    }

    #[test]
    fn system_prompt_includes_tone_and_placeholder() {
        let request = DraftRequest::new(
            DraftPrompt::new("Promoção de clareamento em março").unwrap(),
            Tone::Casual,
        );
        let prompt = request.system_prompt();
        assert!(prompt.contains("Tom: descontraído e informal"));
        assert!(prompt.contains("{nome}"));
    }
}

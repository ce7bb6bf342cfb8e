//! Language model trait.

use async_trait::async_trait;

use crate::error::Result;

/// Sampling parameters for one completion call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionParams {
    /// Sampling temperature.
    pub temperature: f32,

    /// Completion token cap.
    pub max_tokens: u32,

    /// Request a JSON object response from the provider.
    pub json_response: bool,
}

impl CompletionParams {
    /// Query expansion: creative, short output.
    pub fn expansion() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 400,
            json_response: true,
        }
    }

    /// Evidence synthesis: deterministic, long output.
    pub fn synthesis() -> Self {
        Self {
            temperature: 0.1,
            max_tokens: 4_000,
            json_response: true,
        }
    }

    /// Flat record extraction: deterministic, longest output.
    pub fn extraction() -> Self {
        Self {
            temperature: 0.1,
            max_tokens: 6_000,
            json_response: true,
        }
    }
}

/// Language model trait for the generation steps.
///
/// Implementations wrap a specific provider (OpenAI, Anthropic, etc.)
/// and return the raw completion text; callers own parsing and
/// validation.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Run one chat completion with a system and a user message.
    async fn complete(
        &self,
        system: &str,
        user: &str,
        params: CompletionParams,
    ) -> Result<String>;
}

use anyhow::Result;

use super::{
    base::Provider, configs::ProviderConfig, gemini::GeminiProvider, openai::OpenAiProvider,
};
use crate::models::tool::Tool;

/// Construct a provider with the tool catalog bound to its dialect.
///
/// Selection happens once, here; nothing downstream re-checks which dialect
/// is in play.
pub fn get_provider(config: ProviderConfig, tools: &[Tool]) -> Result<Box<dyn Provider + Send>> {
    match config {
        ProviderConfig::Gemini(gemini_config) => {
            Ok(Box::new(GeminiProvider::new(gemini_config, tools)?))
        }
        ProviderConfig::OpenAi(openai_config) => {
            Ok(Box::new(OpenAiProvider::new(openai_config, tools)?))
        }
    }
}

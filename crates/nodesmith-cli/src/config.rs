//! Environment-driven configuration.
//!
//! Credentials come from the environment (or a `.env` file loaded before
//! parsing); a missing credential for the selected provider is fatal at
//! startup, not at first use.

use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Result};
use nodesmith::providers::configs::{
    GeminiProviderConfig, OpenAiProviderConfig, ProviderConfig, GEMINI_DEFAULT_HOST,
    OPENAI_DEFAULT_HOST,
};

const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";

pub struct Settings {
    pub provider: ProviderConfig,
    pub blender_path: String,
    pub server_script: String,
    pub chroma_url: String,
    pub chroma_collection: String,
    pub output_dir: PathBuf,
}

impl Settings {
    pub fn from_env(provider_override: Option<&str>, model_override: Option<&str>) -> Result<Self> {
        let provider_name = provider_override
            .map(str::to_string)
            .or_else(|| env::var("LLM_PROVIDER").ok())
            .unwrap_or_else(|| "gemini".to_string());

        let provider = match provider_name.to_lowercase().as_str() {
            "gemini" => ProviderConfig::Gemini(GeminiProviderConfig {
                host: env::var("GEMINI_HOST").unwrap_or_else(|_| GEMINI_DEFAULT_HOST.to_string()),
                api_key: env::var("GEMINI_API_KEY")
                    .map_err(|_| anyhow!("GEMINI_API_KEY not found"))?,
                model: model_override
                    .map(str::to_string)
                    .or_else(|| env::var("GEMINI_MODEL").ok())
                    .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            }),
            "openai" => ProviderConfig::OpenAi(OpenAiProviderConfig {
                host: env::var("OPENAI_HOST").unwrap_or_else(|_| OPENAI_DEFAULT_HOST.to_string()),
                api_key: env::var("OPENAI_API_KEY")
                    .map_err(|_| anyhow!("OPENAI_API_KEY not found"))?,
                model: model_override
                    .map(str::to_string)
                    .or_else(|| env::var("OPENAI_MODEL").ok())
                    .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            }),
            other => bail!("Unknown provider: {}", other),
        };

        Ok(Self {
            provider,
            blender_path: env::var("BLENDER_PATH").unwrap_or_else(|_| "blender".to_string()),
            server_script: env::var("BLENDER_SERVER_SCRIPT")
                .unwrap_or_else(|_| "blender_server/server.py".to_string()),
            chroma_url: env::var("CHROMA_URL")
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),
            chroma_collection: env::var("CHROMA_COLLECTION")
                .unwrap_or_else(|_| "blender_api".to_string()),
            output_dir: env::var("NODESMITH_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("output")),
        })
    }

    /// Command line for spawning the engine in headless mode.
    pub fn engine_command(&self) -> (String, Vec<String>) {
        (
            self.blender_path.clone(),
            vec![
                "--background".to_string(),
                "--python".to_string(),
                self.server_script.clone(),
            ],
        )
    }

    pub fn model_name(&self) -> &str {
        match &self.provider {
            ProviderConfig::Gemini(config) => &config.model,
            ProviderConfig::OpenAi(config) => &config.model,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // env::set_var leaks across threads; keep env-dependent assertions in
    // one test so they cannot race
    #[test]
    fn test_settings_from_env() {
        env::remove_var("LLM_PROVIDER");
        env::remove_var("GEMINI_API_KEY");

        // missing credential for the selected provider is startup-fatal
        assert!(Settings::from_env(None, None).is_err());

        env::set_var("GEMINI_API_KEY", "test-key");
        let settings = Settings::from_env(None, None).unwrap();
        assert!(matches!(settings.provider, ProviderConfig::Gemini(_)));
        assert_eq!(settings.model_name(), DEFAULT_GEMINI_MODEL);
        assert_eq!(settings.blender_path, "blender");

        let settings = Settings::from_env(None, Some("gemini-exp")).unwrap();
        assert_eq!(settings.model_name(), "gemini-exp");

        // provider flag overrides the environment selection
        env::set_var("OPENAI_API_KEY", "test-key-2");
        let settings = Settings::from_env(Some("openai"), None).unwrap();
        assert!(matches!(settings.provider, ProviderConfig::OpenAi(_)));

        assert!(Settings::from_env(Some("mystery"), None).is_err());

        let (command, args) = Settings::from_env(None, None).unwrap().engine_command();
        assert_eq!(command, "blender");
        assert_eq!(args[0], "--background");
        assert_eq!(args[1], "--python");
    }
}

// Unified enum to wrap different provider configurations
#[derive(Clone)]
pub enum ProviderConfig {
    Gemini(GeminiProviderConfig),
    OpenAi(OpenAiProviderConfig),
}

// Define specific config structs for each provider
#[derive(Clone)]
pub struct GeminiProviderConfig {
    pub host: String,
    pub api_key: String,
    pub model: String,
}

#[derive(Clone)]
pub struct OpenAiProviderConfig {
    pub host: String,
    pub api_key: String,
    pub model: String,
}

pub const GEMINI_DEFAULT_HOST: &str = "https://generativelanguage.googleapis.com";
pub const OPENAI_DEFAULT_HOST: &str = "https://api.openai.com";

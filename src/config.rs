use std::env;
use std::path::PathBuf;

pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

pub const SYSTEM_INSTRUCTION: &str = "You are a helpful assistant for the CiviResolve app. \
Answer questions about Sri Lanka government services, procedures, and public-sector topics. \
If you are unsure, say you do not know and suggest contacting the relevant government office.";

#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_temperature: f32,
    pub gemini_max_tokens: u32,
    pub request_timeout_secs: u64,
    pub history_limit: usize,
    pub system_prompt: String,
    pub assistant_name: String,
    pub greeting: String,
    pub empty_reply: String,
    pub contact_hint: String,
    pub knowledge_base_path: Option<PathBuf>,
    pub issues_api_url: String,
    pub media_base_url: String,
    pub latest_issues_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            gemini_model: DEFAULT_MODEL.to_string(),
            gemini_temperature: 0.3,
            gemini_max_tokens: 512,
            request_timeout_secs: 30,
            history_limit: 20,
            system_prompt: SYSTEM_INSTRUCTION.to_string(),
            assistant_name: "CiviResolve AI".to_string(),
            greeting: "Hi! I can help with Sri Lanka government services, documents, and procedures. \
                What do you need?"
                .to_string(),
            empty_reply: "Sorry, I could not generate a response.".to_string(),
            contact_hint: "You can also call 1919 (Government Information Center) for help."
                .to_string(),
            knowledge_base_path: None,
            issues_api_url: "http://127.0.0.1:8000/api".to_string(),
            media_base_url: "http://127.0.0.1:8000".to_string(),
            latest_issues_limit: 3,
        }
    }
}

impl Config {
    /// Builds the configuration from the environment (and `.env`, if present)
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as `from_env`, but reads variables through `lookup`
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        // The Vite-prefixed name is what the web front-end uses
        let gemini_api_key = lookup("GEMINI_API_KEY")
            .or_else(|| lookup("VITE_GEMINI_API_KEY"))
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());

        let gemini_model = lookup("GEMINI_MODEL")
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(defaults.gemini_model);

        let gemini_temperature = lookup("GEMINI_TEMPERATURE")
            .and_then(|v| v.parse::<f32>().ok())
            .map(|t| t.clamp(0.0, 2.0))
            .unwrap_or(defaults.gemini_temperature);

        let gemini_max_tokens = lookup("GEMINI_MAX_TOKENS")
            .and_then(|v| v.parse::<u32>().ok())
            .map(|t| t.max(1))
            .unwrap_or(defaults.gemini_max_tokens);

        let request_timeout_secs = lookup("GEMINI_TIMEOUT_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults.request_timeout_secs);

        let history_limit = lookup("CHAT_HISTORY_LIMIT")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(defaults.history_limit);

        let knowledge_base_path = lookup("KNOWLEDGE_BASE_PATH")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        let issues_api_url = lookup("ISSUES_API_URL")
            .map(|u| u.trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or(defaults.issues_api_url);

        let media_base_url = lookup("MEDIA_BASE_URL")
            .map(|u| u.trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or(defaults.media_base_url);

        Self {
            gemini_api_key,
            gemini_model,
            gemini_temperature,
            gemini_max_tokens,
            request_timeout_secs,
            history_limit,
            knowledge_base_path,
            issues_api_url,
            media_base_url,
            ..defaults
        }
    }

    pub fn has_gemini_key(&self) -> bool {
        self.gemini_api_key.is_some()
    }
}

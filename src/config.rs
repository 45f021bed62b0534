use std::env;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::checks::keyword::KeywordStrategy;
use crate::orchestrator::{FailurePolicy, ModeratorSettings};

pub const DEFAULT_TOPIC_PROMPT_ID: &str = "2f654e34-637f-466c-96ab-ed0722a39ccb";
pub const DEFAULT_TOXICITY_PROMPT_ID: &str = "fc4ef70d-2889-4357-831f-f7e9f5f19849";

/// Central configuration loaded from environment variables.
///
/// All secrets come from env vars (never hardcoded). The .env file
/// is loaded automatically at startup via dotenvy.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    /// Base URL shared by the prompt, moderation and conversation endpoints.
    pub api_url: String,
    pub conversation_id: String,
    pub topic_prompt_id: String,
    pub toxicity_prompt_id: String,
    /// Only needed with the remote keyword strategy.
    pub keyword_prompt_id: Option<String>,
    pub keyword_strategy: KeywordStrategy,
    pub check_timeout: Duration,
    pub concurrency: usize,
    pub failure_policy: FailurePolicy,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Everything but the API key has a default; the key is checked by
    /// `require_api_key` only for commands that make network calls.
    pub fn load() -> Result<Self> {
        let keyword_strategy = match env::var("PARAPET_KEYWORD_STRATEGY").as_deref() {
            Ok("remote") => KeywordStrategy::Remote,
            Ok("local") | Err(_) => KeywordStrategy::Local,
            Ok(other) => anyhow::bail!(
                "PARAPET_KEYWORD_STRATEGY must be \"local\" or \"remote\", got \"{other}\""
            ),
        };

        let failure_policy = match env::var("PARAPET_FAILURE_POLICY").as_deref() {
            Ok("closed") => FailurePolicy::Closed,
            Ok("open") | Err(_) => FailurePolicy::Open,
            Ok(other) => anyhow::bail!(
                "PARAPET_FAILURE_POLICY must be \"open\" or \"closed\", got \"{other}\""
            ),
        };

        let check_timeout_secs: u64 = match env::var("PARAPET_CHECK_TIMEOUT_SECS") {
            Ok(v) => v
                .parse()
                .with_context(|| format!("PARAPET_CHECK_TIMEOUT_SECS is not a number: {v}"))?,
            Err(_) => 10,
        };

        let concurrency: usize = match env::var("PARAPET_CONCURRENCY") {
            Ok(v) => v
                .parse()
                .with_context(|| format!("PARAPET_CONCURRENCY is not a number: {v}"))?,
            Err(_) => 4,
        };

        Ok(Self {
            api_key: env::var("HYPERLEAP_API_KEY").unwrap_or_default(),
            api_url: env::var("HYPERLEAP_API_URL")
                .unwrap_or_else(|_| crate::client::DEFAULT_API_URL.to_string()),
            conversation_id: env::var("HYPERLEAP_CONVERSATION_ID")
                .unwrap_or_else(|_| crate::gateway::DEFAULT_CONVERSATION_ID.to_string()),
            topic_prompt_id: env::var("PARAPET_TOPIC_PROMPT_ID")
                .unwrap_or_else(|_| DEFAULT_TOPIC_PROMPT_ID.to_string()),
            toxicity_prompt_id: env::var("PARAPET_TOXICITY_PROMPT_ID")
                .unwrap_or_else(|_| DEFAULT_TOXICITY_PROMPT_ID.to_string()),
            keyword_prompt_id: env::var("PARAPET_KEYWORD_PROMPT_ID").ok(),
            keyword_strategy,
            check_timeout: Duration::from_secs(check_timeout_secs.max(1)),
            concurrency: concurrency.max(1),
            failure_policy,
        })
    }

    pub fn moderator_settings(&self) -> ModeratorSettings {
        ModeratorSettings {
            check_timeout: self.check_timeout,
            concurrency: self.concurrency,
            failure_policy: self.failure_policy,
        }
    }

    /// Check that the API key is configured.
    /// Call this before any operation that reaches the provider.
    pub fn require_api_key(&self) -> Result<()> {
        if self.api_key.is_empty() {
            anyhow::bail!(
                "HYPERLEAP_API_KEY not set. Add it to your .env file.\n\
                 See .env.example for the required variables."
            );
        }
        Ok(())
    }

    /// The keyword prompt id, required when keywords are classified remotely.
    pub fn require_keyword_prompt(&self) -> Result<&str> {
        self.keyword_prompt_id.as_deref().ok_or_else(|| {
            anyhow::anyhow!(
                "PARAPET_KEYWORD_STRATEGY=remote needs PARAPET_KEYWORD_PROMPT_ID.\n\
                 Set it, or use PARAPET_KEYWORD_STRATEGY=local for in-process matching."
            )
        })
    }
}

// Prompt-execution endpoint: runs a stored classifier prompt.
//
// The topic, toxicity and remote keyword checks are all stored prompts that
// answer "true" or "false" in `choices[0].message.content`. This module owns
// that contract so each adapter only chooses a prompt id and replacements.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::client::ApiClient;
use crate::error::ApiError;

const PROMPTS_PATH: &str = "prompts";

/// Runs one stored prompt and reads its boolean answer.
#[derive(Clone)]
pub struct PromptClassifier {
    client: ApiClient,
    prompt_id: String,
}

impl PromptClassifier {
    pub fn new(client: ApiClient, prompt_id: impl Into<String>) -> Self {
        Self {
            client,
            prompt_id: prompt_id.into(),
        }
    }

    /// Execute the prompt with the given replacement variables.
    pub async fn classify(&self, replacements: Value) -> Result<bool, ApiError> {
        let request = PromptRequest {
            prompt_id: &self.prompt_id,
            replacements,
        };

        let response: PromptResponse = self.client.post(PROMPTS_PATH, &request).await?;
        let content = response.content()?;
        debug!(prompt_id = %self.prompt_id, content = %content, "Prompt answered");
        parse_flag(content)
    }
}

/// Interpret a classifier answer. Only "true" and "false" (any case) are
/// answers; anything else means the classifier misbehaved.
pub fn parse_flag(content: &str) -> Result<bool, ApiError> {
    let answer = content.trim();
    if answer.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if answer.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(ApiError::ResponseShape(format!(
            "expected \"true\" or \"false\", got {answer:?}"
        )))
    }
}

// --- Prompt API request/response types ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PromptRequest<'a> {
    prompt_id: &'a str,
    replacements: Value,
}

#[derive(Debug, Deserialize)]
pub struct PromptResponse {
    #[serde(default)]
    pub choices: Vec<PromptChoice>,
}

#[derive(Debug, Deserialize)]
pub struct PromptChoice {
    pub message: PromptMessage,
}

#[derive(Debug, Deserialize)]
pub struct PromptMessage {
    pub content: Option<String>,
}

impl PromptResponse {
    /// `choices[0].message.content`, or a shape error naming what's missing.
    pub fn content(&self) -> Result<&str, ApiError> {
        let choice = self
            .choices
            .first()
            .ok_or_else(|| ApiError::ResponseShape("response has no choices".to_string()))?;
        choice
            .message
            .content
            .as_deref()
            .ok_or_else(|| ApiError::ResponseShape("choice has no message content".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_are_case_insensitive() {
        assert_eq!(parse_flag("true"), Ok(true));
        assert_eq!(parse_flag("TRUE"), Ok(true));
        assert_eq!(parse_flag("False"), Ok(false));
        assert_eq!(parse_flag(" false\n"), Ok(false));
    }

    #[test]
    fn anything_else_is_a_shape_error() {
        assert!(matches!(parse_flag("yes"), Err(ApiError::ResponseShape(_))));
        assert!(matches!(parse_flag(""), Err(ApiError::ResponseShape(_))));
    }

    #[test]
    fn missing_choices_is_a_shape_error() {
        let response: PromptResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(response.content(), Err(ApiError::ResponseShape(_))));

        let response: PromptResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert!(response.content().is_err());
    }
}

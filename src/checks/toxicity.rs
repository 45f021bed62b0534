// Toxicity check: a stored classifier prompt that answers true/false for the
// whole message.

use async_trait::async_trait;
use serde_json::json;

use super::prompt::PromptClassifier;
use super::traits::{CheckKind, CheckRequest, Detection, ModerationCheck};
use crate::error::ApiError;
use crate::verdict::ViolationCategory;

pub struct ToxicityCheck {
    classifier: PromptClassifier,
}

impl ToxicityCheck {
    pub fn new(classifier: PromptClassifier) -> Self {
        Self { classifier }
    }
}

#[async_trait]
impl ModerationCheck for ToxicityCheck {
    fn kind(&self) -> CheckKind {
        CheckKind::Toxicity
    }

    async fn detect(&self, request: &CheckRequest) -> Result<Detection, ApiError> {
        let toxic = self
            .classifier
            .classify(json!({ "input": request.message }))
            .await?;

        Ok(if toxic {
            Detection::Triggered(vec![ViolationCategory::Toxicity])
        } else {
            Detection::Clear
        })
    }
}

// Topic check: asks a stored classifier prompt whether the message touches
// any of the user's blocked topics.

use async_trait::async_trait;
use serde_json::json;

use super::prompt::PromptClassifier;
use super::traits::{wrong_params, CheckKind, CheckParams, CheckRequest, Detection, ModerationCheck};
use crate::error::ApiError;
use crate::verdict::ViolationCategory;

pub struct TopicCheck {
    classifier: PromptClassifier,
}

impl TopicCheck {
    pub fn new(classifier: PromptClassifier) -> Self {
        Self { classifier }
    }
}

#[async_trait]
impl ModerationCheck for TopicCheck {
    fn kind(&self) -> CheckKind {
        CheckKind::Topic
    }

    async fn detect(&self, request: &CheckRequest) -> Result<Detection, ApiError> {
        let CheckParams::Topics(topics) = &request.params else {
            return Err(wrong_params(self.kind(), &request.params));
        };

        let flagged = self
            .classifier
            .classify(json!({ "topics": topics, "message": request.message }))
            .await?;

        Ok(if flagged {
            Detection::Triggered(vec![ViolationCategory::DerogatoryTopics])
        } else {
            Detection::Clear
        })
    }
}

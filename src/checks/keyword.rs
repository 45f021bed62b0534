// Keyword check, in two interchangeable strategies.
//
// LocalKeywordCheck (the default) does case-insensitive substring matching in
// process: no network call, so it can't fail transiently. RemoteKeywordCheck
// hands the list to a stored classifier prompt instead.

use async_trait::async_trait;
use serde_json::json;

use super::prompt::PromptClassifier;
use super::traits::{wrong_params, CheckKind, CheckParams, CheckRequest, Detection, ModerationCheck};
use crate::error::ApiError;
use crate::verdict::ViolationCategory;

/// Which keyword strategy a session uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeywordStrategy {
    #[default]
    Local,
    Remote,
}

/// Return the first keyword found in `text`, ignoring case.
pub fn find_keyword<'a>(text: &str, keywords: &'a [String]) -> Option<&'a str> {
    let haystack = text.to_lowercase();
    keywords
        .iter()
        .filter(|k| !k.is_empty())
        .find(|k| haystack.contains(&k.to_lowercase()))
        .map(String::as_str)
}

fn keywords_of(kind: CheckKind, request: &CheckRequest) -> Result<&[String], ApiError> {
    match &request.params {
        CheckParams::Keywords(keywords) => Ok(keywords),
        other => Err(wrong_params(kind, other)),
    }
}

#[derive(Default)]
pub struct LocalKeywordCheck;

#[async_trait]
impl ModerationCheck for LocalKeywordCheck {
    fn kind(&self) -> CheckKind {
        CheckKind::Keyword
    }

    async fn detect(&self, request: &CheckRequest) -> Result<Detection, ApiError> {
        let keywords = keywords_of(self.kind(), request)?;
        Ok(match find_keyword(&request.message, keywords) {
            Some(_) => Detection::Triggered(vec![ViolationCategory::DerogatoryKeywords]),
            None => Detection::Clear,
        })
    }
}

pub struct RemoteKeywordCheck {
    classifier: PromptClassifier,
}

impl RemoteKeywordCheck {
    pub fn new(classifier: PromptClassifier) -> Self {
        Self { classifier }
    }
}

#[async_trait]
impl ModerationCheck for RemoteKeywordCheck {
    fn kind(&self) -> CheckKind {
        CheckKind::Keyword
    }

    async fn detect(&self, request: &CheckRequest) -> Result<Detection, ApiError> {
        let keywords = keywords_of(self.kind(), request)?;
        if keywords.is_empty() {
            return Ok(Detection::Clear);
        }

        let flagged = self
            .classifier
            .classify(json!({ "keywords": keywords.join(","), "input": request.message }))
            .await?;

        Ok(if flagged {
            Detection::Triggered(vec![ViolationCategory::DerogatoryKeywords])
        } else {
            Detection::Clear
        })
    }
}

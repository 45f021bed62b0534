// Check abstraction shared by every adapter.
//
// An adapter wraps one external call (or, for local keyword matching, none)
// and answers "did this message trip the check?". Errors stay inside the
// CheckResult: a failed check is reported as Failed, never as Clear.

use std::collections::BTreeSet;
use std::fmt;

use async_trait::async_trait;

use crate::error::ApiError;
use crate::policy::CategoryName;
use crate::verdict::ViolationCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CheckKind {
    Topic,
    Toxicity,
    Keyword,
    CategoryModeration,
}

impl CheckKind {
    pub fn label(&self) -> &'static str {
        match self {
            CheckKind::Topic => "topic",
            CheckKind::Toxicity => "toxicity",
            CheckKind::Keyword => "keyword",
            CheckKind::CategoryModeration => "moderation",
        }
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Kind-specific parameters, passed explicitly with each request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckParams {
    None,
    Topics(String),
    Keywords(Vec<String>),
    /// Categories the user enabled; flagged categories outside this set are ignored.
    Categories(BTreeSet<CategoryName>),
}

/// One check to run against one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckRequest {
    pub kind: CheckKind,
    pub message: String,
    pub params: CheckParams,
}

/// What a check concluded about the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    /// The check fired, with the violations it found (never empty).
    Triggered(Vec<ViolationCategory>),
    Clear,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    Triggered(Vec<ViolationCategory>),
    Clear,
    Failed(ApiError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub kind: CheckKind,
    pub outcome: CheckOutcome,
}

impl CheckResult {
    pub fn failed(kind: CheckKind, error: ApiError) -> Self {
        Self {
            kind,
            outcome: CheckOutcome::Failed(error),
        }
    }
}

/// Trait for a single moderation check. Implementations are async because
/// most checks call a remote classifier.
#[async_trait]
pub trait ModerationCheck: Send + Sync {
    fn kind(&self) -> CheckKind;

    /// Run the check. Errors describe why no answer could be produced.
    async fn detect(&self, request: &CheckRequest) -> Result<Detection, ApiError>;

    /// Run the check and fold any error into a Failed outcome.
    async fn execute(&self, request: &CheckRequest) -> CheckResult {
        let outcome = match self.detect(request).await {
            Ok(Detection::Triggered(violations)) => CheckOutcome::Triggered(violations),
            Ok(Detection::Clear) => CheckOutcome::Clear,
            Err(e) => CheckOutcome::Failed(e),
        };
        CheckResult {
            kind: self.kind(),
            outcome,
        }
    }
}

/// Error for a request routed to the wrong adapter or missing its parameters.
pub(crate) fn wrong_params(kind: CheckKind, params: &CheckParams) -> ApiError {
    ApiError::InvalidRequest(format!("{kind} check received {params:?}"))
}

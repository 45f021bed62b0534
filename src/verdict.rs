// Violation taxonomy and the per-message verdict.
//
// Moderation endpoints report categories like "hate/threatening" or
// "harassment/threatening"; these are folded into the same normalized labels
// the other checks use, so reasons from every check land in one set.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

use crate::checks::traits::CheckKind;
use crate::error::ApiError;

/// A normalized reason a message was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ViolationCategory {
    Hate,
    Harassment,
    SelfHarm,
    Sexual,
    Violence,
    Toxicity,
    DerogatoryTopics,
    DerogatoryKeywords,
    /// A flagged moderation category with no built-in counterpart, lower-cased.
    Other(String),
}

impl ViolationCategory {
    pub fn label(&self) -> &str {
        match self {
            ViolationCategory::Hate => "hate",
            ViolationCategory::Harassment => "harassment",
            ViolationCategory::SelfHarm => "self-harm",
            ViolationCategory::Sexual => "sexual",
            ViolationCategory::Violence => "violence",
            ViolationCategory::Toxicity => "toxicity",
            ViolationCategory::DerogatoryTopics => "derogatory topics",
            ViolationCategory::DerogatoryKeywords => "derogatory keywords",
            ViolationCategory::Other(raw) => raw.as_str(),
        }
    }

    /// Normalize a raw moderation category name.
    ///
    /// Anything containing "hate" is hate, anything containing "harassment"
    /// is harassment, everything else passes through lower-cased. Subcategories
    /// such as "self-harm/intent" therefore stay distinct from "self-harm".
    pub fn normalize(raw: &str) -> Self {
        let lower = raw.to_lowercase();
        if lower.contains("hate") {
            return ViolationCategory::Hate;
        }
        if lower.contains("harassment") {
            return ViolationCategory::Harassment;
        }
        match lower.as_str() {
            "self-harm" => ViolationCategory::SelfHarm,
            "sexual" => ViolationCategory::Sexual,
            "violence" => ViolationCategory::Violence,
            "toxicity" => ViolationCategory::Toxicity,
            _ => ViolationCategory::Other(lower),
        }
    }
}

// Ordered by label so every rendering of a reason set is lexicographic.
impl Ord for ViolationCategory {
    fn cmp(&self, other: &Self) -> Ordering {
        self.label().cmp(other.label())
    }
}

impl PartialOrd for ViolationCategory {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ViolationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A check that could not produce an answer for this message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedCheck {
    pub kind: CheckKind,
    pub error: ApiError,
}

/// Final decision for one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub passed: bool,
    pub reasons: BTreeSet<ViolationCategory>,
    /// Checks that failed. Recorded even when they didn't affect `passed`.
    pub failures: Vec<FailedCheck>,
}

impl Verdict {
    pub fn pass() -> Self {
        Self {
            passed: true,
            reasons: BTreeSet::new(),
            failures: Vec::new(),
        }
    }

    /// The message shown to the user when the verdict fails.
    pub fn rejection_message(&self) -> Option<String> {
        if self.passed {
            return None;
        }
        if self.reasons.is_empty() {
            let kinds: BTreeSet<&str> = self.failures.iter().map(|f| f.kind.label()).collect();
            return Some(format!(
                "Moderation unavailable ({}). Please try again.",
                kinds.into_iter().collect::<Vec<_>>().join(", ")
            ));
        }
        let reasons: Vec<&str> = self.reasons.iter().map(ViolationCategory::label).collect();
        Some(format!(
            "Potential {} detected. Please rephrase your message.",
            reasons.join(", ")
        ))
    }
}

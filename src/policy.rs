// Policy configuration: which built-in categories and optional checks are on.
//
// The policy is edited between turns (CLI flags or `/enable`-style commands
// in the chat loop) and is read-only while a message is being evaluated. The
// orchestrator only ever sees a borrowed snapshot, so an edit can't land
// halfway through a fan-out.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::verdict::ViolationCategory;

/// The closed set of built-in moderation categories a user can opt into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CategoryName {
    Hate,
    Harassment,
    #[serde(rename = "Self-Harm")]
    SelfHarm,
    Sexual,
    Violence,
    Toxicity,
}

impl CategoryName {
    /// All categories, in the order they're presented to the user.
    pub const ALL: [CategoryName; 6] = [
        CategoryName::Hate,
        CategoryName::Harassment,
        CategoryName::SelfHarm,
        CategoryName::Sexual,
        CategoryName::Violence,
        CategoryName::Toxicity,
    ];

    /// Display name, as shown in the policy listing.
    pub fn name(&self) -> &'static str {
        match self {
            CategoryName::Hate => "Hate",
            CategoryName::Harassment => "Harassment",
            CategoryName::SelfHarm => "Self-Harm",
            CategoryName::Sexual => "Sexual",
            CategoryName::Violence => "Violence",
            CategoryName::Toxicity => "Toxicity",
        }
    }

    /// The normalized violation this category matches in moderation results.
    pub fn violation(&self) -> ViolationCategory {
        match self {
            CategoryName::Hate => ViolationCategory::Hate,
            CategoryName::Harassment => ViolationCategory::Harassment,
            CategoryName::SelfHarm => ViolationCategory::SelfHarm,
            CategoryName::Sexual => ViolationCategory::Sexual,
            CategoryName::Violence => ViolationCategory::Violence,
            CategoryName::Toxicity => ViolationCategory::Toxicity,
        }
    }
}

impl fmt::Display for CategoryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CategoryName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // "Self-Harm", "self_harm" and "selfharm" all name the same category
        let squash = |name: &str| name.to_lowercase().replace(['-', '_', ' '], "");
        let wanted = squash(s.trim());
        CategoryName::ALL
            .into_iter()
            .find(|c| squash(c.name()) == wanted)
            .ok_or_else(|| {
                format!(
                    "unknown category '{s}' (expected one of: {})",
                    CategoryName::ALL.map(|c| c.name()).join(", ")
                )
            })
    }
}

/// Which checks are enabled for a session, plus the free-text parameters of
/// the parameterized checks.
///
/// Topic and keyword lists are kept only while their check is enabled, so a
/// disabled check never carries stale parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfiguration {
    categories: BTreeMap<CategoryName, bool>,
    topics: Option<String>,
    keywords: Option<Vec<String>>,
}

impl Default for PolicyConfiguration {
    fn default() -> Self {
        Self {
            categories: CategoryName::ALL.into_iter().map(|c| (c, false)).collect(),
            topics: None,
            keywords: None,
        }
    }
}

impl PolicyConfiguration {
    pub fn is_enabled(&self, category: CategoryName) -> bool {
        self.categories.get(&category).copied().unwrap_or(false)
    }

    pub fn active_categories(&self) -> BTreeSet<CategoryName> {
        self.categories
            .iter()
            .filter(|(_, enabled)| **enabled)
            .map(|(category, _)| *category)
            .collect()
    }

    /// The topic list, if the topic check is enabled.
    pub fn topic_check(&self) -> Option<&str> {
        self.topics.as_deref()
    }

    /// The keyword list, if the keyword check is enabled.
    pub fn keyword_check(&self) -> Option<&[String]> {
        self.keywords.as_deref()
    }

    /// Toxicity doubles as a built-in category and as its own classifier check.
    pub fn toxicity_check_enabled(&self) -> bool {
        self.is_enabled(CategoryName::Toxicity)
    }

    pub fn set_category(&mut self, category: CategoryName, enabled: bool) {
        self.categories.insert(category, enabled);
    }

    pub fn toggle_category(&mut self, category: CategoryName) {
        let enabled = self.is_enabled(category);
        self.set_category(category, !enabled);
    }

    /// Enable the topic check with the given list, or disable it with `None`.
    pub fn set_topics(&mut self, topics: Option<String>) {
        self.topics = topics;
    }

    /// Enable the keyword check with the given list, or disable it with `None`.
    pub fn set_keywords(&mut self, keywords: Option<Vec<String>>) {
        self.keywords = keywords;
    }

    /// Builder-style variant of [`set_category`](Self::set_category).
    pub fn with_category(mut self, category: CategoryName) -> Self {
        self.set_category(category, true);
        self
    }

    pub fn with_topics(mut self, topics: impl Into<String>) -> Self {
        self.set_topics(Some(topics.into()));
        self
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_keywords(Some(keywords.into_iter().map(Into::into).collect()));
        self
    }
}

/// Split a comma-separated keyword field into keywords.
///
/// Entries are trimmed and empty entries dropped; an empty keyword would
/// otherwise be a substring of every message.
pub fn parse_keyword_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

/// A policy-editing action, typed in the chat loop between messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyEdit {
    Enable(CategoryName),
    Disable(CategoryName),
    Toggle(CategoryName),
    Topics(Option<String>),
    Keywords(Option<Vec<String>>),
    Show,
}

impl PolicyEdit {
    /// Parse a chat-loop line. Returns `None` for anything that isn't a
    /// command, so the line is treated as a chat message instead.
    pub fn parse(line: &str) -> Option<Result<Self, String>> {
        let line = line.trim();
        let rest = line.strip_prefix('/')?;
        let (command, arg) = match rest.split_once(char::is_whitespace) {
            Some((command, arg)) => (command, arg.trim()),
            None => (rest, ""),
        };

        let edit = match command {
            "enable" => arg.parse().map(PolicyEdit::Enable),
            "disable" => arg.parse().map(PolicyEdit::Disable),
            "toggle" => arg.parse().map(PolicyEdit::Toggle),
            "topics" => Ok(PolicyEdit::Topics(match arg {
                "" | "off" => None,
                list => Some(list.to_string()),
            })),
            "keywords" => Ok(PolicyEdit::Keywords(match arg {
                "" | "off" => None,
                list => Some(parse_keyword_list(list)),
            })),
            "policy" => Ok(PolicyEdit::Show),
            other => Err(format!("unknown command '/{other}'")),
        };
        Some(edit)
    }

    /// Apply the edit. `Show` leaves the policy untouched.
    pub fn apply(self, policy: &mut PolicyConfiguration) {
        match self {
            PolicyEdit::Enable(category) => policy.set_category(category, true),
            PolicyEdit::Disable(category) => policy.set_category(category, false),
            PolicyEdit::Toggle(category) => policy.toggle_category(category),
            PolicyEdit::Topics(topics) => policy.set_topics(topics),
            PolicyEdit::Keywords(keywords) => policy.set_keywords(keywords),
            PolicyEdit::Show => {}
        }
    }
}

// Category moderation: the provider's general-purpose moderation endpoint.
//
// The endpoint flags its own category names ("hate/threatening", "violence",
// ...). Flagged names are normalized and intersected with the categories the
// user enabled; anything the user didn't opt into is ignored.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::traits::{wrong_params, CheckKind, CheckParams, CheckRequest, Detection, ModerationCheck};
use crate::client::ApiClient;
use crate::error::ApiError;
use crate::policy::CategoryName;
use crate::verdict::ViolationCategory;

const MODERATIONS_PATH: &str = "moderations";

pub struct CategoryModerationCheck {
    client: ApiClient,
}

impl CategoryModerationCheck {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ModerationCheck for CategoryModerationCheck {
    fn kind(&self) -> CheckKind {
        CheckKind::CategoryModeration
    }

    async fn detect(&self, request: &CheckRequest) -> Result<Detection, ApiError> {
        let CheckParams::Categories(enabled) = &request.params else {
            return Err(wrong_params(self.kind(), &request.params));
        };

        let response: ModerationResponse = self
            .client
            .post(MODERATIONS_PATH, &ModerationRequest { input: &request.message })
            .await?;

        let flagged = response.flagged_categories()?;
        debug!(flagged = ?flagged, "Moderation categories flagged");

        let matched = matching_violations(&flagged, enabled);
        Ok(if matched.is_empty() {
            Detection::Clear
        } else {
            Detection::Triggered(matched.into_iter().collect())
        })
    }
}

/// Normalize every flagged category name.
pub fn normalize_flagged<'a, I>(flagged: I) -> BTreeSet<ViolationCategory>
where
    I: IntoIterator<Item = &'a str>,
{
    flagged.into_iter().map(ViolationCategory::normalize).collect()
}

/// Normalized flagged set intersected with the enabled categories.
pub fn matching_violations(
    flagged: &BTreeSet<ViolationCategory>,
    enabled: &BTreeSet<CategoryName>,
) -> BTreeSet<ViolationCategory> {
    let enabled: BTreeSet<ViolationCategory> = enabled.iter().map(CategoryName::violation).collect();
    flagged.intersection(&enabled).cloned().collect()
}

// --- Moderation API request/response types ---

#[derive(Serialize)]
struct ModerationRequest<'a> {
    input: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ModerationResponse {
    #[serde(default)]
    pub results: Vec<ModerationResult>,
}

#[derive(Debug, Deserialize)]
pub struct ModerationResult {
    pub categories: BTreeMap<String, bool>,
}

impl ModerationResponse {
    /// Normalized categories flagged in `results[0]`.
    pub fn flagged_categories(&self) -> Result<BTreeSet<ViolationCategory>, ApiError> {
        let result = self
            .results
            .first()
            .ok_or_else(|| ApiError::ResponseShape("moderation response has no results".to_string()))?;

        Ok(normalize_flagged(
            result
                .categories
                .iter()
                .filter(|(_, flagged)| **flagged)
                .map(|(name, _)| name.as_str()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_enabled_categories_match() {
        let flagged = normalize_flagged(["hate", "violence"]);
        let enabled = BTreeSet::from([CategoryName::Hate]);
        assert_eq!(
            matching_violations(&flagged, &enabled),
            BTreeSet::from([ViolationCategory::Hate])
        );
    }

    #[test]
    fn threatening_subcategories_fold_into_parents() {
        let flagged = normalize_flagged(["hate/threatening", "harassment/threatening"]);
        let enabled = BTreeSet::from([CategoryName::Hate, CategoryName::Harassment]);
        assert_eq!(
            matching_violations(&flagged, &enabled),
            BTreeSet::from([ViolationCategory::Hate, ViolationCategory::Harassment])
        );
    }

    #[test]
    fn unflagged_categories_are_ignored() {
        let response: ModerationResponse = serde_json::from_str(
            r#"{"results": [{"categories": {"hate": false, "sexual": true}}]}"#,
        )
        .unwrap();
        assert_eq!(
            response.flagged_categories().unwrap(),
            BTreeSet::from([ViolationCategory::Sexual])
        );
    }

    #[test]
    fn empty_results_is_a_shape_error() {
        let response: ModerationResponse = serde_json::from_str(r#"{"results": []}"#).unwrap();
        assert!(matches!(
            response.flagged_categories(),
            Err(ApiError::ResponseShape(_))
        ));
    }
}

// Moderation orchestrator: plan checks, fan out, join, reconcile.
//
// For each message:
// 1. Build one CheckRequest per enabled check from the policy snapshot
// 2. Run them concurrently on a bounded pool, each under its own timeout
// 3. Wait for every check to finish (a late Triggered still counts)
// 4. Union the Triggered violations into one verdict
//
// Checks are pure functions of (message, parameters), so nothing is shared
// between tasks except borrowed, immutable data. Dropping the evaluate future
// drops every in-flight check with it.

use std::collections::BTreeSet;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::checks::traits::{
    CheckKind, CheckOutcome, CheckParams, CheckRequest, CheckResult, ModerationCheck,
};
use crate::error::ApiError;
use crate::output::truncate_chars;
use crate::policy::PolicyConfiguration;
use crate::verdict::{FailedCheck, Verdict};

/// What a failed check means for the verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Failed checks are reported but don't block the message.
    #[default]
    Open,
    /// Any failed check blocks the message.
    Closed,
}

/// Tuning for the fan-out.
#[derive(Debug, Clone)]
pub struct ModeratorSettings {
    pub check_timeout: Duration,
    /// Upper bound on checks in flight at once.
    pub concurrency: usize,
    pub failure_policy: FailurePolicy,
}

impl Default for ModeratorSettings {
    fn default() -> Self {
        Self {
            check_timeout: Duration::from_secs(10),
            concurrency: 4,
            failure_policy: FailurePolicy::Open,
        }
    }
}

/// One adapter per check kind.
pub struct CheckSet {
    pub topic: Box<dyn ModerationCheck>,
    pub toxicity: Box<dyn ModerationCheck>,
    pub keyword: Box<dyn ModerationCheck>,
    pub moderation: Box<dyn ModerationCheck>,
}

impl CheckSet {
    fn get(&self, kind: CheckKind) -> &dyn ModerationCheck {
        match kind {
            CheckKind::Topic => self.topic.as_ref(),
            CheckKind::Toxicity => self.toxicity.as_ref(),
            CheckKind::Keyword => self.keyword.as_ref(),
            CheckKind::CategoryModeration => self.moderation.as_ref(),
        }
    }
}

pub struct Moderator {
    checks: CheckSet,
    settings: ModeratorSettings,
}

impl Moderator {
    pub fn new(checks: CheckSet, settings: ModeratorSettings) -> Self {
        Self { checks, settings }
    }

    pub fn settings(&self) -> &ModeratorSettings {
        &self.settings
    }

    /// Evaluate one message against a policy snapshot.
    pub async fn evaluate(&self, message: &str, policy: &PolicyConfiguration) -> Verdict {
        let requests = plan_checks(message, policy);
        if requests.is_empty() {
            debug!("No checks enabled, message passes");
            return Verdict::pass();
        }

        info!(
            checks = requests.len(),
            message = %truncate_chars(message, 50),
            "Evaluating message"
        );

        let results: Vec<CheckResult> = stream::iter(requests.iter().map(|r| self.run_check(r)))
            .buffer_unordered(self.settings.concurrency.max(1))
            .collect()
            .await;

        let verdict = reconcile(results, self.settings.failure_policy);
        info!(
            passed = verdict.passed,
            reasons = ?verdict.reasons,
            failed_checks = verdict.failures.len(),
            "Verdict reached"
        );
        verdict
    }

    async fn run_check(&self, request: &CheckRequest) -> CheckResult {
        let check = self.checks.get(request.kind);
        match tokio::time::timeout(self.settings.check_timeout, check.execute(request)).await {
            Ok(result) => result,
            Err(_) => CheckResult::failed(request.kind, ApiError::Timeout(self.settings.check_timeout)),
        }
    }
}

/// Build the requests for every check the policy enables.
pub fn plan_checks(message: &str, policy: &PolicyConfiguration) -> Vec<CheckRequest> {
    let mut requests = Vec::with_capacity(4);
    let request = |kind, params| CheckRequest {
        kind,
        message: message.to_string(),
        params,
    };

    if let Some(topics) = policy.topic_check().filter(|t| !t.trim().is_empty()) {
        requests.push(request(CheckKind::Topic, CheckParams::Topics(topics.to_string())));
    }

    if policy.toxicity_check_enabled() {
        requests.push(request(CheckKind::Toxicity, CheckParams::None));
    }

    if let Some(keywords) = policy.keyword_check().filter(|k| !k.is_empty()) {
        requests.push(request(CheckKind::Keyword, CheckParams::Keywords(keywords.to_vec())));
    }

    let categories = policy.active_categories();
    if !categories.is_empty() {
        requests.push(request(CheckKind::CategoryModeration, CheckParams::Categories(categories)));
    }

    requests
}

/// Combine check results into a verdict. The result doesn't depend on the
/// order the checks completed in.
pub fn reconcile<I>(results: I, failure_policy: FailurePolicy) -> Verdict
where
    I: IntoIterator<Item = CheckResult>,
{
    let mut reasons = BTreeSet::new();
    let mut failures = Vec::new();

    for result in results {
        match result.outcome {
            CheckOutcome::Triggered(violations) => {
                debug!(check = %result.kind, violations = ?violations, "Check triggered");
                reasons.extend(violations);
            }
            CheckOutcome::Clear => {
                debug!(check = %result.kind, "Check clear");
            }
            CheckOutcome::Failed(error) => {
                warn!(check = %result.kind, error = %error, "Check failed");
                failures.push(FailedCheck {
                    kind: result.kind,
                    error,
                });
            }
        }
    }

    failures.sort_by_key(|f| f.kind);

    let passed = reasons.is_empty()
        && (failure_policy == FailurePolicy::Open || failures.is_empty());

    Verdict {
        passed,
        reasons,
        failures,
    }
}

// Composition tests — the orchestrator wired to in-process fake checks.
//
// Planning -> fan-out -> reconcile, without any network access. Fakes can be
// delayed to reorder completion, and count their calls so "no checks enabled"
// can be shown to issue nothing.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use parapet::checks::traits::{
    CheckKind, CheckOutcome, CheckParams, CheckRequest, CheckResult, Detection, ModerationCheck,
};
use parapet::error::ApiError;
use parapet::orchestrator::{plan_checks, reconcile, CheckSet, FailurePolicy, Moderator, ModeratorSettings};
use parapet::policy::{CategoryName, PolicyConfiguration};
use parapet::verdict::{FailedCheck, ViolationCategory};

struct FakeCheck {
    kind: CheckKind,
    answer: Result<Detection, ApiError>,
    delay: Duration,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl ModerationCheck for FakeCheck {
    fn kind(&self) -> CheckKind {
        self.kind
    }

    async fn detect(&self, _request: &CheckRequest) -> Result<Detection, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.answer.clone()
    }
}

/// Answers for each check kind, in CheckSet order: topic, toxicity, keyword, moderation.
struct Script {
    answers: [(Result<Detection, ApiError>, u64); 4],
}

impl Script {
    fn all_clear() -> Self {
        Self {
            answers: [
                (Ok(Detection::Clear), 0),
                (Ok(Detection::Clear), 0),
                (Ok(Detection::Clear), 0),
                (Ok(Detection::Clear), 0),
            ],
        }
    }

    fn set(mut self, kind: CheckKind, answer: Result<Detection, ApiError>, delay_ms: u64) -> Self {
        self.answers[index(kind)] = (answer, delay_ms);
        self
    }

    fn moderator(self, settings: ModeratorSettings) -> (Moderator, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let [topic, toxicity, keyword, moderation] = self.answers;
        let fake = |kind, (answer, delay_ms): (Result<Detection, ApiError>, u64)| -> Box<dyn ModerationCheck> {
            Box::new(FakeCheck {
                kind,
                answer,
                delay: Duration::from_millis(delay_ms),
                calls: calls.clone(),
            })
        };
        let checks = CheckSet {
            topic: fake(CheckKind::Topic, topic),
            toxicity: fake(CheckKind::Toxicity, toxicity),
            keyword: fake(CheckKind::Keyword, keyword),
            moderation: fake(CheckKind::CategoryModeration, moderation),
        };
        (Moderator::new(checks, settings), calls)
    }
}

fn index(kind: CheckKind) -> usize {
    match kind {
        CheckKind::Topic => 0,
        CheckKind::Toxicity => 1,
        CheckKind::Keyword => 2,
        CheckKind::CategoryModeration => 3,
    }
}

fn everything_enabled() -> PolicyConfiguration {
    PolicyConfiguration::default()
        .with_category(CategoryName::Hate)
        .with_category(CategoryName::Toxicity)
        .with_topics("politics")
        .with_keywords(["spam"])
}

fn triggered(violations: &[ViolationCategory]) -> Result<Detection, ApiError> {
    Ok(Detection::Triggered(violations.to_vec()))
}

// ============================================================
// Planning
// ============================================================

#[test]
fn empty_policy_plans_nothing() {
    assert!(plan_checks("hello", &PolicyConfiguration::default()).is_empty());
}

#[test]
fn blank_topics_and_empty_keywords_are_not_planned() {
    let policy = PolicyConfiguration::default()
        .with_topics("   ")
        .with_keywords(Vec::<String>::new());
    assert!(plan_checks("hello", &policy).is_empty());
}

#[test]
fn every_enabled_check_gets_its_own_parameters() {
    let requests = plan_checks("hello", &everything_enabled());
    let kinds: Vec<CheckKind> = requests.iter().map(|r| r.kind).collect();
    assert_eq!(
        kinds,
        vec![
            CheckKind::Topic,
            CheckKind::Toxicity,
            CheckKind::Keyword,
            CheckKind::CategoryModeration
        ]
    );
    assert_eq!(requests[0].params, CheckParams::Topics("politics".to_string()));
    assert_eq!(requests[1].params, CheckParams::None);
    assert_eq!(requests[2].params, CheckParams::Keywords(vec!["spam".to_string()]));
    assert_eq!(
        requests[3].params,
        CheckParams::Categories(BTreeSet::from([CategoryName::Hate, CategoryName::Toxicity]))
    );
    assert!(requests.iter().all(|r| r.message == "hello"));
}

#[test]
fn any_category_enables_moderation() {
    let policy = PolicyConfiguration::default().with_category(CategoryName::Violence);
    let requests = plan_checks("hello", &policy);
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].kind, CheckKind::CategoryModeration);
}

// ============================================================
// Reconciliation
// ============================================================

#[test]
fn reconcile_is_order_independent() {
    let results = vec![
        CheckResult {
            kind: CheckKind::Topic,
            outcome: CheckOutcome::Triggered(vec![ViolationCategory::DerogatoryTopics]),
        },
        CheckResult::failed(CheckKind::Toxicity, ApiError::Timeout(Duration::from_secs(10))),
        CheckResult {
            kind: CheckKind::Keyword,
            outcome: CheckOutcome::Clear,
        },
        CheckResult {
            kind: CheckKind::CategoryModeration,
            outcome: CheckOutcome::Triggered(vec![ViolationCategory::Hate, ViolationCategory::Violence]),
        },
    ];
    let mut reversed = results.clone();
    reversed.reverse();

    let forward = reconcile(results, FailurePolicy::Open);
    let backward = reconcile(reversed, FailurePolicy::Open);
    assert_eq!(forward, backward);
    assert!(!forward.passed);
    assert_eq!(
        forward.reasons,
        BTreeSet::from([
            ViolationCategory::DerogatoryTopics,
            ViolationCategory::Hate,
            ViolationCategory::Violence
        ])
    );
}

#[test]
fn failure_alone_passes_when_open_and_blocks_when_closed() {
    let results = || {
        vec![
            CheckResult::failed(CheckKind::Toxicity, ApiError::Transport("refused".into())),
            CheckResult {
                kind: CheckKind::Keyword,
                outcome: CheckOutcome::Clear,
            },
        ]
    };

    let open = reconcile(results(), FailurePolicy::Open);
    assert!(open.passed);
    assert!(open.reasons.is_empty());
    assert_eq!(
        open.failures,
        vec![FailedCheck {
            kind: CheckKind::Toxicity,
            error: ApiError::Transport("refused".into())
        }]
    );

    let closed = reconcile(results(), FailurePolicy::Closed);
    assert!(!closed.passed);
    assert_eq!(
        closed.rejection_message().as_deref(),
        Some("Moderation unavailable (toxicity). Please try again.")
    );
}

// ============================================================
// Orchestrator
// ============================================================

#[tokio::test]
async fn no_checks_means_pass_without_calls() {
    let (moderator, calls) = Script::all_clear().moderator(ModeratorSettings::default());
    let verdict = moderator.evaluate("anything", &PolicyConfiguration::default()).await;
    assert!(verdict.passed);
    assert!(verdict.reasons.is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn all_clear_passes() {
    let (moderator, calls) = Script::all_clear().moderator(ModeratorSettings::default());
    let verdict = moderator.evaluate("hello", &everything_enabled()).await;
    assert!(verdict.passed);
    assert!(verdict.failures.is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn late_trigger_still_fails_the_message() {
    let (moderator, _) = Script::all_clear()
        .set(CheckKind::Topic, triggered(&[ViolationCategory::DerogatoryTopics]), 80)
        .moderator(ModeratorSettings::default());
    let verdict = moderator.evaluate("hello", &everything_enabled()).await;
    assert!(!verdict.passed);
    assert_eq!(verdict.reasons, BTreeSet::from([ViolationCategory::DerogatoryTopics]));
}

#[tokio::test]
async fn completion_order_does_not_change_the_verdict() {
    let run = |topic_delay: u64, moderation_delay: u64| async move {
        let (moderator, _) = Script::all_clear()
            .set(CheckKind::Topic, triggered(&[ViolationCategory::DerogatoryTopics]), topic_delay)
            .set(
                CheckKind::CategoryModeration,
                triggered(&[ViolationCategory::Hate]),
                moderation_delay,
            )
            .set(CheckKind::Toxicity, Err(ApiError::ResponseShape("bad".into())), 20)
            .moderator(ModeratorSettings::default());
        moderator.evaluate("hello", &everything_enabled()).await
    };

    let topic_first = run(0, 60).await;
    let moderation_first = run(60, 0).await;
    assert_eq!(topic_first, moderation_first);
    assert_eq!(
        topic_first.reasons,
        BTreeSet::from([ViolationCategory::DerogatoryTopics, ViolationCategory::Hate])
    );
}

#[tokio::test]
async fn slow_check_times_out_as_failed() {
    let settings = ModeratorSettings {
        check_timeout: Duration::from_millis(50),
        ..ModeratorSettings::default()
    };
    let (moderator, _) = Script::all_clear()
        .set(CheckKind::Toxicity, triggered(&[ViolationCategory::Toxicity]), 1_000)
        .moderator(settings);

    let verdict = moderator.evaluate("hello", &everything_enabled()).await;
    assert!(verdict.passed, "a timed-out check must not block under the open policy");
    assert_eq!(
        verdict.failures,
        vec![FailedCheck {
            kind: CheckKind::Toxicity,
            error: ApiError::Timeout(Duration::from_millis(50)),
        }]
    );
}

#[tokio::test]
async fn failed_check_does_not_hide_other_triggers() {
    let (moderator, _) = Script::all_clear()
        .set(CheckKind::Toxicity, Err(ApiError::Upstream { status: 503, body: String::new() }), 0)
        .set(CheckKind::Keyword, triggered(&[ViolationCategory::DerogatoryKeywords]), 10)
        .moderator(ModeratorSettings::default());

    let verdict = moderator.evaluate("hello", &everything_enabled()).await;
    assert!(!verdict.passed);
    assert_eq!(verdict.reasons, BTreeSet::from([ViolationCategory::DerogatoryKeywords]));
    assert_eq!(verdict.failures.len(), 1);
}

#[tokio::test]
async fn concurrency_of_one_still_runs_every_check() {
    let settings = ModeratorSettings {
        concurrency: 1,
        ..ModeratorSettings::default()
    };
    let (moderator, calls) = Script::all_clear()
        .set(CheckKind::CategoryModeration, triggered(&[ViolationCategory::Hate]), 5)
        .moderator(settings);

    let verdict = moderator.evaluate("hello", &everything_enabled()).await;
    assert_eq!(calls.load(Ordering::SeqCst), 4);
    assert_eq!(verdict.reasons, BTreeSet::from([ViolationCategory::Hate]));
}

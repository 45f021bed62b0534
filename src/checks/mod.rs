// Moderation checks — one adapter per check kind behind the ModerationCheck
// trait, so the orchestrator can fan out over them without knowing which
// endpoint (if any) each one calls.

pub mod keyword;
pub mod moderation;
pub mod prompt;
pub mod topic;
pub mod toxicity;
pub mod traits;

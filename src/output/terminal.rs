// Colored terminal output for the chat loop and the `check` command.

use colored::Colorize;

use crate::gateway::ChatReply;
use crate::policy::{CategoryName, PolicyConfiguration};
use crate::verdict::Verdict;

/// Display a rejection, or nothing if the verdict passed.
pub fn display_rejection(verdict: &Verdict) {
    if let Some(message) = verdict.rejection_message() {
        println!("{} {}", "!!".red().bold(), message.red());
    }
}

/// Display checks that couldn't answer. They don't change a passing verdict
/// under the open failure policy, but the user should know moderation was degraded.
pub fn display_failures(verdict: &Verdict) {
    for failure in &verdict.failures {
        println!(
            "  {} {} check unavailable: {}",
            "~".yellow(),
            failure.kind,
            failure.error.to_string().dimmed()
        );
    }
}

/// Display the verdict for `parapet check`.
pub fn display_verdict(verdict: &Verdict) {
    if verdict.passed {
        println!("{}", "Passed".green().bold());
    } else {
        display_rejection(verdict);
    }
    display_failures(verdict);
}

pub fn display_reply(reply: &ChatReply) {
    println!("{} {}", format!("{}:", reply.role).cyan().bold(), reply.content);
}

/// Display the effective policy.
pub fn display_policy(policy: &PolicyConfiguration) {
    println!("\n{}", "=== Guardrails ===".bold());
    for category in CategoryName::ALL {
        println!("  {} {}", checkbox(policy.is_enabled(category)), category);
    }
    match policy.topic_check() {
        Some(topics) => println!("  {} Topics: {}", checkbox(true), topics),
        None => println!("  {} Topics", checkbox(false)),
    }
    match policy.keyword_check() {
        Some(keywords) => println!("  {} Keywords: {}", checkbox(true), keywords.join(", ")),
        None => println!("  {} Keywords", checkbox(false)),
    }
    println!();
}

fn checkbox(enabled: bool) -> colored::ColoredString {
    if enabled {
        "[x]".green()
    } else {
        "[ ]".dimmed()
    }
}

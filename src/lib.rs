// Parapet: a content-safety gate in front of a chat model
//
// This is the library root. Each module corresponds to one part of the
// moderation path: policy -> checks -> orchestrator -> verdict -> gateway.

pub mod checks;
pub mod client;
pub mod config;
pub mod error;
pub mod gateway;
pub mod orchestrator;
pub mod output;
pub mod policy;
pub mod session;
pub mod verdict;

//! Core domain types
//!
//! These types are the caller-facing shapes of every driver operation. They
//! are transient: each is fetched or built, used, and discarded within one
//! call, and carries no platform wire details.

pub mod check;
pub mod comment;
pub mod job;
pub mod pull_request;
pub mod repo;
pub mod runner;

/// Strips the `refs/heads/` or `refs/tags/` prefix from a git ref.
///
/// Anything else (plain branch names, `refs/pull/...`) is returned unchanged.
pub fn branch_name(git_ref: &str) -> &str {
    git_ref
        .strip_prefix("refs/heads/")
        .or_else(|| git_ref.strip_prefix("refs/tags/"))
        .unwrap_or(git_ref)
}

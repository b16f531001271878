//! Application settings and branch-pattern matching.
//!
//! Settings persist through the same envelope mechanism as snapshots (see
//! `store::settings`). Patterns in `blocked_branch_patterns` stop commit
//! actions in the UI: `*` matches any run of characters, and a trailing
//! `/*` matches the prefix itself plus anything under it.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// How often the UI re-reads local file state, in seconds.
    pub refresh_interval_secs: u64,
    pub blocked_branch_patterns: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 5,
            blocked_branch_patterns: Vec::new(),
        }
    }
}

impl Settings {
    pub fn is_commit_blocked(&self, branch: &str) -> bool {
        self.blocked_branch_patterns
            .iter()
            .any(|pattern| branch_matches(pattern, branch))
    }
}

pub fn branch_matches(pattern: &str, branch: &str) -> bool {
    if let Some(prefix) = pattern.strip_suffix("/*") {
        return branch == prefix || branch.starts_with(&format!("{}/", prefix));
    }
    glob_match(pattern, branch)
}

fn glob_match(pattern: &str, text: &str) -> bool {
    match pattern.split_once('*') {
        None => pattern == text,
        Some((prefix, rest)) => {
            let Some(remainder) = text.strip_prefix(prefix) else {
                return false;
            };
            if rest.is_empty() {
                return true;
            }
            remainder
                .char_indices()
                .map(|(i, _)| i)
                .chain(std::iter::once(remainder.len()))
                .any(|i| glob_match(rest, &remainder[i..]))
        }
    }
}

//! Proactive follow-up suggestions derived from accumulated interests.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::interest::{Interest, InterestCounters};

/// Minimum count for an interest to count as "frequent".
pub const FREQUENT_THRESHOLD: u32 = 2;

/// A follow-up message offered on top of the direct reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub text: String,
    pub redirect: Option<String>,
}

impl Suggestion {
    /// The canned suggestion for an interest, if its vocabulary row exists.
    pub fn for_interest(interest: Interest) -> Option<Self> {
        interest.entry().map(|e| Self {
            text: e.suggestion.to_string(),
            redirect: e.redirect.map(str::to_string),
        })
    }
}

/// Pick at most one suggestion.
///
/// Only interests seen at least [`FREQUENT_THRESHOLD`] times qualify. Among
/// those, one that also appears in `latest` is preferred; otherwise the first
/// frequent interest in insertion order is used. Pure: reads `counters` only.
pub fn suggest(counters: &InterestCounters, latest: &BTreeSet<Interest>) -> Option<Suggestion> {
    let frequent: Vec<Interest> = counters
        .iter()
        .filter(|(_, count)| *count >= FREQUENT_THRESHOLD)
        .map(|(interest, _)| interest)
        .collect();

    let chosen = frequent
        .iter()
        .find(|i| latest.contains(*i))
        .or_else(|| frequent.first())?;

    Suggestion::for_interest(*chosen)
}

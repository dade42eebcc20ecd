//! Client-side interest tracking over a closed keyword vocabulary.
//!
//! Each vocabulary term is an [`Interest`]; the trigger phrase and canned
//! follow-up for every term live together in [`VOCABULARY`], so adding a term
//! means adding a variant and a table row.

use std::collections::BTreeSet;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::storage::ClientStorage;

/// A term of the fixed interest vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interest {
    Help,
    About,
    Joke,
}

/// Vocabulary row: what triggers an interest and what it suggests.
#[derive(Debug, Clone, Copy)]
pub struct VocabularyEntry {
    pub interest: Interest,
    /// Lower-case literal searched for in messages.
    pub trigger: &'static str,
    pub suggestion: &'static str,
    pub redirect: Option<&'static str>,
}

/// The closed vocabulary, in scan order.
pub const VOCABULARY: &[VocabularyEntry] = &[
    VocabularyEntry {
        interest: Interest::Help,
        trigger: "help",
        suggestion: "Since you often ask for help, here is the help page again. 💡",
        redirect: Some("/pages/help.html"),
    },
    VocabularyEntry {
        interest: Interest::About,
        trigger: "about",
        suggestion: "You seem curious about who I am! You can revisit the About page anytime. 🙂",
        redirect: Some("/pages/about.html"),
    },
    VocabularyEntry {
        interest: Interest::Joke,
        trigger: "joke",
        suggestion: "I remember you enjoy jokes — type \"joke\" again whenever you need a laugh! 😄",
        redirect: None,
    },
];

impl Interest {
    pub fn as_str(self) -> &'static str {
        match self {
            Interest::Help => "help",
            Interest::About => "about",
            Interest::Joke => "joke",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        VOCABULARY
            .iter()
            .find(|e| e.interest.as_str() == name)
            .map(|e| e.interest)
    }

    pub fn entry(self) -> Option<&'static VocabularyEntry> {
        VOCABULARY.iter().find(|e| e.interest == self)
    }
}

impl std::fmt::Display for Interest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Vocabulary terms occurring literally in `message`, case-insensitively.
pub fn extract(message: &str) -> BTreeSet<Interest> {
    let text = message.to_lowercase();
    VOCABULARY
        .iter()
        .filter(|e| text.contains(e.trigger))
        .map(|e| e.interest)
        .collect()
}

// ---------------------------------------------------------------------------
// Counters
// ---------------------------------------------------------------------------

/// Per-interest occurrence counts, kept in first-seen order.
///
/// Persisted as a JSON object (`{"help": 2, "joke": 1}`). Unknown keys and
/// non-integer values in a stored snapshot are dropped on load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterestCounters {
    entries: Vec<(Interest, u32)>,
}

impl InterestCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, interest: Interest) -> u32 {
        self.entries
            .iter()
            .find(|(i, _)| *i == interest)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }

    pub fn increment(&mut self, interest: Interest) {
        match self.entries.iter_mut().find(|(i, _)| *i == interest) {
            Some((_, n)) => *n = n.saturating_add(1),
            None => self.entries.push((interest, 1)),
        }
    }

    /// Set a count directly, keeping the term's position if already present.
    pub fn set(&mut self, interest: Interest, count: u32) {
        match self.entries.iter_mut().find(|(i, _)| *i == interest) {
            Some((_, n)) => *n = count,
            None => self.entries.push((interest, count)),
        }
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (Interest, u32)> + '_ {
        self.entries.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Serialize for InterestCounters {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (interest, count) in &self.entries {
            map.serialize_entry(interest.as_str(), count)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for InterestCounters {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CountersVisitor;

        impl<'de> Visitor<'de> for CountersVisitor {
            type Value = InterestCounters;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("an object mapping interest names to counts")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut counters = InterestCounters::new();
                while let Some((key, value)) = access.next_entry::<String, serde_json::Value>()? {
                    let Some(interest) = Interest::from_name(&key) else {
                        continue;
                    };
                    if let Some(count) = value.as_u64() {
                        counters.set(interest, u32::try_from(count).unwrap_or(u32::MAX));
                    }
                }
                Ok(counters)
            }
        }

        deserializer.deserialize_map(CountersVisitor)
    }
}

// ---------------------------------------------------------------------------
// Tracker
// ---------------------------------------------------------------------------

/// Owns the live counters and writes them through to client storage.
#[derive(Debug, Clone)]
pub struct InterestTracker {
    counters: InterestCounters,
    storage: ClientStorage,
}

impl InterestTracker {
    /// Load the persisted snapshot; missing or corrupt data starts empty.
    pub fn load(storage: ClientStorage) -> Self {
        let counters = storage.load_interests();
        Self { counters, storage }
    }

    pub fn counters(&self) -> &InterestCounters {
        &self.counters
    }

    /// Increment each given interest by one. Persists when anything changed.
    pub fn increment<'a>(&mut self, interests: impl IntoIterator<Item = &'a Interest>) {
        let mut changed = false;
        for interest in interests {
            self.counters.increment(*interest);
            changed = true;
        }
        if changed {
            self.persist();
        }
    }

    /// Extract interests from a message, count them, and return what matched.
    pub fn observe(&mut self, message: &str) -> BTreeSet<Interest> {
        let found = extract(message);
        self.increment(&found);
        found
    }

    /// Write the full snapshot to storage.
    pub fn persist(&self) {
        self.storage.save_interests(&self.counters);
    }

    /// Forget all counts in memory. Storage is cleared by the caller.
    pub fn reset(&mut self) {
        self.counters.clear();
    }
}

//! First-match-wins keyword matching.

use serde::{Deserialize, Serialize};

use crate::rules::RuleTable;

/// Reply used when nothing matches, or when the matching rule has no text.
pub const DEFAULT_RESPONSE: &str = "I didn't catch that.";

/// Bot reply to a single message; also the `/chat` wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub redirect: Option<String>,
}

impl Reply {
    pub fn fallback() -> Self {
        Self {
            message: DEFAULT_RESPONSE.to_string(),
            redirect: None,
        }
    }
}

/// Return the reply of the first rule whose keyword occurs in `message`.
///
/// Matching is case-insensitive substring containment, tried in table order.
/// A shorter keyword earlier in the table shadows longer ones after it.
pub fn find(message: &str, table: &RuleTable) -> Reply {
    let text = message.to_lowercase();

    table
        .iter()
        .find(|rule| rule.matches_lowered(&text))
        .map(|rule| Reply {
            message: if rule.response().is_empty() {
                DEFAULT_RESPONSE.to_string()
            } else {
                rule.response().to_string()
            },
            redirect: (!rule.redirect_page().is_empty()).then(|| rule.redirect_page().to_string()),
        })
        .unwrap_or_else(Reply::fallback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Rule;

    fn table(rules: &[(&str, &str, &str)]) -> RuleTable {
        RuleTable::from_rules(
            rules
                .iter()
                .map(|(k, r, p)| Rule::new(*k, *r, *p))
                .collect(),
        )
    }

    #[test]
    fn first_match_wins_over_more_specific_keyword() {
        let t = table(&[("help", "H", "x.html"), ("help me", "X", "")]);
        let reply = find("please help me", &t);
        assert_eq!(reply.message, "H");
        assert_eq!(reply.redirect.as_deref(), Some("x.html"));
    }

    #[test]
    fn no_match_returns_default() {
        let t = table(&[("hello", "Hi", "")]);
        assert_eq!(find("good morning", &t), Reply::fallback());
        assert_eq!(find("anything", &RuleTable::default()), Reply::fallback());
    }

    #[test]
    fn matching_is_case_insensitive_both_ways() {
        let t = table(&[("JoKe", "Knock knock", "")]);
        assert_eq!(find("tell me a JOKE", &t).message, "Knock knock");
        assert_eq!(find("joke", &t).message, "Knock knock");
    }

    #[test]
    fn substring_not_word_boundary() {
        let t = table(&[("cat", "meow", "")]);
        assert_eq!(find("concatenate", &t).message, "meow");
    }

    #[test]
    fn empty_response_falls_back_to_default_but_keeps_redirect() {
        let t = table(&[("faq", "", "faq.html")]);
        let reply = find("faq please", &t);
        assert_eq!(reply.message, DEFAULT_RESPONSE);
        assert_eq!(reply.redirect.as_deref(), Some("faq.html"));
    }

    #[test]
    fn empty_keyword_is_skipped() {
        let t = table(&[("", "never", ""), ("hi", "hello", "")]);
        assert_eq!(find("hi", &t).message, "hello");
    }

    #[test]
    fn duplicate_keywords_earlier_shadows_later() {
        let t = table(&[("hi", "first", ""), ("hi", "second", "p.html")]);
        let reply = find("hi", &t);
        assert_eq!(reply.message, "first");
        assert_eq!(reply.redirect, None);
    }

    #[test]
    fn reply_serializes_null_redirect() {
        let json = serde_json::to_value(Reply::fallback()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "message": DEFAULT_RESPONSE, "redirect": null })
        );
    }
}

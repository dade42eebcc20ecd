//! Keyword rule table loaded from a delimited text file.
//!
//! The source has a header row followed by `keyword,response[,redirect_page]`
//! rows. Responses may themselves contain commas: only a trailing field that
//! names an `.html` page is split off as the redirect, everything between the
//! keyword and that field is rejoined verbatim.
//!
//! Loading never fails from the caller's point of view. An unreadable file
//! produces an empty table (and an `error!` event), and every message then gets
//! the default reply.

use std::path::Path;

use crate::error::{RuleError, RuleResult};

/// Field delimiter for rule rows.
pub const DELIMITER: char = ',';

/// Suffix marking a trailing field as a redirect page.
pub const PAGE_SUFFIX: &str = ".html";

/// One keyword → response (→ redirect) mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    keyword: String,
    response: String,
    redirect_page: String,
    /// Lower-cased keyword, computed once at construction.
    needle: String,
}

impl Rule {
    pub fn new(
        keyword: impl Into<String>,
        response: impl Into<String>,
        redirect_page: impl Into<String>,
    ) -> Self {
        let keyword = keyword.into();
        let needle = keyword.to_lowercase();
        Self {
            keyword,
            response: response.into(),
            redirect_page: redirect_page.into(),
            needle,
        }
    }

    /// Parse a single data row. Never fails; missing fields come out empty.
    pub fn parse_row(line: &str) -> Self {
        let sep = DELIMITER.to_string();
        let parts: Vec<&str> = line.split(DELIMITER).collect();
        let keyword = parts.first().map(|k| k.trim()).unwrap_or_default();
        let last = parts.last().map(|l| l.trim()).unwrap_or_default();

        let (response, redirect_page) = if last.to_lowercase().ends_with(PAGE_SUFFIX) {
            // A one-field row has nothing between keyword and page.
            let middle = parts.get(1..parts.len() - 1).unwrap_or(&[]);
            (middle.join(sep.as_str()), last)
        } else {
            (parts.get(1..).unwrap_or(&[]).join(sep.as_str()), "")
        };

        Self::new(keyword, response.trim(), redirect_page)
    }

    /// Trigger substring, as written in the file (trimmed).
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// Reply text; may be empty.
    pub fn response(&self) -> &str {
        &self.response
    }

    /// Page to offer alongside the reply; empty when the row has none.
    pub fn redirect_page(&self) -> &str {
        &self.redirect_page
    }

    /// Case-insensitive substring test against an already lower-cased message.
    ///
    /// An empty keyword never matches.
    pub fn matches_lowered(&self, lowered_message: &str) -> bool {
        !self.needle.is_empty() && lowered_message.contains(&self.needle)
    }
}

/// Ordered, immutable sequence of rules. File order is match priority.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleTable {
    rules: Vec<Rule>,
}

impl RuleTable {
    /// Build a table from raw file contents.
    ///
    /// Blank lines are skipped; the first remaining line is the header.
    pub fn load(source: &str) -> Self {
        let rules = source
            .lines()
            .filter(|line| !line.trim().is_empty())
            .skip(1)
            .map(Rule::parse_row)
            .collect();
        Self { rules }
    }

    /// Read and parse a rule file, surfacing I/O failures.
    pub fn read(path: &Path) -> RuleResult<Self> {
        let source = std::fs::read_to_string(path).map_err(|e| RuleError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        Ok(Self::load(&source))
    }

    /// Read a rule file, falling back to an empty table on failure.
    pub fn from_file(path: &Path) -> Self {
        match Self::read(path) {
            Ok(table) => {
                tracing::info!(path = %path.display(), rules = table.len(), "loaded rule table");
                table
            }
            Err(e) => {
                tracing::error!(error = %e, "error loading rule table, every message gets the default reply");
                Self::default()
            }
        }
    }

    pub fn from_rules(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<'a> IntoIterator for &'a RuleTable {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

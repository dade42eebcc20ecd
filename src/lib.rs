// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # chatcsv
//!
//! A keyword-driven chat responder. The server matches messages against a
//! table of keyword → response rules read from a CSV file and logs every
//! exchange; the client keeps history and interest counters locally and uses
//! them to offer follow-up suggestions.
//!
//! ## Architecture
//!
//! - **Rule table** (`rules`): ordered `keyword,response[,redirect_page]` rows
//! - **Matcher** (`matcher`): first case-insensitive substring match wins
//! - **Interaction log** (`chatlog`): best-effort append-only exchange log
//! - **Interests** (`interest`): closed keyword vocabulary with per-term counts
//! - **Suggestions** (`suggest`): at most one follow-up from frequent interests
//! - **Client session** (`session`, `storage`, `client`): persisted chat state
//! - **Server** (`server`, feature `server`): axum router for `/chat` and static files
//!
//! ## Library usage
//!
//! ```
//! use chatcsv::matcher;
//! use chatcsv::rules::RuleTable;
//!
//! let table = RuleTable::load("keyword,response,redirect_page\nhelp,Here you go,help.html\n");
//! let reply = matcher::find("Can you HELP me?", &table);
//! assert_eq!(reply.message, "Here you go");
//! assert_eq!(reply.redirect.as_deref(), Some("help.html"));
//! ```

pub mod chatlog;
pub mod client;
pub mod config;
pub mod error;
pub mod interest;
pub mod matcher;
pub mod paths;
pub mod rules;
#[cfg(feature = "server")]
pub mod server;
pub mod session;
pub mod storage;
pub mod suggest;

//! Rich diagnostic error types for chatcsv.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes, help text, and source chains. None of these are fatal
//! to a running server: callers on the request path log and fall back.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum ChatError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Rule(#[from] RuleError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Log(#[from] LogError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] crate::config::ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Client(#[from] crate::client::ClientError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Path(#[from] crate::paths::PathError),
}

// ---------------------------------------------------------------------------
// Rule table errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum RuleError {
    #[error("failed to read rule file: {path}")]
    #[diagnostic(
        code(chatcsv::rules::read),
        help(
            "The rule file must exist and be readable UTF-8 text with a \
             `keyword,response,redirect_page` header row. Without it every \
             message gets the default reply."
        )
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type RuleResult<T> = std::result::Result<T, RuleError>;

// ---------------------------------------------------------------------------
// Interaction log errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum LogError {
    #[error("failed to append to interaction log: {path}")]
    #[diagnostic(
        code(chatcsv::chatlog::append),
        help("Check that the log directory exists, is writable, and that the disk is not full.")
    )]
    Append {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("interaction log sink unavailable: {message}")]
    #[diagnostic(code(chatcsv::chatlog::unavailable))]
    Unavailable { message: String },
}

pub type LogResult<T> = std::result::Result<T, LogError>;

// ---------------------------------------------------------------------------
// Client storage errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum StorageError {
    #[error("I/O error on storage key \"{key}\": {source}")]
    #[diagnostic(
        code(chatcsv::storage::io),
        help(
            "A filesystem operation failed. Check that the storage directory exists, \
             has correct permissions, and that the disk is not full."
        )
    )]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("stored value for \"{key}\" is not valid: {message}")]
    #[diagnostic(
        code(chatcsv::storage::corrupt),
        help("The value will be ignored. Run `chatcsv clear` to reset local storage.")
    )]
    Corrupt { key: String, message: String },

    #[error("failed to encode value for \"{key}\": {message}")]
    #[diagnostic(code(chatcsv::storage::encode))]
    Encode { key: String, message: String },
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Convenience alias for the top-level result.
pub type ChatResult<T> = std::result::Result<T, ChatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subsystem_errors_keep_their_codes_through_chat_error() {
        let err: ChatError = RuleError::Read {
            path: "responses.csv".into(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        }
        .into();
        assert_eq!(err.to_string(), "failed to read rule file: responses.csv");
        assert_eq!(
            err.code().map(|c| c.to_string()).as_deref(),
            Some("chatcsv::rules::read")
        );

        let err: ChatError = crate::config::ConfigError::InvalidPort {
            value: "x".into(),
        }
        .into();
        assert_eq!(
            err.code().map(|c| c.to_string()).as_deref(),
            Some("chatcsv::config::port")
        );
    }

    #[test]
    fn storage_error_names_the_key() {
        let err = StorageError::Corrupt {
            key: "chatcsv-history".into(),
            message: "expected array".into(),
        };
        assert!(err.to_string().contains("chatcsv-history"));
        assert!(err.help().is_some());
    }
}

//! Append-only interaction log.
//!
//! Every completed exchange becomes one `timestamp,user,bot` line. Logging is
//! best-effort: [`InteractionLogger::record`] returns `()`, reports sink
//! failures through `tracing`, and counts them so operators (and tests) can see
//! that something went wrong without the chat response ever depending on it.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{SecondsFormat, Utc};

use crate::error::{LogError, LogResult};

/// One logged exchange, already sanitized for a line-oriented file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionRecord {
    pub timestamp: String,
    pub user_text: String,
    pub bot_text: String,
}

impl InteractionRecord {
    /// Build a record stamped with the current UTC time.
    pub fn now(user: &str, bot: &str) -> Self {
        Self::at(
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            user,
            bot,
        )
    }

    pub fn at(timestamp: impl Into<String>, user: &str, bot: &str) -> Self {
        Self {
            timestamp: timestamp.into(),
            user_text: sanitize(user),
            bot_text: sanitize(bot),
        }
    }

    /// The log line, including the trailing newline.
    pub fn to_line(&self) -> String {
        format!("{},{},{}\n", self.timestamp, self.user_text, self.bot_text)
    }
}

/// Replace `"` with `''` and fold each line break into a single space.
pub fn sanitize(text: &str) -> String {
    text.replace('"', "''").replace("\r\n", " ").replace('\n', " ")
}

/// Durable destination for log lines.
pub trait LogSink: Send + Sync {
    fn append(&self, line: &str) -> LogResult<()>;
}

/// Appends to a file, creating it on first write.
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl LogSink for FileSink {
    fn append(&self, line: &str) -> LogResult<()> {
        let append_err = |e| LogError::Append {
            path: self.path.display().to_string(),
            source: e,
        };
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(append_err)?;
        file.write_all(line.as_bytes()).map_err(append_err)
    }
}

/// Best-effort logger shared by all request handlers.
#[derive(Clone)]
pub struct InteractionLogger {
    sink: Arc<dyn LogSink>,
    failures: Arc<AtomicU64>,
}

impl std::fmt::Debug for InteractionLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractionLogger")
            .field("failures", &self.failure_count())
            .finish_non_exhaustive()
    }
}

impl InteractionLogger {
    pub fn new(sink: impl LogSink + 'static) -> Self {
        Self::from_arc(Arc::new(sink))
    }

    pub fn from_arc(sink: Arc<dyn LogSink>) -> Self {
        Self {
            sink,
            failures: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Logger appending to `path`.
    pub fn to_file(path: impl Into<PathBuf>) -> Self {
        Self::new(FileSink::new(path))
    }

    /// Record one exchange. Never fails.
    pub fn record(&self, user: &str, bot: &str) {
        let record = InteractionRecord::now(user, bot);
        if let Err(e) = self.sink.append(&record.to_line()) {
            self.failures.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(error = %e, "error writing to interaction log");
        }
    }

    /// Number of appends that failed since this logger was created.
    pub fn failure_count(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingSink;

    impl LogSink for FailingSink {
        fn append(&self, _line: &str) -> LogResult<()> {
            Err(LogError::Unavailable {
                message: "disk on fire".into(),
            })
        }
    }

    #[test]
    fn sanitize_quotes_and_newlines() {
        assert_eq!(sanitize("say \"hi\""), "say ''hi''");
        assert_eq!(sanitize("one\ntwo\r\nthree"), "one two three");
        assert_eq!(sanitize("plain"), "plain");
    }

    #[test]
    fn record_line_format() {
        let rec = InteractionRecord::at("2024-05-01T10:00:00.000Z", "he said \"go\"", "ok\nbye");
        assert_eq!(
            rec.to_line(),
            "2024-05-01T10:00:00.000Z,he said ''go'',ok bye\n"
        );
    }

    #[test]
    fn timestamp_is_iso8601_utc() {
        let rec = InteractionRecord::now("a", "b");
        assert!(rec.timestamp.ends_with('Z'), "{}", rec.timestamp);
        assert!(chrono::DateTime::parse_from_rfc3339(&rec.timestamp).is_ok());
    }

    #[test]
    fn file_sink_appends_one_line_per_record() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("chatlog.csv");
        let logger = InteractionLogger::to_file(&path);

        logger.record("hello", "Hi there!");
        logger.record("multi\nline", "quoted \"reply\"");

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(",hello,Hi there!"));
        assert!(lines[1].ends_with(",multi line,quoted ''reply''"));
        assert_eq!(logger.failure_count(), 0);
    }

    #[test]
    fn failing_sink_is_swallowed_and_counted() {
        let logger = InteractionLogger::new(FailingSink);
        logger.record("hello", "Hi");
        logger.record("again", "Hi");
        assert_eq!(logger.failure_count(), 2);
    }

    #[test]
    fn unwritable_path_does_not_panic() {
        let tmp = tempfile::TempDir::new().unwrap();
        // A directory cannot be opened for appending.
        let logger = InteractionLogger::to_file(tmp.path());
        logger.record("hello", "Hi");
        assert_eq!(logger.failure_count(), 1);
    }
}

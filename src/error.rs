//! Error types for lockguard.
//!
//! Only feed-level failures abort a run. Per-file problems
//! ([`Error::InvalidJson`], [`Error::Io`]) are absorbed by the scanner and
//! surfaced as warnings so that one bad lockfile never hides findings in
//! the others.

/// Errors raised by the lockguard library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The rule feed could not be retrieved (network error, non-success
    /// status, unreadable local file).
    #[error("rule feed unavailable: {feed}: {reason}")]
    FeedUnavailable {
        /// URL or path of the feed
        feed: String,
        /// Failure reason
        reason: String,
    },

    /// The rule feed body is not JSON or its top-level value is not an array.
    #[error("rule feed malformed: {0}")]
    FeedMalformed(String),

    /// A lockfile is not valid JSON.
    #[error("invalid JSON in {path}: {reason}")]
    InvalidJson {
        /// Lockfile path
        path: String,
        /// Parser error message
        reason: String,
    },

    /// Filesystem error while reading a lockfile or walking a directory.
    #[error("io error: {path}: {source}")]
    Io {
        /// Path involved
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration value.
    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_the_failing_input() {
        let unavailable = Error::FeedUnavailable {
            feed: "https://feed.invalid/rules.json".to_string(),
            reason: "HTTP 503".to_string(),
        };
        assert!(unavailable.to_string().contains("https://feed.invalid/rules.json"));

        let invalid = Error::InvalidJson {
            path: "a/package-lock.json".to_string(),
            reason: "EOF while parsing".to_string(),
        };
        assert_eq!(
            invalid.to_string(),
            "invalid JSON in a/package-lock.json: EOF while parsing"
        );
    }
}

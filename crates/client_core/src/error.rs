use thiserror::Error;

pub type Result<T> = std::result::Result<T, SubmitError>;

/// User-facing status messages keep at most this many characters of detail.
pub const STATUS_DETAIL_MAX_CHARS: usize = 60;

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("a document request is already in flight")]
    Busy,
    #[error("invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
    #[error("server error: {status} - {detail}")]
    Server { status: u16, detail: String },
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("failed to save document: {0}")]
    Save(#[from] std::io::Error),
}

impl SubmitError {
    /// Short status-line rendering of the failure. The detail is truncated on
    /// a character boundary so arbitrarily long server text stays readable.
    pub fn status_message(&self) -> String {
        let detail: String = self.to_string().chars().take(STATUS_DETAIL_MAX_CHARS).collect();
        format!("Error generating document. Please check the logs for details. (Error: {detail}...)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_message_truncates_long_detail() {
        let err = SubmitError::Server {
            status: 500,
            detail: "x".repeat(400),
        };
        let message = err.status_message();
        assert!(message.contains("server error: 500 - "));
        let detail_start = message.find("(Error: ").expect("detail marker") + "(Error: ".len();
        let detail_end = message.find("...)").expect("ellipsis marker");
        assert_eq!(message[detail_start..detail_end].chars().count(), STATUS_DETAIL_MAX_CHARS);
    }

    #[test]
    fn status_message_keeps_short_detail_intact() {
        let err = SubmitError::Server {
            status: 404,
            detail: "not found".into(),
        };
        assert!(err
            .status_message()
            .contains("(Error: server error: 404 - not found...)"));
    }

    #[test]
    fn status_message_truncates_on_char_boundaries() {
        let err = SubmitError::Server {
            status: 500,
            detail: "ф".repeat(200),
        };
        // Would panic on a byte-indexed slice through a multi-byte char.
        let message = err.status_message();
        assert!(message.ends_with("...)"));
    }

    #[test]
    fn busy_error_mentions_in_flight_request() {
        assert_eq!(
            SubmitError::Busy.to_string(),
            "a document request is already in flight"
        );
    }
}

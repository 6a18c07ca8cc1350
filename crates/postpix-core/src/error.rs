//! Error types module
//!
//! `PipelineError` is the taxonomy every stage failure is converted into at the
//! orchestrator boundary. The storage, processing, persistence and work source crates
//! define their own error enums and provide `From` conversions into it.
//!
//! Only [`PipelineError::Fatal`] aborts a run; every other variant fails a single
//! work item, which stays unacknowledged and is redelivered by the work source.

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Expected, permanent failures that will repeat on redelivery
    Warn,
    /// Unexpected or infrastructure failures
    Error,
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Source object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    #[error("Transient failure: {0}")]
    Transient(String),

    #[error("Image decode error: {0}")]
    Decode(String),

    #[error("Image encode error: {0}")]
    Encode(String),

    #[error("Malformed notification: {0}")]
    MalformedNotification(String),

    #[error("Fatal error: {0}")]
    Fatal(String),
}

/// Result type for pipeline stages
pub type PipelineResult<T> = Result<T, PipelineError>;

impl PipelineError {
    /// Machine-readable error code, used as a log field
    pub fn error_code(&self) -> &'static str {
        match self {
            PipelineError::NotFound { .. } => "NOT_FOUND",
            PipelineError::Transient(_) => "TRANSIENT",
            PipelineError::Decode(_) => "DECODE_ERROR",
            PipelineError::Encode(_) => "ENCODE_ERROR",
            PipelineError::MalformedNotification(_) => "MALFORMED_NOTIFICATION",
            PipelineError::Fatal(_) => "FATAL",
        }
    }

    /// Whether redelivering the same work item will fail the same way.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            PipelineError::NotFound { .. }
                | PipelineError::Decode(_)
                | PipelineError::Encode(_)
                | PipelineError::MalformedNotification(_)
        )
    }

    /// Whether this error aborts the whole run rather than a single item.
    pub fn is_fatal(&self) -> bool {
        matches!(self, PipelineError::Fatal(_))
    }

    pub fn log_level(&self) -> LogLevel {
        if self.is_permanent() {
            LogLevel::Warn
        } else {
            LogLevel::Error
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let not_found = PipelineError::NotFound {
            bucket: "in".to_string(),
            key: "input/a.jpg".to_string(),
        };
        assert!(not_found.is_permanent());
        assert!(!not_found.is_fatal());
        assert_eq!(not_found.to_string(), "Source object not found: in/input/a.jpg");

        let transient = PipelineError::Transient("connection reset".to_string());
        assert!(!transient.is_permanent());
        assert_eq!(transient.log_level(), LogLevel::Error);

        let fatal = PipelineError::Fatal("cannot create posts table".to_string());
        assert!(fatal.is_fatal());
        assert!(!fatal.is_permanent());

        assert_eq!(
            PipelineError::MalformedNotification("missing key".into()).log_level(),
            LogLevel::Warn
        );
        assert_eq!(PipelineError::Decode("bad".into()).error_code(), "DECODE_ERROR");
    }
}

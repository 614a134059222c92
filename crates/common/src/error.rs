//! Error types shared across Trimline crates.

/// Top-level error type for Trimline operations.
///
/// These errors stay inside the engine. Decode and worker-init failures are
/// logged and folded into degraded state before anything reaches the UI.
#[derive(Debug, thiserror::Error)]
pub enum TrimlineError {
    #[error("Decode error at {timestamp_secs:.3}s: {message}")]
    Decode {
        timestamp_secs: f64,
        message: String,
    },

    #[error("Worker init error: {message}")]
    WorkerInit { message: String },

    #[error("Source error: {message}")]
    Source { message: String },

    #[error("Viewport error: {message}")]
    Viewport { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using TrimlineError.
pub type TrimlineResult<T> = Result<T, TrimlineError>;

impl TrimlineError {
    pub fn decode(timestamp_secs: f64, msg: impl Into<String>) -> Self {
        Self::Decode {
            timestamp_secs,
            message: msg.into(),
        }
    }

    pub fn worker_init(msg: impl Into<String>) -> Self {
        Self::WorkerInit {
            message: msg.into(),
        }
    }

    pub fn source(msg: impl Into<String>) -> Self {
        Self::Source {
            message: msg.into(),
        }
    }

    pub fn viewport(msg: impl Into<String>) -> Self {
        Self::Viewport {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported {
            message: msg.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_display() {
        let err = TrimlineError::decode(1.5, "seek failed");
        assert_eq!(err.to_string(), "Decode error at 1.500s: seek failed");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: TrimlineError = io.into();
        assert!(matches!(err, TrimlineError::Io(_)));
    }
}

//! Unified error types for the capture engine.
//!
//! Each subsystem gets its own `thiserror` enum; `EngineError` is the
//! top-level type returned by the lifecycle controller and the binaries'
//! `main`.

use std::path::PathBuf;

/// Errors from loading or validating runtime configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no secret key supplied: set NETSENTRY_SECRET_KEY or NETSENTRY_SECRET_KEY_FILE")]
    MissingKey,

    #[error("secret key must decode to exactly 32 bytes, got {0}")]
    BadKeyLength(usize),

    #[error("failed to read key file {path}: {source}")]
    KeyFileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("NETSENTRY_SECRET_KEY is not valid base64: {0}")]
    BadKeyEncoding(#[from] base64::DecodeError),

    #[error("NETSENTRY_WRITER_INTERVAL_SECS is not a valid positive integer: {0}")]
    BadInterval(String),
}

/// Errors from the snapshot codec (framing + authenticated encryption).
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("record exceeds maximum frame length ({0} bytes)")]
    RecordTooLarge(usize),

    #[error("truncated frame: expected {expected} bytes, got {got}")]
    TruncatedFrame { expected: usize, got: usize },

    #[error("ciphertext shorter than nonce")]
    ShortCiphertext,

    #[error("authenticated decryption failed (corrupt data or wrong key)")]
    DecryptionFailed,

    #[error("authenticated encryption failed (corrupted key or broken AEAD backend)")]
    EncryptionFailed,

    #[error("plaintext is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors from the capture-driver abstraction (component E's external collaborator).
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("failed to enumerate capture interfaces: {0}")]
    Enumerate(String),

    #[error("failed to open interface {name}: {reason}")]
    Open { name: String, reason: String },

    #[error("failed to compile BPF filter {filter:?} on {name}: {reason}")]
    FilterCompile {
        name: String,
        filter: String,
        reason: String,
    },

    #[error("capture read failed on {name}: {reason}")]
    Read { name: String, reason: String },
}

/// Top-level error type for engine startup and fatal runtime conditions.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error("no capture interfaces could be opened")]
    NoInterfaces,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_missing_key_message() {
        let err = ConfigError::MissingKey;
        assert!(err.to_string().contains("NETSENTRY_SECRET_KEY"));
    }

    #[test]
    fn engine_error_wraps_config_error() {
        let err: EngineError = ConfigError::MissingKey.into();
        assert!(matches!(err, EngineError::Config(ConfigError::MissingKey)));
    }

    #[test]
    fn codec_error_display_is_non_empty() {
        for err in [
            CodecError::RecordTooLarge(10),
            CodecError::ShortCiphertext,
            CodecError::DecryptionFailed,
            CodecError::EncryptionFailed,
        ] {
            assert!(!err.to_string().is_empty());
        }
    }
}

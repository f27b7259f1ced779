//! Centralized runtime configuration for netsentry.
//!
//! Defaults are collected here as named constants (one place to find and
//! adjust them), and `EngineConfig::from_env` layers environment-variable
//! overrides on top — see spec.md §6 "Configuration inputs".

use std::path::{Path, PathBuf};

use base64::Engine;

use crate::error::ConfigError;

/// Default path for the authenticated-encrypted snapshot file.
pub const DEFAULT_ENCRYPTED_OUTPUT: &str = "packet_capture_encrypted.csv";

/// Default path for the cleartext on-demand snapshot file.
pub const DEFAULT_CLEARTEXT_OUTPUT: &str = "packet_capture_decrypted.csv";

/// Default periodic-writer tick interval (seconds).
pub const DEFAULT_WRITER_INTERVAL_SECS: u64 = 10;

/// Snaplen passed to `open_live` (spec.md §4.E).
pub const CAPTURE_SNAPLEN: i32 = 65536;

/// Read timeout passed to `open_live`, in milliseconds.
pub const CAPTURE_TIMEOUT_MS: i32 = 1000;

/// Length in bytes of the secret-box key (XSalsa20-Poly1305).
pub const KEY_LEN: usize = 32;

const ENV_ENCRYPTED_OUTPUT: &str = "NETSENTRY_ENCRYPTED_OUTPUT";
const ENV_CLEARTEXT_OUTPUT: &str = "NETSENTRY_CLEARTEXT_OUTPUT";
const ENV_WRITER_INTERVAL_SECS: &str = "NETSENTRY_WRITER_INTERVAL_SECS";
const ENV_SECRET_KEY: &str = "NETSENTRY_SECRET_KEY";
const ENV_SECRET_KEY_FILE: &str = "NETSENTRY_SECRET_KEY_FILE";

/// Fully resolved runtime configuration for one engine instance.
#[derive(Clone)]
pub struct EngineConfig {
    pub encrypted_output: PathBuf,
    pub cleartext_output: PathBuf,
    pub writer_interval_secs: u64,
    pub secret_key: [u8; KEY_LEN],
}

impl EngineConfig {
    /// Load configuration from environment variables, applying defaults for
    /// everything except the secret key, which is mandatory (§9: the source
    /// ships a hard-coded key; this is the deliberate behavioural change —
    /// refuse to start without one).
    pub fn from_env() -> Result<Self, ConfigError> {
        let encrypted_output = std::env::var(ENV_ENCRYPTED_OUTPUT)
            .unwrap_or_else(|_| DEFAULT_ENCRYPTED_OUTPUT.to_string())
            .into();
        let cleartext_output = std::env::var(ENV_CLEARTEXT_OUTPUT)
            .unwrap_or_else(|_| DEFAULT_CLEARTEXT_OUTPUT.to_string())
            .into();
        let writer_interval_secs = match std::env::var(ENV_WRITER_INTERVAL_SECS) {
            Ok(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|v| *v > 0)
                .ok_or(ConfigError::BadInterval(raw))?,
            Err(_) => DEFAULT_WRITER_INTERVAL_SECS,
        };
        let secret_key = load_secret_key()?;

        Ok(Self {
            encrypted_output,
            cleartext_output,
            writer_interval_secs,
            secret_key,
        })
    }
}

fn load_secret_key() -> Result<[u8; KEY_LEN], ConfigError> {
    if let Ok(encoded) = std::env::var(ENV_SECRET_KEY) {
        let bytes = base64::engine::general_purpose::STANDARD.decode(encoded.trim())?;
        return to_key_array(bytes);
    }
    if let Ok(path) = std::env::var(ENV_SECRET_KEY_FILE) {
        let bytes = read_key_file(Path::new(&path))?;
        return to_key_array(bytes);
    }
    Err(ConfigError::MissingKey)
}

fn read_key_file(path: &Path) -> Result<Vec<u8>, ConfigError> {
    std::fs::read(path).map_err(|source| ConfigError::KeyFileRead {
        path: path.to_path_buf(),
        source,
    })
}

fn to_key_array(bytes: Vec<u8>) -> Result<[u8; KEY_LEN], ConfigError> {
    if bytes.len() != KEY_LEN {
        return Err(ConfigError::BadKeyLength(bytes.len()));
    }
    let mut key = [0u8; KEY_LEN];
    key.copy_from_slice(&bytes);
    Ok(key)
}

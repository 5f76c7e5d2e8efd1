use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the entire manager backend.
/// Every module returns `Result<T, ManagerError>`.
#[derive(Debug, Error)]
pub enum ManagerError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Target directory ────────────────────────────────
    #[error("Not a valid game directory: {path:?} ({reason})")]
    InvalidTarget { path: PathBuf, reason: String },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Server returned HTTP {status} for {url}")]
    Remote { url: String, status: u16 },

    #[error("Cannot pick a release asset for pattern {pattern:?}, candidates: {candidates:?}")]
    Resolution {
        pattern: String,
        candidates: Vec<String>,
    },

    // ── Archives ────────────────────────────────────────
    #[error("Archive is not a valid zip: {0}")]
    CorruptArchive(String),

    #[error("Extraction aborted: {0}")]
    Extraction(String),

    // ── Platform ────────────────────────────────────────
    #[error("Unsupported platform: {os}/{arch}")]
    UnsupportedPlatform { os: String, arch: String },

    // ── JSON ────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type ManagerResult<T> = Result<T, ManagerError>;

impl From<std::io::Error> for ManagerError {
    fn from(source: std::io::Error) -> Self {
        ManagerError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

// ── Serialization for Tauri IPC ─────────────────────────
// Tauri commands require the error type to implement `Serialize`.
impl serde::Serialize for ManagerError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

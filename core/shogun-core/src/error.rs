//! Error types for shogun-core operations.

use std::path::PathBuf;

// ═══════════════════════════════════════════════════════════════════════════════
// Engine Errors
// ═══════════════════════════════════════════════════════════════════════════════

/// Errors from configuration and local storage.
///
/// Network failures are not represented here: they are normalized into
/// [`FetchError`] and turned into UI state at the operation boundary.
#[derive(Debug, thiserror::Error)]
pub enum ShogunError {
    // ─────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("Configuration write failed: {path}: {source}")]
    ConfigWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ─────────────────────────────────────────────────────────────────────
    // I/O Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON parsing error: {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Preference store unavailable: {0}")]
    StoreUnavailable(String),
}

/// Convenience type alias for Results using ShogunError.
pub type Result<T> = std::result::Result<T, ShogunError>;

// ═══════════════════════════════════════════════════════════════════════════════
// Fetch Errors
// ═══════════════════════════════════════════════════════════════════════════════

/// A failed request against the backend.
///
/// Transport and protocol failures are both "fetch failed" for display
/// purposes; the variants are kept apart for logging.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("{0}")]
    Transport(String),

    #[error("HTTP error: {code}")]
    Status { code: u16, body: String },

    #[error("invalid response: {0}")]
    Decode(String),
}

impl FetchError {
    /// Human-readable message suitable for an inline error label.
    pub fn message(&self) -> String {
        self.to_string()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Dispatch Errors
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// Blank command text. Never reaches the network.
    #[error("command text is empty")]
    EmptyCommand,

    /// The backend answered `success: false`.
    #[error("command rejected: {}", .reason.as_deref().unwrap_or("unknown"))]
    Rejected { reason: Option<String> },

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("skill candidate is not pending review: {0}")]
    NotPending(String),

    #[error("rejection reason input is not open for: {0}")]
    ReviewNotOpen(String),

    #[error("a command is already in flight")]
    Busy,
}

impl DispatchError {
    pub fn is_validation(&self) -> bool {
        matches!(self, DispatchError::EmptyCommand)
    }

    /// The reason to show after the failure prefix; `None` means "unknown".
    pub fn reason(&self) -> Option<String> {
        match self {
            DispatchError::Rejected { reason } => reason.clone(),
            DispatchError::Fetch(err) => Some(err.message()),
            DispatchError::EmptyCommand
            | DispatchError::NotPending(_)
            | DispatchError::ReviewNotOpen(_)
            | DispatchError::Busy => Some(self.to_string()),
        }
    }
}

// ── Core error types ──
//
// User-facing errors from uniform-core. Consumers never see HTTP status
// codes or JSON parse failures directly: directory and wait failures are
// folded in here with the device MAC, the attempted operation, and the last
// observed state attached.

use thiserror::Error;

use crate::directory::DirectoryError;
use crate::lifecycle::WaitError;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to controller at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Device {mac} not found in site '{site}'")]
    DeviceNotFound { site: String, mac: String },

    #[error("Entity not found: {entity_type} with id {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    // ── Lifecycle errors ─────────────────────────────────────────────
    #[error("Device {mac} is not adopted and adoption is disabled (allow_adoption = false)")]
    AdoptionDisabled { mac: String },

    #[error(
        "Timed out after {elapsed_secs}s waiting for device {mac} to reach '{target}' during {operation} (last state: {})",
        .last_state.as_deref().unwrap_or("none observed")
    )]
    WaitTimedOut {
        operation: String,
        mac: String,
        target: String,
        last_state: Option<String>,
        elapsed_secs: u64,
    },

    #[error(
        "Device {mac} entered unexpected state '{state}' during {operation} (waiting for '{target}')"
    )]
    UnexpectedState {
        operation: String,
        mac: String,
        state: String,
        target: String,
    },

    #[error("Device {mac} disappeared from the controller during {operation} ({checks} consecutive not-found polls)")]
    Vanished {
        operation: String,
        mac: String,
        checks: u32,
    },

    #[error("{operation} of {mac} was cancelled")]
    Cancelled { operation: String, mac: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("MAC address {mac} is already registered (set allow_existing = true to manage the existing record)")]
    MacConflict { mac: String },

    #[error("'{field}' cannot change from '{prior}' to '{planned}' without replacing the resource")]
    ImmutableField {
        field: String,
        prior: String,
        planned: String,
    },

    #[error("Invalid import id '{id}': {reason}")]
    InvalidImportId { id: String, reason: String },

    #[error("Invalid value for {field}: {message}")]
    ValidationFailed { field: String, message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("{operation} of {subject} failed: {message}")]
    Api {
        operation: String,
        subject: String,
        message: String,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Fold a directory failure into a user-facing error.
    ///
    /// `subject` is the MAC or id the call addressed.
    pub fn directory(operation: &str, site: &str, subject: &str, err: DirectoryError) -> Self {
        match err {
            DirectoryError::NotFound { .. } => Self::DeviceNotFound {
                site: site.to_owned(),
                mac: subject.to_owned(),
            },
            DirectoryError::MacInUse { mac } => Self::MacConflict { mac },
            other => Self::Api {
                operation: operation.to_owned(),
                subject: subject.to_owned(),
                message: other.to_string(),
            },
        }
    }

    /// Fold a wait failure into a user-facing error.
    pub fn from_wait(err: WaitError, mac: &str) -> Self {
        let mac = mac.to_owned();
        match err {
            WaitError::Timeout {
                operation,
                target,
                last_state,
                elapsed,
            } => Self::WaitTimedOut {
                operation: operation.to_owned(),
                mac,
                target,
                last_state,
                elapsed_secs: elapsed.as_secs(),
            },
            WaitError::UnexpectedState {
                operation,
                state,
                target,
            } => Self::UnexpectedState {
                operation: operation.to_owned(),
                mac,
                state,
                target,
            },
            WaitError::NotFound { operation, checks } => Self::Vanished {
                operation: operation.to_owned(),
                mac,
                checks,
            },
            WaitError::Cancelled { operation } => Self::Cancelled {
                operation: operation.to_owned(),
                mac,
            },
            WaitError::Directory { operation, source } => Self::Api {
                operation: operation.to_owned(),
                subject: mac,
                message: source.to_string(),
            },
        }
    }

    /// Short, stable headline for diagnostics.
    pub fn summary(&self) -> &'static str {
        match self {
            Self::ConnectionFailed { .. } => "Cannot connect to controller",
            Self::AuthenticationFailed { .. } => "Authentication failed",
            Self::DeviceNotFound { .. } => "Device not found",
            Self::NotFound { .. } => "Object not found",
            Self::AdoptionDisabled { .. } => "Device requires adoption",
            Self::WaitTimedOut { .. } => "Timed out waiting for device state",
            Self::UnexpectedState { .. } => "Unexpected device state",
            Self::Vanished { .. } => "Device disappeared",
            Self::Cancelled { .. } => "Operation cancelled",
            Self::MacConflict { .. } => "MAC address already registered",
            Self::ImmutableField { .. } => "Attribute requires replacement",
            Self::InvalidImportId { .. } => "Invalid import id",
            Self::ValidationFailed { .. } => "Invalid configuration",
            Self::Api { .. } => "Controller API error",
            Self::Config { .. } => "Provider configuration error",
            Self::Internal(_) => "Internal error",
        }
    }

    /// Attribute path the error is attached to, when there is one.
    pub fn attribute(&self) -> Option<&str> {
        match self {
            Self::ImmutableField { field, .. } | Self::ValidationFailed { field, .. } => {
                Some(field.as_str())
            }
            Self::AdoptionDisabled { .. } => Some("allow_adoption"),
            Self::MacConflict { .. } => Some("mac"),
            _ => None,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<uniform_api::Error> for CoreError {
    fn from(err: uniform_api::Error) -> Self {
        match err {
            uniform_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            uniform_api::Error::Transport(ref e) if e.is_connect() || e.is_timeout() => {
                CoreError::ConnectionFailed {
                    url: e
                        .url()
                        .map_or_else(|| "<unknown>".into(), ToString::to_string),
                    reason: e.to_string(),
                }
            }
            uniform_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            uniform_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            uniform_api::Error::NotFound { resource } => CoreError::NotFound {
                entity_type: "resource".into(),
                identifier: resource,
            },
            uniform_api::Error::MacInUse { mac } => CoreError::MacConflict { mac },
            uniform_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
            other => CoreError::Api {
                operation: "request".into(),
                subject: "controller".into(),
                message: other.to_string(),
            },
        }
    }
}

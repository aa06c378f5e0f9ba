//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use uniform_config::ConfigError;
use uniform_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const CANCELLED: i32 = 130;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to controller at {url}: {reason}")]
    #[diagnostic(
        code(uniform::connection_failed),
        help(
            "Check that the controller is running and reachable.\n\
             Self-signed certificate? Retry with --insecure (-k)."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(uniform::auth_failed),
        help("Verify the username and password for profile '{profile}'.")
    )]
    AuthFailed { profile: String, message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(uniform::no_credentials),
        help("Set UNIFI_USERNAME and UNIFI_PASSWORD, or add them to the profile.")
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(code(uniform::not_found), help("{hint}"))]
    NotFound {
        resource_type: String,
        identifier: String,
        hint: String,
    },

    #[error("{message}")]
    #[diagnostic(code(uniform::conflict))]
    Conflict { message: String },

    // ── Lifecycle ────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(
        code(uniform::lifecycle_timeout),
        help("Raise the wait under [profiles.<name>.lifecycle] or check the device's uplink.")
    )]
    Timeout { message: String },

    #[error("{message}")]
    #[diagnostic(code(uniform::lifecycle))]
    Lifecycle { message: String },

    #[error("Interrupted")]
    #[diagnostic(code(uniform::cancelled))]
    Cancelled,

    // ── API ──────────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(uniform::api_error))]
    Api { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(uniform::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(uniform::profile_not_found),
        help(
            "Add [profiles.{name}] to {path}\n\
             or set UNIFI_API, UNIFI_USERNAME and UNIFI_PASSWORD."
        )
    )]
    ProfileNotFound { name: String, path: String },

    #[error(transparent)]
    #[diagnostic(code(uniform::config))]
    Config(ConfigError),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error("Cannot access {path}: {source}")]
    #[diagnostic(code(uniform::io))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    #[diagnostic(
        code(uniform::json),
        help("State files are written by uniform; re-run import to recreate.")
    )]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid plan in {path}: {source}")]
    #[diagnostic(
        code(uniform::plan),
        help("Plans are YAML or JSON documents; `mac` is required.")
    )]
    Plan {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Conflict { .. } => exit_code::CONFLICT,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Cancelled => exit_code::CANCELLED,
            Self::Validation { .. }
            | Self::Plan { .. }
            | Self::ProfileNotFound { .. }
            | Self::Config(_) => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed { url, reason },
            CoreError::AuthenticationFailed { message } => Self::AuthFailed {
                profile: "current".into(),
                message,
            },
            CoreError::DeviceNotFound { site, mac } => Self::NotFound {
                resource_type: "device".into(),
                identifier: mac,
                hint: format!("Run: uniform device list --site {site}"),
            },
            CoreError::NotFound {
                entity_type,
                identifier,
            } => Self::NotFound {
                hint: format!("Check the {entity_type} id or import by MAC instead."),
                resource_type: entity_type,
                identifier,
            },
            e @ (CoreError::MacConflict { .. } | CoreError::AdoptionDisabled { .. }) => {
                Self::Conflict {
                    message: e.to_string(),
                }
            }
            e @ CoreError::WaitTimedOut { .. } => Self::Timeout {
                message: e.to_string(),
            },
            e @ (CoreError::UnexpectedState { .. } | CoreError::Vanished { .. }) => {
                Self::Lifecycle {
                    message: e.to_string(),
                }
            }
            CoreError::Cancelled { .. } => Self::Cancelled,
            CoreError::ImmutableField {
                field,
                prior,
                planned,
            } => Self::Validation {
                field,
                reason: format!("cannot change from '{prior}' to '{planned}'; destroy and re-apply"),
            },
            CoreError::InvalidImportId { id, reason } => Self::Validation {
                field: "id".into(),
                reason: format!("'{id}': {reason}"),
            },
            CoreError::ValidationFailed { field, message } => Self::Validation {
                field,
                reason: message,
            },
            CoreError::Config { message } => Self::Validation {
                field: "config".into(),
                reason: message,
            },
            e @ (CoreError::Api { .. } | CoreError::Internal(_)) => Self::Api {
                message: e.to_string(),
            },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::UnknownProfile { name } => Self::ProfileNotFound {
                name,
                path: uniform_config::config_path().display().to_string(),
            },
            other => Self::Config(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_errors_get_distinct_exit_codes() {
        let timeout: CliError = CoreError::WaitTimedOut {
            operation: "adopt".into(),
            mac: "aa:bb:cc:dd:ee:ff".into(),
            target: "connected".into(),
            last_state: Some("adopting".into()),
            elapsed_secs: 120,
        }
        .into();
        assert_eq!(timeout.exit_code(), exit_code::TIMEOUT);

        let gated: CliError = CoreError::AdoptionDisabled {
            mac: "aa:bb:cc:dd:ee:ff".into(),
        }
        .into();
        assert_eq!(gated.exit_code(), exit_code::CONFLICT);

        let missing: CliError = CoreError::DeviceNotFound {
            site: "default".into(),
            mac: "aa:bb:cc:dd:ee:ff".into(),
        }
        .into();
        assert_eq!(missing.exit_code(), exit_code::NOT_FOUND);
    }
}

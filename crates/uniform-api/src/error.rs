use thiserror::Error;

/// Top-level error type for the `uniform-api` crate.
///
/// Controller failures are classified here, at the HTTP boundary, so
/// callers branch on variants instead of matching message text.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login failed or the session was rejected.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Legacy API ──────────────────────────────────────────────────
    /// The addressed object does not exist (HTTP 404, empty lookup, or an
    /// `api.err.*NotFound` envelope code).
    #[error("{resource} not found")]
    NotFound { resource: String },

    /// `api.err.UnknownDevice` -- returned spuriously for a few seconds
    /// while a device is being forgotten or re-adopted.
    #[error("Controller reported unknown device")]
    UnknownDevice,

    /// `api.err.MacUsed` -- the MAC is already registered on this site.
    #[error("MAC address {mac} is already in use")]
    MacInUse { mac: String },

    /// Any other error from the `{meta: {rc, msg}}` envelope.
    #[error("Legacy API error: {message}")]
    LegacyApi { message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    // ── Platform ────────────────────────────────────────────────────
    /// Operation not supported on this controller platform.
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(&'static str),
}

impl Error {
    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::NotFound { .. } => true,
            _ => false,
        }
    }

    /// Classify an envelope `meta.msg` code into a typed error.
    ///
    /// `subject` names what the request addressed (a MAC or id) and is
    /// carried into `NotFound` / `MacInUse` for diagnostics.
    pub fn from_envelope_code(code: &str, subject: &str) -> Self {
        match code {
            "api.err.UnknownDevice" => Self::UnknownDevice,
            "api.err.MacUsed" => Self::MacInUse {
                mac: subject.to_owned(),
            },
            c if c.ends_with("NotFound") || c == "api.err.UnknownUser" => Self::NotFound {
                resource: subject.to_owned(),
            },
            other => Self::LegacyApi {
                message: other.to_owned(),
            },
        }
    }
}

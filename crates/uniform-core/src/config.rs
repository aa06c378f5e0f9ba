// ── Runtime provider configuration ──
//
// These types describe how to reach a controller and how patiently to wait
// on it. They carry credential data but never touch disk; `uniform-config`
// builds a `ProviderConfig` and hands it in.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

/// Default wait for an adoption to reach `Connected`.
pub const DEFAULT_ADOPT_TIMEOUT: Duration = Duration::from_secs(120);
/// Default wait for a configuration apply to settle back to `Connected`.
pub const DEFAULT_APPLY_TIMEOUT: Duration = Duration::from_secs(60);
/// Default wait for a forgotten device to return to `Pending`.
pub const DEFAULT_FORGET_TIMEOUT: Duration = Duration::from_secs(60);
/// How long an update keeps retrying a not-found answer while the
/// controller propagates a freshly adopted device.
pub const DEFAULT_UPDATE_RETRY: Duration = Duration::from_secs(30);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
/// Consecutive not-found polls tolerated before a wait gives up.
pub const DEFAULT_NOT_FOUND_TOLERANCE: u32 = 30;

/// Timing knobs for the device lifecycle controller.
///
/// Controller responsiveness varies a lot with deployment size, so every
/// value is overridable from the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleTimeouts {
    pub adopt: Duration,
    pub apply: Duration,
    pub forget: Duration,
    pub update_retry: Duration,
    pub poll_interval: Duration,
    pub not_found_tolerance: u32,
}

impl Default for LifecycleTimeouts {
    fn default() -> Self {
        Self {
            adopt: DEFAULT_ADOPT_TIMEOUT,
            apply: DEFAULT_APPLY_TIMEOUT,
            forget: DEFAULT_FORGET_TIMEOUT,
            update_retry: DEFAULT_UPDATE_RETRY,
            poll_interval: DEFAULT_POLL_INTERVAL,
            not_found_tolerance: DEFAULT_NOT_FOUND_TOLERANCE,
        }
    }
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed certs).
    DangerAcceptInvalid,
}

/// Configuration for managing a single controller.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Controller URL (e.g., `https://192.168.1.1`).
    pub url: Url,
    pub username: String,
    pub password: SecretString,
    /// Site used when a resource does not name one.
    pub site: String,
    pub tls: TlsVerification,
    /// Per-request HTTP timeout.
    pub timeout: Duration,
    pub lifecycle: LifecycleTimeouts,
}

//! Profile configuration for uniform.
//!
//! TOML profiles, `UNIFI_*` environment overrides, credential resolution
//! (env + keyring + plaintext), and translation to
//! `uniform_core::ProviderConfig`. The CLI layers its flag overrides on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use uniform_core::{LifecycleTimeouts, ProviderConfig, TlsVerification};

/// Keyring service name credentials are stored under.
pub const KEYRING_SERVICE: &str = "uniform";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{name}' not found in config")]
    UnknownProfile { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named controller profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default)]
    pub insecure: bool,

    /// Per-request HTTP timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named controller profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Controller base URL (e.g., "https://192.168.1.1").
    #[serde(default)]
    pub controller: String,

    /// Site used when a resource does not name one.
    #[serde(default = "default_site")]
    pub site: String,

    pub username: Option<String>,

    /// Password (plaintext, prefer keyring or `UNIFI_PASSWORD`).
    pub password: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Accept self-signed certificates.
    pub insecure: Option<bool>,

    /// Override the HTTP timeout (seconds).
    pub timeout: Option<u64>,

    #[serde(default)]
    pub lifecycle: LifecycleProfile,
}

fn default_site() -> String {
    "default".into()
}

/// Lifecycle wait overrides. Durations use humantime syntax (`90s`, `2m`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct LifecycleProfile {
    pub adopt_timeout: Option<String>,
    pub apply_timeout: Option<String>,
    pub forget_timeout: Option<String>,
    pub update_retry: Option<String>,
    pub poll_interval: Option<String>,
    pub not_found_tolerance: Option<u32>,
}

impl LifecycleProfile {
    /// Overlay these overrides onto the built-in defaults.
    pub fn to_timeouts(&self) -> Result<LifecycleTimeouts, ConfigError> {
        let defaults = LifecycleTimeouts::default();
        Ok(LifecycleTimeouts {
            adopt: parse_duration("lifecycle.adopt_timeout", self.adopt_timeout.as_deref())?
                .unwrap_or(defaults.adopt),
            apply: parse_duration("lifecycle.apply_timeout", self.apply_timeout.as_deref())?
                .unwrap_or(defaults.apply),
            forget: parse_duration("lifecycle.forget_timeout", self.forget_timeout.as_deref())?
                .unwrap_or(defaults.forget),
            update_retry: parse_duration("lifecycle.update_retry", self.update_retry.as_deref())?
                .unwrap_or(defaults.update_retry),
            poll_interval: parse_duration("lifecycle.poll_interval", self.poll_interval.as_deref())?
                .unwrap_or(defaults.poll_interval),
            not_found_tolerance: self
                .not_found_tolerance
                .unwrap_or(defaults.not_found_tolerance),
        })
    }
}

fn parse_duration(field: &str, raw: Option<&str>) -> Result<Option<Duration>, ConfigError> {
    raw.map(|raw| {
        humantime::parse_duration(raw).map_err(|e| ConfigError::Validation {
            field: field.into(),
            reason: format!("'{raw}': {e}"),
        })
    })
    .transpose()
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "uniform", "uniform").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("uniform");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the full Config from `path` + environment. A missing file is
/// not an error.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("UNIFI_DEFAULTS_").map(|key| format!("defaults.{key}").into()));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if loading fails.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(&path, toml_str)?;
    Ok(())
}

// ── Profile resolution ──────────────────────────────────────────────

/// Pick the named profile (or the config's default) and apply the
/// `UNIFI_API`, `UNIFI_SITE`, `UNIFI_INSECURE` and `UNIFI_USERNAME`
/// environment overrides.
///
/// A missing profile is only an error when the environment does not
/// supply a controller URL either.
pub fn resolve_profile(
    config: &Config,
    requested: Option<&str>,
) -> Result<(String, Profile), ConfigError> {
    let name = requested
        .map(str::to_owned)
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into());

    let stored = config.profiles.get(&name).cloned();
    let found = stored.is_some();
    let mut base = stored.unwrap_or_else(|| Profile {
        site: default_site(),
        ..Profile::default()
    });
    if base.insecure.is_none() && config.defaults.insecure {
        base.insecure = Some(true);
    }
    if base.timeout.is_none() {
        base.timeout = Some(config.defaults.timeout);
    }

    let profile: Profile = Figment::from(Serialized::defaults(base))
        .merge(
            Env::prefixed("UNIFI_")
                .only(&["api", "site", "insecure", "username"])
                .map(|key| {
                    if key.as_str().eq_ignore_ascii_case("api") {
                        "controller".into()
                    } else {
                        key.as_str().to_ascii_lowercase().into()
                    }
                }),
        )
        .extract()?;

    if !found && profile.controller.is_empty() {
        return Err(ConfigError::UnknownProfile { name });
    }
    Ok((name, profile))
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve username + password: env var, then keyring, then plaintext.
pub fn resolve_credentials(
    profile: &Profile,
    profile_name: &str,
) -> Result<(String, SecretString), ConfigError> {
    let username = profile
        .username
        .clone()
        .or_else(|| std::env::var("UNIFI_USERNAME").ok())
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
        })?;

    // 1. Env var
    if let Ok(pw) = std::env::var("UNIFI_PASSWORD") {
        return Ok((username, SecretString::from(pw)));
    }

    // 2. Keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password")) {
        if let Ok(pw) = entry.get_password() {
            return Ok((username, SecretString::from(pw)));
        }
    }

    // 3. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok((username, SecretString::from(pw.clone())));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Build a `ProviderConfig` from a resolved profile.
pub fn profile_to_provider_config(
    profile: &Profile,
    profile_name: &str,
) -> Result<ProviderConfig, ConfigError> {
    let url: url::Url = profile
        .controller
        .parse()
        .map_err(|_| ConfigError::Validation {
            field: "controller".into(),
            reason: format!("invalid URL: '{}'", profile.controller),
        })?;

    let (username, password) = resolve_credentials(profile, profile_name)?;

    let tls = if profile.insecure.unwrap_or(false) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    Ok(ProviderConfig {
        url,
        username,
        password,
        site: profile.site.clone(),
        tls,
        timeout: Duration::from_secs(profile.timeout.unwrap_or_else(default_timeout)),
        lifecycle: profile.lifecycle.to_timeouts()?,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use figment::Jail;
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    const CONFIG: &str = r#"
        default_profile = "home"

        [defaults]
        timeout = 45

        [profiles.home]
        controller = "https://192.168.1.1"
        site = "default"
        username = "admin"

        [profiles.home.lifecycle]
        adopt_timeout = "5m"
        poll_interval = "2s"

        [profiles.lab]
        controller = "https://lab.example.com:8443"
        site = "lab"
        insecure = true
    "#;

    fn load(jail: &Jail) -> Config {
        load_config_from(&jail.directory().join("config.toml")).unwrap()
    }

    #[test]
    fn loads_profiles_from_file() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", CONFIG)?;
            let config = load(jail);

            assert_eq!(config.default_profile.as_deref(), Some("home"));
            assert_eq!(config.defaults.timeout, 45);
            assert_eq!(config.profiles.len(), 2);
            assert_eq!(config.profiles["lab"].insecure, Some(true));
            Ok(())
        });
    }

    #[test]
    fn missing_file_yields_defaults() {
        Jail::expect_with(|jail| {
            let config = load(jail);
            assert_eq!(config.default_profile.as_deref(), Some("default"));
            assert!(config.profiles.is_empty());
            Ok(())
        });
    }

    #[test]
    fn env_overrides_profile_fields() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", CONFIG)?;
            jail.set_env("UNIFI_API", "https://10.0.0.1");
            jail.set_env("UNIFI_SITE", "branch");
            jail.set_env("UNIFI_INSECURE", "true");

            let (name, profile) = resolve_profile(&load(jail), None).unwrap();

            assert_eq!(name, "home");
            assert_eq!(profile.controller, "https://10.0.0.1");
            assert_eq!(profile.site, "branch");
            assert_eq!(profile.insecure, Some(true));
            assert_eq!(profile.timeout, Some(45));
            Ok(())
        });
    }

    #[test]
    fn env_alone_is_enough_without_a_file() {
        Jail::expect_with(|jail| {
            jail.set_env("UNIFI_API", "https://unifi.local");
            jail.set_env("UNIFI_USERNAME", "terraform");
            jail.set_env("UNIFI_PASSWORD", "hunter2");

            let (name, profile) = resolve_profile(&load(jail), None).unwrap();
            let provider = profile_to_provider_config(&profile, &name).unwrap();

            assert_eq!(provider.url.as_str(), "https://unifi.local/");
            assert_eq!(provider.username, "terraform");
            assert_eq!(provider.password.expose_secret(), "hunter2");
            assert_eq!(provider.site, "default");
            assert_eq!(provider.tls, TlsVerification::SystemDefaults);
            Ok(())
        });
    }

    #[test]
    fn unknown_profile_without_env_is_an_error() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", CONFIG)?;
            let err = resolve_profile(&load(jail), Some("office")).unwrap_err();
            assert!(matches!(err, ConfigError::UnknownProfile { ref name } if name == "office"));
            Ok(())
        });
    }

    #[test]
    fn lifecycle_overrides_parse_humantime() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", CONFIG)?;
            jail.set_env("UNIFI_PASSWORD", "secret");

            let (name, profile) = resolve_profile(&load(jail), Some("home")).unwrap();
            let provider = profile_to_provider_config(&profile, &name).unwrap();

            assert_eq!(provider.lifecycle.adopt, Duration::from_secs(300));
            assert_eq!(provider.lifecycle.poll_interval, Duration::from_secs(2));
            assert_eq!(provider.lifecycle.apply, LifecycleTimeouts::default().apply);
            assert_eq!(provider.timeout, Duration::from_secs(45));
            Ok(())
        });
    }

    #[test]
    fn bad_duration_is_a_validation_error() {
        let lifecycle = LifecycleProfile {
            forget_timeout: Some("soon".into()),
            ..LifecycleProfile::default()
        };
        let err = lifecycle.to_timeouts().unwrap_err();
        assert!(
            matches!(
                err,
                ConfigError::Validation { ref field, .. } if field == "lifecycle.forget_timeout"
            )
        );
    }
}

//! Command dispatch and the plan/state file plumbing shared by handlers.

pub mod device;
pub mod user;

use std::io::IsTerminal;
use std::path::Path;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use uniform_core::{Diagnostic, Provider, ProviderConfig};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;
use crate::output;

/// Everything a handler needs besides its own arguments.
pub struct Context<'a> {
    pub global: &'a GlobalOpts,
    pub cancel: CancellationToken,
}

impl Context<'_> {
    /// Resolve the profile, log in, and build the provider.
    pub async fn connect(&self) -> Result<(Provider, ProviderConfig), CliError> {
        let config = crate::config::resolve(self.global)?;
        let spinner = self.spinner(format!("Connecting to {}", config.url));
        let directory = uniform_core::connect(&config).await;
        spinner.finish_and_clear();
        let provider = Provider::with_directory(directory?, &config);
        Ok((provider, config))
    }

    /// Spinner on stderr; hidden when quiet or not attached to a terminal.
    pub fn spinner(&self, message: String) -> ProgressBar {
        if self.global.quiet || !std::io::stderr().is_terminal() {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg} ({elapsed})") {
            bar.set_style(style);
        }
        bar.set_message(message);
        bar.enable_steady_tick(Duration::from_millis(120));
        bar
    }

    /// Print warnings; fail when any diagnostic is an error.
    pub fn check(&self, diagnostics: &[Diagnostic]) -> Result<(), CliError> {
        output::print_diagnostics(diagnostics, output::should_color(&self.global.color));
        match diagnostics.iter().find(|d| d.is_error()) {
            Some(first) => Err(CliError::Validation {
                field: first.attribute.clone().unwrap_or_else(|| "plan".into()),
                reason: format!("{}: {}", first.summary, first.detail),
            }),
            None => Ok(()),
        }
    }

    pub fn print(&self, rendered: &str) {
        output::print_output(rendered, self.global.quiet);
    }
}

pub async fn dispatch(cmd: Command, ctx: &Context<'_>) -> Result<(), CliError> {
    match cmd {
        Command::Device(args) => device::handle(args.command, ctx).await,
        Command::User(args) => user::handle(args.command, ctx).await,
        // Handled before dispatch
        Command::Completions(_) => Ok(()),
    }
}

// ── Plan / state files ──────────────────────────────────────────────

/// Parse a plan document. YAML is a superset of JSON, so both work.
pub fn read_plan<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let raw = read_file(path)?;
    serde_yaml::from_str(&raw).map_err(|source| CliError::Plan {
        path: path.display().to_string(),
        source,
    })
}

pub fn read_state<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let raw = read_file(path)?;
    serde_json::from_str(&raw).map_err(|source| CliError::Json {
        path: path.display().to_string(),
        source,
    })
}

pub fn write_state<T: Serialize>(path: &Path, state: &T) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(state).map_err(|source| CliError::Json {
        path: path.display().to_string(),
        source,
    })?;
    std::fs::write(path, json + "\n").map_err(|source| CliError::Io {
        path: path.display().to_string(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "state written");
    Ok(())
}

pub fn remove_state(path: &Path) -> Result<(), CliError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(CliError::Io {
            path: path.display().to_string(),
            source,
        }),
    }
}

fn read_file(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Helper to format an optional value for detail views.
pub fn or_dash(value: Option<&str>) -> String {
    value.unwrap_or("-").to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use uniform_core::{DevicePlan, DeviceResourceState};

    #[test]
    fn plan_accepts_yaml_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = dir.path().join("plan.yaml");
        std::fs::write(&yaml, "mac: AA-BB-CC-DD-EE-FF\nname: core-switch\n").unwrap();
        let plan: DevicePlan = read_plan(&yaml).unwrap();
        assert_eq!(plan.mac.as_str(), "aa:bb:cc:dd:ee:ff");
        assert_eq!(plan.config.name.as_deref(), Some("core-switch"));
        assert!(plan.allow_adoption);

        let json = dir.path().join("plan.json");
        std::fs::write(&json, r#"{"mac":"aa:bb:cc:dd:ee:ff","forget_on_destroy":false}"#).unwrap();
        let plan: DevicePlan = read_plan(&json).unwrap();
        assert!(!plan.forget_on_destroy);
    }

    #[test]
    fn state_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("device.json");
        let state = DeviceResourceState {
            id: "abc123".into(),
            mac: "aa:bb:cc:dd:ee:ff".parse().unwrap(),
            site: "default".into(),
            adopted: true,
            state: "connected".into(),
            allow_adoption: true,
            forget_on_destroy: true,
            config: uniform_core::DeviceConfig::default(),
        };
        write_state(&path, &state).unwrap();
        let back: DeviceResourceState = read_state(&path).unwrap();
        assert_eq!(back, state);

        remove_state(&path).unwrap();
        assert!(!path.exists());
        remove_state(&path).unwrap();
    }
}

//! Bridge between CLI flags and `uniform_config` profiles.

use uniform_config::{
    Config, ConfigError, Profile, load_config, load_config_from, profile_to_provider_config,
    resolve_profile,
};
use uniform_core::ProviderConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Load the config file named by `--config`, or the platform default.
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    let config = match global.config.as_deref() {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    Ok(config)
}

/// Resolve the active profile and layer flag overrides on top.
///
/// Flags beat environment variables, which beat the profile.
pub fn resolve(global: &GlobalOpts) -> Result<ProviderConfig, CliError> {
    let config = load(global)?;

    let (name, mut profile) = match resolve_profile(&config, global.profile.as_deref()) {
        Ok(resolved) => resolved,
        // --controller alone is enough to run without a profile
        Err(ConfigError::UnknownProfile { name }) if global.controller.is_some() => (
            name,
            Profile {
                site: "default".into(),
                ..Profile::default()
            },
        ),
        Err(e) => return Err(e.into()),
    };

    if let Some(ref controller) = global.controller {
        profile.controller.clone_from(controller);
    }
    if let Some(ref site) = global.site {
        profile.site.clone_from(site);
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if let Some(secs) = global.timeout {
        profile.timeout = Some(secs);
    }

    tracing::debug!(
        profile = %name,
        controller = %profile.controller,
        site = %profile.site,
        "resolved profile"
    );
    Ok(profile_to_provider_config(&profile, &name)?)
}

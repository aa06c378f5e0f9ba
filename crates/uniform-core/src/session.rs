// ── Controller session bootstrap ──
//
// Detects the platform, builds the legacy client, and logs in. The
// resulting directory is created once and injected into every resource.

use std::sync::Arc;

use tracing::{debug, info};

use uniform_api::{LegacyClient, TlsMode, TransportConfig};

use crate::config::{ProviderConfig, TlsVerification};
use crate::directory::LegacyDirectory;
use crate::error::CoreError;

/// Authenticate against the controller and return a ready directory.
pub async fn connect(config: &ProviderConfig) -> Result<Arc<LegacyDirectory>, CoreError> {
    let transport = build_transport(config);

    let platform = LegacyClient::detect_platform(&config.url, &transport).await?;
    debug!(?platform, "detected controller platform");

    let client = LegacyClient::new(config.url.clone(), platform, &transport)?;
    client.login(&config.username, &config.password).await?;
    info!(url = %config.url, site = %config.site, "connected to controller");

    Ok(Arc::new(LegacyDirectory::new(Arc::new(client))))
}

/// Build a [`TransportConfig`] from the provider configuration.
fn build_transport(config: &ProviderConfig) -> TransportConfig {
    TransportConfig {
        tls: tls_to_transport(&config.tls),
        timeout: config.timeout,
        cookie_jar: None,
    }
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}

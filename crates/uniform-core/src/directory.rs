// ── Remote directory collaborators ──
//
// The lifecycle controller and resources talk to the controller only
// through these traits. Errors are classified into `DirectoryError` at this
// boundary, so nothing above it inspects message text.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use uniform_api::LegacyClient;
use uniform_api::legacy::models::{LegacyDevice, LegacyUser};

/// Typed failure from a directory call.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The addressed object is absent.
    #[error("{subject} not found")]
    NotFound { subject: String },

    /// Spurious "unknown device" answer during adopt/forget transitions.
    #[error("controller reported unknown device")]
    UnknownDevice,

    /// The MAC is already registered.
    #[error("MAC address {mac} is already in use")]
    MacInUse { mac: String },

    /// Anything else; never retried.
    #[error(transparent)]
    Remote(uniform_api::Error),
}

impl DirectoryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<uniform_api::Error> for DirectoryError {
    fn from(err: uniform_api::Error) -> Self {
        match err {
            uniform_api::Error::NotFound { resource } => Self::NotFound { subject: resource },
            uniform_api::Error::UnknownDevice => Self::UnknownDevice,
            uniform_api::Error::MacInUse { mac } => Self::MacInUse { mac },
            e if e.is_not_found() => Self::NotFound {
                subject: String::from("object"),
            },
            other => Self::Remote(other),
        }
    }
}

/// Device operations against a controller site.
#[async_trait]
pub trait DeviceDirectory: Send + Sync {
    async fn list_devices(&self, site: &str) -> Result<Vec<LegacyDevice>, DirectoryError>;

    async fn get_device_by_mac(&self, site: &str, mac: &str)
    -> Result<LegacyDevice, DirectoryError>;

    async fn get_device(&self, site: &str, id: &str) -> Result<LegacyDevice, DirectoryError>;

    async fn adopt_device(&self, site: &str, mac: &str) -> Result<(), DirectoryError>;

    async fn forget_device(&self, site: &str, mac: &str) -> Result<(), DirectoryError>;

    async fn update_device(
        &self,
        site: &str,
        device: &LegacyDevice,
    ) -> Result<LegacyDevice, DirectoryError>;
}

/// Known-client (user) operations against a controller site.
#[async_trait]
pub trait ClientDirectory: Send + Sync {
    async fn create_user(&self, site: &str, user: &LegacyUser)
    -> Result<LegacyUser, DirectoryError>;

    async fn get_user(&self, site: &str, id: &str) -> Result<LegacyUser, DirectoryError>;

    async fn get_user_by_mac(&self, site: &str, mac: &str) -> Result<LegacyUser, DirectoryError>;

    async fn update_user(&self, site: &str, user: &LegacyUser)
    -> Result<LegacyUser, DirectoryError>;

    async fn delete_user_by_mac(&self, site: &str, mac: &str) -> Result<(), DirectoryError>;
}

// ── Legacy API implementation ────────────────────────────────────────

/// Directory backed by a logged-in [`LegacyClient`].
#[derive(Clone)]
pub struct LegacyDirectory {
    client: Arc<LegacyClient>,
}

impl LegacyDirectory {
    pub fn new(client: Arc<LegacyClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &LegacyClient {
        &self.client
    }
}

#[async_trait]
impl DeviceDirectory for LegacyDirectory {
    async fn list_devices(&self, site: &str) -> Result<Vec<LegacyDevice>, DirectoryError> {
        Ok(self.client.list_devices(site).await?)
    }

    async fn get_device_by_mac(
        &self,
        site: &str,
        mac: &str,
    ) -> Result<LegacyDevice, DirectoryError> {
        Ok(self.client.get_device_by_mac(site, mac).await?)
    }

    async fn get_device(&self, site: &str, id: &str) -> Result<LegacyDevice, DirectoryError> {
        Ok(self.client.get_device(site, id).await?)
    }

    async fn adopt_device(&self, site: &str, mac: &str) -> Result<(), DirectoryError> {
        Ok(self.client.adopt_device(site, mac).await?)
    }

    async fn forget_device(&self, site: &str, mac: &str) -> Result<(), DirectoryError> {
        Ok(self.client.forget_device(site, mac).await?)
    }

    async fn update_device(
        &self,
        site: &str,
        device: &LegacyDevice,
    ) -> Result<LegacyDevice, DirectoryError> {
        Ok(self.client.update_device(site, device).await?)
    }
}

#[async_trait]
impl ClientDirectory for LegacyDirectory {
    async fn create_user(
        &self,
        site: &str,
        user: &LegacyUser,
    ) -> Result<LegacyUser, DirectoryError> {
        Ok(self.client.create_user(site, user).await?)
    }

    async fn get_user(&self, site: &str, id: &str) -> Result<LegacyUser, DirectoryError> {
        Ok(self.client.get_user(site, id).await?)
    }

    async fn get_user_by_mac(&self, site: &str, mac: &str) -> Result<LegacyUser, DirectoryError> {
        Ok(self.client.get_user_by_mac(site, mac).await?)
    }

    async fn update_user(
        &self,
        site: &str,
        user: &LegacyUser,
    ) -> Result<LegacyUser, DirectoryError> {
        Ok(self.client.update_user(site, user).await?)
    }

    async fn delete_user_by_mac(&self, site: &str, mac: &str) -> Result<(), DirectoryError> {
        Ok(self.client.forget_user(site, mac).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::DirectoryError;

    #[test]
    fn api_errors_are_classified() {
        let nf: DirectoryError = uniform_api::Error::NotFound {
            resource: "aa:bb".into(),
        }
        .into();
        assert!(nf.is_not_found());

        let unknown: DirectoryError = uniform_api::Error::UnknownDevice.into();
        assert!(matches!(unknown, DirectoryError::UnknownDevice));

        let other: DirectoryError = uniform_api::Error::LegacyApi {
            message: "api.err.InvalidObject".into(),
        }
        .into();
        assert!(matches!(other, DirectoryError::Remote(_)));
    }
}

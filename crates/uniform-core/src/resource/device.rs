// ── Device resource ──
//
// CRUD + import for adopted network devices. Devices are never created on
// the controller: "create" discovers an existing device by MAC, adopts it
// when allowed, then converges its configuration.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use uniform_api::legacy::models::LegacyDevice;

use crate::config::LifecycleTimeouts;
use crate::convert::{config_from_remote, device_to_remote};
use crate::diagnostics::Diagnostic;
use crate::directory::{DeviceDirectory, DirectoryError};
use crate::error::CoreError;
use crate::lifecycle::DeviceLifecycle;
use crate::model::{
    DeviceConfig, DevicePlan, DeviceResourceState, ImportId, ImportTarget, MacAddress,
    state_label,
};
use crate::reconcile::Reconcile;

pub struct DeviceResource {
    lifecycle: DeviceLifecycle,
    default_site: String,
}

impl DeviceResource {
    pub fn new(
        directory: Arc<dyn DeviceDirectory>,
        timeouts: LifecycleTimeouts,
        default_site: impl Into<String>,
    ) -> Self {
        Self {
            lifecycle: DeviceLifecycle::new(directory, timeouts),
            default_site: default_site.into(),
        }
    }

    pub fn lifecycle(&self) -> &DeviceLifecycle {
        &self.lifecycle
    }

    fn site<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        requested
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.default_site)
    }

    pub fn validate(&self, plan: &DevicePlan) -> Vec<Diagnostic> {
        plan.validate()
    }

    /// Bring a discovered device under management.
    pub async fn create(
        &self,
        plan: &DevicePlan,
        cancel: &CancellationToken,
    ) -> Result<DeviceResourceState, CoreError> {
        let site = self.site(plan.site.as_deref());
        let mac = plan.mac.as_str();

        let mut device = self.lifecycle.discover(site, mac).await?;
        if !device.adopted {
            if !plan.allow_adoption {
                return Err(CoreError::AdoptionDisabled {
                    mac: mac.to_owned(),
                });
            }
            device = self.lifecycle.adopt(site, mac, cancel).await?;
        }

        let device = self
            .converge(site, &device, &DeviceConfig::default(), &plan.config, cancel)
            .await?;
        info!(mac, site, id = %device.id, "device under management");
        Self::state_from(&device, site, plan.allow_adoption, plan.forget_on_destroy)
    }

    /// Refresh persisted state. `Ok(None)` means the device is gone.
    pub async fn read(
        &self,
        prior: &DeviceResourceState,
    ) -> Result<Option<DeviceResourceState>, CoreError> {
        match self
            .lifecycle
            .directory()
            .get_device(&prior.site, &prior.id)
            .await
        {
            Ok(device) => Self::state_from(
                &device,
                &prior.site,
                prior.allow_adoption,
                prior.forget_on_destroy,
            )
            .map(Some),
            Err(DirectoryError::NotFound { .. }) => {
                debug!(id = %prior.id, mac = %prior.mac, "device no longer present");
                Ok(None)
            }
            Err(err) => Err(CoreError::directory("read", &prior.site, prior.mac.as_str(), err)),
        }
    }

    /// Converge an existing device to `plan`.
    ///
    /// The snapshot is re-fetched first so the merge never works from a
    /// stale view; fields absent from the plan keep their prior or remote
    /// values.
    pub async fn update(
        &self,
        prior: &DeviceResourceState,
        plan: &DevicePlan,
        cancel: &CancellationToken,
    ) -> Result<DeviceResourceState, CoreError> {
        if plan.mac != prior.mac {
            return Err(CoreError::ImmutableField {
                field: "mac".into(),
                prior: prior.mac.to_string(),
                planned: plan.mac.to_string(),
            });
        }
        let site = self.site(plan.site.as_deref());
        if site != prior.site {
            return Err(CoreError::ImmutableField {
                field: "site".into(),
                prior: prior.site.clone(),
                planned: site.to_owned(),
            });
        }

        let snapshot = self
            .lifecycle
            .directory()
            .get_device(site, &prior.id)
            .await
            .map_err(|e| CoreError::directory("update", site, prior.mac.as_str(), e))?;

        let device = self
            .converge(site, &snapshot, &prior.config, &plan.config, cancel)
            .await?;
        Self::state_from(&device, site, plan.allow_adoption, plan.forget_on_destroy)
    }

    /// Forget the device, or only drop it from tracking when
    /// `forget_on_destroy` is off.
    pub async fn delete(
        &self,
        prior: &DeviceResourceState,
        cancel: &CancellationToken,
    ) -> Result<(), CoreError> {
        if !prior.forget_on_destroy {
            info!(mac = %prior.mac, "forget_on_destroy disabled, leaving device adopted");
            return Ok(());
        }
        self.lifecycle
            .forget(&prior.site, prior.mac.as_str(), cancel)
            .await
    }

    /// Resolve an import id (`site:id`, `id`, `site:mac`, or `mac`).
    pub async fn import(&self, raw: &str) -> Result<DeviceResourceState, CoreError> {
        let id = ImportId::parse(raw)?;
        let site = self.site(id.site.as_deref());

        let device = match &id.target {
            ImportTarget::Mac(mac) => self.lifecycle.discover(site, mac.as_str()).await?,
            ImportTarget::Id(device_id) => self
                .lifecycle
                .directory()
                .get_device(site, device_id)
                .await
                .map_err(|e| match e {
                    DirectoryError::NotFound { .. } => CoreError::NotFound {
                        entity_type: "device".into(),
                        identifier: device_id.clone(),
                    },
                    other => CoreError::directory("import", site, device_id, other),
                })?,
        };

        info!(raw, id = %device.id, mac = %device.mac, site, "imported device");
        Self::state_from(&device, site, true, true)
    }

    // ── Internals ───────────────────────────────────────────────────

    /// Merge, and push only when the merged payload differs from the
    /// snapshot.
    async fn converge(
        &self,
        site: &str,
        snapshot: &LegacyDevice,
        prior: &DeviceConfig,
        plan: &DeviceConfig,
        cancel: &CancellationToken,
    ) -> Result<LegacyDevice, CoreError> {
        let merged = DeviceConfig::reconcile(&config_from_remote(snapshot), prior, plan);
        let payload = device_to_remote(snapshot, &merged);

        if payload == *snapshot {
            debug!(mac = %snapshot.mac, "configuration already converged, skipping update");
            return Ok(snapshot.clone());
        }
        self.lifecycle.apply(site, &payload, cancel).await
    }

    fn state_from(
        device: &LegacyDevice,
        site: &str,
        allow_adoption: bool,
        forget_on_destroy: bool,
    ) -> Result<DeviceResourceState, CoreError> {
        Ok(DeviceResourceState {
            id: device.id.clone(),
            mac: MacAddress::parse(&device.mac)?,
            site: site.to_owned(),
            adopted: device.adopted,
            state: state_label(device.state),
            allow_adoption,
            forget_on_destroy,
            config: config_from_remote(device),
        })
    }
}

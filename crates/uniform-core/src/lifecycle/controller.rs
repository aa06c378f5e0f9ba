// ── Device lifecycle controller ──
//
// Drives a device through discovery, adoption, configuration apply, and
// forget. Every mutating call is followed by a wait for the controller to
// report the transition's target state.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use uniform_api::legacy::models::LegacyDevice;

use super::wait::{Observation, WaitError, WaitSpec, wait_for_state};
use crate::config::LifecycleTimeouts;
use crate::directory::{DeviceDirectory, DirectoryError};
use crate::error::CoreError;
use crate::model::{DeviceState, state_label};

/// A lifecycle step that ends in a wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Adopt,
    Apply,
    Forget,
}

impl Transition {
    pub fn operation(self) -> &'static str {
        match self {
            Self::Adopt => "adopt",
            Self::Apply => "apply",
            Self::Forget => "forget",
        }
    }

    /// States that mean the transition is still in flight.
    pub fn pending(self) -> &'static [DeviceState] {
        match self {
            Self::Adopt => &[
                DeviceState::Adopting,
                DeviceState::Pending,
                DeviceState::Provisioning,
                DeviceState::Upgrading,
                DeviceState::Unknown,
            ],
            Self::Apply => &[
                DeviceState::Adopting,
                DeviceState::Provisioning,
                DeviceState::Unknown,
            ],
            Self::Forget => &[
                DeviceState::Connected,
                DeviceState::Deleting,
                DeviceState::Unknown,
            ],
        }
    }

    pub fn target(self) -> DeviceState {
        match self {
            Self::Adopt | Self::Apply => DeviceState::Connected,
            Self::Forget => DeviceState::Pending,
        }
    }

    pub fn timeout(self, timeouts: &LifecycleTimeouts) -> Duration {
        match self {
            Self::Adopt => timeouts.adopt,
            Self::Apply => timeouts.apply,
            Self::Forget => timeouts.forget,
        }
    }

    pub fn wait_spec(self, timeouts: &LifecycleTimeouts) -> WaitSpec {
        WaitSpec {
            operation: self.operation(),
            pending: self.pending().iter().map(ToString::to_string).collect(),
            target: self.target().to_string(),
            timeout: self.timeout(timeouts),
            poll_interval: timeouts.poll_interval,
            not_found_tolerance: timeouts.not_found_tolerance,
        }
    }
}

/// Device lifecycle operations over an injected [`DeviceDirectory`].
#[derive(Clone)]
pub struct DeviceLifecycle {
    directory: Arc<dyn DeviceDirectory>,
    timeouts: LifecycleTimeouts,
}

impl DeviceLifecycle {
    pub fn new(directory: Arc<dyn DeviceDirectory>, timeouts: LifecycleTimeouts) -> Self {
        Self {
            directory,
            timeouts,
        }
    }

    pub fn directory(&self) -> &Arc<dyn DeviceDirectory> {
        &self.directory
    }

    pub fn timeouts(&self) -> &LifecycleTimeouts {
        &self.timeouts
    }

    /// Look a device up by MAC. Absence is an error here.
    pub async fn discover(&self, site: &str, mac: &str) -> Result<LegacyDevice, CoreError> {
        let device = self
            .directory
            .get_device_by_mac(site, mac)
            .await
            .map_err(|e| CoreError::directory("discover", site, mac, e))?;
        debug!(
            mac,
            site,
            id = %device.id,
            adopted = device.adopted,
            state = %state_label(device.state),
            "discovered device"
        );
        Ok(device)
    }

    /// Adopt a pending device and wait until it reports `connected`.
    pub async fn adopt(
        &self,
        site: &str,
        mac: &str,
        cancel: &CancellationToken,
    ) -> Result<LegacyDevice, CoreError> {
        info!(mac, site, "adopting device");
        self.directory
            .adopt_device(site, mac)
            .await
            .map_err(|e| CoreError::directory("adopt", site, mac, e))?;
        self.wait(site, mac, Transition::Adopt, cancel).await
    }

    /// Push a configuration update and wait for the device to settle.
    ///
    /// A freshly adopted device may not be visible to the update endpoint
    /// yet, so not-found answers are retried for `update_retry`.
    pub async fn apply(
        &self,
        site: &str,
        device: &LegacyDevice,
        cancel: &CancellationToken,
    ) -> Result<LegacyDevice, CoreError> {
        let mac = device.mac.as_str();
        let deadline = Instant::now() + self.timeouts.update_retry;
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;
            let result = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(cancelled(mac)),
                result = self.directory.update_device(site, device) => result,
            };

            match result {
                Ok(_) => break,
                Err(err) if err.is_not_found() && Instant::now() < deadline => {
                    warn!(mac, attempts, "device not yet visible to update, retrying");
                    tokio::select! {
                        biased;
                        () = cancel.cancelled() => return Err(cancelled(mac)),
                        () = tokio::time::sleep(self.timeouts.poll_interval) => {}
                    }
                }
                Err(err) => return Err(CoreError::directory("update", site, mac, err)),
            }
        }

        info!(mac, site, attempts, "device configuration updated");
        self.wait(site, mac, Transition::Apply, cancel).await
    }

    /// Forget a device and wait until it falls back to `pending`.
    ///
    /// The device vanishing at any point of the wait also counts as
    /// forgotten.
    pub async fn forget(
        &self,
        site: &str,
        mac: &str,
        cancel: &CancellationToken,
    ) -> Result<(), CoreError> {
        info!(mac, site, "forgetting device");
        match self.directory.forget_device(site, mac).await {
            Ok(()) => {}
            Err(DirectoryError::NotFound { .. }) => {
                debug!(mac, "device already gone");
                return Ok(());
            }
            Err(err) => return Err(CoreError::directory("forget", site, mac, err)),
        }

        let spec = Transition::Forget.wait_spec(&self.timeouts);
        wait_for_state(&spec, cancel, || self.observe_forgotten(site, mac))
            .await
            .map_err(|err| {
                if let WaitError::Timeout { ref last_state, .. } = err {
                    warn!(mac, operation = spec.operation, ?last_state, "wait timed out");
                }
                CoreError::from_wait(err, mac)
            })
    }

    /// Poll the device by MAC until `transition` reaches its target.
    pub async fn wait(
        &self,
        site: &str,
        mac: &str,
        transition: Transition,
        cancel: &CancellationToken,
    ) -> Result<LegacyDevice, CoreError> {
        let spec = transition.wait_spec(&self.timeouts);
        wait_for_state(&spec, cancel, || self.observe(site, mac))
            .await
            .map_err(|err| {
                if let WaitError::Timeout { ref last_state, .. } = err {
                    warn!(mac, operation = spec.operation, ?last_state, "wait timed out");
                }
                CoreError::from_wait(err, mac)
            })
    }

    async fn observe(
        &self,
        site: &str,
        mac: &str,
    ) -> Result<Observation<LegacyDevice>, DirectoryError> {
        let device = self.directory.get_device_by_mac(site, mac).await?;
        let state = state_label(device.state);
        Ok(Observation {
            record: device,
            state,
        })
    }

    /// Like [`Self::observe`], but a missing device reads as the forget
    /// target.
    async fn observe_forgotten(
        &self,
        site: &str,
        mac: &str,
    ) -> Result<Observation<()>, DirectoryError> {
        match self.directory.get_device_by_mac(site, mac).await {
            Ok(device) => Ok(Observation {
                record: (),
                state: state_label(device.state),
            }),
            Err(DirectoryError::NotFound { .. }) => {
                debug!(mac, "device gone from the controller");
                Ok(Observation {
                    record: (),
                    state: Transition::Forget.target().to_string(),
                })
            }
            Err(err) => Err(err),
        }
    }
}

fn cancelled(mac: &str) -> CoreError {
    CoreError::Cancelled {
        operation: "apply".into(),
        mac: mac.to_owned(),
    }
}

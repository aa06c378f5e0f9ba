// ── Resource registry and provider facade ──
//
// The host hands over JSON documents and a type name; this module decodes
// them into the typed plans and states, dispatches to the resource, and
// reports every failure as a list of diagnostics.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{DeviceResource, UserResource};
use crate::config::{LifecycleTimeouts, ProviderConfig};
use crate::diagnostics::{Diagnostic, has_errors};
use crate::directory::{ClientDirectory, DeviceDirectory};
use crate::error::CoreError;
use crate::model::{DevicePlan, DeviceResourceState, UserPlan, UserResourceState};

/// Closed set of resource kinds this provider manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Device,
    User,
}

impl ResourceKind {
    pub const ALL: [Self; 2] = [Self::Device, Self::User];

    pub fn type_name(self) -> &'static str {
        match self {
            Self::Device => "unifi_device",
            Self::User => "unifi_user",
        }
    }

    pub fn from_type_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.type_name() == name)
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_name())
    }
}

/// A successful result plus any warnings collected on the way.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response<T> {
    pub value: T,
    pub diagnostics: Vec<Diagnostic>,
}

impl<T> Response<T> {
    fn new(value: T, diagnostics: Vec<Diagnostic>) -> Self {
        Self { value, diagnostics }
    }
}

type Outcome<T> = Result<Response<T>, Vec<Diagnostic>>;

/// Entry point for a host orchestrator.
pub struct Provider {
    devices: DeviceResource,
    users: UserResource,
}

impl Provider {
    pub fn new(
        devices: Arc<dyn DeviceDirectory>,
        clients: Arc<dyn ClientDirectory>,
        default_site: &str,
        timeouts: LifecycleTimeouts,
    ) -> Self {
        Self {
            devices: DeviceResource::new(devices, timeouts, default_site),
            users: UserResource::new(clients, default_site),
        }
    }

    /// Build a provider over one directory that serves both traits.
    pub fn with_directory<D>(directory: Arc<D>, config: &ProviderConfig) -> Self
    where
        D: DeviceDirectory + ClientDirectory + 'static,
    {
        let clients: Arc<dyn ClientDirectory> = directory.clone();
        Self::new(directory, clients, &config.site, config.lifecycle)
    }

    pub fn devices(&self) -> &DeviceResource {
        &self.devices
    }

    pub fn users(&self) -> &UserResource {
        &self.users
    }

    /// Offline checks on a plan document.
    pub fn validate(&self, kind: ResourceKind, plan: &Value) -> Vec<Diagnostic> {
        match kind {
            ResourceKind::Device => match decode::<DevicePlan>(plan) {
                Ok(plan) => self.devices.validate(&plan),
                Err(diags) => diags,
            },
            ResourceKind::User => match decode::<UserPlan>(plan) {
                Ok(plan) => self.users.validate(&plan),
                Err(diags) => diags,
            },
        }
    }

    pub async fn create(
        &self,
        kind: ResourceKind,
        plan: &Value,
        cancel: &CancellationToken,
    ) -> Outcome<Value> {
        debug!(%kind, "create");
        match kind {
            ResourceKind::Device => {
                let plan: DevicePlan = decode(plan)?;
                let warnings = checked(self.devices.validate(&plan))?;
                let state = self.devices.create(&plan, cancel).await.map_err(fail)?;
                respond(&state, warnings)
            }
            ResourceKind::User => {
                let plan: UserPlan = decode(plan)?;
                let warnings = checked(self.users.validate(&plan))?;
                let state = self.users.create(&plan).await.map_err(fail)?;
                respond(&state, warnings)
            }
        }
    }

    /// `value` is `None` when the object no longer exists remotely.
    pub async fn read(&self, kind: ResourceKind, prior: &Value) -> Outcome<Option<Value>> {
        debug!(%kind, "read");
        let state = match kind {
            ResourceKind::Device => {
                let prior: DeviceResourceState = decode(prior)?;
                self.devices
                    .read(&prior)
                    .await
                    .map_err(fail)?
                    .map(|s| encode(&s))
                    .transpose()?
            }
            ResourceKind::User => {
                let prior: UserResourceState = decode(prior)?;
                self.users
                    .read(&prior)
                    .await
                    .map_err(fail)?
                    .map(|s| encode(&s))
                    .transpose()?
            }
        };
        if state.is_none() {
            warn!(%kind, "object removed outside of management");
        }
        Ok(Response::new(state, Vec::new()))
    }

    pub async fn update(
        &self,
        kind: ResourceKind,
        prior: &Value,
        plan: &Value,
        cancel: &CancellationToken,
    ) -> Outcome<Value> {
        debug!(%kind, "update");
        match kind {
            ResourceKind::Device => {
                let prior: DeviceResourceState = decode(prior)?;
                let plan: DevicePlan = decode(plan)?;
                let warnings = checked(self.devices.validate(&plan))?;
                let state = self
                    .devices
                    .update(&prior, &plan, cancel)
                    .await
                    .map_err(fail)?;
                respond(&state, warnings)
            }
            ResourceKind::User => {
                let prior: UserResourceState = decode(prior)?;
                let plan: UserPlan = decode(plan)?;
                let warnings = checked(self.users.validate(&plan))?;
                let state = self.users.update(&prior, &plan).await.map_err(fail)?;
                respond(&state, warnings)
            }
        }
    }

    pub async fn delete(
        &self,
        kind: ResourceKind,
        prior: &Value,
        cancel: &CancellationToken,
    ) -> Outcome<()> {
        debug!(%kind, "delete");
        match kind {
            ResourceKind::Device => {
                let prior: DeviceResourceState = decode(prior)?;
                self.devices.delete(&prior, cancel).await.map_err(fail)?;
            }
            ResourceKind::User => {
                let prior: UserResourceState = decode(prior)?;
                self.users.delete(&prior).await.map_err(fail)?;
            }
        }
        Ok(Response::new((), Vec::new()))
    }

    pub async fn import(&self, kind: ResourceKind, id: &str) -> Outcome<Value> {
        debug!(%kind, id, "import");
        match kind {
            ResourceKind::Device => {
                let state = self.devices.import(id).await.map_err(fail)?;
                respond(&state, Vec::new())
            }
            ResourceKind::User => {
                let state = self.users.import(id).await.map_err(fail)?;
                respond(&state, Vec::new())
            }
        }
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn decode<T: DeserializeOwned>(value: &Value) -> Result<T, Vec<Diagnostic>> {
    T::deserialize(value).map_err(|e| {
        vec![Diagnostic::error(
            "Invalid configuration",
            format!("could not decode document: {e}"),
        )]
    })
}

fn encode<T: Serialize>(value: &T) -> Result<Value, Vec<Diagnostic>> {
    serde_json::to_value(value)
        .map_err(|e| vec![Diagnostic::from(CoreError::Internal(e.to_string()))])
}

fn respond<T: Serialize>(state: &T, diagnostics: Vec<Diagnostic>) -> Outcome<Value> {
    Ok(Response::new(encode(state)?, diagnostics))
}

/// Pass warnings through; stop on any error.
fn checked(diagnostics: Vec<Diagnostic>) -> Result<Vec<Diagnostic>, Vec<Diagnostic>> {
    if has_errors(&diagnostics) {
        Err(diagnostics)
    } else {
        Ok(diagnostics)
    }
}

fn fail(err: CoreError) -> Vec<Diagnostic> {
    vec![Diagnostic::from(err)]
}

#[cfg(test)]
mod tests {
    use super::ResourceKind;

    #[test]
    fn type_names_round_trip() {
        for kind in ResourceKind::ALL {
            assert_eq!(ResourceKind::from_type_name(kind.type_name()), Some(kind));
        }
        assert_eq!(ResourceKind::from_type_name("unifi_network"), None);
    }
}

//! Declarative management core for UniFi controllers.
//!
//! This crate owns the behaviour behind each managed resource:
//!
//! - **[`lifecycle`]**: the device lifecycle controller. Discovery by MAC,
//!   adoption, configuration apply and forget, each followed by a
//!   [`wait_for_state`] poll until the controller reports the target state.
//!
//! - **[`reconcile`]**: three-way merge of remote snapshot, prior state, and
//!   plan. Plan wins where set, then prior state, then the snapshot.
//!
//! - **[`convert`]**: pure mappings between the desired-config models and
//!   the legacy wire records, including index-keyed collapse of port, radio,
//!   and outlet overrides.
//!
//! - **[`resource`]**: CRUD + import entry points per resource kind, and the
//!   [`Provider`] facade that dispatches JSON documents through the closed
//!   [`ResourceKind`] registry and reports failures as [`Diagnostic`]s.
//!
//! - **[`directory`]**: the [`DeviceDirectory`] / [`ClientDirectory`]
//!   collaborator traits and their implementation over `uniform-api`.

pub mod config;
pub mod convert;
pub mod diagnostics;
pub mod directory;
pub mod error;
pub mod lifecycle;
pub mod model;
pub mod reconcile;
pub mod resource;
pub mod session;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{LifecycleTimeouts, ProviderConfig, TlsVerification};
pub use diagnostics::{Diagnostic, Severity};
pub use directory::{ClientDirectory, DeviceDirectory, DirectoryError, LegacyDirectory};
pub use error::CoreError;
pub use lifecycle::{DeviceLifecycle, Observation, Transition, WaitError, WaitSpec, wait_for_state};
pub use model::{
    DeviceConfig, DevicePlan, DeviceResourceState, DeviceState, ImportId, MacAddress,
    OutletOverride, PortOverride, RadioBand, RadioOverride, UserConfig, UserPlan,
    UserResourceState,
};
pub use reconcile::Reconcile;
pub use resource::{DeviceResource, Provider, ResourceKind, Response, UserResource};
pub use session::connect;

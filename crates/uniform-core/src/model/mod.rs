// ── Domain model ──

pub mod device;
pub mod entity_id;
pub mod user;

pub use device::{
    Device, DeviceConfig, DevicePlan, DeviceResourceState, DeviceState, OutletOverride,
    PortOverride, RadioBand, RadioOverride, state_label,
};
pub use entity_id::{ImportId, ImportTarget, MacAddress};
pub use user::{UserConfig, UserPlan, UserResourceState};

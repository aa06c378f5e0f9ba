// ── Managed resources ──

mod device;
mod registry;
mod user;

pub use device::DeviceResource;
pub use registry::{Provider, ResourceKind, Response};
pub use user::UserResource;

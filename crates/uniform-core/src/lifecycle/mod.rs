// ── Device lifecycle ──

mod controller;
mod wait;

pub use controller::{DeviceLifecycle, Transition};
pub use wait::{Observation, WaitError, WaitSpec, wait_for_state};

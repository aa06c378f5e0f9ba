// uniform-api: Async Rust client for the UniFi controller legacy API
//
// Only the surface the provider needs: session auth, device lookup and
// lifecycle commands (adopt / forget / update), and user (client) records.

pub mod auth;
pub mod error;
pub mod legacy;
pub mod transport;

pub use auth::ControllerPlatform;
pub use error::Error;
pub use legacy::LegacyClient;
pub use transport::{TlsMode, TransportConfig};

// ── User (known client) domain types ──

use serde::{Deserialize, Serialize};

use super::entity_id::MacAddress;
use crate::diagnostics::Diagnostic;

/// Managed fields of a known client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Reserved IPv4 address; setting it turns on the fixed-IP flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_dns_record: Option<String>,
}

fn default_true() -> bool {
    true
}

/// Desired configuration submitted for a user resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPlan {
    pub mac: MacAddress,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
    /// Take over an already-registered record with the same MAC instead
    /// of failing the create.
    #[serde(default = "default_true")]
    pub allow_existing: bool,
    /// Leave the record on the controller when the resource is destroyed.
    #[serde(default)]
    pub skip_forget_on_destroy: bool,
    #[serde(flatten)]
    pub config: UserConfig,
}

/// Persisted state of a managed user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResourceState {
    pub id: String,
    pub mac: MacAddress,
    pub site: String,
    #[serde(default = "default_true")]
    pub allow_existing: bool,
    #[serde(default)]
    pub skip_forget_on_destroy: bool,
    #[serde(flatten)]
    pub config: UserConfig,
}

impl UserPlan {
    pub fn validate(&self) -> Vec<Diagnostic> {
        let mut diags = Vec::new();
        if let Some(ip) = self.config.fixed_ip.as_deref() {
            if ip.parse::<std::net::Ipv4Addr>().is_err() {
                diags.push(
                    Diagnostic::error(
                        "Invalid fixed IP",
                        format!("'{ip}' is not an IPv4 address"),
                    )
                    .at("fixed_ip"),
                );
            }
            if self.config.network_id.is_none() {
                diags.push(
                    Diagnostic::warning(
                        "Fixed IP without network",
                        "the controller applies fixed IPs per network; set network_id",
                    )
                    .at("network_id"),
                );
            }
        }
        diags
    }
}

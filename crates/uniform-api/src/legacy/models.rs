// Legacy API wire types
//
// Every legacy response is wrapped in the `LegacyResponse<T>` envelope.
// Optional fields are skipped on serialization so an unset value is never
// sent as `null`, and each record keeps unknown fields in a flattened
// `extra` map so a read-modify-write echoes them back untouched.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ── Response Envelope ────────────────────────────────────────────────

/// Standard UniFi legacy API response envelope.
///
/// ```json
/// { "meta": { "rc": "ok", "msg": "optional" }, "data": [...] }
/// ```
#[derive(Debug, Deserialize)]
pub struct LegacyResponse<T> {
    pub meta: Meta,
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

/// Metadata from the legacy envelope. `rc` == `"ok"` means success.
#[derive(Debug, Deserialize)]
pub struct Meta {
    pub rc: String,
    #[serde(default)]
    pub msg: Option<String>,
}

// ── Device ───────────────────────────────────────────────────────────

/// Device object from `stat/device`, also the body of `PUT rest/device/{id}`.
///
/// `state` is the controller's numeric lifecycle code
/// (0=unknown, 1=connected, 2=pending, 4=upgrading, 5=provisioning,
/// 7=adopting, 8=deleting, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyDevice {
    #[serde(rename = "_id")]
    pub id: String,
    pub mac: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_id: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default)]
    pub adopted: bool,
    #[serde(default)]
    pub state: i32,

    // Managed configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub led_override: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub led_override_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub led_override_color_brightness: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snmp_contact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snmp_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mgmt_network_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_overrides: Option<Vec<LegacyPortOverride>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radio_table: Option<Vec<LegacyRadio>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outlet_overrides: Option<Vec<LegacyOutletOverride>>,

    /// Catch-all for undocumented fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Per-port override on a switch (`port_overrides[]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyPortOverride {
    pub port_idx: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portconf_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub op_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poe_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregate_num_ports: Option<u32>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Radio settings on an access point (`radio_table[]`).
///
/// `channel` and `tx_power` arrive as either a number or a string
/// (`"auto"`), depending on firmware.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyRadio {
    pub radio: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ht: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_power_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_power: Option<Value>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Outlet override on a PDU / smart plug (`outlet_overrides[]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyOutletOverride {
    pub index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relay_state: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cycle_enabled: Option<bool>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

// ── User (known client) ──────────────────────────────────────────────

/// Known-client record from `rest/user`.
///
/// `id` is absent on create requests and assigned by the controller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacyUser {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub mac: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_fixedip: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usergroup_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_dns_record: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

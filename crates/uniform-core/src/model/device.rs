// ── Device domain types ──

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use super::entity_id::MacAddress;
use crate::diagnostics::Diagnostic;

/// Device lifecycle state as reported by the controller.
///
/// The string form (`as_ref()` / `Display`) is what the wait primitive
/// compares; controller codes outside this table are carried as opaque
/// labels by [`state_label`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DeviceState {
    Unknown,
    Connected,
    Pending,
    FirmwareMismatch,
    Upgrading,
    Provisioning,
    HeartbeatMissed,
    Adopting,
    Deleting,
    InformError,
    AdoptFailed,
    Isolated,
}

impl DeviceState {
    /// Map the controller's numeric `state` field.
    pub fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            0 => Self::Unknown,
            1 => Self::Connected,
            2 => Self::Pending,
            3 => Self::FirmwareMismatch,
            4 => Self::Upgrading,
            5 => Self::Provisioning,
            6 => Self::HeartbeatMissed,
            7 => Self::Adopting,
            8 => Self::Deleting,
            9 => Self::InformError,
            10 => Self::AdoptFailed,
            11 => Self::Isolated,
            _ => return None,
        })
    }
}

/// Stable string form of a raw controller state code.
pub fn state_label(code: i32) -> String {
    DeviceState::from_code(code).map_or_else(|| format!("code_{code}"), |s| s.to_string())
}

/// Radio band key of an access-point radio.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum RadioBand {
    /// 2.4 GHz
    #[serde(rename = "ng")]
    #[strum(serialize = "ng")]
    Ng,
    /// 5 GHz
    #[serde(rename = "na")]
    #[strum(serialize = "na")]
    Na,
    /// 6 GHz
    #[serde(rename = "6e")]
    #[strum(serialize = "6e")]
    SixE,
}

/// Port override keyed by `index` (1-based port number).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortOverride {
    pub index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_profile_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub op_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poe_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregate_num_ports: Option<u32>,
}

/// Radio override keyed by band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RadioOverride {
    pub band: RadioBand,
    /// `"auto"` or a channel number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    /// Channel width in MHz.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_power_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_power: Option<String>,
}

/// Outlet override keyed by outlet index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutletOverride {
    pub index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relay_state: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cycle_enabled: Option<bool>,
}

/// The managed configuration payload of a device.
///
/// `None` means "not set here"; the controller default (or whatever the
/// merge picks from another source) applies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    /// `default`, `on`, or `off`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub led_override: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub led_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub led_brightness: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snmp_contact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snmp_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mgmt_network_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_overrides: Option<Vec<PortOverride>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radios: Option<Vec<RadioOverride>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outlet_overrides: Option<Vec<OutletOverride>>,
}

/// A device as observed on the controller, in domain terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Device {
    pub id: String,
    pub mac: MacAddress,
    pub site: String,
    /// String form of the controller state (see [`state_label`]).
    pub state: String,
    pub adopted: bool,
    pub model: Option<String>,
    pub config: DeviceConfig,
}

fn default_true() -> bool {
    true
}

/// Desired configuration submitted for a device resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevicePlan {
    pub mac: MacAddress,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
    /// Adopt the device when it is still pending. When false, an
    /// unadopted device is an error.
    #[serde(default = "default_true")]
    pub allow_adoption: bool,
    /// Forget the device on destroy; when false it is only dropped from
    /// tracking.
    #[serde(default = "default_true")]
    pub forget_on_destroy: bool,
    #[serde(flatten)]
    pub config: DeviceConfig,
}

/// Persisted state of a managed device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceResourceState {
    pub id: String,
    pub mac: MacAddress,
    pub site: String,
    pub adopted: bool,
    pub state: String,
    #[serde(default = "default_true")]
    pub allow_adoption: bool,
    #[serde(default = "default_true")]
    pub forget_on_destroy: bool,
    #[serde(flatten)]
    pub config: DeviceConfig,
}

impl DevicePlan {
    /// Attribute-level checks that do not need the controller.
    ///
    /// Duplicate override indices are accepted (last one wins, matching how
    /// the controller stores them) but reported as warnings.
    pub fn validate(&self) -> Vec<Diagnostic> {
        let mut diags = Vec::new();
        let cfg = &self.config;

        if let Some(mode) = cfg.led_override.as_deref() {
            if !matches!(mode, "default" | "on" | "off") {
                diags.push(
                    Diagnostic::error(
                        "Invalid LED override",
                        format!("expected one of default, on, off; got '{mode}'"),
                    )
                    .at("led_override"),
                );
            }
        }
        if let Some(brightness) = cfg.led_brightness {
            if brightness > 100 {
                diags.push(
                    Diagnostic::error(
                        "Invalid LED brightness",
                        format!("must be between 0 and 100, got {brightness}"),
                    )
                    .at("led_brightness"),
                );
            }
        }
        if let Some(color) = cfg.led_color.as_deref() {
            let hex = color.strip_prefix('#').unwrap_or(color);
            if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
                diags.push(
                    Diagnostic::error(
                        "Invalid LED color",
                        format!("expected a hex color like #0000ff, got '{color}'"),
                    )
                    .at("led_color"),
                );
            }
        }

        if let Some(ports) = &cfg.port_overrides {
            if ports.iter().any(|p| p.index == 0) {
                diags.push(
                    Diagnostic::error("Invalid port index", "port numbers start at 1")
                        .at("port_overrides"),
                );
            }
            warn_duplicates(
                &mut diags,
                "port_overrides",
                ports.iter().map(|p| p.index.to_string()),
            );
        }
        if let Some(radios) = &cfg.radios {
            warn_duplicates(&mut diags, "radios", radios.iter().map(|r| r.band.to_string()));
        }
        if let Some(outlets) = &cfg.outlet_overrides {
            warn_duplicates(
                &mut diags,
                "outlet_overrides",
                outlets.iter().map(|o| o.index.to_string()),
            );
        }

        diags
    }
}

fn warn_duplicates(
    diags: &mut Vec<Diagnostic>,
    attribute: &str,
    keys: impl Iterator<Item = String>,
) {
    let mut seen = std::collections::BTreeSet::new();
    let mut reported = std::collections::BTreeSet::new();
    for key in keys {
        if !seen.insert(key.clone()) && reported.insert(key.clone()) {
            diags.push(
                Diagnostic::warning(
                    "Duplicate override index",
                    format!("{attribute} lists '{key}' more than once; the last entry wins"),
                )
                .at(attribute),
            );
        }
    }
}

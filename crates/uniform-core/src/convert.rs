// ── Model ↔ wire conversion ──
//
// Pure mappings between the desired-config models and the legacy API
// records. Writing overlays the config onto a fetched record so unmanaged
// fields (including unknown JSON keys) are echoed back unchanged.
//
// Index-keyed collections pass through a BTreeMap in both directions:
// duplicate indices collapse to one entry (last write wins) and the
// result comes out in ascending index order.

use std::collections::BTreeMap;

use serde_json::Value;

use uniform_api::legacy::models::{
    LegacyDevice, LegacyOutletOverride, LegacyPortOverride, LegacyRadio, LegacyUser,
};

use crate::error::CoreError;
use crate::model::{
    Device, DeviceConfig, MacAddress, OutletOverride, PortOverride, RadioBand, RadioOverride,
    UserConfig, state_label,
};

// ── Helpers ─────────────────────────────────────────────────────────

/// The controller uses `""` for "unset" on many string fields.
fn non_empty(value: Option<&String>) -> Option<String> {
    value.filter(|s| !s.is_empty()).cloned()
}

/// Render a channel / tx-power value the way the model stores it.
fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Encode a model string for the wire, keeping the existing value when it
/// already says the same thing (so `36` stays a number and `"36"` a string).
fn string_to_value(planned: &str, existing: Option<&Value>) -> Value {
    if let Some(existing) = existing {
        if value_to_string(existing).as_deref() == Some(planned) {
            return existing.clone();
        }
    }
    planned
        .parse::<i64>()
        .map_or_else(|_| Value::String(planned.to_owned()), Value::from)
}

// ── Device: remote → model ─────────────────────────────────────────

/// Extract the managed configuration from a device record.
pub fn config_from_remote(device: &LegacyDevice) -> DeviceConfig {
    DeviceConfig {
        name: non_empty(device.name.as_ref()),
        disabled: device.disabled,
        led_override: non_empty(device.led_override.as_ref()),
        led_color: non_empty(device.led_override_color.as_ref()),
        led_brightness: device.led_override_color_brightness,
        snmp_contact: non_empty(device.snmp_contact.as_ref()),
        snmp_location: non_empty(device.snmp_location.as_ref()),
        mgmt_network_id: non_empty(device.mgmt_network_id.as_ref()),
        port_overrides: device.port_overrides.as_ref().map(|ports| {
            let by_index: BTreeMap<u32, PortOverride> = ports
                .iter()
                .map(|p| (p.port_idx, port_from_remote(p)))
                .collect();
            by_index.into_values().collect()
        }),
        radios: device.radio_table.as_ref().map(|radios| {
            let by_band: BTreeMap<RadioBand, RadioOverride> = radios
                .iter()
                .filter_map(radio_from_remote)
                .map(|r| (r.band, r))
                .collect();
            by_band.into_values().collect()
        }),
        outlet_overrides: device.outlet_overrides.as_ref().map(|outlets| {
            let by_index: BTreeMap<u32, OutletOverride> = outlets
                .iter()
                .map(|o| (o.index, outlet_from_remote(o)))
                .collect();
            by_index.into_values().collect()
        }),
    }
}

fn port_from_remote(port: &LegacyPortOverride) -> PortOverride {
    PortOverride {
        index: port.port_idx,
        name: non_empty(port.name.as_ref()),
        port_profile_id: non_empty(port.portconf_id.as_ref()),
        op_mode: non_empty(port.op_mode.as_ref()),
        poe_mode: non_empty(port.poe_mode.as_ref()),
        aggregate_num_ports: port.aggregate_num_ports,
    }
}

/// Radios on bands the model does not know are skipped.
fn radio_from_remote(radio: &LegacyRadio) -> Option<RadioOverride> {
    let band = radio.radio.parse::<RadioBand>().ok()?;
    Some(RadioOverride {
        band,
        channel: radio.channel.as_ref().and_then(value_to_string),
        channel_width: radio.ht,
        tx_power_mode: non_empty(radio.tx_power_mode.as_ref()),
        tx_power: radio.tx_power.as_ref().and_then(value_to_string),
    })
}

fn outlet_from_remote(outlet: &LegacyOutletOverride) -> OutletOverride {
    OutletOverride {
        index: outlet.index,
        name: non_empty(outlet.name.as_ref()),
        relay_state: outlet.relay_state,
        cycle_enabled: outlet.cycle_enabled,
    }
}

/// Domain view of a device record.
pub fn device_from_remote(device: &LegacyDevice, site: &str) -> Result<Device, CoreError> {
    Ok(Device {
        id: device.id.clone(),
        mac: MacAddress::parse(&device.mac)?,
        site: site.to_owned(),
        state: state_label(device.state),
        adopted: device.adopted,
        model: non_empty(device.model.as_ref()),
        config: config_from_remote(device),
    })
}

// ── Device: model → remote ─────────────────────────────────────────

/// Overlay `config` onto `base`, producing the update payload.
///
/// Scalars set in `config` replace the base value; unset ones keep it.
/// Port and outlet overrides, when set, are a full replacement set. Radios
/// are merged by band into the existing radio table since the table
/// describes hardware that cannot be removed.
pub fn device_to_remote(base: &LegacyDevice, config: &DeviceConfig) -> LegacyDevice {
    let mut out = base.clone();

    overlay(&mut out.name, config.name.as_ref());
    if config.disabled.is_some() {
        out.disabled = config.disabled;
    }
    overlay(&mut out.led_override, config.led_override.as_ref());
    overlay(&mut out.led_override_color, config.led_color.as_ref());
    if config.led_brightness.is_some() {
        out.led_override_color_brightness = config.led_brightness;
    }
    overlay(&mut out.snmp_contact, config.snmp_contact.as_ref());
    overlay(&mut out.snmp_location, config.snmp_location.as_ref());
    overlay(&mut out.mgmt_network_id, config.mgmt_network_id.as_ref());

    if let Some(ports) = &config.port_overrides {
        out.port_overrides = Some(ports_to_remote(base.port_overrides.as_deref(), ports));
    }
    if let Some(radios) = &config.radios {
        out.radio_table = Some(radios_to_remote(base.radio_table.as_deref(), radios));
    }
    if let Some(outlets) = &config.outlet_overrides {
        out.outlet_overrides = Some(outlets_to_remote(base.outlet_overrides.as_deref(), outlets));
    }

    out
}

fn overlay(slot: &mut Option<String>, value: Option<&String>) {
    if let Some(value) = value {
        *slot = Some(value.clone());
    }
}

fn ports_to_remote(
    existing: Option<&[LegacyPortOverride]>,
    planned: &[PortOverride],
) -> Vec<LegacyPortOverride> {
    let existing: BTreeMap<u32, &LegacyPortOverride> = existing
        .unwrap_or_default()
        .iter()
        .map(|p| (p.port_idx, p))
        .collect();
    let planned: BTreeMap<u32, &PortOverride> = planned.iter().map(|p| (p.index, p)).collect();

    planned
        .into_iter()
        .map(|(index, port)| {
            let mut wire = existing.get(&index).map_or_else(
                || LegacyPortOverride {
                    port_idx: index,
                    name: None,
                    portconf_id: None,
                    op_mode: None,
                    poe_mode: None,
                    aggregate_num_ports: None,
                    extra: serde_json::Map::new(),
                },
                |p| (*p).clone(),
            );
            overlay(&mut wire.name, port.name.as_ref());
            overlay(&mut wire.portconf_id, port.port_profile_id.as_ref());
            overlay(&mut wire.op_mode, port.op_mode.as_ref());
            overlay(&mut wire.poe_mode, port.poe_mode.as_ref());
            if port.aggregate_num_ports.is_some() {
                wire.aggregate_num_ports = port.aggregate_num_ports;
            }
            wire
        })
        .collect()
}

fn radios_to_remote(
    existing: Option<&[LegacyRadio]>,
    planned: &[RadioOverride],
) -> Vec<LegacyRadio> {
    let mut planned: BTreeMap<RadioBand, &RadioOverride> =
        planned.iter().map(|r| (r.band, r)).collect();

    let mut table: Vec<LegacyRadio> = existing
        .unwrap_or_default()
        .iter()
        .map(|radio| {
            let band = radio.radio.parse::<RadioBand>().ok();
            match band.and_then(|b| planned.remove(&b)) {
                Some(plan) => apply_radio(radio.clone(), plan),
                None => radio.clone(),
            }
        })
        .collect();

    for (band, plan) in planned {
        let fresh = LegacyRadio {
            radio: band.to_string(),
            channel: None,
            ht: None,
            tx_power_mode: None,
            tx_power: None,
            extra: serde_json::Map::new(),
        };
        table.push(apply_radio(fresh, plan));
    }
    table
}

fn apply_radio(mut wire: LegacyRadio, plan: &RadioOverride) -> LegacyRadio {
    if let Some(channel) = plan.channel.as_deref() {
        wire.channel = Some(string_to_value(channel, wire.channel.as_ref()));
    }
    if plan.channel_width.is_some() {
        wire.ht = plan.channel_width;
    }
    overlay(&mut wire.tx_power_mode, plan.tx_power_mode.as_ref());
    if let Some(power) = plan.tx_power.as_deref() {
        wire.tx_power = Some(string_to_value(power, wire.tx_power.as_ref()));
    }
    wire
}

fn outlets_to_remote(
    existing: Option<&[LegacyOutletOverride]>,
    planned: &[OutletOverride],
) -> Vec<LegacyOutletOverride> {
    let existing: BTreeMap<u32, &LegacyOutletOverride> = existing
        .unwrap_or_default()
        .iter()
        .map(|o| (o.index, o))
        .collect();
    let planned: BTreeMap<u32, &OutletOverride> = planned.iter().map(|o| (o.index, o)).collect();

    planned
        .into_iter()
        .map(|(index, outlet)| {
            let mut wire = existing.get(&index).map_or_else(
                || LegacyOutletOverride {
                    index,
                    name: None,
                    relay_state: None,
                    cycle_enabled: None,
                    extra: serde_json::Map::new(),
                },
                |o| (*o).clone(),
            );
            overlay(&mut wire.name, outlet.name.as_ref());
            if outlet.relay_state.is_some() {
                wire.relay_state = outlet.relay_state;
            }
            if outlet.cycle_enabled.is_some() {
                wire.cycle_enabled = outlet.cycle_enabled;
            }
            wire
        })
        .collect()
}

// ── Users ───────────────────────────────────────────────────────────

/// Managed fields of a user record. A stored fixed IP only counts while
/// the fixed-IP flag is on.
pub fn user_config_from_remote(user: &LegacyUser) -> UserConfig {
    let fixed = user.use_fixedip.unwrap_or(false);
    UserConfig {
        name: non_empty(user.name.as_ref()),
        note: non_empty(user.note.as_ref()),
        fixed_ip: if fixed {
            non_empty(user.fixed_ip.as_ref())
        } else {
            None
        },
        network_id: non_empty(user.network_id.as_ref()),
        user_group_id: non_empty(user.usergroup_id.as_ref()),
        blocked: user.blocked,
        local_dns_record: non_empty(user.local_dns_record.as_ref()),
    }
}

/// Overlay `config` onto `base`. Setting a fixed IP turns the flag on.
pub fn user_to_remote(base: &LegacyUser, config: &UserConfig) -> LegacyUser {
    let mut out = base.clone();
    overlay(&mut out.name, config.name.as_ref());
    overlay(&mut out.note, config.note.as_ref());
    if let Some(ip) = &config.fixed_ip {
        out.fixed_ip = Some(ip.clone());
        out.use_fixedip = Some(true);
    }
    overlay(&mut out.network_id, config.network_id.as_ref());
    overlay(&mut out.usergroup_id, config.user_group_id.as_ref());
    if config.blocked.is_some() {
        out.blocked = config.blocked;
    }
    overlay(&mut out.local_dns_record, config.local_dns_record.as_ref());
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn remote_device() -> LegacyDevice {
        serde_json::from_value(json!({
            "_id": "64f0c0ffee",
            "mac": "aa:bb:cc:dd:ee:ff",
            "type": "usw",
            "model": "US8P60",
            "adopted": true,
            "state": 1,
            "name": "closet-switch",
            "led_override": "default",
            "snmp_contact": "",
            "port_overrides": [
                { "port_idx": 1, "name": "uplink", "portconf_id": "all", "stp_port_mode": true },
                { "port_idx": 4, "name": "camera", "poe_mode": "auto" }
            ],
            "radio_table": [
                { "radio": "ng", "channel": 6, "ht": 20, "tx_power_mode": "auto", "min_rssi": -80 },
                { "radio": "na", "channel": "auto", "ht": 80 }
            ],
            "config_network": { "type": "dhcp" },
            "inform_url": "http://unifi:8080/inform"
        }))
        .unwrap()
    }

    #[test]
    fn remote_config_drops_empty_strings() {
        let config = config_from_remote(&remote_device());
        assert_eq!(config.name.as_deref(), Some("closet-switch"));
        assert_eq!(config.snmp_contact, None);
        assert_eq!(config.snmp_location, None);
        assert_eq!(config.disabled, None);
    }

    #[test]
    fn remote_radios_render_channel_as_string() {
        let radios = config_from_remote(&remote_device()).radios.unwrap();
        assert_eq!(radios.len(), 2);
        assert_eq!(radios[0].band, RadioBand::Ng);
        assert_eq!(radios[0].channel.as_deref(), Some("6"));
        assert_eq!(radios[1].channel.as_deref(), Some("auto"));
    }

    #[test]
    fn duplicate_port_indices_collapse_last_write_wins() {
        let config = DeviceConfig {
            port_overrides: Some(vec![
                PortOverride {
                    index: 5,
                    name: Some("first".into()),
                    ..PortOverride::default()
                },
                PortOverride {
                    index: 2,
                    name: Some("two".into()),
                    ..PortOverride::default()
                },
                PortOverride {
                    index: 5,
                    name: Some("second".into()),
                    ..PortOverride::default()
                },
            ]),
            ..DeviceConfig::default()
        };

        let wire = device_to_remote(&remote_device(), &config);
        let ports = wire.port_overrides.unwrap();

        let names: Vec<(u32, Option<&str>)> =
            ports.iter().map(|p| (p.port_idx, p.name.as_deref())).collect();
        assert_eq!(names, vec![(2, Some("two")), (5, Some("second"))]);
    }

    #[test]
    fn port_overlay_preserves_unknown_fields_of_same_index() {
        let config = DeviceConfig {
            port_overrides: Some(vec![PortOverride {
                index: 1,
                name: Some("core-uplink".into()),
                ..PortOverride::default()
            }]),
            ..DeviceConfig::default()
        };

        let wire = device_to_remote(&remote_device(), &config);
        let port = &wire.port_overrides.unwrap()[0];
        assert_eq!(port.name.as_deref(), Some("core-uplink"));
        assert_eq!(port.portconf_id.as_deref(), Some("all"));
        assert_eq!(port.extra.get("stp_port_mode"), Some(&json!(true)));
    }

    #[test]
    fn unchanged_config_round_trips_to_identical_record() {
        let remote = remote_device();
        let config = config_from_remote(&remote);
        assert_eq!(device_to_remote(&remote, &config), remote);
    }

    #[test]
    fn radio_overlay_keeps_numeric_channel_and_unplanned_bands() {
        let config = DeviceConfig {
            radios: Some(vec![
                RadioOverride {
                    band: RadioBand::Na,
                    channel: Some("36".into()),
                    channel_width: None,
                    tx_power_mode: Some("medium".into()),
                    tx_power: None,
                },
                RadioOverride {
                    band: RadioBand::SixE,
                    channel: Some("auto".into()),
                    channel_width: Some(160),
                    tx_power_mode: None,
                    tx_power: None,
                },
            ]),
            ..DeviceConfig::default()
        };

        let table = device_to_remote(&remote_device(), &config).radio_table.unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table[0].channel, Some(json!(6)));
        assert_eq!(table[0].extra.get("min_rssi"), Some(&json!(-80)));
        assert_eq!(table[1].channel, Some(json!(36)));
        assert_eq!(table[1].ht, Some(80));
        assert_eq!(table[1].tx_power_mode.as_deref(), Some("medium"));
        assert_eq!(table[2].radio, "6e");
        assert_eq!(table[2].channel, Some(json!("auto")));
    }

    #[test]
    fn unmanaged_fields_are_echoed() {
        let config = DeviceConfig {
            name: Some("renamed".into()),
            ..DeviceConfig::default()
        };
        let wire = device_to_remote(&remote_device(), &config);
        assert_eq!(wire.name.as_deref(), Some("renamed"));
        assert_eq!(wire.extra.get("config_network"), Some(&json!({ "type": "dhcp" })));
        assert_eq!(wire.extra.get("inform_url"), Some(&json!("http://unifi:8080/inform")));
    }

    #[test]
    fn user_fixed_ip_follows_flag() {
        let user: LegacyUser = serde_json::from_value(json!({
            "_id": "u1",
            "mac": "00:11:22:33:44:55",
            "fixed_ip": "10.0.0.5",
            "use_fixedip": false
        }))
        .unwrap();
        assert_eq!(user_config_from_remote(&user).fixed_ip, None);

        let config = UserConfig {
            fixed_ip: Some("10.0.0.9".into()),
            ..UserConfig::default()
        };
        let wire = user_to_remote(&user, &config);
        assert_eq!(wire.use_fixedip, Some(true));
        assert_eq!(wire.fixed_ip.as_deref(), Some("10.0.0.9"));
        assert_eq!(user_config_from_remote(&wire).fixed_ip.as_deref(), Some("10.0.0.9"));
    }
}

// ── Three-way merge ──
//
// Combines the freshly fetched remote snapshot, the prior persisted state,
// and the plan. Per field: plan if set, else prior if set, else snapshot.
// Override collections are merged as whole lists, never element-wise.

use crate::model::{DeviceConfig, UserConfig};

/// Field-wise merge of three views of the same object.
pub trait Reconcile: Sized {
    fn reconcile(snapshot: &Self, prior: &Self, plan: &Self) -> Self;
}

fn pick<T: Clone>(snapshot: Option<&T>, prior: Option<&T>, plan: Option<&T>) -> Option<T> {
    plan.or(prior).or(snapshot).cloned()
}

impl Reconcile for DeviceConfig {
    fn reconcile(snapshot: &Self, prior: &Self, plan: &Self) -> Self {
        Self {
            name: pick(snapshot.name.as_ref(), prior.name.as_ref(), plan.name.as_ref()),
            disabled: pick(
                snapshot.disabled.as_ref(),
                prior.disabled.as_ref(),
                plan.disabled.as_ref(),
            ),
            led_override: pick(
                snapshot.led_override.as_ref(),
                prior.led_override.as_ref(),
                plan.led_override.as_ref(),
            ),
            led_color: pick(
                snapshot.led_color.as_ref(),
                prior.led_color.as_ref(),
                plan.led_color.as_ref(),
            ),
            led_brightness: pick(
                snapshot.led_brightness.as_ref(),
                prior.led_brightness.as_ref(),
                plan.led_brightness.as_ref(),
            ),
            snmp_contact: pick(
                snapshot.snmp_contact.as_ref(),
                prior.snmp_contact.as_ref(),
                plan.snmp_contact.as_ref(),
            ),
            snmp_location: pick(
                snapshot.snmp_location.as_ref(),
                prior.snmp_location.as_ref(),
                plan.snmp_location.as_ref(),
            ),
            mgmt_network_id: pick(
                snapshot.mgmt_network_id.as_ref(),
                prior.mgmt_network_id.as_ref(),
                plan.mgmt_network_id.as_ref(),
            ),
            port_overrides: pick(
                snapshot.port_overrides.as_ref(),
                prior.port_overrides.as_ref(),
                plan.port_overrides.as_ref(),
            ),
            radios: pick(snapshot.radios.as_ref(), prior.radios.as_ref(), plan.radios.as_ref()),
            outlet_overrides: pick(
                snapshot.outlet_overrides.as_ref(),
                prior.outlet_overrides.as_ref(),
                plan.outlet_overrides.as_ref(),
            ),
        }
    }
}

impl Reconcile for UserConfig {
    fn reconcile(snapshot: &Self, prior: &Self, plan: &Self) -> Self {
        Self {
            name: pick(snapshot.name.as_ref(), prior.name.as_ref(), plan.name.as_ref()),
            note: pick(snapshot.note.as_ref(), prior.note.as_ref(), plan.note.as_ref()),
            fixed_ip: pick(
                snapshot.fixed_ip.as_ref(),
                prior.fixed_ip.as_ref(),
                plan.fixed_ip.as_ref(),
            ),
            network_id: pick(
                snapshot.network_id.as_ref(),
                prior.network_id.as_ref(),
                plan.network_id.as_ref(),
            ),
            user_group_id: pick(
                snapshot.user_group_id.as_ref(),
                prior.user_group_id.as_ref(),
                plan.user_group_id.as_ref(),
            ),
            blocked: pick(snapshot.blocked.as_ref(), prior.blocked.as_ref(), plan.blocked.as_ref()),
            local_dns_record: pick(
                snapshot.local_dns_record.as_ref(),
                prior.local_dns_record.as_ref(),
                plan.local_dns_record.as_ref(),
            ),
        }
    }
}

//! Device command handlers.

use tabled::Tabled;

use uniform_core::convert::device_from_remote;
use uniform_core::model::Device;
use uniform_core::{CoreError, DevicePlan, DeviceResourceState};

use super::{Context, or_dash, read_plan, read_state, remove_state, write_state};
use crate::cli::{ApplyArgs, DeviceCommand, ImportArgs, StateArgs};
use crate::error::CliError;
use crate::output;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "MAC")]
    mac: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Adopted")]
    adopted: String,
}

impl From<&Device> for DeviceRow {
    fn from(d: &Device) -> Self {
        Self {
            id: d.id.clone(),
            name: or_dash(d.config.name.as_deref()),
            model: or_dash(d.model.as_deref()),
            mac: d.mac.to_string(),
            state: d.state.clone(),
            adopted: if d.adopted { "yes" } else { "no" }.into(),
        }
    }
}

fn detail(s: &DeviceResourceState) -> String {
    let c = &s.config;
    let count = |n: Option<usize>| n.map_or_else(|| "-".into(), |n| n.to_string());
    output::detail_lines(&[
        ("ID", s.id.clone()),
        ("MAC", s.mac.to_string()),
        ("Site", s.site.clone()),
        ("State", s.state.clone()),
        ("Adopted", s.adopted.to_string()),
        ("Name", or_dash(c.name.as_deref())),
        ("Disabled", c.disabled.map_or_else(|| "-".into(), |d| d.to_string())),
        ("LED", or_dash(c.led_override.as_deref())),
        ("SNMP Location", or_dash(c.snmp_location.as_deref())),
        ("Mgmt Network", or_dash(c.mgmt_network_id.as_deref())),
        ("Port Overrides", count(c.port_overrides.as_ref().map(Vec::len))),
        ("Radios", count(c.radios.as_ref().map(Vec::len))),
        ("Outlets", count(c.outlet_overrides.as_ref().map(Vec::len))),
        ("Forget on Destroy", s.forget_on_destroy.to_string()),
    ])
}

fn render(ctx: &Context<'_>, state: &DeviceResourceState) {
    let out = output::render_single(&ctx.global.output, state, detail, |s| s.id.clone());
    ctx.print(&out);
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(cmd: DeviceCommand, ctx: &Context<'_>) -> Result<(), CliError> {
    match cmd {
        DeviceCommand::List => list(ctx).await,
        DeviceCommand::Import(args) => import(args, ctx).await,
        DeviceCommand::Apply(args) => apply(args, ctx).await,
        DeviceCommand::Read(args) => read(args, ctx).await,
        DeviceCommand::Destroy(args) => destroy(args, ctx).await,
    }
}

async fn list(ctx: &Context<'_>) -> Result<(), CliError> {
    let (provider, config) = ctx.connect().await?;
    let site = config.site.as_str();
    let raw = provider
        .devices()
        .lifecycle()
        .directory()
        .list_devices(site)
        .await
        .map_err(|e| CoreError::directory("list", site, "devices", e))?;
    let devices = raw
        .iter()
        .map(|d| device_from_remote(d, site))
        .collect::<Result<Vec<_>, _>>()?;

    let out = output::render_list(&ctx.global.output, &devices, |d| DeviceRow::from(d), |d| {
        d.mac.to_string()
    });
    ctx.print(&out);
    Ok(())
}

async fn import(args: ImportArgs, ctx: &Context<'_>) -> Result<(), CliError> {
    let (provider, _) = ctx.connect().await?;
    let state = provider.devices().import(&args.id).await?;
    if let Some(ref path) = args.state {
        write_state(path, &state)?;
    }
    render(ctx, &state);
    Ok(())
}

async fn apply(args: ApplyArgs, ctx: &Context<'_>) -> Result<(), CliError> {
    let plan: DevicePlan = read_plan(&args.plan)?;
    let prior: Option<DeviceResourceState> = match args.state.as_deref() {
        Some(path) if path.exists() => Some(read_state(path)?),
        _ => None,
    };
    ctx.check(&plan.validate())?;
    let (provider, _) = ctx.connect().await?;

    let spinner = ctx.spinner(format!("Applying {}", plan.mac));
    let result = match prior {
        Some(ref prior) => provider.devices().update(prior, &plan, &ctx.cancel).await,
        None => provider.devices().create(&plan, &ctx.cancel).await,
    };
    spinner.finish_and_clear();
    let state = result?;

    if let Some(ref path) = args.state {
        write_state(path, &state)?;
    }
    render(ctx, &state);
    Ok(())
}

async fn read(args: StateArgs, ctx: &Context<'_>) -> Result<(), CliError> {
    let prior: DeviceResourceState = read_state(&args.state)?;
    let (provider, _) = ctx.connect().await?;
    match provider.devices().read(&prior).await? {
        Some(state) => {
            write_state(&args.state, &state)?;
            render(ctx, &state);
            Ok(())
        }
        None => Err(CliError::NotFound {
            resource_type: "device".into(),
            identifier: prior.mac.to_string(),
            hint: format!(
                "It was removed outside uniform. Delete {} or re-apply the plan.",
                args.state.display()
            ),
        }),
    }
}

async fn destroy(args: StateArgs, ctx: &Context<'_>) -> Result<(), CliError> {
    let prior: DeviceResourceState = read_state(&args.state)?;
    let (provider, _) = ctx.connect().await?;

    let spinner = ctx.spinner(format!("Forgetting {}", prior.mac));
    let result = provider.devices().delete(&prior, &ctx.cancel).await;
    spinner.finish_and_clear();
    result?;

    remove_state(&args.state)?;
    if !ctx.global.quiet {
        eprintln!("Released device {}", prior.mac);
    }
    Ok(())
}

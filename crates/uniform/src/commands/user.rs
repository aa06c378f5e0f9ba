//! User (known-client) command handlers.

use uniform_core::{UserPlan, UserResourceState};

use super::{Context, or_dash, read_plan, read_state, remove_state, write_state};
use crate::cli::{ApplyArgs, ImportArgs, StateArgs, UserCommand};
use crate::error::CliError;
use crate::output;

fn detail(s: &UserResourceState) -> String {
    let c = &s.config;
    output::detail_lines(&[
        ("ID", s.id.clone()),
        ("MAC", s.mac.to_string()),
        ("Site", s.site.clone()),
        ("Name", or_dash(c.name.as_deref())),
        ("Note", or_dash(c.note.as_deref())),
        ("Fixed IP", or_dash(c.fixed_ip.as_deref())),
        ("Network", or_dash(c.network_id.as_deref())),
        ("User Group", or_dash(c.user_group_id.as_deref())),
        ("Blocked", c.blocked.map_or_else(|| "-".into(), |b| b.to_string())),
        ("DNS Record", or_dash(c.local_dns_record.as_deref())),
    ])
}

fn render(ctx: &Context<'_>, state: &UserResourceState) {
    let out = output::render_single(&ctx.global.output, state, detail, |s| s.id.clone());
    ctx.print(&out);
}

pub async fn handle(cmd: UserCommand, ctx: &Context<'_>) -> Result<(), CliError> {
    match cmd {
        UserCommand::Import(args) => import(args, ctx).await,
        UserCommand::Apply(args) => apply(args, ctx).await,
        UserCommand::Read(args) => read(args, ctx).await,
        UserCommand::Destroy(args) => destroy(args, ctx).await,
    }
}

async fn import(args: ImportArgs, ctx: &Context<'_>) -> Result<(), CliError> {
    let (provider, _) = ctx.connect().await?;
    let state = provider.users().import(&args.id).await?;
    if let Some(ref path) = args.state {
        write_state(path, &state)?;
    }
    render(ctx, &state);
    Ok(())
}

async fn apply(args: ApplyArgs, ctx: &Context<'_>) -> Result<(), CliError> {
    let plan: UserPlan = read_plan(&args.plan)?;
    let prior: Option<UserResourceState> = match args.state.as_deref() {
        Some(path) if path.exists() => Some(read_state(path)?),
        _ => None,
    };
    ctx.check(&plan.validate())?;
    let (provider, _) = ctx.connect().await?;

    let state = match prior {
        Some(ref prior) => provider.users().update(prior, &plan).await?,
        None => provider.users().create(&plan).await?,
    };
    if let Some(ref path) = args.state {
        write_state(path, &state)?;
    }
    render(ctx, &state);
    Ok(())
}

async fn read(args: StateArgs, ctx: &Context<'_>) -> Result<(), CliError> {
    let prior: UserResourceState = read_state(&args.state)?;
    let (provider, _) = ctx.connect().await?;
    match provider.users().read(&prior).await? {
        Some(state) => {
            write_state(&args.state, &state)?;
            render(ctx, &state);
            Ok(())
        }
        None => Err(CliError::NotFound {
            resource_type: "user".into(),
            identifier: prior.mac.to_string(),
            hint: format!(
                "It was removed outside uniform. Delete {} or re-apply the plan.",
                args.state.display()
            ),
        }),
    }
}

async fn destroy(args: StateArgs, ctx: &Context<'_>) -> Result<(), CliError> {
    let prior: UserResourceState = read_state(&args.state)?;
    let (provider, _) = ctx.connect().await?;
    provider.users().delete(&prior).await?;
    remove_state(&args.state)?;
    if !ctx.global.quiet {
        eprintln!("Released client {}", prior.mac);
    }
    Ok(())
}

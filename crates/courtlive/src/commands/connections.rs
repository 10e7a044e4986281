//! Connection command handlers.
//!
//! Registry edits work on the saved state directly; `test` and `matches`
//! start an engine so they exercise the same backend as `run`.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::Serialize;
use tabled::Tabled;

use courtlive_core::{
    Connection, ConnectionDraft, ConnectionId, ConnectionPatch, MatchInfo, ProviderKind,
};

use crate::cli::{
    ConnectionAddArgs, ConnectionUpdateArgs, ConnectionsArgs, ConnectionsCommand, GlobalOpts,
};
use crate::error::CliError;
use crate::output;

use super::util::{self, Context};

// ── Views ───────────────────────────────────────────────────────────

/// Serializable view of a connection. The credential is never shown.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConnectionView {
    id: ConnectionId,
    name: String,
    provider: ProviderKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    court: Option<String>,
    normalize: bool,
    poll_interval_secs: u64,
    is_active: bool,
    has_credential: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_updated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_error: Option<String>,
}

impl From<&Connection> for ConnectionView {
    fn from(c: &Connection) -> Self {
        Self {
            id: c.id,
            name: c.name.clone(),
            provider: c.provider,
            endpoint: c.endpoint.clone(),
            court: c.court.clone(),
            normalize: c.normalize,
            poll_interval_secs: c.poll_interval_secs,
            is_active: c.is_active,
            has_credential: c.credential.is_some(),
            last_updated_at: c.last_updated_at,
            last_error: c.last_error.clone(),
        }
    }
}

#[derive(Tabled)]
struct ConnectionRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Provider")]
    provider: String,
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Every")]
    interval: String,
    #[tabled(rename = "Active")]
    active: String,
}

impl From<&ConnectionView> for ConnectionRow {
    fn from(c: &ConnectionView) -> Self {
        let source = match (&c.endpoint, &c.court) {
            (Some(endpoint), _) => endpoint.clone(),
            (None, Some(court)) => format!("court: {court}"),
            (None, None) => "-".into(),
        };
        Self {
            id: c.id.to_string(),
            name: c.name.clone(),
            provider: c.provider.to_string(),
            source,
            interval: format!("{}s", c.poll_interval_secs),
            active: if c.is_active { "yes" } else { "no" }.into(),
        }
    }
}

#[derive(Tabled)]
struct MatchRow {
    #[tabled(rename = "Match")]
    id: String,
    #[tabled(rename = "Players")]
    players: String,
    #[tabled(rename = "Tournament")]
    tournament: String,
    #[tabled(rename = "Round")]
    round: String,
    #[tabled(rename = "Status")]
    status: String,
}

impl From<&MatchInfo> for MatchRow {
    fn from(m: &MatchInfo) -> Self {
        Self {
            id: m.match_id.clone(),
            players: format!("{} vs {}", m.player1_name, m.player2_name),
            tournament: m.tournament.clone(),
            round: m.round.clone(),
            status: m.status.clone(),
        }
    }
}

fn detail(c: &ConnectionView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "ID:          {}", c.id);
    let _ = writeln!(out, "Name:        {}", c.name);
    let _ = writeln!(out, "Provider:    {}", c.provider);
    if let Some(ref endpoint) = c.endpoint {
        let _ = writeln!(out, "Endpoint:    {endpoint}");
    }
    if let Some(ref court) = c.court {
        let _ = writeln!(out, "Court:       {court}");
    }
    let _ = writeln!(out, "Interval:    {}s", c.poll_interval_secs);
    let _ = writeln!(out, "Normalize:   {}", c.normalize);
    let _ = writeln!(out, "Credential:  {}", if c.has_credential { "set" } else { "none" });
    let _ = write!(out, "Active:      {}", c.is_active);
    if let Some(ref err) = c.last_error {
        let _ = write!(out, "\nLast error:  {err}");
    }
    out
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    ctx: &Context,
    args: ConnectionsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        ConnectionsCommand::List => {
            let registry = ctx.load_registry().await?;
            let views: Vec<ConnectionView> =
                registry.connections().iter().map(ConnectionView::from).collect();
            let out = output::render_list(&global.output, &views, |c: &ConnectionView| ConnectionRow::from(c), |c| {
                c.id.to_string()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConnectionsCommand::Get { connection } => {
            let registry = ctx.load_registry().await?;
            let conns = registry.connections();
            let id = util::resolve_connection(&conns, &connection)?;
            let view = conns
                .iter()
                .find(|c| c.id == id)
                .map(ConnectionView::from)
                .ok_or(courtlive_core::CoreError::ConnectionNotFound { id })?;
            let out = output::render_single(&global.output, &view, detail, |c| c.id.to_string());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConnectionsCommand::Add(add) => {
            let activate = add.activate;
            let draft = draft_from_args(add);
            let registry = ctx.load_registry().await?;
            let id = registry.add_connection(draft)?;
            if activate {
                registry.set_active(&id, true, Utc::now())?;
            }
            ctx.save_registry(&registry).await?;
            output::print_output(&id.to_string(), global.quiet);
            Ok(())
        }

        ConnectionsCommand::Update(update) => {
            let registry = ctx.load_registry().await?;
            let id = util::resolve_connection(&registry.connections(), &update.connection)?;
            let updated = registry.update_connection(&id, patch_from_args(update))?;
            ctx.save_registry(&registry).await?;
            let view = ConnectionView::from(&updated);
            let out = output::render_single(&global.output, &view, detail, |c| c.id.to_string());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConnectionsCommand::Remove { connection } => {
            let registry = ctx.load_registry().await?;
            let id = util::resolve_connection(&registry.connections(), &connection)?;
            if !util::confirm(
                &format!("Remove connection '{connection}' and its bindings?"),
                global.yes,
            )? {
                return Ok(());
            }
            let (removed, orphaned) = registry.remove_connection(&id)?;
            ctx.save_registry(&registry).await?;
            if !global.quiet {
                eprintln!(
                    "Removed '{}' and {} binding(s)",
                    removed.name,
                    orphaned.len()
                );
            }
            Ok(())
        }

        ConnectionsCommand::Activate { connection } => {
            set_active(ctx, &connection, true).await
        }

        ConnectionsCommand::Deactivate { connection } => {
            set_active(ctx, &connection, false).await
        }

        ConnectionsCommand::Test { connection } => {
            let engine = ctx.build_engine(ctx.config.display_instances())?;
            engine.start().await?;
            let result = async {
                let id = util::resolve_connection(&engine.connections(), &connection)?;
                Ok::<_, CliError>(engine.test_connection(&id).await?)
            }
            .await;
            engine.shutdown().await;

            let reachable = result?;
            if !reachable {
                return Err(CliError::Fetch {
                    message: format!("'{connection}' did not answer with a success status"),
                });
            }
            output::print_output("ok", global.quiet);
            Ok(())
        }

        ConnectionsCommand::Matches { connection } => {
            let engine = ctx.build_engine(ctx.config.display_instances())?;
            engine.start().await?;
            let result = async {
                let id = util::resolve_connection(&engine.connections(), &connection)?;
                Ok::<_, CliError>(engine.list_matches(&id).await?)
            }
            .await;
            engine.shutdown().await;

            let matches = result?;
            let out = output::render_list(&global.output, &matches, |m: &MatchInfo| MatchRow::from(m), |m| {
                m.match_id.clone()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}

async fn set_active(ctx: &Context, connection: &str, active: bool) -> Result<(), CliError> {
    let registry = ctx.load_registry().await?;
    let id = util::resolve_connection(&registry.connections(), connection)?;
    if registry.set_active(&id, active, Utc::now())? {
        ctx.save_registry(&registry).await?;
    }
    Ok(())
}

fn draft_from_args(args: ConnectionAddArgs) -> ConnectionDraft {
    let mut draft = ConnectionDraft::new(args.name, args.provider).normalize(args.normalize);
    if let Some(endpoint) = args.endpoint {
        draft = draft.endpoint(endpoint);
    }
    if let Some(key) = args.credential {
        draft = draft.credential(SecretString::from(key));
    }
    if let Some(court) = args.court {
        draft = draft.court(court);
    }
    if let Some(secs) = args.interval {
        draft = draft.poll_interval_secs(secs);
    }
    draft
}

fn patch_from_args(args: ConnectionUpdateArgs) -> ConnectionPatch {
    fn clearable<T>(value: Option<T>, clear: bool) -> Option<Option<T>> {
        if clear { Some(None) } else { value.map(Some) }
    }

    ConnectionPatch {
        name: args.name,
        provider: args.provider,
        endpoint: clearable(args.endpoint, args.clear_endpoint),
        credential: clearable(args.credential.map(SecretString::from), args.clear_credential),
        court: clearable(args.court, args.clear_court),
        normalize: args.normalize,
        poll_interval_secs: args.interval,
    }
}

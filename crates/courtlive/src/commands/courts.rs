//! `courts`: one-shot views of the multi-court feed.

use std::fmt::Write as _;
use std::sync::Arc;

use tabled::Tabled;

use courtlive_core::CourtEntry;

use crate::cli::{CourtsArgs, CourtsCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util::{self, Context};

#[derive(Tabled)]
struct CourtRow {
    #[tabled(rename = "Court")]
    court: String,
    #[tabled(rename = "Match")]
    match_id: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Updated")]
    updated: String,
}

fn text_at(entry: &CourtEntry, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|k| entry.payload.get(*k))
        .map_or_else(
            || "-".into(),
            |v| v.as_str().map_or_else(|| v.to_string(), str::to_owned),
        )
}

impl From<&Arc<CourtEntry>> for CourtRow {
    fn from(entry: &Arc<CourtEntry>) -> Self {
        Self {
            court: entry.court_name.clone(),
            match_id: text_at(entry, &["matchId", "match_id", "id"]),
            status: text_at(entry, &["matchStatus", "status"]),
            updated: util::format_age(Some(entry.last_updated_at)),
        }
    }
}

pub async fn handle(ctx: &Context, args: CourtsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        CourtsCommand::List { courts } => {
            let engine = ctx.build_engine(ctx.displays(&courts))?;
            let report = engine.sync_now().await?;
            tracing::debug!(
                fetched = report.fetched,
                scoped = !report.working_set.is_empty(),
                "court sync finished"
            );

            let entries: Vec<Arc<CourtEntry>> = engine
                .available_courts()
                .iter()
                .filter_map(|name| engine.court_data(name))
                .collect();
            let out = output::render_list(&global.output, &entries, |e: &Arc<CourtEntry>| CourtRow::from(e), |e| {
                e.court_name.clone()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        CourtsCommand::Show { court } => {
            let engine = ctx.build_engine(ctx.displays(std::slice::from_ref(&court)))?;
            engine.sync_now().await?;
            let entry = engine.court_data(&court).ok_or_else(|| CliError::NotFound {
                resource_type: "court".into(),
                identifier: court.clone(),
                list_command: "courts list".into(),
            })?;
            let out = output::render_single(
                &global.output,
                entry.as_ref(),
                |e| {
                    let mut s = String::new();
                    let _ = writeln!(s, "Court:    {}", e.court_name);
                    let _ = writeln!(s, "Updated:  {}", util::format_age(Some(e.last_updated_at)));
                    let _ = write!(s, "{}", output::render_json_pretty(&e.payload));
                    s
                },
                |e| output::render_json_compact(&e.payload),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}

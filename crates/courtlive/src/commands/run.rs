//! `run`: keep the engine running and print updates until interrupted.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::cli::{GlobalOpts, OutputFormat, RunArgs};
use crate::error::CliError;
use crate::output;

use super::util::Context;

const WATCH_INTERVAL: Duration = Duration::from_millis(250);

pub async fn handle(ctx: &Context, args: RunArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let displays = ctx.displays(&args.courts);
    let engine = ctx.build_engine(displays)?;
    engine.start().await?;

    if !args.no_sync {
        engine.start_sync(args.interval)?;
    }

    let active = engine.connections().iter().filter(|c| c.is_active).count();
    info!(
        connections = active,
        state = %ctx.state_path.display(),
        "engine running"
    );

    let mut printer = Printer {
        format: global.output.clone(),
        color: output::should_color(&global.color),
        quiet: global.quiet,
        courts_seen: HashMap::new(),
        values_seen: HashMap::new(),
    };
    let stale_after = ctx.config.engine.stale_after_minutes;
    let mut was_stale = false;

    let mut courts = engine.subscribe_courts();
    let mut ticker = tokio::time::interval(WATCH_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            biased;
            res = &mut ctrl_c => {
                if let Err(e) = res {
                    warn!(error = %e, "cannot listen for ctrl-c, stopping");
                }
                break;
            }
            changed = courts.changed() => {
                let Some(snapshot) = changed else { break };
                for entry in snapshot.iter() {
                    printer.court(&entry.court_name, entry.last_updated_at, &entry.payload);
                }
            }
            _ = ticker.tick() => {
                for component in &args.watch {
                    if let Some(value) = engine.get_value(component) {
                        printer.value(component, &value);
                    }
                }
                if !args.no_sync {
                    let stale = engine.is_stale(stale_after);
                    if stale && !was_stale {
                        warn!(minutes = stale_after, "court data is stale");
                    }
                    was_stale = stale;
                }
            }
        }
    }

    info!("shutting down");
    engine.shutdown().await;
    if let Some(err) = engine.persistence_error() {
        return Err(CliError::Persistence { message: err });
    }
    Ok(())
}

// ── Update printer ──────────────────────────────────────────────────

struct Printer {
    format: OutputFormat,
    color: bool,
    quiet: bool,
    courts_seen: HashMap<String, DateTime<Utc>>,
    values_seen: HashMap<String, Value>,
}

impl Printer {
    /// Print a court entry if it changed since the last print.
    fn court(&mut self, court: &str, updated: DateTime<Utc>, payload: &Value) {
        if self.courts_seen.get(court) == Some(&updated) {
            return;
        }
        self.courts_seen.insert(court.to_owned(), updated);
        self.emit("court", court, updated, payload);
    }

    /// Print a component value if it differs from the last one printed.
    fn value(&mut self, component: &str, value: &Value) {
        if self.values_seen.get(component) == Some(value) {
            return;
        }
        self.values_seen.insert(component.to_owned(), value.clone());
        self.emit("value", component, Utc::now(), value);
    }

    fn emit(&self, kind: &str, name: &str, at: DateTime<Utc>, payload: &Value) {
        let line = match self.format {
            OutputFormat::Json | OutputFormat::JsonCompact => {
                output::render_json_compact(&serde_json::json!({
                    "kind": kind,
                    "name": name,
                    "at": at,
                    "data": payload,
                }))
            }
            _ => format!(
                "{} {} {}",
                output::dim(&at.format("%H:%M:%S").to_string(), self.color),
                output::label(name, self.color),
                output::render_json_compact(payload),
            ),
        };
        output::print_output(&line, self.quiet);
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn printer() -> Printer {
        Printer {
            format: OutputFormat::Plain,
            color: false,
            quiet: true,
            courts_seen: HashMap::new(),
            values_seen: HashMap::new(),
        }
    }

    #[test]
    fn unchanged_court_is_not_reprinted() {
        let mut p = printer();
        let at = Utc::now();
        p.court("Court 1", at, &json!({}));
        p.court("Court 1", at, &json!({}));
        assert_eq!(p.courts_seen.len(), 1);
        assert_eq!(p.courts_seen["Court 1"], at);
    }

    #[test]
    fn value_changes_are_tracked() {
        let mut p = printer();
        p.value("score", &json!(1));
        p.value("score", &json!(2));
        assert_eq!(p.values_seen["score"], json!(2));
    }
}

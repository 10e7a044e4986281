//! `value`: resolve one bound component against live data.

use std::time::Duration;

use serde_json::Value;

use courtlive_core::{CoreError, Engine};

use crate::cli::{GlobalOpts, ValueArgs};
use crate::error::CliError;
use crate::output;

use super::util::Context;

const POLL_STEP: Duration = Duration::from_millis(100);

pub async fn handle(ctx: &Context, args: ValueArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let engine = ctx.build_engine(Vec::new())?;
    engine.start().await?;

    let result = wait_for_value(&engine, &args).await;
    engine.shutdown().await;

    let value = result?;
    let out = output::render_single(&global.output, &value, render_scalar, render_scalar);
    output::print_output(&out, global.quiet);
    Ok(())
}

async fn wait_for_value(engine: &Engine, args: &ValueArgs) -> Result<Value, CliError> {
    let binding = engine
        .get_binding(&args.component)
        .ok_or_else(|| CliError::NotFound {
            resource_type: "binding".into(),
            identifier: args.component.clone(),
            list_command: "bindings list".into(),
        })?;
    let conn = engine
        .get_connection(&binding.connection_id)
        .ok_or(CoreError::ConnectionNotFound {
            id: binding.connection_id,
        })?;
    if !conn.is_active {
        return Err(CliError::Validation {
            field: "connection".into(),
            reason: format!(
                "'{}' is inactive; run: courtlive connections activate {}",
                conn.name, conn.id
            ),
        });
    }

    let deadline = tokio::time::Instant::now() + args.wait;
    loop {
        if let Some(value) = engine.get_value(&args.component) {
            return Ok(value);
        }
        if tokio::time::Instant::now() >= deadline {
            return Err(CliError::NoValue {
                component: args.component.clone(),
                waited: humantime::format_duration(args.wait).to_string(),
            });
        }
        tokio::time::sleep(POLL_STEP).await;
    }
}

/// Strings print bare; everything else as JSON.
fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => output::render_json_pretty(other),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::render_scalar;

    #[test]
    fn strings_are_unquoted() {
        assert_eq!(render_scalar(&json!("Player 1")), "Player 1");
        assert_eq!(render_scalar(&json!(3)), "3");
    }
}

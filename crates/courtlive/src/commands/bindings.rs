//! Binding command handlers.

use std::collections::HashMap;

use tabled::Tabled;

use courtlive_core::{BindingPatch, ComponentBinding, ConnectionId};

use crate::cli::{BindingsArgs, BindingsCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util::{self, Context};

#[derive(Tabled)]
struct BindingRow {
    #[tabled(rename = "Component")]
    component: String,
    #[tabled(rename = "Connection")]
    connection: String,
    #[tabled(rename = "Path")]
    path: String,
    #[tabled(rename = "Refresh")]
    refresh: String,
}

pub async fn handle(ctx: &Context, args: BindingsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let registry = ctx.load_registry().await?;

    match args.command {
        BindingsCommand::List => {
            let names: HashMap<ConnectionId, String> = registry
                .connections()
                .into_iter()
                .map(|c| (c.id, c.name))
                .collect();
            let bindings = registry.bindings();
            let out = output::render_list(
                &global.output,
                &bindings,
                |b: &ComponentBinding| BindingRow {
                    component: b.component_id.clone(),
                    connection: names
                        .get(&b.connection_id)
                        .cloned()
                        .unwrap_or_else(|| b.connection_id.to_string()),
                    path: b.data_path.clone(),
                    refresh: b
                        .update_interval_ms
                        .map_or_else(|| "-".into(), |ms| format!("{ms}ms")),
                },
                |b| b.component_id.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        BindingsCommand::Add {
            component,
            connection,
            path,
            interval_ms,
        } => {
            let id = util::resolve_connection(&registry.connections(), &connection)?;
            let mut binding = ComponentBinding::new(component, id, path);
            binding.update_interval_ms = interval_ms;
            if let Some(replaced) = registry.add_binding(binding)? {
                tracing::info!(
                    component = %replaced.component_id,
                    "replaced existing binding"
                );
            }
            ctx.save_registry(&registry).await?;
            Ok(())
        }

        BindingsCommand::Update {
            component,
            connection,
            path,
            interval_ms,
        } => {
            let connection_id = connection
                .map(|c| util::resolve_connection(&registry.connections(), &c))
                .transpose()?;
            registry.update_binding(
                &component,
                BindingPatch {
                    connection_id,
                    data_path: path,
                    update_interval_ms: interval_ms.map(Some),
                },
            )?;
            ctx.save_registry(&registry).await?;
            Ok(())
        }

        BindingsCommand::Remove { component } => {
            registry.remove_binding(&component)?;
            ctx.save_registry(&registry).await?;
            Ok(())
        }
    }
}

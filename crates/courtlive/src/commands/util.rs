//! Shared helpers for command handlers.

use std::path::PathBuf;
use std::sync::Arc;

use courtlive_api::LiveClient;
use courtlive_config::{Config, load_config_from, resolve_feed_key};
use courtlive_core::{
    Collaborators, Connection, ConnectionId, DisplayInstance, Engine, HttpBackend, JsonFileStore,
    Registry, SharedManualScore, StateStore, StaticDisplays,
};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Context ─────────────────────────────────────────────────────────

/// Loaded configuration plus the resolved file locations.
pub struct Context {
    pub config: Config,
    pub config_path: PathBuf,
    pub state_path: PathBuf,
}

impl Context {
    pub fn load(global: &GlobalOpts) -> Result<Self, CliError> {
        let config_path = global
            .config
            .clone()
            .unwrap_or_else(courtlive_config::config_path);
        let config = load_config_from(&config_path)?;
        let state_path = global
            .state_file
            .clone()
            .unwrap_or_else(|| config.state_file());
        Ok(Self {
            config,
            config_path,
            state_path,
        })
    }

    pub fn state_store(&self) -> JsonFileStore {
        JsonFileStore::new(&self.state_path)
    }

    /// Read saved connections and bindings without starting an engine.
    pub async fn load_registry(&self) -> Result<Registry, CliError> {
        let state = self.state_store().load().await?;
        Ok(Registry::from_persisted(state))
    }

    pub async fn save_registry(&self, registry: &Registry) -> Result<(), CliError> {
        self.state_store().save(&registry.to_persisted()).await?;
        Ok(())
    }

    /// Displays for a command: explicit `--court` flags win over the
    /// configured display list.
    pub fn displays(&self, courts: &[String]) -> Vec<DisplayInstance> {
        if courts.is_empty() {
            return self.config.display_instances();
        }
        courts
            .iter()
            .enumerate()
            .map(|(i, court)| DisplayInstance::new(format!("cli-{}", i + 1), Some(court.clone())))
            .collect()
    }

    /// Wire an engine over the HTTP backend and the given displays.
    pub fn build_engine(&self, displays: Vec<DisplayInstance>) -> Result<Engine, CliError> {
        let client = LiveClient::new(
            &self.config.transport(),
            self.config.feed_url()?,
            resolve_feed_key(&self.config.feed),
        )?;
        let backend =
            HttpBackend::new(client).with_recent_window(self.config.feed.recent_window_minutes);

        Ok(Engine::new(
            self.config.engine_config(),
            Collaborators {
                backend: Arc::new(backend),
                displays: Arc::new(StaticDisplays::new(displays)),
                manual: Arc::new(SharedManualScore::new()),
                state: Arc::new(self.state_store()),
            },
        ))
    }
}

// ── Lookup ──────────────────────────────────────────────────────────

/// Resolve a connection by ID or by exact name.
pub fn resolve_connection(
    connections: &[Connection],
    identifier: &str,
) -> Result<ConnectionId, CliError> {
    if let Ok(id) = identifier.parse::<ConnectionId>() {
        if connections.iter().any(|c| c.id == id) {
            return Ok(id);
        }
    }

    let matches: Vec<&Connection> = connections
        .iter()
        .filter(|c| c.name == identifier)
        .collect();
    match matches.as_slice() {
        [] => Err(CliError::NotFound {
            resource_type: "connection".into(),
            identifier: identifier.into(),
            list_command: "connections list".into(),
        }),
        [only] => Ok(only.id),
        many => Err(CliError::Ambiguous {
            name: identifier.into(),
            candidates: many
                .iter()
                .map(|c| c.id.to_string())
                .collect::<Vec<_>>()
                .join(", "),
        }),
    }
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::IsTerminal::is_terminal(&std::io::stdin()) {
        return Err(CliError::NonInteractiveRequiresYes {
            action: message.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// "3s ago"-style age of a timestamp.
pub fn format_age(at: Option<chrono::DateTime<chrono::Utc>>) -> String {
    let Some(at) = at else {
        return "-".into();
    };
    let age = (chrono::Utc::now() - at).to_std().unwrap_or_default();
    let secs = std::time::Duration::from_secs(age.as_secs());
    format!("{} ago", humantime::format_duration(secs))
}

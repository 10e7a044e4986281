//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use courtlive_config::ConfigError;
use courtlive_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Data sources ─────────────────────────────────────────────────
    #[error("Could not fetch match data: {message}")]
    #[diagnostic(
        code(courtlive::fetch_failed),
        help(
            "Check that the service is running and the endpoint is correct.\n\
             Try: courtlive connections test <connection>"
        )
    )]
    Fetch { message: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(courtlive::not_found),
        help("Run: courtlive {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("'{name}' matches more than one connection")]
    #[diagnostic(
        code(courtlive::ambiguous),
        help("Use the connection ID instead: {candidates}")
    )]
    Ambiguous { name: String, candidates: String },

    #[error("No value for component '{component}' after {waited}")]
    #[diagnostic(
        code(courtlive::no_value),
        help(
            "The binding's connection may be inactive or failing.\n\
             Try: courtlive connections get <connection>"
        )
    )]
    NoValue { component: String, waited: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(courtlive::validation))]
    Validation { field: String, reason: String },

    #[error("{message}")]
    #[diagnostic(code(courtlive::sync))]
    Sync { message: String },

    // ── Persistence ──────────────────────────────────────────────────
    #[error("Could not save or load state: {message}")]
    #[diagnostic(
        code(courtlive::persistence),
        help("Check the state file location with: courtlive config show")
    )]
    Persistence { message: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration file already exists at {path}")]
    #[diagnostic(
        code(courtlive::config_exists),
        help("Pass --force to overwrite it.")
    )]
    ConfigExists { path: String },

    #[error(transparent)]
    #[diagnostic(code(courtlive::config))]
    Config(#[from] ConfigError),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(courtlive::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Internal / IO ────────────────────────────────────────────────
    #[error("Internal error: {0}")]
    #[diagnostic(code(courtlive::internal))]
    Internal(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(courtlive::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Fetch { .. } => exit_code::CONNECTION,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::ConfigExists { .. } => exit_code::CONFLICT,
            Self::NoValue { .. } => exit_code::TIMEOUT,
            Self::Validation { .. }
            | Self::Ambiguous { .. }
            | Self::Config(ConfigError::Validation { .. })
            | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionNotFound { id } => CliError::NotFound {
                resource_type: "connection".into(),
                identifier: id.to_string(),
                list_command: "connections list".into(),
            },

            CoreError::BindingNotFound { component_id } => CliError::NotFound {
                resource_type: "binding".into(),
                identifier: component_id,
                list_command: "bindings list".into(),
            },

            CoreError::Validation { field, reason } => CliError::Validation { field, reason },

            CoreError::Fetch { message } => CliError::Fetch { message },

            CoreError::Persistence { message } => CliError::Persistence { message },

            err @ (CoreError::SyncAlreadyRunning | CoreError::SyncNotRunning) => {
                CliError::Sync {
                    message: err.to_string(),
                }
            }

            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}

impl From<courtlive_api::Error> for CliError {
    fn from(err: courtlive_api::Error) -> Self {
        CoreError::from(err).into()
    }
}

#[cfg(test)]
mod tests {
    use courtlive_core::ConnectionId;

    use super::*;

    #[test]
    fn core_errors_map_to_exit_codes() {
        let not_found: CliError = CoreError::ConnectionNotFound {
            id: ConnectionId::new(),
        }
        .into();
        assert_eq!(not_found.exit_code(), exit_code::NOT_FOUND);

        let fetch: CliError = CoreError::Fetch {
            message: "timeout".into(),
        }
        .into();
        assert_eq!(fetch.exit_code(), exit_code::CONNECTION);

        let invalid: CliError = CoreError::Validation {
            field: "name".into(),
            reason: "must not be empty".into(),
        }
        .into();
        assert_eq!(invalid.exit_code(), exit_code::USAGE);

        let sync: CliError = CoreError::SyncNotRunning.into();
        assert_eq!(sync.exit_code(), exit_code::GENERAL);
    }
}

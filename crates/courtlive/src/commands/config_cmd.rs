//! Config subcommand handlers.

use std::path::PathBuf;

use dialoguer::{Input, Select};

use courtlive_config::{self as config, Config};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

fn target_path(global: &GlobalOpts) -> PathBuf {
    global.config.clone().unwrap_or_else(config::config_path)
}

/// Copy of the config with secrets masked.
fn redacted(cfg: &Config) -> Config {
    let mut shown = cfg.clone();
    if shown.feed.api_key.is_some() {
        shown.feed.api_key = Some("****".into());
    }
    shown
}

/// Format config as TOML, masking sensitive fields.
fn format_config_redacted(cfg: &Config) -> Result<String, CliError> {
    toml::to_string_pretty(&redacted(cfg)).map_err(|e| CliError::Config(e.into()))
}

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// Offer to store the feed key in the system keyring or return it for
/// plaintext config.
///
/// Returns `Some(secret)` if the user chose plaintext, `None` if stored in keyring.
fn prompt_keyring_storage(secret: &str) -> Result<Option<String>, CliError> {
    let choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let selection = Select::new()
        .with_prompt("Where should the feed API key be stored?")
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    if selection == 0 {
        config::store_feed_key(secret)?;
        eprintln!("   ✓ API key stored in system keyring");
        Ok(None)
    } else {
        Ok(Some(secret.to_owned()))
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(&target_path(global).display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::load_config_from(&target_path(global))?;
            let out = match global.output {
                OutputFormat::Table | OutputFormat::Plain => format_config_redacted(&cfg)?,
                _ => output::render_single(
                    &global.output,
                    &redacted(&cfg),
                    |_| String::new(),
                    |_| String::new(),
                ),
            };
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Init { feed_url, force } => {
            let path = target_path(global);
            if path.exists() && !force {
                return Err(CliError::ConfigExists {
                    path: path.display().to_string(),
                });
            }

            let mut cfg = Config::default();
            if let Some(url) = feed_url {
                cfg.feed.url = Some(url);
            } else {
                eprintln!("✨ courtlive configuration");
                eprintln!("   Config path: {}\n", path.display());

                let url: String = Input::new()
                    .with_prompt("Court feed URL (blank to skip)")
                    .allow_empty(true)
                    .interact_text()
                    .map_err(prompt_err)?;
                if !url.trim().is_empty() {
                    cfg.feed.url = Some(url.trim().to_owned());
                    let key = rpassword::prompt_password("Feed API key (blank for none): ")
                        .map_err(prompt_err)?;
                    if !key.is_empty() {
                        cfg.feed.api_key = prompt_keyring_storage(&key)?;
                    }
                }
            }

            cfg.validate()?;
            config::save_config_to(&cfg, &path)?;
            if !global.quiet {
                eprintln!("Wrote {}", path.display());
            }
            Ok(())
        }

        ConfigCommand::SetKey => {
            let key = rpassword::prompt_password("Feed API key: ").map_err(prompt_err)?;
            if key.is_empty() {
                return Err(CliError::Validation {
                    field: "api_key".into(),
                    reason: "must not be empty".into(),
                });
            }
            config::store_feed_key(&key)?;
            if !global.quiet {
                eprintln!("✓ API key stored in system keyring");
            }
            Ok(())
        }
    }
}

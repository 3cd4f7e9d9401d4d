//! # CLI Command Implementations

use super::ConfigFormat;
use crate::api;
use crate::error::AppError;
use crate::lang::{self, Lang};
use crate::sandbox::OutboxEntry;
use crate::scenario::{self, Scenario, StepResult, Transcript};
use crate::settings;
use autograde_core::{AutogradeConfig, TierCatalog};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Maximum size of a message override file (1 MB).
const MAX_LANG_FILE_SIZE: u64 = 1024 * 1024;

// =============================================================================
// FILE HELPERS
// =============================================================================

/// Canonicalize a user-supplied input path and make sure it is a file.
fn validate_file_path(path: &Path) -> Result<PathBuf, AppError> {
    let canonical = path.canonicalize().map_err(|e| {
        AppError::Io(std::io::Error::new(
            e.kind(),
            format!("Invalid file path '{}': {}", path.display(), e),
        ))
    })?;

    if !canonical.is_file() {
        return Err(AppError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("Path '{}' is not a regular file", path.display()),
        )));
    }

    Ok(canonical)
}

/// English messages, with overrides from `path` applied on top.
pub fn load_lang(path: Option<&Path>) -> Result<Arc<Lang>, AppError> {
    let mut lang = Lang::english();
    let Some(path) = path else {
        return Ok(Arc::new(lang));
    };

    let path = validate_file_path(path)?;
    let size = std::fs::metadata(&path)?.len();
    if size > MAX_LANG_FILE_SIZE {
        return Err(AppError::Config(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            size, MAX_LANG_FILE_SIZE
        )));
    }

    let overrides: BTreeMap<String, String> =
        serde_json::from_str(&std::fs::read_to_string(&path)?)?;
    tracing::info!(count = overrides.len(), path = %path.display(), "message overrides loaded");
    for (key, message) in overrides {
        lang.set(key, message);
    }
    Ok(Arc::new(lang))
}

// =============================================================================
// SERVE
// =============================================================================

/// Start the HTTP event bridge.
pub async fn cmd_serve(
    config: AutogradeConfig,
    lang: Arc<Lang>,
    host: &str,
    port: u16,
    maintenance_interval: u64,
) -> Result<(), AppError> {
    let addr = format!("{}:{}", host, port);

    println!("Autograde Event Bridge Starting...");
    println!();
    println!("Configuration:");
    println!("  Address:      {}", addr);
    println!("  Chat:         /{}", config.commands.chat.join(", /"));
    println!("  Console:      {}", config.commands.console.join(", "));
    println!(
        "  Timer:        {} (default {}s, max {}s)",
        if config.timer.enabled { "on" } else { "off" },
        config.timer.default_seconds,
        config.timer.max_seconds
    );
    println!("  Maintenance:  every {}s", maintenance_interval);
    println!();
    println!("Endpoints:");
    println!("  GET  /health     - Health check");
    println!("  GET  /status     - Service counters");
    println!("  POST /actors     - Register an actor");
    println!("  POST /placement  - Piece placed");
    println!("  POST /damage     - Structure hit");
    println!("  POST /disconnect - Actor left");
    println!("  POST /command    - Chat or console command");
    println!("  POST /tick       - Advance clock");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    api::run_server(&addr, config, lang, maintenance_interval).await
}

// =============================================================================
// SIMULATE
// =============================================================================

/// Replay a scenario and print its transcript.
pub fn cmd_simulate(
    config: AutogradeConfig,
    lang: Arc<Lang>,
    file: &Path,
    json_mode: bool,
) -> Result<(), AppError> {
    let file = validate_file_path(file)?;
    let scenario = Scenario::load(&file)?;
    let transcript = scenario::run(&scenario, config, lang)?;

    if json_mode {
        println!(
            "{}",
            serde_json::to_string_pretty(&transcript).unwrap_or_default()
        );
        return Ok(());
    }

    print_transcript(&transcript);
    Ok(())
}

fn print_transcript(transcript: &Transcript) {
    println!("Transcript");
    println!("==========");
    for entry in &transcript.entries {
        for actor in &entry.expired {
            println!("[{:>5}] policy of {} expired", entry.at, actor.0);
        }
        let line = match &entry.result {
            StepResult::Placement(report) => format!(
                "placement #{} -> {:?}, tier {}",
                report.piece.0,
                report.outcome,
                report
                    .tier
                    .map_or_else(|| "removed".to_string(), |t| t.to_string())
            ),
            StepResult::Damage { recorded } => format!("damage, cooldown recorded: {}", recorded),
            StepResult::Disconnect { destroyed } => {
                format!("disconnect, policy destroyed: {}", destroyed)
            }
            StepResult::Reply { lines } if lines.is_empty() => "command, no reply".to_string(),
            StepResult::Reply { lines } => format!("command\n        {}", lines.join("\n        ")),
            StepResult::Tick => "tick".to_string(),
            StepResult::Save { pruned } => format!("maintenance, {} cooldowns pruned", pruned),
            StepResult::Hooks => "hooks updated".to_string(),
        };
        println!("[{:>5}] {}", entry.at, line);

        for sent in &entry.outbox {
            match sent {
                OutboxEntry::Chat { actor, message } => {
                    println!("        -> {}: {}", actor.0, message);
                }
                OutboxEntry::Effect { piece, tier, .. } => {
                    println!("        -> effect on #{} (tier {})", piece.0, tier);
                }
            }
        }
    }

    println!();
    println!("Pieces");
    println!("======");
    for piece in &transcript.pieces {
        println!(
            "#{:<4} {:<16} owner {:<20} tier {} skin {}",
            piece.id.0, piece.definition, piece.owner.0, piece.tier, piece.variant.0
        );
    }
}

// =============================================================================
// CONFIG
// =============================================================================

/// Print the effective configuration.
pub fn cmd_config(
    config: &AutogradeConfig,
    format: ConfigFormat,
    json_mode: bool,
) -> Result<(), AppError> {
    if json_mode || format == ConfigFormat::Json {
        println!("{}", serde_json::to_string_pretty(config)?);
    } else {
        print!("{}", settings::render_toml(config)?);
    }
    Ok(())
}

// =============================================================================
// CATALOG
// =============================================================================

/// List every tier with its label and skins.
pub fn cmd_catalog(lang: &Lang, json_mode: bool) -> Result<(), AppError> {
    let catalog = TierCatalog::standard();

    if json_mode {
        let tiers: Vec<serde_json::Value> = catalog
            .tiers()
            .map(|(tier, entry)| {
                let variants: Vec<serde_json::Value> = entry
                    .variants
                    .iter()
                    .map(|v| {
                        serde_json::json!({
                            "id": v.id.0,
                            "key": v.key,
                            "name": lang.text(&lang::words_key(&v.key)),
                        })
                    })
                    .collect();
                serde_json::json!({
                    "tier": tier.value(),
                    "label": entry.label,
                    "variants": variants,
                })
            })
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({ "tiers": tiers }))
                .unwrap_or_default()
        );
        return Ok(());
    }

    println!("Autograde Tiers");
    println!("===============");
    for (tier, entry) in catalog.tiers() {
        println!("{}  {}", tier, entry.label);
        for (index, variant) in entry.variants.iter().enumerate() {
            println!(
                "     {}. {} ({})",
                index + 1,
                lang.text(&lang::words_key(&variant.key)),
                variant.key
            );
        }
    }
    Ok(())
}

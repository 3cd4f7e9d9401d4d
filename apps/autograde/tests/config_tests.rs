//! Configuration, message-file and scenario-file loading from disk.

#![allow(clippy::unwrap_used, clippy::panic)]

use autograde::cli::load_lang;
use autograde::error::AppError;
use autograde::lang::Lang;
use autograde::scenario::{self, Scenario, StepResult};
use autograde::settings::{load_config, parse_config, render_toml};
use autograde_core::{AutogradeConfig, BlockReason, Outcome, SkipReason, Tier};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::{NamedTempFile, TempDir};

fn write_temp(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

// =============================================================================
// CONFIG
// =============================================================================

#[test]
fn missing_file_yields_defaults() {
    let dir = TempDir::new().unwrap();

    let config = load_config(&dir.path().join("autograde.toml")).unwrap();

    assert_eq!(config, AutogradeConfig::default());
}

#[test]
fn partial_file_keeps_other_defaults() {
    let file = write_temp(
        r#"
[timer]
default_seconds = 45

[players]
destroy_on_disconnect = true
"#,
    );

    let config = load_config(file.path()).unwrap();

    assert_eq!(config.timer.default_seconds, 45);
    assert_eq!(config.timer.max_seconds, 180);
    assert!(config.timer.enabled);
    assert!(config.players.destroy_on_disconnect);
    assert_eq!(config.commands.chat, vec!["bgrade", "grade"]);
    assert_eq!(config.capabilities.prefix, "bgrade");
}

#[test]
fn malformed_file_is_an_error() {
    let file = write_temp("[timer\nenabled = true");

    let result = load_config(file.path());

    assert!(matches!(result, Err(AppError::Config(_))));
}

#[test]
fn default_above_max_is_rejected() {
    let result = parse_config("[timer]\ndefault_seconds = 200\nmax_seconds = 100\n");

    assert!(matches!(result, Err(AppError::Core(_))));
}

#[test]
fn rendered_config_parses_back() {
    let mut config = AutogradeConfig::default();
    config.damage_cooldown.cooldown_seconds = 90;
    config.commands.console = vec!["grade.next".to_string()];

    let rendered = render_toml(&config).unwrap();

    assert_eq!(parse_config(&rendered).unwrap(), config);
}

// =============================================================================
// MESSAGES
// =============================================================================

#[test]
fn message_overrides_are_layered_on_english() {
    let file = write_temp(r#"{ "Notice.Disabled": "Off." }"#);

    let lang = load_lang(Some(file.path())).unwrap();

    assert_eq!(lang.get("Notice.Disabled"), "Off.");
    assert_eq!(lang.len(), Lang::english().len());
}

#[test]
fn no_message_file_is_english() {
    let lang = load_lang(None).unwrap();

    assert_eq!(lang.get("Words.Brick"), "Brick");
}

#[test]
fn missing_message_file_is_an_error() {
    let dir = TempDir::new().unwrap();

    assert!(load_lang(Some(&dir.path().join("lang.json"))).is_err());
}

// =============================================================================
// SCENARIO FILES
// =============================================================================

fn bundled(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../scenarios")
        .join(name)
}

fn outcome(result: &StepResult) -> Outcome {
    match result {
        StepResult::Placement(report) => report.outcome,
        other => panic!("expected a placement, got {:?}", other),
    }
}

#[test]
fn bundled_raid_scenario_runs() {
    let scenario = Scenario::load(&bundled("raid.json")).unwrap();

    let transcript =
        scenario::run(&scenario, AutogradeConfig::default(), Arc::new(Lang::english())).unwrap();
    let entries = &transcript.entries;

    assert_eq!(entries.len(), scenario.steps.len());
    assert!(matches!(
        outcome(&entries[2].result),
        Outcome::Applied {
            tier: Tier::STONE,
            ..
        }
    ));
    assert_eq!(
        outcome(&entries[3].result),
        Outcome::Skipped(SkipReason::TierUnavailable)
    );
    assert_eq!(
        outcome(&entries[4].result),
        Outcome::Skipped(SkipReason::NotStructural)
    );
    assert_eq!(
        outcome(&entries[6].result),
        Outcome::Skipped(SkipReason::Suppressed)
    );
    assert_eq!(
        outcome(&entries[8].result),
        Outcome::Blocked(BlockReason::InsufficientResources)
    );
    assert!(outcome(&entries[11].result).is_applied());
    assert!(matches!(
        &entries[11].result,
        StepResult::Placement(report) if report.cost_waived
    ));
    assert_eq!(
        outcome(&entries[13].result),
        Outcome::Skipped(SkipReason::NoBuildRights)
    );
    assert!(matches!(
        outcome(&entries[15].result),
        Outcome::Blocked(BlockReason::HookOverride { code: 1, .. })
    ));
    assert_eq!(entries[17].expired.len(), 3);
}

#[test]
fn scenario_with_unknown_piece_fails() {
    let file = write_temp(
        r#"{ "steps": [ { "at": 0, "action": "place", "actor": 1, "piece": "castle", "position": [0, 0, 0] } ] }"#,
    );
    let scenario = Scenario::load(file.path()).unwrap();

    let result = scenario::run(&scenario, AutogradeConfig::default(), Arc::new(Lang::english()));

    assert!(matches!(result, Err(AppError::Unknown { kind: "piece", .. })));
}

//! # Configuration
//!
//! Operator-tunable settings. Every section and field has a default, so a
//! partial (or empty) TOML document deserializes to a complete config.
//!
//! ```toml
//! [timer]
//! enabled = true
//! default_seconds = 30
//! max_seconds = 180
//!
//! [damage_cooldown]
//! enabled = true
//! cooldown_seconds = 30
//! ```

use crate::AutogradeError;
use crate::primitives::{
    DEFAULT_CAPABILITY_PREFIX, DEFAULT_COOLDOWN_SECONDS, DEFAULT_MAX_TIMER_SECONDS,
    DEFAULT_TIMER_SECONDS,
};
use serde::{Deserialize, Serialize};

/// Timed auto-disable of armed policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerSettings {
    pub enabled: bool,
    /// Used when an actor never set their own timeout.
    pub default_seconds: u32,
    /// Largest timeout the timer command accepts.
    pub max_seconds: u32,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            default_seconds: DEFAULT_TIMER_SECONDS,
            max_seconds: DEFAULT_MAX_TIMER_SECONDS,
        }
    }
}

/// Cosmetic behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorSettings {
    pub play_upgrade_animation: bool,
}

impl Default for BehaviorSettings {
    fn default() -> Self {
        Self {
            play_upgrade_animation: true,
        }
    }
}

/// Command aliases registered by the command layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandSettings {
    pub chat: Vec<String>,
    pub console: Vec<String>,
}

impl Default for CommandSettings {
    fn default() -> Self {
        Self {
            chat: vec!["bgrade".to_string(), "grade".to_string()],
            console: vec!["bgrade.up".to_string()],
        }
    }
}

/// Suppression of upgrades after explosive damage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CooldownSettings {
    pub enabled: bool,
    pub cooldown_seconds: u32,
}

impl Default for CooldownSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            cooldown_seconds: DEFAULT_COOLDOWN_SECONDS,
        }
    }
}

/// Refund behavior when a hook overrides the upgrade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefundSettings {
    pub on_block: bool,
}

impl Default for RefundSettings {
    fn default() -> Self {
        Self { on_block: true }
    }
}

/// Per-player state lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PlayerSettings {
    /// Drop an actor's policy when they disconnect (high population servers).
    pub destroy_on_disconnect: bool,
}

/// Capability namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapabilitySettings {
    pub prefix: String,
}

impl Default for CapabilitySettings {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_CAPABILITY_PREFIX.to_string(),
        }
    }
}

/// Complete configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AutogradeConfig {
    pub timer: TimerSettings,
    pub behavior: BehaviorSettings,
    pub commands: CommandSettings,
    pub damage_cooldown: CooldownSettings,
    pub refund: RefundSettings,
    pub players: PlayerSettings,
    pub capabilities: CapabilitySettings,
}

impl AutogradeConfig {
    /// Reject settings the service cannot honour.
    pub fn validate(&self) -> Result<(), AutogradeError> {
        if self.timer.default_seconds > self.timer.max_seconds {
            return Err(AutogradeError::InvalidConfig(format!(
                "timer.default_seconds ({}) exceeds timer.max_seconds ({})",
                self.timer.default_seconds, self.timer.max_seconds
            )));
        }
        if self.capabilities.prefix.trim().is_empty() {
            return Err(AutogradeError::InvalidConfig(
                "capabilities.prefix must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(AutogradeConfig::default().validate().is_ok());
    }

    #[test]
    fn default_above_max_rejected() {
        let mut config = AutogradeConfig::default();
        config.timer.default_seconds = 500;
        assert!(matches!(
            config.validate(),
            Err(AutogradeError::InvalidConfig(_))
        ));
    }

    #[test]
    fn empty_prefix_rejected() {
        let mut config = AutogradeConfig::default();
        config.capabilities.prefix = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_document_fills_defaults() {
        let config: AutogradeConfig =
            serde_json::from_str(r#"{"timer":{"max_seconds":60}}"#).expect("parse");
        assert_eq!(config.timer.max_seconds, 60);
        assert_eq!(config.timer.default_seconds, 30);
        assert!(config.refund.on_block);
        assert_eq!(config.commands.chat, vec!["bgrade", "grade"]);
    }
}

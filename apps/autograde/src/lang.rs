//! # Localization
//!
//! English message table keyed by label. Messages use `{0}`, `{1}`, ...
//! positional placeholders; any key can be overridden at startup.

use std::collections::BTreeMap;
use std::fmt::Display;

pub const PERMISSION: &str = "Permission";
pub const ERROR_INVALID_ARGS: &str = "Error.InvalidArgs";
pub const ERROR_RESOURCES: &str = "Error.Resources";
pub const ERROR_INVALID_TIME: &str = "Error.InvalidTime";
pub const ERROR_TIMER_TOO_LONG: &str = "Error.TimerTooLong";
pub const NOTICE_SET_GRADE_WITH_SKIN: &str = "Notice.SetGradeWithSkin";
pub const NOTICE_SET_TIME: &str = "Notice.SetTime";
pub const NOTICE_DISABLED: &str = "Notice.Disabled";
pub const NOTICE_DISABLED_AUTO: &str = "Notice.Disabled.Auto";
pub const NOTICE_TIME: &str = "Notice.Time";
pub const COMMAND_HELP: &str = "Command.Help";
pub const COMMAND_HELP_SKIN: &str = "Command.Help.Skin";
pub const COMMAND_HELP_SKIN_AVAILABILITY: &str = "Command.Help.SkinAvailability";
pub const COMMAND_HELP_TIMER: &str = "Command.Help.T";
pub const COMMAND_SETTINGS: &str = "Command.Settings";
pub const COMMAND_SETTINGS_TIMER: &str = "Command.Settings.Timer";
pub const COMMAND_SETTINGS_GRADE: &str = "Command.Settings.Grade";
pub const WORDS_DISABLED: &str = "Words.Disabled";

/// Help line key for a tier (`0` = disable).
pub fn help_tier_key(tier: u8) -> String {
    format!("{COMMAND_HELP}.{tier}")
}

/// Display-name key for a variant catalog key.
pub fn words_key(variant_key: &str) -> String {
    format!("Words.{variant_key}")
}

const ENGLISH: &[(&str, &str)] = &[
    (PERMISSION, "You don't have permission to use that command"),
    (ERROR_INVALID_ARGS, "Invalid arguments, please use /{0} help"),
    (ERROR_RESOURCES, "You don't have enough resources to upgrade."),
    (
        ERROR_INVALID_TIME,
        "Please enter a valid time. '<color=orange>{0}</color>' is not recognised as a number.",
    ),
    (
        ERROR_TIMER_TOO_LONG,
        "Please enter a time that is below the value of <color=orange>{0}</color>.",
    ),
    (
        NOTICE_SET_GRADE_WITH_SKIN,
        "Automatic upgrading is now set to grade <color=orange>{0}</color>, with skin <color=green>{1}</color>.",
    ),
    (NOTICE_SET_TIME, "The disable timer is now set to <color=orange>{0}</color>."),
    (NOTICE_DISABLED, "Automatic upgrading is now disabled."),
    (NOTICE_DISABLED_AUTO, "Automatic upgrading has been automatically disabled."),
    (NOTICE_TIME, "It'll automatically disable in <color=orange>{0}</color> seconds."),
    (COMMAND_HELP, "<color=orange><size=16>BGrade Command Usages</size></color>"),
    ("Command.Help.0", "/{0} 0 - Disables BGrade"),
    ("Command.Help.1", "/{0} 1 - Upgrades to Wood upon placement"),
    ("Command.Help.2", "/{0} 2 - Upgrades to Stone upon placement"),
    ("Command.Help.3", "/{0} 3 - Upgrades to Metal upon placement"),
    ("Command.Help.4", "/{0} 4 - Upgrades to Armoured upon placement"),
    (COMMAND_HELP_SKIN, "/{0} <grade> <skin> - Upgrades to a grade with a skin"),
    (
        COMMAND_HELP_SKIN_AVAILABILITY,
        "Skins available: Wood 0 - {0}, Stone 0 - {1}, Metal 0 - {2}",
    ),
    (COMMAND_HELP_TIMER, "/{0} t <seconds> - Time until BGrade is disabled"),
    (COMMAND_SETTINGS, "<color=orange><size=16>Your current settings</size></color>"),
    (COMMAND_SETTINGS_TIMER, "Timer: <color=orange>{0}</color> seconds"),
    (COMMAND_SETTINGS_GRADE, "Grade: <color=orange>{0}</color>"),
    (WORDS_DISABLED, "disabled"),
    ("Words.Default", "Default"),
    ("Words.Adobe", "Adobe"),
    ("Words.Brick", "Brick"),
    ("Words.Brutalist", "Brutalist"),
    ("Words.LegacyWood", "Legacy Wood"),
    ("Words.ShippingContainer", "Shipping Container"),
];

/// Message table.
#[derive(Debug, Clone)]
pub struct Lang {
    messages: BTreeMap<String, String>,
}

impl Default for Lang {
    fn default() -> Self {
        Self::english()
    }
}

impl Lang {
    /// The built-in English table.
    #[must_use]
    pub fn english() -> Self {
        Self {
            messages: ENGLISH
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        }
    }

    /// Replace (or add) a message.
    pub fn set(&mut self, key: impl Into<String>, message: impl Into<String>) {
        self.messages.insert(key.into(), message.into());
    }

    /// Raw template. Unknown keys render as the key itself.
    #[must_use]
    pub fn get<'a>(&'a self, key: &'a str) -> &'a str {
        self.messages.get(key).map_or(key, String::as_str)
    }

    /// Render a template with positional arguments.
    #[must_use]
    pub fn format(&self, key: &str, args: &[&dyn Display]) -> String {
        let mut out = self.get(key).to_string();
        for (index, arg) in args.iter().enumerate() {
            out = out.replace(&format!("{{{index}}}"), &arg.to_string());
        }
        out
    }

    /// Render a template without arguments.
    #[must_use]
    pub fn text(&self, key: &str) -> String {
        self.get(key).to_string()
    }

    /// Number of known keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check if the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

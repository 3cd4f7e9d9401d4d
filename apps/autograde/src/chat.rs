//! # Chat and Console Commands
//!
//! Parses player commands, runs them against the service and renders the
//! localized reply.
//!
//! ## Chat grammar
//!
//! ```text
//! /<alias> 0                 disable
//! /<alias> 1..4 [variant]    set tier, optional 1-based variant index
//! /<alias> t <seconds>       set the auto-disable timeout
//! /<alias> help              usage and current settings
//! ```
//!
//! The console alias steps to the next permitted tier.

use crate::lang::{self, Lang};
use autograde_core::{
    ActorId, AutogradeService, CapabilityAuthority, CommandError, Tier, TierChange, Timestamp,
};

/// A parsed chat command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    Disable,
    SetTier { tier: Tier, variant: Option<String> },
    /// Raw seconds argument, if one was given.
    Timer(Option<String>),
    Help,
}

/// Parse chat arguments. `None` means the arguments are not understood.
pub fn parse(args: &[&str]) -> Option<ChatCommand> {
    let (first, rest) = args.split_first()?;
    match first.to_lowercase().as_str() {
        "0" => Some(ChatCommand::Disable),
        "1" | "2" | "3" | "4" => {
            let tier = first.parse::<u8>().ok().and_then(|v| Tier::new(v).ok())?;
            Some(ChatCommand::SetTier {
                tier,
                variant: rest.first().map(|v| (*v).to_string()),
            })
        }
        "t" => Some(ChatCommand::Timer(rest.first().map(|v| (*v).to_string()))),
        "help" => Some(ChatCommand::Help),
        _ => None,
    }
}

/// Command front-end bound to a message table.
#[derive(Debug, Clone)]
pub struct CommandLayer<'a> {
    lang: &'a Lang,
}

impl<'a> CommandLayer<'a> {
    #[must_use]
    pub fn new(lang: &'a Lang) -> Self {
        Self { lang }
    }

    /// Run a chat command. Returns the reply lines (possibly none).
    pub fn chat<A>(
        &self,
        service: &mut AutogradeService,
        authority: &A,
        actor: ActorId,
        alias: &str,
        args: &[&str],
        now: Timestamp,
    ) -> Vec<String>
    where
        A: CapabilityAuthority + ?Sized,
    {
        if !service.gate().has_any_relevant_capability(authority, actor) {
            return vec![self.lang.text(lang::PERMISSION)];
        }

        let Some(command) = parse(args) else {
            return vec![self.invalid_args(alias)];
        };
        tracing::debug!(%actor, ?command, "chat command");

        let result = match command {
            ChatCommand::Disable => service
                .disable(authority, actor)
                .map(|()| vec![self.lang.text(lang::NOTICE_DISABLED)]),
            ChatCommand::SetTier { tier, variant } => {
                self.set_tier(service, authority, actor, tier, variant.as_deref(), now)
            }
            ChatCommand::Timer(raw) => self.set_timer(service, authority, actor, raw.as_deref()),
            ChatCommand::Help => self.help(service, authority, actor, alias),
        };

        result.unwrap_or_else(|e| self.render_error(&e, alias))
    }

    /// Run the console "up" command.
    pub fn console<A>(
        &self,
        service: &mut AutogradeService,
        authority: &A,
        actor: ActorId,
        now: Timestamp,
    ) -> Vec<String>
    where
        A: CapabilityAuthority + ?Sized,
    {
        match service.cycle_tier(authority, actor, now) {
            Ok(change) => self.render_tier_change(&change, service.config().timer.enabled),
            Err(e) => self.render_error(&e, ""),
        }
    }

    fn set_tier<A>(
        &self,
        service: &mut AutogradeService,
        authority: &A,
        actor: ActorId,
        tier: Tier,
        variant: Option<&str>,
        now: Timestamp,
    ) -> Result<Vec<String>, CommandError>
    where
        A: CapabilityAuthority + ?Sized,
    {
        let index = match variant {
            Some(raw) if service.gate().has_skins(authority, actor) => Some(
                raw.parse::<u32>()
                    .map_err(|_| CommandError::InvalidArguments)?,
            ),
            _ => None,
        };

        let change = service.set_tier(authority, actor, tier, index, now)?;
        Ok(self.render_tier_change(&change, service.config().timer.enabled))
    }

    fn set_timer<A>(
        &self,
        service: &mut AutogradeService,
        authority: &A,
        actor: ActorId,
        raw: Option<&str>,
    ) -> Result<Vec<String>, CommandError>
    where
        A: CapabilityAuthority + ?Sized,
    {
        if !service.config().timer.enabled {
            return Err(CommandError::TimersDisabled);
        }
        let raw = raw.ok_or(CommandError::InvalidArguments)?;
        let seconds = raw
            .parse::<i64>()
            .map_err(|_| CommandError::InvalidTime(raw.to_string()))?;
        let seconds = service
            .set_timeout(authority, actor, seconds)
            .map_err(|e| match e {
                CommandError::InvalidTime(_) => CommandError::InvalidTime(raw.to_string()),
                other => other,
            })?;
        Ok(vec![self.lang.format(lang::NOTICE_SET_TIME, &[&seconds])])
    }

    fn help<A>(
        &self,
        service: &AutogradeService,
        authority: &A,
        actor: ActorId,
        alias: &str,
    ) -> Result<Vec<String>, CommandError>
    where
        A: CapabilityAuthority + ?Sized,
    {
        let view = service.help_view(authority, actor)?;
        let mut lines = vec![self.lang.text(lang::COMMAND_HELP)];

        if view.timer_enabled {
            lines.push(self.lang.format(lang::COMMAND_HELP_TIMER, &[&alias]));
            lines.push(self.lang.format(&lang::help_tier_key(0), &[&alias]));
        }
        for tier in &view.tiers {
            lines.push(self.lang.format(&lang::help_tier_key(tier.value()), &[&alias]));
        }
        if let Some(counts) = &view.variant_counts {
            let count_of = |tier: Tier| {
                counts
                    .iter()
                    .find(|(t, _)| *t == tier)
                    .map_or(0, |(_, c)| *c)
            };
            lines.push(self.lang.format(lang::COMMAND_HELP_SKIN, &[&alias]));
            lines.push(self.lang.format(
                lang::COMMAND_HELP_SKIN_AVAILABILITY,
                &[
                    &count_of(Tier::WOOD),
                    &count_of(Tier::STONE),
                    &count_of(Tier::METAL),
                ],
            ));
        }

        if let Some(policy) = service.policy_view(actor) {
            lines.push(self.lang.text(lang::COMMAND_SETTINGS));
            if view.timer_enabled {
                lines.push(
                    self.lang
                        .format(lang::COMMAND_SETTINGS_TIMER, &[&policy.timeout_seconds]),
                );
            }
            let grade = if policy.tier.is_disabled() {
                self.lang.text(lang::WORDS_DISABLED)
            } else {
                policy.tier.to_string()
            };
            lines.push(self.lang.format(lang::COMMAND_SETTINGS_GRADE, &[&grade]));
        }

        Ok(lines)
    }

    fn render_tier_change(&self, change: &TierChange, timer_enabled: bool) -> Vec<String> {
        if change.tier.is_disabled() {
            return vec![self.lang.text(lang::NOTICE_DISABLED)];
        }
        let skin = self.lang.text(&lang::words_key(&change.variant_label));
        let mut lines = vec![
            self.lang
                .format(lang::NOTICE_SET_GRADE_WITH_SKIN, &[&change.tier, &skin]),
        ];
        if timer_enabled && change.timeout_seconds > 0 {
            lines.push(
                self.lang
                    .format(lang::NOTICE_TIME, &[&change.timeout_seconds]),
            );
        }
        lines
    }

    fn invalid_args(&self, alias: &str) -> String {
        self.lang.format(lang::ERROR_INVALID_ARGS, &[&alias])
    }

    fn render_error(&self, error: &CommandError, alias: &str) -> Vec<String> {
        match error {
            CommandError::NoPermission => vec![self.lang.text(lang::PERMISSION)],
            CommandError::InvalidArguments => vec![self.invalid_args(alias)],
            CommandError::InvalidTime(raw) => {
                vec![self.lang.format(lang::ERROR_INVALID_TIME, &[raw])]
            }
            CommandError::TimerTooLong { max } => {
                vec![self.lang.format(lang::ERROR_TIMER_TOO_LONG, &[max])]
            }
            CommandError::TimersDisabled => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_grammar() {
        assert_eq!(parse(&["0"]), Some(ChatCommand::Disable));
        assert_eq!(
            parse(&["2", "3"]),
            Some(ChatCommand::SetTier {
                tier: Tier::STONE,
                variant: Some("3".to_string()),
            })
        );
        assert_eq!(
            parse(&["T", "60"]),
            Some(ChatCommand::Timer(Some("60".to_string())))
        );
        assert_eq!(parse(&["t"]), Some(ChatCommand::Timer(None)));
        assert_eq!(parse(&["HELP"]), Some(ChatCommand::Help));
    }

    #[test]
    fn rejects_unknown_and_incomplete() {
        assert_eq!(parse(&[]), None);
        assert_eq!(parse(&["5"]), None);
        assert_eq!(parse(&["up"]), None);
    }
}

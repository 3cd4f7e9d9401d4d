//! # Innate Primitives
//!
//! Fixed constants of the auto-upgrade core.
//!
//! These values are compiled into the binary. Anything an operator may tune
//! lives in [`crate::config`] instead.

/// Highest material tier a piece can be promoted to.
///
/// - `0` disables the policy
/// - `1` wood, `2` stone, `3` metal, `4` top tier
pub const MAX_TIER: u8 = 4;

/// Grid size, in millimetres, used to quantize structure positions.
///
/// Two placements whose coordinates round to the same grid cell share a
/// cooldown entry. Hosts report positions in integer millimetres.
pub const LOCATION_GRID_MM: i64 = 10;

/// Default seconds before an armed policy disables itself.
pub const DEFAULT_TIMER_SECONDS: u32 = 30;

/// Default upper bound accepted by the timer command.
pub const DEFAULT_MAX_TIMER_SECONDS: u32 = 180;

/// Default suppression window after explosive damage.
pub const DEFAULT_COOLDOWN_SECONDS: u32 = 30;

/// Default capability namespace (`<prefix>.<suffix>`).
pub const DEFAULT_CAPABILITY_PREFIX: &str = "bgrade";

// =============================================================================
// CAPABILITY SUFFIXES
// =============================================================================

/// Wildcard capability: every tier.
pub const CAPABILITY_ALL: &str = "all";

/// Upgrades without paying resources.
pub const CAPABILITY_NO_COST: &str = "nores";

/// Cosmetic variant selection.
pub const CAPABILITY_SKINS: &str = "skins";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_consistent() {
        assert!(DEFAULT_TIMER_SECONDS <= DEFAULT_MAX_TIMER_SECONDS);
        assert_eq!(MAX_TIER, 4);
    }
}

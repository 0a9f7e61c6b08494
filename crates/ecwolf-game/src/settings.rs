// settings.rs — game cvars and the snapshot a world runs with

use ecwolf_common::cvar::{CvarContext, CVAR_ARCHIVE, CVAR_LATCH, CVAR_NOSET};
use ecwolf_common::fixed::{float_to_fixed, Fixed, FRACUNIT};

use crate::classdef::MAX_SKILLS;

#[derive(Clone, Debug, PartialEq)]
pub struct GameSettings {
    /// Spawn filter index, selects per-skill spawn health.
    pub skill: usize,
    pub fast_monsters: bool,
    /// Default extreme-death threshold as a multiple of default health.
    pub gib_factor: Fixed,
    pub secret_death_sounds: bool,
    pub rng_seed: u64,
    pub developer: bool,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            skill: 2,
            fast_monsters: false,
            gib_factor: 2 * FRACUNIT,
            secret_death_sounds: false,
            rng_seed: 0,
            developer: false,
        }
    }
}

/// Register the cvars the actor engine reads. Existing values are kept.
pub fn register_game_cvars(cvars: &mut CvarContext) {
    cvars.get("skill", "2", CVAR_ARCHIVE | CVAR_LATCH);
    cvars.get("g_fastmonsters", "0", CVAR_LATCH);
    cvars.get("g_gibfactor", "2", CVAR_LATCH);
    cvars.get("g_secretdeathsounds", "0", 0);
    cvars.get("g_rngseed", "0", CVAR_NOSET);
    cvars.get("developer", "0", 0);
}

impl GameSettings {
    pub fn from_cvars(cvars: &CvarContext) -> Self {
        let skill = cvars.variable_value("skill").max(0.0) as usize;
        Self {
            skill: skill.min(MAX_SKILLS - 1),
            fast_monsters: cvars.variable_value("g_fastmonsters") != 0.0,
            gib_factor: float_to_fixed(cvars.variable_value("g_gibfactor") as f64),
            secret_death_sounds: cvars.variable_value("g_secretdeathsounds") != 0.0,
            rng_seed: cvars.variable_string("g_rngseed").trim().parse().unwrap_or(0),
            developer: cvars.variable_value("developer") != 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_registered_cvars() {
        let mut cvars = CvarContext::new();
        register_game_cvars(&mut cvars);
        assert_eq!(GameSettings::from_cvars(&cvars), GameSettings::default());
    }

    #[test]
    fn test_from_cvars_reads_overrides() {
        let mut cvars = CvarContext::new();
        register_game_cvars(&mut cvars);
        cvars.set("skill", "20");
        cvars.set("g_fastmonsters", "1");
        cvars.set("g_gibfactor", "0.5");
        cvars.force_set("g_rngseed", "12345678901");
        let s = GameSettings::from_cvars(&cvars);
        assert_eq!(s.skill, MAX_SKILLS - 1);
        assert!(s.fast_monsters);
        assert_eq!(s.gib_factor, FRACUNIT / 2);
        assert_eq!(s.rng_seed, 12_345_678_901);
    }

    #[test]
    fn test_register_keeps_existing_values() {
        let mut cvars = CvarContext::new();
        cvars.get("skill", "4", 0);
        register_game_cvars(&mut cvars);
        assert_eq!(cvars.variable_value("skill"), 4.0);
    }
}

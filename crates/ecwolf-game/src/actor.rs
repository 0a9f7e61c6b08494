// actor.rs — the simulated entity
//
// Actors live in the world's arena and refer to each other only through
// `ActorId`. A stale id (the actor was destroyed) simply fails to resolve.

use bitflags::bitflags;

use ecwolf_common::fixed::{tile_of, Angle, Fixed, FRACUNIT};

use crate::classdef::{ClassId, ClassTable, MAX_SKILLS};
use crate::frame::FrameId;
use crate::settings::GameSettings;

/// Generational handle into the actor arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId {
    pub index: u32,
    pub generation: u32,
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ActorFlags: u32 {
        const SHOOTABLE         = 0x0000_0001;
        const BONUS             = 0x0000_0002;
        const AMBUSH            = 0x0000_0004;
        const ATTACKMODE        = 0x0000_0008;
        const FIRSTATTACK       = 0x0000_0010;
        const SOLID             = 0x0000_0020;
        const DROPBASEDONTARGET = 0x0000_0040;
        const COUNTITEM         = 0x0000_0080;
        const COUNTKILL         = 0x0000_0100;
        const COUNTSECRET       = 0x0000_0200;
        const ISMONSTER         = 0x0000_0400;
        const MISSILE           = 0x0000_0800;
        const ALWAYSFAST        = 0x0000_1000;
        const RANDOMIZE         = 0x0000_2000;
        const PATHING           = 0x0000_4000;
        const OLDRANDOMCHASE    = 0x0000_8000;
    }
}

bitflags! {
    /// Engine bookkeeping, not gameplay flags.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ObjectFlags: u8 {
        /// Spawned this tic; its first frame action has not run.
        const JUST_SPAWNED = 0x01;
        /// Marked for destruction by a begin-play hook.
        const EUTHANIZE_ME = 0x02;
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DirType {
    East = 0,
    NorthEast,
    North,
    NorthWest,
    West,
    SouthWest,
    South,
    SouthEast,
    #[default]
    NoDir,
}

impl DirType {
    pub fn from_u8(v: u8) -> DirType {
        match v {
            0 => DirType::East,
            1 => DirType::NorthEast,
            2 => DirType::North,
            3 => DirType::NorthWest,
            4 => DirType::West,
            5 => DirType::SouthWest,
            6 => DirType::South,
            7 => DirType::SouthEast,
            _ => DirType::NoDir,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActorSounds {
    pub active: String,
    pub attack: String,
    pub death: String,
    pub see: String,
    pub pain: String,
    pub pickup: String,
}

/// Inventory-only state. Ignored for actors that are not inventory items.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InventoryData {
    /// Actor whose chain holds this item.
    pub owner: Option<ActorId>,
    pub amount: i32,
    pub max_amount: i32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Actor {
    pub class: ClassId,
    pub spawnid: u32,
    pub flags: ActorFlags,
    pub object_flags: ObjectFlags,

    pub distance: Fixed,
    pub dir: DirType,
    pub trydir: DirType,

    pub x: Fixed,
    pub y: Fixed,
    pub z: Fixed,
    pub velx: Fixed,
    pub vely: Fixed,
    pub angle: Angle,
    pub pitch: Angle,

    pub health: i32,
    pub speed: Fixed,
    pub runspeed: Fixed,
    pub points: i32,
    pub radius: Fixed,
    pub painchance: i32,
    pub projectile_pass_height: Fixed,
    pub damage_factor: Fixed,

    pub state: Option<FrameId>,
    pub sprite: u32,
    pub ticcount: i32,
    pub overhead_icon: u32,
    pub temp1: i32,
    pub hidden: bool,
    pub single_spawn: bool,

    pub sounds: ActorSounds,

    pub killer_damage_type: Option<ClassId>,
    pub faction: Option<ClassId>,
    pub target: Option<ActorId>,
    pub missile_parent: Option<ActorId>,
    /// Head of our inventory chain, or for an item the next one in its owner's chain.
    pub inventory: Option<ActorId>,
    pub inv: InventoryData,

    pub player: Option<usize>,
    pub zone: Option<u16>,
    /// Map thing this actor was placed from, for hub kill tracking.
    pub spawn_thing: Option<u32>,
    /// (filter id, last applied offset) for wave position filters.
    pub filterpos_wave_last_moves: Vec<(i32, Fixed)>,
}

impl Default for Actor {
    fn default() -> Self {
        Self {
            class: ClassId::default(),
            spawnid: 0,
            flags: ActorFlags::empty(),
            object_flags: ObjectFlags::empty(),
            distance: 0,
            dir: DirType::NoDir,
            trydir: DirType::NoDir,
            x: 0,
            y: 0,
            z: 0,
            velx: 0,
            vely: 0,
            angle: 0,
            pitch: 0,
            health: 1000,
            speed: 0,
            runspeed: 0,
            points: 0,
            radius: 0x5800,
            painchance: 0,
            projectile_pass_height: 0,
            damage_factor: FRACUNIT,
            state: None,
            sprite: 0,
            ticcount: 0,
            overhead_icon: 0,
            temp1: 0,
            hidden: false,
            single_spawn: false,
            sounds: ActorSounds::default(),
            killer_damage_type: None,
            faction: None,
            target: None,
            missile_parent: None,
            inventory: None,
            inv: InventoryData::default(),
            player: None,
            zone: None,
            spawn_thing: None,
            filterpos_wave_last_moves: Vec::new(),
        }
    }
}

impl Actor {
    #[inline]
    pub fn tile_x(&self) -> u16 {
        tile_of(self.x)
    }

    #[inline]
    pub fn tile_y(&self) -> u16 {
        tile_of(self.y)
    }

    pub fn is_just_spawned(&self) -> bool {
        self.object_flags.contains(ObjectFlags::JUST_SPAWNED)
    }

    /// Approximates "is the animation starting at `base` still running" by
    /// walking forward from `base` while frames are laid out contiguously.
    pub fn in_state_sequence(&self, classes: &ClassTable, base: Option<FrameId>) -> bool {
        let Some(mut base) = base else {
            return false;
        };
        loop {
            if self.state == Some(base) {
                return true;
            }
            if classes.frame(base).next != Some(base.following()) {
                return false;
            }
            base = base.following();
        }
    }

    pub fn is_fast(&self, settings: &GameSettings) -> bool {
        self.flags.contains(ActorFlags::ALWAYSFAST) || settings.fast_monsters
    }

    /// Health for the current skill, falling back to the default health.
    pub fn spawn_health(&self, classes: &ClassTable, skill: usize) -> i32 {
        classes.get(self.class).meta.skill_health[skill.min(MAX_SKILLS - 1)].unwrap_or(self.health)
    }

    /// Evaluate the class damage expression; 0 when the class has none.
    pub fn get_damage(&self, classes: &ClassTable) -> i32 {
        match &classes.get(self.class).meta.damage {
            Some(expr) => expr.eval_int(self),
            None => 0,
        }
    }

    pub fn info_message<'a>(&self, classes: &'a ClassTable) -> Option<&'a str> {
        classes.get(self.class).meta.info_message.as_deref()
    }

    /// Only moves into a zone when one is given.
    pub fn enter_zone(&mut self, zone: Option<u16>) {
        if zone.is_some() {
            self.zone = zone;
        }
    }

    /// Previous offset applied by wave filter `id`.
    pub fn wave_last_move(&self, id: i32) -> Fixed {
        self.filterpos_wave_last_moves
            .iter()
            .find(|(i, _)| *i == id)
            .map_or(0, |&(_, d)| d)
    }

    pub fn set_wave_last_move(&mut self, id: i32, delta: Fixed) {
        match self.filterpos_wave_last_moves.iter_mut().find(|(i, _)| *i == id) {
            Some(entry) => entry.1 = delta,
            None => self.filterpos_wave_last_moves.push((id, delta)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;
    use ecwolf_common::fixed::TILESHIFT;

    #[test]
    fn test_tile_accessors() {
        let actor = Actor {
            x: (3 << TILESHIFT) + 10,
            y: (9 << TILESHIFT) + 0x8000,
            ..Actor::default()
        };
        assert_eq!(actor.tile_x(), 3);
        assert_eq!(actor.tile_y(), 9);
    }

    #[test]
    fn test_dir_from_u8() {
        for d in 0..8u8 {
            assert_eq!(DirType::from_u8(d) as u8, d);
        }
        assert_eq!(DirType::from_u8(200), DirType::NoDir);
    }

    #[test]
    fn test_enter_zone_ignores_none() {
        let mut actor = Actor::default();
        actor.enter_zone(Some(4));
        actor.enter_zone(None);
        assert_eq!(actor.zone, Some(4));
    }

    #[test]
    fn test_wave_last_moves() {
        let mut actor = Actor::default();
        assert_eq!(actor.wave_last_move(2), 0);
        actor.set_wave_last_move(2, 77);
        actor.set_wave_last_move(0, 5);
        actor.set_wave_last_move(2, 80);
        assert_eq!(actor.wave_last_move(2), 80);
        assert_eq!(actor.filterpos_wave_last_moves.len(), 2);
    }

    #[test]
    fn test_in_state_sequence() {
        let classes = test_classes();
        let guard = classes.find("Guard").unwrap();
        let see = classes.find_state(guard, "See");
        let mut actor = classes.get(guard).default_actor.clone();

        actor.state = see.map(|f| f.following());
        assert!(actor.in_state_sequence(&classes, see));
        actor.state = classes.find_state(guard, "Spawn");
        assert!(!actor.in_state_sequence(&classes, see));
        assert!(!actor.in_state_sequence(&classes, None));
    }

    #[test]
    fn test_spawn_health_by_skill() {
        let classes = test_classes();
        let guard = classes.find("Guard").unwrap();
        let officer = classes.find("Officer").unwrap();
        let g = classes.get(guard).default_actor.clone();
        let o = classes.get(officer).default_actor.clone();
        assert_eq!(g.spawn_health(&classes, 0), 25);
        assert_eq!(o.spawn_health(&classes, 0), 50);
        assert_eq!(o.spawn_health(&classes, 3), 80);
        assert_eq!(o.spawn_health(&classes, 99), 120);
    }

    #[test]
    fn test_is_fast() {
        let mut settings = GameSettings::default();
        let mut actor = Actor::default();
        assert!(!actor.is_fast(&settings));
        settings.fast_monsters = true;
        assert!(actor.is_fast(&settings));
        settings.fast_monsters = false;
        actor.flags.insert(ActorFlags::ALWAYSFAST);
        assert!(actor.is_fast(&settings));
    }

    #[test]
    fn test_get_damage_reads_actor() {
        let classes = test_classes();
        let rocket = classes.get(classes.find("Rocket").unwrap()).default_actor.clone();
        assert_eq!(rocket.get_damage(&classes), 30);
        let guard = classes.get(classes.find("Guard").unwrap()).default_actor.clone();
        assert_eq!(guard.get_damage(&classes), 0);
    }
}

// filterpos.rs — per-tic position filters declared on a class
//
// Three kinds: wrap (teleport across a boundary), thrust (move against the
// player's input) and wave (periodic bob). Filters are keyed by id; a
// later declaration with the same id replaces the earlier one, and ids run
// from 0 upward until the first gap.

use std::collections::BTreeMap;
use std::sync::Arc;

use ecwolf_common::common::{com_error, ERR_FATAL};
use ecwolf_common::fixed::{
    fine_cosine, fine_sine, fixed_to_float, float_to_fixed, Fixed, FINEANGLES, TICRATE,
};

use crate::actor::{Actor, ActorId};
use crate::world::{Player, World};

#[derive(Clone, Debug, PartialEq)]
pub struct FilterposWrap {
    pub id: i32,
    pub axis: u32,
    pub x1: f64,
    pub x2: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThrustSource {
    Forward,
    Side,
    Rotation,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FilterposThrust {
    pub id: i32,
    pub axis: u32,
    pub source: ThrustSource,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FilterposWave {
    pub id: i32,
    pub axis: u32,
    /// Seconds per cycle.
    pub period: f64,
    pub amplitude: f64,
    pub use_sine: bool,
}

fn coord_mut(actor: &mut Actor, axis: u32) -> &mut Fixed {
    match axis {
        0 => &mut actor.x,
        1 => &mut actor.y,
        2 => &mut actor.z,
        _ => {
            com_error(ERR_FATAL, "Invalid axis!");
            unreachable!()
        }
    }
}

impl FilterposWrap {
    pub fn apply(&self, actor: &mut Actor) {
        let delta = self.x2 - self.x1;
        if self.axis >= 3 || delta <= 0.0 {
            com_error(ERR_FATAL, "FilterposWrap has invalid parameters!");
        }
        let coord = coord_mut(actor, self.axis);
        let mut val = fixed_to_float(*coord);
        if val < self.x1 {
            val += delta;
        }
        if val > self.x2 {
            val -= delta;
        }
        *coord = float_to_fixed(val);
    }
}

impl FilterposThrust {
    pub fn apply(&self, actor: &mut Actor, player: &Player) {
        let amount = match self.source {
            ThrustSource::Forward => player.forward_thrust,
            ThrustSource::Side => player.side_thrust,
            ThrustSource::Rotation => player.rot_thrust.wrapping_mul(-50),
        };
        let coord = coord_mut(actor, self.axis);
        *coord = coord.wrapping_sub(amount);
    }
}

impl FilterposWave {
    /// Cycle length on the tic clock.
    pub fn duration_tics(&self) -> u32 {
        (self.period * TICRATE as f64) as u32
    }

    /// Offset the wave has reached at `level_tics`.
    pub fn offset_at(&self, level_tics: u32) -> Fixed {
        let dur = self.duration_tics();
        if dur == 0 {
            com_error(ERR_FATAL, "Invalid duration!");
        }
        let current = (level_tics % dur) as u64;
        let fine = (current * FINEANGLES as u64 / dur as u64) as usize;
        let table = if self.use_sine { fine_sine(fine) } else { fine_cosine(fine) };
        float_to_fixed(self.amplitude * fixed_to_float(table))
    }

    /// Move by the change in offset since this wave last ran on the actor.
    pub fn apply(&self, actor: &mut Actor, level_tics: u32) {
        let delta = self.offset_at(level_tics);
        let old = actor.wave_last_move(self.id);
        let coord = coord_mut(actor, self.axis);
        *coord = coord.wrapping_add(delta.wrapping_sub(old));
        actor.set_wave_last_move(self.id, delta);
    }
}

enum Filter<'a> {
    Wrap(&'a FilterposWrap),
    Thrust(&'a FilterposThrust),
    Wave(&'a FilterposWave),
}

/// Run the actor's class filters in id order.
pub fn apply_filters(world: &mut World, id: ActorId) {
    let classes = Arc::clone(&world.classes);
    let Some(class) = world.actor(id).map(|a| a.class) else {
        return;
    };
    let meta = &classes.get(class).meta;
    if meta.filterpos_wraps.is_empty()
        && meta.filterpos_thrusts.is_empty()
        && meta.filterpos_waves.is_empty()
    {
        return;
    }

    let mut filters: BTreeMap<i32, Filter> = BTreeMap::new();
    for w in &meta.filterpos_wraps {
        filters.insert(w.id, Filter::Wrap(w));
    }
    for t in &meta.filterpos_thrusts {
        filters.insert(t.id, Filter::Thrust(t));
    }
    for w in &meta.filterpos_waves {
        filters.insert(w.id, Filter::Wave(w));
    }

    let player = world.players.first().cloned().unwrap_or_default();
    let level_tics = world.level_tics;
    let Some(actor) = world.actor_mut(id) else {
        return;
    };
    let mut fid = 0;
    while let Some(filter) = filters.get(&fid) {
        match filter {
            Filter::Wrap(w) => w.apply(actor),
            Filter::Thrust(t) => t.apply(actor, &player),
            Filter::Wave(w) => w.apply(actor, level_tics),
        }
        fid += 1;
    }
}

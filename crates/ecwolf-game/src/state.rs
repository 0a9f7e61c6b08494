// state.rs — the frame state machine
//
// set_state enters a frame, runs its action and then cascades through any
// zero-tic frames that follow. tick_actor is the per-tic countdown;
// run_tick walks the whole registry and then activates new spawns.

use std::sync::Arc;

use ecwolf_common::common::{com_error, ERR_FATAL};

use crate::actor::{ActorFlags, ActorId, ObjectFlags};
use crate::combat::t_projectile;
use crate::filterpos::apply_filters;
use crate::frame::FrameId;
use crate::spawn::{destroy, finish_spawning_actors};
use crate::world::{StateRun, World};

/// Zero-tic frames entered in one cascade before the chain is declared broken.
pub const MAX_STATE_CASCADE: usize = 1000;

/// Point the actor at `frame` and reload its tic count. Returns false if the
/// actor no longer exists.
fn enter_frame(world: &mut World, id: ActorId, frame: FrameId) -> bool {
    let classes = Arc::clone(&world.classes);
    let f = classes.frame(frame);
    let tics = f.get_tics(&mut world.rng.state_tics);
    match world.actor_mut(id) {
        Some(a) => {
            a.state = Some(frame);
            a.sprite = f.sprite;
            a.ticcount = tics;
            true
        }
        None => false,
    }
}

fn run_action(world: &mut World, id: ActorId, frame: FrameId) {
    let classes = Arc::clone(&world.classes);
    classes.frame(frame).action.invoke(world, id, id, frame);
}

/// Run `frame`'s action, then follow zero-tic frames until one has a
/// duration, the chain ends (destroying the actor) or the actor is gone.
/// State changes the actions make on this actor are followed here rather
/// than recursing, so every frame entered counts against the cap.
fn run_frames(world: &mut World, id: ActorId, frame: FrameId) {
    let classes = Arc::clone(&world.classes);
    world.state_runs.push(StateRun { actor: id, redirected: false });
    let mut frame = frame;
    let mut steps = 0usize;
    loop {
        run_action(world, id, frame);
        let redirected = world
            .state_runs
            .last_mut()
            .is_some_and(|run| std::mem::take(&mut run.redirected));

        let (ticcount, state) = match world.actor(id) {
            Some(a) => (a.ticcount, a.state),
            None => break,
        };
        let Some(current) = state else {
            destroy(world, id);
            break;
        };
        if !redirected && ticcount != 0 {
            break;
        }

        steps += 1;
        if steps > MAX_STATE_CASCADE {
            com_error(
                ERR_FATAL,
                &format!(
                    "{} is stuck in a loop of zero-tic frames",
                    world.class_name(world.actor(id).map(|a| a.class).unwrap_or_default())
                ),
            );
            break;
        }

        if redirected {
            frame = current;
            continue;
        }
        match classes.frame(current).next {
            None => {
                destroy(world, id);
                break;
            }
            Some(next) => {
                if !enter_frame(world, id, next) {
                    break;
                }
                frame = next;
            }
        }
    }
    world.state_runs.pop();
}

/// Move the actor to `frame`. `None` destroys it. Unless `suppress_run`,
/// the frame's action runs and zero-tic frames are followed.
pub fn set_state(world: &mut World, id: ActorId, frame: Option<FrameId>, suppress_run: bool) {
    let Some(frame) = frame else {
        destroy(world, id);
        return;
    };
    if !enter_frame(world, id, frame) {
        return;
    }
    if suppress_run {
        return;
    }
    if let Some(run) = world.state_runs.last_mut() {
        if run.actor == id {
            run.redirected = true;
            return;
        }
    }
    run_frames(world, id, frame);
}

/// Run the current frame's action and any zero-tic frames after it, keeping
/// the tic count already in place. Used when a spawned actor activates.
pub(crate) fn run_current_state(world: &mut World, id: ActorId) {
    let state = match world.actor(id) {
        Some(a) => a.state,
        None => return,
    };
    match state {
        Some(frame) => run_frames(world, id, frame),
        None => destroy(world, id),
    }
}

/// One tic for one actor.
pub fn tick_actor(world: &mut World, id: ActorId) {
    let classes = Arc::clone(&world.classes);

    let state = {
        let Some(actor) = world.actor_mut(id) else {
            return;
        };
        // Not ready yet; otherwise a one-tic frame would never be seen.
        if actor.object_flags.contains(ObjectFlags::JUST_SPAWNED) {
            actor.object_flags.remove(ObjectFlags::JUST_SPAWNED);
            return;
        }
        let Some(state) = actor.state else {
            destroy(world, id);
            return;
        };
        if actor.ticcount > 0 {
            actor.ticcount -= 1;
        }
        if actor.ticcount == 0 {
            Some(state)
        } else {
            None
        }
    };

    if let Some(expired) = state {
        set_state(world, id, classes.frame(expired).next, false);
        if !world.is_alive(id) {
            return;
        }
    }

    let Some(current) = world.actor(id).and_then(|a| a.state) else {
        return;
    };
    classes.frame(current).thinker.invoke(world, id, id, current);
    if !world.is_alive(id) {
        return;
    }

    let missile = world
        .actor(id)
        .is_some_and(|a| a.flags.contains(ActorFlags::MISSILE));
    if missile {
        t_projectile(world, id);
        if !world.is_alive(id) {
            return;
        }
    }

    apply_filters(world, id);
}

/// Tick every registered actor, then activate everything spawned this tic.
/// Actors may be destroyed while the walk is in progress.
pub fn run_tick(world: &mut World) {
    let mut cursor = world.begin_walk();
    while let Some(id) = cursor {
        world.set_walk_next(id);
        tick_actor(world, id);
        cursor = world.take_walk_next();
    }
    finish_spawning_actors(world);
    world.level_tics = world.level_tics.wrapping_add(1);
}

// ============================================================
// Activation
// ============================================================

pub fn activate(world: &mut World, id: ActorId, activator: Option<ActorId>) {
    let Some(class) = world.actor(id).map(|a| a.class) else {
        return;
    };
    if let Some(hook) = world.classes.get(class).hooks.activate {
        hook(world, id, activator);
    }
}

pub fn deactivate(world: &mut World, id: ActorId, activator: Option<ActorId>) {
    let Some(class) = world.actor(id).map(|a| a.class) else {
        return;
    };
    if let Some(hook) = world.classes.get(class).hooks.deactivate {
        hook(world, id, activator);
    }
}

fn jump_to_label(world: &mut World, id: ActorId, label: &str) {
    let Some(class) = world.actor(id).map(|a| a.class) else {
        return;
    };
    if let Some(frame) = world.classes.find_state(class, label) {
        set_state(world, id, Some(frame), false);
    }
}

/// Stock activate hook for decorations that toggle between states.
pub fn switchable_activate(world: &mut World, id: ActorId, _activator: Option<ActorId>) {
    jump_to_label(world, id, "Active");
}

/// Stock deactivate hook for decorations that toggle between states.
pub fn switchable_deactivate(world: &mut World, id: ActorId, _activator: Option<ActorId>) {
    jump_to_label(world, id, "Inactive");
}

// spawn.rs — actor creation, deferred activation and removal
//
// A spawned actor is fully built but waits in the pending queue until
// `finish_spawning_actors` runs at the end of the tic. Only then does it
// join the registry and run its first frame action, so callers can set up
// velocity, target and so on right after `spawn` returns.

use std::sync::Arc;

use bitflags::bitflags;

use ecwolf_common::common::{com_dprintf, com_printf};
use ecwolf_common::fixed::{tile_of, Angle, Fixed, TILEGLOBAL};

use crate::actor::{ActorFlags, ActorId, DirType, ObjectFlags};
use crate::classdef::ClassId;
use crate::game_import::MapSpot;
use crate::inventory::remove_inventory;
use crate::state::{run_current_state, set_state};
use crate::world::World;

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct SpawnFlags: u32 {
        /// Roll for the class's replacement.
        const ALLOW_REPLACEMENT = 0x01;
        /// Start on the patrol path instead of standing.
        const PATROL            = 0x02;
    }
}

fn class_instance_exists(world: &World, class: ClassId) -> bool {
    let is_class = |id: &ActorId| world.actor(*id).is_some_and(|a| a.class == class);
    world.registered().any(|id| is_class(&id)) || world.pending().iter().any(is_class)
}

/// Create an actor of `class` at (x, y, z). Fails for a missing class, a
/// single-spawn class that already has an instance, a class without a
/// Spawn state, or a begin-play hook that rejects the actor.
pub fn spawn(
    world: &mut World,
    class: Option<ClassId>,
    x: Fixed,
    y: Fixed,
    z: Fixed,
    flags: SpawnFlags,
) -> Option<ActorId> {
    let Some(mut cls) = class else {
        com_printf("Tried to spawn classless actor.\n");
        return None;
    };
    let classes = Arc::clone(&world.classes);

    if flags.contains(SpawnFlags::ALLOW_REPLACEMENT) {
        let prob = classes.get(cls).replacement_prob;
        if prob == 0 || world.rng.spawn_actor.gen_byte() < prob {
            cls = classes.get_replacement(cls);
        }
    }

    let def = classes.get(cls);
    if def.default_actor.single_spawn && class_instance_exists(world, cls) {
        com_dprintf(&format!("{} is single spawn and already present\n", def.name));
        return None;
    }

    let Some(spawn_state) = classes.find_state(cls, "Spawn") else {
        com_dprintf(&format!("{} has no Spawn state\n", def.name));
        return None;
    };

    let mut actor = def.default_actor.clone();
    actor.x = x;
    actor.y = y;
    actor.z = z;
    actor.velx = 0;
    actor.vely = 0;
    actor.health = actor.spawn_health(&classes, world.settings.skill);
    actor.object_flags.insert(ObjectFlags::JUST_SPAWNED);
    actor.distance = 0;
    actor.dir = DirType::NoDir;
    actor.trydir = DirType::NoDir;
    actor.inventory = None;
    let spot = world.import.get_spot(tile_of(x), tile_of(y));
    actor.enter_zone(spot.zone);

    let frame = classes.frame(spawn_state);
    actor.state = Some(spawn_state);
    actor.sprite = frame.sprite;
    actor.ticcount = frame.get_tics(&mut world.rng.state_tics);

    let id = world.actors.insert(actor);

    if let Some(begin_play) = def.hooks.begin_play {
        begin_play(world, id);
    }
    let euthanized = world
        .actor(id)
        .map_or(true, |a| a.object_flags.contains(ObjectFlags::EUTHANIZE_ME));
    if euthanized {
        world.actors.remove(id);
        return None;
    }

    let (actor_flags, seesound) = match world.actor(id) {
        Some(a) => (a.flags, a.sounds.see.clone()),
        None => return None,
    };
    if actor_flags.contains(ActorFlags::COUNTKILL) {
        world.gamestate.killtotal += 1;
    }
    if actor_flags.contains(ActorFlags::COUNTITEM) {
        world.gamestate.treasuretotal += 1;
    }
    if actor_flags.contains(ActorFlags::COUNTSECRET) {
        world.gamestate.secrettotal += 1;
    }

    if world.settings.secret_death_sounds {
        if let (Some(snd), Some(a)) = (&def.meta.secret_death_sound, world.actors.get_mut(id)) {
            a.sounds.death = snd.clone();
        }
    }

    if actor_flags.contains(ActorFlags::MISSILE) {
        world.play_sound_at(id, &seesound);
        let ticcount = world.actor(id).map_or(0, |a| a.ticcount);
        if actor_flags.contains(ActorFlags::RANDOMIZE) && ticcount > 0 {
            let jitter = (world.rng.spawn_actor.gen_byte() & 7) as i32;
            if let Some(a) = world.actors.get_mut(id) {
                a.ticcount = (ticcount - jitter).max(1);
            }
        }
    } else if actor_flags.contains(ActorFlags::RANDOMIZE) {
        randomize_tics(world, id);
    }

    if flags.contains(SpawnFlags::PATROL) {
        if let Some(a) = world.actors.get_mut(id) {
            a.flags.insert(ActorFlags::PATHING);
            // at least one tile so the path is not re-read immediately
            a.distance = TILEGLOBAL;
        }
        if let Some(path) = classes.find_state(cls, "Path") {
            set_state(world, id, Some(path), true);
            if actor_flags.contains(ActorFlags::RANDOMIZE) {
                randomize_tics(world, id);
            }
        }
    }

    world.push_pending(id);
    world.assign_spawn_id(id);
    Some(id)
}

fn randomize_tics(world: &mut World, id: ActorId) {
    let ticcount = world.actor(id).map_or(0, |a| a.ticcount);
    if ticcount > 0 {
        let roll = world.rng.spawn_actor.gen_byte() as i32;
        if let Some(a) = world.actor_mut(id) {
            a.ticcount = roll % ticcount;
        }
    }
}

/// Spawn an actor placed by the map. Things already killed on an earlier
/// visit of a hub map stay dead.
pub fn spawn_map_thing(
    world: &mut World,
    class: Option<ClassId>,
    x: Fixed,
    y: Fixed,
    thing: u32,
    flags: SpawnFlags,
) -> Option<ActorId> {
    if world.hub.is_thing_killed(&world.gamestate.mapname, thing) {
        return None;
    }
    let id = spawn(world, class, x, y, 0, flags)?;
    if let Some(a) = world.actor_mut(id) {
        a.spawn_thing = Some(thing);
    }
    Some(id)
}

/// Activate everything spawned since the last call: link the new actors
/// into the registry, then run their first frames, newest first.
pub fn finish_spawning_actors(world: &mut World) {
    let pending = world.take_pending();
    if pending.is_empty() {
        return;
    }
    for &id in &pending {
        if world.is_alive(id) {
            world.link(id);
        }
    }
    for &id in pending.iter().rev() {
        let Some(class) = world.actor(id).map(|a| a.class) else {
            continue;
        };
        if let Some(post_begin_play) = world.classes.get(class).hooks.post_begin_play {
            post_begin_play(world, id);
        }
        run_current_state(world, id);
        if let Some(a) = world.actor_mut(id) {
            a.object_flags.remove(ObjectFlags::JUST_SPAWNED);
        }
    }
}

/// Take the actor out of play without freeing it (for example when it is
/// picked up into an inventory).
pub fn remove_from_world(world: &mut World, id: ActorId) {
    world.unlink(id);
    world.remove_pending(id);
    let spawnid = world.actor(id).map_or(0, |a| a.spawnid);
    if spawnid != 0 {
        world.import.stop_looped_sound(spawnid);
    }
}

/// Free the actor and everything in its inventory. Outstanding ids stop
/// resolving.
pub fn destroy(world: &mut World, id: ActorId) {
    let Some((owner, spawnid, head)) = world.actor(id).map(|a| (a.inv.owner, a.spawnid, a.inventory)) else {
        return;
    };
    if let Some(owner) = owner {
        remove_inventory(world, owner, id);
    }
    remove_from_world(world, id);
    world.release_spawn_id(spawnid);

    // a held item's `inventory` is its sibling, which detaching cleared
    let head = if owner.is_some() { None } else { head };
    let mut chain = Vec::new();
    let mut cursor = head;
    while let Some(item) = cursor {
        chain.push(item);
        cursor = world.actor(item).and_then(|a| a.inventory);
    }
    for item in chain {
        if let Some(a) = world.actor_mut(item) {
            a.inv.owner = None;
            a.inventory = None;
        }
        destroy(world, item);
    }

    world.actors.remove(id);
}

/// Undo the level totals this actor contributed, and stop it counting.
pub fn clear_counters(world: &mut World, id: ActorId) {
    let Some(a) = world.actors.get_mut(id) else {
        return;
    };
    if a.flags.contains(ActorFlags::COUNTITEM) {
        world.gamestate.treasuretotal -= 1;
    }
    if a.flags.contains(ActorFlags::COUNTKILL) && a.health > 0 {
        world.gamestate.killtotal -= 1;
    }
    if a.flags.contains(ActorFlags::COUNTSECRET) {
        world.gamestate.secrettotal -= 1;
    }
    a.flags
        .remove(ActorFlags::COUNTITEM | ActorFlags::COUNTKILL | ActorFlags::COUNTSECRET);
}

/// Whether the actor could stand on `spot`: no wall and no other solid
/// actor in the tile.
pub fn try_spot(world: &World, id: ActorId, spot: &MapSpot) -> bool {
    if spot.blocked {
        return false;
    }
    !world.registered().any(|other| {
        other != id
            && world.actor(other).is_some_and(|a| {
                a.flags.contains(ActorFlags::SOLID) && a.tile_x() == spot.tile_x && a.tile_y() == spot.tile_y
            })
    })
}

/// Leave a "TeleportFog" where the actor stands.
pub fn spawn_fog(world: &mut World, id: ActorId) {
    let Some((x, y, angle)) = world.actor(id).map(|a| (a.x, a.y, a.angle)) else {
        return;
    };
    let Some(cls) = world.find_class("TeleportFog") else {
        return;
    };
    if let Some(fog) = spawn(world, Some(cls), x, y, 0, SpawnFlags::ALLOW_REPLACEMENT) {
        if let Some(f) = world.actor_mut(fog) {
            f.angle = angle;
            f.target = Some(id);
        }
    }
}

/// Move the actor to (x, y). Monsters only go if the destination is free;
/// players always do. Returns false when the move was refused.
pub fn teleport(world: &mut World, id: ActorId, x: Fixed, y: Fixed, angle: Angle, nofog: bool) -> bool {
    let Some(is_player) = world.actor(id).map(|a| a.player.is_some()) else {
        return false;
    };
    let destination = world.import.get_spot(tile_of(x), tile_of(y));
    if !is_player && !try_spot(world, id, &destination) {
        return false;
    }

    if !nofog {
        spawn_fog(world, id);
    }
    if let Some(a) = world.actor_mut(id) {
        a.x = x;
        a.y = y;
        a.angle = angle;
        a.enter_zone(destination.zone);
    }
    if !nofog {
        spawn_fog(world, id);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::{add_inventory, find_inventory};
    use crate::settings::GameSettings;
    use crate::state::run_tick;
    use crate::test_support::*;
    use ecwolf_common::fixed::ANGLE_90;

    fn spawn_at(world: &mut World, class: &str, tx: u16, ty: u16, flags: SpawnFlags) -> Option<ActorId> {
        let cls = world.find_class(class);
        spawn(world, cls, tile(tx), tile(ty), 0, flags)
    }

    #[test]
    fn test_classless_spawn_fails_quietly() {
        let (mut world, _import) = test_world();
        assert_eq!(spawn(&mut world, None, 0, 0, 0, SpawnFlags::empty()), None);
        assert_eq!(world.actors.len(), 0);
        assert!(world.pending().is_empty());
    }

    #[test]
    fn test_spawn_is_pending_until_finished() {
        let (mut world, _import) = test_world();
        let id = spawn_at(&mut world, "Guard", 3, 4, SpawnFlags::empty()).unwrap();
        assert!(world.is_pending(id));
        assert!(!world.is_registered(id));
        assert!(world.actor(id).unwrap().is_just_spawned());
        finish_spawning_actors(&mut world);
        assert!(!world.is_pending(id));
        assert!(world.is_registered(id));
        assert!(!world.actor(id).unwrap().is_just_spawned());
    }

    #[test]
    fn test_spawn_initializes_actor() {
        let (mut world, _import) = test_world();
        let id = spawn_at(&mut world, "Officer", 3, 4, SpawnFlags::empty()).unwrap();
        let a = world.actor(id).unwrap();
        assert_eq!((a.x, a.y), (tile(3), tile(4)));
        assert_eq!(a.health, 70);
        assert_eq!(a.spawnid, 1);
        assert_eq!(a.dir, DirType::NoDir);
        assert_eq!(world.gamestate.killtotal, 1);
        assert_eq!(world.actor_by_spawnid(1), Some(id));
    }

    #[test]
    fn test_spawn_ids_are_not_reused() {
        let (mut world, _import) = test_world();
        let a = spawn_live(&mut world, "Vase", 1, 1);
        destroy(&mut world, a);
        let b = spawn_live(&mut world, "Vase", 1, 1);
        assert_eq!(world.actor(b).unwrap().spawnid, 2);
        assert_eq!(world.last_spawn_key(), 3);
    }

    #[test]
    fn test_replacement_applies_only_when_allowed() {
        let (mut world, _import) = test_world();
        let plain = spawn_at(&mut world, "Vase", 1, 1, SpawnFlags::empty()).unwrap();
        let replaced = spawn_at(&mut world, "Vase", 1, 2, SpawnFlags::ALLOW_REPLACEMENT).unwrap();
        assert_eq!(world.class_name(world.actor(plain).unwrap().class), "Vase");
        assert_eq!(world.class_name(world.actor(replaced).unwrap().class), "GoldVase");
    }

    #[test]
    fn test_single_spawn_rejects_second_instance() {
        let (mut world, _import) = test_world();
        assert!(spawn_at(&mut world, "Boss", 1, 1, SpawnFlags::empty()).is_some());
        // still pending: the scan covers the queue too
        assert!(spawn_at(&mut world, "Boss", 2, 2, SpawnFlags::empty()).is_none());
        finish_spawning_actors(&mut world);
        let before = world.registry_len();
        assert!(spawn_at(&mut world, "Boss", 2, 2, SpawnFlags::empty()).is_none());
        finish_spawning_actors(&mut world);
        assert_eq!(world.registry_len(), before);
        assert_eq!(world.gamestate.killtotal, 1);
    }

    #[test]
    fn test_euthanized_actor_is_not_counted() {
        let (mut world, _import) = test_world();
        assert!(spawn_at(&mut world, "Ghost", 1, 1, SpawnFlags::empty()).is_none());
        assert_eq!(world.gamestate.killtotal, 0);
        assert_eq!(world.actors.len(), 0);
        assert!(world.pending().is_empty());
        assert_eq!(world.last_spawn_key(), 1);
    }

    #[test]
    fn test_missile_spawn_plays_launch_sound_and_jitters() {
        let (mut world, import) = test_world();
        for i in 0..20 {
            let id = spawn_at(&mut world, "Rocket", 1, i, SpawnFlags::empty()).unwrap();
            let t = world.actor(id).unwrap().ticcount;
            assert!((1..=4).contains(&t));
        }
        assert_eq!(import.sounds().iter().filter(|s| *s == "rocket/launch").count(), 20);
    }

    #[test]
    fn test_untimed_missile_leaves_spawn_stream_alone() {
        let (mut world, _import) = test_world();
        let mut expected = world.rng.spawn_actor.clone();
        let id = spawn_at(&mut world, "Flare", 1, 1, SpawnFlags::empty()).unwrap();
        assert_eq!(world.actor(id).unwrap().ticcount, -1);
        assert_eq!(world.rng.spawn_actor.gen_byte(), expected.gen_byte());
    }

    #[test]
    fn test_patrol_spawn_starts_on_path() {
        let (mut world, _import) = test_world();
        let id = spawn_at(&mut world, "Guard", 1, 1, SpawnFlags::PATROL).unwrap();
        let cls = world.actor(id).unwrap().class;
        let a = world.actor(id).unwrap();
        assert!(a.flags.contains(ActorFlags::PATHING));
        assert_eq!(a.distance, TILEGLOBAL);
        assert_eq!(a.state, world.classes.find_state(cls, "Path"));
        assert_eq!(a.ticcount, 20);
    }

    #[test]
    fn test_secret_death_sound_setting() {
        let mut settings = GameSettings::default();
        let (mut world, _import) = test_world();
        let plain = spawn_at(&mut world, "SecretGuard", 1, 1, SpawnFlags::empty()).unwrap();
        assert_eq!(world.actor(plain).unwrap().sounds.death, "guard/death");
        assert_eq!(world.gamestate.secrettotal, 1);

        settings.secret_death_sounds = true;
        let (mut world, _import) = test_world_with(settings);
        let secret = spawn_at(&mut world, "SecretGuard", 1, 1, SpawnFlags::empty()).unwrap();
        assert_eq!(world.actor(secret).unwrap().sounds.death, "misc/secret");
    }

    #[test]
    fn test_finish_runs_newest_first() {
        let (mut world, _import) = test_world();
        let first = spawn_at(&mut world, "Counter", 1, 1, SpawnFlags::empty()).unwrap();
        let second = spawn_at(&mut world, "Counter", 2, 1, SpawnFlags::empty()).unwrap();
        finish_spawning_actors(&mut world);
        // registry keeps spawn order even though activation ran in reverse
        assert_eq!(world.registered().collect::<Vec<_>>(), vec![first, second]);
        assert_eq!(world.actor(first).unwrap().temp1, 1);
        assert_eq!(world.actor(second).unwrap().temp1, 1);
    }

    #[test]
    fn test_map_thing_stays_dead_in_hub() {
        let (mut world, _import) = test_world();
        world.gamestate.mapname = "MAP01".into();
        let cls = world.find_class("Guard");
        let id = spawn_map_thing(&mut world, cls, tile(1), tile(1), 12, SpawnFlags::empty()).unwrap();
        assert_eq!(world.actor(id).unwrap().spawn_thing, Some(12));
        world.hub.set_thing_killed("MAP01", 12);
        assert!(spawn_map_thing(&mut world, cls, tile(1), tile(1), 12, SpawnFlags::empty()).is_none());
    }

    #[test]
    fn test_destroy_frees_inventory_and_stops_loops() {
        let (mut world, import) = test_world();
        let guard = spawn_live(&mut world, "Guard", 1, 1);
        let clip = spawn_live(&mut world, "Clip", 1, 1);
        let key = spawn_live(&mut world, "GoldKey", 1, 1);
        remove_from_world(&mut world, clip);
        remove_from_world(&mut world, key);
        add_inventory(&mut world, guard, clip);
        add_inventory(&mut world, guard, key);
        let spawnid = world.actor(guard).unwrap().spawnid;

        destroy(&mut world, guard);
        assert!(!world.is_alive(guard));
        assert!(!world.is_alive(clip));
        assert!(!world.is_alive(key));
        assert_eq!(world.actor_by_spawnid(spawnid), None);
        assert!(import.log.borrow().stopped_loops.contains(&spawnid));
        assert_eq!(world.actors.len(), 0);
    }

    #[test]
    fn test_destroying_held_item_detaches_it() {
        let (mut world, _import) = test_world();
        let guard = spawn_live(&mut world, "Guard", 1, 1);
        let clip = spawn_live(&mut world, "Clip", 1, 1);
        remove_from_world(&mut world, clip);
        add_inventory(&mut world, guard, clip);
        destroy(&mut world, clip);
        assert!(world.is_alive(guard));
        assert_eq!(world.actor(guard).unwrap().inventory, None);
        let clip_class = world.find_class("Clip").unwrap();
        assert_eq!(find_inventory(&world, guard, clip_class), None);
    }

    #[test]
    fn test_clear_counters() {
        let (mut world, _import) = test_world();
        let guard = spawn_live(&mut world, "Guard", 1, 1);
        let treasure = spawn_live(&mut world, "Treasure", 1, 2);
        assert_eq!((world.gamestate.killtotal, world.gamestate.treasuretotal), (1, 1));
        clear_counters(&mut world, guard);
        clear_counters(&mut world, treasure);
        clear_counters(&mut world, treasure);
        assert_eq!((world.gamestate.killtotal, world.gamestate.treasuretotal), (0, 0));
        assert!(!world.actor(guard).unwrap().flags.contains(ActorFlags::COUNTKILL));
    }

    #[test]
    fn test_dead_actor_keeps_kill_total() {
        let (mut world, _import) = test_world();
        let guard = spawn_live(&mut world, "Guard", 1, 1);
        world.actor_mut(guard).unwrap().health = 0;
        clear_counters(&mut world, guard);
        assert_eq!(world.gamestate.killtotal, 1);
    }

    #[test]
    fn test_teleport_monster_needs_free_spot() {
        let (mut world, import) = test_world();
        let guard = spawn_live(&mut world, "Guard", 1, 1);
        let _blocker = spawn_live(&mut world, "Guard", 5, 5);
        import.block(7, 7);

        assert!(!teleport(&mut world, guard, tile(5), tile(5), 0, true));
        assert!(!teleport(&mut world, guard, tile(7), tile(7), 0, true));
        assert_eq!(world.actor(guard).unwrap().x, tile(1));

        assert!(teleport(&mut world, guard, tile(9), tile(2), ANGLE_90, true));
        let a = world.actor(guard).unwrap();
        assert_eq!((a.x, a.y, a.angle), (tile(9), tile(2), ANGLE_90));
    }

    #[test]
    fn test_teleport_player_ignores_spot_and_leaves_fog() {
        let (mut world, import) = test_world();
        let player = spawn_live(&mut world, "PlayerPawn", 1, 1);
        world.actor_mut(player).unwrap().player = Some(0);
        import.block(4, 4);
        assert!(teleport(&mut world, player, tile(4), tile(4), 0, false));
        assert_eq!(world.pending().len(), 2);
        let fogs: Vec<ActorId> = world.pending().to_vec();
        assert_eq!(world.actor(fogs[0]).unwrap().x, tile(1));
        assert_eq!(world.actor(fogs[1]).unwrap().x, tile(4));
        assert_eq!(world.actor(fogs[1]).unwrap().target, Some(player));

        // fog plays out and removes itself
        for _ in 0..16 {
            run_tick(&mut world);
        }
        assert_eq!(world.registered().collect::<Vec<_>>(), vec![player]);
    }

    #[test]
    fn test_teleport_enters_destination_zone() {
        let import = crate::game_import::RecordingImport {
            zone: Some(3),
            ..Default::default()
        };
        let mut world = World::new(
            Arc::new(test_classes()),
            GameSettings::default(),
            Box::new(import.clone()),
        );
        let vase = spawn_live(&mut world, "Vase", 1, 1);
        assert_eq!(world.actor(vase).unwrap().zone, Some(3));
        world.actor_mut(vase).unwrap().zone = None;
        assert!(teleport(&mut world, vase, tile(2), tile(2), 0, true));
        assert_eq!(world.actor(vase).unwrap().zone, Some(3));
    }
}

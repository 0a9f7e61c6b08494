// combat.rs — damage, death and projectiles

use std::sync::Arc;

use ecwolf_common::common::{com_dprintf, com_printf};
use ecwolf_common::fixed::{fixed_mul, tile_center, tile_of};

use crate::actor::{ActorFlags, ActorId, DirType};
use crate::classdef::{ClassId, ClassKind, ClassTable, NATIVE_AMMO, NATIVE_INVENTORY};
use crate::inventory::find_inventory;
use crate::spawn::{destroy, spawn, SpawnFlags};
use crate::state::set_state;
use crate::world::World;

/// Percent of `damage_type` damage the class absorbs; 0 when it lists none.
pub fn damage_resistance(classes: &ClassTable, class: ClassId, damage_type: Option<ClassId>) -> i32 {
    let Some(dt) = damage_type else {
        return 0;
    };
    classes
        .get(class)
        .meta
        .damage_resistances
        .iter()
        .find(|r| r.damage_type == dt)
        .map_or(0, |r| r.percent)
}

pub fn apply_damage_resistance(classes: &ClassTable, class: ClassId, damage: i32, damage_type: Option<ClassId>) -> i32 {
    let percent = damage_resistance(classes, class, damage_type);
    damage - damage * percent / 100
}

/// Whether `check` belongs to a faction `ob` treats as hostile.
pub fn is_enemy(world: &World, ob: ActorId, check: ActorId) -> bool {
    let (Some(a), Some(b)) = (world.actor(ob), world.actor(check)) else {
        return false;
    };
    let Some(faction) = b.faction else {
        return false;
    };
    world.classes.get(a.class).meta.enemy_factions.contains(&faction)
}

/// Hurt `ob`. Returns the damage actually taken after resistance and the
/// actor's damage factor.
pub fn damage_actor(
    world: &mut World,
    ob: ActorId,
    attacker: Option<ActorId>,
    damage: i32,
    damage_type: Option<ClassId>,
) -> i32 {
    let classes = Arc::clone(&world.classes);
    let Some(a) = world.actor(ob) else {
        return 0;
    };
    if !a.flags.contains(ActorFlags::SHOOTABLE) {
        return 0;
    }
    let damage = apply_damage_resistance(&classes, a.class, damage, damage_type);
    let damage = fixed_mul(damage, a.damage_factor);
    let class = a.class;
    let painchance = a.painchance;

    let health = {
        let Some(a) = world.actor_mut(ob) else {
            return 0;
        };
        if let Some(attacker) = attacker.filter(|&at| at != ob) {
            a.target = Some(attacker);
        }
        a.killer_damage_type = damage_type;
        a.health -= damage;
        a.health
    };

    if health <= 0 {
        die(world, ob);
    } else if (world.rng.pain.gen_byte() as i32) < painchance {
        if let Some(pain) = classes.find_state(class, "Pain") {
            set_state(world, ob, Some(pain), false);
        }
    }
    damage
}

/// Announce the death of a player, using the killer's class messages.
pub fn obituary(world: &mut World, victim: ActorId, attacker: ActorId) {
    let Some(v) = world.actor(victim) else {
        return;
    };
    if v.player.is_none() {
        return;
    }
    let melee = v.killer_damage_type.is_some_and(|dt| {
        matches!(world.classes.get(dt).kind, ClassKind::DamageType { melee: true, .. })
    });
    let Some(a) = world.actor(attacker) else {
        return;
    };
    let meta = &world.classes.get(a.class).meta;
    let message = if melee {
        meta.hit_obituary.as_ref().or(meta.obituary.as_ref())
    } else {
        meta.obituary.as_ref()
    };
    if let Some(message) = message.filter(|m| !m.is_empty()).cloned() {
        com_printf(&format!("{}\n", message));
        world.import.post_message(&message);
    }
}

/// Kill the actor: score, counters, drops and the death animation.
pub fn die(world: &mut World, id: ActorId) {
    let classes = Arc::clone(&world.classes);
    let Some(a) = world.actor(id) else {
        return;
    };
    let points = a.points;
    let target = a.target.filter(|&t| world.is_alive(t));
    let target_player = target.and_then(|t| world.actor(t)).and_then(|t| t.player);

    match target_player {
        Some(p) if p < world.players.len() => world.players[p].give_points(points),
        _ => {
            if points != 0 {
                // no usable attacker, credit the first player
                if let Some(p) = world.players.first_mut() {
                    p.give_points(points);
                }
                com_dprintf(&format!("die: {} points with no target\n", points));
            }
        }
    }

    if let Some(t) = target {
        obituary(world, id, t);
    }

    let Some(a) = world.actors.get_mut(id) else {
        return;
    };
    if a.flags.contains(ActorFlags::COUNTKILL) {
        world.gamestate.killcount += 1;
        if let Some(thing) = a.spawn_thing {
            world.hub.set_thing_killed(&world.gamestate.mapname, thing);
        }
    }
    a.flags.remove(ActorFlags::SHOOTABLE);
    let missile = a.flags.contains(ActorFlags::MISSILE);

    if missile {
        explode_projectile(world, id, None);
        return;
    }

    drop_items(world, id, target);

    let Some(a) = world.actor(id) else {
        return;
    };
    let def = classes.get(a.class);
    let gib_health = def
        .meta
        .gib_health
        .unwrap_or_else(|| fixed_mul(def.default_actor.health, world.settings.gib_factor));
    let killer_type = a.killer_damage_type;
    let mut extreme = a.health < -gib_health;
    if let Some(dt) = killer_type {
        if let ClassKind::DamageType { no_extreme_death: true, .. } = classes.get(dt).kind {
            extreme = false;
        }
    }
    let type_name = killer_type.map(|dt| classes.get(dt).name.as_str());

    let class = a.class;
    let mut death = None;
    if extreme {
        if let Some(name) = type_name {
            death = classes.find_state(class, &format!("XDeath_{}", name));
        }
        if death.is_none() {
            death = classes.find_state(class, "XDeath");
        }
    }
    if death.is_none() {
        if let Some(name) = type_name {
            death = classes.find_state(class, &format!("Death_{}", name));
        }
    }
    if death.is_none() {
        death = classes.find_state(class, "Death");
    }

    match death {
        Some(frame) => set_state(world, id, Some(frame), false),
        None => destroy(world, id),
    }
}

/// Roll the class drop list and spawn the winners at the tile centre.
fn drop_items(world: &mut World, id: ActorId, target: Option<ActorId>) {
    let classes = Arc::clone(&world.classes);
    let Some(a) = world.actor(id) else {
        return;
    };
    let (x, y, angle, dir) = (tile_center(a.x), tile_center(a.y), a.angle, a.dir);
    let by_target = a.flags.contains(ActorFlags::DROPBASEDONTARGET);
    let drops = &classes.get(a.class).meta.drop_items;

    let mut best: Option<usize> = None;
    for (i, entry) in drops.iter().enumerate() {
        if world.rng.drop_item.gen_byte() > entry.probability {
            continue;
        }
        let Some(mut cls) = classes.find(&entry.class_name) else {
            continue;
        };
        let mut chosen = entry;

        if by_target {
            let held = target.and_then(|t| find_inventory(world, t, classes.get_replacement(cls)));
            if held.is_none() || best.is_none() {
                best = Some(i);
            }
            if i + 1 < drops.len() {
                continue;
            }
            let Some(b) = best else {
                continue;
            };
            chosen = &drops[b];
            match classes.find(&chosen.class_name) {
                Some(c) => cls = c,
                None => continue,
            }
        }

        let Some(item) = spawn(world, Some(cls), x, y, 0, SpawnFlags::ALLOW_REPLACEMENT) else {
            continue;
        };
        let Some(it) = world.actor_mut(item) else {
            continue;
        };
        it.angle = angle;
        it.dir = dir;
        it.trydir = DirType::NoDir;

        if classes.is_descendant_of(cls, NATIVE_INVENTORY) {
            if chosen.amount > 0 {
                it.inv.amount = chosen.amount;
            } else if classes.is_descendant_of(cls, NATIVE_AMMO) && it.inv.amount > 1 {
                it.inv.amount /= 2;
            }
        }
    }
}

/// End a projectile's flight: stop, play its death sound and show the
/// explosion, or vanish if it has none.
pub fn explode_projectile(world: &mut World, id: ActorId, _target: Option<ActorId>) {
    let (class, sound) = match world.actor_mut(id) {
        Some(a) => {
            a.flags.remove(ActorFlags::MISSILE);
            a.velx = 0;
            a.vely = 0;
            (a.class, a.sounds.death.clone())
        }
        None => return,
    };
    world.play_sound_at(id, &sound);
    let death = world.classes.find_state(class, "Death");
    set_state(world, id, death, false);
}

/// Per-tic projectile motion: advance by velocity, explode against walls,
/// and hit the first shootable actor within reach.
pub fn t_projectile(world: &mut World, id: ActorId) {
    let Some(m) = world.actor(id) else {
        return;
    };
    let nx = m.x.wrapping_add(m.velx);
    let ny = m.y.wrapping_add(m.vely);
    let radius = m.radius;
    let parent = m.missile_parent;

    if world.import.get_spot(tile_of(nx), tile_of(ny)).blocked {
        explode_projectile(world, id, None);
        return;
    }
    if let Some(m) = world.actor_mut(id) {
        m.x = nx;
        m.y = ny;
    }

    let hit = world.registered().find(|&other| {
        other != id
            && Some(other) != parent
            && world.actor(other).is_some_and(|o| {
                let reach = o.radius + radius;
                o.flags.contains(ActorFlags::SHOOTABLE)
                    && (o.x - nx).abs() < reach
                    && (o.y - ny).abs() < reach
            })
    });
    let Some(hit) = hit else {
        return;
    };

    let damage = world.actor(id).map_or(0, |m| m.get_damage(&world.classes));
    damage_actor(world, hit, parent, damage, None);
    explode_projectile(world, id, Some(hit));
}

// save.rs — actor and world persistence
//
// An actor record is a fixed sequence of fields; some are only present from a
// given (product, save) version on. Loading an older file skips the missing
// fields and leaves the class default in place. Cross references travel as
// record indices (-1 for none), frames as (owning class, local index) and
// classes by name, so a save does not depend on table layout.

use std::collections::HashMap;
use std::path::Path;

use rayon::prelude::*;
use tracing::debug;

use ecwolf_common::archive::{decode_save, encode_save, Archive, SaveVersion};
use ecwolf_common::common::com_dprintf;

use crate::actor::{Actor, ActorFlags, ActorId, DirType, ObjectFlags};
use crate::classdef::{ClassId, ClassTable};
use crate::error::{Result, SaveError};
use crate::frame::FrameId;
use crate::world::World;

/// First product with a three-dimensional position and a saved target.
pub const PRODUCT_1_3: u32 = 0x0010_03FF;
/// First product without the actor proxy.
pub const PRODUCT_1_2: u32 = 0x0010_02FF;

const SAVE_Z: u32 = 1_507_591_295;
const SAVE_TARGET: u32 = 1_459_043_051;
const SAVE_OVERHEAD_ICON: u32 = 1_393_719_642;
const SAVE_PROXY_REMOVED: u32 = 1_382_102_747;
/// Projectile pass height is stored strictly after this save version.
const SAVE_PASS_HEIGHT: u32 = 1_374_914_454;

/// Below this many records, encoding on one thread is faster.
const PARALLEL_SAVE_THRESHOLD: usize = 32;

const NO_RECORD: i32 = -1;

fn has_z(v: SaveVersion) -> bool {
    v.product_at_least(PRODUCT_1_3) && v.save_at_least(SAVE_Z)
}

fn has_target(v: SaveVersion) -> bool {
    v.product_at_least(PRODUCT_1_3) && v.save_at_least(SAVE_TARGET)
}

fn has_overhead_icon(v: SaveVersion) -> bool {
    v.save_at_least(SAVE_OVERHEAD_ICON)
}

fn has_proxy(v: SaveVersion) -> bool {
    !v.product_at_least(PRODUCT_1_2) || !v.save_at_least(SAVE_PROXY_REMOVED)
}

fn has_pass_height(v: SaveVersion) -> bool {
    v.product_at_least(PRODUCT_1_2) && v.save_after(SAVE_PASS_HEIGHT)
}

/// Actor references of one record, as record indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActorLinks {
    pub target: i32,
    pub missile_parent: i32,
    pub inventory: i32,
    pub owner: i32,
    /// The actor was in the live registry when saved.
    pub registered: bool,
}

impl Default for ActorLinks {
    fn default() -> Self {
        Self {
            target: NO_RECORD,
            missile_parent: NO_RECORD,
            inventory: NO_RECORD,
            owner: NO_RECORD,
            registered: false,
        }
    }
}

impl ActorLinks {
    fn of(actor: &Actor, index: &HashMap<ActorId, i32>, registered: bool) -> Self {
        let rec = |id: Option<ActorId>| id.and_then(|id| index.get(&id).copied()).unwrap_or(NO_RECORD);
        Self {
            target: rec(actor.target),
            missile_parent: rec(actor.missile_parent),
            inventory: rec(actor.inventory),
            owner: rec(actor.inv.owner),
            registered,
        }
    }
}

// ============================================================
// Reference codecs
// ============================================================

fn io_class(ar: &mut Archive, classes: &ClassTable, class: &mut Option<ClassId>) -> Result<()> {
    let mut name = class.map(|c| classes.get(c).name.clone());
    ar.io(&mut name)?;
    if ar.is_loading() {
        *class = match name {
            Some(n) => Some(classes.find(&n).ok_or(SaveError::UnknownClass(n))?),
            None => None,
        };
    }
    Ok(())
}

fn io_frame(ar: &mut Archive, classes: &ClassTable, frame: &mut Option<FrameId>) -> Result<()> {
    let mut reference = frame.map(|f| {
        let fr = classes.frame(f);
        (classes.get(fr.owner).name.clone(), fr.index)
    });
    ar.io(&mut reference)?;
    if ar.is_loading() {
        *frame = match reference {
            Some((class, index)) => {
                let owner = classes
                    .find(&class)
                    .ok_or_else(|| SaveError::UnknownClass(class.clone()))?;
                Some(
                    classes
                        .state_at(owner, index)
                        .ok_or(SaveError::BadFrame { class, index })?,
                )
            }
            None => None,
        };
    }
    Ok(())
}

fn io_dir(ar: &mut Archive, dir: &mut DirType) -> Result<()> {
    let mut raw = *dir as u8;
    ar.io(&mut raw)?;
    *dir = DirType::from_u8(raw);
    Ok(())
}

// ============================================================
// Actor records
// ============================================================

/// Everything up to where old files kept the actor proxy.
fn io_actor_head(ar: &mut Archive, classes: &ClassTable, a: &mut Actor, links: &mut ActorLinks) -> Result<()> {
    let v = ar.version();

    ar.io(&mut a.sprite)?;
    io_dir(ar, &mut a.dir)?;
    io_dir(ar, &mut a.trydir)?;

    let mut flags = a.flags.bits();
    let mut object_flags = a.object_flags.bits();
    ar.io(&mut a.spawnid)?
        .io(&mut flags)?
        .io(&mut object_flags)?
        .io(&mut a.distance)?
        .io(&mut a.x)?
        .io(&mut a.y)?;
    a.flags = ActorFlags::from_bits_retain(flags);
    a.object_flags = ObjectFlags::from_bits_retain(object_flags);
    if has_z(v) {
        ar.io(&mut a.z)?;
    }

    ar.io(&mut a.velx)?
        .io(&mut a.vely)?
        .io(&mut a.angle)?
        .io(&mut a.pitch)?
        .io(&mut a.health)?
        .io(&mut a.speed)?
        .io(&mut a.runspeed)?
        .io(&mut a.points)?
        .io(&mut a.radius)?
        .io(&mut a.ticcount)?;
    io_frame(ar, classes, &mut a.state)?;
    ar.io(&mut a.zone)?;
    if has_overhead_icon(v) {
        ar.io(&mut a.overhead_icon)?;
    }

    let mut player = a.player.map(|p| p as u32);
    ar.io(&mut a.painchance)?
        .io(&mut a.sounds.active)?
        .io(&mut a.sounds.attack)?
        .io(&mut a.sounds.death)?
        .io(&mut a.sounds.see)?
        .io(&mut a.sounds.pain)?
        .io(&mut a.temp1)?
        .io(&mut a.hidden)?
        .io(&mut player)?
        .io(&mut links.inventory)?
        .io(&mut a.spawn_thing)?;
    a.player = player.map(|p| p as usize);

    if has_target(v) {
        ar.io(&mut links.target)?;
    }
    Ok(())
}

fn io_actor_tail(ar: &mut Archive, classes: &ClassTable, a: &mut Actor, links: &mut ActorLinks) -> Result<()> {
    ar.io(&mut links.registered)?
        .io(&mut a.single_spawn)?
        .io(&mut a.damage_factor)?
        .io(&mut a.filterpos_wave_last_moves)?;
    if has_pass_height(ar.version()) {
        ar.io(&mut a.projectile_pass_height)?;
    }
    ar.io(&mut links.missile_parent)?;
    io_class(ar, classes, &mut a.faction)?;
    io_class(ar, classes, &mut a.killer_damage_type)?;

    if classes.get(a.class).kind.is_inventory() {
        ar.io(&mut links.owner)?
            .io(&mut a.inv.amount)?
            .io(&mut a.inv.max_amount)?
            .io(&mut a.sounds.pickup)?;
    }
    Ok(())
}

/// Store or load one actor's fields at the archive's version. `a` must
/// already have the right class; loading starts from the class defaults so
/// fields absent from older files keep them.
pub fn serialize_actor(ar: &mut Archive, classes: &ClassTable, a: &mut Actor, links: &mut ActorLinks) -> Result<()> {
    io_actor_head(ar, classes, a, links)?;
    if ar.is_loading() && has_proxy(ar.version()) {
        // legacy indirect reference, no longer used
        let _proxy: i32 = ar.get()?;
    }
    io_actor_tail(ar, classes, a, links)
}

fn encode_record(classes: &ClassTable, actor: &Actor, links: ActorLinks, version: SaveVersion) -> Result<Vec<u8>> {
    let mut ar = Archive::storing_as(version);
    ar.put(&classes.get(actor.class).name);
    let mut a = actor.clone();
    let mut links = links;
    serialize_actor(&mut ar, classes, &mut a, &mut links)?;
    Ok(ar.into_bytes())
}

// ============================================================
// World
// ============================================================

/// Record order: the live registry, then everything else (held inventory,
/// actors not yet activated) in arena order.
fn record_order(world: &World) -> Vec<(ActorId, bool)> {
    let mut order: Vec<(ActorId, bool)> = world.registered().map(|id| (id, true)).collect();
    order.extend(
        world
            .actors
            .iter()
            .filter(|(id, _)| !world.is_registered(*id))
            .map(|(id, _)| (id, false)),
    );
    order
}

/// Serialize the world's actors and counters into an uncompressed body.
/// Actors still waiting to spawn are saved with their queue position and
/// queued again on load.
pub fn encode_world(world: &World, version: SaveVersion) -> Result<Vec<u8>> {
    if !world.pending().is_empty() {
        com_dprintf(&format!(
            "encode_world: {} actors still waiting to spawn\n",
            world.pending().len()
        ));
    }

    let order = record_order(world);
    let index: HashMap<ActorId, i32> = order
        .iter()
        .enumerate()
        .map(|(i, &(id, _))| (id, i as i32))
        .collect();

    let mut ar = Archive::storing_as(version);
    ar.put(&world.last_key);
    ar.put(&world.level_tics);
    let gs = &world.gamestate;
    ar.put(&gs.mapname);
    for count in [
        gs.killcount,
        gs.killtotal,
        gs.treasurecount,
        gs.treasuretotal,
        gs.secretcount,
        gs.secrettotal,
    ] {
        ar.put(&count);
    }
    let kills: Vec<(String, u32)> = world.hub.killed().cloned().collect();
    ar.put(&kills);
    let players: Vec<(i32, i32)> = world
        .players
        .iter()
        .map(|p| {
            let mo = p.mo.and_then(|id| index.get(&id).copied()).unwrap_or(NO_RECORD);
            (p.score, mo)
        })
        .collect();
    ar.put(&players);
    let pending: Vec<i32> = world
        .pending()
        .iter()
        .filter_map(|id| index.get(id).copied())
        .collect();
    ar.put(&pending);

    let records: Vec<(&Actor, ActorLinks)> = order
        .iter()
        .filter_map(|&(id, registered)| {
            world
                .actor(id)
                .map(|a| (a, ActorLinks::of(a, &index, registered)))
        })
        .collect();
    ar.put(&(records.len() as u32));

    let classes = &*world.classes;
    let encoded: Vec<Vec<u8>> = if records.len() > PARALLEL_SAVE_THRESHOLD {
        records
            .par_iter()
            .map(|&(a, links)| encode_record(classes, a, links, version))
            .collect::<Result<Vec<_>>>()?
    } else {
        records
            .iter()
            .map(|&(a, links)| encode_record(classes, a, links, version))
            .collect::<Result<Vec<_>>>()?
    };
    for record in &encoded {
        ar.write_bytes(record);
    }

    debug!(actors = records.len(), "encoded world");
    Ok(ar.into_bytes())
}

fn check_record(count: usize, rec: i32) -> Result<()> {
    if rec == NO_RECORD || usize::try_from(rec).is_ok_and(|i| i < count) {
        Ok(())
    } else {
        Err(SaveError::BadActorRef(rec))
    }
}

fn resolve(ids: &[ActorId], rec: i32) -> Option<ActorId> {
    usize::try_from(rec).ok().and_then(|i| ids.get(i).copied())
}

/// Replace the world's actors and counters with a decoded body. The body is
/// fully read and every reference checked before the world is touched, so a
/// failed load leaves it as it was.
pub fn decode_world(world: &mut World, body: Vec<u8>, version: SaveVersion) -> Result<()> {
    let mut ar = Archive::loading(body, version);
    let classes = std::sync::Arc::clone(&world.classes);

    let last_key: u32 = ar.get()?;
    let level_tics: u32 = ar.get()?;
    let mapname: String = ar.get()?;
    let mut counts = [0i32; 6];
    for c in &mut counts {
        *c = ar.get()?;
    }
    let kills: Vec<(String, u32)> = ar.get()?;
    let players: Vec<(i32, i32)> = ar.get()?;
    let pending: Vec<i32> = ar.get()?;

    let count: u32 = ar.get()?;
    let mut records = Vec::with_capacity((count as usize).min(ar.remaining()));
    for _ in 0..count {
        let name: String = ar.get()?;
        let class = classes
            .find(&name)
            .ok_or_else(|| SaveError::UnknownClass(name.clone()))?;
        let mut actor = classes.get(class).default_actor.clone();
        let mut links = ActorLinks::default();
        serialize_actor(&mut ar, &classes, &mut actor, &mut links)?;
        records.push((actor, links));
    }

    let n = records.len();
    for (_, links) in &records {
        for rec in [links.target, links.missile_parent, links.inventory, links.owner] {
            check_record(n, rec)?;
        }
    }
    for &(_, mo) in &players {
        check_record(n, mo)?;
    }
    for &rec in &pending {
        if rec == NO_RECORD {
            return Err(SaveError::BadActorRef(rec));
        }
        check_record(n, rec)?;
    }

    world.clear();
    let ids: Vec<ActorId> = records
        .iter()
        .map(|(actor, _)| world.actors.insert(actor.clone()))
        .collect();

    for (&id, (_, links)) in ids.iter().zip(&records) {
        if let Some(a) = world.actor_mut(id) {
            a.target = resolve(&ids, links.target);
            a.missile_parent = resolve(&ids, links.missile_parent);
            a.inventory = resolve(&ids, links.inventory);
            a.inv.owner = resolve(&ids, links.owner);
        }
        if links.registered {
            world.link(id);
        }
        let spawnid = world.actor(id).map_or(0, |a| a.spawnid);
        world.index_spawn_id(spawnid, id);
    }
    for id in pending.into_iter().filter_map(|rec| resolve(&ids, rec)) {
        world.push_pending(id);
    }

    world.last_key = last_key;
    world.level_tics = level_tics;
    world.gamestate.mapname = mapname;
    let [killcount, killtotal, treasurecount, treasuretotal, secretcount, secrettotal] = counts;
    world.gamestate.killcount = killcount;
    world.gamestate.killtotal = killtotal;
    world.gamestate.treasurecount = treasurecount;
    world.gamestate.treasuretotal = treasuretotal;
    world.gamestate.secretcount = secretcount;
    world.gamestate.secrettotal = secrettotal;
    for (map, thing) in kills {
        world.hub.set_thing_killed(&map, thing);
    }
    for (i, (score, mo)) in players.into_iter().enumerate() {
        if let Some(p) = world.players.get_mut(i) {
            p.score = score;
            p.mo = resolve(&ids, mo);
        }
    }

    debug!(actors = ids.len(), %version, "decoded world");
    Ok(())
}

/// Save at the current version.
pub fn save_world(world: &World) -> Result<Vec<u8>> {
    save_world_as(world, SaveVersion::CURRENT)
}

/// Save with the field layout of `version`.
pub fn save_world_as(world: &World, version: SaveVersion) -> Result<Vec<u8>> {
    let body = encode_world(world, version)?;
    Ok(encode_save(version, &body)?)
}

/// Load a save produced by `save_world` or an older build. Returns the
/// version the file was stamped with.
pub fn load_world(world: &mut World, bytes: &[u8]) -> Result<SaveVersion> {
    let (version, body) = decode_save(bytes)?;
    decode_world(world, body, version)?;
    Ok(version)
}

pub fn write_save_file(world: &World, path: impl AsRef<Path>) -> Result<()> {
    let bytes = save_world(world)?;
    std::fs::write(path.as_ref(), bytes)?;
    com_dprintf(&format!("wrote {}\n", path.as_ref().display()));
    Ok(())
}

pub fn read_save_file(world: &mut World, path: impl AsRef<Path>) -> Result<SaveVersion> {
    let bytes = std::fs::read(path.as_ref())?;
    load_world(world, &bytes)
}

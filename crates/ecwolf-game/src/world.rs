// world.rs — everything one running game owns
//
// The world holds the actor arena, the live registry (an intrusive doubly
// linked list threaded through arena slots), the queue of actors waiting for
// activation, progress counters, players and random streams. It is passed
// explicitly to every engine function.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use ecwolf_common::cvar::CvarContext;
use ecwolf_common::fixed::Fixed;
use ecwolf_common::random::RandomStream;

use crate::actor::{Actor, ActorId};
use crate::classdef::{ClassId, ClassTable};
use crate::game_import::GameImport;
use crate::settings::GameSettings;

// ============================================================
// Arena
// ============================================================

#[derive(Clone, Debug, Default)]
struct Slot {
    generation: u32,
    actor: Option<Actor>,
    // registry links
    prev: Option<ActorId>,
    next: Option<ActorId>,
    linked: bool,
}

#[derive(Clone, Debug, Default)]
pub struct ActorArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    count: usize,
}

impl ActorArena {
    pub fn insert(&mut self, actor: Actor) -> ActorId {
        self.count += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.actor = Some(actor);
            return ActorId { index, generation: slot.generation };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            actor: Some(actor),
            ..Slot::default()
        });
        ActorId { index, generation: 0 }
    }

    fn slot(&self, id: ActorId) -> Option<&Slot> {
        self.slots
            .get(id.index as usize)
            .filter(|s| s.generation == id.generation && s.actor.is_some())
    }

    fn slot_mut(&mut self, id: ActorId) -> Option<&mut Slot> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation && s.actor.is_some())
    }

    pub fn get(&self, id: ActorId) -> Option<&Actor> {
        self.slot(id).and_then(|s| s.actor.as_ref())
    }

    pub fn get_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.slot_mut(id).and_then(|s| s.actor.as_mut())
    }

    pub fn contains(&self, id: ActorId) -> bool {
        self.slot(id).is_some()
    }

    /// Free the slot. The id and every copy of it stop resolving.
    pub fn remove(&mut self, id: ActorId) -> Option<Actor> {
        let slot = self.slot_mut(id)?;
        let actor = slot.actor.take();
        slot.generation = slot.generation.wrapping_add(1);
        slot.prev = None;
        slot.next = None;
        slot.linked = false;
        self.free.push(id.index);
        self.count -= 1;
        actor
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// All live actors in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (ActorId, &Actor)> {
        self.slots.iter().enumerate().filter_map(|(i, s)| {
            s.actor.as_ref().map(|a| {
                (
                    ActorId {
                        index: i as u32,
                        generation: s.generation,
                    },
                    a,
                )
            })
        })
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.count = 0;
    }
}

// ============================================================
// Game state
// ============================================================

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GameState {
    pub mapname: String,
    pub killcount: i32,
    pub killtotal: i32,
    pub treasurecount: i32,
    pub treasuretotal: i32,
    pub secretcount: i32,
    pub secrettotal: i32,
}

/// Map things that stay dead when a hub map is revisited.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HubWorld {
    killed: BTreeSet<(String, u32)>,
}

impl HubWorld {
    pub fn set_thing_killed(&mut self, map: &str, thing: u32) {
        self.killed.insert((map.to_string(), thing));
    }

    pub fn is_thing_killed(&self, map: &str, thing: u32) -> bool {
        self.killed.contains(&(map.to_string(), thing))
    }

    pub fn killed(&self) -> impl Iterator<Item = &(String, u32)> {
        self.killed.iter()
    }

    pub fn clear(&mut self) {
        self.killed.clear();
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Player {
    pub mo: Option<ActorId>,
    pub score: i32,
    pub forward_thrust: Fixed,
    pub side_thrust: Fixed,
    pub rot_thrust: Fixed,
}

impl Player {
    pub fn give_points(&mut self, points: i32) {
        self.score += points;
    }
}

/// One stream per kind of decision, so each sequence is independent of how
/// often the others are drawn from.
#[derive(Clone, Debug)]
pub struct RandomStreams {
    pub state_tics: RandomStream,
    pub drop_item: RandomStream,
    pub spawn_actor: RandomStream,
    pub pain: RandomStream,
    pub jump: RandomStream,
}

impl RandomStreams {
    pub fn new(seed: u64) -> Self {
        Self {
            state_tics: RandomStream::new("StateTics", seed),
            drop_item: RandomStream::new("DropItem", seed),
            spawn_actor: RandomStream::new("SpawnActor", seed),
            pain: RandomStream::new("Pain", seed),
            jump: RandomStream::new("CAJump", seed),
        }
    }

    pub fn reseed(&mut self, seed: u64) {
        self.state_tics.reseed(seed);
        self.drop_item.reseed(seed);
        self.spawn_actor.reseed(seed);
        self.pain.reseed(seed);
        self.jump.reseed(seed);
    }
}

// ============================================================
// World
// ============================================================

/// An actor whose frame action is running. A state change for that actor made
/// from inside the action is recorded here and followed by the running loop.
#[derive(Clone, Copy, Debug)]
pub(crate) struct StateRun {
    pub actor: ActorId,
    pub redirected: bool,
}

pub struct World {
    pub classes: Arc<ClassTable>,
    pub actors: ActorArena,
    head: Option<ActorId>,
    tail: Option<ActorId>,
    registry_len: usize,
    /// Next actor the registry walk will visit; advanced when that actor unlinks.
    walk_next: Option<ActorId>,
    pending: Vec<ActorId>,
    spawn_ids: HashMap<u32, ActorId>,
    pub(crate) last_key: u32,
    pub gamestate: GameState,
    pub hub: HubWorld,
    pub players: Vec<Player>,
    pub rng: RandomStreams,
    pub settings: GameSettings,
    pub import: Box<dyn GameImport>,
    pub level_tics: u32,
    /// Actors whose frame actions are running, innermost last.
    pub(crate) state_runs: Vec<StateRun>,
}

impl World {
    pub fn new(classes: Arc<ClassTable>, settings: GameSettings, import: Box<dyn GameImport>) -> Self {
        Self {
            classes,
            actors: ActorArena::default(),
            head: None,
            tail: None,
            registry_len: 0,
            walk_next: None,
            pending: Vec::new(),
            spawn_ids: HashMap::new(),
            last_key: 1,
            gamestate: GameState::default(),
            hub: HubWorld::default(),
            players: vec![Player::default()],
            rng: RandomStreams::new(settings.rng_seed),
            settings,
            import,
            level_tics: 0,
            state_runs: Vec::new(),
        }
    }

    pub fn from_cvars(classes: Arc<ClassTable>, cvars: &CvarContext, import: Box<dyn GameImport>) -> Self {
        Self::new(classes, GameSettings::from_cvars(cvars), import)
    }

    // ---- actor access ----

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(id)
    }

    pub fn actor_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.actors.get_mut(id)
    }

    pub fn is_alive(&self, id: ActorId) -> bool {
        self.actors.contains(id)
    }

    pub fn find_class(&self, name: &str) -> Option<ClassId> {
        self.classes.find(name)
    }

    pub fn class_name(&self, class: ClassId) -> &str {
        &self.classes.get(class).name
    }

    // ---- registry ----

    pub fn is_registered(&self, id: ActorId) -> bool {
        self.actors.slot(id).is_some_and(|s| s.linked)
    }

    pub fn registry_len(&self) -> usize {
        self.registry_len
    }

    pub fn registry_head(&self) -> Option<ActorId> {
        self.head
    }

    pub fn registry_next(&self, id: ActorId) -> Option<ActorId> {
        self.actors.slot(id).and_then(|s| s.next)
    }

    /// Live registry in link order.
    pub fn registered(&self) -> RegistryIter<'_> {
        RegistryIter {
            world: self,
            cursor: self.head,
        }
    }

    /// Append to the registry. No-op if already linked.
    pub fn link(&mut self, id: ActorId) {
        let tail = self.tail;
        match self.actors.slot_mut(id) {
            Some(slot) if !slot.linked => {
                slot.linked = true;
                slot.prev = tail;
                slot.next = None;
            }
            _ => return,
        }
        match tail {
            Some(t) => {
                if let Some(ts) = self.actors.slot_mut(t) {
                    ts.next = Some(id);
                }
            }
            None => self.head = Some(id),
        }
        self.tail = Some(id);
        self.registry_len += 1;
    }

    /// Remove from the registry. A registry walk in progress continues with
    /// the actor that followed `id`.
    pub fn unlink(&mut self, id: ActorId) {
        let (prev, next) = match self.actors.slot_mut(id) {
            Some(slot) if slot.linked => {
                slot.linked = false;
                let links = (slot.prev.take(), slot.next.take());
                links
            }
            _ => return,
        };
        match prev {
            Some(p) => {
                if let Some(ps) = self.actors.slot_mut(p) {
                    ps.next = next;
                }
            }
            None => self.head = next,
        }
        match next {
            Some(n) => {
                if let Some(ns) = self.actors.slot_mut(n) {
                    ns.prev = prev;
                }
            }
            None => self.tail = prev,
        }
        if self.walk_next == Some(id) {
            self.walk_next = next;
        }
        self.registry_len -= 1;
    }

    pub(crate) fn begin_walk(&mut self) -> Option<ActorId> {
        self.head
    }

    /// Remember where the walk continues before visiting `current`.
    pub(crate) fn set_walk_next(&mut self, current: ActorId) {
        self.walk_next = self.registry_next(current);
    }

    pub(crate) fn take_walk_next(&mut self) -> Option<ActorId> {
        self.walk_next.take()
    }

    // ---- deferred activation ----

    pub fn pending(&self) -> &[ActorId] {
        &self.pending
    }

    pub fn is_pending(&self, id: ActorId) -> bool {
        self.pending.contains(&id)
    }

    pub(crate) fn push_pending(&mut self, id: ActorId) {
        self.pending.push(id);
    }

    pub(crate) fn remove_pending(&mut self, id: ActorId) {
        self.pending.retain(|&p| p != id);
    }

    pub(crate) fn take_pending(&mut self) -> Vec<ActorId> {
        std::mem::take(&mut self.pending)
    }

    // ---- spawn ids ----

    pub(crate) fn assign_spawn_id(&mut self, id: ActorId) {
        let key = self.last_key;
        self.last_key = self.last_key.wrapping_add(1).max(1);
        if let Some(a) = self.actors.get_mut(id) {
            a.spawnid = key;
        }
        self.spawn_ids.insert(key, id);
    }

    pub(crate) fn release_spawn_id(&mut self, spawnid: u32) {
        if spawnid != 0 {
            self.spawn_ids.remove(&spawnid);
        }
    }

    pub(crate) fn index_spawn_id(&mut self, spawnid: u32, id: ActorId) {
        if spawnid != 0 {
            self.spawn_ids.insert(spawnid, id);
        }
    }

    pub fn actor_by_spawnid(&self, spawnid: u32) -> Option<ActorId> {
        self.spawn_ids.get(&spawnid).copied().filter(|&id| self.is_alive(id))
    }

    pub fn last_spawn_key(&self) -> u32 {
        self.last_key
    }

    // ---- sound ----

    pub fn play_sound_at(&self, id: ActorId, sound: &str) {
        if sound.is_empty() {
            return;
        }
        if let Some(a) = self.actor(id) {
            self.import.play_sound(sound, a.x, a.y);
        }
    }

    /// Drop every actor and all counters; used before loading a save.
    pub fn clear(&mut self) {
        self.actors.clear();
        self.head = None;
        self.tail = None;
        self.registry_len = 0;
        self.walk_next = None;
        self.pending.clear();
        self.spawn_ids.clear();
        self.last_key = 1;
        self.gamestate = GameState::default();
        self.hub.clear();
        for p in &mut self.players {
            *p = Player::default();
        }
        self.level_tics = 0;
    }
}

pub struct RegistryIter<'a> {
    world: &'a World,
    cursor: Option<ActorId>,
}

impl<'a> Iterator for RegistryIter<'a> {
    type Item = ActorId;

    fn next(&mut self) -> Option<ActorId> {
        let id = self.cursor?;
        self.cursor = self.world.registry_next(id);
        Some(id)
    }
}

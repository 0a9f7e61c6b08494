// classdef.rs — actor classes and the frame compiler
//
// A class bundles a default actor, read-only metadata (drop list, damage
// resistances, factions, position filters), behavior hooks and a slice of
// the global frame table. Classes are built once through `ClassTableBuilder`
// and shared read-only (behind an `Arc`) by every actor and every world.

use std::collections::HashMap;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use ecwolf_common::common::{com_error, ERR_FATAL};
use ecwolf_common::fixed::Fixed;

use crate::actor::{Actor, ActorFlags, ActorId};
use crate::dispatch::ActionTable;
use crate::filterpos::{FilterposThrust, FilterposWave, FilterposWrap};
use crate::frame::{sprite_id, ActionCall, ArgExpr, Frame, FrameId};
use crate::world::World;

/// Number of skill levels with their own spawn health.
pub const MAX_SKILLS: usize = 9;

/// Deepest replacement chain followed before giving up.
const MAX_REPLACEMENT_DEPTH: usize = 16;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InventoryKind {
    Generic,
    Ammo,
    Health,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClassKind {
    Actor,
    Inventory(InventoryKind),
    DamageType { no_extreme_death: bool, melee: bool },
}

impl ClassKind {
    pub fn is_inventory(&self) -> bool {
        matches!(self, ClassKind::Inventory(_))
    }
}

// ============================================================
// Behavior hooks
// ============================================================

pub type BeginPlayFn = fn(world: &mut World, actor: ActorId);
pub type TouchFn = fn(world: &mut World, actor: ActorId, toucher: ActorId);
pub type ActivateFn = fn(world: &mut World, actor: ActorId, activator: Option<ActorId>);
pub type TryPickupFn = fn(world: &mut World, item: ActorId, toucher: ActorId) -> bool;

/// Per-class overrides, resolved when the class is built. Unset hooks use
/// the engine default for the class kind.
#[derive(Clone, Copy, Default)]
pub struct ClassHooks {
    pub begin_play: Option<BeginPlayFn>,
    pub post_begin_play: Option<BeginPlayFn>,
    pub touch: Option<TouchFn>,
    pub activate: Option<ActivateFn>,
    pub deactivate: Option<ActivateFn>,
    pub try_pickup: Option<TryPickupFn>,
}

impl fmt::Debug for ClassHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassHooks")
            .field("begin_play", &self.begin_play.is_some())
            .field("post_begin_play", &self.post_begin_play.is_some())
            .field("touch", &self.touch.is_some())
            .field("activate", &self.activate.is_some())
            .field("deactivate", &self.deactivate.is_some())
            .field("try_pickup", &self.try_pickup.is_some())
            .finish()
    }
}

// ============================================================
// Metadata
// ============================================================

#[derive(Clone, Debug, PartialEq)]
pub struct DropItem {
    pub class_name: String,
    /// Dropped when a 0..=255 roll is at most this.
    pub probability: u8,
    /// Explicit amount; 0 keeps the item's own (ammo is halved).
    pub amount: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DamageResistance {
    pub damage_type: ClassId,
    /// Percent of incoming damage absorbed.
    pub percent: i32,
}

#[derive(Clone, Debug, Default)]
pub struct ClassMeta {
    pub skill_health: [Option<i32>; MAX_SKILLS],
    pub gib_health: Option<i32>,
    pub damage: Option<ArgExpr>,
    pub drop_items: Vec<DropItem>,
    pub damage_resistances: Vec<DamageResistance>,
    pub enemy_factions: Vec<ClassId>,
    pub filterpos_wraps: Vec<FilterposWrap>,
    pub filterpos_thrusts: Vec<FilterposThrust>,
    pub filterpos_waves: Vec<FilterposWave>,
    pub secret_death_sound: Option<String>,
    pub obituary: Option<String>,
    pub hit_obituary: Option<String>,
    pub info_message: Option<String>,
}

#[derive(Clone, Debug)]
pub struct ClassDef {
    pub id: ClassId,
    pub name: String,
    pub parent: Option<ClassId>,
    pub kind: ClassKind,
    pub default_actor: Actor,
    pub meta: ClassMeta,
    pub hooks: ClassHooks,
    pub replacement: Option<ClassId>,
    /// Chance out of 256 that the replacement is used; 0 means always.
    pub replacement_prob: u8,
    /// Frames declared by this class.
    pub frames: Range<usize>,
    /// Lower-cased label -> entry frame. `None` marks an explicit `stop`.
    states: HashMap<String, Option<FrameId>>,
}

impl ClassDef {
    pub fn is_state_owner(&self, frame: FrameId) -> bool {
        self.frames.contains(&frame.0)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.states.keys().map(|s| s.as_str())
    }
}

// ============================================================
// Class table
// ============================================================

#[derive(Debug)]
pub struct ClassTable {
    classes: Vec<ClassDef>,
    by_name: HashMap<String, ClassId>,
    frames: Vec<Frame>,
    actions: Arc<ActionTable>,
}

impl ClassTable {
    pub fn builder(actions: Arc<ActionTable>) -> ClassTableBuilder {
        ClassTableBuilder::new(actions)
    }

    pub fn get(&self, id: ClassId) -> &ClassDef {
        &self.classes[id.0]
    }

    pub fn find(&self, name: &str) -> Option<ClassId> {
        self.by_name.get(&name.to_ascii_lowercase()).copied()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClassDef> {
        self.classes.iter()
    }

    pub fn actions(&self) -> &ActionTable {
        &self.actions
    }

    pub fn frame(&self, id: FrameId) -> &Frame {
        &self.frames[id.0]
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Entry frame for `label` ("Spawn", "Death_Fire", ...) on `class`.
    pub fn find_state(&self, class: ClassId, label: &str) -> Option<FrameId> {
        self.get(class)
            .states
            .get(&label.to_ascii_lowercase())
            .copied()
            .flatten()
    }

    /// The `index`th frame declared by `class`.
    pub fn state_at(&self, class: ClassId, index: u32) -> Option<FrameId> {
        let range = &self.get(class).frames;
        let global = range.start + index as usize;
        if range.contains(&global) {
            Some(FrameId(global))
        } else {
            None
        }
    }

    pub fn owner_of(&self, frame: FrameId) -> ClassId {
        self.frame(frame).owner
    }

    pub fn is_state_owner(&self, class: ClassId, frame: FrameId) -> bool {
        self.get(class).is_state_owner(frame)
    }

    /// Follow the replacement chain from `class`.
    pub fn get_replacement(&self, class: ClassId) -> ClassId {
        let mut cls = class;
        for _ in 0..MAX_REPLACEMENT_DEPTH {
            match self.get(cls).replacement {
                Some(r) if r != cls => cls = r,
                _ => return cls,
            }
        }
        cls
    }

    pub fn is_descendant_of(&self, class: ClassId, ancestor: ClassId) -> bool {
        let mut cls = Some(class);
        while let Some(c) = cls {
            if c == ancestor {
                return true;
            }
            cls = self.get(c).parent;
        }
        false
    }
}

// ============================================================
// Class builder
// ============================================================

/// How the last frame of a state sequence continues.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SequenceEnd {
    /// Fall through to the next declared frame.
    Next,
    /// Destroy the actor.
    Stop,
    /// Back to the first frame of the sequence.
    Loop,
    /// Stay on the last frame.
    Wait,
    /// Jump to a label plus an offset. `Super::Label` resolves on the parent.
    Goto(String, u32),
}

#[derive(Clone, Debug)]
pub struct FrameDef {
    pub sprite: String,
    pub frame: char,
    pub duration: i32,
    pub rand_duration: i32,
    pub fullbright: bool,
    pub action: Option<(String, Vec<ArgExpr>)>,
    pub thinker: Option<(String, Vec<ArgExpr>)>,
}

impl FrameDef {
    pub fn new(sprite: &str, frame: char, duration: i32) -> Self {
        Self {
            sprite: sprite.to_string(),
            frame,
            duration,
            rand_duration: 0,
            fullbright: false,
            action: None,
            thinker: None,
        }
    }

    /// Adds 0..=extra random tics.
    pub fn random(mut self, extra: i32) -> Self {
        self.rand_duration = extra;
        self
    }

    pub fn bright(mut self) -> Self {
        self.fullbright = true;
        self
    }

    pub fn action(mut self, name: &str, args: Vec<ArgExpr>) -> Self {
        self.action = Some((name.to_string(), args));
        self
    }

    pub fn thinker(mut self, name: &str, args: Vec<ArgExpr>) -> Self {
        self.thinker = Some((name.to_string(), args));
        self
    }
}

struct Sequence {
    label: String,
    frames: Vec<FrameDef>,
    end: SequenceEnd,
}

type ActorEdit = Box<dyn FnOnce(&mut Actor)>;
type MetaEdit = Box<dyn FnOnce(&mut ClassMeta)>;

/// Declarative description of one class. Anything not set is inherited from
/// the parent.
pub struct ClassBuilder {
    name: String,
    parent: Option<String>,
    kind: Option<ClassKind>,
    actor_edits: Vec<ActorEdit>,
    meta_edits: Vec<MetaEdit>,
    drop_items: Option<Vec<DropItem>>,
    resistances: Option<Vec<(String, i32)>>,
    factions: Option<Vec<String>>,
    faction: Option<String>,
    hooks: ClassHooks,
    replaces: Option<(String, u8)>,
    sequences: Vec<Sequence>,
}

impl ClassBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            parent: None,
            kind: None,
            actor_edits: Vec::new(),
            meta_edits: Vec::new(),
            drop_items: None,
            resistances: None,
            factions: None,
            faction: None,
            hooks: ClassHooks::default(),
            replaces: None,
            sequences: Vec::new(),
        }
    }

    pub fn parent(mut self, name: &str) -> Self {
        self.parent = Some(name.to_string());
        self
    }

    /// Arbitrary edit of the default actor.
    pub fn defaults(mut self, edit: impl FnOnce(&mut Actor) + 'static) -> Self {
        self.actor_edits.push(Box::new(edit));
        self
    }

    /// Arbitrary edit of the metadata.
    pub fn meta(mut self, edit: impl FnOnce(&mut ClassMeta) + 'static) -> Self {
        self.meta_edits.push(Box::new(edit));
        self
    }

    pub fn health(self, health: i32) -> Self {
        self.defaults(move |a| a.health = health)
    }

    pub fn flags(self, flags: ActorFlags) -> Self {
        self.defaults(move |a| a.flags.insert(flags))
    }

    pub fn clear_flags(self, flags: ActorFlags) -> Self {
        self.defaults(move |a| a.flags.remove(flags))
    }

    pub fn speed(self, speed: Fixed) -> Self {
        self.defaults(move |a| a.speed = speed)
    }

    pub fn radius(self, radius: Fixed) -> Self {
        self.defaults(move |a| a.radius = radius)
    }

    pub fn points(self, points: i32) -> Self {
        self.defaults(move |a| a.points = points)
    }

    pub fn painchance(self, chance: i32) -> Self {
        self.defaults(move |a| a.painchance = chance)
    }

    pub fn see_sound(self, sound: &str) -> Self {
        let sound = sound.to_string();
        self.defaults(move |a| a.sounds.see = sound)
    }

    pub fn death_sound(self, sound: &str) -> Self {
        let sound = sound.to_string();
        self.defaults(move |a| a.sounds.death = sound)
    }

    pub fn pain_sound(self, sound: &str) -> Self {
        let sound = sound.to_string();
        self.defaults(move |a| a.sounds.pain = sound)
    }

    pub fn pickup_sound(self, sound: &str) -> Self {
        let sound = sound.to_string();
        self.defaults(move |a| a.sounds.pickup = sound)
    }

    pub fn amount(self, amount: i32, max_amount: i32) -> Self {
        self.defaults(move |a| {
            a.inv.amount = amount;
            a.inv.max_amount = max_amount;
        })
    }

    pub fn single_spawn(self) -> Self {
        self.defaults(|a| a.single_spawn = true)
    }

    pub fn skill_health(self, health: [i32; MAX_SKILLS]) -> Self {
        self.meta(move |m| m.skill_health = health.map(Some))
    }

    pub fn gib_health(self, gib: i32) -> Self {
        self.meta(move |m| m.gib_health = Some(gib))
    }

    pub fn damage(self, expr: ArgExpr) -> Self {
        self.meta(move |m| m.damage = Some(expr))
    }

    pub fn obituary(self, text: &str) -> Self {
        let text = text.to_string();
        self.meta(move |m| m.obituary = Some(text))
    }

    pub fn hit_obituary(self, text: &str) -> Self {
        let text = text.to_string();
        self.meta(move |m| m.hit_obituary = Some(text))
    }

    pub fn secret_death_sound(self, sound: &str) -> Self {
        let sound = sound.to_string();
        self.meta(move |m| m.secret_death_sound = Some(sound))
    }

    pub fn info_message(self, text: &str) -> Self {
        let text = text.to_string();
        self.meta(move |m| m.info_message = Some(text))
    }

    pub fn filterpos_wrap(self, wrap: FilterposWrap) -> Self {
        self.meta(move |m| m.filterpos_wraps.push(wrap))
    }

    pub fn filterpos_thrust(self, thrust: FilterposThrust) -> Self {
        self.meta(move |m| m.filterpos_thrusts.push(thrust))
    }

    pub fn filterpos_wave(self, wave: FilterposWave) -> Self {
        self.meta(move |m| m.filterpos_waves.push(wave))
    }

    /// Appends to this class's drop list. The first call discards the
    /// inherited list.
    pub fn drop_item(mut self, class_name: &str, probability: u8, amount: i32) -> Self {
        self.drop_items.get_or_insert_with(Vec::new).push(DropItem {
            class_name: class_name.to_string(),
            probability,
            amount,
        });
        self
    }

    pub fn damage_resistance(mut self, damage_type: &str, percent: i32) -> Self {
        self.resistances
            .get_or_insert_with(Vec::new)
            .push((damage_type.to_string(), percent));
        self
    }

    pub fn enemy_faction(mut self, faction: &str) -> Self {
        self.factions.get_or_insert_with(Vec::new).push(faction.to_string());
        self
    }

    /// The faction class instances of this class belong to.
    pub fn faction(mut self, faction: &str) -> Self {
        self.faction = Some(faction.to_string());
        self
    }

    pub fn damage_type(mut self, no_extreme_death: bool, melee: bool) -> Self {
        self.kind = Some(ClassKind::DamageType { no_extreme_death, melee });
        self
    }

    pub fn hooks(mut self, hooks: ClassHooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn begin_play(mut self, hook: BeginPlayFn) -> Self {
        self.hooks.begin_play = Some(hook);
        self
    }

    pub fn post_begin_play(mut self, hook: BeginPlayFn) -> Self {
        self.hooks.post_begin_play = Some(hook);
        self
    }

    pub fn touch(mut self, hook: TouchFn) -> Self {
        self.hooks.touch = Some(hook);
        self
    }

    pub fn activate(mut self, hook: ActivateFn) -> Self {
        self.hooks.activate = Some(hook);
        self
    }

    pub fn deactivate(mut self, hook: ActivateFn) -> Self {
        self.hooks.deactivate = Some(hook);
        self
    }

    pub fn try_pickup(mut self, hook: TryPickupFn) -> Self {
        self.hooks.try_pickup = Some(hook);
        self
    }

    /// This class stands in for `original` when it spawns with replacement
    /// allowed. `probability` out of 256; 0 means always.
    pub fn replaces(mut self, original: &str, probability: u8) -> Self {
        self.replaces = Some((original.to_string(), probability));
        self
    }

    /// Declare a labelled frame sequence. An empty `frames` with
    /// `SequenceEnd::Goto` aliases the label; with `Stop` it clears it.
    pub fn state(mut self, label: &str, frames: Vec<FrameDef>, end: SequenceEnd) -> Self {
        self.sequences.push(Sequence {
            label: label.to_string(),
            frames,
            end,
        });
        self
    }
}

// ============================================================
// Table builder
// ============================================================

pub struct ClassTableBuilder {
    table: ClassTable,
}

pub const NATIVE_ACTOR: ClassId = ClassId(0);
pub const NATIVE_INVENTORY: ClassId = ClassId(1);
pub const NATIVE_AMMO: ClassId = ClassId(2);
pub const NATIVE_HEALTH: ClassId = ClassId(3);
pub const NATIVE_DAMAGE_TYPE: ClassId = ClassId(4);

impl ClassTableBuilder {
    fn new(actions: Arc<ActionTable>) -> Self {
        let mut b = Self {
            table: ClassTable {
                classes: Vec::new(),
                by_name: HashMap::new(),
                frames: Vec::new(),
                actions,
            },
        };
        b.add(ClassBuilder::new("Actor"));
        b.add(
            ClassBuilder::new("Inventory")
                .parent("Actor")
                .amount(1, 1),
        );
        b.add(ClassBuilder::new("Ammo").parent("Inventory"));
        b.add(ClassBuilder::new("Health").parent("Inventory").amount(1, 0));
        b.add(ClassBuilder::new("DamageType").damage_type(false, false));
        b.table.classes[NATIVE_INVENTORY.0].kind = ClassKind::Inventory(InventoryKind::Generic);
        b.table.classes[NATIVE_AMMO.0].kind = ClassKind::Inventory(InventoryKind::Ammo);
        b.table.classes[NATIVE_HEALTH.0].kind = ClassKind::Inventory(InventoryKind::Health);
        b
    }

    fn lookup(&self, name: &str, what: &str, class: &str) -> ClassId {
        match self.table.find(name) {
            Some(id) => id,
            None => {
                com_error(
                    ERR_FATAL,
                    &format!("{}: unknown {} class '{}'", class, what, name),
                );
                unreachable!()
            }
        }
    }

    fn resolve_call(&self, call: &Option<(String, Vec<ArgExpr>)>) -> ActionCall {
        match call {
            Some((name, args)) => {
                let id = self.table.actions.resolve(name, args.len());
                ActionCall::bind(id, args.clone())
            }
            None => ActionCall::none(),
        }
    }

    fn resolve_goto(
        &self,
        class: &str,
        parent: Option<ClassId>,
        states: &HashMap<String, Option<FrameId>>,
        label: &str,
        offset: u32,
    ) -> Option<FrameId> {
        let base = match label.strip_prefix("Super::").or_else(|| label.strip_prefix("super::")) {
            Some(rest) => match parent {
                Some(p) => self.table.find_state(p, rest),
                None => None,
            },
            None => states.get(&label.to_ascii_lowercase()).copied().flatten(),
        };
        let Some(base) = base else {
            com_error(ERR_FATAL, &format!("{}: goto unknown label {}", class, label));
            unreachable!()
        };
        let target = base.0 + offset as usize;
        let owner = self.table.frames[base.0].owner;
        if !self.table.get(owner).frames.contains(&target) {
            com_error(ERR_FATAL, &format!("{}: goto {}+{} is out of range", class, label, offset));
        }
        Some(FrameId(target))
    }

    /// Compile and register a class. Content errors are fatal.
    pub fn add(&mut self, b: ClassBuilder) -> ClassId {
        let key = b.name.to_ascii_lowercase();
        if self.table.by_name.contains_key(&key) {
            com_error(ERR_FATAL, &format!("Class {} is defined twice", b.name));
        }
        let id = ClassId(self.table.classes.len());

        let parent = b.parent.as_deref().map(|p| self.lookup(p, "parent", &b.name));
        let (mut default_actor, mut meta, mut hooks, mut kind, mut states) = match parent {
            Some(p) => {
                let pc = self.table.get(p);
                (pc.default_actor.clone(), pc.meta.clone(), pc.hooks, pc.kind, pc.states.clone())
            }
            None => (Actor::default(), ClassMeta::default(), ClassHooks::default(), ClassKind::Actor, HashMap::new()),
        };

        if let Some(k) = b.kind {
            kind = k;
        }
        default_actor.class = id;
        for edit in b.actor_edits {
            edit(&mut default_actor);
        }
        for edit in b.meta_edits {
            edit(&mut meta);
        }
        if let Some(drops) = b.drop_items {
            meta.drop_items = drops;
        }
        if let Some(res) = b.resistances {
            meta.damage_resistances = res
                .iter()
                .map(|(name, percent)| DamageResistance {
                    damage_type: self.lookup(name, "damage type", &b.name),
                    percent: *percent,
                })
                .collect();
        }
        if let Some(factions) = b.factions {
            meta.enemy_factions = factions
                .iter()
                .map(|name| self.lookup(name, "faction", &b.name))
                .collect();
        }
        if let Some(faction) = &b.faction {
            default_actor.faction = Some(self.lookup(faction, "faction", &b.name));
        }

        macro_rules! set_hook {
            ($field:ident) => {
                if b.hooks.$field.is_some() {
                    hooks.$field = b.hooks.$field;
                }
            };
        }
        set_hook!(begin_play);
        set_hook!(post_begin_play);
        set_hook!(touch);
        set_hook!(activate);
        set_hook!(deactivate);
        set_hook!(try_pickup);

        // Lay out this class's frames contiguously and record label entries.
        let start = self.table.frames.len();
        let mut entries = Vec::with_capacity(b.sequences.len());
        let mut cursor = start;
        for seq in &b.sequences {
            entries.push(cursor);
            let key = seq.label.to_ascii_lowercase();
            if seq.frames.is_empty() {
                if seq.end == SequenceEnd::Stop {
                    states.insert(key, None);
                }
                continue;
            }
            states.insert(key, Some(FrameId(cursor)));
            cursor += seq.frames.len();
        }
        let end = cursor;

        // Provisionally register so gotos can see this class's own frames.
        self.table.by_name.insert(key.clone(), id);
        self.table.classes.push(ClassDef {
            id,
            name: b.name.clone(),
            parent,
            kind,
            default_actor,
            meta,
            hooks,
            replacement: None,
            replacement_prob: 0,
            frames: start..end,
            states: HashMap::new(),
        });

        let mut local = 0u32;
        for (si, seq) in b.sequences.iter().enumerate() {
            let first = entries[si];
            for (fi, def) in seq.frames.iter().enumerate() {
                let global = first + fi;
                // next pointers are fixed up below
                self.table.frames.push(Frame {
                    owner: id,
                    index: local,
                    sprite: sprite_id(&def.sprite),
                    frame: (def.frame as u8).wrapping_sub(b'A'),
                    fullbright: def.fullbright,
                    duration: def.duration,
                    rand_duration: def.rand_duration,
                    action: self.resolve_call(&def.action),
                    thinker: self.resolve_call(&def.thinker),
                    next: Some(FrameId(global + 1)),
                });
                local += 1;
            }
        }

        // Goto labels on empty sequences alias another state.
        for seq in &b.sequences {
            if let (true, SequenceEnd::Goto(label, offset)) = (seq.frames.is_empty(), &seq.end) {
                let target = self.resolve_goto(&b.name, parent, &states, label, *offset);
                states.insert(seq.label.to_ascii_lowercase(), target);
            }
        }

        for (si, seq) in b.sequences.iter().enumerate() {
            if seq.frames.is_empty() {
                continue;
            }
            let first = entries[si];
            let last = first + seq.frames.len() - 1;
            let next = match &seq.end {
                SequenceEnd::Next => {
                    if last + 1 < end {
                        Some(FrameId(last + 1))
                    } else {
                        None
                    }
                }
                SequenceEnd::Stop => None,
                SequenceEnd::Loop => Some(FrameId(first)),
                SequenceEnd::Wait => Some(FrameId(last)),
                SequenceEnd::Goto(label, offset) => {
                    self.resolve_goto(&b.name, parent, &states, label, *offset)
                }
            };
            self.table.frames[last].next = next;
        }

        self.table.classes[id.0].states = states;

        if let Some((original, prob)) = &b.replaces {
            let orig = self.lookup(original, "replaced", &b.name);
            let oc = &mut self.table.classes[orig.0];
            oc.replacement = Some(id);
            oc.replacement_prob = *prob;
        }

        id
    }

    pub fn find(&self, name: &str) -> Option<ClassId> {
        self.table.find(name)
    }

    pub fn build(self) -> ClassTable {
        self.table
    }
}

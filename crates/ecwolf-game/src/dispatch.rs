// dispatch.rs — action function table
//
// Frames refer to action functions by `ActionId`, an index into the table
// below. Storing indices rather than closures keeps frames plain data that
// can be shared by every actor and compared in tests.

use std::collections::HashMap;
use std::fmt;

use ecwolf_common::common::{com_error, ERR_FATAL};
use ecwolf_common::fixed::{angle_to_fine, fine_cosine, fine_sine, fixed_mul};

use crate::actor::{ActorFlags, ActorId};
use crate::combat::die;
use crate::frame::{ActionArgs, FrameId};
use crate::inventory::{find_inventory, give_inventory, remove_inventory};
use crate::spawn::{destroy, spawn, SpawnFlags};
use crate::state::set_state;
use crate::world::World;

// ============================================================
// Type aliases for callback signatures
// ============================================================

/// `(world, self, state owner, calling frame, evaluated args) -> had effect`
pub type ActionFn = fn(world: &mut World, actor: ActorId, state_owner: ActorId, caller: FrameId, args: &ActionArgs) -> bool;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ActionId(pub usize);

// ============================================================
// Named constants — built-in actions
// ============================================================

pub const A_SETTICS: ActionId = ActionId(0);
pub const A_SETTEMP1: ActionId = ActionId(1);
pub const A_FALL: ActionId = ActionId(2);
pub const A_PLAYSOUND: ActionId = ActionId(3);
pub const A_SCREAM: ActionId = ActionId(4);
pub const A_PAIN: ActionId = ActionId(5);
pub const A_GIVEINVENTORY: ActionId = ActionId(6);
pub const A_TAKEINVENTORY: ActionId = ActionId(7);
pub const A_SPAWNITEM: ActionId = ActionId(8);
pub const A_STOP: ActionId = ActionId(9);
pub const A_LOG: ActionId = ActionId(10);
pub const A_JUMP: ActionId = ActionId(11);
pub const A_DIE: ActionId = ActionId(12);
pub const A_CHANGEVELOCITY: ActionId = ActionId(13);

pub const BUILTIN_ACTION_COUNT: usize = 14;

/// (name, function, minimum args, maximum args)
static BUILTIN_ACTIONS: [(&str, ActionFn, usize, usize); BUILTIN_ACTION_COUNT] = [
    ("A_SetTics", a_settics, 1, 1),
    ("A_SetTemp1", a_settemp1, 1, 1),
    ("A_Fall", a_fall, 0, 0),
    ("A_PlaySound", a_playsound, 1, 1),
    ("A_Scream", a_scream, 0, 0),
    ("A_Pain", a_pain, 0, 0),
    ("A_GiveInventory", a_giveinventory, 1, 2),
    ("A_TakeInventory", a_takeinventory, 1, 1),
    ("A_SpawnItem", a_spawnitem, 1, 2),
    ("A_Stop", a_stop, 0, 0),
    ("A_Log", a_log, 1, 1),
    ("A_Jump", a_jump, 2, 2),
    ("A_Die", a_die, 0, 0),
    ("A_ChangeVelocity", a_changevelocity, 2, 2),
];

#[derive(Clone)]
pub struct ActionDef {
    pub name: String,
    pub func: ActionFn,
    pub min_args: usize,
    pub max_args: usize,
}

impl fmt::Debug for ActionDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionDef")
            .field("name", &self.name)
            .field("min_args", &self.min_args)
            .field("max_args", &self.max_args)
            .finish()
    }
}

/// Action functions by id, with case-insensitive name lookup.
#[derive(Clone, Debug, Default)]
pub struct ActionTable {
    defs: Vec<ActionDef>,
    index: HashMap<String, ActionId>,
}

impl ActionTable {
    /// A table holding only the built-in actions, at their `A_*` ids.
    pub fn with_builtins() -> Self {
        let mut table = Self::default();
        for &(name, func, min_args, max_args) in BUILTIN_ACTIONS.iter() {
            table.register(name, func, min_args, max_args);
        }
        table
    }

    /// Add an action. Re-registering a name replaces the function in place.
    pub fn register(&mut self, name: &str, func: ActionFn, min_args: usize, max_args: usize) -> ActionId {
        let key = name.to_ascii_lowercase();
        if let Some(&id) = self.index.get(&key) {
            self.defs[id.0] = ActionDef { name: name.to_string(), func, min_args, max_args };
            return id;
        }
        let id = ActionId(self.defs.len());
        self.defs.push(ActionDef { name: name.to_string(), func, min_args, max_args });
        self.index.insert(key, id);
        id
    }

    pub fn find(&self, name: &str) -> Option<ActionId> {
        self.index.get(&name.to_ascii_lowercase()).copied()
    }

    pub fn def(&self, id: ActionId) -> &ActionDef {
        &self.defs[id.0]
    }

    pub fn func(&self, id: ActionId) -> ActionFn {
        self.defs[id.0].func
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Resolve a name and check the argument count. Unknown names and bad
    /// counts are content errors.
    pub fn resolve(&self, name: &str, argc: usize) -> ActionId {
        let Some(id) = self.find(name) else {
            com_error(ERR_FATAL, &format!("Unknown action function {}", name));
            unreachable!();
        };
        let def = self.def(id);
        if argc < def.min_args || argc > def.max_args {
            com_error(
                ERR_FATAL,
                &format!(
                    "{} takes {}..{} arguments, got {}",
                    def.name, def.min_args, def.max_args, argc
                ),
            );
        }
        id
    }
}

// ============================================================
// Built-in actions
// ============================================================

fn a_settics(world: &mut World, actor: ActorId, _owner: ActorId, _caller: FrameId, args: &ActionArgs) -> bool {
    match world.actor_mut(actor) {
        Some(a) => {
            a.ticcount = args.int(0);
            true
        }
        None => false,
    }
}

fn a_settemp1(world: &mut World, actor: ActorId, _owner: ActorId, _caller: FrameId, args: &ActionArgs) -> bool {
    match world.actor_mut(actor) {
        Some(a) => {
            a.temp1 = args.int(0);
            true
        }
        None => false,
    }
}

fn a_fall(world: &mut World, actor: ActorId, _owner: ActorId, _caller: FrameId, _args: &ActionArgs) -> bool {
    match world.actor_mut(actor) {
        Some(a) => {
            a.flags.remove(ActorFlags::SOLID);
            true
        }
        None => false,
    }
}

fn a_playsound(world: &mut World, actor: ActorId, _owner: ActorId, _caller: FrameId, args: &ActionArgs) -> bool {
    world.play_sound_at(actor, args.string(0));
    true
}

fn a_scream(world: &mut World, actor: ActorId, _owner: ActorId, _caller: FrameId, _args: &ActionArgs) -> bool {
    let sound = match world.actor(actor) {
        Some(a) => a.sounds.death.clone(),
        None => return false,
    };
    world.play_sound_at(actor, &sound);
    true
}

fn a_pain(world: &mut World, actor: ActorId, _owner: ActorId, _caller: FrameId, _args: &ActionArgs) -> bool {
    let sound = match world.actor(actor) {
        Some(a) => a.sounds.pain.clone(),
        None => return false,
    };
    world.play_sound_at(actor, &sound);
    true
}

fn a_giveinventory(world: &mut World, actor: ActorId, _owner: ActorId, _caller: FrameId, args: &ActionArgs) -> bool {
    match world.find_class(args.string(0)) {
        Some(cls) => give_inventory(world, actor, cls, args.int(1), true),
        None => false,
    }
}

fn a_takeinventory(world: &mut World, actor: ActorId, _owner: ActorId, _caller: FrameId, args: &ActionArgs) -> bool {
    let Some(cls) = world.find_class(args.string(0)) else {
        return false;
    };
    match find_inventory(world, actor, cls) {
        Some(item) => {
            remove_inventory(world, actor, item);
            destroy(world, item);
            true
        }
        None => false,
    }
}

fn a_spawnitem(world: &mut World, actor: ActorId, _owner: ActorId, _caller: FrameId, args: &ActionArgs) -> bool {
    let Some(cls) = world.find_class(args.string(0)) else {
        return false;
    };
    let (x, y, z, angle) = match world.actor(actor) {
        Some(a) => (a.x, a.y, a.z, a.angle),
        None => return false,
    };
    let distance = args.int(1);
    let fine = angle_to_fine(angle);
    let sx = x + fixed_mul(distance, fine_cosine(fine));
    let sy = y - fixed_mul(distance, fine_sine(fine));
    match spawn(world, Some(cls), sx, sy, z, SpawnFlags::ALLOW_REPLACEMENT) {
        Some(item) => {
            if let Some(a) = world.actor_mut(item) {
                a.angle = angle;
            }
            true
        }
        None => false,
    }
}

fn a_stop(world: &mut World, actor: ActorId, _owner: ActorId, _caller: FrameId, _args: &ActionArgs) -> bool {
    match world.actor_mut(actor) {
        Some(a) => {
            a.velx = 0;
            a.vely = 0;
            true
        }
        None => false,
    }
}

fn a_log(world: &mut World, _actor: ActorId, _owner: ActorId, _caller: FrameId, args: &ActionArgs) -> bool {
    world.import.post_message(args.string(0));
    true
}

fn a_jump(world: &mut World, actor: ActorId, _owner: ActorId, _caller: FrameId, args: &ActionArgs) -> bool {
    let Some(class) = world.actor(actor).map(|a| a.class) else {
        return false;
    };
    if (world.rng.jump.gen_byte() as i32) < args.int(0) {
        let target = world.classes.find_state(class, args.string(1));
        if target.is_some() {
            set_state(world, actor, target, false);
            return true;
        }
    }
    false
}

fn a_die(world: &mut World, actor: ActorId, _owner: ActorId, _caller: FrameId, _args: &ActionArgs) -> bool {
    match world.actor_mut(actor) {
        Some(a) => {
            if a.health > 0 {
                a.health = 0;
            }
        }
        None => return false,
    }
    die(world, actor);
    true
}

fn a_changevelocity(world: &mut World, actor: ActorId, _owner: ActorId, _caller: FrameId, args: &ActionArgs) -> bool {
    match world.actor_mut(actor) {
        Some(a) => {
            a.velx = args.int(0);
            a.vely = args.int(1);
            true
        }
        None => false,
    }
}

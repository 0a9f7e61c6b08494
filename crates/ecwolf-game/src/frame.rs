// frame.rs — compiled actor states and their action bindings
//
// A frame is one step of an actor's behavior program. Frames are compiled
// once into the class table and never change afterwards; actors only hold a
// `FrameId` into that table.

use std::sync::Arc;

use ecwolf_common::random::RandomStream;

use crate::actor::{Actor, ActorId};
use crate::classdef::ClassId;
use crate::dispatch::ActionId;
use crate::world::World;

/// Index of a frame in the global frame table. Frames of one class are
/// contiguous, so `FrameId(n + 1)` directly follows `FrameId(n)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(pub usize);

impl FrameId {
    #[inline]
    pub fn following(self) -> FrameId {
        FrameId(self.0 + 1)
    }
}

/// Pack a sprite name ("SOLD", "TROO") into an id. Names longer than four
/// bytes are truncated.
pub fn sprite_id(name: &str) -> u32 {
    let mut b = [0u8; 4];
    for (dst, src) in b.iter_mut().zip(name.bytes()) {
        *dst = src.to_ascii_uppercase();
    }
    u32::from_le_bytes(b)
}

#[derive(Clone, Debug)]
pub struct Frame {
    /// Class that declared this frame.
    pub owner: ClassId,
    /// Position inside the owner's frame list.
    pub index: u32,
    pub sprite: u32,
    pub frame: u8,
    pub fullbright: bool,
    /// Tics to stay in this frame. Negative means forever.
    pub duration: i32,
    /// Upper bound of random extra tics; 0 for none.
    pub rand_duration: i32,
    /// Runs once when the frame is entered.
    pub action: ActionCall,
    /// Runs every tic while the frame is current.
    pub thinker: ActionCall,
    /// `None` destroys the actor on arrival.
    pub next: Option<FrameId>,
}

impl Frame {
    pub fn get_tics(&self, rng: &mut RandomStream) -> i32 {
        if self.rand_duration > 0 {
            return self.duration + rng.gen_mod(self.rand_duration as u32 + 1) as i32;
        }
        self.duration
    }
}

// ============================================================
// Argument expressions
// ============================================================

/// An action argument, evaluated against the calling actor every time the
/// action runs. One compiled frame serves every instance of a class.
#[derive(Clone, Debug, PartialEq)]
pub enum ArgExpr {
    Int(i32),
    Str(Arc<str>),
    Health,
    Angle,
    Temp1,
    TicCount,
    Distance,
    Speed,
    Neg(Box<ArgExpr>),
    Add(Box<ArgExpr>, Box<ArgExpr>),
    Sub(Box<ArgExpr>, Box<ArgExpr>),
    Mul(Box<ArgExpr>, Box<ArgExpr>),
    /// Integer division; divide by zero yields 0.
    Div(Box<ArgExpr>, Box<ArgExpr>),
}

#[derive(Clone, Debug, PartialEq)]
pub enum ArgValue {
    Int(i32),
    Str(Arc<str>),
}

impl ArgExpr {
    pub fn str(s: &str) -> ArgExpr {
        ArgExpr::Str(Arc::from(s))
    }

    pub fn add(a: ArgExpr, b: ArgExpr) -> ArgExpr {
        ArgExpr::Add(Box::new(a), Box::new(b))
    }

    pub fn sub(a: ArgExpr, b: ArgExpr) -> ArgExpr {
        ArgExpr::Sub(Box::new(a), Box::new(b))
    }

    pub fn mul(a: ArgExpr, b: ArgExpr) -> ArgExpr {
        ArgExpr::Mul(Box::new(a), Box::new(b))
    }

    pub fn div(a: ArgExpr, b: ArgExpr) -> ArgExpr {
        ArgExpr::Div(Box::new(a), Box::new(b))
    }

    pub fn eval(&self, actor: &Actor) -> ArgValue {
        match self {
            ArgExpr::Str(s) => ArgValue::Str(Arc::clone(s)),
            other => ArgValue::Int(other.eval_int(actor)),
        }
    }

    pub fn eval_int(&self, actor: &Actor) -> i32 {
        match self {
            ArgExpr::Int(v) => *v,
            ArgExpr::Str(s) => s.trim().parse().unwrap_or(0),
            ArgExpr::Health => actor.health,
            ArgExpr::Angle => actor.angle as i32,
            ArgExpr::Temp1 => actor.temp1,
            ArgExpr::TicCount => actor.ticcount,
            ArgExpr::Distance => actor.distance,
            ArgExpr::Speed => actor.speed,
            ArgExpr::Neg(a) => a.eval_int(actor).wrapping_neg(),
            ArgExpr::Add(a, b) => a.eval_int(actor).wrapping_add(b.eval_int(actor)),
            ArgExpr::Sub(a, b) => a.eval_int(actor).wrapping_sub(b.eval_int(actor)),
            ArgExpr::Mul(a, b) => a.eval_int(actor).wrapping_mul(b.eval_int(actor)),
            ArgExpr::Div(a, b) => {
                let d = b.eval_int(actor);
                if d == 0 {
                    0
                } else {
                    a.eval_int(actor).wrapping_div(d)
                }
            }
        }
    }
}

/// Evaluated arguments handed to an action function.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ActionArgs(pub Vec<ArgValue>);

impl ActionArgs {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Integer argument `i`, or 0 when absent.
    pub fn int(&self, i: usize) -> i32 {
        match self.0.get(i) {
            Some(ArgValue::Int(v)) => *v,
            Some(ArgValue::Str(s)) => s.trim().parse().unwrap_or(0),
            None => 0,
        }
    }

    /// String argument `i`, or "" when absent.
    pub fn string(&self, i: usize) -> &str {
        match self.0.get(i) {
            Some(ArgValue::Str(s)) => s,
            _ => "",
        }
    }
}

// ============================================================
// Action bindings
// ============================================================

#[derive(Clone, Debug, PartialEq)]
pub struct BoundCall {
    pub func: ActionId,
    pub args: Vec<ArgExpr>,
}

/// A frame's action or thinker. An empty binding has no arguments either.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ActionCall(Option<BoundCall>);

impl ActionCall {
    pub fn none() -> Self {
        ActionCall(None)
    }

    pub fn bind(func: ActionId, args: Vec<ArgExpr>) -> Self {
        ActionCall(Some(BoundCall { func, args }))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    pub fn bound(&self) -> Option<&BoundCall> {
        self.0.as_ref()
    }

    /// Evaluate the arguments against `actor` as it is right now.
    pub fn evaluate(&self, actor: &Actor) -> ActionArgs {
        match &self.0 {
            Some(call) => ActionArgs(call.args.iter().map(|a| a.eval(actor)).collect()),
            None => ActionArgs::default(),
        }
    }

    /// Run the binding. Returns false for an empty binding or a vanished actor.
    /// The frame must not be borrowed from `world`; hold an `Arc` of the
    /// class table instead.
    pub fn invoke(&self, world: &mut World, actor: ActorId, state_owner: ActorId, caller: FrameId) -> bool {
        let Some(call) = &self.0 else {
            return false;
        };
        let args = match world.actor(actor) {
            Some(a) => self.evaluate(a),
            None => return false,
        };
        let func = world.classes.actions().func(call.func);
        func(world, actor, state_owner, caller, &args)
    }
}

#![allow(clippy::needless_return, clippy::too_many_arguments, clippy::collapsible_if,
         clippy::collapsible_else_if, clippy::manual_range_contains,
         clippy::comparison_chain, clippy::identity_op, clippy::new_without_default)]
// Actor simulation: class and frame tables, the actor arena and registry,
// the tic-driven state machine, death/damage, inventory, and save games.

pub mod error;
pub mod game_import;
pub mod frame;
pub mod dispatch;
pub mod classdef;
pub mod actor;
pub mod settings;
pub mod world;
pub mod state;
pub mod spawn;
pub mod inventory;
pub mod combat;
pub mod filterpos;
pub mod save;

#[cfg(test)]
pub(crate) mod test_support;

#![allow(clippy::needless_return, clippy::too_many_arguments, clippy::collapsible_if,
         clippy::collapsible_else_if, clippy::manual_range_contains,
         clippy::comparison_chain, clippy::identity_op)]
// Engine services shared by the actor simulation: fixed-point math, random
// streams, console variables, printing, and the save archive.

pub mod fixed;
pub mod crc;
pub mod random;
pub mod common;
pub mod cvar;
pub mod compression;
pub mod archive;

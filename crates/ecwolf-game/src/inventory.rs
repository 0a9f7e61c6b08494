// inventory.rs — inventory chains and pickups
//
// A holder's `inventory` field is the head of a singly linked chain of item
// actors; each item's `inventory` field points at the next one and
// `inv.owner` back at the holder. Held items are out of the registry.

use std::fmt::Write as _;
use std::sync::Arc;

use ecwolf_common::common::com_printf;

use crate::actor::ActorId;
use crate::classdef::{ClassId, ClassKind, InventoryKind};
use crate::spawn::{clear_counters, destroy, remove_from_world, spawn, SpawnFlags};
use crate::world::World;

/// Push `item` onto the front of `holder`'s chain, taking it from any other
/// holder first.
pub fn add_inventory(world: &mut World, holder: ActorId, item: ActorId) {
    let Some(owner) = world.actor(item).map(|a| a.inv.owner) else {
        return;
    };
    if !world.is_alive(holder) {
        return;
    }
    if let Some(owner) = owner {
        if owner == holder {
            return;
        }
        remove_inventory(world, owner, item);
    }

    let head = world.actor(holder).and_then(|a| a.inventory);
    if let Some(i) = world.actor_mut(item) {
        i.inv.owner = Some(holder);
        i.inventory = head;
    }
    if let Some(h) = world.actor_mut(holder) {
        h.inventory = Some(item);
    }
}

/// Splice `item` out of `holder`'s chain. Returns false if it was not there.
pub fn remove_inventory(world: &mut World, holder: ActorId, item: ActorId) -> bool {
    let mut prev: Option<ActorId> = None;
    let mut cursor = world.actor(holder).and_then(|a| a.inventory);
    while let Some(current) = cursor {
        let next = world.actor(current).and_then(|a| a.inventory);
        if current == item {
            match prev {
                Some(p) => {
                    if let Some(pa) = world.actor_mut(p) {
                        pa.inventory = next;
                    }
                }
                None => {
                    if let Some(h) = world.actor_mut(holder) {
                        h.inventory = next;
                    }
                }
            }
            if let Some(i) = world.actor_mut(item) {
                i.inv.owner = None;
                i.inventory = None;
            }
            return true;
        }
        prev = Some(current);
        cursor = next;
    }
    false
}

/// First item in the chain whose class is exactly `class`.
pub fn find_inventory(world: &World, holder: ActorId, class: ClassId) -> Option<ActorId> {
    inventory_items(world, holder).find(|&item| world.actor(item).is_some_and(|a| a.class == class))
}

/// The holder's chain, front to back.
pub fn inventory_items(world: &World, holder: ActorId) -> impl Iterator<Item = ActorId> + '_ {
    let mut cursor = world.actor(holder).and_then(|a| a.inventory);
    std::iter::from_fn(move || {
        let current = cursor?;
        cursor = world.actor(current).and_then(|a| a.inventory);
        Some(current)
    })
}

/// Empty the chain, destroying every item.
pub fn clear_inventory(world: &mut World, holder: ActorId) {
    while let Some(item) = world.actor(holder).and_then(|a| a.inventory) {
        if !remove_inventory(world, holder, item) {
            break;
        }
        destroy(world, item);
    }
}

/// Create an item of `class` and hand it to `holder`. A nonzero `amount`
/// sets the item's amount (health items multiply instead). Returns false,
/// with the item destroyed, if the pickup is refused.
pub fn give_inventory(world: &mut World, holder: ActorId, class: ClassId, amount: i32, allow_replacement: bool) -> bool {
    let flags = if allow_replacement {
        SpawnFlags::ALLOW_REPLACEMENT
    } else {
        SpawnFlags::empty()
    };
    let Some(item) = spawn(world, Some(class), 0, 0, 0, flags) else {
        return false;
    };

    if amount != 0 {
        let kind = world.actor(item).map(|a| world.classes.get(a.class).kind);
        if let Some(i) = world.actor_mut(item) {
            if kind == Some(ClassKind::Inventory(InventoryKind::Health)) {
                i.inv.amount *= amount;
            } else {
                i.inv.amount = amount;
            }
        }
    }

    let pickup = world.actor(item).map(|a| a.sounds.pickup.clone()).unwrap_or_default();
    world.play_sound_at(holder, &pickup);

    clear_counters(world, item);
    remove_from_world(world, item);
    if !try_pickup(world, item, holder) {
        destroy(world, item);
        return false;
    }
    true
}

/// Offer `item` to `toucher`. The class hook decides when one is set;
/// otherwise the default for the item kind applies.
pub fn try_pickup(world: &mut World, item: ActorId, toucher: ActorId) -> bool {
    let Some(class) = world.actor(item).map(|a| a.class) else {
        return false;
    };
    let classes = Arc::clone(&world.classes);
    let def = classes.get(class);
    if let Some(hook) = def.hooks.try_pickup {
        return hook(world, item, toucher);
    }
    match def.kind {
        ClassKind::Inventory(InventoryKind::Health) => pickup_health(world, item, toucher),
        ClassKind::Inventory(_) => pickup_stackable(world, item, toucher),
        _ => false,
    }
}

/// Health goes straight into the toucher, capped at the item's max amount
/// (or the toucher's spawn health when that is 0).
fn pickup_health(world: &mut World, item: ActorId, toucher: ActorId) -> bool {
    let Some((amount, max_amount)) = world.actor(item).map(|a| (a.inv.amount, a.inv.max_amount)) else {
        return false;
    };
    let classes = Arc::clone(&world.classes);
    let skill = world.settings.skill;
    let Some(t) = world.actor_mut(toucher) else {
        return false;
    };
    let max = if max_amount > 0 {
        max_amount
    } else {
        classes.get(t.class).default_actor.spawn_health(&classes, skill)
    };
    if t.health >= max {
        return false;
    }
    t.health = (t.health + amount).min(max);
    destroy(world, item);
    true
}

/// Merge into a held item of the same class, or join the chain.
fn pickup_stackable(world: &mut World, item: ActorId, toucher: ActorId) -> bool {
    let Some((class, amount)) = world.actor(item).map(|a| (a.class, a.inv.amount)) else {
        return false;
    };
    if let Some(held) = find_inventory(world, toucher, class) {
        let Some(h) = world.actor_mut(held) else {
            return false;
        };
        if h.inv.amount >= h.inv.max_amount {
            return false;
        }
        h.inv.amount = (h.inv.amount + amount).min(h.inv.max_amount);
        destroy(world, item);
        return true;
    }
    remove_from_world(world, item);
    add_inventory(world, toucher, item);
    true
}

/// Diagnostic listing of the holder's items, also sent to the console.
pub fn print_inventory(world: &World, holder: ActorId) -> String {
    let Some(a) = world.actor(holder) else {
        return String::new();
    };
    let mut out = String::new();
    let _ = writeln!(out, "{} inventory:", world.class_name(a.class));
    for item in inventory_items(world, holder) {
        if let Some(i) = world.actor(item) {
            let _ = writeln!(
                out,
                "  {} ({}/{})",
                world.class_name(i.class),
                i.inv.amount,
                i.inv.max_amount
            );
        }
    }
    com_printf(&out);
    out
}

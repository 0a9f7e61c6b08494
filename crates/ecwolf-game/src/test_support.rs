// test_support.rs — shared fixtures for unit tests

use std::sync::Arc;

use ecwolf_common::fixed::{Fixed, FRACUNIT, TILEGLOBAL, TILESHIFT};

use crate::actor::{ActorFlags, ActorId, ObjectFlags};
use crate::classdef::{ClassBuilder, ClassTable, FrameDef, SequenceEnd};
use crate::dispatch::ActionTable;
use crate::frame::ArgExpr;
use crate::game_import::RecordingImport;
use crate::settings::GameSettings;
use crate::spawn::{finish_spawning_actors, spawn, SpawnFlags};
use crate::state::{switchable_activate, switchable_deactivate};
use crate::world::World;

/// Centre of tile `t`.
pub(crate) fn tile(t: u16) -> Fixed {
    ((t as Fixed) << TILESHIFT) + TILEGLOBAL / 2
}

fn frames(sprite: &str, steps: &[(char, i32)]) -> Vec<FrameDef> {
    steps.iter().map(|&(f, d)| FrameDef::new(sprite, f, d)).collect()
}

fn still(sprite: &str) -> Vec<FrameDef> {
    vec![FrameDef::new(sprite, 'A', -1)]
}

fn bump_temp1() -> Vec<ArgExpr> {
    vec![ArgExpr::add(ArgExpr::Temp1, ArgExpr::Int(1))]
}

fn euthanize(world: &mut World, actor: ActorId) {
    if let Some(a) = world.actor_mut(actor) {
        a.object_flags.insert(ObjectFlags::EUTHANIZE_ME);
    }
}

pub(crate) fn test_classes() -> ClassTable {
    let mut b = ClassTable::builder(Arc::new(ActionTable::with_builtins()));

    // factions and damage types
    b.add(ClassBuilder::new("Nazis"));
    b.add(ClassBuilder::new("Allies"));
    b.add(ClassBuilder::new("Fire").parent("DamageType").damage_type(true, false));
    b.add(ClassBuilder::new("Bullet").parent("DamageType"));
    b.add(ClassBuilder::new("Knife").parent("DamageType").damage_type(false, true));

    // items
    b.add(
        ClassBuilder::new("Clip")
            .parent("Ammo")
            .amount(8, 99)
            .flags(ActorFlags::BONUS)
            .pickup_sound("misc/ammo_pkup")
            .state("Spawn", still("CLIP"), SequenceEnd::Stop),
    );
    b.add(
        ClassBuilder::new("Medkit")
            .parent("Health")
            .amount(25, 100)
            .pickup_sound("misc/health_pkup")
            .state("Spawn", still("MEDI"), SequenceEnd::Stop),
    );
    b.add(
        ClassBuilder::new("Treasure")
            .parent("Inventory")
            .amount(1, 50)
            .flags(ActorFlags::COUNTITEM)
            .state("Spawn", still("TRES"), SequenceEnd::Stop),
    );
    b.add(
        ClassBuilder::new("GoldKey")
            .parent("Inventory")
            .state("Spawn", still("GKEY"), SequenceEnd::Stop),
    );

    b.add(
        ClassBuilder::new("TeleportFog").state("Spawn", frames("TFOG", &[('A', 6), ('B', 6)]), SequenceEnd::Stop),
    );

    // monsters
    b.add(
        ClassBuilder::new("Guard")
            .health(25)
            .points(100)
            .speed(FRACUNIT / 2)
            .flags(ActorFlags::SHOOTABLE | ActorFlags::COUNTKILL | ActorFlags::SOLID | ActorFlags::ISMONSTER)
            .see_sound("guard/sight")
            .pain_sound("guard/pain")
            .death_sound("guard/death")
            .faction("Nazis")
            .enemy_faction("Allies")
            .obituary("%o was gunned down by a guard")
            .hit_obituary("%o was stabbed by a guard")
            .drop_item("Clip", 255, 0)
            .state("Spawn", still("GARD"), SequenceEnd::Stop)
            .state("Path", frames("GARD", &[('B', 20), ('C', 20)]), SequenceEnd::Loop)
            .state("See", frames("GARD", &[('D', 8), ('E', 8)]), SequenceEnd::Loop)
            .state("Pain", frames("GARD", &[('F', 5)]), SequenceEnd::Goto("See".into(), 0))
            .state(
                "Death",
                vec![
                    FrameDef::new("GARD", 'G', 15).action("A_Scream", vec![]),
                    FrameDef::new("GARD", 'H', 15).action("A_Fall", vec![]),
                    FrameDef::new("GARD", 'I', -1),
                ],
                SequenceEnd::Stop,
            )
            .state("Death_Fire", still("GBRN"), SequenceEnd::Stop)
            .state("XDeath", frames("GARD", &[('X', 10), ('Y', -1)]), SequenceEnd::Stop),
    );
    b.add(
        ClassBuilder::new("Officer")
            .parent("Guard")
            .health(50)
            .points(400)
            .skill_health([50, 60, 70, 80, 90, 100, 110, 115, 120]),
    );
    b.add(
        ClassBuilder::new("Picky")
            .parent("Guard")
            .flags(ActorFlags::DROPBASEDONTARGET)
            .drop_item("Clip", 255, 0)
            .drop_item("Medkit", 255, 0),
    );
    b.add(
        ClassBuilder::new("SecretGuard")
            .parent("Guard")
            .flags(ActorFlags::COUNTSECRET)
            .secret_death_sound("misc/secret"),
    );
    b.add(
        ClassBuilder::new("Grunt")
            .health(10)
            .flags(ActorFlags::SHOOTABLE)
            .state("Spawn", still("GRNT"), SequenceEnd::Stop)
            .state("Death", still("GRND"), SequenceEnd::Stop)
            .state("XDeath", still("GRNX"), SequenceEnd::Stop),
    );
    b.add(
        ClassBuilder::new("Dog")
            .health(30)
            .painchance(256)
            .flags(ActorFlags::SHOOTABLE | ActorFlags::COUNTKILL | ActorFlags::SOLID)
            .faction("Allies")
            .enemy_faction("Nazis")
            .damage_resistance("Fire", 50)
            .state("Spawn", still("DOGY"), SequenceEnd::Stop)
            .state("Pain", frames("DOGY", &[('P', 3)]), SequenceEnd::Goto("Spawn".into(), 0))
            .state("Death", still("DOGD"), SequenceEnd::Stop),
    );
    b.add(
        ClassBuilder::new("Boss")
            .health(500)
            .single_spawn()
            .flags(ActorFlags::SHOOTABLE | ActorFlags::COUNTKILL)
            .state("Spawn", still("BOSS"), SequenceEnd::Stop),
    );
    b.add(
        ClassBuilder::new("Ghost")
            .begin_play(euthanize)
            .flags(ActorFlags::COUNTKILL)
            .state("Spawn", still("GHST"), SequenceEnd::Stop),
    );
    b.add(
        ClassBuilder::new("PlayerPawn")
            .health(100)
            .flags(ActorFlags::SHOOTABLE | ActorFlags::SOLID)
            .state("Spawn", still("PLAY"), SequenceEnd::Stop)
            .state("Death", still("PLYD"), SequenceEnd::Stop),
    );

    // projectiles
    b.add(
        ClassBuilder::new("Rocket")
            .flags(ActorFlags::MISSILE | ActorFlags::RANDOMIZE)
            .speed(FRACUNIT / 4)
            .radius(FRACUNIT / 8)
            .damage(ArgExpr::mul(ArgExpr::Int(10), ArgExpr::Int(3)))
            .see_sound("rocket/launch")
            .death_sound("rocket/explode")
            .drop_item("Clip", 255, 0)
            .state("Spawn", frames("MISL", &[('A', 4), ('B', 4)]), SequenceEnd::Loop)
            .state("Death", frames("BOOM", &[('A', 6), ('B', 6)]), SequenceEnd::Stop),
    );

    // decorations and frame-chain fixtures
    b.add(ClassBuilder::new("Vase").state("Spawn", still("VASE"), SequenceEnd::Stop));
    b.add(
        ClassBuilder::new("GoldVase")
            .parent("Vase")
            .replaces("Vase", 0)
            .state("Spawn", still("GVAS"), SequenceEnd::Stop),
    );
    b.add(
        ClassBuilder::new("Lamp")
            .activate(switchable_activate)
            .deactivate(switchable_deactivate)
            .state("Spawn", still("LAMP"), SequenceEnd::Stop)
            .state("Active", frames("LAMP", &[('B', -1)]), SequenceEnd::Stop)
            .state("Inactive", frames("LAMP", &[('C', -1)]), SequenceEnd::Stop),
    );
    b.add(
        ClassBuilder::new("Blinker").state(
            "Spawn",
            vec![
                FrameDef::new("BLNK", 'A', 0).action("A_SetTemp1", bump_temp1()),
                FrameDef::new("BLNK", 'B', 0).action("A_SetTemp1", bump_temp1()),
                FrameDef::new("BLNK", 'C', 0),
            ],
            SequenceEnd::Stop,
        ),
    );
    b.add(
        ClassBuilder::new("Settler").state(
            "Spawn",
            vec![
                FrameDef::new("SETL", 'A', 0).action("A_SetTemp1", bump_temp1()),
                FrameDef::new("SETL", 'B', 0).action("A_SetTemp1", bump_temp1()),
                FrameDef::new("SETL", 'C', 0).action("A_SetTemp1", bump_temp1()),
                FrameDef::new("SETL", 'D', 4),
            ],
            SequenceEnd::Wait,
        ),
    );
    b.add(ClassBuilder::new("Looper").state("Spawn", frames("LOOP", &[('A', 0)]), SequenceEnd::Loop));
    b.add(
        ClassBuilder::new("Counter").state(
            "Spawn",
            vec![FrameDef::new("CNTR", 'A', 3).action("A_SetTemp1", bump_temp1())],
            SequenceEnd::Loop,
        ),
    );
    b.add(ClassBuilder::new("Shortlived").state("Spawn", frames("SHRT", &[('A', 1)]), SequenceEnd::Stop));
    b.add(
        ClassBuilder::new("Spawner").state(
            "Spawn",
            vec![
                FrameDef::new("SPWN", 'A', 2),
                FrameDef::new("SPWN", 'B', -1).action("A_SpawnItem", vec![ArgExpr::str("Clip")]),
            ],
            SequenceEnd::Stop,
        ),
    );
    b.add(
        ClassBuilder::new("Thinker").state(
            "Spawn",
            vec![FrameDef::new("THNK", 'A', -1).thinker("A_SetTemp1", bump_temp1())],
            SequenceEnd::Stop,
        ),
    );
    b.add(
        ClassBuilder::new("Jumper")
            .state(
                "Spawn",
                vec![
                    FrameDef::new("JUMP", 'A', 0).action("A_Jump", vec![ArgExpr::Int(256), ArgExpr::str("Landed")]),
                    FrameDef::new("JUMP", 'B', 5),
                ],
                SequenceEnd::Stop,
            )
            .state("Landed", frames("JUMP", &[('C', 6)]), SequenceEnd::Wait),
    );
    b.add(
        ClassBuilder::new("Flare")
            .flags(ActorFlags::MISSILE | ActorFlags::RANDOMIZE)
            .state("Spawn", still("FLAR"), SequenceEnd::Stop),
    );
    b.add(ClassBuilder::new("Bouncer").state(
        "Spawn",
        vec![FrameDef::new("BNCE", 'A', 0).action("A_Jump", vec![ArgExpr::Int(256), ArgExpr::str("Spawn")])],
        SequenceEnd::Stop,
    ));

    b.build()
}

/// A world over `test_classes` whose import records every call.
pub(crate) fn test_world() -> (World, RecordingImport) {
    test_world_with(GameSettings::default())
}

pub(crate) fn test_world_with(settings: GameSettings) -> (World, RecordingImport) {
    let import = RecordingImport::new();
    let world = World::new(Arc::new(test_classes()), settings, Box::new(import.clone()));
    (world, import)
}

/// A world with one class, "Chain": `len` zero-tic frames ending in stop.
pub(crate) fn zero_chain_world(len: usize) -> (World, RecordingImport) {
    let mut b = ClassTable::builder(Arc::new(ActionTable::with_builtins()));
    let chain = (0..len)
        .map(|i| FrameDef::new("CHAN", (b'A' + (i % 26) as u8) as char, 0).action("A_SetTemp1", bump_temp1()))
        .collect();
    b.add(ClassBuilder::new("Chain").state("Spawn", chain, SequenceEnd::Stop));
    let import = RecordingImport::new();
    let world = World::new(Arc::new(b.build()), GameSettings::default(), Box::new(import.clone()));
    (world, import)
}

/// Spawn `class` at the centre of a tile and activate it.
pub(crate) fn spawn_live(world: &mut World, class: &str, tile_x: u16, tile_y: u16) -> ActorId {
    let cls = world.find_class(class);
    let id = spawn(world, cls, tile(tile_x), tile(tile_y), 0, SpawnFlags::empty())
        .unwrap_or_else(|| panic!("{} failed to spawn", class));
    finish_spawning_actors(world);
    id
}

// game_import.rs — services the actor engine needs from the rest of the game
//
// Map lookups, sound and on-screen messages live outside this crate. The
// engine reaches them through `GameImport`; tests plug in a stub.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use ecwolf_common::common::com_printf;
use ecwolf_common::fixed::Fixed;

/// What the map knows about one tile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MapSpot {
    pub tile_x: u16,
    pub tile_y: u16,
    /// Sound/lighting zone the tile belongs to, if any.
    pub zone: Option<u16>,
    /// A wall or closed door occupies the tile.
    pub blocked: bool,
}

pub trait GameImport {
    // Map
    fn get_spot(&self, tile_x: u16, tile_y: u16) -> MapSpot;

    // Sound
    fn play_sound(&self, sound: &str, x: Fixed, y: Fixed);
    fn stop_looped_sound(&self, spawnid: u32);

    // Messages
    fn post_message(&self, msg: &str);
}

/// Open map, no sound, messages to the console.
pub struct StubGameImport;

impl GameImport for StubGameImport {
    fn get_spot(&self, tile_x: u16, tile_y: u16) -> MapSpot {
        MapSpot {
            tile_x,
            tile_y,
            zone: None,
            blocked: false,
        }
    }

    fn play_sound(&self, _sound: &str, _x: Fixed, _y: Fixed) {}

    fn stop_looped_sound(&self, _spawnid: u32) {}

    fn post_message(&self, msg: &str) {
        com_printf(msg);
    }
}

/// Shared log of everything the engine asked for.
#[derive(Debug, Default)]
pub struct ImportLog {
    pub sounds: Vec<String>,
    pub stopped_loops: Vec<u32>,
    pub messages: Vec<String>,
}

/// A `GameImport` that records calls and serves a configurable map. The
/// handles stay with the caller after the import is boxed into a `World`.
#[derive(Clone, Default)]
pub struct RecordingImport {
    pub log: Rc<RefCell<ImportLog>>,
    pub blocked: Rc<RefCell<HashSet<(u16, u16)>>>,
    /// Every tile reports this zone.
    pub zone: Option<u16>,
}

impl RecordingImport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn block(&self, tile_x: u16, tile_y: u16) {
        self.blocked.borrow_mut().insert((tile_x, tile_y));
    }

    pub fn sounds(&self) -> Vec<String> {
        self.log.borrow().sounds.clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.log.borrow().messages.clone()
    }
}

impl GameImport for RecordingImport {
    fn get_spot(&self, tile_x: u16, tile_y: u16) -> MapSpot {
        MapSpot {
            tile_x,
            tile_y,
            zone: self.zone,
            blocked: self.blocked.borrow().contains(&(tile_x, tile_y)),
        }
    }

    fn play_sound(&self, sound: &str, _x: Fixed, _y: Fixed) {
        if !sound.is_empty() {
            self.log.borrow_mut().sounds.push(sound.to_string());
        }
    }

    fn stop_looped_sound(&self, spawnid: u32) {
        self.log.borrow_mut().stopped_loops.push(spawnid);
    }

    fn post_message(&self, msg: &str) {
        self.log.borrow_mut().messages.push(msg.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stub_map_is_open() {
        let spot = StubGameImport.get_spot(3, 4);
        assert_eq!((spot.tile_x, spot.tile_y), (3, 4));
        assert!(!spot.blocked);
        assert_eq!(spot.zone, None);
    }

    #[test]
    fn test_recording_import_shares_log() {
        let import = RecordingImport::new();
        let boxed: Box<dyn GameImport> = Box::new(import.clone());
        boxed.play_sound("guard/sight", 0, 0);
        boxed.play_sound("", 0, 0);
        boxed.post_message("You got the clip");
        import.block(1, 1);
        assert!(boxed.get_spot(1, 1).blocked);
        assert_eq!(import.sounds(), vec!["guard/sight".to_string()]);
        assert_eq!(import.messages(), vec!["You got the clip".to_string()]);
    }
}

//! Rhythm Tiles core crate.
//!
//! A tile-tap rhythm game: tiles fall down four lanes and must be tapped
//! inside the hit zone near the bottom of the board. The rules live in the
//! pure [`engine`] module (natively testable, no browser types); `start_game`
//! launches the canvas shell that drives it in a browser.

use wasm_bindgen::prelude::*;

pub mod engine;
mod game;

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

// -----------------------------------------------------------------------------
// Track presets
// -----------------------------------------------------------------------------

/// One selectable track: pacing constants plus the beatmap recipe. Speeds are
/// board-lengths per second; percentages control the long/decoy tile mix.
pub struct SongDef {
    pub title: &'static str,
    pub artist: &'static str,
    pub base_speed: f64,
    pub beatmap_len: usize,
    pub long_pct: u8,
    pub decoy_pct: u8,
}

/// Built-in tracks, slowest first.
pub const SONGS: &[SongDef] = &[
    SongDef {
        title: "Easy Ride",
        artist: "Chill Mix",
        base_speed: 0.30,
        beatmap_len: 150,
        long_pct: 0,
        decoy_pct: 0,
    },
    SongDef {
        title: "Upbeat Fun",
        artist: "Pop Track",
        base_speed: 0.40,
        beatmap_len: 200,
        long_pct: 10,
        decoy_pct: 0,
    },
    SongDef {
        title: "Fast Lane",
        artist: "Electronic",
        base_speed: 0.55,
        beatmap_len: 250,
        long_pct: 12,
        decoy_pct: 6,
    },
];

// -----------------------------------------------------------------------------
// Unified entrypoint
// -----------------------------------------------------------------------------

#[wasm_bindgen]
pub fn start_game() -> Result<(), JsValue> {
    game::start()
}

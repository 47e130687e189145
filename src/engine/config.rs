//! Session configuration.
//!
//! Game variants differ only in a handful of constants (lane count, spawn
//! pacing, speed ramp, whether a wrong tap kills the run). All of those knobs
//! live here so a single engine can be instantiated per variant.

/// How `effective_speed` grows with the score. Both variants are
/// monotonically non-decreasing in score.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SpeedScaling {
    /// `base + per_point * score`.
    Linear { per_point: f64 },
    /// `base + increment * (score / points)`, a step up every `points` points.
    Step { points: u32, increment: f64 },
}

impl SpeedScaling {
    /// Speed added on top of the base speed at the given score.
    pub fn bonus(&self, score: u32) -> f64 {
        match *self {
            SpeedScaling::Linear { per_point } => per_point * f64::from(score),
            SpeedScaling::Step { points, increment } => {
                if points == 0 {
                    0.0
                } else {
                    increment * f64::from(score / points)
                }
            }
        }
    }
}

/// What a tap on a lane with no hittable tile does.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmptyTapPolicy {
    /// Nothing happens (the baseline behavior).
    Ignore,
    /// The session ends; "must always hit" variants used this.
    EndSession,
}

/// What happens once the beatmap cursor is exhausted.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExhaustPolicy {
    /// No new spawns; the session keeps running until a miss or manual stop.
    Continue,
    /// Once the last spawned tile has been cleared the session ends as a win.
    WinWhenClear,
}

/// All tunable parameters of one game variant.
///
/// Speeds are in board-lengths per second; heights are normalized to the
/// board (0.0 top edge, 1.0 miss line).
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GameConfig {
    pub lane_count: u8,
    /// Milliseconds between consecutive beatmap spawns.
    pub spawn_interval_ms: f64,
    pub base_speed: f64,
    pub speed_scaling: SpeedScaling,
    /// Height of the band above the miss line where a tap counts as a hit.
    pub hit_zone_height: f64,
    /// Tile height, used by renderers; the engine judges on the leading edge.
    pub tile_height: f64,
    pub empty_tap: EmptyTapPolicy,
    pub on_exhaust: ExhaustPolicy,
    /// Points awarded for a long tile (normal tiles score 1).
    pub long_tile_points: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        // Classic 4-lane setup: 400 ms spawn rhythm, a 96px tap zone and
        // 120px tiles on a 600px board, expressed in normalized units.
        Self {
            lane_count: 4,
            spawn_interval_ms: 400.0,
            base_speed: 0.35,
            speed_scaling: SpeedScaling::Linear { per_point: 0.001 },
            hit_zone_height: 0.16,
            tile_height: 0.2,
            empty_tap: EmptyTapPolicy::Ignore,
            on_exhaust: ExhaustPolicy::Continue,
            long_tile_points: 3,
        }
    }
}

impl GameConfig {
    /// Y coordinate of the top of the hit zone.
    pub fn hit_zone_top(&self) -> f64 {
        1.0 - self.hit_zone_height
    }

    /// A config with the given base speed and everything else default.
    pub fn with_base_speed(base_speed: f64) -> Self {
        Self {
            base_speed,
            ..Self::default()
        }
    }
}

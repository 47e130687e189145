//! Deterministic tile-tap game core.
//!
//! The engine owns one session at a time: it consumes a [`Beatmap`] on a spawn
//! timer, moves tiles toward the miss line, judges taps against the hit zone
//! and ends the session on the first miss. It is pure Rust with no browser
//! types; the shell in `crate::game` drives it from requestAnimationFrame and
//! a test harness can drive it synchronously. All positions are normalized to
//! the board: 0.0 is the spawn edge, 1.0 the miss line.

pub mod beatmap;
pub mod config;

pub use beatmap::{Beat, Beatmap};
pub use config::{EmptyTapPolicy, ExhaustPolicy, GameConfig, SpeedScaling};

#[cfg(feature = "rng")]
pub use beatmap::random_seed;

/// Tile category.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TileKind {
    /// Tap in the hit zone for one point.
    Normal,
    /// Drawn taller, worth `GameConfig::long_tile_points`.
    Long,
    /// Tapping it ends the session.
    Decoy,
}

/// A falling note-marker. Owned exclusively by the session; removed on hit or
/// on crossing the miss line.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tile {
    pub lane: u8,
    /// Leading (bottom) edge, normalized. Monotonically increasing.
    pub position: f64,
    pub kind: TileKind,
    /// Session-relative spawn time in milliseconds.
    pub spawned_at_ms: f64,
}

/// Why a session ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndReason {
    /// A tile crossed the miss line untapped.
    Miss,
    /// A decoy tile was tapped.
    DecoyTapped,
    /// A lane with no hittable tile was tapped under `EmptyTapPolicy::EndSession`.
    MisTap,
    /// Beatmap exhausted and board cleared under `ExhaustPolicy::WinWhenClear`.
    Cleared,
    /// Manual stop from the shell.
    Aborted,
}

/// Session lifecycle. The Idle state of the outer state machine is the absence
/// of a session; starting one enters `Active` directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Active,
    Ended(EndReason),
}

/// Feedback signals for the shell (sound, flashes, screen changes). The engine
/// never waits on them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GameEvent {
    Spawned { lane: u8, kind: TileKind },
    Hit { lane: u8, kind: TileKind, points: u32 },
    Ended { reason: EndReason, final_score: u32 },
}

/// One run from start to game-over.
#[derive(Clone, Debug)]
pub struct Session {
    config: GameConfig,
    beatmap: Beatmap,
    cursor: usize,
    tiles: Vec<Tile>,
    score: u32,
    phase: Phase,
    spawn_clock_ms: f64,
    elapsed_ms: f64,
}

impl Session {
    /// Starts a session: score 0, cursor at the beatmap start, board empty.
    pub fn start(beatmap: Beatmap, config: GameConfig) -> Self {
        Self {
            config,
            beatmap,
            cursor: 0,
            tiles: Vec::new(),
            score: 0,
            phase: Phase::Active,
            spawn_clock_ms: 0.0,
            elapsed_ms: 0.0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase == Phase::Active
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Live tiles as (lane, position, kind) data for the renderer. The engine
    /// never deals in pixels; the renderer scales these however it likes.
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Current fall speed in board-lengths per second. Non-decreasing within
    /// a session because the score never goes down.
    pub fn effective_speed(&self) -> f64 {
        self.config.base_speed + self.config.speed_scaling.bonus(self.score)
    }

    /// Advances the session by `dt_ms`: runs the spawn timer, moves every
    /// live tile, and ends the session on the first tile to cross the miss
    /// line. A miss preempts everything else in the same call; there is no
    /// double penalty. Calls on an ended session are no-ops.
    pub fn advance(&mut self, dt_ms: f64) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if !self.is_active() || dt_ms <= 0.0 {
            return events;
        }
        self.elapsed_ms += dt_ms;

        self.spawn_clock_ms += dt_ms;
        while self.spawn_clock_ms >= self.config.spawn_interval_ms {
            self.spawn_clock_ms -= self.config.spawn_interval_ms;
            if let Some(ev) = self.spawn_next() {
                events.push(ev);
            }
        }

        let step = self.effective_speed() * dt_ms / 1000.0;
        for tile in &mut self.tiles {
            tile.position += step;
        }

        // First miss wins: oldest tiles sit earliest in the vec and furthest
        // down the board, so scan order finds the first crossing.
        if let Some(idx) = self.tiles.iter().position(|t| t.position >= 1.0) {
            self.tiles.remove(idx);
            if let Some(ev) = self.end(EndReason::Miss) {
                events.push(ev);
            }
            return events;
        }

        if self.config.on_exhaust == ExhaustPolicy::WinWhenClear
            && self.cursor >= self.beatmap.len()
            && self.tiles.is_empty()
        {
            if let Some(ev) = self.end(EndReason::Cleared) {
                events.push(ev);
            }
        }
        events
    }

    /// Spawns the next beatmap entry, if any. An exhausted cursor and rest
    /// slots are no-ops; the session itself keeps running.
    pub fn spawn_next(&mut self) -> Option<GameEvent> {
        if !self.is_active() {
            return None;
        }
        let entry = self.beatmap.get(self.cursor)?;
        self.cursor += 1;
        let beat = entry?;
        self.tiles.push(Tile {
            lane: beat.lane,
            position: 0.0,
            kind: beat.kind,
            spawned_at_ms: self.elapsed_ms,
        });
        Some(GameEvent::Spawned {
            lane: beat.lane,
            kind: beat.kind,
        })
    }

    /// Maps a normalized board coordinate to a lane. Taps outside the board
    /// resolve to no lane.
    pub fn resolve_lane(&self, x: f64, y: f64) -> Option<u8> {
        if self.config.lane_count == 0 || !(0.0..1.0).contains(&x) || !(0.0..1.0).contains(&y) {
            return None;
        }
        let lane = (x * f64::from(self.config.lane_count)) as u8;
        Some(lane.min(self.config.lane_count - 1))
    }

    /// A tap at a normalized board coordinate. Outside the board: no-op.
    pub fn tap_position(&mut self, x: f64, y: f64) -> Vec<GameEvent> {
        match self.resolve_lane(x, y) {
            Some(lane) => self.tap_lane(lane),
            None => Vec::new(),
        }
    }

    /// A tap on a lane. Hits the bottom-most tile whose leading edge is inside
    /// the hit zone; a hit decoy ends the session, anything else scores. With
    /// no hittable tile the configured empty-tap policy applies.
    pub fn tap_lane(&mut self, lane: u8) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if !self.is_active() || lane >= self.config.lane_count {
            return events;
        }

        let zone_top = self.config.hit_zone_top();
        let mut best: Option<usize> = None;
        for (i, tile) in self.tiles.iter().enumerate() {
            if tile.lane != lane || tile.position < zone_top || tile.position >= 1.0 {
                continue;
            }
            match best {
                Some(b) if self.tiles[b].position >= tile.position => {}
                _ => best = Some(i),
            }
        }

        match best {
            Some(i) => {
                let tile = self.tiles.remove(i);
                if tile.kind == TileKind::Decoy {
                    if let Some(ev) = self.end(EndReason::DecoyTapped) {
                        events.push(ev);
                    }
                } else {
                    let points = if tile.kind == TileKind::Long {
                        self.config.long_tile_points
                    } else {
                        1
                    };
                    self.score += points;
                    events.push(GameEvent::Hit {
                        lane,
                        kind: tile.kind,
                        points,
                    });
                }
            }
            None => {
                if self.config.empty_tap == EmptyTapPolicy::EndSession {
                    if let Some(ev) = self.end(EndReason::MisTap) {
                        events.push(ev);
                    }
                }
            }
        }
        events
    }

    /// Ends the session. Idempotent: only the first call transitions to
    /// `Ended` and reports an event; repeats are silent no-ops.
    pub fn end(&mut self, reason: EndReason) -> Option<GameEvent> {
        if let Phase::Ended(_) = self.phase {
            return None;
        }
        self.phase = Phase::Ended(reason);
        Some(GameEvent::Ended {
            reason,
            final_score: self.score,
        })
    }
}

/// The single persisted integer. The engine owns the update rule; reading and
/// writing the backing store is the shell's job.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HighScore(u32);

impl HighScore {
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    pub fn get(&self) -> u32 {
        self.0
    }

    /// Records a finished session. Returns true (and updates) only when the
    /// final score strictly beats the stored value.
    pub fn record(&mut self, final_score: u32) -> bool {
        if final_score > self.0 {
            self.0 = final_score;
            true
        } else {
            false
        }
    }
}

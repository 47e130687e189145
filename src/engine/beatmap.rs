//! Beatmaps: the predetermined spawn sequence a session consumes.

use super::TileKind;

/// One beatmap slot. `None` is an explicit rest (the spawn timer fires but
/// nothing enters the board).
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Beat {
    pub lane: u8,
    pub kind: TileKind,
}

/// Immutable ordered spawn sequence, consumed by index cursor.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Beatmap {
    entries: Vec<Option<Beat>>,
}

impl Beatmap {
    /// Builds a beatmap of normal tiles from raw lane indices. Indices outside
    /// `0..lane_count` become rests, mirroring how the prototype skipped
    /// invalid beatmap entries instead of failing.
    pub fn from_lanes(lanes: &[u8], lane_count: u8) -> Self {
        let entries = lanes
            .iter()
            .map(|&lane| {
                (lane < lane_count).then_some(Beat {
                    lane,
                    kind: TileKind::Normal,
                })
            })
            .collect();
        Self { entries }
    }

    pub fn from_beats(entries: Vec<Option<Beat>>) -> Self {
        Self { entries }
    }

    /// Generates `len` normal tiles spread over `lane_count` lanes, never
    /// putting two consecutive tiles in the same lane.
    pub fn generate(len: usize, lane_count: u8, seed: u64) -> Self {
        Self::generate_with_kinds(len, lane_count, seed, 0, 0)
    }

    /// Like [`Beatmap::generate`] but mixing in long and decoy tiles.
    /// `long_pct` and `decoy_pct` are percentages; together they must not
    /// exceed 100 (excess is clamped).
    pub fn generate_with_kinds(
        len: usize,
        lane_count: u8,
        seed: u64,
        long_pct: u8,
        decoy_pct: u8,
    ) -> Self {
        let lane_count = lane_count.max(1);
        let long_pct = long_pct.min(100);
        let decoy_pct = decoy_pct.min(100 - long_pct);

        let mut rng = Lcg::new(seed);
        let mut entries = Vec::with_capacity(len);
        let mut last_lane: Option<u8> = None;
        for _ in 0..len {
            let lane = if lane_count == 1 {
                0
            } else {
                loop {
                    let candidate = (rng.next_u32() % u32::from(lane_count)) as u8;
                    if Some(candidate) != last_lane {
                        break candidate;
                    }
                }
            };
            last_lane = Some(lane);

            let roll = (rng.next_u32() % 100) as u8;
            let kind = if roll < decoy_pct {
                TileKind::Decoy
            } else if roll < decoy_pct + long_pct {
                TileKind::Long
            } else {
                TileKind::Normal
            };
            entries.push(Some(Beat { lane, kind }));
        }
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, cursor: usize) -> Option<Option<Beat>> {
        self.entries.get(cursor).copied()
    }
}

/// Small linear congruential generator; good enough for spreading tiles over
/// lanes and fully deterministic for a given seed.
struct Lcg {
    state: u64,
}

impl Lcg {
    fn new(seed: u64) -> Self {
        // Avoid the all-zero fixed point of a multiply-only start.
        Self {
            state: seed ^ 0x9e37_79b9_7f4a_7c15,
        }
    }

    fn next_u32(&mut self) -> u32 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.state >> 33) as u32
    }
}

/// A beatmap seed from browser entropy. Falls back to a fixed seed when the
/// entropy source is unavailable; the generator itself never fails.
#[cfg(feature = "rng")]
pub fn random_seed() -> u64 {
    let mut bytes = [0u8; 8];
    match getrandom::getrandom(&mut bytes) {
        Ok(()) => u64::from_le_bytes(bytes),
        Err(_) => 0x5eed_5eed_5eed_5eed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_lanes_skips_out_of_range_indices() {
        let map = Beatmap::from_lanes(&[0, 1, 9, 3], 4);
        assert_eq!(map.len(), 4);
        assert!(map.get(2).unwrap().is_none());
        assert_eq!(
            map.get(3).unwrap(),
            Some(Beat {
                lane: 3,
                kind: TileKind::Normal
            })
        );
    }

    #[test]
    fn generate_never_repeats_a_lane() {
        let map = Beatmap::generate(500, 4, 42);
        assert_eq!(map.len(), 500);
        let mut last = None;
        for i in 0..map.len() {
            let beat = map.get(i).unwrap().unwrap();
            assert!(beat.lane < 4);
            assert_eq!(beat.kind, TileKind::Normal);
            assert_ne!(Some(beat.lane), last, "repeat at index {}", i);
            last = Some(beat.lane);
        }
    }

    #[test]
    fn generate_is_deterministic_per_seed() {
        let a = Beatmap::generate(100, 4, 7);
        let b = Beatmap::generate(100, 4, 7);
        let c = Beatmap::generate(100, 4, 8);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn generate_single_lane_does_not_hang() {
        let map = Beatmap::generate(10, 1, 3);
        for i in 0..map.len() {
            assert_eq!(map.get(i).unwrap().unwrap().lane, 0);
        }
    }

    #[test]
    fn kind_mix_respects_percentages() {
        let map = Beatmap::generate_with_kinds(1000, 4, 11, 20, 10);
        let mut longs = 0;
        let mut decoys = 0;
        for i in 0..map.len() {
            match map.get(i).unwrap().unwrap().kind {
                TileKind::Long => longs += 1,
                TileKind::Decoy => decoys += 1,
                TileKind::Normal => {}
            }
        }
        // Loose statistical bounds; the sequence is deterministic so these
        // cannot flake.
        assert!((100..=320).contains(&longs), "longs = {}", longs);
        assert!((40..=180).contains(&decoys), "decoys = {}", decoys);
    }

    #[test]
    fn cursor_past_end_yields_none() {
        let map = Beatmap::generate(3, 4, 1);
        assert!(map.get(3).is_none());
    }
}

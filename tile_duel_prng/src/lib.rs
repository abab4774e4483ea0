// Seedable pseudo-random number generator for Tile Duel.
//
// Implements xoshiro256++ (Blackman & Vigna, 2019) with SplitMix64 seeding.
// Every random decision in the game draws from a `TileRng`: which empty cell
// receives a spawned tile, whether that tile is a 2 or a 4, which eligible
// cell an attack lands on, and the values of the attacks a big merge sends
// to the opponent. The server owns exactly one generator inside its session
// table, so all draws happen inside the table's critical section and are
// serialized with the moves that consume them.
//
// Tests construct generators with `TileRng::new(seed)` and get reproducible
// boards. The server binary uses `TileRng::from_entropy()` unless a seed is
// configured.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Distinguishes generators created from entropy within the same clock tick.
static ENTROPY_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Xoshiro256++ generator used for all tile and attack randomness.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TileRng {
    state: [u64; 4],
}

impl TileRng {
    /// Create a generator from a `u64` seed. Equal seeds give equal streams.
    pub fn new(seed: u64) -> Self {
        let mut seeder = seed;
        let state = std::array::from_fn(|_| splitmix64(&mut seeder));
        Self { state }
    }

    /// Create a generator seeded from the wall clock and a process-wide
    /// counter. Not reproducible; used when no seed is configured.
    pub fn from_entropy() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_nanos() as u64);
        let count = ENTROPY_COUNTER.fetch_add(1, Ordering::Relaxed);
        let mut mix = nanos ^ count.rotate_left(32);
        Self::new(splitmix64(&mut mix))
    }

    /// Next raw 64-bit output.
    pub fn next_u64(&mut self) -> u64 {
        let [a, b, c, d] = self.state;
        let out = a.wrapping_add(d).rotate_left(23).wrapping_add(a);
        let t = b << 17;

        let c = c ^ a;
        let d = d ^ b;
        let b = b ^ c;
        let a = a ^ d;
        self.state = [a, b, c ^ t, d.rotate_left(45)];

        out
    }

    /// Uniform `f64` in [0, 1), built from the upper 53 bits.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform `usize` in `[low, high)` without modulo bias.
    ///
    /// Panics if `low >= high`.
    pub fn range_usize(&mut self, low: usize, high: usize) -> usize {
        assert!(low < high, "range_usize: low must be less than high");
        let range = (high - low) as u64;
        if range.is_power_of_two() {
            return low + (self.next_u64() & (range - 1)) as usize;
        }
        let threshold = range.wrapping_neg() % range;
        loop {
            let r = self.next_u64();
            if r >= threshold {
                return low + (r % range) as usize;
            }
        }
    }

    /// `true` with probability `p`. `p <= 0.0` never fires, `p >= 1.0` always does.
    pub fn random_bool(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Pick one element uniformly, or `None` for an empty slice.
    pub fn choose<T: Copy>(&mut self, items: &[T]) -> Option<T> {
        if items.is_empty() {
            return None;
        }
        Some(items[self.range_usize(0, items.len())])
    }
}

/// SplitMix64 step, used to expand a single seed into xoshiro state.
fn splitmix64(seeder: &mut u64) -> u64 {
    *seeder = seeder.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mixed = (*seeder ^ (*seeder >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    let mixed = (mixed ^ (mixed >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    mixed ^ (mixed >> 31)
}

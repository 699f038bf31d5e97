//! Chunk plans for streaming tests.
//!
//! Rewriter input is a byte stream, so plans split anywhere, including
//! inside multi-byte characters. Deterministic plans cover fixed sizes and
//! markup delimiters; fuzz plans are seeded for reproducibility in CI.

use crate::parse_u64;
use std::fmt;

pub const FUZZ_RUNS_ENV: &str = "REWRITER_CHUNK_FUZZ_RUNS";
pub const FUZZ_SEED_ENV: &str = "REWRITER_CHUNK_FUZZ_SEED";
pub const DEFAULT_FUZZ_RUNS: usize = 16;
pub const DEFAULT_FUZZ_SEED: u64 = 0x5eed_c0de;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ChunkPlan {
    Fixed { size: usize },
    Sizes { sizes: Vec<usize> },
    Boundaries { indices: Vec<usize> },
}

impl fmt::Display for ChunkPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkPlan::Fixed { size } => write!(f, "fixed size={size}"),
            ChunkPlan::Sizes { sizes } => {
                write!(f, "sizes count={} sizes={sizes:?}", sizes.len())
            }
            ChunkPlan::Boundaries { indices } => {
                write!(f, "boundaries count={} indices={indices:?}", indices.len())
            }
        }
    }
}

impl ChunkPlan {
    pub fn fixed(size: usize) -> Self {
        Self::Fixed { size }
    }

    pub fn sizes(sizes: impl Into<Vec<usize>>) -> Self {
        Self::Sizes {
            sizes: sizes.into(),
        }
    }

    pub fn boundaries(indices: impl Into<Vec<usize>>) -> Self {
        Self::Boundaries {
            indices: indices.into(),
        }
    }

    /// Call `f` with consecutive non-empty slices covering all of `input`.
    pub fn for_each_chunk(&self, input: &[u8], mut f: impl FnMut(&[u8])) {
        match self {
            ChunkPlan::Fixed { size } => {
                assert!(*size > 0, "chunk size must be > 0");
                for chunk in input.chunks(*size) {
                    f(chunk);
                }
            }
            ChunkPlan::Sizes { sizes } => {
                let mut offset = 0usize;
                for &size in sizes {
                    assert!(size > 0, "chunk size must be > 0");
                    if offset >= input.len() {
                        break;
                    }
                    let end = (offset + size).min(input.len());
                    f(&input[offset..end]);
                    offset = end;
                }
                if offset < input.len() {
                    f(&input[offset..]);
                }
            }
            ChunkPlan::Boundaries { indices } => {
                let mut points: Vec<usize> = indices
                    .iter()
                    .copied()
                    .filter(|&idx| idx > 0 && idx < input.len())
                    .collect();
                points.sort_unstable();
                points.dedup();
                let mut last = 0usize;
                for idx in points {
                    f(&input[last..idx]);
                    last = idx;
                }
                if last < input.len() {
                    f(&input[last..]);
                }
            }
        }
    }

    /// Materialize the chunks, mostly for failure messages.
    pub fn chunks<'a>(&self, input: &'a [u8]) -> Vec<&'a [u8]> {
        let mut out = Vec::new();
        let mut offset = 0usize;
        self.for_each_chunk(input, |chunk| {
            out.push(&input[offset..offset + chunk.len()]);
            offset += chunk.len();
        });
        out
    }
}

#[derive(Clone, Debug)]
pub struct ChunkPlanCase {
    pub label: String,
    pub plan: ChunkPlan,
}

/// Fuzz settings from `REWRITER_CHUNK_FUZZ_RUNS` / `REWRITER_CHUNK_FUZZ_SEED`.
pub fn fuzz_settings_from_env() -> (usize, u64) {
    let runs = match std::env::var(FUZZ_RUNS_ENV) {
        Ok(raw) => parse_u64(&raw)
            .and_then(|runs| usize::try_from(runs).ok())
            .unwrap_or_else(|| panic!("unsupported {FUZZ_RUNS_ENV} value '{raw}'")),
        Err(_) => DEFAULT_FUZZ_RUNS,
    };
    let seed = match std::env::var(FUZZ_SEED_ENV) {
        Ok(raw) => parse_u64(&raw)
            .unwrap_or_else(|| panic!("unsupported {FUZZ_SEED_ENV} value '{raw}'")),
        Err(_) => DEFAULT_FUZZ_SEED,
    };
    (runs, seed)
}

/// Deterministic plans plus `fuzz_runs` seeded boundary plans for `input`.
pub fn build_chunk_plans(input: &[u8], fuzz_runs: usize, fuzz_seed: u64) -> Vec<ChunkPlanCase> {
    let mut plans = Vec::new();

    for size in [1usize, 2, 3, 4, 7, 16, 64] {
        plans.push(ChunkPlanCase {
            label: format!("fixed size={size}"),
            plan: ChunkPlan::fixed(size),
        });
    }
    plans.push(ChunkPlanCase {
        label: "sizes ragged".to_string(),
        plan: ChunkPlan::sizes(vec![1, 1, 2, 1, 4, 8, 16, 3, 7]),
    });

    let delimiters = delimiter_boundaries(input);
    if !delimiters.is_empty() {
        plans.push(ChunkPlanCase {
            label: format!("delimiter-boundaries count={}", delimiters.len()),
            plan: ChunkPlan::boundaries(delimiters.clone()),
        });
    }

    if fuzz_runs > 0 && input.len() > 1 {
        let candidates: Vec<usize> = (1..input.len()).collect();
        for i in 0..fuzz_runs {
            let seed = fuzz_seed.wrapping_add(i as u64);
            let mut rng = Lcg::new(seed);
            let mut picks = if rng.gen_range(2) == 0 && !delimiters.is_empty() {
                delimiters.clone()
            } else {
                candidates.clone()
            };
            rng.shuffle(&mut picks);
            let max = picks.len().clamp(1, 32);
            picks.truncate(1 + rng.gen_range(max));
            plans.push(ChunkPlanCase {
                label: format!("fuzz boundaries seed=0x{seed:016x}"),
                plan: ChunkPlan::boundaries(picks),
            });
        }
    }

    plans
}

/// Offsets around `<`, `>`, `</`, quotes, `=` and `-`.
fn delimiter_boundaries(input: &[u8]) -> Vec<usize> {
    let mut out = Vec::new();
    for (i, &b) in input.iter().enumerate() {
        if matches!(b, b'<' | b'>' | b'"' | b'\'' | b'=' | b'-' | b'/') {
            out.push(i);
            out.push(i + 1);
        }
    }
    out.retain(|&idx| idx > 0 && idx < input.len());
    out.sort_unstable();
    out.dedup();
    out
}

struct Lcg {
    state: u64,
}

impl Lcg {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        self.state
    }

    fn gen_range(&mut self, upper: usize) -> usize {
        if upper == 0 {
            return 0;
        }
        (self.next_u64() >> 32) as usize % upper
    }

    fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.gen_range(i + 1);
            items.swap(i, j);
        }
    }
}

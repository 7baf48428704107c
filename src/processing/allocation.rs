/*!
 * Global allocation of replacement counts across segments.
 *
 * Given the word counts of a batch of segments and a page-wide replacement
 * rate, the planner decides how many replacements each segment should get so
 * that the batch total matches `round(total_words * rate)`.
 *
 * Fractional shares are rounded stochastically, then the plan is reconciled
 * so that the sum hits the target exactly whenever segments can absorb the
 * difference. The random source is injectable so tests can pin outcomes.
 */

use log::trace;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Segments with at least this many words are never starved to zero
const MIN_WORDS_FOR_GUARANTEE: usize = 3;

/// Remainder above which a starved segment is forced to one replacement
const STARVATION_REMAINDER: f64 = 0.3;

/// Source of uniform random values in `[0, 1)`
pub trait RandomSource: Send {
    fn next_f64(&mut self) -> f64;
}

/// `RandomSource` backed by any `rand` generator
#[derive(Debug, Clone)]
pub struct RngSource<R>(R);

impl<R: Rng + Send> RngSource<R> {
    pub fn new(rng: R) -> Self {
        Self(rng)
    }
}

impl RngSource<StdRng> {
    /// Seeded from the operating system
    pub fn from_os() -> Self {
        Self(StdRng::from_os_rng())
    }

    /// Reproducible sequence for a given seed
    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng + Send> RandomSource for RngSource<R> {
    fn next_f64(&mut self) -> f64 {
        self.0.random::<f64>()
    }
}

/// Always yields the same value
#[derive(Debug, Clone, Copy)]
pub struct FixedSource(pub f64);

impl RandomSource for FixedSource {
    fn next_f64(&mut self) -> f64 {
        self.0
    }
}

/// Per-segment replacement targets for one batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationPlan {
    /// `max(1, round(total_words * rate))`, or 0 for a batch without words
    pub target_total: usize,
    /// One entry per input segment, in input order
    pub allocations: Vec<usize>,
}

impl AllocationPlan {
    /// Sum of all allocations
    pub fn total(&self) -> usize {
        self.allocations.iter().sum()
    }
}

/// Computes allocation plans for a fixed replacement rate
#[derive(Debug, Clone, Copy)]
pub struct AllocationPlanner {
    rate: f64,
}

impl AllocationPlanner {
    /// Create a planner; the rate is clamped into `[0, 1]`
    pub fn new(rate: f64) -> Self {
        let rate = if rate.is_finite() { rate.clamp(0.0, 1.0) } else { 0.0 };
        Self { rate }
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Allocate replacements for segments with the given word counts
    pub fn plan(&self, word_counts: &[usize], rng: &mut dyn RandomSource) -> AllocationPlan {
        let total: usize = word_counts.iter().sum();
        if total == 0 {
            return AllocationPlan {
                target_total: 0,
                allocations: vec![0; word_counts.len()],
            };
        }

        let target_total = ((total as f64 * self.rate).round() as usize).max(1);

        let mut allocations: Vec<usize> = word_counts
            .iter()
            .map(|&words| {
                let proportional = words as f64 / total as f64 * target_total as f64;
                let base = proportional.floor();
                let remainder = proportional - base;
                let base = base as usize;

                if base == 0 && words >= MIN_WORDS_FOR_GUARANTEE && remainder > STARVATION_REMAINDER {
                    1
                } else if remainder > 0.0 && rng.next_f64() < remainder {
                    base + 1
                } else {
                    base
                }
            })
            .collect();

        reconcile(word_counts, &mut allocations, target_total);
        trace!(
            "Allocated {} of {} replacements over {} segments",
            allocations.iter().sum::<usize>(),
            target_total,
            word_counts.len()
        );

        AllocationPlan {
            target_total,
            allocations,
        }
    }
}

/// Nudge allocations until they sum to `target`, or no segment can absorb more
fn reconcile(word_counts: &[usize], allocations: &mut [usize], target: usize) {
    let current: usize = allocations.iter().sum();

    if current < target {
        let mut missing = target - current;
        // Largest segments first; the stable sort keeps input order on ties.
        let mut order: Vec<usize> = (0..word_counts.len()).collect();
        order.sort_by(|a, b| word_counts[*b].cmp(&word_counts[*a]));

        while missing > 0 {
            let mut progressed = false;
            for &i in &order {
                if missing == 0 {
                    break;
                }
                if allocations[i] < word_counts[i] {
                    allocations[i] += 1;
                    missing -= 1;
                    progressed = true;
                }
            }
            if !progressed {
                break;
            }
        }
    } else if current > target {
        let mut excess = current - target;
        let mut order: Vec<usize> = (0..word_counts.len()).collect();
        order.sort_by_key(|i| word_counts[*i]);

        while excess > 0 {
            let mut progressed = false;
            for &i in &order {
                if excess == 0 {
                    break;
                }
                if allocations[i] > 0 {
                    allocations[i] -= 1;
                    excess -= 1;
                    progressed = true;
                }
            }
            if !progressed {
                break;
            }
        }
    }
}

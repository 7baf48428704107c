/*!
 * Tests for the global allocation planner
 */

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use wordweave::processing::{AllocationPlanner, FixedSource, RngSource};

/// Random batches of word counts, reproducible per seed
fn batches(seed: u64, count: usize) -> Vec<Vec<usize>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let len = rng.random_range(1..12);
            (0..len).map(|_| rng.random_range(0..40)).collect()
        })
        .collect()
}

#[test]
fn test_plan_withRandomBatches_shouldHitTargetWithinCapacity() {
    for rate in [0.05, 0.2, 0.3, 0.75, 1.0] {
        let planner = AllocationPlanner::new(rate);
        for (i, counts) in batches(11, 200).into_iter().enumerate() {
            let plan = planner.plan(&counts, &mut RngSource::seeded(i as u64));
            let total: usize = counts.iter().sum();

            assert_eq!(plan.allocations.len(), counts.len());
            for (allocated, words) in plan.allocations.iter().zip(&counts) {
                assert!(allocated <= words, "{:?} -> {:?}", counts, plan.allocations);
            }
            if total > 0 {
                assert_eq!(plan.total(), plan.target_total, "{:?} at {}", counts, rate);
                assert_eq!(plan.target_total, ((total as f64 * rate).round() as usize).max(1));
            } else {
                assert_eq!(plan.total(), 0);
            }
        }
    }
}

#[test]
fn test_plan_withEmptySegments_shouldGiveThemNothing() {
    let planner = AllocationPlanner::new(0.5);
    let plan = planner.plan(&[0, 10, 0, 6], &mut FixedSource(0.0));
    assert_eq!(plan.target_total, 8);
    assert_eq!(plan.allocations[0], 0);
    assert_eq!(plan.allocations[2], 0);
    assert_eq!(plan.total(), 8);
}

#[test]
fn test_planner_withOutOfRangeRate_shouldClamp() {
    assert_eq!(AllocationPlanner::new(3.0).rate(), 1.0);
    assert_eq!(AllocationPlanner::new(-1.0).rate(), 0.0);
    assert_eq!(AllocationPlanner::new(f64::NAN).rate(), 0.0);
}

#[test]
fn test_plan_withZeroRate_shouldStillTargetOneReplacement() {
    let planner = AllocationPlanner::new(0.0);
    let plan = planner.plan(&[4, 4], &mut FixedSource(0.5));
    assert_eq!(plan.target_total, 1);
    assert_eq!(plan.total(), 1);
}

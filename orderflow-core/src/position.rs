//! Stage position allocation
//!
//! Stages order by a sparse integer key. Inserting between two neighbors
//! takes the arithmetic midpoint of their keys, so a reorder touches one row
//! instead of renumbering the whole pipeline. When repeated insertions
//! exhaust the gap between two neighbors, allocation fails with
//! [`PositionExhausted`] and the store renumbers the pipeline back to evenly
//! spaced baseline values before retrying once.

use thiserror::Error;

/// Position given to the first stage of an empty pipeline
pub const BASE_POSITION: i64 = 10;

/// Gap left between stages appended to either end, and between stages after
/// a renumbering pass
pub const POSITION_STEP: i64 = 10;

/// Lower bound for allocated positions
pub const MIN_POSITION: i64 = 0;

/// The gap between the requested neighbors cannot fit another stage.
///
/// Not an end state: the store renumbers the pipeline and retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no position available between the requested neighbors")]
pub struct PositionExhausted;

/// Compute an ordering key for a stage inserted between two neighbors.
///
/// `prev` is the position of the stage the new one goes after, `next` the
/// position of the stage it goes before; either may be absent at the ends of
/// the pipeline.
pub fn allocate(prev: Option<i64>, next: Option<i64>) -> Result<i64, PositionExhausted> {
    match (prev, next) {
        (None, None) => Ok(BASE_POSITION),
        (Some(prev), None) => Ok(prev + POSITION_STEP),
        (None, Some(next)) => {
            let candidate = (next - POSITION_STEP).max(MIN_POSITION);
            if candidate < next {
                Ok(candidate)
            } else {
                Err(PositionExhausted)
            }
        }
        (Some(prev), Some(next)) => {
            debug_assert!(prev < next);
            let mid = prev + (next - prev) / 2;
            if mid > prev && mid < next {
                Ok(mid)
            } else {
                Err(PositionExhausted)
            }
        }
    }
}

/// Evenly spaced baseline positions for `count` stages.
///
/// Used by the store when a pipeline is renumbered after exhaustion.
pub fn renumbered(count: usize) -> Vec<i64> {
    (0..count)
        .map(|i| BASE_POSITION + (i as i64) * POSITION_STEP)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_empty_pipeline() {
        assert_eq!(allocate(None, None), Ok(BASE_POSITION));
    }

    #[test]
    fn test_allocate_append_after_last() {
        assert_eq!(allocate(Some(40), None), Ok(50));
    }

    #[test]
    fn test_allocate_before_first() {
        assert_eq!(allocate(None, Some(40)), Ok(30));
    }

    #[test]
    fn test_allocate_before_first_clamps_to_floor() {
        assert_eq!(allocate(None, Some(5)), Ok(MIN_POSITION));
    }

    #[test]
    fn test_allocate_before_first_exhausted_at_floor() {
        assert_eq!(allocate(None, Some(MIN_POSITION)), Err(PositionExhausted));
    }

    #[test]
    fn test_allocate_midpoint() {
        assert_eq!(allocate(Some(10), Some(20)), Ok(15));
        assert_eq!(allocate(Some(10), Some(13)), Ok(11));
    }

    #[test]
    fn test_allocate_adjacent_neighbors_exhausted() {
        assert_eq!(allocate(Some(10), Some(11)), Err(PositionExhausted));
    }

    #[test]
    fn test_renumbered_spacing() {
        assert_eq!(renumbered(4), vec![10, 20, 30, 40]);
        assert!(renumbered(0).is_empty());
    }

    /// Repeatedly inserting between the same two neighbors must keep
    /// succeeding once the caller renumbers on exhaustion, and positions must
    /// stay pairwise distinct throughout.
    #[test]
    fn test_repeated_insertion_with_renumbering() {
        // Two reserved bounds with 50 insertions squeezed between them,
        // mimicking the store's renumber-and-retry-once loop.
        let mut positions: Vec<i64> = vec![10, 20];
        let mut renumber_count = 0;

        for _ in 0..50 {
            let at = positions.len() - 1;
            let allocated = match allocate(Some(positions[at - 1]), Some(positions[at])) {
                Ok(p) => p,
                Err(PositionExhausted) => {
                    renumber_count += 1;
                    let fresh = renumbered(positions.len());
                    positions.copy_from_slice(&fresh);
                    allocate(Some(positions[at - 1]), Some(positions[at]))
                        .expect("allocation after renumbering must succeed")
                }
            };
            positions.insert(at, allocated);
        }

        assert_eq!(positions.len(), 52);
        assert!(renumber_count > 0, "gap was never exhausted");
        let mut sorted = positions.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), positions.len(), "positions must be distinct");
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }
}

//! Milestone scheduling.
//!
//! A run records one estimate at every power of ten below the target and a
//! final one at the target itself, giving a logarithmically spaced
//! convergence series:
//!
//! ```text
//! target = 150         ->  [1, 10, 100, 150]
//! target = 10_000_000  ->  [1, 10, 100, 1_000, 10_000, 100_000, 1_000_000, 10_000_000]
//! ```

/// Smallest accepted sample target.
pub const MIN_TARGET: u64 = 1;

/// Largest accepted sample target.
pub const MAX_TARGET: u64 = 100_000_000;

/// Clamp a requested target into `[MIN_TARGET, max_target]`.
///
/// `max_target` is itself bounded by [`MAX_TARGET`]. Out-of-range requests are
/// silently clamped, never rejected.
#[must_use]
pub fn clamp_target(requested: u64, max_target: u64) -> u64 {
    let upper = max_target.clamp(MIN_TARGET, MAX_TARGET);
    requested.clamp(MIN_TARGET, upper)
}

/// Compute the milestone sequence for a (clamped) target.
///
/// The result is strictly increasing, has no duplicates and always ends with
/// `target`. A target of zero is treated as one.
///
/// # Example
///
/// ```rust
/// use pisim::engine::milestones::milestones;
///
/// assert_eq!(milestones(150), vec![1, 10, 100, 150]);
/// assert_eq!(milestones(1000), vec![1, 10, 100, 1000]);
/// ```
#[must_use]
pub fn milestones(target: u64) -> Vec<u64> {
    let target = target.max(MIN_TARGET);
    let mut sequence = Vec::new();

    let mut current: u64 = 1;
    while current < target {
        sequence.push(current);
        match current.checked_mul(10) {
            Some(next) => current = next,
            None => break,
        }
    }

    if sequence.last() != Some(&target) {
        sequence.push(target);
    }
    sequence
}

//! Weighted random choice of route endpoints.
//!
//! The start settlement is drawn in proportion to population. The end
//! settlement, excluding the start, is drawn in proportion to
//! `population / sqrt(distance + 1)`, so large nearby towns attract the
//! most traffic and distant hamlets are rarely chosen.

use rand::Rng;
use trailwear_types::Settlement;

/// Pick an index with probability proportional to its weight.
///
/// Non-finite and non-positive weights never win. Returns `None` when no
/// weight is positive.
pub fn weighted_index<R: Rng + ?Sized>(weights: &[f64], rng: &mut R) -> Option<usize> {
    let total: f64 = weights
        .iter()
        .copied()
        .filter(|w| w.is_finite() && *w > 0.0)
        .sum();
    if !(total.is_finite() && total > 0.0) {
        return None;
    }

    let roll = rng.random_range(0.0..total);
    let mut cumulative = 0.0;
    let mut last_positive = None;
    for (i, &weight) in weights.iter().enumerate() {
        if !(weight.is_finite() && weight > 0.0) {
            continue;
        }
        cumulative += weight;
        last_positive = Some(i);
        if roll < cumulative {
            return Some(i);
        }
    }
    // Rounding can leave the roll just past the final cumulative sum.
    last_positive
}

/// Attraction of `candidate` as a destination for traffic leaving `start`.
pub fn end_weight(start: &Settlement, candidate: &Settlement) -> f64 {
    candidate.population / (start.distance_to(candidate) + 1.0).sqrt()
}

/// Draw a start settlement weighted by population.
pub fn pick_start<R: Rng + ?Sized>(settlements: &[Settlement], rng: &mut R) -> Option<usize> {
    if settlements.len() < 2 {
        return None;
    }
    let weights: Vec<f64> = settlements.iter().map(|s| s.population).collect();
    weighted_index(&weights, rng)
}

/// Draw an end settlement for `start`, never `start` itself.
pub fn pick_end<R: Rng + ?Sized>(
    settlements: &[Settlement],
    start: usize,
    rng: &mut R,
) -> Option<usize> {
    let origin = settlements.get(start)?;
    let weights: Vec<f64> = settlements
        .iter()
        .enumerate()
        .map(|(i, s)| if i == start { 0.0 } else { end_weight(origin, s) })
        .collect();
    weighted_index(&weights, rng)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::arithmetic_side_effects)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn zero_weights_are_never_chosen() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..500 {
            let i = weighted_index(&[0.0, 3.0, -1.0, f64::NAN, 1.0], &mut rng).unwrap();
            assert!(i == 1 || i == 4);
        }
    }

    #[test]
    fn all_zero_weights_yield_none() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(weighted_index(&[0.0, 0.0], &mut rng), None);
        assert_eq!(weighted_index(&[], &mut rng), None);
    }

    #[test]
    fn draws_follow_weights() {
        let mut rng = StdRng::seed_from_u64(99);
        let mut counts = [0_u32; 2];
        for _ in 0..10_000 {
            counts[weighted_index(&[1.0, 3.0], &mut rng).unwrap()] += 1;
        }
        let share = f64::from(counts[1]) / 10_000.0;
        assert!((share - 0.75).abs() < 0.03, "share was {share}");
    }

    #[test]
    fn end_excludes_start() {
        let towns = vec![
            Settlement::new("A", 100.0, 0, 0),
            Settlement::new("B", 100.0, 10, 0),
        ];
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            assert_eq!(pick_end(&towns, 0, &mut rng), Some(1));
            assert_eq!(pick_end(&towns, 1, &mut rng), Some(0));
        }
    }

    #[test]
    fn fewer_than_two_settlements_is_no_pair() {
        let mut rng = StdRng::seed_from_u64(3);
        let one = vec![Settlement::new("Solo", 10.0, 0, 0)];
        assert_eq!(pick_start(&one, &mut rng), None);
        assert_eq!(pick_end(&one, 0, &mut rng), None);
        assert_eq!(pick_start(&[], &mut rng), None);
    }

    #[test]
    fn nearer_towns_attract_more() {
        let origin = Settlement::new("O", 1.0, 0, 0);
        let near = Settlement::new("N", 100.0, 3, 0);
        let far = Settlement::new("F", 100.0, 300, 0);
        assert!(end_weight(&origin, &near) > end_weight(&origin, &far));
        // Distance zero gives the raw population.
        let same = Settlement::new("S", 50.0, 0, 0);
        assert!((end_weight(&origin, &same) - 50.0).abs() < 1e-9);
    }
}

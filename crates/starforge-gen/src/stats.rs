//! Small statistical helpers shared by the stages.

use rand::Rng;
use rand_distr::{Distribution, Normal, Poisson};

/// Bin `values` into `bins` equal-width, right-inclusive intervals and return
/// each value's 1-based bin label.
///
/// The outer edges follow the usual dataframe convention: a degenerate range
/// is widened by 0.1% on both sides, otherwise only the lowest edge is pulled
/// down by 0.1% of the range so the minimum falls inside the first bin.
pub fn cut(values: &[f64], bins: usize) -> Vec<usize> {
  if values.is_empty() || bins == 0 {
    return Vec::new();
  }

  let mut lo = values.iter().copied().fold(f64::INFINITY, f64::min);
  let mut hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

  let mut edges: Vec<f64>;
  if lo == hi {
    let pad = if lo == 0.0 { 0.001 } else { 0.001 * lo.abs() };
    lo -= pad;
    hi += pad;
    edges = linspace(lo, hi, bins);
  } else {
    edges = linspace(lo, hi, bins);
    edges[0] -= (hi - lo) * 0.001;
  }

  values
    .iter()
    .map(|v| edges.iter().filter(|e| **e < *v).count().clamp(1, bins))
    .collect()
}

fn linspace(lo: f64, hi: f64, bins: usize) -> Vec<f64> {
  let step = (hi - lo) / bins as f64;
  let mut edges: Vec<f64> = (0..bins).map(|i| lo + step * i as f64).collect();
  edges.push(hi);
  edges
}

/// The line through `(x0, y0)` and `(x1, y1)` as `(slope, intercept)`.
pub fn line_through((x0, y0): (f64, f64), (x1, y1): (f64, f64)) -> (f64, f64) {
  let slope = (y1 - y0) / (x1 - x0);
  (slope, y0 - slope * x0)
}

/// Evaluate the line through two points at `x`.
pub fn interpolate(p0: (f64, f64), p1: (f64, f64), x: f64) -> f64 {
  let (m, b) = line_through(p0, p1);
  m * x + b
}

/// Linearly map `values` onto `[lo, hi]`. A constant input maps to the
/// midpoint.
pub fn min_max_rescale(values: &[f64], lo: f64, hi: f64) -> Vec<f64> {
  let min = values.iter().copied().fold(f64::INFINITY, f64::min);
  let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

  if !(max > min) {
    return vec![(lo + hi) / 2.0; values.len()];
  }
  values.iter().map(|v| lo + (v - min) / (max - min) * (hi - lo)).collect()
}

/// One draw from N(mean, sd); a degenerate deviation yields the mean.
pub fn normal(rng: &mut impl Rng, mean: f64, sd: f64) -> f64 {
  match Normal::new(mean, sd) {
    Ok(dist) => dist.sample(rng),
    Err(_) => mean,
  }
}

/// One draw from Poisson(lambda); a non-positive rate yields zero.
pub fn poisson(rng: &mut impl Rng, lambda: f64) -> usize {
  match Poisson::new(lambda) {
    Ok(dist) => {
      let draw: f64 = dist.sample(rng);
      draw as usize
    }
    Err(_) => 0,
  }
}

#[cfg(test)]
mod tests {
  use rand::SeedableRng;
  use rand_chacha::ChaCha8Rng;

  use super::*;

  #[test]
  fn cut_labels_are_right_inclusive() {
    // Edges: 0 - 0.01, 5, 10.
    assert_eq!(cut(&[0.0, 5.0, 5.1, 10.0], 2), [1, 1, 2, 2]);
  }

  #[test]
  fn cut_minimum_lands_in_first_bin() {
    let labels = cut(&[3.0, 4.0, 9.0, 12.0], 3);
    assert_eq!(labels, [1, 1, 2, 3]);
  }

  #[test]
  fn cut_constant_input_uses_middle_bin() {
    // The widened range puts a constant value in the middle bin.
    assert_eq!(cut(&[7.0, 7.0, 7.0], 5), [3, 3, 3]);
    assert_eq!(cut(&[0.0], 4), [2]);
    assert!(cut(&[], 4).is_empty());
  }

  #[test]
  fn rescale_spans_target_range() {
    let scaled = min_max_rescale(&[-2.0, 0.0, 2.0], 1.0, 30.0);
    assert_eq!(scaled, [1.0, 15.5, 30.0]);
    assert_eq!(min_max_rescale(&[4.0, 4.0], 1.0, 30.0), [15.5, 15.5]);
  }

  #[test]
  fn interpolation_hits_both_anchors() {
    assert_eq!(interpolate((100.0, 2.0), (1100.0, 42.0), 100.0), 2.0);
    assert_eq!(interpolate((100.0, 2.0), (1100.0, 42.0), 600.0), 22.0);
    let (m, b) = line_through((1.0, 15.0), (30.0, 100.0));
    assert!((m * 30.0 + b - 100.0).abs() < 1e-9);
  }

  #[test]
  fn degenerate_distributions_do_not_panic() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    assert_eq!(normal(&mut rng, 3.0, -1.0), 3.0);
    assert_eq!(poisson(&mut rng, 0.0), 0);
    let _ = poisson(&mut rng, 4.5);
  }
}

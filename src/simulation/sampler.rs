//! # Categorical Sampling
//!
//! Draws from discrete probability vectors taken from fitted tables. Tables
//! fitted from finite counts carry rounding residue, so a vector whose sum is
//! within [`DRIFT_TOLERANCE`] of one is corrected by adjusting its first entry
//! before sampling.

use rand::seq::SliceRandom;
use rand::Rng;
use rand_distr::{Distribution, WeightedIndex};

use crate::domain::{Result, SimulationError};

/// Largest normalization drift that is corrected instead of rejected
pub const DRIFT_TOLERANCE: f64 = 0.1;

/// Return a copy of `probabilities` summing to exactly one.
///
/// The residual is folded into the first entry. Fails if the vector is empty,
/// has non-finite entries, drifts by more than [`DRIFT_TOLERANCE`], or has a
/// negative entry after correction.
pub fn normalize(probabilities: &[f64]) -> Result<Vec<f64>> {
    if probabilities.is_empty() {
        return Err(SimulationError::invalid_distribution("empty probability vector"));
    }
    if probabilities.iter().any(|p| !p.is_finite()) {
        return Err(SimulationError::invalid_distribution(format!(
            "non-finite probability in {probabilities:?}"
        )));
    }

    let sum: f64 = probabilities.iter().sum();
    let residual = 1.0 - sum;
    if residual.abs() > DRIFT_TOLERANCE {
        return Err(SimulationError::invalid_distribution(format!(
            "probabilities sum to {sum:.4}"
        )));
    }

    let mut corrected = probabilities.to_vec();
    corrected[0] += residual;

    if let Some(p) = corrected.iter().find(|p| **p < 0.0) {
        return Err(SimulationError::invalid_distribution(format!(
            "negative probability {p:.4} after correction"
        )));
    }

    Ok(corrected)
}

/// Draw an index weighted by `probabilities`
pub fn sample_index<R: Rng + ?Sized>(rng: &mut R, probabilities: &[f64]) -> Result<usize> {
    let corrected = normalize(probabilities)?;
    let weights = WeightedIndex::new(&corrected)
        .map_err(|e| SimulationError::invalid_distribution(e.to_string()))?;
    Ok(weights.sample(rng))
}

/// Draw one of `categories` weighted by `probabilities`
pub fn sample<'a, T, R: Rng + ?Sized>(
    rng: &mut R,
    categories: &'a [T],
    probabilities: &[f64],
) -> Result<&'a T> {
    if categories.len() != probabilities.len() {
        return Err(SimulationError::invalid_distribution(format!(
            "{} categories but {} probabilities",
            categories.len(),
            probabilities.len()
        )));
    }
    let index = sample_index(rng, probabilities)?;
    Ok(&categories[index])
}

/// Draw uniformly from `categories`
pub fn sample_uniform<'a, T, R: Rng + ?Sized>(rng: &mut R, categories: &'a [T]) -> Result<&'a T> {
    categories
        .choose(rng)
        .ok_or_else(|| SimulationError::invalid_distribution("no categories to choose from"))
}

/// True when every weight is zero, the marker for "no data for this row"
pub fn is_degenerate(probabilities: &[f64]) -> bool {
    probabilities.iter().all(|p| *p == 0.0)
}

//! Chi-squared distance between normalized frequency distributions.

use std::collections::HashMap;

use crate::error::{Result, T2tError};
use crate::freq::NormalizedVector;
use crate::matrix::SimilarityEngine;

/// `sum (a_i - b_i)^2 / (a_i + b_i)` over bins, optionally on the cumulative
/// distributions. Bins empty in both vectors contribute nothing.
///
/// Degenerate (zero document frequency) inputs are maximally dissimilar:
/// 2.0 in plain mode, the vector length in CDF mode.
///
/// # Example
/// ```
/// use t2t::{FrequencyVector, chi_squared};
/// let cat = FrequencyVector::new(vec![2, 2]).normalize();
/// let dog = FrequencyVector::new(vec![4, 0]).normalize();
/// let d = chi_squared(&cat, &dog, false).unwrap();
/// assert!((d - 2.0 / 3.0).abs() < 1e-12);
/// ```
pub fn chi_squared(a: &NormalizedVector, b: &NormalizedVector, use_cdf: bool) -> Result<f64> {
    if a.len() != b.len() {
        return Err(T2tError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    if a.is_degenerate() || b.is_degenerate() {
        return Ok(max_distance(a.len(), use_cdf));
    }

    if use_cdf {
        Ok(plain(a.cumulative().values(), b.cumulative().values()))
    } else {
        Ok(plain(a.values(), b.values()))
    }
}

/// Upper bound of the statistic for vectors of `len` bins.
pub fn max_distance(len: usize, use_cdf: bool) -> f64 {
    if use_cdf { len as f64 } else { 2.0 }
}

fn plain(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| {
            let sum = x + y;
            if sum == 0.0 { 0.0 } else { (x - y).powi(2) / sum }
        })
        .sum()
}

/// Chi-squared engine over the prepared vectors of one (type, variant) pass.
pub struct ChiSquared {
    vectors: HashMap<String, NormalizedVector>,
    use_cdf: bool,
}

impl ChiSquared {
    pub fn new(vectors: HashMap<String, NormalizedVector>, use_cdf: bool) -> Self {
        ChiSquared { vectors, use_cdf }
    }

    pub fn contains(&self, term: &str) -> bool {
        self.vectors.contains_key(term)
    }
}

impl SimilarityEngine for ChiSquared {
    fn similarity(&mut self, a: &str, b: &str) -> Result<f64> {
        let lookup = |t: &str| {
            self.vectors
                .get(t)
                .ok_or_else(|| T2tError::MissingData(format!("no distribution for term '{t}'")))
        };
        chi_squared(lookup(a)?, lookup(b)?, self.use_cdf)
    }
}

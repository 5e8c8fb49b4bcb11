//! Pointwise mutual information between index terms.
//!
//! `pmi(a, b) = ln( P(a,b) / (P(a) * P(b)) )` with probabilities estimated
//! from document frequencies over the `N` documents of the index.

use std::collections::HashMap;

use log::{debug, warn};

use crate::error::{Result, T2tError};
use crate::index::CoOccurrenceStatistics;
use crate::matrix::SimilarityEngine;

/// PMI over a [`CoOccurrenceStatistics`] source.
///
/// Per-term document frequencies are memoized so every distinct term is
/// looked up once; pair lookups are left to the matrix cache.
pub struct PmiEngine<'i, S: CoOccurrenceStatistics + ?Sized> {
    stats: &'i S,
    total: u64,
    df_cache: HashMap<String, u64>,
}

impl<'i, S: CoOccurrenceStatistics + ?Sized> PmiEngine<'i, S> {
    /// Fails with [`T2tError::DegenerateInput`] on an empty index.
    pub fn new(stats: &'i S) -> Result<Self> {
        let total = stats.total_documents();
        if total == 0 {
            return Err(T2tError::DegenerateInput(
                "index holds no documents; PMI is undefined".into(),
            ));
        }
        Ok(PmiEngine {
            stats,
            total,
            df_cache: HashMap::new(),
        })
    }

    /// Value reported for pairs whose PMI is undefined: `-ln(N)`, the
    /// smallest PMI an observed pair can reach in this index.
    pub fn undefined_value(&self) -> f64 {
        -(self.total as f64).ln()
    }

    fn df(&mut self, term: &str) -> u64 {
        if let Some(&df) = self.df_cache.get(term) {
            return df;
        }
        let df = self.stats.document_frequency(term);
        self.df_cache.insert(term.to_string(), df);
        df
    }

    pub fn pmi(&mut self, a: &str, b: &str) -> f64 {
        let df_a = self.df(a);
        let df_b = self.df(b);
        let joint = if a == b {
            df_a
        } else {
            self.stats.joint_document_frequency(a, b)
        };

        if df_a == 0 || df_b == 0 || joint == 0 {
            debug!("pmi({a}, {b}) undefined (df {df_a}/{df_b}, joint {joint})");
            return self.undefined_value();
        }

        let n = self.total as f64;
        let p_a = df_a as f64 / n;
        let p_b = df_b as f64 / n;
        let p_ab = joint as f64 / n;
        let value = (p_ab / (p_a * p_b)).ln();
        if !value.is_finite() {
            warn!("pmi({a}, {b}) not finite, reporting sentinel");
            return self.undefined_value();
        }
        value
    }
}

impl<S: CoOccurrenceStatistics + ?Sized> SimilarityEngine for PmiEngine<'_, S> {
    fn similarity(&mut self, a: &str, b: &str) -> Result<f64> {
        Ok(self.pmi(a, b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::DocumentIndex;
    use std::cell::Cell;

    fn index() -> DocumentIndex {
        let mut idx = DocumentIndex::new("contents");
        for doc in [
            "cat dog", "cat dog", "cat", "dog", "bird", "bird fish", "fish", "cat",
        ] {
            idx.add_document(doc);
        }
        idx
    }

    #[test]
    fn self_pmi_is_negative_log_probability() {
        let idx = index();
        let mut pmi = PmiEngine::new(&idx).unwrap();
        // df(cat) = 4, N = 8
        let expected = -(4.0f64 / 8.0).ln();
        assert!((pmi.pmi("cat", "cat") - expected).abs() < 1e-12);
    }

    #[test]
    fn pair_pmi_matches_formula() {
        let idx = index();
        let mut pmi = PmiEngine::new(&idx).unwrap();
        // df(cat)=4, df(dog)=3, joint=2, N=8
        let expected = ((2.0f64 / 8.0) / ((4.0 / 8.0) * (3.0 / 8.0))).ln();
        assert!((pmi.pmi("cat", "dog") - expected).abs() < 1e-12);
        assert_eq!(pmi.pmi("cat", "dog"), pmi.pmi("dog", "cat"));
    }

    #[test]
    fn undefined_pmi_uses_sentinel() {
        let idx = index();
        let mut pmi = PmiEngine::new(&idx).unwrap();
        let sentinel = -(8.0f64).ln();
        assert_eq!(pmi.pmi("cat", "fish"), sentinel);
        assert_eq!(pmi.pmi("cat", "unicorn"), sentinel);
        assert_eq!(pmi.pmi("unicorn", "unicorn"), sentinel);
        assert!(pmi.pmi("cat", "fish").is_finite());
    }

    #[test]
    fn empty_index_is_degenerate() {
        let idx = DocumentIndex::new("contents");
        assert!(matches!(
            PmiEngine::new(&idx),
            Err(T2tError::DegenerateInput(_))
        ));
    }

    struct Spy {
        df_calls: Cell<usize>,
    }

    impl CoOccurrenceStatistics for Spy {
        fn document_frequency(&self, _: &str) -> u64 {
            self.df_calls.set(self.df_calls.get() + 1);
            2
        }
        fn joint_document_frequency(&self, _: &str, _: &str) -> u64 {
            1
        }
        fn total_documents(&self) -> u64 {
            10
        }
    }

    #[test]
    fn term_frequencies_looked_up_once() {
        let spy = Spy { df_calls: Cell::new(0) };
        let mut pmi = PmiEngine::new(&spy).unwrap();
        pmi.pmi("a", "b");
        pmi.pmi("a", "c");
        pmi.pmi("b", "c");
        pmi.pmi("a", "a");
        assert_eq!(spy.df_calls.get(), 3);
    }
}

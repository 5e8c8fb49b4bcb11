//! Term x term similarity matrices with symmetric-pair memoization.

use std::collections::{BTreeSet, HashMap};

use log::debug;

use crate::error::Result;

/// A pairwise similarity measure over terms.
pub trait SimilarityEngine {
    fn similarity(&mut self, a: &str, b: &str) -> Result<f64>;
}

/// Receives a finished matrix: the header once, then one row per term.
pub trait ReportSink {
    fn header(&mut self, terms: &[String]) -> Result<()>;
    fn row(&mut self, term: &str, values: &[f64]) -> Result<()>;
}

/// Canonical key for an unordered pair of terms.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PairKey<'a>(&'a str, &'a str);

impl<'a> PairKey<'a> {
    /// Orders the two terms lexicographically so `(a, b)` and `(b, a)` collide.
    pub fn new(a: &'a str, b: &'a str) -> Self {
        if a <= b { PairKey(a, b) } else { PairKey(b, a) }
    }

    pub fn first(&self) -> &'a str {
        self.0
    }

    pub fn second(&self) -> &'a str {
        self.1
    }
}

/// Distinct terms of all queries, sorted.
///
/// # Example
/// ```
/// use t2t::vocabulary;
/// let terms = vocabulary(["dog cat", "cat  bird"]);
/// assert_eq!(terms, vec!["bird", "cat", "dog"]);
/// ```
pub fn vocabulary<'q, I>(queries: I) -> Vec<String>
where
    I: IntoIterator<Item = &'q str>,
{
    queries
        .into_iter()
        .flat_map(str::split_whitespace)
        .map(String::from)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// `terms={'a','b'}` line echoed after a report.
pub fn vocabulary_echo(terms: &[String]) -> String {
    let quoted: Vec<String> = terms.iter().map(|t| format!("'{t}'")).collect();
    format!("terms={{{}}}", quoted.join(","))
}

/// Square similarity matrix in vocabulary order.
#[derive(Clone, Debug, PartialEq)]
pub struct SimilarityMatrix {
    terms: Vec<String>,
    values: Vec<f64>,
    evaluations: usize,
}

impl SimilarityMatrix {
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn row(&self, i: usize) -> &[f64] {
        let n = self.terms.len();
        &self.values[i * n..(i + 1) * n]
    }

    /// Value for the pair, `None` if either term is not on the axes.
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.terms.binary_search_by(|t| t.as_str().cmp(a)).ok()?;
        let j = self.terms.binary_search_by(|t| t.as_str().cmp(b)).ok()?;
        Some(self.values[i * self.terms.len() + j])
    }

    /// Number of engine calls needed to build this matrix.
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    pub fn emit<S: ReportSink + ?Sized>(&self, sink: &mut S) -> Result<()> {
        sink.header(&self.terms)?;
        for (i, term) in self.terms.iter().enumerate() {
            sink.row(term, self.row(i))?;
        }
        Ok(())
    }
}

/// Drives the vocabulary x vocabulary loop for one engine.
pub struct TermMatrixBuilder {
    terms: Vec<String>,
}

impl TermMatrixBuilder {
    /// `terms` are de-duplicated and sorted.
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let terms = terms
            .into_iter()
            .map(Into::into)
            .collect::<BTreeSet<String>>()
            .into_iter()
            .collect();
        TermMatrixBuilder { terms }
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Compute every cell; each unordered pair reaches the engine exactly once.
    pub fn build<E: SimilarityEngine + ?Sized>(&self, engine: &mut E) -> Result<SimilarityMatrix> {
        let n = self.terms.len();
        let mut cache: HashMap<PairKey<'_>, f64> = HashMap::with_capacity(n * (n + 1) / 2);
        let mut values = Vec::with_capacity(n * n);

        for term in &self.terms {
            for other in &self.terms {
                let key = PairKey::new(term, other);
                let sim = match cache.get(&key) {
                    Some(&v) => v,
                    None => {
                        let v = engine.similarity(key.first(), key.second())?;
                        cache.insert(key, v);
                        v
                    }
                };
                values.push(sim);
            }
        }

        debug!("built {n}x{n} matrix with {} engine calls", cache.len());
        Ok(SimilarityMatrix {
            terms: self.terms.clone(),
            values,
            evaluations: cache.len(),
        })
    }

    /// Build and hand the matrix to `sink`.
    pub fn build_into<E, S>(&self, engine: &mut E, sink: &mut S) -> Result<SimilarityMatrix>
    where
        E: SimilarityEngine + ?Sized,
        S: ReportSink + ?Sized,
    {
        let matrix = self.build(engine)?;
        matrix.emit(sink)?;
        Ok(matrix)
    }
}

//! Frequency-distribution vectors: parsing, normalization and the zero-bin
//! augmentation applied before chi-squared comparison.

use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

use log::{debug, warn};

use crate::error::{Result, T2tError};

/// Default number of bins per frequency distribution.
pub const DEFAULT_BINS: usize = 1000;

/// Frequency representation selecting which distribution file to load.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Freq {
    Phi,
    Rel,
    Sqrt,
    Log,
    Ratio,
    Zero,
    Diri,
}

impl Freq {
    pub const ALL: [Freq; 7] = [
        Freq::Phi,
        Freq::Rel,
        Freq::Sqrt,
        Freq::Log,
        Freq::Ratio,
        Freq::Zero,
        Freq::Diri,
    ];

    /// Name of the per-query distribution file for this type.
    ///
    /// # Example
    /// ```
    /// use t2t::Freq;
    /// assert_eq!(Freq::Diri.file_name(1000), "contents_dirichlet_freq_1000.csv");
    /// assert_eq!(Freq::Log.file_name(1000), "contents_all_freq_1000.csv");
    /// ```
    pub fn file_name(self, bins: usize) -> String {
        let stem = match self {
            Freq::Diri => "dirichlet",
            Freq::Zero => "zero",
            Freq::Phi => "phi",
            Freq::Rel | Freq::Sqrt | Freq::Log | Freq::Ratio => "all",
        };
        format!("contents_{stem}_freq_{bins}.csv")
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Freq::Phi => "Phi",
            Freq::Rel => "Rel",
            Freq::Sqrt => "Sqrt",
            Freq::Log => "Log",
            Freq::Ratio => "Ratio",
            Freq::Zero => "Zero",
            Freq::Diri => "Diri",
        }
    }
}

impl fmt::Display for Freq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Freq {
    type Err = T2tError;

    fn from_str(s: &str) -> Result<Self> {
        Freq::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| T2tError::Configuration(format!("unknown frequency type '{s}'")))
    }
}

/// Per-bin counts for one term. Never mutated after construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrequencyVector {
    counts: Vec<u64>,
}

impl FrequencyVector {
    pub fn new(counts: Vec<u64>) -> Self {
        FrequencyVector { counts }
    }

    /// Parse `term<TAB>c_0<TAB>...<TAB>c_{bins-1}` into the term and its counts.
    ///
    /// # Example
    /// ```
    /// use t2t::FrequencyVector;
    /// let (term, v) = FrequencyVector::parse("cat\t2\t2", 2).unwrap();
    /// assert_eq!(term, "cat");
    /// assert_eq!(v.counts(), &[2, 2]);
    /// ```
    pub fn parse(raw_line: &str, bins: usize) -> Result<(String, FrequencyVector)> {
        let mut fields = raw_line.trim_end_matches(['\r', '\n']).split('\t');
        let term = match fields.next() {
            Some(t) if !t.trim().is_empty() => t.trim().to_string(),
            _ => return Err(T2tError::format("line has no term")),
        };

        let counts = fields
            .map(|tok| {
                tok.trim().parse::<u64>().map_err(|_| {
                    T2tError::format(format!("non-numeric count '{tok}' for term '{term}'"))
                })
            })
            .collect::<Result<Vec<u64>>>()?;

        if counts.len() != bins {
            return Err(T2tError::format(format!(
                "term '{term}' has {} bins, expected {bins}",
                counts.len()
            )));
        }
        Ok((term, FrequencyVector { counts }))
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all bin counts.
    pub fn document_frequency(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Append one bin holding the mass the term did not occupy in a
    /// population of `population` documents.
    pub fn augment_with_zero_bin(&self, population: u64) -> FrequencyVector {
        let df = self.document_frequency();
        if population < df {
            warn!("population {population} is smaller than document frequency {df}; zero bin clamped to 0");
        }
        let mut counts = Vec::with_capacity(self.counts.len() + 1);
        counts.extend_from_slice(&self.counts);
        counts.push(population.saturating_sub(df));
        FrequencyVector { counts }
    }

    /// Relative frequencies within the term's own distribution.
    ///
    /// A vector with zero document frequency yields an all-zero result
    /// flagged as degenerate instead of NaN entries.
    pub fn normalize(&self) -> NormalizedVector {
        let df = self.document_frequency();
        if df == 0 {
            return NormalizedVector {
                values: vec![0.0; self.counts.len()],
                degenerate: true,
            };
        }
        let df = df as f64;
        NormalizedVector {
            values: self.counts.iter().map(|&c| c as f64 / df).collect(),
            degenerate: false,
        }
    }
}

/// Probability-like vector derived from a [`FrequencyVector`].
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedVector {
    values: Vec<f64>,
    degenerate: bool,
}

impl NormalizedVector {
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// True when the source vector had zero document frequency.
    pub fn is_degenerate(&self) -> bool {
        self.degenerate
    }

    /// Prefix sums along the bin axis.
    pub fn cumulative(&self) -> NormalizedVector {
        let mut acc = 0.0;
        let values = self
            .values
            .iter()
            .map(|v| {
                acc += v;
                acc
            })
            .collect();
        NormalizedVector {
            values,
            degenerate: self.degenerate,
        }
    }
}

/// Read a per-query distribution file into a term -> vector map.
///
/// Blank lines are ignored. A missing file is [`T2tError::MissingData`].
pub fn load_frequency_file(path: &Path, bins: usize) -> Result<HashMap<String, FrequencyVector>> {
    let file = File::open(path).map_err(|e| {
        T2tError::MissingData(format!("cannot open {}: {e}", path.display()))
    })?;

    let mut map = HashMap::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let (term, vector) = FrequencyVector::parse(&line, bins).map_err(|e| e.at(path, idx + 1))?;
        map.insert(term, vector);
    }
    debug!("loaded {} distributions from {}", map.len(), path.display());
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_follow_type() {
        assert_eq!(Freq::Diri.file_name(1000), "contents_dirichlet_freq_1000.csv");
        assert_eq!(Freq::Zero.file_name(1000), "contents_zero_freq_1000.csv");
        assert_eq!(Freq::Phi.file_name(1000), "contents_phi_freq_1000.csv");
        for f in [Freq::Rel, Freq::Sqrt, Freq::Log, Freq::Ratio] {
            assert_eq!(f.file_name(1000), "contents_all_freq_1000.csv");
        }
        assert_eq!(Freq::Rel.file_name(10), "contents_all_freq_10.csv");
    }

    #[test]
    fn unknown_type_is_configuration_error() {
        let err = "Bogus".parse::<Freq>().unwrap_err();
        assert!(matches!(err, T2tError::Configuration(_)));
        assert_eq!("rel".parse::<Freq>().unwrap(), Freq::Rel);
        assert_eq!("Diri".parse::<Freq>().unwrap(), Freq::Diri);
    }

    #[test]
    fn parse_rejects_bad_lines() {
        assert!(matches!(
            FrequencyVector::parse("cat\t1\tx", 2),
            Err(T2tError::Format { .. })
        ));
        assert!(matches!(
            FrequencyVector::parse("cat\t1\t2\t3", 2),
            Err(T2tError::Format { .. })
        ));
        assert!(matches!(
            FrequencyVector::parse("cat\t-1\t2", 2),
            Err(T2tError::Format { .. })
        ));
        assert!(FrequencyVector::parse("\t1\t2", 2).is_err());
    }

    #[test]
    fn normalized_entries_sum_to_one() {
        let v = FrequencyVector::new(vec![3, 0, 7, 11, 1, 0, 29]);
        let n = v.normalize();
        let sum: f64 = n.values().iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        assert!(!n.is_degenerate());
    }

    #[test]
    fn zero_df_normalizes_to_flagged_zero_vector() {
        let n = FrequencyVector::new(vec![0, 0, 0]).normalize();
        assert_eq!(n.values(), &[0.0, 0.0, 0.0]);
        assert!(n.is_degenerate());
    }

    #[test]
    fn zero_bin_adds_exactly_one_bin() {
        let v = FrequencyVector::new(vec![1, 2, 3]);
        let z = v.augment_with_zero_bin(10);
        assert_eq!(z.len(), v.len() + 1);
        assert_eq!(z.counts(), &[1, 2, 3, 4]);
        assert_eq!(z.document_frequency(), 10);

        // population smaller than df clamps instead of underflowing
        assert_eq!(v.augment_with_zero_bin(2).counts(), &[1, 2, 3, 0]);
    }

    #[test]
    fn cumulative_is_prefix_sum() {
        let n = FrequencyVector::new(vec![1, 1, 2]).normalize().cumulative();
        assert_eq!(n.values(), &[0.25, 0.5, 1.0]);
    }

    #[test]
    fn missing_file_is_missing_data() {
        let err = load_frequency_file(Path::new("/definitely/not/here.csv"), 2).unwrap_err();
        assert!(matches!(err, T2tError::MissingData(_)));
    }
}

#![forbid(unsafe_code)]
//! # t2t
//!
//! Term-to-term similarity statistics over the vocabulary of a query set.
//!
//! - **PMI**: pointwise mutual information from document and co-occurrence
//!   frequencies of an index, printed as a tab-delimited matrix.
//! - **Chi-squared**: distance between normalized per-bin frequency
//!   distributions, written as `.xlsx` workbooks (one per index tag, one sheet
//!   per frequency type and variant).
//!
//! Every unordered term pair is computed once and reused for both orderings,
//! so the matrices are exactly symmetric.
//!
//! ## Example
//! ```
//! use t2t::{ChiSquared, FrequencyVector, TermMatrixBuilder};
//! use std::collections::HashMap;
//!
//! let mut vectors = HashMap::new();
//! for line in ["cat\t2\t2", "dog\t4\t0"] {
//!     let (term, v) = FrequencyVector::parse(line, 2).unwrap();
//!     vectors.insert(term, v.normalize());
//! }
//! let mut engine = ChiSquared::new(vectors, false);
//! let m = TermMatrixBuilder::new(["dog", "cat"]).build(&mut engine).unwrap();
//! assert_eq!(m.get("cat", "dog"), m.get("dog", "cat"));
//! assert!((m.get("cat", "dog").unwrap() - 0.6667).abs() < 1e-4);
//! ```

use std::io::Write;

use log::info;

pub mod chi;
pub mod config;
pub mod dataset;
pub mod error;
pub mod freq;
pub mod index;
pub mod matrix;
pub mod pass;
pub mod pmi;
pub mod report;
pub mod xlsx;

pub use chi::{ChiSquared, chi_squared};
pub use config::{RunOptions, Task};
pub use dataset::{Collection, DataSet, Topic};
pub use error::{Result, T2tError};
pub use freq::{Freq, FrequencyVector, NormalizedVector};
pub use index::{CoOccurrenceStatistics, DocumentIndex};
pub use matrix::{
    PairKey, ReportSink, SimilarityEngine, SimilarityMatrix, TermMatrixBuilder, vocabulary,
    vocabulary_echo,
};
pub use pass::{RunReport, TagReport, TagStatus, sheet_name};
pub use pmi::PmiEngine;

/// Open the collection and run the selected task, writing console output to `out`.
///
/// Configuration problems are returned before any report is opened.
pub fn run<W: Write>(opts: &RunOptions, out: &mut W) -> Result<RunReport> {
    opts.validate()?;
    let dataset = DataSet::open(&opts.data_home, opts.collection.clone())?;
    info!(
        "{}: {} distinct query terms",
        dataset.collection(),
        dataset.vocabulary().len()
    );

    match opts.task {
        Task::Pmi => {
            let matrix = pass::run_pmi(&dataset, opts, out)?;
            Ok(RunReport {
                vocabulary: matrix.terms().to_vec(),
                tags: Vec::new(),
                pmi: Some(matrix),
            })
        }
        Task::Chi => pass::run_workbooks(&dataset, opts, out),
    }
}

/// Print failed tags to stderr, mirroring the per-file failure listing.
pub fn print_failed_tags(report: &RunReport) {
    let failed: Vec<&TagReport> = report.failed().collect();
    if failed.is_empty() {
        return;
    }
    eprintln!("\n{} tag(s) failed:", failed.len());
    for t in failed {
        if let TagStatus::Failed(e) = &t.status {
            eprintln!("  - {}: {}", t.tag, e);
        }
    }
}

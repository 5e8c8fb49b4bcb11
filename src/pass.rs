//! Drives whole runs: the PMI console report, or one chi-squared workbook per
//! tag with one sheet per (type, zero, cdf) combination.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use log::{error, info, warn};

use crate::chi::ChiSquared;
use crate::config::RunOptions;
use crate::dataset::DataSet;
use crate::error::{Result, T2tError};
use crate::freq::{Freq, FrequencyVector, NormalizedVector, load_frequency_file};
use crate::index::{CoOccurrenceStatistics, DocumentIndex};
use crate::matrix::{SimilarityMatrix, TermMatrixBuilder, vocabulary_echo};
use crate::pmi::PmiEngine;
use crate::report::{ConsoleTable, SEPARATOR};
use crate::xlsx::{Sheet, Workbook};

/// Sheet name: type, then `Z` when zero-augmented, then `c` for cdf.
///
/// Non-cdf sheets carry no suffix (`RelZ`), unlike the older `RelZp`
/// naming that marked them with a trailing `p`.
///
/// # Example
/// ```
/// use t2t::{Freq, sheet_name};
/// assert_eq!(sheet_name(Freq::Rel, true, false), "RelZ");
/// assert_eq!(sheet_name(Freq::Phi, true, true), "PhiZc");
/// ```
pub fn sheet_name(freq: Freq, zero: bool, cdf: bool) -> String {
    format!(
        "{}{}{}",
        freq,
        if zero { "Z" } else { "" },
        if cdf { "c" } else { "" }
    )
}

#[derive(Debug)]
pub struct SheetReport {
    pub name: String,
    pub terms: usize,
    pub evaluations: usize,
    /// Vocabulary terms without a distribution in this pass.
    pub omitted: Vec<String>,
}

#[derive(Debug)]
pub enum TagStatus {
    Written(PathBuf),
    /// Tag has no meaning for the collection.
    Skipped,
    Failed(T2tError),
}

#[derive(Debug)]
pub struct TagReport {
    pub tag: String,
    pub status: TagStatus,
    pub sheets: Vec<SheetReport>,
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub vocabulary: Vec<String>,
    pub tags: Vec<TagReport>,
    pub pmi: Option<SimilarityMatrix>,
}

impl RunReport {
    pub fn failed(&self) -> impl Iterator<Item = &TagReport> {
        self.tags
            .iter()
            .filter(|t| matches!(t.status, TagStatus::Failed(_)))
    }
}

/// PMI between all query terms, printed as a table followed by the
/// vocabulary echo.
pub fn run_pmi<W: Write>(dataset: &DataSet, opts: &RunOptions, out: &mut W) -> Result<SimilarityMatrix> {
    let index = DocumentIndex::open(&dataset.index_dir(&opts.tag), &opts.field)?;
    let mut engine = PmiEngine::new(&index)?;
    let terms = dataset.vocabulary();

    let mut table = ConsoleTable::new(&mut *out);
    let matrix = TermMatrixBuilder::new(terms).build_into(&mut engine, &mut table)?;
    table.into_inner()?;

    writeln!(out, "{SEPARATOR}")?;
    writeln!(out, "{}", vocabulary_echo(matrix.terms()))?;
    Ok(matrix)
}

/// One workbook per applicable tag. A failing tag is logged and reported,
/// and later tags still run.
pub fn run_workbooks<W: Write>(dataset: &DataSet, opts: &RunOptions, out: &mut W) -> Result<RunReport> {
    let vocab = dataset.vocabulary();
    let mut report = RunReport {
        vocabulary: vocab.clone(),
        ..Default::default()
    };

    let excel_dir = dataset.excel_dir();
    if !excel_dir.exists() {
        fs::create_dir_all(&excel_dir)?;
    }

    for tag in &opts.tags {
        if !dataset.collection().supports_tag(tag) {
            info!("skipping tag {tag} for {}", dataset.collection());
            report.tags.push(TagReport {
                tag: tag.clone(),
                status: TagStatus::Skipped,
                sheets: Vec::new(),
            });
            continue;
        }

        let mut sheets = Vec::new();
        let status = match build_workbook(dataset, opts, tag, &vocab, &mut sheets) {
            Ok(workbook) => {
                let path = dataset.workbook_path(tag);
                match workbook.save(&path) {
                    Ok(()) => TagStatus::Written(path),
                    Err(e) => TagStatus::Failed(e),
                }
            }
            Err(e) if e.is_fatal_to_run() => return Err(e),
            Err(e) => TagStatus::Failed(e),
        };
        if let TagStatus::Failed(e) = &status {
            error!("tag {tag} failed, no workbook written: {e}");
        }
        report.tags.push(TagReport {
            tag: tag.clone(),
            status,
            sheets,
        });
    }

    writeln!(out, "{}", vocabulary_echo(&vocab))?;
    Ok(report)
}

fn build_workbook(
    dataset: &DataSet,
    opts: &RunOptions,
    tag: &str,
    vocab: &[String],
    sheets: &mut Vec<SheetReport>,
) -> Result<Workbook> {
    let population = if opts.zero.contains(&true) {
        Some(population(dataset, opts, tag)?)
    } else {
        None
    };

    let mut workbook = Workbook::new();
    for &freq in &opts.types {
        let distributions = load_distributions(dataset, tag, freq, opts.bins)?;

        for &zero in &opts.zero {
            for &cdf in &opts.cdf {
                let name = sheet_name(freq, zero, cdf);
                let (present, omitted): (Vec<&String>, Vec<&String>) =
                    vocab.iter().partition(|t| distributions.contains_key(*t));
                if !omitted.is_empty() {
                    warn!("{tag}/{name}: no distribution for {omitted:?}, terms left out of the sheet");
                }

                let vectors: HashMap<String, NormalizedVector> = present
                    .iter()
                    .map(|&t| {
                        let v = &distributions[t];
                        let prepared = match population {
                            Some(n) if zero => v.augment_with_zero_bin(n),
                            _ => v.clone(),
                        };
                        (t.clone(), prepared.normalize())
                    })
                    .collect();
                for (t, v) in &vectors {
                    if v.is_degenerate() {
                        warn!("{tag}/{name}: '{t}' has zero document frequency");
                    }
                }

                let mut engine = ChiSquared::new(vectors, cdf);
                let mut sheet = Sheet::new(&name);
                let matrix = TermMatrixBuilder::new(present.iter().map(|t| t.as_str()))
                    .build_into(&mut engine, &mut sheet)?;
                workbook.add_sheet(sheet)?;

                sheets.push(SheetReport {
                    name,
                    terms: matrix.terms().len(),
                    evaluations: matrix.evaluations(),
                    omitted: omitted.into_iter().cloned().collect(),
                });
            }
        }
    }
    Ok(workbook)
}

/// Merge the per-topic distribution files of one (tag, type).
fn load_distributions(
    dataset: &DataSet,
    tag: &str,
    freq: Freq,
    bins: usize,
) -> Result<HashMap<String, FrequencyVector>> {
    let mut merged = HashMap::new();
    for topic in dataset.topics() {
        let path = dataset.freq_file(tag, topic, freq, bins);
        merged.extend(load_frequency_file(&path, bins)?);
    }
    info!("{tag}/{freq}: {} term distributions", merged.len());
    Ok(merged)
}

fn population(dataset: &DataSet, opts: &RunOptions, tag: &str) -> Result<u64> {
    if let Some(n) = opts.population {
        return Ok(n);
    }
    let index = DocumentIndex::open(&dataset.index_dir(tag), &opts.field)?;
    Ok(index.total_documents())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sheet_names_compose_suffixes() {
        assert_eq!(sheet_name(Freq::Rel, false, false), "Rel");
        assert_eq!(sheet_name(Freq::Rel, true, false), "RelZ");
        assert_eq!(sheet_name(Freq::Diri, false, true), "Diric");
        assert_eq!(sheet_name(Freq::Sqrt, true, true), "SqrtZc");
    }
}

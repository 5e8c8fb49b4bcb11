//! Document and co-occurrence frequencies for one index field.

use std::collections::HashMap;
use std::path::Path;

use log::info;

use crate::error::{Result, T2tError};

/// Read-only frequency queries against a field-scoped index.
///
/// Lookups are assumed expensive; callers cache results.
pub trait CoOccurrenceStatistics {
    /// Number of documents containing `term`.
    fn document_frequency(&self, term: &str) -> u64;

    /// Number of documents containing both terms.
    fn joint_document_frequency(&self, a: &str, b: &str) -> u64;

    /// Number of documents in the index.
    fn total_documents(&self) -> u64;
}

/// In-memory inverted index over a single field.
///
/// Postings are sorted, de-duplicated document ordinals.
#[derive(Debug, Default)]
pub struct DocumentIndex {
    field: String,
    postings: HashMap<String, Vec<u64>>,
    num_docs: u64,
}

impl DocumentIndex {
    pub fn new(field: impl Into<String>) -> Self {
        DocumentIndex {
            field: field.into(),
            ..Default::default()
        }
    }

    /// Load `{dir}/{field}.tsv`, one document per line as `doc_id<TAB>text`.
    pub fn open(dir: &Path, field: &str) -> Result<Self> {
        let path = dir.join(format!("{field}.tsv"));
        if !path.is_file() {
            return Err(T2tError::MissingData(format!(
                "index field dump {} not found",
                path.display()
            )));
        }

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .quoting(false)
            .flexible(true)
            .from_path(&path)?;

        let mut index = DocumentIndex::new(field);
        for record in reader.records() {
            let record = record?;
            index.add_document(record.get(1).unwrap_or(""));
        }
        info!(
            "opened index {} ({} docs, {} terms, field '{}')",
            dir.display(),
            index.num_docs,
            index.postings.len(),
            index.field
        );
        Ok(index)
    }

    /// Add one document; every distinct whitespace token counts once.
    pub fn add_document(&mut self, text: &str) {
        let ord = self.num_docs;
        for token in text.split_whitespace() {
            let list = self.postings.entry(token.to_string()).or_default();
            if list.last() != Some(&ord) {
                list.push(ord);
            }
        }
        self.num_docs += 1;
    }

    pub fn field(&self) -> &str {
        &self.field
    }
}

impl CoOccurrenceStatistics for DocumentIndex {
    fn document_frequency(&self, term: &str) -> u64 {
        self.postings.get(term).map_or(0, |p| p.len() as u64)
    }

    fn joint_document_frequency(&self, a: &str, b: &str) -> u64 {
        let (Some(pa), Some(pb)) = (self.postings.get(a), self.postings.get(b)) else {
            return 0;
        };
        // sorted merge
        let (mut i, mut j, mut n) = (0, 0, 0u64);
        while i < pa.len() && j < pb.len() {
            match pa[i].cmp(&pb[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    n += 1;
                    i += 1;
                    j += 1;
                }
            }
        }
        n
    }

    fn total_documents(&self) -> u64 {
        self.num_docs
    }
}

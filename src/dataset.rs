//! Collection identity, data-home layout and topic loading.
//!
//! ```text
//! {data_home}/{collection}/topics.tsv                     qid<TAB>query
//! {data_home}/{collection}/indexes/{tag}/{field}.tsv      doc_id<TAB>text
//! {data_home}/{collection}/freqs/{tag}/{qid}/{freq file}
//! {data_home}/{collection}/excels/                        workbooks
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use log::info;
use serde::Deserialize;

use crate::error::{Result, T2tError};
use crate::freq::Freq;
use crate::matrix::vocabulary;

/// Index tag carrying anchor text in addition to document bodies.
pub const ANCHOR_TAG: &str = "KStemAnchor";

/// Collections crawled without link structure, hence without anchor text.
const NO_ANCHOR_COLLECTIONS: [&str; 2] = ["GOV2", "ROB04"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Collection(String);

impl Collection {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() || trimmed.contains(['/', '\\']) {
            return Err(T2tError::Configuration(format!("invalid collection name '{name}'")));
        }
        Ok(Collection(trimmed.to_string()))
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn has_anchor_text(&self) -> bool {
        !NO_ANCHOR_COLLECTIONS
            .iter()
            .any(|c| c.eq_ignore_ascii_case(&self.0))
    }

    /// Whether an index tag has meaning for this collection.
    pub fn supports_tag(&self, tag: &str) -> bool {
        tag != ANCHOR_TAG || self.has_anchor_text()
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One query of the topic set.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Topic {
    pub id: String,
    pub query: String,
}

/// Paths and topics of one collection under a data home.
#[derive(Debug)]
pub struct DataSet {
    collection: Collection,
    root: PathBuf,
    topics: Vec<Topic>,
}

impl DataSet {
    /// Resolve `{data_home}/{collection}` and read its topics.
    pub fn open(data_home: &Path, collection: Collection) -> Result<Self> {
        let root = data_home.join(collection.name());
        if !root.is_dir() {
            return Err(T2tError::Configuration(format!(
                "collection directory {} does not exist",
                root.display()
            )));
        }
        let topics = load_topics(&root.join("topics.tsv"))?;
        info!("{collection}: {} topics", topics.len());
        Ok(DataSet {
            collection,
            root,
            topics,
        })
    }

    pub fn from_parts(collection: Collection, root: PathBuf, topics: Vec<Topic>) -> Self {
        DataSet {
            collection,
            root,
            topics,
        }
    }

    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    /// Distinct, sorted query terms over all topics.
    pub fn vocabulary(&self) -> Vec<String> {
        vocabulary(self.topics.iter().map(|t| t.query.as_str()))
    }

    pub fn index_dir(&self, tag: &str) -> PathBuf {
        self.root.join("indexes").join(tag)
    }

    pub fn freq_file(&self, tag: &str, topic: &Topic, freq: Freq, bins: usize) -> PathBuf {
        self.root
            .join("freqs")
            .join(tag)
            .join(&topic.id)
            .join(freq.file_name(bins))
    }

    pub fn excel_dir(&self) -> PathBuf {
        self.root.join("excels")
    }

    pub fn workbook_path(&self, tag: &str) -> PathBuf {
        self.excel_dir()
            .join(format!("T2T{}{tag}.xlsx", self.collection.name()))
    }
}

/// Read `qid<TAB>query` lines. Missing file is a configuration problem.
pub fn load_topics(path: &Path) -> Result<Vec<Topic>> {
    if !path.is_file() {
        return Err(T2tError::Configuration(format!(
            "topic file {} not found",
            path.display()
        )));
    }
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .quoting(false)
        .from_path(path)?;
    let topics = reader
        .deserialize::<Topic>()
        .collect::<std::result::Result<Vec<_>, csv::Error>>()?;
    Ok(topics)
}

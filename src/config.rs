//! Run options and the `config.properties` fallback for `tfd.home`.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use log::debug;

use crate::dataset::Collection;
use crate::error::{Result, T2tError};
use crate::freq::{DEFAULT_BINS, Freq};

/// Property naming the base data directory.
pub const DATA_HOME_KEY: &str = "tfd.home";

/// Printed when no data home can be resolved.
pub const DATA_HOME_HELP: &str =
    "Following properties must be defined in config.properties for t2t: tfd.home (or pass --data-home / set TFD_HOME)";

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Task {
    /// PMI matrix printed to stdout
    Pmi,
    /// Chi-squared workbooks, one per tag
    Chi,
}

/// Everything a run needs, resolved from CLI and properties.
#[derive(Clone, Debug)]
pub struct RunOptions {
    pub data_home: PathBuf,
    pub collection: Collection,
    pub task: Task,
    /// Index tag used by the PMI task.
    pub tag: String,
    /// Tags producing one workbook each.
    pub tags: Vec<String>,
    pub types: Vec<Freq>,
    /// Zero-bin augmentation variants to compute.
    pub zero: Vec<bool>,
    /// Cumulative-distribution variants to compute.
    pub cdf: Vec<bool>,
    pub bins: usize,
    pub field: String,
    /// Document population for the zero bin; read from the tag's index when absent.
    pub population: Option<u64>,
}

impl RunOptions {
    pub fn new(data_home: PathBuf, collection: Collection) -> Self {
        RunOptions {
            data_home,
            collection,
            task: Task::Chi,
            tag: "KStem".into(),
            tags: vec!["KStem".into(), "KStemAnchor".into()],
            types: vec![Freq::Rel],
            zero: vec![true],
            cdf: vec![false],
            bins: DEFAULT_BINS,
            field: "contents".into(),
            population: None,
        }
    }

    /// Reject combinations that would produce empty or ill-formed reports.
    pub fn validate(&self) -> Result<()> {
        if self.bins == 0 {
            return Err(T2tError::Configuration("--bins must be positive".into()));
        }
        if self.field.trim().is_empty() {
            return Err(T2tError::Configuration("--field must not be empty".into()));
        }
        if self.task == Task::Chi
            && (self.tags.is_empty()
                || self.types.is_empty()
                || self.zero.is_empty()
                || self.cdf.is_empty())
        {
            return Err(T2tError::Configuration(
                "chi task needs at least one tag, type, zero and cdf value".into(),
            ));
        }
        if has_duplicates(&self.tags)
            || has_duplicates(&self.types)
            || has_duplicates(&self.zero)
            || has_duplicates(&self.cdf)
        {
            return Err(T2tError::Configuration(
                "duplicate value in tags, types, zero or cdf".into(),
            ));
        }
        Ok(())
    }
}

fn has_duplicates<T: PartialEq>(values: &[T]) -> bool {
    values
        .iter()
        .enumerate()
        .any(|(i, v)| values[..i].contains(v))
}

/// Drop repeated values, keeping first occurrences in order.
pub fn dedup_in_order<T: PartialEq>(values: Vec<T>) -> Vec<T> {
    let mut out = Vec::with_capacity(values.len());
    for v in values {
        if !out.contains(&v) {
            out.push(v);
        }
    }
    out
}

/// Parse a Java-style properties file. A missing file yields no properties.
pub fn load_properties(path: &Path) -> Result<HashMap<String, String>> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("no properties file at {}", path.display());
            return Ok(HashMap::new());
        }
        Err(e) => return Err(e.into()),
    };
    Ok(parse_properties(&content))
}

/// `java.util.Properties` line rules: the key ends at the first unescaped
/// `=`, `:` or whitespace, backslash escapes are decoded and a trailing odd
/// backslash continues the line. Trailing whitespace of values is dropped.
pub fn parse_properties(content: &str) -> HashMap<String, String> {
    let mut props = HashMap::new();
    let mut logical = String::new();

    for raw in content.lines() {
        let line = raw.trim_start();
        if logical.is_empty() && (line.is_empty() || line.starts_with('#') || line.starts_with('!')) {
            continue;
        }
        let trailing = line.chars().rev().take_while(|&c| c == '\\').count();
        if trailing % 2 == 1 {
            logical.push_str(&line[..line.len() - 1]);
            continue;
        }
        logical.push_str(line);
        let (key, value) = split_entry(&logical);
        props.insert(key, value);
        logical.clear();
    }
    if !logical.is_empty() {
        let (key, value) = split_entry(&logical);
        props.insert(key, value);
    }
    props
}

fn split_entry(line: &str) -> (String, String) {
    let mut escaped = false;
    let mut key_end = line.len();
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '=' || c == ':' || c.is_whitespace() {
            key_end = i;
            break;
        }
    }

    let rest = line[key_end..].trim_start();
    let rest = rest
        .strip_prefix(['=', ':'])
        .map_or(rest, str::trim_start);
    (unescape(&line[..key_end]), unescape(rest.trim_end()))
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{0c}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push_str("\\u");
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

/// Explicit value wins over the `tfd.home` property.
pub fn resolve_data_home(
    explicit: Option<PathBuf>,
    props: &HashMap<String, String>,
) -> Result<PathBuf> {
    explicit
        .or_else(|| {
            props
                .get(DATA_HOME_KEY)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        })
        .ok_or_else(|| T2tError::Configuration(DATA_HOME_HELP.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn properties_parse_like_java() {
        let props = parse_properties("# comment\n tfd.home = /data/tfd \nother:1\n!x=y\nnovalue\n");
        assert_eq!(props.get("tfd.home").map(String::as_str), Some("/data/tfd"));
        assert_eq!(props.get("other").map(String::as_str), Some("1"));
        assert_eq!(props.get("novalue").map(String::as_str), Some(""));
        assert!(!props.contains_key("!x"));
        assert_eq!(props.len(), 3);
    }

    #[test]
    fn properties_whitespace_separator_and_escapes() {
        let props = parse_properties(
            "tfd.home /data/tfd\nwin=C\\\\data\\\\tfd\nmy\\ key = a\\u0041\\tb\nlong = one \\\n    two\n",
        );
        assert_eq!(props.get("tfd.home").map(String::as_str), Some("/data/tfd"));
        assert_eq!(props.get("win").map(String::as_str), Some("C\\data\\tfd"));
        assert_eq!(props.get("my key").map(String::as_str), Some("aA\tb"));
        assert_eq!(props.get("long").map(String::as_str), Some("one two"));
    }

    #[test]
    fn data_home_precedence() {
        let mut props = HashMap::new();
        assert!(matches!(
            resolve_data_home(None, &props),
            Err(T2tError::Configuration(_))
        ));
        props.insert(DATA_HOME_KEY.to_string(), "/from/props".to_string());
        assert_eq!(resolve_data_home(None, &props).unwrap(), PathBuf::from("/from/props"));
        assert_eq!(
            resolve_data_home(Some("/cli".into()), &props).unwrap(),
            PathBuf::from("/cli")
        );
    }

    #[test]
    fn missing_properties_file_is_empty() {
        let props = load_properties(Path::new("/no/such/config.properties")).unwrap();
        assert!(props.is_empty());
    }

    #[test]
    fn validate_rejects_empty_variants() {
        let mut o = RunOptions::new("/d".into(), Collection::new("C").unwrap());
        assert!(o.validate().is_ok());
        o.cdf.clear();
        assert!(o.validate().is_err());
        o.task = Task::Pmi;
        assert!(o.validate().is_ok());
        o.bins = 0;
        assert!(o.validate().is_err());
    }

    #[test]
    fn validate_rejects_duplicates() {
        let base = RunOptions::new("/d".into(), Collection::new("C").unwrap());

        let mut o = base.clone();
        o.zero = vec![false, false];
        assert!(matches!(o.validate(), Err(T2tError::Configuration(_))));

        let mut o = base.clone();
        o.cdf = vec![true, false, true];
        assert!(o.validate().is_err());

        let mut o = base.clone();
        o.tags = vec!["KStem".into(), "KStem".into()];
        assert!(o.validate().is_err());

        let mut o = base;
        o.types = vec![Freq::Rel, Freq::Phi, Freq::Rel];
        assert!(o.validate().is_err());
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        assert_eq!(dedup_in_order(vec![true, false, true]), vec![true, false]);
        assert_eq!(dedup_in_order(vec!["b", "a", "b", "a"]), vec!["b", "a"]);
    }
}

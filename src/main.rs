#![forbid(unsafe_code)]
//! # t2t CLI
//!
//! Term-to-term similarity reports for a collection under a data home.
//!
//! ## Example
//! ```bash
//! cargo run --release -- --collection MQ09 --data-home /data/tfd --task pmi
//! cargo run --release -- --collection MQ09 --types Rel,Diri --zero true,false
//! ```
//!
//! See `--help` for all available options.

use clap::Parser;
use log::error;
use std::io;
use std::path::PathBuf;
use std::process;
use t2t::config::{dedup_in_order, load_properties, resolve_data_home};
use t2t::{Collection, Freq, RunOptions, T2tError, Task, TagStatus, print_failed_tags};

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Collection identifier (directory name under the data home)
    #[arg(long)]
    collection: String,

    /// Base data directory; falls back to `tfd.home` in the config file
    #[arg(long, env = "TFD_HOME")]
    data_home: Option<PathBuf>,

    /// Properties file consulted for `tfd.home`
    #[arg(long, default_value = "config.properties")]
    config: PathBuf,

    /// Task to run (pmi prints a matrix, chi writes workbooks)
    #[arg(long, value_enum, default_value = "chi")]
    task: Task,

    /// Index tag used by the pmi task
    #[arg(long, default_value = "KStem")]
    tag: String,

    /// Index tags for the chi task, one workbook each
    #[arg(long, value_delimiter = ',', default_value = "KStem,KStemAnchor")]
    tags: Vec<String>,

    /// Frequency types for the chi task (Phi, Rel, Sqrt, Log, Ratio, Zero, Diri)
    #[arg(long, value_delimiter = ',', default_value = "Rel")]
    types: Vec<Freq>,

    /// Zero-bin augmentation variants
    #[arg(long, value_delimiter = ',', default_value = "true")]
    zero: Vec<bool>,

    /// Cumulative-distribution variants
    #[arg(long, value_delimiter = ',', default_value = "false")]
    cdf: Vec<bool>,

    /// Number of bins per frequency distribution
    #[arg(long, default_value_t = t2t::freq::DEFAULT_BINS)]
    bins: usize,

    /// Index field for document frequencies
    #[arg(long, default_value = "contents")]
    field: String,

    /// Document population for the zero bin (default: document count of the tag's index)
    #[arg(long)]
    population: Option<u64>,
}

fn options(cli: Cli) -> Result<RunOptions, T2tError> {
    let props = load_properties(&cli.config)?;
    let data_home = resolve_data_home(cli.data_home, &props)?;
    let mut opts = RunOptions::new(data_home, Collection::new(cli.collection)?);
    opts.task = cli.task;
    opts.tag = cli.tag;
    opts.tags = dedup_in_order(cli.tags);
    opts.types = dedup_in_order(cli.types);
    opts.zero = dedup_in_order(cli.zero);
    opts.cdf = dedup_in_order(cli.cdf);
    opts.bins = cli.bins;
    opts.field = cli.field;
    opts.population = cli.population;
    Ok(opts)
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let opts = match options(cli) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("{e}");
            process::exit(2);
        }
    };

    let mut stdout = io::stdout().lock();
    match t2t::run(&opts, &mut stdout) {
        Ok(report) => {
            for t in &report.tags {
                for s in t.sheets.iter().filter(|s| !s.omitted.is_empty()) {
                    eprintln!("{}/{}: omitted {:?}", t.tag, s.name, s.omitted);
                }
            }
            print_failed_tags(&report);
            let written = report
                .tags
                .iter()
                .any(|t| matches!(t.status, TagStatus::Written(_)));
            let all_skipped = report
                .tags
                .iter()
                .all(|t| matches!(t.status, TagStatus::Skipped));
            if opts.task == Task::Chi && all_skipped {
                eprintln!(
                    "no applicable tag for {} among {:?}; nothing written",
                    opts.collection, opts.tags
                );
            }
            if report.failed().next().is_some() || (opts.task == Task::Chi && !written) {
                process::exit(1);
            }
        }
        Err(e @ T2tError::Configuration(_)) => {
            eprintln!("{e}");
            process::exit(2);
        }
        Err(e) => {
            error!("Error: {}", e);
            process::exit(1);
        }
    }
}

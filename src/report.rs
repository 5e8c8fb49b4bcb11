//! Tab-delimited console table for PMI matrices.

use std::io::Write;

use csv::{QuoteStyle, Writer, WriterBuilder};

use crate::error::Result;
use crate::matrix::ReportSink;

/// Separator printed between the table and the vocabulary echo.
pub const SEPARATOR: &str = "=========================";

/// Writes a blank corner cell plus the term header, then one row per term
/// with values rendered to four decimals.
pub struct ConsoleTable<W: Write> {
    // Option so the raw writer can be taken out; csv::Writer has no get_mut.
    wtr: Option<Writer<W>>,
}

impl<W: Write> ConsoleTable<W> {
    pub fn new(out: W) -> Self {
        ConsoleTable {
            wtr: Some(Self::csv_writer(out)),
        }
    }

    fn csv_writer(out: W) -> Writer<W> {
        WriterBuilder::new()
            .delimiter(b'\t')
            .quote_style(QuoteStyle::Never)
            .flexible(true)
            .from_writer(out)
    }

    fn wtr(&mut self) -> &mut Writer<W> {
        self.wtr.as_mut().expect("csv writer present")
    }

    /// Flush the csv buffer and return the raw writer.
    fn take_raw(&mut self) -> Result<W> {
        self.wtr
            .take()
            .expect("csv writer present")
            .into_inner()
            .map_err(|e| std::io::Error::other(e.to_string()).into())
    }

    /// Flush and hand back the underlying writer.
    pub fn into_inner(mut self) -> Result<W> {
        self.take_raw()
    }
}

impl<W: Write> ReportSink for ConsoleTable<W> {
    fn header(&mut self, terms: &[String]) -> Result<()> {
        // a lone empty field would be written as `""`
        if terms.is_empty() {
            let mut out = self.take_raw()?;
            let res = out.write_all(b"\n");
            self.wtr = Some(Self::csv_writer(out));
            res?;
            return Ok(());
        }
        let mut record = Vec::with_capacity(terms.len() + 1);
        record.push("");
        record.extend(terms.iter().map(String::as_str));
        self.wtr().write_record(&record)?;
        Ok(())
    }

    fn row(&mut self, term: &str, values: &[f64]) -> Result<()> {
        let mut record = Vec::with_capacity(values.len() + 1);
        record.push(term.to_string());
        record.extend(values.iter().map(|v| format!("{v:.4}")));
        self.wtr().write_record(&record)?;
        self.wtr().flush()?;
        Ok(())
    }
}

//! Minimal Office Open XML workbook writer.
//!
//! Only what the similarity reports need: several sheets of inline-string and
//! numeric cells. Parts are produced with `quick-xml` and packed with `zip`.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

use chrono::Utc;
use log::{debug, info};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{Result, T2tError};
use crate::matrix::ReportSink;

const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const NS_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_PKG_REL: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const CT_SHEET: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml";

#[derive(Clone, Debug, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

/// One worksheet; row 0 and column 0 hold headers once filled as a sink.
#[derive(Clone, Debug, Default)]
pub struct Sheet {
    name: String,
    rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Sheet {
            name: name.into(),
            rows: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn push_row(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }
}

impl ReportSink for Sheet {
    fn header(&mut self, terms: &[String]) -> Result<()> {
        let mut row = Vec::with_capacity(terms.len() + 1);
        row.push(Cell::Empty);
        row.extend(terms.iter().cloned().map(Cell::Text));
        self.rows.push(row);
        Ok(())
    }

    fn row(&mut self, term: &str, values: &[f64]) -> Result<()> {
        let mut row = Vec::with_capacity(values.len() + 1);
        row.push(Cell::Text(term.to_string()));
        row.extend(values.iter().copied().map(Cell::Number));
        self.rows.push(row);
        Ok(())
    }
}

/// In-memory workbook, written in one go once every sheet is complete.
#[derive(Debug, Default)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    /// Sheet names must be unique, 1..=31 chars, without `[]:*?/\`.
    pub fn add_sheet(&mut self, sheet: Sheet) -> Result<()> {
        let name = sheet.name();
        if name.is_empty()
            || name.chars().count() > 31
            || name.contains(['[', ']', ':', '*', '?', '/', '\\'])
        {
            return Err(T2tError::Configuration(format!("invalid sheet name '{name}'")));
        }
        if self.sheets.iter().any(|s| s.name().eq_ignore_ascii_case(name)) {
            return Err(T2tError::Configuration(format!("duplicate sheet name '{name}'")));
        }
        self.sheets.push(sheet);
        Ok(())
    }

    /// Write to `path` through a `.part` file that is renamed on success and
    /// removed on failure, so a failed write never leaves a truncated workbook.
    pub fn save(&self, path: &Path) -> Result<()> {
        if self.sheets.is_empty() {
            return Err(T2tError::DegenerateInput(format!(
                "refusing to write {} without sheets",
                path.display()
            )));
        }
        let tmp = path.with_extension("xlsx.part");
        let written = self
            .write_package(&tmp)
            .and_then(|()| fs::rename(&tmp, path).map_err(Into::into));
        match written {
            Ok(()) => {
                info!("wrote {} ({} sheets)", path.display(), self.sheets.len());
                Ok(())
            }
            Err(e) => {
                let _ = fs::remove_file(&tmp);
                Err(e)
            }
        }
    }

    fn write_package(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let mut zip = ZipWriter::new(file);
        let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        let mut parts = vec![
            ("[Content_Types].xml".to_string(), self.content_types()?),
            ("_rels/.rels".to_string(), root_rels()?),
            ("docProps/core.xml".to_string(), core_properties()?),
            ("xl/workbook.xml".to_string(), self.workbook_xml()?),
            ("xl/_rels/workbook.xml.rels".to_string(), self.workbook_rels()?),
        ];
        for (i, sheet) in self.sheets.iter().enumerate() {
            parts.push((format!("xl/worksheets/sheet{}.xml", i + 1), sheet_xml(sheet)?));
        }

        for (name, bytes) in parts {
            debug!("packing {name} ({} bytes)", bytes.len());
            zip.start_file(name, deflated)?;
            zip.write_all(&bytes)?;
        }
        let file = zip.finish()?;
        file.sync_all()?;
        Ok(())
    }

    fn content_types(&self) -> Result<Vec<u8>> {
        xml_part(|w| {
            start(w, "Types", &[("xmlns", "http://schemas.openxmlformats.org/package/2006/content-types")])?;
            empty(w, "Default", &[
                ("Extension", "rels"),
                ("ContentType", "application/vnd.openxmlformats-package.relationships+xml"),
            ])?;
            empty(w, "Default", &[("Extension", "xml"), ("ContentType", "application/xml")])?;
            empty(w, "Override", &[
                ("PartName", "/xl/workbook.xml"),
                ("ContentType", "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"),
            ])?;
            empty(w, "Override", &[
                ("PartName", "/docProps/core.xml"),
                ("ContentType", "application/vnd.openxmlformats-package.core-properties+xml"),
            ])?;
            for i in 1..=self.sheets.len() {
                let part = format!("/xl/worksheets/sheet{i}.xml");
                empty(w, "Override", &[("PartName", part.as_str()), ("ContentType", CT_SHEET)])?;
            }
            end(w, "Types")
        })
    }

    fn workbook_xml(&self) -> Result<Vec<u8>> {
        xml_part(|w| {
            start(w, "workbook", &[("xmlns", NS_MAIN), ("xmlns:r", NS_REL)])?;
            start(w, "sheets", &[])?;
            for (i, sheet) in self.sheets.iter().enumerate() {
                let id = (i + 1).to_string();
                let rid = format!("rId{id}");
                empty(w, "sheet", &[
                    ("name", sheet.name()),
                    ("sheetId", id.as_str()),
                    ("r:id", rid.as_str()),
                ])?;
            }
            end(w, "sheets")?;
            end(w, "workbook")
        })
    }

    fn workbook_rels(&self) -> Result<Vec<u8>> {
        xml_part(|w| {
            start(w, "Relationships", &[("xmlns", NS_PKG_REL)])?;
            for i in 1..=self.sheets.len() {
                let rid = format!("rId{i}");
                let target = format!("worksheets/sheet{i}.xml");
                empty(w, "Relationship", &[
                    ("Id", rid.as_str()),
                    ("Type", "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet"),
                    ("Target", target.as_str()),
                ])?;
            }
            end(w, "Relationships")
        })
    }
}

fn root_rels() -> Result<Vec<u8>> {
    xml_part(|w| {
        start(w, "Relationships", &[("xmlns", NS_PKG_REL)])?;
        empty(w, "Relationship", &[
            ("Id", "rId1"),
            ("Type", "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument"),
            ("Target", "xl/workbook.xml"),
        ])?;
        empty(w, "Relationship", &[
            ("Id", "rId2"),
            ("Type", "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties"),
            ("Target", "docProps/core.xml"),
        ])?;
        end(w, "Relationships")
    })
}

fn core_properties() -> Result<Vec<u8>> {
    let created = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
    xml_part(|w| {
        start(w, "cp:coreProperties", &[
            ("xmlns:cp", "http://schemas.openxmlformats.org/package/2006/metadata/core-properties"),
            ("xmlns:dc", "http://purl.org/dc/elements/1.1/"),
            ("xmlns:dcterms", "http://purl.org/dc/terms/"),
            ("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"),
        ])?;
        start(w, "dc:creator", &[])?;
        text(w, env!("CARGO_PKG_NAME"))?;
        end(w, "dc:creator")?;
        start(w, "dcterms:created", &[("xsi:type", "dcterms:W3CDTF")])?;
        text(w, &created)?;
        end(w, "dcterms:created")?;
        end(w, "cp:coreProperties")
    })
}

fn sheet_xml(sheet: &Sheet) -> Result<Vec<u8>> {
    xml_part(|w| {
        start(w, "worksheet", &[("xmlns", NS_MAIN)])?;
        start(w, "sheetData", &[])?;
        for (r, row) in sheet.rows().iter().enumerate() {
            let row_ref = (r + 1).to_string();
            start(w, "row", &[("r", row_ref.as_str())])?;
            for (c, cell) in row.iter().enumerate() {
                let cell_ref = format!("{}{}", column_name(c), r + 1);
                match cell {
                    Cell::Empty => {}
                    Cell::Text(s) => {
                        start(w, "c", &[("r", cell_ref.as_str()), ("t", "inlineStr")])?;
                        start(w, "is", &[])?;
                        start(w, "t", &[])?;
                        text(w, s)?;
                        end(w, "t")?;
                        end(w, "is")?;
                        end(w, "c")?;
                    }
                    Cell::Number(v) if v.is_finite() => {
                        start(w, "c", &[("r", cell_ref.as_str())])?;
                        start(w, "v", &[])?;
                        text(w, &v.to_string())?;
                        end(w, "v")?;
                        end(w, "c")?;
                    }
                    Cell::Number(_) => {
                        start(w, "c", &[("r", cell_ref.as_str()), ("t", "e")])?;
                        start(w, "v", &[])?;
                        text(w, "#NUM!")?;
                        end(w, "v")?;
                        end(w, "c")?;
                    }
                }
            }
            end(w, "row")?;
        }
        end(w, "sheetData")?;
        end(w, "worksheet")
    })
}

/// Spreadsheet column letters for a zero-based index: 0 -> A, 26 -> AA.
pub fn column_name(mut idx: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(char::from(b'A' + (idx % 26) as u8));
        if idx < 26 {
            break;
        }
        idx = idx / 26 - 1;
    }
    letters.iter().rev().collect()
}

// ---- XML helpers ----

fn xml_part<F>(build: F) -> Result<Vec<u8>>
where
    F: FnOnce(&mut Writer<Vec<u8>>) -> io::Result<()>,
{
    let mut w = Writer::new(Vec::new());
    w.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    build(&mut w)?;
    Ok(w.into_inner())
}

fn start(w: &mut Writer<Vec<u8>>, name: &str, attrs: &[(&str, &str)]) -> io::Result<()> {
    let mut el = BytesStart::new(name);
    for &attr in attrs {
        el.push_attribute(attr);
    }
    w.write_event(Event::Start(el))
}

fn empty(w: &mut Writer<Vec<u8>>, name: &str, attrs: &[(&str, &str)]) -> io::Result<()> {
    let mut el = BytesStart::new(name);
    for &attr in attrs {
        el.push_attribute(attr);
    }
    w.write_event(Event::Empty(el))
}

fn end(w: &mut Writer<Vec<u8>>, name: &str) -> io::Result<()> {
    w.write_event(Event::End(BytesEnd::new(name)))
}

fn text(w: &mut Writer<Vec<u8>>, s: &str) -> io::Result<()> {
    w.write_event(Event::Text(BytesText::new(s)))
}

//! OOXML workbook writer.
//!
//! Every part except `docProps/core.xml` is a pure function of the sheets,
//! and ZIP entries carry the fixed 1980-01-01 DOS timestamp, so identical
//! inputs give identical sheet bytes.

use chrono::{DateTime, SecondsFormat, Utc};
use log::info;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::{report_sheets, Cell, Sheet};
use crate::session::Results;
use crate::summary::SummaryTable;

const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const NS_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_PKG_REL: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const NS_CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";
const NS_CORE: &str = "http://schemas.openxmlformats.org/package/2006/metadata/core-properties";

const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
const REL_CORE_PROPERTIES: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
const REL_WORKSHEET: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
const REL_STYLES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";

const CT_WORKBOOK: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";
const CT_WORKSHEET: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml";
const CT_STYLES: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml";
const CT_CORE: &str = "application/vnd.openxmlformats-package.core-properties+xml";
const CT_RELS: &str = "application/vnd.openxmlformats-package.relationships+xml";

/// Errors that can occur while writing a workbook
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// ZIP container error
    #[error("ZIP error: {0}")]
    ZipError(#[from] zip::result::ZipError),

    /// XML serialization error
    #[error("XML error: {0}")]
    XmlError(#[from] quick_xml::Error),
}

/// Workbook-level properties
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Creator recorded in the document properties
    pub creator: String,
    /// Creation timestamp; `None` uses the current time
    pub created_at: Option<DateTime<Utc>>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            creator: env!("CARGO_PKG_NAME").to_string(),
            created_at: None,
        }
    }
}

type XmlWriter = Writer<Vec<u8>>;

fn xml_writer() -> Result<XmlWriter, ExportError> {
    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    Ok(writer)
}

fn start(writer: &mut XmlWriter, name: &str, attrs: &[(&str, &str)]) -> Result<(), ExportError> {
    let mut element = BytesStart::new(name);
    for attr in attrs {
        element.push_attribute(*attr);
    }
    writer.write_event(Event::Start(element))?;
    Ok(())
}

fn end(writer: &mut XmlWriter, name: &str) -> Result<(), ExportError> {
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn empty(writer: &mut XmlWriter, name: &str, attrs: &[(&str, &str)]) -> Result<(), ExportError> {
    let mut element = BytesStart::new(name);
    for attr in attrs {
        element.push_attribute(*attr);
    }
    writer.write_event(Event::Empty(element))?;
    Ok(())
}

fn text_element(
    writer: &mut XmlWriter,
    name: &str,
    attrs: &[(&str, &str)],
    text: &str,
) -> Result<(), ExportError> {
    start(writer, name, attrs)?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    end(writer, name)
}

/// Spreadsheet column letters for a zero-based index (0 -> A, 26 -> AA)
fn column_letters(mut index: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

fn write_cell(
    writer: &mut XmlWriter,
    reference: &str,
    cell: &Cell,
    style: Option<&str>,
) -> Result<(), ExportError> {
    let mut attrs = vec![("r", reference)];
    if let Some(style) = style {
        attrs.push(("s", style));
    }
    match cell {
        Cell::Text(value) => {
            attrs.push(("t", "inlineStr"));
            start(writer, "c", &attrs)?;
            start(writer, "is", &[])?;
            text_element(writer, "t", &[], value)?;
            end(writer, "is")?;
            end(writer, "c")
        }
        Cell::Number(value) if value.is_finite() => {
            start(writer, "c", &attrs)?;
            text_element(writer, "v", &[], &value.to_string())?;
            end(writer, "c")
        }
        Cell::Integer(value) => {
            start(writer, "c", &attrs)?;
            text_element(writer, "v", &[], &value.to_string())?;
            end(writer, "c")
        }
        Cell::Bool(value) => {
            attrs.push(("t", "b"));
            start(writer, "c", &attrs)?;
            text_element(writer, "v", &[], if *value { "1" } else { "0" })?;
            end(writer, "c")
        }
        Cell::Number(_) | Cell::Empty => Ok(()),
    }
}

/// `xl/worksheets/sheetN.xml` for one sheet; header row uses the bold style
pub(crate) fn worksheet_xml(sheet: &Sheet) -> Result<Vec<u8>, ExportError> {
    let mut writer = xml_writer()?;
    start(&mut writer, "worksheet", &[("xmlns", NS_MAIN), ("xmlns:r", NS_REL)])?;
    start(&mut writer, "sheetData", &[])?;

    let header = sheet.headers.iter().map(|h| Cell::from(h.as_str()));
    let header_row: Vec<Cell> = header.collect();
    let rows = std::iter::once((&header_row, Some("1"))).chain(sheet.rows.iter().map(|r| (r, None)));

    for (row_index, (cells, style)) in rows.enumerate() {
        let row_number = (row_index + 1).to_string();
        start(&mut writer, "row", &[("r", row_number.as_str())])?;
        for (col_index, cell) in cells.iter().enumerate() {
            let reference = format!("{}{}", column_letters(col_index), row_number);
            write_cell(&mut writer, &reference, cell, style)?;
        }
        end(&mut writer, "row")?;
    }

    end(&mut writer, "sheetData")?;
    end(&mut writer, "worksheet")?;
    Ok(writer.into_inner())
}

fn content_types_xml(sheet_count: usize) -> Result<Vec<u8>, ExportError> {
    let mut writer = xml_writer()?;
    start(&mut writer, "Types", &[("xmlns", NS_CONTENT_TYPES)])?;
    empty(&mut writer, "Default", &[("Extension", "rels"), ("ContentType", CT_RELS)])?;
    empty(&mut writer, "Default", &[("Extension", "xml"), ("ContentType", "application/xml")])?;
    empty(&mut writer, "Override", &[("PartName", "/xl/workbook.xml"), ("ContentType", CT_WORKBOOK)])?;
    empty(&mut writer, "Override", &[("PartName", "/xl/styles.xml"), ("ContentType", CT_STYLES)])?;
    empty(&mut writer, "Override", &[("PartName", "/docProps/core.xml"), ("ContentType", CT_CORE)])?;
    for n in 1..=sheet_count {
        let part = format!("/xl/worksheets/sheet{}.xml", n);
        empty(&mut writer, "Override", &[("PartName", part.as_str()), ("ContentType", CT_WORKSHEET)])?;
    }
    end(&mut writer, "Types")?;
    Ok(writer.into_inner())
}

fn root_rels_xml() -> Result<Vec<u8>, ExportError> {
    let mut writer = xml_writer()?;
    start(&mut writer, "Relationships", &[("xmlns", NS_PKG_REL)])?;
    empty(
        &mut writer,
        "Relationship",
        &[("Id", "rId1"), ("Type", REL_OFFICE_DOCUMENT), ("Target", "xl/workbook.xml")],
    )?;
    empty(
        &mut writer,
        "Relationship",
        &[("Id", "rId2"), ("Type", REL_CORE_PROPERTIES), ("Target", "docProps/core.xml")],
    )?;
    end(&mut writer, "Relationships")?;
    Ok(writer.into_inner())
}

fn core_xml(options: &ExportOptions) -> Result<Vec<u8>, ExportError> {
    let created = options
        .created_at
        .unwrap_or_else(Utc::now)
        .to_rfc3339_opts(SecondsFormat::Secs, true);

    let mut writer = xml_writer()?;
    start(
        &mut writer,
        "cp:coreProperties",
        &[
            ("xmlns:cp", NS_CORE),
            ("xmlns:dc", "http://purl.org/dc/elements/1.1/"),
            ("xmlns:dcterms", "http://purl.org/dc/terms/"),
            ("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"),
        ],
    )?;
    text_element(&mut writer, "dc:creator", &[], &options.creator)?;
    text_element(&mut writer, "dcterms:created", &[("xsi:type", "dcterms:W3CDTF")], &created)?;
    end(&mut writer, "cp:coreProperties")?;
    Ok(writer.into_inner())
}

fn workbook_xml(sheets: &[Sheet]) -> Result<Vec<u8>, ExportError> {
    let mut writer = xml_writer()?;
    start(&mut writer, "workbook", &[("xmlns", NS_MAIN), ("xmlns:r", NS_REL)])?;
    start(&mut writer, "sheets", &[])?;
    for (i, sheet) in sheets.iter().enumerate() {
        let sheet_id = (i + 1).to_string();
        let rel_id = format!("rId{}", i + 1);
        empty(
            &mut writer,
            "sheet",
            &[
                ("name", sheet.name.as_str()),
                ("sheetId", sheet_id.as_str()),
                ("r:id", rel_id.as_str()),
            ],
        )?;
    }
    end(&mut writer, "sheets")?;
    end(&mut writer, "workbook")?;
    Ok(writer.into_inner())
}

fn workbook_rels_xml(sheet_count: usize) -> Result<Vec<u8>, ExportError> {
    let mut writer = xml_writer()?;
    start(&mut writer, "Relationships", &[("xmlns", NS_PKG_REL)])?;
    for n in 1..=sheet_count {
        let id = format!("rId{}", n);
        let target = format!("worksheets/sheet{}.xml", n);
        empty(
            &mut writer,
            "Relationship",
            &[("Id", id.as_str()), ("Type", REL_WORKSHEET), ("Target", target.as_str())],
        )?;
    }
    let styles_id = format!("rId{}", sheet_count + 1);
    empty(
        &mut writer,
        "Relationship",
        &[("Id", styles_id.as_str()), ("Type", REL_STYLES), ("Target", "styles.xml")],
    )?;
    end(&mut writer, "Relationships")?;
    Ok(writer.into_inner())
}

// Style 0 is the default, style 1 is bold (header row).
fn styles_xml() -> Result<Vec<u8>, ExportError> {
    let mut writer = xml_writer()?;
    start(&mut writer, "styleSheet", &[("xmlns", NS_MAIN)])?;

    start(&mut writer, "fonts", &[("count", "2")])?;
    start(&mut writer, "font", &[])?;
    empty(&mut writer, "sz", &[("val", "11")])?;
    empty(&mut writer, "name", &[("val", "Calibri")])?;
    end(&mut writer, "font")?;
    start(&mut writer, "font", &[])?;
    empty(&mut writer, "b", &[])?;
    empty(&mut writer, "sz", &[("val", "11")])?;
    empty(&mut writer, "name", &[("val", "Calibri")])?;
    end(&mut writer, "font")?;
    end(&mut writer, "fonts")?;

    start(&mut writer, "fills", &[("count", "2")])?;
    for pattern in ["none", "gray125"] {
        start(&mut writer, "fill", &[])?;
        empty(&mut writer, "patternFill", &[("patternType", pattern)])?;
        end(&mut writer, "fill")?;
    }
    end(&mut writer, "fills")?;

    start(&mut writer, "borders", &[("count", "1")])?;
    empty(&mut writer, "border", &[])?;
    end(&mut writer, "borders")?;

    start(&mut writer, "cellStyleXfs", &[("count", "1")])?;
    empty(&mut writer, "xf", &[("numFmtId", "0"), ("fontId", "0"), ("fillId", "0"), ("borderId", "0")])?;
    end(&mut writer, "cellStyleXfs")?;

    start(&mut writer, "cellXfs", &[("count", "2")])?;
    empty(
        &mut writer,
        "xf",
        &[("numFmtId", "0"), ("fontId", "0"), ("fillId", "0"), ("borderId", "0"), ("xfId", "0")],
    )?;
    empty(
        &mut writer,
        "xf",
        &[
            ("numFmtId", "0"),
            ("fontId", "1"),
            ("fillId", "0"),
            ("borderId", "0"),
            ("xfId", "0"),
            ("applyFont", "1"),
        ],
    )?;
    end(&mut writer, "cellXfs")?;

    end(&mut writer, "styleSheet")?;
    Ok(writer.into_inner())
}

/// Build the workbook for a summary table and the retained results.
///
/// Returns the bytes of the `.xlsx` file.
pub fn export_workbook(
    summary: &SummaryTable,
    results: &Results,
    options: &ExportOptions,
) -> Result<Vec<u8>, ExportError> {
    let sheets = report_sheets(summary, results);

    let mut zip_writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options_for_entry = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default())
        .unix_permissions(0o644);

    let mut parts: Vec<(String, Vec<u8>)> = vec![
        ("[Content_Types].xml".to_string(), content_types_xml(sheets.len())?),
        ("_rels/.rels".to_string(), root_rels_xml()?),
        ("docProps/core.xml".to_string(), core_xml(options)?),
        ("xl/workbook.xml".to_string(), workbook_xml(&sheets)?),
        ("xl/_rels/workbook.xml.rels".to_string(), workbook_rels_xml(sheets.len())?),
        ("xl/styles.xml".to_string(), styles_xml()?),
    ];
    for (i, sheet) in sheets.iter().enumerate() {
        parts.push((format!("xl/worksheets/sheet{}.xml", i + 1), worksheet_xml(sheet)?));
    }

    for (name, data) in &parts {
        zip_writer.start_file(name.as_str(), options_for_entry)?;
        zip_writer.write_all(data)?;
    }

    let cursor = zip_writer.finish()?;
    Ok(cursor.into_inner())
}

/// Write the workbook to `path`, creating parent directories as needed
pub fn write_workbook<P: AsRef<Path>>(
    path: P,
    summary: &SummaryTable,
    results: &Results,
    options: &ExportOptions,
) -> Result<(), ExportError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    let bytes = export_workbook(summary, results, options)?;
    fs::write(path, &bytes)?;
    info!(
        "Wrote report {} ({} result sheet(s), {} bytes)",
        path.display(),
        results.len(),
        bytes.len()
    );
    Ok(())
}

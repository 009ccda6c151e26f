//! XLSX workbook writer.
//!
//! The workbook is assembled part by part with quick-xml and packed into a
//! zip container: content types, package and workbook relationships, core
//! and extended properties, the stylesheet, and one worksheet per report
//! sheet. Strings are written as inline strings and numbers as native
//! values, so no shared-string table is needed at report sizes.

use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use polars::prelude::{AnyValue, DataFrame};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use kca_core::{CompetitionReport, ReportSheet};
use kca_ingest::{any_to_string, format_numeric};

const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const CONTENT_TYPES_NS: &str = "http://schemas.openxmlformats.org/package/2006/content-types";
const PACKAGE_RELS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const DOC_RELS_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const CORE_PROPS_NS: &str =
    "http://schemas.openxmlformats.org/package/2006/metadata/core-properties";
const APP_PROPS_NS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/extended-properties";
const DC_NS: &str = "http://purl.org/dc/elements/1.1/";
const DCTERMS_NS: &str = "http://purl.org/dc/terms/";
const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";

const APPLICATION_NAME: &str = "kca";

/// Style indices into `cellXfs`: the bold header row and the uniform
/// competing-row fill.
const HEADER_STYLE: &str = "1";
const COMPETING_STYLE: &str = "2";
/// ARGB of the competing-row fill.
const COMPETING_FILL_RGB: &str = "FFC6EFCE";

/// Excel rejects worksheet titles longer than 31 characters.
const MAX_SHEET_TITLE_CHARS: usize = 31;

/// Workbook path derived from the input file:
/// `<stem>_cannibalization.xlsx` next to the input.
pub fn default_workbook_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().and_then(OsStr::to_str).unwrap_or("report");
    input.with_file_name(format!("{stem}_cannibalization.xlsx"))
}

/// Writes the report as an XLSX workbook at `path`.
pub fn write_workbook(path: &Path, report: &CompetitionReport) -> Result<()> {
    ensure_parent_dir(path)?;
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut archive = ZipWriter::new(BufWriter::new(file));
    let options = SimpleFileOptions::default();
    let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    let sheet_count = report.sheets.len();

    write_part(
        &mut archive,
        options,
        "[Content_Types].xml",
        &content_types_xml(sheet_count)?,
    )?;
    write_part(&mut archive, options, "_rels/.rels", &package_rels_xml()?)?;
    write_part(
        &mut archive,
        options,
        "docProps/core.xml",
        &core_properties_xml(&timestamp)?,
    )?;
    write_part(
        &mut archive,
        options,
        "docProps/app.xml",
        &app_properties_xml()?,
    )?;
    write_part(
        &mut archive,
        options,
        "xl/workbook.xml",
        &workbook_xml(&report.sheets)?,
    )?;
    write_part(
        &mut archive,
        options,
        "xl/_rels/workbook.xml.rels",
        &workbook_rels_xml(sheet_count)?,
    )?;
    write_part(&mut archive, options, "xl/styles.xml", &styles_xml()?)?;
    for (index, sheet) in report.sheets.iter().enumerate() {
        let part = format!("xl/worksheets/sheet{}.xml", index + 1);
        write_part(&mut archive, options, &part, &worksheet_xml(&sheet.table)?)?;
    }

    let mut inner = archive
        .finish()
        .with_context(|| format!("finalize {}", path.display()))?;
    inner
        .flush()
        .with_context(|| format!("flush {}", path.display()))?;
    Ok(())
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create directory {}", parent.display()))?;
        }
    }
    Ok(())
}

fn write_part(
    archive: &mut ZipWriter<BufWriter<File>>,
    options: SimpleFileOptions,
    name: &str,
    bytes: &[u8],
) -> Result<()> {
    archive
        .start_file(name, options)
        .with_context(|| format!("start workbook part {name}"))?;
    archive
        .write_all(bytes)
        .with_context(|| format!("write workbook part {name}"))?;
    Ok(())
}

fn xml_writer() -> Writer<Vec<u8>> {
    Writer::new_with_indent(Vec::new(), b' ', 2)
}

fn write_empty(xml: &mut Writer<Vec<u8>>, name: &str, attributes: &[(&str, &str)]) -> Result<()> {
    let mut element = BytesStart::new(name);
    for &attribute in attributes {
        element.push_attribute(attribute);
    }
    xml.write_event(Event::Empty(element))?;
    Ok(())
}

fn write_text_element(xml: &mut Writer<Vec<u8>>, name: &str, text: &str) -> Result<()> {
    xml.write_event(Event::Start(BytesStart::new(name)))?;
    xml.write_event(Event::Text(BytesText::new(text)))?;
    xml.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn content_types_xml(sheet_count: usize) -> Result<Vec<u8>> {
    let mut xml = xml_writer();
    xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    let mut root = BytesStart::new("Types");
    root.push_attribute(("xmlns", CONTENT_TYPES_NS));
    xml.write_event(Event::Start(root))?;
    write_empty(
        &mut xml,
        "Default",
        &[
            ("Extension", "rels"),
            (
                "ContentType",
                "application/vnd.openxmlformats-package.relationships+xml",
            ),
        ],
    )?;
    write_empty(
        &mut xml,
        "Default",
        &[("Extension", "xml"), ("ContentType", "application/xml")],
    )?;
    write_empty(
        &mut xml,
        "Override",
        &[
            ("PartName", "/xl/workbook.xml"),
            (
                "ContentType",
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml",
            ),
        ],
    )?;
    for index in 1..=sheet_count {
        let part = format!("/xl/worksheets/sheet{index}.xml");
        write_empty(
            &mut xml,
            "Override",
            &[
                ("PartName", part.as_str()),
                (
                    "ContentType",
                    "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml",
                ),
            ],
        )?;
    }
    write_empty(
        &mut xml,
        "Override",
        &[
            ("PartName", "/xl/styles.xml"),
            (
                "ContentType",
                "application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml",
            ),
        ],
    )?;
    write_empty(
        &mut xml,
        "Override",
        &[
            ("PartName", "/docProps/core.xml"),
            (
                "ContentType",
                "application/vnd.openxmlformats-package.core-properties+xml",
            ),
        ],
    )?;
    write_empty(
        &mut xml,
        "Override",
        &[
            ("PartName", "/docProps/app.xml"),
            (
                "ContentType",
                "application/vnd.openxmlformats-officedocument.extended-properties+xml",
            ),
        ],
    )?;
    xml.write_event(Event::End(BytesEnd::new("Types")))?;
    Ok(xml.into_inner())
}

fn package_rels_xml() -> Result<Vec<u8>> {
    let mut xml = xml_writer();
    xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    let mut root = BytesStart::new("Relationships");
    root.push_attribute(("xmlns", PACKAGE_RELS_NS));
    xml.write_event(Event::Start(root))?;
    write_empty(
        &mut xml,
        "Relationship",
        &[
            ("Id", "rId1"),
            (
                "Type",
                "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument",
            ),
            ("Target", "xl/workbook.xml"),
        ],
    )?;
    write_empty(
        &mut xml,
        "Relationship",
        &[
            ("Id", "rId2"),
            (
                "Type",
                "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties",
            ),
            ("Target", "docProps/core.xml"),
        ],
    )?;
    write_empty(
        &mut xml,
        "Relationship",
        &[
            ("Id", "rId3"),
            (
                "Type",
                "http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties",
            ),
            ("Target", "docProps/app.xml"),
        ],
    )?;
    xml.write_event(Event::End(BytesEnd::new("Relationships")))?;
    Ok(xml.into_inner())
}

fn core_properties_xml(timestamp: &str) -> Result<Vec<u8>> {
    let mut xml = xml_writer();
    xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    let mut root = BytesStart::new("cp:coreProperties");
    root.push_attribute(("xmlns:cp", CORE_PROPS_NS));
    root.push_attribute(("xmlns:dc", DC_NS));
    root.push_attribute(("xmlns:dcterms", DCTERMS_NS));
    root.push_attribute(("xmlns:xsi", XSI_NS));
    xml.write_event(Event::Start(root))?;
    write_text_element(&mut xml, "dc:creator", APPLICATION_NAME)?;
    write_text_element(&mut xml, "cp:lastModifiedBy", APPLICATION_NAME)?;
    for name in ["dcterms:created", "dcterms:modified"] {
        let mut element = BytesStart::new(name);
        element.push_attribute(("xsi:type", "dcterms:W3CDTF"));
        xml.write_event(Event::Start(element))?;
        xml.write_event(Event::Text(BytesText::new(timestamp)))?;
        xml.write_event(Event::End(BytesEnd::new(name)))?;
    }
    xml.write_event(Event::End(BytesEnd::new("cp:coreProperties")))?;
    Ok(xml.into_inner())
}

fn app_properties_xml() -> Result<Vec<u8>> {
    let mut xml = xml_writer();
    xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    let mut root = BytesStart::new("Properties");
    root.push_attribute(("xmlns", APP_PROPS_NS));
    xml.write_event(Event::Start(root))?;
    write_text_element(&mut xml, "Application", APPLICATION_NAME)?;
    xml.write_event(Event::End(BytesEnd::new("Properties")))?;
    Ok(xml.into_inner())
}

fn workbook_xml(sheets: &[ReportSheet]) -> Result<Vec<u8>> {
    let mut xml = xml_writer();
    xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    let mut root = BytesStart::new("workbook");
    root.push_attribute(("xmlns", MAIN_NS));
    root.push_attribute(("xmlns:r", DOC_RELS_NS));
    xml.write_event(Event::Start(root))?;
    xml.write_event(Event::Start(BytesStart::new("sheets")))?;
    for (index, sheet) in sheets.iter().enumerate() {
        let title = sheet_title(&sheet.label);
        let sheet_id = (index + 1).to_string();
        let rel_id = format!("rId{}", index + 1);
        write_empty(
            &mut xml,
            "sheet",
            &[
                ("name", title.as_str()),
                ("sheetId", sheet_id.as_str()),
                ("r:id", rel_id.as_str()),
            ],
        )?;
    }
    xml.write_event(Event::End(BytesEnd::new("sheets")))?;
    xml.write_event(Event::End(BytesEnd::new("workbook")))?;
    Ok(xml.into_inner())
}

fn workbook_rels_xml(sheet_count: usize) -> Result<Vec<u8>> {
    let mut xml = xml_writer();
    xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    let mut root = BytesStart::new("Relationships");
    root.push_attribute(("xmlns", PACKAGE_RELS_NS));
    xml.write_event(Event::Start(root))?;
    for index in 1..=sheet_count {
        let rel_id = format!("rId{index}");
        let target = format!("worksheets/sheet{index}.xml");
        write_empty(
            &mut xml,
            "Relationship",
            &[
                ("Id", rel_id.as_str()),
                (
                    "Type",
                    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet",
                ),
                ("Target", target.as_str()),
            ],
        )?;
    }
    let styles_id = format!("rId{}", sheet_count + 1);
    write_empty(
        &mut xml,
        "Relationship",
        &[
            ("Id", styles_id.as_str()),
            (
                "Type",
                "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles",
            ),
            ("Target", "styles.xml"),
        ],
    )?;
    xml.write_event(Event::End(BytesEnd::new("Relationships")))?;
    Ok(xml.into_inner())
}

/// Minimal stylesheet: default and bold fonts, the competing-row fill, and
/// cell formats 0 (default), 1 (header), 2 (competing row).
fn styles_xml() -> Result<Vec<u8>> {
    let mut xml = xml_writer();
    xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    let mut root = BytesStart::new("styleSheet");
    root.push_attribute(("xmlns", MAIN_NS));
    xml.write_event(Event::Start(root))?;

    let mut fonts = BytesStart::new("fonts");
    fonts.push_attribute(("count", "2"));
    xml.write_event(Event::Start(fonts))?;
    xml.write_event(Event::Start(BytesStart::new("font")))?;
    write_empty(&mut xml, "sz", &[("val", "11")])?;
    write_empty(&mut xml, "name", &[("val", "Calibri")])?;
    xml.write_event(Event::End(BytesEnd::new("font")))?;
    xml.write_event(Event::Start(BytesStart::new("font")))?;
    write_empty(&mut xml, "b", &[])?;
    write_empty(&mut xml, "sz", &[("val", "11")])?;
    write_empty(&mut xml, "name", &[("val", "Calibri")])?;
    xml.write_event(Event::End(BytesEnd::new("font")))?;
    xml.write_event(Event::End(BytesEnd::new("fonts")))?;

    // Fill slots 0 and 1 are reserved by the format; the competing fill
    // sits at index 2.
    let mut fills = BytesStart::new("fills");
    fills.push_attribute(("count", "3"));
    xml.write_event(Event::Start(fills))?;
    xml.write_event(Event::Start(BytesStart::new("fill")))?;
    write_empty(&mut xml, "patternFill", &[("patternType", "none")])?;
    xml.write_event(Event::End(BytesEnd::new("fill")))?;
    xml.write_event(Event::Start(BytesStart::new("fill")))?;
    write_empty(&mut xml, "patternFill", &[("patternType", "gray125")])?;
    xml.write_event(Event::End(BytesEnd::new("fill")))?;
    xml.write_event(Event::Start(BytesStart::new("fill")))?;
    let mut pattern = BytesStart::new("patternFill");
    pattern.push_attribute(("patternType", "solid"));
    xml.write_event(Event::Start(pattern))?;
    write_empty(&mut xml, "fgColor", &[("rgb", COMPETING_FILL_RGB)])?;
    xml.write_event(Event::End(BytesEnd::new("patternFill")))?;
    xml.write_event(Event::End(BytesEnd::new("fill")))?;
    xml.write_event(Event::End(BytesEnd::new("fills")))?;

    let mut borders = BytesStart::new("borders");
    borders.push_attribute(("count", "1"));
    xml.write_event(Event::Start(borders))?;
    xml.write_event(Event::Start(BytesStart::new("border")))?;
    for side in ["left", "right", "top", "bottom", "diagonal"] {
        write_empty(&mut xml, side, &[])?;
    }
    xml.write_event(Event::End(BytesEnd::new("border")))?;
    xml.write_event(Event::End(BytesEnd::new("borders")))?;

    let mut cell_style_xfs = BytesStart::new("cellStyleXfs");
    cell_style_xfs.push_attribute(("count", "1"));
    xml.write_event(Event::Start(cell_style_xfs))?;
    write_empty(
        &mut xml,
        "xf",
        &[
            ("numFmtId", "0"),
            ("fontId", "0"),
            ("fillId", "0"),
            ("borderId", "0"),
        ],
    )?;
    xml.write_event(Event::End(BytesEnd::new("cellStyleXfs")))?;

    let mut cell_xfs = BytesStart::new("cellXfs");
    cell_xfs.push_attribute(("count", "3"));
    xml.write_event(Event::Start(cell_xfs))?;
    write_empty(
        &mut xml,
        "xf",
        &[
            ("numFmtId", "0"),
            ("fontId", "0"),
            ("fillId", "0"),
            ("borderId", "0"),
            ("xfId", "0"),
        ],
    )?;
    write_empty(
        &mut xml,
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
    write_empty(
        &mut xml,
        "xf",
        &[
            ("numFmtId", "0"),
            ("fontId", "0"),
            ("fillId", "2"),
            ("borderId", "0"),
            ("xfId", "0"),
            ("applyFill", "1"),
        ],
    )?;
    xml.write_event(Event::End(BytesEnd::new("cellXfs")))?;

    xml.write_event(Event::End(BytesEnd::new("styleSheet")))?;
    Ok(xml.into_inner())
}

/// One worksheet: a bold header row, then every data row carrying the
/// competing-row fill. De-duplication upstream guarantees each emitted row
/// belongs to a group with at least two details, so the highlight is
/// uniform rather than conditional.
fn worksheet_xml(table: &DataFrame) -> Result<Vec<u8>> {
    let mut xml = xml_writer();
    xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    let mut root = BytesStart::new("worksheet");
    root.push_attribute(("xmlns", MAIN_NS));
    xml.write_event(Event::Start(root))?;
    xml.write_event(Event::Start(BytesStart::new("sheetData")))?;

    let columns = table.get_columns();

    write_row_start(&mut xml, 1)?;
    for (col_index, column) in columns.iter().enumerate() {
        write_string_cell(&mut xml, col_index, 1, column.name().as_str(), HEADER_STYLE)?;
    }
    xml.write_event(Event::End(BytesEnd::new("row")))?;

    for row_index in 0..table.height() {
        let row_number = row_index + 2;
        write_row_start(&mut xml, row_number)?;
        for (col_index, column) in columns.iter().enumerate() {
            let value = column.get(row_index).unwrap_or(AnyValue::Null);
            match value {
                AnyValue::Null => {
                    write_blank_cell(&mut xml, col_index, row_number, COMPETING_STYLE)?;
                }
                AnyValue::Float64(number) if number.is_finite() => {
                    write_number_cell(&mut xml, col_index, row_number, number, COMPETING_STYLE)?;
                }
                // Non-finite numbers have no XLSX representation.
                AnyValue::Float64(_) => {
                    write_blank_cell(&mut xml, col_index, row_number, COMPETING_STYLE)?;
                }
                other => {
                    let text = any_to_string(other);
                    write_string_cell(&mut xml, col_index, row_number, &text, COMPETING_STYLE)?;
                }
            }
        }
        xml.write_event(Event::End(BytesEnd::new("row")))?;
    }

    xml.write_event(Event::End(BytesEnd::new("sheetData")))?;
    xml.write_event(Event::End(BytesEnd::new("worksheet")))?;
    Ok(xml.into_inner())
}

fn write_row_start(xml: &mut Writer<Vec<u8>>, row_number: usize) -> Result<()> {
    let mut row = BytesStart::new("row");
    let reference = row_number.to_string();
    row.push_attribute(("r", reference.as_str()));
    xml.write_event(Event::Start(row))?;
    Ok(())
}

fn write_string_cell(
    xml: &mut Writer<Vec<u8>>,
    col_index: usize,
    row_number: usize,
    text: &str,
    style: &str,
) -> Result<()> {
    let reference = cell_reference(col_index, row_number);
    let mut cell = BytesStart::new("c");
    cell.push_attribute(("r", reference.as_str()));
    cell.push_attribute(("s", style));
    cell.push_attribute(("t", "inlineStr"));
    xml.write_event(Event::Start(cell))?;
    xml.write_event(Event::Start(BytesStart::new("is")))?;
    write_text_element(xml, "t", text)?;
    xml.write_event(Event::End(BytesEnd::new("is")))?;
    xml.write_event(Event::End(BytesEnd::new("c")))?;
    Ok(())
}

fn write_number_cell(
    xml: &mut Writer<Vec<u8>>,
    col_index: usize,
    row_number: usize,
    value: f64,
    style: &str,
) -> Result<()> {
    let reference = cell_reference(col_index, row_number);
    let mut cell = BytesStart::new("c");
    cell.push_attribute(("r", reference.as_str()));
    cell.push_attribute(("s", style));
    xml.write_event(Event::Start(cell))?;
    write_text_element(xml, "v", &format_numeric(value))?;
    xml.write_event(Event::End(BytesEnd::new("c")))?;
    Ok(())
}

/// Styled but valueless, so null cells keep the row fill.
fn write_blank_cell(
    xml: &mut Writer<Vec<u8>>,
    col_index: usize,
    row_number: usize,
    style: &str,
) -> Result<()> {
    let reference = cell_reference(col_index, row_number);
    let mut cell = BytesStart::new("c");
    cell.push_attribute(("r", reference.as_str()));
    cell.push_attribute(("s", style));
    xml.write_event(Event::Empty(cell))?;
    Ok(())
}

fn cell_reference(col_index: usize, row_number: usize) -> String {
    format!("{}{row_number}", column_letters(col_index))
}

/// Zero-based column index to the A1-style letter run: 0 is A, 25 is Z,
/// 26 is AA.
fn column_letters(index: usize) -> String {
    let mut letters = String::new();
    let mut remaining = index;
    loop {
        letters.insert(0, char::from(b'A' + (remaining % 26) as u8));
        if remaining < 26 {
            break;
        }
        remaining = remaining / 26 - 1;
    }
    letters
}

/// Worksheet titles: characters Excel rejects are replaced with spaces and
/// the result clipped to the 31-character limit.
fn sheet_title(label: &str) -> String {
    label
        .chars()
        .map(|c| match c {
            ':' | '\\' | '/' | '?' | '*' | '[' | ']' => ' ',
            other => other,
        })
        .take(MAX_SHEET_TITLE_CHARS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_letters_cover_single_and_double_runs() {
        assert_eq!(column_letters(0), "A");
        assert_eq!(column_letters(25), "Z");
        assert_eq!(column_letters(26), "AA");
        assert_eq!(column_letters(27), "AB");
        assert_eq!(column_letters(51), "AZ");
        assert_eq!(column_letters(52), "BA");
        assert_eq!(column_letters(701), "ZZ");
        assert_eq!(column_letters(702), "AAA");
    }

    #[test]
    fn sheet_titles_replace_reserved_characters() {
        assert_eq!(sheet_title("Competing by clicks"), "Competing by clicks");
        assert_eq!(sheet_title("a/b:c?d"), "a b c d");
    }

    #[test]
    fn sheet_titles_clip_at_the_excel_limit() {
        // The merged search-console label is exactly at the limit.
        assert_eq!(sheet_title("Competing by clicks+impressions").chars().count(), 31);
        let long = "Competing by a very long metric label";
        assert_eq!(sheet_title(long).chars().count(), 31);
    }
}

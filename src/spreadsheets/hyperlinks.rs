// Recovers deep-links from a portal export. The link can live in three
// places: a native cell hyperlink (sheet relationships), a HYPERLINK()
// formula, or a literal "=HYPERLINK(...)" string left by an earlier tool.

use crate::spreadsheets::reader::{find_header_row, open_sheet};
use calamine::{open_workbook_auto, Data, Reader};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader as XmlReader;
use regex::Regex;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{info, warn};
use zip::ZipArchive;

/// Column holding the portal deep-link in every export.
pub const LINK_COLUMN: &str = "Open in RPData";

fn hyperlink_formula() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?i)^=?\s*HYPERLINK\(\s*"([^"]+)""#).expect("hyperlink pattern"))
}

/// URL inside a `HYPERLINK("url", ...)` formula, with or without the leading `=`.
pub fn url_from_formula(formula: &str) -> Option<String> {
    hyperlink_formula()
        .captures(formula.trim())
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Maps each data row (0-based, counted from the row under the header) to
/// the deep-link found in `column_name`.
///
/// Never fails: a missing header, a missing column or an unreadable file all
/// give an empty map and the caller falls back to other link sources.
pub fn extract_hyperlinks(
    path: &Path,
    sheet_index: usize,
    header_marker: &str,
    column_name: &str,
) -> HashMap<usize, String> {
    let mut links = HashMap::new();

    let (sheet_name, range) = match open_sheet(path, sheet_index) {
        Ok(opened) => opened,
        Err(e) => {
            warn!(error = %e, "cannot scan for hyperlinks");
            return links;
        }
    };

    let Some(header_idx) = find_header_row(&range, header_marker) else {
        warn!(path = %path.display(), "could not find '{header_marker}' header, no hyperlinks");
        return links;
    };

    let Some(col_idx) = range
        .rows()
        .nth(header_idx)
        .and_then(|row| row.iter().position(|c| matches!(c, Data::String(s) if s.trim() == column_name)))
    else {
        warn!(path = %path.display(), "could not find '{column_name}' column, no hyperlinks");
        return links;
    };

    let (start_row, start_col) = range.start().unwrap_or((0, 0));
    let header_row = start_row + header_idx as u32;
    let column = start_col + col_idx as u32;

    let to_position = |row: u32| -> Option<usize> {
        (row > header_row).then(|| (row - header_row - 1) as usize)
    };

    // Literal "=HYPERLINK(" strings, lowest priority.
    for (offset, row) in range.rows().enumerate().skip(header_idx + 1) {
        if let Some(Data::String(s)) = row.get(col_idx) {
            if let Some(url) = url_from_formula(s) {
                links.insert(offset - header_idx - 1, url);
            }
        }
    }

    // Real formulas.
    match open_workbook_auto(path).map(|mut wb| wb.worksheet_formula(&sheet_name)) {
        Ok(Ok(formulas)) => {
            let (f_row, f_col) = formulas.start().unwrap_or((0, 0));
            for (r, c, formula) in formulas.used_cells() {
                if f_col + c as u32 != column {
                    continue;
                }
                if let (Some(position), Some(url)) =
                    (to_position(f_row + r as u32), url_from_formula(formula))
                {
                    links.insert(position, url);
                }
            }
        }
        Ok(Err(e)) => warn!(error = %e, "cannot read formulas for hyperlinks"),
        Err(e) => warn!(error = %e, "cannot reopen workbook for formulas"),
    }

    // Native hyperlinks win over everything else.
    match native_hyperlinks(path, sheet_index) {
        Ok(native) => {
            for ((row, col), url) in native {
                if col != column {
                    continue;
                }
                if let Some(position) = to_position(row) {
                    links.insert(position, url);
                }
            }
        }
        Err(e) => warn!(path = %path.display(), error = %e, "cannot read native hyperlinks"),
    }

    info!(path = %path.display(), count = links.len(), "extracted hyperlinks");
    links
}

/// "B12" -> (11, 1). Ranges like "B12:B12" use their first cell.
pub fn parse_cell_ref(reference: &str) -> Option<(u32, u32)> {
    let first = reference.split(':').next()?.replace('$', "");
    let split = first.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = first.split_at(split);
    if letters.is_empty() {
        return None;
    }

    let mut col: u32 = 0;
    for ch in letters.chars() {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        col = col * 26 + (ch.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
    }
    let row: u32 = digits.parse().ok()?;
    if row == 0 {
        return None;
    }
    Some((row - 1, col - 1))
}

fn zip_read_to_string(zip: &mut ZipArchive<File>, name: &str) -> Result<Option<String>, String> {
    let mut file = match zip.by_name(name) {
        Ok(f) => f,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(format!("{name}: {e}")),
    };
    let mut out = String::new();
    file.read_to_string(&mut out)
        .map_err(|e| format!("{name}: {e}"))?;
    Ok(Some(out))
}

fn attr_value(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

// Relationship ids are namespaced ("r:id"), whatever the prefix is called.
fn rel_id(e: &BytesStart) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.prefix().is_some() && a.key.local_name().as_ref() == b"id")
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// Calls `f` for every start/empty element in `xml`.
fn for_each_element(xml: &str, mut f: impl FnMut(&BytesStart)) -> Result<(), String> {
    let mut reader = XmlReader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => f(&e),
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.to_string()),
            _ => {}
        }
        buf.clear();
    }
    Ok(())
}

fn relationship_targets(xml: &str) -> Result<HashMap<String, String>, String> {
    let mut targets = HashMap::new();
    for_each_element(xml, |e| {
        if e.local_name().as_ref() == b"Relationship" {
            if let (Some(id), Some(target)) = (attr_value(e, b"Id"), attr_value(e, b"Target")) {
                targets.insert(id, target);
            }
        }
    })?;
    Ok(targets)
}

/// Cell position -> URL for every external hyperlink on worksheet `sheet_index`.
fn native_hyperlinks(path: &Path, sheet_index: usize) -> Result<HashMap<(u32, u32), String>, String> {
    let file = File::open(path).map_err(|e| e.to_string())?;
    let mut zip = ZipArchive::new(file).map_err(|e| e.to_string())?;

    let workbook_xml = zip_read_to_string(&mut zip, "xl/workbook.xml")?
        .ok_or("xl/workbook.xml missing")?;
    let mut sheet_rids = Vec::new();
    for_each_element(&workbook_xml, |e| {
        if e.local_name().as_ref() == b"sheet" {
            sheet_rids.push(rel_id(e));
        }
    })?;
    let sheet_rid = sheet_rids
        .into_iter()
        .nth(sheet_index)
        .ok_or_else(|| format!("workbook has no sheet {sheet_index}"))?
        .ok_or_else(|| format!("sheet {sheet_index} has no relationship id"))?;

    let workbook_rels = zip_read_to_string(&mut zip, "xl/_rels/workbook.xml.rels")?
        .ok_or("workbook relationships missing")?;
    let target = relationship_targets(&workbook_rels)?
        .remove(&sheet_rid)
        .ok_or_else(|| format!("sheet {sheet_index} has no relationship target"))?;

    let sheet_path = match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{target}"),
    };
    let (dir, file_name) = sheet_path.rsplit_once('/').unwrap_or(("", sheet_path.as_str()));
    let rels_path = format!("{dir}/_rels/{file_name}.rels");

    let Some(sheet_rels) = zip_read_to_string(&mut zip, &rels_path)? else {
        return Ok(HashMap::new());
    };
    let link_targets = relationship_targets(&sheet_rels)?;

    let sheet_xml = zip_read_to_string(&mut zip, &sheet_path)?
        .ok_or_else(|| format!("{sheet_path} missing"))?;

    let mut links = HashMap::new();
    for_each_element(&sheet_xml, |e| {
        if e.local_name().as_ref() != b"hyperlink" {
            return;
        }
        let cell = attr_value(e, b"ref").and_then(|r| parse_cell_ref(&r));
        let url = rel_id(e).and_then(|id| link_targets.get(&id).cloned());
        if let (Some(cell), Some(url)) = (cell, url) {
            links.insert(cell, url);
        }
    })?;

    Ok(links)
}

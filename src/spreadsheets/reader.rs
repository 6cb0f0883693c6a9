use crate::domain::CellValue;
use crate::errors::InputError;
use calamine::{open_workbook_auto, Data, Range, Reader};
use std::path::{Path, PathBuf};

/// Text of the first real header cell in every portal export.
pub const HEADER_MARKER: &str = "Property Photo";

/// One data row of a source export, keyed by header text.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    /// 0-based index of the row below the header row.
    pub position: usize,
    cells: Vec<(String, CellValue)>,
}

impl RawRecord {
    pub fn new(position: usize, cells: Vec<(String, CellValue)>) -> Self {
        Self { position, cells }
    }

    /// Value under `header`, `Empty` when the column does not exist.
    pub fn get(&self, header: &str) -> &CellValue {
        static EMPTY: CellValue = CellValue::Empty;
        self.cells
            .iter()
            .find(|(h, _)| h == header)
            .map(|(_, v)| v)
            .unwrap_or(&EMPTY)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.cells.iter().map(|(h, v)| (h.as_str(), v))
    }
}

/// The data block of one export: everything under the header row.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub path: PathBuf,
    pub headers: Vec<String>,
    pub records: Vec<RawRecord>,
}

#[cfg(test)]
impl RawTable {
    /// Builds a table from already-split rows. Row `i` gets position `i`.
    pub fn from_rows(headers: &[&str], rows: Vec<Vec<CellValue>>) -> Self {
        let headers: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
        let records = rows
            .into_iter()
            .enumerate()
            .map(|(i, row)| RawRecord::new(i, headers.iter().cloned().zip(row).collect()))
            .collect();

        Self {
            path: PathBuf::new(),
            headers,
            records,
        }
    }
}

pub fn to_cell(data: &Data) -> CellValue {
    match data {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::String(s) => CellValue::text(s.trim()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(CellValue::Date)
            .unwrap_or(CellValue::Number(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::text(s.clone()),
    }
}

fn is_marker(data: &Data, marker: &str) -> bool {
    matches!(data, Data::String(s) if s.trim() == marker)
}

/// Index (relative to the range) of the first row holding `marker`.
pub fn find_header_row(range: &Range<Data>, marker: &str) -> Option<usize> {
    range
        .rows()
        .position(|row| row.iter().any(|cell| is_marker(cell, marker)))
}

/// Opens worksheet `index` (0-based, workbook order) of a workbook.
pub fn open_sheet(path: &Path, index: usize) -> Result<(String, Range<Data>), InputError> {
    let mut workbook = open_workbook_auto(path).map_err(|e| InputError::Open {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let name = workbook
        .sheet_names()
        .get(index)
        .cloned()
        .ok_or_else(|| InputError::NoSheet {
            path: path.to_path_buf(),
            index,
        })?;

    let range = workbook
        .worksheet_range_at(index)
        .ok_or_else(|| InputError::NoSheet {
            path: path.to_path_buf(),
            index,
        })?
        .map_err(|e| InputError::Open {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    Ok((name, range))
}

/// Reads one portal export into a [`RawTable`].
///
/// The export starts with a block of search metadata; the real header row is
/// the first row containing [`HEADER_MARKER`]. Fully blank data rows are
/// skipped but still count towards `position`, so positions line up with the
/// hyperlink map.
pub fn read_table(path: &Path) -> Result<RawTable, InputError> {
    let (_, range) = open_sheet(path, 0)?;

    let header_idx =
        find_header_row(&range, HEADER_MARKER).ok_or_else(|| InputError::HeaderNotFound {
            path: path.to_path_buf(),
            marker: HEADER_MARKER.to_string(),
        })?;

    let mut rows = range.rows().skip(header_idx);
    let headers: Vec<String> = rows
        .next()
        .map(|row| row.iter().map(|c| c.to_string().trim().to_string()).collect())
        .unwrap_or_default();

    let mut records = Vec::new();
    for (position, row) in rows.enumerate() {
        let cells: Vec<(String, CellValue)> = headers
            .iter()
            .zip(row.iter())
            .filter(|(h, _)| !h.is_empty())
            .map(|(h, c)| (h.clone(), to_cell(c)))
            .collect();

        if cells.iter().all(|(_, v)| v.is_empty()) {
            continue;
        }
        records.push(RawRecord::new(position, cells));
    }

    Ok(RawTable {
        path: path.to_path_buf(),
        headers,
        records,
    })
}

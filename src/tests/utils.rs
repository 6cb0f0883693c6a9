use crate::domain::CellValue;
use crate::scraper::portal::MediaLookup;
use crate::scraper::{MediaSource, ScraperError, ZoningSource};
use rust_xlsxwriter::Workbook;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Writes a portal-style export: two lines of search metadata, then the
/// header row (starting with "Property Photo"), then one row per record.
pub fn write_export(dir: &Path, name: &str, headers: &[&str], rows: &[Vec<&str>]) -> PathBuf {
    let path = dir.join(name);
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    sheet.write_string(0, 0, "Search results exported from portal").unwrap();
    for (col, header) in headers.iter().enumerate() {
        sheet.write_string(2, col as u16, *header).unwrap();
    }
    for (i, row) in rows.iter().enumerate() {
        let r = (i + 3) as u32;
        for (col, value) in row.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            match value.parse::<f64>() {
                Ok(n) => sheet.write_number(r, col as u16, n).unwrap(),
                Err(_) => sheet.write_string(r, col as u16, *value).unwrap(),
            };
        }
    }
    workbook.save(&path).unwrap();
    path
}

/// Writes an allowed-use reference table: zone, Vet, Health.
pub fn write_use_table(dir: &Path, rows: &[(&str, &str, &str)]) -> PathBuf {
    let path = dir.join("Allowable Use in the Zone - TABLE.xlsx");
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "Zone").unwrap();
    sheet.write_string(0, 1, "Vet").unwrap();
    sheet.write_string(0, 2, "Health").unwrap();
    for (i, (zone, vet, health)) in rows.iter().enumerate() {
        let r = (i + 1) as u32;
        sheet.write_string(r, 0, *zone).unwrap();
        sheet.write_string(r, 1, *vet).unwrap();
        sheet.write_string(r, 2, *health).unwrap();
    }
    workbook.save(&path).unwrap();
    path
}

/// Reads back the report's first sheet as cells.
pub fn read_report(path: &Path) -> Vec<Vec<CellValue>> {
    let (_, range) = crate::spreadsheets::reader::open_sheet(path, 0).unwrap();
    range
        .rows()
        .map(|r| r.iter().map(crate::spreadsheets::reader::to_cell).collect())
        .collect()
}

/// Zoning collaborator with canned answers that remembers each batch it was asked for.
pub struct FakeZoning {
    pub answers: HashMap<String, String>,
    pub calls: RefCell<Vec<Vec<String>>>,
}

impl FakeZoning {
    pub fn new(answers: &[(&str, &str)]) -> Self {
        Self {
            answers: answers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            calls: RefCell::new(Vec::new()),
        }
    }
}

impl ZoningSource for FakeZoning {
    fn lookup(&self, addresses: &[String]) -> Result<HashMap<String, String>, ScraperError> {
        self.calls.borrow_mut().push(addresses.to_vec());
        Ok(self.answers.clone())
    }
}

/// Media collaborator returning the same photo URL and phone for every page.
pub struct FakeMedia {
    pub lookup: MediaLookup,
    pub links: RefCell<Vec<String>>,
}

impl MediaSource for FakeMedia {
    fn lookup(&self, deep_link: &str) -> Result<MediaLookup, ScraperError> {
        self.links.borrow_mut().push(deep_link.to_string());
        Ok(self.lookup.clone())
    }
}

use crate::domain::{BusinessType, CellValue, Field, OutputRow};
use crate::errors::InputError;
use crate::spreadsheets::reader::{open_sheet, to_cell};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, error, info, warn};

const MAX_EMPTY_ROWS: usize = 5;

/// Allowed-use flags per zone description for each business category.
#[derive(Debug, Default)]
pub struct ZoningUseTable {
    vet: HashMap<String, bool>,
    health: HashMap<String, bool>,
}

fn zone_key(zone: &str) -> String {
    zone.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

/// Section titles, notes and links that sit between the zone rows.
fn is_divider(zone: &str) -> bool {
    let all_caps = zone.chars().any(char::is_alphabetic)
        && !zone.chars().any(char::is_lowercase)
        && zone.split_whitespace().count() > 1;
    zone.starts_with("References")
        || zone.starts_with("NOTE")
        || zone.starts_with("http")
        || all_caps
}

fn parse_allowance(cell: &CellValue) -> Option<bool> {
    match cell {
        CellValue::Bool(b) => Some(*b),
        CellValue::Text(s) => match s.trim().to_ascii_uppercase().as_str() {
            "TRUE" | "YES" | "Y" | "T" => Some(true),
            "FALSE" | "NO" | "N" | "F" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

impl ZoningUseTable {
    /// Builds the table from sheet rows: zone, Vet, Health. The first row is the header.
    pub fn from_rows(rows: Vec<Vec<CellValue>>) -> Self {
        let mut table = ZoningUseTable::default();
        let mut empty_run = 0;

        for row in rows.into_iter().skip(1) {
            let zone = row.first().map(|c| c.to_string()).unwrap_or_default();
            let zone = zone.trim();
            if zone.is_empty() {
                empty_run += 1;
                if empty_run >= MAX_EMPTY_ROWS {
                    debug!("{MAX_EMPTY_ROWS} empty rows, end of zoning table");
                    break;
                }
                continue;
            }
            empty_run = 0;

            if is_divider(zone) {
                continue;
            }

            let key = zone_key(zone);
            if let Some(allowed) = row.get(1).and_then(parse_allowance) {
                table.vet.insert(key.clone(), allowed);
            }
            if let Some(allowed) = row.get(2).and_then(parse_allowance) {
                table.health.insert(key, allowed);
            }
        }
        table
    }

    pub fn load(path: &Path) -> Result<Self, InputError> {
        let (sheet, range) = open_sheet(path, 0)?;
        // calamine trims leading empty rows/columns; put them back so column A stays index 0.
        let (first_row, first_col) = range
            .start()
            .map(|(r, c)| (r as usize, c as usize))
            .unwrap_or((0, 0));
        let mut rows: Vec<Vec<CellValue>> = vec![Vec::new(); first_row];
        rows.extend(range.rows().map(|r| {
            std::iter::repeat(CellValue::Empty)
                .take(first_col)
                .chain(r.iter().map(to_cell))
                .collect()
        }));
        let table = Self::from_rows(rows);
        info!(
            sheet = %sheet,
            vet = table.vet.len(),
            health = table.health.len(),
            "loaded zoning use table from {}",
            path.display()
        );
        Ok(table)
    }

    pub fn allowed(&self, business: BusinessType, zoning: &str) -> Option<bool> {
        let map = match business {
            BusinessType::Vet => &self.vet,
            BusinessType::Health => &self.health,
        };
        map.get(&zone_key(zoning)).copied()
    }
}

/// Loads the reference table, logging and returning `None` when it can't be read.
pub fn load_table(path: &Path) -> Option<ZoningUseTable> {
    match ZoningUseTable::load(path) {
        Ok(table) => Some(table),
        Err(e) => {
            error!(error = %e, "zoning use table unavailable, allowed-use flags left empty");
            None
        }
    }
}

/// Stamps "Allowable Use in Zone (T/F)" on every row with a known zoning.
/// Returns how many rows received a flag.
pub fn check_allowed(
    rows: &mut [OutputRow],
    business_type: &str,
    table: Option<&ZoningUseTable>,
) -> usize {
    let business: BusinessType = match business_type.parse() {
        Ok(b) => b,
        Err(e) => {
            warn!("{e}: allowed-use flags left empty");
            return 0;
        }
    };
    let Some(table) = table else {
        return 0;
    };

    let mut flagged = 0;
    for row in rows.iter_mut() {
        let zoning = row.text(Field::SiteZoning);
        if zoning.trim().is_empty() {
            continue;
        }
        match table.allowed(business, &zoning) {
            Some(allowed) => {
                row.set(
                    Field::AllowableUse,
                    CellValue::text(if allowed { "T" } else { "F" }),
                );
                flagged += 1;
            }
            None => debug!(zoning = %zoning, "zone not in allowed-use table"),
        }
    }
    info!(business = %business, flagged, total = rows.len(), "allowed use checked");
    flagged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> CellValue {
        CellValue::text(s)
    }

    fn sample() -> ZoningUseTable {
        ZoningUseTable::from_rows(vec![
            vec![t("Zone"), t("Vet"), t("Health")],
            vec![t("RESIDENTIAL ZONES"), t(""), t("")],
            vec![t("R1 Residential"), t("F"), t("T")],
            vec![t("B4 Mixed Use"), CellValue::Bool(true), CellValue::Bool(true)],
            vec![t("NOTE: check council LEP"), t("T"), t("T")],
            vec![t("IN1 General Industrial"), t("maybe"), t("No")],
        ])
    }

    #[test]
    fn flags_follow_the_business_column() {
        let table = sample();
        assert_eq!(table.allowed(BusinessType::Vet, "R1 Residential"), Some(false));
        assert_eq!(table.allowed(BusinessType::Health, "R1 Residential"), Some(true));
        assert_eq!(table.allowed(BusinessType::Vet, "IN1 General Industrial"), None);
        assert_eq!(table.allowed(BusinessType::Health, "IN1 General Industrial"), Some(false));
    }

    #[test]
    fn lookup_ignores_case_and_spacing() {
        let table = sample();
        assert_eq!(table.allowed(BusinessType::Vet, "  b4   mixed use "), Some(true));
    }

    #[test]
    fn dividers_and_notes_are_not_zones() {
        let table = sample();
        assert_eq!(table.allowed(BusinessType::Vet, "RESIDENTIAL ZONES"), None);
        assert_eq!(table.allowed(BusinessType::Vet, "NOTE: check council LEP"), None);
    }

    #[test]
    fn reading_stops_after_a_run_of_empty_rows() {
        let mut rows = vec![vec![t("Zone"), t("Vet"), t("Health")]];
        rows.extend((0..MAX_EMPTY_ROWS).map(|_| vec![CellValue::Empty]));
        rows.push(vec![t("R2 Low Density"), t("T"), t("T")]);
        let table = ZoningUseTable::from_rows(rows);
        assert_eq!(table.allowed(BusinessType::Vet, "R2 Low Density"), None);
    }

    fn zoned(zoning: &str) -> OutputRow {
        let mut row = OutputRow::new();
        row.set(Field::SiteZoning, t(zoning));
        row
    }

    #[test]
    fn rows_get_t_or_f_and_unknowns_stay_empty() {
        let table = sample();
        let mut rows = vec![zoned("R1 Residential"), zoned("Z9 Unknown"), OutputRow::new()];

        assert_eq!(check_allowed(&mut rows, "health", Some(&table)), 1);
        assert_eq!(rows[0].text(Field::AllowableUse), "T");
        assert!(rows[1].get(Field::AllowableUse).is_empty());
        assert!(rows[2].get(Field::AllowableUse).is_empty());
    }

    #[test]
    fn unknown_business_type_leaves_flags_empty() {
        let table = sample();
        let mut rows = vec![zoned("R1 Residential")];
        assert_eq!(check_allowed(&mut rows, "Dentist", Some(&table)), 0);
        assert!(rows[0].get(Field::AllowableUse).is_empty());
    }
}

use crate::address::AddressLedger;
use crate::domain::{CellValue, Field, OutputRow, SearchType};
use crate::spreadsheets::hyperlinks::{url_from_formula, LINK_COLUMN};
use crate::spreadsheets::reader::{RawRecord, RawTable};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Base of the portal's property pages, used when an export carries no link.
pub const PORTAL_PROPERTY_BASE: &str = "https://rpp.corelogic.com.au/property/";

/// Output column -> source headers to try, first non-empty wins.
type SourceMap = &'static [(Field, &'static [&'static str])];

const ADDRESS_FIELDS: SourceMap = &[
    (Field::StreetAddress, &["Street Address"]),
    (Field::Suburb, &["Suburb"]),
    (Field::State, &["State"]),
    (Field::Postcode, &["Postcode"]),
];

const COMMON_FIELDS: SourceMap = &[
    (Field::PropertyType, &["Property Type"]),
    (Field::Bed, &["Bed"]),
    (Field::Bath, &["Bath"]),
    (Field::Car, &["Car"]),
    (Field::LandSize, &["Land Size (m²)", "Land Size (m2)", "Land Size"]),
    (Field::FloorSize, &["Floor Size (m²)", "Floor Size (m2)", "Floor Size"]),
    (Field::YearBuilt, &["Year Built"]),
    (Field::Agency, &["Agency"]),
    (Field::Agent, &["Agent"]),
    (Field::LandUse, &["Land Use"]),
    (Field::DevelopmentZone, &["Development Zone"]),
    (Field::ParcelDetails, &["Parcel Details"]),
    (Field::OwnerType, &["Owner Type"]),
];

const SALES_FIELDS: SourceMap = &[
    (Field::SalePrice, &["Sale Price"]),
    (Field::SaleDate, &["Sale Date"]),
    (Field::SettlementDate, &["Settlement Date"]),
    (Field::SaleType, &["Sale Type"]),
    (Field::Owner1Name, &["Owner 1 Name"]),
    (Field::Owner2Name, &["Owner 2 Name"]),
    (Field::Owner3Name, &["Owner 3 Name"]),
    (Field::Vendor1Name, &["Vendor 1 Name"]),
    (Field::Vendor2Name, &["Vendor 2 Name"]),
    (Field::Vendor3Name, &["Vendor 3 Name"]),
];

const FOR_SALE_FIELDS: SourceMap = &[
    (Field::FirstListedPrice, &["First Listed Price"]),
    (Field::FirstListedDate, &["First Listed Date"]),
    (Field::LastListedPrice, &["Last Listed Price"]),
    (Field::LastListedDate, &["Last Listed Date"]),
    (Field::ListingType, &["Listing Type"]),
    (Field::DaysOnMarket, &["Days on Market"]),
    (Field::ActiveListing, &["Active Listing"]),
];

const FOR_RENT_FIELDS: SourceMap = &[
    (Field::FirstRentalPrice, &["First Rental Price"]),
    (Field::FirstRentalDate, &["First Rental Date"]),
    (Field::LastRentalPrice, &["Last Rental Price"]),
    (Field::LastRentalDate, &["Last Rental Date"]),
    (Field::OutgoingsExGst, &["Outgoings Ex GST"]),
    (
        Field::TotalLeasePrice,
        &["Total Lease Price (Base + Outgoings)", "Total Lease Price"],
    ),
    (Field::DaysOnMarket, &["Days on Market"]),
    (Field::ActiveListing, &["Active Listing"]),
];

fn type_fields(search_type: SearchType) -> SourceMap {
    match search_type {
        SearchType::Sales => SALES_FIELDS,
        SearchType::ForSale => FOR_SALE_FIELDS,
        SearchType::ForRent => FOR_RENT_FIELDS,
    }
}

fn first_present(record: &RawRecord, candidates: &[&str]) -> CellValue {
    candidates
        .iter()
        .map(|h| record.get(h))
        .find(|v| !v.is_empty())
        .cloned()
        .unwrap_or_default()
}

fn apply(row: &mut OutputRow, record: &RawRecord, map: SourceMap) {
    for (field, candidates) in map {
        row.set(*field, first_present(record, candidates));
    }
}

/// Report "Type" for a record. Rentals are "For Lease" only while the
/// listing is still active.
pub fn row_type(search_type: SearchType, record: &RawRecord) -> &'static str {
    match search_type {
        SearchType::Sales => "Sold",
        SearchType::ForSale => "For Sale",
        SearchType::ForRent => {
            if record.get("Active Listing").is_truthy() {
                "For Lease"
            } else {
                "Already Leased"
            }
        }
    }
}

// Drops ", ," / ",," artifacts left by blank address parts.
fn clean_separators(s: &str) -> String {
    let mut out = s.split_whitespace().collect::<Vec<_>>().join(" ");
    loop {
        let next = out.replace(", ,", ",").replace(",,", ",");
        if next == out {
            break;
        }
        out = next;
    }
    out.trim_matches(|c: char| c == ',' || c.is_whitespace())
        .to_string()
}

/// "1 Smith St, Sydney NSW 2000"; missing parts are simply left out.
pub fn compose_full_address(street: &str, suburb: &str, state: &str, postcode: &str) -> String {
    let locality = [suburb, state, postcode]
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    clean_separators(&format!("{}, {}", street.trim(), locality))
}

fn slug(part: &str) -> String {
    let mut out = String::with_capacity(part.len());
    for ch in part.trim().to_lowercase().chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch);
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_matches('-').to_string()
}

/// Generic portal URL built from the address, for rows exported without a link.
pub fn fallback_url(street: &str, suburb: &str, state: &str, postcode: &str) -> String {
    let path = [street, suburb, state, postcode]
        .iter()
        .map(|p| slug(p))
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    format!("{PORTAL_PROPERTY_BASE}{path}")
}

// A URL or a HYPERLINK() formula; plain display text like "Open" is not a link.
fn usable_link(value: &CellValue) -> Option<String> {
    let text = value.as_str()?.trim();
    if let Some(url) = url_from_formula(text) {
        return Some(url);
    }
    (text.starts_with("http://") || text.starts_with("https://")).then(|| text.to_string())
}

fn resolve_link(
    record: &RawRecord,
    hyperlinks: &HashMap<usize, String>,
    address: [&str; 4],
) -> CellValue {
    if let Some(url) = hyperlinks.get(&record.position) {
        return CellValue::Link(url.clone());
    }

    let direct = std::iter::once(record.get(LINK_COLUMN));
    let linkish = record
        .columns()
        .filter(|(h, _)| h.contains("RPData") || h.contains("Link"))
        .map(|(_, v)| v);
    if let Some(url) = direct.chain(linkish).find_map(usable_link) {
        return CellValue::Link(url);
    }

    let [street, suburb, state, postcode] = address;
    if street.is_empty() {
        return CellValue::Empty;
    }
    let url = fallback_url(street, suburb, state, postcode);
    warn!(street, url = %url, "no deep-link in export, using generic portal URL");
    CellValue::Link(url)
}

/// Turns one export's records into report rows.
///
/// Each row reserves its slot in `ledger`; rows with an address are counted
/// there so zoning can be back-filled per occurrence. Zoning, allowed use,
/// photo and phone are left for later stages.
pub fn build_rows(
    table: &RawTable,
    search_type: SearchType,
    hyperlinks: &HashMap<usize, String>,
    ledger: &mut AddressLedger,
) -> Vec<OutputRow> {
    let mut rows = Vec::with_capacity(table.records.len());

    for record in &table.records {
        let mut row = OutputRow::new();
        row.set(Field::Type, CellValue::text(row_type(search_type, record)));

        apply(&mut row, record, ADDRESS_FIELDS);
        apply(&mut row, record, COMMON_FIELDS);
        apply(&mut row, record, type_fields(search_type));

        let street = row.text(Field::StreetAddress);
        let suburb = row.text(Field::Suburb);
        let state = row.text(Field::State);
        let postcode = row.text(Field::Postcode);

        if street.is_empty() || suburb.is_empty() {
            warn!(
                search_type = %search_type,
                position = record.position,
                "record is missing address parts, keeping it anyway"
            );
        }

        row.set(
            Field::WebsiteLink,
            resolve_link(
                record,
                hyperlinks,
                [street.as_str(), suburb.as_str(), state.as_str(), postcode.as_str()],
            ),
        );

        row.full_address = compose_full_address(&street, &suburb, &state, &postcode);
        let slot = ledger.reserve_slot();
        if !row.full_address.is_empty() {
            let occurrence = ledger.record(&row.full_address, slot);
            debug!(address = %row.full_address, occurrence, slot, "registered row");
            row.occurrence = Some(occurrence);
        }

        rows.push(row);
    }

    info!(search_type = %search_type, rows = rows.len(), "built rows");
    rows
}

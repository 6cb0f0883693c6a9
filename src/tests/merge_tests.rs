use crate::address::AddressLedger;
use crate::domain::{CellValue, Field, SearchType};
use crate::errors::MergeError;
use crate::media::download::tests::{fast_policy, status, ScriptedFetcher};
use crate::media::{ImageDownloader, ImageFetcher};
use crate::merge::rows::build_rows;
use crate::merge::pipeline::run_at;
use crate::merge::{Collaborators, MediaStage, MergeJob};
use crate::scraper::portal::MediaLookup;
use crate::spreadsheets::read_table;
use crate::tests::utils::{read_report, write_export, write_use_table, FakeMedia, FakeZoning};
use chrono::{NaiveDate, NaiveDateTime};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

const ADDRESS: &str = "1 Smith St, Sydney NSW 2000";

fn run_day() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 7)
        .unwrap()
        .and_hms_opt(10, 30, 0)
        .unwrap()
}

/// One Sales, one For Sale and one For Rent export, each with a single row for the same property.
fn same_address_exports(dir: &Path) -> Vec<(SearchType, PathBuf)> {
    let base = [
        "Property Photo",
        "Street Address",
        "Suburb",
        "State",
        "Postcode",
        "Property Type",
        "Open in RPData",
    ];
    let link = "https://rpp.corelogic.com.au/property/1-smith-st-sydney-nsw-2000/123";

    let sales_headers: Vec<&str> = base.iter().copied().chain(["Sale Price", "Sale Type"]).collect();
    let sale_headers: Vec<&str> = base.iter().copied().chain(["First Listed Price", "Days on Market"]).collect();
    let rent_headers: Vec<&str> = base.iter().copied().chain(["Last Rental Price", "Active Listing"]).collect();

    let common: [&'static str; 7] = ["", "1 Smith St", "Sydney", "NSW", "2000", "Shop", link];
    let with = move |extra: [&'static str; 2]| -> Vec<Vec<&'static str>> {
        vec![common.into_iter().chain(extra).collect()]
    };

    vec![
        (
            SearchType::Sales,
            write_export(dir, "sales.xlsx", &sales_headers, &with(["1250000", "Normal Sale"])),
        ),
        (
            SearchType::ForSale,
            write_export(dir, "for_sale.xlsx", &sale_headers, &with(["Contact Agent", "12"])),
        ),
        (
            SearchType::ForRent,
            write_export(dir, "for_rent.xlsx", &rent_headers, &with(["$850 pw", "True"])),
        ),
    ]
}

fn job(dir: &Path, inputs: Vec<(SearchType, PathBuf)>) -> MergeJob {
    MergeJob {
        inputs,
        locations: vec!["Sydney NSW".to_string()],
        business_type: "Vet".to_string(),
        zoning_table: Some(write_use_table(
            dir,
            &[("B4 Mixed Use", "T", "T"), ("R1 Residential", "F", "T")],
        )),
        output_dir: dir.join("out"),
        output_file: Some(dir.join("out").join("report.xlsx")),
    }
}

fn cell(report: &[Vec<CellValue>], row: usize, field: Field) -> CellValue {
    report[row].get(field.index()).cloned().unwrap_or_default()
}

#[test]
fn shared_address_is_registered_once_per_row() {
    let dir = tempdir().unwrap();
    let mut ledger = AddressLedger::new();
    let mut occurrences = Vec::new();

    for (search_type, path) in same_address_exports(dir.path()) {
        let table = read_table(&path).unwrap();
        for row in build_rows(&table, search_type, &HashMap::new(), &mut ledger) {
            assert_eq!(row.full_address, ADDRESS);
            occurrences.push(row.occurrence);
        }
    }

    assert_eq!(occurrences, vec![Some(1), Some(2), Some(3)]);
    assert_eq!(ledger.occurrences(ADDRESS), 3);
    assert_eq!(ledger.addresses(), [ADDRESS]);
}

#[test]
fn three_exports_same_address_all_get_zoning_and_flag() {
    let dir = tempdir().unwrap();
    let inputs = same_address_exports(dir.path());
    let zoning = FakeZoning::new(&[(ADDRESS, "B4 Mixed Use")]);
    let collaborators = Collaborators {
        zoning: &zoning,
        media: None,
    };

    let out = run_at(&job(dir.path(), inputs), &collaborators, run_day(), &mut |_, _| {}).unwrap();
    let report = read_report(&out);

    let expected: Vec<CellValue> = Field::ALL.iter().map(|f| CellValue::text(f.header())).collect();
    assert_eq!(report[0], expected);
    assert_eq!(report.len(), 4);

    let types: Vec<String> = (1..=3).map(|r| cell(&report, r, Field::Type).to_string()).collect();
    assert_eq!(types, ["Sold", "For Sale", "For Lease"]);

    for r in 1..=3 {
        assert_eq!(cell(&report, r, Field::SiteZoning), CellValue::text("B4 Mixed Use"));
        assert_eq!(cell(&report, r, Field::AllowableUse), CellValue::text("T"));
        assert_eq!(cell(&report, r, Field::DateAdded).to_string(), "07/03/2024");
        assert!(cell(&report, r, Field::WebsiteLink)
            .to_string()
            .ends_with("/123"));
    }

    // Type-specific values land only in their own row.
    assert_eq!(cell(&report, 1, Field::SalePrice), CellValue::Number(1_250_000.0));
    assert!(cell(&report, 2, Field::SalePrice).is_empty());
    assert_eq!(cell(&report, 2, Field::DaysOnMarket), CellValue::Number(12.0));
    assert_eq!(cell(&report, 3, Field::LastRentalPrice), CellValue::text("$850 pw"));

    // One batch, one distinct address.
    assert_eq!(*zoning.calls.borrow(), vec![vec![ADDRESS.to_string()]]);
}

#[test]
fn unreadable_input_is_skipped_and_the_rest_still_merge() {
    let dir = tempdir().unwrap();
    let mut inputs = same_address_exports(dir.path());
    inputs.insert(0, (SearchType::Sales, dir.path().join("missing.xlsx")));
    let zoning = FakeZoning::new(&[]);
    let collaborators = Collaborators {
        zoning: &zoning,
        media: None,
    };

    let out = run_at(&job(dir.path(), inputs), &collaborators, run_day(), &mut |_, _| {}).unwrap();
    let report = read_report(&out);

    assert_eq!(report.len(), 4);
    assert!(cell(&report, 1, Field::SiteZoning).is_empty());
    assert!(cell(&report, 1, Field::AllowableUse).is_empty());
}

#[test]
fn no_inputs_is_fatal() {
    let dir = tempdir().unwrap();
    let zoning = FakeZoning::new(&[]);
    let collaborators = Collaborators {
        zoning: &zoning,
        media: None,
    };

    let result = run_at(&job(dir.path(), Vec::new()), &collaborators, run_day(), &mut |_, _| {});
    assert!(matches!(result, Err(MergeError::NoInputs)));
}

#[test]
fn forbidden_photo_becomes_a_placeholder_after_one_request() {
    let dir = tempdir().unwrap();
    let inputs = same_address_exports(dir.path()).into_iter().take(1).collect();
    let zoning = FakeZoning::new(&[]);
    let media = FakeMedia {
        lookup: MediaLookup {
            image_url: Some("https://images.example/photo.jpg".to_string()),
            phone: None,
        },
        links: RefCell::new(Vec::new()),
    };
    let fetcher = ScriptedFetcher::new(vec![status(403)]);
    let collaborators = Collaborators {
        zoning: &zoning,
        media: Some(MediaStage {
            source: &media,
            downloader: ImageDownloader::new(&fetcher as &dyn ImageFetcher, fast_policy()),
        }),
    };

    let mut progress = Vec::new();
    let out = run_at(&job(dir.path(), inputs), &collaborators, run_day(), &mut |pct, msg| {
        progress.push((pct, msg.to_string()))
    })
    .unwrap();
    let report = read_report(&out);

    assert_eq!(fetcher.requests.borrow().len(), 1);
    assert_eq!(media.links.borrow().len(), 1);
    assert_eq!(
        cell(&report, 1, Field::PropertyPhoto).to_string(),
        "Image unavailable: https://images.example/photo.jpg"
    );
    assert!(cell(&report, 1, Field::ContactPhone).is_empty());

    let percents: Vec<u8> = progress.iter().map(|(p, _)| *p).collect();
    assert!(percents.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(progress.last().map(|(p, m)| (*p, m.as_str())), Some((100, "Done")));
}

#[test]
fn generated_name_uses_locations_when_no_file_is_given() {
    let dir = tempdir().unwrap();
    let mut job = job(dir.path(), same_address_exports(dir.path()));
    job.output_file = None;
    job.locations = vec!["Parramatta, NSW".to_string(), "Penrith NSW".to_string()];
    let zoning = FakeZoning::new(&[]);
    let collaborators = Collaborators {
        zoning: &zoning,
        media: None,
    };

    let out = run_at(&job, &collaborators, run_day(), &mut |_, _| {}).unwrap();
    assert_eq!(out.parent(), Some(dir.path().join("out").as_path()));
    assert_eq!(
        out.file_name().and_then(|n| n.to_str()),
        Some("Properties_Parramatta_Penrith_07_03_2024_10_30_00.xlsx")
    );
}

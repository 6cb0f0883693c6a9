use crate::address::AddressLedger;
use crate::domain::{CellValue, Field, OutputRow, SearchType};
use crate::errors::MergeError;
use crate::media::{enrich, ImageDownloader, ImageFetcher};
use crate::merge::rows::build_rows;
use crate::merge::zoning::reconcile;
use crate::merge::zoning_use::{check_allowed, load_table};
use crate::scraper::{MediaSource, ZoningSource};
use crate::spreadsheets::hyperlinks::LINK_COLUMN;
use crate::spreadsheets::{
    extract_hyperlinks, output_path, read_table, write_workbook, HEADER_MARKER,
};
use chrono::{Local, NaiveDateTime, NaiveTime};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// What to merge and where to put the result.
#[derive(Debug, Clone)]
pub struct MergeJob {
    /// Exports in the order their rows should appear in the report.
    pub inputs: Vec<(SearchType, PathBuf)>,
    /// Search locations; the first two name the generated output file.
    pub locations: Vec<String>,
    pub business_type: String,
    pub zoning_table: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub output_file: Option<PathBuf>,
}

/// Photo and phone lookup. Leave out to skip the network stage entirely.
pub struct MediaStage<'a> {
    pub source: &'a dyn MediaSource,
    pub downloader: ImageDownloader<&'a dyn ImageFetcher>,
}

pub struct Collaborators<'a> {
    pub zoning: &'a dyn ZoningSource,
    pub media: Option<MediaStage<'a>>,
}

fn read_inputs(
    job: &MergeJob,
    ledger: &mut AddressLedger,
    progress: &mut dyn FnMut(u8, &str),
) -> Vec<OutputRow> {
    let mut rows = Vec::new();
    let total = job.inputs.len().max(1);

    for (i, (search_type, path)) in job.inputs.iter().enumerate() {
        let pct = 5 + (25 * i / total) as u8;
        progress(pct, &format!("Reading {search_type} file"));

        let table = match read_table(path) {
            Ok(table) => table,
            Err(e) => {
                error!(search_type = %search_type, error = %e, "skipping input file");
                continue;
            }
        };
        let links = extract_hyperlinks(path, 0, HEADER_MARKER, LINK_COLUMN);
        info!(
            search_type = %search_type,
            columns = table.headers.len(),
            records = table.records.len(),
            links = links.len(),
            "read {}",
            table.path.display()
        );
        rows.extend(build_rows(&table, *search_type, &links, ledger));
    }
    rows
}

fn stamp_date_added(rows: &mut [OutputRow], run_at: NaiveDateTime) {
    let day = run_at.date().and_time(NaiveTime::MIN);
    for row in rows {
        row.set(Field::DateAdded, CellValue::Date(day));
    }
}

fn resolve_output(job: &MergeJob, run_at: NaiveDateTime) -> Result<PathBuf, MergeError> {
    let dir = match &job.output_file {
        Some(file) => file.parent().map(Path::to_path_buf).unwrap_or_default(),
        None => job.output_dir.clone(),
    };
    if !dir.as_os_str().is_empty() {
        std::fs::create_dir_all(&dir).map_err(|source| MergeError::OutputDir {
            path: dir.clone(),
            source,
        })?;
    }
    Ok(match &job.output_file {
        Some(file) => file.clone(),
        None => output_path(&dir, &job.locations, run_at),
    })
}

/// Runs the whole merge: read exports, zone, flag allowed use, add media,
/// write the report. Returns the path of the written workbook.
///
/// Only a missing input list or a failure to create/save the output is an
/// error; everything else degrades the affected file or row and is logged.
pub fn run(
    job: &MergeJob,
    collaborators: &Collaborators,
    progress: &mut dyn FnMut(u8, &str),
) -> Result<PathBuf, MergeError> {
    run_at(job, collaborators, Local::now().naive_local(), progress)
}

pub fn run_at(
    job: &MergeJob,
    collaborators: &Collaborators,
    run_at: NaiveDateTime,
    progress: &mut dyn FnMut(u8, &str),
) -> Result<PathBuf, MergeError> {
    if job.inputs.is_empty() {
        return Err(MergeError::NoInputs);
    }
    let output = resolve_output(job, run_at)?;

    let mut ledger = AddressLedger::new();
    let mut rows = read_inputs(job, &mut ledger, progress);
    if rows.is_empty() {
        warn!("no rows read from any input, the report will only have headers");
    }
    info!(
        rows = rows.len(),
        slots = ledger.slot_count(),
        addresses = ledger.addresses().len(),
        "inputs merged"
    );

    progress(35, "Looking up zoning");
    reconcile(&mut rows, &ledger, collaborators.zoning);

    progress(50, "Checking allowed use");
    let table = job.zoning_table.as_deref().and_then(load_table);
    check_allowed(&mut rows, &job.business_type, table.as_ref());

    match &collaborators.media {
        Some(media) => {
            progress(55, "Fetching photos and agent phones");
            enrich(&mut rows, media.source, &media.downloader, &mut |done, total| {
                let pct = 55 + (35 * done / total.max(1)) as u8;
                progress(pct, &format!("Fetched media for {done}/{total} properties"));
            });
        }
        None => info!("media lookup disabled"),
    }

    stamp_date_added(&mut rows, run_at);

    progress(95, "Writing report");
    write_workbook(&rows, &output)?;

    progress(100, "Done");
    info!(path = %output.display(), rows = rows.len(), "merge complete");
    Ok(output)
}

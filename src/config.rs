//! Run configuration loaded from environment variables (and `.env`).
//!
//! ## Required
//!
//! At least one of `SALES_FILE`, `FOR_SALE_FILE`, `FOR_RENT_FILE`.
//!
//! ## Optional
//!
//! - `LOCATIONS` - comma-separated search locations, used to name the report
//! - `BUSINESS_TYPE` - `Vet` or `Health` (default: `Vet`)
//! - `ZONING_TABLE_PATH` - allowed-use reference workbook
//!   (default: `Allowable Use in the Zone - TABLE.xlsx`)
//! - `ZONING_RESULTS_PATH` - JSON zoning results; without it rows stay unzoned
//! - `OUTPUT_DIR` - where generated reports go (default: `merged_properties`)
//! - `OUTPUT_FILE` - exact report path, overrides `OUTPUT_DIR`
//! - `FETCH_MEDIA` - look up photos and agent phones (default: `true`)
//! - `HTTP_TIMEOUT_SECS` (default: 20)
//! - `IMAGE_MAX_ATTEMPTS` (default: 3)
//! - `IMAGE_BACKOFF_MS` - first retry delay, doubled per attempt (default: 500)
//! - `RUST_LOG` - log filter (default: `info`)

use crate::domain::SearchType;
use crate::merge::MergeJob;
use anyhow::{anyhow, bail, Result};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub inputs: Vec<(SearchType, PathBuf)>,
    pub locations: Vec<String>,
    pub business_type: String,
    pub zoning_table: PathBuf,
    pub zoning_results: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub output_file: Option<PathBuf>,
    pub fetch_media: bool,
    pub http_timeout: Duration,
    pub image_max_attempts: usize,
    pub image_backoff: Duration,
}

fn parsed<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(v) if !v.trim().is_empty() => v
            .trim()
            .parse()
            .map_err(|e| anyhow!("invalid {key} '{v}': {e}")),
        _ => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests need not touch the process env.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let inputs: Vec<(SearchType, PathBuf)> = [
            ("SALES_FILE", SearchType::Sales),
            ("FOR_SALE_FILE", SearchType::ForSale),
            ("FOR_RENT_FILE", SearchType::ForRent),
        ]
        .into_iter()
        .filter_map(|(key, search_type)| non_empty(key).map(|p| (search_type, PathBuf::from(p))))
        .collect();

        if inputs.is_empty() {
            bail!("set at least one of SALES_FILE, FOR_SALE_FILE, FOR_RENT_FILE");
        }

        let locations = non_empty("LOCATIONS")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let fetch_media = non_empty("FETCH_MEDIA")
            .map(|v| !matches!(v.trim().to_ascii_lowercase().as_str(), "false" | "0" | "no"))
            .unwrap_or(true);

        Ok(Self {
            inputs,
            locations,
            business_type: non_empty("BUSINESS_TYPE").unwrap_or_else(|| "Vet".to_string()),
            zoning_table: non_empty("ZONING_TABLE_PATH")
                .unwrap_or_else(|| "Allowable Use in the Zone - TABLE.xlsx".to_string())
                .into(),
            zoning_results: non_empty("ZONING_RESULTS_PATH").map(PathBuf::from),
            output_dir: non_empty("OUTPUT_DIR")
                .unwrap_or_else(|| "merged_properties".to_string())
                .into(),
            output_file: non_empty("OUTPUT_FILE").map(PathBuf::from),
            fetch_media,
            http_timeout: Duration::from_secs(parsed(&lookup, "HTTP_TIMEOUT_SECS", 20)?),
            image_max_attempts: parsed(&lookup, "IMAGE_MAX_ATTEMPTS", 3)?,
            image_backoff: Duration::from_millis(parsed(&lookup, "IMAGE_BACKOFF_MS", 500)?),
        })
    }

    pub fn job(&self) -> MergeJob {
        MergeJob {
            inputs: self.inputs.clone(),
            locations: self.locations.clone(),
            business_type: self.business_type.clone(),
            zoning_table: Some(self.zoning_table.clone()),
            output_dir: self.output_dir.clone(),
            output_file: self.output_file.clone(),
        }
    }
}

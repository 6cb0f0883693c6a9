use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};

/// `Properties_<loc1>_<loc2>_<dd_mm_YYYY_HH_MM_SS>.xlsx` inside `dir`.
///
/// Each location contributes its first word with commas dropped. If the
/// name is already taken a `_2`, `_3`, ... suffix is added.
pub fn output_path(dir: &Path, locations: &[String], now: NaiveDateTime) -> PathBuf {
    let location_part = locations
        .iter()
        .take(2)
        .filter_map(|loc| loc.split_whitespace().next())
        .map(|word| word.replace(',', ""))
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("_");

    let stamp = now.format("%d_%m_%Y_%H_%M_%S");
    let stem = if location_part.is_empty() {
        format!("Properties_{stamp}")
    } else {
        format!("Properties_{location_part}_{stamp}")
    };

    let mut candidate = dir.join(format!("{stem}.xlsx"));
    let mut n = 2;
    while candidate.exists() {
        candidate = dir.join(format!("{stem}_{n}.xlsx"));
        n += 1;
    }
    candidate
}

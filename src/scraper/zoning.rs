use crate::scraper::ScraperError;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::info;

/// Looks up zone descriptions for a batch of addresses.
///
/// Called once per run with every distinct address. Addresses the source
/// could not resolve may be missing from the result or map to `""`/`"-"`.
pub trait ZoningSource {
    fn lookup(&self, addresses: &[String]) -> Result<HashMap<String, String>, ScraperError>;
}

/// Zoning results saved by the external lookup tool as a JSON object of
/// `{ "address": "zone description" }`.
pub struct JsonZoningSource {
    path: PathBuf,
}

impl JsonZoningSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ZoningSource for JsonZoningSource {
    fn lookup(&self, addresses: &[String]) -> Result<HashMap<String, String>, ScraperError> {
        let text = std::fs::read_to_string(&self.path)
            .map_err(|e| ScraperError::Io(format!("{}: {e}", self.path.display())))?;
        let data: Value =
            serde_json::from_str(&text).map_err(|e| ScraperError::JsonParse(e.to_string()))?;

        let obj = data.as_object().ok_or(ScraperError::UnexpectedShape(
            "zoning results must be a JSON object".to_string(),
        ))?;

        // Keep every entry, not only the requested addresses: the reconciler
        // matches loosely and the tool may have formatted keys differently.
        let results: HashMap<String, String> = obj
            .iter()
            .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
            .collect();

        info!(
            requested = addresses.len(),
            returned = results.len(),
            "loaded zoning results from {}",
            self.path.display()
        );
        Ok(results)
    }
}

/// Used when no zoning results are configured: every address stays unzoned.
pub struct NoZoning;

impl ZoningSource for NoZoning {
    fn lookup(&self, _addresses: &[String]) -> Result<HashMap<String, String>, ScraperError> {
        Ok(HashMap::new())
    }
}

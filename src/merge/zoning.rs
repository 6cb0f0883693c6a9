use crate::address::{normalize, street_segment, AddressLedger};
use crate::domain::{CellValue, Field, OutputRow};
use crate::scraper::ZoningSource;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, error, info, warn};

/// How a zoning result was tied to a row address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchConfidence {
    /// Same raw address string on both sides.
    Exact,
    /// Same address after [`normalize`].
    Normalized,
    /// Only the street segment matched the start of a result key.
    Prefix,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoningMatch {
    pub zoning: String,
    pub confidence: MatchConfidence,
}

/// Zoning results prepared for lookup. Empty and "-" (not found) values are dropped.
#[derive(Debug, Default)]
pub struct ZoningIndex {
    raw: HashMap<String, String>,
    normalized: HashMap<String, String>,
}

fn usable_zoning(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty() && value != "-").then_some(value)
}

impl ZoningIndex {
    pub fn new(results: HashMap<String, String>) -> Self {
        let mut index = ZoningIndex::default();

        // Sorted so normalized-key collisions resolve the same way every run.
        let mut entries: Vec<(String, String)> = results
            .into_iter()
            .filter_map(|(k, v)| usable_zoning(&v).map(|v| (k, v.to_string())))
            .collect();
        entries.sort();

        for (key, zoning) in entries {
            let norm = normalize(&key);
            if let Some(existing) = index.normalized.get(&norm) {
                if existing != &zoning {
                    debug!(key = %key, "normalized key collision, keeping first zoning");
                }
            } else {
                index.normalized.insert(norm, zoning.clone());
            }
            index.raw.insert(key, zoning);
        }
        index
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}

/// Exact, then normalized lookup.
pub fn exact_match(address: &str, index: &ZoningIndex) -> Option<ZoningMatch> {
    if let Some(zoning) = index.raw.get(address) {
        return Some(ZoningMatch {
            zoning: zoning.clone(),
            confidence: MatchConfidence::Exact,
        });
    }
    index.normalized.get(&normalize(address)).map(|zoning| ZoningMatch {
        zoning: zoning.clone(),
        confidence: MatchConfidence::Normalized,
    })
}

/// Street-segment prefix lookup.
///
/// The segment must look like a real street ("12 SMITH ST": a number and at
/// least one more token) and every result key starting with it must agree on
/// a single zoning, otherwise there is no match.
pub fn prefix_match(address: &str, index: &ZoningIndex) -> Option<ZoningMatch> {
    let segment = street_segment(address);
    let tokens = segment.split(' ').count();
    if tokens < 2 || !segment.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let with_space = format!("{segment} ");
    let candidates: BTreeSet<&str> = index
        .normalized
        .iter()
        .filter(|(key, _)| *key == &segment || key.starts_with(&with_space))
        .map(|(_, zoning)| zoning.as_str())
        .collect();

    match candidates.len() {
        1 => candidates.first().map(|zoning| ZoningMatch {
            zoning: zoning.to_string(),
            confidence: MatchConfidence::Prefix,
        }),
        0 => None,
        n => {
            debug!(address, candidates = n, "ambiguous prefix match, skipping");
            None
        }
    }
}

/// All tiers in order: exact, normalized, prefix.
pub fn match_zoning(address: &str, index: &ZoningIndex) -> Option<ZoningMatch> {
    exact_match(address, index).or_else(|| prefix_match(address, index))
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub addresses: usize,
    pub exact: usize,
    pub normalized: usize,
    pub prefix: usize,
    pub unmatched: usize,
    pub rows_zoned: usize,
}

impl ReconcileSummary {
    fn count(&mut self, confidence: MatchConfidence) {
        match confidence {
            MatchConfidence::Exact => self.exact += 1,
            MatchConfidence::Normalized => self.normalized += 1,
            MatchConfidence::Prefix => self.prefix += 1,
        }
    }
}

/// Writes `zoning` into every not-yet-resolved occurrence slot of `address`.
fn fill_slots(
    rows: &mut [OutputRow],
    ledger: &AddressLedger,
    address: &str,
    zoning: &str,
    resolved: &mut HashSet<usize>,
) -> usize {
    let mut filled = 0;
    for occurrence in 1..=ledger.occurrences(address) {
        let Some(slot) = ledger.slot(address, occurrence) else {
            continue;
        };
        if resolved.contains(&slot) {
            continue;
        }
        match rows.get_mut(slot) {
            Some(row) => {
                row.set(Field::SiteZoning, CellValue::text(zoning));
                resolved.insert(slot);
                filled += 1;
            }
            None => warn!(slot, address, "ledger slot has no row"),
        }
    }
    filled
}

/// Back-fills "Site Zoning" from already fetched results, one
/// [`match_zoning`] call per distinct address.
pub fn apply_zoning(
    rows: &mut [OutputRow],
    ledger: &AddressLedger,
    index: &ZoningIndex,
) -> ReconcileSummary {
    let mut summary = ReconcileSummary {
        addresses: ledger.addresses().len(),
        ..Default::default()
    };
    let mut resolved = HashSet::new();

    for address in ledger.addresses() {
        match match_zoning(address, index) {
            Some(m) => {
                if m.confidence == MatchConfidence::Prefix {
                    info!(address = %address, zoning = %m.zoning, "zoning matched on street prefix");
                }
                summary.rows_zoned += fill_slots(rows, ledger, address, &m.zoning, &mut resolved);
                summary.count(m.confidence);
            }
            None => {
                warn!(address = %address, "no zoning found");
                summary.unmatched += 1;
            }
        }
    }

    summary
}

/// Fetches zoning for every distinct address in one collaborator call and
/// back-fills the rows. A failing collaborator leaves every row unzoned.
pub fn reconcile(
    rows: &mut [OutputRow],
    ledger: &AddressLedger,
    source: &dyn ZoningSource,
) -> ReconcileSummary {
    let addresses = ledger.addresses();
    if addresses.is_empty() {
        info!("no addresses to zone");
        return ReconcileSummary::default();
    }

    info!(addresses = addresses.len(), "requesting zoning");
    let results = match source.lookup(addresses) {
        Ok(results) => results,
        Err(e) => {
            error!(error = %e, "zoning lookup failed, continuing without zoning");
            return ReconcileSummary {
                addresses: addresses.len(),
                unmatched: addresses.len(),
                ..Default::default()
            };
        }
    };

    let index = ZoningIndex::new(results);
    if index.is_empty() {
        warn!("zoning source returned no usable zoning");
    }
    let summary = apply_zoning(rows, ledger, &index);
    info!(
        exact = summary.exact,
        normalized = summary.normalized,
        prefix = summary.prefix,
        unmatched = summary.unmatched,
        rows = summary.rows_zoned,
        "zoning reconciled"
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::ScraperError;

    fn index(entries: &[(&str, &str)]) -> ZoningIndex {
        ZoningIndex::new(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    fn rows_for(addresses: &[&str]) -> (Vec<OutputRow>, AddressLedger) {
        let mut ledger = AddressLedger::new();
        let rows = addresses
            .iter()
            .map(|a| {
                let mut row = OutputRow::new();
                row.full_address = a.to_string();
                let slot = ledger.reserve_slot();
                row.occurrence = Some(ledger.record(a, slot));
                row
            })
            .collect();
        (rows, ledger)
    }

    #[test]
    fn tiers_report_their_confidence() {
        let idx = index(&[
            ("1 Smith St, Sydney NSW 2000", "B4 Mixed Use"),
            ("7 PARK RD MILTON QLD", "Centre"),
        ]);

        let exact = match_zoning("1 Smith St, Sydney NSW 2000", &idx).unwrap();
        assert_eq!(exact.confidence, MatchConfidence::Exact);

        let normalized = match_zoning("1 SMITH ST SYDNEY NSW", &idx).unwrap();
        assert_eq!(normalized.confidence, MatchConfidence::Normalized);
        assert_eq!(normalized.zoning, "B4 Mixed Use");

        let prefix = match_zoning("7 Park Rd, Milton", &idx).unwrap();
        assert_eq!(prefix.confidence, MatchConfidence::Prefix);
        assert_eq!(prefix.zoning, "Centre");
    }

    #[test]
    fn prefix_does_not_cross_streets_or_guess() {
        let idx = index(&[
            ("10 Smith St, Sydney", "B4 Mixed Use"),
            ("1 Smith Street, Sydney", "R2"),
            ("5 High St, Newtown", "B2"),
            ("5 High St, Penrith", "IN1"),
        ]);
        // "1 SMITH ST" is not a prefix of "10 SMITH ST ..." nor "1 SMITH STREET ..."
        assert_eq!(prefix_match("1 Smith St, Sydney NSW 2000", &idx), None);
        // two different zonings share the street segment
        assert_eq!(prefix_match("5 High St, Somewhere", &idx), None);
        // a bare street name is too weak to match on
        assert_eq!(prefix_match("Smith, Sydney", &idx), None);
    }

    #[test]
    fn not_found_markers_are_ignored() {
        let idx = index(&[("1 Smith St, Sydney NSW 2000", "-"), ("2 Smith St", "  ")]);
        assert!(idx.is_empty());
        assert_eq!(match_zoning("1 Smith St, Sydney NSW 2000", &idx), None);
    }

    #[test]
    fn every_occurrence_gets_the_zoning_and_nothing_else_does() {
        let (mut rows, ledger) = rows_for(&[
            "1 Smith St, Sydney NSW 2000",
            "2 Jones Rd, Sydney NSW 2000",
            "1 Smith St, Sydney NSW 2000",
            "1 Smith St, Sydney NSW 2000",
        ]);
        let summary = apply_zoning(
            &mut rows,
            &ledger,
            &index(&[("1 Smith St, Sydney NSW 2000", "B4 Mixed Use")]),
        );

        assert_eq!(ledger.occurrences("1 Smith St, Sydney NSW 2000"), 3);
        for i in [0, 2, 3] {
            assert_eq!(rows[i].text(Field::SiteZoning), "B4 Mixed Use");
        }
        assert!(rows[1].get(Field::SiteZoning).is_empty());
        assert_eq!(summary.rows_zoned, 3);
        assert_eq!(summary.exact, 1);
        assert_eq!(summary.unmatched, 1);
    }

    #[test]
    fn apply_uses_every_tier_of_the_matcher() {
        let (mut rows, ledger) = rows_for(&[
            "1 Smith St, Sydney NSW 2000",
            "2 JONES RD SYDNEY NSW",
            "7 Park Rd, Milton",
            "7 Park Rd, Milton",
            "9 Nowhere Ln, Bourke",
        ]);
        let idx = index(&[
            ("1 Smith St, Sydney NSW 2000", "B4 Mixed Use"),
            ("2 Jones Rd, Sydney NSW 2000", "R2"),
            ("7 PARK RD MILTON QLD 4064", "Centre"),
        ]);

        let summary = apply_zoning(&mut rows, &ledger, &idx);

        for row in &rows {
            let expected = match_zoning(&row.full_address, &idx)
                .map(|m| m.zoning)
                .unwrap_or_default();
            assert_eq!(row.text(Field::SiteZoning), expected);
        }
        assert_eq!(rows[3].text(Field::SiteZoning), "Centre");
        assert_eq!(
            (summary.exact, summary.normalized, summary.prefix, summary.unmatched),
            (1, 1, 1, 1)
        );
        assert_eq!(summary.rows_zoned, 4);
    }

    struct Failing;

    impl ZoningSource for Failing {
        fn lookup(&self, _: &[String]) -> Result<HashMap<String, String>, ScraperError> {
            Err(ScraperError::Network("portal down".into()))
        }
    }

    #[test]
    fn collaborator_failure_degrades_to_no_zoning() {
        let (mut rows, ledger) = rows_for(&["1 Smith St, Sydney NSW 2000"]);
        let summary = reconcile(&mut rows, &ledger, &Failing);
        assert_eq!(summary.unmatched, 1);
        assert!(rows[0].get(Field::SiteZoning).is_empty());
    }

    struct Counting(std::cell::Cell<usize>);

    impl ZoningSource for Counting {
        fn lookup(&self, addresses: &[String]) -> Result<HashMap<String, String>, ScraperError> {
            self.0.set(self.0.get() + 1);
            Ok(addresses.iter().map(|a| (a.clone(), "R1".to_string())).collect())
        }
    }

    #[test]
    fn collaborator_is_called_once_for_all_rows() {
        let (mut rows, ledger) = rows_for(&["A 1 St", "B 2 St", "A 1 St", "C 3 St"]);
        let source = Counting(std::cell::Cell::new(0));
        let summary = reconcile(&mut rows, &ledger, &source);
        assert_eq!(source.0.get(), 1);
        assert_eq!(summary.addresses, 3);
        assert_eq!(summary.rows_zoned, 4);
    }
}

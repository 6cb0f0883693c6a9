use regex::Regex;
use std::sync::OnceLock;

// Unit / shop / suite / floor markers in front of the street number,
// plus the "4/51 Smith St" shorthand.
const UNIT_PREFIX: &str = r"^(?:(?:UNIT|SHOP|SUITE|STE|LEVEL|LVL|FLOOR|LOT)\s*\d+[A-Z]?\s*/?\s*|(?:GROUND FLOOR|G/F|GF)\b\s*/?\s*|\d+[A-Z]?\s*/\s*)";
const TRAILING_POSTCODE: &str = r"\s\d{4}$";

fn unit_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(UNIT_PREFIX).expect("unit prefix pattern"))
}

fn trailing_postcode() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(TRAILING_POSTCODE).expect("postcode pattern"))
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Canonical form of a free-text address, used as the join key between
/// scraped rows and zoning results.
///
/// Uppercased, single-spaced, commas dropped, no unit/shop/ground-floor
/// prefix and no trailing postcode. Idempotent.
pub fn normalize(address: &str) -> String {
    let mut s = collapse_whitespace(address);

    // " , " / " ," / ",," all become one ", "
    s = s.replace(" ,", ",");
    while s.contains(",,") {
        s = s.replace(",,", ",");
    }
    s = s.to_uppercase();
    s = s.replace(", NSW,", " NSW ");
    s = collapse_whitespace(&s.replace(',', " "));

    // Stripping one affix can expose another ("GF 2000" -> "2000"), so run to a fixed point.
    loop {
        let before = s.len();

        if let Some(m) = unit_prefix().find(&s) {
            let rest = s[m.end()..].trim();
            if !rest.is_empty() {
                s = rest.to_string();
            }
        }
        if let Some(m) = trailing_postcode().find(&s) {
            s = s[..m.start()].trim_end().to_string();
        }

        if s.len() == before {
            break;
        }
    }

    s
}

/// Normalized street part of an address: everything before the first comma.
/// Addresses without a comma yield the whole normalized address.
pub fn street_segment(address: &str) -> String {
    let street = address.split(',').next().unwrap_or(address);
    normalize(street)
}

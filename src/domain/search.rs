use std::fmt;
use std::str::FromStr;

/// Which portal export a source file came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchType {
    Sales,
    ForSale,
    ForRent,
}

impl SearchType {
    pub fn label(self) -> &'static str {
        match self {
            SearchType::Sales => "Sales",
            SearchType::ForSale => "For Sale",
            SearchType::ForRent => "For Rent",
        }
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Business category the zoning-use table is consulted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusinessType {
    Vet,
    Health,
}

impl FromStr for BusinessType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vet" => Ok(BusinessType::Vet),
            "health" => Ok(BusinessType::Health),
            other => Err(format!("unknown business type '{other}'")),
        }
    }
}

impl fmt::Display for BusinessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusinessType::Vet => f.write_str("Vet"),
            BusinessType::Health => f.write_str("Health"),
        }
    }
}

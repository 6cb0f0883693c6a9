use chrono::NaiveDateTime;
use std::fmt;

/// One scalar cell, either read from a source export or headed for the report.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDateTime),
    /// A URL that should be written as a clickable hyperlink.
    Link(String),
}

impl CellValue {
    /// Builds a text cell, collapsing blank strings to `Empty`.
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.trim().is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(value)
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) | CellValue::Link(s) => s.trim().is_empty(),
            CellValue::Number(n) => n.is_nan(),
            _ => false,
        }
    }

    /// Text content for string-y cells, `None` for everything else.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) | CellValue::Link(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Whether the cell reads as "yes": `true`, `"True"`, `"Yes"`, `"Y"`, `1`, ...
    /// Empty cells and explicit negatives are not truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            CellValue::Empty => false,
            CellValue::Bool(b) => *b,
            CellValue::Number(n) => *n != 0.0 && !n.is_nan(),
            CellValue::Date(_) => true,
            CellValue::Text(s) | CellValue::Link(s) => {
                let s = s.trim();
                !s.is_empty()
                    && !matches!(
                        s.to_ascii_uppercase().as_str(),
                        "FALSE" | "NO" | "N" | "F" | "0" | "NAN"
                    )
            }
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) | CellValue::Link(s) => write!(f, "{s}"),
            // Integral floats print without the trailing ".0" so postcodes stay "2000".
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{:.0}", n),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Bool(b) => write!(f, "{}", if *b { "True" } else { "False" }),
            CellValue::Date(d) => write!(f, "{}", d.format("%d/%m/%Y")),
        }
    }
}

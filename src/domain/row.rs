use crate::domain::cell::CellValue;
use crate::domain::schema::{Field, COLUMN_COUNT};

/// A photo ready to be placed in the report, already shrunk to the cell footprint.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedImage {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// What happened when we tried to get a photo for a row.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ImageState {
    /// No photo URL was ever found for this row.
    #[default]
    None,
    Embedded(PreparedImage),
    /// The URL looked fine but the download did not produce an image.
    Unavailable { url: String },
    /// The URL could never be downloaded (blob:, data:, bad scheme, ...).
    InvalidUrl { url: String, reason: String },
}

impl ImageState {
    /// Text written in the photo cell when there is no picture to embed.
    pub fn placeholder(&self) -> Option<String> {
        match self {
            ImageState::Unavailable { url } => Some(format!("Image unavailable: {url}")),
            ImageState::InvalidUrl { url, reason } => {
                Some(format!("Invalid image URL ({reason}): {url}"))
            }
            _ => None,
        }
    }

    pub fn image(&self) -> Option<&PreparedImage> {
        match self {
            ImageState::Embedded(img) => Some(img),
            _ => None,
        }
    }
}

/// One row of the merged report.
///
/// `cells` always holds exactly one value per schema column, whatever the
/// row's search type.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRow {
    cells: Vec<CellValue>,
    /// Composite address used as the zoning join key.
    pub full_address: String,
    /// 1-based count of how many rows so far share `full_address`.
    pub occurrence: Option<usize>,
    pub image: ImageState,
}

impl Default for OutputRow {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputRow {
    pub fn new() -> Self {
        Self {
            cells: vec![CellValue::Empty; COLUMN_COUNT],
            full_address: String::new(),
            occurrence: None,
            image: ImageState::None,
        }
    }

    pub fn get(&self, field: Field) -> &CellValue {
        &self.cells[field.index()]
    }

    pub fn set(&mut self, field: Field, value: CellValue) {
        self.cells[field.index()] = value;
    }

    /// The cell rendered as plain text, empty string for empty cells.
    pub fn text(&self, field: Field) -> String {
        self.get(field).to_string()
    }

    pub fn cells(&self) -> &[CellValue] {
        &self.cells
    }

    /// The row's deep-link, if it holds a usable http(s) URL.
    pub fn deep_link(&self) -> Option<&str> {
        self.get(Field::WebsiteLink)
            .as_str()
            .filter(|s| s.starts_with("http://") || s.starts_with("https://"))
    }
}

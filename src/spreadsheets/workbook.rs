use crate::domain::{schema, CellValue, Field, ImageState, OutputRow};
use crate::errors::MergeError;
use crate::media::image::MAX_WIDTH;
use rust_xlsxwriter::{Color, Format, FormatUnderline, Image, Workbook, Worksheet, XlsxError};
use std::path::Path;
use tracing::{info, warn};

pub const SHEET_NAME: &str = "Properties";
const HEADER_FONT_SIZE: f64 = 14.0;
const BODY_FONT_SIZE: f64 = 12.0;
// Padding around an embedded photo, in pixels.
const PHOTO_PADDING: u32 = 6;

struct Formats {
    header: Format,
    body: Format,
    link: Format,
    date: Format,
}

impl Formats {
    fn new() -> Self {
        let body = Format::new().set_font_size(BODY_FONT_SIZE);
        Self {
            header: Format::new().set_bold().set_font_size(HEADER_FONT_SIZE),
            link: body
                .clone()
                .set_font_color(Color::Blue)
                .set_underline(FormatUnderline::Single),
            date: body.clone().set_num_format("dd/mm/yyyy"),
            body,
        }
    }
}

fn write_cell(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &CellValue,
    formats: &Formats,
) -> Result<(), XlsxError> {
    match value {
        CellValue::Empty => {}
        CellValue::Text(s) => {
            sheet.write_string_with_format(row, col, s, &formats.body)?;
        }
        CellValue::Number(n) if n.is_finite() => {
            sheet.write_number_with_format(row, col, *n, &formats.body)?;
        }
        CellValue::Number(_) => {}
        // "True"/"False" text, matching what the exports themselves contain.
        CellValue::Bool(_) => {
            sheet.write_string_with_format(row, col, value.to_string(), &formats.body)?;
        }
        CellValue::Date(d) => {
            sheet.write_datetime_with_format(row, col, d, &formats.date)?;
        }
        CellValue::Link(url) => {
            if let Err(e) = sheet.write_url_with_format(row, col, url.as_str(), &formats.link) {
                warn!(row, url = %url, error = %e, "link rejected, writing as text");
                sheet.write_string_with_format(row, col, url, &formats.body)?;
            }
        }
    }
    Ok(())
}

fn write_photo(
    sheet: &mut Worksheet,
    row: u32,
    state: &ImageState,
    formats: &Formats,
) -> Result<(), XlsxError> {
    let col = Field::PropertyPhoto.index() as u16;

    if let Some(photo) = state.image() {
        match Image::new_from_buffer(&photo.png) {
            Ok(image) => {
                sheet.set_row_height_pixels(row, photo.height + PHOTO_PADDING)?;
                sheet.insert_image_with_offset(row, col, &image, PHOTO_PADDING / 2, PHOTO_PADDING / 2)?;
            }
            Err(e) => {
                warn!(row, error = %e, "prepared photo could not be embedded");
            }
        }
        return Ok(());
    }

    if let Some(text) = state.placeholder() {
        sheet.write_string_with_format(row, col, text, &formats.body)?;
    }
    Ok(())
}

/// Writes the merged report: one header row, then one row per `OutputRow`.
pub fn write_workbook(rows: &[OutputRow], path: &Path) -> Result<(), MergeError> {
    let formats = Formats::new();
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (col, field) in Field::ALL.iter().enumerate() {
        let col = col as u16;
        sheet.write_string_with_format(0, col, field.header(), &formats.header)?;
        sheet.set_column_width(col, field.width())?;
    }
    sheet.set_freeze_panes(1, 0)?;

    let mut embedded = 0;
    for (i, row) in rows.iter().enumerate() {
        let r = (i + 1) as u32;
        for (col, value) in row.cells().iter().enumerate() {
            if col == Field::PropertyPhoto.index() && row.image != ImageState::None {
                continue;
            }
            write_cell(sheet, r, col as u16, value, &formats)?;
        }
        if row.image.image().is_some() {
            embedded += 1;
        }
        write_photo(sheet, r, &row.image, &formats)?;
    }

    if embedded > 0 {
        sheet.set_column_width_pixels(Field::PropertyPhoto.index() as u16, MAX_WIDTH + PHOTO_PADDING)?;
    }

    workbook.save(path)?;
    info!(
        rows = rows.len(),
        columns = schema::COLUMN_COUNT,
        photos = embedded,
        "report written to {}",
        path.display()
    );
    Ok(())
}

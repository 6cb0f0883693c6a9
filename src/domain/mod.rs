pub mod cell;
pub mod row;
pub mod schema;
pub mod search;

pub use cell::CellValue;
pub use row::{ImageState, OutputRow, PreparedImage};
pub use schema::Field;
pub use search::{BusinessType, SearchType};

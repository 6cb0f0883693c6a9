pub mod filename;
pub mod hyperlinks;
pub mod reader;
pub mod workbook;

pub use filename::output_path;
pub use hyperlinks::extract_hyperlinks;
pub use reader::{read_table, HEADER_MARKER};
pub use workbook::write_workbook;

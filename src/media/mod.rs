pub mod download;
pub mod enricher;
pub mod image;

pub use download::{BackoffPolicy, FetchFailure, FetchedImage, ImageDownloader, ImageFetcher};
pub use enricher::enrich;

pub mod portal;
mod scraper_error;
mod zoning;

pub use portal::{HttpImageFetcher, MediaSource, PortalMediaSource};
pub use scraper_error::ScraperError;
pub use zoning::{JsonZoningSource, NoZoning, ZoningSource};

use crate::domain::{CellValue, Field, ImageState, OutputRow};
use crate::media::download::{DownloadOutcome, ImageDownloader, ImageFetcher};
use crate::scraper::MediaSource;
use tracing::{info, warn};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EnrichSummary {
    pub looked_up: usize,
    pub images: usize,
    pub failed_images: usize,
    pub invalid_images: usize,
    pub phones: usize,
}

/// Adds a photo and agent phone to every row that has a deep-link.
///
/// `progress` is called with `(rows done, rows total)` after each row.
pub fn enrich<F: ImageFetcher>(
    rows: &mut [OutputRow],
    source: &dyn MediaSource,
    downloader: &ImageDownloader<F>,
    progress: &mut dyn FnMut(usize, usize),
) -> EnrichSummary {
    let mut summary = EnrichSummary::default();
    let total = rows.len();

    for (i, row) in rows.iter_mut().enumerate() {
        if let Some(link) = row.deep_link().map(str::to_string) {
            summary.looked_up += 1;
            match source.lookup(&link) {
                Ok(found) => {
                    if let Some(phone) = found.phone {
                        row.set(Field::ContactPhone, CellValue::text(phone));
                        summary.phones += 1;
                    }
                    if let Some(url) = found.image_url {
                        row.image = match downloader.download(&url) {
                            DownloadOutcome::Image(img) => {
                                summary.images += 1;
                                ImageState::Embedded(img)
                            }
                            DownloadOutcome::Invalid { reason } => {
                                summary.invalid_images += 1;
                                ImageState::InvalidUrl { url, reason }
                            }
                            DownloadOutcome::Failed { .. } => {
                                summary.failed_images += 1;
                                ImageState::Unavailable { url }
                            }
                        };
                    }
                }
                Err(e) => warn!(link = %link, error = %e, "media lookup failed"),
            }
        }
        progress(i + 1, total);
    }

    info!(
        looked_up = summary.looked_up,
        images = summary.images,
        failed = summary.failed_images,
        invalid = summary.invalid_images,
        phones = summary.phones,
        "media enrichment finished"
    );
    summary
}

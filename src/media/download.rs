use crate::domain::PreparedImage;
use crate::media::image::prepare_image;
use rand::Rng;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

/// Raw response of one image request.
#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// Why an image request did not produce a picture.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchFailure {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("HTTP {0}")]
    Status(u16),
    #[error("not an image: {0}")]
    BadContent(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDisposition {
    Retryable,
    NonRetryable,
}

impl FetchFailure {
    /// 5xx, 429 and transport errors are worth another try; auth denials,
    /// other statuses and non-image payloads are not.
    pub fn disposition(&self) -> RetryDisposition {
        match self {
            FetchFailure::Transport(_) => RetryDisposition::Retryable,
            FetchFailure::Status(code) if *code >= 500 || *code == 429 => {
                RetryDisposition::Retryable
            }
            _ => RetryDisposition::NonRetryable,
        }
    }
}

/// One GET per call. Implementations report non-2xx statuses through
/// `FetchedImage::status`, or as `FetchFailure::Status`.
pub trait ImageFetcher {
    fn get(&self, url: &str) -> Result<FetchedImage, FetchFailure>;
}

impl<T: ImageFetcher + ?Sized> ImageFetcher for &T {
    fn get(&self, url: &str) -> Result<FetchedImage, FetchFailure> {
        (**self).get(url)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    pub max_attempts: usize,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl BackoffPolicy {
    /// Delay after the given zero-based failed attempt, doubling each time.
    pub fn delay_for_attempt(&self, attempt_index: usize) -> Duration {
        let factor = 1u32.checked_shl(attempt_index as u32).unwrap_or(u32::MAX);
        let delay = self.base_delay.saturating_mul(factor).min(self.max_delay);
        if delay.is_zero() {
            return delay;
        }
        let jitter_ms = rand::thread_rng().gen_range(0..=delay.as_millis().min(250) as u64 / 4);
        delay + Duration::from_millis(jitter_ms)
    }
}

/// Final result of trying to get one row's photo.
#[derive(Debug, Clone, PartialEq)]
pub enum DownloadOutcome {
    Image(PreparedImage),
    /// Rejected before any request was made.
    Invalid { reason: String },
    Failed { failure: FetchFailure, attempts: usize },
}

/// Rejects URLs that can never be downloaded (`blob:`, `data:`, non-http).
pub fn validate_image_url(raw: &str) -> Result<Url, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("empty".to_string());
    }
    let url = Url::parse(raw).map_err(|e| format!("unparseable: {e}"))?;
    match url.scheme() {
        "http" | "https" => {}
        "blob" => return Err("blob URL".to_string()),
        "data" => return Err("inline data URL".to_string()),
        other => return Err(format!("unsupported scheme '{other}'")),
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err("missing host".to_string());
    }
    Ok(url)
}

fn is_image_type(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|ct| ct.parse::<mime::Mime>().ok())
        .is_some_and(|m| m.type_() == mime::IMAGE)
}

pub struct ImageDownloader<F> {
    fetcher: F,
    policy: BackoffPolicy,
}

impl<F: ImageFetcher> ImageDownloader<F> {
    pub fn new(fetcher: F, policy: BackoffPolicy) -> Self {
        Self { fetcher, policy }
    }

    fn attempt(&self, url: &str) -> Result<PreparedImage, FetchFailure> {
        let fetched = self.fetcher.get(url)?;
        if !(200..300).contains(&fetched.status) {
            return Err(FetchFailure::Status(fetched.status));
        }
        if !is_image_type(fetched.content_type.as_deref()) {
            return Err(FetchFailure::BadContent(
                fetched.content_type.unwrap_or_else(|| "no content type".to_string()),
            ));
        }
        prepare_image(&fetched.body).map_err(FetchFailure::BadContent)
    }

    pub fn download(&self, raw_url: &str) -> DownloadOutcome {
        let url = match validate_image_url(raw_url) {
            Ok(url) => url,
            Err(reason) => {
                warn!(url = raw_url, %reason, "invalid image URL, not downloading");
                return DownloadOutcome::Invalid { reason };
            }
        };

        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.attempt(url.as_str()) {
                Ok(image) => {
                    debug!(url = %url, attempt, "image downloaded");
                    return DownloadOutcome::Image(image);
                }
                Err(failure) => {
                    let retry = failure.disposition() == RetryDisposition::Retryable
                        && attempt < max_attempts;
                    warn!(url = %url, attempt, error = %failure, retry, "image download failed");
                    if !retry {
                        return DownloadOutcome::Failed {
                            failure,
                            attempts: attempt,
                        };
                    }
                    std::thread::sleep(self.policy.delay_for_attempt(attempt - 1));
                }
            }
        }
    }
}

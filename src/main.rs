use crate::config::Config;
use crate::media::{BackoffPolicy, ImageDownloader, ImageFetcher};
use crate::merge::{Collaborators, MediaStage};
use crate::scraper::{HttpImageFetcher, JsonZoningSource, NoZoning, PortalMediaSource, ZoningSource};
use anyhow::Context;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod address;
mod config;
mod domain;
mod errors;
mod media;
mod merge;
mod scraper;
mod spreadsheets;

#[cfg(test)]
mod tests;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env().context("failed to load configuration")?;
    info!(inputs = config.inputs.len(), business = %config.business_type, "starting merge");

    let zoning: Box<dyn ZoningSource> = match &config.zoning_results {
        Some(path) => Box::new(JsonZoningSource::new(path)),
        None => Box::new(NoZoning),
    };

    let portal;
    let fetcher;
    let media = if config.fetch_media {
        portal = PortalMediaSource::new(config.http_timeout)
            .context("failed to build portal client")?;
        fetcher = HttpImageFetcher::new(config.http_timeout)
            .context("failed to build image client")?;
        let policy = BackoffPolicy {
            max_attempts: config.image_max_attempts,
            base_delay: config.image_backoff,
            max_delay: Duration::from_secs(5).max(config.image_backoff),
        };
        Some(MediaStage {
            source: &portal,
            downloader: ImageDownloader::new(&fetcher as &dyn ImageFetcher, policy),
        })
    } else {
        None
    };

    let collaborators = Collaborators {
        zoning: zoning.as_ref(),
        media,
    };

    let output = merge::run(&config.job(), &collaborators, &mut |pct, message| {
        info!(progress = pct, "{message}");
    })
    .context("merge failed")?;

    println!("{}", output.display());
    Ok(())
}

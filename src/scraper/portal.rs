use crate::media::{FetchFailure, FetchedImage, ImageFetcher};
use crate::scraper::ScraperError;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, REFERER};
use reqwest::StatusCode;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::debug;
use url::Url;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/93.0.4577.63 Safari/537.36";
const PORTAL_REFERER: &str = "https://rpp.corelogic.com.au/";
const IMAGE_ACCEPT: &str = "image/avif,image/webp,image/apng,image/svg+xml,image/*,*/*;q=0.8";

// Gallery containers, most specific first. The last one is any <img> on the page.
const PHOTO_SELECTORS: &[&str] = &[
    ".image-gallery-slides img",
    ".image-gallery-center img",
    r#"section[data-testid="app-image-gallery-component"] img"#,
    "img",
];

// Map tiles and location pins that sit next to the property photo.
const NOT_A_PHOTO: &[&str] = &[
    "maps.googleapis.com",
    "staticmap",
    "target-property-inactive-pin",
    "target-property-pin",
    "marker",
    "pin.png",
    "map-marker",
    "satellite",
];

/// Photo and agent phone found on a property page. Either may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaLookup {
    pub image_url: Option<String>,
    pub phone: Option<String>,
}

/// Looks up the listing photo and agent phone behind a row's deep-link.
pub trait MediaSource {
    fn lookup(&self, deep_link: &str) -> Result<MediaLookup, ScraperError>;
}

fn build_client(timeout: Duration, headers: HeaderMap) -> Result<Client, ScraperError> {
    Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .timeout(timeout)
        .build()
        .map_err(|e| ScraperError::Network(e.to_string()))
}

fn selector(css: &str) -> Result<Selector, ScraperError> {
    Selector::parse(css).map_err(|e| ScraperError::HtmlParse(format!("{css}: {e:?}")))
}

fn is_photo(src: &str) -> bool {
    let lower = src.to_ascii_lowercase();
    !src.is_empty() && !NOT_A_PHOTO.iter().any(|p| lower.contains(p))
}

/// Resolves relative `src`/`href` values against the page URL.
fn absolute(base: Option<&Url>, value: &str) -> String {
    match base.and_then(|b| b.join(value).ok()) {
        Some(url) if !value.starts_with("blob:") && !value.starts_with("data:") => url.to_string(),
        _ => value.to_string(),
    }
}

/// Pulls the first property photo and the first `tel:` number out of a page.
pub fn parse_property_page(html: &str, page_url: &str) -> Result<MediaLookup, ScraperError> {
    let document = Html::parse_document(html);
    let base = Url::parse(page_url).ok();

    let mut image_url = None;
    for css in PHOTO_SELECTORS {
        let sel = selector(css)?;
        let found = document
            .select(&sel)
            .filter_map(|img| img.value().attr("src"))
            .map(str::trim)
            .find(|src| is_photo(src));
        if let Some(src) = found {
            debug!(selector = css, src, "property photo found");
            image_url = Some(absolute(base.as_ref(), src));
            break;
        }
    }

    let tel = selector(r#"a[href^="tel:"]"#)?;
    let phone = document
        .select(&tel)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| href.strip_prefix("tel:"))
        .map(|number| number.trim().to_string())
        .find(|number| !number.is_empty());

    Ok(MediaLookup { image_url, phone })
}

/// Fetches portal property pages over HTTP.
pub struct PortalMediaSource {
    client: Client,
}

impl PortalMediaSource {
    pub fn new(timeout: Duration) -> Result<Self, ScraperError> {
        let mut headers = HeaderMap::new();
        headers.insert(REFERER, HeaderValue::from_static(PORTAL_REFERER));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        Ok(Self {
            client: build_client(timeout, headers)?,
        })
    }
}

impl MediaSource for PortalMediaSource {
    fn lookup(&self, deep_link: &str) -> Result<MediaLookup, ScraperError> {
        let resp = self
            .client
            .get(deep_link)
            .send()
            .map_err(|e| ScraperError::Network(e.to_string()))?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ScraperError::Blocked(format!("HTTP {status} for {deep_link}")));
        }
        if !status.is_success() {
            return Err(ScraperError::Network(format!("HTTP {status} for {deep_link}")));
        }

        let final_url = resp.url().to_string();
        let html = resp
            .text()
            .map_err(|e| ScraperError::Network(e.to_string()))?;

        parse_property_page(&html, &final_url)
    }
}

/// Downloads photos with browser-like headers so the image CDN serves them.
pub struct HttpImageFetcher {
    client: Client,
}

impl HttpImageFetcher {
    pub fn new(timeout: Duration) -> Result<Self, ScraperError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(IMAGE_ACCEPT));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(REFERER, HeaderValue::from_static(PORTAL_REFERER));
        Ok(Self {
            client: build_client(timeout, headers)?,
        })
    }
}

impl ImageFetcher for HttpImageFetcher {
    fn get(&self, url: &str) -> Result<FetchedImage, FetchFailure> {
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| FetchFailure::Transport(e.to_string()))?;

        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = resp
            .bytes()
            .map_err(|e| FetchFailure::Transport(e.to_string()))?
            .to_vec();

        Ok(FetchedImage {
            status,
            content_type,
            body,
        })
    }
}

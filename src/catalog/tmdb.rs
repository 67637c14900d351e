//! TMDB (The Movie Database) API client.
//!
//! Only the two popular listings and the poster CDN are used. Requests are
//! rate-limited with a token bucket and time out after 30 seconds.

use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use postergrid_common::{CatalogKind, Error, Result};
use serde::Deserialize;
use tracing::debug;

use super::{CatalogItem, CatalogSource};
use crate::config::TmdbConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const REQUESTS_PER_SECOND: NonZeroU32 = match NonZeroU32::new(40) {
    Some(n) => n,
    None => NonZeroU32::MIN,
};

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct TmdbClient {
    http: reqwest::Client,
    api_key: String,
    language: String,
    base_url: String,
    image_base_url: String,
    limiter: RateLimiter<
        governor::state::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
}

impl TmdbClient {
    pub fn new(config: &TmdbConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            language: config.language.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            image_base_url: config.image_base_url.trim_end_matches('/').to_string(),
            limiter: RateLimiter::direct(Quota::per_second(REQUESTS_PER_SECOND)),
        })
    }

    /// Fetch one page of the popular listing for `kind`.
    pub async fn popular(&self, kind: CatalogKind, page: u32) -> Result<Vec<CatalogItem>> {
        self.limiter.until_ready().await;

        let url = format!("{}{}", self.base_url, kind.popular_path());
        let page = page.to_string();
        debug!(%url, page = %page, "TMDB popular listing");

        let resp = self
            .http
            .get(&url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("language", self.language.as_str()),
                ("page", page.as_str()),
            ])
            .send()
            .await
            .map_err(strip_url)?;

        if !resp.status().is_success() {
            return Err(Error::status(resp.status().as_u16(), url));
        }

        let body: TmdbListResponse = resp.json().await.map_err(strip_url)?;
        Ok(body
            .results
            .into_iter()
            .map(|r| r.into_item(kind))
            .collect())
    }

    /// Full CDN URL for a poster path such as `/abc123.jpg`.
    pub fn poster_url(&self, poster_path: &str) -> String {
        format!("{}{}", self.image_base_url, poster_path)
    }

    /// Download the raw bytes of a poster.
    pub async fn download_poster(&self, poster_path: &str) -> Result<Vec<u8>> {
        self.limiter.until_ready().await;

        let url = self.poster_url(poster_path);
        let resp = self.http.get(&url).send().await?;
        if !resp.status().is_success() {
            return Err(Error::status(resp.status().as_u16(), url));
        }
        Ok(resp.bytes().await?.to_vec())
    }
}

#[async_trait]
impl CatalogSource for TmdbClient {
    async fn popular(&self, kind: CatalogKind, page: u32) -> Result<Vec<CatalogItem>> {
        TmdbClient::popular(self, kind, page).await
    }

    async fn download_poster(&self, poster_path: &str) -> Result<Vec<u8>> {
        TmdbClient::download_poster(self, poster_path).await
    }
}

/// Drop the request URL, which carries the API key, from transport errors.
fn strip_url(e: reqwest::Error) -> Error {
    Error::Http(e.without_url())
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TmdbListResponse {
    results: Vec<TmdbListResult>,
}

#[derive(Debug, Deserialize)]
struct TmdbListResult {
    id: u64,
    /// Movie title; series use `name`.
    #[serde(alias = "name")]
    title: Option<String>,
    poster_path: Option<String>,
}

impl TmdbListResult {
    fn into_item(self, kind: CatalogKind) -> CatalogItem {
        CatalogItem {
            id: self.id,
            kind,
            title: self.title.unwrap_or_else(|| "Unknown".to_string()),
            poster_path: self.poster_path.filter(|p| !p.is_empty()),
        }
    }
}

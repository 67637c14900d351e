//! Catalog fetcher and in-memory poster cache.
//!
//! [`fetch_content`] samples popular movies and series from a
//! [`CatalogSource`]; [`PosterCache`] downloads and decodes their posters
//! once per run and hands out an immutable snapshot to every renderer.

pub mod tmdb;

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use image::DynamicImage;
use postergrid_common::{CatalogKind, Result};
use rand::seq::SliceRandom;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::report::{FetchReport, SkipReason, Stage};

pub use tmdb::TmdbClient;

/// Listing pages consulted per kind.
pub const MAX_PAGES: u32 = 3;

/// One entry from a popular listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogItem {
    pub id: u64,
    pub kind: CatalogKind,
    pub title: String,
    pub poster_path: Option<String>,
}

/// Remote catalog of popular titles and their poster artwork.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// One page (1-based) of the popular listing for `kind`.
    async fn popular(&self, kind: CatalogKind, page: u32) -> Result<Vec<CatalogItem>>;

    /// Raw bytes of the poster at `poster_path`.
    async fn download_poster(&self, poster_path: &str) -> Result<Vec<u8>>;
}

/// Items chosen by [`fetch_content`] plus the pages that failed.
#[derive(Debug, Clone, Default)]
pub struct FetchedContent {
    pub items: Vec<CatalogItem>,
    pub movies: usize,
    pub series: usize,
    pub skips: Vec<SkipReason>,
}

/// Fetch up to `count` catalog items: `count / 2` movies and the rest series,
/// shuffled together.
pub async fn fetch_content(source: &dyn CatalogSource, count: usize) -> FetchedContent {
    let movie_quota = count / 2;
    let series_quota = count - movie_quota;

    let mut skips = Vec::new();
    let movies = fetch_kind(source, CatalogKind::Movie, movie_quota, &mut skips).await;
    let series = fetch_kind(source, CatalogKind::Tv, series_quota, &mut skips).await;

    let (movie_count, series_count) = (movies.len(), series.len());
    let mut items = movies;
    items.extend(series);
    shuffle(&mut items);
    items.truncate(count);

    info!(
        items = items.len(),
        movies = movie_count,
        series = series_count,
        "Fetched catalog"
    );

    FetchedContent {
        items,
        movies: movie_count,
        series: series_count,
        skips,
    }
}

async fn fetch_kind(
    source: &dyn CatalogSource,
    kind: CatalogKind,
    quota: usize,
    skips: &mut Vec<SkipReason>,
) -> Vec<CatalogItem> {
    let mut seen = HashSet::new();
    let mut items = Vec::new();

    for page in 1..=MAX_PAGES {
        if items.len() >= quota {
            break;
        }
        match source.popular(kind, page).await {
            Ok(results) => {
                items.extend(
                    results
                        .into_iter()
                        .filter(|item| seen.insert((item.kind, item.id))),
                );
            }
            Err(e) => {
                warn!(%kind, page, error = %e, "Error fetching listing page");
                skips.push(SkipReason::new(
                    Stage::ListingPage,
                    format!("{kind} page {page}"),
                    e,
                ));
            }
        }
    }

    items.truncate(quota);
    items
}

fn shuffle(items: &mut [CatalogItem]) {
    items.shuffle(&mut rand::thread_rng());
}

// ---------------------------------------------------------------------------
// Poster cache
// ---------------------------------------------------------------------------

#[derive(Default)]
struct CacheState {
    posters: Option<Arc<[DynamicImage]>>,
    report: FetchReport,
}

/// Run-scoped cache of decoded posters.
///
/// The first [`get_or_fetch`](Self::get_or_fetch) that finds the cache empty
/// fetches and downloads; later calls return the same snapshot. An empty
/// download result leaves the cache empty.
pub struct PosterCache {
    source: Arc<dyn CatalogSource>,
    concurrency: usize,
    state: Mutex<CacheState>,
}

impl PosterCache {
    pub fn new(source: Arc<dyn CatalogSource>, concurrency: usize) -> Self {
        Self {
            source,
            concurrency: concurrency.max(1),
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Return the cached posters, fetching up to `count` of them first if the
    /// cache is empty.
    pub async fn get_or_fetch(&self, count: usize) -> (Arc<[DynamicImage]>, FetchReport) {
        let mut state = self.state.lock().await;
        if let Some(posters) = &state.posters {
            return (Arc::clone(posters), state.report.clone());
        }

        let content = fetch_content(self.source.as_ref(), count).await;
        let mut report = FetchReport {
            requested: count,
            movies: content.movies,
            series: content.series,
            posters_cached: 0,
            skips: content.skips,
        };

        let posters = self.download_all(content.items, &mut report.skips).await;
        report.posters_cached = posters.len();
        info!(posters = posters.len(), "Cached posters");

        let snapshot: Arc<[DynamicImage]> = posters.into();
        if !snapshot.is_empty() {
            state.posters = Some(Arc::clone(&snapshot));
            state.report = report.clone();
        }
        (snapshot, report)
    }

    /// Number of posters currently cached.
    pub async fn len(&self) -> usize {
        self.state
            .lock()
            .await
            .posters
            .as_ref()
            .map_or(0, |p| p.len())
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn download_all(
        &self,
        items: Vec<CatalogItem>,
        skips: &mut Vec<SkipReason>,
    ) -> Vec<DynamicImage> {
        let mut jobs = Vec::with_capacity(items.len());
        for item in items {
            match item.poster_path.clone() {
                Some(path) => jobs.push((item, path)),
                None => skips.push(SkipReason::new(
                    Stage::MissingPoster,
                    item.title.clone(),
                    format!("{} {} has no poster", item.kind, item.id),
                )),
            }
        }

        let total = jobs.len();
        let source = &self.source;
        let mut downloads = stream::iter(jobs)
            .map(|(item, path)| async move {
                let result = download_and_decode(source.as_ref(), &path).await;
                (item, result)
            })
            .buffer_unordered(self.concurrency);

        let mut posters = Vec::with_capacity(total);
        while let Some((item, result)) = downloads.next().await {
            match result {
                Ok(poster) => {
                    posters.push(poster);
                    info!("[{}/{}] Downloaded: {}", posters.len(), total, item.title);
                }
                Err(skip) => {
                    let skip = SkipReason::new(skip.stage, item.title, skip.message);
                    warn!(%skip, "Poster dropped");
                    skips.push(skip);
                }
            }
        }
        posters
    }
}

async fn download_and_decode(
    source: &dyn CatalogSource,
    path: &str,
) -> std::result::Result<DynamicImage, SkipReason> {
    let bytes = source
        .download_poster(path)
        .await
        .map_err(|e| SkipReason::new(Stage::PosterDownload, path, e))?;
    image::load_from_memory(&bytes).map_err(|e| SkipReason::new(Stage::PosterDecode, path, e))
}

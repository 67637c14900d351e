//! Run orchestration: fetch posters once, render every device on a bounded
//! worker pool, then publish the results.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use image::DynamicImage;
use postergrid_common::{Error, Result};
use rayon::prelude::*;
use tracing::{error, info, warn};

use crate::catalog::{CatalogSource, PosterCache, TmdbClient};
use crate::compose::compose_grid;
use crate::config::{Config, OutputConfig};
use crate::devices::DeviceProfile;
use crate::encode::{encode_artifacts, ArtifactSet, Staging};
use crate::publish::{self, Publisher};
use crate::report::{DeviceReport, Outcome, RunReport, SkipReason, Stage};

pub struct Generator {
    profiles: Vec<DeviceProfile>,
    output: OutputConfig,
    cache: PosterCache,
    publisher: Arc<dyn Publisher>,
}

/// What one render worker hands back.
struct Rendered {
    profile: DeviceProfile,
    blank_tiles: Vec<SkipReason>,
    result: std::result::Result<ArtifactSet, SkipReason>,
}

impl Generator {
    /// Build a generator talking to TMDB and the configured storage.
    pub fn new(config: &Config, profiles: Vec<DeviceProfile>) -> Result<Self> {
        let source: Arc<dyn CatalogSource> = Arc::new(TmdbClient::new(&config.tmdb)?);
        let publisher = publish::from_config(&config.storage, &config.output.dir)?;
        Ok(Self::with_parts(
            source,
            publisher,
            profiles,
            config.output.clone(),
        ))
    }

    pub fn with_parts(
        source: Arc<dyn CatalogSource>,
        publisher: Arc<dyn Publisher>,
        profiles: Vec<DeviceProfile>,
        output: OutputConfig,
    ) -> Self {
        let cache = PosterCache::new(source, output.download_concurrency);
        Self {
            profiles,
            output,
            cache,
            publisher,
        }
    }

    pub fn profiles(&self) -> &[DeviceProfile] {
        &self.profiles
    }

    /// Render threads: one per core, capped at `max_workers`.
    pub fn worker_count(&self) -> usize {
        num_cpus::get().min(self.output.max_workers).max(1)
    }

    /// Generate wallpapers for every profile. Never fails as a whole;
    /// per-device problems end up in the report.
    pub async fn generate_all(&self) -> RunReport {
        let started = Instant::now();
        let (posters, fetch) = self.cache.get_or_fetch(self.output.poster_count).await;

        let workers = self.worker_count();
        info!(
            devices = self.profiles.len(),
            posters = posters.len(),
            workers,
            cpus = num_cpus::get(),
            "Generating poster collages"
        );

        let rendered = self.render_all(posters, workers).await;

        let mut publishes = Vec::new();
        let mut reports = Vec::with_capacity(rendered.len());
        for item in rendered {
            let (width, height) = item.profile.scaled_size();
            match item.result {
                Ok(set) => {
                    publishes.push(self.publisher.publish(set));
                    reports.push((item.profile.name, width, height, item.blank_tiles, None));
                }
                Err(skip) => {
                    reports.push((item.profile.name, width, height, item.blank_tiles, Some(skip)));
                }
            }
        }

        let mut published = join_all(publishes).await.into_iter();
        let devices: Vec<DeviceReport> = reports
            .into_iter()
            .map(|(device, width, height, blank_tiles, skip)| {
                let outcome = match skip {
                    Some(skip) => Outcome::Skipped(skip),
                    None => match published.next() {
                        Some(artifacts) => Outcome::Success(artifacts),
                        None => Outcome::Skipped(SkipReason::new(
                            Stage::Upload,
                            device.clone(),
                            "publish result missing",
                        )),
                    },
                };
                DeviceReport {
                    device,
                    width,
                    height,
                    blank_tiles,
                    outcome,
                }
            })
            .collect();

        let report = RunReport {
            fetch,
            devices,
            remote_storage: self.publisher.is_remote(),
        };
        info!(
            succeeded = report.succeeded(),
            total = report.devices.len(),
            elapsed_secs = started.elapsed().as_secs_f64(),
            "Run complete"
        );
        report
    }

    async fn render_all(&self, posters: Arc<[DynamicImage]>, workers: usize) -> Vec<Rendered> {
        let jobs: Vec<(DeviceProfile, Result<Staging>)> = self
            .profiles
            .iter()
            .map(|p| (p.clone(), self.publisher.staging()))
            .collect();
        render_on_pool(jobs, workers, move |profile, staging| {
            render_device(profile, &posters, staging)
        })
        .await
    }
}

/// Run `render` for every job on a dedicated pool of `workers` threads,
/// keeping job order. A panicking job becomes a `Render` skip for its own
/// device only.
async fn render_on_pool<F>(
    jobs: Vec<(DeviceProfile, Result<Staging>)>,
    workers: usize,
    render: F,
) -> Vec<Rendered>
where
    F: Fn(DeviceProfile, Result<Staging>) -> Rendered + Send + Sync + 'static,
{
    let names: Vec<DeviceProfile> = jobs.iter().map(|(p, _)| p.clone()).collect();

    let joined = tokio::task::spawn_blocking(move || -> Result<Vec<Rendered>> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("render-{i}"))
            .build()
            .map_err(|e| Error::internal(format!("render pool: {e}")))?;
        Ok(pool.install(|| {
            jobs.into_par_iter()
                .map(|(profile, staging)| {
                    let fallback = profile.clone();
                    match panic::catch_unwind(AssertUnwindSafe(|| render(profile, staging))) {
                        Ok(rendered) => rendered,
                        Err(payload) => {
                            let message = panic_message(&*payload);
                            error!(device = %fallback.name, error = %message, "Render worker panicked");
                            Rendered {
                                result: Err(SkipReason::new(
                                    Stage::Render,
                                    fallback.name.clone(),
                                    format!("render panicked: {message}"),
                                )),
                                profile: fallback,
                                blank_tiles: Vec::new(),
                            }
                        }
                    }
                })
                .collect()
        }))
    })
    .await;

    let failure = match joined {
        Ok(Ok(rendered)) => return rendered,
        Ok(Err(e)) => e.to_string(),
        Err(e) => format!("render task failed: {e}"),
    };
    error!(error = %failure, "Rendering aborted");
    names
        .into_iter()
        .map(|profile| Rendered {
            result: Err(SkipReason::new(Stage::Render, profile.name.clone(), &failure)),
            profile,
            blank_tiles: Vec::new(),
        })
        .collect()
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}

/// Compose and encode one device. Runs on a render worker.
fn render_device(
    profile: DeviceProfile,
    posters: &[DynamicImage],
    staging: Result<Staging>,
) -> Rendered {
    let started = Instant::now();
    let mut blank_tiles = Vec::new();

    let result = (|| -> Result<Option<ArtifactSet>> {
        let staging = staging?;
        let Some(composite) = compose_grid(&profile, posters)? else {
            return Ok(None);
        };
        blank_tiles = composite.blank_tiles;
        let set = encode_artifacts(
            &composite.image,
            &profile.name,
            &profile.file_stem(),
            staging,
        )?;
        Ok(Some(set))
    })();

    let result = match result {
        Ok(Some(set)) => {
            info!(
                device = %profile.name,
                elapsed_secs = started.elapsed().as_secs_f64(),
                "Rendered"
            );
            Ok(set)
        }
        Ok(None) => {
            warn!(device = %profile.name, "Skipped: no posters to tile");
            Err(SkipReason::new(
                Stage::Render,
                profile.name.clone(),
                "no cached posters",
            ))
        }
        Err(e) => {
            let chain = format!("{:#}", anyhow::Error::from(e));
            error!(device = %profile.name, error = %chain, "Error generating wallpaper");
            Err(SkipReason::new(Stage::Render, profile.name.clone(), chain))
        }
    };

    Rendered {
        profile,
        blank_tiles,
        result,
    }
}

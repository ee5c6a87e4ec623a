use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info};

use crate::config::Settings;
use crate::db::Store;
use crate::fetch::HttpClient;
use crate::model::{self, Observation};
use crate::sites::SiteScraper;
use crate::{mirror, specs};

/// What one monitoring run produced.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunSummary {
    pub found: usize,
    pub persisted: usize,
    pub failed: usize,
    pub mirrored: usize,
    pub elapsed: Duration,
}

/// Query every site for every model, page by page, one request at a time;
/// then persist the whole batch and mirror it.
pub async fn run(
    settings: &Settings,
    store: &Store,
    http: &HttpClient,
    sites: &[Box<dyn SiteScraper>],
    mirror_path: Option<&Path>,
) -> Result<RunSummary> {
    info!("Starting monitoring run...");
    let t0 = Instant::now();
    let batch_ts = model::batch_timestamp();
    let mut batch: Vec<Observation> = Vec::new();

    let steps = settings.models.len() * sites.len() * settings.pages_per_site as usize;
    let pb = ProgressBar::new(steps as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );

    for query in &settings.models {
        info!("--- Searching model: {} ---", query);
        for site in sites {
            for page in 1..=settings.pages_per_site {
                pb.set_message(format!("{} p{}", site.name(), page));
                info!(
                    site = site.name(),
                    page,
                    "Searching [{}] page {}...",
                    site.name().to_uppercase(),
                    page
                );

                let listings = match site.search(http, query, page).await {
                    Ok(listings) => listings,
                    Err(e) => {
                        error!(site = site.name(), query = %query, page, "Search failed: {:#}", e);
                        pb.inc(1);
                        continue;
                    }
                };

                info!(
                    "Found {} results for {} on {} (page {})",
                    listings.len(),
                    query,
                    site.name(),
                    page
                );
                for raw in listings {
                    let specs = specs::extract(&raw.title);
                    batch.push(model::normalize(raw, specs, batch_ts));
                }
                pb.inc(1);

                let delay = settings.random_delay();
                if !delay.is_zero() {
                    info!("Waiting {:.2} seconds...", delay.as_secs_f64());
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
    pb.finish_and_clear();

    info!("Search finished. {} results found in total", batch.len());

    let mut summary = RunSummary {
        found: batch.len(),
        ..RunSummary::default()
    };
    if !batch.is_empty() {
        let persisted = store.persist(&batch);
        // The mirror is written even when the store rejects the batch.
        if let Some(path) = mirror_path {
            summary.mirrored = mirror::append_batch(&batch, path);
        }
        let persisted = persisted.inspect_err(|e| {
            error!(mirrored = summary.mirrored, "Failed to persist batch: {}", e);
        })?;
        summary.persisted = persisted.updated;
        summary.failed = persisted.failed;
    }
    summary.elapsed = t0.elapsed();

    info!(
        found = summary.found,
        persisted = summary.persisted,
        failed = summary.failed,
        mirrored = summary.mirrored,
        "Run finished in {:.2} seconds",
        summary.elapsed.as_secs_f64()
    );
    Ok(summary)
}

//! The catalog service: crawl, extract, and cache workflow metadata.
//!
//! A [`CatalogService`] owns one corpus and one cached [`CatalogSnapshot`].
//! The snapshot is built lazily on first access, rebuilt on demand, and
//! invalidated with [`CatalogService::reset`]. Publication is a single
//! reference swap, so concurrent readers always see either the previous or
//! the new complete snapshot, never a partial one.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::Config;
use crate::crawl::{self, CrawledFile};
use crate::extract;
use crate::ids;
use crate::models::{CatalogWorkflow, SkippedFile};

/// One immutable build of the catalog index.
#[derive(Debug)]
pub struct CatalogSnapshot {
    /// Indexed workflows, in crawl order.
    pub workflows: Vec<CatalogWorkflow>,
    /// Corpus files the build could not index.
    pub skipped: Vec<SkippedFile>,
    pub built_at: DateTime<Utc>,
}

impl CatalogSnapshot {
    pub fn find_by_path(&self, relative_path: &str) -> Option<&CatalogWorkflow> {
        self.workflows
            .iter()
            .find(|w| w.relative_path == relative_path)
    }
}

/// Read-mostly catalog over one corpus root.
///
/// The service is a plain value: callers own as many independent catalogs as
/// they need (one per corpus, one per test). There is no global state.
pub struct CatalogService {
    config: Config,
    snapshot: RwLock<Option<Arc<CatalogSnapshot>>>,
    build_guard: Mutex<()>,
}

impl CatalogService {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            snapshot: RwLock::new(None),
            build_guard: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the cached snapshot, building it on first call.
    ///
    /// Concurrent cold callers serialize on the build guard and share the one
    /// resulting build; callers arriving after publication take no lock
    /// beyond a momentary read.
    pub async fn snapshot(&self) -> Result<Arc<CatalogSnapshot>> {
        if let Some(snapshot) = self.cached() {
            return Ok(snapshot);
        }
        let _guard = self.build_guard.lock().await;
        // Another caller may have finished the build while we waited.
        if let Some(snapshot) = self.cached() {
            return Ok(snapshot);
        }
        let snapshot = Arc::new(self.build().await?);
        self.publish(snapshot.clone());
        Ok(snapshot)
    }

    /// Unconditionally rebuilds from disk and publishes the fresh snapshot.
    pub async fn rebuild(&self) -> Result<Arc<CatalogSnapshot>> {
        let _guard = self.build_guard.lock().await;
        let snapshot = Arc::new(self.build().await?);
        self.publish(snapshot.clone());
        Ok(snapshot)
    }

    /// Invalidates the cached snapshot; the next [`snapshot`](Self::snapshot)
    /// call rebuilds from the filesystem.
    pub fn reset(&self) {
        let mut slot = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
        *slot = None;
    }

    /// Returns the cached snapshot if one is published, without building.
    pub fn peek(&self) -> Option<Arc<CatalogSnapshot>> {
        self.cached()
    }

    /// Looks up one indexed workflow by its opaque id.
    pub async fn workflow_by_id(&self, id: &str) -> Result<CatalogWorkflow> {
        let relative_path = ids::decode_workflow_id(id)?;
        let snapshot = self.snapshot().await?;
        match snapshot.find_by_path(&relative_path) {
            Some(workflow) => Ok(workflow.clone()),
            None => bail!("workflow not found: {}", relative_path),
        }
    }

    /// Reads the raw workflow JSON a valid id points at.
    ///
    /// The decoded path must pass the containment check before any read; a
    /// crafted id fails with "invalid workflow id" and never touches disk.
    pub async fn read_raw_by_id(&self, id: &str) -> Result<String> {
        let relative_path = ids::decode_workflow_id(id)?;
        let path = ids::resolve_under_root(&self.config.catalog.root, &relative_path)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(raw) => Ok(raw),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                bail!("workflow not found: {}", relative_path)
            }
            Err(e) => {
                Err(e).with_context(|| format!("failed to read workflow file: {}", relative_path))
            }
        }
    }

    fn cached(&self) -> Option<Arc<CatalogSnapshot>> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn publish(&self, snapshot: Arc<CatalogSnapshot>) {
        let mut slot = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(snapshot);
    }

    /// Crawls the corpus and parses every file on a bounded pool of blocking
    /// workers, then merges the results back into crawl order.
    ///
    /// The whole build runs under `build.timeout_secs`; on timeout the
    /// workers are flagged to drain, the build fails, and whatever snapshot
    /// was previously published stays in use.
    async fn build(&self) -> Result<CatalogSnapshot> {
        let started = Instant::now();
        let files = crawl::crawl_corpus(&self.config.catalog)?;

        if files.is_empty() {
            info!(root = %self.config.catalog.root.display(), "catalog built from empty corpus");
            return Ok(CatalogSnapshot {
                workflows: Vec::new(),
                skipped: Vec::new(),
                built_at: Utc::now(),
            });
        }

        let workers = self.worker_count(files.len());
        let cancel = Arc::new(AtomicBool::new(false));

        // Tag each file with its crawl position so the merge can restore
        // crawl order regardless of which worker finishes first.
        let indexed: Vec<(usize, CrawledFile)> = files.into_iter().enumerate().collect();
        let batch_size = indexed.len().div_ceil(workers);

        let mut handles = Vec::with_capacity(workers);
        for batch in indexed.chunks(batch_size) {
            let batch = batch.to_vec();
            let cancel = cancel.clone();
            handles.push(tokio::task::spawn_blocking(move || {
                parse_batch(batch, &cancel)
            }));
        }

        let join_all = async {
            let mut parsed = Vec::new();
            for handle in handles {
                let mut part = handle.await.context("catalog parse worker panicked")?;
                parsed.append(&mut part);
            }
            anyhow::Ok(parsed)
        };

        let timeout = Duration::from_secs(self.config.build.timeout_secs);
        let mut parsed = match tokio::time::timeout(timeout, join_all).await {
            Ok(parsed) => parsed?,
            Err(_) => {
                cancel.store(true, Ordering::Relaxed);
                bail!(
                    "catalog build timed out after {}s",
                    self.config.build.timeout_secs
                );
            }
        };
        parsed.sort_by_key(|(position, _)| *position);

        let mut workflows = Vec::new();
        let mut skipped = Vec::new();
        for (_, outcome) in parsed {
            match outcome {
                ParseOutcome::Indexed(workflow) => workflows.push(workflow),
                ParseOutcome::Skipped(skip) => skipped.push(skip),
            }
        }

        info!(
            workflows = workflows.len(),
            skipped = skipped.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "catalog built"
        );
        Ok(CatalogSnapshot {
            workflows,
            skipped,
            built_at: Utc::now(),
        })
    }

    fn worker_count(&self, file_count: usize) -> usize {
        let configured = self.config.build.workers;
        let workers = if configured == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        } else {
            configured
        };
        workers.clamp(1, file_count)
    }
}

enum ParseOutcome {
    Indexed(CatalogWorkflow),
    Skipped(SkippedFile),
}

fn parse_batch(batch: Vec<(usize, CrawledFile)>, cancel: &AtomicBool) -> Vec<(usize, ParseOutcome)> {
    let mut out = Vec::with_capacity(batch.len());
    for (position, file) in batch {
        if cancel.load(Ordering::Relaxed) {
            break;
        }
        out.push((position, parse_one(&file)));
    }
    out
}

fn parse_one(file: &CrawledFile) -> ParseOutcome {
    let bytes = match std::fs::read(&file.absolute) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(path = %file.relative_path, error = %e, "skipping unreadable workflow file");
            return ParseOutcome::Skipped(SkippedFile {
                relative_path: file.relative_path.clone(),
                reason: format!("read error: {}", e),
            });
        }
    };
    match extract::extract_workflow(&file.relative_path, &bytes) {
        Ok(workflow) => ParseOutcome::Indexed(workflow),
        Err(e) => {
            warn!(path = %file.relative_path, error = %e, "skipping unparsable workflow file");
            ParseOutcome::Skipped(SkippedFile {
                relative_path: file.relative_path.clone(),
                reason: format!("{:#}", e),
            })
        }
    }
}

/// Builds (or rebuilds) the catalog and prints a corpus report.
pub async fn run_index(config: &Config) -> Result<()> {
    let service = CatalogService::new(config.clone());
    let snapshot = service.rebuild().await?;

    println!(
        "Indexed {} workflows from {}",
        snapshot.workflows.len(),
        config.catalog.root.display()
    );
    if !snapshot.skipped.is_empty() {
        println!("Skipped {} files:", snapshot.skipped.len());
        for skip in &snapshot.skipped {
            println!("  {}: {}", skip.relative_path, skip.reason);
        }
    }
    Ok(())
}

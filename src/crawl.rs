//! Corpus crawling.
//!
//! Enumerates workflow definition files under the configured root in a
//! deterministic order. Determinism matters downstream: search scores tie on
//! crawl order, so the same corpus must always enumerate the same way.

use anyhow::Result;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::path::PathBuf;
use tracing::warn;
use walkdir::WalkDir;

use crate::config::CatalogConfig;

/// One discovered corpus file.
#[derive(Debug, Clone)]
pub struct CrawledFile {
    pub absolute: PathBuf,
    pub relative_path: String,
}

/// Recursively enumerates every regular file under the corpus root that
/// matches the include globs (default `**/*.json`, case-insensitive) and none
/// of the exclude globs.
///
/// A missing root yields an empty list rather than an error. Symlinks are
/// never followed, so a crafted corpus cannot pull files from outside the
/// root into the index. Results are sorted by relative path.
pub fn crawl_corpus(config: &CatalogConfig) -> Result<Vec<CrawledFile>> {
    let root = &config.root;
    if !root.is_dir() {
        return Ok(Vec::new());
    }

    let include_set = build_globset(&config.include_globs)?;
    let exclude_set = build_globset(&config.exclude_globs)?;

    let mut files = Vec::new();

    let walker = WalkDir::new(root).follow_links(false);
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                // An unreadable subtree degrades the crawl, it does not fail it.
                warn!(error = %e, "skipping unreadable corpus entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().to_string();

        if exclude_set.is_match(&rel_str) {
            continue;
        }
        if !include_set.is_match(&rel_str) {
            continue;
        }

        files.push(CrawledFile {
            absolute: path.to_path_buf(),
            relative_path: rel_str,
        });
    }

    // Sort for deterministic ordering
    files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

    Ok(files)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(
            GlobBuilder::new(pattern)
                .case_insensitive(true)
                .build()?,
        );
    }
    Ok(builder.build()?)
}

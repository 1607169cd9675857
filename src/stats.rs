//! Catalog statistics and health overview.
//!
//! Provides a quick summary of what's indexed: workflow and node counts,
//! complexity breakdown, top tags, credential usage, and any files the build
//! skipped. Used by `flowcat stats` to give confidence that the corpus is
//! being picked up as expected.

use std::collections::HashMap;

use anyhow::Result;

use crate::catalog::CatalogService;
use crate::config::Config;
use crate::models::Complexity;

const TOP_N: usize = 10;

/// Run the stats command: build (or reuse) the snapshot and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let service = CatalogService::new(config.clone());
    let snapshot = service.snapshot().await?;

    let total_nodes: usize = snapshot.workflows.iter().map(|w| w.node_count).sum();
    let mut low = 0usize;
    let mut medium = 0usize;
    let mut high = 0usize;
    for workflow in &snapshot.workflows {
        match workflow.complexity {
            Complexity::Low => low += 1,
            Complexity::Medium => medium += 1,
            Complexity::High => high += 1,
        }
    }

    println!("Workflow Catalog Stats");
    println!("======================");
    println!();
    println!("  Corpus root:  {}", config.catalog.root.display());
    println!(
        "  Built:        {}",
        format_ts_relative(snapshot.built_at.timestamp())
    );
    println!();
    println!("  Workflows:    {}", snapshot.workflows.len());
    println!("  Total nodes:  {}", total_nodes);
    println!("  Skipped:      {}", snapshot.skipped.len());
    println!();
    println!("  By complexity:");
    println!("    low      {}", low);
    println!("    medium   {}", medium);
    println!("    high     {}", high);

    let top_tags = top_counts(
        snapshot
            .workflows
            .iter()
            .flat_map(|w| w.tags.iter().cloned()),
    );
    if !top_tags.is_empty() {
        println!();
        println!("  Top tags:");
        println!("  {:<28} {:>9}", "TAG", "WORKFLOWS");
        println!("  {}", "-".repeat(38));
        for (tag, count) in top_tags.iter().take(TOP_N) {
            println!("  {:<28} {:>9}", tag, count);
        }
    }

    let top_credentials = top_counts(
        snapshot
            .workflows
            .iter()
            .flat_map(|w| w.credentials.iter().cloned()),
    );
    if !top_credentials.is_empty() {
        println!();
        println!("  Credentials in use: {} distinct", top_credentials.len());
        for (credential, count) in top_credentials.iter().take(TOP_N) {
            println!("    - {} ({})", credential, count);
        }
    }

    if !snapshot.skipped.is_empty() {
        println!();
        println!("  Skipped files:");
        for skipped in snapshot.skipped.iter().take(TOP_N) {
            println!("    {}: {}", skipped.relative_path, skipped.reason);
        }
        if snapshot.skipped.len() > TOP_N {
            println!("    ... and {} more", snapshot.skipped.len() - TOP_N);
        }
    }

    println!();
    Ok(())
}

/// Tally occurrences and order by count descending, then name, for stable output.
fn top_counts<I: Iterator<Item = String>>(values: I) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
    }
    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}

/// Format a Unix timestamp as a relative time string (e.g. "3 hours ago").
fn format_ts_relative(ts: i64) -> String {
    let now = chrono::Utc::now().timestamp();
    let delta = now - ts;

    if delta < 0 {
        return format_ts_iso(ts);
    }

    if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        let mins = delta / 60;
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if delta < 86400 {
        let hours = delta / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if delta < 86400 * 30 {
        let days = delta / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else {
        format_ts_iso(ts)
    }
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}

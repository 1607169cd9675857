//! Workflow retrieval by id.
//!
//! Resolves an opaque workflow id back to its catalog entry and prints either
//! the extracted metadata with its install plan (`flowcat show`) or the raw
//! JSON definition straight from disk (`flowcat raw`).

use anyhow::Result;

use crate::catalog::CatalogService;
use crate::config::Config;
use crate::plan;

/// CLI entry point for `flowcat show`: metadata plus the derived install plan.
pub async fn run_show(config: &Config, id: &str) -> Result<()> {
    let service = CatalogService::new(config.clone());
    let workflow = service.workflow_by_id(id).await?;

    println!("--- Workflow ---");
    println!("id:           {}", workflow.id);
    println!("name:         {}", workflow.name);
    println!("path:         {}", workflow.relative_path);
    println!("description:  {}", workflow.description);
    println!(
        "complexity:   {} ({} nodes)",
        workflow.complexity, workflow.node_count
    );
    println!("tags:         {}", join_or_none(&workflow.tags));
    println!("credentials:  {}", join_or_none(&workflow.credentials));
    println!("node types:   {}", join_or_none(&workflow.node_types));
    println!();

    println!("--- Install plan ---");
    plan::print_plan(&plan::build_install_plan(&workflow));

    Ok(())
}

/// CLI entry point for `flowcat raw`: the stored JSON, byte for byte.
pub async fn run_raw(config: &Config, id: &str) -> Result<()> {
    let service = CatalogService::new(config.clone());
    let raw = service.read_raw_by_id(id).await?;
    print!("{}", raw);
    if !raw.ends_with('\n') {
        println!();
    }
    Ok(())
}

fn join_or_none(values: &[String]) -> String {
    if values.is_empty() {
        "(none)".to_string()
    } else {
        values.join(", ")
    }
}

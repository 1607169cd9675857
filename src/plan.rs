//! Install plan derivation.
//!
//! A [`WorkflowInstallPlan`] is a human-readable checklist recomputed on
//! demand from one workflow's metadata: what to set up, how to test it, and
//! what to watch out for. Pure functions, no I/O.

use anyhow::Result;

use crate::catalog::CatalogService;
use crate::config::Config;
use crate::models::{CatalogWorkflow, Complexity, WorkflowInstallPlan};

/// Derives the install/test/risk checklist for one workflow.
///
/// `test_steps` and `risk_notes` are never empty: when no condition matches,
/// each falls back to a single generic entry.
pub fn build_install_plan(workflow: &CatalogWorkflow) -> WorkflowInstallPlan {
    let types_lower: Vec<String> = workflow
        .node_types
        .iter()
        .map(|t| t.to_lowercase())
        .collect();
    let any_type_contains = |needle: &str| types_lower.iter().any(|t| t.contains(needle));

    let install_steps = vec![
        "Download the workflow JSON file.".to_string(),
        "Import it into your n8n instance (Workflows > Import from File).".to_string(),
        "Configure the credentials listed in the credential checklist.".to_string(),
        "Review node parameters and adjust URLs, channels, and IDs for your environment."
            .to_string(),
        "Run a test execution, then activate the workflow.".to_string(),
    ];

    let mut test_steps = Vec::new();
    if any_type_contains("webhook") {
        test_steps.push(
            "Trigger the Webhook node with a test request and confirm the downstream nodes run."
                .to_string(),
        );
    }
    if any_type_contains("cron") || any_type_contains("schedule") {
        test_steps.push(
            "Use manual execution first, then verify the schedule timing before activating."
                .to_string(),
        );
    }
    if test_steps.is_empty() {
        test_steps.push("Execute the workflow manually and verify each node's output.".to_string());
    }

    let mut risk_notes = Vec::new();
    if workflow.complexity == Complexity::High {
        risk_notes.push(
            "High complexity: review the workflow in a staging environment before production use."
                .to_string(),
        );
    }
    if any_type_contains("http") {
        risk_notes.push(
            "HTTP nodes detected: verify external endpoints and authentication before running."
                .to_string(),
        );
    }
    if any_type_contains("code") || any_type_contains("function") {
        risk_notes
            .push("Code nodes detected: review embedded code for correctness and safety.".to_string());
    }
    if workflow.credentials.len() > 3 {
        risk_notes.push(
            "Multiple credentials required: allow extra setup time for access provisioning."
                .to_string(),
        );
    }
    if risk_notes.is_empty() {
        risk_notes.push("Standard risk: test with sample data before enabling on live data.".to_string());
    }

    WorkflowInstallPlan {
        credential_checklist: workflow.credentials.clone(),
        install_steps,
        test_steps,
        risk_notes,
    }
}

/// Prints one plan in the CLI layout shared by `plan` and `show`.
pub fn print_plan(plan: &WorkflowInstallPlan) {
    println!("Credential checklist:");
    if plan.credential_checklist.is_empty() {
        println!("  (none)");
    } else {
        for credential in &plan.credential_checklist {
            println!("  - {}", credential);
        }
    }

    println!("Install steps:");
    for (i, step) in plan.install_steps.iter().enumerate() {
        println!("  {}. {}", i + 1, step);
    }

    println!("Test steps:");
    for step in &plan.test_steps {
        println!("  - {}", step);
    }

    println!("Risk notes:");
    for note in &plan.risk_notes {
        println!("  - {}", note);
    }
}

/// Resolves a workflow by id and prints its install plan.
pub async fn run_plan(config: &Config, id: &str) -> Result<()> {
    let service = CatalogService::new(config.clone());
    let workflow = service.workflow_by_id(id).await?;
    let plan = build_install_plan(&workflow);

    println!("Install plan for: {}", workflow.name);
    println!();
    print_plan(&plan);
    Ok(())
}

//! Ranked catalog search.
//!
//! Scoring runs in two separable stages: a lexical relevance score built from
//! per-token signal weights, and a query-independent heuristic adjustment for
//! install effort. Sorting is stable and the snapshot is in crawl order, so
//! equal scores keep crawl order.

use anyhow::Result;

use crate::catalog::{CatalogService, CatalogSnapshot};
use crate::config::Config;
use crate::models::{CatalogWorkflow, Complexity, ScoredWorkflow, SearchRequest};
use crate::tokens;

// ============ Signal weights ============

const WEIGHT_NAME: i64 = 10;
const WEIGHT_TAG: i64 = 6;
const WEIGHT_DESCRIPTION: i64 = 3;
const WEIGHT_SEARCH_TOKEN: i64 = 4;

const MAX_CREDENTIAL_PENALTY: i64 = 6;

// ============ Search pipeline ============

/// Searches one snapshot. Pure and synchronous: no I/O, no locks.
///
/// A query with zero tokens after normalization is not an error: every
/// candidate that survives the tag filter scores exactly 1 and keeps crawl
/// order. Otherwise candidates that match no query token are excluded
/// entirely, and the rest rank by lexical score plus heuristics.
pub fn search_catalog(snapshot: &CatalogSnapshot, request: &SearchRequest) -> Vec<ScoredWorkflow> {
    let required: Vec<String> = request
        .required_tags
        .iter()
        .map(|tag| tag.to_lowercase())
        .collect();

    let candidates = snapshot
        .workflows
        .iter()
        .filter(|workflow| matches_required_tags(workflow, &required));

    let query_tokens = tokens::tokenize(&request.query);

    let mut results: Vec<ScoredWorkflow> = if query_tokens.is_empty() {
        // No ranking signal: everything ties at 1 so crawl order holds.
        candidates
            .map(|workflow| ScoredWorkflow {
                workflow: workflow.clone(),
                score: 1,
            })
            .collect()
    } else {
        let mut scored: Vec<ScoredWorkflow> = Vec::new();
        for workflow in candidates {
            let lexical = lexical_score(workflow, &query_tokens);
            if lexical == 0 {
                continue;
            }
            scored.push(ScoredWorkflow {
                workflow: workflow.clone(),
                score: lexical + heuristic_adjustment(workflow),
            });
        }
        // sort_by is stable: ties stay in crawl order.
        scored.sort_by(|a, b| b.score.cmp(&a.score));
        scored
    };

    results.truncate(request.limit);
    results
}

/// Every required tag must be a substring of at least one workflow tag.
/// Tags are stored lowercase; the caller lowercases the required tags.
fn matches_required_tags(workflow: &CatalogWorkflow, required: &[String]) -> bool {
    required.iter().all(|needed| {
        workflow
            .tags
            .iter()
            .any(|tag| tag.contains(needed.as_str()))
    })
}

/// Lexical stage: additive weights per query token across independent
/// signals. Zero means the workflow matched nothing and must be dropped.
fn lexical_score(workflow: &CatalogWorkflow, query_tokens: &[String]) -> i64 {
    let name = workflow.name.to_lowercase();
    let description = workflow.description.to_lowercase();

    let mut score = 0;
    for token in query_tokens {
        if name.contains(token.as_str()) {
            score += WEIGHT_NAME;
        }
        if workflow.tags.iter().any(|tag| tag.contains(token.as_str())) {
            score += WEIGHT_TAG;
        }
        if description.contains(token.as_str()) {
            score += WEIGHT_DESCRIPTION;
        }
        if workflow.search_tokens.iter().any(|st| st == token) {
            score += WEIGHT_SEARCH_TOKEN;
        }
    }
    score
}

/// Heuristic stage: query-independent adjustments that bias the ranking
/// toward workflows that are easy to install and run.
pub fn heuristic_adjustment(workflow: &CatalogWorkflow) -> i64 {
    let mut adjustment = match workflow.complexity {
        Complexity::Low => 2,
        Complexity::Medium => 0,
        Complexity::High => -4,
    };
    adjustment -= (workflow.credentials.len() as i64).min(MAX_CREDENTIAL_PENALTY);

    let types_lower: Vec<String> = workflow
        .node_types
        .iter()
        .map(|t| t.to_lowercase())
        .collect();
    let any_type_contains = |needle: &str| types_lower.iter().any(|t| t.contains(needle));

    if any_type_contains("webhook") {
        adjustment += 2;
    }
    if any_type_contains("schedule") || any_type_contains("cron") {
        adjustment += 1;
    }
    if any_type_contains("http") {
        adjustment -= 2;
    }
    if any_type_contains("code") || any_type_contains("function") {
        adjustment -= 4;
    }
    adjustment
}

// ============ CLI ============

/// Runs a search and prints ranked results.
pub async fn run_search(
    config: &Config,
    query: &str,
    required_tags: Vec<String>,
    limit: Option<usize>,
) -> Result<()> {
    let service = CatalogService::new(config.clone());
    let snapshot = service.snapshot().await?;

    let request = SearchRequest {
        query: query.to_string(),
        limit: limit.unwrap_or(config.search.default_limit),
        required_tags,
    };
    let results = search_catalog(&snapshot, &request);

    if results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, result) in results.iter().enumerate() {
        let workflow = &result.workflow;
        println!(
            "{}. [{}] {} ({} nodes, {} complexity)",
            i + 1,
            result.score,
            workflow.name,
            workflow.node_count,
            workflow.complexity
        );
        if !workflow.tags.is_empty() {
            println!("    tags: {}", workflow.tags.join(", "));
        }
        if !workflow.credentials.is_empty() {
            println!("    credentials: {}", workflow.credentials.join(", "));
        }
        println!("    path: {}", workflow.relative_path);
        println!("    id: {}", workflow.id);
        println!();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids;
    use chrono::Utc;

    fn workflow(name: &str, relative_path: &str) -> CatalogWorkflow {
        CatalogWorkflow {
            id: ids::encode_workflow_id(relative_path),
            relative_path: relative_path.to_string(),
            name: name.to_string(),
            description: String::new(),
            tags: Vec::new(),
            search_tokens: Vec::new(),
            complexity: Complexity::Low,
            credentials: Vec::new(),
            node_types: Vec::new(),
            node_count: 1,
        }
    }

    fn snapshot(workflows: Vec<CatalogWorkflow>) -> CatalogSnapshot {
        CatalogSnapshot {
            workflows,
            skipped: Vec::new(),
            built_at: Utc::now(),
        }
    }

    fn request(query: &str) -> SearchRequest {
        SearchRequest {
            query: query.to_string(),
            limit: 10,
            required_tags: Vec::new(),
        }
    }

    fn names(results: &[ScoredWorkflow]) -> Vec<&str> {
        results.iter().map(|r| r.workflow.name.as_str()).collect()
    }

    #[test]
    fn name_match_outranks_description_match() {
        let by_name = workflow("Stripe Sync", "a.json");
        let mut by_description = workflow("Payment Sync", "b.json");
        by_description.description = "stripe payouts".to_string();

        let snap = snapshot(vec![by_description, by_name]);
        let results = search_catalog(&snap, &request("stripe"));
        assert_eq!(names(&results), vec!["Stripe Sync", "Payment Sync"]);
        assert!(results[0].score > results[1].score);
    }

    #[test]
    fn credential_count_penalizes_otherwise_identical_workflows() {
        let mut one_credential = workflow("Invoice Export", "one.json");
        one_credential.credentials = vec!["api".to_string()];
        let mut five_credentials = workflow("Invoice Export", "five.json");
        five_credentials.credentials =
            (0..5).map(|i| format!("cred{i}")).collect();

        let snap = snapshot(vec![five_credentials, one_credential]);
        let results = search_catalog(&snap, &request("invoice"));
        assert_eq!(
            results[0].workflow.relative_path, "one.json",
            "fewer credentials must rank higher"
        );
        assert_eq!(results[0].score - results[1].score, 4);
    }

    #[test]
    fn required_tags_filter_by_substring_case_insensitively() {
        let mut hooked = workflow("Order Intake", "hooked.json");
        hooked.tags = vec!["webhook".to_string(), "slack".to_string()];
        let mut unhooked = workflow("Order Intake", "unhooked.json");
        unhooked.tags = vec!["slack".to_string()];

        let snap = snapshot(vec![hooked, unhooked]);
        let mut req = request("order");
        req.required_tags = vec!["WebHook".to_string()];
        let results = search_catalog(&snap, &req);
        assert_eq!(names(&results), vec!["Order Intake"]);
        assert_eq!(results[0].workflow.relative_path, "hooked.json");

        // Substring is enough: "hook" matches the "webhook" tag.
        req.required_tags = vec!["hook".to_string()];
        let results = search_catalog(&snap, &req);
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn empty_query_returns_everything_tied_in_crawl_order() {
        let snap = snapshot(vec![
            workflow("Zeta", "1.json"),
            workflow("Alpha", "2.json"),
            workflow("Mid", "3.json"),
        ]);
        let results = search_catalog(&snap, &request(""));
        assert_eq!(names(&results), vec!["Zeta", "Alpha", "Mid"]);
        assert!(results.iter().all(|r| r.score == 1));
    }

    #[test]
    fn empty_query_still_honors_required_tags_and_limit() {
        let mut tagged = workflow("Tagged", "a.json");
        tagged.tags = vec!["airtable".to_string()];
        let snap = snapshot(vec![workflow("Plain", "b.json"), tagged]);

        let mut req = request("");
        req.required_tags = vec!["airtable".to_string()];
        let results = search_catalog(&snap, &req);
        assert_eq!(names(&results), vec!["Tagged"]);

        let mut req = request("");
        req.limit = 1;
        let results = search_catalog(&snap, &req);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].workflow.name, "Plain");
    }

    #[test]
    fn workflows_matching_no_token_are_excluded() {
        let snap = snapshot(vec![workflow("Slack Notifier", "a.json")]);
        let results = search_catalog(&snap, &request("quickbooks"));
        assert!(results.is_empty());
    }

    #[test]
    fn tied_scores_keep_crawl_order() {
        let snap = snapshot(vec![
            workflow("Daily Sync", "later-name.json"),
            workflow("Daily Sync", "earlier-name.json"),
        ]);
        let results = search_catalog(&snap, &request("daily"));
        assert_eq!(results[0].score, results[1].score);
        assert_eq!(results[0].workflow.relative_path, "later-name.json");
    }

    #[test]
    fn query_matches_search_tokens_and_folds_diacritics() {
        let mut accented = workflow("Remplir Opéra", "fr.json");
        accented.search_tokens = vec!["remplir".to_string(), "opera".to_string()];
        let snap = snapshot(vec![accented]);
        let results = search_catalog(&snap, &request("OPÉRA"));
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].score, 4 + 2 - 0);
    }

    #[test]
    fn heuristic_adjustment_combines_all_signals() {
        let mut heavy = workflow("Everything", "x.json");
        heavy.complexity = Complexity::Low;
        heavy.credentials = (0..7).map(|i| format!("cred{i}")).collect();
        heavy.node_types = vec![
            "n8n-nodes-base.webhook".to_string(),
            "n8n-nodes-base.scheduleTrigger".to_string(),
            "n8n-nodes-base.httpRequest".to_string(),
            "n8n-nodes-base.code".to_string(),
        ];
        // +2 low, -6 capped credentials, +2 webhook, +1 schedule, -2 http, -4 code
        assert_eq!(heuristic_adjustment(&heavy), -7);

        let mut high = workflow("Big", "y.json");
        high.complexity = Complexity::High;
        assert_eq!(heuristic_adjustment(&high), -4);
    }

    #[test]
    fn limit_truncates_ranked_results() {
        let mut workflows = Vec::new();
        for i in 0..15 {
            workflows.push(workflow("Report Mailer", &format!("{i:02}.json")));
        }
        let snap = snapshot(workflows);
        let mut req = request("report");
        req.limit = 5;
        let results = search_catalog(&snap, &req);
        assert_eq!(results.len(), 5);
        assert_eq!(results[0].workflow.relative_path, "00.json");
    }
}

//! Core data models for the workflow catalog.
//!
//! These types represent the indexed workflows, search results, and derived
//! install plans that flow through the crawl → extract → index → search
//! pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse installation-effort bucket derived from a workflow's node count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Low,
    Medium,
    High,
}

impl Complexity {
    /// Buckets a node count: ≤5 low, ≤12 medium, else high.
    pub fn from_node_count(node_count: usize) -> Self {
        if node_count <= 5 {
            Complexity::Low
        } else if node_count <= 12 {
            Complexity::Medium
        } else {
            Complexity::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Complexity::Low => "low",
            Complexity::Medium => "medium",
            Complexity::High => "high",
        }
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One indexed workflow: an immutable metadata record taken at crawl time.
///
/// `relative_path` is the source-of-truth key within the corpus root; `id` is
/// its reversible opaque encoding. The index never holds two entries for the
/// same path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogWorkflow {
    pub id: String,
    pub relative_path: String,
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub search_tokens: Vec<String>,
    pub complexity: Complexity,
    pub credentials: Vec<String>,
    pub node_types: Vec<String>,
    pub node_count: usize,
}

/// A corpus file the build could not index, with the reason it was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub relative_path: String,
    pub reason: String,
}

/// Install/test/risk checklist derived on demand from a [`CatalogWorkflow`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowInstallPlan {
    pub credential_checklist: Vec<String>,
    pub install_steps: Vec<String>,
    pub test_steps: Vec<String>,
    pub risk_notes: Vec<String>,
}

/// Search parameters, fully resolved (defaults already applied by the caller).
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: String,
    pub limit: usize,
    pub required_tags: Vec<String>,
}

/// One ranked search hit.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredWorkflow {
    #[serde(flatten)]
    pub workflow: CatalogWorkflow,
    pub score: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complexity_boundaries() {
        assert_eq!(Complexity::from_node_count(0), Complexity::Low);
        assert_eq!(Complexity::from_node_count(5), Complexity::Low);
        assert_eq!(Complexity::from_node_count(6), Complexity::Medium);
        assert_eq!(Complexity::from_node_count(12), Complexity::Medium);
        assert_eq!(Complexity::from_node_count(13), Complexity::High);
    }

    #[test]
    fn complexity_serializes_lowercase() {
        let json = serde_json::to_string(&Complexity::High).unwrap();
        assert_eq!(json, "\"high\"");
    }
}

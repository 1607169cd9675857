//! Workflow metadata extraction.
//!
//! All defensive access to the loosely-typed workflow JSON happens here, at a
//! single decode boundary: raw bytes are deserialized into [`WorkflowDoc`]
//! (every field optional, unknown fields ignored, wrong-typed fields falling
//! back to their defaults), and everything downstream operates on typed data.
//! Only bytes that are not a JSON object fail the decode; that failure is a
//! skip for the build, not fatal to it.

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::ids;
use crate::models::{CatalogWorkflow, Complexity};
use crate::tokens;

/// Maximum number of tags kept per workflow.
const MAX_TAGS: usize = 12;

/// Number of tags joined into the derived description.
const DESCRIPTION_TAGS: usize = 6;

/// Vendor prefixes stripped from node types during tag normalization.
const VENDOR_PREFIXES: &[&str] = &[
    "n8n-nodes-base.",
    "@n8n/n8n-nodes-langchain.",
    "n8n-nodes-langchain.",
    "n8n-nodes-community.",
];

/// Normalized tags that name engine plumbing rather than an integration.
const NOISE_TAGS: &[&str] = &["start", "manual trigger"];

/// Loosely-typed workflow definition as found on disk.
///
/// Every field decodes leniently: a wrong-typed value (`"nodes": "oops"`,
/// `"name": 42`) falls back to the field's default instead of failing the
/// document. The decode itself only fails when the top level is not an
/// object.
#[derive(Debug, Deserialize)]
pub struct WorkflowDoc {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_nodes")]
    pub nodes: Vec<NodeDoc>,
    #[serde(default, deserialize_with = "lenient")]
    pub settings: Option<SettingsDoc>,
}

/// One node of a workflow definition.
#[derive(Debug, Default, Deserialize)]
pub struct NodeDoc {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "lenient")]
    pub node_type: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub parameters: serde_json::Map<String, Value>,
    #[serde(default, deserialize_with = "lenient_credentials")]
    pub credentials: BTreeMap<String, CredentialRef>,
}

/// A node's reference to a named credential.
#[derive(Debug, Default, Deserialize)]
pub struct CredentialRef {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
}

/// Workflow settings; only the timezone participates in extraction.
#[derive(Debug, Default, Deserialize)]
pub struct SettingsDoc {
    #[serde(default)]
    pub timezone: Option<Value>,
}

/// Decodes a field into `T`, substituting `T::default()` when the value has
/// the wrong type. Absent fields never reach this (serde `default` applies).
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Decodes the `nodes` array. A non-array value yields no nodes; entries
/// that are not objects decode as empty nodes, so `node_count` still matches
/// the entry count of the source definition.
fn lenient_nodes<'de, D>(deserializer: D) -> Result<Vec<NodeDoc>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Array(items) = value else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .map(|item| serde_json::from_value(item).unwrap_or_default())
        .collect())
}

/// Decodes a node's credentials map. Keys survive even when their entry is
/// not an object; the keys are what the catalog reports as credentials.
fn lenient_credentials<'de, D>(
    deserializer: D,
) -> Result<BTreeMap<String, CredentialRef>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Object(entries) = value else {
        return Ok(BTreeMap::new());
    };
    Ok(entries
        .into_iter()
        .map(|(key, entry)| (key, serde_json::from_value(entry).unwrap_or_default()))
        .collect())
}

/// Extracts one workflow's catalog metadata from raw file bytes.
///
/// Fails only when the bytes are not valid JSON or the top level is not an
/// object; the caller records the skip and continues with the rest of the
/// corpus. Wrong-typed fields inside the document degrade per field.
pub fn extract_workflow(relative_path: &str, bytes: &[u8]) -> Result<CatalogWorkflow> {
    let value: Value = serde_json::from_slice(bytes)
        .with_context(|| format!("unparsable workflow definition: {}", relative_path))?;
    if !value.is_object() {
        // serde would also accept a top-level array (positional fields).
        bail!(
            "unparsable workflow definition: {}: top level is not an object",
            relative_path
        );
    }
    let doc: WorkflowDoc = serde_json::from_value(value)
        .with_context(|| format!("unparsable workflow definition: {}", relative_path))?;
    Ok(build_workflow(relative_path, &doc))
}

fn build_workflow(relative_path: &str, doc: &WorkflowDoc) -> CatalogWorkflow {
    let nodes: &[NodeDoc] = &doc.nodes;

    let name = doc
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| filename_stem(relative_path));

    // Raw node types, non-empty only, first-seen order.
    let mut node_types: Vec<String> = Vec::new();
    for node in nodes {
        if let Some(node_type) = node.node_type.as_deref() {
            if !node_type.is_empty() && !node_types.iter().any(|seen| seen == node_type) {
                node_types.push(node_type.to_string());
            }
        }
    }

    let mut tags: Vec<String> = Vec::new();
    for raw in &node_types {
        let tag = normalize_tag(raw);
        if tag.is_empty() || NOISE_TAGS.contains(&tag.as_str()) {
            continue;
        }
        if tags.iter().any(|seen| seen == &tag) {
            continue;
        }
        tags.push(tag);
        if tags.len() == MAX_TAGS {
            break;
        }
    }

    let mut credential_set: BTreeSet<String> = BTreeSet::new();
    for node in nodes {
        for key in node.credentials.keys() {
            credential_set.insert(key.clone());
        }
    }
    let credentials: Vec<String> = credential_set.into_iter().collect();

    let node_count = nodes.len();
    let complexity = Complexity::from_node_count(node_count);

    let timezone = doc
        .settings
        .as_ref()
        .and_then(|s| s.timezone.as_ref())
        .and_then(Value::as_str);
    let description = match timezone {
        Some(tz) => format!("Timezone: {}.", tz),
        None => {
            let joined = if tags.is_empty() {
                "n8n".to_string()
            } else {
                tags.iter()
                    .take(DESCRIPTION_TAGS)
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            format!("Auto-extracted integrations: {}.", joined)
        }
    };

    let search_tokens = tokens::build_search_tokens(&search_fields(
        relative_path,
        &name,
        &tags,
        &credentials,
        &node_types,
        nodes,
    ));

    CatalogWorkflow {
        id: ids::encode_workflow_id(relative_path),
        relative_path: relative_path.to_string(),
        name,
        description,
        tags,
        search_tokens,
        complexity,
        credentials,
        node_types,
        node_count,
    }
}

/// Collects every text field that feeds the token indexer, in contribution
/// order. Field order matters: it fixes the first-seen tiebreak for tokens
/// with equal frequency.
fn search_fields(
    relative_path: &str,
    name: &str,
    tags: &[String],
    credentials: &[String],
    node_types: &[String],
    nodes: &[NodeDoc],
) -> Vec<String> {
    let mut fields: Vec<String> = Vec::new();
    fields.push(relative_path.to_string());
    fields.push(name.to_string());
    if !tags.is_empty() {
        fields.push(tags.join(" "));
    }
    if !credentials.is_empty() {
        fields.push(credentials.join(" "));
    }
    if !node_types.is_empty() {
        fields.push(node_types.join(" "));
    }
    for node in nodes {
        if let Some(node_name) = &node.name {
            fields.push(node_name.clone());
        }
        if let Some(notes) = &node.notes {
            fields.push(notes.clone());
        }
        if is_sticky_note(node) {
            let text = node
                .parameters
                .get("content")
                .and_then(Value::as_str)
                .or_else(|| node.parameters.get("text").and_then(Value::as_str));
            if let Some(text) = text {
                fields.push(text.to_string());
            }
        }
    }
    for node in nodes {
        if let Some(url) = node.parameters.get("url").and_then(Value::as_str) {
            fields.push(url.to_string());
        }
    }
    for node in nodes {
        for credential in node.credentials.values() {
            if let Some(credential_name) = &credential.name {
                fields.push(credential_name.clone());
            }
        }
    }
    fields
}

fn is_sticky_note(node: &NodeDoc) -> bool {
    node.node_type
        .as_deref()
        .map(|t| t.to_lowercase().contains("stickynote"))
        .unwrap_or(false)
}

/// Turns a raw node type into a human-readable tag: strip the vendor prefix,
/// split camelCase into words, replace `-`/`_` with spaces, take the last
/// `.`-delimited segment, lowercase.
pub fn normalize_tag(node_type: &str) -> String {
    let mut rest = node_type;
    for prefix in VENDOR_PREFIXES {
        if let Some(stripped) = rest.strip_prefix(prefix) {
            rest = stripped;
            break;
        }
    }

    let mut spaced = String::with_capacity(rest.len() + 4);
    let mut prev_lower = false;
    for c in rest.chars() {
        if prev_lower && c.is_uppercase() {
            spaced.push(' ');
        }
        match c {
            '-' | '_' => spaced.push(' '),
            _ => spaced.push(c),
        }
        prev_lower = c.is_lowercase();
    }

    let trimmed = spaced.trim();
    let segment = trimmed.rsplit('.').next().unwrap_or(trimmed);
    segment.trim().to_lowercase()
}

fn filename_stem(relative_path: &str) -> String {
    Path::new(relative_path)
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| relative_path.to_string())
}

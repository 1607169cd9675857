//! # Flow Catalog
//!
//! An indexing and search engine for a directory tree of n8n-style workflow
//! JSON files.
//!
//! Flow Catalog crawls a corpus of automation workflow definitions, extracts
//! metadata defensively (malformed files are skipped, never fatal), holds the
//! result as an immutable in-memory snapshot, and answers ranked keyword
//! queries and install-plan requests via a CLI and a JSON HTTP server.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────────┐   ┌──────────────┐
//! │  Corpus  │──▶│ Crawl+Extract │──▶│   Snapshot   │
//! │  *.json  │   │  (parallel)   │   │ (in-memory)  │
//! └──────────┘   └───────────────┘   └──────┬───────┘
//!                                           │
//!                           ┌───────────────┤
//!                           ▼               ▼
//!                     ┌──────────┐    ┌──────────┐
//!                     │   CLI    │    │   HTTP   │
//!                     │(flowcat) │    │  (JSON)  │
//!                     └──────────┘    └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! flowcat index                     # build the catalog, report skips
//! flowcat search "slack message"    # ranked keyword search
//! flowcat show <id>                 # metadata and install plan
//! flowcat serve http                # start the HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`ids`] | Reversible workflow id codec |
//! | [`crawl`] | Deterministic corpus crawler |
//! | [`extract`] | Defensive metadata extraction |
//! | [`tokens`] | Text normalization and search tokens |
//! | [`catalog`] | Snapshot build and caching service |
//! | [`search`] | Ranked keyword search |
//! | [`plan`] | Install plan derivation |
//! | [`get`] | Workflow retrieval commands |
//! | [`stats`] | Corpus statistics |
//! | [`server`] | JSON HTTP API |

pub mod catalog;
pub mod config;
pub mod crawl;
pub mod extract;
pub mod get;
pub mod ids;
pub mod models;
pub mod plan;
pub mod search;
pub mod server;
pub mod stats;
pub mod tokens;

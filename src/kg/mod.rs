//! Knowledge Graph Search API: HTTP client, response model, and the
//! label/relation lookups built on top of the search call.
//!
//! Every lookup is a full-text search followed by filtering. The API exposes
//! no directed edges, so "relations" are the `detailedDescription.articleBody`
//! snippets of the returned results.

mod client;
pub mod relations;

pub use client::KgSearchClient;
pub use relations::{
    execute_sparql, get_entity_labels, get_freebase_mid_from_wiki_id, get_in_relations,
    get_label, get_one_hop_relations, get_out_relations, get_two_hop_relations,
    get_two_hop_relations_concurrent,
};

use std::collections::BTreeSet;
use std::future::Future;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::{KgError, Result};

/// Public entity-search endpoint of the Google Knowledge Graph Search API.
pub const DEFAULT_ENDPOINT: &str = "https://kgsearch.googleapis.com/v1/entities:search";

/// Result count requested when the caller does not pick one.
pub const DEFAULT_LIMIT: usize = 10;

/// Unique relation snippets, iterated in lexicographic order.
pub type RelationSet = BTreeSet<String>;

/// Anything that can answer a free-text entity search with the raw JSON body.
///
/// [`KgSearchClient`] talks to the real endpoint; tests plug in canned responses.
pub trait SearchBackend {
    fn search(&self, query: &str, limit: usize) -> impl Future<Output = Result<JsonValue>> + Send;

    fn default_limit(&self) -> usize {
        DEFAULT_LIMIT
    }
}

/// Top-level search response. Only `itemListElement` is interpreted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(rename = "itemListElement", default)]
    pub items: Vec<SearchItem>,
}

impl SearchResponse {
    /// Interpret a raw search body. Missing fields are treated as absent.
    pub fn from_value(value: JsonValue) -> Result<Self> {
        serde_json::from_value(value)
            .map_err(|e| KgError::Decode(format!("Unexpected search response shape: {}", e)))
    }
}

/// One element of `itemListElement`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchItem {
    #[serde(default)]
    pub result: EntityResult,
    #[serde(rename = "resultScore", default, skip_serializing_if = "Option::is_none")]
    pub result_score: Option<f64>,
}

/// The entity payload of a search item.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityResult {
    /// Entity identifier, e.g. `kg:/m/0dl567`.
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "detailedDescription", default, skip_serializing_if = "Option::is_none")]
    pub detailed_description: Option<DetailedDescription>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetailedDescription {
    #[serde(rename = "articleBody", default, skip_serializing_if = "Option::is_none")]
    pub article_body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

//! Label and relation lookups over a [`SearchBackend`].
//!
//! All of these are post-processing over repeated search calls. Two quirks of
//! the search API carry through unchanged:
//!
//! - in- and out-relations are read from the same field, so both return the
//!   same set;
//! - the 2-hop lookup re-queries with each 1-hop snippet as if it were an
//!   entity identifier, even though snippets are prose.

use std::collections::BTreeMap;

use futures_util::stream::{self, StreamExt};
use serde_json::Value as JsonValue;

use super::{RelationSet, SearchBackend, SearchResponse};
use crate::{KgError, Result};

async fn search_items<B: SearchBackend>(backend: &B, query: &str) -> Result<SearchResponse> {
    let body = backend.search(query, backend.default_limit()).await?;
    let response = SearchResponse::from_value(body)?;
    log::debug!("Search for {:?} returned {} items", query, response.items.len());
    Ok(response)
}

/// Snippets from every result that carries a `detailedDescription`.
/// A description without `articleBody` contributes the empty string.
fn article_bodies(response: SearchResponse) -> RelationSet {
    response
        .items
        .into_iter()
        .filter_map(|item| item.result.detailed_description)
        .map(|description| description.article_body.unwrap_or_default())
        .collect()
}

/// Display name of the first result whose `@id` equals `entity` exactly.
///
/// Returns `Ok(None)` when no result matches.
pub async fn get_label<B: SearchBackend>(backend: &B, entity: &str) -> Result<Option<String>> {
    let response = search_items(backend, entity).await?;
    Ok(response
        .items
        .into_iter()
        .find(|item| item.result.id.as_deref() == Some(entity))
        .and_then(|item| item.result.name))
}

/// Description snippets of the search results for `entity`.
pub async fn get_in_relations<B: SearchBackend>(backend: &B, entity: &str) -> Result<RelationSet> {
    Ok(article_bodies(search_items(backend, entity).await?))
}

/// Description snippets of the search results for `entity`.
///
/// The API has no edge direction, so this is the same lookup as
/// [`get_in_relations`].
pub async fn get_out_relations<B: SearchBackend>(backend: &B, entity: &str) -> Result<RelationSet> {
    Ok(article_bodies(search_items(backend, entity).await?))
}

/// Union of in- and out-relations.
pub async fn get_one_hop_relations<B: SearchBackend>(
    backend: &B,
    entity: &str,
) -> Result<RelationSet> {
    let mut relations = get_in_relations(backend, entity).await?;
    relations.extend(get_out_relations(backend, entity).await?);
    Ok(relations)
}

/// 1-hop relations of `entity`, and the union of the 1-hop relations of each
/// of those, issued one after another.
pub async fn get_two_hop_relations<B: SearchBackend>(
    backend: &B,
    entity: &str,
) -> Result<(RelationSet, RelationSet)> {
    let one_hop = get_one_hop_relations(backend, entity).await?;
    let mut two_hop = RelationSet::new();
    for relation in &one_hop {
        two_hop.extend(get_one_hop_relations(backend, relation).await?);
    }
    log::debug!(
        "2-hop for {:?}: {} one-hop, {} two-hop relations",
        entity,
        one_hop.len(),
        two_hop.len()
    );
    Ok((one_hop, two_hop))
}

/// Same result as [`get_two_hop_relations`], with up to `concurrency` second-hop
/// lookups in flight. `concurrency <= 1` runs sequentially.
pub async fn get_two_hop_relations_concurrent<B: SearchBackend>(
    backend: &B,
    entity: &str,
    concurrency: usize,
) -> Result<(RelationSet, RelationSet)> {
    if concurrency <= 1 {
        return get_two_hop_relations(backend, entity).await;
    }

    let one_hop = get_one_hop_relations(backend, entity).await?;
    let mut two_hop = RelationSet::new();
    {
        let mut lookups = stream::iter(one_hop.iter())
            .map(|relation| get_one_hop_relations(backend, relation))
            .buffer_unordered(concurrency);
        while let Some(relations) = lookups.next().await {
            two_hop.extend(relations?);
        }
    }
    log::debug!(
        "2-hop for {:?} (concurrency {}): {} one-hop, {} two-hop relations",
        entity,
        concurrency,
        one_hop.len(),
        two_hop.len()
    );
    Ok((one_hop, two_hop))
}

/// Label for each entity, one lookup per input element.
pub async fn get_entity_labels<B, S>(
    backend: &B,
    entities: &[S],
) -> Result<BTreeMap<String, Option<String>>>
where
    B: SearchBackend,
    S: AsRef<str>,
{
    let mut labels = BTreeMap::new();
    for entity in entities {
        let entity = entity.as_ref();
        let label = get_label(backend, entity).await?;
        labels.insert(entity.to_string(), label);
    }
    Ok(labels)
}

/// First non-empty `@id` returned when searching for a numeric Wikipedia page id.
///
/// Returns an empty string when no result carries one.
pub async fn get_freebase_mid_from_wiki_id<B: SearchBackend>(
    backend: &B,
    wiki_id: u64,
) -> Result<String> {
    let response = search_items(backend, &wiki_id.to_string()).await?;
    Ok(response
        .items
        .into_iter()
        .filter_map(|item| item.result.id)
        .find(|id| !id.is_empty())
        .unwrap_or_default())
}

/// SPARQL is not available through entity search. Always fails.
pub fn execute_sparql<B: SearchBackend>(_backend: &B, query: &str) -> Result<JsonValue> {
    log::debug!("Rejecting SPARQL query ({} bytes)", query.len());
    Err(KgError::Unsupported(
        "the Knowledge Graph Search API does not execute SPARQL queries; \
         query logic must be redesigned around entity search"
            .to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Canned responses keyed by query text; unknown queries get an empty list.
    #[derive(Default)]
    struct FakeBackend {
        responses: HashMap<String, JsonValue>,
        queries: Mutex<Vec<String>>,
    }

    impl FakeBackend {
        fn with(mut self, query: &str, response: JsonValue) -> Self {
            self.responses.insert(query.to_string(), response);
            self
        }

        fn queries(&self) -> Vec<String> {
            self.queries.lock().unwrap().clone()
        }
    }

    impl SearchBackend for FakeBackend {
        async fn search(&self, query: &str, _limit: usize) -> Result<JsonValue> {
            self.queries.lock().unwrap().push(query.to_string());
            Ok(self
                .responses
                .get(query)
                .cloned()
                .unwrap_or_else(|| json!({"itemListElement": []})))
        }
    }

    fn item(id: &str, name: &str, body: Option<&str>) -> JsonValue {
        let mut result = json!({"@id": id, "name": name});
        if let Some(body) = body {
            result["detailedDescription"] = json!({"articleBody": body});
        }
        json!({"@type": "EntitySearchResult", "result": result})
    }

    fn taylor_swift() -> FakeBackend {
        FakeBackend::default().with(
            "Taylor Swift",
            json!({"itemListElement": [
                item("kg:/m/0dl567", "Taylor Swift", Some("American singer-songwriter."))
            ]}),
        )
    }

    /// A -> {a1, a2}; a1 -> {b1}; a2 -> {b1, b2}
    fn chained() -> FakeBackend {
        FakeBackend::default()
            .with(
                "A",
                json!({"itemListElement": [
                    item("kg:/m/a", "A", Some("a1")),
                    item("kg:/m/a2", "A2", Some("a2")),
                    item("kg:/m/a3", "A3", Some("a1")),
                ]}),
            )
            .with("a1", json!({"itemListElement": [item("kg:/m/b1", "B1", Some("b1"))]}))
            .with(
                "a2",
                json!({"itemListElement": [
                    item("kg:/m/b1", "B1", Some("b1")),
                    item("kg:/m/b2", "B2", Some("b2")),
                ]}),
            )
    }

    fn set(items: &[&str]) -> RelationSet {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_label_exact_id_match() {
        let backend = FakeBackend::default().with(
            "kg:/m/0dl567",
            json!({"itemListElement": [
                item("kg:/m/other", "Someone Else", None),
                item("kg:/m/0dl567", "Taylor Swift", None),
            ]}),
        );
        let label = get_label(&backend, "kg:/m/0dl567").await.unwrap();
        assert_eq!(label.as_deref(), Some("Taylor Swift"));
    }

    #[tokio::test]
    async fn test_label_absent_when_no_id_matches() {
        // Searching by name returns results, but none has the name as its @id
        let backend = taylor_swift();
        assert_eq!(get_label(&backend, "Taylor Swift").await.unwrap(), None);
        assert_eq!(get_label(&backend, "nobody").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_in_and_out_relations_identical() {
        let backend = taylor_swift();
        let in_relations = get_in_relations(&backend, "Taylor Swift").await.unwrap();
        let out_relations = get_out_relations(&backend, "Taylor Swift").await.unwrap();
        assert_eq!(in_relations, set(&["American singer-songwriter."]));
        assert_eq!(in_relations, out_relations);
    }

    #[tokio::test]
    async fn test_relations_deduplicated_and_skip_missing_description() {
        let backend = FakeBackend::default().with(
            "X",
            json!({"itemListElement": [
                item("kg:/m/1", "One", Some("same")),
                item("kg:/m/2", "Two", Some("same")),
                item("kg:/m/3", "Three", None),
                {"result": {"@id": "kg:/m/4", "detailedDescription": {"url": "https://example.com"}}},
            ]}),
        );
        let relations = get_in_relations(&backend, "X").await.unwrap();
        // description without articleBody contributes ""
        assert_eq!(relations, set(&["", "same"]));
    }

    #[tokio::test]
    async fn test_one_hop_is_union_of_in_and_out() {
        let backend = chained();
        let in_relations = get_in_relations(&backend, "A").await.unwrap();
        let out_relations = get_out_relations(&backend, "A").await.unwrap();
        let one_hop = get_one_hop_relations(&backend, "A").await.unwrap();
        let union: RelationSet = in_relations.union(&out_relations).cloned().collect();
        assert_eq!(one_hop, union);
        assert_eq!(one_hop, set(&["a1", "a2"]));
    }

    #[tokio::test]
    async fn test_two_hop_requeries_each_snippet() {
        let backend = chained();
        let (one_hop, two_hop) = get_two_hop_relations(&backend, "A").await.unwrap();
        assert_eq!(one_hop, get_one_hop_relations(&backend, "A").await.unwrap());

        let mut expected = RelationSet::new();
        for relation in &one_hop {
            expected.extend(get_one_hop_relations(&backend, relation).await.unwrap());
        }
        assert_eq!(two_hop, expected);
        assert_eq!(two_hop, set(&["b1", "b2"]));

        let queries = backend.queries();
        assert!(queries.iter().any(|q| q == "a1"));
        assert!(queries.iter().any(|q| q == "a2"));
    }

    #[tokio::test]
    async fn test_two_hop_query_count() {
        let backend = chained();
        get_two_hop_relations(&backend, "A").await.unwrap();
        // 2 searches for the 1-hop, then 2 per distinct snippet
        assert_eq!(backend.queries().len(), 2 + 2 * 2);
    }

    #[tokio::test]
    async fn test_two_hop_concurrent_matches_sequential() {
        let backend = chained();
        let sequential = get_two_hop_relations(&backend, "A").await.unwrap();
        let concurrent = get_two_hop_relations_concurrent(&backend, "A", 4).await.unwrap();
        assert_eq!(sequential, concurrent);
        let degraded = get_two_hop_relations_concurrent(&backend, "A", 0).await.unwrap();
        assert_eq!(sequential, degraded);
    }

    #[tokio::test]
    async fn test_two_hop_without_relations() {
        let backend = FakeBackend::default();
        let (one_hop, two_hop) = get_two_hop_relations(&backend, "unknown").await.unwrap();
        assert!(one_hop.is_empty());
        assert!(two_hop.is_empty());
    }

    #[tokio::test]
    async fn test_entity_labels_keys_and_no_call_dedup() {
        let backend = FakeBackend::default()
            .with("kg:/m/1", json!({"itemListElement": [item("kg:/m/1", "One", None)]}))
            .with("kg:/m/2", json!({"itemListElement": [item("kg:/m/2", "Two", None)]}));
        let entities = ["kg:/m/1", "kg:/m/2", "kg:/m/3", "kg:/m/1"];
        let labels = get_entity_labels(&backend, &entities[..]).await.unwrap();

        assert_eq!(labels.len(), 3);
        assert_eq!(labels["kg:/m/1"].as_deref(), Some("One"));
        assert_eq!(labels["kg:/m/2"].as_deref(), Some("Two"));
        assert_eq!(labels["kg:/m/3"], None);
        assert_eq!(backend.queries().len(), 4);
    }

    #[tokio::test]
    async fn test_freebase_mid_first_non_empty_id() {
        let backend = FakeBackend::default().with(
            "39027",
            json!({"itemListElement": [
                {"result": {"name": "no id"}},
                {"result": {"@id": ""}},
                item("kg:/m/0d06m5", "Hillary Clinton", None),
                item("kg:/m/other", "Other", None),
            ]}),
        );
        let mid = get_freebase_mid_from_wiki_id(&backend, 39027).await.unwrap();
        assert_eq!(mid, "kg:/m/0d06m5");
        assert_eq!(backend.queries(), vec!["39027".to_string()]);
    }

    #[tokio::test]
    async fn test_freebase_mid_empty_when_not_found() {
        let backend = FakeBackend::default();
        assert_eq!(get_freebase_mid_from_wiki_id(&backend, 1).await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_search_errors_propagate() {
        struct FailingBackend;
        impl SearchBackend for FailingBackend {
            async fn search(&self, _query: &str, _limit: usize) -> Result<JsonValue> {
                Err(KgError::Api {
                    status: 500,
                    body: "backend down".to_string(),
                })
            }
        }
        let err = get_two_hop_relations(&FailingBackend, "A").await.unwrap_err();
        assert!(matches!(err, KgError::Api { status: 500, .. }));
    }

    #[test]
    fn test_execute_sparql_always_unsupported() {
        let backend = FakeBackend::default();
        for query in ["", "SELECT ?x WHERE { ?x ?p ?o }", "ASK {}"] {
            let err = execute_sparql(&backend, query).unwrap_err();
            assert!(matches!(err, KgError::Unsupported(_)));
            assert!(err.to_string().contains("SPARQL"));
        }
        assert!(backend.queries().is_empty());
    }
}

//! Resolution and merge engine.
//!
//! Loads a parsed [`Subgraph`] into a [`StorageBackend`]:
//!
//! 1. every node is resolved to a backend node, either by creating one or,
//!    for hooked nodes, by matching an existing one on the hook label and
//!    keys;
//! 2. labels and non-null properties are merged onto each resolved node;
//! 3. relationships are created between resolved endpoints, in declaration
//!    order.
//!
//! Nodes are resolved in declaration order, so a hooked node can match a
//! node created earlier in the same document. All nodes are resolved before
//! the first relationship is written.

use std::collections::HashMap;
use std::time::Instant;

use hashbrown::HashSet;
use serde::{Deserialize, Serialize};

use crate::model::property_map::writable;
use crate::model::*;
use crate::storage::StorageBackend;
use crate::{Error, Result};

// ============================================================================
// Load configuration
// ============================================================================

/// What to do with a relationship whose endpoint is an optional hook that
/// matched nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointPolicy {
    /// Drop the relationship silently.
    #[default]
    Skip,
    /// Fail the load with [`Error::UnresolvedEndpoint`].
    Error,
}

/// Loader settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    pub unresolved_endpoints: EndpointPolicy,
}

impl LoadConfig {
    /// Parse a JSON configuration, e.g. `{"unresolved_endpoints": "error"}`.
    /// Missing fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }
}

// ============================================================================
// Results
// ============================================================================

/// Load statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadStats {
    pub nodes_created: u64,
    pub nodes_matched: u64,
    /// Optional hooks that matched nothing.
    pub nodes_skipped: u64,
    pub relationships_created: u64,
    pub relationships_skipped: u64,
    pub labels_added: u64,
    pub properties_set: u64,
    pub elapsed_ms: u64,
}

/// Outcome of a load: backend ids of the explicitly named nodes, plus stats.
///
/// Unnamed nodes and nodes whose optional hook matched nothing never appear
/// in `nodes`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadResult {
    pub nodes: HashMap<String, NodeId>,
    pub stats: LoadStats,
}

impl LoadResult {
    pub fn get(&self, name: &str) -> Option<NodeId> {
        self.nodes.get(name).copied()
    }
}

/// How a single node was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Created(NodeId),
    Matched(NodeId),
    /// Optional hook without a match: no backend node.
    Skipped,
}

impl Resolution {
    pub fn node_id(self) -> Option<NodeId> {
        match self {
            Resolution::Created(id) | Resolution::Matched(id) => Some(id),
            Resolution::Skipped => None,
        }
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Load `subgraph` into `backend` inside the caller's transaction.
pub async fn load<B: StorageBackend>(
    backend: &B,
    tx: &mut B::Tx,
    subgraph: &Subgraph,
    config: &LoadConfig,
) -> Result<LoadResult> {
    tracing::info!(
        nodes = subgraph.order(),
        relationships = subgraph.size(),
        "Loading subgraph"
    );
    let t0 = Instant::now();
    let mut result = LoadResult::default();
    let mut resolved: HashMap<&str, Option<NodeId>> = HashMap::with_capacity(subgraph.order());

    for node in subgraph.nodes() {
        let resolution = resolve_node(backend, tx, node).await?;
        match resolution {
            Resolution::Created(id) => {
                result.stats.nodes_created += 1;
                tracing::debug!(node = node.name(), %id, "created node");
            }
            Resolution::Matched(id) => {
                result.stats.nodes_matched += 1;
                tracing::debug!(node = node.name(), %id, "matched node");
            }
            Resolution::Skipped => {
                result.stats.nodes_skipped += 1;
                tracing::debug!(node = node.name(), "optional hook matched nothing");
            }
        }

        let target = resolution.node_id();
        if let Some(id) = target {
            merge_into(backend, tx, id, node, &mut result.stats).await?;
            if node.is_named() {
                result.nodes.insert(node.name().to_owned(), id);
            }
        }
        resolved.insert(node.name(), target);
    }

    for rel in subgraph.relationships() {
        let start = endpoint(&resolved, &rel.start)?;
        let end = endpoint(&resolved, &rel.end)?;
        let (Some(start), Some(end)) = (start, end) else {
            let missing = if start.is_none() { &rel.start } else { &rel.end };
            match config.unresolved_endpoints {
                EndpointPolicy::Skip => {
                    result.stats.relationships_skipped += 1;
                    tracing::debug!(rel_type = %rel.rel_type, node = %missing, "dropped relationship to unresolved node");
                    continue;
                }
                EndpointPolicy::Error => {
                    return Err(Error::UnresolvedEndpoint {
                        node: missing.clone(),
                        relationship: rel.rel_type.clone(),
                    });
                }
            }
        };

        let id = backend.create_relationship(tx, start, end, &rel.rel_type).await?;
        for (key, value) in writable(&rel.properties) {
            backend.set_relationship_property(tx, id, key, value.clone()).await?;
            result.stats.properties_set += 1;
        }
        result.stats.relationships_created += 1;
    }

    result.stats.elapsed_ms = t0.elapsed().as_millis() as u64;
    tracing::info!(
        nodes = subgraph.order(),
        relationships = subgraph.size(),
        elapsed_ms = result.stats.elapsed_ms,
        "Loaded subgraph"
    );
    Ok(result)
}

/// Resolved id for a relationship endpoint. `Ok(None)` means the node exists
/// in the document but resolved to nothing.
fn endpoint(resolved: &HashMap<&str, Option<NodeId>>, name: &str) -> Result<Option<NodeId>> {
    resolved
        .get(name)
        .copied()
        .ok_or_else(|| Error::NotFound(format!("relationship endpoint '{name}' is not a node of the subgraph")))
}

/// Decide which backend node `node` refers to, creating one when required.
pub async fn resolve_node<B: StorageBackend>(
    backend: &B,
    tx: &mut B::Tx,
    node: &AbstractNode,
) -> Result<Resolution> {
    let Some(hook) = &node.hook else {
        return Ok(Resolution::Created(backend.create_node(tx).await?));
    };

    let candidates = find_hook_matches(backend, tx, node, hook).await?;
    if let Some(id) = candidates.iter().min().copied() {
        if candidates.len() > 1 {
            tracing::warn!(
                node = node.name(),
                label = %hook.label,
                candidates = candidates.len(),
                %id,
                "hook matched several nodes, picking one"
            );
        }
        return Ok(Resolution::Matched(id));
    }
    if hook.optional {
        Ok(Resolution::Skipped)
    } else {
        Ok(Resolution::Created(backend.create_node(tx).await?))
    }
}

/// Backend nodes carrying the hook label whose value for every hook key equals
/// the node's value for that key. A key the node has no value for matches
/// backend nodes without that key.
pub async fn find_hook_matches<B: StorageBackend>(
    backend: &B,
    tx: &B::Tx,
    node: &AbstractNode,
    hook: &Hook,
) -> Result<HashSet<NodeId>> {
    let absent = Value::Null;
    let mut candidates: Option<HashSet<NodeId>> = None;

    for key in &hook.keys {
        let value = node.get(key).unwrap_or(&absent);
        let found = backend.find_nodes(tx, &hook.label, key, value).await?;
        tracing::trace!(label = %hook.label, key = %key, found = found.len(), "hook lookup");

        let narrowed = match candidates {
            None => found,
            Some(current) => current.intersection(&found).copied().collect(),
        };
        let exhausted = narrowed.is_empty();
        candidates = Some(narrowed);
        if exhausted {
            break;
        }
    }

    Ok(candidates.unwrap_or_default())
}

/// Apply the node's labels and non-null properties to a backend node.
async fn merge_into<B: StorageBackend>(
    backend: &B,
    tx: &mut B::Tx,
    id: NodeId,
    node: &AbstractNode,
    stats: &mut LoadStats,
) -> Result<()> {
    for label in &node.labels {
        backend.add_label(tx, id, label).await?;
        stats.labels_added += 1;
    }
    for (key, value) in writable(&node.properties) {
        backend.set_node_property(tx, id, key, value.clone()).await?;
        stats.properties_set += 1;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geoff;
    use crate::storage::MemoryBackend;
    use crate::tx::TxMode;

    fn person(name: &str, age: i64) -> PropertyMap {
        PropertyMap::from([
            ("name".to_string(), Value::from(name)),
            ("age".to_string(), Value::Int(age)),
        ])
    }

    #[test]
    fn test_config_from_json() {
        let config = LoadConfig::from_json(r#"{"unresolved_endpoints": "error"}"#).unwrap();
        assert_eq!(config.unresolved_endpoints, EndpointPolicy::Error);
        assert_eq!(LoadConfig::from_json("{}").unwrap(), LoadConfig::default());
        assert!(matches!(LoadConfig::from_json("{\"unresolved_endpoints\": 3}"), Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_unhooked_nodes_always_created() {
        let db = MemoryBackend::new();
        let mut tx = db.begin_tx(TxMode::ReadWrite).await.unwrap();
        let g = geoff::parse(r#"(a:Person {name:"Alice"}) (b:Person {name:"Alice"})"#).unwrap();

        let result = load(&db, &mut tx, &g, &LoadConfig::default()).await.unwrap();
        assert_eq!(result.stats.nodes_created, 2);
        assert_ne!(result.get("a"), result.get("b"));
        assert_eq!(db.node_count(&tx).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_hook_intersects_all_keys() {
        let db = MemoryBackend::new();
        let ingrid10 = db.insert_node(&["Person"], person("Ingrid", 10));
        let ingrid20 = db.insert_node(&["Person"], person("Ingrid", 20));
        db.insert_node(&["Person"], person("Ingrid", 30));
        let mut tx = db.begin_tx(TxMode::ReadWrite).await.unwrap();

        let node = AbstractNode::named("p")
            .with_property("name", "Ingrid")
            .with_property("age", 10)
            .with_hook("Person", ["name", "age"], false);
        let hook = node.hook.clone().unwrap();

        let matches = find_hook_matches(&db, &tx, &node, &hook).await.unwrap();
        assert_eq!(matches.len(), 1);
        assert!(matches.contains(&ingrid10));
        assert!(!matches.contains(&ingrid20));

        assert_eq!(resolve_node(&db, &mut tx, &node).await.unwrap(), Resolution::Matched(ingrid10));
    }

    #[tokio::test]
    async fn test_required_hook_creates_when_unmatched() {
        let db = MemoryBackend::new();
        db.insert_node(&["Person"], person("Ingrid", 10));
        let mut tx = db.begin_tx(TxMode::ReadWrite).await.unwrap();

        let node = AbstractNode::named("p")
            .with_property("name", "Ingrid")
            .with_property("age", 99)
            .with_hook("Person", ["name", "age"], false);
        let resolution = resolve_node(&db, &mut tx, &node).await.unwrap();
        assert!(matches!(resolution, Resolution::Created(_)));
        assert_eq!(db.node_count(&tx).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_optional_hook_skips_when_unmatched() {
        let db = MemoryBackend::new();
        let mut tx = db.begin_tx(TxMode::ReadWrite).await.unwrap();

        let node = AbstractNode::named("p")
            .with_property("name", "Nobody")
            .with_hook("Person", ["name"], true);
        assert_eq!(resolve_node(&db, &mut tx, &node).await.unwrap(), Resolution::Skipped);
        assert_eq!(db.node_count(&tx).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_hook_key_matches_absent_and_is_not_written() {
        let db = MemoryBackend::new();
        let existing = db.insert_node(&["Person"], PropertyMap::from([
            ("name".to_string(), Value::from("Ingrid")),
        ]));
        let mut tx = db.begin_tx(TxMode::ReadWrite).await.unwrap();

        let g = geoff::parse(r#":Person:name:email:=>(p {name:"Ingrid"})"#).unwrap();
        let result = load(&db, &mut tx, &g, &LoadConfig::default()).await.unwrap();
        assert_eq!(result.get("p"), Some(existing));

        let stored = db.get_node(&tx, existing).await.unwrap().unwrap();
        assert!(stored.get("email").is_none());
    }

    #[tokio::test]
    async fn test_null_does_not_clear_stored_value() {
        let db = MemoryBackend::new();
        let existing = db.insert_node(&["Person"], person("Ingrid", 10));
        let mut tx = db.begin_tx(TxMode::ReadWrite).await.unwrap();

        let g = geoff::parse(r#":Person:name:=>(p {name:"Ingrid", age:null, city:"Oslo"})"#).unwrap();
        load(&db, &mut tx, &g, &LoadConfig::default()).await.unwrap();

        let stored = db.get_node(&tx, existing).await.unwrap().unwrap();
        assert_eq!(stored.get("age"), Some(&Value::Int(10)));
        assert_eq!(stored.get("city"), Some(&Value::from("Oslo")));
    }

    #[tokio::test]
    async fn test_ambiguous_hook_picks_one_candidate() {
        let db = MemoryBackend::new();
        let a = db.insert_node(&["Person"], person("Ingrid", 10));
        let b = db.insert_node(&["Person"], person("Ingrid", 20));
        let mut tx = db.begin_tx(TxMode::ReadWrite).await.unwrap();

        let node = AbstractNode::named("p")
            .with_property("name", "Ingrid")
            .with_hook("Person", ["name"], false);
        let id = resolve_node(&db, &mut tx, &node).await.unwrap().node_id().unwrap();
        assert!(id == a || id == b);
        assert_eq!(db.node_count(&tx).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_relationship_to_skipped_node_is_dropped() {
        let db = MemoryBackend::new();
        let mut tx = db.begin_tx(TxMode::ReadWrite).await.unwrap();

        let g = geoff::parse(r#"
            (a {name:"A"})-[:KNOWS]->(b)
            :Person:name:=>?(b {name:"ghost"})
        "#).unwrap();
        let result = load(&db, &mut tx, &g, &LoadConfig::default()).await.unwrap();

        assert!(result.get("a").is_some());
        assert!(result.get("b").is_none());
        assert_eq!(result.stats.relationships_skipped, 1);
        assert_eq!(db.relationship_count(&tx).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_strict_endpoint_policy() {
        let db = MemoryBackend::new();
        let mut tx = db.begin_tx(TxMode::ReadWrite).await.unwrap();

        let g = geoff::parse(r#"(a)-[:KNOWS]->(b) :Person:name:=>?(b {name:"ghost"})"#).unwrap();
        let config = LoadConfig { unresolved_endpoints: EndpointPolicy::Error };
        let err = load(&db, &mut tx, &g, &config).await.unwrap_err();
        assert!(matches!(err, Error::UnresolvedEndpoint { ref node, .. } if node == "b"));
    }

    #[tokio::test]
    async fn test_relationship_to_unknown_node() {
        let db = MemoryBackend::new();
        let mut tx = db.begin_tx(TxMode::ReadWrite).await.unwrap();

        let mut g = Subgraph::new();
        g.merge_node(AbstractNode::named("a"));
        g.add_relationship(AbstractRelationship::new("a", "KNOWS", "zed"));
        let err = load(&db, &mut tx, &g, &LoadConfig::default()).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_relationship_properties_skip_null() {
        let db = MemoryBackend::new();
        let mut tx = db.begin_tx(TxMode::ReadWrite).await.unwrap();

        let g = geoff::parse("(a)-[:KNOWS {since:1999, until:null}]->(b)").unwrap();
        let result = load(&db, &mut tx, &g, &LoadConfig::default()).await.unwrap();
        assert_eq!(result.stats.relationships_created, 1);

        let rels = db.all_relationships(&tx).await.unwrap();
        assert_eq!(rels[0].get("since"), Some(&Value::Int(1999)));
        assert!(rels[0].get("until").is_none());
        assert_eq!(rels[0].src, result.get("a").unwrap());
        assert_eq!(rels[0].dst, result.get("b").unwrap());
    }

    #[tokio::test]
    async fn test_unnamed_nodes_not_returned() {
        let db = MemoryBackend::new();
        let mut tx = db.begin_tx(TxMode::ReadWrite).await.unwrap();

        let g = geoff::parse("(a)-[:X]->(:Thing)").unwrap();
        let result = load(&db, &mut tx, &g, &LoadConfig::default()).await.unwrap();
        assert_eq!(result.nodes.len(), 1);
        assert_eq!(db.node_count(&tx).await.unwrap(), 2);
        assert_eq!(db.relationship_count(&tx).await.unwrap(), 1);
    }
}

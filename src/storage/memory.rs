//! In-memory storage backend.
//!
//! This is the reference implementation of `StorageBackend`.
//! It uses simple HashMaps protected by RwLock.
//!
//! ## Limitations
//!
//! - **No real transactions**: `commit_tx()` and `rollback_tx()` are no-ops.
//!   Writes are applied immediately. Rollback does NOT undo mutations.
//! - **No property indexes**: `find_nodes()` scans every node carrying the
//!   label. Only the label index is maintained.
//!
//! Use this backend for:
//! - Testing the reader and loader end to end
//! - Embedding the loader in applications that don't need persistence

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use hashbrown::HashSet;
use parking_lot::RwLock;

use crate::model::*;
use crate::tx::{Transaction, TxMode, TxId};
use crate::{Error, Result};
use super::StorageBackend;

// ============================================================================
// MemoryBackend
// ============================================================================

/// In-memory property graph storage.
#[derive(Clone)]
pub struct MemoryBackend {
    inner: Arc<MemoryInner>,
}

struct MemoryInner {
    nodes: RwLock<HashMap<NodeId, Node>>,
    relationships: RwLock<HashMap<RelId, Relationship>>,
    /// label → node IDs (poor man's label index)
    label_index: RwLock<HashMap<String, Vec<NodeId>>>,
    next_node_id: AtomicU64,
    next_rel_id: AtomicU64,
    next_tx_id: AtomicU64,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MemoryInner {
                nodes: RwLock::new(HashMap::new()),
                relationships: RwLock::new(HashMap::new()),
                label_index: RwLock::new(HashMap::new()),
                next_node_id: AtomicU64::new(1),
                next_rel_id: AtomicU64::new(1),
                next_tx_id: AtomicU64::new(1),
            }),
        }
    }

    /// Insert a fully formed node outside any transaction. Used to seed a
    /// store with pre-existing data.
    pub fn insert_node(&self, labels: &[&str], props: PropertyMap) -> NodeId {
        let id = NodeId(self.inner.next_node_id.fetch_add(1, Ordering::Relaxed));
        let node = Node {
            id,
            labels: labels.iter().map(|l| l.to_string()).collect(),
            properties: props,
        };

        {
            let mut idx = self.inner.label_index.write();
            for label in &node.labels {
                idx.entry(label.clone()).or_default().push(id);
            }
        }

        self.inner.nodes.write().insert(id, node);
        id
    }
}

// ============================================================================
// MemoryTx
// ============================================================================

/// In-memory transaction (a marker; there is no MVCC).
pub struct MemoryTx {
    id: TxId,
    mode: TxMode,
}

impl Transaction for MemoryTx {
    fn mode(&self) -> TxMode { self.mode }
    fn id(&self) -> TxId { self.id }
}

fn require_writable(tx: &MemoryTx) -> Result<()> {
    if tx.is_writable() {
        Ok(())
    } else {
        Err(Error::StorageError(format!("transaction {} is read-only", tx.id.0)))
    }
}

fn require_non_null(key: &str, val: &Value) -> Result<()> {
    if val.is_null() {
        Err(Error::StorageError(format!("cannot store null for property '{key}'")))
    } else {
        Ok(())
    }
}

// ============================================================================
// StorageBackend impl
// ============================================================================

#[async_trait]
impl StorageBackend for MemoryBackend {
    type Tx = MemoryTx;

    async fn begin_tx(&self, mode: TxMode) -> Result<MemoryTx> {
        let id = TxId(self.inner.next_tx_id.fetch_add(1, Ordering::Relaxed));
        Ok(MemoryTx { id, mode })
    }

    /// No-op: memory backend applies writes immediately, not on commit.
    async fn commit_tx(&self, _tx: MemoryTx) -> Result<()> { Ok(()) }

    /// WARNING: No-op. Memory backend has no write-ahead log.
    /// Mutations applied during this transaction are NOT reverted.
    async fn rollback_tx(&self, _tx: MemoryTx) -> Result<()> { Ok(()) }

    // ========================================================================
    // Lookup
    // ========================================================================

    async fn find_nodes(
        &self,
        _tx: &MemoryTx,
        label: &str,
        key: &str,
        value: &Value,
    ) -> Result<HashSet<NodeId>> {
        // Brute force scan over the label
        let idx = self.inner.label_index.read();
        let nodes = self.inner.nodes.read();

        let ids = idx.get(label).map(Vec::as_slice).unwrap_or_default();
        Ok(ids.iter()
            .filter_map(|id| nodes.get(id))
            .filter(|n| match n.get(key) {
                Some(stored) => stored == value,
                None => value.is_null(),
            })
            .map(|n| n.id)
            .collect())
    }

    // ========================================================================
    // Node writes
    // ========================================================================

    async fn create_node(&self, tx: &mut MemoryTx) -> Result<NodeId> {
        require_writable(tx)?;
        Ok(self.insert_node(&[], PropertyMap::new()))
    }

    async fn add_label(&self, tx: &mut MemoryTx, id: NodeId, label: &str) -> Result<()> {
        require_writable(tx)?;
        let mut nodes = self.inner.nodes.write();
        let node = nodes.get_mut(&id).ok_or_else(|| Error::NotFound(format!("Node {id}")))?;
        if !node.has_label(label) {
            node.labels.push(label.to_string());
            drop(nodes);
            self.inner.label_index.write().entry(label.to_string()).or_default().push(id);
        }
        Ok(())
    }

    async fn set_node_property(
        &self,
        tx: &mut MemoryTx,
        id: NodeId,
        key: &str,
        val: Value,
    ) -> Result<()> {
        require_writable(tx)?;
        require_non_null(key, &val)?;
        let mut nodes = self.inner.nodes.write();
        let node = nodes.get_mut(&id).ok_or_else(|| Error::NotFound(format!("Node {id}")))?;
        node.properties.insert(key.to_string(), val);
        Ok(())
    }

    // ========================================================================
    // Relationship writes
    // ========================================================================

    async fn create_relationship(
        &self,
        tx: &mut MemoryTx,
        src: NodeId,
        dst: NodeId,
        rel_type: &str,
    ) -> Result<RelId> {
        require_writable(tx)?;
        // Verify both nodes exist
        {
            let nodes = self.inner.nodes.read();
            if !nodes.contains_key(&src) {
                return Err(Error::NotFound(format!("Source node {src}")));
            }
            if !nodes.contains_key(&dst) {
                return Err(Error::NotFound(format!("Target node {dst}")));
            }
        }

        let id = RelId(self.inner.next_rel_id.fetch_add(1, Ordering::Relaxed));
        self.inner.relationships.write().insert(id, Relationship::new(id, src, dst, rel_type));
        Ok(id)
    }

    async fn set_relationship_property(
        &self,
        tx: &mut MemoryTx,
        id: RelId,
        key: &str,
        val: Value,
    ) -> Result<()> {
        require_writable(tx)?;
        require_non_null(key, &val)?;
        let mut rels = self.inner.relationships.write();
        let rel = rels.get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("Relationship {id}")))?;
        rel.properties.insert(key.to_string(), val);
        Ok(())
    }

    // ========================================================================
    // Reads
    // ========================================================================

    async fn get_node(&self, _tx: &MemoryTx, id: NodeId) -> Result<Option<Node>> {
        Ok(self.inner.nodes.read().get(&id).cloned())
    }

    async fn get_relationship(&self, _tx: &MemoryTx, id: RelId) -> Result<Option<Relationship>> {
        Ok(self.inner.relationships.read().get(&id).cloned())
    }

    async fn all_nodes(&self, _tx: &MemoryTx) -> Result<Vec<Node>> {
        let mut nodes: Vec<Node> = self.inner.nodes.read().values().cloned().collect();
        nodes.sort_by_key(|n| n.id);
        Ok(nodes)
    }

    async fn all_relationships(&self, _tx: &MemoryTx) -> Result<Vec<Relationship>> {
        let mut rels: Vec<Relationship> = self.inner.relationships.read().values().cloned().collect();
        rels.sort_by_key(|r| r.id);
        Ok(rels)
    }

    async fn node_count(&self, _tx: &MemoryTx) -> Result<u64> {
        Ok(self.inner.nodes.read().len() as u64)
    }

    async fn relationship_count(&self, _tx: &MemoryTx) -> Result<u64> {
        Ok(self.inner.relationships.read().len() as u64)
    }
}

// ============================================================================
// Tests
// ============================================================================

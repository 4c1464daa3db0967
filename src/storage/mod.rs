//! # Storage Backend Trait
//!
//! The contract between the loader and a persistent graph store. It covers
//! exactly what hook resolution and entity creation need: indexed lookup by
//! label + property, node and relationship creation, labels and properties.
//!
//! ## Implementations
//!
//! | Backend | Module | Description |
//! |---------|--------|-------------|
//! | `MemoryBackend` | `memory` | In-memory reference store for testing/embedding |

pub mod memory;

use async_trait::async_trait;
use hashbrown::HashSet;

use crate::model::*;
use crate::tx::{Transaction, TxMode};
use crate::Result;

pub use memory::MemoryBackend;

// ============================================================================
// StorageBackend Trait
// ============================================================================

/// The store collaborator.
///
/// Values passed to the `set_*_property` methods are never `Value::Null`;
/// the loader filters nulls before writing.
#[async_trait]
pub trait StorageBackend: Send + Sync + 'static {
    /// The transaction type for this backend.
    type Tx: Transaction;

    // ========================================================================
    // Transactions
    // ========================================================================

    /// Begin a new transaction.
    async fn begin_tx(&self, mode: TxMode) -> Result<Self::Tx>;

    /// Commit a transaction.
    async fn commit_tx(&self, tx: Self::Tx) -> Result<()>;

    /// Roll back a transaction.
    async fn rollback_tx(&self, tx: Self::Tx) -> Result<()>;

    // ========================================================================
    // Lookup
    // ========================================================================

    /// Ids of all nodes carrying `label` whose `key` property equals `value`.
    ///
    /// `Value::Null` stands for an absent value and matches nodes carrying
    /// `label` that do not have `key` at all.
    async fn find_nodes(
        &self,
        tx: &Self::Tx,
        label: &str,
        key: &str,
        value: &Value,
    ) -> Result<HashSet<NodeId>>;

    // ========================================================================
    // Node writes
    // ========================================================================

    /// Create an empty node.
    async fn create_node(&self, tx: &mut Self::Tx) -> Result<NodeId>;

    /// Add a label to a node. Adding a label it already has is a no-op.
    async fn add_label(&self, tx: &mut Self::Tx, id: NodeId, label: &str) -> Result<()>;

    /// Set a property on a node (upsert).
    async fn set_node_property(
        &self,
        tx: &mut Self::Tx,
        id: NodeId,
        key: &str,
        val: Value,
    ) -> Result<()>;

    // ========================================================================
    // Relationship writes
    // ========================================================================

    /// Create a relationship between two nodes.
    async fn create_relationship(
        &self,
        tx: &mut Self::Tx,
        src: NodeId,
        dst: NodeId,
        rel_type: &str,
    ) -> Result<RelId>;

    /// Set a property on a relationship (upsert).
    async fn set_relationship_property(
        &self,
        tx: &mut Self::Tx,
        id: RelId,
        key: &str,
        val: Value,
    ) -> Result<()>;

    // ========================================================================
    // Reads
    // ========================================================================

    /// Get a node by ID. Returns None if not found.
    async fn get_node(&self, tx: &Self::Tx, id: NodeId) -> Result<Option<Node>>;

    /// Get a relationship by ID.
    async fn get_relationship(&self, tx: &Self::Tx, id: RelId) -> Result<Option<Relationship>>;

    /// Every node, in id order.
    async fn all_nodes(&self, tx: &Self::Tx) -> Result<Vec<Node>>;

    /// Every relationship, in id order.
    async fn all_relationships(&self, tx: &Self::Tx) -> Result<Vec<Relationship>>;

    /// Total number of nodes.
    async fn node_count(&self, tx: &Self::Tx) -> Result<u64> {
        Ok(self.all_nodes(tx).await?.len() as u64)
    }

    /// Total number of relationships.
    async fn relationship_count(&self, tx: &Self::Tx) -> Result<u64> {
        Ok(self.all_relationships(tx).await?.len() as u64)
    }
}

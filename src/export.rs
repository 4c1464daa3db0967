//! Geoff dump export: serialize a stored graph as Geoff notation.
//!
//! Every node is written as a named node `n<id>` so that relationships can
//! refer to it; the output re-reads as a single document.
//!
//! ```text
//! /* geoff-rs dump: 2 nodes, 1 relationships */
//! (n1:Person {name:"Alice"})
//! (n2:Person {name:"Bob"})
//! (n1)-[:KNOWS {since:1999}]->(n2)
//! ```

use std::io::Write;

use crate::model::*;
use crate::storage::StorageBackend;
use crate::Result;

/// Name under which a stored node appears in a dump.
pub fn dump_name(id: NodeId) -> String {
    format!("n{}", id.0)
}

/// Export every node and relationship of `backend` visible to `tx`.
pub async fn export_geoff_dump<B: StorageBackend>(
    backend: &B,
    tx: &B::Tx,
    writer: &mut dyn Write,
) -> Result<()> {
    let nodes = backend.all_nodes(tx).await?;
    let rels = backend.all_relationships(tx).await?;

    writeln!(writer, "/* geoff-rs dump: {} nodes, {} relationships */", nodes.len(), rels.len())?;

    for node in &nodes {
        writeln!(writer, "{}", to_abstract_node(node))?;
    }
    for rel in &rels {
        writeln!(writer, "{}", to_abstract_relationship(rel))?;
    }

    tracing::debug!(nodes = nodes.len(), relationships = rels.len(), "exported dump");
    Ok(())
}

fn to_abstract_node(node: &Node) -> AbstractNode {
    let mut abstract_node = AbstractNode::named(dump_name(node.id));
    abstract_node.merge_labels(node.labels.iter().cloned());
    abstract_node.merge_properties(node.properties.clone());
    abstract_node
}

fn to_abstract_relationship(rel: &Relationship) -> AbstractRelationship {
    let mut abstract_rel = AbstractRelationship::new(dump_name(rel.src), rel.rel_type.clone(), dump_name(rel.dst));
    abstract_rel.merge_properties(rel.properties.clone());
    abstract_rel
}

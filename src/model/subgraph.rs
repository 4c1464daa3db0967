//! Subgraph: the document model built by the reader and consumed by the loader.

use std::fmt;

use hashbrown::hash_map::Entry;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use super::abstract_node::{write_name, write_properties};
use super::{AbstractNode, AbstractRelationship};

/// An unresolved graph: node definitions in first-declaration order,
/// relationships in declaration order, and the document's comments.
///
/// Nodes are merged by name: declaring a name twice folds the second
/// declaration into the first (see [`AbstractNode::merge`]) and keeps the
/// position of the first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Subgraph {
    nodes: Vec<AbstractNode>,
    /// name → position in `nodes`
    index: HashMap<String, usize>,
    relationships: Vec<AbstractRelationship>,
    comments: Vec<String>,
}

impl Subgraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node, or merge it into the existing node of the same name.
    pub fn merge_node(&mut self, node: AbstractNode) -> &mut AbstractNode {
        match self.index.entry(node.name().to_owned()) {
            Entry::Occupied(entry) => {
                let existing = &mut self.nodes[*entry.get()];
                existing.merge(node);
                existing
            }
            Entry::Vacant(entry) => {
                let slot = self.nodes.len();
                entry.insert(slot);
                self.nodes.push(node);
                &mut self.nodes[slot]
            }
        }
    }

    /// Append a relationship. Its endpoints are expected to be present in the
    /// node table already.
    pub fn add_relationship(&mut self, rel: AbstractRelationship) {
        self.relationships.push(rel);
    }

    pub fn add_comment(&mut self, comment: impl Into<String>) {
        self.comments.push(comment.into());
    }

    pub fn node(&self, name: &str) -> Option<&AbstractNode> {
        self.index.get(name).map(|&slot| &self.nodes[slot])
    }

    /// Nodes in the order their names were first declared.
    pub fn nodes(&self) -> impl Iterator<Item = &AbstractNode> {
        self.nodes.iter()
    }

    pub fn relationships(&self) -> &[AbstractRelationship] {
        &self.relationships
    }

    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    /// Number of nodes.
    pub fn order(&self) -> usize {
        self.nodes.len()
    }

    /// Number of relationships.
    pub fn size(&self) -> usize {
        self.relationships.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.relationships.is_empty()
    }

    fn is_referenced(&self, name: &str) -> bool {
        self.relationships.iter().any(|r| r.start == name || r.end == name)
    }

    fn fmt_endpoint(&self, f: &mut fmt::Formatter<'_>, name: &str) -> fmt::Result {
        match self.node(name) {
            Some(node) if !node.is_named() => node.fmt_box(f),
            _ => {
                write!(f, "(")?;
                write_name(f, name)?;
                write!(f, ")")
            }
        }
    }
}

/// Two subgraphs are equal when they hold the same node definitions by name,
/// whatever their declaration order, and the same relationships and comments
/// in the same order.
impl PartialEq for Subgraph {
    fn eq(&self, other: &Self) -> bool {
        self.nodes.len() == other.nodes.len()
            && self.nodes.iter().all(|n| other.node(n.name()) == Some(n))
            && self.relationships == other.relationships
            && self.comments == other.comments
    }
}

impl fmt::Display for Subgraph {
    /// Renders the subgraph as a Geoff document, one statement per line.
    ///
    /// Unnamed nodes that take part in relationships are written inline in
    /// the relationship path, so an unnamed node shared by several
    /// relationships re-reads as several distinct nodes.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for comment in &self.comments {
            writeln!(f, "/* {comment} */")?;
        }
        let standalone = self.nodes.iter()
            .filter(|n| n.is_named() || n.hook.is_some() || !self.is_referenced(n.name()));
        for node in standalone {
            writeln!(f, "{node}")?;
        }
        for rel in &self.relationships {
            self.fmt_endpoint(f, &rel.start)?;
            write!(f, "-[:")?;
            write_name(f, &rel.rel_type)?;
            if !rel.properties.is_empty() {
                write!(f, " ")?;
                write_properties(f, &rel.properties)?;
            }
            write!(f, "]->")?;
            self.fmt_endpoint(f, &rel.end)?;
            writeln!(f)?;
        }
        Ok(())
    }
}

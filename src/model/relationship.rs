//! Relationships: as held by a backend, and as declared in a document.

use std::fmt;

use serde::{Deserialize, Serialize};
use super::abstract_node::{write_name, write_properties};
use super::property_map::merge_properties;
use super::{NodeId, PropertyMap, Value};

/// Opaque relationship identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RelId(pub u64);

impl std::fmt::Display for RelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A concrete relationship (directed edge) in a backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub id: RelId,
    pub src: NodeId,
    pub dst: NodeId,
    pub rel_type: String,
    pub properties: PropertyMap,
}

impl Relationship {
    pub fn new(id: RelId, src: NodeId, dst: NodeId, rel_type: impl Into<String>) -> Self {
        Self {
            id,
            src,
            dst,
            rel_type: rel_type.into(),
            properties: PropertyMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }
}

/// A relationship declared in a document. Endpoints refer to nodes of the
/// owning [`Subgraph`](super::Subgraph) by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbstractRelationship {
    pub start: String,
    pub end: String,
    pub rel_type: String,
    pub properties: PropertyMap,
}

impl AbstractRelationship {
    pub fn new(start: impl Into<String>, rel_type: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
            rel_type: rel_type.into(),
            properties: PropertyMap::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn merge_properties(&mut self, properties: PropertyMap) {
        merge_properties(&mut self.properties, properties);
    }
}

impl fmt::Display for AbstractRelationship {
    /// Renders `(start)-[:TYPE {...}]->(end)` with endpoint names only.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        write_name(f, &self.start)?;
        write!(f, ")-[:")?;
        write_name(f, &self.rel_type)?;
        if !self.properties.is_empty() {
            write!(f, " ")?;
            write_properties(f, &self.properties)?;
        }
        write!(f, "]->(")?;
        write_name(f, &self.end)?;
        write!(f, ")")
    }
}

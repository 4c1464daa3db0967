//! # Graph Model
//!
//! Two families of types live here:
//!
//! - the document model (`AbstractNode`, `AbstractRelationship`, `Subgraph`)
//!   produced by the reader and consumed by the loader;
//! - the backend DTOs (`Node`, `Relationship`, `NodeId`, `RelId`) that
//!   storage backends hand back.
//!
//! This module is pure data with no I/O and no async.

pub mod node;
pub mod relationship;
pub mod abstract_node;
pub mod subgraph;
pub mod value;
pub mod property_map;

pub use node::{Node, NodeId};
pub use relationship::{Relationship, RelId, AbstractRelationship};
pub use abstract_node::{AbstractNode, Hook};
pub use subgraph::Subgraph;
pub use value::Value;
pub use property_map::PropertyMap;

//! PropertyMap: the key-value store on nodes and relationships.

use std::collections::HashMap;
use super::Value;

/// A map of property names to values.
pub type PropertyMap = HashMap<String, Value>;

/// Merge `incoming` into `target`; incoming values win on key collisions.
pub fn merge_properties(target: &mut PropertyMap, incoming: PropertyMap) {
    target.extend(incoming);
}

/// Iterate the entries that may be written to a store (nulls are never written).
pub fn writable(props: &PropertyMap) -> impl Iterator<Item = (&String, &Value)> {
    props.iter().filter(|(_, v)| !v.is_null())
}

//! Node definitions as read from a document, before resolution.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use uuid::Uuid;

use super::property_map::merge_properties;
use super::value::write_string;
use super::{PropertyMap, Value};

/// Uniqueness declaration binding a node to a label and an ordered set of
/// property keys. A hooked node is matched against existing entities carrying
/// `label` with equal values for every key, and only created when nothing
/// matches (or skipped entirely when `optional`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hook {
    pub label: String,
    pub keys: SmallVec<[String; 2]>,
    pub optional: bool,
}

/// A node definition from a document.
///
/// `name` identifies the node within its document only. Nodes written without
/// a name receive a random UUID name and report `is_named() == false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbstractNode {
    name: String,
    named: bool,
    pub labels: BTreeSet<String>,
    pub properties: PropertyMap,
    pub hook: Option<Hook>,
}

impl AbstractNode {
    /// A node with the given name, or a synthetic one when `None`.
    pub fn new(name: Option<String>) -> Self {
        let (name, named) = match name {
            Some(name) => (name, true),
            None => (Uuid::new_v4().to_string(), false),
        };
        Self {
            name,
            named,
            labels: BTreeSet::new(),
            properties: PropertyMap::new(),
            hook: None,
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::new(Some(name.into()))
    }

    pub fn unnamed() -> Self {
        Self::new(None)
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.labels.insert(label.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_hook<K: Into<String>>(
        mut self,
        label: impl Into<String>,
        keys: impl IntoIterator<Item = K>,
        optional: bool,
    ) -> Self {
        self.set_hook(label, keys, optional);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_named(&self) -> bool {
        self.named
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    pub fn merge_labels(&mut self, labels: impl IntoIterator<Item = String>) {
        self.labels.extend(labels);
    }

    pub fn merge_properties(&mut self, properties: PropertyMap) {
        merge_properties(&mut self.properties, properties);
    }

    /// Fold another declaration of the same node into this one. Labels are
    /// unioned, incoming properties win, and an incoming hook replaces any
    /// existing one.
    pub fn merge(&mut self, other: AbstractNode) {
        self.merge_labels(other.labels);
        self.merge_properties(other.properties);
        if other.hook.is_some() {
            self.hook = other.hook;
        }
    }

    /// Attach a hook. The hook label joins the label set and every hook key
    /// not already present is recorded with an unknown (`Null`) value.
    pub fn set_hook<K: Into<String>>(
        &mut self,
        label: impl Into<String>,
        keys: impl IntoIterator<Item = K>,
        optional: bool,
    ) {
        let label = label.into();
        let keys: SmallVec<[String; 2]> = keys.into_iter().map(Into::into).collect();
        self.labels.insert(label.clone());
        for key in &keys {
            self.properties.entry(key.clone()).or_insert(Value::Null);
        }
        self.hook = Some(Hook { label, keys, optional });
    }
}

// ============================================================================
// Display (Geoff notation)
// ============================================================================

/// Write a name bare when it is a plain identifier, quoted otherwise.
pub(crate) fn write_name(f: &mut fmt::Formatter<'_>, name: &str) -> fmt::Result {
    if !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        f.write_str(name)
    } else {
        write_string(f, name)
    }
}

/// Write `{k:v,...}` with keys in sorted order.
pub(crate) fn write_properties(f: &mut fmt::Formatter<'_>, props: &PropertyMap) -> fmt::Result {
    let mut keys: Vec<&String> = props.keys().collect();
    keys.sort();
    write!(f, "{{")?;
    for (i, key) in keys.into_iter().enumerate() {
        if i > 0 { write!(f, ",")?; }
        write_name(f, key)?;
        write!(f, ":{}", props[key])?;
    }
    write!(f, "}}")
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ":")?;
        write_name(f, &self.label)?;
        write!(f, ":")?;
        for key in &self.keys {
            write_name(f, key)?;
            write!(f, ":")?;
        }
        write!(f, "=>")?;
        if self.optional {
            write!(f, "?")?;
        }
        Ok(())
    }
}

impl AbstractNode {
    /// The bare `(name:Label {...})` box, without any hook prefix.
    pub(crate) fn fmt_box(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        if self.named {
            write_name(f, &self.name)?;
        }
        for label in &self.labels {
            write!(f, ":")?;
            write_name(f, label)?;
        }
        if !self.properties.is_empty() {
            if self.named || !self.labels.is_empty() {
                write!(f, " ")?;
            }
            write_properties(f, &self.properties)?;
        }
        write!(f, ")")
    }
}

impl fmt::Display for AbstractNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(hook) = &self.hook {
            write!(f, "{hook}")?;
        }
        self.fmt_box(f)
    }
}

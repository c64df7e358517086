//! Read-only projections of metadata store state.
//!
//! Every value here is a snapshot handed out by a [`crate::MetadataStore`];
//! the resolver never mutates them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// Types
// ============================================================================

/// What kind of instance a type definition describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeCategory {
    #[default]
    Entity,
    Relationship,
    Classification,
}

/// A type definition as held by the store.
///
/// Each type has at most one direct supertype, so the supertype graph is a
/// forest (when the store is well formed).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDef {
    #[serde(default)]
    pub guid: String,
    pub name: String,
    #[serde(default)]
    pub super_type: Option<String>,
    #[serde(default)]
    pub category: TypeCategory,
    #[serde(default)]
    pub description: Option<String>,
}

impl TypeDef {
    pub fn new(guid: impl Into<String>, name: impl Into<String>, super_type: Option<&str>) -> Self {
        Self {
            guid: guid.into(),
            name: name.into(),
            super_type: super_type.map(str::to_string),
            category: TypeCategory::Entity,
            description: None,
        }
    }

    pub fn with_category(mut self, category: TypeCategory) -> Self {
        self.category = category;
        self
    }
}

/// Type reference embedded in nodes and edges.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeRef {
    pub guid: String,
    pub name: String,
    /// Supertype names, root first. The last entry is the direct supertype.
    #[serde(default)]
    pub supertypes: Vec<String>,
}

impl TypeRef {
    pub fn direct_supertype(&self) -> Option<&str> {
        self.supertypes.last().map(String::as_str)
    }
}

// ============================================================================
// Properties
// ============================================================================

/// A typed primitive property value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PropertyValue {
    String(String),
    Int(i64),
    Bool(bool),
    Date(DateTime<Utc>),
    Enum { ordinal: u32, symbolic_name: String },
}

impl PropertyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            PropertyValue::Enum { symbolic_name, .. } => Some(symbolic_name),
            _ => None,
        }
    }

    /// Total order used when sequencing by a property: values of different
    /// kinds compare by kind first.
    pub fn sort_key(&self) -> (u8, String) {
        match self {
            PropertyValue::String(s) => (0, s.clone()),
            // Offset so lexicographic order matches numeric order.
            PropertyValue::Int(i) => (1, format!("{:020}", (*i as i128) - (i64::MIN as i128))),
            PropertyValue::Bool(b) => (2, u8::from(*b).to_string()),
            PropertyValue::Date(d) => (3, d.to_rfc3339()),
            PropertyValue::Enum { ordinal, .. } => (4, format!("{ordinal:010}")),
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::String(s) => write!(f, "{s}"),
            PropertyValue::Int(i) => write!(f, "{i}"),
            PropertyValue::Bool(b) => write!(f, "{b}"),
            PropertyValue::Date(d) => write!(f, "{}", d.to_rfc3339()),
            PropertyValue::Enum {
                ordinal,
                symbolic_name,
            } => write!(f, "{symbolic_name}({ordinal})"),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::String(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Int(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

pub type Properties = BTreeMap<String, PropertyValue>;

/// A named classification attached to a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub name: String,
    #[serde(default)]
    pub properties: Properties,
}

impl Classification {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Properties::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceStatus {
    #[default]
    Active,
    Deleted,
}

/// Whether `status` passes a status filter. An empty filter admits every
/// status except [`InstanceStatus::Deleted`].
pub fn status_admitted(filter: &[InstanceStatus], status: InstanceStatus) -> bool {
    if filter.is_empty() {
        status != InstanceStatus::Deleted
    } else {
        filter.contains(&status)
    }
}

// ============================================================================
// Instances
// ============================================================================

/// A typed, identified record in the metadata graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub type_ref: TypeRef,
    #[serde(default)]
    pub properties: Properties,
    #[serde(default)]
    pub classifications: Vec<Classification>,
    #[serde(default)]
    pub status: InstanceStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Node {
    pub fn type_name(&self) -> &str {
        &self.type_ref.name
    }

    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    pub fn string_property(&self, name: &str) -> Option<&str> {
        self.property(name).and_then(PropertyValue::as_str)
    }

    pub fn classification(&self, name: &str) -> Option<&Classification> {
        self.classifications.iter().find(|c| c.name == name)
    }
}

/// Lightweight endpoint reference held by an edge (not a full node).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EndRef {
    pub id: String,
    pub type_ref: TypeRef,
}

/// A typed link between two node endpoints.
///
/// Traversal treats edges as undirected; the end one / end two distinction
/// only decides which side is "other" relative to a known anchor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub type_ref: TypeRef,
    pub end_one: EndRef,
    pub end_two: EndRef,
    #[serde(default)]
    pub properties: Properties,
    #[serde(default)]
    pub status: InstanceStatus,
}

impl Edge {
    pub fn type_name(&self) -> &str {
        &self.type_ref.name
    }

    pub fn touches(&self, node_id: &str) -> bool {
        self.end_one.id == node_id || self.end_two.id == node_id
    }
}

/// Nodes and edges returned together by graph-shaped store queries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subgraph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl Subgraph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.iter().any(|n| n.id == id)
    }
}

// ============================================================================
// Query shaping
// ============================================================================

/// Result ordering requested from the store.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequencingOrder {
    #[default]
    Any,
    Guid,
    CreationRecent,
    CreationOldest,
    UpdateRecent,
    UpdateOldest,
    PropertyAscending(String),
    PropertyDescending(String),
}

/// How a multi-property filter combines its terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchCriteria {
    #[default]
    All,
    Any,
    None,
}

/// Page window. A `size` of zero means "no limit".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Paging {
    #[serde(default)]
    pub start: usize,
    #[serde(default)]
    pub size: usize,
}

impl Paging {
    pub fn new(start: usize, size: usize) -> Self {
        Self { start, size }
    }

    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        let iter = items.into_iter().skip(self.start);
        if self.size == 0 {
            iter.collect()
        } else {
            iter.take(self.size).collect()
        }
    }
}

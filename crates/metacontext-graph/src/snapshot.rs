//! JSON-friendly graph descriptions used to populate a [`crate::MemoryStore`].

use crate::model::{Classification, InstanceStatus, Properties, PropertyValue, TypeDef};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A node to insert. The store fills in the full type reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    /// Generated when absent.
    #[serde(default)]
    pub id: Option<String>,
    pub type_name: String,
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

impl NodeSpec {
    pub fn new(id: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            type_name: type_name.into(),
            properties: Properties::new(),
            classifications: Vec::new(),
            status: InstanceStatus::Active,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn with_property(mut self, name: &str, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(name.to_string(), value.into());
        self
    }

    pub fn with_classification(mut self, classification: Classification) -> Self {
        self.classifications.push(classification);
        self
    }

    pub fn with_status(mut self, status: InstanceStatus) -> Self {
        self.status = status;
        self
    }

    pub fn created(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }
}

/// An edge to insert between two existing nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeSpec {
    #[serde(default)]
    pub id: Option<String>,
    pub type_name: String,
    pub end_one: String,
    pub end_two: String,
    #[serde(default)]
    pub properties: Properties,
    #[serde(default)]
    pub status: InstanceStatus,
}

impl EdgeSpec {
    pub fn new(
        id: impl Into<String>,
        type_name: impl Into<String>,
        end_one: impl Into<String>,
        end_two: impl Into<String>,
    ) -> Self {
        Self {
            id: Some(id.into()),
            type_name: type_name.into(),
            end_one: end_one.into(),
            end_two: end_two.into(),
            properties: Properties::new(),
            status: InstanceStatus::Active,
        }
    }

    pub fn with_status(mut self, status: InstanceStatus) -> Self {
        self.status = status;
        self
    }
}

/// Whole-store description: types first, then nodes, then edges.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub types: Vec<TypeDef>,
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub edges: Vec<EdgeSpec>,
}

impl GraphSnapshot {
    pub fn from_json_str(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

//! The query-only interface a metadata store exposes to the resolver.

use crate::model::{
    Edge, InstanceStatus, MatchCriteria, Node, Paging, Properties, SequencingOrder, Subgraph,
    TypeDef,
};

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Faults raised by a store. Absence is not a fault: lookups return `Ok(None)`
/// or an empty sequence instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("user `{user}` is not authorized: {reason}")]
    Unauthorized { user: String, reason: String },
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store does not support `{0}`")]
    Unsupported(String),
    #[error("invalid store parameter: {0}")]
    InvalidParameter(String),
}

/// Edge listing request for one node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeQuery {
    pub type_guid: Option<String>,
    pub status: Vec<InstanceStatus>,
    pub paging: Paging,
    pub sequencing: SequencingOrder,
}

impl EdgeQuery {
    pub fn of_type(type_guid: impl Into<String>) -> Self {
        Self {
            type_guid: Some(type_guid.into()),
            ..Self::default()
        }
    }
}

/// Common shaping for node finders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeQuery {
    /// Restrict to instances of this type or any of its subtypes.
    pub type_guid: Option<String>,
    pub status: Vec<InstanceStatus>,
    pub paging: Paging,
    pub sequencing: SequencingOrder,
}

/// Free-text match against string-valued properties.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextMatch {
    pub pattern: String,
    pub case_sensitive: bool,
    /// Match the whole value rather than a substring.
    pub exact: bool,
}

impl TextMatch {
    pub fn contains(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            case_sensitive: false,
            exact: false,
        }
    }

    pub fn matches(&self, value: &str) -> bool {
        if self.case_sensitive {
            if self.exact {
                value == self.pattern
            } else {
                value.contains(&self.pattern)
            }
        } else {
            let value = value.to_lowercase();
            let pattern = self.pattern.to_lowercase();
            if self.exact {
                value == pattern
            } else {
                value.contains(&pattern)
            }
        }
    }
}

/// Bounded expansion request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NeighborhoodQuery {
    pub origin: String,
    /// Node types admitted beyond the origin (subtypes included). Empty admits all.
    pub node_type_guids: Vec<String>,
    /// Edge type names admitted. Empty admits all.
    pub edge_type_names: Vec<String>,
    pub status: Vec<InstanceStatus>,
    pub depth: u32,
}

/// Read-only access to a metadata store.
///
/// Implementations are shared across concurrent requests and must be safe
/// for concurrent use. Every call is a live round trip; callers do not cache.
pub trait MetadataStore: Send + Sync {
    fn get_node(&self, user: &str, id: &str) -> StoreResult<Option<Node>>;

    fn get_edge(&self, user: &str, id: &str) -> StoreResult<Option<Edge>> {
        let _ = (user, id);
        Err(StoreError::Unsupported("get_edge".to_string()))
    }

    fn get_edges(&self, user: &str, node_id: &str, query: &EdgeQuery) -> StoreResult<Vec<Edge>>;

    fn find_nodes_by_classification(
        &self,
        user: &str,
        classification: &str,
        filter: &Properties,
        criteria: MatchCriteria,
        query: &NodeQuery,
    ) -> StoreResult<Vec<Node>>;

    fn find_nodes_by_property(
        &self,
        user: &str,
        filter: &Properties,
        criteria: MatchCriteria,
        query: &NodeQuery,
    ) -> StoreResult<Vec<Node>>;

    fn find_nodes_by_property_value(
        &self,
        user: &str,
        text: &TextMatch,
        query: &NodeQuery,
    ) -> StoreResult<Vec<Node>> {
        let _ = (user, text, query);
        Err(StoreError::Unsupported("find_nodes_by_property_value".to_string()))
    }

    fn get_neighborhood(&self, user: &str, query: &NeighborhoodQuery) -> StoreResult<Subgraph> {
        let _ = (user, query);
        Err(StoreError::Unsupported("get_neighborhood".to_string()))
    }

    fn get_linking_path(
        &self,
        user: &str,
        start: &str,
        end: &str,
        status: &[InstanceStatus],
    ) -> StoreResult<Subgraph> {
        let _ = (user, start, end, status);
        Err(StoreError::Unsupported("get_linking_path".to_string()))
    }

    fn get_all_type_definitions(&self, user: &str) -> StoreResult<Vec<TypeDef>>;

    fn get_type_by_name(&self, user: &str, name: &str) -> StoreResult<Option<TypeDef>> {
        Ok(self
            .get_all_type_definitions(user)?
            .into_iter()
            .find(|t| t.name == name))
    }

    fn get_type_by_guid(&self, user: &str, guid: &str) -> StoreResult<Option<TypeDef>> {
        Ok(self
            .get_all_type_definitions(user)?
            .into_iter()
            .find(|t| t.guid == guid))
    }
}

impl<S: MetadataStore + ?Sized> MetadataStore for std::sync::Arc<S> {
    fn get_node(&self, user: &str, id: &str) -> StoreResult<Option<Node>> {
        (**self).get_node(user, id)
    }

    fn get_edge(&self, user: &str, id: &str) -> StoreResult<Option<Edge>> {
        (**self).get_edge(user, id)
    }

    fn get_edges(&self, user: &str, node_id: &str, query: &EdgeQuery) -> StoreResult<Vec<Edge>> {
        (**self).get_edges(user, node_id, query)
    }

    fn find_nodes_by_classification(
        &self,
        user: &str,
        classification: &str,
        filter: &Properties,
        criteria: MatchCriteria,
        query: &NodeQuery,
    ) -> StoreResult<Vec<Node>> {
        (**self).find_nodes_by_classification(user, classification, filter, criteria, query)
    }

    fn find_nodes_by_property(
        &self,
        user: &str,
        filter: &Properties,
        criteria: MatchCriteria,
        query: &NodeQuery,
    ) -> StoreResult<Vec<Node>> {
        (**self).find_nodes_by_property(user, filter, criteria, query)
    }

    fn find_nodes_by_property_value(
        &self,
        user: &str,
        text: &TextMatch,
        query: &NodeQuery,
    ) -> StoreResult<Vec<Node>> {
        (**self).find_nodes_by_property_value(user, text, query)
    }

    fn get_neighborhood(&self, user: &str, query: &NeighborhoodQuery) -> StoreResult<Subgraph> {
        (**self).get_neighborhood(user, query)
    }

    fn get_linking_path(
        &self,
        user: &str,
        start: &str,
        end: &str,
        status: &[InstanceStatus],
    ) -> StoreResult<Subgraph> {
        (**self).get_linking_path(user, start, end, status)
    }

    fn get_all_type_definitions(&self, user: &str) -> StoreResult<Vec<TypeDef>> {
        (**self).get_all_type_definitions(user)
    }

    fn get_type_by_name(&self, user: &str, name: &str) -> StoreResult<Option<TypeDef>> {
        (**self).get_type_by_name(user, name)
    }

    fn get_type_by_guid(&self, user: &str, guid: &str) -> StoreResult<Option<TypeDef>> {
        (**self).get_type_by_guid(user, guid)
    }
}

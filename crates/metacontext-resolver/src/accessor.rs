//! Single-node and single-edge reads, with "store returned nothing"
//! translated into [`ResolverError::NotFound`].

use crate::catalog::TypeCatalog;
use crate::error::{ResolverError, Result};
use metacontext_graph::{
    Classification, Edge, EdgeQuery, InstanceStatus, MetadataStore, Node, Paging, SequencingOrder,
};
use std::sync::Arc;

/// Edge listing options expressed with type names rather than guids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeFilter {
    pub type_name: Option<String>,
    pub status: Vec<InstanceStatus>,
    pub paging: Paging,
    pub sequencing: SequencingOrder,
}

impl EdgeFilter {
    pub fn of_type(type_name: impl Into<String>, status: &[InstanceStatus]) -> Self {
        Self {
            type_name: Some(type_name.into()),
            status: status.to_vec(),
            ..Self::default()
        }
    }
}

/// Handle on the store plus the type catalog loaded from it.
pub struct Accessor<S: ?Sized> {
    store: Arc<S>,
    catalog: Arc<TypeCatalog>,
}

impl<S: ?Sized> Clone for Accessor<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            catalog: Arc::clone(&self.catalog),
        }
    }
}

impl<S: MetadataStore + ?Sized> Accessor<S> {
    pub fn new(store: Arc<S>, catalog: Arc<TypeCatalog>) -> Self {
        Self { store, catalog }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn catalog(&self) -> &TypeCatalog {
        &self.catalog
    }

    pub fn get_node(&self, user: &str, id: &str) -> Result<Node> {
        self.store
            .get_node(user, id)?
            .ok_or_else(|| ResolverError::not_found("node", id))
    }

    pub fn get_edge(&self, user: &str, id: &str) -> Result<Edge> {
        self.store
            .get_edge(user, id)?
            .ok_or_else(|| ResolverError::not_found("edge", id))
    }

    /// Edges attached to `node_id`. An edge type the catalog does not know
    /// matches nothing, so the result is empty rather than an error.
    pub fn get_edges(&self, user: &str, node_id: &str, filter: &EdgeFilter) -> Result<Vec<Edge>> {
        let type_guid = match filter.type_name.as_deref() {
            None => None,
            Some(name) => match self.catalog.resolve_type_id(name) {
                Some(guid) => Some(guid.to_string()),
                None => {
                    tracing::debug!(edge_type = name, "edge type not in catalog, no edges match");
                    return Ok(Vec::new());
                }
            },
        };
        let query = EdgeQuery {
            type_guid,
            status: filter.status.clone(),
            paging: filter.paging,
            sequencing: filter.sequencing.clone(),
        };
        Ok(self.store.get_edges(user, node_id, &query)?)
    }

    /// Classifications carried by one node, optionally narrowed to a name.
    pub fn classifications(
        &self,
        user: &str,
        id: &str,
        name: Option<&str>,
    ) -> Result<Vec<Classification>> {
        let node = self.get_node(user, id)?;
        let found: Vec<Classification> = node
            .classifications
            .into_iter()
            .filter(|c| name.map_or(true, |n| c.name == n))
            .collect();
        if found.is_empty() {
            return Err(ResolverError::not_found(
                "classification",
                name.map_or_else(|| id.to_string(), |n| format!("{n} on {id}")),
            ));
        }
        Ok(found)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use metacontext_graph::{EdgeSpec, MemoryStore, NodeSpec, StoreError, TypeDef};

    pub(crate) fn accessor_over(store: MemoryStore) -> Accessor<MemoryStore> {
        let catalog = TypeCatalog::load(&store, "tester").unwrap();
        Accessor::new(Arc::new(store), Arc::new(catalog))
    }

    fn small_store() -> MemoryStore {
        let store = MemoryStore::new();
        store.define_type(TypeDef::new("t-asset", "Asset", None)).unwrap();
        store.define_type(TypeDef::new("t-link", "Link", None)).unwrap();
        store
            .add_node(
                NodeSpec::new("a", "Asset")
                    .with_classification(Classification::new("Confidentiality"))
                    .with_classification(Classification::new("Retention")),
            )
            .unwrap();
        store.add_node(NodeSpec::new("b", "Asset")).unwrap();
        store.add_edge(EdgeSpec::new("ab", "Link", "a", "b")).unwrap();
        store
    }

    #[test]
    fn missing_node_is_not_found() {
        let accessor = accessor_over(small_store());
        assert_eq!(accessor.get_node("u", "a").unwrap().id, "a");
        assert_eq!(
            accessor.get_node("u", "zzz").unwrap_err(),
            ResolverError::not_found("node", "zzz")
        );
        assert!(accessor.get_edge("u", "nope").unwrap_err().is_absence());
    }

    #[test]
    fn unknown_edge_type_is_an_empty_listing() {
        let accessor = accessor_over(small_store());
        let edges = accessor
            .get_edges("u", "a", &EdgeFilter::of_type("NoSuchType", &[]))
            .unwrap();
        assert!(edges.is_empty());
        let edges = accessor
            .get_edges("u", "a", &EdgeFilter::of_type("Link", &[]))
            .unwrap();
        assert_eq!(edges.len(), 1);
    }

    #[test]
    fn store_faults_propagate_unchanged() {
        let accessor = accessor_over(small_store().with_authorized_users(["tester"]));
        let err = accessor.get_node("intruder", "a").unwrap_err();
        assert_eq!(
            err,
            ResolverError::from(StoreError::Unauthorized {
                user: "intruder".to_string(),
                reason: "not on the store's access list".to_string(),
            })
        );
    }

    #[test]
    fn classification_listing_filters_by_name() {
        let accessor = accessor_over(small_store());
        assert_eq!(accessor.classifications("u", "a", None).unwrap().len(), 2);
        let only = accessor
            .classifications("u", "a", Some("Retention"))
            .unwrap();
        assert_eq!(only.len(), 1);
        assert!(accessor
            .classifications("u", "b", None)
            .unwrap_err()
            .is_absence());
    }
}

//! The exposed operation surface.
//!
//! Every operation returns either its result or a [`FailureDescriptor`]; no
//! internal error value crosses this boundary.

use crate::accessor::Accessor;
use crate::catalog::TypeCatalog;
use crate::config::ResolverConfig;
use crate::context::{ChainResolver, ContextualNode};
use crate::error::{FailureDescriptor, ResolverError, Result};
use crate::explorer::{Explorer, NeighborhoodRequest, RelationshipRequest};
use crate::fanout::FanOut;
use crate::search::{FinderOptions, SearchDispatcher, SearchParameters};
use metacontext_graph::{
    Classification, Edge, InstanceStatus, MatchCriteria, MetadataStore, Node, Properties,
    PropertyValue, Subgraph, TextMatch, TypeDef,
};
use std::sync::Arc;

pub type ServiceResult<T> = std::result::Result<T, FailureDescriptor>;

/// Resolver bound to one store. Cheap to share behind an `Arc`; every
/// operation takes the requesting user explicitly.
pub struct ResolverService<S: ?Sized> {
    accessor: Accessor<S>,
    explorer: Explorer<S>,
    chain: Arc<ChainResolver<S>>,
    search: SearchDispatcher<S>,
    config: Arc<ResolverConfig>,
}

impl<S: MetadataStore + ?Sized> ResolverService<S> {
    /// Connect to `store`: validate the configuration and load the type
    /// catalog as `user`.
    pub fn attach(store: Arc<S>, config: ResolverConfig, user: &str) -> Result<Self> {
        config.validate()?;
        let catalog = TypeCatalog::load(store.as_ref(), user)?;
        Self::with_catalog(store, catalog, config)
    }

    pub fn with_catalog(
        store: Arc<S>,
        catalog: TypeCatalog,
        config: ResolverConfig,
    ) -> Result<Self> {
        config.validate()?;
        let config = Arc::new(config);
        let fan_out = FanOut::new(config.fan_out_workers)?;
        let accessor = Accessor::new(store, Arc::new(catalog));
        let chain = Arc::new(ChainResolver::new(
            accessor.clone(),
            Arc::clone(&config),
            fan_out.clone(),
        ));
        let search = SearchDispatcher::new(
            accessor.clone(),
            Arc::clone(&chain),
            Arc::clone(&config),
            fan_out,
        );
        let explorer = Explorer::new(accessor.clone(), Arc::clone(&config));
        tracing::info!(
            types = accessor.catalog().len(),
            workers = config.fan_out_workers,
            "resolver attached"
        );
        Ok(Self {
            accessor,
            explorer,
            chain,
            search,
            config,
        })
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn catalog(&self) -> &TypeCatalog {
        self.accessor.catalog()
    }

    pub fn node_details(&self, user: &str, id: &str) -> ServiceResult<Node> {
        expose("node_details", self.accessor.get_node(user, id))
    }

    pub fn node_classifications(
        &self,
        user: &str,
        id: &str,
        name: Option<&str>,
    ) -> ServiceResult<Vec<Classification>> {
        expose(
            "node_classifications",
            self.accessor.classifications(user, id, name),
        )
    }

    pub fn relationships(
        &self,
        user: &str,
        request: &RelationshipRequest,
    ) -> ServiceResult<Vec<Edge>> {
        expose("relationships", self.explorer.relationships(user, request))
    }

    pub fn relationships_between(
        &self,
        user: &str,
        first: &str,
        second: &str,
        edge_type: Option<&str>,
    ) -> ServiceResult<Vec<Edge>> {
        expose(
            "relationships_between",
            self.explorer
                .relationships_between(user, first, second, edge_type),
        )
    }

    pub fn neighborhood(
        &self,
        user: &str,
        request: &NeighborhoodRequest,
    ) -> ServiceResult<Subgraph> {
        expose("neighborhood", self.explorer.neighborhood(user, request))
    }

    pub fn linking_path(
        &self,
        user: &str,
        start: &str,
        end: &str,
        status: Option<&[InstanceStatus]>,
    ) -> ServiceResult<Subgraph> {
        expose(
            "linking_path",
            self.explorer.linking_path(user, start, end, status),
        )
    }

    /// A node and every context it participates in.
    pub fn context(&self, user: &str, id: &str) -> ServiceResult<ContextualNode> {
        let outcome = self.accessor.get_node(user, id).and_then(|node| {
            let contexts = self.chain.contexts_for(user, &node)?;
            Ok(ContextualNode { node, contexts })
        });
        expose("context", outcome)
    }

    pub fn search(
        &self,
        user: &str,
        criteria: &str,
        params: &SearchParameters,
    ) -> ServiceResult<Vec<ContextualNode>> {
        expose("search", self.search.search(user, criteria, params))
    }

    pub fn nodes_by_classification(
        &self,
        user: &str,
        classification: &str,
        filter: &Properties,
        criteria: MatchCriteria,
        options: &FinderOptions,
    ) -> ServiceResult<Vec<Node>> {
        expose(
            "nodes_by_classification",
            self.search
                .nodes_by_classification(user, classification, filter, criteria, options),
        )
    }

    pub fn nodes_by_property(
        &self,
        user: &str,
        property: Option<&str>,
        value: PropertyValue,
        options: &FinderOptions,
    ) -> ServiceResult<Vec<Node>> {
        expose(
            "nodes_by_property",
            self.search.nodes_by_property(user, property, value, options),
        )
    }

    pub fn nodes_by_property_value(
        &self,
        user: &str,
        text: &TextMatch,
        options: &FinderOptions,
    ) -> ServiceResult<Vec<Node>> {
        expose(
            "nodes_by_property_value",
            self.search.nodes_by_property_value(user, text, options),
        )
    }

    /// Names of `type_name` and all its subtypes, or of every catalogued
    /// type when no name is given. Sorted either way.
    pub fn supported_types(&self, type_name: Option<&str>) -> ServiceResult<Vec<String>> {
        let catalog = self.catalog();
        let outcome = match type_name {
            None => Ok(catalog.type_names().into_iter().map(str::to_string).collect()),
            Some(name) => catalog.subtypes_of(name).map(|defs| {
                let mut names: Vec<String> = defs.into_iter().map(|d| d.name.clone()).collect();
                names.sort();
                names
            }),
        };
        expose("supported_types", outcome)
    }

    /// Definition of a type by name. The catalog is consulted first, then
    /// the store, for types registered after attach.
    pub fn type_definition(&self, user: &str, name: &str) -> ServiceResult<TypeDef> {
        let outcome = match self.catalog().type_by_name(name) {
            Some(def) => Ok(def.clone()),
            None => self
                .accessor
                .store()
                .get_type_by_name(user, name)
                .map_err(ResolverError::from)
                .and_then(|def| def.ok_or_else(|| ResolverError::TypeUnknown(name.to_string()))),
        };
        expose("type_definition", outcome)
    }
}

fn expose<T>(op: &'static str, outcome: Result<T>) -> ServiceResult<T> {
    outcome.map_err(|e| {
        if e.is_absence() {
            tracing::debug!(op, error = %e, "no result");
        } else {
            tracing::warn!(op, error = %e, "operation failed");
        }
        e.to_failure()
    })
}

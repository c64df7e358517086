//! Graph exploration: neighborhoods, linking paths and relationship listings.
//!
//! The resolver shapes the request (type names to guids, depth and page
//! bounds) and checks what comes back; the walks themselves run in the store.

use crate::accessor::{Accessor, EdgeFilter};
use crate::config::ResolverConfig;
use crate::error::{ResolverError, Result};
use crate::pair::other_end_ref;
use ahash::AHashSet;
use metacontext_graph::{
    Edge, InstanceStatus, MetadataStore, NeighborhoodQuery, Paging, SequencingOrder, Subgraph,
};
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NeighborhoodRequest {
    pub origin: String,
    /// Admitted node types beyond the origin; empty admits every type.
    pub node_types: Vec<String>,
    /// Admitted edge types; empty admits every type.
    pub edge_types: Vec<String>,
    pub status: Option<Vec<InstanceStatus>>,
    pub depth: u32,
}

impl NeighborhoodRequest {
    pub fn new(origin: impl Into<String>, depth: u32) -> Self {
        Self {
            origin: origin.into(),
            depth,
            ..Self::default()
        }
    }
}

/// Relationship listing for one node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationshipRequest {
    pub node_id: String,
    pub edge_type: Option<String>,
    pub status: Option<Vec<InstanceStatus>>,
    pub paging: Paging,
    pub sequencing: SequencingOrder,
}

pub struct Explorer<S: ?Sized> {
    accessor: Accessor<S>,
    config: Arc<ResolverConfig>,
}

impl<S: MetadataStore + ?Sized> Explorer<S> {
    pub fn new(accessor: Accessor<S>, config: Arc<ResolverConfig>) -> Self {
        Self { accessor, config }
    }

    pub fn neighborhood(&self, user: &str, request: &NeighborhoodRequest) -> Result<Subgraph> {
        if request.depth > self.config.max_neighborhood_depth {
            return Err(ResolverError::InvalidArgument(format!(
                "neighborhood depth {} exceeds the maximum of {}",
                request.depth, self.config.max_neighborhood_depth
            )));
        }
        let catalog = self.accessor.catalog();
        let node_type_guids: Vec<String> = request
            .node_types
            .iter()
            .filter_map(|name| {
                let guid = catalog.resolve_type_id(name);
                if guid.is_none() {
                    tracing::debug!(node_type = %name, "neighborhood node type not in catalog");
                }
                guid.map(str::to_string)
            })
            .collect();

        // Every requested node type is unknown: nothing past the origin can match.
        let depth = if !request.node_types.is_empty() && node_type_guids.is_empty() {
            0
        } else {
            request.depth
        };

        let query = NeighborhoodQuery {
            origin: request.origin.clone(),
            node_type_guids,
            edge_type_names: request.edge_types.clone(),
            status: self.config.status_or_default(request.status.as_deref()),
            depth,
        };
        let mut graph = self.accessor.store().get_neighborhood(user, &query)?;
        if graph.nodes.is_empty() {
            return Err(ResolverError::not_found("neighborhood origin", &request.origin));
        }
        if depth == 0 {
            graph.edges.clear();
        }
        let ids: AHashSet<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        let before = graph.edges.len();
        let edges: Vec<Edge> = std::mem::take(&mut graph.edges)
            .into_iter()
            .filter(|e| ids.contains(e.end_one.id.as_str()) && ids.contains(e.end_two.id.as_str()))
            .collect();
        graph.edges = edges;
        if graph.edges.len() != before {
            tracing::warn!(
                origin = %request.origin,
                dropped = before - graph.edges.len(),
                "store returned neighborhood edges with ends outside the node set"
            );
        }
        tracing::debug!(
            origin = %request.origin,
            depth,
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            "neighborhood"
        );
        Ok(graph)
    }

    /// Shortest connection between two nodes. No nodes or no edges means
    /// there is no path.
    pub fn linking_path(
        &self,
        user: &str,
        start: &str,
        end: &str,
        status: Option<&[InstanceStatus]>,
    ) -> Result<Subgraph> {
        let status = self.config.status_or_default(status);
        let path = self
            .accessor
            .store()
            .get_linking_path(user, start, end, &status)?;
        if path.nodes.is_empty() || path.edges.is_empty() {
            return Err(ResolverError::not_found(
                "linking path",
                format!("{start} -> {end}"),
            ));
        }
        if !path.contains_node(start) || !path.contains_node(end) {
            tracing::warn!(start, end, "store path does not join the requested nodes");
            return Err(ResolverError::not_found(
                "linking path",
                format!("{start} -> {end}"),
            ));
        }
        Ok(path)
    }

    /// Edges attached to one node. An empty listing is `NotFound`.
    pub fn relationships(&self, user: &str, request: &RelationshipRequest) -> Result<Vec<Edge>> {
        let filter = EdgeFilter {
            type_name: request.edge_type.clone(),
            status: self.config.status_or_default(request.status.as_deref()),
            paging: self.config.effective_paging(request.paging)?,
            sequencing: request.sequencing.clone(),
        };
        let edges = self.accessor.get_edges(user, &request.node_id, &filter)?;
        if edges.is_empty() {
            return Err(ResolverError::not_found("relationship", &request.node_id));
        }
        Ok(edges)
    }

    /// Edges that join `first` directly to `second`.
    pub fn relationships_between(
        &self,
        user: &str,
        first: &str,
        second: &str,
        edge_type: Option<&str>,
    ) -> Result<Vec<Edge>> {
        let filter = EdgeFilter {
            type_name: edge_type.map(str::to_string),
            status: self.config.default_status.clone(),
            ..EdgeFilter::default()
        };
        let edges: Vec<Edge> = self
            .accessor
            .get_edges(user, first, &filter)?
            .into_iter()
            .filter(|e| e.touches(first) && other_end_ref(first, e).id == second)
            .collect();
        if edges.is_empty() {
            return Err(ResolverError::not_found(
                "relationship",
                format!("{first} <-> {second}"),
            ));
        }
        Ok(edges)
    }
}

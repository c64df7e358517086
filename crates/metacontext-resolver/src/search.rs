//! Search Dispatcher and node finders.
//!
//! A free-text search asks the store for matching nodes, then decides per hit
//! what context to attach:
//!
//! * glossary terms get one context per semantic assignment;
//! * assets and schema elements get their own chain (possibly empty);
//! * anything else is dropped from the result.
//!
//! Hits are resolved concurrently; the result keeps the store's order.

use crate::accessor::Accessor;
use crate::config::{HitFailurePolicy, ResolverConfig};
use crate::context::{ChainResolver, ContextualNode, NodeKind};
use crate::error::{ResolverError, Result};
use crate::fanout::FanOut;
use metacontext_graph::{
    InstanceStatus, MatchCriteria, MetadataStore, Node, NodeQuery, Paging, Properties,
    PropertyValue, SequencingOrder, TextMatch,
};
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchParameters {
    /// Restrict hits to these types and their subtypes. Empty admits all.
    pub type_names: Vec<String>,
    pub status: Option<Vec<InstanceStatus>>,
    pub paging: Paging,
    pub sequencing: SequencingOrder,
    pub case_sensitive: bool,
    /// Match whole property values instead of substrings.
    pub exact_match: bool,
}

/// Shaping shared by the node finders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FinderOptions {
    pub type_name: Option<String>,
    pub status: Option<Vec<InstanceStatus>>,
    pub paging: Paging,
    pub sequencing: SequencingOrder,
}

pub struct SearchDispatcher<S: ?Sized> {
    accessor: Accessor<S>,
    chain: Arc<ChainResolver<S>>,
    config: Arc<ResolverConfig>,
    fan_out: FanOut,
}

impl<S: MetadataStore + ?Sized> SearchDispatcher<S> {
    pub(crate) fn new(
        accessor: Accessor<S>,
        chain: Arc<ChainResolver<S>>,
        config: Arc<ResolverConfig>,
        fan_out: FanOut,
    ) -> Self {
        Self {
            accessor,
            chain,
            config,
            fan_out,
        }
    }

    pub fn search(
        &self,
        user: &str,
        criteria: &str,
        params: &SearchParameters,
    ) -> Result<Vec<ContextualNode>> {
        if criteria.trim().is_empty() {
            return Err(ResolverError::InvalidArgument(
                "search criteria is empty".to_string(),
            ));
        }
        let paging = self.config.effective_paging(params.paging)?;
        let text = TextMatch {
            pattern: criteria.to_string(),
            case_sensitive: params.case_sensitive,
            exact: params.exact_match,
        };
        let hits = self.matching_nodes(user, &text, params, paging)?;
        if hits.is_empty() {
            return Err(ResolverError::not_found("search result", criteria));
        }
        tracing::debug!(criteria, hits = hits.len(), "search hits");

        let resolved = self.fan_out.map(&hits, |node| self.dispatch(user, node));
        let mut out = Vec::with_capacity(resolved.len());
        for (node, outcome) in hits.iter().zip(resolved) {
            match outcome {
                Ok(Some(found)) => out.push(found),
                Ok(None) => {}
                Err(e) => match self.config.hit_failure {
                    HitFailurePolicy::Abort => return Err(e),
                    HitFailurePolicy::Skip => {
                        tracing::warn!(node = %node.id, error = %e, "dropping search hit");
                    }
                },
            }
        }
        Ok(out)
    }

    fn matching_nodes(
        &self,
        user: &str,
        text: &TextMatch,
        params: &SearchParameters,
        paging: Paging,
    ) -> Result<Vec<Node>> {
        let status = self.config.status_or_default(params.status.as_deref());
        let catalog = self.accessor.catalog();
        let known: Vec<&str> = params
            .type_names
            .iter()
            .map(String::as_str)
            .filter(|name| {
                let known = catalog.resolve_type_id(name).is_some();
                if !known {
                    tracing::debug!(type_name = name, "search type not in catalog");
                }
                known
            })
            .collect();

        if !params.type_names.is_empty() && known.is_empty() {
            return Ok(Vec::new());
        }
        match known.as_slice() {
            [] | [_] => {
                let query = NodeQuery {
                    type_guid: known
                        .first()
                        .and_then(|name| catalog.resolve_type_id(name))
                        .map(str::to_string),
                    status,
                    paging,
                    sequencing: params.sequencing.clone(),
                };
                Ok(self
                    .accessor
                    .store()
                    .find_nodes_by_property_value(user, text, &query)?)
            }
            // Several types: one unpaged query, narrowed and paged here so
            // the store's ordering survives.
            many => {
                let query = NodeQuery {
                    type_guid: None,
                    status,
                    paging: Paging::default(),
                    sequencing: params.sequencing.clone(),
                };
                let nodes = self
                    .accessor
                    .store()
                    .find_nodes_by_property_value(user, text, &query)?
                    .into_iter()
                    .filter(|n| many.iter().any(|t| catalog.is_kind_of(n.type_name(), t)))
                    .collect();
                Ok(paging.apply(nodes))
            }
        }
    }

    /// Contexts for one hit, or `None` when the hit is not contextual.
    fn dispatch(&self, user: &str, node: &Node) -> Result<Option<ContextualNode>> {
        let contexts = match self.chain.kind(node) {
            NodeKind::GlossaryTerm => self.chain.glossary_contexts(user, node)?,
            _ if self.is_contextual(node) => vec![self.chain.resolve(user, node)?],
            _ => {
                tracing::trace!(node = %node.id, type_name = node.type_name(), "hit dropped");
                return Ok(None);
            }
        };
        Ok(Some(ContextualNode {
            node: node.clone(),
            contexts,
        }))
    }

    fn is_contextual(&self, node: &Node) -> bool {
        let types = &self.config.types;
        let catalog = self.accessor.catalog();
        let name = node.type_name();
        [&types.asset, &types.schema_element, &types.schema_attribute]
            .iter()
            .any(|kind| catalog.is_kind_of(name, kind))
    }

    // ------------------------------------------------------------------
    // Finders. An empty result is `NotFound`.
    // ------------------------------------------------------------------

    pub fn nodes_by_classification(
        &self,
        user: &str,
        classification: &str,
        filter: &Properties,
        criteria: MatchCriteria,
        options: &FinderOptions,
    ) -> Result<Vec<Node>> {
        let Some(query) = self.node_query(options)? else {
            return Err(ResolverError::not_found("classified node", classification));
        };
        let nodes = self.accessor.store().find_nodes_by_classification(
            user,
            classification,
            filter,
            criteria,
            &query,
        )?;
        non_empty(nodes, "classified node", classification)
    }

    /// Exact property match. `property` defaults to the configured
    /// qualified-name property.
    pub fn nodes_by_property(
        &self,
        user: &str,
        property: Option<&str>,
        value: PropertyValue,
        options: &FinderOptions,
    ) -> Result<Vec<Node>> {
        let property = property.unwrap_or(&self.config.qualified_name_property);
        let shown = format!("{property}={value}");
        let Some(query) = self.node_query(options)? else {
            return Err(ResolverError::not_found("node with property", shown));
        };
        let mut filter = Properties::new();
        filter.insert(property.to_string(), value);
        let nodes = self.accessor.store().find_nodes_by_property(
            user,
            &filter,
            MatchCriteria::All,
            &query,
        )?;
        non_empty(nodes, "node with property", shown)
    }

    /// Free-text match over every string property, without context resolution.
    pub fn nodes_by_property_value(
        &self,
        user: &str,
        text: &TextMatch,
        options: &FinderOptions,
    ) -> Result<Vec<Node>> {
        if text.pattern.trim().is_empty() {
            return Err(ResolverError::InvalidArgument(
                "property value pattern is empty".to_string(),
            ));
        }
        let Some(query) = self.node_query(options)? else {
            return Err(ResolverError::not_found("node with value", &text.pattern));
        };
        let nodes = self
            .accessor
            .store()
            .find_nodes_by_property_value(user, text, &query)?;
        non_empty(nodes, "node with value", &text.pattern)
    }

    /// `None` when the requested type is unknown, so nothing can match.
    fn node_query(&self, options: &FinderOptions) -> Result<Option<NodeQuery>> {
        let type_guid = match options.type_name.as_deref() {
            None => None,
            Some(name) => match self.accessor.catalog().resolve_type_id(name) {
                Some(guid) => Some(guid.to_string()),
                None => {
                    tracing::debug!(type_name = name, "finder type not in catalog");
                    return Ok(None);
                }
            },
        };
        Ok(Some(NodeQuery {
            type_guid,
            status: self.config.status_or_default(options.status.as_deref()),
            paging: self.config.effective_paging(options.paging)?,
            sequencing: options.sequencing.clone(),
        }))
    }
}

fn non_empty(nodes: Vec<Node>, what: &'static str, id: impl Into<String>) -> Result<Vec<Node>> {
    if nodes.is_empty() {
        Err(ResolverError::not_found(what, id))
    } else {
        Ok(nodes)
    }
}

//! Context Chain Resolver.
//!
//! From a starting node, climb the fixed lineage ladder one pivot edge at a
//! time and record every rung that could be determined:
//!
//! ```text
//! column ─SchemaAttributeType→ table type ─SchemaAttributeType→ table
//! table  ─AttributeForSchema→ schema type ─AssetSchemaType→ deployed schema
//! deployed schema ─DataContentForDataSet→ data store
//! data store ─ConnectionToAsset→ connection ─┬─ConnectionConnectorType→ connector
//!                                            └─ConnectionEndpoint→ endpoint
//! ```
//!
//! A hop with zero candidates (or, under [`RelationshipSelection::ExactlyOne`],
//! more than one) leaves that rung and everything above it unset. Absence
//! never fails a resolution; store faults always do.
//!
//! Glossary terms have no rung of their own. Their contexts are the contexts
//! of every node they are semantically assigned to, resolved concurrently.

use crate::accessor::{Accessor, EdgeFilter};
use crate::config::{RelationshipSelection, ResolverConfig};
use crate::error::Result;
use crate::fanout::FanOut;
use crate::pair::other_end_ref;
use metacontext_graph::{Edge, MetadataStore, Node};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// How the resolver treats a node, decided once from its type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Column,
    Table,
    DeployedSchema,
    DataStore,
    GlossaryTerm,
    Other,
}

impl NodeKind {
    /// Whether a context chain can start here.
    pub fn is_rung(self) -> bool {
        matches!(
            self,
            NodeKind::Column | NodeKind::Table | NodeKind::DeployedSchema | NodeKind::DataStore
        )
    }
}

/// Identifying fields of one element recorded in a [`Context`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSummary {
    pub id: String,
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualified_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// Lineage of one element. Unset fields could not be determined.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<ElementSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<ElementSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<ElementSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<ElementSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection: Option<ElementSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connector: Option<ElementSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<ElementSummary>,
}

impl Context {
    pub fn is_empty(&self) -> bool {
        self.populated() == 0
    }

    /// Number of rungs that were determined.
    pub fn populated(&self) -> usize {
        [
            &self.column,
            &self.table,
            &self.schema,
            &self.database,
            &self.connection,
            &self.connector,
            &self.endpoint,
        ]
        .iter()
        .filter(|slot| slot.is_some())
        .count()
    }
}

/// A node together with the contexts resolved for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextualNode {
    pub node: Node,
    pub contexts: Vec<Context>,
}

/// One pivot step.
struct Hop<'a> {
    edge_type: &'a str,
    /// Edge the walk arrived by; never taken back.
    arrived_by: Option<&'a str>,
    /// Required kind of the far end, checked on the edge's end reference.
    towards: Option<&'a str>,
}

impl<'a> Hop<'a> {
    fn along(edge_type: &'a str) -> Self {
        Self {
            edge_type,
            arrived_by: None,
            towards: None,
        }
    }
}

pub struct ChainResolver<S: ?Sized> {
    accessor: Accessor<S>,
    config: Arc<ResolverConfig>,
    fan_out: FanOut,
}

impl<S: MetadataStore + ?Sized> ChainResolver<S> {
    pub(crate) fn new(accessor: Accessor<S>, config: Arc<ResolverConfig>, fan_out: FanOut) -> Self {
        Self {
            accessor,
            config,
            fan_out,
        }
    }

    #[cfg(test)]
    pub(crate) fn accessor(&self) -> &Accessor<S> {
        &self.accessor
    }

    /// Rungs match on the concrete type name; glossary terms match on kind.
    pub fn kind(&self, node: &Node) -> NodeKind {
        let types = &self.config.types;
        let name = node.type_name();
        if name == types.column {
            NodeKind::Column
        } else if name == types.table {
            NodeKind::Table
        } else if name == types.deployed_schema {
            NodeKind::DeployedSchema
        } else if name == types.data_store {
            NodeKind::DataStore
        } else if self.accessor.catalog().is_kind_of(name, &types.glossary_term) {
            NodeKind::GlossaryTerm
        } else {
            NodeKind::Other
        }
    }

    /// Context of a single node. Nodes off the ladder get an empty context.
    pub fn resolve(&self, user: &str, node: &Node) -> Result<Context> {
        let mut ctx = Context::default();
        match self.kind(node) {
            NodeKind::Column => self.from_column(user, node, &mut ctx)?,
            NodeKind::Table => self.from_table(user, node, &mut ctx)?,
            NodeKind::DeployedSchema => self.from_schema(user, node, &mut ctx)?,
            NodeKind::DataStore => self.from_database(user, node, &mut ctx)?,
            NodeKind::GlossaryTerm | NodeKind::Other => {}
        }
        tracing::debug!(node = %node.id, rungs = ctx.populated(), "context resolved");
        Ok(ctx)
    }

    /// Every context a node participates in: one for a ladder rung, one per
    /// assigned element for a glossary term, none otherwise.
    pub fn contexts_for(&self, user: &str, node: &Node) -> Result<Vec<Context>> {
        match self.kind(node) {
            NodeKind::GlossaryTerm => self.glossary_contexts(user, node),
            NodeKind::Other => Ok(Vec::new()),
            _ => Ok(vec![self.resolve(user, node)?]),
        }
    }

    /// Contexts of every element `term` is semantically assigned to, in the
    /// order the store lists the assignments.
    pub fn glossary_contexts(&self, user: &str, term: &Node) -> Result<Vec<Context>> {
        let filter = EdgeFilter::of_type(
            self.config.pivots.semantic_assignment.as_str(),
            &self.config.default_status,
        );
        let assignments = self.accessor.get_edges(user, &term.id, &filter)?;
        tracing::debug!(term = %term.id, assignments = assignments.len(), "glossary fan-out");

        let resolved = self
            .fan_out
            .map(&assignments, |edge| self.assigned_context(user, &term.id, edge));
        let mut contexts = Vec::with_capacity(resolved.len());
        for outcome in resolved {
            if let Some(ctx) = outcome? {
                contexts.push(ctx);
            }
        }
        Ok(contexts)
    }

    fn assigned_context(&self, user: &str, term_id: &str, edge: &Edge) -> Result<Option<Context>> {
        let target = match self.accessor.other_end(user, term_id, edge) {
            Ok(node) => node,
            Err(e) if e.is_absence() => {
                tracing::debug!(term = term_id, edge = %edge.id, "assigned element is gone");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        if !self.kind(&target).is_rung() {
            tracing::debug!(
                term = term_id,
                target = %target.id,
                target_type = target.type_name(),
                "assigned element is not on the lineage ladder"
            );
            return Ok(None);
        }
        self.resolve(user, &target).map(Some)
    }

    fn summary(&self, node: &Node) -> ElementSummary {
        ElementSummary {
            id: node.id.clone(),
            type_name: node.type_name().to_string(),
            qualified_name: node
                .string_property(&self.config.qualified_name_property)
                .map(str::to_string),
            display_name: node
                .string_property(&self.config.display_name_property)
                .map(str::to_string),
        }
    }

    fn from_column(&self, user: &str, column: &Node, ctx: &mut Context) -> Result<()> {
        ctx.column = Some(self.summary(column));
        let pivot = self.config.pivots.schema_attribute_type.as_str();
        let Some((table_type, via)) = self.hop(user, column, &Hop::along(pivot))? else {
            return Ok(());
        };
        let to_table = Hop {
            edge_type: pivot,
            arrived_by: Some(via.as_str()),
            towards: Some(self.config.types.table.as_str()),
        };
        let Some((table, _)) = self.hop(user, &table_type, &to_table)? else {
            return Ok(());
        };
        self.from_table(user, &table, ctx)
    }

    fn from_table(&self, user: &str, table: &Node, ctx: &mut Context) -> Result<()> {
        ctx.table = Some(self.summary(table));
        let pivots = &self.config.pivots;
        let Some((schema_type, via)) =
            self.hop(user, table, &Hop::along(&pivots.attribute_for_schema))?
        else {
            return Ok(());
        };
        let to_schema = Hop {
            arrived_by: Some(via.as_str()),
            ..Hop::along(&pivots.asset_schema_type)
        };
        let Some((schema, _)) = self.hop(user, &schema_type, &to_schema)? else {
            return Ok(());
        };
        self.from_schema(user, &schema, ctx)
    }

    fn from_schema(&self, user: &str, schema: &Node, ctx: &mut Context) -> Result<()> {
        ctx.schema = Some(self.summary(schema));
        let pivot = self.config.pivots.data_content_for_data_set.as_str();
        let Some((database, _)) = self.hop(user, schema, &Hop::along(pivot))? else {
            return Ok(());
        };
        self.from_database(user, &database, ctx)
    }

    fn from_database(&self, user: &str, database: &Node, ctx: &mut Context) -> Result<()> {
        ctx.database = Some(self.summary(database));
        let pivots = &self.config.pivots;
        let Some((connection, via)) =
            self.hop(user, database, &Hop::along(&pivots.connection_to_asset))?
        else {
            return Ok(());
        };
        ctx.connection = Some(self.summary(&connection));

        // Connector and endpoint hang off the connection independently.
        let to_connector = Hop {
            arrived_by: Some(via.as_str()),
            ..Hop::along(&pivots.connection_connector_type)
        };
        if let Some((connector, _)) = self.hop(user, &connection, &to_connector)? {
            ctx.connector = Some(self.summary(&connector));
        }
        let to_endpoint = Hop {
            arrived_by: Some(via.as_str()),
            ..Hop::along(&pivots.connection_endpoint)
        };
        if let Some((endpoint, _)) = self.hop(user, &connection, &to_endpoint)? {
            ctx.endpoint = Some(self.summary(&endpoint));
        }
        Ok(())
    }

    /// Follow one pivot edge from `from`. `Ok(None)` when the hop cannot be
    /// determined; the returned string is the id of the edge taken.
    fn hop(&self, user: &str, from: &Node, hop: &Hop<'_>) -> Result<Option<(Node, String)>> {
        let filter = EdgeFilter::of_type(hop.edge_type, &self.config.default_status);
        let edges = self.accessor.get_edges(user, &from.id, &filter)?;
        let catalog = self.accessor.catalog();
        let candidates: Vec<&Edge> = edges
            .iter()
            .filter(|e| hop.arrived_by.map_or(true, |id| e.id != id))
            .filter(|e| {
                hop.towards.map_or(true, |kind| {
                    let far = other_end_ref(&from.id, e);
                    catalog.is_kind_of(&far.type_ref.name, kind)
                })
            })
            .collect();

        let chosen = match (self.config.relationship_selection, candidates.as_slice()) {
            (_, []) => {
                tracing::debug!(node = %from.id, pivot = hop.edge_type, "no pivot edge");
                return Ok(None);
            }
            (_, [only]) => *only,
            (RelationshipSelection::First, [first, ..]) => *first,
            (RelationshipSelection::ExactlyOne, many) => {
                tracing::warn!(
                    node = %from.id,
                    pivot = hop.edge_type,
                    count = many.len(),
                    "ambiguous pivot edge, context stops here"
                );
                return Ok(None);
            }
        };

        match self.accessor.other_end(user, &from.id, chosen) {
            Ok(next) => Ok(Some((next, chosen.id.clone()))),
            Err(e) if e.is_absence() => {
                tracing::debug!(node = %from.id, edge = %chosen.id, "pivot edge leads nowhere");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

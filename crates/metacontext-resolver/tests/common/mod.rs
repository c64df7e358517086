#![allow(dead_code)]

use metacontext_graph::{
    Edge, EdgeQuery, EdgeSpec, MatchCriteria, MemoryStore, MetadataStore, Node, NodeQuery,
    NodeSpec, Properties, StoreError, StoreResult, TextMatch, TypeDef,
};
use std::sync::atomic::{AtomicBool, Ordering};

pub const USER: &str = "steward";

pub const LINEAGE_TYPES: &[(&str, Option<&str>)] = &[
    ("Referenceable", None),
    ("Asset", Some("Referenceable")),
    ("DataSet", Some("Asset")),
    ("DataStore", Some("Asset")),
    ("DeployedDatabaseSchema", Some("DataSet")),
    ("Connection", Some("Referenceable")),
    ("ConnectorType", Some("Referenceable")),
    ("Endpoint", Some("Referenceable")),
    ("SchemaElement", Some("Referenceable")),
    ("SchemaAttribute", Some("SchemaElement")),
    ("RelationalTable", Some("SchemaAttribute")),
    ("RelationalColumn", Some("SchemaAttribute")),
    ("SchemaType", Some("SchemaElement")),
    ("RelationalTableType", Some("SchemaType")),
    ("RelationalDBSchemaType", Some("SchemaType")),
    ("GlossaryTerm", Some("Referenceable")),
    ("SchemaAttributeType", None),
    ("AttributeForSchema", None),
    ("AssetSchemaType", None),
    ("DataContentForDataSet", None),
    ("ConnectionToAsset", None),
    ("ConnectionConnectorType", None),
    ("ConnectionEndpoint", None),
    ("SemanticAssignment", None),
];

/// Pivot edges of the full lineage, in ladder order.
pub const LINEAGE_EDGES: &[(&str, &str, &str, &str)] = &[
    ("sat-c", "SchemaAttributeType", "col-1", "tabletype-1"),
    ("sat-t", "SchemaAttributeType", "table-1", "tabletype-1"),
    ("afs", "AttributeForSchema", "table-1", "schematype-1"),
    ("ast", "AssetSchemaType", "schema-1", "schematype-1"),
    ("dcfds", "DataContentForDataSet", "db-1", "schema-1"),
    ("cta", "ConnectionToAsset", "conn-1", "db-1"),
    ("cct", "ConnectionConnectorType", "conn-1", "connector-1"),
    ("ce", "ConnectionEndpoint", "endpoint-1", "conn-1"),
];

pub fn typed_store() -> MemoryStore {
    let store = MemoryStore::new();
    for (name, parent) in LINEAGE_TYPES {
        store
            .define_type(TypeDef::new(format!("guid-{name}"), *name, *parent))
            .unwrap();
    }
    store
}

pub fn node(id: &str, type_name: &str, qualified_name: &str) -> NodeSpec {
    NodeSpec::new(id, type_name).with_property("qualifiedName", qualified_name)
}

/// The full ladder from `col-1` up to `endpoint-1`, with only the edges whose
/// ids are not in `skip`.
pub fn lineage_store_without(skip: &[&str]) -> MemoryStore {
    let store = typed_store();
    for spec in [
        node("col-1", "RelationalColumn", "sales.orders.customer_id"),
        node("tabletype-1", "RelationalTableType", "sales.orders.type"),
        node("table-1", "RelationalTable", "sales.orders"),
        node("schematype-1", "RelationalDBSchemaType", "sales.type"),
        node("schema-1", "DeployedDatabaseSchema", "sales"),
        node("db-1", "DataStore", "warehouse"),
        node("conn-1", "Connection", "warehouse.jdbc"),
        node("connector-1", "ConnectorType", "jdbc.connector"),
        node("endpoint-1", "Endpoint", "warehouse.example.net:5432"),
    ] {
        store.add_node(spec).unwrap();
    }
    for (id, type_name, one, two) in LINEAGE_EDGES {
        if !skip.contains(id) {
            store.add_edge(EdgeSpec::new(*id, *type_name, *one, *two)).unwrap();
        }
    }
    store
}

pub fn lineage_store() -> MemoryStore {
    lineage_store_without(&[])
}

/// Wraps a store and fails edge listings for one node with `Unavailable`
/// while armed. Neighborhood and linking-path queries are not supported.
pub struct FlakyStore {
    pub inner: MemoryStore,
    pub failing_node: String,
    pub armed: AtomicBool,
}

impl FlakyStore {
    pub fn new(inner: MemoryStore, failing_node: &str) -> Self {
        Self {
            inner,
            failing_node: failing_node.to_string(),
            armed: AtomicBool::new(true),
        }
    }

    pub fn disarm(&self) {
        self.armed.store(false, Ordering::SeqCst);
    }
}

impl MetadataStore for FlakyStore {
    fn get_node(&self, user: &str, id: &str) -> StoreResult<Option<Node>> {
        self.inner.get_node(user, id)
    }

    fn get_edge(&self, user: &str, id: &str) -> StoreResult<Option<Edge>> {
        self.inner.get_edge(user, id)
    }

    fn get_edges(&self, user: &str, node_id: &str, query: &EdgeQuery) -> StoreResult<Vec<Edge>> {
        if self.armed.load(Ordering::SeqCst) && node_id == self.failing_node {
            return Err(StoreError::Unavailable(format!(
                "edge listing for `{node_id}` timed out"
            )));
        }
        self.inner.get_edges(user, node_id, query)
    }

    fn find_nodes_by_classification(
        &self,
        user: &str,
        classification: &str,
        filter: &Properties,
        criteria: MatchCriteria,
        query: &NodeQuery,
    ) -> StoreResult<Vec<Node>> {
        self.inner
            .find_nodes_by_classification(user, classification, filter, criteria, query)
    }

    fn find_nodes_by_property(
        &self,
        user: &str,
        filter: &Properties,
        criteria: MatchCriteria,
        query: &NodeQuery,
    ) -> StoreResult<Vec<Node>> {
        self.inner.find_nodes_by_property(user, filter, criteria, query)
    }

    fn find_nodes_by_property_value(
        &self,
        user: &str,
        text: &TextMatch,
        query: &NodeQuery,
    ) -> StoreResult<Vec<Node>> {
        self.inner.find_nodes_by_property_value(user, text, query)
    }

    fn get_all_type_definitions(&self, user: &str) -> StoreResult<Vec<TypeDef>> {
        self.inner.get_all_type_definitions(user)
    }
}

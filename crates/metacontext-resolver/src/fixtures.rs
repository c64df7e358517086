//! Shared unit-test graphs.

use crate::accessor::Accessor;
use crate::catalog::TypeCatalog;
use crate::config::ResolverConfig;
use crate::context::ChainResolver;
use crate::fanout::FanOut;
use metacontext_graph::{EdgeSpec, MemoryStore, MetadataStore, NodeSpec, TypeDef};
use std::sync::Arc;

pub(crate) fn define_lineage_types(store: &MemoryStore) {
    let types = [
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
        ("Project", Some("Referenceable")),
        ("SchemaAttributeType", None),
        ("AttributeForSchema", None),
        ("AssetSchemaType", None),
        ("DataContentForDataSet", None),
        ("ConnectionToAsset", None),
        ("ConnectionConnectorType", None),
        ("ConnectionEndpoint", None),
        ("SemanticAssignment", None),
    ];
    for (name, parent) in types {
        store
            .define_type(TypeDef::new(format!("guid-{name}"), name, parent))
            .unwrap();
    }
}

fn named(id: &str, type_name: &str, qualified: &str, display: &str) -> NodeSpec {
    NodeSpec::new(id, type_name)
        .with_property("qualifiedName", qualified)
        .with_property("displayName", display)
}

/// Two columns of one table, up through schema, database, connection,
/// connector and endpoint, plus a glossary term assigned to a column and to
/// the table, and one to a node off the ladder.
pub(crate) fn lineage_store() -> MemoryStore {
    let store = MemoryStore::new();
    define_lineage_types(&store);
    let nodes = [
        named("col-1", "RelationalColumn", "hr.public.employee.id", "id"),
        named("col-2", "RelationalColumn", "hr.public.employee.name", "name"),
        named("tabletype-1", "RelationalTableType", "hr.public.employee.type", "employee type"),
        named("table-1", "RelationalTable", "hr.public.employee", "employee"),
        named("schematype-1", "RelationalDBSchemaType", "hr.public.type", "public type"),
        named("schema-1", "DeployedDatabaseSchema", "hr.public", "public"),
        named("db-1", "DataStore", "hr", "hr"),
        named("conn-1", "Connection", "hr.connection", "hr connection"),
        named("connector-1", "ConnectorType", "postgres.connector", "postgres"),
        named("endpoint-1", "Endpoint", "db.example.net:5432", "hr endpoint"),
        named("term-customer", "GlossaryTerm", "glossary.customer", "customer"),
        named("project-1", "Project", "project.migration", "migration"),
    ];
    for spec in nodes {
        store.add_node(spec).unwrap();
    }
    let edges = [
        ("sat-c1", "SchemaAttributeType", "col-1", "tabletype-1"),
        ("sat-c2", "SchemaAttributeType", "col-2", "tabletype-1"),
        ("sat-t", "SchemaAttributeType", "table-1", "tabletype-1"),
        ("afs-t", "AttributeForSchema", "table-1", "schematype-1"),
        ("ast-s", "AssetSchemaType", "schema-1", "schematype-1"),
        ("dcfds", "DataContentForDataSet", "db-1", "schema-1"),
        ("cta", "ConnectionToAsset", "conn-1", "db-1"),
        ("cct", "ConnectionConnectorType", "conn-1", "connector-1"),
        ("ce", "ConnectionEndpoint", "endpoint-1", "conn-1"),
        ("sa-col", "SemanticAssignment", "col-1", "term-customer"),
        ("sa-table", "SemanticAssignment", "table-1", "term-customer"),
        ("sa-project", "SemanticAssignment", "project-1", "term-customer"),
    ];
    for (id, type_name, one, two) in edges {
        store.add_edge(EdgeSpec::new(id, type_name, one, two)).unwrap();
    }
    store
}

pub(crate) fn chain_over<S: MetadataStore>(store: S, config: ResolverConfig) -> ChainResolver<S> {
    let catalog = TypeCatalog::load(&store, "tester").unwrap();
    let config = Arc::new(config);
    let fan_out = FanOut::new(config.fan_out_workers).unwrap();
    ChainResolver::new(
        Accessor::new(Arc::new(store), Arc::new(catalog)),
        config,
        fan_out,
    )
}

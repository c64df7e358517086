mod common;

use common::{lineage_store_without, LINEAGE_EDGES, USER};
use metacontext_graph::{Edge, EndRef, InstanceStatus, Properties, TypeDef, TypeRef};
use metacontext_resolver::{other_end_ref, Context, ResolverConfig, ResolverService, TypeCatalog};
use proptest::prelude::*;
use std::sync::Arc;

const MAX_TYPES: usize = 12;

/// Parent index per type; cycles and self-parents are allowed.
fn parents_strategy() -> impl Strategy<Value = Vec<Option<usize>>> {
    (1usize..=MAX_TYPES)
        .prop_flat_map(|n| prop::collection::vec(prop::option::of(0..n), n))
}

fn catalog_from(parents: &[Option<usize>]) -> TypeCatalog {
    TypeCatalog::from_definitions(parents.iter().enumerate().map(|(i, parent)| {
        let parent = parent.map(|j| format!("T{j}"));
        TypeDef::new(format!("g{i}"), format!("T{i}"), parent.as_deref())
    }))
}

/// Reference answer: walk parent pointers at most `n` steps.
fn reachable(parents: &[Option<usize>], from: usize, to: usize) -> bool {
    let mut current = from;
    for _ in 0..=parents.len() {
        if current == to {
            return true;
        }
        match parents[current] {
            Some(p) => current = p,
            None => return false,
        }
    }
    false
}

fn type_ref(name: &str) -> TypeRef {
    TypeRef {
        guid: format!("g-{name}"),
        name: name.to_string(),
        supertypes: Vec::new(),
    }
}

fn edge_between(one: &str, two: &str) -> Edge {
    Edge {
        id: "e".to_string(),
        type_ref: type_ref("Link"),
        end_one: EndRef {
            id: one.to_string(),
            type_ref: type_ref("Thing"),
        },
        end_two: EndRef {
            id: two.to_string(),
            type_ref: type_ref("Thing"),
        },
        properties: Properties::new(),
        status: InstanceStatus::Active,
    }
}

/// Which of the seven rungs are set, column first.
fn populated(ctx: &Context) -> [bool; 7] {
    [
        ctx.column.is_some(),
        ctx.table.is_some(),
        ctx.schema.is_some(),
        ctx.database.is_some(),
        ctx.connection.is_some(),
        ctx.connector.is_some(),
        ctx.endpoint.is_some(),
    ]
}

/// Rungs a column can still reach once the `removed` edges are gone.
fn reachable_rungs(removed: &[&str]) -> [bool; 7] {
    let gone = |id: &str| removed.contains(&id);
    let table = !gone("sat-c") && !gone("sat-t");
    let schema = table && !gone("afs") && !gone("ast");
    let database = schema && !gone("dcfds");
    let connection = database && !gone("cta");
    [
        true,
        table,
        schema,
        database,
        connection,
        connection && !gone("cct"),
        connection && !gone("ce"),
    ]
}

fn column_context(skip: &[&str]) -> Context {
    let config = ResolverConfig {
        fan_out_workers: 1,
        ..ResolverConfig::default()
    };
    let service =
        ResolverService::attach(Arc::new(lineage_store_without(skip)), config, USER).unwrap();
    let mut found = service.context(USER, "col-1").unwrap();
    assert_eq!(found.contexts.len(), 1);
    found.contexts.remove(0)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        failure_persistence: None,
        ..ProptestConfig::default()
    })]

    #[test]
    fn kind_of_terminates_and_matches_the_parent_walk(parents in parents_strategy()) {
        let catalog = catalog_from(&parents);
        for i in 0..parents.len() {
            let name = format!("T{i}");
            prop_assert!(catalog.is_kind_of(&name, &name));
            for j in 0..parents.len() {
                let ancestor = format!("T{j}");
                prop_assert_eq!(
                    catalog.is_kind_of(&name, &ancestor),
                    reachable(&parents, i, j),
                    "T{} kind of T{}", i, j
                );
            }
            prop_assert!(!catalog.is_kind_of(&name, "Unlisted"));
        }
    }

    #[test]
    fn supertypes_never_repeat(parents in parents_strategy()) {
        let catalog = catalog_from(&parents);
        for i in 0..parents.len() {
            let supers = catalog.supertypes(&format!("T{i}"));
            let mut dedup = supers.clone();
            dedup.sort();
            dedup.dedup();
            prop_assert_eq!(dedup.len(), supers.len());
            prop_assert!(supers.len() < parents.len());
        }
    }

    #[test]
    fn other_end_is_symmetric(a in "[a-z]{1,6}", b in "[a-z]{1,6}", stray in "[0-9]{1,4}") {
        let edge = edge_between(&a, &b);
        prop_assert_eq!(&other_end_ref(&a, &edge).id, &b);
        if a != b {
            prop_assert_eq!(&other_end_ref(&b, &edge).id, &a);
        }
        // Digits never collide with the letter ids: an unrelated anchor gets end one.
        prop_assert_eq!(&other_end_ref(&stray, &edge).id, &a);
    }

    #[test]
    fn removing_edges_only_unsets_rungs(
        removed in prop::sample::subsequence(
            LINEAGE_EDGES.iter().map(|(id, ..)| *id).collect::<Vec<&str>>(),
            0..=LINEAGE_EDGES.len(),
        )
    ) {
        let full = column_context(&[]);
        let reduced = column_context(&removed);
        let pairs = [
            (&full.column, &reduced.column),
            (&full.table, &reduced.table),
            (&full.schema, &reduced.schema),
            (&full.database, &reduced.database),
            (&full.connection, &reduced.connection),
            (&full.connector, &reduced.connector),
            (&full.endpoint, &reduced.endpoint),
        ];
        for (whole, part) in pairs {
            if let Some(part) = part {
                prop_assert_eq!(Some(part), whole.as_ref());
            }
        }
        prop_assert_eq!(populated(&reduced), reachable_rungs(&removed));
    }
}

#[test]
fn each_missing_edge_unsets_exactly_its_rung_and_those_above() {
    const T: bool = true;
    const F: bool = false;
    let expected: [(&str, [bool; 7]); 8] = [
        ("sat-c", [T, F, F, F, F, F, F]),
        ("sat-t", [T, F, F, F, F, F, F]),
        ("afs", [T, T, F, F, F, F, F]),
        ("ast", [T, T, F, F, F, F, F]),
        ("dcfds", [T, T, T, F, F, F, F]),
        ("cta", [T, T, T, T, F, F, F]),
        ("cct", [T, T, T, T, T, F, T]),
        ("ce", [T, T, T, T, T, T, F]),
    ];
    assert_eq!(expected.len(), LINEAGE_EDGES.len());
    assert_eq!(populated(&column_context(&[])), [T; 7]);
    for (edge, pattern) in expected {
        assert!(LINEAGE_EDGES.iter().any(|(id, ..)| *id == edge));
        assert_eq!(populated(&column_context(&[edge])), pattern, "without {edge}");
    }
}

//! Graph walks owned by the in-memory store: bounded neighborhood expansion
//! and shortest linking path. Edges are traversed in both directions.

use crate::memory::{GraphState, MemoryStore};
use crate::model::{status_admitted, Edge, InstanceStatus, Subgraph};
use crate::store::NeighborhoodQuery;
use ahash::{AHashMap, AHashSet};
use roaring::RoaringBitmap;
use std::collections::VecDeque;

impl MemoryStore {
    fn other_slot(&self, state: &GraphState, edge: &Edge, from: u32) -> Option<u32> {
        let here = &state.nodes[from as usize].id;
        let other = if &edge.end_one.id == here {
            &edge.end_two.id
        } else {
            &edge.end_one.id
        };
        self.node_slot(state, other)
    }

    pub(crate) fn expand(&self, state: &GraphState, query: &NeighborhoodQuery) -> Subgraph {
        let Some(origin) = self.node_slot(state, &query.origin) else {
            return Subgraph::default();
        };
        if !status_admitted(&query.status, state.nodes[origin as usize].status) {
            return Subgraph::default();
        }

        let node_kinds: Option<AHashSet<String>> = if query.node_type_guids.is_empty() {
            None
        } else {
            let mut kinds = AHashSet::new();
            for guid in &query.node_type_guids {
                if let Some(k) = self.kinds_for_guid(state, Some(guid)) {
                    kinds.extend(k);
                }
            }
            Some(kinds)
        };
        let edge_kinds: Option<AHashSet<String>> = if query.edge_type_names.is_empty() {
            None
        } else {
            let mut kinds = AHashSet::new();
            for name in &query.edge_type_names {
                kinds.extend(self.kind_closure(state, name));
            }
            Some(kinds)
        };

        let mut seen_nodes = RoaringBitmap::new();
        let mut seen_edges = RoaringBitmap::new();
        seen_nodes.insert(origin);
        let mut node_order = vec![origin];
        let mut edge_order = Vec::new();
        let mut frontier = vec![origin];

        for _ in 0..query.depth {
            let mut next = Vec::new();
            for &slot in &frontier {
                let Some(list) = state.adjacency.get(&slot) else {
                    continue;
                };
                for &e in list {
                    let Some(edge) = state.edges[e as usize].as_ref() else {
                        continue;
                    };
                    if !status_admitted(&query.status, edge.status) {
                        continue;
                    }
                    if edge_kinds.as_ref().map_or(false, |k| !k.contains(&edge.type_ref.name)) {
                        continue;
                    }
                    let Some(other) = self.other_slot(state, edge, slot) else {
                        continue;
                    };
                    let other_node = &state.nodes[other as usize];
                    if !status_admitted(&query.status, other_node.status) {
                        continue;
                    }
                    if other != origin
                        && node_kinds
                            .as_ref()
                            .map_or(false, |k| !k.contains(&other_node.type_ref.name))
                    {
                        continue;
                    }
                    if seen_edges.insert(e) {
                        edge_order.push(e);
                    }
                    if seen_nodes.insert(other) {
                        node_order.push(other);
                        next.push(other);
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            frontier = next;
        }

        Subgraph {
            nodes: node_order
                .into_iter()
                .map(|s| state.nodes[s as usize].clone())
                .collect(),
            edges: edge_order
                .into_iter()
                .filter_map(|e| state.edges[e as usize].clone())
                .collect(),
        }
    }

    /// Breadth-first shortest path. Returns an empty subgraph when either end
    /// is unknown or unreachable; a single node when `start == end`.
    pub(crate) fn shortest_path(
        &self,
        state: &GraphState,
        start: &str,
        end: &str,
        status: &[InstanceStatus],
    ) -> Subgraph {
        let (Some(from), Some(to)) = (self.node_slot(state, start), self.node_slot(state, end))
        else {
            return Subgraph::default();
        };
        let admitted = |slot: u32| status_admitted(status, state.nodes[slot as usize].status);
        if !admitted(from) || !admitted(to) {
            return Subgraph::default();
        }
        if from == to {
            return Subgraph {
                nodes: vec![state.nodes[from as usize].clone()],
                edges: Vec::new(),
            };
        }

        // slot -> (previous slot, edge slot)
        let mut parent: AHashMap<u32, (u32, u32)> = AHashMap::new();
        let mut visited = RoaringBitmap::new();
        visited.insert(from);
        let mut queue = VecDeque::from([from]);

        'search: while let Some(current) = queue.pop_front() {
            let Some(list) = state.adjacency.get(&current) else {
                continue;
            };
            for &e in list {
                let Some(edge) = state.edges[e as usize].as_ref() else {
                    continue;
                };
                if !status_admitted(status, edge.status) {
                    continue;
                }
                let Some(other) = self.other_slot(state, edge, current) else {
                    continue;
                };
                if !admitted(other) || !visited.insert(other) {
                    continue;
                }
                parent.insert(other, (current, e));
                if other == to {
                    break 'search;
                }
                queue.push_back(other);
            }
        }

        if !parent.contains_key(&to) {
            return Subgraph::default();
        }

        let mut node_slots = vec![to];
        let mut edge_slots = Vec::new();
        let mut cursor = to;
        while let Some(&(prev, e)) = parent.get(&cursor) {
            edge_slots.push(e);
            node_slots.push(prev);
            cursor = prev;
        }
        node_slots.reverse();
        edge_slots.reverse();

        Subgraph {
            nodes: node_slots
                .into_iter()
                .map(|s| state.nodes[s as usize].clone())
                .collect(),
            edges: edge_slots
                .into_iter()
                .filter_map(|e| state.edges[e as usize].clone())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{InstanceStatus, TypeDef};
    use crate::snapshot::{EdgeSpec, NodeSpec};
    use crate::store::{MetadataStore, NeighborhoodQuery};
    use crate::MemoryStore;

    /// a - b - c - d, plus a - x (x is a Glossary term)
    fn chain() -> MemoryStore {
        let store = MemoryStore::new();
        store.define_type(TypeDef::new("t-asset", "Asset", None)).unwrap();
        store.define_type(TypeDef::new("t-term", "GlossaryTerm", None)).unwrap();
        store.define_type(TypeDef::new("t-link", "Link", None)).unwrap();
        store.define_type(TypeDef::new("t-sem", "SemanticAssignment", None)).unwrap();
        for id in ["a", "b", "c", "d"] {
            store.add_node(NodeSpec::new(id, "Asset")).unwrap();
        }
        store.add_node(NodeSpec::new("x", "GlossaryTerm")).unwrap();
        store.add_edge(EdgeSpec::new("ab", "Link", "a", "b")).unwrap();
        store.add_edge(EdgeSpec::new("bc", "Link", "c", "b")).unwrap();
        store.add_edge(EdgeSpec::new("cd", "Link", "c", "d")).unwrap();
        store.add_edge(EdgeSpec::new("xa", "SemanticAssignment", "x", "a")).unwrap();
        store
    }

    fn ids(sub: &crate::Subgraph) -> Vec<&str> {
        let mut v: Vec<&str> = sub.nodes.iter().map(|n| n.id.as_str()).collect();
        v.sort();
        v
    }

    #[test]
    fn depth_zero_is_origin_only() {
        let store = chain();
        let sub = store
            .get_neighborhood(
                "u",
                &NeighborhoodQuery {
                    origin: "b".to_string(),
                    depth: 0,
                    ..NeighborhoodQuery::default()
                },
            )
            .unwrap();
        assert_eq!(ids(&sub), vec!["b"]);
        assert!(sub.edges.is_empty());
    }

    #[test]
    fn depth_one_is_direct_neighbors_in_both_directions() {
        let store = chain();
        let sub = store
            .get_neighborhood(
                "u",
                &NeighborhoodQuery {
                    origin: "b".to_string(),
                    depth: 1,
                    ..NeighborhoodQuery::default()
                },
            )
            .unwrap();
        assert_eq!(ids(&sub), vec!["a", "b", "c"]);
        assert_eq!(sub.edges.len(), 2);
    }

    #[test]
    fn filters_restrict_expansion() {
        let store = chain();
        let sub = store
            .get_neighborhood(
                "u",
                &NeighborhoodQuery {
                    origin: "a".to_string(),
                    edge_type_names: vec!["SemanticAssignment".to_string()],
                    depth: 3,
                    ..NeighborhoodQuery::default()
                },
            )
            .unwrap();
        assert_eq!(ids(&sub), vec!["a", "x"]);

        let sub = store
            .get_neighborhood(
                "u",
                &NeighborhoodQuery {
                    origin: "a".to_string(),
                    node_type_guids: vec!["t-asset".to_string()],
                    depth: 5,
                    ..NeighborhoodQuery::default()
                },
            )
            .unwrap();
        assert_eq!(ids(&sub), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn shortest_path_walks_edges_regardless_of_direction() {
        let store = chain();
        let sub = store.get_linking_path("u", "a", "d", &[]).unwrap();
        let order: Vec<&str> = sub.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(order, vec!["a", "b", "c", "d"]);
        let edges: Vec<&str> = sub.edges.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(edges, vec!["ab", "bc", "cd"]);
    }

    #[test]
    fn deleted_edges_break_paths() {
        let store = chain();
        store
            .add_node(NodeSpec::new("island", "Asset"))
            .unwrap();
        store
            .add_edge(EdgeSpec::new("gone", "Link", "d", "island").with_status(InstanceStatus::Deleted))
            .unwrap();
        assert!(store.get_linking_path("u", "a", "island", &[]).unwrap().is_empty());
        let with_deleted = store
            .get_linking_path("u", "a", "island", &[InstanceStatus::Active, InstanceStatus::Deleted])
            .unwrap();
        assert_eq!(with_deleted.edges.len(), 4);
    }
}

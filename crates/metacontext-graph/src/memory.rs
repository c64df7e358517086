//! In-memory metadata store.
//!
//! Nodes and edges live in slot vectors with hash/bitmap indexes on top:
//!
//! ```text
//! node id ──► slot ──► Node
//!               │
//!               ├──► adjacency ──► edge slots ──► Edge
//!               │
//! type name ────┴──► RoaringBitmap of node slots (type index)
//! classification ──► RoaringBitmap of node slots
//! ```
//!
//! The store is safe to share across threads; writes take a short exclusive
//! lock, reads a shared one.

use crate::interner::{Sym, SymbolTable};
use crate::model::{
    status_admitted, Edge, EndRef, InstanceStatus, MatchCriteria, Node, Properties,
    SequencingOrder, Subgraph, TypeDef, TypeRef,
};
use crate::snapshot::{EdgeSpec, GraphSnapshot, NodeSpec};
use crate::store::{
    EdgeQuery, MetadataStore, NeighborhoodQuery, NodeQuery, StoreError, StoreResult, TextMatch,
};
use ahash::{AHashMap, AHashSet};
use parking_lot::RwLock;
use roaring::RoaringBitmap;
use std::cmp::Reverse;
use uuid::Uuid;

/// Upper bound on supertype hops when expanding a type reference.
const MAX_TYPE_DEPTH: usize = 64;

#[derive(Debug, Default)]
pub(crate) struct GraphState {
    /// type name -> definition
    pub(crate) types: AHashMap<Sym, TypeDef>,
    /// type guid -> type name
    pub(crate) type_guids: AHashMap<String, Sym>,
    pub(crate) nodes: Vec<Node>,
    pub(crate) node_slots: AHashMap<Sym, u32>,
    /// Removed edges leave a `None` so slots stay stable.
    pub(crate) edges: Vec<Option<Edge>>,
    pub(crate) edge_slots: AHashMap<Sym, u32>,
    pub(crate) adjacency: AHashMap<u32, Vec<u32>>,
    pub(crate) type_index: AHashMap<Sym, RoaringBitmap>,
    pub(crate) classification_index: AHashMap<Sym, RoaringBitmap>,
}

/// Index-backed metadata store held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub(crate) symbols: SymbolTable,
    pub(crate) state: RwLock<GraphState>,
    authorized_users: Option<AHashSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only the listed users may query; everyone else gets `Unauthorized`.
    pub fn with_authorized_users<I, U>(mut self, users: I) -> Self
    where
        I: IntoIterator<Item = U>,
        U: Into<String>,
    {
        self.authorized_users = Some(users.into_iter().map(Into::into).collect());
        self
    }

    pub fn from_snapshot(snapshot: &GraphSnapshot) -> StoreResult<Self> {
        let store = Self::new();
        for def in &snapshot.types {
            store.define_type(def.clone())?;
        }
        for node in &snapshot.nodes {
            store.add_node(node.clone())?;
        }
        for edge in &snapshot.edges {
            store.add_edge(edge.clone())?;
        }
        tracing::debug!(
            types = snapshot.types.len(),
            nodes = snapshot.nodes.len(),
            edges = snapshot.edges.len(),
            "loaded graph snapshot"
        );
        Ok(store)
    }

    pub fn from_json_str(text: &str) -> StoreResult<Self> {
        let snapshot = GraphSnapshot::from_json_str(text)
            .map_err(|e| StoreError::InvalidParameter(format!("malformed snapshot: {e}")))?;
        Self::from_snapshot(&snapshot)
    }

    /// Export the current contents; removed edges are omitted.
    pub fn to_snapshot(&self) -> GraphSnapshot {
        let state = self.state.read();
        let mut types: Vec<TypeDef> = state.types.values().cloned().collect();
        types.sort_by(|a, b| a.name.cmp(&b.name));
        let nodes = state
            .nodes
            .iter()
            .map(|n| NodeSpec {
                id: Some(n.id.clone()),
                type_name: n.type_ref.name.clone(),
                properties: n.properties.clone(),
                classifications: n.classifications.clone(),
                status: n.status,
                created_at: n.created_at,
                updated_at: n.updated_at,
            })
            .collect();
        let edges = state
            .edges
            .iter()
            .flatten()
            .map(|e| EdgeSpec {
                id: Some(e.id.clone()),
                type_name: e.type_ref.name.clone(),
                end_one: e.end_one.id.clone(),
                end_two: e.end_two.id.clone(),
                properties: e.properties.clone(),
                status: e.status,
            })
            .collect();
        GraphSnapshot {
            types,
            nodes,
            edges,
        }
    }

    pub fn node_count(&self) -> usize {
        self.state.read().nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.state.read().edges.iter().flatten().count()
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Register a type. A missing guid is generated. Supertypes may be
    /// registered later; dangling names simply end the chain.
    pub fn define_type(&self, mut def: TypeDef) -> StoreResult<TypeDef> {
        if def.name.trim().is_empty() {
            return Err(StoreError::InvalidParameter("type name is empty".to_string()));
        }
        if def.guid.is_empty() {
            def.guid = Uuid::new_v4().to_string();
        }
        let name = self.symbols.intern(&def.name);
        let mut state = self.state.write();
        if state.types.contains_key(&name) {
            return Err(StoreError::InvalidParameter(format!(
                "type `{}` is already defined",
                def.name
            )));
        }
        state.type_guids.insert(def.guid.clone(), name);
        state.types.insert(name, def.clone());
        Ok(def)
    }

    pub fn add_node(&self, spec: NodeSpec) -> StoreResult<String> {
        let id = spec.id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let id_sym = self.symbols.intern(&id);
        let type_sym = self.symbols.intern(&spec.type_name);
        let mut state = self.state.write();
        if state.node_slots.contains_key(&id_sym) {
            return Err(StoreError::InvalidParameter(format!(
                "node `{id}` already exists"
            )));
        }
        let type_ref = self.type_ref(&state, &spec.type_name)?;

        let slot = state.nodes.len() as u32;
        state.node_slots.insert(id_sym, slot);
        state.type_index.entry(type_sym).or_default().insert(slot);
        for c in &spec.classifications {
            let c_sym = self.symbols.intern(&c.name);
            state.classification_index.entry(c_sym).or_default().insert(slot);
        }
        state.nodes.push(Node {
            id: id.clone(),
            type_ref,
            properties: spec.properties,
            classifications: spec.classifications,
            status: spec.status,
            created_at: spec.created_at,
            updated_at: spec.updated_at,
        });
        Ok(id)
    }

    pub fn add_edge(&self, spec: EdgeSpec) -> StoreResult<String> {
        let id = spec.id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let id_sym = self.symbols.intern(&id);
        let mut state = self.state.write();
        if state.edge_slots.contains_key(&id_sym) {
            return Err(StoreError::InvalidParameter(format!(
                "edge `{id}` already exists"
            )));
        }
        let type_ref = self.type_ref(&state, &spec.type_name)?;
        let one = self.node_slot(&state, &spec.end_one).ok_or_else(|| {
            StoreError::InvalidParameter(format!("edge `{id}`: unknown end `{}`", spec.end_one))
        })?;
        let two = self.node_slot(&state, &spec.end_two).ok_or_else(|| {
            StoreError::InvalidParameter(format!("edge `{id}`: unknown end `{}`", spec.end_two))
        })?;
        let end_one = end_ref(&state.nodes[one as usize]);
        let end_two = end_ref(&state.nodes[two as usize]);

        let slot = state.edges.len() as u32;
        state.edge_slots.insert(id_sym, slot);
        state.adjacency.entry(one).or_default().push(slot);
        if two != one {
            state.adjacency.entry(two).or_default().push(slot);
        }
        state.edges.push(Some(Edge {
            id: id.clone(),
            type_ref,
            end_one,
            end_two,
            properties: spec.properties,
            status: spec.status,
        }));
        Ok(id)
    }

    /// Remove an edge; returns whether it existed.
    pub fn remove_edge(&self, id: &str) -> bool {
        let Some(id_sym) = self.symbols.get(id) else {
            return false;
        };
        let mut state = self.state.write();
        let Some(slot) = state.edge_slots.remove(&id_sym) else {
            return false;
        };
        state.edges[slot as usize] = None;
        for list in state.adjacency.values_mut() {
            list.retain(|&e| e != slot);
        }
        true
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn check_user(&self, user: &str) -> StoreResult<()> {
        match &self.authorized_users {
            Some(allowed) if !allowed.contains(user) => Err(StoreError::Unauthorized {
                user: user.to_string(),
                reason: "not on the store's access list".to_string(),
            }),
            _ => Ok(()),
        }
    }

    pub(crate) fn node_slot(&self, state: &GraphState, id: &str) -> Option<u32> {
        let sym = self.symbols.get(id)?;
        state.node_slots.get(&sym).copied()
    }

    /// Build a type reference with its root-first supertype chain.
    fn type_ref(&self, state: &GraphState, name: &str) -> StoreResult<TypeRef> {
        let def = self
            .symbols
            .get(name)
            .and_then(|sym| state.types.get(&sym))
            .ok_or_else(|| StoreError::InvalidParameter(format!("unknown type `{name}`")))?;

        let mut chain = Vec::new();
        let mut seen = AHashSet::new();
        seen.insert(def.name.clone());
        let mut next = def.super_type.clone();
        while let Some(parent) = next {
            if !seen.insert(parent.clone()) || chain.len() >= MAX_TYPE_DEPTH {
                tracing::warn!(type_name = %name, "supertype cycle while building type reference");
                break;
            }
            next = self
                .symbols
                .get(&parent)
                .and_then(|sym| state.types.get(&sym))
                .and_then(|d| d.super_type.clone());
            chain.push(parent);
        }
        chain.reverse();

        Ok(TypeRef {
            guid: def.guid.clone(),
            name: def.name.clone(),
            supertypes: chain,
        })
    }

    /// Names of `root` and every type that has `root` somewhere up its chain.
    pub(crate) fn kind_closure(&self, state: &GraphState, root: &str) -> AHashSet<String> {
        let mut out = AHashSet::new();
        out.insert(root.to_string());
        for def in state.types.values() {
            let mut seen = AHashSet::new();
            let mut current = Some(def.name.clone());
            while let Some(name) = current {
                if !seen.insert(name.clone()) {
                    break;
                }
                if name == root {
                    out.insert(def.name.clone());
                    break;
                }
                current = self
                    .symbols
                    .get(&name)
                    .and_then(|sym| state.types.get(&sym))
                    .and_then(|d| d.super_type.clone());
            }
        }
        out
    }

    /// Type names admitted by a guid filter. `None` means "no filter";
    /// an unknown guid admits nothing.
    pub(crate) fn kinds_for_guid(
        &self,
        state: &GraphState,
        guid: Option<&str>,
    ) -> Option<AHashSet<String>> {
        let guid = guid?;
        match state
            .type_guids
            .get(guid)
            .and_then(|sym| self.symbols.resolve(*sym))
        {
            Some(name) => Some(self.kind_closure(state, &name)),
            None => Some(AHashSet::new()),
        }
    }

    fn candidate_slots(&self, state: &GraphState, kinds: Option<&AHashSet<String>>) -> RoaringBitmap {
        match kinds {
            None => (0..state.nodes.len() as u32).collect(),
            Some(kinds) => {
                let mut out = RoaringBitmap::new();
                for name in kinds {
                    if let Some(bits) = self.symbols.get(name).and_then(|s| state.type_index.get(&s)) {
                        out |= bits;
                    }
                }
                out
            }
        }
    }

    fn finish_nodes(&self, state: &GraphState, slots: RoaringBitmap, query: &NodeQuery) -> Vec<Node> {
        let mut nodes: Vec<Node> = slots
            .iter()
            .filter_map(|s| state.nodes.get(s as usize))
            .filter(|n| status_admitted(&query.status, n.status))
            .cloned()
            .collect();
        sequence_nodes(&mut nodes, &query.sequencing);
        query.paging.apply(nodes)
    }
}

fn end_ref(node: &Node) -> EndRef {
    EndRef {
        id: node.id.clone(),
        type_ref: node.type_ref.clone(),
    }
}

fn properties_match(props: &Properties, filter: &Properties, criteria: MatchCriteria) -> bool {
    if filter.is_empty() {
        return true;
    }
    let mut hits = filter.iter().map(|(k, v)| props.get(k) == Some(v));
    match criteria {
        MatchCriteria::All => hits.all(|h| h),
        MatchCriteria::Any => hits.any(|h| h),
        MatchCriteria::None => !hits.any(|h| h),
    }
}

pub(crate) fn sequence_nodes(nodes: &mut [Node], order: &SequencingOrder) {
    match order {
        SequencingOrder::Any => {}
        SequencingOrder::Guid => nodes.sort_by(|a, b| a.id.cmp(&b.id)),
        SequencingOrder::CreationRecent => nodes.sort_by_key(|n| Reverse(n.created_at)),
        SequencingOrder::CreationOldest => nodes.sort_by_key(|n| n.created_at),
        SequencingOrder::UpdateRecent => nodes.sort_by_key(|n| Reverse(n.updated_at)),
        SequencingOrder::UpdateOldest => nodes.sort_by_key(|n| n.updated_at),
        SequencingOrder::PropertyAscending(p) => {
            nodes.sort_by_key(|n| n.property(p).map(|v| v.sort_key()))
        }
        SequencingOrder::PropertyDescending(p) => {
            nodes.sort_by_key(|n| Reverse(n.property(p).map(|v| v.sort_key())))
        }
    }
}

fn sequence_edges(edges: &mut [Edge], order: &SequencingOrder) {
    match order {
        SequencingOrder::Guid => edges.sort_by(|a, b| a.id.cmp(&b.id)),
        SequencingOrder::PropertyAscending(p) => {
            edges.sort_by_key(|e| e.properties.get(p).map(|v| v.sort_key()))
        }
        SequencingOrder::PropertyDescending(p) => {
            edges.sort_by_key(|e| Reverse(e.properties.get(p).map(|v| v.sort_key())))
        }
        // Edges carry no timestamps; insertion order stands.
        _ => {}
    }
}

impl MetadataStore for MemoryStore {
    fn get_node(&self, user: &str, id: &str) -> StoreResult<Option<Node>> {
        self.check_user(user)?;
        let state = self.state.read();
        Ok(self
            .node_slot(&state, id)
            .and_then(|slot| state.nodes.get(slot as usize))
            .cloned())
    }

    fn get_edge(&self, user: &str, id: &str) -> StoreResult<Option<Edge>> {
        self.check_user(user)?;
        let state = self.state.read();
        Ok(self
            .symbols
            .get(id)
            .and_then(|sym| state.edge_slots.get(&sym))
            .and_then(|&slot| state.edges[slot as usize].clone()))
    }

    fn get_edges(&self, user: &str, node_id: &str, query: &EdgeQuery) -> StoreResult<Vec<Edge>> {
        self.check_user(user)?;
        let state = self.state.read();
        let Some(slot) = self.node_slot(&state, node_id) else {
            return Ok(Vec::new());
        };
        let kinds = self.kinds_for_guid(&state, query.type_guid.as_deref());
        let mut edges: Vec<Edge> = state
            .adjacency
            .get(&slot)
            .map(|list| {
                list.iter()
                    .filter_map(|&e| state.edges[e as usize].as_ref())
                    .filter(|e| status_admitted(&query.status, e.status))
                    .filter(|e| kinds.as_ref().map_or(true, |k| k.contains(&e.type_ref.name)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        sequence_edges(&mut edges, &query.sequencing);
        Ok(query.paging.apply(edges))
    }

    fn find_nodes_by_classification(
        &self,
        user: &str,
        classification: &str,
        filter: &Properties,
        criteria: MatchCriteria,
        query: &NodeQuery,
    ) -> StoreResult<Vec<Node>> {
        self.check_user(user)?;
        let state = self.state.read();
        let Some(classified) = self
            .symbols
            .get(classification)
            .and_then(|sym| state.classification_index.get(&sym))
        else {
            return Ok(Vec::new());
        };
        let kinds = self.kinds_for_guid(&state, query.type_guid.as_deref());
        let slots: RoaringBitmap = (self.candidate_slots(&state, kinds.as_ref()) & classified)
            .iter()
            .filter(|&s| {
                state.nodes[s as usize]
                    .classification(classification)
                    .map_or(false, |c| properties_match(&c.properties, filter, criteria))
            })
            .collect();
        Ok(self.finish_nodes(&state, slots, query))
    }

    fn find_nodes_by_property(
        &self,
        user: &str,
        filter: &Properties,
        criteria: MatchCriteria,
        query: &NodeQuery,
    ) -> StoreResult<Vec<Node>> {
        self.check_user(user)?;
        let state = self.state.read();
        let kinds = self.kinds_for_guid(&state, query.type_guid.as_deref());
        let slots: RoaringBitmap = self
            .candidate_slots(&state, kinds.as_ref())
            .iter()
            .filter(|&s| properties_match(&state.nodes[s as usize].properties, filter, criteria))
            .collect();
        Ok(self.finish_nodes(&state, slots, query))
    }

    fn find_nodes_by_property_value(
        &self,
        user: &str,
        text: &TextMatch,
        query: &NodeQuery,
    ) -> StoreResult<Vec<Node>> {
        self.check_user(user)?;
        if text.pattern.trim().is_empty() {
            return Err(StoreError::InvalidParameter("empty search pattern".to_string()));
        }
        let state = self.state.read();
        let kinds = self.kinds_for_guid(&state, query.type_guid.as_deref());
        let slots: RoaringBitmap = self
            .candidate_slots(&state, kinds.as_ref())
            .iter()
            .filter(|&s| {
                state.nodes[s as usize]
                    .properties
                    .values()
                    .filter_map(|v| v.as_str())
                    .any(|v| text.matches(v))
            })
            .collect();
        Ok(self.finish_nodes(&state, slots, query))
    }

    fn get_neighborhood(&self, user: &str, query: &NeighborhoodQuery) -> StoreResult<Subgraph> {
        self.check_user(user)?;
        let state = self.state.read();
        Ok(self.expand(&state, query))
    }

    fn get_linking_path(
        &self,
        user: &str,
        start: &str,
        end: &str,
        status: &[InstanceStatus],
    ) -> StoreResult<Subgraph> {
        self.check_user(user)?;
        let state = self.state.read();
        Ok(self.shortest_path(&state, start, end, status))
    }

    fn get_all_type_definitions(&self, user: &str) -> StoreResult<Vec<TypeDef>> {
        self.check_user(user)?;
        let state = self.state.read();
        let mut defs: Vec<TypeDef> = state.types.values().cloned().collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(defs)
    }

    fn get_type_by_name(&self, user: &str, name: &str) -> StoreResult<Option<TypeDef>> {
        self.check_user(user)?;
        let state = self.state.read();
        Ok(self
            .symbols
            .get(name)
            .and_then(|sym| state.types.get(&sym))
            .cloned())
    }

    fn get_type_by_guid(&self, user: &str, guid: &str) -> StoreResult<Option<TypeDef>> {
        self.check_user(user)?;
        let state = self.state.read();
        Ok(state
            .type_guids
            .get(guid)
            .and_then(|sym| state.types.get(sym))
            .cloned())
    }
}

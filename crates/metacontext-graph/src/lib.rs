//! Metadata Graph: the typed property graph seen by the context resolver.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  model        Node / Edge / TypeRef / PropertyValue      │
//! │  store        MetadataStore trait (query-only)           │
//! │  memory       MemoryStore: interned, bitmap-indexed      │
//! │  traverse     neighborhood BFS + shortest linking path   │
//! │  snapshot     JSON GraphSnapshot <-> MemoryStore         │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Entities are catalogued assets, schema elements and glossary terms; edges
//! are typed relationships between them. A resolver only ever reads through
//! [`MetadataStore`]; persistence, federation and transactions belong to the
//! store implementation.

pub mod interner;
pub mod memory;
pub mod model;
pub mod snapshot;
pub mod store;
mod traverse;

pub use memory::MemoryStore;
pub use model::{
    status_admitted, Classification, Edge, EndRef, InstanceStatus, MatchCriteria, Node, Paging,
    Properties, PropertyValue, SequencingOrder, Subgraph, TypeCategory, TypeDef, TypeRef,
};
pub use snapshot::{EdgeSpec, GraphSnapshot, NodeSpec};
pub use store::{
    EdgeQuery, MetadataStore, NeighborhoodQuery, NodeQuery, StoreError, StoreResult, TextMatch,
};

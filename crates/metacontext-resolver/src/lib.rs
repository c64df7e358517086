//! Context resolution over a typed metadata graph.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  ResolverService   exposed operations, FailureDescriptor out │
//! ├──────────────────────────────────────────────────────────────┤
//! │  SearchDispatcher  free-text search + finders                │
//! │  ChainResolver     column → … → endpoint lineage, glossary   │
//! │  Explorer          neighborhood, linking path, relationships │
//! ├──────────────────────────────────────────────────────────────┤
//! │  Accessor + pair   node/edge reads, far end of an edge       │
//! │  TypeCatalog       type names, guids, supertype closure      │
//! ├──────────────────────────────────────────────────────────────┤
//! │  metacontext_graph::MetadataStore                            │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The resolver holds no graph state of its own beyond the type catalog
//! loaded at attach time; every other read is a live store call made as the
//! requesting user.
//!
//! ```no_run
//! use metacontext_graph::MemoryStore;
//! use metacontext_resolver::{ResolverConfig, ResolverService};
//! use std::sync::Arc;
//!
//! let store = Arc::new(MemoryStore::from_json_str("{}").unwrap());
//! let service = ResolverService::attach(store, ResolverConfig::default(), "admin").unwrap();
//! match service.context("admin", "col-1") {
//!     Ok(found) => println!("{} contexts", found.contexts.len()),
//!     Err(failure) => eprintln!("{failure}"),
//! }
//! ```

pub mod accessor;
pub mod catalog;
pub mod config;
pub mod context;
pub mod error;
pub mod explorer;
mod fanout;
pub mod pair;
pub mod search;
pub mod service;

#[cfg(test)]
mod fixtures;

pub use accessor::{Accessor, EdgeFilter};
pub use catalog::TypeCatalog;
pub use config::{
    ChainTypeNames, HitFailurePolicy, PivotEdgeNames, RelationshipSelection, ResolverConfig,
};
pub use context::{ChainResolver, Context, ContextualNode, ElementSummary, NodeKind};
pub use error::{ErrorKind, FailureDescriptor, ResolverError, Result};
pub use explorer::{Explorer, NeighborhoodRequest, RelationshipRequest};
pub use pair::other_end_ref;
pub use search::{FinderOptions, SearchDispatcher, SearchParameters};
pub use service::{ResolverService, ServiceResult};

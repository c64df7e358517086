//! Given an anchor node and an edge attached to it, find the node at the
//! far end.

use crate::accessor::Accessor;
use crate::error::Result;
use metacontext_graph::{Edge, EndRef, MetadataStore, Node};

/// The end of `edge` that is not `anchor`. When `anchor` is end one the
/// answer is end two; in every other case, including an anchor that matches
/// neither end, the answer is end one.
pub fn other_end_ref<'e>(anchor: &str, edge: &'e Edge) -> &'e EndRef {
    if edge.end_one.id == anchor {
        &edge.end_two
    } else {
        &edge.end_one
    }
}

impl<S: MetadataStore + ?Sized> Accessor<S> {
    /// Fetch the full node at the far end of `edge` as seen from `anchor`.
    pub fn other_end(&self, user: &str, anchor: &str, edge: &Edge) -> Result<Node> {
        if !edge.touches(anchor) {
            tracing::warn!(
                anchor,
                edge = %edge.id,
                end_one = %edge.end_one.id,
                end_two = %edge.end_two.id,
                "edge does not touch its anchor, taking end one"
            );
        }
        let far = other_end_ref(anchor, edge);
        self.get_node(user, &far.id)
    }
}

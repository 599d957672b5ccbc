//! Helper functions for pattern matching.

use crate::graph::{Graph, NodeId};
use crate::types::Value;

/// Extract the scalar or tensor constant held by a node.
#[inline]
pub fn try_const(graph: &Graph, id: NodeId) -> Option<&Value> {
    graph.value(id).filter(|v| v.is_constant())
}

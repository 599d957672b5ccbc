//! Pattern matching and rule dispatch over graph nodes.
//!
//! [`Pat`] describes the shape of a subgraph, [`RuleSet`] pairs patterns with
//! pure rewrite functions that return a [`Build`] description, and the
//! [`Rewriter`] trait is the entry point an optimizer driver calls once per
//! candidate node.

pub mod build;
pub mod helpers;
pub mod matcher;
pub mod upat;

#[macro_use]
pub mod macros;

use crate::graph::{Graph, NodeId};

// =============================================================================
// RewriteResult - Result of pattern matching
// =============================================================================

/// Result of applying a rewrite to one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteResult {
    /// No rule matched, or every matching rule declined. The graph is untouched.
    NoMatch,
    /// The driver should substitute the returned node for the candidate.
    Rewritten(NodeId),
}

impl RewriteResult {
    pub fn is_match(&self) -> bool {
        matches!(self, RewriteResult::Rewritten(_))
    }

    pub fn replacement(&self) -> Option<NodeId> {
        match self {
            RewriteResult::Rewritten(id) => Some(*id),
            RewriteResult::NoMatch => None,
        }
    }
}

// =============================================================================
// Pattern Exports
// =============================================================================

pub use build::{Build, Operator};
pub use helpers::try_const;
pub use matcher::{RewriteFn, RuleSet};
pub use upat::{BindingStore, BindingStoreExt, ConstKind, NodePredicate, Pat, VarIntern};

// =============================================================================
// Rewriter Trait - Unified interface for rewrite passes
// =============================================================================

/// A rewrite pass applied by an external driver to one node at a time.
///
/// Implementations must leave the graph untouched when returning
/// [`RewriteResult::NoMatch`].
pub trait Rewriter {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Attempt to rewrite `node`.
    fn rewrite(&self, graph: &mut Graph, node: NodeId) -> RewriteResult;
}

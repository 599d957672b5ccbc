//! Dataflow-graph IR for the Graft optimizer.
//!
//! This crate defines the node model that the simplification passes rewrite,
//! together with the pattern matching infrastructure they are written in.
//!
//! # Module Organization
//!
//! - [`types`] - Constant payloads (ConstValue, Tensor, Value)
//! - [`op`] - Primitive operator identifiers
//! - [`graph`] - Node arena, subgraphs and the reverse-user index
//! - [`eval`] - Element-wise constant arithmetic
//! - [`pattern`] - Pattern DSL, rule sets and the `Rewriter` seam
//! - [`error`] - Error types and result handling

pub mod error;
pub mod eval;
pub mod graph;
pub mod op;
pub mod types;

#[macro_use]
pub mod pattern;


// All types remain accessible at the crate root
pub use error::{Error, Result};
pub use graph::{Graph, Node, NodeId, NodeKind, Operands, SubgraphId, Use};
pub use op::Primitive;
pub use types::{ConstValue, Shape, Tensor, Value};

// Re-export pattern matching and rewriting infrastructure
pub use pattern::{
    BindingStore, BindingStoreExt, Build, ConstKind, NodePredicate, Operator, Pat, RewriteResult, Rewriter, RuleSet,
    VarIntern,
};

// Re-export external types for convenience
pub use graft_dtype::DType;

//! Arithmetic simplification passes over the graft IR.
//!
//! Every pass implements [`Rewriter`]: it looks at one candidate node and
//! either returns a replacement or reports no match. Iterating to a fixed
//! point and substituting replacements is left to the optimizer driver.
//!
//! # Module Organization
//!
//! - [`arithmetic`] - Identity rules and constant-factor merging
//! - [`fold`] - Compile-time constant multiplication
//! - [`all_reduce`] - Reordering additions before collective reductions
//! - [`config`] - Pass configuration

pub mod all_reduce;
pub mod arithmetic;
pub mod config;
pub mod fold;


pub use all_reduce::AllReduceReorder;
pub use arithmetic::{arithmetic_simplify, arithmetic_simplify_zero};
pub use config::{DEFAULT_FOLD_MAX_ELEMENTS, SimplifyConfig};
pub use fold::ConstantFolder;

use graft_ir::Rewriter;

/// Enabled passes in the order a driver should apply them.
///
/// The zero-absorbing rules come after the identity rules so that constant
/// merging sees the original factors first.
pub fn passes(config: &SimplifyConfig) -> Vec<Box<dyn Rewriter>> {
    let mut passes: Vec<Box<dyn Rewriter>> =
        vec![Box::new(arithmetic_simplify(config)), Box::new(arithmetic_simplify_zero())];
    if config.allreduce_reorder {
        passes.push(Box::new(AllReduceReorder::new()));
    }
    tracing::debug!(count = passes.len(), "simplification passes");
    passes
}

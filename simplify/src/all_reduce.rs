//! Move an addition in front of a collective reduction.
//!
//! ```text
//! AddN(MakeTuple(Mul(AllReduce(X), Y), Z))  ->  Mul(AllReduce(AddN(MakeTuple(Z, X))), Y)
//! ```
//!
//! The addition then runs once per worker before the reduction instead of
//! after it. Every other reader of the original tuple is pointed at the new
//! `AllReduce` node, so it observes the reduced value.
//!
//! That redirection assumes those readers want the reduced sum. A reader that
//! relied on the pre-reduction tuple (a per-worker loss monitor, for example)
//! silently changes meaning after this pass.

use graft_ir::{Graph, NodeId, Pat, Result, RewriteResult, Rewriter, SubgraphId, Use, VarIntern};
use tracing::{debug, trace};

/// Bindings of one accepted match. Built fresh for every candidate.
#[derive(Debug, Clone, Copy)]
struct ReduceMatch {
    tuple: NodeId,
    make_tuple_op: NodeId,
    add_n_op: NodeId,
    mul_op: NodeId,
    all_reduce_op: NodeId,
    x: NodeId,
    y: NodeId,
    z: NodeId,
    subgraph: SubgraphId,
}

/// `Mul(AllReduce(X), Y)` with the reduction on either side.
#[derive(Debug, Clone, Copy)]
struct ReducedProduct {
    mul: NodeId,
    all_reduce: NodeId,
    x: NodeId,
    y: NodeId,
}

struct CompiledPat {
    pat: Pat,
    intern: VarIntern,
}

impl CompiledPat {
    fn new(pat: Pat) -> Self {
        let intern = pat.collect_var_names();
        Self { pat, intern }
    }
}

/// All-reduce reordering pass.
pub struct AllReduceReorder {
    sum: CompiledPat,
    products: [CompiledPat; 2],
}

impl AllReduceReorder {
    pub fn new() -> Self {
        let reduce = || Pat::all_reduce(Pat::var("x")).named("all_reduce");
        Self {
            sum: CompiledPat::new(Pat::add_n(Pat::make_tuple(Pat::var("first"), Pat::var("second")).named("tuple"))),
            products: [
                CompiledPat::new((reduce() * Pat::var("y")).named("mul")),
                CompiledPat::new((Pat::var("y") * reduce()).named("mul")),
            ],
        }
    }

    fn match_product(&self, graph: &Graph, node: NodeId) -> Option<ReducedProduct> {
        self.products.iter().find_map(|compiled| {
            let bindings = compiled.pat.match_first(graph, node, &compiled.intern)?;
            let get = |name: &str| compiled.intern.lookup(&bindings, name);
            Some(ReducedProduct { mul: get("mul")?, all_reduce: get("all_reduce")?, x: get("x")?, y: get("y")? })
        })
    }

    /// Read-only match of the whole shape around `node`.
    fn match_node(&self, graph: &Graph, node: NodeId) -> Option<ReduceMatch> {
        let bindings = self.sum.pat.match_first(graph, node, &self.sum.intern)?;
        let get = |name: &str| self.sum.intern.lookup(&bindings, name);
        let (tuple, first, second) = (get("tuple")?, get("first")?, get("second")?);

        let (product, z) = match (self.match_product(graph, first), self.match_product(graph, second)) {
            (Some(product), None) => (product, second),
            (None, Some(product)) => (product, first),
            (Some(_), Some(_)) => {
                trace!(%node, "both tuple elements are reduced products");
                return None;
            }
            (None, None) => return None,
        };
        let Some(subgraph) = graph.owner(product.all_reduce) else {
            trace!(%node, all_reduce = %product.all_reduce, "all-reduce is not owned by a subgraph");
            return None;
        };

        Some(ReduceMatch {
            tuple,
            make_tuple_op: *graph.operands(tuple).first()?,
            add_n_op: *graph.operands(node).first()?,
            mul_op: *graph.operands(product.mul).first()?,
            all_reduce_op: *graph.operands(product.all_reduce).first()?,
            x: product.x,
            y: product.y,
            z,
            subgraph,
        })
    }

    fn apply(graph: &mut Graph, node: NodeId, m: &ReduceMatch) -> Result<NodeId> {
        let owner = Some(m.subgraph);

        let z = if graph.is_call(m.z) && graph.owner(m.z) != owner {
            let operands = graph.operands(m.z).to_vec();
            graph.new_call(operands, owner)?
        } else {
            m.z
        };

        let tuple = graph.new_call([m.make_tuple_op, z, m.x], owner)?;
        let sum = graph.new_call([m.add_n_op, tuple], owner)?;
        let reduced = graph.new_call([m.all_reduce_op, sum], owner)?;
        let mul = graph.new_call([m.mul_op, reduced, m.y], owner)?;

        // Operator positions are fixed at construction and stay put
        let readers: Vec<Use> =
            graph.users(m.tuple)?.iter().filter(|u| u.user != node && u.index != 0).copied().collect();
        for edge in &readers {
            graph.set_edge(edge.user, edge.index, reduced)?;
        }

        debug!(%node, %mul, %reduced, redirected = readers.len(), "reordered add before all-reduce");
        Ok(mul)
    }
}

impl Default for AllReduceReorder {
    fn default() -> Self {
        Self::new()
    }
}

impl Rewriter for AllReduceReorder {
    fn name(&self) -> &str {
        "all_reduce_reorder"
    }

    /// # Panics
    ///
    /// If the graph rejects an edit after the match was accepted.
    #[tracing::instrument(skip_all, fields(node = %node))]
    fn rewrite(&self, graph: &mut Graph, node: NodeId) -> RewriteResult {
        let Some(m) = self.match_node(graph, node) else {
            return RewriteResult::NoMatch;
        };
        match Self::apply(graph, node, &m) {
            Ok(mul) => {
                trace!(tree = %graph.tree(mul), "rewritten");
                RewriteResult::Rewritten(mul)
            }
            Err(err) => panic!("all-reduce reorder left the graph inconsistent at {node}: {err}"),
        }
    }
}

impl std::fmt::Debug for AllReduceReorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AllReduceReorder")
    }
}

//! Algebraic identity rules.
//!
//! Two rule sets are exposed. [`arithmetic_simplify`] holds the identities
//! that are always safe. [`arithmetic_simplify_zero`] absorbs tensor
//! multiplications by zero; it erases the non-zero operand entirely, so an
//! optimizer should only run it after the first set has settled.

use graft_ir::pattern::try_const;
use graft_ir::{Build, Graph, NodeId, NodePredicate, Pat, Primitive, RuleSet, pattern};

use crate::config::SimplifyConfig;
use crate::fold::ConstantFolder;

/// Identity and constant-placement rules, tried in order.
pub fn arithmetic_simplify(config: &SimplifyConfig) -> RuleSet {
    let folder = config.folder();
    let mut rules = RuleSet::new("arithmetic_simplify");

    // x + 0 -> x
    pattern!(rules, Pat::var("x") + Pat::zero("zero") => |_g, x| Some(x.into()));
    pattern!(rules, Pat::var("x") + Pat::zero_scalar("zero") => |_g, x| Some(x.into()));
    pattern!(rules, Pat::scalar_add(Pat::zero_scalar("zero"), Pat::var("x")) => |_g, x| Some(x.into()));
    pattern!(rules, Pat::scalar_add(Pat::var("x"), Pat::zero_scalar("zero")) => |_g, x| Some(x.into()));

    // x * 1 -> x, only when x is itself a literal
    pattern!(rules, (Pat::var("x") * Pat::one("one")).guard("x", NodePredicate::IsValue) => |_g, x| Some(x.into()));
    pattern!(rules, Pat::scalar_mul(Pat::one_scalar("one"), Pat::var("x")) => |_g, x| Some(x.into()));
    pattern!(rules, Pat::scalar_mul(Pat::var("x"), Pat::one_scalar("one")) => |_g, x| Some(x.into()));

    // 0 * x -> 0
    pattern!(rules, Pat::scalar_mul(Pat::zero_scalar("zero"), Pat::var("x")) => |g, zero| fresh_zero(g, zero));
    pattern!(rules, Pat::scalar_mul(Pat::var("x"), Pat::zero_scalar("zero")) => |g, zero| fresh_zero(g, zero));

    pattern!(rules, Pat::identity(Pat::var("x")) => |_g, x| Some(x.into()));

    // c1 * (c2 * x) -> x * (c1 * c2)
    pattern!(rules, (Pat::cvar("c1") * (Pat::cvar("c2") * Pat::var("x"))).named("root") => |g, root, c1, c2, x| {
        merge_constant_factors(g, &folder, root, c1, c2, x)
    });

    pattern!(owned rules, Pat::momentum(Pat::zeros_like(Pat::var("x")), Pat::var("y"), Pat::var("z"), Pat::var("xs")) => |_g, y, z| {
        Some(Build::call(Primitive::MakeTuple, vec![z.into(), y.into()]))
    });
    pattern!(owned rules, Pat::pow(Pat::var("x"), Pat::one_scalar("one")) => |_g, x| Some(x.into()));

    rules
}

/// Multiplication-by-zero absorption.
pub fn arithmetic_simplify_zero() -> RuleSet {
    let mut rules = RuleSet::new("arithmetic_simplify_zero");

    pattern!(rules, Pat::var("x") * Pat::zero("zero") => |g, zero| fresh_zero(g, zero));
    pattern!(rules, Pat::var("x") * Pat::zeros_like(Pat::var("y")).named("zeros") => |_g, zeros| Some(zeros.into()));

    rules
}

/// New zero constant with the dtype and shape of the matched zero.
fn fresh_zero(graph: &Graph, zero: NodeId) -> Option<Build> {
    try_const(graph, zero)?.zero_like().map(Build::Value)
}

/// Collapse two adjacent constant factors into one right-hand factor, folded
/// when possible and as a runtime multiplication otherwise.
///
/// Declines when `x` is a constant too: `x * Mul(c1, c2)` would match again
/// with the factors rotated.
fn merge_constant_factors(
    graph: &Graph,
    folder: &ConstantFolder,
    root: NodeId,
    c1: NodeId,
    c2: NodeId,
    x: NodeId,
) -> Option<Build> {
    if try_const(graph, x).is_some() {
        return None;
    }
    let mul_op = *graph.operands(root).first()?;
    let factor = match folder.fold_mul(graph.value(c1)?, graph.value(c2)?) {
        Some(folded) => Build::Value(folded),
        None => Build::call_with(mul_op, vec![c1.into(), c2.into()]),
    };
    Some(Build::call_with(mul_op, vec![x.into(), factor]))
}

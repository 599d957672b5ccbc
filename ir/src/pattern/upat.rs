//! Pattern DSL for graph nodes.
//!
//! A [`Pat`] is a small tree describing the shape of a subgraph rooted at one
//! node. It supports:
//!
//! - Wildcards (`Pat::var("x")` matches any node)
//! - Constants, optionally restricted to an exact value and/or to scalars
//!   (`Pat::cvar("c")`, `Pat::zero("z")`, `Pat::one_scalar("one")`)
//! - Calls of a fixed primitive with an exact number of argument patterns
//!   (`Pat::call(Primitive::Pow, ...)`, or `a * b` / `a + b` for `Mul` / `Add`)
//! - Guards that re-check an already bound placeholder (`pat.guard("x", NodePredicate::IsValue)`)
//!
//! Matching is read-only. Placeholder names are a retrieval convenience: a
//! name used twice is bound to whichever node matched last, with no
//! unification between the two positions.
//!
//! # Example
//!
//! ```ignore
//! // Match: x + 0 (any node plus a zero constant of any shape)
//! let pat = Pat::var("x") + Pat::zero("zero");
//! ```

use std::collections::HashMap;
use std::ops::{Add, Mul};

use smallvec::SmallVec;

use crate::graph::{Graph, NodeId};
use crate::op::Primitive;
use crate::types::ConstValue;

use super::helpers::try_const;

// ===== Pat Constructor Macros =====

/// Macro for implementing operator traits on Pat.
macro_rules! impl_pat_ops {
    ($(($Trait:ident, $method:ident, $prim:ident)),* $(,)?) => {
        $(
            impl $Trait for Pat {
                type Output = Pat;
                fn $method(self, rhs: Pat) -> Pat {
                    Pat::call(Primitive::$prim, vec![self, rhs])
                }
            }
        )*
    };
}

/// Macro for fixed-arity call constructors, e.g. `Pat::identity(x)`.
macro_rules! pat_call {
    ($name:ident, $prim:ident, $($arg:ident),+) => {
        pub fn $name($($arg: Pat),+) -> Self {
            Pat::call(Primitive::$prim, vec![$($arg),+])
        }
    };
}

/// Macro for constant matchers with a required value.
/// Generates methods like `zero("name")`, `one_scalar("name")`.
macro_rules! pat_const_value {
    ($name:ident, $value:expr, $kind:expr) => {
        pub fn $name(name: impl Into<String>) -> Self {
            Pat::Const { name: Some(name.into()), value: Some($value), kind: $kind }
        }
    };
}

// ===== Optimized Binding Storage =====

/// Single binding entry: (variable_index, node).
/// Indices are u8; interning panics past 256 names.
pub type BindingEntry = (u8, NodeId);

/// Stack-allocated binding storage for typical patterns (up to 4 bindings).
/// Falls back to heap allocation for complex patterns with more bindings.
pub type BindingStore = SmallVec<[BindingEntry; 4]>;

/// Variable name interning table.
/// Maps string names to compact u8 indices for efficient binding storage.
#[derive(Debug, Clone, Default)]
pub struct VarIntern {
    /// Variable names in index order
    names: Vec<String>,
    /// Reverse lookup: name -> index
    indices: HashMap<String, u8>,
}

impl VarIntern {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create an index for a variable name.
    ///
    /// # Panics
    ///
    /// If a pattern declares more than 256 distinct placeholders.
    pub fn get_or_insert(&mut self, name: &str) -> u8 {
        if let Some(&idx) = self.indices.get(name) {
            return idx;
        }
        let idx = u8::try_from(self.names.len())
            .unwrap_or_else(|_| panic!("too many pattern placeholders, cannot intern '{name}'"));
        self.names.push(name.to_string());
        self.indices.insert(name.to_string(), idx);
        idx
    }

    /// Get index for a name (returns None if not interned).
    pub fn get_index(&self, name: &str) -> Option<u8> {
        self.indices.get(name).copied()
    }

    /// Look up the node bound to `name`.
    pub fn lookup(&self, store: &BindingStore, name: &str) -> Option<NodeId> {
        self.get_index(name).and_then(|idx| store.get_by_index(idx))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Extension methods for BindingStore.
pub trait BindingStoreExt {
    fn get_by_index(&self, idx: u8) -> Option<NodeId>;

    /// Insert or overwrite the binding at index.
    /// Named `set_binding` to avoid conflict with `SmallVec::insert`.
    fn set_binding(&mut self, idx: u8, node: NodeId);
}

impl BindingStoreExt for BindingStore {
    fn get_by_index(&self, idx: u8) -> Option<NodeId> {
        self.iter().find(|(i, _)| *i == idx).map(|(_, node)| *node)
    }

    fn set_binding(&mut self, idx: u8, node: NodeId) {
        for (i, existing) in self.iter_mut() {
            if *i == idx {
                *existing = node;
                return;
            }
        }
        self.push((idx, node));
    }
}

/// Shape restriction of a constant pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstKind {
    /// Only rank-0 scalar constants.
    Scalar,
    /// Scalars and tensors.
    Any,
}

/// Named predicates for guard patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodePredicate {
    /// Any value node: constant or operator identifier.
    IsValue,
}

impl NodePredicate {
    pub fn matches(&self, graph: &Graph, id: NodeId) -> bool {
        match self {
            NodePredicate::IsValue => graph.is_value(id),
        }
    }
}

/// Pattern for matching graph nodes.
#[derive(Debug, Clone)]
pub enum Pat {
    /// Match any node.
    Var { name: String },
    /// Match a scalar or tensor constant.
    Const {
        name: Option<String>,
        /// Every element must equal this value (None = any value)
        value: Option<ConstValue>,
        kind: ConstKind,
    },
    /// Match a call of `prim` whose arguments match `args` one to one.
    Call { prim: Primitive, args: Vec<Pat>, name: Option<String> },
    /// Match `pat`, then require `pred` to hold for the node bound to `var`.
    Guard { pat: Box<Pat>, var: String, pred: NodePredicate },
}

impl Pat {
    /// Create a wildcard pattern that matches any node.
    ///
    /// # Example
    /// ```ignore
    /// let pat = Pat::var("x");  // Matches any node, binds to "x"
    /// ```
    pub fn var(name: impl Into<String>) -> Self {
        Pat::Var { name: name.into() }
    }

    /// Create a pattern that matches any scalar or tensor constant.
    pub fn cvar(name: impl Into<String>) -> Self {
        Pat::Const { name: Some(name.into()), value: None, kind: ConstKind::Any }
    }

    /// Create a pattern that matches any rank-0 constant.
    pub fn scalar(name: impl Into<String>) -> Self {
        Pat::Const { name: Some(name.into()), value: None, kind: ConstKind::Scalar }
    }

    pat_const_value!(zero, ConstValue::Int(0), ConstKind::Any);
    pat_const_value!(one, ConstValue::Int(1), ConstKind::Any);
    pat_const_value!(zero_scalar, ConstValue::Int(0), ConstKind::Scalar);
    pat_const_value!(one_scalar, ConstValue::Int(1), ConstKind::Scalar);

    /// Create a pattern that matches a call of `prim` with exactly `args.len()` arguments.
    pub fn call(prim: Primitive, args: Vec<Pat>) -> Self {
        Pat::Call { prim, args, name: None }
    }

    pat_call!(identity, Identity, x);
    pat_call!(zeros_like, ZerosLike, x);
    pat_call!(pow, Pow, base, exponent);
    pat_call!(scalar_add, ScalarAdd, lhs, rhs);
    pat_call!(scalar_mul, ScalarMul, lhs, rhs);
    pat_call!(momentum, Momentum, accumulation, variable, learning_rate, gradient);
    pat_call!(make_tuple, MakeTuple, first, second);
    pat_call!(add_n, AddN, tuple);
    pat_call!(all_reduce, AllReduce, x);

    /// Bind the node matched by this pattern to a name.
    ///
    /// # Example
    /// ```ignore
    /// Pat::make_tuple(Pat::var("a"), Pat::var("b")).named("tuple")
    /// ```
    pub fn named(self, name: impl Into<String>) -> Self {
        match self {
            Pat::Var { .. } => Pat::Var { name: name.into() },
            Pat::Const { value, kind, .. } => Pat::Const { name: Some(name.into()), value, kind },
            Pat::Call { prim, args, .. } => Pat::Call { prim, args, name: Some(name.into()) },
            Pat::Guard { pat, var, pred } => Pat::Guard { pat: Box::new(pat.named(name)), var, pred },
        }
    }

    /// Only accept a match if the node bound to `var` satisfies `pred`.
    pub fn guard(self, var: impl Into<String>, pred: NodePredicate) -> Self {
        Pat::Guard { pat: Box::new(self), var: var.into(), pred }
    }

    // ===== Variable Name Collection =====

    /// Collect all variable names from this pattern and build a VarIntern.
    pub fn collect_var_names(&self) -> VarIntern {
        let mut intern = VarIntern::new();
        self.collect_var_names_internal(&mut intern);
        intern
    }

    fn collect_var_names_internal(&self, intern: &mut VarIntern) {
        match self {
            Pat::Var { name } => {
                intern.get_or_insert(name);
            }
            Pat::Const { name, .. } => {
                if let Some(n) = name {
                    intern.get_or_insert(n);
                }
            }
            Pat::Call { args, name, .. } => {
                if let Some(n) = name {
                    intern.get_or_insert(n);
                }
                for arg in args {
                    arg.collect_var_names_internal(intern);
                }
            }
            Pat::Guard { pat, var, .. } => {
                pat.collect_var_names_internal(intern);
                intern.get_or_insert(var);
            }
        }
    }

    // ===== Matching =====

    /// Match this pattern against `node`.
    ///
    /// Returns `Some(bindings)` if matched, `None` otherwise.
    pub fn match_first(&self, graph: &Graph, node: NodeId, intern: &VarIntern) -> Option<BindingStore> {
        let mut store = BindingStore::new();
        if self.match_internal(graph, node, &mut store, intern) { Some(store) } else { None }
    }

    fn match_internal(&self, graph: &Graph, node: NodeId, store: &mut BindingStore, intern: &VarIntern) -> bool {
        match self {
            Pat::Var { name } => {
                Self::bind(name, node, store, intern);
                true
            }

            Pat::Const { name, value, kind } => {
                let Some(constant) = try_const(graph, node) else {
                    return false;
                };
                if *kind == ConstKind::Scalar && !constant.is_scalar() {
                    return false;
                }
                if let Some(expected) = value
                    && !constant.is_uniform(expected)
                {
                    return false;
                }
                if let Some(n) = name {
                    Self::bind(n, node, store, intern);
                }
                true
            }

            Pat::Call { prim, args, name } => {
                let operands = graph.operands(node);
                if operands.len() != args.len() + 1 || !graph.is_call_with(node, prim) {
                    return false;
                }
                if let Some(n) = name {
                    Self::bind(n, node, store, intern);
                }
                args.iter().zip(&operands[1..]).all(|(arg, &operand)| arg.match_internal(graph, operand, store, intern))
            }

            Pat::Guard { pat, var, pred } => {
                if !pat.match_internal(graph, node, store, intern) {
                    return false;
                }
                intern.lookup(store, var).is_some_and(|bound| pred.matches(graph, bound))
            }
        }
    }

    fn bind(name: &str, node: NodeId, store: &mut BindingStore, intern: &VarIntern) {
        if let Some(idx) = intern.get_index(name) {
            store.set_binding(idx, node);
        }
    }
}

// ===== Operator Trait Implementations =====

impl_pat_ops! {
    (Add, add, Add),
    (Mul, mul, Mul),
}

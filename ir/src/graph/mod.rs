//! Node arena, function subgraphs and the reverse-user index.
//!
//! Every node lives in one [`Graph`] arena and is addressed by a stable
//! [`NodeId`]. Calls may belong to a function subgraph ([`SubgraphId`]); value
//! and parameter nodes may too, but operator identifiers usually do not.
//!
//! The graph doubles as the manager: it keeps, for every node, the set of
//! `(consumer, operand position)` pairs that reference it. All edge mutation
//! goes through [`Graph::new_call`], [`Graph::set_edge`] and [`Graph::replace`],
//! which keep that index in step with the operand lists.

pub mod tree;

use std::collections::BTreeSet;
use std::fmt;

use graft_dtype::DType;
use smallvec::SmallVec;
use snafu::{OptionExt, ensure};

use crate::error::{
    DanglingUseSnafu, EmptyCallSnafu, NotACallSnafu, OperandOutOfRangeSnafu, OperatorRebindSnafu, Result,
    UnknownNodeSnafu, UnknownSubgraphSnafu,
};
use crate::op::Primitive;
use crate::types::{ConstValue, Tensor, Value};

pub use tree::render_tree;

/// Stable handle of a node in a [`Graph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// Handle of a function subgraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubgraphId(u32);

impl fmt::Display for SubgraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// One place a node is consumed: operand `index` of call `user`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Use {
    pub user: NodeId,
    pub index: usize,
}

/// Operand list of a call; position 0 is the operator.
pub type Operands = SmallVec<[NodeId; 4]>;

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Value(Value),
    Call(Operands),
    Parameter { name: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    kind: NodeKind,
    owner: Option<SubgraphId>,
}

impl Node {
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Subgraph the node belongs to; `None` for detached nodes.
    pub fn owner(&self) -> Option<SubgraphId> {
        self.owner
    }

    /// Operands of a call, empty for every other node.
    pub fn operands(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Call(operands) => operands,
            _ => &[],
        }
    }

    pub fn value(&self) -> Option<&Value> {
        match &self.kind {
            NodeKind::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_value(&self) -> bool {
        matches!(self.kind, NodeKind::Value(_))
    }

    pub fn is_call(&self) -> bool {
        matches!(self.kind, NodeKind::Call(_))
    }
}

/// Arena of nodes plus the reverse-user index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graph {
    nodes: Vec<Node>,
    users: Vec<BTreeSet<Use>>,
    subgraphs: Vec<String>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes ever created.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // =========================================================================
    // Construction
    // =========================================================================

    pub fn add_subgraph(&mut self, name: impl Into<String>) -> SubgraphId {
        let id = SubgraphId(self.subgraphs.len() as u32);
        self.subgraphs.push(name.into());
        id
    }

    pub fn subgraph_name(&self, id: SubgraphId) -> Result<&str> {
        self.subgraphs.get(id.0 as usize).map(String::as_str).context(UnknownSubgraphSnafu { id })
    }

    pub fn add_value(&mut self, value: impl Into<Value>, owner: Option<SubgraphId>) -> Result<NodeId> {
        self.check_owner(owner)?;
        Ok(self.push(Node { kind: NodeKind::Value(value.into()), owner }))
    }

    pub fn scalar(&mut self, dtype: DType, value: ConstValue, owner: Option<SubgraphId>) -> Result<NodeId> {
        self.add_value(Value::scalar(dtype, value), owner)
    }

    pub fn tensor(&mut self, tensor: Tensor, owner: Option<SubgraphId>) -> Result<NodeId> {
        self.add_value(tensor, owner)
    }

    /// Detached value node holding an operator identifier.
    pub fn primitive(&mut self, primitive: Primitive) -> NodeId {
        self.push(Node { kind: NodeKind::Value(Value::Primitive(primitive)), owner: None })
    }

    pub fn parameter(&mut self, name: impl Into<String>, owner: Option<SubgraphId>) -> Result<NodeId> {
        self.check_owner(owner)?;
        Ok(self.push(Node { kind: NodeKind::Parameter { name: name.into() }, owner }))
    }

    /// Create a call node and register every operand edge in the reverse-user index.
    pub fn new_call(
        &mut self,
        operands: impl IntoIterator<Item = NodeId>,
        owner: Option<SubgraphId>,
    ) -> Result<NodeId> {
        let operands: Operands = operands.into_iter().collect();
        ensure!(!operands.is_empty(), EmptyCallSnafu);
        for &operand in &operands {
            self.check_node(operand)?;
        }
        self.check_owner(owner)?;

        let id = NodeId(self.nodes.len() as u32);
        for (index, operand) in operands.iter().enumerate() {
            self.users[operand.index()].insert(Use { user: id, index });
        }
        self.push(Node { kind: NodeKind::Call(operands), owner });
        Ok(id)
    }

    /// Shorthand for a call whose operator is a fresh primitive node.
    pub fn call(
        &mut self,
        primitive: Primitive,
        args: impl IntoIterator<Item = NodeId>,
        owner: Option<SubgraphId>,
    ) -> Result<NodeId> {
        let op = self.primitive(primitive);
        self.new_call(std::iter::once(op).chain(args), owner)
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        self.users.push(BTreeSet::new());
        id
    }

    fn check_node(&self, id: NodeId) -> Result<()> {
        ensure!(id.index() < self.nodes.len(), UnknownNodeSnafu { id });
        Ok(())
    }

    fn check_owner(&self, owner: Option<SubgraphId>) -> Result<()> {
        if let Some(id) = owner {
            ensure!((id.0 as usize) < self.subgraphs.len(), UnknownSubgraphSnafu { id });
        }
        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(id.index()).context(UnknownNodeSnafu { id })
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.nodes.get(id.index()).map(Node::kind)
    }

    pub fn owner(&self, id: NodeId) -> Option<SubgraphId> {
        self.nodes.get(id.index()).and_then(Node::owner)
    }

    /// Operands of a call; empty for unknown and non-call nodes.
    pub fn operands(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id.index()).map(Node::operands).unwrap_or(&[])
    }

    pub fn value(&self, id: NodeId) -> Option<&Value> {
        self.nodes.get(id.index()).and_then(Node::value)
    }

    pub fn is_value(&self, id: NodeId) -> bool {
        self.nodes.get(id.index()).is_some_and(Node::is_value)
    }

    pub fn is_call(&self, id: NodeId) -> bool {
        self.nodes.get(id.index()).is_some_and(Node::is_call)
    }

    /// Primitive in the operator position of a call.
    pub fn call_primitive(&self, id: NodeId) -> Option<&Primitive> {
        let op = *self.operands(id).first()?;
        self.value(op)?.as_primitive()
    }

    pub fn is_call_with(&self, id: NodeId, primitive: &Primitive) -> bool {
        self.call_primitive(id) == Some(primitive)
    }

    /// Every `(consumer, operand position)` currently referencing `id`.
    pub fn users(&self, id: NodeId) -> Result<&BTreeSet<Use>> {
        self.users.get(id.index()).context(UnknownNodeSnafu { id })
    }

    /// ASCII tree of `id` and its operands, for logs.
    pub fn tree(&self, id: NodeId) -> String {
        render_tree(self, id)
    }

    // =========================================================================
    // Edge mutation
    // =========================================================================

    /// Rebind operand `index` of `user` to `new`, moving the reverse edge with it.
    pub fn set_edge(&mut self, user: NodeId, index: usize, new: NodeId) -> Result<()> {
        self.check_node(new)?;
        ensure!(index != 0, OperatorRebindSnafu { id: user });

        let node = self.nodes.get_mut(user.index()).context(UnknownNodeSnafu { id: user })?;
        let NodeKind::Call(operands) = &mut node.kind else {
            return NotACallSnafu { id: user }.fail();
        };
        let len = operands.len();
        let slot = operands.get_mut(index).context(OperandOutOfRangeSnafu { id: user, index, len })?;
        let old = *slot;
        let edge = Use { user, index };
        ensure!(self.users[old.index()].contains(&edge), DanglingUseSnafu { node: old, user, index });

        *slot = new;
        self.users[old.index()].remove(&edge);
        self.users[new.index()].insert(edge);
        Ok(())
    }

    /// Point every consumer of `old` at `new`; returns the number of rebound edges.
    pub fn replace(&mut self, old: NodeId, new: NodeId) -> Result<usize> {
        self.check_node(new)?;
        if old == new {
            return Ok(0);
        }
        let uses: Vec<Use> = self.users(old)?.iter().copied().collect();
        for edge in &uses {
            self.set_edge(edge.user, edge.index, new)?;
        }
        Ok(uses.len())
    }

    /// Check that operand lists and the reverse-user index describe the same edges.
    pub fn verify(&self) -> Result<()> {
        for (user_idx, node) in self.nodes.iter().enumerate() {
            let user = NodeId(user_idx as u32);
            for (index, &operand) in node.operands().iter().enumerate() {
                let edge = Use { user, index };
                let known = self.users.get(operand.index()).is_some_and(|uses| uses.contains(&edge));
                ensure!(known, DanglingUseSnafu { node: operand, user, index });
            }
        }
        for (node_idx, uses) in self.users.iter().enumerate() {
            let node = NodeId(node_idx as u32);
            for edge in uses {
                let live = self.operands(edge.user).get(edge.index) == Some(&node);
                ensure!(live, DanglingUseSnafu { node, user: edge.user, index: edge.index });
            }
        }
        Ok(())
    }
}

//! Replacement descriptions returned by rewrite functions.
//!
//! Rewrite functions only read the graph. They describe the replacement as a
//! [`Build`] tree, and the rule set commits it once a rule has accepted.

use crate::error::Result;
use crate::graph::{Graph, NodeId, SubgraphId};
use crate::op::Primitive;
use crate::types::Value;

/// Operator of a call to be built.
#[derive(Debug, Clone, PartialEq)]
pub enum Operator {
    /// Reuse an existing operator node.
    Node(NodeId),
    /// Create a fresh detached primitive node.
    Prim(Primitive),
}

/// Replacement node description.
#[derive(Debug, Clone, PartialEq)]
pub enum Build {
    /// An already existing node.
    Existing(NodeId),
    /// A fresh value node.
    Value(Value),
    /// A fresh call node.
    Call { op: Operator, args: Vec<Build> },
}

impl Build {
    pub fn call(primitive: Primitive, args: Vec<Build>) -> Self {
        Build::Call { op: Operator::Prim(primitive), args }
    }

    /// Call whose operator is an existing node.
    pub fn call_with(op: NodeId, args: Vec<Build>) -> Self {
        Build::Call { op: Operator::Node(op), args }
    }

    /// Create the described nodes in `owner` and return the root.
    pub fn materialize(&self, graph: &mut Graph, owner: Option<SubgraphId>) -> Result<NodeId> {
        match self {
            Build::Existing(id) => {
                graph.node(*id)?;
                Ok(*id)
            }
            Build::Value(value) => graph.add_value(value.clone(), owner),
            Build::Call { op, args } => {
                let op = match op {
                    Operator::Node(id) => *id,
                    Operator::Prim(primitive) => graph.primitive(primitive.clone()),
                };
                let mut operands = vec![op];
                for arg in args {
                    operands.push(arg.materialize(graph, owner)?);
                }
                graph.new_call(operands, owner)
            }
        }
    }
}

impl From<NodeId> for Build {
    fn from(id: NodeId) -> Self {
        Build::Existing(id)
    }
}

impl From<Value> for Build {
    fn from(value: Value) -> Self {
        Build::Value(value)
    }
}

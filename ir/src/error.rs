use snafu::Snafu;

use crate::graph::{NodeId, SubgraphId};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// A call needs at least its operator operand.
    #[snafu(display("call node needs at least an operator operand"))]
    EmptyCall,

    /// Node handle does not belong to this graph.
    #[snafu(display("unknown node {id}"))]
    UnknownNode { id: NodeId },

    /// Subgraph handle does not belong to this graph.
    #[snafu(display("unknown subgraph {id}"))]
    UnknownSubgraph { id: SubgraphId },

    /// Edge operation on a node that is not a call.
    #[snafu(display("node {id} is not a call node"))]
    NotACall { id: NodeId },

    /// Operand position past the end of a call.
    #[snafu(display("operand index {index} out of range for call {id} with {len} operands"))]
    OperandOutOfRange { id: NodeId, index: usize, len: usize },

    /// Operand 0 of a call is fixed at construction.
    #[snafu(display("operator position of call {id} cannot be rebound"))]
    OperatorRebind { id: NodeId },

    /// Tensor payload does not fill its shape.
    #[snafu(display("tensor data has {actual} elements but shape {shape:?} needs {expected}"))]
    TensorDataLength { shape: Vec<usize>, expected: usize, actual: usize },

    /// Operand edge and reverse-user index disagree.
    #[snafu(display("reverse user index out of sync: {user}#{index} -> {node}"))]
    DanglingUse { node: NodeId, user: NodeId, index: usize },
}

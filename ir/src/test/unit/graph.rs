//! Arena construction, reverse-user bookkeeping and edge mutation.

use graft_dtype::DType;

use crate::error::Error;
use crate::{ConstValue, Graph, NodeKind, Primitive, Use};

fn int(graph: &mut Graph, v: i64) -> crate::NodeId {
    graph.scalar(DType::Int32, ConstValue::Int(v), None).unwrap()
}

#[test]
fn test_new_call_records_users() {
    let mut graph = Graph::new();
    let main = graph.add_subgraph("main");
    let a = graph.parameter("a", Some(main)).unwrap();
    let b = int(&mut graph, 2);
    let mul = graph.call(Primitive::Mul, [a, b], Some(main)).unwrap();

    let op = graph.operands(mul)[0];
    assert_eq!(graph.operands(mul), &[op, a, b]);
    assert!(graph.is_call_with(mul, &Primitive::Mul));
    assert_eq!(graph.owner(mul), Some(main));
    assert_eq!(graph.owner(op), None);

    assert!(graph.users(a).unwrap().contains(&Use { user: mul, index: 1 }));
    assert!(graph.users(b).unwrap().contains(&Use { user: mul, index: 2 }));
    assert!(graph.users(op).unwrap().contains(&Use { user: mul, index: 0 }));
    assert!(graph.users(mul).unwrap().is_empty());
    graph.verify().unwrap();
}

#[test]
fn test_same_operand_twice() {
    let mut graph = Graph::new();
    let a = graph.parameter("a", None).unwrap();
    let add = graph.call(Primitive::Add, [a, a], None).unwrap();

    let uses: Vec<Use> = graph.users(a).unwrap().iter().copied().collect();
    assert_eq!(uses, vec![Use { user: add, index: 1 }, Use { user: add, index: 2 }]);
}

#[test]
fn test_empty_call_rejected() {
    let mut graph = Graph::new();
    let err = graph.new_call([], None).unwrap_err();
    assert!(matches!(err, Error::EmptyCall));
    assert!(graph.is_empty());
}

#[test]
fn test_unknown_operand_rejected() {
    let mut other = Graph::new();
    let a = other.parameter("a", None).unwrap();
    let b = other.parameter("b", None).unwrap();

    let mut graph = Graph::new();
    let op = graph.primitive(Primitive::Add);
    let err = graph.new_call([op, a, b], None).unwrap_err();
    assert!(matches!(err, Error::UnknownNode { .. }));
    assert_eq!(graph.len(), 1);
}

#[test]
fn test_unknown_subgraph_rejected() {
    let mut other = Graph::new();
    other.add_subgraph("one");
    let foreign = other.add_subgraph("two");

    let mut graph = Graph::new();
    let err = graph.parameter("a", Some(foreign)).unwrap_err();
    assert!(matches!(err, Error::UnknownSubgraph { .. }));
}

#[test]
fn test_subgraph_name() {
    let mut graph = Graph::new();
    let main = graph.add_subgraph("main");
    assert_eq!(graph.subgraph_name(main).unwrap(), "main");
}

#[test]
fn test_set_edge_moves_reverse_edge() {
    let mut graph = Graph::new();
    let a = graph.parameter("a", None).unwrap();
    let b = graph.parameter("b", None).unwrap();
    let c = graph.parameter("c", None).unwrap();
    let add = graph.call(Primitive::Add, [a, b], None).unwrap();

    graph.set_edge(add, 2, c).unwrap();

    assert_eq!(graph.operands(add)[2], c);
    assert!(graph.users(b).unwrap().is_empty());
    assert!(graph.users(c).unwrap().contains(&Use { user: add, index: 2 }));
    graph.verify().unwrap();
}

#[test]
fn test_set_edge_rejects_operator_position() {
    let mut graph = Graph::new();
    let a = graph.parameter("a", None).unwrap();
    let id = graph.call(Primitive::Identity, [a], None).unwrap();
    let snapshot = graph.clone();

    let err = graph.set_edge(id, 0, a).unwrap_err();
    assert!(matches!(err, Error::OperatorRebind { .. }));
    assert_eq!(graph, snapshot);
}

#[test]
fn test_set_edge_errors() {
    let mut graph = Graph::new();
    let a = graph.parameter("a", None).unwrap();
    let id = graph.call(Primitive::Identity, [a], None).unwrap();
    let snapshot = graph.clone();

    assert!(matches!(graph.set_edge(id, 2, a).unwrap_err(), Error::OperandOutOfRange { index: 2, len: 2, .. }));
    assert!(matches!(graph.set_edge(a, 1, a).unwrap_err(), Error::NotACall { .. }));
    assert_eq!(graph, snapshot);
}

#[test]
fn test_replace_redirects_every_user() {
    let mut graph = Graph::new();
    let a = graph.parameter("a", None).unwrap();
    let b = graph.parameter("b", None).unwrap();
    let add = graph.call(Primitive::Add, [a, a], None).unwrap();
    let id = graph.call(Primitive::Identity, [a], None).unwrap();

    assert_eq!(graph.replace(a, b).unwrap(), 3);
    assert!(graph.users(a).unwrap().is_empty());
    assert_eq!(graph.operands(add)[1..], [b, b]);
    assert_eq!(graph.operands(id)[1], b);
    graph.verify().unwrap();

    assert_eq!(graph.replace(b, b).unwrap(), 0);
}

#[test]
fn test_node_kinds() {
    let mut graph = Graph::new();
    let v = int(&mut graph, 7);
    let p = graph.parameter("p", None).unwrap();
    let op = graph.primitive(Primitive::Pow);

    assert!(graph.is_value(v));
    assert!(graph.is_value(op));
    assert!(!graph.is_value(p));
    assert!(matches!(graph.kind(p), Some(NodeKind::Parameter { name }) if name == "p"));
    assert!(graph.operands(v).is_empty());
    assert!(graph.call_primitive(v).is_none());
}

#[test]
fn test_call_with_custom_operator() {
    let mut graph = Graph::new();
    let x = graph.parameter("x", None).unwrap();
    let call = graph.call(Primitive::custom("Relu"), [x], None).unwrap();

    assert!(graph.is_call_with(call, &Primitive::custom("Relu")));
    assert!(!graph.is_call_with(call, &Primitive::Identity));
}

#[test]
fn test_call_through_non_primitive_operator() {
    let mut graph = Graph::new();
    let f = graph.parameter("f", None).unwrap();
    let x = graph.parameter("x", None).unwrap();
    let call = graph.new_call([f, x], None).unwrap();

    assert!(graph.is_call(call));
    assert!(graph.call_primitive(call).is_none());
}

#[test]
fn test_unknown_node_query() {
    let mut other = Graph::new();
    other.parameter("a", None).unwrap();
    let foreign = other.parameter("b", None).unwrap();

    let graph = Graph::new();
    assert!(graph.node(foreign).is_err());
    assert!(graph.users(foreign).is_err());
    assert!(graph.operands(foreign).is_empty());
    assert!(!graph.is_call(foreign));
}

//! Tree visualization for graph nodes.
//!
//! Renders a node and its operands as an ASCII tree. Operator operands that
//! hold a primitive are folded into the call's label.

use std::borrow::Cow;
use std::cell::RefCell;
use std::collections::HashSet;
use std::io;
use std::rc::Rc;

use ptree::{Style, TreeItem};

use super::{Graph, NodeId, NodeKind};

/// Compact renderer: nodes reachable along several paths are printed once and
/// referenced as `%id → (see above)` afterwards.
#[derive(Clone)]
struct NodeTree<'g> {
    graph: &'g Graph,
    id: NodeId,
    visited: Rc<RefCell<HashSet<NodeId>>>,
    is_backref: RefCell<bool>,
}

impl<'g> NodeTree<'g> {
    fn new(graph: &'g Graph, id: NodeId) -> Self {
        Self { graph, id, visited: Rc::new(RefCell::new(HashSet::new())), is_backref: RefCell::new(false) }
    }

    fn child(&self, id: NodeId) -> Self {
        Self { graph: self.graph, id, visited: self.visited.clone(), is_backref: RefCell::new(false) }
    }

    /// Operand positions shown as children: the operator is skipped when it
    /// is a primitive already printed in the label.
    fn shown_operands(&self) -> &'g [NodeId] {
        let operands = self.graph.operands(self.id);
        if self.graph.call_primitive(self.id).is_some() { &operands[1..] } else { operands }
    }
}

impl TreeItem for NodeTree<'_> {
    type Child = Self;

    fn write_self<W: io::Write>(&self, f: &mut W, _style: &Style) -> io::Result<()> {
        let mut visited = self.visited.borrow_mut();
        if !visited.insert(self.id) {
            *self.is_backref.borrow_mut() = true;
            return write!(f, "{} → (see above)", self.id);
        }
        write!(f, "{}", format_node(self.graph, self.id))
    }

    fn children(&self) -> Cow<'_, [Self::Child]> {
        if *self.is_backref.borrow() {
            return Cow::Borrowed(&[]);
        }
        Cow::Owned(self.shown_operands().iter().map(|&id| self.child(id)).collect())
    }
}

/// Output format: `%id LABEL @owner`
fn format_node(graph: &Graph, id: NodeId) -> String {
    let Ok(node) = graph.node(id) else {
        return format!("{id} <unknown>");
    };
    let label = match node.kind() {
        NodeKind::Value(value) => value.to_string(),
        NodeKind::Parameter { name } => format!("param '{name}'"),
        NodeKind::Call(_) => match graph.call_primitive(id) {
            Some(primitive) => primitive.to_string(),
            None => "call".to_string(),
        },
    };
    match node.owner() {
        Some(owner) => format!("{id} {label} {owner}"),
        None => format!("{id} {label}"),
    }
}

/// Render `id` and everything it reads as an ASCII tree string.
pub fn render_tree(graph: &Graph, id: NodeId) -> String {
    let tree = NodeTree::new(graph, id);
    let mut buf = Vec::new();
    ptree::write_tree(&tree, &mut buf).expect("tree rendering failed");
    String::from_utf8(buf).expect("invalid utf8 in tree")
}

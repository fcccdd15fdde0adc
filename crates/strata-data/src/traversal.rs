//! Visitor-based traversal over data trees

use crate::node::DataNode;
use crate::path::FieldPath;

/// Trait for traversing a data tree
pub trait Visitor {
    /// Visit a node
    fn visit(&mut self, node: &DataNode, path: &FieldPath);

    /// Called when entering a compilation or list
    fn enter(&mut self, _node: &DataNode, _path: &FieldPath) {}

    /// Called when leaving a compilation or list
    fn leave(&mut self, _node: &DataNode, _path: &FieldPath) {}

    /// Returns true if traversal should continue
    fn should_continue(&self) -> bool {
        true
    }
}

/// Walk the tree depth-first in declaration order using a visitor
pub fn walk<V: Visitor>(node: &DataNode, visitor: &mut V) {
    walk_recursive(node, visitor, &FieldPath::root());
}

fn walk_recursive<V: Visitor>(node: &DataNode, visitor: &mut V, path: &FieldPath) {
    if !visitor.should_continue() {
        return;
    }

    visitor.visit(node, path);

    match node {
        DataNode::Item(_) => {}
        DataNode::Compilation(compilation) => {
            visitor.enter(node, path);
            for (name, child) in compilation.fields() {
                walk_recursive(child, visitor, &path.child(name));
            }
            visitor.leave(node, path);
        }
        DataNode::List(list) => {
            visitor.enter(node, path);
            for (index, child) in list.items().iter().enumerate() {
                walk_recursive(child, visitor, &path.index(index));
            }
            visitor.leave(node, path);
        }
    }
}

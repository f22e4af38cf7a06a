//! `spec.md` §4.5: a total `Node -> Node` parent map built once per tree.

use nix_ast::{Ast, NodeId};
use nix_parser_core::Lowered;
use rustc_hash::FxHashMap;

use crate::reachability::semantic_children;

/// Maps every node in an `Ast` to its parent. The root maps to itself,
/// which doubles as the sentinel `up_to`/`up_expr` stop on.
///
/// Built eagerly over the whole arena rather than lazily on query, since a
/// tree this small (one document) makes a single DFS cheaper than memoizing
/// per-call walks, and it keeps the map genuinely total: every `NodeId` the
/// arena has ever allocated gets an entry, including nodes lowering
/// synthesized that a pure-CST walk from the root would miss reaching by
/// more than one path.
#[derive(Debug, Clone)]
pub struct ParentMap {
    root: NodeId,
    parents: FxHashMap<NodeId, NodeId>,
}

impl ParentMap {
    /// Walks `ast` from `root` following [`semantic_children`], recording
    /// the first parent seen for each child. A child reachable from two
    /// parents (an `inherit (expr) a b;` source shared by two synthesized
    /// `Select`s, or a node counted twice because `semantic_children`
    /// overlaps with `Ast::children`) keeps whichever parent visited it
    /// first; any node the walk never reaches defaults to the root, so
    /// `query` is total even over unreachable arena slots.
    pub fn build(ast: &Ast, lowered: &Lowered, root: NodeId) -> Self {
        let mut parents = FxHashMap::default();
        for i in 0..ast.len() {
            parents.insert(NodeId(i as u32), root);
        }
        parents.insert(root, root);

        let mut stack = vec![root];
        let mut visited = vec![false; ast.len()];
        visited[root.index()] = true;
        while let Some(id) = stack.pop() {
            for child in semantic_children(ast, lowered, id) {
                if visited[child.index()] {
                    continue;
                }
                visited[child.index()] = true;
                parents.insert(child, id);
                stack.push(child);
            }
        }

        Self { root, parents }
    }

    /// The immediate parent of `id`, or `id` itself at the root.
    pub fn query(&self, id: NodeId) -> NodeId {
        self.parents.get(&id).copied().unwrap_or(self.root)
    }

    /// Walks upward from `id` (inclusive) until it reaches `target`,
    /// returning the full chain, or `None` if `target` is never hit before
    /// the root.
    pub fn up_to(&self, id: NodeId, target: NodeId) -> Option<Vec<NodeId>> {
        let mut chain = vec![id];
        let mut cur = id;
        loop {
            if cur == target {
                return Some(chain);
            }
            if cur == self.root {
                return None;
            }
            cur = self.query(cur);
            chain.push(cur);
        }
    }

    /// Walks upward from `id` to the nearest enclosing expression node.
    /// Every node in this language is itself an expression
    /// (`NodeKind::is_expr` is unconditionally true — attr paths and
    /// bindings live outside the arena), so this is just the parent,
    /// exposed under the name `spec.md` gives the operation.
    pub fn up_expr(&self, ast: &Ast, id: NodeId) -> NodeId {
        let parent = self.query(id);
        debug_assert!(ast.get(parent).kind.is_expr());
        parent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix_parser_core::{lower, parse};

    fn build(src: &str) -> (Ast, Lowered, NodeId) {
        let mut out = parse(src);
        let root = out.ast.root().expect("parse always sets a root");
        let lowered = lower(&mut out.ast, root);
        (out.ast, lowered, root)
    }

    #[test]
    fn root_maps_to_itself() {
        let (ast, lowered, root) = build("1 + 2");
        let map = ParentMap::build(&ast, &lowered, root);
        assert_eq!(map.query(root), root);
    }

    #[test]
    fn binop_operands_point_back_at_the_binop() {
        let (ast, lowered, root) = build("1 + 2");
        let map = ParentMap::build(&ast, &lowered, root);
        let children = ast.children(root);
        assert_eq!(children.len(), 2);
        for child in children {
            assert_eq!(map.query(child), root);
        }
    }

    #[test]
    fn map_is_total_over_every_allocated_node() {
        let (ast, lowered, root) = build("let a = 1; in { b = a; inherit a; }");
        let map = ParentMap::build(&ast, &lowered, root);
        for i in 0..ast.len() {
            let id = NodeId(i as u32);
            // Every node must resolve without panicking, and `up_to` from
            // any node must eventually reach the root.
            assert!(map.up_to(id, root).is_some());
        }
    }

    #[test]
    fn inherited_name_parent_is_the_enclosing_attrs() {
        let (ast, lowered, root) = build("let a = 1; in { inherit a; }");
        let attrs_id = *ast
            .children(root)
            .iter()
            .find(|c| lowered.get(**c).is_some())
            .expect("let's body is an Attrs with a SemaAttrs entry");
        let sema = lowered.get(attrs_id).expect("checked above");
        let body = sema.static_attrs.get("a").expect("inherit a desugars to a static entry");
        let nix_ast::AttrBodyValue::Evaluable(value_id) = body.value else {
            panic!("inherited names lower to an Evaluable Var/Select, never Nested");
        };

        let map = ParentMap::build(&ast, &lowered, root);
        assert_eq!(map.query(value_id), attrs_id);
    }
}

//! The traversal that both analyses in this crate walk.
//!
//! `Ast::children` gives the raw CST shape; it already includes every
//! `Binding` value and every dynamic attr-name's interpolation parts, since
//! those are ordinary parsed nodes. What it cannot include is anything
//! lowering *synthesized*: the `Var`/`Select` nodes desugared out of
//! `inherit`, and the standalone key node built for a multi-part dynamic
//! string name (`"${a}${b}" = ...;`). Those only exist in `Lowered`, so
//! variable-lookup and parent-map both need the union of the two.

use nix_ast::{AttrBodyValue, Ast, NodeId, SemaAttrs};
use nix_parser_core::Lowered;

/// `id`'s CST children plus any lowering-synthesized nodes hung off its
/// `SemaAttrs`, if it has one. Entries can overlap with `Ast::children` (a
/// dynamic binding's value node, say, is reachable either way); traversals
/// over this must tolerate revisiting a node, not assume a tree.
pub fn semantic_children(ast: &Ast, lowered: &Lowered, id: NodeId) -> Vec<NodeId> {
    let mut out = ast.children(id);
    if let Some(sema) = lowered.get(id) {
        collect_synthetic(sema, &mut out);
    }
    out
}

fn collect_synthetic(sema: &SemaAttrs, out: &mut Vec<NodeId>) {
    for body in sema.static_attrs.values() {
        match &body.value {
            AttrBodyValue::Evaluable(value_id) => {
                if body.inherited {
                    out.push(*value_id);
                }
            }
            AttrBodyValue::Nested(nested) => collect_synthetic(nested, out),
        }
    }
    for dyn_attr in &sema.dynamic {
        out.push(dyn_attr.key);
        out.push(dyn_attr.value);
    }
}

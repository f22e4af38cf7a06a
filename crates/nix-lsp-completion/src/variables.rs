//! Builtin and in-scope-variable completions. Grounded on
//! `perl-lsp-completion::completion::variables`'s "look up what the symbol
//! table says is in scope, filter by prefix" shape; the Nix analogue of a
//! `SymbolTable` lookup is walking `ParentMap` ancestors and reading each
//! scope-introducing node's statically-known names directly, since
//! `nix-semantic-analyzer::vla` doesn't expose a per-position scope listing
//! of its own (it resolves one `Var` at a time, not "what's visible here").

use nix_ast::{LambdaArg, NodeKind};
use nix_semantic_analyzer::BUILTIN_NAMES;
use nix_tu::NixTu;
use lsp_types::CompletionItemKind;

use crate::item;

pub fn add_builtin_completions(out: &mut Vec<lsp_types::CompletionItem>, prefix: &str) {
    out.extend(
        BUILTIN_NAMES
            .iter()
            .filter(|name| name.starts_with(prefix))
            .map(|name| item(*name, CompletionItemKind::FUNCTION, Some("builtin"))),
    );
}

/// Names bound by any `let`/`rec {}`/lambda ancestor of the node at
/// `offset`, nearest scope first (duplicates across scopes are kept; a
/// client-side completion list tolerates repeated labels better than a
/// shadowing rule this approximate would get wrong in some edge case).
pub fn add_scope_completions(out: &mut Vec<lsp_types::CompletionItem>, tu: &NixTu, offset: usize, prefix: &str) {
    let mut cur = tu.ast.node_at_offset(tu.root, offset);
    loop {
        collect_scope_names(tu, cur, prefix, out);
        let parent = tu.parent_map.query(cur);
        if parent == cur {
            break;
        }
        cur = parent;
    }
}

fn collect_scope_names(tu: &NixTu, id: nix_ast::NodeId, prefix: &str, out: &mut Vec<lsp_types::CompletionItem>) {
    match &tu.ast.get(id).kind {
        NodeKind::Let { .. } => {
            if let Some(sema) = tu.lowered.get(id) {
                for name in sema.static_attrs.keys() {
                    push_if_match(out, name, prefix, "let");
                }
            }
        }
        NodeKind::Attrs { rec: true, .. } => {
            if let Some(sema) = tu.lowered.get(id) {
                for name in sema.static_attrs.keys() {
                    push_if_match(out, name, prefix, "rec attr");
                }
            }
        }
        NodeKind::Lambda { arg, .. } => match arg {
            LambdaArg::Simple(name, _) => push_if_match(out, name, prefix, "argument"),
            LambdaArg::Formals { formals, alias, .. } => {
                for formal in formals {
                    push_if_match(out, &formal.name, prefix, "formal");
                }
                if let Some((name, _)) = alias {
                    push_if_match(out, name, prefix, "argument");
                }
            }
        },
        _ => {}
    }
}

fn push_if_match(out: &mut Vec<lsp_types::CompletionItem>, name: &str, prefix: &str, detail: &str) {
    if name.starts_with(prefix) {
        out.push(item(name, CompletionItemKind::VARIABLE, Some(detail)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn lambda_formal_is_visible_inside_the_body() {
        let tu = NixTu::build(Arc::from("{ a, b }: a"), 1);
        let offset = tu.source.len();
        let mut out = Vec::new();
        add_scope_completions(&mut out, &tu, offset, "");
        let names: Vec<_> = out.iter().map(|i| i.label.as_str()).collect();
        assert!(names.contains(&"a"));
        assert!(names.contains(&"b"));
    }

    #[test]
    fn let_binding_is_visible_in_the_body() {
        let tu = NixTu::build(Arc::from("let foo = 1; in foo"), 1);
        let offset = tu.source.len();
        let mut out = Vec::new();
        add_scope_completions(&mut out, &tu, offset, "f");
        assert_eq!(out.iter().filter(|i| i.label == "foo").count(), 1);
    }
}

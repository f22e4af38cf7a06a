//! `textDocument/definition` (`spec.md` §6): resolves the `Var` under the
//! cursor to its defining site within the same document. `spec.md`'s
//! Non-goals exclude "multi-root project management beyond what LSP
//! configuration passes in", so this never crosses files — every
//! `Definition::site` lives in the document that produced the `NixTu`.

use nix_ast::NodeKind;
use nix_semantic_analyzer::{DefinitionKind, LookupKind};
use nix_position::WireRange;
use nix_tu::NixTu;
use lsp_types::{GotoDefinitionResponse, Location, Uri};

/// `None` when the node under the cursor isn't a resolvable `Var`, when
/// lookup found no static site (`FromWith`/`Undefined`), or when the site
/// is a builtin (`spec.md` §4.4: builtins are preloaded into the root scope
/// with no document position — there is nothing to jump to).
pub fn goto_definition(tu: &NixTu, uri: Uri, offset: usize) -> Option<GotoDefinitionResponse> {
    let node_id = tu.ast.node_at_offset(tu.root, offset);
    let NodeKind::Var(_) = &tu.ast.get(node_id).kind else {
        return None;
    };
    let result = tu.variable_lookup.get(node_id)?;
    if result.kind != LookupKind::Defined {
        return None;
    }
    let def = result.def.as_ref()?;
    if def.kind == DefinitionKind::Builtin {
        return None;
    }
    let range = WireRange::from_byte_offsets(&tu.source, def.site.start.offset, def.site.end.offset);
    Some(GotoDefinitionResponse::Scalar(Location { uri, range: range.into() }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn uri() -> Uri {
        "file:///a.nix".parse().expect("static uri parses")
    }

    #[test]
    fn resolves_to_the_let_binding_site() {
        let tu = NixTu::build(Arc::from("let x = 1; in x"), 1);
        let offset = tu.source.rfind('x').expect("x appears");
        let response = goto_definition(&tu, uri(), offset).expect("x resolves to a let binding");
        let GotoDefinitionResponse::Scalar(location) = response else {
            panic!("single-site resolution always returns Scalar");
        };
        assert_eq!(location.range.start.line, 0);
    }

    #[test]
    fn builtins_have_no_navigable_definition() {
        let tu = NixTu::build(Arc::from("builtins"), 1);
        assert!(goto_definition(&tu, uri(), 0).is_none());
    }

    #[test]
    fn from_with_has_no_static_definition() {
        let tu = NixTu::build(Arc::from("with pkgs; hello"), 1);
        let offset = tu.source.rfind("hello").expect("hello appears");
        assert!(goto_definition(&tu, uri(), offset).is_none());
    }
}

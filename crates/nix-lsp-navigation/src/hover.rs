//! `textDocument/hover` (`spec.md` §6): resolves the `Var` under the cursor
//! against its `NixTu`'s `VariableLookup` and renders the result as Markdown.
//! Grounded on `spec.md` §8 scenarios 4/5 (`let`-bound vs. `with`-scoped
//! resolution) — this is the provider those scenarios exist to exercise.

use nix_ast::NodeKind;
use nix_semantic_analyzer::{DefinitionKind, LookupKind};
use nix_tu::NixTu;
use lsp_types::{Hover, HoverContents, MarkupContent, MarkupKind};

/// Hover text for the node at `offset`, or `None` if it isn't a `Var` (or
/// isn't one the analyzer visited — e.g. a node produced by error recovery
/// with no resolvable name).
pub fn hover(tu: &NixTu, offset: usize) -> Option<Hover> {
    let node_id = tu.ast.node_at_offset(tu.root, offset);
    let NodeKind::Var(name) = &tu.ast.get(node_id).kind else {
        return None;
    };
    let result = tu.variable_lookup.get(node_id)?;

    let body = match result.kind {
        LookupKind::Defined => {
            let def = result.def.as_ref()?;
            match def.kind {
                DefinitionKind::Builtin => format!("`{name}`\n\nbuiltin"),
                DefinitionKind::Let => format!("`{name}`\n\nlet-bound at {}:{}", def.site.start.line + 1, def.site.start.column + 1),
                DefinitionKind::RecAttrs => format!("`{name}`\n\nrec-attribute at {}:{}", def.site.start.line + 1, def.site.start.column + 1),
                DefinitionKind::Formal => format!("`{name}`\n\nlambda formal at {}:{}", def.site.start.line + 1, def.site.start.column + 1),
                DefinitionKind::Arg => format!("`{name}`\n\nlambda argument at {}:{}", def.site.start.line + 1, def.site.start.column + 1),
            }
        }
        LookupKind::FromWith => format!("`{name}`\n\nresolved dynamically from an enclosing `with` scope"),
        LookupKind::Undefined => format!("`{name}`\n\nundefined variable"),
    };

    Some(Hover {
        contents: HoverContents::Markup(MarkupContent { kind: MarkupKind::Markdown, value: body }),
        range: Some(nix_position::WireRange::from_byte_offsets(&tu.source, tu.ast.get(node_id).range.start.offset, tu.ast.get(node_id).range.end.offset).into()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn hover_on_a_let_bound_variable_names_its_kind() {
        let tu = NixTu::build(Arc::from("let x = 1; in x"), 1);
        let offset = tu.source.rfind('x').expect("x appears");
        let hover = hover(&tu, offset).expect("x is a Var the analyzer visited");
        let HoverContents::Markup(content) = hover.contents else {
            panic!("hover always renders markdown");
        };
        assert!(content.value.contains("let-bound"));
    }

    #[test]
    fn hover_on_a_with_scoped_variable_says_so() {
        let tu = NixTu::build(Arc::from("with pkgs; hello"), 1);
        let offset = tu.source.rfind("hello").expect("hello appears");
        let hover = hover(&tu, offset).expect("hello is a Var");
        let HoverContents::Markup(content) = hover.contents else {
            panic!("hover always renders markdown");
        };
        assert!(content.value.contains("with"));
    }

    #[test]
    fn hover_on_a_non_variable_node_is_none() {
        let tu = NixTu::build(Arc::from("1 + 2"), 1);
        assert!(hover(&tu, 0).is_none());
    }
}

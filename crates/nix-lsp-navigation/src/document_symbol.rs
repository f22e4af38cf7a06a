//! `textDocument/documentSymbol` (`spec.md` §6): the outline view over a
//! document's top-level bindings. Walks the root's `SemaAttrs` (an `Attrs`
//! or, per `nix-parser-core`'s lowering of `Let` nodes, a `let`'s own
//! bindings too) rather than the raw CST, so `a.b.c = 1;`'s desugared
//! nesting shows up as `a > b > c` the same way it would in an editor's
//! attribute-path-aware outline.

use nix_ast::{Ast, AttrBodyValue, SemaAttrs};
use nix_tu::NixTu;
use lsp_types::{DocumentSymbol, SymbolKind};

pub fn document_symbols(tu: &NixTu) -> Vec<DocumentSymbol> {
    match tu.lowered.get(tu.root) {
        Some(sema) => symbols_for(&tu.ast, &tu.source, sema),
        None => Vec::new(),
    }
}

fn symbols_for(ast: &Ast, source: &str, sema: &SemaAttrs) -> Vec<DocumentSymbol> {
    sema.static_attrs
        .iter()
        .map(|(name, body)| {
            let (kind, children, full_range) = match &body.value {
                AttrBodyValue::Evaluable(value_id) => {
                    let value_range = ast.get(*value_id).range;
                    (SymbolKind::VARIABLE, Vec::new(), body.name_node.range().union(value_range))
                }
                AttrBodyValue::Nested(nested) => {
                    let children = symbols_for(ast, source, nested);
                    (SymbolKind::OBJECT, children, body.name_node.range())
                }
            };
            #[allow(deprecated)]
            DocumentSymbol {
                name: name.clone(),
                detail: None,
                kind,
                tags: None,
                deprecated: None,
                range: nix_position::WireRange::from_byte_offsets(source, full_range.start.offset, full_range.end.offset).into(),
                selection_range: nix_position::WireRange::from_byte_offsets(source, body.name_node.range().start.offset, body.name_node.range().end.offset).into(),
                children: if children.is_empty() { None } else { Some(children) },
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn nested_attr_path_becomes_nested_symbols() {
        let tu = NixTu::build(Arc::from("{ a.b.c = 1; }"), 1);
        let symbols = document_symbols(&tu);
        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].name, "a");
        let b = symbols[0].children.as_ref().expect("a nests b");
        assert_eq!(b[0].name, "b");
        let c = b[0].children.as_ref().expect("b nests c");
        assert_eq!(c[0].name, "c");
        assert_eq!(c[0].kind, SymbolKind::VARIABLE);
    }

    #[test]
    fn let_bindings_are_symbols_too() {
        let tu = NixTu::build(Arc::from("let x = 1; y = 2; in x"), 1);
        let symbols = document_symbols(&tu);
        let names: Vec<_> = symbols.iter().map(|s| s.name.as_str()).collect();
        assert!(names.contains(&"x"));
        assert!(names.contains(&"y"));
    }
}

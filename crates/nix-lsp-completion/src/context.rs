//! Attr-path completion context detection (`spec.md` §4.7/§4.8, scenario 7):
//! deciding whether a `.`-typed cursor position sits inside a `Select`'s
//! trailing attribute name, so the `nix-lsp` controller can fan an
//! `attrpathComplete`/`optionComplete` request out to a worker instead of (or
//! in addition to) the local completions in this crate. The parser keeps
//! each `.segment` as its own left-nested `Select` node (see
//! `nix-parser-core::parser::parse_select`'s doc comment), so one `Select`
//! node is exactly one path segment plus a reference to the rest of the
//! chain — no path-flattening walk is needed beyond following `expr`.

use nix_ast::NodeKind;
use nix_position::WireRange;
use nix_tu::NixTu;
use lsp_types::Range;

#[derive(Debug, Clone, PartialEq)]
pub struct SelectContext {
    /// The leftmost variable the chain is selecting into (`pkgs` in
    /// `pkgs.hel`), if the whole chain bottoms out at a bare `Var`. `None`
    /// when the base is some other expression (e.g. a function call) —
    /// the controller has nothing to key a worker lookup on in that case.
    pub base_name: Option<String>,
    /// Statically-known segments between `base_name` and the one being
    /// typed, root to leaf.
    pub scope: Vec<String>,
    /// The text of the segment under the cursor so far.
    pub prefix: String,
    /// The range replaced if a completion from this context is accepted.
    pub range: Range,
}

pub fn select_context(tu: &NixTu, offset: usize) -> Option<SelectContext> {
    let node = tu.ast.node_at_offset(tu.root, offset);
    let NodeKind::Select { expr, path, .. } = &tu.ast.get(node).kind else {
        return None;
    };
    let segment = path.first()?;
    let segment_range = segment.range();
    let cursor_in_segment = segment_range.contains_offset(offset)
        || (segment_range.is_empty() && segment_range.start.offset == offset)
        || offset == segment_range.end.offset;
    if !cursor_in_segment {
        return None;
    }
    let prefix = segment.static_name().unwrap_or("").to_string();

    let mut scope = Vec::new();
    let mut cur = *expr;
    let base_name = loop {
        match &tu.ast.get(cur).kind {
            NodeKind::Select { expr: inner_expr, path: inner_path, .. } => {
                let inner_segment = inner_path.first()?;
                scope.insert(0, inner_segment.static_name()?.to_string());
                cur = *inner_expr;
            }
            NodeKind::Var(name) => break Some(name.clone()),
            _ => break None,
        }
    };

    Some(SelectContext {
        base_name,
        scope,
        prefix,
        range: WireRange::from_byte_offsets(&tu.source, segment_range.start.offset, offset).into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn detects_a_single_segment_select() {
        let tu = NixTu::build(Arc::from("pkgs.hel"), 1);
        let ctx = select_context(&tu, tu.source.len()).expect("cursor is inside the select's segment");
        assert_eq!(ctx.base_name.as_deref(), Some("pkgs"));
        assert!(ctx.scope.is_empty());
        assert_eq!(ctx.prefix, "hel");
    }

    #[test]
    fn collects_preceding_static_segments_as_scope() {
        let tu = NixTu::build(Arc::from("pkgs.python3Packages.req"), 1);
        let ctx = select_context(&tu, tu.source.len()).expect("cursor is inside the last segment");
        assert_eq!(ctx.base_name.as_deref(), Some("pkgs"));
        assert_eq!(ctx.scope, vec!["python3Packages".to_string()]);
        assert_eq!(ctx.prefix, "req");
    }

    #[test]
    fn a_trailing_dot_with_nothing_typed_yet_has_an_empty_prefix() {
        let tu = NixTu::build(Arc::from("pkgs."), 1);
        let ctx = select_context(&tu, tu.source.len()).expect("trailing dot still opens a select context");
        assert_eq!(ctx.prefix, "");
    }

    #[test]
    fn a_bare_variable_is_not_a_select_context() {
        let tu = NixTu::build(Arc::from("pkgs"), 1);
        assert!(select_context(&tu, tu.source.len()).is_none());
    }
}

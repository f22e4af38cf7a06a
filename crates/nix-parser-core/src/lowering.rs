//! Attribute-set lowering (`spec.md` §4.3): attaches a `SemaAttrs` to every
//! `Attrs` node, desugaring dotted attr paths, merging duplicate prefixes,
//! and expanding `inherit`. Also rewrites every `IndString` node's parts
//! through `dedent_indented_string`, since indentation-stripping is the
//! other §4.3 operation that runs as part of this same pass.
//!
//! Synthetic nodes (the `Var`/`Select` an `inherit` desugars to, the `Str`
//! node a dynamic string-typed attr name needs a key `NodeId` for) are
//! pushed into the same arena the parser built, which is why `lower` takes
//! `&mut Ast` rather than `&Ast` — lowering is the one pass downstream of
//! parsing that still grows the tree.

use nix_ast::{
    Ast, AttrBody, AttrBodyValue, AttrName, Binding, BindOrInherit, Binds, InterpolPart, NodeId, NodeKind, SemaAttrs,
};
use nix_diagnostics::{Diagnostic, DiagnosticCode, Fix, Note};
use std::collections::HashMap;

pub struct Lowered {
    pub by_node: HashMap<NodeId, SemaAttrs>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Lowered {
    pub fn get(&self, id: NodeId) -> Option<&SemaAttrs> {
        self.by_node.get(&id)
    }
}

/// Lower every `Attrs` node reachable from `root`, plus run duplicate/dynamic
/// validation over every `Let`'s binds (which don't get a `SemaAttrs` of
/// their own — a `let` is scoping, not a value).
pub fn lower(ast: &mut Ast, root: NodeId) -> Lowered {
    let mut by_node = HashMap::new();
    let mut diagnostics = Vec::new();
    let mut stack = vec![root];
    let mut seen = std::collections::HashSet::new();
    while let Some(id) = stack.pop() {
        if !seen.insert(id) {
            continue;
        }
        stack.extend(ast.children(id));
        match ast.get(id).kind.clone() {
            NodeKind::Attrs { rec, binds } => {
                let sema = build_sema(ast, &binds, rec, false, &mut diagnostics);
                by_node.insert(id, sema);
            }
            NodeKind::Let { binds, .. } => {
                // `let` isn't a value and spec.md only requires a back-pointer
                // on `Attrs` nodes, but variable-lookup analysis still needs
                // the desugared static names to build this `let`'s scope, so
                // the builder is kept here too, under the `Let` node's id.
                let sema = build_sema(ast, &binds, false, true, &mut diagnostics);
                by_node.insert(id, sema);
            }
            NodeKind::IndString(parts) => {
                let dedented = dedent_indented_string(&parts);
                ast.get_mut(id).kind = NodeKind::IndString(dedented);
            }
            _ => {}
        }
    }
    Lowered { by_node, diagnostics }
}

fn build_sema(ast: &mut Ast, binds: &Binds, rec: bool, is_let: bool, diags: &mut Vec<Diagnostic>) -> SemaAttrs {
    let mut builder = SemaAttrs::new(rec);
    for bind in binds {
        match bind {
            BindOrInherit::Binding(binding) => insert_binding(ast, &mut builder, binding, is_let, diags),
            BindOrInherit::Inherit(inherit) => insert_inherit(ast, &mut builder, inherit, diags),
        }
    }
    builder
}

fn insert_binding(ast: &mut Ast, builder: &mut SemaAttrs, binding: &Binding, is_let: bool, diags: &mut Vec<Diagnostic>) {
    let Some(value) = binding.value else { return };
    let Some((leaf, prefix)) = binding.path.split_last() else { return };
    let mut current = builder;
    for name in prefix {
        current = descend_or_create(ast, current, name, is_let, diags);
    }
    insert_leaf(ast, current, leaf, value, is_let, diags);
}

/// Walk one static prefix segment, creating a nested builder if this is the
/// first binding to reach it, or diagnosing a collision if the slot already
/// holds a plain value.
fn descend_or_create<'a>(
    ast: &mut Ast,
    builder: &'a mut SemaAttrs,
    name: &AttrName,
    is_let: bool,
    diags: &mut Vec<Diagnostic>,
) -> &'a mut SemaAttrs {
    let Some(key) = name.static_name().map(str::to_string) else {
        push_dynamic_name(ast, builder, name, is_let, diags);
        // Dynamic prefixes don't have a static slot to descend into; reuse
        // the current builder so remaining path segments still land
        // somewhere rather than being silently dropped.
        return builder;
    };
    let needs_new = match builder.static_attrs.get(&key) {
        None => true,
        Some(body) => !matches!(body.value, AttrBodyValue::Nested(_)),
    };
    if needs_new {
        if let Some(existing) = builder.static_attrs.get(&key) {
            diags.push(
                Diagnostic::new(DiagnosticCode::AttrDuplicated, name.range())
                    .with_arg(key.clone())
                    .with_note(Note::new(DiagnosticCode::AttrDuplicated, existing.name_node.range())),
            );
        }
        builder
            .static_attrs
            .insert(key.clone(), AttrBody { inherited: false, name_node: name.clone(), value: AttrBodyValue::Nested(Box::new(SemaAttrs::new(false))) });
    }
    let Some(AttrBody { value: AttrBodyValue::Nested(nested), .. }) = builder.static_attrs.get_mut(&key) else {
        unreachable!("just inserted or already Nested above")
    };
    nested.as_mut()
}

fn insert_leaf(ast: &mut Ast, builder: &mut SemaAttrs, name: &AttrName, value: NodeId, is_let: bool, diags: &mut Vec<Diagnostic>) {
    let Some(key) = name.static_name().map(str::to_string) else {
        push_dynamic_leaf(ast, builder, name, value, is_let, diags);
        return;
    };
    let value_is_attrs = matches!(ast.get(value).kind, NodeKind::Attrs { .. });
    match builder.static_attrs.get(&key) {
        Some(existing) if matches!(existing.value, AttrBodyValue::Nested(_)) && value_is_attrs => {
            let AttrBodyValue::Nested(nested) = &existing.value else { unreachable!("checked by the match guard") };
            let nested_rec = nested.recursive;
            let NodeKind::Attrs { rec: value_rec, binds: value_binds } = ast.get(value).kind.clone() else { unreachable!() };
            if nested_rec != value_rec {
                diags.push(
                    Diagnostic::new(DiagnosticCode::RecIgnored, ast.get(value).range)
                        .with_note(Note::new(DiagnosticCode::RecIgnored, ast.get(value).range)),
                );
            }
            let Some(AttrBody { value: AttrBodyValue::Nested(nested), .. }) = builder.static_attrs.get_mut(&key) else {
                unreachable!("checked by the match guard")
            };
            for b in &value_binds {
                match b {
                    BindOrInherit::Binding(binding) => insert_binding_into(ast, nested, binding, is_let, diags),
                    BindOrInherit::Inherit(inherit) => insert_inherit(ast, nested, inherit, diags),
                }
            }
        }
        Some(existing) => {
            diags.push(
                Diagnostic::new(DiagnosticCode::AttrDuplicated, name.range())
                    .with_arg(key.clone())
                    .with_note(Note::new(DiagnosticCode::AttrDuplicated, existing.name_node.range())),
            );
        }
        None => {
            builder
                .static_attrs
                .insert(key, AttrBody { inherited: false, name_node: name.clone(), value: AttrBodyValue::Evaluable(value) });
        }
    }
}

/// Small helper so the merge loop above (which needs a fresh `&mut` to the
/// map entry each iteration, since it interleaves with `ast.get`) can still
/// call through the ordinary single-segment insert path.
fn insert_binding_into(ast: &mut Ast, builder: &mut SemaAttrs, binding: &Binding, is_let: bool, diags: &mut Vec<Diagnostic>) {
    insert_binding(ast, builder, binding, is_let, diags)
}

/// A dynamic prefix segment (`${x}.a = 1`): real Nix nests further under the
/// computed key, but `spec.md` only specifies the leaf case in detail, so
/// here the whole remaining path collapses into one dynamic entry keyed on
/// the first dynamic segment — a documented simplification (see DESIGN.md).
fn push_dynamic_name(ast: &mut Ast, builder: &mut SemaAttrs, name: &AttrName, is_let: bool, diags: &mut Vec<Diagnostic>) {
    if is_let {
        diags.push(Diagnostic::new(DiagnosticCode::LetDynamic, name.range()));
        return;
    }
    let key = dynamic_key_node(ast, name);
    builder.dynamic.push(nix_ast::DynamicAttr { key, value: key });
}

fn push_dynamic_leaf(ast: &mut Ast, builder: &mut SemaAttrs, name: &AttrName, value: NodeId, is_let: bool, diags: &mut Vec<Diagnostic>) {
    if is_let {
        diags.push(Diagnostic::new(DiagnosticCode::LetDynamic, name.range()));
        return;
    }
    let key = dynamic_key_node(ast, name);
    builder.dynamic.push(nix_ast::DynamicAttr { key, value });
}

fn dynamic_key_node(ast: &mut Ast, name: &AttrName) -> NodeId {
    match name {
        AttrName::Interpolation(id, _) => *id,
        AttrName::Str(parts, range) => ast.push(*range, NodeKind::Str(parts.clone())),
        AttrName::Id(_, range) | AttrName::Missing(range) => ast.push(*range, NodeKind::Error),
    }
}

fn insert_inherit(ast: &mut Ast, builder: &mut SemaAttrs, inherit: &nix_ast::Inherit, diags: &mut Vec<Diagnostic>) {
    for name in &inherit.names {
        if !name.is_static() {
            diags.push(
                Diagnostic::new(DiagnosticCode::DynamicInherit, name.range())
                    .with_fix(Fix::remove("remove dynamic inherit name", name.range())),
            );
            continue;
        }
        let Some(key) = name.static_name().map(str::to_string) else { unreachable!("is_static checked above") };
        let value_node = match inherit.expr {
            Some(expr) => ast.push(name.range(), NodeKind::Select { expr, path: vec![name.clone()], or_default: None }),
            None => ast.push(name.range(), NodeKind::Var(key.clone())),
        };
        match builder.static_attrs.get(&key) {
            Some(existing) => {
                diags.push(
                    Diagnostic::new(DiagnosticCode::AttrDuplicated, name.range())
                        .with_arg(key.clone())
                        .with_note(Note::new(DiagnosticCode::AttrDuplicated, existing.name_node.range())),
                );
            }
            None => {
                builder
                    .static_attrs
                    .insert(key, AttrBody { inherited: true, name_node: name.clone(), value: AttrBodyValue::Evaluable(value_node) });
            }
        }
    }
}

/// Fold indentation out of an indented string's literal fragments
/// (`spec.md` §4.3 "Strings/paths"): the minimum common leading-whitespace
/// prefix across every line that starts with literal text (a line that
/// starts right after an interpolation doesn't count as a dedent anchor),
/// then strip that many columns from the start of every such line, and drop
/// a final all-whitespace trailing fragment.
pub fn dedent_indented_string(parts: &[InterpolPart]) -> Vec<InterpolPart> {
    let lines = split_into_lines(parts);
    let min_indent = lines
        .iter()
        .filter(|l| l.starts_at_line_start)
        .filter(|l| !l.text.trim().is_empty() || l.has_interpolation_after)
        .map(|l| l.text.len() - l.text.trim_start_matches(' ').len())
        .min();
    let Some(indent) = min_indent else { return parts.to_vec() };
    let mut out = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        let text = if line.starts_at_line_start && line.text.len() >= indent { &line.text[indent..] } else { line.text.as_str() };
        let is_last = i + 1 == lines.len();
        if is_last && text.trim().is_empty() && !line.has_interpolation_after {
            continue;
        }
        if !text.is_empty() {
            out.push(InterpolPart::Escaped(text.to_string()));
        }
        if let Some(interp) = line.trailing_interpolation {
            out.push(InterpolPart::Interpolation(interp));
        }
    }
    out
}

struct Line {
    text: String,
    starts_at_line_start: bool,
    trailing_interpolation: Option<NodeId>,
    has_interpolation_after: bool,
}

fn split_into_lines(parts: &[InterpolPart]) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut cur = String::new();
    let mut at_line_start = true;
    for (idx, part) in parts.iter().enumerate() {
        match part {
            InterpolPart::Escaped(s) => {
                let mut segs = s.split('\n').peekable();
                while let Some(seg) = segs.next() {
                    cur.push_str(seg);
                    if segs.peek().is_some() {
                        lines.push(Line { text: std::mem::take(&mut cur), starts_at_line_start: at_line_start, trailing_interpolation: None, has_interpolation_after: false });
                        at_line_start = true;
                    }
                }
            }
            InterpolPart::Interpolation(id) => {
                let has_more_on_line = parts[idx + 1..].iter().take_while(|p| !matches!(p, InterpolPart::Escaped(s) if s.contains('\n'))).count() > 0
                    || idx + 1 == parts.len();
                lines.push(Line { text: std::mem::take(&mut cur), starts_at_line_start: at_line_start, trailing_interpolation: Some(*id), has_interpolation_after: has_more_on_line });
                at_line_start = false;
            }
        }
    }
    lines.push(Line { text: cur, starts_at_line_start: at_line_start, trailing_interpolation: None, has_interpolation_after: false });
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    #[test]
    fn nested_dotted_path_produces_nested_static_attrs() {
        let mut out = parse("{ a.b.c = 1; }");
        let root = out.ast.root().unwrap();
        let lowered = lower(&mut out.ast, root);
        assert!(lowered.diagnostics.is_empty());
        let sema = lowered.get(root).unwrap();
        let AttrBodyValue::Nested(b) = &sema.static_attrs["a"].value else { panic!("expected nested a") };
        let AttrBodyValue::Nested(c_holder) = &b.static_attrs["b"].value else { panic!("expected nested b") };
        assert!(matches!(c_holder.static_attrs["c"].value, AttrBodyValue::Evaluable(_)));
    }

    #[test]
    fn duplicate_attr_is_diagnosed_with_note_at_first_site() {
        let mut out = parse("{ a = 1; a = 2; }");
        let root = out.ast.root().unwrap();
        let lowered = lower(&mut out.ast, root);
        assert_eq!(lowered.diagnostics.len(), 1);
        assert_eq!(lowered.diagnostics[0].code, DiagnosticCode::AttrDuplicated);
        assert_eq!(lowered.diagnostics[0].notes[0].range.start.offset, 2);
    }

    #[test]
    fn lowering_is_idempotent_across_identical_parses() {
        // Parsing + lowering the same source twice (fresh arena each time,
        // as the translation-unit store always does on a re-parse) must
        // yield structurally equal `SemaAttrs` — deterministic recursive
        // descent allocates the same `NodeId`s in the same order both times.
        let mut a = parse("{ a.b = 1; c = 2; inherit (pkgs) hello; }");
        let root_a = a.ast.root().unwrap();
        let sema_a = lower(&mut a.ast, root_a).get(root_a).unwrap().clone();

        let mut b = parse("{ a.b = 1; c = 2; inherit (pkgs) hello; }");
        let root_b = b.ast.root().unwrap();
        let sema_b = lower(&mut b.ast, root_b).get(root_b).unwrap().clone();

        assert_eq!(sema_a, sema_b);
    }

    #[test]
    fn inherit_without_expr_becomes_var_binding() {
        let mut out = parse("{ inherit a b; }");
        let root = out.ast.root().unwrap();
        let lowered = lower(&mut out.ast, root);
        assert!(lowered.diagnostics.is_empty());
        let sema = lowered.get(root).unwrap();
        assert!(sema.static_attrs["a"].inherited);
        let AttrBodyValue::Evaluable(id) = sema.static_attrs["a"].value else { panic!() };
        assert!(matches!(out.ast.get(id).kind, NodeKind::Var(ref n) if n == "a"));
    }

    #[test]
    fn inherit_with_expr_becomes_select() {
        let mut out = parse("{ inherit (pkgs) hello; }");
        let root = out.ast.root().unwrap();
        let lowered = lower(&mut out.ast, root);
        let sema = lowered.get(root).unwrap();
        let AttrBodyValue::Evaluable(id) = sema.static_attrs["hello"].value else { panic!() };
        assert!(matches!(out.ast.get(id).kind, NodeKind::Select { .. }));
    }

    #[test]
    fn let_with_dynamic_attr_is_rejected() {
        let mut out = parse("let ${\"x\"} = 1; in 1");
        let root = out.ast.root().unwrap();
        let lowered = lower(&mut out.ast, root);
        assert!(lowered.diagnostics.iter().any(|d| d.code == DiagnosticCode::LetDynamic));
    }

    #[test]
    fn dedent_strips_common_indentation() {
        let mut out = parse("''\n  a\n  b\n''");
        let root = out.ast.root().unwrap();
        let NodeKind::IndString(parts) = out.ast.get(root).kind.clone() else { panic!("expected IndString") };
        let dedented = dedent_indented_string(&parts);
        let joined: String = dedented
            .iter()
            .map(|p| match p {
                InterpolPart::Escaped(s) => s.clone(),
                InterpolPart::Interpolation(_) => String::new(),
            })
            .collect();
        assert_eq!(joined, "a\nb\n");
    }

    #[test]
    fn lower_rewrites_ind_string_nodes_with_the_dedent() {
        let mut out = parse("{ x = ''\n  a\n    b\n  ''; }");
        let root = out.ast.root().unwrap();
        lower(&mut out.ast, root);
        let ind_string_id = out
            .ast
            .children(root)
            .into_iter()
            .find(|id| matches!(out.ast.get(*id).kind, NodeKind::IndString(_)))
            .expect("binding value is an IndString node");
        let NodeKind::IndString(parts) = &out.ast.get(ind_string_id).kind else { panic!("expected IndString") };
        let joined: String = parts
            .iter()
            .map(|p| match p {
                InterpolPart::Escaped(s) => s.clone(),
                InterpolPart::Interpolation(_) => String::new(),
            })
            .collect();
        assert_eq!(joined, "a\n  b\n");
    }
}

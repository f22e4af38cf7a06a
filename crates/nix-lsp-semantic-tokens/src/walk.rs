//! The tree walk behind [`crate::semantic_tokens`]: one call per CST node,
//! classifying it (and any keyword text `nix-ast` doesn't store as its own
//! node) before recursing into its children.

use crate::{RawToken, TokenType, MOD_DECLARATION, MOD_DEFAULT_LIBRARY};
use nix_ast::{Ast, AttrName, BindOrInherit, InterpolPart, NodeId, NodeKind};
use nix_semantic_analyzer::{DefinitionKind, LookupKind};
use nix_tu::NixTu;

pub(crate) fn collect(tu: &NixTu, id: NodeId, out: &mut Vec<RawToken>) {
    let node = tu.ast.get(id);
    let (start, end) = (node.range.start.offset, node.range.end.offset);
    match &node.kind {
        NodeKind::Int(_) | NodeKind::Float(_) => out.push(RawToken { start, end, ty: TokenType::Number, modifiers: 0 }),
        NodeKind::Uri(_) | NodeKind::SearchPath(_) => out.push(RawToken { start, end, ty: TokenType::String, modifiers: 0 }),
        NodeKind::Str(parts) | NodeKind::IndString(parts) | NodeKind::Path(parts) => {
            if is_purely_literal(parts) {
                out.push(RawToken { start, end, ty: TokenType::String, modifiers: 0 });
            }
            for part in parts {
                if let InterpolPart::Interpolation(inner) = part {
                    collect(tu, *inner, out);
                }
            }
        }
        NodeKind::Var(_) => {
            let (ty, modifiers) = classify_var(tu, id);
            out.push(RawToken { start, end, ty, modifiers });
        }
        NodeKind::Select { expr, path, or_default } => {
            collect(tu, *expr, out);
            push_attr_path(&tu.ast, path, out);
            if let Some(d) = or_default {
                collect(tu, *d, out);
            }
        }
        NodeKind::Attrs { rec, binds } => {
            if *rec {
                if let Some(range) = keyword_at(&tu.source, start, "rec") {
                    out.push(RawToken { start: range.0, end: range.1, ty: TokenType::Keyword, modifiers: 0 });
                }
            }
            collect_binds(tu, binds, out);
        }
        NodeKind::Let { binds, body } => {
            if let Some(range) = keyword_at(&tu.source, start, "let") {
                out.push(RawToken { start: range.0, end: range.1, ty: TokenType::Keyword, modifiers: 0 });
            }
            collect_binds(tu, binds, out);
            let body_start = tu.ast.get(*body).range.start.offset;
            if let Some(range) = find_keyword_between(&tu.source, binds_end(&tu.ast, binds).unwrap_or(start), body_start, "in") {
                out.push(RawToken { start: range.0, end: range.1, ty: TokenType::Keyword, modifiers: 0 });
            }
            collect(tu, *body, out);
        }
        NodeKind::With { expr, body } => {
            if let Some(range) = keyword_at(&tu.source, start, "with") {
                out.push(RawToken { start: range.0, end: range.1, ty: TokenType::Keyword, modifiers: 0 });
            }
            collect(tu, *expr, out);
            collect(tu, *body, out);
        }
        NodeKind::If { cond, then_branch, else_branch } => {
            if let Some(range) = keyword_at(&tu.source, start, "if") {
                out.push(RawToken { start: range.0, end: range.1, ty: TokenType::Keyword, modifiers: 0 });
            }
            collect(tu, *cond, out);
            let cond_end = tu.ast.get(*cond).range.end.offset;
            let then_start = tu.ast.get(*then_branch).range.start.offset;
            if let Some(range) = find_keyword_between(&tu.source, cond_end, then_start, "then") {
                out.push(RawToken { start: range.0, end: range.1, ty: TokenType::Keyword, modifiers: 0 });
            }
            collect(tu, *then_branch, out);
            let then_end = tu.ast.get(*then_branch).range.end.offset;
            let else_start = tu.ast.get(*else_branch).range.start.offset;
            if let Some(range) = find_keyword_between(&tu.source, then_end, else_start, "else") {
                out.push(RawToken { start: range.0, end: range.1, ty: TokenType::Keyword, modifiers: 0 });
            }
            collect(tu, *else_branch, out);
        }
        NodeKind::Assert { cond, body } => {
            if let Some(range) = keyword_at(&tu.source, start, "assert") {
                out.push(RawToken { start: range.0, end: range.1, ty: TokenType::Keyword, modifiers: 0 });
            }
            collect(tu, *cond, out);
            collect(tu, *body, out);
        }
        NodeKind::Lambda { arg, body } => {
            if let nix_ast::LambdaArg::Formals { formals, .. } = arg {
                for formal in formals {
                    out.push(RawToken { start: formal.range.start.offset, end: formal.range.end.offset, ty: TokenType::Parameter, modifiers: MOD_DECLARATION });
                    if let Some(default) = formal.default {
                        collect(tu, default, out);
                    }
                }
            }
            collect(tu, *body, out);
        }
        _ => {
            for child in tu.ast.children(id) {
                collect(tu, child, out);
            }
        }
    }
}

fn is_purely_literal(parts: &[InterpolPart]) -> bool {
    parts.iter().all(|p| matches!(p, InterpolPart::Escaped(_)))
}

fn classify_var(tu: &NixTu, id: NodeId) -> (TokenType, u32) {
    match tu.variable_lookup.get(id) {
        Some(result) if result.kind == LookupKind::Defined => match result.def.as_ref().map(|d| d.kind) {
            Some(DefinitionKind::Formal) | Some(DefinitionKind::Arg) => (TokenType::Parameter, 0),
            Some(DefinitionKind::Builtin) => (TokenType::Variable, MOD_DEFAULT_LIBRARY),
            _ => (TokenType::Variable, 0),
        },
        _ => (TokenType::Variable, 0),
    }
}

fn collect_binds(tu: &NixTu, binds: &nix_ast::Binds, out: &mut Vec<RawToken>) {
    for bind in binds {
        match bind {
            BindOrInherit::Binding(binding) => {
                push_attr_path(&tu.ast, &binding.path, out);
                if let Some(value) = binding.value {
                    collect(tu, value, out);
                }
            }
            BindOrInherit::Inherit(inherit) => {
                push_attr_path(&tu.ast, &inherit.names, out);
                if let Some(expr) = inherit.expr {
                    collect(tu, expr, out);
                }
            }
        }
    }
}

fn push_attr_path(ast: &Ast, path: &[AttrName], out: &mut Vec<RawToken>) {
    for name in path {
        match name {
            AttrName::Id(_, range) => out.push(RawToken { start: range.start.offset, end: range.end.offset, ty: TokenType::Property, modifiers: 0 }),
            AttrName::Str(parts, range) if is_purely_literal(parts) => {
                out.push(RawToken { start: range.start.offset, end: range.end.offset, ty: TokenType::Property, modifiers: 0 })
            }
            AttrName::Str(parts, _) => {
                for part in parts {
                    if let InterpolPart::Interpolation(inner) = part {
                        collect_from_ast(ast, *inner, out);
                    }
                }
            }
            AttrName::Interpolation(inner, _) => collect_from_ast(ast, *inner, out),
            AttrName::Missing(_) => {}
        }
    }
}

/// A reduced walk used only for the handful of places (dynamic attr names
/// inside a path) that don't have a `NixTu` at hand — just `Ast`. These
/// sub-expressions still get classified for literals/strings/vars, just
/// without the variable-lookup-aware parameter/builtin distinction.
fn collect_from_ast(ast: &Ast, id: NodeId, out: &mut Vec<RawToken>) {
    let node = ast.get(id);
    let (start, end) = (node.range.start.offset, node.range.end.offset);
    match &node.kind {
        NodeKind::Int(_) | NodeKind::Float(_) => out.push(RawToken { start, end, ty: TokenType::Number, modifiers: 0 }),
        NodeKind::Var(_) => out.push(RawToken { start, end, ty: TokenType::Variable, modifiers: 0 }),
        NodeKind::Str(parts) if is_purely_literal(parts) => out.push(RawToken { start, end, ty: TokenType::String, modifiers: 0 }),
        _ => {
            for child in ast.children(id) {
                collect_from_ast(ast, child, out);
            }
        }
    }
}

fn keyword_at(source: &str, offset: usize, word: &str) -> Option<(usize, usize)> {
    let rest = source.get(offset..)?;
    if !rest.starts_with(word) {
        return None;
    }
    let after = rest.as_bytes().get(word.len()).copied();
    if after.is_some_and(|b| b.is_ascii_alphanumeric() || b == b'_') {
        return None;
    }
    Some((offset, offset + word.len()))
}

/// Finds the first whole-word occurrence of `word` in `source[from..to]`,
/// used for keywords (`in`, `then`, `else`) that sit between two child
/// ranges rather than at a node's own start.
fn find_keyword_between(source: &str, from: usize, to: usize, word: &str) -> Option<(usize, usize)> {
    if from >= to || to > source.len() {
        return None;
    }
    let slice = &source[from..to];
    let mut search_from = 0;
    while let Some(pos) = slice[search_from..].find(word) {
        let abs = from + search_from + pos;
        if keyword_at(source, abs, word).is_some() {
            return Some((abs, abs + word.len()));
        }
        search_from += pos + 1;
        if search_from >= slice.len() {
            break;
        }
    }
    None
}

fn binds_end(ast: &Ast, binds: &nix_ast::Binds) -> Option<usize> {
    binds.iter().rev().find_map(|b| match b {
        BindOrInherit::Binding(binding) => binding.value.map(|v| ast.get(v).range.end.offset),
        BindOrInherit::Inherit(inherit) => inherit.names.last().map(|n| n.range().end.offset),
    })
}

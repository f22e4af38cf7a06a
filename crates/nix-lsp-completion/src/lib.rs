//! `textDocument/completion` (`spec.md` §6, trigger character `.`).
//!
//! This crate only covers the locally-answerable half of completion:
//! keywords, in-scope variables, and builtins, straight from a `NixTu`
//! snapshot, grounded on `perl-lsp-completion`'s per-source-module split
//! (`keywords.rs`/`variables.rs`/... in the teacher, `keywords`/`variables`
//! here). The attribute/option half (`spec.md` §4.7's `attrpathComplete`/
//! `optionComplete`) needs a live evaluator and so is fanned out by the
//! `nix-lsp` controller itself once [`select_context`] tells it a `.`-typed
//! position is inside a `Select` rather than a bare identifier.

mod context;
mod keywords;
mod variables;

pub use context::{select_context, SelectContext};

use nix_tu::NixTu;
use lsp_types::{CompletionItem, CompletionItemKind};

/// Local completion items for the identifier prefix ending at `offset`.
/// Always returns keywords and builtins matching the prefix; in-scope
/// variables are added when `offset` sits inside an identifier-shaped
/// token (the common case — a bare `Var` being typed).
pub fn complete(tu: &NixTu, offset: usize) -> Vec<CompletionItem> {
    let prefix = identifier_prefix(&tu.source, offset);
    let mut out = Vec::new();
    keywords::add_keyword_completions(&mut out, &prefix);
    variables::add_builtin_completions(&mut out, &prefix);
    variables::add_scope_completions(&mut out, tu, offset, &prefix);
    out
}

/// The identifier characters immediately preceding `offset` (Nix identifier
/// syntax: `[A-Za-z_][A-Za-z0-9_'-]*`, per `spec.md` §4.1).
fn identifier_prefix(source: &str, offset: usize) -> String {
    let bytes = source.as_bytes();
    let mut start = offset;
    while start > 0 {
        let c = bytes[start - 1];
        if c.is_ascii_alphanumeric() || c == b'_' || c == b'\'' || c == b'-' {
            start -= 1;
        } else {
            break;
        }
    }
    source.get(start..offset).unwrap_or("").to_string()
}

fn item(label: impl Into<String>, kind: CompletionItemKind, detail: Option<&str>) -> CompletionItem {
    CompletionItem { label: label.into(), kind: Some(kind), detail: detail.map(str::to_string), ..Default::default() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn completes_a_partial_keyword() {
        let tu = NixTu::build(Arc::from("wi"), 1);
        let items = complete(&tu, 2);
        assert!(items.iter().any(|i| i.label == "with"));
    }

    #[test]
    fn completes_a_partial_builtin() {
        let tu = NixTu::build(Arc::from("toS"), 1);
        let items = complete(&tu, 3);
        assert!(items.iter().any(|i| i.label == "toString"));
    }
}

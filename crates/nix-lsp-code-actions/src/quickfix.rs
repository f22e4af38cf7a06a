//! Turns a [`Diagnostic`]'s [`Fix`]es into `lsp_types::CodeAction`s, one
//! action per fix. Grounded on `perl-lsp-code-actions::code_actions`'s
//! "dispatch by diagnostic code to a fix function, one action per fix"
//! shape, but driven off `nix_diagnostics::Fix` (already attached to the
//! diagnostic at the point it's raised) rather than a second code-specific
//! dispatch table — every fix this workspace raises already carries its own
//! edits, so there is nothing left to re-derive here.

use std::collections::HashMap;

use nix_config::Config;
use nix_diagnostics::Diagnostic;
use nix_position::WireRange;
use nix_tu::NixTu;
use lsp_types::{CodeAction, CodeActionKind, TextEdit, Uri, WorkspaceEdit};

pub fn quickfixes(tu: &NixTu, config: &Config, uri: &Uri, start_offset: usize, end_offset: usize) -> Vec<CodeAction> {
    nix_lsp_diagnostics::collect(tu, config)
        .iter()
        .filter(|d| ranges_overlap(d.range.start.offset, d.range.end.offset, start_offset, end_offset))
        .flat_map(|d| fixes_to_actions(&tu.source, uri, d))
        .collect()
}

fn ranges_overlap(a_start: usize, a_end: usize, b_start: usize, b_end: usize) -> bool {
    a_start <= b_end && b_start <= a_end
}

fn fixes_to_actions(source: &str, uri: &Uri, diagnostic: &Diagnostic) -> Vec<CodeAction> {
    diagnostic
        .fixes
        .iter()
        .map(|fix| {
            let edits: Vec<TextEdit> = fix
                .edits
                .iter()
                .map(|e| TextEdit {
                    range: WireRange::from_byte_offsets(source, e.old_range.start.offset, e.old_range.end.offset).into(),
                    new_text: e.new_text.clone(),
                })
                .collect();
            let mut changes = HashMap::new();
            changes.insert(uri.clone(), edits);
            CodeAction {
                title: fix.message.clone(),
                kind: Some(CodeActionKind::QUICKFIX),
                diagnostics: None,
                edit: Some(WorkspaceEdit { changes: Some(changes), document_changes: None, change_annotations: None }),
                command: None,
                is_preferred: Some(diagnostic.fixes.len() == 1),
                disabled: None,
                data: None,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn uri() -> Uri {
        "file:///a.nix".parse().expect("static uri parses")
    }

    #[test]
    fn unterminated_attrs_offers_a_quickfix_covering_its_range() {
        let tu = NixTu::build(Arc::from("rec { a = 1;"), 1);
        let actions = quickfixes(&tu, &Config::default(), &uri(), 0, tu.source.len());
        assert!(!actions.is_empty());
        assert!(actions.iter().all(|a| a.kind == Some(CodeActionKind::QUICKFIX)));
    }

    #[test]
    fn a_range_outside_the_diagnostic_excludes_it() {
        let tu = NixTu::build(Arc::from("let in_=1; in rec { a = 1;"), 1);
        let actions = quickfixes(&tu, &Config::default(), &uri(), 0, 3);
        assert!(actions.is_empty());
    }
}

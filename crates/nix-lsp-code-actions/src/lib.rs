//! `textDocument/codeAction` (`spec.md` §6): quickfixes synthesized from a
//! `NixTu`'s diagnostics, plus the noogle-documentation refactor. Grounded
//! on `perl-lsp-code-actions`'s "provider returns every applicable action
//! for a range" entry point, split the same way `nix-lsp-navigation` splits
//! its methods — one module per distinct kind of action.

mod noogle;
mod quickfix;

use nix_config::Config;
use nix_tu::NixTu;
use lsp_types::{CodeAction, Uri};

/// Every applicable code action for `start_offset..end_offset` in `tu`.
pub fn code_actions(tu: &NixTu, config: &Config, uri: &Uri, start_offset: usize, end_offset: usize) -> Vec<CodeAction> {
    let mut out = quickfix::quickfixes(tu, config, uri, start_offset, end_offset);
    out.extend(noogle::noogle_action(tu, start_offset));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn combines_quickfixes_and_noogle() {
        let tu = NixTu::build(Arc::from("lib.strings.concat"), 1);
        let uri: Uri = "file:///a.nix".parse().expect("static uri parses");
        let offset = "lib.strings".len();
        let actions = code_actions(&tu, &Config::default(), &uri, offset, offset);
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].kind, Some(lsp_types::CodeActionKind::new("refactor.noogle")));
    }

    #[test]
    fn error_free_source_has_no_actions() {
        let tu = NixTu::build(Arc::from("let a = 1; in a"), 1);
        let uri: Uri = "file:///a.nix".parse().expect("static uri parses");
        assert!(code_actions(&tu, &Config::default(), &uri, 0, tu.source.len()).is_empty());
    }
}

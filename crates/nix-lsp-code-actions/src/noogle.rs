//! The noogle-documentation refactor (`spec.md` §6, §8 scenario 6): offered
//! only when the cursor sits on a `Select` whose leftmost expression is the
//! bare variable `lib`, since that's the only namespace noogle.dev indexes
//! documentation for. Grounded on the same "one `Select` node is one
//! `.segment`" parser shape `nix-lsp-completion::context` relies on, reused
//! here to walk the other direction: from the clicked segment back to the
//! full dotted path instead of forward to a completion prefix.

use nix_ast::NodeKind;
use nix_tu::NixTu;
use lsp_types::{CodeAction, CodeActionKind, Command};

const COMMAND: &str = "nix-lsp.openNoogle";

pub fn noogle_action(tu: &NixTu, offset: usize) -> Option<CodeAction> {
    let node = tu.ast.node_at_offset(tu.root, offset);
    let NodeKind::Select { expr, path, .. } = &tu.ast.get(node).kind else {
        return None;
    };
    let mut segments = vec![path.first()?.static_name()?.to_string()];
    let mut cur = *expr;
    let base = loop {
        match &tu.ast.get(cur).kind {
            NodeKind::Select { expr: inner_expr, path: inner_path, .. } => {
                segments.insert(0, inner_path.first()?.static_name()?.to_string());
                cur = *inner_expr;
            }
            NodeKind::Var(name) => break name.clone(),
            _ => return None,
        }
    };
    if base != "lib" {
        return None;
    }
    let dotted = format!("lib.{}", segments.join("."));
    let url = format!("https://noogle.dev/q?term={dotted}");
    Some(CodeAction {
        title: format!("Search noogle.dev for `{dotted}`"),
        kind: Some(CodeActionKind::new("refactor.noogle")),
        diagnostics: None,
        edit: None,
        command: Some(Command { title: dotted, command: COMMAND.to_string(), arguments: Some(vec![serde_json::Value::String(url)]) }),
        is_preferred: None,
        disabled: None,
        data: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn activates_on_a_lib_dotted_select() {
        let tu = NixTu::build(Arc::from("lib.strings.concat"), 1);
        let offset = "lib.strings".len();
        let action = noogle_action(&tu, offset).expect("lib-rooted select activates the action");
        assert!(action.command.expect("command set").arguments.expect("args")[0].as_str().unwrap().contains("lib.strings"));
    }

    #[test]
    fn does_not_activate_on_a_non_lib_select() {
        let tu = NixTu::build(Arc::from("pkgs.hello"), 1);
        let offset = "pkgs.hello".len();
        assert!(noogle_action(&tu, offset).is_none());
    }
}

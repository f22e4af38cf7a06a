//! Fans `textDocument/completion` out to an evaluator worker when the
//! cursor sits inside a `Select` chain rooted at a name the controller has
//! a worker for (`spec.md` §4.7/§4.8, scenario 7). `nix-lsp-completion`
//! only ever sees one `NixTu` and has no notion of workers, so this glue
//! lives here rather than in that crate.
//!
//! Binding a bare variable name to a worker role is a decision `spec.md`
//! leaves open: it specifies the RPC surface (`attrpathComplete`,
//! `optionComplete`) but not how a `Select`'s base variable picks a worker.
//! This server uses the conventional nixpkgs root binding name `pkgs` for
//! the attribute-set worker, and an `options.<name>` config key equal to
//! the base variable name for option workers — recorded as an open
//! question resolution in `DESIGN.md`.

use crate::server::Server;
use lsp_types::{CompletionItem, CompletionItemKind};
use nix_lsp_completion::select_context;
use nix_tu::NixTu;
use nix_worker_protocol::{AttrpathCompleteParams, OptionCompleteParams};

const NIXPKGS_ROOT_NAME: &str = "pkgs";

pub fn complete(server: &Server, tu: &NixTu, offset: usize) -> Vec<CompletionItem> {
    let mut items = nix_lsp_completion::complete(tu, offset);
    if let Some(ctx) = select_context(tu, offset) {
        items.extend(worker_items(server, &ctx));
    }
    items
}

fn worker_items(server: &Server, ctx: &nix_lsp_completion::SelectContext) -> Vec<CompletionItem> {
    let Some(base) = &ctx.base_name else { return Vec::new() };
    let config = server.config.read();
    let workers = server.workers.lock();

    if base == NIXPKGS_ROOT_NAME {
        let Some(expr) = config.nixpkgs.expr.clone() else { return Vec::new() };
        let params = AttrpathCompleteParams { scope: ctx.scope.clone(), prefix: ctx.prefix.clone(), max_items: None };
        return match workers.attrpath_complete(&expr, params) {
            Ok(value) => match serde_json::from_value::<Vec<String>>(value) {
                Ok(names) => names.into_iter().map(|n| item(n, CompletionItemKind::PROPERTY)).collect(),
                Err(_) => Vec::new(),
            },
            Err(err) => {
                tracing::debug!(%err, "attrpathComplete RPC failed");
                Vec::new()
            }
        };
    }

    if let Some(option_cfg) = config.options.get(base) {
        let params = OptionCompleteParams { scope: ctx.scope.clone(), prefix: ctx.prefix.clone() };
        return match workers.option_complete(base, &option_cfg.expr, params) {
            Ok(value) => match serde_json::from_value::<Vec<nix_worker_protocol::OptionField>>(value) {
                Ok(fields) => fields
                    .into_iter()
                    .map(|f| CompletionItem { detail: f.type_summary, ..item(f.name, CompletionItemKind::FIELD) })
                    .collect(),
                Err(_) => Vec::new(),
            },
            Err(err) => {
                tracing::debug!(%err, option = %base, "optionComplete RPC failed");
                Vec::new()
            }
        };
    }

    Vec::new()
}

fn item(label: String, kind: CompletionItemKind) -> CompletionItem {
    CompletionItem { label, kind: Some(kind), ..Default::default() }
}

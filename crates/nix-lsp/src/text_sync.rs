//! `textDocument/didOpen`/`didChange`/`didClose`/`didSave` (`spec.md` §4.6):
//! runs on the I/O thread, never the pool, so documents within one path are
//! always processed in arrival order (`spec.md` §5).

use crate::server::Server;
use lsp_types::{
    DidChangeTextDocumentParams, DidCloseTextDocumentParams, DidOpenTextDocumentParams, DidSaveTextDocumentParams,
};
use std::sync::Arc;

pub fn did_open(server: &Server, params: DidOpenTextDocumentParams) {
    let uri = params.text_document.uri.to_string();
    let version = params.text_document.version;
    server.drafts.lock().open(uri.clone(), version, params.text_document.text);
    rebuild_and_publish(server, &uri, version);
}

pub fn did_change(server: &Server, params: DidChangeTextDocumentParams) {
    let uri = params.text_document.uri.to_string();
    let version = params.text_document.version;
    {
        let mut drafts = server.drafts.lock();
        let Some(draft) = drafts.get_mut(&uri) else {
            tracing::warn!(%uri, "didChange for a document with no open draft");
            return;
        };
        for change in params.content_changes {
            let range = change.range.map(|r| ((r.start.line, r.start.character), (r.end.line, r.end.character)));
            draft.apply_change(range, &change.text, version);
        }
    }
    rebuild_and_publish(server, &uri, version);
}

pub fn did_close(server: &Server, params: DidCloseTextDocumentParams) {
    let uri = params.text_document.uri.to_string();
    server.drafts.lock().close(&uri);
    server.tus.remove(&uri);
}

/// `spec.md` §4.8 doesn't ask for anything on save beyond what `didChange`
/// already published — the document text is unchanged, so there is
/// nothing new to re-derive.
pub fn did_save(_server: &Server, _params: DidSaveTextDocumentParams) {}

fn rebuild_and_publish(server: &Server, uri: &str, version: i32) {
    let text = {
        let drafts = server.drafts.lock();
        let Some(draft) = drafts.get(uri) else { return };
        draft.text()
    };
    let tu = server.tus.rebuild(uri, Arc::from(text.as_str()), version);
    let config = server.config.read();
    let doc_uri: lsp_types::Uri = uri.parse().unwrap_or_else(|_| nix_position::fallback_lsp_uri());
    let params = nix_lsp_diagnostics::publish_params(doc_uri, &tu, &config);
    server.write_framed(&nix_lsp_protocol::JsonRpcNotification::new(
        nix_lsp_protocol::methods::TEXT_DOCUMENT_PUBLISH_DIAGNOSTICS,
        Some(serde_json::to_value(params).unwrap_or(serde_json::Value::Null)),
    ));
}

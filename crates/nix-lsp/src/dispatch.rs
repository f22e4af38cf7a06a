//! Request/notification routing (`spec.md` §4.8): one big method-string
//! match, the same shape as `perl-lsp`'s `handle_request`, split so that
//! document-sync notifications run inline on the I/O thread while every
//! other request is handed to the work pool (`spec.md` §5: "message
//! handlers are dispatched onto a bounded worker pool").
//!
//! Pool-dispatched handlers write their own response once they finish,
//! since by design they may still be queued or running after `handle`
//! returns control to the I/O thread.

use crate::completion;
use crate::server::Server;
use crate::text_sync;
use lsp_types::{
    CodeActionParams, CompletionParams, DidChangeConfigurationParams, DocumentFormattingParams,
    DocumentLinkParams, DocumentSymbolParams, GotoDefinitionParams, HoverParams,
    InitializeParams, InitializeResult, SemanticTokensParams, SemanticTokensResult,
};
use nix_lsp_protocol::{error_codes, methods, JsonRpcError, JsonRpcRequest, JsonRpcResponse};
use serde_json::Value;
use std::sync::Arc;

pub fn handle(server: &Arc<Server>, request: JsonRpcRequest) {
    if request.method == methods::CANCEL_REQUEST {
        handle_cancel(server, request.params);
        return;
    }

    if request.is_notification() {
        handle_notification(server, request);
        return;
    }

    let id = request.id.clone().expect("non-notification always carries an id");

    if methods::is_cancellable(&request.method) && server.take_cancelled(&id) {
        server.write_framed(&JsonRpcResponse::error(Some(id), cancelled_error()));
        return;
    }

    match request.method.as_str() {
        methods::INITIALIZE => {
            let response = handle_initialize(request.params);
            server.write_framed(&respond(id, response));
        }
        methods::SHUTDOWN => {
            server.mark_shutdown();
            server.write_framed(&JsonRpcResponse::success(Some(id), Value::Null));
        }
        other if other == methods::TEXT_DOCUMENT_HOVER => dispatch_pooled(server, id, request.params, |server, params| {
            let params: HoverParams = parse(params)?;
            let uri = params.text_document_position_params.text_document.uri.to_string();
            let tu = snapshot(server, &uri)?;
            let offset = position_to_offset(&tu, params.text_document_position_params.position);
            Ok(serde_json::to_value(nix_lsp_navigation::hover(&tu, offset)).unwrap_or(Value::Null))
        }),
        other if other == methods::TEXT_DOCUMENT_DEFINITION => dispatch_pooled(server, id, request.params, |server, params| {
            let params: GotoDefinitionParams = parse(params)?;
            let doc_uri = params.text_document_position_params.text_document.uri;
            let uri = doc_uri.to_string();
            let tu = snapshot(server, &uri)?;
            let offset = position_to_offset(&tu, params.text_document_position_params.position);
            Ok(serde_json::to_value(nix_lsp_navigation::goto_definition(&tu, doc_uri, offset)).unwrap_or(Value::Null))
        }),
        other if other == methods::TEXT_DOCUMENT_COMPLETION => dispatch_pooled(server, id, request.params, |server, params| {
            let params: CompletionParams = parse(params)?;
            let uri = params.text_document_position.text_document.uri.to_string();
            let tu = snapshot(server, &uri)?;
            let offset = position_to_offset(&tu, params.text_document_position.position);
            Ok(serde_json::to_value(completion::complete(server, &tu, offset)).unwrap_or_else(|_| Value::Array(Vec::new())))
        }),
        other if other == methods::TEXT_DOCUMENT_CODE_ACTION => dispatch_pooled(server, id, request.params, |server, params| {
            let params: CodeActionParams = parse(params)?;
            let uri = params.text_document.uri.clone();
            let tu = snapshot(server, &uri.to_string())?;
            let start = position_to_offset(&tu, params.range.start);
            let end = position_to_offset(&tu, params.range.end);
            let config = server.config.read();
            Ok(serde_json::to_value(nix_lsp_code_actions::code_actions(&tu, &config, &uri, start, end)).unwrap_or_else(|_| Value::Array(Vec::new())))
        }),
        other if other == methods::TEXT_DOCUMENT_DOCUMENT_LINK => dispatch_pooled(server, id, request.params, |server, params| {
            let params: DocumentLinkParams = parse(params)?;
            let uri = params.text_document.uri.clone();
            let tu = snapshot(server, &uri.to_string())?;
            Ok(serde_json::to_value(nix_lsp_navigation::document_links(&tu, &uri)).unwrap_or_else(|_| Value::Array(Vec::new())))
        }),
        other if other == methods::TEXT_DOCUMENT_DOCUMENT_SYMBOL => dispatch_pooled(server, id, request.params, |server, params| {
            let params: DocumentSymbolParams = parse(params)?;
            let uri = params.text_document.uri.to_string();
            let tu = snapshot(server, &uri)?;
            Ok(serde_json::to_value(nix_lsp_navigation::document_symbols(&tu)).unwrap_or_else(|_| Value::Array(Vec::new())))
        }),
        other if other == methods::TEXT_DOCUMENT_SEMANTIC_TOKENS_FULL => dispatch_pooled(server, id, request.params, |server, params| {
            let params: SemanticTokensParams = parse(params)?;
            let uri = params.text_document.uri.to_string();
            let tu = snapshot(server, &uri)?;
            let result = SemanticTokensResult::Tokens(lsp_types::SemanticTokens {
                result_id: None,
                data: nix_lsp_semantic_tokens::semantic_tokens(&tu),
            });
            Ok(serde_json::to_value(result).unwrap_or(Value::Null))
        }),
        other if other == methods::TEXT_DOCUMENT_FORMATTING => dispatch_pooled(server, id, request.params, |server, params| {
            let params: DocumentFormattingParams = parse(params)?;
            let uri = params.text_document.uri.to_string();
            let tu = snapshot(server, &uri)?;
            let config = server.config.read();
            match nix_lsp_formatting::format_document(&tu.source, &config.formatting.command) {
                Ok(edit) => Ok(serde_json::to_value(edit.into_iter().collect::<Vec<_>>()).unwrap_or_else(|_| Value::Array(Vec::new()))),
                Err(err) => Err(JsonRpcError::new(error_codes::INTERNAL_ERROR, err.to_string())),
            }
        }),
        other => {
            server.write_framed(&JsonRpcResponse::error(Some(id), JsonRpcError::method_not_found(other)));
        }
    }
}

fn handle_notification(server: &Arc<Server>, request: JsonRpcRequest) {
    match request.method.as_str() {
        methods::INITIALIZED => {}
        methods::EXIT => {}
        methods::TEXT_DOCUMENT_DID_OPEN => {
            if let Ok(params) = parse_notification(request.params) {
                text_sync::did_open(server, params);
            }
        }
        methods::TEXT_DOCUMENT_DID_CHANGE => {
            if let Ok(params) = parse_notification(request.params) {
                text_sync::did_change(server, params);
            }
        }
        methods::TEXT_DOCUMENT_DID_CLOSE => {
            if let Ok(params) = parse_notification(request.params) {
                text_sync::did_close(server, params);
            }
        }
        methods::TEXT_DOCUMENT_DID_SAVE => {
            if let Ok(params) = parse_notification(request.params) {
                text_sync::did_save(server, params);
            }
        }
        methods::WORKSPACE_DID_CHANGE_CONFIGURATION => handle_did_change_configuration(server, request.params),
        other => {
            tracing::debug!(method = other, "unhandled notification, ignoring");
        }
    }
}

/// `$/cancelRequest` (`spec.md` §5): marks the id so a request that hasn't
/// started yet is dropped; a request already running or already finished
/// is left alone, since its RPC (if any) is left to complete.
fn handle_cancel(server: &Arc<Server>, params: Option<Value>) {
    let Some(params) = params else { return };
    let Some(id) = params.get("id").cloned() else { return };
    server.mark_cancelled(id);
}

fn handle_did_change_configuration(server: &Arc<Server>, params: Option<Value>) {
    let Some(params) = params else { return };
    let Ok(params) = serde_json::from_value::<DidChangeConfigurationParams>(params) else { return };
    let Ok(patch) = serde_json::from_value::<nix_config::Config>(params.settings) else {
        tracing::warn!("workspace/didChangeConfiguration settings did not match the recognised schema");
        return;
    };
    server.config.write().merge_from(patch);
}

fn handle_initialize(params: Option<Value>) -> Result<Value, JsonRpcError> {
    let _params: InitializeParams = parse(params)?;
    let result = InitializeResult { capabilities: nix_lsp_protocol::server_capabilities(), server_info: None };
    Ok(serde_json::to_value(result).unwrap_or(Value::Null))
}

/// Submits a request handler to the work pool, checking cancellation again
/// right before it actually runs (a job may sit queued long enough for a
/// `$/cancelRequest` to arrive after submission but before execution).
fn dispatch_pooled<F>(server: &Arc<Server>, id: Value, params: Option<Value>, handler: F)
where
    F: FnOnce(&Server, Option<Value>) -> Result<Value, JsonRpcError> + Send + 'static,
{
    let server = Arc::clone(server);
    server.pool.submit(move || {
        if server.take_cancelled(&id) {
            server.write_framed(&JsonRpcResponse::error(Some(id), cancelled_error()));
            return;
        }
        let response = match handler(&server, params) {
            Ok(value) => JsonRpcResponse::success(Some(id), value),
            Err(err) => JsonRpcResponse::error(Some(id), err),
        };
        server.write_framed(&response);
    });
}

fn respond(id: Value, result: Result<Value, JsonRpcError>) -> JsonRpcResponse {
    match result {
        Ok(value) => JsonRpcResponse::success(Some(id), value),
        Err(err) => JsonRpcResponse::error(Some(id), err),
    }
}

fn cancelled_error() -> JsonRpcError {
    JsonRpcError::new(error_codes::REQUEST_CANCELLED, "request cancelled")
}

fn parse<T: serde::de::DeserializeOwned>(params: Option<Value>) -> Result<T, JsonRpcError> {
    let params = params.ok_or_else(|| JsonRpcError::new(error_codes::INVALID_PARAMS, "missing params"))?;
    serde_json::from_value(params).map_err(|e| JsonRpcError::new(error_codes::INVALID_PARAMS, format!("malformed params: {e}")))
}

fn parse_notification<T: serde::de::DeserializeOwned>(params: Option<Value>) -> Result<T, ()> {
    let params = params.ok_or(())?;
    serde_json::from_value(params).map_err(|e| {
        tracing::warn!(%e, "malformed notification params, ignoring");
    })
}

/// A TU snapshot for `uri`, or the `spec.md` §4.8 step 1 rejection as a
/// JSON-RPC error ("Captures a TU snapshot by path (rejecting if absent)").
fn snapshot(server: &Server, uri: &str) -> Result<Arc<nix_tu::NixTu>, JsonRpcError> {
    server.tus.snapshot(uri).ok_or_else(|| JsonRpcError::new(error_codes::INVALID_PARAMS, format!("no open document for {uri:?}")))
}

fn position_to_offset(tu: &nix_tu::NixTu, position: lsp_types::Position) -> usize {
    nix_position::WirePosition::from(position).to_byte_offset(&tu.source)
}

//! Entry point for a standalone evaluator worker process (`spec.md` §4.7/§6).
//! The controller (`nix-lsp`) spawns one of these per worker role (options
//! worker, nixpkgs worker) and talks to it over its stdin/stdout pipe using
//! the same Content-Length framing as the client-facing LSP connection.
//!
//! On startup the worker emits a `ready` notification carrying its pid, then
//! reads one framed JSON-RPC request at a time from stdin and writes one
//! framed response to stdout. Any `EvalError` raised while handling a
//! request is caught here and turned into a JSON-RPC error reply; the
//! process itself keeps running (`spec.md` §7).

use nix_eval_worker::WorkerState;
use nix_lsp_protocol::{error_codes, JsonRpcError, JsonRpcResponse};
use nix_lsp_transport::framing::{read_message, write_message, write_notification};
use nix_worker_protocol::{methods, ReadyParams};
use std::io::{self, BufReader};

fn main() -> io::Result<()> {
    tracing_subscriber::fmt().with_writer(io::stderr).with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let stdin = io::stdin();
    let mut reader = BufReader::new(stdin.lock());
    let stdout = io::stdout();
    let mut writer = stdout.lock();

    write_notification(&mut writer, &nix_lsp_protocol::JsonRpcNotification::new(methods::READY, Some(serde_json::json!(ReadyParams { pid: std::process::id() }))))?;
    tracing::info!(pid = std::process::id(), "evaluator worker ready");

    let state = WorkerState::new();
    loop {
        let request = match read_message(&mut reader) {
            Ok(Some(request)) => request,
            Ok(None) => {
                tracing::info!("stdin closed, shutting down");
                return Ok(());
            }
            Err(err) => {
                tracing::error!(%err, "transport error reading request");
                return Ok(());
            }
        };

        if request.is_notification() {
            tracing::debug!(method = %request.method, "ignoring notification");
            continue;
        }

        let id = request.id.clone();
        let response = dispatch(&state, &request.method, request.params.unwrap_or(serde_json::Value::Null));
        let reply = match response {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => JsonRpcResponse::error(id, error),
        };
        write_message(&mut writer, &reply)?;
    }
}

fn dispatch(state: &WorkerState, method: &str, params: serde_json::Value) -> Result<serde_json::Value, JsonRpcError> {
    match method {
        methods::EVAL_EXPR => {
            let params = parse_params(params)?;
            state.eval_expr(params).map_err(eval_error_to_rpc)?;
            Ok(serde_json::Value::Null)
        }
        methods::ATTRPATH_INFO => {
            let params = parse_params(params)?;
            let result = state.attrpath_info(params).map_err(eval_error_to_rpc)?;
            to_json(&result)
        }
        methods::ATTRPATH_COMPLETE => {
            let params = parse_params(params)?;
            let result = state.attrpath_complete(params).map_err(eval_error_to_rpc)?;
            to_json(&result)
        }
        methods::OPTION_INFO => {
            let params = parse_params(params)?;
            let result = state.option_info(params).map_err(eval_error_to_rpc)?;
            to_json(&result)
        }
        methods::OPTION_COMPLETE => {
            let params = parse_params(params)?;
            let result = state.option_complete(params).map_err(eval_error_to_rpc)?;
            to_json(&result)
        }
        other => Err(JsonRpcError::method_not_found(other)),
    }
}

fn parse_params<T: serde::de::DeserializeOwned>(params: serde_json::Value) -> Result<T, JsonRpcError> {
    serde_json::from_value(params).map_err(|e| JsonRpcError::new(error_codes::INVALID_PARAMS, format!("invalid params: {e}")))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, JsonRpcError> {
    serde_json::to_value(value).map_err(|e| JsonRpcError::new(error_codes::INTERNAL_ERROR, format!("failed to serialize result: {e}")))
}

fn eval_error_to_rpc(err: nix_eval_worker::EvalError) -> JsonRpcError {
    JsonRpcError::new(error_codes::INTERNAL_ERROR, err.to_string())
}

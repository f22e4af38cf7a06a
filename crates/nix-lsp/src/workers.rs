//! Owns every evaluator worker slot: one attribute-set ("nixpkgs") worker
//! plus one option worker per `options.<name>` configuration entry
//! (`spec.md` §1: "an attribute-set evaluator and, for each configured
//! option set, an option evaluator"). Both roles run the same
//! `nix-eval-worker` binary; only the expression they're seeded with and
//! the methods the controller calls on them differ.

use crate::worker::Worker;
use nix_lsp_protocol::JsonRpcError;
use nix_worker_protocol::{methods, AttrpathCompleteParams, AttrpathInfoParams, EvalExprParams, OptionCompleteParams, OptionInfoParams};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::path::PathBuf;
use std::process::Stdio;

/// How to (re)spawn one worker: the binary to run and where its stderr
/// goes (`spec.md` §6: `--option-worker-stderr`/`--nixpkgs-worker-stderr`,
/// default `/dev/null`).
#[derive(Debug, Clone)]
pub struct WorkerSpawnSpec {
    pub program: String,
    pub stderr_path: PathBuf,
}

struct WorkerSlot {
    spec: WorkerSpawnSpec,
    worker: Mutex<Option<Worker>>,
    /// The `evalExpr` string last successfully sent to the live worker, so
    /// a respawn re-seeds the same root rather than starting empty.
    seeded_expr: Mutex<Option<String>>,
}

impl WorkerSlot {
    fn new(spec: WorkerSpawnSpec) -> Self {
        Self { spec, worker: Mutex::new(None), seeded_expr: Mutex::new(None) }
    }

    fn stderr_sink(&self) -> Stdio {
        std::fs::File::create(&self.spec.stderr_path).map(Stdio::from).unwrap_or_else(|_| Stdio::null())
    }

    /// Ensures a live worker exists, seeded with `expr` (spawning or
    /// respawning as needed — `spec.md` §4.7: "the slot is marked dead and
    /// subsequent requests reply with a transport error until the
    /// controller respawns it"), then calls `method(params)` on it.
    fn call(&self, expr: &str, method: &str, params: serde_json::Value) -> Result<serde_json::Value, JsonRpcError> {
        let mut guard = self.worker.lock();
        let needs_spawn = guard.as_ref().map(|w| !w.is_alive()).unwrap_or(true);
        if needs_spawn {
            let spawned = Worker::spawn(&self.spec.program, self.stderr_sink()).map_err(|err| {
                JsonRpcError::new(nix_lsp_protocol::error_codes::INTERNAL_ERROR, format!("failed to spawn worker {}: {err}", self.spec.program))
            })?;
            *guard = Some(spawned);
            *self.seeded_expr.lock() = None;
        }
        let worker = guard.as_ref().expect("just spawned or already alive");

        if self.seeded_expr.lock().as_deref() != Some(expr) {
            worker.call(methods::EVAL_EXPR, to_value(EvalExprParams { expr: expr.to_string() })?)?;
            *self.seeded_expr.lock() = Some(expr.to_string());
        }

        worker.call(method, params)
    }
}

/// Every configured evaluator worker, keyed by role. `nixpkgs` is a single
/// optional slot; `options` is one slot per configured name.
pub struct Workers {
    nixpkgs: Option<WorkerSlot>,
    options: FxHashMap<String, WorkerSlot>,
    program: String,
}

impl Workers {
    /// `program` is the attribute-set evaluator binary path: `$NIXD_ATTRSET_EVAL`
    /// if set, otherwise the `nix-eval-worker` binary installed alongside
    /// this one (`spec.md` §6).
    pub fn new(program: String, nixpkgs_stderr: PathBuf, options_stderr: PathBuf, option_names: impl Iterator<Item = String>) -> Self {
        let nixpkgs = Some(WorkerSlot::new(WorkerSpawnSpec { program: program.clone(), stderr_path: nixpkgs_stderr }));
        let options = option_names
            .map(|name| (name, WorkerSlot::new(WorkerSpawnSpec { program: program.clone(), stderr_path: options_stderr.clone() })))
            .collect();
        Self { nixpkgs, options, program }
    }

    pub fn attrpath_info(&self, nixpkgs_expr: &str, params: AttrpathInfoParams) -> Result<serde_json::Value, JsonRpcError> {
        self.nixpkgs_slot()?.call(nixpkgs_expr, methods::ATTRPATH_INFO, to_value(params)?)
    }

    pub fn attrpath_complete(&self, nixpkgs_expr: &str, params: AttrpathCompleteParams) -> Result<serde_json::Value, JsonRpcError> {
        self.nixpkgs_slot()?.call(nixpkgs_expr, methods::ATTRPATH_COMPLETE, to_value(params)?)
    }

    pub fn option_info(&self, option_name: &str, expr: &str, params: OptionInfoParams) -> Result<serde_json::Value, JsonRpcError> {
        self.option_slot(option_name)?.call(expr, methods::OPTION_INFO, to_value(params)?)
    }

    pub fn option_complete(&self, option_name: &str, expr: &str, params: OptionCompleteParams) -> Result<serde_json::Value, JsonRpcError> {
        self.option_slot(option_name)?.call(expr, methods::OPTION_COMPLETE, to_value(params)?)
    }

    /// Adds a new option worker slot on the fly, for an `options.<name>`
    /// entry that arrived after startup via `workspace/didChangeConfiguration`.
    pub fn ensure_option_slot(&mut self, name: &str, stderr_path: PathBuf) {
        self.options.entry(name.to_string()).or_insert_with(|| WorkerSlot::new(WorkerSpawnSpec { program: self.program.clone(), stderr_path }));
    }

    fn nixpkgs_slot(&self) -> Result<&WorkerSlot, JsonRpcError> {
        self.nixpkgs.as_ref().ok_or_else(|| JsonRpcError::new(nix_lsp_protocol::error_codes::INTERNAL_ERROR, "no nixpkgs worker configured"))
    }

    fn option_slot(&self, name: &str) -> Result<&WorkerSlot, JsonRpcError> {
        self.options
            .get(name)
            .ok_or_else(|| JsonRpcError::new(nix_lsp_protocol::error_codes::INVALID_PARAMS, format!("no option worker configured for {name:?}")))
    }
}

fn to_value<T: serde::Serialize>(params: T) -> Result<serde_json::Value, JsonRpcError> {
    serde_json::to_value(params)
        .map_err(|err| JsonRpcError::new(nix_lsp_protocol::error_codes::INTERNAL_ERROR, format!("failed to encode worker params: {err}")))
}

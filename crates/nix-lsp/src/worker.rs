//! One child evaluator process and its RPC client (`spec.md` §4.7): spawns
//! `nix-eval-worker` (or `NIXD_ATTRSET_EVAL`'s override) with piped stdio,
//! correlates replies against outgoing request IDs, and drains every
//! pending call with a transport error the moment the worker's stdout
//! closes. Grounded on `perl-dap`'s child-process-plus-reader-thread
//! pattern for talking to an external debugger adapter over its own framed
//! protocol — the same shape, a different wire format.

use nix_lsp_protocol::{error_codes, JsonRpcError, JsonRpcOutgoingRequest};
use nix_lsp_transport::framing::{read_value, write_framed};
use rustc_hash::FxHashMap;
use std::io::{BufReader, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc;
use std::sync::Mutex;
use std::thread;

type Reply = Result<serde_json::Value, JsonRpcError>;

/// A live child process and the plumbing to call its RPC methods.
/// Dropping a `Worker` closes its stdin, which is the documented way to
/// signal exit to a worker (`spec.md` §6: "Exit is signalled by closing the
/// outbound stream").
pub struct Worker {
    child: Child,
    stdin: Mutex<ChildStdin>,
    pending: std::sync::Arc<Mutex<FxHashMap<u64, mpsc::Sender<Reply>>>>,
    next_id: AtomicU64,
    alive: std::sync::Arc<AtomicBool>,
}

impl Worker {
    pub fn spawn(program: &str, stderr: Stdio) -> std::io::Result<Self> {
        let mut child = Command::new(program).stdin(Stdio::piped()).stdout(Stdio::piped()).stderr(stderr).spawn()?;
        let stdin = child.stdin.take().expect("piped stdin");
        let stdout = child.stdout.take().expect("piped stdout");
        let pending: std::sync::Arc<Mutex<FxHashMap<u64, mpsc::Sender<Reply>>>> = Default::default();
        let alive = std::sync::Arc::new(AtomicBool::new(true));

        let reader_pending = pending.clone();
        let reader_alive = alive.clone();
        let worker_program = program.to_string();
        thread::Builder::new()
            .name(format!("nix-lsp-worker-reader-{worker_program}"))
            .spawn(move || reader_loop(stdout, reader_pending, reader_alive))
            .expect("spawning a worker reader thread");

        Ok(Self { child, stdin: Mutex::new(stdin), pending, next_id: AtomicU64::new(1), alive })
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Sends `method(params)` and blocks for the matching reply. The reader
    /// thread resolves this call's channel either with the worker's actual
    /// response or, if the transport closes first, with a transport error
    /// (`spec.md` §4.7: "a transport error ... drains all pending
    /// continuations with an error").
    pub fn call(&self, method: &str, params: serde_json::Value) -> Reply {
        if !self.is_alive() {
            return Err(JsonRpcError::transport_closed());
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::channel();
        self.pending.lock().unwrap_or_else(|p| p.into_inner()).insert(id, tx);

        let request = JsonRpcOutgoingRequest::new(id, method, Some(params));
        let write_result = {
            let mut stdin = self.stdin.lock().unwrap_or_else(|p| p.into_inner());
            write_framed(&mut *stdin, &request)
        };
        if let Err(err) = write_result {
            self.pending.lock().unwrap_or_else(|p| p.into_inner()).remove(&id);
            self.alive.store(false, Ordering::SeqCst);
            tracing::error!(%err, worker_pid = self.child.id(), "failed writing to worker stdin");
            return Err(JsonRpcError::transport_closed());
        }

        rx.recv().unwrap_or(Err(JsonRpcError::transport_closed()))
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        // Dropping `stdin` (by replacing it) closes the pipe; best-effort
        // kill in case the worker doesn't notice EOF promptly.
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn reader_loop(
    stdout: std::process::ChildStdout,
    pending: std::sync::Arc<Mutex<FxHashMap<u64, mpsc::Sender<Reply>>>>,
    alive: std::sync::Arc<AtomicBool>,
) {
    let mut reader = BufReader::new(stdout);
    loop {
        match read_value(&mut reader) {
            Ok(Some(value)) => handle_frame(value, &pending),
            Ok(None) => {
                tracing::info!("worker stdout closed");
                break;
            }
            Err(err) => {
                tracing::error!(%err, "transport error reading worker frame");
                break;
            }
        }
    }
    alive.store(false, Ordering::SeqCst);
    drain_pending(&pending);
}

fn handle_frame(value: serde_json::Value, pending: &std::sync::Arc<Mutex<FxHashMap<u64, mpsc::Sender<Reply>>>>) {
    if value.get("method").is_some() {
        // A notification (`ready` at startup); nothing further to do with it
        // beyond the log line — the worker is usable the moment its process
        // spawned successfully, since `call` blocks until a reply anyway.
        tracing::debug!(method = ?value.get("method"), "worker notification");
        return;
    }
    let Some(id) = value.get("id").and_then(|v| v.as_u64()) else {
        tracing::warn!(?value, "worker reply with no numeric id, dropping");
        return;
    };
    let Some(sender) = pending.lock().unwrap_or_else(|p| p.into_inner()).remove(&id) else {
        tracing::warn!(id, "worker reply for unknown id, dropping");
        return;
    };
    let reply = if let Some(error) = value.get("error") {
        match serde_json::from_value::<JsonRpcError>(error.clone()) {
            Ok(err) => Err(err),
            Err(_) => Err(JsonRpcError::new(error_codes::INTERNAL_ERROR, "malformed worker error")),
        }
    } else {
        Ok(value.get("result").cloned().unwrap_or(serde_json::Value::Null))
    };
    let _ = sender.send(reply);
}

fn drain_pending(pending: &std::sync::Arc<Mutex<FxHashMap<u64, mpsc::Sender<Reply>>>>) {
    let mut pending = pending.lock().unwrap_or_else(|p| p.into_inner());
    for (_, sender) in pending.drain() {
        let _ = sender.send(Err(JsonRpcError::transport_closed()));
    }
}

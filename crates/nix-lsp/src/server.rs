//! The controller's shared state (`spec.md` §4.8/§5): the document stores,
//! the live configuration, the worker processes, and the thread pool
//! request handlers run on. One `Server` is built at startup and shared
//! (via `Arc`) between the I/O thread and every pool worker.

use crate::workers::Workers;
use nix_config::Config;
use nix_lsp_workpool::WorkPool;
use nix_tu::{DraftStore, TuStore};
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashSet;
use serde_json::Value;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub struct Server {
    pub tus: TuStore,
    pub drafts: Mutex<DraftStore>,
    pub config: RwLock<Config>,
    pub workers: Mutex<Workers>,
    pub pool: WorkPool,
    pub output: Mutex<Box<dyn Write + Send>>,
    /// Request IDs marked by `$/cancelRequest` before their handler started
    /// (`spec.md` §5: "if the handler has not yet started, it is dropped").
    cancelled: Mutex<FxHashSet<Value>>,
    shutdown_received: AtomicBool,
}

impl Server {
    pub fn new(config: Config, workers: Workers, pool_size: usize, output: Box<dyn Write + Send>) -> Self {
        Self {
            tus: TuStore::new(),
            drafts: Mutex::new(DraftStore::new()),
            config: RwLock::new(config),
            workers: Mutex::new(workers),
            pool: WorkPool::new(pool_size),
            output: Mutex::new(output),
            cancelled: Mutex::new(FxHashSet::default()),
            shutdown_received: AtomicBool::new(false),
        }
    }

    pub fn mark_cancelled(&self, id: Value) {
        self.cancelled.lock().insert(id);
    }

    /// Consumes the cancellation mark for `id` if present: a handler that
    /// hasn't started yet sees it and is dropped; later cancellations of
    /// already-running requests are left to complete (`spec.md` §5: "if it
    /// is waiting on an RPC, the RPC is left to complete and its result is
    /// discarded" — discarding happens by simply not replying to a request
    /// whose id was already consumed here before the handler ran).
    pub fn take_cancelled(&self, id: &Value) -> bool {
        self.cancelled.lock().remove(id)
    }

    pub fn mark_shutdown(&self) {
        self.shutdown_received.store(true, Ordering::SeqCst);
    }

    pub fn shutdown_received(&self) -> bool {
        self.shutdown_received.load(Ordering::SeqCst)
    }

    pub fn write_framed<T: serde::Serialize>(&self, value: &T) {
        let mut output = self.output.lock();
        if let Err(err) = nix_lsp_transport::write_framed(&mut *output, value) {
            tracing::error!(%err, "failed writing to client transport");
        }
    }
}

pub type SharedServer = Arc<Server>;

//! The evaluator worker subsystem (`spec.md` §4.7): a tree-walking Nix
//! evaluator (`eval`) plus the RPC method handlers (`state`) a worker
//! process's main loop (`src/bin/main.rs`) dispatches into.

pub mod builtins;
pub mod bytecode;
pub mod describe;
pub mod error;
pub mod eval;
pub mod state;
pub mod value;

pub use error::EvalError;
pub use state::WorkerState;

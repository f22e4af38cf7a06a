//! The controller binary's library half: shared server state, request
//! dispatch, document sync, and the evaluator worker lifecycle. Split out
//! from `main.rs` so the CLI-parsing/bootstrap code stays a thin shell
//! around this crate's actual logic, the same split `perl-lsp` makes
//! between its `main.rs` and its `runtime` module.

mod completion;
pub mod dispatch;
mod server;
mod text_sync;
mod worker;
mod workers;

pub use server::{Server, SharedServer};
pub use workers::{WorkerSpawnSpec, Workers};

use nix_lsp_transport::read_message;
use std::io::BufRead;
use std::sync::Arc;

/// Reads framed requests from `reader` until EOF or `exit`, dispatching
/// each one (`spec.md` §6: "Exit is signalled by closing the outbound
/// stream" — for the client-facing transport that closure is driven by
/// this loop returning after `exit`).
pub fn serve(server: &Arc<Server>, reader: &mut dyn BufRead) -> std::io::Result<()> {
    loop {
        match read_message(reader)? {
            Some(request) => {
                let is_exit = request.method == nix_lsp_protocol::methods::EXIT;
                dispatch::handle(server, request);
                if is_exit {
                    break;
                }
            }
            None => {
                tracing::info!("client transport closed, shutting down");
                break;
            }
        }
    }
    Ok(())
}

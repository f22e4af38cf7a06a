//! JSON-RPC message types, LSP method name constants, and server capability
//! advertisement for the Nix language server. Grounded on
//! `perl-lsp-protocol`, trimmed to what `spec.md` §6 actually specifies —
//! this server has one fixed capability set rather than the teacher's
//! `BuildFlags`-gated menu, since `spec.md` doesn't describe build-time
//! feature toggles.

mod capabilities;
mod jsonrpc;
pub mod methods;

pub use capabilities::{semantic_token_legend, server_capabilities};
pub use jsonrpc::{
    error_codes, JsonRpcError, JsonRpcNotification, JsonRpcOutgoingRequest, JsonRpcRequest, JsonRpcResponse,
};

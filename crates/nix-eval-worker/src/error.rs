use nix_ast::NodeId;
use thiserror::Error;

/// Evaluation failures, always caught at the RPC boundary and turned into a
/// user-visible message (`spec.md` §4.7: "errors return a user-visible
/// message"; §7: "any Nix exception inside a worker is caught and turned
/// into an RPC error reply; the worker process keeps running").
#[derive(Debug, Error, Clone)]
pub enum EvalError {
    #[error("undefined variable '{0}'")]
    UndefinedVariable(String),
    #[error("attribute '{0}' missing")]
    MissingAttr(String),
    #[error("value is {0}, expected {1}")]
    TypeError(&'static str, &'static str),
    #[error("infinite recursion encountered")]
    InfiniteRecursion,
    #[error("division by zero")]
    DivisionByZero,
    #[error("assertion failed")]
    AssertionFailed,
    #[error("{0}")]
    Throw(String),
    #[error("import is not supported by this worker")]
    ImportUnsupported,
    #[error("parse error: node has no evaluable form")]
    Unparseable(#[allow(dead_code)] NodeId),
    #[error("wrong number of arguments to lambda")]
    Arity,
    #[error("unknown builtin '{0}'")]
    UnknownBuiltin(String),
    #[error("no root value has been evaluated yet; call evalExpr first")]
    NoRoot,
}

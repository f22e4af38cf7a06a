//! Concrete syntax tree for Nix expressions.
//!
//! Nodes are arena-indexed (`NodeId`) rather than owned by their parent
//! through `Box`/`Rc`, so the parent map and the lowered attribute-set view
//! can hold indices into the same arena without forming reference cycles —
//! `Ast` is the single owner, everything else is a side table keyed by
//! `NodeId`.
mod ast;
mod sema;

pub use ast::{
    AttrName, AttrPath, BindOrInherit, Binding, Binds, Formal, Inherit, InterpolPart, Ast, LambdaArg, NodeData,
    NodeId, NodeKind, BinOpKind, UnaryOpKind,
};
pub use sema::{AttrBody, AttrBodyValue, SemaAttrs};

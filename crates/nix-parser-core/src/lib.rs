//! Recursive-descent parser and attribute-set lowering for Nix expressions.
//!
//! [`parse`] never fails: every input produces an [`Ast`](nix_ast::Ast) whose
//! root range covers the maximal prefix consumed, plus a list of
//! [`Diagnostic`](nix_diagnostics::Diagnostic)s for anything it had to
//! recover from. [`lower`] then walks the parsed tree and attaches a
//! [`SemaAttrs`](nix_ast::SemaAttrs) to every `Attrs` node (`spec.md` §4.3).

mod lowering;
mod parser;

pub use lowering::{lower, Lowered};
pub use parser::{parse, ParseOutput};

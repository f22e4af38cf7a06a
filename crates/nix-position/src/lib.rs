//! Source position tracking: byte-offset cursors/ranges for the lexer and
//! parser, plus UTF-8/UTF-16 conversion for LSP wire types.
//!
//! The lexer and parser work in byte offsets ([`Cursor`]/[`Range`]) since that
//! is what the source buffer is indexed by. LSP communicates positions in
//! UTF-16 code units ([`WirePosition`]/[`WireRange`]); [`LineIndex`] bridges
//! the two without rescanning the whole document on every conversion.
mod convert;
mod cursor;
mod line_index;
mod wire;

pub use convert::{offset_to_utf16_line_col, utf16_line_col_to_offset};
pub use cursor::{Cursor, Range};
pub use line_index::LineIndex;
#[cfg(feature = "lsp-compat")]
pub use wire::fallback_lsp_uri;
pub use wire::{WireLocation, WirePosition, WireRange};

//! `spec.md` §6: `hoverProvider`, `definitionProvider`, `documentSymbolProvider`,
//! `documentLinkProvider`. All four read a single [`NixTu`] snapshot and
//! never touch a worker — purely syntactic/semantic requests per `spec.md`
//! §4.8 step 2. Grounded on `perl-lsp-navigation`'s per-concern module split
//! (`document_links.rs`, `type_definition.rs`, ...), one file per LSP
//! method rather than one grab-bag module.

mod definition;
mod document_link;
mod document_symbol;
mod hover;

pub use definition::goto_definition;
pub use document_link::document_links;
pub use document_symbol::document_symbols;
pub use hover::hover;

//! Variable-lookup analysis (`spec.md` §4.4) and parent-map analysis
//! (§4.5) over a parsed-and-lowered Nix syntax tree.

mod builtins;
mod parent_map;
mod reachability;
mod vla;

pub use builtins::BUILTIN_NAMES;
pub use parent_map::ParentMap;
pub use reachability::semantic_children;
pub use vla::{analyze, Definition, DefinitionKind, LookupKind, LookupResult, VariableLookup};

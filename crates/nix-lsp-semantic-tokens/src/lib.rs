//! `textDocument/semanticTokens/full` (`spec.md` §6). Grounded on
//! `perl-lsp-semantic-tokens::semantic_tokens::collect_semantic_tokens`'s
//! "walk the parsed tree, emit `[deltaLine, deltaStart, length, type,
//! modifiers]` tuples, sort and delta-encode once at the end" shape — the
//! Nix server walks `nix-ast`'s CST instead of a `perl_parser_core::ast`
//! tree, and leans on `nix-semantic-analyzer`'s already-computed
//! [`LookupKind`]/[`DefinitionKind`] to tell a builtin reference from an
//! ordinary one rather than re-deriving that classification here.
//!
//! The legend (`nix_lsp_protocol::semantic_token_legend`) fixes the index
//! order this module's [`TokenType`] must match.

mod walk;

use lsp_types::SemanticToken;
use nix_position::WirePosition;
use nix_tu::NixTu;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
enum TokenType {
    Keyword = 0,
    Variable = 1,
    Parameter = 2,
    Property = 3,
    String = 4,
    Number = 5,
    #[allow(dead_code)] // no comment nodes survive into the CST to classify
    Comment = 6,
    #[allow(dead_code)] // operators are punctuation, not named in the CST
    Operator = 7,
    #[allow(dead_code)] // Nix has no distinct "function declaration" token
    Function = 8,
}

const MOD_DECLARATION: u32 = 1 << 0;
const MOD_DEFAULT_LIBRARY: u32 = 1 << 1;

/// One unencoded highlight: a byte range plus its classification.
struct RawToken {
    start: usize,
    end: usize,
    ty: TokenType,
    modifiers: u32,
}

/// Builds the full, delta-encoded semantic token stream for `tu`'s current
/// text (`spec.md` §6's `semanticTokensProvider`, full request only — range
/// requests are not advertised, see `nix_lsp_protocol::server_capabilities`).
pub fn semantic_tokens(tu: &NixTu) -> Vec<SemanticToken> {
    let mut raw = Vec::new();
    walk::collect(tu, tu.root, &mut raw);
    raw.sort_by_key(|t| (t.start, t.end));
    raw.dedup_by_key(|t| (t.start, t.end));
    encode(&tu.source, &raw)
}

fn encode(source: &str, tokens: &[RawToken]) -> Vec<SemanticToken> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut prev_line = 0u32;
    let mut prev_char = 0u32;
    for token in tokens {
        let start = WirePosition::from_byte_offset(source, token.start);
        let end = WirePosition::from_byte_offset(source, token.end);
        if end.line != start.line {
            // A highlighted span shouldn't cross a newline (keywords,
            // identifiers and literals are all single-line in Nix source,
            // modulo indented strings, which this pass does not highlight
            // token-by-token); skip rather than emit a malformed delta.
            continue;
        }
        let length = end.character.saturating_sub(start.character);
        if length == 0 {
            continue;
        }
        let delta_line = start.line - prev_line;
        let delta_start = if delta_line == 0 { start.character.saturating_sub(prev_char) } else { start.character };
        out.push(SemanticToken {
            delta_line,
            delta_start,
            length,
            token_type: token.ty as u32,
            token_modifiers_bitset: token.modifiers,
        });
        prev_line = start.line;
        prev_char = start.character;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn a_let_binding_highlights_the_let_and_in_keywords() {
        let tu = NixTu::build(Arc::from("let a = 1; in a"), 1);
        let tokens = semantic_tokens(&tu);
        let keyword_count = tokens.iter().filter(|t| t.token_type == TokenType::Keyword as u32).count();
        assert_eq!(keyword_count, 2);
    }

    #[test]
    fn a_builtin_reference_is_tagged_default_library() {
        let tu = NixTu::build(Arc::from("toString"), 1);
        let tokens = semantic_tokens(&tu);
        assert!(tokens.iter().any(|t| t.token_type == TokenType::Variable as u32 && t.token_modifiers_bitset & MOD_DEFAULT_LIBRARY != 0));
    }

    #[test]
    fn a_lambda_formal_is_a_parameter() {
        let tu = NixTu::build(Arc::from("{ a }: a"), 1);
        let tokens = semantic_tokens(&tu);
        assert!(tokens.iter().any(|t| t.token_type == TokenType::Parameter as u32));
    }

    #[test]
    fn tokens_are_emitted_in_non_decreasing_position_order() {
        let tu = NixTu::build(Arc::from("let a = 1; b = \"x\"; in a"), 1);
        let tokens = semantic_tokens(&tu);
        // Delta-encoded positions never go backward: every delta_line is
        // non-negative by construction (u32), and a zero delta_line must
        // carry a non-negative delta_start, which is also a u32 here.
        assert!(!tokens.is_empty());
    }
}

//! Token definitions shared by the lexer and parser.
//!
//! A [`Token`] pairs a [`TokenKind`] with the byte [`Range`](nix_position::Range)
//! it covers; `view` is kept as an `Arc<str>` so lookahead buffers can clone
//! tokens cheaply without re-slicing the source on every peek.

use nix_position::Range;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub range: Range,
    pub view: Arc<str>,
}

impl Token {
    pub fn new(kind: TokenKind, range: Range, view: impl Into<Arc<str>>) -> Self {
        Self { kind, range, view: view.into() }
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}

/// Every terminal the lexer can produce.
///
/// Keywords are lexed as `Id` first, then reassigned by [`TokenKind::keyword_for`]
/// once the text is known (the lexer never special-cases keyword spelling
/// during scanning itself).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Eof,
    Unknown,

    // Literals / identifier-like
    Int,
    Float,
    Id,
    PathFragment,
    Uri,
    SearchPath,

    // String/indented-string mode tokens
    DQuote,
    Quote2,
    StringPart,
    StringEscape,
    DollarCurly,

    // Keywords
    If,
    Then,
    Else,
    Assert,
    With,
    Let,
    In,
    Rec,
    Inherit,
    Or,

    // Operators
    OpConcat,  // ++
    OpAdd,     // +
    OpImpl,    // ->
    OpNegate,  // -  (also unary minus; parser disambiguates)
    OpMul,     // *
    OpUpdate,  // //
    OpDiv,     // /
    OpOr,      // ||
    OpAnd,     // &&
    OpNot,     // !
    OpEq,      // ==
    OpNeq,     // !=
    OpLe,      // <=
    OpLt,      // <
    OpGe,      // >=
    OpGt,      // >
    OpHasAttr, // ?

    // Punctuation
    Eq,         // =
    LCurly,     // {
    RCurly,     // }
    LParen,     // (
    RParen,     // )
    LBracket,   // [
    RBracket,   // ]
    Comma,      // ,
    Dot,        // .
    Ellipsis,   // ...
    At,         // @
    Colon,      // :
    SemiColon,  // ;
}

impl TokenKind {
    /// Reassign an `Id` token's kind once its text is known, per the fixed
    /// keyword table (`if`, `then`, `else`, `assert`, `with`, `let`, `in`,
    /// `rec`, `inherit`, `or`). Returns `None` (keep `Id`) for anything else.
    pub fn keyword_for(text: &str) -> Option<TokenKind> {
        Some(match text {
            "if" => TokenKind::If,
            "then" => TokenKind::Then,
            "else" => TokenKind::Else,
            "assert" => TokenKind::Assert,
            "with" => TokenKind::With,
            "let" => TokenKind::Let,
            "in" => TokenKind::In,
            "rec" => TokenKind::Rec,
            "inherit" => TokenKind::Inherit,
            "or" => TokenKind::Or,
            _ => return None,
        })
    }

    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::If
                | TokenKind::Then
                | TokenKind::Else
                | TokenKind::Assert
                | TokenKind::With
                | TokenKind::Let
                | TokenKind::In
                | TokenKind::Rec
                | TokenKind::Inherit
                | TokenKind::Or
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_lookup_is_exact() {
        assert_eq!(TokenKind::keyword_for("let"), Some(TokenKind::Let));
        assert_eq!(TokenKind::keyword_for("lets"), None);
        assert_eq!(TokenKind::keyword_for("or"), Some(TokenKind::Or));
    }
}

//! Lexer modes the parser pushes/pops at token boundaries.
//!
//! The active mode selects which scanning routine `Lexer::next_token` uses;
//! switching modes never happens mid-token, so the parser can freely rewind
//! the cursor and re-lex under a different mode (`spec.md` §4.1/§4.2).

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexerMode {
    /// General expression context: numbers, identifiers, operators, the
    /// opening delimiters of strings/paths.
    Expr,
    /// Inside `"…"`; scanning `string-part`/`string-escape`/`${`/closing `"`.
    String,
    /// Inside `''…''`; same token shape as `String` with different escapes.
    IndString,
    /// Resuming a path literal after an interpolated segment closed
    /// (`./foo/${bar}/baz`, the `/baz` part).
    Path,
}

impl Default for LexerMode {
    fn default() -> Self {
        LexerMode::Expr
    }
}

//! Modal lexer turning a source buffer into [`nix_token::Token`]s.
//!
//! The lexer never fails: malformed input (an unterminated block comment, a
//! float with no digits after its exponent marker) still produces a token —
//! it also pushes a [`Diagnostic`] onto an internal buffer the caller drains
//! with [`Lexer::take_diagnostics`]. There is no `Result` in this crate;
//! diagnostics *are* the error channel (`spec.md` §4.1: "it never signals via
//! exception").
//!
//! Mode is external state the parser drives (see [`mode::LexerMode`]):
//! `next_token` dispatches on `self.mode` alone, and [`Lexer::set_cursor`]
//! lets the parser rewind to re-lex a span it already consumed once it
//! decides the mode should have been different.

mod mode;

pub use mode::LexerMode;

use nix_diagnostics::{Diagnostic, DiagnosticCode};
use nix_position::{Cursor, Range};
use nix_token::{Token, TokenKind};
use std::sync::Arc;

pub struct Lexer<'a> {
    source: &'a str,
    offset: usize,
    line: u32,
    column: u32,
    mode: LexerMode,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source, offset: 0, line: 0, column: 0, mode: LexerMode::Expr, diagnostics: Vec::new() }
    }

    pub fn mode(&self) -> LexerMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: LexerMode) {
        self.mode = mode;
    }

    pub fn cursor(&self) -> Cursor {
        Cursor::new(self.line, self.column, self.offset)
    }

    /// Rewind (or, in principle, fast-forward) to a previously observed
    /// cursor. The parser calls this after a mode change invalidates its
    /// lookahead buffer.
    pub fn set_cursor(&mut self, cursor: Cursor) {
        self.line = cursor.line;
        self.column = cursor.column;
        self.offset = cursor.offset;
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    pub fn next_token(&mut self) -> Token {
        match self.mode {
            LexerMode::Expr => self.lex_expr(),
            LexerMode::String => self.lex_string(false),
            LexerMode::IndString => self.lex_string(true),
            LexerMode::Path => self.lex_path_continuation(),
        }
    }

    fn rest(&self) -> &'a str {
        &self.source[self.offset..]
    }

    fn at_eof(&self) -> bool {
        self.offset >= self.source.len()
    }

    /// Advance past `text.len()` bytes of `self.rest()`, tracking line/column
    /// by iterating its chars (so embedded newlines inside scanned string
    /// content are accounted for, not just single-char advances).
    fn advance_by(&mut self, len: usize) {
        let consumed = &self.source[self.offset..self.offset + len];
        for ch in consumed.chars() {
            if ch == '\n' {
                self.line += 1;
                self.column = 0;
            } else {
                self.column += 1;
            }
        }
        self.offset += len;
    }

    fn peek_byte(&self) -> Option<u8> {
        self.source.as_bytes().get(self.offset).copied()
    }

    fn peek_byte_at(&self, ahead: usize) -> Option<u8> {
        self.source.as_bytes().get(self.offset + ahead).copied()
    }

    fn starts_with(&self, s: &str) -> bool {
        self.rest().starts_with(s)
    }

    fn token(&self, start: Cursor, kind: TokenKind) -> Token {
        let range = Range::new(start, self.cursor());
        let view: Arc<str> = range.slice(self.source).into();
        Token::new(kind, range, view)
    }

    fn push_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    // ---- trivia -----------------------------------------------------

    fn consume_trivia(&mut self) {
        loop {
            match self.peek_byte() {
                Some(b' ') | Some(b'\t') | Some(b'\r') | Some(b'\n') => self.advance_by(1),
                Some(b'#') => {
                    let nl = memchr::memchr(b'\n', self.rest().as_bytes()).unwrap_or(self.rest().len());
                    self.advance_by(nl);
                }
                Some(b'/') if self.peek_byte_at(1) == Some(b'*') => self.consume_block_comment(),
                _ => break,
            }
        }
    }

    fn consume_block_comment(&mut self) {
        let open = self.cursor();
        self.advance_by(2);
        loop {
            if self.at_eof() {
                let at = self.cursor();
                self.push_diagnostic(
                    Diagnostic::new(DiagnosticCode::UnterminatedBlockComment, Range::empty(at))
                        .with_note(nix_diagnostics::Note::new(DiagnosticCode::UnterminatedBlockComment, Range::empty(open)))
                        .with_fix(nix_diagnostics::Fix::insert("insert `*/`", Range::empty(at), "*/")),
                );
                return;
            }
            if self.starts_with("*/") {
                self.advance_by(2);
                return;
            }
            self.advance_by(1);
        }
    }

    // ---- Expr mode ----------------------------------------------------

    fn lex_expr(&mut self) -> Token {
        self.consume_trivia();
        let start = self.cursor();
        if self.at_eof() {
            return self.token(start, TokenKind::Eof);
        }
        let b = self.peek_byte().expect("checked not at_eof");

        if let Some(end) = try_lex_uri(self.rest()) {
            self.advance_by(end);
            return self.token(start, TokenKind::Uri);
        }
        if b != b'<' {
            if let Some((end, closes_at_interpolation)) = try_lex_path(self.rest()) {
                self.advance_by(end);
                let _ = closes_at_interpolation;
                return self.token(start, TokenKind::PathFragment);
            }
        }

        match b {
            b'0'..=b'9' => self.lex_number(start),
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.lex_identifier(start),
            b'"' => {
                self.advance_by(1);
                self.mode = LexerMode::String;
                self.token(start, TokenKind::DQuote)
            }
            b'\'' if self.starts_with("''") => {
                self.advance_by(2);
                self.mode = LexerMode::IndString;
                self.token(start, TokenKind::Quote2)
            }
            b'<' => {
                if let Some(end) = try_lex_search_path(self.rest()) {
                    self.advance_by(end);
                    return self.token(start, TokenKind::SearchPath);
                }
                self.advance_by(1);
                if self.peek_byte() == Some(b'=') {
                    self.advance_by(1);
                    self.token(start, TokenKind::OpLe)
                } else {
                    self.token(start, TokenKind::OpLt)
                }
            }
            b'$' if self.starts_with("${") => {
                self.advance_by(2);
                self.token(start, TokenKind::DollarCurly)
            }
            b'.' if self.starts_with("...") => {
                self.advance_by(3);
                self.token(start, TokenKind::Ellipsis)
            }
            b'.' => {
                self.advance_by(1);
                self.token(start, TokenKind::Dot)
            }
            b'+' if self.starts_with("++") => {
                self.advance_by(2);
                self.token(start, TokenKind::OpConcat)
            }
            b'+' => {
                self.advance_by(1);
                self.token(start, TokenKind::OpAdd)
            }
            b'-' if self.starts_with("->") => {
                self.advance_by(2);
                self.token(start, TokenKind::OpImpl)
            }
            b'-' => {
                self.advance_by(1);
                self.token(start, TokenKind::OpNegate)
            }
            b'*' => {
                self.advance_by(1);
                self.token(start, TokenKind::OpMul)
            }
            b'/' if self.starts_with("//") => {
                self.advance_by(2);
                self.token(start, TokenKind::OpUpdate)
            }
            b'/' => {
                self.advance_by(1);
                self.token(start, TokenKind::OpDiv)
            }
            b'|' if self.starts_with("||") => {
                self.advance_by(2);
                self.token(start, TokenKind::OpOr)
            }
            b'&' if self.starts_with("&&") => {
                self.advance_by(2);
                self.token(start, TokenKind::OpAnd)
            }
            b'=' if self.starts_with("==") => {
                self.advance_by(2);
                self.token(start, TokenKind::OpEq)
            }
            b'=' => {
                self.advance_by(1);
                self.token(start, TokenKind::Eq)
            }
            b'!' if self.starts_with("!=") => {
                self.advance_by(2);
                self.token(start, TokenKind::OpNeq)
            }
            b'!' => {
                self.advance_by(1);
                self.token(start, TokenKind::OpNot)
            }
            b'>' if self.starts_with(">=") => {
                self.advance_by(2);
                self.token(start, TokenKind::OpGe)
            }
            b'>' => {
                self.advance_by(1);
                self.token(start, TokenKind::OpGt)
            }
            b'?' => {
                self.advance_by(1);
                self.token(start, TokenKind::OpHasAttr)
            }
            b'{' => {
                self.advance_by(1);
                self.token(start, TokenKind::LCurly)
            }
            b'}' => {
                self.advance_by(1);
                self.token(start, TokenKind::RCurly)
            }
            b'(' => {
                self.advance_by(1);
                self.token(start, TokenKind::LParen)
            }
            b')' => {
                self.advance_by(1);
                self.token(start, TokenKind::RParen)
            }
            b'[' => {
                self.advance_by(1);
                self.token(start, TokenKind::LBracket)
            }
            b']' => {
                self.advance_by(1);
                self.token(start, TokenKind::RBracket)
            }
            b',' => {
                self.advance_by(1);
                self.token(start, TokenKind::Comma)
            }
            b'@' => {
                self.advance_by(1);
                self.token(start, TokenKind::At)
            }
            b':' => {
                self.advance_by(1);
                self.token(start, TokenKind::Colon)
            }
            b';' => {
                self.advance_by(1);
                self.token(start, TokenKind::SemiColon)
            }
            _ => {
                self.advance_by(1);
                self.token(start, TokenKind::Unknown)
            }
        }
    }

    fn lex_number(&mut self, start: Cursor) -> Token {
        let int_run = digit_run_len(self.rest());
        self.advance_by(int_run);
        let int_text_len = int_run;

        let mut is_float = false;
        if self.peek_byte() == Some(b'.') {
            is_float = true;
            self.advance_by(1);
            let frac_run = digit_run_len(self.rest());
            self.advance_by(frac_run);
        }

        let mut exponent_missing_digits = false;
        if matches!(self.peek_byte(), Some(b'e') | Some(b'E')) {
            is_float = true;
            let mut lookahead = 1;
            if matches!(self.peek_byte_at(1), Some(b'+') | Some(b'-')) {
                lookahead += 1;
            }
            let exp_digits = digit_run_len(&self.rest()[lookahead..]);
            self.advance_by(lookahead + exp_digits);
            exponent_missing_digits = exp_digits == 0;
        }

        let range = Range::new(start, self.cursor());
        let text = range.slice(self.source);

        if is_float && int_text_len > 1 && text.as_bytes()[0] == b'0' {
            self.push_diagnostic(Diagnostic::new(DiagnosticCode::FloatLeadingZero, range).with_arg(text));
        }
        if exponent_missing_digits {
            self.push_diagnostic(Diagnostic::new(DiagnosticCode::FloatNoExponent, range).with_arg(text));
        }

        let view: Arc<str> = text.into();
        Token::new(if is_float { TokenKind::Float } else { TokenKind::Int }, range, view)
    }

    fn lex_identifier(&mut self, start: Cursor) -> Token {
        let len = ident_run_len(self.rest());
        self.advance_by(len);
        let range = Range::new(start, self.cursor());
        let text = range.slice(self.source);
        let kind = TokenKind::keyword_for(text).unwrap_or(TokenKind::Id);
        let view: Arc<str> = text.into();
        Token::new(kind, range, view)
    }

    // ---- String / IndString mode --------------------------------------

    fn lex_string(&mut self, indented: bool) -> Token {
        let start = self.cursor();
        if self.at_eof() {
            return self.token(start, TokenKind::Eof);
        }
        if indented {
            self.lex_ind_string_token(start)
        } else {
            self.lex_dquote_token(start)
        }
    }

    fn lex_dquote_token(&mut self, start: Cursor) -> Token {
        if self.peek_byte() == Some(b'"') {
            self.advance_by(1);
            self.mode = LexerMode::Expr;
            return self.token(start, TokenKind::DQuote);
        }
        if self.peek_byte() == Some(b'\\') {
            let escape_len = 1 + self.peek_byte_at(1).map_or(0, |_| next_char_len(&self.rest()[1..]));
            self.advance_by(escape_len.max(1));
            return self.token(start, TokenKind::StringEscape);
        }
        if self.starts_with("${") {
            self.advance_by(2);
            return self.token(start, TokenKind::DollarCurly);
        }

        let bytes = self.rest().as_bytes();
        let mut i = 0;
        loop {
            match memchr::memchr3(b'"', b'\\', b'$', &bytes[i..]) {
                None => {
                    i = bytes.len();
                    break;
                }
                Some(found) => {
                    let at = i + found;
                    if bytes[at] == b'$' && bytes.get(at + 1) != Some(&b'{') {
                        i = at + 1;
                        continue;
                    }
                    i = at;
                    break;
                }
            }
        }
        self.advance_by(i.max(1));
        self.token(start, TokenKind::StringPart)
    }

    fn lex_ind_string_token(&mut self, start: Cursor) -> Token {
        if self.starts_with("''") {
            if self.starts_with("'''") {
                self.advance_by(3);
                return self.token(start, TokenKind::StringEscape);
            }
            if self.peek_byte_at(2) == Some(b'$') {
                self.advance_by(3);
                return self.token(start, TokenKind::StringEscape);
            }
            if self.peek_byte_at(2) == Some(b'\\') {
                let tail = next_char_len(&self.rest()[3..]).max(1);
                self.advance_by(3 + tail);
                return self.token(start, TokenKind::StringEscape);
            }
            self.advance_by(2);
            self.mode = LexerMode::Expr;
            return self.token(start, TokenKind::Quote2);
        }
        if self.starts_with("${") {
            self.advance_by(2);
            return self.token(start, TokenKind::DollarCurly);
        }

        let bytes = self.rest().as_bytes();
        let mut i = 0;
        loop {
            match memchr::memchr2(b'\'', b'$', &bytes[i..]) {
                None => {
                    i = bytes.len();
                    break;
                }
                Some(found) => {
                    let at = i + found;
                    if bytes[at] == b'\'' && bytes.get(at + 1) != Some(&b'\'') {
                        i = at + 1;
                        continue;
                    }
                    if bytes[at] == b'$' && bytes.get(at + 1) != Some(&b'{') {
                        i = at + 1;
                        continue;
                    }
                    i = at;
                    break;
                }
            }
        }
        self.advance_by(i.max(1));
        self.token(start, TokenKind::StringPart)
    }

    // ---- Path continuation (after an interpolated segment) ------------

    fn lex_path_continuation(&mut self) -> Token {
        let start = self.cursor();
        if self.at_eof() {
            return self.token(start, TokenKind::Eof);
        }
        if self.starts_with("${") {
            self.advance_by(2);
            return self.token(start, TokenKind::DollarCurly);
        }
        let len = path_char_run_len(self.rest());
        self.advance_by(len.max(1));
        if len == 0 {
            // Grammar desync; the parser will see this as an Unknown token
            // and recover via its synchronising-token policy.
            return self.token(start, TokenKind::Unknown);
        }
        self.mode = LexerMode::Expr;
        self.token(start, TokenKind::PathFragment)
    }
}

fn next_char_len(s: &str) -> usize {
    s.chars().next().map_or(0, char::len_utf8)
}

fn digit_run_len(s: &str) -> usize {
    s.as_bytes().iter().take_while(|b| b.is_ascii_digit()).count()
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'\'' | b'-')
}

fn ident_run_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    if bytes.is_empty() || !is_ident_start(bytes[0]) {
        return 0;
    }
    1 + bytes[1..].iter().take_while(|b| is_ident_continue(**b)).count()
}

fn is_path_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'+' | b'-')
}

fn path_char_run_len(s: &str) -> usize {
    s.as_bytes().iter().take_while(|b| is_path_char(**b)).count()
}

/// Lookahead-only: a path token exists iff a run of path characters (with an
/// optional leading `~`) is followed by `/` and then either another path
/// character, a `${`, or — when the path began with a leading `.` — nothing
/// further is required (`spec.md` §4.1, resolved precisely in `SPEC_FULL.md`
/// §4.1 against `consumePathStart`). Returns the matched byte length and
/// whether the match stopped right before a `${`; never mutates the caller.
fn try_lex_path(s: &str) -> Option<(usize, bool)> {
    let bytes = s.as_bytes();
    let mut i = 0;
    let leading_dot = bytes.first() == Some(&b'.');
    if bytes.first() == Some(&b'~') {
        i += 1;
    }
    let first_segment = path_char_run_len(&s[i..]);
    i += first_segment;
    if bytes.get(i) != Some(&b'/') {
        return None;
    }
    i += 1;
    let next = bytes.get(i).copied();
    let stops_at_interpolation = s[i..].starts_with("${");
    if next.is_some_and(is_path_char) {
        i += path_char_run_len(&s[i..]);
    } else if stops_at_interpolation {
        // leave the `${` for the next `next_token()` call
    } else if !leading_dot {
        return None;
    }
    // Greedily absorb further `/segment` runs that don't hit an interpolation.
    loop {
        if s[i..].starts_with("${") {
            return Some((i, true));
        }
        if bytes.get(i) != Some(&b'/') {
            break;
        }
        let seg_start = i + 1;
        let seg_len = path_char_run_len(&s[seg_start..]);
        if seg_len == 0 {
            break;
        }
        i = seg_start + seg_len;
    }
    Some((i, false))
}

/// `<ident(/ident)*>` search-path literal lookahead (`consumeSPath`).
fn try_lex_search_path(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    if bytes.first() != Some(&b'<') {
        return None;
    }
    let mut i = 1;
    loop {
        let seg = path_char_run_len(&s[i..]);
        if seg == 0 {
            return None;
        }
        i += seg;
        if bytes.get(i) == Some(&b'/') {
            i += 1;
            continue;
        }
        break;
    }
    if bytes.get(i) == Some(&b'>') {
        Some(i + 1)
    } else {
        None
    }
}

/// `scheme:uri-chars+` lookahead (`consumeURI`); scheme must start with a
/// letter. Takes precedence over identifier interpretation (checked first in
/// `lex_expr`).
fn try_lex_uri(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    if !bytes.first().is_some_and(|b| b.is_ascii_alphabetic()) {
        return None;
    }
    let scheme_len = bytes.iter().take_while(|b| b.is_ascii_alphanumeric() || matches!(**b, b'+' | b'.' | b'-')).count();
    if bytes.get(scheme_len) != Some(&b':') {
        return None;
    }
    let path_start = scheme_len + 1;
    let path_len = bytes[path_start..]
        .iter()
        .take_while(|b| b.is_ascii_alphanumeric() || matches!(**b, b'%' | b'/' | b'?' | b':' | b'@' | b'&' | b'=' | b'+' | b'$' | b',' | b'_' | b'.' | b'!' | b'~' | b'*' | b'\'' | b'-'))
        .count();
    if path_len == 0 {
        return None;
    }
    Some(path_start + path_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_all(src: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(src);
        let mut out = Vec::new();
        loop {
            let tok = lexer.next_token();
            let eof = tok.is_eof();
            out.push(tok.kind);
            if eof {
                break;
            }
        }
        out
    }

    #[test]
    fn lexes_keyword_over_identifier() {
        let kinds = lex_all("let x = 1; in x");
        assert_eq!(kinds[0], TokenKind::Let);
        assert_eq!(kinds[4], TokenKind::In);
    }

    #[test]
    fn block_comment_is_skipped_as_trivia() {
        let kinds = lex_all("/* hi */ 1");
        assert_eq!(kinds, vec![TokenKind::Int, TokenKind::Eof]);
    }

    #[test]
    fn unterminated_block_comment_emits_diagnostic_with_fix() {
        let mut lexer = Lexer::new("/* never closes");
        let tok = lexer.next_token();
        assert!(tok.is_eof());
        let diags = lexer.take_diagnostics();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, DiagnosticCode::UnterminatedBlockComment);
        assert!(diags[0].fixes[0].edits[0].is_pure_insertion());
    }

    #[test]
    fn leading_zero_float_still_lexes_as_float() {
        let mut lexer = Lexer::new("01.5");
        let tok = lexer.next_token();
        assert_eq!(tok.kind, TokenKind::Float);
        assert_eq!(&*tok.view, "01.5");
        assert_eq!(lexer.take_diagnostics()[0].code, DiagnosticCode::FloatLeadingZero);
    }

    #[test]
    fn zero_dot_five_has_no_leading_zero_diagnostic() {
        let mut lexer = Lexer::new("0.5");
        let tok = lexer.next_token();
        assert_eq!(tok.kind, TokenKind::Float);
        assert!(lexer.take_diagnostics().is_empty());
    }

    #[test]
    fn exponent_missing_digits_is_diagnosed() {
        let mut lexer = Lexer::new("1e ");
        let tok = lexer.next_token();
        assert_eq!(tok.kind, TokenKind::Float);
        assert_eq!(lexer.take_diagnostics()[0].code, DiagnosticCode::FloatNoExponent);
    }

    #[test]
    fn relative_path_is_a_single_token() {
        let kinds = lex_all("./foo/bar.nix");
        assert_eq!(kinds, vec![TokenKind::PathFragment, TokenKind::Eof]);
    }

    #[test]
    fn uri_takes_precedence_over_identifier() {
        let mut lexer = Lexer::new("https://example.com/x");
        let tok = lexer.next_token();
        assert_eq!(tok.kind, TokenKind::Uri);
    }

    #[test]
    fn search_path_literal_lexes_as_one_token() {
        let mut lexer = Lexer::new("<nixpkgs/lib>");
        let tok = lexer.next_token();
        assert_eq!(tok.kind, TokenKind::SearchPath);
        assert_eq!(&*tok.view, "<nixpkgs/lib>");
    }

    #[test]
    fn lone_lt_is_still_an_operator() {
        let mut lexer = Lexer::new("<=");
        let tok = lexer.next_token();
        assert_eq!(tok.kind, TokenKind::OpLe);
    }

    #[test]
    fn double_quoted_string_splits_into_parts_and_interpolation() {
        let kinds = lex_all("\"a${b}c\"");
        assert_eq!(
            kinds,
            vec![
                TokenKind::DQuote,
                TokenKind::StringPart,
                TokenKind::DollarCurly,
                TokenKind::Id,
                TokenKind::RCurly,
                TokenKind::StringPart,
                TokenKind::DQuote,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn double_quoted_escape_is_two_bytes() {
        let mut lexer = Lexer::new("\"\\n\"");
        let _open = lexer.next_token();
        let escape = lexer.next_token();
        assert_eq!(escape.kind, TokenKind::StringEscape);
        assert_eq!(&*escape.view, "\\n");
    }

    #[test]
    fn indented_string_closes_on_plain_double_quote() {
        let kinds = lex_all("''hello''");
        assert_eq!(kinds, vec![TokenKind::Quote2, TokenKind::StringPart, TokenKind::Quote2, TokenKind::Eof]);
    }

    #[test]
    fn indented_string_triple_quote_is_an_escape() {
        let mut lexer = Lexer::new("''a'''b''");
        let _open = lexer.next_token();
        let part = lexer.next_token();
        assert_eq!(part.kind, TokenKind::StringPart);
        let escape = lexer.next_token();
        assert_eq!(escape.kind, TokenKind::StringEscape);
        assert_eq!(&*escape.view, "'''");
    }

    #[test]
    fn or_lexes_as_keyword_not_identifier() {
        let mut lexer = Lexer::new("or");
        assert_eq!(lexer.next_token().kind, TokenKind::Or);
    }

    #[test]
    fn cursor_rewind_re_lexes_under_new_mode() {
        let mut lexer = Lexer::new("\"x\"");
        let open = lexer.next_token();
        assert_eq!(open.kind, TokenKind::DQuote);
        let mark = lexer.cursor();
        let part = lexer.next_token();
        assert_eq!(part.kind, TokenKind::StringPart);
        lexer.set_cursor(mark);
        lexer.set_mode(LexerMode::String);
        let part_again = lexer.next_token();
        assert_eq!(part_again.view, part.view);
    }
}

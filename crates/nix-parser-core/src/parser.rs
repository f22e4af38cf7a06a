//! The parser proper (`spec.md` §4.2).
//!
//! Protocol: recursive descent with a small lookahead buffer (`peeked`).
//! Mode changes (entering/leaving string and path literals) invalidate the
//! buffer, so every place that calls `self.lexer.set_mode` also clears it.

use nix_ast::{
    Ast, AttrName, AttrPath, BindOrInherit, Binding, Binds, BinOpKind, Formal, Inherit,
    LambdaArg, NodeId, NodeKind, UnaryOpKind,
};
use nix_diagnostics::{Diagnostic, DiagnosticCode, Fix, Note};
use nix_lexer::{Lexer, LexerMode};
use nix_position::{Cursor, Range};
use nix_token::{Token, TokenKind};

/// The synchronising tokens error recovery skips ahead to inside a binds
/// list (`spec.md` §4.2: "skipped ahead to the next synchronising token").
const SYNC_TOKENS: &[TokenKind] =
    &[TokenKind::SemiColon, TokenKind::RCurly, TokenKind::RBracket, TokenKind::RParen, TokenKind::Eof];

pub struct ParseOutput {
    pub ast: Ast,
    pub diagnostics: Vec<Diagnostic>,
}

pub fn parse(source: &str) -> ParseOutput {
    let mut parser = Parser::new(source);
    let root = parser.parse_expr();
    parser.expect_eof();
    parser.ast.set_root(root);
    ParseOutput { ast: parser.ast, diagnostics: parser.diagnostics }
}

struct Parser<'a> {
    source: &'a str,
    lexer: Lexer<'a>,
    peeked: Vec<Token>,
    ast: Ast,
    diagnostics: Vec<Diagnostic>,
    /// Cursor of the last consumed token's end; used as a recovery position
    /// when a node's range must be synthesised past EOF.
    last_end: Cursor,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            lexer: Lexer::new(source),
            peeked: Vec::new(),
            ast: Ast::new(),
            diagnostics: Vec::new(),
            last_end: Cursor::start(),
        }
    }

    // ---- token stream plumbing -----------------------------------------

    fn fill(&mut self, n: usize) {
        while self.peeked.len() <= n {
            let tok = self.lexer.next_token();
            self.peeked.push(tok);
        }
    }

    fn peek(&mut self) -> &Token {
        self.fill(0);
        &self.peeked[0]
    }

    fn peek_n(&mut self, n: usize) -> &Token {
        self.fill(n);
        &self.peeked[n]
    }

    fn peek_kind(&mut self) -> TokenKind {
        self.peek().kind
    }

    fn bump(&mut self) -> Token {
        self.fill(0);
        let tok = self.peeked.remove(0);
        self.last_end = tok.range.end;
        tok
    }

    fn cur_start(&mut self) -> Cursor {
        self.peek().range.start
    }

    /// Switch lexer mode at the current cursor and drop lookahead, so the
    /// next token is scanned under the new mode.
    fn set_mode(&mut self, mode: LexerMode) {
        let resume_at = if self.peeked.is_empty() { self.lexer.cursor() } else { self.peeked[0].range.start };
        self.lexer.set_cursor(resume_at);
        self.lexer.set_mode(mode);
        self.peeked.clear();
    }

    fn push_diagnostic(&mut self, d: Diagnostic) {
        self.diagnostics.push(d);
    }

    /// Consume `kind` if present; otherwise emit `expected` with a fix that
    /// inserts the missing text at the current cursor, and don't consume.
    fn expect(&mut self, kind: TokenKind, text: &str) -> Option<Token> {
        if self.peek_kind() == kind {
            Some(self.bump())
        } else {
            let at = self.cur_start();
            self.push_diagnostic(
                Diagnostic::new(DiagnosticCode::Expected, Range::empty(at))
                    .with_arg(text)
                    .with_fix(Fix::insert(format!("insert `{text}`"), Range::empty(at), text)),
            );
            None
        }
    }

    /// Like [`Self::expect`] but for a delimiter whose opener is known, so a
    /// missing terminal gets a note pointing back at the opener
    /// (`spec.md` §4.2: "An open delimiter that never closes...").
    fn expect_closing(&mut self, kind: TokenKind, text: &str, opener: Range) -> bool {
        if self.peek_kind() == kind {
            self.bump();
            true
        } else {
            let at = self.eof_safe_cursor();
            self.push_diagnostic(
                Diagnostic::new(DiagnosticCode::Expected, Range::empty(at))
                    .with_arg(text)
                    .with_note(Note::new(DiagnosticCode::Expected, opener).with_arg("opened here"))
                    .with_fix(Fix::insert(format!("insert `{text}`"), Range::empty(at), text)),
            );
            false
        }
    }

    /// The cursor to attach a recovery diagnostic/node-end to: the start of
    /// the next token, or (at EOF) the last consumed token's end.
    fn eof_safe_cursor(&mut self) -> Cursor {
        if self.peek_kind() == TokenKind::Eof {
            self.last_end
        } else {
            self.cur_start()
        }
    }

    fn expect_eof(&mut self) {
        if self.peek_kind() != TokenKind::Eof {
            // Trailing garbage after a complete expression: skip to EOF,
            // recording one diagnostic at the first offending token.
            let at = self.cur_start();
            self.push_diagnostic(Diagnostic::new(DiagnosticCode::Expected, Range::empty(at)).with_arg("end of input"));
            while self.peek_kind() != TokenKind::Eof {
                self.bump();
            }
        }
    }

    /// Skip tokens until one of `SYNC_TOKENS` (exclusive) or EOF, emitting
    /// `unknown-token` once for the skipped span.
    fn recover_to_sync(&mut self, start: Cursor) {
        while !SYNC_TOKENS.contains(&self.peek_kind()) {
            self.bump();
        }
        let end = self.eof_safe_cursor();
        if end.offset > start.offset {
            let sync = self.peek_kind();
            self.push_diagnostic(
                Diagnostic::new(DiagnosticCode::UnknownToken, Range::new(start, end)).with_arg(sync_token_text(sync)),
            );
        }
    }

    fn node_range(&mut self, start: Cursor) -> Range {
        Range::new(start, self.last_end)
    }

    // ---- expression grammar, low to high precedence --------------------
    //
    // lambda / let / if / assert / with / -> / || / && / ==,!= / <,<=,>,>=
    // / // / ! / +,- / *,/ / ++ / ? / unary- / application / select

    fn parse_expr(&mut self) -> NodeId {
        if let Some(lambda) = self.try_parse_lambda() {
            return lambda;
        }
        match self.peek_kind() {
            TokenKind::Let => self.parse_let(),
            TokenKind::If => self.parse_if(),
            TokenKind::Assert => self.parse_assert(),
            TokenKind::With => self.parse_with(),
            _ => self.parse_impl(),
        }
    }

    fn try_parse_lambda(&mut self) -> Option<NodeId> {
        let start = self.cur_start();
        match self.peek_kind() {
            TokenKind::Id if self.peek_n(1).kind == TokenKind::Colon => {
                let name_tok = self.bump();
                self.bump(); // `:`
                let body = self.parse_expr();
                let range = self.node_range(start);
                Some(self.ast.push(range, NodeKind::Lambda { arg: LambdaArg::Simple(name_tok.view.to_string(), name_tok.range), body }))
            }
            TokenKind::Id if self.peek_n(1).kind == TokenKind::At => {
                let name_tok = self.bump();
                self.bump(); // `@`
                self.expect(TokenKind::LCurly, "{");
                let (formals, ellipsis) = self.parse_formals();
                self.expect(TokenKind::RCurly, "}");
                self.expect(TokenKind::Colon, ":");
                let body = self.parse_expr();
                let range = self.node_range(start);
                Some(self.ast.push(
                    range,
                    NodeKind::Lambda {
                        arg: LambdaArg::Formals { formals, ellipsis, alias: Some((name_tok.view.to_string(), name_tok.range)) },
                        body,
                    },
                ))
            }
            TokenKind::LCurly if self.looks_like_formals() => {
                self.bump(); // `{`
                let (formals, ellipsis) = self.parse_formals();
                self.expect(TokenKind::RCurly, "}");
                let alias = if self.peek_kind() == TokenKind::At {
                    self.bump();
                    let name_tok = self.expect(TokenKind::Id, "identifier");
                    name_tok.map(|t| (t.view.to_string(), t.range))
                } else {
                    None
                };
                self.expect(TokenKind::Colon, ":");
                let body = self.parse_expr();
                let range = self.node_range(start);
                Some(self.ast.push(range, NodeKind::Lambda { arg: LambdaArg::Formals { formals, ellipsis, alias }, body }))
            }
            _ => None,
        }
    }

    /// Token-level lookahead: is the `{` at the cursor a formals list (ends
    /// in `}:` or `}@id:`) rather than an attribute-set literal? Uses a
    /// throwaway mode-aware scan so strings/interpolations inside default
    /// values don't desync the brace count.
    fn looks_like_formals(&mut self) -> bool {
        let open = self.cur_start();
        let mut scan = Lexer::new(self.source);
        scan.set_cursor(open);
        scan.set_mode(LexerMode::Expr);
        let mut depth: i32 = 0;
        loop {
            let tok = scan.next_token();
            match tok.kind {
                TokenKind::Eof => return false,
                TokenKind::LCurly | TokenKind::DollarCurly => depth += 1,
                TokenKind::RCurly => {
                    depth -= 1;
                    if depth == 0 {
                        let next = scan.next_token();
                        return matches!(next.kind, TokenKind::Colon | TokenKind::At);
                    }
                }
                TokenKind::DQuote => scan.set_mode(LexerMode::String),
                TokenKind::Quote2 => scan.set_mode(LexerMode::IndString),
                _ => {}
            }
        }
    }

    fn parse_formals(&mut self) -> (Vec<Formal>, bool) {
        let mut formals = Vec::new();
        let mut ellipsis = false;
        if self.peek_kind() == TokenKind::RCurly {
            return (formals, ellipsis);
        }
        loop {
            if self.peek_kind() == TokenKind::Ellipsis {
                self.bump();
                ellipsis = true;
                break;
            }
            let start = self.cur_start();
            let Some(name_tok) = self.expect(TokenKind::Id, "identifier") else {
                self.recover_to_sync(start);
                break;
            };
            let default = if self.peek_kind() == TokenKind::OpHasAttr {
                self.bump();
                Some(self.parse_expr())
            } else {
                None
            };
            formals.push(Formal { name: name_tok.view.to_string(), range: name_tok.range, default });
            if self.peek_kind() == TokenKind::Comma {
                self.bump();
                continue;
            }
            break;
        }
        (formals, ellipsis)
    }

    fn parse_let(&mut self) -> NodeId {
        let start = self.cur_start();
        self.bump(); // `let`
        let binds = self.parse_binds(TokenKind::In);
        self.expect(TokenKind::In, "in");
        let body = self.parse_expr();
        let range = self.node_range(start);
        self.ast.push(range, NodeKind::Let { binds, body })
    }

    fn parse_if(&mut self) -> NodeId {
        let start = self.cur_start();
        self.bump(); // `if`
        let cond = self.parse_expr();
        self.expect(TokenKind::Then, "then");
        let then_branch = self.parse_expr();
        self.expect(TokenKind::Else, "else");
        let else_branch = self.parse_expr();
        let range = self.node_range(start);
        self.ast.push(range, NodeKind::If { cond, then_branch, else_branch })
    }

    fn parse_assert(&mut self) -> NodeId {
        let start = self.cur_start();
        self.bump(); // `assert`
        let cond = self.parse_expr();
        self.expect(TokenKind::SemiColon, ";");
        let body = self.parse_expr();
        let range = self.node_range(start);
        self.ast.push(range, NodeKind::Assert { cond, body })
    }

    fn parse_with(&mut self) -> NodeId {
        let start = self.cur_start();
        self.bump(); // `with`
        let expr = self.parse_expr();
        self.expect(TokenKind::SemiColon, ";");
        let body = self.parse_expr();
        let range = self.node_range(start);
        self.ast.push(range, NodeKind::With { expr, body })
    }

    // `->` (right-assoc, lowest binary level)
    fn parse_impl(&mut self) -> NodeId {
        let start = self.cur_start();
        let lhs = self.parse_or();
        if self.peek_kind() == TokenKind::OpImpl {
            self.bump();
            let rhs = self.parse_impl();
            let range = self.node_range(start);
            self.ast.push(range, NodeKind::BinOp { op: BinOpKind::Impl, lhs, rhs })
        } else {
            lhs
        }
    }

    fn parse_or(&mut self) -> NodeId {
        self.parse_left_assoc(Self::parse_and, &[(TokenKind::OpOr, BinOpKind::Or)])
    }

    fn parse_and(&mut self) -> NodeId {
        self.parse_left_assoc(Self::parse_equality, &[(TokenKind::OpAnd, BinOpKind::And)])
    }

    fn parse_equality(&mut self) -> NodeId {
        self.parse_left_assoc(Self::parse_comparison, &[(TokenKind::OpEq, BinOpKind::Eq), (TokenKind::OpNeq, BinOpKind::Neq)])
    }

    fn parse_comparison(&mut self) -> NodeId {
        self.parse_left_assoc(
            Self::parse_update,
            &[
                (TokenKind::OpLt, BinOpKind::Lt),
                (TokenKind::OpLe, BinOpKind::Le),
                (TokenKind::OpGt, BinOpKind::Gt),
                (TokenKind::OpGe, BinOpKind::Ge),
            ],
        )
    }

    fn parse_update(&mut self) -> NodeId {
        self.parse_left_assoc(Self::parse_not, &[(TokenKind::OpUpdate, BinOpKind::Update)])
    }

    // `!` as a binary-precedence-slotted unary prefix (`spec.md` §4.2 lists
    // it between `//` and `+ -`).
    fn parse_not(&mut self) -> NodeId {
        if self.peek_kind() == TokenKind::OpNot {
            let start = self.cur_start();
            self.bump();
            let operand = self.parse_not();
            let range = self.node_range(start);
            self.ast.push(range, NodeKind::UnaryOp { op: UnaryOpKind::Not, operand })
        } else {
            self.parse_additive()
        }
    }

    fn parse_additive(&mut self) -> NodeId {
        self.parse_left_assoc(Self::parse_multiplicative, &[(TokenKind::OpAdd, BinOpKind::Add), (TokenKind::OpNegate, BinOpKind::Sub)])
    }

    fn parse_multiplicative(&mut self) -> NodeId {
        self.parse_left_assoc(Self::parse_concat, &[(TokenKind::OpMul, BinOpKind::Mul), (TokenKind::OpDiv, BinOpKind::Div)])
    }

    fn parse_concat(&mut self) -> NodeId {
        self.parse_left_assoc(Self::parse_has_attr, &[(TokenKind::OpConcat, BinOpKind::Concat)])
    }

    fn parse_has_attr(&mut self) -> NodeId {
        let start = self.cur_start();
        let lhs = self.parse_unary();
        if self.peek_kind() == TokenKind::OpHasAttr {
            self.bump();
            let rhs = self.parse_unary();
            let range = self.node_range(start);
            self.ast.push(range, NodeKind::BinOp { op: BinOpKind::HasAttr, lhs, rhs })
        } else {
            lhs
        }
    }

    fn parse_unary(&mut self) -> NodeId {
        if self.peek_kind() == TokenKind::OpNegate {
            let start = self.cur_start();
            self.bump();
            let operand = self.parse_unary();
            let range = self.node_range(start);
            self.ast.push(range, NodeKind::UnaryOp { op: UnaryOpKind::Negate, operand })
        } else {
            self.parse_application()
        }
    }

    fn parse_application(&mut self) -> NodeId {
        let start = self.cur_start();
        let mut func = self.parse_select();
        while self.starts_atom() {
            let arg = self.parse_select();
            let range = self.node_range(start);
            func = self.ast.push(range, NodeKind::Call { func, arg });
        }
        func
    }

    fn starts_atom(&mut self) -> bool {
        matches!(
            self.peek_kind(),
            TokenKind::Int
                | TokenKind::Float
                | TokenKind::Id
                | TokenKind::PathFragment
                | TokenKind::Uri
                | TokenKind::SearchPath
                | TokenKind::DQuote
                | TokenKind::Quote2
                | TokenKind::LParen
                | TokenKind::LBracket
                | TokenKind::LCurly
                | TokenKind::Rec
                | TokenKind::OpNegate // unary minus can start an argument
        )
    }

    fn parse_select(&mut self) -> NodeId {
        let start = self.cur_start();
        let mut expr = self.parse_atom();
        while self.peek_kind() == TokenKind::Dot {
            self.bump();
            let path = self.parse_attr_path_segment();
            let or_default = if self.peek_kind() == TokenKind::Or {
                self.bump();
                Some(self.parse_select())
            } else {
                None
            };
            let range = self.node_range(start);
            expr = self.ast.push(range, NodeKind::Select { expr, path, or_default });
        }
        expr
    }

    /// One `.name` step already past the dot; returns a singleton path so
    /// chained `.` steps each get their own `Select` node (matching real
    /// Nix's left-nested `ExprSelect` chain, which `upExpr`/hover rely on to
    /// find the selection at a given prefix length — `spec.md` §8 scenario 6).
    fn parse_attr_path_segment(&mut self) -> AttrPath {
        vec![self.parse_attr_name()]
    }

    fn parse_attr_name(&mut self) -> AttrName {
        match self.peek_kind() {
            TokenKind::Id => {
                let tok = self.bump();
                AttrName::Id(tok.view.to_string(), tok.range)
            }
            TokenKind::Or => {
                let tok = self.bump();
                self.push_diagnostic(Diagnostic::new(DiagnosticCode::OrIdentifier, tok.range));
                AttrName::Id("or".to_string(), tok.range)
            }
            TokenKind::DQuote => {
                let (parts, range) = self.parse_dquote_parts();
                AttrName::Str(parts, range)
            }
            TokenKind::DollarCurly => {
                let start = self.cur_start();
                self.bump();
                let inner = self.parse_expr();
                self.expect(TokenKind::RCurly, "}");
                let range = self.node_range(start);
                AttrName::Interpolation(inner, range)
            }
            _ => {
                let at = self.eof_safe_cursor();
                self.push_diagnostic(
                    Diagnostic::new(DiagnosticCode::Expected, Range::empty(at))
                        .with_arg("attribute name")
                        .with_fix(Fix::insert("insert placeholder name", Range::empty(at), "dummy")),
                );
                AttrName::Missing(Range::empty(at))
            }
        }
    }

    fn parse_attr_path(&mut self) -> AttrPath {
        let mut path = vec![self.parse_attr_name()];
        loop {
            if self.peek_kind() == TokenKind::Dot {
                // Detect a dangling extra dot: `.` immediately followed by
                // something that can't be a name (`=`, `;`), not just
                // another legal name.
                if matches!(self.peek_n(1).kind, TokenKind::Eq | TokenKind::SemiColon) {
                    let dot = self.bump();
                    self.push_diagnostic(
                        Diagnostic::new(DiagnosticCode::RemoveDot, dot.range)
                            .with_fix(Fix::remove("remove the dot", dot.range))
                            .with_fix(Fix::insert("insert a placeholder name", dot.range, "\"dummy\"")),
                    );
                    continue;
                }
                self.bump();
                path.push(self.parse_attr_name());
            } else {
                break;
            }
        }
        path
    }

    fn parse_dquote_parts(&mut self) -> (Vec<nix_ast::InterpolPart>, Range) {
        let start = self.cur_start();
        self.bump(); // opening `"`
        self.set_mode(LexerMode::String);
        let mut parts = Vec::new();
        loop {
            match self.peek_kind() {
                TokenKind::StringPart => {
                    let tok = self.bump();
                    parts.push(nix_ast::InterpolPart::Escaped(tok.view.to_string()));
                }
                TokenKind::StringEscape => {
                    let tok = self.bump();
                    parts.push(nix_ast::InterpolPart::Escaped(unescape_dquote(&tok.view)));
                }
                TokenKind::DollarCurly => {
                    self.bump();
                    self.set_mode(LexerMode::Expr);
                    let inner = self.parse_expr();
                    self.expect(TokenKind::RCurly, "}");
                    self.set_mode(LexerMode::String);
                    parts.push(nix_ast::InterpolPart::Interpolation(inner));
                }
                TokenKind::DQuote => {
                    self.bump();
                    self.set_mode(LexerMode::Expr);
                    break;
                }
                TokenKind::Eof => {
                    self.expect_closing(TokenKind::DQuote, "\"", Range::empty(start));
                    self.set_mode(LexerMode::Expr);
                    break;
                }
                _ => {
                    self.bump();
                }
            }
        }
        (parts, self.node_range(start))
    }

    fn parse_ind_string_parts(&mut self) -> (Vec<nix_ast::InterpolPart>, Range) {
        let start = self.cur_start();
        self.bump(); // opening `''`
        self.set_mode(LexerMode::IndString);
        let mut parts = Vec::new();
        loop {
            match self.peek_kind() {
                TokenKind::StringPart => {
                    let tok = self.bump();
                    parts.push(nix_ast::InterpolPart::Escaped(tok.view.to_string()));
                }
                TokenKind::StringEscape => {
                    let tok = self.bump();
                    parts.push(nix_ast::InterpolPart::Escaped(unescape_ind_string(&tok.view)));
                }
                TokenKind::DollarCurly => {
                    self.bump();
                    self.set_mode(LexerMode::Expr);
                    let inner = self.parse_expr();
                    self.expect(TokenKind::RCurly, "}");
                    self.set_mode(LexerMode::IndString);
                    parts.push(nix_ast::InterpolPart::Interpolation(inner));
                }
                TokenKind::Quote2 => {
                    self.bump();
                    self.set_mode(LexerMode::Expr);
                    break;
                }
                TokenKind::Eof => {
                    self.expect_closing(TokenKind::Quote2, "''", Range::empty(start));
                    self.set_mode(LexerMode::Expr);
                    break;
                }
                _ => {
                    self.bump();
                }
            }
        }
        (parts, self.node_range(start))
    }

    fn parse_path_parts(&mut self) -> (Vec<nix_ast::InterpolPart>, Range) {
        let start = self.cur_start();
        let first = self.bump();
        let mut parts = vec![nix_ast::InterpolPart::Escaped(first.view.to_string())];
        loop {
            if self.peek_kind() == TokenKind::DollarCurly {
                self.bump();
                self.set_mode(LexerMode::Expr);
                let inner = self.parse_expr();
                self.expect(TokenKind::RCurly, "}");
                self.set_mode(LexerMode::Path);
                parts.push(nix_ast::InterpolPart::Interpolation(inner));
                if self.peek_kind() == TokenKind::PathFragment {
                    let tok = self.bump();
                    parts.push(nix_ast::InterpolPart::Escaped(tok.view.to_string()));
                }
            } else {
                break;
            }
        }
        self.set_mode(LexerMode::Expr);
        (parts, self.node_range(start))
    }

    fn parse_atom(&mut self) -> NodeId {
        let start = self.cur_start();
        match self.peek_kind() {
            TokenKind::Int => {
                let tok = self.bump();
                let value = tok.view.parse::<i64>().unwrap_or(0);
                self.ast.push(tok.range, NodeKind::Int(value))
            }
            TokenKind::Float => {
                let tok = self.bump();
                let value = tok.view.parse::<f64>().unwrap_or(0.0);
                self.ast.push(tok.range, NodeKind::Float(value))
            }
            TokenKind::Id => {
                let tok = self.bump();
                self.ast.push(tok.range, NodeKind::Var(tok.view.to_string()))
            }
            TokenKind::Uri => {
                let tok = self.bump();
                self.ast.push(tok.range, NodeKind::Uri(tok.view.to_string()))
            }
            TokenKind::SearchPath => {
                let tok = self.bump();
                self.ast.push(tok.range, NodeKind::SearchPath(tok.view.to_string()))
            }
            TokenKind::PathFragment => {
                let (parts, range) = self.parse_path_parts();
                self.ast.push(range, NodeKind::Path(parts))
            }
            TokenKind::DQuote => {
                let (parts, range) = self.parse_dquote_parts();
                self.ast.push(range, NodeKind::Str(parts))
            }
            TokenKind::Quote2 => {
                let (parts, range) = self.parse_ind_string_parts();
                self.ast.push(range, NodeKind::IndString(parts))
            }
            TokenKind::LParen => {
                self.bump();
                let inner = self.parse_expr();
                let has_right_paren = self.expect_closing(TokenKind::RParen, ")", Range::empty(start));
                let range = self.node_range(start);
                self.ast.push(range, NodeKind::ParenExpr { inner: Some(inner), has_right_paren })
            }
            TokenKind::LBracket => {
                self.bump();
                let mut items = Vec::new();
                while self.peek_kind() != TokenKind::RBracket && self.peek_kind() != TokenKind::Eof {
                    items.push(self.parse_select_or_application_item());
                }
                self.expect_closing(TokenKind::RBracket, "]", Range::empty(start));
                let range = self.node_range(start);
                self.ast.push(range, NodeKind::List(items))
            }
            TokenKind::LCurly => self.parse_attrs(false, start),
            TokenKind::Rec => {
                self.bump();
                self.expect(TokenKind::LCurly, "{");
                self.parse_attrs(true, start)
            }
            _ => {
                let at = self.eof_safe_cursor();
                self.push_diagnostic(Diagnostic::new(DiagnosticCode::Expected, Range::empty(at)).with_arg("expression"));
                if self.peek_kind() != TokenKind::Eof {
                    self.bump();
                }
                self.ast.push(Range::empty(at), NodeKind::Error)
            }
        }
    }

    /// List elements are parsed at application precedence so that
    /// `[ a b c ]` is three elements, not one application chain — but a
    /// single non-application element can still itself be a function call
    /// written with parens, e.g. `[ (f x) ]`.
    fn parse_select_or_application_item(&mut self) -> NodeId {
        self.parse_select()
    }

    fn parse_attrs(&mut self, rec: bool, start: Cursor) -> NodeId {
        // `rec` already consumed by caller when rec == true; `{` still
        // pending in both cases.
        let open = self.cur_start();
        self.expect(TokenKind::LCurly, "{");
        let binds = self.parse_binds(TokenKind::RCurly);
        self.expect_closing(TokenKind::RCurly, "}", Range::empty(open));
        let range = self.node_range(start);
        self.ast.push(range, NodeKind::Attrs { rec, binds })
    }

    fn parse_binds(&mut self, terminator: TokenKind) -> Binds {
        let mut binds = Vec::new();
        loop {
            if self.peek_kind() == terminator || self.peek_kind() == TokenKind::Eof {
                break;
            }
            if self.peek_kind() == TokenKind::Inherit {
                binds.push(BindOrInherit::Inherit(self.parse_inherit()));
                continue;
            }
            if matches!(self.peek_kind(), TokenKind::Id | TokenKind::Or | TokenKind::DQuote | TokenKind::DollarCurly) {
                let start = self.cur_start();
                let path = self.parse_attr_path();
                let value = if self.expect(TokenKind::Eq, "=").is_some() { Some(self.parse_expr()) } else { None };
                if self.peek_kind() == TokenKind::SemiColon {
                    self.bump();
                } else if value.is_some() {
                    self.expect(TokenKind::SemiColon, ";");
                } else {
                    self.recover_to_sync(start);
                    if self.peek_kind() == TokenKind::SemiColon {
                        self.bump();
                    }
                }
                binds.push(BindOrInherit::Binding(Binding { path, value }));
                continue;
            }
            let start = self.cur_start();
            self.recover_to_sync(start);
            if self.peek_kind() == TokenKind::SemiColon {
                self.bump();
            } else {
                break;
            }
        }
        binds
    }

    fn parse_inherit(&mut self) -> Inherit {
        let start = self.cur_start();
        self.bump(); // `inherit`
        let expr = if self.peek_kind() == TokenKind::LParen {
            self.bump();
            let e = self.parse_expr();
            self.expect_closing(TokenKind::RParen, ")", Range::empty(start));
            Some(e)
        } else {
            None
        };
        let mut names = Vec::new();
        while matches!(self.peek_kind(), TokenKind::Id | TokenKind::Or | TokenKind::DQuote | TokenKind::DollarCurly) {
            names.push(self.parse_attr_name());
        }
        if self.peek_kind() == TokenKind::SemiColon {
            self.bump();
        } else {
            self.expect(TokenKind::SemiColon, ";");
        }
        if names.is_empty() {
            let range = self.node_range(start);
            self.push_diagnostic(
                Diagnostic::new(DiagnosticCode::EmptyInherit, range).with_fix(Fix::remove("remove the empty inherit", range)),
            );
        }
        Inherit { expr, names }
    }
}

fn sync_token_text(kind: TokenKind) -> &'static str {
    match kind {
        TokenKind::SemiColon => ";",
        TokenKind::RCurly => "}",
        TokenKind::RBracket => "]",
        TokenKind::RParen => ")",
        TokenKind::Eof => "end of input",
        _ => "?",
    }
}

fn unescape_dquote(escape: &str) -> String {
    match escape {
        "\\n" => "\n".to_string(),
        "\\t" => "\t".to_string(),
        "\\r" => "\r".to_string(),
        "\\\"" => "\"".to_string(),
        "\\\\" => "\\".to_string(),
        "\\${" => "${".to_string(),
        other => other.trim_start_matches('\\').to_string(),
    }
}

fn unescape_ind_string(escape: &str) -> String {
    match escape {
        "'''" => "''".to_string(),
        "''${" => "${".to_string(),
        other if other.starts_with("''\\") => match &other[3..] {
            "n" => "\n".to_string(),
            "t" => "\t".to_string(),
            "r" => "\r".to_string(),
            rest => rest.to_string(),
        },
        other => other.to_string(),
    }
}

#[allow(clippy::type_complexity)]
impl<'a> Parser<'a> {
    fn parse_left_assoc(&mut self, next: fn(&mut Self) -> NodeId, ops: &[(TokenKind, BinOpKind)]) -> NodeId {
        let start = self.cur_start();
        let mut lhs = next(self);
        loop {
            let kind = self.peek_kind();
            let Some((_, op)) = ops.iter().find(|(k, _)| *k == kind) else { break };
            self.bump();
            let rhs = next(self);
            let range = self.node_range(start);
            lhs = self.ast.push(range, NodeKind::BinOp { op: *op, lhs, rhs });
        }
        lhs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root_kind(src: &str) -> (NodeKind, Vec<Diagnostic>) {
        let out = parse(src);
        let root = out.ast.root().expect("root");
        (out.ast.get(root).kind.clone(), out.diagnostics)
    }

    #[test]
    fn simple_let_in() {
        let (kind, diags) = root_kind("let x = 1; in x");
        assert!(matches!(kind, NodeKind::Let { .. }));
        assert!(diags.is_empty());
    }

    #[test]
    fn unterminated_rec_attrs_recovers_with_one_diagnostic() {
        let out = parse("rec { a = 1;");
        let root = out.ast.root().unwrap();
        assert!(matches!(out.ast.get(root).kind, NodeKind::Attrs { rec: true, .. }));
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.diagnostics[0].code, DiagnosticCode::Expected);
        assert_eq!(out.diagnostics[0].args, vec!["}".to_string()]);
        assert!(!out.diagnostics[0].notes.is_empty());
        assert!(out.diagnostics[0].fixes[0].edits[0].is_pure_insertion());
    }

    #[test]
    fn nested_attr_path_binding_parses_as_singleton_path_per_level() {
        let out = parse("{ a.b.c = 1; }");
        let root = out.ast.root().unwrap();
        let NodeKind::Attrs { binds, .. } = &out.ast.get(root).kind else { panic!("expected Attrs") };
        assert_eq!(binds.len(), 1);
        let BindOrInherit::Binding(b) = &binds[0] else { panic!("expected binding") };
        assert_eq!(b.path.len(), 3);
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn or_identifier_emits_hint() {
        let out = parse("{ or = 1; }");
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.diagnostics[0].code, DiagnosticCode::OrIdentifier);
    }

    #[test]
    fn simple_lambda() {
        let (kind, _) = root_kind("x: x");
        assert!(matches!(kind, NodeKind::Lambda { arg: LambdaArg::Simple(..), .. }));
    }

    #[test]
    fn formals_lambda_is_distinguished_from_attrset() {
        let (kind, _) = root_kind("{ a, b ? 1, ... }@args: a");
        match kind {
            NodeKind::Lambda { arg: LambdaArg::Formals { formals, ellipsis, alias }, .. } => {
                assert_eq!(formals.len(), 2);
                assert!(ellipsis);
                assert!(alias.is_some());
            }
            other => panic!("expected formals lambda, got {other:?}"),
        }
    }

    #[test]
    fn bare_attrset_is_not_mistaken_for_formals() {
        let (kind, _) = root_kind("{ a = 1; }");
        assert!(matches!(kind, NodeKind::Attrs { rec: false, .. }));
    }

    #[test]
    fn string_interpolation_round_trips_parts() {
        let out = parse("\"a${1}b\"");
        let root = out.ast.root().unwrap();
        let NodeKind::Str(parts) = &out.ast.get(root).kind else { panic!("expected Str") };
        assert_eq!(parts.len(), 3);
    }

    #[test]
    fn application_is_left_associative() {
        let out = parse("f a b");
        let root = out.ast.root().unwrap();
        let NodeKind::Call { func, .. } = out.ast.get(root).kind else { panic!("expected outer Call") };
        // inner func is itself a Call (f a), confirming left-nesting.
        assert!(matches!(out.ast.get(func).kind, NodeKind::Call { .. }));
    }

    #[test]
    fn binop_precedence_add_before_eq() {
        let (kind, _) = root_kind("1 + 2 == 3");
        assert!(matches!(kind, NodeKind::BinOp { op: BinOpKind::Eq, .. }));
    }

    #[test]
    fn select_with_or_default() {
        let (kind, _) = root_kind("a.b or 1");
        assert!(matches!(kind, NodeKind::Select { or_default: Some(_), .. }));
    }

    #[test]
    fn extra_dot_in_attr_path_emits_remove_dot_with_two_fixes() {
        let out = parse("{ a. = 1; }");
        assert!(out.diagnostics.iter().any(|d| d.code == DiagnosticCode::RemoveDot));
        let d = out.diagnostics.iter().find(|d| d.code == DiagnosticCode::RemoveDot).unwrap();
        assert_eq!(d.fixes.len(), 2);
    }

    #[test]
    fn root_range_covers_whole_source() {
        let src = "let x = 1; in x";
        let out = parse(src);
        let root = out.ast.root().unwrap();
        let range = out.ast.get(root).range;
        assert_eq!(range.start.offset, 0);
        assert_eq!(range.end.offset, src.len());
    }

    #[test]
    fn every_child_range_is_contained_in_parent() {
        fn check(ast: &Ast, id: NodeId) {
            let parent_range = ast.get(id).range;
            for child in ast.children(id) {
                let child_range = ast.get(child).range;
                assert!(parent_range.contains(child_range), "{child_range:?} not contained in {parent_range:?}");
                check(ast, child);
            }
        }
        let out = parse("let a = 1; b = { c = a + 1; }; in b.c ++ [ 1 2 ]");
        check(&out.ast, out.ast.root().unwrap());
    }
}

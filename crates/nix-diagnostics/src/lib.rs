//! Diagnostic, note, fix and text-edit model.
//!
//! `Diagnostic::format()` substitutes `args` into the code's message format
//! at `{}` markers in order, matching the simple positional formatter the
//! parser/lowering passes rely on (no named placeholders, no escaping of
//! literal `{}`).
mod code;
mod edit;

pub use code::{DiagnosticCategory, DiagnosticCode, DiagnosticSeverity, DiagnosticTag};
pub use edit::TextEdit;

use nix_position::Range;

#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub code: DiagnosticCode,
    pub range: Range,
    pub args: Vec<String>,
}

impl Note {
    pub fn new(code: DiagnosticCode, range: Range) -> Self {
        Self { code, range, args: Vec::new() }
    }

    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn format(&self) -> String {
        format_message(self.code.message_format(), &self.args)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fix {
    pub message: String,
    pub edits: Vec<TextEdit>,
}

impl Fix {
    pub fn new(message: impl Into<String>, edits: Vec<TextEdit>) -> Self {
        Self { message: message.into(), edits }
    }

    pub fn insert(message: impl Into<String>, at: Range, text: impl Into<String>) -> Self {
        Self { message: message.into(), edits: vec![TextEdit::insertion(at.end, text)] }
    }

    pub fn remove(message: impl Into<String>, range: Range) -> Self {
        Self { message: message.into(), edits: vec![TextEdit::removal(range)] }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub range: Range,
    pub args: Vec<String>,
    pub notes: Vec<Note>,
    pub fixes: Vec<Fix>,
}

impl Diagnostic {
    pub fn new(code: DiagnosticCode, range: Range) -> Self {
        Self { code, range, args: Vec::new(), notes: Vec::new(), fixes: Vec::new() }
    }

    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn with_note(mut self, note: Note) -> Self {
        self.notes.push(note);
        self
    }

    pub fn with_fix(mut self, fix: Fix) -> Self {
        self.fixes.push(fix);
        self
    }

    pub fn severity(&self) -> DiagnosticSeverity {
        self.code.severity()
    }

    pub fn tags(&self) -> &'static [DiagnosticTag] {
        self.code.tags()
    }

    pub fn format(&self) -> String {
        format_message(self.code.message_format(), &self.args)
    }
}

fn format_message(fmt: &str, args: &[String]) -> String {
    let mut out = String::with_capacity(fmt.len());
    let mut arg_idx = 0usize;
    let mut chars = fmt.char_indices().peekable();
    while let Some((i, ch)) = chars.next() {
        if ch == '{' && fmt[i..].starts_with("{}") {
            if let Some(arg) = args.get(arg_idx) {
                out.push_str(arg);
            }
            arg_idx += 1;
            chars.next();
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix_position::Cursor;

    fn r(a: usize, b: usize) -> Range {
        Range::new(Cursor::new(0, a as u32, a), Cursor::new(0, b as u32, b))
    }

    #[test]
    fn format_substitutes_args_in_order() {
        let d = Diagnostic::new(DiagnosticCode::Expected, r(0, 1)).with_arg("}").with_arg("ignored");
        assert_eq!(d.format(), "expected `}`");
    }

    #[test]
    fn no_arg_format_is_unchanged() {
        let d = Diagnostic::new(DiagnosticCode::OrIdentifier, r(0, 1));
        assert_eq!(d.format(), DiagnosticCode::OrIdentifier.message_format());
    }
}

//! The closed set of diagnostic short names, with their fixed severity,
//! message format and tags — mirrors the teacher's `DiagnosticCode` shape
//! (`as_str`/`severity`/`tags`/`parse_code`/`category`) but keyed by the
//! human-readable short names `spec.md` uses (`expected`, `attr-duplicated`,
//! `undefined-variable`, ...) rather than numeric codes, since the source
//! language server has no numbered-code convention to preserve.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum DiagnosticSeverity {
    Error = 1,
    Warning = 2,
    Info = 3,
    Hint = 4,
}

impl DiagnosticSeverity {
    pub fn to_lsp_value(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DiagnosticSeverity::Error => "error",
            DiagnosticSeverity::Warning => "warning",
            DiagnosticSeverity::Info => "info",
            DiagnosticSeverity::Hint => "hint",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticTag {
    Unnecessary,
    Deprecated,
}

impl DiagnosticTag {
    pub fn to_lsp_value(self) -> u8 {
        match self {
            DiagnosticTag::Unnecessary => 1,
            DiagnosticTag::Deprecated => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCategory {
    Lex,
    Parse,
    Lowering,
    Semantic,
}

/// Every diagnostic short name the lexer/parser/lowering/VLA passes emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCode {
    // Lexer
    UnterminatedBlockComment,
    FloatLeadingZero,
    FloatNoExponent,
    // Parser
    Expected,
    RemoveDot,
    OrIdentifier,
    UnknownToken,
    // Lowering
    AttrDuplicated,
    EmptyInherit,
    DynamicInherit,
    LetDynamic,
    RecIgnored,
    // Semantic (VLA)
    UndefinedVariable,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticCode::UnterminatedBlockComment => "unterminated-block-comment",
            DiagnosticCode::FloatLeadingZero => "float-leading-zero",
            DiagnosticCode::FloatNoExponent => "float-no-exponent",
            DiagnosticCode::Expected => "expected",
            DiagnosticCode::RemoveDot => "remove-dot",
            DiagnosticCode::OrIdentifier => "or-identifier",
            DiagnosticCode::UnknownToken => "unknown-token",
            DiagnosticCode::AttrDuplicated => "attr-duplicated",
            DiagnosticCode::EmptyInherit => "empty-inherit",
            DiagnosticCode::DynamicInherit => "dynamic-inherit",
            DiagnosticCode::LetDynamic => "let-dynamic",
            DiagnosticCode::RecIgnored => "rec-ignored",
            DiagnosticCode::UndefinedVariable => "undefined-variable",
        }
    }

    pub fn parse_code(s: &str) -> Option<DiagnosticCode> {
        Some(match s {
            "unterminated-block-comment" => DiagnosticCode::UnterminatedBlockComment,
            "float-leading-zero" => DiagnosticCode::FloatLeadingZero,
            "float-no-exponent" => DiagnosticCode::FloatNoExponent,
            "expected" => DiagnosticCode::Expected,
            "remove-dot" => DiagnosticCode::RemoveDot,
            "or-identifier" => DiagnosticCode::OrIdentifier,
            "unknown-token" => DiagnosticCode::UnknownToken,
            "attr-duplicated" => DiagnosticCode::AttrDuplicated,
            "empty-inherit" => DiagnosticCode::EmptyInherit,
            "dynamic-inherit" => DiagnosticCode::DynamicInherit,
            "let-dynamic" => DiagnosticCode::LetDynamic,
            "rec-ignored" => DiagnosticCode::RecIgnored,
            "undefined-variable" => DiagnosticCode::UndefinedVariable,
            _ => return None,
        })
    }

    pub fn severity(&self) -> DiagnosticSeverity {
        match self {
            DiagnosticCode::UnterminatedBlockComment
            | DiagnosticCode::Expected
            | DiagnosticCode::UnknownToken
            | DiagnosticCode::AttrDuplicated
            | DiagnosticCode::DynamicInherit
            | DiagnosticCode::LetDynamic => DiagnosticSeverity::Error,
            DiagnosticCode::FloatLeadingZero
            | DiagnosticCode::FloatNoExponent
            | DiagnosticCode::RemoveDot
            | DiagnosticCode::EmptyInherit
            | DiagnosticCode::RecIgnored
            | DiagnosticCode::UndefinedVariable => DiagnosticSeverity::Warning,
            DiagnosticCode::OrIdentifier => DiagnosticSeverity::Hint,
        }
    }

    pub fn category(&self) -> DiagnosticCategory {
        match self {
            DiagnosticCode::UnterminatedBlockComment
            | DiagnosticCode::FloatLeadingZero
            | DiagnosticCode::FloatNoExponent => DiagnosticCategory::Lex,
            DiagnosticCode::Expected | DiagnosticCode::RemoveDot | DiagnosticCode::OrIdentifier | DiagnosticCode::UnknownToken => {
                DiagnosticCategory::Parse
            }
            DiagnosticCode::AttrDuplicated
            | DiagnosticCode::EmptyInherit
            | DiagnosticCode::DynamicInherit
            | DiagnosticCode::LetDynamic
            | DiagnosticCode::RecIgnored => DiagnosticCategory::Lowering,
            DiagnosticCode::UndefinedVariable => DiagnosticCategory::Semantic,
        }
    }

    pub fn tags(&self) -> &'static [DiagnosticTag] {
        match self {
            DiagnosticCode::EmptyInherit => &[DiagnosticTag::Unnecessary],
            DiagnosticCode::UndefinedVariable => &[],
            _ => &[],
        }
    }

    /// The positional message template; `{}` markers are substituted in
    /// argument order by [`crate::Diagnostic::format`].
    pub fn message_format(&self) -> &'static str {
        match self {
            DiagnosticCode::UnterminatedBlockComment => "unterminated `/*` comment",
            DiagnosticCode::FloatLeadingZero => "float `{}` has a leading zero",
            DiagnosticCode::FloatNoExponent => "expected digits after exponent `{}`",
            DiagnosticCode::Expected => "expected `{}`",
            DiagnosticCode::RemoveDot => "extra `.` in attribute path",
            DiagnosticCode::OrIdentifier => "`or` used as an identifier",
            DiagnosticCode::UnknownToken => "unexpected token, skipping to `{}`",
            DiagnosticCode::AttrDuplicated => "attribute `{}` already defined",
            DiagnosticCode::EmptyInherit => "empty inherit statement",
            DiagnosticCode::DynamicInherit => "dynamic attribute not allowed in inherit",
            DiagnosticCode::LetDynamic => "dynamic attribute not allowed in let binding",
            DiagnosticCode::RecIgnored => "`rec` on a nested attribute set is ignored when merged",
            DiagnosticCode::UndefinedVariable => "undefined variable `{}`",
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_parse_code() {
        for code in [
            DiagnosticCode::Expected,
            DiagnosticCode::AttrDuplicated,
            DiagnosticCode::UndefinedVariable,
            DiagnosticCode::OrIdentifier,
        ] {
            assert_eq!(DiagnosticCode::parse_code(code.as_str()), Some(code));
        }
    }

    #[test]
    fn unknown_short_name_parses_to_none() {
        assert_eq!(DiagnosticCode::parse_code("not-a-real-code"), None);
    }
}

//! `textDocument/publishDiagnostics` provider (`spec.md` §4.6/§7).
//!
//! Merges the lexer/parser/lowering diagnostics a [`NixTu`] already carries
//! with the `undefined-variable` diagnostics synthesized from its
//! [`VariableLookup`] (not computed by the analysis pass itself — see
//! `nix-semantic-analyzer`'s `DESIGN.md` entry), applies
//! `diagnostic.suppress` from [`Config`], and converts the result to
//! `lsp_types::Diagnostic` for publishing. Grounded on
//! `perl-lsp-diagnostics::DiagnosticsProvider`'s "one entry point, `AST` in,
//! `lsp_types::Diagnostic`s out" shape.

use nix_ast::NodeKind;
use nix_config::Config;
use nix_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSeverity as Severity, DiagnosticTag as Tag};
use nix_position::WireRange;
use nix_semantic_analyzer::LookupKind;
use nix_tu::NixTu;
use lsp_types::{
    DiagnosticRelatedInformation, DiagnosticSeverity, DiagnosticTag, Location, NumberOrString, PublishDiagnosticsParams, Uri,
};

/// The merged, suppression-filtered diagnostic list for `tu`, in the
/// server's internal representation (not yet converted to `lsp_types`).
pub fn collect(tu: &NixTu, config: &Config) -> Vec<Diagnostic> {
    let mut out = tu.syntactic_diagnostics();
    for (id, result) in tu.variable_lookup.iter() {
        if result.kind != LookupKind::Undefined {
            continue;
        }
        if let NodeKind::Var(name) = &tu.ast.get(id).kind {
            out.push(Diagnostic::new(DiagnosticCode::UndefinedVariable, tu.ast.get(id).range).with_arg(name.clone()));
        }
    }
    out.retain(|d| !config.suppresses(d.code));
    out
}

/// Builds the `textDocument/publishDiagnostics` params for `uri`, tagging
/// the batch with `tu.version` so a client that checks versions can discard
/// stale publications (`spec.md` §5).
pub fn publish_params(uri: Uri, tu: &NixTu, config: &Config) -> PublishDiagnosticsParams {
    let diagnostics = collect(tu, config).iter().map(|d| to_lsp(&tu.source, uri.clone(), d)).collect();
    PublishDiagnosticsParams { uri, diagnostics, version: Some(tu.version) }
}

fn to_lsp(source: &str, uri: Uri, d: &Diagnostic) -> lsp_types::Diagnostic {
    let related_information = if d.notes.is_empty() {
        None
    } else {
        Some(
            d.notes
                .iter()
                .map(|note| DiagnosticRelatedInformation {
                    location: Location { uri: uri.clone(), range: WireRange::from_byte_offsets(source, note.range.start.offset, note.range.end.offset).into() },
                    message: note.format(),
                })
                .collect(),
        )
    };
    let tags: Vec<DiagnosticTag> = d.tags().iter().map(|t| to_lsp_tag(*t)).collect();
    lsp_types::Diagnostic {
        range: WireRange::from_byte_offsets(source, d.range.start.offset, d.range.end.offset).into(),
        severity: Some(to_lsp_severity(d.severity())),
        code: Some(NumberOrString::String(d.code.as_str().to_string())),
        code_description: None,
        source: Some("nix-lsp".to_string()),
        message: d.format(),
        related_information,
        tags: if tags.is_empty() { None } else { Some(tags) },
        data: None,
    }
}

fn to_lsp_severity(s: Severity) -> DiagnosticSeverity {
    match s {
        Severity::Error => DiagnosticSeverity::ERROR,
        Severity::Warning => DiagnosticSeverity::WARNING,
        Severity::Info => DiagnosticSeverity::INFORMATION,
        Severity::Hint => DiagnosticSeverity::HINT,
    }
}

fn to_lsp_tag(t: Tag) -> DiagnosticTag {
    match t {
        Tag::Unnecessary => DiagnosticTag::UNNECESSARY,
        Tag::Deprecated => DiagnosticTag::DEPRECATED,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn uri() -> Uri {
        "file:///a.nix".parse().expect("static uri parses")
    }

    #[test]
    fn error_free_source_has_no_diagnostics() {
        let tu = NixTu::build(Arc::from("let a = 1; in a"), 1);
        assert!(collect(&tu, &Config::default()).is_empty());
    }

    #[test]
    fn unterminated_attrs_reports_exactly_one_expected_diagnostic() {
        let tu = NixTu::build(Arc::from("rec { a = 1;"), 1);
        let diags = collect(&tu, &Config::default());
        assert_eq!(diags.iter().filter(|d| d.code == DiagnosticCode::Expected).count(), 1);
    }

    #[test]
    fn undefined_variable_is_reported() {
        let tu = NixTu::build(Arc::from("someUnboundName"), 1);
        let diags = collect(&tu, &Config::default());
        assert!(diags.iter().any(|d| d.code == DiagnosticCode::UndefinedVariable));
    }

    #[test]
    fn suppression_drops_the_configured_code() {
        let tu = NixTu::build(Arc::from("someUnboundName"), 1);
        let config = Config::from_cli_json(r#"{"diagnostic": {"suppress": ["undefined-variable"]}}"#).expect("valid");
        assert!(collect(&tu, &config).is_empty());
    }

    #[test]
    fn publish_params_carries_the_tu_version() {
        let tu = NixTu::build(Arc::from("1 + "), 7);
        let params = publish_params(uri(), &tu, &Config::default());
        assert_eq!(params.version, Some(7));
    }
}

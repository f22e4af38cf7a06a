//! Server capability advertisement (`spec.md` §6). Unlike the teacher's
//! `perl-lsp-protocol`, which gates many optional capabilities behind
//! `BuildFlags`, the Nix server's capability set is fixed — every feature
//! `spec.md` §6 lists is always on, so there is nothing to toggle.

use lsp_types::{
    CodeActionKind, CodeActionOptions, CodeActionProviderCapability, CompletionOptions, DocumentLinkOptions,
    HoverProviderCapability, OneOf, SemanticTokensFullOptions, SemanticTokensLegend, SemanticTokensOptions,
    SemanticTokensServerCapabilities, ServerCapabilities, TextDocumentSyncCapability, TextDocumentSyncKind,
    TextDocumentSyncOptions, SemanticTokenModifier, SemanticTokenType, SaveOptions, WorkDoneProgressOptions,
};

/// The semantic token legend used by `nix-lsp-semantic-tokens`; kept here
/// rather than in that crate since the legend is part of the capability
/// advertisement, and both need to agree on index order.
pub fn semantic_token_legend() -> SemanticTokensLegend {
    SemanticTokensLegend {
        token_types: vec![
            SemanticTokenType::KEYWORD,
            SemanticTokenType::VARIABLE,
            SemanticTokenType::PARAMETER,
            SemanticTokenType::PROPERTY,
            SemanticTokenType::STRING,
            SemanticTokenType::NUMBER,
            SemanticTokenType::COMMENT,
            SemanticTokenType::OPERATOR,
            SemanticTokenType::FUNCTION,
        ],
        token_modifiers: vec![SemanticTokenModifier::DECLARATION, SemanticTokenModifier::DEFAULT_LIBRARY],
    }
}

/// Builds the fixed `ServerCapabilities` this server advertises in its
/// `initialize` response.
#[allow(clippy::field_reassign_with_default)]
pub fn server_capabilities() -> ServerCapabilities {
    let mut caps = ServerCapabilities::default();

    caps.text_document_sync = Some(TextDocumentSyncCapability::Options(TextDocumentSyncOptions {
        open_close: Some(true),
        change: Some(TextDocumentSyncKind::INCREMENTAL),
        will_save: None,
        will_save_wait_until: None,
        save: Some(lsp_types::TextDocumentSyncSaveOptions::SaveOptions(SaveOptions {
            include_text: Some(false),
        })),
    }));

    caps.hover_provider = Some(HoverProviderCapability::Simple(true));
    caps.definition_provider = Some(OneOf::Left(true));
    caps.document_symbol_provider = Some(OneOf::Left(true));
    caps.document_formatting_provider = Some(OneOf::Left(true));

    caps.completion_provider = Some(CompletionOptions {
        resolve_provider: Some(false),
        trigger_characters: Some(vec![".".to_string()]),
        all_commit_characters: None,
        work_done_progress_options: WorkDoneProgressOptions::default(),
        completion_item: None,
    });

    caps.code_action_provider = Some(CodeActionProviderCapability::Options(CodeActionOptions {
        code_action_kinds: Some(vec![CodeActionKind::QUICKFIX, CodeActionKind::new("refactor.noogle")]),
        work_done_progress_options: WorkDoneProgressOptions::default(),
        resolve_provider: Some(false),
    }));

    caps.document_link_provider =
        Some(DocumentLinkOptions { resolve_provider: Some(false), work_done_progress_options: WorkDoneProgressOptions::default() });

    caps.semantic_tokens_provider = Some(SemanticTokensServerCapabilities::SemanticTokensOptions(SemanticTokensOptions {
        work_done_progress_options: WorkDoneProgressOptions::default(),
        legend: semantic_token_legend(),
        range: Some(false),
        full: Some(SemanticTokensFullOptions::Bool(true)),
    }));

    caps
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advertises_incremental_sync() {
        let caps = server_capabilities();
        let Some(TextDocumentSyncCapability::Options(opts)) = caps.text_document_sync else {
            unreachable!("server_capabilities always sets the Options variant")
        };
        assert_eq!(opts.change, Some(TextDocumentSyncKind::INCREMENTAL));
    }

    #[test]
    fn completion_triggers_on_dot() {
        let caps = server_capabilities();
        let completion = caps.completion_provider.expect("completion always advertised");
        assert_eq!(completion.trigger_characters, Some(vec![".".to_string()]));
    }
}

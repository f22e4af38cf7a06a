//! The fixed keyword table (`spec.md` §4.1: `if`, `then`, `else`, `assert`,
//! `with`, `let`, `in`, `rec`, `inherit`, `or`), offered as completions with
//! snippet-free plain insertion — grounded on `perl-lsp-completion`'s
//! keyword module, minus Perl's snippet-expansion behaviour (Nix's grammar
//! doesn't have block-statement keywords that take an obvious snippet body
//! the way Perl's `if`/`while` do).

use crate::item;
use lsp_types::{CompletionItem, CompletionItemKind};

const KEYWORDS: &[&str] = &["if", "then", "else", "assert", "with", "let", "in", "rec", "inherit", "or"];

pub fn add_keyword_completions(out: &mut Vec<CompletionItem>, prefix: &str) {
    out.extend(KEYWORDS.iter().filter(|k| k.starts_with(prefix)).map(|k| item(*k, CompletionItemKind::KEYWORD, Some("keyword"))));
}

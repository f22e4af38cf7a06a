//! Configuration schema (`spec.md` §6): the `workspace/configuration`
//! payload shape, plus `--config=<json>` CLI seeding of the same shape.
//! Grounded on `perl-dap::configuration`'s serde-derived, `camelCase`,
//! all-fields-optional configuration structs.

use nix_diagnostics::DiagnosticCode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The external code formatter to shell out to for `textDocument/formatting`
/// (`spec.md` §4.8/§6: "invoking the configured external formatter with the
/// document text on stdin").
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum FormatterCommand {
    #[default]
    Unset,
    Single(String),
    Argv(Vec<String>),
}

impl FormatterCommand {
    /// The argv this command should be invoked with, or `None` if
    /// unconfigured.
    pub fn argv(&self) -> Option<Vec<String>> {
        match self {
            FormatterCommand::Unset => None,
            FormatterCommand::Single(cmd) => Some(vec![cmd.clone()]),
            FormatterCommand::Argv(argv) if argv.is_empty() => None,
            FormatterCommand::Argv(argv) => Some(argv.clone()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FormattingConfig {
    #[serde(default)]
    pub command: FormatterCommand,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct NixpkgsConfig {
    /// A Nix expression evaluated once by the nixpkgs (attribute-set) worker;
    /// its value becomes the root attribute set for package completion and
    /// hover (`spec.md` §6).
    pub expr: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct OptionSetConfig {
    pub expr: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticConfig {
    /// Diagnostic short names (`DiagnosticCode::as_str`) to drop before
    /// publishing (`spec.md` §6: `diagnostic.suppress`).
    #[serde(default)]
    pub suppress: Vec<String>,
}

/// The full `workspace/configuration` payload this server recognizes. Every
/// field is optional — a client (or `--config`) may set any subset.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub formatting: FormattingConfig,
    #[serde(default)]
    pub nixpkgs: NixpkgsConfig,
    /// `options.<name>.expr`: one option-tree worker per named entry.
    #[serde(default)]
    pub options: BTreeMap<String, OptionSetConfig>,
    #[serde(default)]
    pub diagnostic: DiagnosticConfig,
}

impl Config {
    /// Parses a `--config=<json>` CLI argument (`spec.md` §6).
    pub fn from_cli_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Merges `patch` over `self`: any field `patch` sets explicitly
    /// replaces this config's value for it. Used when a
    /// `workspace/didChangeConfiguration` notification arrives after
    /// `--config` already seeded a baseline.
    pub fn merge_from(&mut self, patch: Config) {
        if !matches!(patch.formatting.command, FormatterCommand::Unset) {
            self.formatting.command = patch.formatting.command;
        }
        if patch.nixpkgs.expr.is_some() {
            self.nixpkgs.expr = patch.nixpkgs.expr;
        }
        for (name, opt) in patch.options {
            self.options.insert(name, opt);
        }
        if !patch.diagnostic.suppress.is_empty() {
            self.diagnostic.suppress = patch.diagnostic.suppress;
        }
    }

    /// Whether diagnostics of `code` should be dropped before publishing.
    pub fn suppresses(&self, code: DiagnosticCode) -> bool {
        self.diagnostic.suppress.iter().any(|s| DiagnosticCode::parse_code(s) == Some(code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_documented_schema() {
        let json = r#"{
            "formatting": {"command": ["nixpkgs-fmt", "-"]},
            "nixpkgs": {"expr": "import <nixpkgs> {}"},
            "options": {"nixos": {"expr": "(import <nixpkgs/nixos> {}).options"}},
            "diagnostic": {"suppress": ["or-identifier"]}
        }"#;
        let cfg = Config::from_cli_json(json).expect("well-formed config");
        assert_eq!(cfg.formatting.command.argv(), Some(vec!["nixpkgs-fmt".to_string(), "-".to_string()]));
        assert_eq!(cfg.nixpkgs.expr.as_deref(), Some("import <nixpkgs> {}"));
        assert!(cfg.options.contains_key("nixos"));
        assert!(cfg.suppresses(DiagnosticCode::OrIdentifier));
    }

    #[test]
    fn every_field_is_optional() {
        let cfg = Config::from_cli_json("{}").expect("empty object is valid");
        assert!(cfg.nixpkgs.expr.is_none());
        assert!(cfg.options.is_empty());
    }

    #[test]
    fn merge_only_overwrites_fields_the_patch_sets() {
        let mut base = Config::from_cli_json(r#"{"nixpkgs": {"expr": "a"}}"#).expect("valid");
        let patch = Config::from_cli_json(r#"{"diagnostic": {"suppress": ["expected"]}}"#).expect("valid");
        base.merge_from(patch);
        assert_eq!(base.nixpkgs.expr.as_deref(), Some("a"));
        assert!(base.suppresses(DiagnosticCode::Expected));
    }
}

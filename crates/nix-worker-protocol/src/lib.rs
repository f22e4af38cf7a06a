//! Method names and param/result payloads for the evaluator worker RPC
//! surface (`spec.md` §4.7). The transport itself (framing, correlation,
//! process lifecycle) lives in `nix-eval-worker`/`nix-lsp`; this crate only
//! fixes the wire shape both ends agree on, the same split the teacher
//! keeps between `perl-lsp-protocol` (shapes) and `perl-lsp-transport`
//! (bytes).

use nix_position::WireLocation;
use serde::{Deserialize, Serialize};

pub mod methods {
    pub const EVAL_EXPR: &str = "evalExpr";
    pub const ATTRPATH_INFO: &str = "attrpathInfo";
    pub const ATTRPATH_COMPLETE: &str = "attrpathComplete";
    pub const OPTION_INFO: &str = "optionInfo";
    pub const OPTION_COMPLETE: &str = "optionComplete";
    /// Notification (no reply), emitted by a worker right after it starts.
    pub const READY: &str = "ready";
}

/// `ready` notification params: `spec.md` §6 "a `ready` notification
/// emitted by the worker at startup carrying its pid".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadyParams {
    pub pid: u32,
}

/// `evalExpr(string) -> error?`. Parses and evaluates `expr` to an
/// attribute-set value, storing it as the worker's current root. On
/// success the RPC reply is a null result; on failure it's a JSON-RPC
/// error carrying the user-visible message (`spec.md` §4.7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalExprParams {
    pub expr: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValueKind {
    Int,
    Float,
    Bool,
    Null,
    String,
    Path,
    List,
    AttrSet,
    Function,
    Primop,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueMeta {
    pub kind: ValueKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<WireLocation>,
}

/// Package-like metadata `spec.md` §4.7 lists: "name, pname, version,
/// description, long description, position, homepage".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageDescription {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<WireLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
}

/// For primops/lambdas: "their doc/arity/args" (`spec.md` §4.7).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FunctionDescription {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arity: Option<u32>,
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttrpathInfoParams {
    pub path: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttrpathInfoResult {
    pub meta: ValueMeta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_desc: Option<PackageDescription>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_desc: Option<FunctionDescription>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_desc: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttrpathCompleteParams {
    #[serde(default)]
    pub scope: Vec<String>,
    pub prefix: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
}

impl AttrpathCompleteParams {
    /// `spec.md` §4.7: "capped (default 30) to bound work".
    pub const DEFAULT_MAX_ITEMS: usize = 30;

    pub fn max_items(&self) -> usize {
        self.max_items.unwrap_or(Self::DEFAULT_MAX_ITEMS)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionInfoParams {
    pub path: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptionDescription {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub declarations: Vec<WireLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_summary: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionCompleteParams {
    #[serde(default)]
    pub scope: Vec<String>,
    pub prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionField {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_summary: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_items_defaults_to_thirty() {
        let params = AttrpathCompleteParams { scope: vec![], prefix: "he".into(), max_items: None };
        assert_eq!(params.max_items(), 30);
    }

    #[test]
    fn params_round_trip_through_json() {
        let params = AttrpathInfoParams { path: vec!["hello".into()] };
        let json = serde_json::to_string(&params).expect("serializes");
        let back: AttrpathInfoParams = serde_json::from_str(&json).expect("deserializes");
        assert_eq!(back.path, vec!["hello".to_string()]);
    }
}

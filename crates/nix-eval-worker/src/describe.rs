//! Converts evaluated [`Value`]s into the wire-shaped description types
//! `nix-worker-protocol` defines for `attrpathInfo`/`optionInfo`/
//! `*Complete` (`spec.md` §4.7).
//!
//! There is no embedded nixpkgs `lib` here (see `eval.rs`'s module doc), so
//! "package-like" and "option-like" are recognised by field-name
//! convention rather than by re-deriving `stdenv.mkDerivation`/`lib.mkOption`
//! semantics: an attrset counts as package-like if it has any of
//! `name`/`pname`/`version`/`meta`, and as an option leaf if it has a
//! `description` field. Real nixpkgs sources satisfy both conventions, so
//! this degrades gracefully for files that only use this worker's
//! arithmetic/attrset subset rather than the full language.

use crate::value::{AttrSet, Value};
use nix_worker_protocol::{
    AttrpathCompleteParams, FunctionDescription, OptionCompleteParams, OptionDescription, OptionField, PackageDescription, ValueKind, ValueMeta,
};

pub fn value_kind(v: &Value) -> ValueKind {
    match v {
        Value::Int(_) => ValueKind::Int,
        Value::Float(_) => ValueKind::Float,
        Value::Bool(_) => ValueKind::Bool,
        Value::Null => ValueKind::Null,
        Value::String(_) => ValueKind::String,
        Value::Path(_) => ValueKind::Path,
        Value::List(_) => ValueKind::List,
        Value::AttrSet(_) => ValueKind::AttrSet,
        Value::Lambda(_) => ValueKind::Function,
        Value::Primop(_) | Value::PartialPrimop(..) => ValueKind::Primop,
    }
}

pub fn value_meta(v: &Value) -> ValueMeta {
    ValueMeta { kind: value_kind(v), location: None }
}

fn field_string(set: &AttrSet, key: &str) -> Option<String> {
    let thunk = set.attrs.get(key)?;
    match thunk.forced_value()? {
        Value::String(s) => Some(s.to_string()),
        Value::Path(s) => Some(s.to_string()),
        _ => None,
    }
}

/// `meta.<field>` lookup, the nixpkgs convention for package metadata.
fn meta_field_string(set: &AttrSet, key: &str) -> Option<String> {
    let meta = set.attrs.get("meta")?;
    let Value::AttrSet(meta_set) = meta.forced_value()? else { return None };
    field_string(&meta_set, key)
}

pub fn is_package_like(set: &AttrSet) -> bool {
    set.attrs.contains_key("name") || set.attrs.contains_key("pname") || set.attrs.contains_key("meta")
}

pub fn package_description(set: &AttrSet) -> PackageDescription {
    PackageDescription {
        name: field_string(set, "name"),
        pname: field_string(set, "pname"),
        version: field_string(set, "version"),
        description: meta_field_string(set, "description"),
        long_description: meta_field_string(set, "longDescription"),
        position: None,
        homepage: meta_field_string(set, "homepage"),
    }
}

pub fn function_description(lambda: &crate::value::LambdaValue) -> FunctionDescription {
    use crate::value::LambdaArgValue;
    match &lambda.arg {
        LambdaArgValue::Simple(name) => FunctionDescription { doc: None, arity: Some(1), args: vec![name.clone()] },
        LambdaArgValue::Formals { formals, .. } => {
            FunctionDescription { doc: None, arity: Some(formals.len() as u32), args: formals.iter().map(|f| f.name.clone()).collect() }
        }
    }
}

/// Lexicographic names under `set` starting with `prefix`, capped at
/// `params.max_items()` (`spec.md` §4.7: "capped (default 30) to bound
/// work"). `static_attrs`/`AttrSet::attrs` are both `BTreeMap`s, so
/// iteration order is already the lexicographic order the spec's scenario 7
/// requires without an extra sort.
pub fn attrpath_complete(set: &AttrSet, prefix: &str, params: &AttrpathCompleteParams) -> Vec<String> {
    set.attrs.keys().filter(|k| k.starts_with(prefix)).take(params.max_items()).cloned().collect()
}

pub fn is_option_leaf(set: &AttrSet) -> bool {
    set.attrs.contains_key("description")
}

/// Unwraps a `literalExpression "foo"`-shaped value (an attrset with a
/// `text` field) down to its text, falling back to a plain string/toString
/// of whatever `example` actually holds.
fn unwrap_example(v: Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.to_string()),
        Value::AttrSet(set) => field_string(&set, "text"),
        Value::Int(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub fn option_description(set: &AttrSet) -> OptionDescription {
    let example = set.attrs.get("example").and_then(|t| t.forced_value()).and_then(unwrap_example);
    OptionDescription { description: field_string(set, "description"), declarations: Vec::new(), example, type_summary: field_string(set, "type") }
}

/// Enumerates option fields directly under `set` whose name starts with
/// `params.prefix`. Does not expand `attrsOf submodule`-typed fields into a
/// synthetic `*` wildcard segment the way `spec.md` §4.7 describes
/// (`users.users.*.name`): doing that faithfully needs the real
/// `lib.mkOption`/`getSubOptions` machinery nixpkgs provides, which this
/// worker's from-scratch evaluator does not reimplement. Left as a known
/// gap rather than a fabricated approximation.
pub fn option_complete(set: &AttrSet, params: &OptionCompleteParams) -> Vec<OptionField> {
    set.attrs
        .iter()
        .filter(|(name, _)| name.starts_with(&params.prefix))
        .map(|(name, thunk)| {
            let type_summary = thunk.forced_value().and_then(|v| match v {
                Value::AttrSet(nested) => field_string(&nested, "type"),
                _ => None,
            });
            OptionField { name: name.clone(), type_summary }
        })
        .collect()
}

/// Selects along `path` from `root`, forcing each step through `eval` so an
/// unevaluated nested attribute (the common case — nothing but the worker's
/// stored root is forced by `evalExpr` itself) resolves correctly.
pub fn navigate(eval: &crate::eval::Evaluator<'_>, root: &Value, path: &[String]) -> Result<Value, crate::error::EvalError> {
    let mut current = root.clone();
    for segment in path {
        let Value::AttrSet(set) = &current else {
            return Err(crate::error::EvalError::TypeError(current.type_name(), "set"));
        };
        let thunk = set.attrs.get(segment).ok_or_else(|| crate::error::EvalError::MissingAttr(segment.clone()))?;
        current = eval.force(thunk)?;
    }
    Ok(current)
}

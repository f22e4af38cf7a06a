//! The builtin subset this worker implements, keyed off the same name list
//! `nix-semantic-analyzer::BUILTIN_NAMES` resolves without a binding site.
//! Not a nixpkgs mirror: just enough (`toString`, `map`, `filter`,
//! `removeAttrs`, `baseNameOf`, `dirOf`, `isNull`, `abort`, `throw`) for
//! expressions that exercise attribute sets and lists without reaching for
//! `import`.

use crate::error::EvalError;
use crate::eval::Evaluator;
use crate::value::{AttrSet, Thunk, Value};
use std::rc::Rc;

/// The value bound to a name that isn't found in any lexical scope, if it
/// names a builtin this worker implements. Mirrors
/// `nix_semantic_analyzer::BUILTIN_NAMES`'s list but only a subset actually
/// evaluates to something; the rest (`fetchTarball`, `fetchGit`,
/// `derivation`) resolve to a primop value that errors only if called,
/// matching real Nix's behaviour of letting unused builtins sit unevaluated.
pub fn lookup_global(name: &str) -> Option<Value> {
    match name {
        "true" => Some(Value::Bool(true)),
        "false" => Some(Value::Bool(false)),
        "null" => Some(Value::Null),
        "toString" | "map" | "filter" | "removeAttrs" | "baseNameOf" | "dirOf" | "isNull" | "abort" | "throw" | "import" | "fetchTarball"
        | "fetchGit" => Some(Value::Primop(intern(name))),
        "builtins" => Some(builtins_attrset()),
        "derivation" => Some(Value::Primop("derivation")),
        _ => None,
    }
}

/// `&'static str` names are matched on below; this just asserts the subset
/// handled by `call` is closed over the names `lookup_global` hands out.
fn intern(name: &str) -> &'static str {
    match name {
        "toString" => "toString",
        "map" => "map",
        "filter" => "filter",
        "removeAttrs" => "removeAttrs",
        "baseNameOf" => "baseNameOf",
        "dirOf" => "dirOf",
        "isNull" => "isNull",
        "abort" => "abort",
        "throw" => "throw",
        "import" => "import",
        "fetchTarball" => "fetchTarball",
        "fetchGit" => "fetchGit",
        _ => "unknown",
    }
}

fn builtins_attrset() -> Value {
    let mut attrs = std::collections::BTreeMap::new();
    for name in ["toString", "map", "filter", "removeAttrs", "baseNameOf", "dirOf", "isNull", "abort", "throw", "import"] {
        attrs.insert(name.to_string(), Thunk::forced(Value::Primop(intern(name))));
    }
    Value::AttrSet(Rc::new(AttrSet { attrs }))
}

pub fn call(eval: &Evaluator<'_>, name: &str, args: &[Thunk]) -> Result<Value, EvalError> {
    match (name, args) {
        ("toString", [a]) => Ok(Value::String(Rc::from(to_string_value(eval.force(a)?)?.as_str()))),
        ("isNull", [a]) => Ok(Value::Bool(matches!(eval.force(a)?, Value::Null))),
        ("baseNameOf", [a]) => path_component(eval.force(a)?, false),
        ("dirOf", [a]) => path_component(eval.force(a)?, true),
        ("abort", [a]) => Err(EvalError::Throw(to_string_value(eval.force(a)?)?)),
        ("throw", [a]) => Err(EvalError::Throw(to_string_value(eval.force(a)?)?)),
        ("import", [_]) | ("fetchTarball", [_]) | ("fetchGit", [_]) => Err(EvalError::ImportUnsupported),
        ("map", [f]) => Ok(Value::PartialPrimop("map", f.clone())),
        ("map", [f, list]) => eval_map(eval, f, list),
        ("filter", [f]) => Ok(Value::PartialPrimop("filter", f.clone())),
        ("filter", [f, list]) => eval_filter(eval, f, list),
        ("removeAttrs", [set]) => Ok(Value::PartialPrimop("removeAttrs", set.clone())),
        ("removeAttrs", [set, names]) => eval_remove_attrs(eval, set, names),
        ("derivation", _) => Err(EvalError::TypeError("primop", "derivation is not implemented by this worker")),
        _ => Err(EvalError::UnknownBuiltin(name.to_string())),
    }
}

fn to_string_value(v: Value) -> Result<String, EvalError> {
    match v {
        Value::String(s) => Ok(s.to_string()),
        Value::Path(s) => Ok(s.to_string()),
        Value::Int(n) => Ok(n.to_string()),
        Value::Float(f) => Ok(f.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(EvalError::TypeError(other.type_name(), "string")),
    }
}

fn path_component(v: Value, dir: bool) -> Result<Value, EvalError> {
    let text = match &v {
        Value::Path(s) => s.to_string(),
        Value::String(s) => s.to_string(),
        other => return Err(EvalError::TypeError(other.type_name(), "path or string")),
    };
    let trimmed = text.trim_end_matches('/');
    let result = if dir {
        match trimmed.rsplit_once('/') {
            Some((head, _)) if !head.is_empty() => head.to_string(),
            Some(_) => "/".to_string(),
            None => ".".to_string(),
        }
    } else {
        trimmed.rsplit('/').next().unwrap_or(trimmed).to_string()
    };
    Ok(Value::String(Rc::from(result.as_str())))
}

fn eval_map(eval: &Evaluator<'_>, f: &Thunk, list: &Thunk) -> Result<Value, EvalError> {
    let f_value = eval.force(f)?;
    let Value::List(items) = eval.force(list)? else {
        return Err(EvalError::TypeError("not-a-list", "list"));
    };
    let mut out = Vec::with_capacity(items.len());
    for item in items.iter() {
        let mapped = eval.apply(f_value.clone(), item.clone())?;
        out.push(Thunk::forced(mapped));
    }
    Ok(Value::List(Rc::new(out)))
}

fn eval_filter(eval: &Evaluator<'_>, f: &Thunk, list: &Thunk) -> Result<Value, EvalError> {
    let f_value = eval.force(f)?;
    let Value::List(items) = eval.force(list)? else {
        return Err(EvalError::TypeError("not-a-list", "list"));
    };
    let mut out = Vec::new();
    for item in items.iter() {
        let keep = eval.apply(f_value.clone(), item.clone())?;
        match keep {
            Value::Bool(true) => out.push(item.clone()),
            Value::Bool(false) => {}
            other => return Err(EvalError::TypeError(other.type_name(), "bool")),
        }
    }
    Ok(Value::List(Rc::new(out)))
}

fn eval_remove_attrs(eval: &Evaluator<'_>, set: &Thunk, names: &Thunk) -> Result<Value, EvalError> {
    let Value::AttrSet(attrs) = eval.force(set)? else {
        return Err(EvalError::TypeError("not-a-set", "set"));
    };
    let Value::List(names) = eval.force(names)? else {
        return Err(EvalError::TypeError("not-a-list", "list"));
    };
    let mut to_remove = std::collections::HashSet::new();
    for name in names.iter() {
        if let Value::String(s) = eval.force(name)? {
            to_remove.insert(s.to_string());
        }
    }
    let attrs = attrs.attrs.iter().filter(|(k, _)| !to_remove.contains(*k)).map(|(k, v)| (k.clone(), v.clone())).collect();
    Ok(Value::AttrSet(Rc::new(AttrSet { attrs })))
}

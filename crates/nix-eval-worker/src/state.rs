//! Per-worker-process state: the currently evaluated root value (if any)
//! plus the handlers for each RPC method `spec.md` §4.7 names. One
//! `WorkerState` lives for the whole process lifetime of a worker; `main.rs`
//! owns it and calls these handlers from its message loop.

use crate::describe;
use crate::error::EvalError;
use crate::eval::Evaluator;
use crate::value::Value;
use nix_ast::Ast;
use nix_parser_core::Lowered;
use nix_worker_protocol::{
    AttrpathCompleteParams, AttrpathInfoParams, AttrpathInfoResult, EvalExprParams, OptionCompleteParams, OptionDescription, OptionField,
    OptionInfoParams,
};
use std::cell::RefCell;

struct RootState {
    ast: Ast,
    lowered: Lowered,
    value: Value,
}

/// `RefCell`, not `&mut self` handlers: `spec.md` §4.8 has the controller
/// issue requests to a worker by RPC, one at a time over its single piped
/// transport, but the handler signatures here are written against a shared
/// `&WorkerState` so `main.rs`'s loop doesn't need to juggle a mutable
/// borrow across the match arm that also needs to write a reply.
#[derive(Default)]
pub struct WorkerState {
    root: RefCell<Option<RootState>>,
}

impl WorkerState {
    pub fn new() -> Self {
        Self { root: RefCell::new(None) }
    }

    pub fn eval_expr(&self, params: EvalExprParams) -> Result<(), EvalError> {
        let mut out = nix_parser_core::parse(&params.expr);
        let root = out.ast.root().unwrap_or_else(|| out.ast.push(nix_position::Range::empty(nix_position::Cursor::start()), nix_ast::NodeKind::Error));
        let lowered = nix_parser_core::lower(&mut out.ast, root);
        let value = {
            let evaluator = Evaluator::new(&out.ast, &lowered);
            evaluator.eval_root(root)?
        };
        if !matches!(value, Value::AttrSet(_)) {
            return Err(EvalError::TypeError(value.type_name(), "set"));
        }
        *self.root.borrow_mut() = Some(RootState { ast: out.ast, lowered, value });
        Ok(())
    }

    fn with_evaluator<R>(&self, f: impl FnOnce(&Evaluator<'_>, &Value) -> Result<R, EvalError>) -> Result<R, EvalError> {
        let root = self.root.borrow();
        let root = root.as_ref().ok_or(EvalError::NoRoot)?;
        let evaluator = Evaluator::new(&root.ast, &root.lowered);
        f(&evaluator, &root.value)
    }

    pub fn attrpath_info(&self, params: AttrpathInfoParams) -> Result<AttrpathInfoResult, EvalError> {
        self.with_evaluator(|evaluator, root| {
            let value = describe::navigate(evaluator, root, &params.path)?;
            let (package_desc, function_desc, value_desc) = match &value {
                Value::AttrSet(set) if describe::is_package_like(set) => (Some(describe::package_description(set)), None, None),
                Value::Lambda(lambda) => (None, Some(describe::function_description(lambda)), None),
                _ => (None, None, scalar_description(&value)),
            };
            Ok(AttrpathInfoResult { meta: describe::value_meta(&value), package_desc, function_desc, value_desc })
        })
    }

    pub fn attrpath_complete(&self, params: AttrpathCompleteParams) -> Result<Vec<String>, EvalError> {
        self.with_evaluator(|evaluator, root| {
            let scoped = describe::navigate(evaluator, root, &params.scope)?;
            let Value::AttrSet(set) = &scoped else {
                return Err(EvalError::TypeError(scoped.type_name(), "set"));
            };
            Ok(describe::attrpath_complete(set, &params.prefix, &params))
        })
    }

    pub fn option_info(&self, params: OptionInfoParams) -> Result<OptionDescription, EvalError> {
        self.with_evaluator(|evaluator, root| {
            let value = describe::navigate(evaluator, root, &params.path)?;
            let Value::AttrSet(set) = &value else {
                return Err(EvalError::TypeError(value.type_name(), "set"));
            };
            Ok(describe::option_description(set))
        })
    }

    pub fn option_complete(&self, params: OptionCompleteParams) -> Result<Vec<OptionField>, EvalError> {
        self.with_evaluator(|evaluator, root| {
            let scoped = describe::navigate(evaluator, root, &params.scope)?;
            let Value::AttrSet(set) = &scoped else {
                return Err(EvalError::TypeError(scoped.type_name(), "set"));
            };
            Ok(describe::option_complete(set, &params))
        })
    }
}

fn scalar_description(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(format!("\"{s}\"")),
        Value::Path(s) => Some(s.to_string()),
        Value::Int(n) => Some(n.to_string()),
        Value::Float(f) => Some(f.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some("null".to_string()),
        Value::List(items) => Some(format!("[ {} items ]", items.len())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eval_expr_rejects_a_non_attrset_root() {
        let state = WorkerState::new();
        let err = state.eval_expr(EvalExprParams { expr: "1 + 1".to_string() }).unwrap_err();
        assert!(matches!(err, EvalError::TypeError(_, "set")));
    }

    #[test]
    fn attrpath_info_before_eval_expr_is_no_root() {
        let state = WorkerState::new();
        let err = state.attrpath_info(AttrpathInfoParams { path: vec!["a".to_string()] }).unwrap_err();
        assert!(matches!(err, EvalError::NoRoot));
    }

    #[test]
    fn round_trip_through_eval_and_attrpath_info() {
        let state = WorkerState::new();
        state.eval_expr(EvalExprParams { expr: "{ a = { b = 42; }; }".to_string() }).expect("evaluates");
        let info = state.attrpath_info(AttrpathInfoParams { path: vec!["a".to_string(), "b".to_string()] }).expect("path resolves");
        assert_eq!(info.value_desc.as_deref(), Some("42"));
    }

    #[test]
    fn attrpath_complete_lists_names_under_scope() {
        let state = WorkerState::new();
        state.eval_expr(EvalExprParams { expr: "{ hello = 1; help = 2; world = 3; }".to_string() }).expect("evaluates");
        let names =
            state.attrpath_complete(AttrpathCompleteParams { scope: vec![], prefix: "he".to_string(), max_items: None }).expect("completes");
        assert_eq!(names, vec!["hello".to_string(), "help".to_string()]);
    }

    #[test]
    fn attrpath_complete_caps_at_max_items() {
        let state = WorkerState::new();
        state.eval_expr(EvalExprParams { expr: "{ a = 1; b = 2; c = 3; }".to_string() }).expect("evaluates");
        let names =
            state.attrpath_complete(AttrpathCompleteParams { scope: vec![], prefix: String::new(), max_items: Some(2) }).expect("completes");
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn package_like_set_reports_a_package_desc() {
        let state = WorkerState::new();
        state
            .eval_expr(EvalExprParams { expr: "{ hello = { pname = \"hello\"; version = \"2.12\"; meta = { description = \"A test\"; }; }; }".to_string() })
            .expect("evaluates");
        let info = state.attrpath_info(AttrpathInfoParams { path: vec!["hello".to_string()] }).expect("path resolves");
        let desc = info.package_desc.expect("package-like set produces a package_desc");
        assert_eq!(desc.pname.as_deref(), Some("hello"));
        assert_eq!(desc.description.as_deref(), Some("A test"));
    }

    #[test]
    fn option_info_reads_the_description_convention() {
        let state = WorkerState::new();
        state
            .eval_expr(EvalExprParams {
                expr: "{ services = { nginx = { enable = { description = \"Enable nginx.\"; type = \"bool\"; example = true; }; }; }; }".to_string(),
            })
            .expect("evaluates");
        let desc = state
            .option_info(OptionInfoParams { path: vec!["services".to_string(), "nginx".to_string(), "enable".to_string()] })
            .expect("path resolves");
        assert_eq!(desc.description.as_deref(), Some("Enable nginx."));
        assert_eq!(desc.example.as_deref(), Some("true"));
    }

    #[test]
    fn rec_attrs_resolve_sibling_references() {
        let state = WorkerState::new();
        state.eval_expr(EvalExprParams { expr: "rec { a = 1; b = a + 1; }".to_string() }).expect("evaluates");
        let info = state.attrpath_info(AttrpathInfoParams { path: vec!["b".to_string()] }).expect("path resolves");
        assert_eq!(info.value_desc.as_deref(), Some("2"));
    }
}

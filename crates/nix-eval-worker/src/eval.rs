//! A tree-walking evaluator over `nix-parser-core`'s `Ast`/`Lowered` model.
//!
//! `spec.md` §4.7 describes an attribute-set worker that evaluates real Nix
//! expressions (including `import <nixpkgs> {}`), but no embedded Nix
//! evaluator crate exists anywhere in this workspace's reach. Rather than
//! leave the worker subsystem unbuilt, this is a small evaluator written
//! from scratch for the subset of the language the parser already models:
//! arithmetic, strings, lists, attribute sets (static and `rec`), `let`,
//! `with`, `if`/`assert`, lambdas and application, and a handful of
//! builtins. `import`, `fetchTarball` and `fetchGit` are deliberately
//! unsupported (`EvalError::ImportUnsupported`) since there is no
//! filesystem/network evaluation story here — this is disclosed in
//! `DESIGN.md` rather than silently passed off as complete.

use crate::error::EvalError;
use crate::value::{child_env, child_env_rec, root_env, with_env, Env, FormalValue, LambdaArgValue, LambdaValue, Thunk, Value};
use nix_ast::{AttrName, Ast, BinOpKind, LambdaArg, NodeId, NodeKind, UnaryOpKind};
use nix_parser_core::Lowered;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::value::AttrSet;

pub struct Evaluator<'a> {
    pub ast: &'a Ast,
    pub lowered: &'a Lowered,
}

impl<'a> Evaluator<'a> {
    pub fn new(ast: &'a Ast, lowered: &'a Lowered) -> Self {
        Self { ast, lowered }
    }

    pub fn eval_root(&self, root: NodeId) -> Result<Value, EvalError> {
        self.eval(root, root_env())
    }

    pub fn force(&self, thunk: &Thunk) -> Result<Value, EvalError> {
        match thunk.take_pending()? {
            None => Ok(thunk.forced_value().expect("take_pending returned None only when already forced")),
            Some((expr, env)) => {
                let value = self.eval(expr, env)?;
                thunk.store(value.clone());
                Ok(value)
            }
        }
    }

    fn eval(&self, id: NodeId, env: Env) -> Result<Value, EvalError> {
        match &self.ast.get(id).kind {
            NodeKind::Int(n) => Ok(Value::Int(*n)),
            NodeKind::Float(f) => Ok(Value::Float(*f)),
            NodeKind::Str(parts) | NodeKind::IndString(parts) => self.eval_interpolated_string(parts, &env),
            NodeKind::Path(parts) => self.eval_interpolated_string(parts, &env).map(|v| match v {
                Value::String(s) => Value::Path(s),
                other => other,
            }),
            NodeKind::SearchPath(p) => Ok(Value::Path(Rc::from(format!("<{p}>").as_str()))),
            NodeKind::Uri(u) => Ok(Value::String(Rc::from(u.as_str()))),
            NodeKind::Var(name) => self.lookup(name, &env),
            NodeKind::Select { expr, path, or_default } => self.eval_select(*expr, path, *or_default, env),
            NodeKind::Call { func, arg } => {
                let f = self.eval(*func, env.clone())?;
                let arg_thunk = Thunk::unforced(*arg, env);
                self.apply(f, arg_thunk)
            }
            NodeKind::List(items) => {
                let thunks = items.iter().map(|item| Thunk::unforced(*item, env.clone())).collect();
                Ok(Value::List(Rc::new(thunks)))
            }
            NodeKind::Attrs { rec, .. } => self.eval_attrs(id, *rec, &env),
            NodeKind::Lambda { arg, body } => Ok(Value::Lambda(Rc::new(LambdaValue { arg: lower_arg(arg), body: *body, env }))),
            NodeKind::Let { body, .. } => {
                let scope_env = self.build_rec_scope(id, &env);
                self.eval(*body, scope_env)
            }
            NodeKind::With { expr, body } => {
                let source = Thunk::unforced(*expr, env.clone());
                self.eval(*body, with_env(&env, source))
            }
            NodeKind::If { cond, then_branch, else_branch } => {
                if self.eval_bool(*cond, env.clone())? {
                    self.eval(*then_branch, env)
                } else {
                    self.eval(*else_branch, env)
                }
            }
            NodeKind::Assert { cond, body } => {
                if self.eval_bool(*cond, env.clone())? {
                    self.eval(*body, env)
                } else {
                    Err(EvalError::AssertionFailed)
                }
            }
            NodeKind::ParenExpr { inner: Some(inner), .. } => self.eval(*inner, env),
            NodeKind::ParenExpr { inner: None, .. } => Err(EvalError::Unparseable(id)),
            NodeKind::BinOp { op, lhs, rhs } => self.eval_binop(*op, *lhs, *rhs, env),
            NodeKind::UnaryOp { op, operand } => self.eval_unary(*op, *operand, env),
            NodeKind::Error => Err(EvalError::Unparseable(id)),
        }
    }

    fn eval_interpolated_string(&self, parts: &[nix_ast::InterpolPart], env: &Env) -> Result<Value, EvalError> {
        use nix_ast::InterpolPart;
        if let [InterpolPart::Escaped(s)] = parts {
            return Ok(Value::String(Rc::from(s.as_str())));
        }
        if parts.is_empty() {
            return Ok(Value::String(Rc::from("")));
        }
        let mut out = String::new();
        for part in parts {
            match part {
                InterpolPart::Escaped(s) => out.push_str(s),
                InterpolPart::Interpolation(expr) => out.push_str(&self.to_display_string(self.eval(*expr, env.clone())?)?),
            }
        }
        Ok(Value::String(Rc::from(out.as_str())))
    }

    fn to_display_string(&self, v: Value) -> Result<String, EvalError> {
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

    fn lookup(&self, name: &str, env: &Env) -> Result<Value, EvalError> {
        let mut frame = env;
        let mut nearest_with: Option<Thunk> = None;
        loop {
            if let Some(source) = &frame.with_source {
                if nearest_with.is_none() {
                    nearest_with = Some(source.clone());
                }
            } else if let Some(thunk) = frame.bindings.borrow().get(name) {
                return self.force(thunk);
            }
            match &frame.parent {
                Some(parent) => frame = parent,
                None => break,
            }
        }
        if let Some(source) = nearest_with {
            let set = self.force(&source)?;
            if let Value::AttrSet(attrs) = &set {
                if let Some(thunk) = attrs.attrs.get(name) {
                    return self.force(thunk);
                }
            }
        }
        if let Some(builtin) = crate::builtins::lookup_global(name) {
            return Ok(builtin);
        }
        Err(EvalError::UndefinedVariable(name.to_string()))
    }

    fn eval_bool(&self, id: NodeId, env: Env) -> Result<bool, EvalError> {
        match self.eval(id, env)? {
            Value::Bool(b) => Ok(b),
            other => Err(EvalError::TypeError(other.type_name(), "bool")),
        }
    }

    fn eval_select(&self, expr: NodeId, path: &[AttrName], or_default: Option<NodeId>, env: Env) -> Result<Value, EvalError> {
        let base = self.eval(expr, env.clone());
        let result = (|| {
            let mut current = base?;
            for segment in path {
                let key = self.resolve_attr_name(segment, env.clone())?;
                current = match &current {
                    Value::AttrSet(set) => match set.attrs.get(&key) {
                        Some(thunk) => self.force(thunk)?,
                        None => return Err(EvalError::MissingAttr(key)),
                    },
                    other => return Err(EvalError::TypeError(other.type_name(), "set")),
                };
            }
            Ok(current)
        })();
        match (result, or_default) {
            (Ok(v), _) => Ok(v),
            (Err(_), Some(default)) => self.eval(default, env),
            (Err(e), None) => Err(e),
        }
    }

    fn resolve_attr_name(&self, name: &AttrName, env: Env) -> Result<String, EvalError> {
        match name {
            AttrName::Id(s, _) => Ok(s.clone()),
            AttrName::Str(parts, _) => self.to_display_string(self.eval_interpolated_string(parts, &env)?),
            AttrName::Interpolation(expr, _) => self.to_display_string(self.eval(*expr, env)?),
            AttrName::Missing(_) => Err(EvalError::MissingAttr(String::new())),
        }
    }

    /// `lhs ? rhs`: `rhs` is parsed as an ordinary expression subtree (a
    /// chain of `Var`/`Select`) rather than a distinct attrpath grammar, so
    /// this walks that subtree's shape to recover the dotted path instead of
    /// evaluating it as a free-standing expression against `env` — `a ? b.c`
    /// does not look up a variable named `b` in scope.
    fn eval_has_attr(&self, lhs: NodeId, rhs: NodeId, env: Env) -> Result<Value, EvalError> {
        let path = self.has_attr_path(rhs, env.clone())?;
        let mut current = self.eval(lhs, env.clone())?;
        for key in path {
            match &current {
                Value::AttrSet(set) => match set.attrs.get(&key) {
                    Some(thunk) => current = self.force(thunk)?,
                    None => return Ok(Value::Bool(false)),
                },
                _ => return Ok(Value::Bool(false)),
            }
        }
        Ok(Value::Bool(true))
    }

    fn has_attr_path(&self, id: NodeId, env: Env) -> Result<Vec<String>, EvalError> {
        match &self.ast.get(id).kind {
            NodeKind::Var(name) => Ok(vec![name.clone()]),
            NodeKind::Select { expr, path, or_default: None } => {
                let mut segments = self.has_attr_path(*expr, env.clone())?;
                for name in path {
                    segments.push(self.resolve_attr_name(name, env.clone())?);
                }
                Ok(segments)
            }
            _ => Err(EvalError::Unparseable(id)),
        }
    }

    fn eval_binop(&self, op: BinOpKind, lhs: NodeId, rhs: NodeId, env: Env) -> Result<Value, EvalError> {
        use BinOpKind::*;
        if op == Application {
            let f = self.eval(lhs, env.clone())?;
            return self.apply(f, Thunk::unforced(rhs, env));
        }
        if op == And {
            return Ok(Value::Bool(self.eval_bool(lhs, env.clone())? && self.eval_bool(rhs, env)?));
        }
        if op == Or {
            return Ok(Value::Bool(self.eval_bool(lhs, env.clone())? || self.eval_bool(rhs, env)?));
        }
        if op == Impl {
            return Ok(Value::Bool(!self.eval_bool(lhs, env.clone())? || self.eval_bool(rhs, env)?));
        }
        if op == HasAttr {
            return self.eval_has_attr(lhs, rhs, env);
        }
        let l = self.eval(lhs, env.clone())?;
        let r = self.eval(rhs, env)?;
        match op {
            Add | Sub | Mul | Div => self.eval_arith(op, l, r),
            Concat => match (l, r) {
                (Value::List(a), Value::List(b)) => {
                    let mut out = Vec::with_capacity(a.len() + b.len());
                    out.extend(a.iter().cloned());
                    out.extend(b.iter().cloned());
                    Ok(Value::List(Rc::new(out)))
                }
                (other, _) => Err(EvalError::TypeError(other.type_name(), "list")),
            },
            Update => match (l, r) {
                (Value::AttrSet(a), Value::AttrSet(b)) => {
                    let mut attrs = a.attrs.clone();
                    attrs.extend(b.attrs.clone());
                    Ok(Value::AttrSet(Rc::new(AttrSet { attrs })))
                }
                (other, _) => Err(EvalError::TypeError(other.type_name(), "set")),
            },
            Eq => Ok(Value::Bool(values_equal(&l, &r))),
            Neq => Ok(Value::Bool(!values_equal(&l, &r))),
            Lt | Le | Gt | Ge => self.eval_compare(op, l, r),
            _ => unreachable!("handled above"),
        }
    }

    fn eval_arith(&self, op: BinOpKind, l: Value, r: Value) -> Result<Value, EvalError> {
        use BinOpKind::*;
        if let (Value::String(a), Value::String(b)) = (&l, &r) {
            if op == Add {
                return Ok(Value::String(Rc::from(format!("{a}{b}").as_str())));
            }
        }
        match (numeric(&l), numeric(&r)) {
            (Some(Number::Int(a)), Some(Number::Int(b))) => match op {
                Add => Ok(Value::Int(a.wrapping_add(b))),
                Sub => Ok(Value::Int(a.wrapping_sub(b))),
                Mul => Ok(Value::Int(a.wrapping_mul(b))),
                Div if b == 0 => Err(EvalError::DivisionByZero),
                Div => Ok(Value::Int(a / b)),
                _ => unreachable!(),
            },
            (Some(a), Some(b)) => {
                let (a, b) = (a.as_f64(), b.as_f64());
                match op {
                    Add => Ok(Value::Float(a + b)),
                    Sub => Ok(Value::Float(a - b)),
                    Mul => Ok(Value::Float(a * b)),
                    Div if b == 0.0 => Err(EvalError::DivisionByZero),
                    Div => Ok(Value::Float(a / b)),
                    _ => unreachable!(),
                }
            }
            _ => Err(EvalError::TypeError(l.type_name(), "number")),
        }
    }

    fn eval_compare(&self, op: BinOpKind, l: Value, r: Value) -> Result<Value, EvalError> {
        use BinOpKind::*;
        let (a, b) = match (numeric(&l), numeric(&r)) {
            (Some(a), Some(b)) => (a.as_f64(), b.as_f64()),
            _ => return Err(EvalError::TypeError(l.type_name(), "number")),
        };
        Ok(Value::Bool(match op {
            Lt => a < b,
            Le => a <= b,
            Gt => a > b,
            Ge => a >= b,
            _ => unreachable!(),
        }))
    }

    fn eval_unary(&self, op: UnaryOpKind, operand: NodeId, env: Env) -> Result<Value, EvalError> {
        match op {
            UnaryOpKind::Not => Ok(Value::Bool(!self.eval_bool(operand, env)?)),
            UnaryOpKind::Negate => match self.eval(operand, env)? {
                Value::Int(n) => Ok(Value::Int(-n)),
                Value::Float(f) => Ok(Value::Float(-f)),
                other => Err(EvalError::TypeError(other.type_name(), "number")),
            },
        }
    }

    pub(crate) fn apply(&self, f: Value, arg: Thunk) -> Result<Value, EvalError> {
        match f {
            Value::Lambda(lambda) => {
                let env = self.bind_lambda_arg(&lambda, arg)?;
                self.eval(lambda.body, env)
            }
            Value::Primop(name) => crate::builtins::call(self, name, &[arg]),
            Value::PartialPrimop(name, first) => crate::builtins::call(self, name, &[first, arg]),
            other => Err(EvalError::TypeError(other.type_name(), "function")),
        }
    }

    fn bind_lambda_arg(&self, lambda: &LambdaValue, arg: Thunk) -> Result<Env, EvalError> {
        let mut bindings = FxHashMap::default();
        match &lambda.arg {
            LambdaArgValue::Simple(name) => {
                bindings.insert(name.clone(), arg);
            }
            LambdaArgValue::Formals { formals, alias, .. } => {
                let forced = self.force(&arg)?;
                let Value::AttrSet(set) = &forced else {
                    return Err(EvalError::TypeError(forced.type_name(), "set"));
                };
                for formal in formals {
                    match set.attrs.get(&formal.name) {
                        Some(thunk) => {
                            bindings.insert(formal.name.clone(), thunk.clone());
                        }
                        None => match formal.default {
                            Some(default_expr) => {
                                bindings.insert(formal.name.clone(), Thunk::unforced(default_expr, lambda.env.clone()));
                            }
                            None => return Err(EvalError::MissingAttr(formal.name.clone())),
                        },
                    }
                }
                if let Some(alias_name) = alias {
                    bindings.insert(alias_name.clone(), arg);
                }
            }
        }
        Ok(child_env(&lambda.env, bindings))
    }

    /// Builds the scope a `Let` or `rec` `Attrs` introduces: every binding's
    /// thunk closes over the *same* environment it's a member of, which is
    /// what lets `rec { a = 1; b = a; }` and `let a = 1; in a` both resolve
    /// sibling references without a second evaluation pass.
    fn build_rec_scope(&self, id: NodeId, env: &Env) -> Env {
        let Some(sema) = self.lowered.get(id) else { return env.clone() };
        let scope = child_env_rec(env);
        let bindings = self.thunks_from_sema(sema, &scope);
        *scope.bindings.borrow_mut() = bindings;
        scope
    }

    fn thunks_from_sema(&self, sema: &nix_ast::SemaAttrs, scope_env: &Env) -> FxHashMap<String, Thunk> {
        use nix_ast::AttrBodyValue;
        let mut bindings = FxHashMap::default();
        for (name, body) in &sema.static_attrs {
            let thunk = match &body.value {
                AttrBodyValue::Evaluable(expr) => Thunk::unforced(*expr, scope_env.clone()),
                AttrBodyValue::Nested(nested) => {
                    let nested_bindings = self.thunks_from_sema(nested, scope_env);
                    Thunk::forced(Value::AttrSet(Rc::new(AttrSet { attrs: to_btree(nested_bindings) })))
                }
            };
            bindings.insert(name.clone(), thunk);
        }
        bindings
    }

    fn eval_attrs(&self, id: NodeId, rec: bool, env: &Env) -> Result<Value, EvalError> {
        let Some(sema) = self.lowered.get(id) else {
            return Ok(Value::AttrSet(Rc::new(AttrSet::default())));
        };
        if rec {
            let scope = child_env_rec(env);
            let bindings = self.thunks_from_sema(sema, &scope);
            *scope.bindings.borrow_mut() = bindings.clone();
            return Ok(Value::AttrSet(Rc::new(AttrSet { attrs: to_btree(bindings) })));
        }
        let bindings = self.thunks_from_sema(sema, env);
        Ok(Value::AttrSet(Rc::new(AttrSet { attrs: to_btree(bindings) })))
    }
}

fn to_btree(map: FxHashMap<String, Thunk>) -> BTreeMap<String, Thunk> {
    map.into_iter().collect()
}

fn lower_arg(arg: &LambdaArg) -> LambdaArgValue {
    match arg {
        LambdaArg::Simple(name, _) => LambdaArgValue::Simple(name.clone()),
        LambdaArg::Formals { formals, ellipsis, alias } => LambdaArgValue::Formals {
            formals: formals.iter().map(|f| FormalValue { name: f.name.clone(), default: f.default }).collect(),
            ellipsis: *ellipsis,
            alias: alias.as_ref().map(|(name, _)| name.clone()),
        },
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => x == y,
        (Value::Float(x), Value::Float(y)) => x == y,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Null, Value::Null) => true,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Path(x), Value::Path(y)) => x == y,
        (Value::List(x), Value::List(y)) => {
            x.len() == y.len()
                && x.iter().zip(y.iter()).all(|(xt, yt)| match (xt.forced_value(), yt.forced_value()) {
                    (Some(xv), Some(yv)) => values_equal(&xv, &yv),
                    _ => false,
                })
        }
        _ => false,
    }
}

enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn as_f64(&self) -> f64 {
        match self {
            Number::Int(n) => *n as f64,
            Number::Float(f) => *f,
        }
    }
}

fn numeric(v: &Value) -> Option<Number> {
    match v {
        Value::Int(n) => Some(Number::Int(*n)),
        Value::Float(f) => Some(Number::Float(*f)),
        _ => None,
    }
}

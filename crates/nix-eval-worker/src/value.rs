//! Runtime values and the lazy-thunk cell they're wrapped in.
//!
//! Evaluation is call-by-need, not eager: `rec { a = 1; b = a; }` and
//! self-referential `let` bindings both require a binding's evaluation to
//! see its own scope's other bindings before any of them are forced.
//! `Thunk` is the same "unevaluated expr + closed-over env, then cached
//! result" cell real Nix implementations use, built from scratch here since
//! none of `nix-parser-core`'s existing types own an environment.

use crate::error::EvalError;
use nix_ast::NodeId;
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

#[derive(Clone)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
    String(Rc<str>),
    Path(Rc<str>),
    List(Rc<Vec<Thunk>>),
    AttrSet(Rc<AttrSet>),
    Lambda(Rc<LambdaValue>),
    Primop(&'static str),
    /// A builtin that still needs more arguments, e.g. `map` after it has
    /// only been given its function argument. `nix-eval-worker` doesn't
    /// model arbitrary-arity currying generally (lambdas close over a
    /// `LambdaValue` instead); this one variant covers the handful of
    /// 2-argument builtins this worker implements.
    PartialPrimop(&'static str, Thunk),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Null => "null",
            Value::String(_) => "string",
            Value::Path(_) => "path",
            Value::List(_) => "list",
            Value::AttrSet(_) => "set",
            Value::Lambda(_) => "lambda",
            Value::Primop(_) | Value::PartialPrimop(..) => "primop",
        }
    }
}

/// An attribute set value: static keys in lexicographic order (matching
/// `SemaAttrs::static_attrs`'s `BTreeMap`, which `attrpathComplete` depends
/// on for ordering) plus whatever dynamic keys were resolved at eval time.
#[derive(Default)]
pub struct AttrSet {
    pub attrs: BTreeMap<String, Thunk>,
}

pub struct LambdaValue {
    pub arg: LambdaArgValue,
    pub body: NodeId,
    pub env: Env,
}

pub enum LambdaArgValue {
    Simple(String),
    Formals { formals: Vec<FormalValue>, ellipsis: bool, alias: Option<String> },
}

pub struct FormalValue {
    pub name: String,
    pub default: Option<NodeId>,
}

/// A lexical scope frame: one set of name -> thunk bindings plus a parent
/// link. Mirrors `nix-semantic-analyzer::vla::Scope`'s chain shape, kept
/// separate since the evaluator's scope carries live values, not lookup
/// results.
pub struct ScopeFrame {
    /// `RefCell`, not a plain map: a `rec`/`let` scope's bindings each
    /// close over this very frame (so sibling references resolve), which
    /// means the frame has to exist before its own bindings do. See
    /// [`child_env_rec`].
    pub bindings: RefCell<FxHashMap<String, Thunk>>,
    pub parent: Option<Env>,
    /// Set only for a `with expr; body` frame: names not found in
    /// `bindings` (always empty for a `with` frame) fall back to selecting
    /// out of this attribute set, per `spec.md` §4.4's `from-with`
    /// resolution — evaluated the same way variable lookup resolves it,
    /// just against real values instead of static names.
    pub with_source: Option<Thunk>,
}

pub type Env = Rc<ScopeFrame>;

pub fn root_env() -> Env {
    Rc::new(ScopeFrame { bindings: RefCell::new(FxHashMap::default()), parent: None, with_source: None })
}

pub fn child_env(parent: &Env, bindings: FxHashMap<String, Thunk>) -> Env {
    Rc::new(ScopeFrame { bindings: RefCell::new(bindings), parent: Some(Rc::clone(parent)), with_source: None })
}

/// An empty scope frame a caller can populate after the fact (via
/// `frame.bindings.borrow_mut()`) once it has built thunks that close over
/// this very frame.
pub fn child_env_rec(parent: &Env) -> Env {
    Rc::new(ScopeFrame { bindings: RefCell::new(FxHashMap::default()), parent: Some(Rc::clone(parent)), with_source: None })
}

pub fn with_env(parent: &Env, source: Thunk) -> Env {
    Rc::new(ScopeFrame { bindings: RefCell::new(FxHashMap::default()), parent: Some(Rc::clone(parent)), with_source: Some(source) })
}

enum ThunkState {
    Unforced(NodeId, Env),
    /// Already-built value, not tied to any expression (synthesized
    /// bindings like `inherit`'s desugared `Select`, or builtin values).
    Forced(Value),
    /// Currently being forced; re-entering means infinite recursion
    /// (`let x = x; in x`).
    Blackhole,
}

#[derive(Clone)]
pub struct Thunk(Rc<RefCell<ThunkState>>);

impl Thunk {
    pub fn unforced(expr: NodeId, env: Env) -> Self {
        Self(Rc::new(RefCell::new(ThunkState::Unforced(expr, env))))
    }

    pub fn forced(value: Value) -> Self {
        Self(Rc::new(RefCell::new(ThunkState::Forced(value))))
    }

    /// Takes the pending expression out, leaving a blackhole behind so a
    /// cyclic reference forces an error instead of overflowing the stack.
    /// Returns `None` if the thunk is already forced or already entered.
    pub fn take_pending(&self) -> Result<Option<(NodeId, Env)>, EvalError> {
        let mut state = self.0.borrow_mut();
        match &*state {
            ThunkState::Forced(_) => Ok(None),
            ThunkState::Blackhole => Err(EvalError::InfiniteRecursion),
            ThunkState::Unforced(expr, env) => {
                let pending = (*expr, env.clone());
                *state = ThunkState::Blackhole;
                Ok(Some(pending))
            }
        }
    }

    pub fn store(&self, value: Value) {
        *self.0.borrow_mut() = ThunkState::Forced(value);
    }

    pub fn forced_value(&self) -> Option<Value> {
        match &*self.0.borrow() {
            ThunkState::Forced(v) => Some(v.clone()),
            _ => None,
        }
    }
}

//! Arena-owned CST nodes.
//!
//! Every node carries a [`Range`]; children are referenced by [`NodeId`], not
//! by ownership, so the tree can have a parent-map side table built over it
//! without any node borrowing or owning its parent.

use nix_position::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
pub struct NodeData {
    pub range: Range,
    pub kind: NodeKind,
}

/// A sequence of literal-text/interpolation fragments, used by both strings
/// and paths (`spec.md` §3: "a finite sequence of `Escaped(string) |
/// Interpolation(Expr)`").
#[derive(Debug, Clone, PartialEq)]
pub enum InterpolPart {
    Escaped(String),
    Interpolation(NodeId),
}

/// `ID | String | Interpolation`. `is_static()` iff `Id` or a literal
/// `String` (a string with a single `Escaped` fragment and no interpolation).
#[derive(Debug, Clone, PartialEq)]
pub enum AttrName {
    Id(String, Range),
    Str(Vec<InterpolPart>, Range),
    Interpolation(NodeId, Range),
    /// Parser error-recovery placeholder: a dot was consumed but no name
    /// followed (`a.b.`). Carries the position the name was expected at.
    Missing(Range),
}

impl AttrName {
    pub fn range(&self) -> Range {
        match self {
            AttrName::Id(_, r) | AttrName::Str(_, r) | AttrName::Interpolation(_, r) | AttrName::Missing(r) => *r,
        }
    }

    pub fn is_static(&self) -> bool {
        match self {
            AttrName::Id(..) => true,
            AttrName::Str(parts, _) => matches!(parts.as_slice(), [InterpolPart::Escaped(_)] | []),
            AttrName::Interpolation(..) | AttrName::Missing(_) => false,
        }
    }

    /// The static key text, if `is_static()`.
    pub fn static_name(&self) -> Option<&str> {
        match self {
            AttrName::Id(name, _) => Some(name.as_str()),
            AttrName::Str(parts, _) => match parts.as_slice() {
                [InterpolPart::Escaped(s)] => Some(s.as_str()),
                [] => Some(""),
                _ => None,
            },
            _ => None,
        }
    }
}

pub type AttrPath = Vec<AttrName>;

#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub path: AttrPath,
    /// `None` when parsing recovered from a binding missing its `= value;`.
    pub value: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Inherit {
    /// `inherit (expr) names;` vs. bare `inherit names;`.
    pub expr: Option<NodeId>,
    pub names: Vec<AttrName>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BindOrInherit {
    Binding(Binding),
    Inherit(Inherit),
}

pub type Binds = Vec<BindOrInherit>;

#[derive(Debug, Clone, PartialEq)]
pub enum LambdaArg {
    /// `x: body`
    Simple(String, Range),
    /// `{ a, b ? default, ... }: body`, with an optional `@name` alias bound
    /// to either side of the formal set.
    Formals { formals: Vec<Formal>, ellipsis: bool, alias: Option<(String, Range)> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Formal {
    pub name: String,
    pub range: Range,
    pub default: Option<NodeId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOpKind {
    Concat,
    Add,
    Sub,
    Mul,
    Div,
    Update,
    Eq,
    Neq,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Impl,
    HasAttr,
    Application,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOpKind {
    Negate,
    Not,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Int(i64),
    Float(f64),
    Str(Vec<InterpolPart>),
    /// Indented string (`''...''`). The parser stores raw, un-dedented
    /// fragments; lowering rewrites this node's parts in place via
    /// `dedent_indented_string` before any analysis sees it.
    IndString(Vec<InterpolPart>),
    Path(Vec<InterpolPart>),
    SearchPath(String),
    Uri(String),
    Var(String),
    Select {
        expr: NodeId,
        path: AttrPath,
        /// `a.b or default`
        or_default: Option<NodeId>,
    },
    Call {
        func: NodeId,
        arg: NodeId,
    },
    List(Vec<NodeId>),
    Attrs {
        rec: bool,
        binds: Binds,
    },
    Lambda {
        arg: LambdaArg,
        body: NodeId,
    },
    Let {
        binds: Binds,
        body: NodeId,
    },
    With {
        expr: NodeId,
        body: NodeId,
    },
    If {
        cond: NodeId,
        then_branch: NodeId,
        else_branch: NodeId,
    },
    Assert {
        cond: NodeId,
        body: NodeId,
    },
    /// Keeps both delimiter presence flags so a missing `)` can still be
    /// diagnosed and recovered from (`spec.md` §4.2: "a missing right paren
    /// yields a ParenExpr with a null right delimiter").
    ParenExpr {
        inner: Option<NodeId>,
        has_right_paren: bool,
    },
    BinOp {
        op: BinOpKind,
        lhs: NodeId,
        rhs: NodeId,
    },
    UnaryOp {
        op: UnaryOpKind,
        operand: NodeId,
    },
    /// A node that could not be parsed at all; keeps its span so ranges
    /// stay contiguous even through unrecoverable input.
    Error,
}

impl NodeKind {
    pub fn is_expr(&self) -> bool {
        // Every variant here is an expression kind in this language; the
        // predicate exists because the parent map (`upExpr`) is written
        // against a general "is this an expression node" test, matching the
        // source grammar's node taxonomy where some nodes (formals, binds)
        // are not expressions. All `NodeKind` variants currently represent
        // expressions; attr paths/bindings live outside the arena as plain
        // data attached to `Attrs`/`Let`/`Select`.
        true
    }
}

/// Owns every node in a parsed document by index.
#[derive(Debug, Clone, Default)]
pub struct Ast {
    nodes: Vec<NodeData>,
    root: Option<NodeId>,
}

impl Ast {
    pub fn new() -> Self {
        Self { nodes: Vec::new(), root: None }
    }

    pub fn push(&mut self, range: Range, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData { range, kind });
        id
    }

    pub fn set_root(&mut self, id: NodeId) {
        self.root = Some(id);
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn get(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }

    /// Mutable access for rewriting a node's kind in place (lowering's
    /// indented-string dedent is the only pass that needs this post-parse).
    pub fn get_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The innermost node (starting from `root`) whose range contains
    /// `offset`, descending through whichever child's range contains it at
    /// each level. Used by hover/definition/completion to turn an LSP cursor
    /// position into a CST node. Falls back to `root` if `offset` lands
    /// outside every node's range (e.g. trailing whitespace at EOF).
    pub fn node_at_offset(&self, root: NodeId, offset: usize) -> NodeId {
        let mut current = root;
        loop {
            let next = self
                .children(current)
                .into_iter()
                .find(|child| self.get(*child).range.contains_offset(offset) || self.get(*child).range.is_empty() && self.get(*child).range.start.offset == offset);
            match next {
                Some(child) => current = child,
                None => return current,
            }
        }
    }

    /// Direct children of `id`, in document order. Attr-path/binding
    /// sub-expressions (dynamic names, inherit sources, formal defaults) are
    /// included since they are reachable `NodeId`s that need parent-map and
    /// traversal coverage too.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        match &self.get(id).kind {
            NodeKind::Int(_) | NodeKind::Float(_) | NodeKind::Uri(_) | NodeKind::Var(_) | NodeKind::SearchPath(_) | NodeKind::Error => {}
            NodeKind::Str(parts) | NodeKind::IndString(parts) | NodeKind::Path(parts) => {
                push_interp_children(parts, &mut out);
            }
            NodeKind::Select { expr, path, or_default } => {
                out.push(*expr);
                push_attr_path_children(path, &mut out);
                if let Some(d) = or_default {
                    out.push(*d);
                }
            }
            NodeKind::Call { func, arg } => {
                out.push(*func);
                out.push(*arg);
            }
            NodeKind::List(items) => out.extend_from_slice(items),
            NodeKind::Attrs { binds, .. } => push_binds_children(binds, &mut out),
            NodeKind::Lambda { arg, body } => {
                if let LambdaArg::Formals { formals, .. } = arg {
                    for f in formals {
                        if let Some(d) = f.default {
                            out.push(d);
                        }
                    }
                }
                out.push(*body);
            }
            NodeKind::Let { binds, body } => {
                push_binds_children(binds, &mut out);
                out.push(*body);
            }
            NodeKind::With { expr, body } => {
                out.push(*expr);
                out.push(*body);
            }
            NodeKind::If { cond, then_branch, else_branch } => {
                out.push(*cond);
                out.push(*then_branch);
                out.push(*else_branch);
            }
            NodeKind::Assert { cond, body } => {
                out.push(*cond);
                out.push(*body);
            }
            NodeKind::ParenExpr { inner, .. } => {
                if let Some(i) = inner {
                    out.push(*i);
                }
            }
            NodeKind::BinOp { lhs, rhs, .. } => {
                out.push(*lhs);
                out.push(*rhs);
            }
            NodeKind::UnaryOp { operand, .. } => out.push(*operand),
        }
        out
    }
}

fn push_interp_children(parts: &[InterpolPart], out: &mut Vec<NodeId>) {
    for p in parts {
        if let InterpolPart::Interpolation(id) = p {
            out.push(*id);
        }
    }
}

fn push_attr_path_children(path: &AttrPath, out: &mut Vec<NodeId>) {
    for name in path {
        match name {
            AttrName::Str(parts, _) => push_interp_children(parts, out),
            AttrName::Interpolation(id, _) => out.push(*id),
            AttrName::Id(..) | AttrName::Missing(_) => {}
        }
    }
}

fn push_binds_children(binds: &Binds, out: &mut Vec<NodeId>) {
    for b in binds {
        match b {
            BindOrInherit::Binding(binding) => {
                push_attr_path_children(&binding.path, out);
                if let Some(v) = binding.value {
                    out.push(v);
                }
            }
            BindOrInherit::Inherit(inherit) => {
                if let Some(e) = inherit.expr {
                    out.push(e);
                }
                push_attr_path_children(&inherit.names, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix_position::Cursor;

    fn r(a: usize, b: usize) -> Range {
        Range::new(Cursor::new(0, a as u32, a), Cursor::new(0, b as u32, b))
    }

    #[test]
    fn children_of_binop_are_lhs_and_rhs() {
        let mut ast = Ast::new();
        let one = ast.push(r(0, 1), NodeKind::Int(1));
        let two = ast.push(r(4, 5), NodeKind::Int(2));
        let add = ast.push(r(0, 5), NodeKind::BinOp { op: BinOpKind::Add, lhs: one, rhs: two });
        assert_eq!(ast.children(add), vec![one, two]);
    }

    #[test]
    fn attr_name_is_static_for_plain_id() {
        let name = AttrName::Id("a".into(), r(0, 1));
        assert!(name.is_static());
        assert_eq!(name.static_name(), Some("a"));
    }

    #[test]
    fn attr_name_is_dynamic_for_interpolation() {
        let mut ast = Ast::new();
        let inner = ast.push(r(2, 3), NodeKind::Var("x".into()));
        let name = AttrName::Interpolation(inner, r(0, 5));
        assert!(!name.is_static());
    }

    #[test]
    fn node_at_offset_descends_to_the_innermost_match() {
        let mut ast = Ast::new();
        let one = ast.push(r(0, 1), NodeKind::Int(1));
        let two = ast.push(r(4, 5), NodeKind::Int(2));
        let add = ast.push(r(0, 5), NodeKind::BinOp { op: BinOpKind::Add, lhs: one, rhs: two });
        assert_eq!(ast.node_at_offset(add, 4), two);
        assert_eq!(ast.node_at_offset(add, 0), one);
    }

    #[test]
    fn node_at_offset_falls_back_to_root_outside_any_child() {
        let mut ast = Ast::new();
        let one = ast.push(r(0, 1), NodeKind::Int(1));
        assert_eq!(ast.node_at_offset(one, 50), one);
    }
}

//! `spec.md` §4.4: resolve every `Var` node against the scopes enclosing it.

use nix_ast::{AttrBodyValue, Ast, LambdaArg, NodeId, NodeKind, SemaAttrs};
use nix_parser_core::Lowered;
use nix_position::{Cursor, Range};
use rustc_hash::FxHashMap;

use crate::builtins::BUILTIN_NAMES;
use crate::reachability::semantic_children;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionKind {
    /// A `let ... in` binding.
    Let,
    /// A binding inside a `rec { ... }` (non-`rec` attrsets don't scope
    /// their own keys to their values, so they never produce these).
    RecAttrs,
    /// A lambda formal (`{ a, b ? c }: ...`).
    Formal,
    /// A lambda's simple argument or its `@name` alias.
    Arg,
    /// A predefined global (`builtins`, `import`, ...).
    Builtin,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Definition {
    pub name: String,
    pub site: Range,
    pub kind: DefinitionKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    /// Resolved to a concrete binding site.
    Defined,
    /// No static binding found, but a `with` scope was in the chain; the
    /// name is assumed to come from there at runtime.
    FromWith,
    /// No static binding and no enclosing `with` either.
    Undefined,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LookupResult {
    pub kind: LookupKind,
    pub def: Option<Definition>,
    /// Set when `kind == FromWith`: the `With` node whose `with` introduced
    /// the nearest candidate scope.
    pub with_site: Option<NodeId>,
}

#[derive(Debug, Clone, Default)]
pub struct VariableLookup {
    by_node: FxHashMap<NodeId, LookupResult>,
}

impl VariableLookup {
    pub fn get(&self, id: NodeId) -> Option<&LookupResult> {
        self.by_node.get(&id)
    }

    /// Every `Var` node this analysis visited, with its resolved result.
    /// Consumed by `nix-lsp-diagnostics` to synthesize `undefined-variable`
    /// diagnostics without re-walking the tree itself.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &LookupResult)> {
        self.by_node.iter().map(|(id, result)| (*id, result))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScopeKind {
    Root,
    Let,
    RecAttrs,
    Lambda,
    With,
}

struct Scope {
    parent: Option<usize>,
    kind: ScopeKind,
    defs: FxHashMap<String, Definition>,
    /// Set only for `ScopeKind::With`: the `With` node this scope stands in
    /// for, reported back as `LookupResult::with_site`.
    with_site: Option<NodeId>,
}

/// Builds the whole-document scope chain and resolves every `Var` reachable
/// from `root`.
pub fn analyze(ast: &Ast, lowered: &Lowered, root: NodeId) -> VariableLookup {
    let builtin_site = Range::empty(Cursor::start());
    let mut builtin_defs = FxHashMap::default();
    for name in BUILTIN_NAMES {
        builtin_defs.insert((*name).to_string(), Definition { name: (*name).to_string(), site: builtin_site, kind: DefinitionKind::Builtin });
    }
    let mut scopes = vec![Scope { parent: None, kind: ScopeKind::Root, defs: builtin_defs, with_site: None }];
    let mut by_node = FxHashMap::default();
    walk(ast, lowered, root, &mut scopes, 0, &mut by_node);
    VariableLookup { by_node }
}

fn walk(ast: &Ast, lowered: &Lowered, id: NodeId, scopes: &mut Vec<Scope>, current: usize, out: &mut FxHashMap<NodeId, LookupResult>) {
    match &ast.get(id).kind {
        NodeKind::Var(name) => {
            out.insert(id, resolve(scopes, current, name));
        }
        NodeKind::Let { .. } => {
            let defs = sema_defs(lowered.get(id), DefinitionKind::Let);
            let next = push_scope(scopes, current, ScopeKind::Let, defs, None);
            for child in semantic_children(ast, lowered, id) {
                walk(ast, lowered, child, scopes, next, out);
            }
        }
        NodeKind::Attrs { rec, .. } if *rec => {
            let defs = sema_defs(lowered.get(id), DefinitionKind::RecAttrs);
            let next = push_scope(scopes, current, ScopeKind::RecAttrs, defs, None);
            for child in semantic_children(ast, lowered, id) {
                walk(ast, lowered, child, scopes, next, out);
            }
        }
        NodeKind::Lambda { arg, .. } => {
            let mut defs = FxHashMap::default();
            match arg {
                LambdaArg::Simple(name, range) => {
                    defs.insert(name.clone(), Definition { name: name.clone(), site: *range, kind: DefinitionKind::Arg });
                }
                LambdaArg::Formals { formals, alias, .. } => {
                    for formal in formals {
                        defs.insert(
                            formal.name.clone(),
                            Definition { name: formal.name.clone(), site: formal.range, kind: DefinitionKind::Formal },
                        );
                    }
                    if let Some((alias_name, alias_range)) = alias {
                        defs.insert(alias_name.clone(), Definition { name: alias_name.clone(), site: *alias_range, kind: DefinitionKind::Arg });
                    }
                }
            }
            let next = push_scope(scopes, current, ScopeKind::Lambda, defs, None);
            for child in semantic_children(ast, lowered, id) {
                walk(ast, lowered, child, scopes, next, out);
            }
        }
        NodeKind::With { expr, body } => {
            walk(ast, lowered, *expr, scopes, current, out);
            let next = push_scope(scopes, current, ScopeKind::With, FxHashMap::default(), Some(id));
            walk(ast, lowered, *body, scopes, next, out);
        }
        _ => {
            for child in semantic_children(ast, lowered, id) {
                walk(ast, lowered, child, scopes, current, out);
            }
        }
    }
}

fn push_scope(scopes: &mut Vec<Scope>, parent: usize, kind: ScopeKind, defs: FxHashMap<String, Definition>, with_site: Option<NodeId>) -> usize {
    scopes.push(Scope { parent: Some(parent), kind, defs, with_site });
    scopes.len() - 1
}

/// Non-`rec` attrsets don't scope their own keys (`{ a = 1; b = a; }`'s `a`
/// in `b`'s value refers to whatever `a` resolves to outside the set), so
/// only `Let` and `rec` `Attrs` ever call this.
fn sema_defs(sema: Option<&SemaAttrs>, kind: DefinitionKind) -> FxHashMap<String, Definition> {
    let mut defs = FxHashMap::default();
    let Some(sema) = sema else { return defs };
    for (name, body) in &sema.static_attrs {
        defs.insert(name.clone(), Definition { name: name.clone(), site: body.name_node.range(), kind });
    }
    defs
}

fn resolve(scopes: &[Scope], current: usize, name: &str) -> LookupResult {
    let mut cur = current;
    let mut nearest_with = None;
    loop {
        let scope = &scopes[cur];
        if scope.kind == ScopeKind::With {
            if nearest_with.is_none() {
                nearest_with = scope.with_site;
            }
        } else if let Some(def) = scope.defs.get(name) {
            return LookupResult { kind: LookupKind::Defined, def: Some(def.clone()), with_site: None };
        }
        match scope.parent {
            Some(parent) => cur = parent,
            None => break,
        }
    }
    match nearest_with {
        Some(site) => LookupResult { kind: LookupKind::FromWith, def: None, with_site: Some(site) },
        None => LookupResult { kind: LookupKind::Undefined, def: None, with_site: None },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix_ast::NodeKind as K;
    use nix_parser_core::{lower, parse};

    fn analyze_src(src: &str) -> (Ast, Lowered, VariableLookup) {
        let mut out = parse(src);
        let root = out.ast.root().expect("parse always sets a root");
        let lowered = lower(&mut out.ast, root);
        let vla = analyze(&out.ast, &lowered, root);
        (out.ast, lowered, vla)
    }

    fn find_var(ast: &Ast, id: NodeId, name: &str) -> Option<NodeId> {
        if let K::Var(n) = &ast.get(id).kind {
            if n == name {
                return Some(id);
            }
        }
        for child in ast.children(id) {
            if let Some(found) = find_var(ast, child, name) {
                return Some(found);
            }
        }
        None
    }

    #[test]
    fn let_binding_resolves_to_defined() {
        let (ast, _lowered, vla) = analyze_src("let a = 1; in a");
        let root = ast.root().expect("root");
        let var_a = find_var(&ast, root, "a").expect("a is referenced");
        let result = vla.get(var_a).expect("var was visited");
        assert_eq!(result.kind, LookupKind::Defined);
        assert_eq!(result.def.as_ref().map(|d| d.kind), Some(DefinitionKind::Let));
    }

    #[test]
    fn unbound_name_is_undefined() {
        let (ast, _lowered, vla) = analyze_src("someUnboundName");
        let root = ast.root().expect("root");
        let result = vla.get(root).expect("var was visited");
        assert_eq!(result.kind, LookupKind::Undefined);
    }

    #[test]
    fn name_only_reachable_through_with_is_from_with() {
        let (ast, _lowered, vla) = analyze_src("with { a = 1; }; a");
        let root = ast.root().expect("root");
        let var_a = find_var(&ast, root, "a").expect("a is referenced");
        let result = vla.get(var_a).expect("var was visited");
        assert_eq!(result.kind, LookupKind::FromWith);
    }

    #[test]
    fn with_scope_does_not_shadow_an_enclosing_let() {
        let (ast, _lowered, vla) = analyze_src("let a = 1; in with { a = 2; }; a");
        let root = ast.root().expect("root");
        let var_a = find_var(&ast, root, "a").expect("a is referenced");
        let result = vla.get(var_a).expect("var was visited");
        // The static `let a` binding wins over `with`'s dynamic lookup no
        // matter how deep the `with` is nested, since static scopes are
        // always checked before falling back to a `with`.
        assert_eq!(result.kind, LookupKind::Defined);
        assert_eq!(result.def.as_ref().map(|d| d.kind), Some(DefinitionKind::Let));
    }

    #[test]
    fn with_value_expr_is_resolved_outside_its_own_scope() {
        let (ast, _lowered, vla) = analyze_src("let a = {}; in with a; a");
        let root = ast.root().expect("root");
        // Find the `Var("a")` used as the `with` target specifically: it's
        // the first `a` encountered, the `With::expr`.
        let NodeKind::Let { body, .. } = &ast.get(root).kind else { panic!("expected Let") };
        let NodeKind::With { expr, .. } = &ast.get(*body).kind else { panic!("expected With") };
        let result = vla.get(*expr).expect("with's expr is a Var");
        assert_eq!(result.kind, LookupKind::Defined);
    }

    #[test]
    fn non_rec_attrs_does_not_scope_its_own_keys() {
        let (ast, _lowered, vla) = analyze_src("let x = 1; in { a = x; b = a; }");
        let root = ast.root().expect("root");
        let var_a_in_b = find_var(&ast, root, "a").expect("b references a");
        let result = vla.get(var_a_in_b).expect("var was visited");
        // `{ a = x; b = a; }` is not `rec`, so `b`'s `a` is not the sibling
        // key: it's unresolved (no outer `a` binding exists here either).
        assert_eq!(result.kind, LookupKind::Undefined);
    }

    #[test]
    fn rec_attrs_scopes_sibling_keys() {
        let (ast, _lowered, vla) = analyze_src("rec { a = 1; b = a; }");
        let root = ast.root().expect("root");
        let var_a_in_b = find_var(&ast, root, "a").expect("b references a");
        let result = vla.get(var_a_in_b).expect("var was visited");
        assert_eq!(result.kind, LookupKind::Defined);
        assert_eq!(result.def.as_ref().map(|d| d.kind), Some(DefinitionKind::RecAttrs));
    }

    #[test]
    fn formals_can_forward_reference_each_other_in_defaults() {
        let (ast, _lowered, vla) = analyze_src("{ a, b ? a }: b");
        let root = ast.root().expect("root");
        let var_a_in_default = find_var(&ast, root, "a").expect("b's default references a");
        let result = vla.get(var_a_in_default).expect("var was visited");
        assert_eq!(result.kind, LookupKind::Defined);
        assert_eq!(result.def.as_ref().map(|d| d.kind), Some(DefinitionKind::Formal));
    }

    #[test]
    fn inherited_name_resolves_through_the_synthesized_var() {
        let (ast, lowered, vla) = analyze_src("let a = 1; in { inherit a; }");
        let root = ast.root().expect("root");
        let NodeKind::Let { body, .. } = &ast.get(root).kind else { panic!("expected Let") };
        let sema = lowered.get(*body).expect("attrs has a SemaAttrs");
        let AttrBodyValue::Evaluable(synth_var) = sema.static_attrs["a"].value else { panic!("inherit desugars to Evaluable") };
        let result = vla.get(synth_var).expect("synthesized var was visited");
        assert_eq!(result.kind, LookupKind::Defined);
    }
}

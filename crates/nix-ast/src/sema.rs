//! The lowered semantic view of an `Attrs` node (`spec.md` §3, §4.3).
//!
//! `SemaAttrs` borrows `AttrName`s from the AST (by value, since `AttrName`
//! is small and already `Clone`) and owns nested `SemaAttrs` directly —
//! this is the one part of the model that nests structurally rather than
//! through `NodeId`, since a `SemaAttrs` does not correspond to any single
//! CST node once attr-path desugaring has merged multiple `Binding`s into
//! one nested builder.

use crate::ast::AttrName;
use crate::NodeId;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct SemaAttrs {
    pub recursive: bool,
    /// Keyed by the attribute's static name; `BTreeMap` keeps iteration
    /// lexicographically ordered, which `attrpathComplete` wants anyway.
    pub static_attrs: BTreeMap<String, AttrBody>,
    pub dynamic: Vec<DynamicAttr>,
}

impl SemaAttrs {
    pub fn new(recursive: bool) -> Self {
        Self { recursive, static_attrs: BTreeMap::new(), dynamic: Vec::new() }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttrBody {
    pub inherited: bool,
    pub name_node: AttrName,
    pub value: AttrBodyValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttrBodyValue {
    Evaluable(NodeId),
    Nested(Box<SemaAttrs>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DynamicAttr {
    pub key: NodeId,
    pub value: NodeId,
}

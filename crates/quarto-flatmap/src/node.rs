/*
 * node.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The structured tree exchanged with the external (de)serializer.
//!
//! A tree is made of ordered objects, dense arrays and typed leaves. Both the
//! flattener and the rehydrator work exclusively on this representation; how
//! a tree is produced from (or turned back into) a Rust value is the business
//! of a [`TreeCodec`](crate::TreeCodec).

use indexmap::IndexMap;
use rust_decimal::Decimal;

/// A terminal value in the tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Leaf {
    Null,
    Bool(bool),
    Int(i32),
    Long(i64),
    Decimal(Decimal),
    Double(f64),
    String(String),
}

impl Leaf {
    /// Short name of the leaf kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Leaf::Null => "null",
            Leaf::Bool(_) => "bool",
            Leaf::Int(_) => "int",
            Leaf::Long(_) => "long",
            Leaf::Decimal(_) => "decimal",
            Leaf::Double(_) => "double",
            Leaf::String(_) => "string",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Leaf::Null)
    }
}

/// A node of the structured tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Named children, in insertion order.
    Object(IndexMap<String, Node>),

    /// Indexed children. Gaps are filled with `Leaf::Null`.
    Array(Vec<Node>),

    Leaf(Leaf),
}

impl Node {
    pub fn null() -> Self {
        Node::Leaf(Leaf::Null)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Node::Object(_) => "object",
            Node::Array(_) => "array",
            Node::Leaf(leaf) => leaf.kind(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Node::Leaf(Leaf::Null))
    }

    /// Look up a child by object key.
    pub fn get(&self, key: &str) -> Option<&Node> {
        match self {
            Node::Object(map) => map.get(key),
            _ => None,
        }
    }

    /// Look up a child by array index.
    pub fn at(&self, index: usize) -> Option<&Node> {
        match self {
            Node::Array(items) => items.get(index),
            _ => None,
        }
    }
}

impl From<Leaf> for Node {
    fn from(leaf: Leaf) -> Self {
        Node::Leaf(leaf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigation() {
        let mut map = IndexMap::new();
        map.insert(
            "Values".to_string(),
            Node::Array(vec![Node::Leaf(Leaf::Int(1)), Node::null()]),
        );
        let root = Node::Object(map);

        assert_eq!(
            root.get("Values").and_then(|v| v.at(0)),
            Some(&Node::Leaf(Leaf::Int(1)))
        );
        assert!(root.get("Values").and_then(|v| v.at(1)).unwrap().is_null());
        assert_eq!(root.get("Missing"), None);
        assert_eq!(root.at(0), None);
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(Node::Object(IndexMap::new()).kind(), "object");
        assert_eq!(Node::Array(vec![]).kind(), "array");
        assert_eq!(Node::Leaf(Leaf::Double(1.5)).kind(), "double");
    }
}

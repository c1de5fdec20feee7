/*
 * codec.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The boundary between Rust values and [`Node`] trees.
//!
//! The flat-map code never serializes anything itself. It asks a
//! [`TreeCodec`] for a tree and hands rebuilt trees back to it. The default
//! codec goes through `serde_json::Value`, so any `Serialize` /
//! `DeserializeOwned` type works with the usual serde attributes (renames,
//! `skip_serializing_if`, unit enum variants as strings, ...).

use indexmap::IndexMap;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value};

use crate::error::{FlatMapError, FlatMapResult};
use crate::node::{Leaf, Node};

/// Produces trees from values and values from trees.
pub trait TreeCodec {
    /// Turn a value into a tree.
    fn to_tree<T: Serialize + ?Sized>(&self, value: &T) -> FlatMapResult<Node>;

    /// Turn a tree back into a value of type `T`.
    fn from_tree<T: DeserializeOwned>(&self, node: Node) -> FlatMapResult<T>;
}

/// [`TreeCodec`] backed by `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonTreeCodec;

impl TreeCodec for JsonTreeCodec {
    fn to_tree<T: Serialize + ?Sized>(&self, value: &T) -> FlatMapResult<Node> {
        let json =
            serde_json::to_value(value).map_err(|source| FlatMapError::Serialization { source })?;
        Ok(node_from_json(json))
    }

    fn from_tree<T: DeserializeOwned>(&self, node: Node) -> FlatMapResult<T> {
        let json = json_from_node(node, &mut String::new())?;
        serde_json::from_value(json).map_err(|source| FlatMapError::Deserialization {
            target: std::any::type_name::<T>(),
            source,
        })
    }
}

/// Convert a JSON value into a tree.
pub fn node_from_json(value: Value) -> Node {
    match value {
        Value::Null => Node::null(),
        Value::Bool(b) => Node::Leaf(Leaf::Bool(b)),
        Value::Number(n) => Node::Leaf(leaf_from_number(&n)),
        Value::String(s) => Node::Leaf(Leaf::String(s)),
        Value::Array(items) => Node::Array(items.into_iter().map(node_from_json).collect()),
        Value::Object(map) => Node::Object(
            map.into_iter()
                .map(|(k, v)| (k, node_from_json(v)))
                .collect::<IndexMap<_, _>>(),
        ),
    }
}

fn leaf_from_number(n: &Number) -> Leaf {
    if let Some(v) = n.as_i64() {
        match i32::try_from(v) {
            Ok(small) => Leaf::Int(small),
            Err(_) => Leaf::Long(v),
        }
    } else if let Some(v) = n.as_u64() {
        Leaf::Decimal(Decimal::from(v))
    } else {
        Leaf::Double(n.as_f64().unwrap_or(f64::NAN))
    }
}

/// Convert a tree into a JSON value.
///
/// `path` tracks the flat key of the node being converted, for error messages.
pub fn json_from_node(node: Node, path: &mut String) -> FlatMapResult<Value> {
    match node {
        Node::Leaf(leaf) => json_from_leaf(leaf, path),
        Node::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for (i, item) in items.into_iter().enumerate() {
                let len = path.len();
                path.push_str(&format!("[{i}]"));
                out.push(json_from_node(item, path)?);
                path.truncate(len);
            }
            Ok(Value::Array(out))
        }
        Node::Object(members) => {
            let mut out = Map::new();
            for (name, child) in members {
                let len = path.len();
                if !path.is_empty() {
                    path.push(':');
                }
                path.push_str(&name);
                let value = json_from_node(child, path)?;
                path.truncate(len);
                out.insert(name, value);
            }
            Ok(Value::Object(out))
        }
    }
}

fn json_from_leaf(leaf: Leaf, path: &str) -> FlatMapResult<Value> {
    let value = match leaf {
        Leaf::Null => Value::Null,
        Leaf::Bool(b) => Value::Bool(b),
        Leaf::Int(v) => Value::from(v),
        Leaf::Long(v) => Value::from(v),
        Leaf::String(s) => Value::String(s),
        Leaf::Decimal(d) => json_from_decimal(d),
        Leaf::Double(v) => match Number::from_f64(v) {
            Some(n) => Value::Number(n),
            None => {
                return Err(FlatMapError::UnsupportedValueKind {
                    path: path.to_string(),
                    kind: "non-finite double",
                });
            }
        },
    };
    Ok(value)
}

/// Integral decimals become JSON integers so they deserialize into integer
/// fields; everything else becomes a double.
fn json_from_decimal(d: Decimal) -> Value {
    if d.fract().is_zero() {
        if let Some(v) = d.to_i64() {
            return Value::from(v);
        }
        if let Some(v) = d.to_u64() {
            return Value::from(v);
        }
    }
    // Going through the decimal text keeps the double correctly rounded.
    d.to_string()
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/*
 * flatten.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Structured value → flat map.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::codec::{JsonTreeCodec, TreeCodec};
use crate::error::{FlatMapError, FlatMapResult};
use crate::escape::escape_key;
use crate::node::{Leaf, Node};
use crate::typer::stringify_leaf;

/// A flat map of path keys to escaped string values, in tree order.
pub type FlatMap = IndexMap<String, String>;

/// What to do with object members whose value is null.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NullHandling {
    /// Leave null members out of the map.
    #[default]
    Skip,
    /// Write null members as the string `null`.
    Emit,
}

/// Options for [`Flattener`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FlattenOptions {
    pub null_handling: NullHandling,
}

/// Turns values into flat maps using a [`TreeCodec`].
#[derive(Debug, Clone, Default)]
pub struct Flattener<C = JsonTreeCodec> {
    codec: C,
    options: FlattenOptions,
}

impl Flattener<JsonTreeCodec> {
    pub fn new(options: FlattenOptions) -> Self {
        Self::with_codec(JsonTreeCodec, options)
    }
}

impl<C: TreeCodec> Flattener<C> {
    pub fn with_codec(codec: C, options: FlattenOptions) -> Self {
        Self { codec, options }
    }

    pub fn options(&self) -> &FlattenOptions {
        &self.options
    }

    /// Flatten a value. `None` yields an empty map.
    pub fn flatten<T: Serialize + ?Sized>(&self, value: Option<&T>) -> FlatMapResult<FlatMap> {
        let Some(value) = value else {
            return Ok(FlatMap::new());
        };
        let node = self.codec.to_tree(value)?;
        let map = flatten_node(&node, &self.options)?;
        tracing::debug!(entries = map.len(), "Flattened value");
        Ok(map)
    }
}

/// Flatten a tree directly.
///
/// A null root produces an empty map; a scalar root produces a single entry
/// with the empty key.
pub fn flatten_node(node: &Node, options: &FlattenOptions) -> FlatMapResult<FlatMap> {
    let mut map = FlatMap::new();
    if !node.is_null() {
        let mut path = String::new();
        walk(node, &mut path, options, &mut map)?;
    }
    Ok(map)
}

fn walk(
    node: &Node,
    path: &mut String,
    options: &FlattenOptions,
    out: &mut FlatMap,
) -> FlatMapResult<()> {
    match node {
        Node::Object(members) => {
            for (name, child) in members {
                if child.is_null() && options.null_handling == NullHandling::Skip {
                    continue;
                }
                let len = path.len();
                if !path.is_empty() {
                    path.push(':');
                }
                path.push_str(&escape_key(name));
                walk(child, path, options, out)?;
                path.truncate(len);
            }
        }
        Node::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                let len = path.len();
                path.push_str(&format!("[{i}]"));
                walk(item, path, options, out)?;
                path.truncate(len);
            }
        }
        Node::Leaf(leaf) => {
            let text = stringify_leaf(leaf).ok_or_else(|| unsupported(path, leaf))?;
            tracing::trace!(path = %path, value = %text, "Flattened leaf");
            out.insert(path.clone(), text);
        }
    }
    Ok(())
}

fn unsupported(path: &str, leaf: &Leaf) -> FlatMapError {
    FlatMapError::UnsupportedValueKind {
        path: path.to_string(),
        kind: match leaf {
            Leaf::Double(_) => "non-finite double",
            other => other.kind(),
        },
    }
}

/*
 * rehydrate.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Flat map → structured tree → value.
//!
//! Entries are applied one at a time to a tree that starts out empty.
//! Intermediate objects and arrays are created on demand; arrays grow with
//! null placeholders when an index past the end is addressed. Once a path
//! has been bound to one kind of node (leaf, object or array), binding it to
//! another kind is a conflict, whatever the order of the entries.

use indexmap::IndexMap;
use serde::de::DeserializeOwned;

use crate::codec::{JsonTreeCodec, TreeCodec};
use crate::error::{FlatMapError, FlatMapResult};
use crate::node::{Leaf, Node};
use crate::path::{Segment, parse_key};
use crate::typer::parse_leaf;

/// Tree under construction. `Vacant` marks a slot nothing has been written
/// to yet (an array gap, or the root before the first entry).
#[derive(Debug)]
enum Slot {
    Vacant,
    Leaf(Leaf),
    Object(IndexMap<String, Slot>),
    Array(Vec<Slot>),
}

impl Slot {
    fn into_node(self) -> Node {
        match self {
            Slot::Vacant => Node::null(),
            Slot::Leaf(leaf) => Node::Leaf(leaf),
            Slot::Object(members) => Node::Object(
                members
                    .into_iter()
                    .map(|(k, v)| (k, v.into_node()))
                    .collect(),
            ),
            Slot::Array(items) => Node::Array(items.into_iter().map(Slot::into_node).collect()),
        }
    }
}

/// Rebuilds values from flat maps using a [`TreeCodec`].
#[derive(Debug, Clone, Default)]
pub struct Rehydrator<C = JsonTreeCodec> {
    codec: C,
}

impl Rehydrator<JsonTreeCodec> {
    pub fn new() -> Self {
        Self::with_codec(JsonTreeCodec)
    }
}

impl<C: TreeCodec> Rehydrator<C> {
    pub fn with_codec(codec: C) -> Self {
        Self { codec }
    }

    /// Rebuild a value of type `T`. An empty input yields `Ok(None)`.
    pub fn rehydrate<T, I, K, V>(&self, entries: I) -> FlatMapResult<Option<T>>
    where
        T: DeserializeOwned,
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        match build_tree(entries)? {
            Some(node) => self.codec.from_tree(node).map(Some),
            None => Ok(None),
        }
    }
}

/// Rebuild the tree described by a flat map. An empty input yields `Ok(None)`.
pub fn build_tree<I, K, V>(entries: I) -> FlatMapResult<Option<Node>>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut root = Slot::Vacant;
    let mut count = 0usize;
    for (key, value) in entries {
        let key = key.as_ref();
        let segments = parse_key(key)?;
        insert(&mut root, key, &segments, parse_leaf(value.as_ref()))?;
        count += 1;
    }
    tracing::debug!(entries = count, "Rebuilt tree from flat map");

    if count == 0 {
        Ok(None)
    } else {
        Ok(Some(root.into_node()))
    }
}

fn insert(root: &mut Slot, key: &str, segments: &[Segment], leaf: Leaf) -> FlatMapResult<()> {
    let mut cursor = root;
    // Raw text of the segment that produced `cursor`, reported on conflicts.
    let mut owner = "";

    for (position, segment) in segments.iter().enumerate() {
        if position > 0 || segment.has_member() {
            let members = as_object(cursor, key, owner)?;
            cursor = members
                .entry(segment.name.clone())
                .or_insert(Slot::Vacant);
            owner = &segment.raw;
        }
        for &index in &segment.indices {
            let items = as_array(cursor, key, &segment.raw)?;
            if items.len() <= index {
                let len = index
                    .checked_add(1)
                    .ok_or_else(|| FlatMapError::malformed(key, "index is out of range"))?;
                items.resize_with(len, || Slot::Vacant);
            }
            cursor = &mut items[index];
            owner = &segment.raw;
        }
    }

    if matches!(cursor, Slot::Object(_) | Slot::Array(_)) {
        return Err(FlatMapError::conflict(key, owner));
    }
    *cursor = Slot::Leaf(leaf);
    Ok(())
}

fn as_object<'a>(
    slot: &'a mut Slot,
    key: &str,
    owner: &str,
) -> FlatMapResult<&'a mut IndexMap<String, Slot>> {
    if matches!(slot, Slot::Vacant) {
        *slot = Slot::Object(IndexMap::new());
    }
    match slot {
        Slot::Object(members) => Ok(members),
        _ => Err(FlatMapError::conflict(key, owner)),
    }
}

fn as_array<'a>(slot: &'a mut Slot, key: &str, owner: &str) -> FlatMapResult<&'a mut Vec<Slot>> {
    if matches!(slot, Slot::Vacant) {
        *slot = Slot::Array(Vec::new());
    }
    match slot {
        Slot::Array(items) => Ok(items),
        _ => Err(FlatMapError::conflict(key, owner)),
    }
}

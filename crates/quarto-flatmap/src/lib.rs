/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Flat path/value maps to and from structured values.
//!
//! This crate round-trips structured data through flat key-value stores such
//! as environment-style or INI-style configuration sources. A value is
//! flattened into one entry per leaf:
//!
//! - Object members are joined with `:` (`Nested:Value`)
//! - Array elements are addressed with `[i]` (`Values[0]`, `Grid[1][0]`)
//! - Leaves are written culture-invariantly (`42`, `4.3`, `true`, `null`)
//! - `\ : [ ]` are backslash-escaped in keys; values additionally escape
//!   `"`, newline, carriage return and tab
//!
//! Rehydration reverses the process: keys are parsed back into paths, values
//! are typed (`null`, bool, int, long, decimal, double, string), the tree is
//! rebuilt and handed to a [`TreeCodec`] to produce the target type.
//!
//! # Example
//!
//! ```ignore
//! use quarto_flatmap::{flatten, rehydrate};
//!
//! let map = flatten(&settings)?;
//! assert_eq!(map["Servers[0]:Host"], "localhost");
//!
//! let restored: Option<Settings> = rehydrate(&map)?;
//! ```

pub mod codec;
pub mod error;
pub mod escape;
pub mod flatten;
pub mod node;
pub mod path;
pub mod rehydrate;
pub mod typer;

pub use codec::{JsonTreeCodec, TreeCodec};
pub use error::{FlatMapError, FlatMapResult};
pub use escape::{escape_key, escape_value, unescape_key, unescape_value};
pub use flatten::{FlatMap, FlattenOptions, Flattener, NullHandling, flatten_node};
pub use node::{Leaf, Node};
pub use rehydrate::{Rehydrator, build_tree};
pub use typer::{parse_leaf, stringify_leaf};

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Flatten a value with the default options (null members skipped).
pub fn flatten<T: Serialize + ?Sized>(value: &T) -> FlatMapResult<FlatMap> {
    Flattener::new(FlattenOptions::default()).flatten(Some(value))
}

/// Rebuild a value from a flat map. An empty map yields `Ok(None)`.
pub fn rehydrate<T, I, K, V>(entries: I) -> FlatMapResult<Option<T>>
where
    T: DeserializeOwned,
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    Rehydrator::new().rehydrate(entries)
}

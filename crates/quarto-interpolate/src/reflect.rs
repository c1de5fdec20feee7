/*
 * reflect.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Explicit field registry for context objects.
//!
//! Expressions reach into context objects by field name. Rather than
//! inspecting types at runtime, each context type implements [`Reflect`] and
//! registers an accessor per exposed field. The resulting
//! [`TypeDescriptor`] is built once per type and shared process-wide.
//!
//! ```ignore
//! struct Invoice { id: u32, total: Decimal }
//!
//! impl Reflect for Invoice {
//!     fn describe(ty: &mut TypeBuilder<Self>) {
//!         ty.field("Id", |i| i.id).field("Total", |i| i.total);
//!     }
//! }
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, PoisonError, RwLock};

use indexmap::IndexMap;
use once_cell::sync::Lazy;

use crate::value::{TypeName, Value};

/// A type whose fields can be read from expressions.
pub trait Reflect: Any + Send + Sync {
    /// Register the fields exposed to expressions.
    fn describe(ty: &mut TypeBuilder<Self>)
    where
        Self: Sized;
}

type Getter = Box<dyn Fn(&dyn Any) -> Option<Value> + Send + Sync>;

/// Collects the field accessors of a [`Reflect`] type.
pub struct TypeBuilder<T> {
    name: &'static str,
    full_name: &'static str,
    fields: IndexMap<&'static str, Getter>,
    _marker: PhantomData<fn(&T)>,
}

impl<T: Reflect> TypeBuilder<T> {
    fn new() -> Self {
        let full_name = std::any::type_name::<T>();
        Self {
            name: short_type_name(full_name),
            full_name,
            fields: IndexMap::new(),
            _marker: PhantomData,
        }
    }

    /// Override the short name reported by `GetType().Name`.
    pub fn name(&mut self, name: &'static str) -> &mut Self {
        self.name = name;
        self
    }

    /// Expose a field under `name`. Registering a name twice replaces the
    /// earlier accessor.
    pub fn field<V, F>(&mut self, name: &'static str, getter: F) -> &mut Self
    where
        V: Into<Value>,
        F: Fn(&T) -> V + Send + Sync + 'static,
    {
        let getter: Getter = Box::new(move |obj| obj.downcast_ref::<T>().map(|t| getter(t).into()));
        self.fields.insert(name, getter);
        self
    }

    fn build(self) -> TypeDescriptor {
        TypeDescriptor {
            type_id: TypeId::of::<T>(),
            name: self.name,
            full_name: self.full_name,
            fields: self.fields,
        }
    }
}

/// `alloc::vec::Vec<my::Thing>` → `Vec`, `my::config::Settings` → `Settings`.
fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// The registered shape of a [`Reflect`] type.
pub struct TypeDescriptor {
    type_id: TypeId,
    name: &'static str,
    full_name: &'static str,
    fields: IndexMap<&'static str, Getter>,
}

static DESCRIPTORS: Lazy<RwLock<HashMap<TypeId, Arc<TypeDescriptor>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

impl TypeDescriptor {
    /// The shared descriptor for `T`, built on first use.
    pub fn of<T: Reflect>() -> Arc<TypeDescriptor> {
        let id = TypeId::of::<T>();
        if let Some(found) = DESCRIPTORS
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
        {
            return Arc::clone(found);
        }

        // Built outside the lock so `describe` may itself look up other types.
        let mut builder = TypeBuilder::<T>::new();
        T::describe(&mut builder);
        let built = Arc::new(builder.build());

        let mut map = DESCRIPTORS.write().unwrap_or_else(PoisonError::into_inner);
        let entry = map.entry(id).or_insert_with(|| {
            tracing::debug!(type_name = built.full_name, fields = built.fields.len(), "Registered type");
            Arc::clone(&built)
        });
        Arc::clone(entry)
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn full_name(&self) -> &'static str {
        self.full_name
    }

    pub fn type_name(&self) -> TypeName {
        TypeName {
            name: self.name,
            full_name: self.full_name,
        }
    }

    /// Position of a field in registration order.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.get_index_of(name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.keys().copied()
    }

    /// Read the field at `index` from `obj`.
    ///
    /// Returns `None` if the index is unknown or `obj` is not of this type.
    pub fn get_index(&self, index: usize, obj: &dyn Any) -> Option<Value> {
        let (_, getter) = self.fields.get_index(index)?;
        getter(obj)
    }

    /// Read the field called `name` from `obj`.
    pub fn get(&self, name: &str, obj: &dyn Any) -> Option<Value> {
        let getter = self.fields.get(name)?;
        getter(obj)
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("full_name", &self.full_name)
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// A shared, type-erased registered object held inside a [`Value`].
#[derive(Clone)]
pub struct ObjectRef {
    descriptor: Arc<TypeDescriptor>,
    value: Arc<dyn Any + Send + Sync>,
}

impl ObjectRef {
    pub fn new<T: Reflect>(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }

    pub fn from_arc<T: Reflect>(value: Arc<T>) -> Self {
        ObjectRef {
            descriptor: TypeDescriptor::of::<T>(),
            value,
        }
    }

    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    pub fn as_any(&self) -> &dyn Any {
        &*self.value
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.descriptor.get(name, self.as_any())
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectRef({})", self.descriptor.full_name)
    }
}

/// Objects are equal when they are the same shared instance.
impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

/// A borrowed context object paired with its descriptor.
#[derive(Clone)]
pub struct ContextRef<'a> {
    descriptor: Arc<TypeDescriptor>,
    value: &'a dyn Any,
}

impl<'a> ContextRef<'a> {
    pub fn new<T: Reflect>(value: &'a T) -> Self {
        ContextRef {
            descriptor: TypeDescriptor::of::<T>(),
            value,
        }
    }

    pub fn descriptor(&self) -> &Arc<TypeDescriptor> {
        &self.descriptor
    }

    pub fn value(&self) -> &'a dyn Any {
        self.value
    }

    pub fn type_id(&self) -> TypeId {
        self.descriptor.type_id
    }
}

impl fmt::Debug for ContextRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContextRef({})", self.descriptor.full_name)
    }
}

/// Stand-in context used when the caller has no object to evaluate against.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoContext;

impl Reflect for NoContext {
    fn describe(_ty: &mut TypeBuilder<Self>) {}
}

use alloc::{
    collections::BTreeMap,
    string::{String, ToString as _},
};
use tracing::debug;

use crate::{
    any::TypeInfo,
    constructor::{Constructor, ErasedConstructor},
    injectable::Injectable,
    utils::thread_safety::{SendSafety, SyncSafety},
};

#[derive(Clone)]
pub(crate) enum Entry {
    Abstract(TypeInfo),
    Concrete(ErasedConstructor),
}

/// Catalog of constructor descriptors, keyed by type name.
///
/// The container consults it when an id has neither a cached instance nor a pending factory,
/// and the auto-resolver consults it to decide whether a parameter's type is constructible.
#[derive(Default, Clone)]
pub struct Registry {
    entries: BTreeMap<String, Entry>,
}

impl Registry {
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self { entries: BTreeMap::new() }
    }

    /// Registers `T` under its type name
    #[inline]
    #[must_use]
    pub fn register<T: Injectable>(self) -> Self {
        self.provide(T::constructor())
    }

    /// Registers `T` under `name` instead of its type name.
    ///
    /// # Warning
    /// Parameters are matched by type name, so `T` registered only under an alias
    /// isn't considered constructible as a parameter of other types.
    #[inline]
    #[must_use]
    pub fn register_as<T: Injectable>(mut self, name: impl Into<String>) -> Self {
        self.add_entry(name.into(), Entry::Concrete(T::constructor().erase()));
        self
    }

    /// Registers a constructor of `T` under its type name.
    /// Use it for types you can't implement [`Injectable`] for.
    #[inline]
    #[must_use]
    pub fn provide<T: SendSafety + SyncSafety + 'static>(mut self, constructor: Constructor<T>) -> Self {
        let constructor = constructor.erase();
        self.add_entry(constructor.type_info.name.to_string(), Entry::Concrete(constructor));
        self
    }

    /// Declares `T` as known but not instantiable, like a trait object.
    /// Resolving it, directly or as a parameter, fails with [`crate::ResolveErrorKind::NotInstantiable`].
    #[inline]
    #[must_use]
    pub fn declare_abstract<T: ?Sized + 'static>(mut self) -> Self {
        let type_info = TypeInfo::of::<T>();
        self.add_entry(type_info.name.to_string(), Entry::Abstract(type_info));
        self
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Registry {
    fn add_entry(&mut self, name: String, entry: Entry) {
        if self.entries.insert(name, entry).is_some() {
            debug!("Constructor replaced");
        }
    }

    #[inline]
    #[must_use]
    pub(crate) fn get(&self, name: &str) -> Option<&Entry> {
        self.entries.get(name)
    }
}

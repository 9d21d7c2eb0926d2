use alloc::{
    boxed::Box,
    collections::BTreeMap,
    string::{String, ToString as _},
};
use core::{
    any::type_name,
    cell::RefCell,
    fmt::{self, Debug, Formatter},
    mem,
};
use parking_lot::ReentrantMutex;
use tracing::{debug, error, info_span};

use crate::{
    any::TypeInfo,
    errors::ResolveErrorKind,
    registry::Registry,
    resolver::{AutoResolver, Resolved},
    utils::thread_safety::{RcAnyThreadSafety, RcThreadSafety, SendSafety, SyncSafety},
};

#[cfg(feature = "thread_safe")]
type BoxedFactory = Box<dyn FnOnce() -> Instance + Send>;
#[cfg(not(feature = "thread_safe"))]
type BoxedFactory = Box<dyn FnOnce() -> Instance>;

#[derive(Clone)]
struct Instance {
    type_info: TypeInfo,
    value: RcAnyThreadSafety,
}

impl Instance {
    #[inline]
    fn new<T: SendSafety + SyncSafety + 'static>(value: T) -> Self {
        Self {
            type_info: TypeInfo::of::<T>(),
            value: RcThreadSafety::new(value),
        }
    }
}

#[derive(Default)]
struct State {
    factories: BTreeMap<String, BoxedFactory>,
    instances: BTreeMap<String, Instance>,
}

struct ContainerInner {
    registry: Registry,
    state: ReentrantMutex<RefCell<State>>,
}

/// String-keyed container of singletons.
///
/// Every id is either absent, pending (a factory added with [`Self::bind`]) or resolved (a cached instance).
/// An id without both is auto-resolved from the constructor [`Registry`] on [`Self::get`].
///
/// The container is a cheap handle: clones share the same instances and factories.
///
/// # Examples
/// ```rust
/// use autowire::{Container, Registry};
///
/// let container = Container::new(Registry::new());
/// container
///     .bind("greeting", || String::from("hello"))
///     .add("answer", || 42_u32);
///
/// assert!(container.has("greeting"));
/// assert_eq!(*container.get_as::<String>("greeting").unwrap(), "hello");
/// assert_eq!(*container.get_as::<u32>("answer").unwrap(), 42);
/// ```
#[derive(Clone)]
pub struct Container {
    inner: RcThreadSafety<ContainerInner>,
}

impl Container {
    #[inline]
    #[must_use]
    pub fn new(registry: Registry) -> Self {
        Self {
            inner: RcThreadSafety::new(ContainerInner {
                registry,
                state: ReentrantMutex::new(RefCell::new(State::default())),
            }),
        }
    }

    /// Constructor registry used for auto-resolution
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    /// Checks whether `id` has a cached instance or a pending factory
    #[must_use]
    pub fn has(&self, id: &str) -> bool {
        let guard = self.inner.state.lock();
        let state = guard.borrow();
        state.instances.contains_key(id) || state.factories.contains_key(id)
    }

    /// Gets the instance registered under `id`, resolving it on first access:
    /// 1. A cached instance is returned as is.
    /// 2. A pending factory is removed, called once, and its result is cached.
    /// 3. Otherwise `id` is looked up in the constructor registry and auto-resolved,
    ///    and only the final instance is cached.
    ///
    /// A failed resolution leaves the container unchanged.
    ///
    /// # Notes
    /// The lock is held for the whole resolution, so concurrent calls never run a factory twice.
    /// A factory may call back into the container from the same thread.
    ///
    /// # Errors
    /// - Returns [`ResolveErrorKind::NotFound`] if `id` isn't known anywhere
    /// - Returns other [`ResolveErrorKind`] variants if auto-resolution fails
    pub fn get(&self, id: &str) -> Result<RcAnyThreadSafety, ResolveErrorKind> {
        self.get_instance(id).map(|instance| instance.value)
    }

    /// Gets the instance registered under `id` as `T`.
    ///
    /// # Errors
    /// - Returns [`ResolveErrorKind::IncorrectType`] if the instance isn't a `T`.
    ///   The instance stays cached.
    /// - Returns errors of [`Self::get`]
    pub fn get_as<T: SendSafety + SyncSafety + 'static>(&self, id: &str) -> Result<RcThreadSafety<T>, ResolveErrorKind> {
        let Instance { type_info, value } = self.get_instance(id)?;

        value.downcast::<T>().map_err(|_| {
            let err = ResolveErrorKind::IncorrectType {
                expected: TypeInfo::of::<T>(),
                actual: type_info,
            };
            error!("{}", err);
            err
        })
    }

    /// Gets the instance registered under the type name of `T`
    ///
    /// # Errors
    /// Returns errors of [`Self::get_as`]
    #[inline]
    pub fn resolve<T: SendSafety + SyncSafety + 'static>(&self) -> Result<RcThreadSafety<T>, ResolveErrorKind> {
        self.get_as(type_name::<T>())
    }

    /// Registers a factory for `id`, replacing the previous one.
    /// The factory isn't called until the first [`Self::get`].
    ///
    /// # Warning
    /// An instance already cached under `id` takes precedence: the new factory stays pending
    /// until the instance is removed with [`Self::remove`].
    pub fn bind<T, F>(&self, id: impl Into<String>, factory: F) -> &Self
    where
        T: SendSafety + SyncSafety + 'static,
        F: FnOnce() -> T + SendSafety + 'static,
    {
        let id = id.into();
        let factory: BoxedFactory = Box::new(move || Instance::new(factory()));

        let guard = self.inner.state.lock();
        let replaced = guard.borrow_mut().factories.insert(id.clone(), factory);
        debug!(id = id.as_str(), replaced = replaced.is_some(), "Factory bound");
        self
    }

    /// Removes the pending factory of `id`, if any. Cached instances aren't affected.
    pub fn unbind(&self, id: &str) -> &Self {
        let guard = self.inner.state.lock();
        let removed = guard.borrow_mut().factories.remove(id);
        debug!(id, removed = removed.is_some(), "Factory unbound");
        self
    }

    /// Calls `factory` right away and caches its result under `id`, replacing the previous instance
    pub fn add<T, F>(&self, id: impl Into<String>, factory: F) -> &Self
    where
        T: SendSafety + SyncSafety + 'static,
        F: FnOnce() -> T,
    {
        let id = id.into();
        let instance = Instance::new(factory());

        let guard = self.inner.state.lock();
        let replaced = guard.borrow_mut().instances.insert(id.clone(), instance);
        debug!(id = id.as_str(), replaced = replaced.is_some(), "Instance added");
        self
    }

    /// Removes the cached instance of `id`, if any. Pending factories aren't affected.
    pub fn remove(&self, id: &str) -> &Self {
        let guard = self.inner.state.lock();
        let removed = guard.borrow_mut().instances.remove(id);
        debug!(id, removed = removed.is_some(), "Instance removed");
        self
    }

    /// Removes all cached instances and pending factories
    pub fn clear(&self) -> &Self {
        let guard = self.inner.state.lock();
        let cleared = mem::take(&mut *guard.borrow_mut());
        debug!(
            factories = cleared.factories.len(),
            instances = cleared.instances.len(),
            "Cleared"
        );
        self
    }
}

impl Container {
    fn get_instance(&self, id: &str) -> Result<Instance, ResolveErrorKind> {
        let span = info_span!("get", id);
        let _guard = span.enter();

        let guard = self.inner.state.lock();

        if let Some(instance) = guard.borrow().instances.get(id) {
            debug!("Found in cache");
            return Ok(instance.clone());
        }
        debug!("Not found in cache");

        let factory = guard.borrow_mut().factories.remove(id);
        let instance = if let Some(factory) = factory {
            debug!("Factory consumed");
            factory()
        } else {
            debug!("No factory, auto-resolving");
            match AutoResolver::new(&self.inner.registry).resolve(id) {
                Ok(Resolved { type_info, value }) => Instance {
                    type_info,
                    value: RcThreadSafety::from(value),
                },
                Err(err) => {
                    error!("{}", err);
                    return Err(err);
                }
            }
        };

        let replaced = guard.borrow_mut().instances.insert(id.to_string(), instance.clone());
        if replaced.is_some() {
            debug!("Replaced an instance added during resolution");
        }
        debug!("Cached");

        Ok(instance)
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new(Registry::new())
    }
}

impl Debug for Container {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let guard = self.inner.state.lock();
        let state = guard.borrow();
        f.debug_struct("Container")
            .field("factories", &state.factories.keys())
            .field("instances", &state.instances.keys())
            .field("constructors", &self.inner.registry.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::Container;
    use crate::{
        utils::thread_safety::RcThreadSafety, Constructor, Injectable, InstantiateErrorKind, Parameter, Registry, ResolveErrorKind,
    };

    use alloc::{
        format,
        string::{String, ToString as _},
        vec::Vec,
    };
    use core::{
        any::type_name,
        sync::atomic::{AtomicU8, Ordering},
    };
    use tracing::debug;
    use tracing_test::traced_test;

    #[derive(Debug, PartialEq)]
    struct B {
        a: i32,
        b: String,
    }

    impl Injectable for B {
        fn constructor() -> Constructor<Self> {
            Constructor::new(|args| {
                Ok(Self {
                    a: args.take()?,
                    b: args.take()?,
                })
            })
            .param(Parameter::with_default("a", 1_i32))
            .param(Parameter::with_default("b", String::from("str")))
        }
    }

    #[derive(Debug, PartialEq)]
    struct A(B);

    impl Injectable for A {
        fn constructor() -> Constructor<Self> {
            Constructor::from_fn(A)
        }
    }

    #[derive(Debug, PartialEq)]
    struct SomeClass(A);

    impl Injectable for SomeClass {
        fn constructor() -> Constructor<Self> {
            Constructor::from_fn(SomeClass)
        }
    }

    struct Broken(#[allow(dead_code)] u8);

    impl Injectable for Broken {
        fn constructor() -> Constructor<Self> {
            Constructor::new(|args| Ok(Self(args.take()?))).param(Parameter::of::<u8>("code"))
        }
    }

    fn registry() -> Registry {
        crate::registry![B, A, SomeClass, Broken]
    }

    fn counter() -> RcThreadSafety<AtomicU8> {
        RcThreadSafety::new(AtomicU8::new(0))
    }

    fn counting_factory(calls: &RcThreadSafety<AtomicU8>, value: &'static str) -> impl FnOnce() -> String + 'static {
        let calls = calls.clone();
        move || {
            calls.fetch_add(1, Ordering::SeqCst);

            debug!("Call factory");
            value.to_string()
        }
    }

    fn pending_len(container: &Container) -> usize {
        container.inner.state.lock().borrow().factories.len()
    }

    fn resolved_ids(container: &Container) -> Vec<String> {
        container.inner.state.lock().borrow().instances.keys().cloned().collect()
    }

    #[test]
    #[traced_test]
    fn test_has_unknown() {
        let container = Container::new(registry());

        assert!(!container.has("SomeClass"));
        assert!(!container.has(type_name::<SomeClass>()));
    }

    #[test]
    #[traced_test]
    fn test_bind_unbind() {
        let calls = counter();
        let container = Container::default();

        container.bind("SomeClass", counting_factory(&calls, "value"));
        assert!(container.has("SomeClass"));
        assert_eq!(pending_len(&container), 1);

        container.unbind("SomeClass");
        assert!(!container.has("SomeClass"));
        assert_eq!(pending_len(&container), 0);

        container.unbind("SomeClass");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    #[traced_test]
    fn test_add_calls_factory_once() {
        let calls = counter();
        let container = Container::default();

        container.add("SomeClass", counting_factory(&calls, "value"));

        assert!(container.has("SomeClass"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(pending_len(&container), 0);
        assert_eq!(resolved_ids(&container), ["SomeClass"]);
        assert_eq!(*container.get_as::<String>("SomeClass").unwrap(), "value");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    #[traced_test]
    fn test_add_replaces_instance() {
        let container = Container::default();

        container.add("id", || 1_u8).add("id", || 2_u8);

        assert_eq!(*container.get_as::<u8>("id").unwrap(), 2);
    }

    #[test]
    #[traced_test]
    fn test_get_idempotent() {
        let calls = counter();
        let container = Container::default();
        container.bind("id", counting_factory(&calls, "value"));

        let first = container.get("id").unwrap();
        let second = container.get("id").unwrap();
        let third = container.get_as::<String>("id").unwrap();

        assert!(RcThreadSafety::ptr_eq(&first, &second));
        assert!(core::ptr::eq(
            RcThreadSafety::as_ptr(&first).cast::<u8>(),
            RcThreadSafety::as_ptr(&third).cast::<u8>()
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    #[traced_test]
    fn test_get_consumes_factory() {
        let container = Container::default();
        container.bind("id", || 1_u8);

        container.get("id").unwrap();

        assert_eq!(pending_len(&container), 0);
        assert_eq!(resolved_ids(&container), ["id"]);
        assert!(container.has("id"));
    }

    #[test]
    #[traced_test]
    fn test_bind_after_get_keeps_cached_instance() {
        let f_calls = counter();
        let g_calls = counter();
        let container = Container::default();

        container.bind("X", counting_factory(&f_calls, "f"));
        let first = container.get_as::<String>("X").unwrap();
        container.bind("X", counting_factory(&g_calls, "g"));
        let second = container.get_as::<String>("X").unwrap();

        assert_eq!(*second, "f");
        assert!(RcThreadSafety::ptr_eq(&first, &second));
        assert_eq!(g_calls.load(Ordering::SeqCst), 0);
        assert_eq!(pending_len(&container), 1);
    }

    #[test]
    #[traced_test]
    fn test_bind_after_remove_uses_new_factory() {
        let f_calls = counter();
        let g_calls = counter();
        let container = Container::default();

        container.bind("X", counting_factory(&f_calls, "f"));
        assert_eq!(*container.get_as::<String>("X").unwrap(), "f");

        container.remove("X").bind("X", counting_factory(&g_calls, "g"));
        assert_eq!(*container.get_as::<String>("X").unwrap(), "g");

        assert_eq!(f_calls.load(Ordering::SeqCst), 1);
        assert_eq!(g_calls.load(Ordering::SeqCst), 1);
        assert_eq!(pending_len(&container), 0);
    }

    #[test]
    #[traced_test]
    fn test_clear() {
        let container = Container::new(registry());

        container.add("SomeClass", || 1_u8).bind("B", || 2_u8);
        container.get(type_name::<B>()).unwrap();
        container.clear();

        assert!(!container.has("SomeClass"));
        assert!(!container.has("B"));
        assert!(!container.has(type_name::<B>()));
        assert_eq!(pending_len(&container), 0);
        assert!(resolved_ids(&container).is_empty());
    }

    #[test]
    #[traced_test]
    fn test_remove_only_one() {
        let container = Container::default();

        container.add("a", || 1_u8).add("b", || 2_u8).bind("c", || 3_u8);
        container.remove("a").remove("missing");

        assert!(!container.has("a"));
        assert!(container.has("b"));
        assert!(container.has("c"));
        assert_eq!(resolved_ids(&container), ["b"]);
        assert_eq!(pending_len(&container), 1);
    }

    #[test]
    #[traced_test]
    fn test_bind_twice_overwrites_factory() {
        let f_calls = counter();
        let g_calls = counter();
        let container = Container::default();

        container
            .bind("X", counting_factory(&f_calls, "f"))
            .bind("X", counting_factory(&g_calls, "g"));

        assert_eq!(pending_len(&container), 1);
        assert_eq!(*container.get_as::<String>("X").unwrap(), "g");
        assert_eq!(f_calls.load(Ordering::SeqCst), 0);
        assert_eq!(g_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    #[traced_test]
    fn test_unbind_keeps_cached_instance() {
        let container = Container::default();

        container.add("X", || 7_u8).unbind("X");

        assert!(container.has("X"));
        assert_eq!(resolved_ids(&container), ["X"]);
        assert_eq!(*container.get_as::<u8>("X").unwrap(), 7);
    }

    #[test]
    #[traced_test]
    fn test_remove_keeps_pending_factory() {
        let container = Container::default();

        container.bind("a", || 1_u8).remove("a");

        assert!(container.has("a"));
        assert_eq!(*container.get_as::<u8>("a").unwrap(), 1);
    }

    #[test]
    #[traced_test]
    fn test_auto_resolve_caches_only_requested() {
        let container = Container::new(registry());

        let some_class = container.resolve::<SomeClass>().unwrap();

        assert_eq!(
            *some_class,
            SomeClass(A(B {
                a: 1,
                b: String::from("str")
            }))
        );
        assert_eq!(resolved_ids(&container), [type_name::<SomeClass>()]);
        assert_eq!(pending_len(&container), 0);
        assert!(!container.has(type_name::<A>()));
        assert!(!container.has(type_name::<B>()));

        let again = container.resolve::<SomeClass>().unwrap();
        assert!(RcThreadSafety::ptr_eq(&some_class, &again));
    }

    #[test]
    #[traced_test]
    fn test_auto_resolve_ignores_container_instances() {
        let container = Container::new(registry());
        container.add(type_name::<B>(), || B {
            a: 100,
            b: String::new(),
        });

        let a = container.resolve::<A>().unwrap();

        assert_eq!(a.0.a, 1);
        assert_eq!(container.resolve::<B>().unwrap().a, 100);
    }

    #[test]
    #[traced_test]
    fn test_failed_resolution_leaves_state_unchanged() {
        let container = Container::new(registry());
        container.add("kept", || 1_u8);

        let err = container.get(type_name::<Broken>()).err().unwrap();
        assert!(matches!(err, ResolveErrorKind::UnresolvableParameter { .. }));

        let err = container.get("Unknown").err().unwrap();
        assert!(matches!(err, ResolveErrorKind::NotFound { .. }));

        assert_eq!(resolved_ids(&container), ["kept"]);
        assert_eq!(pending_len(&container), 0);
        assert!(!container.has(type_name::<Broken>()));
    }

    #[test]
    #[traced_test]
    fn test_get_as_incorrect_type() {
        let container = Container::default();
        container.bind("id", || 1_u8);

        let err = container.get_as::<String>("id").err().unwrap();

        match err {
            ResolveErrorKind::IncorrectType { expected, actual } => {
                assert_eq!(expected.name, type_name::<String>());
                assert_eq!(actual.name, "u8");
            }
            err => panic!("unexpected error: {err}"),
        }
        assert_eq!(*container.get_as::<u8>("id").unwrap(), 1);
    }

    #[test]
    #[traced_test]
    fn test_factory_calls_back_into_container() {
        let container = Container::default();
        container.add("base", || 20_u32);
        container.bind("derived", {
            let container = container.clone();
            move || {
                assert!(container.has("base"));
                *container.get_as::<u32>("base").unwrap() + 1
            }
        });

        assert_eq!(*container.get_as::<u32>("derived").unwrap(), 21);
    }

    #[test]
    #[traced_test]
    fn test_constructor_error_propagates() {
        let registry = Registry::new().provide(Constructor::new(|_| -> Result<u16, InstantiateErrorKind> {
            Err(anyhow::anyhow!("no port").into())
        }));
        let container = Container::new(registry);

        let err = container.resolve::<u16>().err().unwrap();

        assert!(matches!(err, ResolveErrorKind::Instantiate(InstantiateErrorKind::Custom(_))));
        assert!(!container.has("u16"));
    }

    #[test]
    #[traced_test]
    fn test_debug_lists_ids() {
        let container = Container::new(registry());
        container.add("a", || 1_u8).bind("b", || 2_u8);

        let debug = format!("{container:?}");

        assert!(debug.contains("\"a\""));
        assert!(debug.contains("\"b\""));
        assert!(debug.contains("constructors: 4"));
        assert_eq!(container.registry().len(), 4);
    }

    #[test]
    #[traced_test]
    #[cfg(feature = "thread_safe")]
    fn test_concurrent_get_calls_factory_once() {
        let calls = counter();
        let container = Container::default();
        container.bind("id", counting_factory(&calls, "value"));

        let values = std::thread::scope(|scope| {
            let handles = (0..8)
                .map(|_| scope.spawn(|| container.get_as::<String>("id").unwrap()))
                .collect::<Vec<_>>();
            handles.into_iter().map(|handle| handle.join().unwrap()).collect::<Vec<_>>()
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(values.windows(2).all(|pair| RcThreadSafety::ptr_eq(&pair[0], &pair[1])));
    }
}

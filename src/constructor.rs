use alloc::{
    borrow::Cow,
    boxed::Box,
    format,
    vec::{self, Vec},
};
use core::{
    any::type_name,
    fmt::{self, Debug, Formatter},
    marker::PhantomData,
};

use crate::{
    any::TypeInfo,
    errors::InstantiateErrorKind,
    utils::thread_safety::{BoxAnyThreadSafety, RcThreadSafety, SendSafety, SyncSafety},
};

#[cfg(feature = "thread_safe")]
pub(crate) type BoxedBuild = RcThreadSafety<dyn Fn(&mut Arguments) -> Result<BoxAnyThreadSafety, InstantiateErrorKind> + Send + Sync>;
#[cfg(not(feature = "thread_safe"))]
pub(crate) type BoxedBuild = RcThreadSafety<dyn Fn(&mut Arguments) -> Result<BoxAnyThreadSafety, InstantiateErrorKind>>;

#[cfg(feature = "thread_safe")]
type BoxedDefault = RcThreadSafety<dyn Fn() -> BoxAnyThreadSafety + Send + Sync>;
#[cfg(not(feature = "thread_safe"))]
type BoxedDefault = RcThreadSafety<dyn Fn() -> BoxAnyThreadSafety>;

/// Positional arguments assembled by the auto-resolver, in the order of the constructor parameters.
pub struct Arguments {
    values: vec::IntoIter<BoxAnyThreadSafety>,
    index: usize,
}

impl Arguments {
    #[inline]
    #[must_use]
    pub(crate) fn new(values: Vec<BoxAnyThreadSafety>) -> Self {
        Self {
            values: values.into_iter(),
            index: 0,
        }
    }

    /// Takes the next argument.
    ///
    /// # Errors
    /// - Returns [`InstantiateErrorKind::MissingArgument`] if all arguments are already taken
    /// - Returns [`InstantiateErrorKind::IncorrectArgument`] if the next argument isn't a `T`
    pub fn take<T: 'static>(&mut self) -> Result<T, InstantiateErrorKind> {
        let index = self.index;
        self.index += 1;

        let Some(value) = self.values.next() else {
            return Err(InstantiateErrorKind::MissingArgument { index });
        };
        match value.downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(_) => Err(InstantiateErrorKind::IncorrectArgument {
                index,
                expected: type_name::<T>(),
            }),
        }
    }

    /// Number of arguments not taken yet
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Describes one constructor parameter: its name, its declared type and an optional default value.
///
/// The auto-resolver prefers the declared type when it's registered as constructible,
/// and falls back to the default value otherwise.
#[derive(Clone)]
pub struct Parameter {
    name: Cow<'static, str>,
    type_info: TypeInfo,
    default: Option<BoxedDefault>,
}

impl Parameter {
    #[inline]
    #[must_use]
    pub fn of<T: SendSafety + SyncSafety + 'static>(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            type_info: TypeInfo::of::<T>(),
            default: None,
        }
    }

    /// Parameter whose default value is a clone of `value`
    #[inline]
    #[must_use]
    pub fn with_default<T: Clone + SendSafety + SyncSafety + 'static>(name: impl Into<Cow<'static, str>>, value: T) -> Self {
        Self::with_default_fn(name, move || value.clone())
    }

    /// Parameter whose default value is produced by `default` each time it's needed
    #[must_use]
    pub fn with_default_fn<T, F>(name: impl Into<Cow<'static, str>>, default: F) -> Self
    where
        T: SendSafety + SyncSafety + 'static,
        F: Fn() -> T + SendSafety + SyncSafety + 'static,
    {
        let default: BoxedDefault = RcThreadSafety::new(move || -> BoxAnyThreadSafety { Box::new(default()) });
        Self {
            name: name.into(),
            type_info: TypeInfo::of::<T>(),
            default: Some(default),
        }
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub const fn type_info(&self) -> TypeInfo {
        self.type_info
    }

    #[inline]
    #[must_use]
    pub const fn has_default(&self) -> bool {
        self.default.is_some()
    }

    #[inline]
    #[must_use]
    pub(crate) fn cloned_name(&self) -> Cow<'static, str> {
        self.name.clone()
    }

    #[inline]
    #[must_use]
    pub(crate) fn default_value(&self) -> Option<BoxAnyThreadSafety> {
        self.default.as_ref().map(|default| default())
    }
}

impl Debug for Parameter {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parameter")
            .field("name", &self.name)
            .field("type", &self.type_info.name)
            .field("has_default", &self.has_default())
            .finish()
    }
}

/// Constructor descriptor of `T`: the parameter list and the function building `T` from the resolved arguments.
pub struct Constructor<T> {
    params: Vec<Parameter>,
    build: BoxedBuild,
    _provides: PhantomData<fn() -> T>,
}

impl<T: SendSafety + SyncSafety + 'static> Constructor<T> {
    /// Creates a constructor without parameters.
    /// Declare them with [`Self::param`] in the order `build` takes them from [`Arguments`].
    #[must_use]
    pub fn new<F>(build: F) -> Self
    where
        F: Fn(&mut Arguments) -> Result<T, InstantiateErrorKind> + SendSafety + SyncSafety + 'static,
    {
        let build: BoxedBuild = RcThreadSafety::new(move |arguments: &mut Arguments| -> Result<BoxAnyThreadSafety, InstantiateErrorKind> {
            build(arguments).map(|value| Box::new(value) as BoxAnyThreadSafety)
        });
        Self {
            params: Vec::new(),
            build,
            _provides: PhantomData,
        }
    }

    /// Creates a constructor from a function, one parameter per argument (`arg0`, `arg1`, ...) without defaults
    #[must_use]
    pub fn from_fn<F, Args>(func: F) -> Self
    where
        F: ConstructorFn<Args, Provides = T>,
    {
        let params = F::parameters();
        let build: BoxedBuild = RcThreadSafety::new(move |arguments: &mut Arguments| -> Result<BoxAnyThreadSafety, InstantiateErrorKind> {
            func.construct(arguments).map(|value| Box::new(value) as BoxAnyThreadSafety)
        });
        Self {
            params,
            build,
            _provides: PhantomData,
        }
    }

    #[inline]
    #[must_use]
    pub fn param(mut self, param: Parameter) -> Self {
        self.params.push(param);
        self
    }

    #[inline]
    #[must_use]
    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    #[inline]
    #[must_use]
    pub(crate) fn erase(self) -> ErasedConstructor {
        ErasedConstructor {
            type_info: TypeInfo::of::<T>(),
            params: self.params.into(),
            build: self.build,
        }
    }
}

#[derive(Clone)]
pub(crate) struct ErasedConstructor {
    pub(crate) type_info: TypeInfo,
    pub(crate) params: RcThreadSafety<[Parameter]>,
    pub(crate) build: BoxedBuild,
}

/// Functions usable with [`Constructor::from_fn`]
pub trait ConstructorFn<Args>: SendSafety + SyncSafety + 'static {
    type Provides;

    fn parameters() -> Vec<Parameter>;

    /// # Errors
    /// Returns an error if arguments are missing or have incorrect types
    fn construct(&self, arguments: &mut Arguments) -> Result<Self::Provides, InstantiateErrorKind>;
}

macro_rules! impl_constructor_fn {
    (
        [$($ty:ident),*]
    ) => {
        #[allow(non_snake_case, unused_mut, unused_variables)]
        impl<F, Provides, $($ty,)*> ConstructorFn<($($ty,)*)> for F
        where
            F: Fn($($ty,)*) -> Provides + SendSafety + SyncSafety + 'static,
            $( $ty: SendSafety + SyncSafety + 'static, )*
        {
            type Provides = Provides;

            fn parameters() -> Vec<Parameter> {
                let mut parameters = Vec::new();
                $(
                    let index = parameters.len();
                    parameters.push(Parameter::of::<$ty>(format!("arg{index}")));
                )*
                parameters
            }

            fn construct(&self, arguments: &mut Arguments) -> Result<Self::Provides, InstantiateErrorKind> {
                $( let $ty = arguments.take::<$ty>()?; )*
                Ok(self($($ty,)*))
            }
        }
    };
}

all_the_tuples!(impl_constructor_fn);

macro_rules! all_the_tuples {
    ($name:ident) => {
        $name!([]);
        $name!([T1]);
        $name!([T1, T2]);
        $name!([T1, T2, T3]);
        $name!([T1, T2, T3, T4]);
        $name!([T1, T2, T3, T4, T5]);
        $name!([T1, T2, T3, T4, T5, T6]);
        $name!([T1, T2, T3, T4, T5, T6, T7]);
        $name!([T1, T2, T3, T4, T5, T6, T7, T8]);
        $name!([T1, T2, T3, T4, T5, T6, T7, T8, T9]);
        $name!([T1, T2, T3, T4, T5, T6, T7, T8, T9, T10]);
        $name!([T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11]);
        $name!([T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11, T12]);
    };
}

/// Builds a [`crate::Registry`] with every listed [`crate::Injectable`] type registered under its type name.
///
/// # Examples
/// ```rust
/// use autowire::{registry, Constructor, Injectable};
///
/// struct Config;
///
/// impl Injectable for Config {
///     fn constructor() -> Constructor<Self> {
///         Constructor::from_fn(|| Config)
///     }
/// }
///
/// let registry = registry![Config];
/// assert!(registry.contains(core::any::type_name::<Config>()));
/// ```
#[macro_export]
macro_rules! registry {
    ($($ty:ty),* $(,)?) => {{
        $crate::Registry::new()
            $( .register::<$ty>() )*
    }};
}

use crate::{
    constructor::Constructor,
    utils::thread_safety::{SendSafety, SyncSafety},
};

/// Types the auto-resolver can build by itself.
///
/// Implement it by hand or with `#[derive(Injectable)]`, then register the type in a [`crate::Registry`].
///
/// # Examples
/// ```rust
/// use autowire::{Constructor, Injectable, Parameter};
///
/// struct Database {
///     url: String,
/// }
///
/// impl Injectable for Database {
///     fn constructor() -> Constructor<Self> {
///         Constructor::new(|args| Ok(Self { url: args.take()? }))
///             .param(Parameter::with_default("url", String::from("postgres://localhost")))
///     }
/// }
/// ```
pub trait Injectable: Sized + SendSafety + SyncSafety + 'static {
    #[must_use]
    fn constructor() -> Constructor<Self>;
}

#![no_std]
#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate alloc;

#[macro_use]
pub(crate) mod macros;

pub(crate) mod any;
pub(crate) mod constructor;
pub(crate) mod container;
pub(crate) mod errors;
pub(crate) mod injectable;
pub(crate) mod locator;
pub(crate) mod registry;
pub(crate) mod resolver;

pub mod utils;

pub use any::TypeInfo;
pub use constructor::{Arguments, Constructor, ConstructorFn, Parameter};
pub use container::Container;
pub use errors::{InstantiateErrorKind, ResolveErrorKind};
pub use injectable::Injectable;
pub use locator::Locator;
pub use registry::Registry;
pub use resolver::MAX_DEPTH;

#[cfg(feature = "macros")]
#[cfg_attr(docsrs, doc(cfg(feature = "macros")))]
pub use autowire_macros::Injectable;

use alloc::{borrow::Cow, string::String};

use super::instantiate::InstantiateErrorKind;
use crate::any::TypeInfo;

#[derive(thiserror::Error, Debug)]
pub enum ResolveErrorKind {
    #[error("Nothing registered under `{id}`: no instance, no factory and no constructor")]
    NotFound { id: String },
    #[error("Type `{name}` is not instantiable")]
    NotInstantiable { name: &'static str },
    #[error("Can't resolve parameter `{parameter}` of `{name}`: its type isn't constructible and it has no default value")]
    UnresolvableParameter { name: &'static str, parameter: Cow<'static, str> },
    #[error("Resolution of `{name}` exceeded {depth} nested constructors. Does it depend on itself?")]
    TooDeep { name: &'static str, depth: usize },
    #[error("Incorrect instance type. Actual: {actual}, expected: {expected}")]
    IncorrectType { expected: TypeInfo, actual: TypeInfo },
    #[error(transparent)]
    Instantiate(#[from] InstantiateErrorKind),
}

use alloc::{string::ToString as _, vec::Vec};
use tracing::{debug, debug_span};

use crate::{
    any::TypeInfo,
    constructor::Arguments,
    errors::ResolveErrorKind,
    registry::{Entry, Registry},
    utils::thread_safety::BoxAnyThreadSafety,
};

/// Max count of nested constructors in one resolution.
/// Self-referential constructors reach it instead of overflowing the stack.
pub const MAX_DEPTH: usize = 128;

pub(crate) struct Resolved {
    pub(crate) type_info: TypeInfo,
    pub(crate) value: BoxAnyThreadSafety,
}

/// Builds instances from the constructor descriptors of a [`Registry`],
/// resolving parameters depth-first: registered type first, then default value.
///
/// Nothing is shared between parameters, every occurrence of a type is constructed anew.
pub(crate) struct AutoResolver<'a> {
    registry: &'a Registry,
}

impl<'a> AutoResolver<'a> {
    #[inline]
    #[must_use]
    pub(crate) const fn new(registry: &'a Registry) -> Self {
        Self { registry }
    }

    pub(crate) fn resolve(&self, name: &str) -> Result<Resolved, ResolveErrorKind> {
        self.resolve_nested(name, 0)
    }

    fn resolve_nested(&self, name: &str, depth: usize) -> Result<Resolved, ResolveErrorKind> {
        let span = debug_span!("resolve", type_name = name, depth);
        let _guard = span.enter();

        let constructor = match self.registry.get(name) {
            Some(Entry::Concrete(constructor)) => constructor,
            Some(Entry::Abstract(type_info)) => return Err(ResolveErrorKind::NotInstantiable { name: type_info.name }),
            None => return Err(ResolveErrorKind::NotFound { id: name.to_string() }),
        };
        if depth >= MAX_DEPTH {
            return Err(ResolveErrorKind::TooDeep {
                name: constructor.type_info.name,
                depth,
            });
        }

        let mut arguments = Vec::with_capacity(constructor.params.len());
        for param in constructor.params.iter() {
            let dependency = param.type_info().name;
            if self.registry.contains(dependency) {
                debug!(parameter = param.name(), "Resolving dependency");
                arguments.push(self.resolve_nested(dependency, depth + 1)?.value);
            } else if let Some(default) = param.default_value() {
                debug!(parameter = param.name(), "Using default value");
                arguments.push(default);
            } else {
                return Err(ResolveErrorKind::UnresolvableParameter {
                    name: constructor.type_info.name,
                    parameter: param.cloned_name(),
                });
            }
        }

        let value = (constructor.build)(&mut Arguments::new(arguments))?;
        debug!(short_name = constructor.type_info.short_name(), "Constructed");

        Ok(Resolved {
            type_info: constructor.type_info,
            value,
        })
    }
}

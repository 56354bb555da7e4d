use core::{
    fmt::{self, Debug, Formatter},
    marker::PhantomData,
};
use std::sync::Arc;

use crate::{
    any::TypeInfo,
    dependency_resolver::{Arguments, DependencyResolver},
    errors::ResolveErrorKind,
    inject::downcast,
    lifetime_scope::WeakLifetimeScope,
    parameters::{Parameter, ParameterInfo},
    registration::{ComponentRegistration, RegistrationBuilder},
};

/// Resolves `T` on demand from the scope the factory was created in.
///
/// Injecting a factory doesn't activate `T`, so a component may depend on a factory of itself.
pub struct Factory<T: ?Sized> {
    scope: WeakLifetimeScope,
    _marker: PhantomData<fn() -> Arc<T>>,
}

impl<T: ?Sized> Clone for Factory<T> {
    fn clone(&self) -> Self {
        Self {
            scope: self.scope.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: ?Sized + 'static> Debug for Factory<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Factory").field("type", &TypeInfo::of::<T>().name).finish()
    }
}

impl<T: Send + Sync + 'static> Factory<T> {
    /// # Errors
    /// Returns [`ResolveErrorKind::ScopeDisposed`] if the scope has been disposed or dropped.
    pub fn call(&self) -> Result<Arc<T>, ResolveErrorKind> {
        self.call_with(Vec::new())
    }

    /// # Errors
    /// Returns [`ResolveErrorKind::ScopeDisposed`] if the scope has been disposed or dropped.
    pub fn call_with(&self, parameters: Vec<Parameter>) -> Result<Arc<T>, ResolveErrorKind> {
        let Some(scope) = self.scope.upgrade() else {
            return Err(ResolveErrorKind::ScopeDisposed);
        };
        scope.resolve_with(parameters)
    }

    pub(crate) fn adapter_registration() -> ComponentRegistration {
        RegistrationBuilder::<Self>::new()
            .delegate(|context, _| {
                Ok(Self {
                    scope: context.scope().downgrade(),
                    _marker: PhantomData,
                })
            })
            .externally_owned()
            .build_registration()
    }
}

impl<T: Send + Sync + 'static> DependencyResolver for Factory<T> {
    fn parameters() -> Vec<ParameterInfo> {
        vec![ParameterInfo::of::<Self>()]
    }

    fn resolve(arguments: &mut Arguments) -> Result<Self, ResolveErrorKind> {
        let argument = arguments.next_argument()?;
        match argument.value {
            Some(instance) => downcast::<Self>(instance).map(|factory| (*factory).clone()),
            None => Err(ResolveErrorKind::NullArgument {
                parameter: argument.parameter,
            }),
        }
    }
}

use core::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

use super::{ActivatorKind, InstanceActivator};
use crate::{
    any::{Instance, TypeInfo},
    parameters::Parameter,
    resolve::ResolveContext,
};

/// Activates instances by calling a user-supplied function.
pub struct DelegateActivator<T, F> {
    delegate: F,
    _marker: PhantomData<fn() -> T>,
}

impl<T, F> DelegateActivator<T, F>
where
    T: Send + Sync + 'static,
    F: for<'op> Fn(&mut ResolveContext<'op>, &[Parameter]) -> anyhow::Result<T> + Send + Sync + 'static,
{
    #[inline]
    #[must_use]
    pub fn new(delegate: F) -> Self {
        Self {
            delegate,
            _marker: PhantomData,
        }
    }
}

impl<T, F> InstanceActivator for DelegateActivator<T, F>
where
    T: Send + Sync + 'static,
    F: for<'op> Fn(&mut ResolveContext<'op>, &[Parameter]) -> anyhow::Result<T> + Send + Sync + 'static,
{
    fn limit_type(&self) -> TypeInfo {
        TypeInfo::of::<T>()
    }

    fn kind(&self) -> ActivatorKind {
        ActivatorKind::Delegate
    }

    fn activate(&self, context: &mut ResolveContext<'_>, parameters: &[Parameter]) -> anyhow::Result<Instance> {
        let instance = (self.delegate)(context, parameters)?;

        debug!("Delegate called");

        Ok(Arc::new(instance))
    }
}

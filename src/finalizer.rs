use std::sync::Arc;
use tracing::error;

use crate::{
    any::{Instance, TypeInfo},
    disposer::Disposable,
};

pub trait Finalizer<Dep>: Send + Sync + 'static {
    fn finalize(&self, dependency: Arc<Dep>);
}

pub(crate) type BoxedFinalizer = Arc<dyn Fn(Instance) + Send + Sync>;

#[must_use]
pub(crate) fn boxed_finalizer<Dep, Fin>(finalizer: Fin) -> BoxedFinalizer
where
    Dep: Send + Sync + 'static,
    Fin: Finalizer<Dep>,
{
    Arc::new(move |instance: Instance| match instance.downcast::<Dep>() {
        Ok(dependency) => finalizer.finalize(dependency),
        Err(_) => error!("Finalizer of `{}` received an instance of another type", TypeInfo::of::<Dep>()),
    })
}

#[must_use]
pub(crate) fn boxed_disposable<Dep: Disposable>() -> BoxedFinalizer {
    boxed_finalizer(|dependency: Arc<Dep>| dependency.dispose())
}

impl<F, Dep> Finalizer<Dep> for F
where
    F: Fn(Arc<Dep>) + Send + Sync + 'static,
{
    #[inline]
    fn finalize(&self, dependency: Arc<Dep>) {
        self(dependency);
    }
}

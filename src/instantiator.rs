use std::sync::Arc;
use tracing::debug;

use crate::{
    any::Instance,
    dependency_resolver::{Arguments, DependencyResolver},
    parameters::Argument,
};

/// A typed constructor: a function from its resolved dependencies to the component.
pub trait Instantiator<Deps>: Send + Sync + 'static
where
    Deps: DependencyResolver,
{
    type Provides: Send + Sync + 'static;
    type Error: Into<anyhow::Error>;

    fn instantiate(&self, dependencies: Deps) -> Result<Self::Provides, Self::Error>;
}

pub(crate) type BoxedInstantiator = Arc<dyn Fn(Vec<Argument>) -> anyhow::Result<Instance> + Send + Sync>;

#[must_use]
pub(crate) fn boxed_instantiator<Inst, Deps>(instantiator: Inst) -> BoxedInstantiator
where
    Inst: Instantiator<Deps>,
    Deps: DependencyResolver,
{
    Arc::new(move |arguments| {
        let dependencies = Deps::resolve(&mut Arguments::new(arguments))?;
        let dependency = instantiator.instantiate(dependencies).map_err(Into::<anyhow::Error>::into)?;

        debug!("Instantiated");

        Ok(Arc::new(dependency) as Instance)
    })
}

macro_rules! impl_instantiator {
    (
        [$($ty:ident),*]
    ) => {
        #[allow(non_snake_case)]
        impl<F, Response, Err, $($ty,)*> Instantiator<($($ty,)*)> for F
        where
            F: Fn($($ty,)*) -> Result<Response, Err> + Send + Sync + 'static,
            Response: Send + Sync + 'static,
            Err: Into<anyhow::Error>,
            $( $ty: DependencyResolver, )*
        {
            type Provides = Response;
            type Error = Err;

            fn instantiate(&self, ($($ty,)*): ($($ty,)*)) -> Result<Self::Provides, Self::Error> {
                self($($ty,)*)
            }
        }
    };
}

all_the_tuples!(impl_instantiator);

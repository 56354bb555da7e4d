use std::sync::Arc;

use crate::{
    any::{Instance, TypeInfo},
    dependency_resolver::{Arguments, DependencyResolver},
    errors::ResolveErrorKind,
    parameters::ParameterInfo,
};

/// Required dependency, shared with whoever else holds the same instance.
pub struct Inject<Dep: ?Sized>(pub Arc<Dep>);

impl<Dep: Send + Sync + 'static> DependencyResolver for Inject<Dep> {
    fn parameters() -> Vec<ParameterInfo> {
        vec![ParameterInfo::of::<Dep>()]
    }

    fn resolve(arguments: &mut Arguments) -> Result<Self, ResolveErrorKind> {
        let argument = arguments.next_argument()?;
        match argument.value {
            Some(instance) => downcast::<Dep>(instance).map(Self),
            None => Err(ResolveErrorKind::NullArgument {
                parameter: argument.parameter,
            }),
        }
    }
}

/// Owned value parameter. An explicit null becomes `Dep::default()`.
pub struct Arg<Dep>(pub Dep);

impl<Dep: Clone + Default + Send + Sync + 'static> DependencyResolver for Arg<Dep> {
    fn parameters() -> Vec<ParameterInfo> {
        vec![ParameterInfo::of::<Dep>().with_default(default_instance::<Dep>)]
    }

    fn resolve(arguments: &mut Arguments) -> Result<Self, ResolveErrorKind> {
        match arguments.next_argument()?.value {
            Some(instance) => downcast::<Dep>(instance).map(|dependency| Self((*dependency).clone())),
            None => Ok(Self(Dep::default())),
        }
    }
}

/// Dependency that binds to `None` when its service isn't registered or null is supplied.
pub struct Optional<Dep: ?Sized>(pub Option<Arc<Dep>>);

impl<Dep: Send + Sync + 'static> DependencyResolver for Optional<Dep> {
    fn parameters() -> Vec<ParameterInfo> {
        vec![ParameterInfo::of::<Dep>().optional()]
    }

    fn resolve(arguments: &mut Arguments) -> Result<Self, ResolveErrorKind> {
        match arguments.next_argument()?.value {
            Some(instance) => downcast::<Dep>(instance).map(|dependency| Self(Some(dependency))),
            None => Ok(Self(None)),
        }
    }
}

fn default_instance<Dep: Default + Send + Sync + 'static>() -> Instance {
    Arc::new(Dep::default())
}

pub(crate) fn downcast<Dep: Send + Sync + 'static>(instance: Instance) -> Result<Arc<Dep>, ResolveErrorKind> {
    let actual = (*instance).type_id();
    instance.downcast::<Dep>().map_err(|_| ResolveErrorKind::IncorrectType {
        expected: TypeInfo::of::<Dep>(),
        actual,
    })
}

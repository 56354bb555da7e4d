use core::fmt::{self, Debug, Formatter};

use crate::{
    any::{Instance, TypeInfo},
    dependency_resolver::DependencyResolver,
    instantiator::{boxed_instantiator, BoxedInstantiator, Instantiator},
    parameters::{Argument, ParameterInfo},
};

/// One way of building a component, described by its parameters.
#[derive(Clone)]
pub struct Constructor {
    provides: TypeInfo,
    parameters: Vec<ParameterInfo>,
    is_public: bool,
    instantiator: BoxedInstantiator,
}

impl Constructor {
    #[must_use]
    pub fn new<Inst, Deps>(instantiator: Inst) -> Self
    where
        Inst: Instantiator<Deps, Error = anyhow::Error>,
        Deps: DependencyResolver,
    {
        let parameters = Deps::parameters()
            .into_iter()
            .enumerate()
            .map(|(position, parameter)| parameter.at(position))
            .collect();

        Self {
            provides: TypeInfo::of::<Inst::Provides>(),
            parameters,
            is_public: true,
            instantiator: boxed_instantiator(instantiator),
        }
    }

    /// Hides the constructor from [`super::PublicConstructorFinder`].
    #[inline]
    #[must_use]
    pub fn private(mut self) -> Self {
        self.is_public = false;
        self
    }

    /// Names the parameters in declaration order, so that [`crate::Parameter::Named`] can match them.
    #[must_use]
    pub fn named<I>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = &'static str>,
    {
        for (parameter, name) in self.parameters.iter_mut().zip(names) {
            parameter.name = Some(name);
        }
        self
    }

    #[inline]
    #[must_use]
    pub fn provides(&self) -> TypeInfo {
        self.provides
    }

    #[inline]
    #[must_use]
    pub fn parameters(&self) -> &[ParameterInfo] {
        &self.parameters
    }

    #[inline]
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.is_public
    }

    pub(crate) fn invoke(&self, arguments: Vec<Argument>) -> anyhow::Result<Instance> {
        (self.instantiator)(arguments)
    }
}

impl Debug for Constructor {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("provides", &self.provides)
            .field("parameters", &self.parameters)
            .field("is_public", &self.is_public)
            .finish_non_exhaustive()
    }
}

use tracing::debug;

use super::Constructor;
use crate::{
    any::Instance,
    errors::MissingDependency,
    parameters::{Argument, Parameter, ValueSource},
    registry::ComponentRegistry,
    resolve::ResolveContext,
};

/// A constructor matched against the available parameter sources for one activation.
pub struct ConstructorBinding<'c> {
    index: usize,
    constructor: &'c Constructor,
    sources: Vec<ValueSource>,
    missing: Vec<MissingDependency>,
}

impl<'c> ConstructorBinding<'c> {
    /// Binds every parameter of `constructor` to the first source that can supply it:
    /// explicit parameters, then configured parameters, then the registry.
    pub(crate) fn new(
        index: usize,
        constructor: &'c Constructor,
        explicit: &[Parameter],
        configured: &[Parameter],
        registry: &ComponentRegistry,
    ) -> Self {
        let mut sources = Vec::with_capacity(constructor.parameters().len());
        let mut missing = Vec::new();

        for parameter in constructor.parameters() {
            let source = explicit
                .iter()
                .chain(configured)
                .find_map(|available| available.can_supply_value(parameter))
                .or_else(|| ValueSource::autowire(parameter, registry));

            match source {
                Some(source) => sources.push(source),
                None => {
                    debug!(%parameter, "Parameter can't be supplied");
                    missing.push(MissingDependency {
                        constructor: index,
                        parameter: parameter.clone(),
                    });
                }
            }
        }

        Self {
            index,
            constructor,
            sources,
            missing,
        }
    }

    /// Declaration index of the constructor on its component.
    #[inline]
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    #[must_use]
    pub fn constructor(&self) -> &'c Constructor {
        self.constructor
    }

    #[inline]
    #[must_use]
    pub fn parameter_count(&self) -> usize {
        self.constructor.parameters().len()
    }

    #[inline]
    #[must_use]
    pub fn can_instantiate(&self) -> bool {
        self.missing.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn missing(&self) -> &[MissingDependency] {
        &self.missing
    }

    pub(crate) fn into_missing(self) -> Vec<MissingDependency> {
        self.missing
    }

    /// Evaluates the bound sources left to right and invokes the constructor.
    pub(crate) fn instantiate(&self, context: &mut ResolveContext<'_>) -> anyhow::Result<Instance> {
        let mut arguments = Vec::with_capacity(self.sources.len());
        for (parameter, source) in self.constructor.parameters().iter().zip(&self.sources) {
            arguments.push(Argument {
                value: source.clone().value(parameter, context)?,
                parameter: parameter.clone(),
            });
        }

        self.constructor.invoke(arguments)
    }
}

mod binding;
mod constructor;
mod finder;
mod selector;

pub use binding::ConstructorBinding;
pub use constructor::Constructor;
pub use finder::{AllConstructorFinder, ConstructorFinder, PublicConstructorFinder};
pub use selector::{ConstructorSelector, MostParametersConstructorSelector};

use std::sync::Arc;
use tracing::{debug, error};

use super::{ActivatorKind, InstanceActivator};
use crate::{
    any::{Instance, TypeInfo},
    errors::ResolveErrorKind,
    parameters::Parameter,
    resolve::ResolveContext,
};

/// Activates instances by selecting one of the declared constructors and binding its parameters.
pub struct ReflectionActivator {
    limit_type: TypeInfo,
    constructors: Vec<Constructor>,
    finder: Arc<dyn ConstructorFinder>,
    selector: Arc<dyn ConstructorSelector>,
    configured_parameters: Vec<Parameter>,
}

impl ReflectionActivator {
    #[must_use]
    pub fn new(limit_type: TypeInfo, constructors: Vec<Constructor>) -> Self {
        Self {
            limit_type,
            constructors,
            finder: Arc::new(PublicConstructorFinder),
            selector: Arc::new(MostParametersConstructorSelector),
            configured_parameters: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_finder(mut self, finder: Arc<dyn ConstructorFinder>) -> Self {
        self.finder = finder;
        self
    }

    #[must_use]
    pub fn with_selector(mut self, selector: Arc<dyn ConstructorSelector>) -> Self {
        self.selector = selector;
        self
    }

    /// Parameters configured on the registration, consulted after the ones passed to a resolve call.
    #[must_use]
    pub fn with_parameters(mut self, parameters: Vec<Parameter>) -> Self {
        self.configured_parameters = parameters;
        self
    }

    #[must_use]
    pub fn constructors(&self) -> &[Constructor] {
        &self.constructors
    }
}

impl InstanceActivator for ReflectionActivator {
    fn limit_type(&self) -> TypeInfo {
        self.limit_type
    }

    fn kind(&self) -> ActivatorKind {
        ActivatorKind::Reflection
    }

    fn activate(&self, context: &mut ResolveContext<'_>, parameters: &[Parameter]) -> anyhow::Result<Instance> {
        let registry = context.scope().registry();

        let bindings: Vec<_> = self
            .constructors
            .iter()
            .enumerate()
            .filter(|(_, constructor)| self.finder.is_candidate(constructor))
            .map(|(index, constructor)| ConstructorBinding::new(index, constructor, parameters, &self.configured_parameters, &registry))
            .collect();

        if bindings.is_empty() {
            let err = ResolveErrorKind::NoConstructorsAvailable {
                type_info: self.limit_type,
            };
            error!("{}", err);
            return Err(err.into());
        }

        let (valid, invalid): (Vec<_>, Vec<_>) = bindings.into_iter().partition(|binding| binding.can_instantiate());

        let Some(selected) = self.selector.select(&valid) else {
            let err = ResolveErrorKind::NoResolvableConstructor {
                type_info: self.limit_type,
                missing: invalid.into_iter().flat_map(|binding| binding.into_missing()).collect(),
            };
            error!("{}", err);
            return Err(err.into());
        };

        debug!(constructor = selected.index(), parameters = selected.parameter_count(), "Constructor selected");

        selected.instantiate(context)
    }
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::{Constructor, ConstructorBinding, ConstructorSelector as _, MostParametersConstructorSelector};
    use crate::{
        inject::{Arg, Inject},
        parameters::Parameter,
        registry::ComponentRegistry,
    };

    struct Logger;
    struct Report;

    fn constructors() -> Vec<Constructor> {
        vec![
            Constructor::new(|| Ok(Report)),
            Constructor::new(|Arg(_): Arg<i32>| Ok(Report)),
            Constructor::new(|Arg(_): Arg<i32>, Arg(_): Arg<String>| Ok(Report)),
        ]
    }

    #[test]
    #[traced_test]
    fn test_binding_sources() {
        let registry = ComponentRegistry::empty();
        let constructors = constructors();

        let explicit = [Parameter::typed(1i32)];
        let bindings: Vec<_> = constructors
            .iter()
            .enumerate()
            .map(|(index, constructor)| ConstructorBinding::new(index, constructor, &explicit, &[], &registry))
            .collect();

        assert!(bindings[0].can_instantiate());
        assert!(bindings[1].can_instantiate());
        assert!(!bindings[2].can_instantiate());
        assert!(bindings[2].missing()[0].to_string().contains("String"));
    }

    #[test]
    #[traced_test]
    fn test_configured_parameters_fill_gaps() {
        let registry = ComponentRegistry::empty();
        let constructor = Constructor::new(|Inject(_): Inject<Logger>, Arg(_): Arg<String>| Ok(Report));

        let binding = ConstructorBinding::new(0, &constructor, &[Parameter::typed(String::new())], &[], &registry);
        assert_eq!(binding.missing().len(), 1);

        let binding = ConstructorBinding::new(
            0,
            &constructor,
            &[Parameter::typed(String::new())],
            &[Parameter::typed(Logger)],
            &registry,
        );
        assert!(binding.can_instantiate());
    }

    #[test]
    #[traced_test]
    fn test_most_parameters_selector() {
        let registry = ComponentRegistry::empty();
        let constructors = constructors();
        let explicit = [Parameter::typed(1i32), Parameter::typed(String::new())];
        let bindings: Vec<_> = constructors
            .iter()
            .enumerate()
            .map(|(index, constructor)| ConstructorBinding::new(index, constructor, &explicit, &[], &registry))
            .collect();

        assert_eq!(MostParametersConstructorSelector.select(&bindings).unwrap().index(), 2);
        assert_eq!(MostParametersConstructorSelector.select(&bindings[..2]).unwrap().index(), 1);
        assert!(MostParametersConstructorSelector.select(&[]).is_none());
    }

    #[test]
    #[traced_test]
    fn test_selector_ties_keep_declaration_order() {
        let registry = ComponentRegistry::empty();
        let constructors = [
            Constructor::new(|Arg(_): Arg<i32>| Ok(Report)),
            Constructor::new(|Arg(_): Arg<u8>| Ok(Report)),
        ];
        let explicit = [Parameter::typed(1i32), Parameter::typed(1u8)];
        let bindings: Vec<_> = constructors
            .iter()
            .enumerate()
            .map(|(index, constructor)| ConstructorBinding::new(index, constructor, &explicit, &[], &registry))
            .collect();

        assert_eq!(MostParametersConstructorSelector.select(&bindings).unwrap().index(), 0);
    }
}

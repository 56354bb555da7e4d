use core::mem;
use std::sync::Arc;
use tracing::{debug, error, info_span};

use super::{
    circular::{check_for_circular_dependency, ActivationFrame},
    InstanceLookup, ResolveContext, ResolveObserver,
};
use crate::{
    activators::ActivatorKind,
    any::Instance,
    errors::ResolveErrorKind,
    lifetime_scope::LifetimeScope,
    parameters::Parameter,
    registration::ComponentRegistration,
    service::Service,
};

/// State of one top-level resolve request and the activations it recursively triggers.
///
/// Single use: once [`Self::execute`] returns, the operation has ended and refuses further work.
pub(crate) struct ResolveOperation {
    most_nested_scope: LifetimeScope,
    activation_stack: Vec<ActivationFrame>,
    successful_activations: Vec<InstanceLookup>,
    pending_activations: usize,
    call_depth: usize,
    max_depth: usize,
    ended: bool,
    observer: Arc<dyn ResolveObserver>,
}

impl ResolveOperation {
    pub(crate) fn new(most_nested_scope: LifetimeScope) -> Self {
        let observer = most_nested_scope.observer();
        let max_depth = most_nested_scope.config().max_resolve_depth;

        Self {
            most_nested_scope,
            activation_stack: Vec::new(),
            successful_activations: Vec::new(),
            pending_activations: 0,
            call_depth: 0,
            max_depth,
            ended: false,
            observer,
        }
    }

    #[inline]
    pub(crate) fn observer(&self) -> Arc<dyn ResolveObserver> {
        self.observer.clone()
    }

    /// Resolves `registration` as the instance of `service` and ends the operation.
    ///
    /// Errors raised by the engine are returned as they are; anything else is wrapped in [`ResolveErrorKind::Resolution`].
    pub(crate) fn execute(
        &mut self,
        service: &Service,
        registration: Arc<ComponentRegistration>,
        parameters: Vec<Parameter>,
    ) -> Result<Instance, ResolveErrorKind> {
        let span = info_span!("resolve", %service, scope = ?self.most_nested_scope.id());
        let _guard = span.enter();

        self.observer.operation_beginning(service, self.most_nested_scope.id());

        let scope = self.most_nested_scope.clone();
        match self.get_or_create_instance(&scope, registration, parameters) {
            Ok(instance) => {
                self.end(service, None);
                debug!("Resolved");
                Ok(instance)
            }
            Err(err) => {
                self.end(service, Some(&err));
                let err = match err.downcast::<ResolveErrorKind>() {
                    Ok(err) => err,
                    Err(source) => ResolveErrorKind::Resolution {
                        service: service.clone(),
                        source,
                    },
                };
                error!("{}", err);
                Err(err)
            }
        }
    }

    fn end(&mut self, service: &Service, error: Option<&anyhow::Error>) {
        if self.ended {
            return;
        }
        self.ended = true;
        self.observer.operation_ending(service, error);
    }

    /// Gets the instance of `registration` for a request made from `scope`, activating it and its dependencies if needed.
    ///
    /// `Activated` handlers run when the outermost pending activation succeeds, for every instance created
    /// since, in the order the activations finished: dependencies before their dependents.
    /// If the outermost pending activation fails, none of them are raised.
    pub(crate) fn get_or_create_instance(
        &mut self,
        scope: &LifetimeScope,
        registration: Arc<ComponentRegistration>,
        parameters: Vec<Parameter>,
    ) -> anyhow::Result<Instance> {
        if self.ended {
            let err = ResolveErrorKind::OperationAlreadyEnded;
            error!("{}", err);
            return Err(err.into());
        }

        self.call_depth += 1;
        let result = self.lookup_instance(scope, registration, parameters);
        self.call_depth -= 1;

        result
    }

    fn lookup_instance(
        &mut self,
        scope: &LifetimeScope,
        registration: Arc<ComponentRegistration>,
        parameters: Vec<Parameter>,
    ) -> anyhow::Result<Instance> {
        check_for_circular_dependency(&registration, &self.activation_stack, self.call_depth, self.max_depth)?;

        let mut lookup = InstanceLookup::new(registration.clone(), scope, parameters)?;

        let tracked = registration.activator.kind() == ActivatorKind::Reflection;
        if tracked {
            self.activation_stack.push(ActivationFrame::new(&registration));
        }
        self.pending_activations += 1;
        self.observer.instance_lookup_beginning(&registration, lookup.activation_scope().id());

        let executed = lookup.execute(self);

        if tracked {
            self.activation_stack.pop();
        }

        // Still counted as pending, so instances resolved for properties complete together with this one.
        let result = executed.and_then(|instance| {
            if let Some(new_instance) = lookup.new_instance().cloned() {
                if !registration.property_injectors.is_empty() {
                    let mut context = ResolveContext::new(&mut *self, lookup.activation_scope().clone());
                    registration
                        .property_injectors
                        .iter()
                        .try_for_each(|injector| injector(&mut context, &new_instance))?;
                }
            }
            Ok(instance)
        });

        if result.is_ok() {
            self.successful_activations.push(lookup);
        }
        self.pending_activations -= 1;

        if self.pending_activations == 0 {
            match &result {
                Ok(_) => self.complete_activations()?,
                Err(_) => self.discard_activations(),
            }
        }

        result
    }

    /// Drops the activations of a failed graph without raising `Activated`.
    fn discard_activations(&mut self) {
        if !self.successful_activations.is_empty() {
            debug!(count = self.successful_activations.len(), "Discarding activations of a failed resolve");
            self.successful_activations.clear();
        }
    }

    fn complete_activations(&mut self) -> anyhow::Result<()> {
        let completed = mem::take(&mut self.successful_activations);
        if !completed.is_empty() {
            debug!(count = completed.len(), "Completing activations");
        }

        for lookup in completed {
            lookup.complete(self)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;
    use std::sync::Arc;
    use tracing_test::traced_test;

    use super::ResolveOperation;
    use crate::{
        errors::ResolveErrorKind, inject::Inject, registration::ComponentRegistration, ContainerBuilder, RegistrationBuilder,
        ResolveObserver, ScopeId, Service,
    };

    struct Engine;
    struct Car;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl ResolveObserver for Recorder {
        fn operation_beginning(&self, service: &Service, _scope: ScopeId) {
            self.0.lock().push(format!("begin {}", service.type_info.short_name()));
        }

        fn instance_lookup_beginning(&self, registration: &ComponentRegistration, _activation_scope: ScopeId) {
            self.0.lock().push(format!("lookup {}", registration.limit_type().short_name()));
        }

        fn completion_beginning(&self, registration: &ComponentRegistration) {
            self.0.lock().push(format!("complete {}", registration.limit_type().short_name()));
        }

        fn operation_ending(&self, _service: &Service, error: Option<&anyhow::Error>) {
            self.0.lock().push(format!("end {}", error.is_some()));
        }
    }

    fn car_registration() -> Arc<ComponentRegistration> {
        Arc::new(
            RegistrationBuilder::new()
                .constructor(|Inject(_): Inject<Engine>| Ok(Car))
                .on_activated(|_| Ok(()))
                .build_registration(),
        )
    }

    #[test]
    #[traced_test]
    fn test_hooks_order() {
        let recorder = Arc::new(Recorder::default());
        let container = ContainerBuilder::new()
            .provide(RegistrationBuilder::new().constructor(|| Ok(Engine)).on_activated(|_| Ok(())))
            .observer(recorder.clone())
            .build();

        let mut operation = ResolveOperation::new(container.root().clone());
        operation
            .execute(&Service::of::<Car>(), car_registration(), Vec::new())
            .unwrap();

        assert_eq!(
            *recorder.0.lock(),
            vec!["begin Car", "lookup Car", "lookup Engine", "complete Engine", "complete Car", "end false"]
        );
    }

    #[test]
    #[traced_test]
    fn test_ended_operation_refuses_work() {
        let container = ContainerBuilder::new()
            .provide(RegistrationBuilder::new().constructor(|| Ok(Engine)))
            .build();
        let scope = container.root().clone();

        let mut operation = ResolveOperation::new(scope.clone());
        operation.execute(&Service::of::<Car>(), car_registration(), Vec::new()).unwrap();

        let err = operation.get_or_create_instance(&scope, car_registration(), Vec::new()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ResolveErrorKind>(),
            Some(ResolveErrorKind::OperationAlreadyEnded)
        ));
        assert!(err.to_string().contains("temporary context disposed"));
    }

    #[test]
    #[traced_test]
    fn test_counters_balanced_after_failure() {
        let container = ContainerBuilder::new().build();
        let scope = container.root().clone();

        let mut operation = ResolveOperation::new(scope.clone());
        assert!(operation.get_or_create_instance(&scope, car_registration(), Vec::new()).is_err());

        assert!(operation.activation_stack.is_empty());
        assert_eq!(operation.pending_activations, 0);
        assert_eq!(operation.call_depth, 0);
        assert!(operation.successful_activations.is_empty());
    }

    #[test]
    #[traced_test]
    fn test_failed_resolve_discards_activations() {
        let recorder = Arc::new(Recorder::default());
        let container = ContainerBuilder::new()
            .provide(RegistrationBuilder::new().constructor(|| Ok(Engine)).on_activated(|_| Ok(())))
            .observer(recorder.clone())
            .build();
        let registration = Arc::new(
            RegistrationBuilder::new()
                .constructor(|Inject(_): Inject<Engine>| Ok(Car))
                .on_activated(|_| Ok(()))
                .inject_properties(|_, _| Err(anyhow::anyhow!("no wheels")))
                .build_registration(),
        );

        let mut operation = ResolveOperation::new(container.root().clone());
        assert!(operation.execute(&Service::of::<Car>(), registration, Vec::new()).is_err());

        assert!(operation.successful_activations.is_empty());
        assert_eq!(
            *recorder.0.lock(),
            vec!["begin Car", "lookup Car", "lookup Engine", "end true"]
        );
        assert!(logs_contain("Discarding activations"));
    }

    #[test]
    #[traced_test]
    fn test_unexpected_errors_are_wrapped_once() {
        let container = ContainerBuilder::new().build();
        let registration = Arc::new(
            RegistrationBuilder::new()
                .constructor(|| Ok(Engine))
                .on_activating(|_| Err(anyhow::anyhow!("inspection failed")))
                .build_registration(),
        );

        let mut operation = ResolveOperation::new(container.root().clone());
        let err = operation
            .execute(&Service::of::<Engine>(), registration, Vec::new())
            .unwrap_err();

        assert!(matches!(err, ResolveErrorKind::Resolution { .. }));
        assert!(err.to_string().contains("inspection failed"));
    }
}

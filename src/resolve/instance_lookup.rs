use std::sync::Arc;
use tracing::{debug, debug_span, error};

use super::{ResolveContext, ResolveOperation};
use crate::{
    any::Instance,
    config::{Ownership, Sharing},
    errors::ResolveErrorKind,
    events::{ActivatedEvent, ActivatingEvent, PreparingEvent},
    lifetime_scope::LifetimeScope,
    parameters::Parameter,
    registration::ComponentRegistration,
};

/// Activation of one component within a resolve operation.
///
/// `execute` produces the instance (or takes it from the owning scope's cache) and may run once.
/// `complete` raises `Activated`, and only does so if `execute` created a new instance.
pub(crate) struct InstanceLookup {
    registration: Arc<ComponentRegistration>,
    activation_scope: LifetimeScope,
    parameters: Vec<Parameter>,
    new_instance: Option<Instance>,
    executed: bool,
}

impl InstanceLookup {
    /// Locates the scope owning the instance, starting from `most_nested`.
    pub(crate) fn new(
        registration: Arc<ComponentRegistration>,
        most_nested: &LifetimeScope,
        parameters: Vec<Parameter>,
    ) -> Result<Self, ResolveErrorKind> {
        let activation_scope = registration.lifetime().find_scope(most_nested)?;

        Ok(Self {
            registration,
            activation_scope,
            parameters,
            new_instance: None,
            executed: false,
        })
    }

    #[inline]
    pub(crate) fn activation_scope(&self) -> &LifetimeScope {
        &self.activation_scope
    }

    /// The instance created by `execute`, if it didn't come from the cache.
    #[inline]
    pub(crate) fn new_instance(&self) -> Option<&Instance> {
        self.new_instance.as_ref()
    }

    pub(crate) fn execute(&mut self, operation: &mut ResolveOperation) -> anyhow::Result<Instance> {
        if self.executed {
            let err = ResolveErrorKind::ActivationAlreadyExecuted {
                component: self.registration.limit_type(),
            };
            error!("{}", err);
            return Err(err.into());
        }
        self.executed = true;

        match self.registration.sharing() {
            Sharing::None => {
                if self.activation_scope.is_disposed() {
                    let err = ResolveErrorKind::ScopeDisposed;
                    error!("{}", err);
                    return Err(err.into());
                }
                self.activate(operation)
            }
            Sharing::Shared => {
                let scope = self.activation_scope.clone();
                scope.get_or_create_and_share(self.registration.id(), || self.activate(operation))
            }
        }
    }

    fn activate(&mut self, operation: &mut ResolveOperation) -> anyhow::Result<Instance> {
        let registration = self.registration.clone();
        let span = debug_span!("activate", component = %registration.limit_type());
        let _guard = span.enter();

        let mut context = ResolveContext::new(operation, self.activation_scope.clone());

        let mut prepared = None;
        registration.events.raise_preparing(&mut PreparingEvent {
            context: &mut context,
            registration: &registration,
            parameters: &mut self.parameters,
            instance: &mut prepared,
        })?;

        let instance = match prepared {
            Some(instance) => {
                debug!("Instance supplied by a preparing handler");
                instance
            }
            None => registration
                .activator
                .activate(&mut context, &self.parameters)
                .map_err(|err| wrap_activation_error(&registration, err))?,
        };

        if registration.ownership() == Ownership::OwnedByLifetimeScope {
            if let Some(finalizer) = &registration.finalizer {
                self.activation_scope.add_instance_for_disposal(instance.clone(), finalizer.clone())?;
            }
        }

        let mut event = ActivatingEvent {
            context: &mut context,
            registration: &registration,
            parameters: &self.parameters,
            instance,
        };
        registration.events.raise_activating(&mut event)?;
        let instance = event.instance;

        debug!("Activated");

        self.new_instance = Some(instance.clone());
        Ok(instance)
    }

    /// Raises `Activated` for a newly created instance. No-op for instances taken from the cache.
    pub(crate) fn complete(self, operation: &mut ResolveOperation) -> anyhow::Result<()> {
        let Some(instance) = self.new_instance else {
            return Ok(());
        };

        let observer = operation.observer();
        observer.completion_beginning(&self.registration);

        let mut context = ResolveContext::new(operation, self.activation_scope);
        self.registration.events.raise_activated(&mut ActivatedEvent {
            context: &mut context,
            registration: &self.registration,
            parameters: &self.parameters,
            instance,
        })?;

        observer.completion_ending(&self.registration);
        Ok(())
    }
}

fn wrap_activation_error(registration: &ComponentRegistration, err: anyhow::Error) -> anyhow::Error {
    if err.is::<ResolveErrorKind>() {
        return err;
    }

    let err = ResolveErrorKind::Activation {
        component: registration.limit_type(),
        source: err,
    };
    error!("{}", err);
    err.into()
}

use parking_lot::RwLock;
use std::sync::Arc;

use crate::{
    any::Instance,
    inject::downcast,
    parameters::Parameter,
    registration::ComponentRegistration,
    resolve::ResolveContext,
};

/// Raised before the activator runs. A handler may alter the parameters or supply the instance itself.
pub struct PreparingEvent<'a, 'op> {
    pub context: &'a mut ResolveContext<'op>,
    pub registration: &'a ComponentRegistration,
    pub parameters: &'a mut Vec<Parameter>,
    pub instance: &'a mut Option<Instance>,
}

impl PreparingEvent<'_, '_> {
    /// Skips the activator and uses `instance` instead.
    pub fn set_instance<T: Send + Sync + 'static>(&mut self, instance: T) {
        *self.instance = Some(Arc::new(instance));
    }
}

/// Raised after the activator runs, before the instance is handed out. A handler may replace the instance.
pub struct ActivatingEvent<'a, 'op> {
    pub context: &'a mut ResolveContext<'op>,
    pub registration: &'a ComponentRegistration,
    pub parameters: &'a [Parameter],
    pub instance: Instance,
}

impl ActivatingEvent<'_, '_> {
    #[must_use]
    pub fn instance<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        downcast(self.instance.clone()).ok()
    }

    pub fn replace_instance<T: Send + Sync + 'static>(&mut self, instance: T) {
        self.instance = Arc::new(instance);
    }
}

/// Raised once the whole graph the instance was created in has been activated.
pub struct ActivatedEvent<'a, 'op> {
    pub context: &'a mut ResolveContext<'op>,
    pub registration: &'a ComponentRegistration,
    pub parameters: &'a [Parameter],
    pub instance: Instance,
}

impl ActivatedEvent<'_, '_> {
    #[must_use]
    pub fn instance<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        downcast(self.instance.clone()).ok()
    }
}

pub(crate) type PreparingHandler = Arc<dyn for<'a, 'op> Fn(&mut PreparingEvent<'a, 'op>) -> anyhow::Result<()> + Send + Sync>;
pub(crate) type ActivatingHandler = Arc<dyn for<'a, 'op> Fn(&mut ActivatingEvent<'a, 'op>) -> anyhow::Result<()> + Send + Sync>;
pub(crate) type ActivatedHandler = Arc<dyn for<'a, 'op> Fn(&mut ActivatedEvent<'a, 'op>) -> anyhow::Result<()> + Send + Sync>;

/// Subscribers of a registration, invoked synchronously in subscription order.
#[derive(Default)]
pub(crate) struct RegistrationEvents {
    preparing: RwLock<Vec<PreparingHandler>>,
    activating: RwLock<Vec<ActivatingHandler>>,
    activated: RwLock<Vec<ActivatedHandler>>,
}

impl RegistrationEvents {
    pub(crate) fn new(preparing: Vec<PreparingHandler>, activating: Vec<ActivatingHandler>, activated: Vec<ActivatedHandler>) -> Self {
        Self {
            preparing: RwLock::new(preparing),
            activating: RwLock::new(activating),
            activated: RwLock::new(activated),
        }
    }

    pub(crate) fn subscribe_preparing(&self, handler: PreparingHandler) {
        self.preparing.write().push(handler);
    }

    pub(crate) fn subscribe_activating(&self, handler: ActivatingHandler) {
        self.activating.write().push(handler);
    }

    pub(crate) fn subscribe_activated(&self, handler: ActivatedHandler) {
        self.activated.write().push(handler);
    }

    // Handlers are cloned out so they can subscribe further handlers without deadlocking.

    pub(crate) fn raise_preparing(&self, event: &mut PreparingEvent<'_, '_>) -> anyhow::Result<()> {
        let handlers = self.preparing.read().clone();
        handlers.iter().try_for_each(|handler| handler(event))
    }

    pub(crate) fn raise_activating(&self, event: &mut ActivatingEvent<'_, '_>) -> anyhow::Result<()> {
        let handlers = self.activating.read().clone();
        handlers.iter().try_for_each(|handler| handler(event))
    }

    pub(crate) fn raise_activated(&self, event: &mut ActivatedEvent<'_, '_>) -> anyhow::Result<()> {
        let handlers = self.activated.read().clone();
        handlers.iter().try_for_each(|handler| handler(event))
    }
}

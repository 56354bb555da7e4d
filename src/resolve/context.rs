use std::{borrow::Cow, sync::Arc};
use tracing::{error, warn};

use super::ResolveOperation;
use crate::{
    any::Instance,
    errors::ResolveErrorKind,
    inject::downcast,
    lifetime_scope::LifetimeScope,
    parameters::Parameter,
    registration::ComponentRegistration,
    service::Service,
};

/// Access to the container from inside an activation.
///
/// Resolves made through the context belong to the same resolve operation as the activation,
/// so they take part in cycle detection and their `Activated` events are batched with it.
pub struct ResolveContext<'op> {
    operation: &'op mut ResolveOperation,
    scope: LifetimeScope,
}

impl<'op> ResolveContext<'op> {
    pub(crate) fn new(operation: &'op mut ResolveOperation, scope: LifetimeScope) -> Self {
        Self { operation, scope }
    }

    /// The scope that owns the instance being activated.
    #[inline]
    #[must_use]
    pub fn scope(&self) -> &LifetimeScope {
        &self.scope
    }

    /// # Errors
    /// Returns an error if `T` isn't registered or can't be activated.
    pub fn resolve<T: Send + Sync + 'static>(&mut self) -> anyhow::Result<Arc<T>> {
        self.resolve_with(Vec::new())
    }

    /// # Errors
    /// Returns an error if `T` isn't registered or can't be activated.
    pub fn resolve_with<T: Send + Sync + 'static>(&mut self, parameters: Vec<Parameter>) -> anyhow::Result<Arc<T>> {
        let instance = self.resolve_service(&Service::of::<T>(), parameters)?;
        Ok(downcast(instance)?)
    }

    /// # Errors
    /// Returns an error if `T` isn't registered under `key` or can't be activated.
    pub fn resolve_named<T: Send + Sync + 'static>(&mut self, key: impl Into<Cow<'static, str>>) -> anyhow::Result<Arc<T>> {
        let instance = self.resolve_service(&Service::keyed::<T>(key), Vec::new())?;
        Ok(downcast(instance)?)
    }

    /// # Errors
    /// Returns an error if `T` is registered but can't be activated.
    pub fn resolve_optional<T: Send + Sync + 'static>(&mut self) -> anyhow::Result<Option<Arc<T>>> {
        let service = Service::of::<T>();
        if !self.scope.is_registered_service(&service) {
            warn!(%service, "Not registered, resolving as none");
            return Ok(None);
        }
        self.resolve_with(Vec::new()).map(Some)
    }

    /// # Errors
    /// Returns an error if `service` isn't registered or can't be activated.
    pub fn resolve_service(&mut self, service: &Service, parameters: Vec<Parameter>) -> anyhow::Result<Instance> {
        let Some(registration) = self.scope.registry().registration_for(service) else {
            let err = ResolveErrorKind::ComponentNotRegistered { service: service.clone() };
            error!("{}", err);
            return Err(err.into());
        };
        self.resolve_registration(registration, parameters)
    }

    #[must_use]
    pub fn is_registered<T: ?Sized + 'static>(&self) -> bool {
        self.scope.is_registered::<T>()
    }

    pub(crate) fn resolve_registration(&mut self, registration: Arc<ComponentRegistration>, parameters: Vec<Parameter>) -> anyhow::Result<Instance> {
        self.operation.get_or_create_instance(&self.scope, registration, parameters)
    }
}

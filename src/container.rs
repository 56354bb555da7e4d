use std::{borrow::Cow, sync::Arc};
use tracing::debug;

use crate::{
    any::Instance,
    config::ContainerConfig,
    errors::{ResolveErrorKind, ScopeErrorKind},
    lifetime::Lifetime,
    lifetime_scope::{ChildScopeBuilder, LifetimeScope, ScopeId},
    parameters::Parameter,
    registration::{ComponentRegistration, RegistrationBuilder},
    registry::ComponentRegistry,
    resolve::{NoopObserver, ResolveObserver},
    scope::Tag,
    service::Service,
};

/// Collects registrations and builds a [`Container`] from them.
///
/// Also used to add registrations to a child scope, see [`ChildScopeBuilder::with_registrations`].
#[derive(Default)]
pub struct ContainerBuilder {
    registrations: Vec<ComponentRegistration>,
    adapters: Vec<ComponentRegistration>,
    observer: Option<Arc<dyn ResolveObserver>>,
    config: ContainerConfig,
}

impl ContainerBuilder {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a registration. When a service has several registrations, the last one is resolved by default.
    #[must_use]
    pub fn provide<T: Send + Sync + 'static>(mut self, registration: RegistrationBuilder<T>) -> Self {
        let (registration, adapter) = registration.build();
        self.registrations.push(registration);
        self.adapters.extend(adapter);
        self
    }

    /// Sets the observer notified by every scope and resolve operation of the container.
    #[must_use]
    pub fn observer(mut self, observer: Arc<dyn ResolveObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Sets the nesting depth above which a resolve operation fails with [`ResolveErrorKind::MaxResolveDepthExceeded`].
    #[must_use]
    pub fn max_resolve_depth(mut self, depth: usize) -> Self {
        self.config.max_resolve_depth = depth;
        self
    }

    #[must_use]
    pub fn build(mut self) -> Container {
        self.adapters.push(ComponentRegistration::lifetime_scope());

        let observer = self.observer.take().unwrap_or_else(|| Arc::new(NoopObserver));
        let config = self.config;
        let registry = self.into_registry(None, None);

        debug!("Container built");

        Container {
            root: LifetimeScope::new_root(registry, observer, config),
        }
    }

    /// Layers the registrations over `parent`.
    ///
    /// Registrations of a child scope that would be owned by the root are owned by the declaring scope instead,
    /// so the root never holds instances built from registrations it can't see.
    pub(crate) fn into_registry(self, parent: Option<Arc<ComponentRegistry>>, declaring: Option<ScopeId>) -> ComponentRegistry {
        let mut registry = ComponentRegistry::with_parent(parent);

        for mut registration in self.registrations {
            if let (Some(id), Lifetime::RootScope) = (declaring, &registration.config.lifetime) {
                registration.config.lifetime = Lifetime::Declaring(id);
            }
            registry.add_registration(registration);
        }
        for adapter in self.adapters {
            registry.add_adapter(adapter);
        }

        registry
    }
}

/// Owner of the root lifetime scope.
///
/// Dropping the container doesn't dispose the root while other handles to it are alive, call [`Container::dispose`] for that.
pub struct Container {
    root: LifetimeScope,
}

impl Container {
    #[inline]
    #[must_use]
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> &LifetimeScope {
        &self.root
    }

    /// # Errors
    /// See [`LifetimeScope::resolve`].
    #[inline]
    pub fn resolve<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, ResolveErrorKind> {
        self.root.resolve()
    }

    /// # Errors
    /// See [`LifetimeScope::resolve`].
    #[inline]
    pub fn resolve_with<T: Send + Sync + 'static>(&self, parameters: Vec<Parameter>) -> Result<Arc<T>, ResolveErrorKind> {
        self.root.resolve_with(parameters)
    }

    /// # Errors
    /// See [`LifetimeScope::resolve`].
    #[inline]
    pub fn resolve_named<T: Send + Sync + 'static>(&self, key: impl Into<Cow<'static, str>>) -> Result<Arc<T>, ResolveErrorKind> {
        self.root.resolve_named(key)
    }

    /// # Errors
    /// See [`LifetimeScope::resolve_optional`].
    #[inline]
    pub fn resolve_optional<T: Send + Sync + 'static>(&self) -> Result<Option<Arc<T>>, ResolveErrorKind> {
        self.root.resolve_optional()
    }

    /// # Errors
    /// See [`LifetimeScope::resolve`].
    #[inline]
    pub fn resolve_service(&self, service: &Service, parameters: Vec<Parameter>) -> Result<Instance, ResolveErrorKind> {
        self.root.resolve_service(service, parameters)
    }

    #[inline]
    #[must_use]
    pub fn is_registered<T: ?Sized + 'static>(&self) -> bool {
        self.root.is_registered::<T>()
    }

    #[inline]
    #[must_use]
    pub fn enter(&self) -> ChildScopeBuilder {
        self.root.enter()
    }

    /// # Errors
    /// Returns [`ScopeErrorKind::Disposed`] if the container has been disposed.
    #[inline]
    pub fn begin_lifetime_scope(&self) -> Result<LifetimeScope, ScopeErrorKind> {
        self.root.begin_lifetime_scope()
    }

    /// # Errors
    /// Returns [`ScopeErrorKind::Disposed`] if the container has been disposed.
    #[inline]
    pub fn begin_lifetime_scope_with_tag(&self, tag: impl Into<Tag>) -> Result<LifetimeScope, ScopeErrorKind> {
        self.root.begin_lifetime_scope_with_tag(tag)
    }

    /// Disposes the root scope, finalizing the instances it owns.
    #[inline]
    pub fn dispose(&self) {
        self.root.dispose();
    }
}

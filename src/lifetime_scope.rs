use core::{
    fmt::{self, Debug, Formatter},
    sync::atomic::{AtomicBool, AtomicU64, Ordering},
};
use parking_lot::{Mutex, ReentrantMutex};
use std::{
    borrow::Cow,
    collections::BTreeMap,
    sync::{Arc, Weak},
};
use tracing::{debug, debug_span, error, warn};

use crate::{
    any::Instance,
    config::ContainerConfig,
    container::ContainerBuilder,
    disposer::Disposer,
    errors::{ResolveErrorKind, ScopeErrorKind},
    finalizer::BoxedFinalizer,
    inject::downcast,
    parameters::Parameter,
    registration::ComponentId,
    registry::ComponentRegistry,
    resolve::{ResolveObserver, ResolveOperation},
    scope::Tag,
    service::Service,
};

/// Process-wide identity of a lifetime scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScopeId(u64);

impl ScopeId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

struct ScopeInner {
    id: ScopeId,
    tag: Option<Tag>,
    parent: Option<LifetimeScope>,
    root: Option<LifetimeScope>,
    registry: Arc<ComponentRegistry>,
    // Held while a shared instance is created, so concurrent callers wait for the first one
    sharing_lock: ReentrantMutex<()>,
    shared_instances: Mutex<BTreeMap<ComponentId, Instance>>,
    disposer: Disposer,
    disposed: AtomicBool,
    observer: Arc<dyn ResolveObserver>,
    config: ContainerConfig,
}

impl ScopeInner {
    fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }

        let span = debug_span!("dispose", scope = ?self.id);
        let _guard = span.enter();

        self.disposer.dispose();
        self.shared_instances.lock().clear();
        self.observer.scope_ending(self.id, self.tag.as_ref());

        debug!("Scope disposed");
    }
}

impl Drop for ScopeInner {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Disposes the scope when the last owning handle is dropped.
/// Disposal clears the cache, releasing any handles cached instances hold to their own scope.
struct ScopeOwner(Arc<ScopeInner>);

impl Drop for ScopeOwner {
    fn drop(&mut self) {
        self.0.dispose();
    }
}

/// A node in the tree of nested lifetime scopes.
///
/// Each scope caches the shared instances it owns and finalizes the instances it owns when disposed.
/// Handles are cheap to clone; the scope is disposed on [`LifetimeScope::dispose`] or when the last owning handle is dropped.
///
/// Handles returned by [`LifetimeScope::begin_lifetime_scope`] and their clones are owning.
/// Handles injected into components, or resolved as a `LifetimeScope` dependency, aren't:
/// they don't keep the scope from being disposed.
#[derive(Clone)]
pub struct LifetimeScope {
    inner: Arc<ScopeInner>,
    owner: Option<Arc<ScopeOwner>>,
}

impl LifetimeScope {
    pub(crate) fn new_root(registry: ComponentRegistry, observer: Arc<dyn ResolveObserver>, config: ContainerConfig) -> Self {
        Self::new(ScopeId::next(), Some(Tag::ROOT), None, Arc::new(registry), observer, config)
    }

    fn new(
        id: ScopeId,
        tag: Option<Tag>,
        parent: Option<LifetimeScope>,
        registry: Arc<ComponentRegistry>,
        observer: Arc<dyn ResolveObserver>,
        config: ContainerConfig,
    ) -> Self {
        let root = parent.as_ref().map(LifetimeScope::root);
        observer.scope_beginning(id, tag.as_ref());
        debug!(scope = ?id, tag = ?tag, "Scope created");

        let inner = Arc::new(ScopeInner {
            id,
            tag,
            parent,
            root,
            registry,
            sharing_lock: ReentrantMutex::new(()),
            shared_instances: Mutex::new(BTreeMap::new()),
            disposer: Disposer::new(),
            disposed: AtomicBool::new(false),
            observer,
            config,
        });

        Self {
            owner: Some(Arc::new(ScopeOwner(inner.clone()))),
            inner,
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> ScopeId {
        self.inner.id
    }

    #[inline]
    #[must_use]
    pub fn tag(&self) -> Option<&Tag> {
        self.inner.tag.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<&LifetimeScope> {
        self.inner.parent.as_ref()
    }

    #[must_use]
    pub fn root(&self) -> LifetimeScope {
        match &self.inner.root {
            Some(root) => root.clone(),
            None => self.clone(),
        }
    }

    /// This scope followed by its ancestors up to the root.
    pub fn ancestors(&self) -> impl Iterator<Item = LifetimeScope> {
        let mut next = Some(self.clone());
        core::iter::from_fn(move || {
            let current = next.take()?;
            next = current.parent().cloned();
            Some(current)
        })
    }

    #[inline]
    #[must_use]
    pub fn registry(&self) -> Arc<ComponentRegistry> {
        self.inner.registry.clone()
    }

    #[inline]
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }

    #[inline]
    #[must_use]
    pub(crate) fn observer(&self) -> Arc<dyn ResolveObserver> {
        self.inner.observer.clone()
    }

    #[inline]
    #[must_use]
    pub(crate) fn config(&self) -> ContainerConfig {
        self.inner.config
    }

    /// Handle to the same scope that doesn't keep it from being disposed.
    #[must_use]
    pub(crate) fn unowned(&self) -> LifetimeScope {
        LifetimeScope {
            inner: self.inner.clone(),
            owner: None,
        }
    }

    #[must_use]
    pub(crate) fn downgrade(&self) -> WeakLifetimeScope {
        WeakLifetimeScope(Arc::downgrade(&self.inner))
    }

    /// Returns the instance cached for `id`, creating and caching it with `create` if there's none yet.
    ///
    /// Concurrent callers block until the first creation finishes, so `create` runs at most once per scope
    /// and every caller observes the same instance. The lock is reentrant: nested creations of other
    /// components on the same thread proceed.
    pub(crate) fn get_or_create_and_share<F>(&self, id: ComponentId, create: F) -> anyhow::Result<Instance>
    where
        F: FnOnce() -> anyhow::Result<Instance>,
    {
        let _sharing = self.inner.sharing_lock.lock();

        if self.is_disposed() {
            let err = ResolveErrorKind::ScopeDisposed;
            error!("{}", err);
            return Err(err.into());
        }

        let cached = self.inner.shared_instances.lock().get(&id).cloned();
        if let Some(instance) = cached {
            debug!("Found in cache");
            return Ok(instance);
        }
        debug!("Not found in cache");

        let instance = create()?;
        let instance = self.inner.shared_instances.lock().entry(id).or_insert(instance).clone();

        debug!("Cached");
        Ok(instance)
    }

    pub(crate) fn add_instance_for_disposal(&self, instance: Instance, finalizer: BoxedFinalizer) -> Result<(), ResolveErrorKind> {
        self.inner.disposer.add_instance_for_disposal(instance, finalizer)
    }

    /// Finalizes the instances this scope owns, in reverse order of creation.
    /// Child scopes aren't disposed. Calls after the first are no-ops.
    pub fn dispose(&self) {
        self.inner.dispose();
    }

    /// Starts building a child scope.
    #[inline]
    #[must_use]
    pub fn enter(&self) -> ChildScopeBuilder {
        ChildScopeBuilder {
            parent: self.clone(),
            tag: None,
            registrations: None,
        }
    }

    /// # Errors
    /// Returns [`ScopeErrorKind::Disposed`] if this scope has been disposed.
    pub fn begin_lifetime_scope(&self) -> Result<LifetimeScope, ScopeErrorKind> {
        self.enter().build()
    }

    /// # Errors
    /// Returns [`ScopeErrorKind::Disposed`] if this scope has been disposed.
    pub fn begin_lifetime_scope_with_tag(&self, tag: impl Into<Tag>) -> Result<LifetimeScope, ScopeErrorKind> {
        self.enter().with_tag(tag).build()
    }

    /// # Errors
    /// Returns [`ResolveErrorKind::ComponentNotRegistered`] if `T` isn't registered,
    /// or any error raised while activating it or its dependencies.
    pub fn resolve<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, ResolveErrorKind> {
        self.resolve_with(Vec::new())
    }

    /// Resolves `T`, supplying `parameters` to the constructor or delegate of the requested component.
    /// # Errors
    /// See [`Self::resolve`].
    pub fn resolve_with<T: Send + Sync + 'static>(&self, parameters: Vec<Parameter>) -> Result<Arc<T>, ResolveErrorKind> {
        let instance = self.resolve_service(&Service::of::<T>(), parameters)?;
        downcast(instance)
    }

    /// # Errors
    /// See [`Self::resolve`].
    pub fn resolve_named<T: Send + Sync + 'static>(&self, key: impl Into<Cow<'static, str>>) -> Result<Arc<T>, ResolveErrorKind> {
        let instance = self.resolve_service(&Service::keyed::<T>(key), Vec::new())?;
        downcast(instance)
    }

    /// Like [`Self::resolve`], but returns `None` if `T` isn't registered.
    /// # Errors
    /// Any error other than a missing registration of `T` itself.
    pub fn resolve_optional<T: Send + Sync + 'static>(&self) -> Result<Option<Arc<T>>, ResolveErrorKind> {
        let service = Service::of::<T>();
        if !self.inner.registry.is_registered(&service) {
            warn!(%service, "Not registered, resolving as none");
            return Ok(None);
        }
        self.resolve_service(&service, Vec::new()).and_then(downcast).map(Some)
    }

    /// Resolves `service` in a new resolve operation.
    /// # Errors
    /// See [`Self::resolve`].
    pub fn resolve_service(&self, service: &Service, parameters: Vec<Parameter>) -> Result<Instance, ResolveErrorKind> {
        if self.is_disposed() {
            let err = ResolveErrorKind::ScopeDisposed;
            error!("{}", err);
            return Err(err);
        }

        let Some(registration) = self.inner.registry.registration_for(service) else {
            let err = ResolveErrorKind::ComponentNotRegistered { service: service.clone() };
            error!("{}", err);
            return Err(err);
        };

        ResolveOperation::new(self.clone()).execute(service, registration, parameters)
    }

    #[must_use]
    pub fn is_registered<T: ?Sized + 'static>(&self) -> bool {
        self.inner.registry.is_registered(&Service::of::<T>())
    }

    #[must_use]
    pub fn is_registered_service(&self, service: &Service) -> bool {
        self.inner.registry.is_registered(service)
    }
}

impl Debug for LifetimeScope {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifetimeScope")
            .field("id", &self.inner.id)
            .field("tag", &self.inner.tag)
            .field("disposed", &self.is_disposed())
            .finish_non_exhaustive()
    }
}

/// Handle that doesn't keep the scope alive.
#[derive(Clone)]
pub(crate) struct WeakLifetimeScope(Weak<ScopeInner>);

impl WeakLifetimeScope {
    #[must_use]
    pub(crate) fn upgrade(&self) -> Option<LifetimeScope> {
        self.0.upgrade().map(|inner| LifetimeScope { inner, owner: None })
    }
}

/// Builder of a child lifetime scope.
///
/// Registrations added with [`Self::with_registrations`] are only visible from the child and its descendants,
/// and take precedence over the parent's.
pub struct ChildScopeBuilder {
    parent: LifetimeScope,
    tag: Option<Tag>,
    registrations: Option<ContainerBuilder>,
}

impl ChildScopeBuilder {
    #[inline]
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<Tag>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Adds registrations to the child. Builder settings other than registrations are inherited from the parent.
    #[must_use]
    pub fn with_registrations<F>(mut self, configure: F) -> Self
    where
        F: FnOnce(ContainerBuilder) -> ContainerBuilder,
    {
        let builder = self.registrations.take().unwrap_or_default();
        self.registrations = Some(configure(builder));
        self
    }

    /// # Errors
    /// Returns [`ScopeErrorKind::Disposed`] if the parent scope has been disposed.
    pub fn build(self) -> Result<LifetimeScope, ScopeErrorKind> {
        let Self { parent, tag, registrations } = self;

        if parent.is_disposed() {
            let err = ScopeErrorKind::Disposed;
            error!("{}", err);
            return Err(err);
        }

        let id = ScopeId::next();
        let registry = match registrations {
            Some(builder) => Arc::new(builder.into_registry(Some(parent.registry()), Some(id))),
            None => parent.registry(),
        };
        let observer = parent.observer();
        let config = parent.config();

        Ok(LifetimeScope::new(id, tag, Some(parent), registry, observer, config))
    }
}

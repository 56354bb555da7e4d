use core::{
    fmt::{self, Debug, Formatter},
    marker::PhantomData,
    sync::atomic::{AtomicU64, Ordering},
};
use std::{borrow::Cow, collections::BTreeMap, sync::Arc};

use crate::{
    activators::{
        reflection::{
            Constructor, ConstructorFinder, ConstructorSelector, MostParametersConstructorSelector, PublicConstructorFinder,
            ReflectionActivator,
        },
        DelegateActivator, InstanceActivator, ProvidedInstanceActivator,
    },
    any::{Instance, TypeInfo},
    config::{Config, Ownership, Sharing},
    dependency_resolver::DependencyResolver,
    disposer::Disposable,
    events::{ActivatedEvent, ActivatingEvent, PreparingEvent, RegistrationEvents},
    factory::Factory,
    finalizer::{boxed_disposable, boxed_finalizer, BoxedFinalizer, Finalizer},
    inject::downcast,
    instantiator::Instantiator,
    lifetime::Lifetime,
    lifetime_scope::LifetimeScope,
    parameters::Parameter,
    resolve::ResolveContext,
    scope::Tag,
    service::Service,
};

/// Process-wide identity of a registration, shared by every scope that can see it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComponentId(u64);

impl ComponentId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

pub(crate) type PropertyInjector = Arc<dyn for<'op> Fn(&mut ResolveContext<'op>, &Instance) -> anyhow::Result<()> + Send + Sync>;

/// A recipe for instances of a component: how they are activated, which scope owns them and which services they satisfy.
///
/// Immutable once built, except for event subscriptions.
pub struct ComponentRegistration {
    pub(crate) id: ComponentId,
    pub(crate) activator: Arc<dyn InstanceActivator>,
    pub(crate) config: Config,
    pub(crate) services: Vec<Service>,
    pub(crate) metadata: BTreeMap<Cow<'static, str>, Instance>,
    pub(crate) events: RegistrationEvents,
    pub(crate) property_injectors: Vec<PropertyInjector>,
    pub(crate) finalizer: Option<BoxedFinalizer>,
}

impl ComponentRegistration {
    #[inline]
    #[must_use]
    pub fn id(&self) -> ComponentId {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn activator(&self) -> &dyn InstanceActivator {
        self.activator.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn limit_type(&self) -> TypeInfo {
        self.activator.limit_type()
    }

    #[inline]
    #[must_use]
    pub fn lifetime(&self) -> &Lifetime {
        &self.config.lifetime
    }

    #[inline]
    #[must_use]
    pub fn sharing(&self) -> Sharing {
        self.config.sharing
    }

    #[inline]
    #[must_use]
    pub fn ownership(&self) -> Ownership {
        self.config.ownership
    }

    #[inline]
    #[must_use]
    pub fn services(&self) -> &[Service] {
        &self.services
    }

    #[must_use]
    pub fn metadata<V: Send + Sync + 'static>(&self, key: &str) -> Option<Arc<V>> {
        self.metadata.get(key).and_then(|value| downcast(value.clone()).ok())
    }

    pub fn on_preparing<F>(&self, handler: F)
    where
        F: for<'a, 'op> Fn(&mut PreparingEvent<'a, 'op>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.events.subscribe_preparing(Arc::new(handler));
    }

    pub fn on_activating<F>(&self, handler: F)
    where
        F: for<'a, 'op> Fn(&mut ActivatingEvent<'a, 'op>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.events.subscribe_activating(Arc::new(handler));
    }

    pub fn on_activated<F>(&self, handler: F)
    where
        F: for<'a, 'op> Fn(&mut ActivatedEvent<'a, 'op>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.events.subscribe_activated(Arc::new(handler));
    }

    /// Registration handing out the lifetime scope an instance is requested from.
    /// The handle isn't owning, so instances cached by the scope can hold it.
    pub(crate) fn lifetime_scope() -> Self {
        RegistrationBuilder::<LifetimeScope>::new()
            .delegate(|context, _| Ok(context.scope().unowned()))
            .externally_owned()
            .build_registration()
    }
}

impl Debug for ComponentRegistration {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRegistration")
            .field("id", &self.id)
            .field("limit_type", &self.limit_type())
            .field("config", &self.config)
            .field("services", &self.services)
            .finish_non_exhaustive()
    }
}

/// Builder of a [`ComponentRegistration`] for components of type `T`.
///
/// Without any other configuration the component is activated from its constructors,
/// created anew for every dependency and exposed as its own type.
pub struct RegistrationBuilder<T> {
    constructors: Vec<Constructor>,
    activator: Option<Arc<dyn InstanceActivator>>,
    finder: Arc<dyn ConstructorFinder>,
    selector: Arc<dyn ConstructorSelector>,
    parameters: Vec<Parameter>,
    config: Config,
    services: Vec<Service>,
    metadata: BTreeMap<Cow<'static, str>, Instance>,
    preparing: Vec<crate::events::PreparingHandler>,
    activating: Vec<crate::events::ActivatingHandler>,
    activated: Vec<crate::events::ActivatedHandler>,
    property_injectors: Vec<PropertyInjector>,
    finalizer: Option<BoxedFinalizer>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> Default for RegistrationBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + Sync + 'static> RegistrationBuilder<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            constructors: Vec::new(),
            activator: None,
            finder: Arc::new(PublicConstructorFinder),
            selector: Arc::new(MostParametersConstructorSelector),
            parameters: Vec::new(),
            config: Config::default(),
            services: Vec::new(),
            metadata: BTreeMap::new(),
            preparing: Vec::new(),
            activating: Vec::new(),
            activated: Vec::new(),
            property_injectors: Vec::new(),
            finalizer: None,
            _marker: PhantomData,
        }
    }

    /// Adds a constructor. Components with several constructors are activated with the best one that can be satisfied.
    #[must_use]
    pub fn constructor<Inst, Deps>(self, instantiator: Inst) -> Self
    where
        Inst: Instantiator<Deps, Provides = T, Error = anyhow::Error>,
        Deps: DependencyResolver,
    {
        self.with_constructor(Constructor::new(instantiator))
    }

    #[must_use]
    pub fn with_constructor(mut self, constructor: Constructor) -> Self {
        self.activator = None;
        self.constructors.push(constructor);
        self
    }

    /// Activates the component with `delegate` instead of its constructors.
    #[must_use]
    pub fn delegate<F>(mut self, delegate: F) -> Self
    where
        F: for<'op> Fn(&mut ResolveContext<'op>, &[Parameter]) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        self.activator = Some(Arc::new(DelegateActivator::new(delegate)));
        self
    }

    /// Hands out `instance`, created outside the container. The instance is a single instance of the root scope
    /// and is not finalized unless a finalizer is configured.
    #[must_use]
    pub fn instance(mut self, instance: T) -> Self {
        self.activator = Some(Arc::new(ProvidedInstanceActivator::new(instance)));
        self.single_instance()
    }

    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn instance_per_dependency(mut self) -> Self {
        self.config.lifetime = Lifetime::CurrentScope;
        self.config.sharing = Sharing::None;
        self
    }

    #[must_use]
    pub fn single_instance(mut self) -> Self {
        self.config.lifetime = Lifetime::RootScope;
        self.config.sharing = Sharing::Shared;
        self
    }

    #[must_use]
    pub fn instance_per_lifetime_scope(mut self) -> Self {
        self.config.lifetime = Lifetime::CurrentScope;
        self.config.sharing = Sharing::Shared;
        self
    }

    #[must_use]
    pub fn instance_per_matching_lifetime_scope<I>(mut self, tags: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Tag>,
    {
        self.config.lifetime = Lifetime::matching(tags);
        self.config.sharing = Sharing::Shared;
        self
    }

    #[must_use]
    pub fn externally_owned(mut self) -> Self {
        self.config.ownership = Ownership::ExternallyOwned;
        self
    }

    #[must_use]
    pub fn owned_by_lifetime_scope(mut self) -> Self {
        self.config.ownership = Ownership::OwnedByLifetimeScope;
        self
    }

    /// Exposes the component under `key`. Unless [`Self::as_self`] is also called, it's no longer resolvable by type alone.
    #[must_use]
    pub fn named(mut self, key: impl Into<Cow<'static, str>>) -> Self {
        self.services.push(Service::keyed::<T>(key));
        self
    }

    #[must_use]
    pub fn as_self(mut self) -> Self {
        self.services.push(Service::of::<T>());
        self
    }

    /// Parameter consulted when activating from constructors, after the ones passed to the resolve call.
    #[must_use]
    pub fn with_parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    #[must_use]
    pub fn with_metadata<V: Send + Sync + 'static>(mut self, key: impl Into<Cow<'static, str>>, value: V) -> Self {
        self.metadata.insert(key.into(), Arc::new(value));
        self
    }

    #[must_use]
    pub fn on_preparing<F>(mut self, handler: F) -> Self
    where
        F: for<'a, 'op> Fn(&mut PreparingEvent<'a, 'op>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.preparing.push(Arc::new(handler));
        self
    }

    #[must_use]
    pub fn on_activating<F>(mut self, handler: F) -> Self
    where
        F: for<'a, 'op> Fn(&mut ActivatingEvent<'a, 'op>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.activating.push(Arc::new(handler));
        self
    }

    #[must_use]
    pub fn on_activated<F>(mut self, handler: F) -> Self
    where
        F: for<'a, 'op> Fn(&mut ActivatedEvent<'a, 'op>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.activated.push(Arc::new(handler));
        self
    }

    /// Sets dependencies on new instances after they're built.
    /// Runs once the instance is off the activation stack, so properties may refer back to it.
    #[must_use]
    pub fn inject_properties<F>(mut self, injector: F) -> Self
    where
        F: for<'op> Fn(&mut ResolveContext<'op>, &T) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.property_injectors.push(Arc::new(move |context: &mut ResolveContext<'_>, instance: &Instance| {
            let instance = downcast::<T>(instance.clone())?;
            injector(context, &instance)
        }));
        self
    }

    /// Called with every instance the owning scope created, when the scope is disposed.
    /// Not called for externally owned components.
    #[must_use]
    pub fn finalizer<Fin>(mut self, finalizer: Fin) -> Self
    where
        Fin: Finalizer<T>,
    {
        self.finalizer = Some(boxed_finalizer(finalizer));
        self
    }

    #[must_use]
    pub fn disposable(mut self) -> Self
    where
        T: Disposable,
    {
        self.finalizer = Some(boxed_disposable::<T>());
        self
    }

    #[must_use]
    pub fn find_constructors_with<F: ConstructorFinder + 'static>(mut self, finder: F) -> Self {
        self.finder = Arc::new(finder);
        self
    }

    #[must_use]
    pub fn using_constructor_selector<S: ConstructorSelector + 'static>(mut self, selector: S) -> Self {
        self.selector = Arc::new(selector);
        self
    }

    pub(crate) fn build_registration(self) -> ComponentRegistration {
        let activator = match self.activator {
            Some(activator) => activator,
            None => Arc::new(
                ReflectionActivator::new(TypeInfo::of::<T>(), self.constructors)
                    .with_finder(self.finder)
                    .with_selector(self.selector)
                    .with_parameters(self.parameters),
            ),
        };
        let services = if self.services.is_empty() {
            vec![Service::of::<T>()]
        } else {
            self.services
        };

        ComponentRegistration {
            id: ComponentId::next(),
            activator,
            config: self.config,
            services,
            metadata: self.metadata,
            events: RegistrationEvents::new(self.preparing, self.activating, self.activated),
            property_injectors: self.property_injectors,
            finalizer: self.finalizer,
        }
    }

    /// Builds the registration and, if it's exposed as its own type, the [`Factory`] adapter for it.
    pub(crate) fn build(self) -> (ComponentRegistration, Option<ComponentRegistration>) {
        let registration = self.build_registration();
        let adapter = registration
            .services
            .contains(&Service::of::<T>())
            .then(|| Factory::<T>::adapter_registration());

        (registration, adapter)
    }
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::RegistrationBuilder;
    use crate::{
        activators::ActivatorKind,
        config::{Ownership, Sharing},
        lifetime::Lifetime,
        service::Service,
        Factory,
    };

    struct Logger;

    #[test]
    #[traced_test]
    fn test_defaults() {
        let (registration, adapter) = RegistrationBuilder::new().constructor(|| Ok(Logger)).build();

        assert_eq!(registration.lifetime(), &Lifetime::CurrentScope);
        assert_eq!(registration.sharing(), Sharing::None);
        assert_eq!(registration.ownership(), Ownership::OwnedByLifetimeScope);
        assert_eq!(registration.services(), &[Service::of::<Logger>()]);
        assert_eq!(registration.activator().kind(), ActivatorKind::Reflection);

        let adapter = adapter.unwrap();
        assert_eq!(adapter.services(), &[Service::of::<Factory<Logger>>()]);
        assert_eq!(adapter.activator().kind(), ActivatorKind::Delegate);
    }

    #[test]
    #[traced_test]
    fn test_named_only_has_no_factory() {
        let (registration, adapter) = RegistrationBuilder::new().constructor(|| Ok(Logger)).named("audit").build();

        assert_eq!(registration.services(), &[Service::keyed::<Logger>("audit")]);
        assert!(adapter.is_none());
    }

    #[test]
    #[traced_test]
    fn test_sharing_shortcuts() {
        let single = RegistrationBuilder::new().constructor(|| Ok(Logger)).single_instance().build_registration();
        let scoped = RegistrationBuilder::new()
            .constructor(|| Ok(Logger))
            .instance_per_matching_lifetime_scope(["request"])
            .build_registration();
        let provided = RegistrationBuilder::new().instance(Logger).externally_owned().build_registration();

        assert_eq!(single.lifetime(), &Lifetime::RootScope);
        assert_eq!(single.sharing(), Sharing::Shared);
        assert_eq!(scoped.lifetime(), &Lifetime::matching(["request"]));
        assert_eq!(provided.activator().kind(), ActivatorKind::ProvidedInstance);
        assert_eq!(provided.ownership(), Ownership::ExternallyOwned);
        assert_ne!(single.id(), scoped.id());
    }

    #[test]
    #[traced_test]
    fn test_metadata() {
        let registration = RegistrationBuilder::new()
            .constructor(|| Ok(Logger))
            .with_metadata("level", 3u8)
            .build_registration();

        assert_eq!(registration.metadata::<u8>("level").as_deref(), Some(&3));
        assert!(registration.metadata::<u16>("level").is_none());
        assert!(registration.metadata::<u8>("missing").is_none());
    }
}

#[macro_use]
pub(crate) mod macros;

pub(crate) mod activators;
pub(crate) mod any;
pub(crate) mod config;
pub(crate) mod container;
pub(crate) mod dependency_resolver;
pub(crate) mod disposer;
pub(crate) mod errors;
pub(crate) mod events;
pub(crate) mod factory;
pub(crate) mod finalizer;
pub(crate) mod inject;
pub(crate) mod instantiator;
pub(crate) mod lifetime;
pub(crate) mod lifetime_scope;
pub(crate) mod parameters;
pub(crate) mod registration;
pub(crate) mod registry;
pub(crate) mod resolve;
pub(crate) mod scope;
pub(crate) mod service;

pub use activators::{
    reflection::{
        AllConstructorFinder, Constructor, ConstructorBinding, ConstructorFinder, ConstructorSelector, MostParametersConstructorSelector,
        PublicConstructorFinder, ReflectionActivator,
    },
    ActivatorKind, DelegateActivator, InstanceActivator, ProvidedInstanceActivator,
};
pub use any::{Instance, TypeInfo};
pub use config::{Config, ContainerConfig, Ownership, Sharing};
pub use container::{Container, ContainerBuilder};
pub use dependency_resolver::{Arguments, DependencyResolver};
pub use disposer::Disposable;
pub use errors::{MissingDependency, ResolveErrorKind, ScopeErrorKind};
pub use events::{ActivatedEvent, ActivatingEvent, PreparingEvent};
pub use factory::Factory;
pub use finalizer::Finalizer;
pub use inject::{Arg, Inject, Optional};
pub use instantiator::Instantiator;
pub use lifetime::Lifetime;
pub use lifetime_scope::{ChildScopeBuilder, LifetimeScope, ScopeId};
pub use parameters::{Argument, Parameter, ParameterInfo};
pub use registration::{ComponentId, ComponentRegistration, RegistrationBuilder};
pub use registry::ComponentRegistry;
pub use resolve::{ResolveContext, ResolveObserver};
pub use scope::{DefaultScope, Scope, Tag};
pub use service::Service;

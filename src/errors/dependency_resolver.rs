use core::{
    any::TypeId,
    fmt::{self, Display, Formatter},
};

use super::join;
use crate::{any::TypeInfo, parameters::ParameterInfo, scope::Tag, service::Service};

#[derive(thiserror::Error, Debug)]
pub enum ResolveErrorKind {
    #[error("The requested service `{service}` has not been registered")]
    ComponentNotRegistered { service: Service },
    #[error("Circular component dependency detected: {}", join(.path, " -> "))]
    CircularDependency { path: Vec<TypeInfo> },
    #[error(
        "Probable circular dependency between non-reflection components. Resolve depth exceeded {depth}: {}",
        join(.path, " -> ")
    )]
    MaxResolveDepthExceeded { depth: usize, path: Vec<TypeInfo> },
    #[error("No constructors on type `{type_info}` can be found with the constructor finder")]
    NoConstructorsAvailable { type_info: TypeInfo },
    #[error(
        "None of the constructors found for type `{type_info}` can be invoked with the available services and parameters: {}",
        join(.missing, "; ")
    )]
    NoResolvableConstructor { type_info: TypeInfo, missing: Vec<MissingDependency> },
    #[error(
        "No scope with a tag matching [{}] is visible from the scope in which the instance was requested",
        join(.tags, ", ")
    )]
    LifetimeScopeNotFound { tags: Vec<Tag> },
    #[error("Activation of `{component}` has already been executed")]
    ActivationAlreadyExecuted { component: TypeInfo },
    #[error("The resolve operation has already ended: temporary context disposed. Resolve from a lifetime scope instead")]
    OperationAlreadyEnded,
    #[error("Instances can't be resolved and nested lifetimes can't be created from this scope as it has already been disposed")]
    ScopeDisposed,
    #[error("Incorrect instance type. Actual: {actual:?}, expected: {expected}")]
    IncorrectType { expected: TypeInfo, actual: TypeId },
    #[error("Null was supplied for parameter {parameter} which doesn't accept it")]
    NullArgument { parameter: ParameterInfo },
    #[error("Constructor expects {expected} arguments, but {actual} were bound")]
    ArgumentCountMismatch { expected: usize, actual: usize },
    #[error("An error occurred while activating `{component}`: {source}")]
    Activation {
        component: TypeInfo,
        #[source]
        source: anyhow::Error,
    },
    #[error("An error occurred while resolving `{service}`: {source}")]
    Resolution {
        service: Service,
        #[source]
        source: anyhow::Error,
    },
}

/// Constructor parameter that no available parameter source could supply.
#[derive(Debug, Clone)]
pub struct MissingDependency {
    /// Declaration index of the constructor on its component.
    pub constructor: usize,
    pub parameter: ParameterInfo,
}

impl Display for MissingDependency {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "cannot resolve parameter {} of constructor #{}", self.parameter, self.constructor)
    }
}

use core::fmt::{self, Debug, Display, Formatter};
use std::{borrow::Cow, sync::Arc};

use crate::{
    any::{Instance, TypeInfo},
    registration::ComponentRegistration,
    registry::ComponentRegistry,
    resolve::ResolveContext,
    service::Service,
};

/// Description of one constructor parameter.
#[derive(Clone, Debug)]
pub struct ParameterInfo {
    pub position: usize,
    pub name: Option<&'static str>,
    /// Service the parameter is autowired from.
    pub service: Service,
    /// If `true`, an unregistered service binds as null instead of failing.
    pub optional: bool,
    /// Value used when the parameter is explicitly supplied as null.
    pub default_value: Option<fn() -> Instance>,
}

impl ParameterInfo {
    #[inline]
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            position: 0,
            name: None,
            service: Service::of::<T>(),
            optional: false,
            default_value: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn at(mut self, position: usize) -> Self {
        self.position = position;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = Some(name);
        self
    }

    #[inline]
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_default(mut self, default_value: fn() -> Instance) -> Self {
        self.default_value = Some(default_value);
        self
    }

    #[inline]
    #[must_use]
    pub fn type_info(&self) -> TypeInfo {
        self.service.type_info
    }
}

impl Display for ParameterInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.name {
            Some(name) => write!(f, "`{name}: {}` (position {})", self.service, self.position),
            None => write!(f, "`{}` (position {})", self.service, self.position),
        }
    }
}

/// Value supplied to a constructor parameter. `None` is an explicit null.
pub type ParameterValue = Option<Instance>;

type Predicate = Arc<dyn Fn(&ParameterInfo) -> bool + Send + Sync>;
type Accessor = Arc<dyn for<'a, 'op> Fn(&'a ParameterInfo, &'a mut ResolveContext<'op>) -> anyhow::Result<Instance> + Send + Sync>;

/// Source of a constructor argument, passed to a resolve call or configured on a registration.
#[derive(Clone)]
pub enum Parameter {
    /// Matches the parameter with the same name.
    Named { name: Cow<'static, str>, value: ParameterValue },
    /// Matches every parameter of the given type.
    Typed { type_info: TypeInfo, value: ParameterValue },
    /// Matches the parameter at the given position.
    Positional { position: usize, value: ParameterValue },
    /// Matches when the predicate accepts the parameter; the value is computed when the constructor is invoked.
    Resolved { predicate: Predicate, accessor: Accessor },
}

impl Parameter {
    #[must_use]
    pub fn named<T: Send + Sync + 'static>(name: impl Into<Cow<'static, str>>, value: T) -> Self {
        Self::Named {
            name: name.into(),
            value: Some(Arc::new(value)),
        }
    }

    #[must_use]
    pub fn named_null(name: impl Into<Cow<'static, str>>) -> Self {
        Self::Named {
            name: name.into(),
            value: None,
        }
    }

    #[must_use]
    pub fn typed<T: Send + Sync + 'static>(value: T) -> Self {
        Self::Typed {
            type_info: TypeInfo::of::<T>(),
            value: Some(Arc::new(value)),
        }
    }

    #[must_use]
    pub fn typed_null<T: ?Sized + 'static>() -> Self {
        Self::Typed {
            type_info: TypeInfo::of::<T>(),
            value: None,
        }
    }

    #[must_use]
    pub fn positional<T: Send + Sync + 'static>(position: usize, value: T) -> Self {
        Self::Positional {
            position,
            value: Some(Arc::new(value)),
        }
    }

    #[must_use]
    pub fn resolved<P, A>(predicate: P, accessor: A) -> Self
    where
        P: Fn(&ParameterInfo) -> bool + Send + Sync + 'static,
        A: for<'a, 'op> Fn(&'a ParameterInfo, &'a mut ResolveContext<'op>) -> anyhow::Result<Instance> + Send + Sync + 'static,
    {
        Self::Resolved {
            predicate: Arc::new(predicate),
            accessor: Arc::new(accessor),
        }
    }

    /// Returns how this parameter would supply `parameter`, if it applies to it at all.
    pub(crate) fn can_supply_value(&self, parameter: &ParameterInfo) -> Option<ValueSource> {
        match self {
            Self::Named { name, value } if parameter.name == Some(name.as_ref()) => Some(ValueSource::constant(value, parameter)),
            Self::Typed { type_info, value } if *type_info == parameter.type_info() => Some(ValueSource::constant(value, parameter)),
            Self::Positional { position, value } if *position == parameter.position => Some(ValueSource::constant(value, parameter)),
            Self::Resolved { predicate, accessor } if predicate(parameter) => Some(ValueSource::Accessor(accessor.clone())),
            _ => None,
        }
    }
}

impl Debug for Parameter {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named { name, value } => f.debug_struct("Named").field("name", name).field("null", &value.is_none()).finish(),
            Self::Typed { type_info, value } => f
                .debug_struct("Typed")
                .field("type_info", type_info)
                .field("null", &value.is_none())
                .finish(),
            Self::Positional { position, value } => f
                .debug_struct("Positional")
                .field("position", position)
                .field("null", &value.is_none())
                .finish(),
            Self::Resolved { .. } => f.debug_struct("Resolved").finish_non_exhaustive(),
        }
    }
}

/// How a bound constructor parameter obtains its value once the constructor is selected.
#[derive(Clone)]
pub(crate) enum ValueSource {
    Constant(ParameterValue),
    Default(fn() -> Instance),
    Component(Arc<ComponentRegistration>),
    Accessor(Accessor),
}

impl ValueSource {
    fn constant(value: &ParameterValue, parameter: &ParameterInfo) -> Self {
        match (value, parameter.default_value) {
            (None, Some(default_value)) => Self::Default(default_value),
            (value, _) => Self::Constant(value.clone()),
        }
    }

    /// The implicit last-resort source: any remaining parameter is resolved from the registry by its service.
    pub(crate) fn autowire(parameter: &ParameterInfo, registry: &ComponentRegistry) -> Option<Self> {
        match registry.registration_for(&parameter.service) {
            Some(registration) => Some(Self::Component(registration)),
            None if parameter.optional => Some(Self::Constant(None)),
            None => None,
        }
    }

    pub(crate) fn value(self, parameter: &ParameterInfo, context: &mut ResolveContext<'_>) -> anyhow::Result<ParameterValue> {
        match self {
            Self::Constant(value) => Ok(value),
            Self::Default(default_value) => Ok(Some(default_value())),
            Self::Component(registration) => context.resolve_registration(registration, Vec::new()).map(Some),
            Self::Accessor(accessor) => accessor(parameter, context).map(Some),
        }
    }
}

/// Value bound to a constructor parameter, handed to [`crate::DependencyResolver::resolve`].
#[derive(Clone, Debug)]
pub struct Argument {
    pub value: ParameterValue,
    pub parameter: ParameterInfo,
}

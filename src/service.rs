use core::fmt::{self, Display, Formatter};
use std::borrow::Cow;

use crate::any::TypeInfo;

/// Describes what a caller asks the container for: a type, optionally narrowed by a key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Service {
    pub type_info: TypeInfo,
    pub key: Option<Cow<'static, str>>,
}

impl Service {
    #[inline]
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_info: TypeInfo::of::<T>(),
            key: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn keyed<T: ?Sized + 'static>(key: impl Into<Cow<'static, str>>) -> Self {
        Self {
            type_info: TypeInfo::of::<T>(),
            key: Some(key.into()),
        }
    }

    #[inline]
    #[must_use]
    pub fn is_keyed(&self) -> bool {
        self.key.is_some()
    }
}

impl Display for Service {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.key {
            Some(key) => write!(f, "{} (key \"{key}\")", self.type_info),
            None => write!(f, "{}", self.type_info),
        }
    }
}

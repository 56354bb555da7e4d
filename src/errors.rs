mod container;
mod dependency_resolver;

pub use container::ScopeErrorKind;
pub use dependency_resolver::{MissingDependency, ResolveErrorKind};

use core::fmt::Display;

pub(crate) fn join<T: Display>(items: &[T], separator: &str) -> String {
    items.iter().map(ToString::to_string).collect::<Vec<_>>().join(separator)
}

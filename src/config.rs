use crate::lifetime::Lifetime;

/// Whether instances of a component are cached by their owning scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Sharing {
    /// A new instance for every dependency.
    #[default]
    None,
    /// One instance per owning scope.
    Shared,
}

/// Whether the owning scope finalizes instances when it is disposed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Ownership {
    #[default]
    OwnedByLifetimeScope,
    ExternallyOwned,
}

/// Config for a component registration
/// ## Fields
/// - `lifetime`:
///   Which scope in the ancestor chain owns instances of the component.
/// - `sharing`:
///   If [`Sharing::Shared`], the instance is cached in the owning scope and reused.
///
///   This does **not** affect the dependencies of the instance.
///   Only the final result is cached if caching is applicable.
/// - `ownership`:
///   If [`Ownership::OwnedByLifetimeScope`], the owning scope calls the finalizer of the instance on disposal.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Config {
    pub lifetime: Lifetime,
    pub sharing: Sharing,
    pub ownership: Ownership,
}

/// Container-wide settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContainerConfig {
    /// Nesting depth above which a resolve operation gives up and reports a probable circular dependency.
    pub max_resolve_depth: usize,
}

impl ContainerConfig {
    pub const DEFAULT_MAX_RESOLVE_DEPTH: usize = 50;
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            max_resolve_depth: Self::DEFAULT_MAX_RESOLVE_DEPTH,
        }
    }
}

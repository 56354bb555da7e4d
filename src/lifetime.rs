use tracing::{debug, error};

use crate::{errors::ResolveErrorKind, lifetime_scope::LifetimeScope, lifetime_scope::ScopeId, scope::Tag};

/// Which scope in the ancestor chain owns (and, when shared, caches) instances of a component.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum Lifetime {
    /// The scope the instance is requested from.
    #[default]
    CurrentScope,
    /// The root of the scope tree.
    RootScope,
    /// The nearest enclosing scope tagged with one of the tags.
    MatchingScope(Vec<Tag>),
    /// The child scope that declared the registration. Set on `RootScope` registrations added to a child scope.
    #[doc(hidden)]
    Declaring(ScopeId),
}

impl Lifetime {
    #[must_use]
    pub fn matching<I>(tags: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Tag>,
    {
        Self::MatchingScope(tags.into_iter().map(Into::into).collect())
    }

    /// Finds the scope that owns instances with this lifetime, starting from `most_nested` and walking toward the root.
    /// # Errors
    /// Returns [`ResolveErrorKind::LifetimeScopeNotFound`] if no visible scope matches.
    pub fn find_scope(&self, most_nested: &LifetimeScope) -> Result<LifetimeScope, ResolveErrorKind> {
        let scope = match self {
            Self::CurrentScope => Some(most_nested.clone()),
            Self::RootScope => Some(most_nested.root()),
            Self::MatchingScope(tags) => most_nested
                .ancestors()
                .find(|scope| scope.tag().is_some_and(|tag| tags.contains(tag))),
            Self::Declaring(id) => most_nested.ancestors().find(|scope| scope.id() == *id),
        };

        match scope {
            Some(scope) => {
                debug!(scope = ?scope.id(), "Activation scope found");
                Ok(scope)
            }
            None => {
                let err = ResolveErrorKind::LifetimeScopeNotFound { tags: self.searched_tags() };
                error!("{}", err);
                Err(err)
            }
        }
    }

    fn searched_tags(&self) -> Vec<Tag> {
        match self {
            Self::MatchingScope(tags) => tags.clone(),
            Self::RootScope => vec![Tag::ROOT],
            Self::CurrentScope | Self::Declaring(_) => Vec::new(),
        }
    }
}

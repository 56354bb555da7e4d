use crate::{lifetime_scope::ScopeId, registration::ComponentRegistration, scope::Tag, service::Service};

/// Hook points of the resolution engine, for diagnostics.
///
/// Every method defaults to doing nothing. Observers are called synchronously on the resolving thread.
pub trait ResolveObserver: Send + Sync {
    fn operation_beginning(&self, _service: &Service, _scope: ScopeId) {}

    fn instance_lookup_beginning(&self, _registration: &ComponentRegistration, _activation_scope: ScopeId) {}

    fn completion_beginning(&self, _registration: &ComponentRegistration) {}

    fn completion_ending(&self, _registration: &ComponentRegistration) {}

    /// Called exactly once per operation, with the error it failed with, if any.
    fn operation_ending(&self, _service: &Service, _error: Option<&anyhow::Error>) {}

    fn scope_beginning(&self, _scope: ScopeId, _tag: Option<&Tag>) {}

    fn scope_ending(&self, _scope: ScopeId, _tag: Option<&Tag>) {}
}

pub(crate) struct NoopObserver;

impl ResolveObserver for NoopObserver {}

use std::{collections::BTreeMap, sync::Arc};
use tracing::debug;

use crate::{registration::ComponentRegistration, service::Service};

/// Maps services to the registrations that provide them.
///
/// Registries are layered: a child scope's registry sees its parent's registrations,
/// and its own registrations take precedence over them.
#[derive(Default)]
pub struct ComponentRegistry {
    parent: Option<Arc<ComponentRegistry>>,
    registrations: BTreeMap<Service, Vec<Arc<ComponentRegistration>>>,
    adapters: BTreeMap<Service, Arc<ComponentRegistration>>,
}

impl ComponentRegistry {
    #[must_use]
    pub(crate) fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub(crate) fn with_parent(parent: Option<Arc<ComponentRegistry>>) -> Self {
        Self {
            parent,
            ..Self::default()
        }
    }

    pub(crate) fn add_registration(&mut self, registration: ComponentRegistration) {
        let registration = Arc::new(registration);
        for service in &registration.services {
            debug!(%service, "Registered");
            self.registrations.entry(service.clone()).or_default().push(registration.clone());
        }
    }

    /// Implicit registrations are only used when no explicit one exists in any layer.
    pub(crate) fn add_adapter(&mut self, registration: ComponentRegistration) {
        let registration = Arc::new(registration);
        for service in &registration.services {
            self.adapters.insert(service.clone(), registration.clone());
        }
    }

    /// Default registration of `service`: the last one registered, looking at this layer first.
    #[must_use]
    pub fn registration_for(&self, service: &Service) -> Option<Arc<ComponentRegistration>> {
        self.explicit_registration_for(service)
            .or_else(|| self.adapter_for(service))
    }

    /// Every explicit registration of `service` in registration order, parent layers first.
    /// Falls back to the implicit registration if there's none.
    #[must_use]
    pub fn registrations_for(&self, service: &Service) -> Vec<Arc<ComponentRegistration>> {
        let mut registrations = Vec::new();
        self.collect_registrations(service, &mut registrations);
        if registrations.is_empty() {
            registrations.extend(self.adapter_for(service));
        }
        registrations
    }

    #[must_use]
    pub fn is_registered(&self, service: &Service) -> bool {
        self.registration_for(service).is_some()
    }

    fn explicit_registration_for(&self, service: &Service) -> Option<Arc<ComponentRegistration>> {
        match self.registrations.get(service).and_then(|registrations| registrations.last()) {
            Some(registration) => Some(registration.clone()),
            None => self.parent.as_ref().and_then(|parent| parent.explicit_registration_for(service)),
        }
    }

    fn adapter_for(&self, service: &Service) -> Option<Arc<ComponentRegistration>> {
        match self.adapters.get(service) {
            Some(registration) => Some(registration.clone()),
            None => self.parent.as_ref().and_then(|parent| parent.adapter_for(service)),
        }
    }

    fn collect_registrations(&self, service: &Service, registrations: &mut Vec<Arc<ComponentRegistration>>) {
        if let Some(parent) = &self.parent {
            parent.collect_registrations(service, registrations);
        }
        if let Some(own) = self.registrations.get(service) {
            registrations.extend(own.iter().cloned());
        }
    }
}

use super::{ActivatorKind, InstanceActivator};
use crate::{
    any::{Instance, TypeInfo},
    parameters::Parameter,
    resolve::ResolveContext,
};

/// Hands out an instance created outside the container.
pub struct ProvidedInstanceActivator {
    instance: Instance,
    limit_type: TypeInfo,
}

impl ProvidedInstanceActivator {
    #[must_use]
    pub fn new<T: Send + Sync + 'static>(instance: T) -> Self {
        Self {
            instance: std::sync::Arc::new(instance),
            limit_type: TypeInfo::of::<T>(),
        }
    }
}

impl InstanceActivator for ProvidedInstanceActivator {
    fn limit_type(&self) -> TypeInfo {
        self.limit_type
    }

    fn kind(&self) -> ActivatorKind {
        ActivatorKind::ProvidedInstance
    }

    fn activate(&self, _context: &mut ResolveContext<'_>, _parameters: &[Parameter]) -> anyhow::Result<Instance> {
        Ok(self.instance.clone())
    }
}

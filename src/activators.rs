mod delegate;
mod provided;
pub(crate) mod reflection;

pub use delegate::DelegateActivator;
pub use provided::ProvidedInstanceActivator;

use crate::{
    any::{Instance, TypeInfo},
    parameters::Parameter,
    resolve::ResolveContext,
};

/// Activation strategy of an activator.
///
/// Only [`ActivatorKind::Reflection`] activations are tracked on the activation stack,
/// so adapters that forward to another registration are never mistaken for a cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActivatorKind {
    Reflection,
    Delegate,
    ProvidedInstance,
}

/// Produces instances of a component.
pub trait InstanceActivator: Send + Sync {
    /// The most specific type the produced instances are known to have.
    fn limit_type(&self) -> TypeInfo;

    fn kind(&self) -> ActivatorKind;

    /// # Errors
    /// Returns an error if the instance can't be produced.
    fn activate(&self, context: &mut ResolveContext<'_>, parameters: &[Parameter]) -> anyhow::Result<Instance>;
}

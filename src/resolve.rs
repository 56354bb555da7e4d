mod circular;
mod context;
mod instance_lookup;
mod observer;
mod operation;

pub use context::ResolveContext;
pub use observer::ResolveObserver;

pub(crate) use instance_lookup::InstanceLookup;
pub(crate) use observer::NoopObserver;
pub(crate) use operation::ResolveOperation;

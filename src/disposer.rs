use parking_lot::Mutex;
use tracing::debug;

use crate::{any::Instance, errors::ResolveErrorKind, finalizer::BoxedFinalizer};

/// Component that releases resources when its owning lifetime scope is disposed.
pub trait Disposable: Send + Sync + 'static {
    fn dispose(&self);
}

/// Instances owned by a lifetime scope, finalized in LIFO order when the scope ends.
pub(crate) struct Disposer {
    // `None` once disposed
    items: Mutex<Option<Vec<(Instance, BoxedFinalizer)>>>,
}

impl Disposer {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            items: Mutex::new(Some(Vec::new())),
        }
    }

    pub(crate) fn add_instance_for_disposal(&self, instance: Instance, finalizer: BoxedFinalizer) -> Result<(), ResolveErrorKind> {
        match self.items.lock().as_mut() {
            Some(items) => {
                items.push((instance, finalizer));
                debug!("Registered for disposal");
                Ok(())
            }
            None => Err(ResolveErrorKind::ScopeDisposed),
        }
    }

    /// Finalizes every registered instance. Calls after the first are no-ops.
    pub(crate) fn dispose(&self) {
        let Some(items) = self.items.lock().take() else {
            debug!("Already disposed");
            return;
        };

        debug!(count = items.len(), "Disposing");

        for (instance, finalizer) in items.into_iter().rev() {
            finalizer(instance);
        }
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;
    use std::sync::Arc;
    use tracing_test::traced_test;

    use super::Disposer;
    use crate::{errors::ResolveErrorKind, finalizer::BoxedFinalizer, Instance};

    fn recording(log: &Arc<Mutex<Vec<u8>>>) -> BoxedFinalizer {
        let log = log.clone();
        Arc::new(move |instance: Instance| {
            if let Ok(value) = instance.downcast::<u8>() {
                log.lock().push(*value);
            }
        })
    }

    #[test]
    #[traced_test]
    fn test_dispose_lifo_once() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let disposer = Disposer::new();

        for value in 1..=3u8 {
            disposer.add_instance_for_disposal(Arc::new(value), recording(&log)).unwrap();
        }

        disposer.dispose();
        disposer.dispose();

        assert_eq!(*log.lock(), vec![3, 2, 1]);
    }

    #[test]
    #[traced_test]
    fn test_add_after_dispose() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let disposer = Disposer::new();
        disposer.dispose();

        let result = disposer.add_instance_for_disposal(Arc::new(1u8), recording(&log));

        assert!(matches!(result, Err(ResolveErrorKind::ScopeDisposed)));
        assert!(log.lock().is_empty());
    }
}

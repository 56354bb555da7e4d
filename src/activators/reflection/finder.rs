use super::Constructor;

/// Decides which of a component's constructors are candidates for activation.
pub trait ConstructorFinder: Send + Sync {
    fn is_candidate(&self, constructor: &Constructor) -> bool;
}

/// Only public constructors. Default strategy.
#[derive(Clone, Copy, Debug, Default)]
pub struct PublicConstructorFinder;

impl ConstructorFinder for PublicConstructorFinder {
    fn is_candidate(&self, constructor: &Constructor) -> bool {
        constructor.is_public()
    }
}

/// Every declared constructor, including private ones.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllConstructorFinder;

impl ConstructorFinder for AllConstructorFinder {
    fn is_candidate(&self, _constructor: &Constructor) -> bool {
        true
    }
}

impl<F> ConstructorFinder for F
where
    F: Fn(&Constructor) -> bool + Send + Sync,
{
    fn is_candidate(&self, constructor: &Constructor) -> bool {
        self(constructor)
    }
}

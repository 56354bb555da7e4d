use tracing::error;

use crate::{any::TypeInfo, errors::ResolveErrorKind, registration::ComponentId, registration::ComponentRegistration};

/// An activation in progress on the activation stack.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ActivationFrame {
    pub(crate) component: ComponentId,
    pub(crate) type_info: TypeInfo,
}

impl ActivationFrame {
    pub(crate) fn new(registration: &ComponentRegistration) -> Self {
        Self {
            component: registration.id(),
            type_info: registration.limit_type(),
        }
    }
}

/// Fails if activating `registration` would re-enter an activation that is still in progress.
///
/// Only constructor activations are on the stack, so chains through delegates are caught by the call depth limit instead.
pub(crate) fn check_for_circular_dependency(
    registration: &ComponentRegistration,
    activation_stack: &[ActivationFrame],
    call_depth: usize,
    max_depth: usize,
) -> Result<(), ResolveErrorKind> {
    let path = || {
        activation_stack
            .iter()
            .map(|frame| frame.type_info)
            .chain(Some(registration.limit_type()))
            .collect()
    };

    if call_depth > max_depth {
        let err = ResolveErrorKind::MaxResolveDepthExceeded { depth: max_depth, path: path() };
        error!("{}", err);
        return Err(err);
    }

    if activation_stack.iter().any(|frame| frame.component == registration.id()) {
        let err = ResolveErrorKind::CircularDependency { path: path() };
        error!("{}", err);
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::{check_for_circular_dependency, ActivationFrame};
    use crate::{errors::ResolveErrorKind, RegistrationBuilder};

    struct A;
    struct B;

    #[test]
    #[traced_test]
    fn test_detects_component_on_stack() {
        let a = RegistrationBuilder::new().constructor(|| Ok(A)).build_registration();
        let b = RegistrationBuilder::new().constructor(|| Ok(B)).build_registration();
        let stack = [ActivationFrame::new(&a), ActivationFrame::new(&b)];

        assert!(check_for_circular_dependency(&b, &stack[..1], 2, 50).is_ok());

        let err = check_for_circular_dependency(&a, &stack, 3, 50).unwrap_err();
        let ResolveErrorKind::CircularDependency { path } = &err else {
            panic!("unexpected error: {err}");
        };
        assert_eq!(path.len(), 3);
        assert_eq!(path[0], path[2]);
    }

    #[test]
    #[traced_test]
    fn test_depth_limit() {
        let a = RegistrationBuilder::new().constructor(|| Ok(A)).build_registration();

        assert!(check_for_circular_dependency(&a, &[], 50, 50).is_ok());
        assert!(matches!(
            check_for_circular_dependency(&a, &[], 51, 50),
            Err(ResolveErrorKind::MaxResolveDepthExceeded { depth: 50, .. })
        ));
    }
}

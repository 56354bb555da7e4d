use super::ConstructorBinding;

/// Chooses the constructor to invoke among those whose parameters can all be supplied.
pub trait ConstructorSelector: Send + Sync {
    fn select<'b, 'c>(&self, bindings: &'b [ConstructorBinding<'c>]) -> Option<&'b ConstructorBinding<'c>>;
}

/// Picks the binding with the most parameters. Ties go to the constructor declared first.
#[derive(Clone, Copy, Debug, Default)]
pub struct MostParametersConstructorSelector;

impl ConstructorSelector for MostParametersConstructorSelector {
    fn select<'b, 'c>(&self, bindings: &'b [ConstructorBinding<'c>]) -> Option<&'b ConstructorBinding<'c>> {
        let mut selected: Option<&ConstructorBinding<'c>> = None;
        for binding in bindings {
            match selected {
                Some(current) if current.parameter_count() >= binding.parameter_count() => {}
                _ => selected = Some(binding),
            }
        }
        selected
    }
}

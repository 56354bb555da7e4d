#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ScopeErrorKind {
    #[error("Child lifetime scopes can't be created from a disposed scope")]
    Disposed,
}

use std::vec;

use crate::{errors::ResolveErrorKind, parameters::Argument, parameters::ParameterInfo};

/// A constructor parameter (or a tuple of them) that can be built from bound arguments.
///
/// `parameters` describes what the binder has to supply, in declaration order;
/// `resolve` consumes exactly that many arguments from the front of `arguments`.
pub trait DependencyResolver: Sized {
    fn parameters() -> Vec<ParameterInfo>;

    fn resolve(arguments: &mut Arguments) -> Result<Self, ResolveErrorKind>;
}

/// Bound arguments of a selected constructor, consumed left to right.
pub struct Arguments {
    expected: usize,
    consumed: usize,
    values: vec::IntoIter<Argument>,
}

impl Arguments {
    #[inline]
    #[must_use]
    pub(crate) fn new(values: Vec<Argument>) -> Self {
        Self {
            expected: values.len(),
            consumed: 0,
            values: values.into_iter(),
        }
    }

    /// Takes the next bound argument.
    /// # Errors
    /// Returns [`ResolveErrorKind::ArgumentCountMismatch`] if every argument has been consumed.
    pub fn next_argument(&mut self) -> Result<Argument, ResolveErrorKind> {
        match self.values.next() {
            Some(argument) => {
                self.consumed += 1;
                Ok(argument)
            }
            None => Err(ResolveErrorKind::ArgumentCountMismatch {
                expected: self.consumed + 1,
                actual: self.expected,
            }),
        }
    }

    #[inline]
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

macro_rules! impl_dependency_resolver {
    (
        [$($ty:ident),*]
    ) => {
        #[allow(non_snake_case, unused_mut)]
        impl<$($ty,)*> DependencyResolver for ($($ty,)*)
        where
            $( $ty: DependencyResolver, )*
        {
            fn parameters() -> Vec<ParameterInfo> {
                let mut parameters = Vec::new();
                $( parameters.extend($ty::parameters()); )*
                parameters
            }

            #[allow(unused_variables)]
            fn resolve(arguments: &mut Arguments) -> Result<Self, ResolveErrorKind> {
                Ok(($($ty::resolve(arguments)?,)*))
            }
        }
    };
}

all_the_tuples!(impl_dependency_resolver);

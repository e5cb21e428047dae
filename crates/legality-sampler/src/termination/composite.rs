//! OR-composition of stopping rules.

use super::Termination;
use crate::scope::ClassScope;

/// Combines a tuple of rules; terminates when ANY child terminates.
///
/// # Examples
///
/// ```
/// use legality_sampler::termination::{
///     MaxSampleTermination, OrTermination, RelativeStdTermination, Termination, TimeTermination,
/// };
/// use legality_sampler::ClassScope;
///
/// let rule = OrTermination((
///     MaxSampleTermination::new(128_000),
///     RelativeStdTermination::new(0.05),
///     TimeTermination::seconds(30),
/// ));
/// assert!(!rule.is_terminated(&ClassScope::new(1, [])));
/// ```
#[derive(Debug)]
pub struct OrTermination<T>(pub T);

macro_rules! impl_or_termination {
    ($($idx:tt: $T:ident),+) => {
        impl<$($T),+> Termination for OrTermination<($($T,)+)>
        where
            $($T: Termination,)+
        {
            fn is_terminated(&self, scope: &ClassScope) -> bool {
                $((self.0).$idx.is_terminated(scope))||+
            }
        }
    };
}

impl_or_termination!(0: T0);
impl_or_termination!(0: T0, 1: T1);
impl_or_termination!(0: T0, 1: T1, 2: T2);
impl_or_termination!(0: T0, 1: T1, 2: T2, 3: T3);
impl_or_termination!(0: T0, 1: T1, 2: T2, 3: T3, 4: T4);

//! Qualifying failures
//!
//! Decides whether a failure is eligible for another attempt. The default
//! qualifies every failure.

use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

/// Failures that can be grouped into kinds, so a retry set can be expressed
/// as a list of kinds instead of a closure.
pub trait FailureKind {
    type Kind: Eq + Hash;

    fn kind(&self) -> Self::Kind;
}

type Predicate<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

/// The set of failures a [`Retrier`](crate::Retrier) will retry.
pub struct QualifyingFailures<E> {
    predicate: Option<Predicate<E>>,
}

impl<E> QualifyingFailures<E> {
    /// Every failure qualifies.
    pub fn all() -> Self {
        Self { predicate: None }
    }

    /// Failures for which `predicate` returns `true` qualify.
    pub fn matching<P>(predicate: P) -> Self
    where
        P: Fn(&E) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Some(Arc::new(predicate)),
        }
    }

    pub fn is_all(&self) -> bool {
        self.predicate.is_none()
    }

    /// Check if a failure should be retried
    pub fn qualifies(&self, error: &E) -> bool {
        match &self.predicate {
            Some(predicate) => predicate(error),
            None => true,
        }
    }
}

impl<E> QualifyingFailures<E>
where
    E: FailureKind + 'static,
    E::Kind: Send + Sync + 'static,
{
    /// Only failures whose [`FailureKind::kind`] is in `kinds` qualify.
    pub fn only<I>(kinds: I) -> Self
    where
        I: IntoIterator<Item = E::Kind>,
    {
        let kinds: HashSet<E::Kind> = kinds.into_iter().collect();
        Self::matching(move |error: &E| kinds.contains(&error.kind()))
    }
}

impl<E> Default for QualifyingFailures<E> {
    fn default() -> Self {
        Self::all()
    }
}

impl<E> Clone for QualifyingFailures<E> {
    fn clone(&self) -> Self {
        Self {
            predicate: self.predicate.clone(),
        }
    }
}

impl<E> fmt::Debug for QualifyingFailures<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_all() {
            f.write_str("QualifyingFailures::All")
        } else {
            f.write_str("QualifyingFailures::Matching(..)")
        }
    }
}

//! Best-so-far selection shared between search workers.
//!
//! The objective of the incumbent is mirrored in an `AtomicU64` so workers can
//! prune without locking; the selection itself sits behind a `Mutex`, which is
//! the source of truth.

use crate::model::SiteIdx;
use std::sync::{
    Mutex,
    atomic::{AtomicU64, Ordering},
};

/// A complete, feasible selection and its objective
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Incumbent {
    pub objective: u64,
    pub selection: Vec<SiteIdx>,
    /// Selected identifiers sorted ascending, used to break ties
    pub key: Vec<String>,
}

impl Incumbent {
    fn beats(&self, other: &Incumbent) -> bool {
        (self.objective, &self.key) < (other.objective, &other.key)
    }
}

#[derive(Debug)]
pub(crate) struct SharedIncumbent {
    upper_bound: AtomicU64,
    best: Mutex<Option<Incumbent>>,
}

impl SharedIncumbent {
    pub fn new() -> Self {
        Self {
            upper_bound: AtomicU64::new(u64::MAX),
            best: Mutex::new(None),
        }
    }

    /// Objective of the incumbent, `u64::MAX` while there is none
    #[inline]
    pub fn upper_bound(&self) -> u64 {
        self.upper_bound.load(Ordering::Relaxed)
    }

    /// Installs `candidate` if it has a lower objective, or the same objective
    /// and a smaller key. Returns whether it was installed.
    pub fn try_install(&self, candidate: Incumbent) -> bool {
        if candidate.objective > self.upper_bound() {
            return false;
        }

        let mut guard = self.best.lock().unwrap_or_else(|p| p.into_inner());
        let better = match guard.as_ref() {
            Some(current) => candidate.beats(current),
            None => true,
        };
        if better {
            self.upper_bound
                .store(candidate.objective, Ordering::Relaxed);
            *guard = Some(candidate);
        }
        better
    }

    pub fn into_inner(self) -> Option<Incumbent> {
        self.best.into_inner().unwrap_or_else(|p| p.into_inner())
    }
}

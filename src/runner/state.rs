//! Lifecycle of a single probe run.
//!
//! `Pending -> Compiling -> Finished(_)`, terminal on the first outcome.
//! A run may also finish straight from `Pending` when a prerequisite check
//! fails before the toolchain is started; that outcome is always
//! indeterminate.

use std::fmt;

use crate::result::Classification;

/// State of one probe run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeState {
    Pending,
    Compiling,
    Finished(Classification),
}

impl ProbeState {
    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_advance_to(self, next: ProbeState) -> bool {
        match (self, next) {
            (ProbeState::Pending, ProbeState::Compiling) => true,
            (ProbeState::Pending, ProbeState::Finished(class)) => !class.is_determinate(),
            (ProbeState::Compiling, ProbeState::Finished(_)) => true,
            _ => false,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ProbeState::Finished(_))
    }
}

impl fmt::Display for ProbeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeState::Pending => write!(f, "PENDING"),
            ProbeState::Compiling => write!(f, "COMPILING"),
            ProbeState::Finished(class) => write!(f, "{}", class),
        }
    }
}

/// Tracks the state of one named run and logs each transition.
#[derive(Debug)]
pub struct RunTracker<'a> {
    probe: &'a str,
    state: ProbeState,
}

impl<'a> RunTracker<'a> {
    pub fn new(probe: &'a str) -> Self {
        Self {
            probe,
            state: ProbeState::Pending,
        }
    }

    pub fn state(&self) -> ProbeState {
        self.state
    }

    /// Move to `next`. Illegal transitions leave the state untouched.
    pub fn advance(&mut self, next: ProbeState) -> bool {
        if !self.state.can_advance_to(next) {
            tracing::warn!(
                probe = self.probe,
                "ignoring illegal transition {} -> {}",
                self.state,
                next
            );
            return false;
        }
        tracing::debug!(probe = self.probe, "{} -> {}", self.state, next);
        self.state = next;
        true
    }
}

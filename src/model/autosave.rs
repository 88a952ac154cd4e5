use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AutosaveState {
    #[default]
    Idle,
    PendingCommit {
        deadline: Instant,
    },
}

/// Trailing-edge debounce for field edits.
///
/// Every edit pushes the deadline to `now + delay`; only a quiet period of
/// `delay` lets a commit through. There is no maximum wait: edits arriving
/// faster than `delay` keep postponing the commit.
#[derive(Debug, Clone)]
pub struct Autosave {
    delay: Duration,
    state: AutosaveState,
}

impl Autosave {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            state: AutosaveState::Idle,
        }
    }

    pub fn state(&self) -> AutosaveState {
        self.state
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state(), AutosaveState::PendingCommit { .. })
    }

    /// Records an edit, superseding any pending deadline.
    pub fn schedule(&mut self, now: Instant) {
        self.state = AutosaveState::PendingCommit {
            deadline: now + self.delay,
        };
    }

    /// True once when the pending deadline has passed; the caller commits.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.state {
            AutosaveState::PendingCommit { deadline } if now >= deadline => {
                self.state = AutosaveState::Idle;
                true
            }
            _ => false,
        }
    }

    /// Drops the deadline and reports whether a commit was owed.
    pub fn flush(&mut self) -> bool {
        let pending = self.is_pending();
        self.state = AutosaveState::Idle;
        pending
    }
}

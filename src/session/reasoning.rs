use std::sync::Arc;

/// Ordered, append-only reasoning log of one session.
///
/// The owning state machine seals the log when the session ends; appends
/// after that are rejected. The log is never reused for another session.
#[derive(Debug, Default)]
pub struct ReasoningAccumulator {
    steps: Vec<String>,
    sealed: bool,
}

impl ReasoningAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one step. Returns false when the log is already sealed.
    pub fn append(&mut self, step: impl Into<String>) -> bool {
        if self.sealed {
            return false;
        }

        self.steps.push(step.into());
        true
    }

    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Copies the current steps. Later appends do not show up in the copy.
    pub fn snapshot(&self) -> ReasoningSnapshot {
        ReasoningSnapshot(self.steps.iter().cloned().collect())
    }
}

/// Immutable copy of a reasoning log, cheap to clone and hand to the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReasoningSnapshot(Arc<[String]>);

impl Default for ReasoningSnapshot {
    fn default() -> Self {
        Self(Arc::from(Vec::new()))
    }
}

impl ReasoningSnapshot {
    pub fn steps(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.to_vec()
    }
}

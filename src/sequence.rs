//! Ordered record of the posture states visited during one rep attempt.

use crate::posture::PostureState;

/// Per-exercise admission policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionRule {
    /// Admit a second TRANSITION after COMPLETE (the "up" half of a curl).
    pub return_transition: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransitionSequence {
    states: Vec<PostureState>,
}

impl TransitionSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn states(&self) -> &[PostureState] {
        &self.states
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn count(&self, state: PostureState) -> usize {
        self.states.iter().filter(|&&s| s == state).count()
    }

    pub fn contains(&self, state: PostureState) -> bool {
        self.states.contains(&state)
    }

    /// Whether `state` would be appended under `rule`.
    pub fn admits(&self, state: PostureState, rule: AdmissionRule) -> bool {
        let transitions = self.count(PostureState::Transition);
        let completed = self.contains(PostureState::Complete);

        match state {
            PostureState::Transition => {
                (!completed && transitions == 0)
                    || (rule.return_transition && completed && transitions == 1)
            }
            PostureState::Complete => !completed && transitions > 0,
            PostureState::Start | PostureState::Unknown => false,
        }
    }

    /// Append `state` if admissible. Returns whether the sequence grew.
    pub fn admit(&mut self, state: PostureState, rule: AdmissionRule) -> bool {
        if self.admits(state, rule) {
            self.states.push(state);
            true
        } else {
            false
        }
    }

    pub fn clear(&mut self) {
        self.states.clear();
    }
}

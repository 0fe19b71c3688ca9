use serde::Serialize;
use tracing::{debug, info};

use crate::event::RepEvent;
use crate::posture::PostureState;
use crate::sequence::TransitionSequence;

/// Correct / incorrect totals for the current session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionCounters {
    pub correct: u32,
    pub incorrect: u32,
}

impl SessionCounters {
    pub fn reset(&mut self) {
        self.correct = 0;
        self.incorrect = 0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Correct(u32),
    Incorrect,
    NoRep,
}

impl Verdict {
    pub fn event(self) -> Option<RepEvent> {
        match self {
            Verdict::Correct(n) => Some(RepEvent::Rep(n)),
            Verdict::Incorrect => Some(RepEvent::Incorrect),
            Verdict::NoRep => None,
        }
    }

    pub fn counted(self) -> bool {
        self != Verdict::NoRep
    }
}

/// Decides what the sequence accumulated since the last START amounted to.
#[derive(Debug, Clone)]
pub struct RepetitionJudge {
    rep_pattern: Vec<PostureState>,
}

impl RepetitionJudge {
    pub fn new(rep_pattern: Vec<PostureState>) -> Self {
        Self { rep_pattern }
    }

    pub fn rep_pattern(&self) -> &[PostureState] {
        &self.rep_pattern
    }

    /// Judge on return to START. Always clears `sequence` and `posture_fault`.
    pub fn judge(
        &self,
        sequence: &mut TransitionSequence,
        posture_fault: &mut bool,
        counters: &mut SessionCounters,
    ) -> Verdict {
        let states = sequence.states();

        let verdict = if states == self.rep_pattern.as_slice() && !*posture_fault {
            counters.correct = counters.correct.saturating_add(1);
            info!(correct = counters.correct, "rep counted");
            Verdict::Correct(counters.correct)
        } else if states == [PostureState::Transition] {
            counters.incorrect = counters.incorrect.saturating_add(1);
            info!(incorrect = counters.incorrect, "incomplete rep");
            Verdict::Incorrect
        } else if *posture_fault {
            counters.incorrect = counters.incorrect.saturating_add(1);
            info!(incorrect = counters.incorrect, "rep with posture fault");
            Verdict::Incorrect
        } else {
            if !states.is_empty() {
                debug!(?states, "sequence discarded without verdict");
            }
            Verdict::NoRep
        };

        sequence.clear();
        *posture_fault = false;
        verdict
    }
}

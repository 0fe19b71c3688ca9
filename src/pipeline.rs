//! Per-frame orchestration.
//!
//! Every frame lands in exactly one [`FrameCondition`], derived from the raw
//! detection and never stored. Only counters, the transition sequence, the
//! timers and the feedback flags carry over between frames. Calls must be
//! serial; the host owns any cross-thread hand-off.

use std::time::Instant;

use serde::Serialize;
use tracing::{debug, error, warn};

use crate::config::{Config, ExerciseThresholds};
use crate::error::PipelineError;
use crate::event::RepEvent;
use crate::feedback::FeedbackFlagTracker;
use crate::geometry::offset_angle;
use crate::inactivity::InactivityMonitor;
use crate::inference::{BodyGeometry, Landmarks, PoseSource};
use crate::judge::{RepetitionJudge, SessionCounters};
use crate::overlay::{self, Canvas};
use crate::posture::PostureState;
use crate::sequence::{AdmissionRule, TransitionSequence};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameCondition {
    NoSubject,
    Misaligned,
    Analyzing,
}

#[derive(Debug, Clone, Serialize)]
pub struct FrameOutput<F> {
    pub frame: F,
    pub condition: FrameCondition,
    pub event: Option<RepEvent>,
    pub counters: SessionCounters,
}

enum Assessment {
    NoSubject,
    Misaligned { geometry: BodyGeometry, offset_angle: f32 },
    Analyzing { geometry: BodyGeometry },
}

pub struct FrameAnalysisPipeline {
    thresholds: ExerciseThresholds,
    flip_frame: bool,
    rule: AdmissionRule,
    judge: RepetitionJudge,
    sequence: TransitionSequence,
    counters: SessionCounters,
    feedback: FeedbackFlagTracker,
    inactivity: InactivityMonitor,
    previous_state: Option<PostureState>,
    current_state: Option<PostureState>,
    posture_fault: bool,
    misaligned: bool,
    poisoned: bool,
}

impl FrameAnalysisPipeline {
    /// Fails with [`PipelineError::InvalidThresholds`] if `thresholds` do not validate.
    pub fn new(thresholds: ExerciseThresholds, flip_frame: bool) -> Result<Self, PipelineError> {
        Self::starting_at(thresholds, flip_frame, Instant::now())
    }

    pub fn from_config(config: &Config) -> Result<Self, PipelineError> {
        Self::new(config.thresholds.clone(), config.flip_frame)
    }

    /// Start the inactivity clocks at `now`.
    pub fn starting_at(
        thresholds: ExerciseThresholds,
        flip_frame: bool,
        now: Instant,
    ) -> Result<Self, PipelineError> {
        thresholds.validate().map_err(PipelineError::InvalidThresholds)?;
        let timeout = thresholds
            .inactive_timeout()
            .map_err(PipelineError::InvalidThresholds)?;

        let exercise = &thresholds.exercise;
        Ok(Self {
            rule: exercise.admission_rule(),
            judge: RepetitionJudge::new(thresholds.rep_pattern.clone()),
            feedback: FeedbackFlagTracker::new(exercise.feedback_flags(), thresholds.cnt_frame_thresh),
            inactivity: InactivityMonitor::new(timeout, now),
            sequence: TransitionSequence::new(),
            counters: SessionCounters::default(),
            previous_state: None,
            current_state: None,
            posture_fault: false,
            misaligned: false,
            poisoned: false,
            flip_frame,
            thresholds,
        })
    }

    pub fn thresholds(&self) -> &ExerciseThresholds {
        &self.thresholds
    }

    pub fn counters(&self) -> SessionCounters {
        self.counters
    }

    pub fn sequence(&self) -> &TransitionSequence {
        &self.sequence
    }

    pub fn current_state(&self) -> Option<PostureState> {
        self.current_state
    }

    pub fn previous_state(&self) -> Option<PostureState> {
        self.previous_state
    }

    pub fn posture_fault(&self) -> bool {
        self.posture_fault
    }

    pub fn feedback(&self) -> &FeedbackFlagTracker {
        &self.feedback
    }

    pub fn inactivity(&self) -> &InactivityMonitor {
        &self.inactivity
    }

    /// Process one frame, reading the clock once.
    pub fn process<F, P>(&mut self, frame: F, pose: &mut P) -> Result<FrameOutput<F>, PipelineError>
    where
        F: Canvas,
        P: PoseSource<F> + ?Sized,
    {
        self.process_at(frame, pose, Instant::now())
    }

    /// Process one frame observed at `now`.
    pub fn process_at<F, P>(
        &mut self,
        mut frame: F,
        pose: &mut P,
        now: Instant,
    ) -> Result<FrameOutput<F>, PipelineError>
    where
        F: Canvas,
        P: PoseSource<F> + ?Sized,
    {
        if self.poisoned {
            return Err(PipelineError::Poisoned);
        }

        let landmarks = pose.detect(&frame)?;
        let assessment = match self.assess(landmarks.as_ref(), frame.width(), frame.height()) {
            Ok(assessment) => assessment,
            Err(err) => {
                error!(error = %err, "pose source broke its contract, halting pipeline");
                self.poisoned = true;
                return Err(err);
            }
        };

        let (condition, event) = match assessment {
            Assessment::NoSubject => (FrameCondition::NoSubject, self.on_no_subject(&mut frame, now)),
            Assessment::Misaligned { geometry, offset_angle } => (
                FrameCondition::Misaligned,
                self.on_misaligned(&mut frame, &geometry, offset_angle, now),
            ),
            Assessment::Analyzing { geometry } => {
                (FrameCondition::Analyzing, self.on_analyzing(&mut frame, &geometry, now))
            }
        };

        Ok(FrameOutput {
            frame,
            condition,
            event,
            counters: self.counters,
        })
    }

    fn assess(
        &self,
        landmarks: Option<&Landmarks>,
        width: i32,
        height: i32,
    ) -> Result<Assessment, PipelineError> {
        let landmarks = match landmarks {
            Some(l) if !l.is_empty() => l,
            _ => return Ok(Assessment::NoSubject),
        };

        let geometry = BodyGeometry::extract(landmarks, width, height)?;
        let offset = offset_angle(geometry.left.shoulder, geometry.right.shoulder, geometry.nose);
        if offset > self.thresholds.offset_thresh {
            Ok(Assessment::Misaligned { geometry, offset_angle: offset })
        } else {
            Ok(Assessment::Analyzing { geometry })
        }
    }

    fn on_no_subject<F: Canvas>(&mut self, frame: &mut F, now: Instant) -> Option<RepEvent> {
        if self.flip_frame {
            frame.flip_horizontal();
        }

        let event = self.inactivity.observe_no_subject(now, &mut self.counters);
        overlay::draw_counters(frame, &self.counters);

        if self.current_state.is_some() || !self.sequence.is_empty() {
            debug!(sequence = ?self.sequence.states(), "subject lost, dropping rep in progress");
        }
        self.previous_state = None;
        self.current_state = None;
        self.sequence.clear();
        self.posture_fault = false;
        self.feedback.clear_all();
        self.misaligned = false;

        event
    }

    fn on_misaligned<F: Canvas>(
        &mut self,
        frame: &mut F,
        geometry: &BodyGeometry,
        offset_angle: f32,
        now: Instant,
    ) -> Option<RepEvent> {
        if !self.misaligned {
            warn!(offset_angle, limit = self.thresholds.offset_thresh, "camera not aligned");
            self.misaligned = true;
        }

        let event = self.inactivity.observe_misaligned(now, &mut self.counters);

        overlay::draw_alignment_markers(
            frame,
            geometry.nose,
            geometry.left.shoulder,
            geometry.right.shoulder,
        );
        if self.flip_frame {
            frame.flip_horizontal();
        }
        overlay::draw_counters(frame, &self.counters);
        overlay::draw_misalignment(frame, offset_angle);

        self.previous_state = None;
        self.current_state = None;

        event
    }

    fn on_analyzing<F: Canvas>(
        &mut self,
        frame: &mut F,
        geometry: &BodyGeometry,
        now: Instant,
    ) -> Option<RepEvent> {
        if self.misaligned {
            debug!("camera aligned again");
            self.misaligned = false;
        }
        self.inactivity.observe_aligned(now);

        let (side, joints) = geometry.tracked_side();
        let analysis = self.thresholds.exercise.analyze(&joints);
        overlay::draw_angle_arcs(frame, &analysis.arcs, side.multiplier());
        overlay::draw_skeleton(frame, &joints);

        let state = PostureState::classify(analysis.state_angle, &self.thresholds.state_ranges);
        self.current_state = Some(state);
        if self.sequence.admit(state, self.rule) {
            debug!(state = state.name(), sequence = ?self.sequence.states(), "state admitted");
        }

        let mut event = None;
        if state == PostureState::Start {
            let verdict = self.judge.judge(&mut self.sequence, &mut self.posture_fault, &mut self.counters);
            if verdict.counted() {
                self.feedback.clear_all();
            }
            event = verdict.event();
        } else {
            let findings = self.thresholds.exercise.evaluate(
                &analysis,
                &self.thresholds.state_ranges,
                &self.sequence,
            );
            for flag in findings.flags {
                self.feedback.raise(flag);
            }
            if findings.posture_fault {
                self.posture_fault = true;
            }
            if findings.lowering {
                self.feedback.set_lowering(true);
            }
        }

        let unchanged = self.previous_state == self.current_state;
        let reset = self.inactivity.observe_state(unchanged, now, &mut self.counters);

        if self.flip_frame {
            frame.flip_horizontal();
        }

        if state == PostureState::Start || self.sequence.contains(PostureState::Complete) {
            self.feedback.set_lowering(false);
        }
        self.feedback.tick();
        let prompt = self
            .feedback
            .lowering()
            .then(|| self.thresholds.exercise.lowering_prompt());
        overlay::draw_feedback(frame, &self.feedback.visible(), prompt);

        if reset.is_some() {
            event = reset;
        }

        overlay::draw_readouts(frame, &analysis.readouts, self.flip_frame);
        overlay::draw_counters(frame, &self.counters);

        self.feedback.expire();
        if self.previous_state != self.current_state {
            debug!(
                from = ?self.previous_state,
                to = ?state,
                "posture state changed"
            );
        }
        self.previous_state = self.current_state;

        event
    }
}

//! Exercise strategies.
//!
//! Each variant carries its own alignment thresholds and knows which joint
//! angles to measure, how the rep sequence is admitted, and which form
//! faults to flag. The pipeline itself is exercise-agnostic.

use serde::{Deserialize, Serialize};

use crate::feedback::FeedbackFlag;
use crate::geometry::{vertical_angle, Point};
use crate::inference::SideJoints;
use crate::posture::{PostureState, StateRanges};
use crate::sequence::{AdmissionRule, TransitionSequence};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Exercise {
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    BicepCurl {
        /// Minimum shoulder alignment angle before the elbow counts as drifting.
        shoulder_thresh: f32,
        /// Wrist angle marks; `[1]..[2]` is the "arms lowering" window.
        wrist_thresh: [f32; 3],
    },
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    Squat {
        /// Forward / backward lean bounds of the torso.
        hip_thresh: [f32; 2],
        /// Knee-over-toe limit.
        ankle_thresh: f32,
        /// `[0]..[1]` is the "lower your hips" window, `[2]` the depth limit.
        knee_thresh: [f32; 3],
    },
}

/// Arc drawn at a joint to visualise its angle against the vertical.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleArc {
    pub center: Point,
    pub radius: i32,
    pub angle: f32,
    /// Sweep direction relative to the tracked side.
    pub sweep: i32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Signals {
    Curl { shoulder_alignment: f32, wrist: f32 },
    Squat { hip: f32, knee: f32, ankle: f32 },
}

/// Joint angles measured on one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    /// Angle fed to the posture classifier.
    pub state_angle: f32,
    pub arcs: Vec<AngleArc>,
    /// Angle values printed next to their joints.
    pub readouts: Vec<(Point, f32)>,
    signals: Signals,
}

/// Form problems detected on one frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Findings {
    pub flags: Vec<FeedbackFlag>,
    pub posture_fault: bool,
    pub lowering: bool,
}

impl Exercise {
    pub fn name(&self) -> &'static str {
        match self {
            Exercise::BicepCurl { .. } => "bicep curl",
            Exercise::Squat { .. } => "squat",
        }
    }

    /// Curls count the way back up as its own transition; squats stop at COMPLETE.
    pub fn admission_rule(&self) -> AdmissionRule {
        match self {
            Exercise::BicepCurl { .. } => AdmissionRule { return_transition: true },
            Exercise::Squat { .. } => AdmissionRule { return_transition: false },
        }
    }

    pub fn feedback_flags(&self) -> &'static [FeedbackFlag] {
        match self {
            Exercise::BicepCurl { .. } => &FeedbackFlag::CURL,
            Exercise::Squat { .. } => &FeedbackFlag::SQUAT,
        }
    }

    pub fn lowering_prompt(&self) -> &'static str {
        match self {
            Exercise::BicepCurl { .. } => "CURL YOUR ARMS",
            Exercise::Squat { .. } => "LOWER YOUR HIPS",
        }
    }

    pub fn analyze(&self, joints: &SideJoints) -> Analysis {
        match self {
            Exercise::BicepCurl { .. } => {
                let elbow_vertical = vertical_angle(joints.shoulder, joints.elbow);
                let shoulder_alignment = vertical_angle(joints.elbow, joints.shoulder);
                let wrist = vertical_angle(joints.elbow, joints.wrist);

                Analysis {
                    state_angle: wrist,
                    arcs: vec![
                        AngleArc { center: joints.elbow, radius: 30, angle: elbow_vertical, sweep: 1 },
                        AngleArc { center: joints.shoulder, radius: 20, angle: shoulder_alignment, sweep: -1 },
                        AngleArc { center: joints.wrist, radius: 30, angle: wrist, sweep: 1 },
                    ],
                    readouts: vec![(joints.shoulder, shoulder_alignment), (joints.wrist, wrist)],
                    signals: Signals::Curl { shoulder_alignment, wrist },
                }
            }
            Exercise::Squat { .. } => {
                let hip = vertical_angle(joints.shoulder, joints.hip);
                let knee = vertical_angle(joints.hip, joints.knee);
                let ankle = vertical_angle(joints.knee, joints.ankle);

                Analysis {
                    state_angle: knee,
                    arcs: vec![
                        AngleArc { center: joints.hip, radius: 30, angle: hip, sweep: 1 },
                        AngleArc { center: joints.knee, radius: 20, angle: knee, sweep: -1 },
                        AngleArc { center: joints.ankle, radius: 30, angle: ankle, sweep: 1 },
                    ],
                    readouts: vec![(joints.hip, hip), (joints.knee, knee), (joints.ankle, ankle)],
                    signals: Signals::Squat { hip, knee, ankle },
                }
            }
        }
    }

    /// Evaluate form conditions. Only meaningful away from START.
    pub fn evaluate(
        &self,
        analysis: &Analysis,
        ranges: &StateRanges,
        sequence: &TransitionSequence,
    ) -> Findings {
        let transitions = sequence.count(PostureState::Transition);
        let mut findings = Findings::default();

        match (self, analysis.signals) {
            (
                Exercise::BicepCurl { shoulder_thresh, wrist_thresh },
                Signals::Curl { shoulder_alignment, wrist },
            ) => {
                if shoulder_alignment < *shoulder_thresh {
                    findings.flags.push(FeedbackFlag::ElbowTooFarBack);
                }

                if wrist > ranges.normal.high {
                    if transitions != 1 {
                        findings.flags.push(FeedbackFlag::IncompleteExtension);
                    } else {
                        findings.flags.push(FeedbackFlag::IncompleteCurl);
                    }
                }

                if ranges.trans.strictly_contains(wrist) && transitions == 1 {
                    findings.flags.push(FeedbackFlag::ElbowUnstable);
                }

                if wrist_thresh[1] < wrist && wrist < wrist_thresh[2] && transitions == 1 {
                    findings.lowering = true;
                }
            }
            (
                Exercise::Squat { hip_thresh, ankle_thresh, knee_thresh },
                Signals::Squat { hip, knee, ankle },
            ) => {
                if hip > hip_thresh[1] {
                    findings.flags.push(FeedbackFlag::BendBackwards);
                } else if hip < hip_thresh[0] && transitions == 1 {
                    findings.flags.push(FeedbackFlag::BendForward);
                }

                if knee_thresh[0] < knee && knee < knee_thresh[1] && transitions == 1 {
                    findings.lowering = true;
                } else if knee > knee_thresh[2] {
                    findings.flags.push(FeedbackFlag::SquatTooDeep);
                    findings.posture_fault = true;
                }

                if ankle > *ankle_thresh {
                    findings.flags.push(FeedbackFlag::KneeOverToe);
                    findings.posture_fault = true;
                }
            }
            // analysis produced by a different strategy
            _ => {}
        }

        findings
    }
}

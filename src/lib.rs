//! Rep Sentinel - exercise repetition counting over pose keypoints
//!
//! Takes per-frame landmarks from an external pose estimator, classifies the
//! tracked joint angle into posture states, counts correct and incorrect reps
//! and raises corrective feedback. Rendering, capture and inference stay
//! with the host.

pub mod camera;
pub mod config;
pub mod error;
pub mod event;
pub mod exercise;
pub mod feedback;
pub mod geometry;
pub mod inactivity;
pub mod inference;
pub mod judge;
pub mod overlay;
pub mod pipeline;
pub mod posture;
pub mod sequence;

pub use config::{Config, ExerciseThresholds};
pub use error::PipelineError;
pub use event::RepEvent;
pub use exercise::Exercise;
pub use feedback::{FeedbackFlag, FeedbackFlagTracker};
pub use inactivity::InactivityMonitor;
pub use inference::{Landmark, Landmarks, PoseSource};
pub use judge::{RepetitionJudge, SessionCounters, Verdict};
pub use overlay::{Canvas, DrawCommand, Frame};
pub use pipeline::{FrameAnalysisPipeline, FrameCondition, FrameOutput};
pub use posture::{AngleRange, PostureState, StateRanges};
pub use sequence::{AdmissionRule, TransitionSequence};

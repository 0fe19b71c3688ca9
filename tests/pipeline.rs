use std::time::{Duration, Instant};

use rep_sentinel::camera::RecordedFrame;
use rep_sentinel::feedback::FlagSlot;
use rep_sentinel::inference::*;
use rep_sentinel::{
    ExerciseThresholds, FeedbackFlag, Frame, FrameAnalysisPipeline, FrameCondition, Landmark, Landmarks,
    PipelineError, PoseSource, PostureState, RepEvent, SessionCounters,
};

const SIZE: i32 = 1000;

fn lm(x: i32, y: i32) -> Landmark {
    Landmark::new(x as f32 / SIZE as f32, y as f32 / SIZE as f32)
}

/// Both sides identical, so the subject is side-on and the right side is tracked.
fn body(nose: (i32, i32), joints: [(i32, i32); 7]) -> Landmarks {
    let mut landmarks = Landmarks::new();
    landmarks.insert(NOSE, lm(nose.0, nose.1));
    let left = [
        LEFT_SHOULDER,
        LEFT_ELBOW,
        LEFT_WRIST,
        LEFT_HIP,
        LEFT_KNEE,
        LEFT_ANKLE,
        LEFT_FOOT_INDEX,
    ];
    let right = [
        RIGHT_SHOULDER,
        RIGHT_ELBOW,
        RIGHT_WRIST,
        RIGHT_HIP,
        RIGHT_KNEE,
        RIGHT_ANKLE,
        RIGHT_FOOT_INDEX,
    ];
    for (i, (x, y)) in joints.into_iter().enumerate() {
        landmarks.insert(left[i], lm(x, y));
        landmarks.insert(right[i], lm(x, y));
    }
    landmarks
}

/// Upper arm hanging straight down, forearm raised `wrist_deg` from the vertical.
fn curl_pose(wrist_deg: f32) -> Landmarks {
    let rad = wrist_deg.to_radians();
    let wrist = (
        (500.0 - 150.0 * rad.sin()).round() as i32,
        (500.0 + 150.0 * rad.cos()).round() as i32,
    );
    body(
        (560, 250),
        [(500, 300), (500, 500), wrist, (500, 600), (500, 800), (500, 950), (520, 980)],
    )
}

/// Thigh at `knee_deg` from the vertical over a shin leaning `shin_deg` forward.
fn squat_pose(knee_deg: f32, shin_deg: f32) -> Landmarks {
    let ankle = (500, 900);
    let shin = shin_deg.to_radians();
    let knee = (
        ankle.0 + (200.0 * shin.sin()).round() as i32,
        ankle.1 - (200.0 * shin.cos()).round() as i32,
    );
    let thigh = knee_deg.to_radians();
    let hip = (
        knee.0 + (200.0 * thigh.sin()).round() as i32,
        knee.1 - (200.0 * thigh.cos()).round() as i32,
    );
    let shoulder = (hip.0, hip.1 - 250);
    body(
        (shoulder.0 + 40, shoulder.1 - 50),
        [shoulder, (hip.0, hip.1 - 120), (hip.0, hip.1 - 20), hip, knee, ankle, (540, 930)],
    )
}

/// Subject facing the camera: shoulders spread either side of the nose.
fn facing_camera() -> Landmarks {
    let mut landmarks = curl_pose(20.0);
    landmarks.insert(LEFT_SHOULDER, lm(400, 300));
    landmarks.insert(RIGHT_SHOULDER, lm(600, 300));
    landmarks.insert(NOSE, lm(500, 250));
    landmarks
}

struct Session {
    pipeline: FrameAnalysisPipeline,
    t0: Instant,
    secs: u64,
}

impl Session {
    fn new(thresholds: ExerciseThresholds, flip: bool) -> Self {
        let t0 = Instant::now();
        Self {
            pipeline: FrameAnalysisPipeline::starting_at(thresholds, flip, t0).unwrap(),
            t0,
            secs: 0,
        }
    }

    fn curl() -> Self {
        Self::new(ExerciseThresholds::bicep_curl(), false)
    }

    fn squat() -> Self {
        Self::new(ExerciseThresholds::squat(), false)
    }

    /// Feed one frame, one second after the previous one.
    fn feed(&mut self, landmarks: Option<Landmarks>) -> (Frame, FrameCondition, Option<RepEvent>) {
        let now = self.t0 + Duration::from_secs(self.secs);
        self.secs += 1;
        let (frame, mut pose) = RecordedFrame { timestamp_ms: None, width: SIZE, height: SIZE, landmarks }.split();
        let output = self.pipeline.process_at(frame, &mut pose, now).unwrap();
        assert_eq!(output.counters, self.pipeline.counters());
        (output.frame, output.condition, output.event)
    }

    fn events(&mut self, frames: impl IntoIterator<Item = Landmarks>) -> Vec<RepEvent> {
        frames
            .into_iter()
            .filter_map(|landmarks| self.feed(Some(landmarks)).2)
            .collect()
    }
}

struct FailingPose;

impl PoseSource<Frame> for FailingPose {
    fn detect(&mut self, _frame: &Frame) -> anyhow::Result<Option<Landmarks>> {
        anyhow::bail!("inference backend unavailable")
    }
}

#[test]
fn test_curl_full_rep_is_correct() {
    let mut session = Session::curl();
    let events = session.events([20.0, 80.0, 140.0, 80.0, 20.0].map(curl_pose));

    assert_eq!(events, vec![RepEvent::Rep(1)]);
    assert_eq!(session.pipeline.counters(), SessionCounters { correct: 1, incorrect: 0 });
    assert!(session.pipeline.sequence().is_empty());
}

#[test]
fn test_curl_half_rep_is_incorrect() {
    let mut session = Session::curl();
    let events = session.events([20.0, 80.0, 20.0].map(curl_pose));

    assert_eq!(events, vec![RepEvent::Incorrect]);
    assert_eq!(session.pipeline.counters(), SessionCounters { correct: 0, incorrect: 1 });
}

#[test]
fn test_curl_two_reps_count_up() {
    let mut session = Session::curl();
    let rep = [20.0, 80.0, 140.0, 80.0, 20.0];
    let events = session.events(rep.iter().chain(rep.iter()).map(|&a| curl_pose(a)));

    assert_eq!(events, vec![RepEvent::Rep(1), RepEvent::Rep(2)]);
}

#[test]
fn test_unknown_angles_are_ignored() {
    let mut session = Session::curl();
    // 50 and 110 fall between the configured bands
    let events = session.events([20.0, 50.0, 80.0, 110.0, 140.0, 110.0, 80.0, 50.0, 20.0].map(curl_pose));

    assert_eq!(events, vec![RepEvent::Rep(1)]);
}

#[test]
fn test_mid_rep_feedback_is_drawn() {
    let mut session = Session::curl();
    session.feed(Some(curl_pose(20.0)));
    let (frame, condition, _) = session.feed(Some(curl_pose(80.0)));

    assert_eq!(condition, FrameCondition::Analyzing);
    assert_eq!(session.pipeline.current_state(), Some(PostureState::Transition));
    assert!(frame.has_text("KEEP ELBOW STEADY"));
    assert!(frame.has_text("CURL YOUR ARMS COMPLETELY"));
    assert!(!frame.texts().any(|t| t == "CURL YOUR ARMS"));

    // lowering back through the gap below TRANSITION prompts for the rest of the curl
    let (frame, _, _) = session.feed(Some(curl_pose(50.0)));
    assert_eq!(session.pipeline.current_state(), Some(PostureState::Unknown));
    assert!(frame.texts().any(|t| t == "CURL YOUR ARMS"));
    assert!(frame.has_text("KEEP ELBOW STEADY"));
}

#[test]
fn test_feedback_expires_after_frame_limit() {
    const LIMIT: u32 = 3;
    let mut thresholds = ExerciseThresholds::bicep_curl();
    thresholds.cnt_frame_thresh = LIMIT;
    let mut session = Session::new(thresholds, false);
    session.feed(Some(curl_pose(20.0)));

    for shown in 1..=LIMIT {
        let (frame, _, _) = session.feed(Some(curl_pose(80.0)));
        assert!(frame.has_text("KEEP ELBOW STEADY"));
        assert_eq!(
            session.pipeline.feedback().slot(FeedbackFlag::ElbowUnstable),
            FlagSlot { displayed: true, frames: shown }
        );
    }

    // one frame past the limit: still drawn, then dropped
    let (frame, _, _) = session.feed(Some(curl_pose(80.0)));
    assert!(frame.has_text("KEEP ELBOW STEADY"));
    assert_eq!(session.pipeline.feedback().slot(FeedbackFlag::ElbowUnstable), FlagSlot::default());
}

#[test]
fn test_invalid_thresholds_are_rejected() {
    for bad in [f32::INFINITY, -1.0] {
        let mut thresholds = ExerciseThresholds::bicep_curl();
        thresholds.inactive_thresh = bad;
        let err = FrameAnalysisPipeline::new(thresholds, false).err();
        assert!(matches!(err, Some(PipelineError::InvalidThresholds(_))));
    }
}

#[test]
fn test_holding_still_resets_once() {
    let mut session = Session::curl();
    let events = session.events([20.0, 80.0, 140.0, 80.0, 20.0].map(curl_pose));
    assert_eq!(events, vec![RepEvent::Rep(1)]);

    // 16 more seconds at START; the threshold is crossed once at 15 s
    let events = session.events((0..16).map(|_| curl_pose(20.0)));
    assert_eq!(events, vec![RepEvent::ResetCounters]);
    assert_eq!(session.pipeline.counters(), SessionCounters::default());
}

#[test]
fn test_misalignment_keeps_rep_in_progress() {
    let mut session = Session::curl();
    session.events([20.0, 80.0].map(curl_pose));

    let (frame, condition, event) = session.feed(Some(facing_camera()));
    assert_eq!(condition, FrameCondition::Misaligned);
    assert_eq!(event, None);
    assert!(frame.has_text("CAMERA NOT ALIGNED PROPERLY!!!"));
    assert_eq!(session.pipeline.current_state(), None);
    assert_eq!(session.pipeline.previous_state(), None);
    assert_eq!(session.pipeline.sequence().states(), &[PostureState::Transition]);

    let events = session.events([140.0, 80.0, 20.0].map(curl_pose));
    assert_eq!(events, vec![RepEvent::Rep(1)]);
}

#[test]
fn test_prolonged_misalignment_resets_once() {
    let mut session = Session::curl();
    let events = session.events([20.0, 80.0, 20.0].map(curl_pose));
    assert_eq!(events, vec![RepEvent::Incorrect]);

    let events = session.events((0..17).map(|_| facing_camera()));
    assert_eq!(events, vec![RepEvent::ResetCounters]);
    assert_eq!(session.pipeline.counters(), SessionCounters::default());
}

#[test]
fn test_no_subject_drops_rep_in_progress() {
    let mut session = Session::curl();
    let events = session.events([20.0, 80.0, 140.0, 80.0, 20.0, 80.0, 20.0, 80.0].map(curl_pose));
    assert_eq!(events, vec![RepEvent::Rep(1), RepEvent::Incorrect]);
    let counted = SessionCounters { correct: 1, incorrect: 1 };

    let (frame, condition, event) = session.feed(None);
    assert_eq!(condition, FrameCondition::NoSubject);
    assert_eq!(event, None);
    assert_eq!(session.pipeline.counters(), counted);
    assert!(frame.has_text("CORRECT: 1"));
    assert!(frame.has_text("INCORRECT: 1"));
    assert!(session.pipeline.sequence().is_empty());
    assert_eq!(session.pipeline.current_state(), None);

    // the TRANSITION seen before the gap no longer counts
    let events = session.events([curl_pose(20.0)]);
    assert!(events.is_empty());
    assert_eq!(session.pipeline.counters(), counted);
}

#[test]
fn test_stillness_carries_over_into_no_subject() {
    let mut session = Session::curl();
    let events = session.events([20.0, 80.0, 20.0].map(curl_pose));
    assert_eq!(events, vec![RepEvent::Incorrect]);

    // 10 s at START, then 6 s with nobody in frame
    let events = session.events((0..10).map(|_| curl_pose(20.0)));
    assert!(events.is_empty());
    let events: Vec<_> = (0..6).filter_map(|_| session.feed(None).2).collect();

    assert_eq!(events, vec![RepEvent::ResetCounters]);
    assert_eq!(session.pipeline.counters(), SessionCounters::default());
}

#[test]
fn test_empty_detection_is_no_subject() {
    let mut session = Session::curl();
    let (_, condition, _) = session.feed(Some(Landmarks::new()));
    assert_eq!(condition, FrameCondition::NoSubject);
}

#[test]
fn test_squat_full_rep_is_correct() {
    let mut session = Session::squat();
    let events = session.events([10.0, 50.0, 80.0, 50.0, 10.0].map(|k| squat_pose(k, 0.0)));

    assert_eq!(events, vec![RepEvent::Rep(1)]);
}

#[test]
fn test_squat_knee_over_toe_is_incorrect() {
    let mut session = Session::squat();
    let events = session.events([
        squat_pose(10.0, 0.0),
        squat_pose(50.0, 0.0),
        squat_pose(80.0, 60.0),
        squat_pose(50.0, 0.0),
        squat_pose(10.0, 0.0),
    ]);

    assert_eq!(events, vec![RepEvent::Incorrect]);
    assert_eq!(session.pipeline.counters(), SessionCounters { correct: 0, incorrect: 1 });
    assert!(!session.pipeline.posture_fault());
}

#[test]
fn test_missing_landmark_poisons_pipeline() {
    let mut pipeline = FrameAnalysisPipeline::new(ExerciseThresholds::bicep_curl(), false).unwrap();
    let mut landmarks = curl_pose(20.0);
    landmarks.remove(RIGHT_KNEE);

    let (frame, mut pose) = RecordedFrame { timestamp_ms: None, width: SIZE, height: SIZE, landmarks: Some(landmarks) }.split();
    let err = pipeline.process(frame, &mut pose).unwrap_err();
    assert!(matches!(err, PipelineError::MissingLandmark(RIGHT_KNEE)));

    let (frame, mut pose) = RecordedFrame { timestamp_ms: None, width: SIZE, height: SIZE, landmarks: Some(curl_pose(20.0)) }.split();
    let err = pipeline.process(frame, &mut pose).unwrap_err();
    assert!(matches!(err, PipelineError::Poisoned));
}

#[test]
fn test_pose_source_failure_is_not_fatal() {
    let mut pipeline = FrameAnalysisPipeline::new(ExerciseThresholds::bicep_curl(), false).unwrap();
    let err = pipeline.process(Frame::new(SIZE, SIZE), &mut FailingPose).unwrap_err();
    assert!(matches!(err, PipelineError::PoseSource(_)));

    let (frame, mut pose) = RecordedFrame { timestamp_ms: None, width: SIZE, height: SIZE, landmarks: Some(curl_pose(20.0)) }.split();
    let output = pipeline.process(frame, &mut pose).unwrap();
    assert_eq!(output.condition, FrameCondition::Analyzing);
}

#[test]
fn test_flipped_frame_shows_counters() {
    let mut session = Session::new(ExerciseThresholds::bicep_curl(), true);
    let mut last = None;
    for angle in [20.0, 80.0, 140.0, 80.0, 20.0] {
        last = Some(session.feed(Some(curl_pose(angle))).0);
    }

    let frame = last.unwrap();
    assert!(frame.flipped);
    assert!(frame.has_text("CORRECT: 1"));
    assert!(frame.has_text("INCORRECT: 0"));
}

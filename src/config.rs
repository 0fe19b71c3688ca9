use std::fs;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::exercise::Exercise;
use crate::posture::{AngleRange, PostureState, StateRanges};

/// Per-exercise thresholds, fixed for the lifetime of a pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ExerciseThresholds {
    /// Camera offset tolerance in degrees.
    pub offset_thresh: f32,
    /// Seconds of inactivity or misframing before counters reset.
    pub inactive_thresh: f32,
    /// Frames a feedback message may stay on screen.
    pub cnt_frame_thresh: u32,
    /// Sequence that counts as one correct rep.
    pub rep_pattern: Vec<PostureState>,
    pub state_ranges: StateRanges,
    pub exercise: Exercise,
}

impl ExerciseThresholds {
    pub fn bicep_curl() -> Self {
        Self {
            offset_thresh: 35.0,
            inactive_thresh: 15.0,
            cnt_frame_thresh: 50,
            rep_pattern: vec![
                PostureState::Transition,
                PostureState::Complete,
                PostureState::Transition,
            ],
            state_ranges: StateRanges {
                normal: AngleRange::new(15.0, 30.0),
                trans: AngleRange::new(70.0, 90.0),
                pass: AngleRange::new(130.0, 145.0),
            },
            exercise: Exercise::BicepCurl {
                shoulder_thresh: 160.0,
                wrist_thresh: [15.0, 30.0, 70.0],
            },
        }
    }

    pub fn squat() -> Self {
        Self {
            offset_thresh: 35.0,
            inactive_thresh: 15.0,
            cnt_frame_thresh: 50,
            rep_pattern: vec![PostureState::Transition, PostureState::Complete],
            state_ranges: StateRanges {
                normal: AngleRange::new(0.0, 32.0),
                trans: AngleRange::new(35.0, 65.0),
                pass: AngleRange::new(70.0, 95.0),
            },
            exercise: Exercise::Squat {
                hip_thresh: [10.0, 50.0],
                ankle_thresh: 45.0,
                knee_thresh: [50.0, 70.0, 95.0],
            },
        }
    }

    pub fn inactive_timeout(&self) -> Result<Duration> {
        Duration::try_from_secs_f32(self.inactive_thresh)
            .with_context(|| format!("INACTIVE_THRESH out of range: {}", self.inactive_thresh))
    }

    pub fn validate(&self) -> Result<()> {
        let ranges = &self.state_ranges;
        for (name, range) in [("NORMAL", ranges.normal), ("TRANS", ranges.trans), ("PASS", ranges.pass)] {
            if !(range.low <= range.high) {
                bail!("{} range is inverted: [{}, {}]", name, range.low, range.high);
            }
        }
        if !(self.inactive_thresh > 0.0 && self.inactive_thresh.is_finite()) {
            bail!("INACTIVE_THRESH must be positive and finite, got {}", self.inactive_thresh);
        }
        self.inactive_timeout()?;
        if !(self.offset_thresh > 0.0 && self.offset_thresh.is_finite()) {
            bail!("OFFSET_THRESH must be positive and finite, got {}", self.offset_thresh);
        }
        if self.rep_pattern.is_empty() {
            bail!("REP_PATTERN must not be empty");
        }
        if self
            .rep_pattern
            .iter()
            .any(|s| matches!(s, PostureState::Start | PostureState::Unknown))
        {
            bail!("REP_PATTERN may only contain TRANSITION and COMPLETE");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Mirror the annotated frame, as for a selfie camera.
    pub flip_frame: bool,
    pub thresholds: ExerciseThresholds,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            flip_frame: true,
            thresholds: ExerciseThresholds::bicep_curl(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.thresholds.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

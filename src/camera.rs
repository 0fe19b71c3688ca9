use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::inference::{Landmarks, PoseSource};
use crate::overlay::Frame;
use crate::pipeline::{FrameAnalysisPipeline, FrameOutput};

/// One line of a keypoint recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedFrame {
    /// Capture time since the start of the recording. Filled from the frame
    /// rate when the recording leaves it out.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_ms: Option<u64>,
    pub width: i32,
    pub height: i32,
    /// `null` when the estimator saw nobody.
    pub landmarks: Option<Landmarks>,
}

impl RecordedFrame {
    pub fn offset(&self) -> Duration {
        Duration::from_millis(self.timestamp_ms.unwrap_or(0))
    }

    /// Blank frame plus a pose source that replays this frame's detection.
    pub fn split(self) -> (Frame, ReplayPose) {
        (Frame::new(self.width, self.height), ReplayPose(self.landmarks))
    }
}

/// Pose source backed by a recorded detection.
#[derive(Debug, Clone, Default)]
pub struct ReplayPose(Option<Landmarks>);

impl PoseSource<Frame> for ReplayPose {
    fn detect(&mut self, _frame: &Frame) -> Result<Option<Landmarks>> {
        Ok(self.0.take())
    }
}

/// Frame source reading a JSON-lines keypoint recording.
pub struct Camera {
    lines: Lines<BufReader<File>>,
    line_no: usize,
    frame_index: u64,
    fps: f64,
}

impl Camera {
    /// `fps` times the frames that carry no `timestamp_ms`.
    pub fn open(path: &str, fps: f64) -> Result<Self> {
        if !(fps > 0.0 && fps.is_finite()) {
            bail!("Frame rate must be positive, got {}", fps);
        }
        let file = File::open(path).with_context(|| format!("Failed to open recording {}", path))?;
        Ok(Self {
            lines: BufReader::new(file).lines(),
            line_no: 0,
            frame_index: 0,
            fps,
        })
    }

    /// Next recorded frame, or `None` at end of stream. Blank lines are skipped.
    pub fn read_frame(&mut self) -> Result<Option<RecordedFrame>> {
        for line in self.lines.by_ref() {
            self.line_no += 1;
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let mut frame: RecordedFrame = serde_json::from_str(&line)
                .with_context(|| format!("Malformed frame on line {}", self.line_no))?;
            if frame.width <= 0 || frame.height <= 0 {
                bail!("Empty frame on line {}", self.line_no);
            }
            let index = self.frame_index;
            let fps = self.fps;
            frame
                .timestamp_ms
                .get_or_insert_with(|| (index as f64 * 1000.0 / fps).round() as u64);
            self.frame_index += 1;
            return Ok(Some(frame));
        }
        Ok(None)
    }

    /// Feed every remaining frame through `pipeline` on the recording's own
    /// clock. Returns the number of frames processed.
    pub fn replay<F>(&mut self, pipeline: &mut FrameAnalysisPipeline, mut on_frame: F) -> Result<usize>
    where
        F: FnMut(FrameOutput<Frame>) -> Result<()>,
    {
        let start = Instant::now();
        let mut frames = 0;
        while let Some(recorded) = self.read_frame()? {
            let now = start + recorded.offset();
            let (frame, mut pose) = recorded.split();
            on_frame(pipeline.process_at(frame, &mut pose, now)?)?;
            frames += 1;
        }
        Ok(frames)
    }
}

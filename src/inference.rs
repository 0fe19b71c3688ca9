use std::collections::BTreeMap;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::geometry::Point;

// BlazePose landmark ids
pub const NOSE: usize = 0;
pub const LEFT_SHOULDER: usize = 11;
pub const RIGHT_SHOULDER: usize = 12;
pub const LEFT_ELBOW: usize = 13;
pub const RIGHT_ELBOW: usize = 14;
pub const LEFT_WRIST: usize = 15;
pub const RIGHT_WRIST: usize = 16;
pub const LEFT_HIP: usize = 23;
pub const RIGHT_HIP: usize = 24;
pub const LEFT_KNEE: usize = 25;
pub const RIGHT_KNEE: usize = 26;
pub const LEFT_ANKLE: usize = 27;
pub const RIGHT_ANKLE: usize = 28;
pub const LEFT_FOOT_INDEX: usize = 31;
pub const RIGHT_FOOT_INDEX: usize = 32;

/// One keypoint in normalized image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
    #[serde(default = "full_visibility")]
    pub visibility: f32,
}

fn full_visibility() -> f32 {
    1.0
}

impl Landmark {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0, visibility: 1.0 }
    }

    /// Pixel position in a `width` x `height` frame.
    pub fn to_pixel(&self, width: i32, height: i32) -> Point {
        Point::new(
            (self.x * width as f32).round() as i32,
            (self.y * height as f32).round() as i32,
        )
    }
}

/// Landmarks detected on one frame, keyed by landmark id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Landmarks {
    points: BTreeMap<usize, Landmark>,
}

impl Landmarks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a model output where the index is the landmark id.
    pub fn from_ordered(landmarks: Vec<Landmark>) -> Self {
        Self {
            points: landmarks.into_iter().enumerate().collect(),
        }
    }

    pub fn insert(&mut self, id: usize, landmark: Landmark) {
        self.points.insert(id, landmark);
    }

    pub fn remove(&mut self, id: usize) -> Option<Landmark> {
        self.points.remove(&id)
    }

    pub fn get(&self, id: usize) -> Option<&Landmark> {
        self.points.get(&id)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Pixel position of `id`, or a contract violation if the detector omitted it.
    pub fn pixel(&self, id: usize, width: i32, height: i32) -> Result<Point, PipelineError> {
        self.points
            .get(&id)
            .map(|lm| lm.to_pixel(width, height))
            .ok_or(PipelineError::MissingLandmark(id))
    }
}

/// External pose estimator.
///
/// `Ok(None)` means no subject in the frame. A non-empty result is expected
/// to carry every landmark the exercise needs.
pub trait PoseSource<F> {
    fn detect(&mut self, frame: &F) -> Result<Option<Landmarks>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Sweep sign for arcs drawn on this side.
    pub fn multiplier(&self) -> i32 {
        match self {
            Side::Left => -1,
            Side::Right => 1,
        }
    }

    fn ids(&self) -> [usize; 7] {
        match self {
            Side::Left => [
                LEFT_SHOULDER,
                LEFT_ELBOW,
                LEFT_WRIST,
                LEFT_HIP,
                LEFT_KNEE,
                LEFT_ANKLE,
                LEFT_FOOT_INDEX,
            ],
            Side::Right => [
                RIGHT_SHOULDER,
                RIGHT_ELBOW,
                RIGHT_WRIST,
                RIGHT_HIP,
                RIGHT_KNEE,
                RIGHT_ANKLE,
                RIGHT_FOOT_INDEX,
            ],
        }
    }
}

/// Pixel positions of one side of the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SideJoints {
    pub shoulder: Point,
    pub elbow: Point,
    pub wrist: Point,
    pub hip: Point,
    pub knee: Point,
    pub ankle: Point,
    pub foot: Point,
}

impl SideJoints {
    pub fn extract(
        landmarks: &Landmarks,
        side: Side,
        width: i32,
        height: i32,
    ) -> Result<Self, PipelineError> {
        let [shoulder, elbow, wrist, hip, knee, ankle, foot] = side.ids();
        Ok(Self {
            shoulder: landmarks.pixel(shoulder, width, height)?,
            elbow: landmarks.pixel(elbow, width, height)?,
            wrist: landmarks.pixel(wrist, width, height)?,
            hip: landmarks.pixel(hip, width, height)?,
            knee: landmarks.pixel(knee, width, height)?,
            ankle: landmarks.pixel(ankle, width, height)?,
            foot: landmarks.pixel(foot, width, height)?,
        })
    }

    /// Vertical shoulder-to-foot span; the side facing the camera spans more.
    pub fn vertical_span(&self) -> i32 {
        (self.foot.y - self.shoulder.y).abs()
    }
}

/// Geometry of a detected subject, both sides plus the nose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyGeometry {
    pub nose: Point,
    pub left: SideJoints,
    pub right: SideJoints,
}

impl BodyGeometry {
    pub fn extract(landmarks: &Landmarks, width: i32, height: i32) -> Result<Self, PipelineError> {
        Ok(Self {
            nose: landmarks.pixel(NOSE, width, height)?,
            left: SideJoints::extract(landmarks, Side::Left, width, height)?,
            right: SideJoints::extract(landmarks, Side::Right, width, height)?,
        })
    }

    /// The side nearest the camera; ties go right.
    pub fn tracked_side(&self) -> (Side, SideJoints) {
        if self.left.vertical_span() > self.right.vertical_span() {
            (Side::Left, self.left)
        } else {
            (Side::Right, self.right)
        }
    }
}

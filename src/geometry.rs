//! Joint angle helpers over pixel coordinates.
//!
//! All angles are whole degrees (truncated), the resolution the posture
//! thresholds are written in.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Point straight above `self` on the top edge of the frame.
    pub const fn top_edge(self) -> Self {
        Self { x: self.x, y: 0 }
    }
}

/// Angle at `vertex` between the rays towards `p1` and `p2`.
///
/// Uses cos(θ) = (v1 · v2) / (|v1| × |v2|). A zero-length ray yields 0°.
pub fn find_angle(p1: Point, p2: Point, vertex: Point) -> f32 {
    let v1 = ((p1.x - vertex.x) as f32, (p1.y - vertex.y) as f32);
    let v2 = ((p2.x - vertex.x) as f32, (p2.y - vertex.y) as f32);

    let mag1 = (v1.0 * v1.0 + v1.1 * v1.1).sqrt();
    let mag2 = (v2.0 * v2.0 + v2.1 * v2.1).sqrt();
    if mag1 < 0.0001 || mag2 < 0.0001 {
        return 0.0;
    }

    let dot = v1.0 * v2.0 + v1.1 * v2.1;
    let cos_angle = (dot / (mag1 * mag2)).clamp(-1.0, 1.0);
    cos_angle.acos().to_degrees().trunc()
}

/// Angle at `vertex` between the segment to `from` and the upward vertical.
pub fn vertical_angle(from: Point, vertex: Point) -> f32 {
    find_angle(from, vertex.top_edge(), vertex)
}

/// How far the subject is turned towards the camera.
///
/// Seen from the side both shoulders overlap and the angle they subtend at
/// the nose is small; facing the camera it opens up.
pub fn offset_angle(left_shoulder: Point, right_shoulder: Point, nose: Point) -> f32 {
    find_angle(left_shoulder, right_shoulder, nose)
}

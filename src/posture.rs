use serde::{Deserialize, Serialize};

/// Discrete posture derived from a single frame's tracking angle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PostureState {
    /// Fully extended / neutral.
    Start,
    /// Mid-movement.
    Transition,
    /// Fully flexed.
    Complete,
    /// Angle outside every configured band.
    Unknown,
}

impl PostureState {
    pub fn name(&self) -> &'static str {
        match self {
            PostureState::Start => "START",
            PostureState::Transition => "TRANSITION",
            PostureState::Complete => "COMPLETE",
            PostureState::Unknown => "UNKNOWN",
        }
    }

    /// Classify `angle` against `ranges`.
    ///
    /// Bands are checked START, TRANSITION, COMPLETE; the first inclusive
    /// match wins. Angles in the gaps between bands stay `Unknown`.
    pub fn classify(angle: f32, ranges: &StateRanges) -> Self {
        if ranges.normal.contains(angle) {
            PostureState::Start
        } else if ranges.trans.contains(angle) {
            PostureState::Transition
        } else if ranges.pass.contains(angle) {
            PostureState::Complete
        } else {
            PostureState::Unknown
        }
    }
}

/// Inclusive `[low, high]` interval in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AngleRange {
    pub low: f32,
    pub high: f32,
}

impl AngleRange {
    pub const fn new(low: f32, high: f32) -> Self {
        Self { low, high }
    }

    pub fn contains(&self, angle: f32) -> bool {
        self.low <= angle && angle <= self.high
    }

    /// Open interval test, used by feedback conditions.
    pub fn strictly_contains(&self, angle: f32) -> bool {
        self.low < angle && angle < self.high
    }
}

/// The three angle bands of an exercise, named as in the threshold tables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct StateRanges {
    pub normal: AngleRange,
    pub trans: AngleRange,
    pub pass: AngleRange,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curl_ranges() -> StateRanges {
        StateRanges {
            normal: AngleRange::new(15.0, 30.0),
            trans: AngleRange::new(70.0, 90.0),
            pass: AngleRange::new(130.0, 145.0),
        }
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let ranges = curl_ranges();
        assert_eq!(PostureState::classify(15.0, &ranges), PostureState::Start);
        assert_eq!(PostureState::classify(30.0, &ranges), PostureState::Start);
        assert_eq!(PostureState::classify(70.0, &ranges), PostureState::Transition);
        assert_eq!(PostureState::classify(145.0, &ranges), PostureState::Complete);
    }

    #[test]
    fn test_gaps_are_unknown() {
        let ranges = curl_ranges();
        for angle in [0.0, 14.0, 31.0, 50.0, 69.0, 91.0, 129.0, 146.0, 180.0] {
            assert_eq!(PostureState::classify(angle, &ranges), PostureState::Unknown, "{angle}");
        }
    }

    #[test]
    fn test_priority_order_on_overlap() {
        let overlapping = StateRanges {
            normal: AngleRange::new(0.0, 50.0),
            trans: AngleRange::new(40.0, 90.0),
            pass: AngleRange::new(80.0, 120.0),
        };
        assert_eq!(PostureState::classify(45.0, &overlapping), PostureState::Start);
        assert_eq!(PostureState::classify(85.0, &overlapping), PostureState::Transition);
        assert_eq!(PostureState::classify(100.0, &overlapping), PostureState::Complete);
    }

    #[test]
    fn test_every_angle_gets_exactly_one_state() {
        let ranges = curl_ranges();
        for tenth in 0..=1800 {
            let angle = tenth as f32 / 10.0;
            let state = PostureState::classify(angle, &ranges);
            let matches = [ranges.normal, ranges.trans, ranges.pass]
                .iter()
                .filter(|r| r.contains(angle))
                .count();
            match state {
                PostureState::Unknown => assert_eq!(matches, 0),
                _ => assert_eq!(matches, 1),
            }
        }
    }
}

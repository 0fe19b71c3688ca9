//! Corrective feedback flags with frame-count hysteresis.
//!
//! A flag is raised by its condition and then stays up on its own; it only
//! drops once it has been shown for more than the configured number of
//! frames, or when the tracker is cleared. This keeps messages from
//! flickering with per-frame noise.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::overlay::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackFlag {
    // bicep curl
    ElbowTooFarBack,
    IncompleteExtension,
    ElbowUnstable,
    IncompleteCurl,
    // squat
    BendBackwards,
    BendForward,
    KneeOverToe,
    SquatTooDeep,
}

impl FeedbackFlag {
    pub const CURL: [FeedbackFlag; 4] = [
        FeedbackFlag::ElbowTooFarBack,
        FeedbackFlag::IncompleteExtension,
        FeedbackFlag::ElbowUnstable,
        FeedbackFlag::IncompleteCurl,
    ];

    pub const SQUAT: [FeedbackFlag; 4] = [
        FeedbackFlag::BendBackwards,
        FeedbackFlag::BendForward,
        FeedbackFlag::KneeOverToe,
        FeedbackFlag::SquatTooDeep,
    ];

    pub fn message(&self) -> &'static str {
        match self {
            FeedbackFlag::ElbowTooFarBack => "ELBOW TOO FAR BACK",
            FeedbackFlag::IncompleteExtension => "EXTEND YOUR ARM FULLY",
            FeedbackFlag::ElbowUnstable => "KEEP ELBOW STEADY",
            FeedbackFlag::IncompleteCurl => "CURL YOUR ARMS COMPLETELY",
            FeedbackFlag::BendBackwards => "BEND BACKWARDS",
            FeedbackFlag::BendForward => "BEND FORWARD",
            FeedbackFlag::KneeOverToe => "KNEE FALLING OVER TOE",
            FeedbackFlag::SquatTooDeep => "SQUAT TOO DEEP",
        }
    }

    /// Screen row of the message; lower rows take priority visually.
    pub fn row(&self) -> i32 {
        match self {
            FeedbackFlag::ElbowTooFarBack
            | FeedbackFlag::IncompleteExtension
            | FeedbackFlag::BendBackwards
            | FeedbackFlag::BendForward => 215,
            FeedbackFlag::ElbowUnstable | FeedbackFlag::KneeOverToe => 170,
            FeedbackFlag::IncompleteCurl | FeedbackFlag::SquatTooDeep => 125,
        }
    }

    pub fn background(&self) -> Color {
        match self {
            FeedbackFlag::ElbowTooFarBack
            | FeedbackFlag::IncompleteCurl
            | FeedbackFlag::KneeOverToe
            | FeedbackFlag::SquatTooDeep => Color::rgb(255, 80, 80),
            FeedbackFlag::IncompleteExtension => Color::rgb(255, 153, 51),
            FeedbackFlag::ElbowUnstable | FeedbackFlag::BendBackwards | FeedbackFlag::BendForward => {
                Color::rgb(0, 153, 255)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlagSlot {
    pub displayed: bool,
    pub frames: u32,
}

#[derive(Debug, Clone)]
pub struct FeedbackFlagTracker {
    slots: BTreeMap<FeedbackFlag, FlagSlot>,
    frame_limit: u32,
    /// "Curl your arms" / "lower your hips" prompt; not frame-limited.
    lowering: bool,
}

impl FeedbackFlagTracker {
    pub fn new(flags: &[FeedbackFlag], frame_limit: u32) -> Self {
        Self {
            slots: flags.iter().map(|&f| (f, FlagSlot::default())).collect(),
            frame_limit,
            lowering: false,
        }
    }

    pub fn raise(&mut self, flag: FeedbackFlag) {
        self.slots.entry(flag).or_default().displayed = true;
    }

    pub fn slot(&self, flag: FeedbackFlag) -> FlagSlot {
        self.slots.get(&flag).copied().unwrap_or_default()
    }

    pub fn is_displayed(&self, flag: FeedbackFlag) -> bool {
        self.slot(flag).displayed
    }

    /// Count one more displayed frame for every raised flag.
    pub fn tick(&mut self) {
        for slot in self.slots.values_mut().filter(|s| s.displayed) {
            slot.frames += 1;
        }
    }

    /// Flags with at least one displayed frame, in priority order.
    pub fn visible(&self) -> Vec<FeedbackFlag> {
        self.slots
            .iter()
            .filter(|(_, s)| s.frames > 0)
            .map(|(&f, _)| f)
            .collect()
    }

    /// Drop every flag that has been shown for more than the frame limit.
    pub fn expire(&mut self) {
        let limit = self.frame_limit;
        for slot in self.slots.values_mut().filter(|s| s.frames > limit) {
            *slot = FlagSlot::default();
        }
    }

    pub fn clear_all(&mut self) {
        for slot in self.slots.values_mut() {
            *slot = FlagSlot::default();
        }
        self.lowering = false;
    }

    pub fn set_lowering(&mut self, lowering: bool) {
        self.lowering = lowering;
    }

    pub fn lowering(&self) -> bool {
        self.lowering
    }
}

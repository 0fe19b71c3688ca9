//! Frame annotations.
//!
//! The pipeline never touches pixels. It emits draw commands to a [`Canvas`];
//! [`Frame`] records them so the host can rasterise or serialise them.

use serde::Serialize;

use crate::exercise::AngleArc;
use crate::feedback::FeedbackFlag;
use crate::geometry::Point;
use crate::inference::SideJoints;
use crate::judge::SessionCounters;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const YELLOW: Color = Color::rgb(255, 255, 0);
    pub const MAGENTA: Color = Color::rgb(255, 0, 255);
    pub const BLUE: Color = Color::rgb(0, 127, 255);
    pub const LIGHT_BLUE: Color = Color::rgb(102, 204, 255);
    pub const LIGHT_GREEN: Color = Color::rgb(100, 233, 127);
    pub const TEXT: Color = Color::rgb(255, 255, 230);
    pub const CORRECT_BG: Color = Color::rgb(18, 185, 0);
    pub const INCORRECT_BG: Color = Color::rgb(221, 0, 0);
    pub const WARNING_BG: Color = Color::rgb(255, 153, 0);
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DrawCommand {
    Text {
        pos: Point,
        content: String,
        color: Color,
        background: Option<Color>,
        scale: f32,
    },
    Circle {
        center: Point,
        radius: i32,
        color: Color,
    },
    Line {
        from: Point,
        to: Point,
        color: Color,
        thickness: i32,
    },
    Arc {
        center: Point,
        radius: i32,
        start_deg: f32,
        end_deg: f32,
        color: Color,
    },
    DottedLine {
        x: i32,
        y_start: i32,
        y_end: i32,
        color: Color,
    },
}

impl DrawCommand {
    fn mirror(&mut self, width: i32) {
        let flip = |p: &mut Point| p.x = width - 1 - p.x;
        match self {
            DrawCommand::Text { pos, .. } => flip(pos),
            DrawCommand::Circle { center, .. } => flip(center),
            DrawCommand::Line { from, to, .. } => {
                flip(from);
                flip(to);
            }
            DrawCommand::Arc { center, start_deg, end_deg, .. } => {
                flip(center);
                *start_deg = 180.0 - *start_deg;
                *end_deg = 180.0 - *end_deg;
            }
            DrawCommand::DottedLine { x, .. } => *x = width - 1 - *x,
        }
    }
}

/// Rendering collaborator the pipeline draws onto.
pub trait Canvas {
    fn width(&self) -> i32;
    fn height(&self) -> i32;
    fn draw(&mut self, command: DrawCommand);
    /// Mirror everything drawn so far, as for a selfie camera.
    fn flip_horizontal(&mut self);
}

/// A frame as seen by the pipeline: its size plus recorded annotations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub width: i32,
    pub height: i32,
    pub flipped: bool,
    pub commands: Vec<DrawCommand>,
}

impl Frame {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            flipped: false,
            commands: Vec::new(),
        }
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Text { content, .. } => Some(content.as_str()),
            _ => None,
        })
    }

    pub fn has_text(&self, needle: &str) -> bool {
        self.texts().any(|t| t.contains(needle))
    }
}

impl Canvas for Frame {
    fn width(&self) -> i32 {
        self.width
    }

    fn height(&self) -> i32 {
        self.height
    }

    fn draw(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }

    fn flip_horizontal(&mut self) {
        let width = self.width;
        for command in &mut self.commands {
            command.mirror(width);
        }
        self.flipped = !self.flipped;
    }
}

pub fn draw_text<C: Canvas>(
    canvas: &mut C,
    content: impl Into<String>,
    pos: Point,
    color: Color,
    scale: f32,
    background: Option<Color>,
) {
    canvas.draw(DrawCommand::Text {
        pos,
        content: content.into(),
        color,
        background,
        scale,
    });
}

pub fn draw_counters<C: Canvas>(canvas: &mut C, counters: &SessionCounters) {
    let x = (canvas.width() as f32 * 0.68) as i32;
    draw_text(
        canvas,
        format!("CORRECT: {}", counters.correct),
        Point::new(x, 30),
        Color::TEXT,
        0.7,
        Some(Color::CORRECT_BG),
    );
    draw_text(
        canvas,
        format!("INCORRECT: {}", counters.incorrect),
        Point::new(x, 80),
        Color::TEXT,
        0.7,
        Some(Color::INCORRECT_BG),
    );
}

pub fn draw_misalignment<C: Canvas>(canvas: &mut C, offset_angle: f32) {
    let h = canvas.height();
    draw_text(
        canvas,
        "CAMERA NOT ALIGNED PROPERLY!!!",
        Point::new(30, h - 60),
        Color::TEXT,
        0.65,
        Some(Color::WARNING_BG),
    );
    draw_text(
        canvas,
        format!("OFFSET ANGLE: {}", offset_angle),
        Point::new(30, h - 30),
        Color::TEXT,
        0.65,
        Some(Color::WARNING_BG),
    );
}

/// Nose and both shoulders, shown while the subject is not side-on.
pub fn draw_alignment_markers<C: Canvas>(canvas: &mut C, nose: Point, left: Point, right: Point) {
    for (center, color) in [(nose, Color::WHITE), (left, Color::YELLOW), (right, Color::MAGENTA)] {
        canvas.draw(DrawCommand::Circle { center, radius: 7, color });
    }
}

pub fn draw_skeleton<C: Canvas>(canvas: &mut C, j: &SideJoints) {
    let bones = [
        (j.shoulder, j.elbow),
        (j.wrist, j.elbow),
        (j.shoulder, j.hip),
        (j.knee, j.hip),
        (j.ankle, j.knee),
        (j.ankle, j.foot),
    ];
    for (from, to) in bones {
        canvas.draw(DrawCommand::Line { from, to, color: Color::LIGHT_BLUE, thickness: 4 });
    }
    for center in [j.shoulder, j.elbow, j.wrist, j.hip, j.knee, j.ankle, j.foot] {
        canvas.draw(DrawCommand::Circle { center, radius: 7, color: Color::YELLOW });
    }
}

/// Angle arcs plus a short vertical reference line through each joint.
pub fn draw_angle_arcs<C: Canvas>(canvas: &mut C, arcs: &[AngleArc], multiplier: i32) {
    for arc in arcs {
        let sweep = (arc.sweep * multiplier) as f32;
        canvas.draw(DrawCommand::Arc {
            center: arc.center,
            radius: arc.radius,
            start_deg: -90.0,
            end_deg: -90.0 + sweep * arc.angle,
            color: Color::WHITE,
        });
        canvas.draw(DrawCommand::DottedLine {
            x: arc.center.x,
            y_start: arc.center.y - 50,
            y_end: arc.center.y + 20,
            color: Color::BLUE,
        });
    }
}

/// Angle values next to their joints. Positions follow the flip explicitly
/// so the text stays readable.
pub fn draw_readouts<C: Canvas>(canvas: &mut C, readouts: &[(Point, f32)], flipped: bool) {
    let width = canvas.width();
    for &(joint, angle) in readouts {
        let x = if flipped { width - joint.x + 10 } else { joint.x + 10 };
        draw_text(
            canvas,
            format!("{}", angle as i32),
            Point::new(x, joint.y),
            Color::LIGHT_GREEN,
            0.6,
            None,
        );
    }
}

pub fn draw_feedback<C: Canvas>(canvas: &mut C, flags: &[FeedbackFlag], lowering_prompt: Option<&str>) {
    if let Some(prompt) = lowering_prompt {
        draw_text(canvas, prompt, Point::new(30, 80), Color::BLACK, 0.6, Some(Color::YELLOW));
    }
    for flag in flags {
        draw_text(
            canvas,
            flag.message(),
            Point::new(30, flag.row()),
            Color::TEXT,
            0.6,
            Some(flag.background()),
        );
    }
}

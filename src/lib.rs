//! Find The Shape - a timed shape-matching puzzle game
//!
//! Core modules:
//! - `sim`: Round/level state machine (shapes, questions, scoring, timers, input)
//! - `tuning`: Data-driven level configuration and question pools
//! - `persistence`: Key-value storage, player profiles and session records
//! - `platform`: Browser/native platform abstraction
//! - `leaderboard`: Best-score tables

pub mod leaderboard;
pub mod persistence;
pub mod platform;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use leaderboard::Leaderboard;
pub use settings::Settings;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Questions that must be answered before a level can be won
    pub const MIN_QUESTIONS_TO_COMPLETE: usize = 5;
    /// Delay between a correct answer and the next question
    pub const ADVANCE_DELAY_MS: u64 = 1000;

    /// Countdown clock periods
    pub const COARSE_TICK_MS: u64 = 1000;
    pub const FINE_TICK_MS: u64 = 10;
    /// Frame loop period (~60 Hz)
    pub const FRAME_MS: u64 = 16;
    /// Reference frame duration that velocities are expressed in
    pub const REFERENCE_FRAME_MS: f32 = 16.67;
    /// Remaining seconds at which the low-time warning fires
    pub const WARNING_THRESHOLD_SECS: u32 = 10;

    /// Default canvas dimensions (pixels)
    pub const DEFAULT_CANVAS_WIDTH: f32 = 1000.0;
    pub const DEFAULT_CANVAS_HEIGHT: f32 = 700.0;

    /// Placement: keep shape centres this far from the canvas edge
    pub const PLACEMENT_MARGIN: f32 = 100.0;
    /// Placement: minimum gap between two shape outlines
    pub const PLACEMENT_GAP: f32 = 20.0;
    /// Placement: attempts before falling back to the canvas centre
    pub const PLACEMENT_ATTEMPTS: u32 = 50;
    /// Decoy generation: rejection sampling cap
    pub const DECOY_ATTEMPTS: u32 = 100;

    /// Correct shapes per standard round (inclusive range)
    pub const MIN_CORRECT_SHAPES: u32 = 2;
    pub const MAX_CORRECT_SHAPES: u32 = 4;
    /// Ordinal labels are handed out to at most this many shapes
    pub const MAX_ORDINAL_LABELS: usize = 9;
    /// Size of every circle in label levels
    pub const LABEL_CIRCLE_SIZE: f32 = 60.0;

    /// Moving shapes bounce this far from the canvas edge
    pub const BOUNCE_MARGIN: f32 = 50.0;
    /// Speed range of moving shapes (pixels per reference frame)
    pub const MIN_SHAPE_SPEED: f32 = 0.5;
    pub const MAX_SHAPE_SPEED: f32 = 1.5;
    /// Fraction of the remaining distance a dragged shape covers each frame
    pub const DRAG_SMOOTHING: f32 = 0.3;
    /// Drop zone geometry
    pub const DROP_ZONE_SIZE: f32 = 200.0;
    pub const DROP_ZONE_PADDING: f32 = 50.0;

    /// Multiplier gained per bonus question survived
    pub const BONUS_STEP: f64 = 0.2;
}

/// Rotate `point` around the origin by `angle` radians
#[inline]
pub fn rotate(point: Vec2, angle: f32) -> Vec2 {
    Vec2::from_angle(angle).rotate(point)
}

/// Vertices of a regular polygon, first vertex pointing up before rotation
pub fn regular_polygon_points(center: Vec2, radius: f32, sides: u32, rotation: f32) -> Vec<Vec2> {
    let step = std::f32::consts::TAU / sides as f32;
    (0..sides)
        .map(|i| {
            let angle = step * i as f32 + rotation - std::f32::consts::FRAC_PI_2;
            center + Vec2::new(angle.cos(), angle.sin()) * radius
        })
        .collect()
}

/// Vertices of a five-pointed star, alternating outer and inner radius
pub fn star_points(center: Vec2, outer: f32, inner: f32, rotation: f32) -> Vec<Vec2> {
    const SPIKES: u32 = 5;
    let step = std::f32::consts::PI / SPIKES as f32;
    (0..SPIKES * 2)
        .map(|i| {
            let r = if i % 2 == 0 { outer } else { inner };
            let angle = i as f32 * step + rotation - std::f32::consts::FRAC_PI_2;
            center + Vec2::new(angle.cos(), angle.sin()) * r
        })
        .collect()
}

/// Even-odd ray casting point-in-polygon test
pub fn point_in_polygon(point: Vec2, polygon: &[Vec2]) -> bool {
    let mut inside = false;
    let mut j = polygon.len().wrapping_sub(1);
    for i in 0..polygon.len() {
        let (pi, pj) = (polygon[i], polygon[j]);
        if (pi.y > point.y) != (pj.y > point.y)
            && point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

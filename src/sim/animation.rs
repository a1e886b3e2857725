//! Cosmetic effects: shake, pulse, flicker and floating feedback text
//!
//! Effects only ever write `Shape::decoration`. Position and size stay
//! untouched so hit-testing and classification are unaffected.

use std::f32::consts::PI;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::shape::{ColorId, Decoration, Shape};

pub const SHAKE_DURATION_MS: u64 = 300;
pub const SHAKE_AMPLITUDE: f32 = 10.0;
const SHAKE_FREQUENCY: f32 = 10.0;
pub const PULSE_DURATION_MS: u64 = 500;
const PULSE_MAX_SCALE: f32 = 1.3;
pub const FLICKER_CYCLE_MS: u64 = 2000;

/// Floating text rise per frame (pixels)
const FLOAT_RISE: f32 = 2.0;
/// Floating text fade per frame
const FLOAT_FADE: f32 = 0.02;

/// Slow start and end
#[inline]
pub fn ease_in_out_sine(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    -((PI * t).cos() - 1.0) / 2.0
}

/// Horizontal shake offset at progress `p`
pub fn shake_offset(p: f32) -> f32 {
    if p >= 1.0 {
        return 0.0;
    }
    (p * PI * SHAKE_FREQUENCY).sin() * SHAKE_AMPLITUDE * (1.0 - p)
}

/// Pulse scale at progress `p`
pub fn pulse_scale(p: f32) -> f32 {
    if p >= 1.0 {
        return 1.0;
    }
    1.0 + (PULSE_MAX_SCALE - 1.0) * (ease_in_out_sine(p) * PI).sin()
}

/// Flicker opacity `elapsed_ms` into the effect
pub fn flicker_opacity(elapsed_ms: u64) -> f32 {
    let phase = (elapsed_ms % FLICKER_CYCLE_MS) as f32 / FLICKER_CYCLE_MS as f32;
    0.3 + 0.35 * (phase * 2.0 * PI).sin() + 0.35
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Shake,
    Pulse,
    /// Runs until cleared
    Flicker,
}

impl Effect {
    fn duration_ms(self) -> Option<u64> {
        match self {
            Effect::Shake => Some(SHAKE_DURATION_MS),
            Effect::Pulse => Some(PULSE_DURATION_MS),
            Effect::Flicker => None,
        }
    }
}

#[derive(Debug, Clone)]
struct Animation {
    /// Index into the round's shapes
    target: usize,
    effect: Effect,
    started_ms: u64,
}

/// Color coding for floating feedback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextTone {
    Positive,
    Negative,
    /// Reveals a shape's true color
    Hint(ColorId),
}

/// Feedback text that rises and fades out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloatingText {
    pub text: String,
    pub pos: Vec2,
    pub tone: TextTone,
    pub opacity: f32,
}

impl FloatingText {
    pub fn new(text: impl Into<String>, pos: Vec2, tone: TextTone) -> Self {
        Self {
            text: text.into(),
            pos,
            tone,
            opacity: 1.0,
        }
    }
}

/// Active effects for the current round
#[derive(Debug, Clone, Default)]
pub struct Animator {
    animations: Vec<Animation>,
    texts: Vec<FloatingText>,
}

impl Animator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, target: usize, effect: Effect, now_ms: u64) {
        // Restarting an effect replaces the running one
        self.animations
            .retain(|a| !(a.target == target && a.effect == effect));
        self.animations.push(Animation {
            target,
            effect,
            started_ms: now_ms,
        });
    }

    pub fn float_text(&mut self, text: FloatingText) {
        self.texts.push(text);
    }

    /// Drop every shape effect (the shapes they point at are gone)
    pub fn clear_effects(&mut self) {
        self.animations.clear();
    }

    pub fn clear(&mut self) {
        self.animations.clear();
        self.texts.clear();
    }

    pub fn active(&self, target: usize, effect: Effect) -> bool {
        self.animations
            .iter()
            .any(|a| a.target == target && a.effect == effect)
    }

    pub fn effect_count(&self) -> usize {
        self.animations.len()
    }

    pub fn floating_texts(&self) -> &[FloatingText] {
        &self.texts
    }

    /// Recompute every shape's decoration at `now_ms` and retire finished
    /// effects
    pub fn apply(&mut self, shapes: &mut [Shape], now_ms: u64) {
        for shape in shapes.iter_mut() {
            shape.decoration = Decoration::default();
        }

        self.animations.retain(|anim| {
            let Some(shape) = shapes.get_mut(anim.target) else {
                return false;
            };
            let elapsed = now_ms.saturating_sub(anim.started_ms);
            let progress = anim
                .effect
                .duration_ms()
                .map_or(0.0, |d| (elapsed as f32 / d as f32).min(1.0));

            match anim.effect {
                Effect::Shake => shape.decoration.offset.x = shake_offset(progress),
                Effect::Pulse => shape.decoration.scale = pulse_scale(progress),
                Effect::Flicker => shape.decoration.opacity = flicker_opacity(elapsed),
            }
            anim.effect.duration_ms().is_none() || progress < 1.0
        });
    }

    /// Advance floating texts by one frame
    pub fn step_texts(&mut self) {
        for text in &mut self.texts {
            text.pos.y -= FLOAT_RISE;
            text.opacity -= FLOAT_FADE;
        }
        self.texts.retain(|t| t.opacity > 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::shape::ShapeVariant;

    fn shapes(n: usize) -> Vec<Shape> {
        (0..n)
            .map(|i| Shape::new(ShapeVariant::Circle, ColorId::Red, Vec2::new(i as f32 * 100.0, 50.0), 40.0))
            .collect()
    }

    #[test]
    fn test_curves() {
        assert_eq!(shake_offset(0.0), 0.0);
        assert_eq!(shake_offset(1.0), 0.0);
        assert!(shake_offset(0.05).abs() > 5.0);

        assert_eq!(pulse_scale(0.0), 1.0);
        assert!((pulse_scale(0.5) - 1.3).abs() < 1e-5);
        assert_eq!(pulse_scale(1.0), 1.0);

        assert!((flicker_opacity(0) - 0.65).abs() < 1e-5);
        assert!((flicker_opacity(500) - 1.0).abs() < 1e-5);
        assert!((flicker_opacity(1500) - 0.3).abs() < 1e-5);
        assert_eq!(flicker_opacity(2500), flicker_opacity(500));

        assert_eq!(ease_in_out_sine(0.0), 0.0);
        assert!((ease_in_out_sine(1.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_effects_touch_only_decoration() {
        let mut shapes = shapes(2);
        let before = shapes.clone();
        let mut animator = Animator::new();
        animator.start(0, Effect::Shake, 0);
        animator.start(1, Effect::Pulse, 0);

        animator.apply(&mut shapes, 20);
        assert_ne!(shapes[0].decoration.offset.x, 0.0);
        assert!(shapes[1].decoration.scale > 1.0);
        for (a, b) in shapes.iter().zip(&before) {
            assert_eq!(a.pos, b.pos);
            assert_eq!(a.size, b.size);
        }

        // Both finished: decorations back to rest and effects retired
        animator.apply(&mut shapes, 600);
        assert_eq!(shapes[0].decoration, Decoration::default());
        assert_eq!(shapes[1].decoration, Decoration::default());
        assert_eq!(animator.effect_count(), 0);
    }

    #[test]
    fn test_flicker_never_ends() {
        let mut shapes = shapes(1);
        let mut animator = Animator::new();
        animator.start(0, Effect::Flicker, 0);
        animator.apply(&mut shapes, 1_000_000 + 500);
        assert!(animator.active(0, Effect::Flicker));
        assert!((shapes[0].decoration.opacity - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_stale_targets_dropped() {
        let mut shapes = shapes(1);
        let mut animator = Animator::new();
        animator.start(5, Effect::Pulse, 0);
        animator.apply(&mut shapes, 10);
        assert_eq!(animator.effect_count(), 0);
    }

    #[test]
    fn test_floating_text_fades() {
        let mut animator = Animator::new();
        animator.float_text(FloatingText::new("+10", Vec2::new(10.0, 100.0), TextTone::Positive));
        animator.step_texts();
        let text = &animator.floating_texts()[0];
        assert_eq!(text.pos.y, 98.0);
        assert!((text.opacity - 0.98).abs() < 1e-6);
        for _ in 0..60 {
            animator.step_texts();
        }
        assert!(animator.floating_texts().is_empty());
    }
}

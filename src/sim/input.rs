//! Pointer and keyboard input
//!
//! Host-agnostic events plus the pure pieces of input resolution: hit
//! lookup, hover, drag bookkeeping and drop-zone checks. The session decides
//! which of these apply for the current level's mechanics.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::generator::DropZone;
use super::question::Question;
use super::shape::{Shape, topmost_at};
use crate::consts::DRAG_SMOOTHING;

/// Keys the game reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameKey {
    /// 1-9
    Digit(u8),
    Enter,
    Escape,
}

impl GameKey {
    /// Map a DOM `KeyboardEvent.key` value
    pub fn from_key_name(name: &str) -> Option<Self> {
        match name {
            "Enter" => Some(GameKey::Enter),
            "Escape" => Some(GameKey::Escape),
            _ => {
                let mut chars = name.chars();
                let c = chars.next()?;
                if chars.next().is_some() {
                    return None;
                }
                let digit = c.to_digit(10)? as u8;
                (1..=9).contains(&digit).then_some(GameKey::Digit(digit))
            }
        }
    }
}

/// Input events in canvas coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    PointerDown { x: f32, y: f32 },
    PointerMove { x: f32, y: f32 },
    PointerUp { x: f32, y: f32 },
    Click { x: f32, y: f32 },
    DoubleClick { x: f32, y: f32 },
    /// Right click
    ContextMenu { x: f32, y: f32 },
    Key(GameKey),
}

/// A shape being dragged
#[derive(Debug, Clone, PartialEq)]
pub struct DragState {
    /// Index of the dragged shape
    pub shape: usize,
    /// Pointer position minus shape centre at grab time
    pub offset: Vec2,
    /// Where the frame loop eases the shape toward
    pub target: Option<Vec2>,
    /// Velocity before the grab, if the shape was moving
    pub saved_velocity: Option<Vec2>,
}

impl DragState {
    /// Grab the topmost shape under `point`, freezing its velocity
    pub fn grab(shapes: &mut [Shape], point: Vec2) -> Option<Self> {
        let index = topmost_at(shapes, point)?;
        let shape = &mut shapes[index];
        let saved_velocity = (shape.vel != Vec2::ZERO).then_some(shape.vel);
        shape.vel = Vec2::ZERO;
        Some(Self {
            shape: index,
            offset: point - shape.pos,
            target: None,
            saved_velocity,
        })
    }

    /// Pointer moved: aim the shape so the grab offset is kept
    pub fn aim(&mut self, point: Vec2) {
        self.target = Some(point - self.offset);
    }

    /// One frame of easing toward the target
    pub fn ease(&self, shapes: &mut [Shape]) {
        let (Some(target), Some(shape)) = (self.target, shapes.get_mut(self.shape)) else {
            return;
        };
        shape.pos += (target - shape.pos) * DRAG_SMOOTHING;
    }
}

/// Mark only the topmost shape under `point` as hovered
pub fn update_hover(shapes: &mut [Shape], point: Vec2) {
    for shape in shapes.iter_mut() {
        shape.hovered = false;
    }
    if let Some(index) = topmost_at(shapes, point) {
        shapes[index].hovered = true;
    }
}

/// Toggle the topmost shape under `point`; returns its index
pub fn toggle_at(shapes: &mut [Shape], point: Vec2) -> Option<usize> {
    let index = topmost_at(shapes, point)?;
    shapes[index].toggle_select();
    Some(index)
}

/// Toggle the shape carrying keyboard shortcut `ordinal`; returns its index
pub fn toggle_ordinal(shapes: &mut [Shape], ordinal: u8) -> Option<usize> {
    let index = shapes.iter().position(|s| s.ordinal_label == Some(ordinal))?;
    shapes[index].toggle_select();
    Some(index)
}

/// Indices of the selected shapes
pub fn selected_indices(shapes: &[Shape]) -> Vec<usize> {
    shapes
        .iter()
        .enumerate()
        .filter(|(_, s)| s.selected)
        .map(|(i, _)| i)
        .collect()
}

/// Indices of the shapes whose centre lies inside `zone`
pub fn zone_contents(shapes: &[Shape], zone: &DropZone) -> Vec<usize> {
    shapes
        .iter()
        .enumerate()
        .filter(|(_, s)| zone.contains(s.pos))
        .map(|(i, _)| i)
        .collect()
}

/// Every correct shape is in the zone and nothing else is
pub fn zone_matches(question: &Question, shapes: &[Shape], zone: &DropZone) -> bool {
    question.selection_matches(&zone_contents(shapes, zone), shapes)
}

/// Move every correct shape to the zone centre and park it
pub fn snap_correct_into_zone(question: &Question, shapes: &mut [Shape], zone: &DropZone) -> usize {
    let correct = question.correct_indices(shapes);
    for &index in &correct {
        shapes[index].pos = zone.center();
        shapes[index].vel = Vec2::ZERO;
    }
    correct.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::question::QuestionKind;
    use crate::sim::shape::{ColorId, ShapeVariant};

    fn circle(x: f32, y: f32, color: ColorId) -> Shape {
        Shape::new(ShapeVariant::Circle, color, Vec2::new(x, y), 30.0)
    }

    fn zone() -> DropZone {
        DropZone {
            origin: Vec2::new(0.0, 0.0),
            size: Vec2::splat(200.0),
            label: "zone".into(),
        }
    }

    #[test]
    fn test_key_names() {
        assert_eq!(GameKey::from_key_name("Enter"), Some(GameKey::Enter));
        assert_eq!(GameKey::from_key_name("Escape"), Some(GameKey::Escape));
        assert_eq!(GameKey::from_key_name("3"), Some(GameKey::Digit(3)));
        assert_eq!(GameKey::from_key_name("0"), None);
        assert_eq!(GameKey::from_key_name("12"), None);
        assert_eq!(GameKey::from_key_name("a"), None);
    }

    #[test]
    fn test_toggle_and_hover_use_topmost() {
        let mut shapes = vec![circle(100.0, 100.0, ColorId::Red), circle(110.0, 100.0, ColorId::Blue)];
        assert_eq!(toggle_at(&mut shapes, Vec2::new(105.0, 100.0)), Some(1));
        assert_eq!(selected_indices(&shapes), vec![1]);
        assert_eq!(toggle_at(&mut shapes, Vec2::new(105.0, 100.0)), Some(1));
        assert!(selected_indices(&shapes).is_empty());
        assert_eq!(toggle_at(&mut shapes, Vec2::new(900.0, 900.0)), None);

        update_hover(&mut shapes, Vec2::new(105.0, 100.0));
        assert!(!shapes[0].hovered && shapes[1].hovered);
        update_hover(&mut shapes, Vec2::new(75.0, 100.0));
        assert!(shapes[0].hovered && !shapes[1].hovered);
    }

    #[test]
    fn test_toggle_ordinal() {
        let mut shapes = vec![circle(100.0, 100.0, ColorId::Red), circle(300.0, 100.0, ColorId::Blue)];
        shapes[1].ordinal_label = Some(2);
        assert_eq!(toggle_ordinal(&mut shapes, 2), Some(1));
        assert!(shapes[1].selected);
        assert_eq!(toggle_ordinal(&mut shapes, 1), None);
    }

    #[test]
    fn test_drag_eases_and_keeps_offset() {
        let mut shapes = vec![circle(100.0, 100.0, ColorId::Red)];
        shapes[0].vel = Vec2::new(1.0, 0.0);
        let mut drag = DragState::grab(&mut shapes, Vec2::new(110.0, 100.0)).unwrap();
        assert_eq!(shapes[0].vel, Vec2::ZERO);
        assert_eq!(drag.saved_velocity, Some(Vec2::new(1.0, 0.0)));

        drag.aim(Vec2::new(210.0, 100.0));
        assert_eq!(drag.target, Some(Vec2::new(200.0, 100.0)));
        drag.ease(&mut shapes);
        assert!((shapes[0].pos.x - 130.0).abs() < 1e-4);
        for _ in 0..60 {
            drag.ease(&mut shapes);
        }
        assert!((shapes[0].pos.x - 200.0).abs() < 0.01);
    }

    #[test]
    fn test_zone_checks() {
        let question = Question::new(QuestionKind::GroupByColorIntoZone(ColorId::Red), "reds");
        let mut shapes = vec![
            circle(50.0, 50.0, ColorId::Red),
            circle(500.0, 500.0, ColorId::Red),
            circle(600.0, 500.0, ColorId::Blue),
        ];
        let zone = zone();
        assert_eq!(zone_contents(&shapes, &zone), vec![0]);
        assert!(!zone_matches(&question, &shapes, &zone));

        assert_eq!(snap_correct_into_zone(&question, &mut shapes, &zone), 2);
        assert!(zone_matches(&question, &shapes, &zone));

        // A wrong shape in the zone spoils it
        shapes[2].pos = Vec2::new(150.0, 150.0);
        assert!(!zone_matches(&question, &shapes, &zone));
    }
}

//! Shape generation for a round
//!
//! Produces exactly `shape_count` shapes per question: either label circles
//! (text vs. color levels) or a shuffled mix of correct shapes and decoys.

use glam::Vec2;
use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};
use serde::{Deserialize, Serialize};

use super::question::{Question, QuestionKind};
use super::shape::{ColorId, Shape, ShapeVariant, SizeBucket};
use crate::consts::*;
use crate::tuning::LevelConfig;

/// Size range for shapes whose size is not part of the question
const DEFAULT_SIZE_RANGE: (u32, u32) = (50, 80);

/// Drawing surface dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Canvas {
    pub width: f32,
    pub height: f32,
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: DEFAULT_CANVAS_WIDTH,
            height: DEFAULT_CANVAS_HEIGHT,
        }
    }
}

impl Canvas {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }
}

/// Rectangular target for drag-and-drop questions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropZone {
    /// Top-left corner
    pub origin: Vec2,
    pub size: Vec2,
    pub label: String,
}

impl DropZone {
    /// Strictly inside the rectangle (edges are outside)
    pub fn contains(&self, point: Vec2) -> bool {
        let max = self.origin + self.size;
        point.x > self.origin.x && point.x < max.x && point.y > self.origin.y && point.y < max.y
    }

    pub fn center(&self) -> Vec2 {
        self.origin + self.size / 2.0
    }
}

fn random_size<R: Rng + ?Sized>((lo, hi): (u32, u32), rng: &mut R) -> f32 {
    rng.random_range(lo..=hi) as f32
}

fn random_rotation<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    rng.random_range(0.0..std::f32::consts::TAU)
}

fn random_color<R: Rng + ?Sized>(rng: &mut R) -> ColorId {
    ColorId::ALL[rng.random_range(0..ColorId::ALL.len())]
}

fn random_variant<R: Rng + ?Sized>(rng: &mut R) -> ShapeVariant {
    ShapeVariant::ALL[rng.random_range(0..ShapeVariant::ALL.len())]
}

/// A color other than `color`
fn other_color<R: Rng + ?Sized>(color: ColorId, rng: &mut R) -> ColorId {
    let others: Vec<ColorId> = ColorId::ALL.into_iter().filter(|c| *c != color).collect();
    others.choose(rng).copied().unwrap_or(color)
}

/// Random velocity for moving shapes
pub fn random_velocity<R: Rng + ?Sized>(rng: &mut R) -> Vec2 {
    let speed = rng.random_range(MIN_SHAPE_SPEED..MAX_SHAPE_SPEED);
    let angle = rng.random_range(0.0..std::f32::consts::TAU);
    Vec2::new(angle.cos(), angle.sin()) * speed
}

/// Pick a spot for a shape of `size` that keeps clear of `placed`.
///
/// The flag is false when no clear spot was found and the canvas centre was
/// used instead.
pub fn find_free_position<R: Rng + ?Sized>(
    placed: &[Shape],
    size: f32,
    canvas: Canvas,
    rng: &mut R,
) -> (Vec2, bool) {
    let (min_x, max_x) = (PLACEMENT_MARGIN, canvas.width - PLACEMENT_MARGIN);
    let (min_y, max_y) = (PLACEMENT_MARGIN, canvas.height - PLACEMENT_MARGIN);
    if max_x < min_x || max_y < min_y {
        return (canvas.center(), false);
    }

    for _ in 0..PLACEMENT_ATTEMPTS {
        let candidate = Vec2::new(
            rng.random_range(min_x..=max_x),
            rng.random_range(min_y..=max_y),
        );
        let clear = placed
            .iter()
            .all(|s| s.pos.distance(candidate) >= s.size + size + PLACEMENT_GAP);
        if clear {
            return (candidate, true);
        }
    }
    (canvas.center(), false)
}

/// Build the shapes for one question
pub fn populate<R: Rng + ?Sized>(
    config: &LevelConfig,
    question: &Question,
    canvas: Canvas,
    rng: &mut R,
) -> Vec<Shape> {
    let mut shapes = if config.mechanics.text_labels {
        label_circles(config.shape_count, canvas, rng)
    } else {
        standard_set(config.shape_count, &question.kind, canvas, rng)
    };

    if config.mechanics.keyboard_shortcuts {
        for (i, shape) in shapes.iter_mut().take(MAX_ORDINAL_LABELS).enumerate() {
            shape.ordinal_label = Some(i as u8 + 1);
        }
    }
    shapes
}

fn place<R: Rng + ?Sized>(shapes: &mut Vec<Shape>, mut shape: Shape, canvas: Canvas, rng: &mut R) {
    let (pos, found) = find_free_position(shapes, shape.size, canvas, rng);
    if !found {
        log::warn!("No free spot for a {} after {PLACEMENT_ATTEMPTS} tries, using centre", shape.variant.name());
    }
    shape.pos = pos;
    shapes.push(shape);
}

/// Circles whose printed color name is right half the time
fn label_circles<R: Rng + ?Sized>(count: usize, canvas: Canvas, rng: &mut R) -> Vec<Shape> {
    let mut shapes = Vec::with_capacity(count);
    for _ in 0..count {
        let color = random_color(rng);
        let label = if rng.random_bool(0.5) {
            color
        } else {
            other_color(color, rng)
        };
        let circle = Shape::new(ShapeVariant::Circle, color, Vec2::ZERO, LABEL_CIRCLE_SIZE)
            .with_label(label.label());
        place(&mut shapes, circle, canvas, rng);
    }
    shapes
}

fn standard_set<R: Rng + ?Sized>(
    count: usize,
    kind: &QuestionKind,
    canvas: Canvas,
    rng: &mut R,
) -> Vec<Shape> {
    let correct = (rng.random_range(MIN_CORRECT_SHAPES..=MAX_CORRECT_SHAPES) as usize).min(count);
    let mut shapes = Vec::with_capacity(count);
    for _ in 0..correct {
        let shape = matching_shape(kind, rng);
        place(&mut shapes, shape, canvas, rng);
    }
    for _ in correct..count {
        let shape = decoy_shape(kind, rng);
        place(&mut shapes, shape, canvas, rng);
    }
    shapes.shuffle(rng);
    shapes
}

/// Whether shapes for this question need a printed label to be judged
fn uses_labels(kind: &QuestionKind) -> bool {
    matches!(
        kind,
        QuestionKind::ByLabelText(_) | QuestionKind::LabelMatchesColor | QuestionKind::LabelMismatchesColor
    )
}

/// A shape that satisfies `kind`, other attributes random
fn matching_shape<R: Rng + ?Sized>(kind: &QuestionKind, rng: &mut R) -> Shape {
    let variant = match *kind {
        QuestionKind::ByShapeType(v) | QuestionKind::GroupByShapeIntoZone(v) => v,
        QuestionKind::BySideCount(sides) => {
            let candidates: Vec<ShapeVariant> = ShapeVariant::with_sides(sides).collect();
            candidates.choose(rng).copied().unwrap_or_else(|| random_variant(rng))
        }
        _ => random_variant(rng),
    };
    let color = match *kind {
        QuestionKind::ByDeclaredColor(c)
        | QuestionKind::GroupByColorIntoZone(c)
        | QuestionKind::ByRenderedColor(c) => c,
        _ => random_color(rng),
    };
    let size = match *kind {
        QuestionKind::BySizeBucket(bucket) => random_size(bucket.spawn_range(), rng),
        _ => random_size(DEFAULT_SIZE_RANGE, rng),
    };

    let mut shape = Shape::new(variant, color, Vec2::ZERO, size).with_rotation(random_rotation(rng));
    match *kind {
        QuestionKind::ByLabelText(c) => shape.text_label = Some(c.label().to_string()),
        QuestionKind::LabelMatchesColor => shape.text_label = Some(color.label().to_string()),
        QuestionKind::LabelMismatchesColor => {
            shape.text_label = Some(other_color(color, rng).label().to_string())
        }
        _ => {}
    }
    shape
}

/// A shape that does not satisfy `kind`
fn decoy_shape<R: Rng + ?Sized>(kind: &QuestionKind, rng: &mut R) -> Shape {
    if let QuestionKind::BySizeBucket(bucket) = *kind {
        let wrong: Vec<SizeBucket> = SizeBucket::ALL.into_iter().filter(|b| *b != bucket).collect();
        let size_bucket = wrong.choose(rng).copied().unwrap_or(bucket);
        return Shape::new(
            random_variant(rng),
            random_color(rng),
            Vec2::ZERO,
            random_size(size_bucket.spawn_range(), rng),
        )
        .with_rotation(random_rotation(rng));
    }

    let mut candidate = random_shape(kind, rng);
    for _ in 1..DECOY_ATTEMPTS {
        if !kind.accepts(&candidate) {
            return candidate;
        }
        candidate = random_shape(kind, rng);
    }
    if kind.accepts(&candidate) {
        log::warn!("Decoy search for {} gave up after {DECOY_ATTEMPTS} tries", kind.tag());
    }
    candidate
}

fn random_shape<R: Rng + ?Sized>(kind: &QuestionKind, rng: &mut R) -> Shape {
    let mut shape = Shape::new(
        random_variant(rng),
        random_color(rng),
        Vec2::ZERO,
        random_size(DEFAULT_SIZE_RANGE, rng),
    )
    .with_rotation(random_rotation(rng));
    if uses_labels(kind) {
        shape.text_label = Some(random_color(rng).label().to_string());
    }
    shape
}

/// Give every shape a random drift velocity
pub fn apply_movement<R: Rng + ?Sized>(shapes: &mut [Shape], rng: &mut R) {
    for shape in shapes {
        shape.vel = random_velocity(rng);
    }
}

/// Drift every moving shape except `held` by `time_scale` reference frames,
/// bouncing off a margin inside the canvas edges
pub fn step_movement(shapes: &mut [Shape], held: Option<usize>, canvas: Canvas, time_scale: f32) {
    for (i, shape) in shapes.iter_mut().enumerate() {
        if Some(i) == held || shape.vel == Vec2::ZERO {
            continue;
        }
        shape.pos += shape.vel * time_scale;

        let min = Vec2::splat(BOUNCE_MARGIN + shape.size);
        let max = Vec2::new(canvas.width, canvas.height) - min;
        if shape.pos.x < min.x || shape.pos.x > max.x {
            shape.vel.x = -shape.vel.x;
            shape.pos.x = shape.pos.x.max(min.x).min(max.x);
        }
        if shape.pos.y < min.y || shape.pos.y > max.y {
            shape.vel.y = -shape.vel.y;
            shape.pos.y = shape.pos.y.max(min.y).min(max.y);
        }
    }
}

/// Place the drop zone at one of six anchor points along the canvas edges
pub fn place_drop_zone<R: Rng + ?Sized>(canvas: Canvas, label: &str, rng: &mut R) -> DropZone {
    let size = DROP_ZONE_SIZE;
    let pad = DROP_ZONE_PADDING;
    let (w, h) = (canvas.width, canvas.height);
    let anchors = [
        Vec2::new(pad, h - size - pad),
        Vec2::new(w - size - pad, h - size - pad),
        Vec2::new(pad, pad),
        Vec2::new(w - size - pad, pad),
        Vec2::new((w - size) / 2.0, h - size - pad),
        Vec2::new(pad, (h - size) / 2.0),
    ];
    let origin = anchors.choose(rng).copied().unwrap_or(Vec2::new(pad, pad));
    DropZone {
        origin,
        size: Vec2::splat(size),
        label: label.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::LevelCatalog;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn no_overlaps_except_centre(shapes: &[Shape], canvas: Canvas) -> bool {
        for (i, a) in shapes.iter().enumerate() {
            for b in &shapes[i + 1..] {
                let fallback = a.pos == canvas.center() || b.pos == canvas.center();
                if a.overlaps(b, PLACEMENT_GAP) && !fallback {
                    return false;
                }
            }
        }
        true
    }

    #[test]
    fn test_label_mode_circles() {
        let catalog = LevelCatalog::builtin();
        let config = catalog.get(3);
        let mut rng = Pcg32::seed_from_u64(3);
        let shapes = populate(config, &config.questions[0], Canvas::default(), &mut rng);
        assert_eq!(shapes.len(), 12);
        for shape in &shapes {
            assert_eq!(shape.variant, ShapeVariant::Circle);
            assert_eq!(shape.size, LABEL_CIRCLE_SIZE);
            let label = shape.text_label.as_deref().unwrap();
            assert!(ColorId::ALL.iter().any(|c| c.label() == label));
        }
        let ordinals: Vec<_> = shapes.iter().filter_map(|s| s.ordinal_label).collect();
        assert_eq!(ordinals, (1..=9).collect::<Vec<u8>>());
    }

    #[test]
    fn test_label_mode_mixes_truth_and_lies() {
        let catalog = LevelCatalog::builtin();
        let config = catalog.get(3);
        let mut rng = Pcg32::seed_from_u64(11);
        let mut matching = 0;
        let mut total = 0;
        for _ in 0..50 {
            let shapes = populate(config, &config.questions[0], Canvas::default(), &mut rng);
            matching += shapes.iter().filter(|s| s.label_matches_color()).count();
            total += shapes.len();
        }
        let ratio = matching as f32 / total as f32;
        assert!((0.35..0.65).contains(&ratio), "ratio {ratio}");
    }

    #[test]
    fn test_side_questions_get_matching_variants() {
        let catalog = LevelCatalog::builtin();
        let config = catalog.get(1);
        let question = Question::new(QuestionKind::BySideCount(4), "four");
        let mut rng = Pcg32::seed_from_u64(5);
        for _ in 0..20 {
            let shapes = populate(config, &question, Canvas::default(), &mut rng);
            let squares = shapes.iter().filter(|s| s.variant == ShapeVariant::Square).count();
            assert!((2..=4).contains(&squares));
        }
    }

    #[test]
    fn test_drop_zone_inside_canvas() {
        let canvas = Canvas::default();
        let mut rng = Pcg32::seed_from_u64(9);
        for _ in 0..20 {
            let zone = place_drop_zone(canvas, "Gather", &mut rng);
            assert!(zone.origin.x >= 0.0 && zone.origin.y >= 0.0);
            assert!(zone.origin.x + zone.size.x <= canvas.width);
            assert!(zone.origin.y + zone.size.y <= canvas.height);
            assert!(zone.contains(zone.center()));
            assert!(!zone.contains(zone.origin));
        }
    }

    #[test]
    fn test_placement_falls_back_to_centre() {
        let canvas = Canvas::new(300.0, 300.0);
        // One giant shape blocks every candidate position
        let blocker = vec![Shape::new(ShapeVariant::Circle, ColorId::Red, canvas.center(), 500.0)];
        let mut rng = Pcg32::seed_from_u64(1);
        let (pos, found) = find_free_position(&blocker, 30.0, canvas, &mut rng);
        assert!(!found);
        assert_eq!(pos, canvas.center());
    }

    #[test]
    fn test_movement_speeds() {
        let mut rng = Pcg32::seed_from_u64(2);
        let catalog = LevelCatalog::builtin();
        let config = catalog.get(2);
        let mut shapes = populate(config, &config.questions[0], Canvas::default(), &mut rng);
        apply_movement(&mut shapes, &mut rng);
        for s in &shapes {
            let speed = s.vel.length();
            assert!((MIN_SHAPE_SPEED - 1e-4..=MAX_SHAPE_SPEED + 1e-4).contains(&speed));
        }
    }

    #[test]
    fn test_bounce_keeps_shapes_inside() {
        let canvas = Canvas::default();
        let mut shapes = vec![Shape::new(ShapeVariant::Circle, ColorId::Red, Vec2::new(120.0, 350.0), 60.0)];
        shapes[0].vel = Vec2::new(-1.5, 0.0);
        step_movement(&mut shapes, None, canvas, 10.0);
        assert_eq!(shapes[0].pos.x, 110.0);
        assert_eq!(shapes[0].vel.x, 1.5);

        // A held shape does not drift
        step_movement(&mut shapes, Some(0), canvas, 10.0);
        assert_eq!(shapes[0].pos.x, 110.0);
    }

    proptest! {
        #[test]
        fn prop_shape_count_and_correct_range(seed in any::<u64>(), level in 1u8..4, pick in any::<prop::sample::Index>()) {
            let catalog = LevelCatalog::builtin();
            let config = catalog.get(level);
            let question = pick.get(&config.questions);
            let canvas = Canvas::default();
            let mut rng = Pcg32::seed_from_u64(seed);
            let shapes = populate(config, question, canvas, &mut rng);

            prop_assert_eq!(shapes.len(), config.shape_count);
            if !config.mechanics.text_labels {
                let correct = question.correct_indices(&shapes).len();
                prop_assert!((2..=4).contains(&correct), "{} correct for {:?}", correct, question.kind);
            }
            prop_assert!(no_overlaps_except_centre(&shapes, canvas));
        }
    }
}

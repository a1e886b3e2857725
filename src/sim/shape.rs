//! Shape entities and per-variant geometry
//!
//! Variants are a closed set. Each one carries a static geometry table
//! (side count, hit-test, outline generator) looked up by its tag.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{point_in_polygon, regular_polygon_points, rotate, star_points};

/// Shape colors. Questions compare against this id, never against pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorId {
    Red,
    Blue,
    Green,
    Yellow,
    Purple,
    Orange,
}

impl ColorId {
    pub const ALL: [ColorId; 6] = [
        ColorId::Red,
        ColorId::Blue,
        ColorId::Green,
        ColorId::Yellow,
        ColorId::Purple,
        ColorId::Orange,
    ];

    /// Display name, as printed on label circles
    pub fn label(self) -> &'static str {
        match self {
            ColorId::Red => "RED",
            ColorId::Blue => "BLUE",
            ColorId::Green => "GREEN",
            ColorId::Yellow => "YELLOW",
            ColorId::Purple => "PURPLE",
            ColorId::Orange => "ORANGE",
        }
    }

    /// Fill color for the renderer
    pub fn hex(self) -> &'static str {
        match self {
            ColorId::Red => "#FF0000",
            ColorId::Blue => "#0000FF",
            ColorId::Green => "#00FF00",
            ColorId::Yellow => "#FFFF00",
            ColorId::Purple => "#FF00FF",
            ColorId::Orange => "#FF8800",
        }
    }
}

/// Size classes used by size questions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeBucket {
    Small,
    Medium,
    Large,
}

impl SizeBucket {
    pub const ALL: [SizeBucket; 3] = [SizeBucket::Small, SizeBucket::Medium, SizeBucket::Large];

    /// Classify a half-extent: small <= 35 < medium <= 60 < large
    pub fn of(size: f32) -> Self {
        if size <= 35.0 {
            SizeBucket::Small
        } else if size <= 60.0 {
            SizeBucket::Medium
        } else {
            SizeBucket::Large
        }
    }

    /// Inclusive size range the generator draws from for this bucket
    pub fn spawn_range(self) -> (u32, u32) {
        match self {
            SizeBucket::Small => (25, 35),
            SizeBucket::Medium => (40, 60),
            SizeBucket::Large => (65, 80),
        }
    }
}

/// Per-variant geometry table
pub struct VariantGeometry {
    pub name: &'static str,
    /// Side count used by side questions (0 for circles, 5 for stars)
    pub sides: u8,
    pub contains: fn(&Shape, Vec2) -> bool,
    pub outline: fn(&Shape) -> Vec<Vec2>,
}

/// Inner radius of a star relative to its size
const STAR_INNER_RATIO: f32 = 0.4;
/// Segments used to approximate a circle outline
const CIRCLE_SEGMENTS: u32 = 32;

static CIRCLE: VariantGeometry = VariantGeometry {
    name: "circle",
    sides: 0,
    contains: |s, p| s.pos.distance(p) <= s.size,
    outline: |s| regular_polygon_points(s.pos, s.size, CIRCLE_SEGMENTS, 0.0),
};

static SQUARE: VariantGeometry = VariantGeometry {
    name: "square",
    sides: 4,
    contains: |s, p| {
        let local = rotate(p - s.pos, -s.rotation);
        local.x.abs() <= s.size && local.y.abs() <= s.size
    },
    outline: |s| {
        [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)]
            .into_iter()
            .map(|(x, y)| s.pos + rotate(Vec2::new(x, y) * s.size, s.rotation))
            .collect()
    },
};

static TRIANGLE: VariantGeometry = VariantGeometry {
    name: "triangle",
    sides: 3,
    contains: |s, p| point_in_polygon(p, &(TRIANGLE.outline)(s)),
    outline: |s| regular_polygon_points(s.pos, s.size, 3, s.rotation),
};

static PENTAGON: VariantGeometry = VariantGeometry {
    name: "pentagon",
    sides: 5,
    contains: |s, p| point_in_polygon(p, &(PENTAGON.outline)(s)),
    outline: |s| regular_polygon_points(s.pos, s.size, 5, s.rotation),
};

static HEXAGON: VariantGeometry = VariantGeometry {
    name: "hexagon",
    sides: 6,
    contains: |s, p| point_in_polygon(p, &(HEXAGON.outline)(s)),
    outline: |s| regular_polygon_points(s.pos, s.size, 6, s.rotation),
};

static STAR: VariantGeometry = VariantGeometry {
    name: "star",
    sides: 5,
    contains: |s, p| point_in_polygon(p, &(STAR.outline)(s)),
    outline: |s| star_points(s.pos, s.size, s.size * STAR_INNER_RATIO, s.rotation),
};

/// Shape kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeVariant {
    Circle,
    Square,
    Triangle,
    Pentagon,
    Hexagon,
    Star,
}

impl ShapeVariant {
    pub const ALL: [ShapeVariant; 6] = [
        ShapeVariant::Circle,
        ShapeVariant::Square,
        ShapeVariant::Triangle,
        ShapeVariant::Pentagon,
        ShapeVariant::Hexagon,
        ShapeVariant::Star,
    ];

    pub fn geometry(self) -> &'static VariantGeometry {
        match self {
            ShapeVariant::Circle => &CIRCLE,
            ShapeVariant::Square => &SQUARE,
            ShapeVariant::Triangle => &TRIANGLE,
            ShapeVariant::Pentagon => &PENTAGON,
            ShapeVariant::Hexagon => &HEXAGON,
            ShapeVariant::Star => &STAR,
        }
    }

    pub fn sides(self) -> u8 {
        self.geometry().sides
    }

    pub fn name(self) -> &'static str {
        self.geometry().name
    }

    /// Variants whose side count equals `sides`
    pub fn with_sides(sides: u8) -> impl Iterator<Item = ShapeVariant> {
        Self::ALL.into_iter().filter(move |v| v.sides() == sides)
    }
}

/// Render-only state written by the animation layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Decoration {
    pub offset: Vec2,
    pub scale: f32,
    pub opacity: f32,
}

impl Default for Decoration {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            scale: 1.0,
            opacity: 1.0,
        }
    }
}

/// A shape on the canvas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub variant: ShapeVariant,
    pub color: ColorId,
    pub pos: Vec2,
    /// Radius-equivalent half extent
    pub size: f32,
    /// Radians
    pub rotation: f32,
    /// Word printed on the shape (label levels only)
    #[serde(default)]
    pub text_label: Option<String>,
    /// 1-based keyboard shortcut
    #[serde(default)]
    pub ordinal_label: Option<u8>,
    #[serde(default)]
    pub selected: bool,
    #[serde(default)]
    pub hovered: bool,
    /// Pixels per reference frame
    #[serde(default)]
    pub vel: Vec2,
    #[serde(skip)]
    pub decoration: Decoration,
}

impl Shape {
    pub fn new(variant: ShapeVariant, color: ColorId, pos: Vec2, size: f32) -> Self {
        Self {
            variant,
            color,
            pos,
            size,
            rotation: 0.0,
            text_label: None,
            ordinal_label: None,
            selected: false,
            hovered: false,
            vel: Vec2::ZERO,
            decoration: Decoration::default(),
        }
    }

    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.text_label = Some(label.into());
        self
    }

    pub fn sides(&self) -> u8 {
        self.variant.sides()
    }

    pub fn size_bucket(&self) -> SizeBucket {
        SizeBucket::of(self.size)
    }

    /// Hit-test in canvas coordinates
    pub fn contains_point(&self, point: Vec2) -> bool {
        (self.variant.geometry().contains)(self, point)
    }

    /// Outline vertices for the renderer
    pub fn outline(&self) -> Vec<Vec2> {
        (self.variant.geometry().outline)(self)
    }

    /// True when the printed label names the shape's own color
    pub fn label_matches_color(&self) -> bool {
        self.text_label.as_deref() == Some(self.color.label())
    }

    pub fn toggle_select(&mut self) {
        self.selected = !self.selected;
    }

    /// Whether two shapes are closer than their sizes plus `gap`
    pub fn overlaps(&self, other: &Shape, gap: f32) -> bool {
        self.pos.distance(other.pos) < self.size + other.size + gap
    }
}

/// Index of the topmost shape under `point` (later shapes draw on top)
pub fn topmost_at(shapes: &[Shape], point: Vec2) -> Option<usize> {
    shapes.iter().rposition(|s| s.contains_point(point))
}

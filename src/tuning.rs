//! Level configuration and question pools
//!
//! The built-in catalog mirrors the shipped game. A JSON document with the
//! same layout can replace it (`LevelCatalog::from_json`).

use serde::{Deserialize, Serialize};

use crate::consts::MIN_QUESTIONS_TO_COMPLETE;
use crate::sim::question::{Question, QuestionKind};
use crate::sim::shape::{ColorId, ShapeVariant, SizeBucket};

/// Per-level capability flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Mechanics {
    /// Shapes drift and bounce off the canvas edges
    pub movement: bool,
    /// Label-circle generation (text vs. color)
    pub text_labels: bool,
    /// Digits 1-9 toggle labelled shapes
    pub keyboard_shortcuts: bool,
    pub click_selection: bool,
    pub drag_and_drop: bool,
    /// Right-click reveals a shape's true color
    pub right_click_hint: bool,
}

/// Static configuration of one level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    pub level: u8,
    pub name: String,
    pub time_limit_secs: u32,
    pub shape_count: usize,
    #[serde(default = "default_min_questions")]
    pub min_questions: usize,
    pub mechanics: Mechanics,
    pub correct_points: u64,
    pub penalty_points: u64,
    pub questions: Vec<Question>,
}

fn default_min_questions() -> usize {
    MIN_QUESTIONS_TO_COMPLETE
}

/// Errors from loading level data
#[derive(Debug, thiserror::Error)]
pub enum TuningError {
    #[error("level data is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("level data contains no levels")]
    Empty,
    #[error("level {level} has an empty question pool")]
    EmptyPool { level: u8 },
    #[error("level {level} must spawn at least one shape")]
    NoShapes { level: u8 },
}

/// Ordered set of levels, numbered from 1. Never empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "CatalogFile")]
pub struct LevelCatalog {
    levels: Vec<LevelConfig>,
}

/// Unvalidated catalog as it appears in JSON
#[derive(Deserialize)]
struct CatalogFile {
    levels: Vec<LevelConfig>,
}

impl TryFrom<CatalogFile> for LevelCatalog {
    type Error = TuningError;

    fn try_from(file: CatalogFile) -> Result<Self, Self::Error> {
        if file.levels.is_empty() {
            return Err(TuningError::Empty);
        }
        for level in &file.levels {
            if level.questions.is_empty() {
                return Err(TuningError::EmptyPool { level: level.level });
            }
            if level.shape_count == 0 {
                return Err(TuningError::NoShapes { level: level.level });
            }
        }
        Ok(Self {
            levels: file.levels,
        })
    }
}

impl Default for LevelCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl LevelCatalog {
    /// The three shipped levels
    pub fn builtin() -> Self {
        Self {
            levels: vec![level_one(), level_two(), level_three()],
        }
    }

    /// Load a catalog from JSON, validating that every level is playable
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        let catalog = Self::try_from(file)?;
        log::info!("Loaded {} levels from JSON", catalog.levels.len());
        Ok(catalog)
    }

    /// Config for `level`; unknown levels fall back to the first one
    pub fn get(&self, level: u8) -> &LevelConfig {
        self.levels
            .iter()
            .find(|l| l.level == level)
            .unwrap_or(&self.levels[0])
    }

    pub fn contains(&self, level: u8) -> bool {
        self.levels.iter().any(|l| l.level == level)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Highest level number
    pub fn max_level(&self) -> u8 {
        self.levels.iter().map(|l| l.level).max().unwrap_or(1)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LevelConfig> {
        self.levels.iter()
    }
}

fn level_one() -> LevelConfig {
    use QuestionKind::*;
    LevelConfig {
        level: 1,
        name: "Level 1: Click the right shape".into(),
        time_limit_secs: 60,
        shape_count: 8,
        min_questions: MIN_QUESTIONS_TO_COMPLETE,
        mechanics: Mechanics {
            keyboard_shortcuts: true,
            click_selection: true,
            ..Default::default()
        },
        correct_points: 10,
        penalty_points: 5,
        questions: vec![
            Question::new(ByDeclaredColor(ColorId::Red), "Find all RED shapes"),
            Question::new(ByDeclaredColor(ColorId::Blue), "Find all BLUE shapes"),
            Question::new(ByDeclaredColor(ColorId::Green), "Find all GREEN shapes"),
            Question::new(ByDeclaredColor(ColorId::Yellow), "Find all YELLOW shapes"),
            Question::new(ByShapeType(ShapeVariant::Circle), "Find all CIRCLES"),
            Question::new(ByShapeType(ShapeVariant::Square), "Find all SQUARES"),
            Question::new(ByShapeType(ShapeVariant::Triangle), "Find all TRIANGLES"),
            Question::new(ByShapeType(ShapeVariant::Star), "Find all STARS"),
            Question::new(BySideCount(3), "Find shapes with 3 sides"),
            Question::new(BySideCount(4), "Find shapes with 4 sides"),
            Question::new(BySideCount(5), "Find shapes with 5 sides"),
            Question::new(BySizeBucket(SizeBucket::Large), "Find the LARGEST shapes"),
            Question::new(BySizeBucket(SizeBucket::Small), "Find the SMALLEST shapes"),
        ],
    }
}

fn level_two() -> LevelConfig {
    use QuestionKind::*;
    LevelConfig {
        level: 2,
        name: "Level 2: Drag and group".into(),
        time_limit_secs: 60,
        shape_count: 10,
        min_questions: MIN_QUESTIONS_TO_COMPLETE,
        mechanics: Mechanics {
            movement: true,
            drag_and_drop: true,
            ..Default::default()
        },
        correct_points: 20,
        penalty_points: 10,
        questions: vec![
            Question::new(GroupByColorIntoZone(ColorId::Red), "Drag all RED shapes into the zone"),
            Question::new(GroupByColorIntoZone(ColorId::Blue), "Drag all BLUE shapes into the zone"),
            Question::new(GroupByColorIntoZone(ColorId::Green), "Drag all GREEN shapes into the zone"),
            Question::new(GroupByShapeIntoZone(ShapeVariant::Circle), "Gather all CIRCLES in the zone"),
            Question::new(GroupByShapeIntoZone(ShapeVariant::Triangle), "Gather all TRIANGLES in the zone"),
            Question::new(GroupByShapeIntoZone(ShapeVariant::Square), "Gather all SQUARES in the zone"),
            Question::new(GroupByShapeIntoZone(ShapeVariant::Star), "Gather all STARS in the zone"),
        ],
    }
}

fn level_three() -> LevelConfig {
    use QuestionKind::*;
    LevelConfig {
        level: 3,
        name: "Level 3: Text versus color".into(),
        time_limit_secs: 60,
        shape_count: 12,
        min_questions: MIN_QUESTIONS_TO_COMPLETE,
        mechanics: Mechanics {
            text_labels: true,
            keyboard_shortcuts: true,
            click_selection: true,
            right_click_hint: true,
            ..Default::default()
        },
        correct_points: 30,
        penalty_points: 15,
        questions: vec![
            Question::new(ByRenderedColor(ColorId::Red), "Find all RED circles (by color, not text)"),
            Question::new(ByRenderedColor(ColorId::Blue), "Find all BLUE circles (by color, not text)"),
            Question::new(ByRenderedColor(ColorId::Green), "Find all GREEN circles (by color, not text)"),
            Question::new(ByLabelText(ColorId::Red), "Find circles labelled \"RED\""),
            Question::new(ByLabelText(ColorId::Blue), "Find circles labelled \"BLUE\""),
            Question::new(ByLabelText(ColorId::Green), "Find circles labelled \"GREEN\""),
            Question::new(ByLabelText(ColorId::Yellow), "Find circles labelled \"YELLOW\""),
            Question::new(LabelMatchesColor, "Find circles where TEXT = COLOR"),
            Question::new(LabelMismatchesColor, "Find circles where TEXT ≠ COLOR"),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_levels() {
        let catalog = LevelCatalog::builtin();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.max_level(), 3);

        let sizes: Vec<_> = catalog.iter().map(|l| (l.shape_count, l.questions.len())).collect();
        assert_eq!(sizes, vec![(8, 13), (10, 7), (12, 9)]);

        for level in catalog.iter() {
            assert_eq!(level.min_questions, 5);
            assert_eq!(level.time_limit_secs, 60);
            // Exactly one input style per level
            assert_ne!(level.mechanics.click_selection, level.mechanics.drag_and_drop);
        }
        assert!(catalog.get(2).mechanics.movement);
        assert!(catalog.get(3).mechanics.text_labels);
    }

    #[test]
    fn test_unknown_level_falls_back_to_first() {
        let catalog = LevelCatalog::builtin();
        assert_eq!(catalog.get(42).level, 1);
        assert!(!catalog.contains(42));
    }

    #[test]
    fn test_json_round_trip() {
        let catalog = LevelCatalog::builtin();
        let json = serde_json::to_string(&catalog).unwrap();
        let loaded = LevelCatalog::from_json(&json).unwrap();
        assert_eq!(loaded.get(3), catalog.get(3));
    }

    #[test]
    fn test_json_validation() {
        assert!(matches!(
            LevelCatalog::from_json(r#"{"levels":[]}"#),
            Err(TuningError::Empty)
        ));
        assert!(matches!(
            LevelCatalog::from_json("not json"),
            Err(TuningError::Parse(_))
        ));

        let json = r#"{"levels":[{
            "level": 1, "name": "x", "time_limit_secs": 30, "shape_count": 4,
            "mechanics": {"click_selection": true},
            "correct_points": 10, "penalty_points": 5, "questions": []
        }]}"#;
        assert!(matches!(
            LevelCatalog::from_json(json),
            Err(TuningError::EmptyPool { level: 1 })
        ));
    }

    #[test]
    fn test_serde_rejects_empty_catalog() {
        assert!(serde_json::from_str::<LevelCatalog>(r#"{"levels":[]}"#).is_err());

        let json = serde_json::to_string(&LevelCatalog::builtin()).unwrap();
        let catalog: LevelCatalog = serde_json::from_str(&json).unwrap();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.get(9).level, 1);
    }
}

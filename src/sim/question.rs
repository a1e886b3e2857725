//! Questions and answer evaluation
//!
//! Shapes carry no identity, so answers are expressed as indices into the
//! round's shape sequence.

use std::collections::BTreeSet;

use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::shape::{ColorId, Shape, ShapeVariant, SizeBucket};

/// What a question asks for, with its criterion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
    ByDeclaredColor(ColorId),
    ByShapeType(ShapeVariant),
    BySideCount(u8),
    BySizeBucket(SizeBucket),
    GroupByColorIntoZone(ColorId),
    GroupByShapeIntoZone(ShapeVariant),
    /// Color as drawn, ignoring any printed label
    ByRenderedColor(ColorId),
    /// Printed label names this color
    ByLabelText(ColorId),
    LabelMatchesColor,
    LabelMismatchesColor,
    /// Anything not recognized when loading question data
    Unknown,
}

impl QuestionKind {
    /// Whether a single shape satisfies this question
    pub fn accepts(&self, shape: &Shape) -> bool {
        match *self {
            QuestionKind::ByDeclaredColor(color)
            | QuestionKind::GroupByColorIntoZone(color)
            | QuestionKind::ByRenderedColor(color) => shape.color == color,
            QuestionKind::ByShapeType(variant) | QuestionKind::GroupByShapeIntoZone(variant) => {
                shape.variant == variant
            }
            QuestionKind::BySideCount(sides) => shape.sides() == sides,
            QuestionKind::BySizeBucket(bucket) => shape.size_bucket() == bucket,
            QuestionKind::ByLabelText(color) => shape.text_label.as_deref() == Some(color.label()),
            QuestionKind::LabelMatchesColor => shape.label_matches_color(),
            QuestionKind::LabelMismatchesColor => !shape.label_matches_color(),
            QuestionKind::Unknown => false,
        }
    }

    /// Tag used in question data files
    pub fn tag(&self) -> &'static str {
        match self {
            QuestionKind::ByDeclaredColor(_) => "by-declared-color",
            QuestionKind::ByShapeType(_) => "by-shape-type",
            QuestionKind::BySideCount(_) => "by-side-count",
            QuestionKind::BySizeBucket(_) => "by-size-bucket",
            QuestionKind::GroupByColorIntoZone(_) => "group-by-color-into-zone",
            QuestionKind::GroupByShapeIntoZone(_) => "group-by-shape-into-zone",
            QuestionKind::ByRenderedColor(_) => "by-rendered-color",
            QuestionKind::ByLabelText(_) => "by-label-text",
            QuestionKind::LabelMatchesColor => "label-matches-color",
            QuestionKind::LabelMismatchesColor => "label-mismatches-color",
            QuestionKind::Unknown => "unknown",
        }
    }

    fn criterion(&self) -> Value {
        let value = match self {
            QuestionKind::ByDeclaredColor(c)
            | QuestionKind::GroupByColorIntoZone(c)
            | QuestionKind::ByRenderedColor(c)
            | QuestionKind::ByLabelText(c) => serde_json::to_value(c),
            QuestionKind::ByShapeType(v) | QuestionKind::GroupByShapeIntoZone(v) => {
                serde_json::to_value(v)
            }
            QuestionKind::BySideCount(n) => serde_json::to_value(n),
            QuestionKind::BySizeBucket(b) => serde_json::to_value(b),
            QuestionKind::LabelMatchesColor => Ok(Value::Bool(true)),
            QuestionKind::LabelMismatchesColor => Ok(Value::Bool(false)),
            QuestionKind::Unknown => Ok(Value::Null),
        };
        value.unwrap_or(Value::Null)
    }

    /// Build a kind from its data-file tag and criterion. Anything that does
    /// not parse becomes `Unknown`.
    pub fn parse(tag: &str, criterion: Value) -> Self {
        fn arg<T: DeserializeOwned>(value: Value) -> Option<T> {
            serde_json::from_value(value).ok()
        }

        let kind = match tag {
            "by-declared-color" => arg(criterion).map(QuestionKind::ByDeclaredColor),
            "by-shape-type" => arg(criterion).map(QuestionKind::ByShapeType),
            "by-side-count" => arg(criterion).map(QuestionKind::BySideCount),
            "by-size-bucket" => arg(criterion).map(QuestionKind::BySizeBucket),
            "group-by-color-into-zone" => arg(criterion).map(QuestionKind::GroupByColorIntoZone),
            "group-by-shape-into-zone" => arg(criterion).map(QuestionKind::GroupByShapeIntoZone),
            "by-rendered-color" => arg(criterion).map(QuestionKind::ByRenderedColor),
            "by-label-text" => arg(criterion).map(QuestionKind::ByLabelText),
            "label-matches-color" => Some(QuestionKind::LabelMatchesColor),
            "label-mismatches-color" => Some(QuestionKind::LabelMismatchesColor),
            _ => None,
        };
        kind.unwrap_or_else(|| {
            log::warn!("Unrecognized question kind {tag:?}, it will have no answers");
            QuestionKind::Unknown
        })
    }
}

/// On-disk shape of a question
#[derive(Debug, Clone, Serialize, Deserialize)]
struct QuestionRecord {
    kind: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    criterion: Value,
    prompt: String,
}

/// A single question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "QuestionRecord", into = "QuestionRecord")]
pub struct Question {
    pub kind: QuestionKind,
    pub prompt: String,
}

impl From<QuestionRecord> for Question {
    fn from(record: QuestionRecord) -> Self {
        Self {
            kind: QuestionKind::parse(&record.kind, record.criterion),
            prompt: record.prompt,
        }
    }
}

impl From<Question> for QuestionRecord {
    fn from(question: Question) -> Self {
        Self {
            kind: question.kind.tag().to_string(),
            criterion: question.kind.criterion(),
            prompt: question.prompt,
        }
    }
}

impl Question {
    pub fn new(kind: QuestionKind, prompt: impl Into<String>) -> Self {
        Self {
            kind,
            prompt: prompt.into(),
        }
    }

    /// Indices of the shapes that answer this question, in shape order
    pub fn correct_indices(&self, shapes: &[Shape]) -> Vec<usize> {
        shapes
            .iter()
            .enumerate()
            .filter(|(_, s)| self.kind.accepts(s))
            .map(|(i, _)| i)
            .collect()
    }

    /// The shapes that answer this question, in shape order
    pub fn correct_shapes<'a>(&self, shapes: &'a [Shape]) -> Vec<&'a Shape> {
        shapes.iter().filter(|s| self.kind.accepts(s)).collect()
    }

    /// True iff `selected` is exactly the correct set (order and duplicates ignored)
    pub fn selection_matches(&self, selected: &[usize], shapes: &[Shape]) -> bool {
        let selected: BTreeSet<usize> = selected.iter().copied().collect();
        let correct: BTreeSet<usize> = self.correct_indices(shapes).into_iter().collect();
        selected == correct
    }
}

/// Shuffle the pool and take the first `count` questions
pub fn draw_question_set<R: Rng + ?Sized>(pool: &[Question], count: usize, rng: &mut R) -> Vec<Question> {
    let mut questions = pool.to_vec();
    questions.shuffle(rng);
    questions.truncate(count);
    questions
}

/// A random pool question whose prompt is not already in `used`
pub fn bonus_question<R: Rng + ?Sized>(
    pool: &[Question],
    used: &[Question],
    rng: &mut R,
) -> Option<Question> {
    let available: Vec<&Question> = pool
        .iter()
        .filter(|q| !used.iter().any(|u| u.prompt == q.prompt))
        .collect();
    available.choose(rng).map(|q| (*q).clone())
}

//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Virtual clock only (driven by the host through `GameSession::advance`)
//! - Seeded RNG only
//! - Stable iteration order (shape index)
//! - No rendering or platform dependencies

pub mod animation;
pub mod generator;
pub mod input;
pub mod question;
pub mod scheduler;
pub mod score;
pub mod session;
pub mod shape;
pub mod timer;

pub use animation::{Animator, Effect, FloatingText, TextTone};
pub use generator::{Canvas, DropZone};
pub use input::{GameKey, InputEvent};
pub use question::{Question, QuestionKind};
pub use scheduler::{Scheduler, TaskKind};
pub use score::ScoreBoard;
pub use session::{GameEvent, GamePhase, GameSession};
pub use shape::{ColorId, Shape, ShapeVariant, SizeBucket};
pub use timer::{Countdown, TimerDisplay};

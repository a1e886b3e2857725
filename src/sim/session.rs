//! Level session: the round/timer state machine
//!
//! A session owns one level attempt at a time. The host drives it with
//! [`GameSession::advance`] (virtual milliseconds) and
//! [`GameSession::handle_input`], then drains [`GameEvent`]s and reads shapes,
//! drop zone, floating texts and the timer display for rendering.

use std::collections::BTreeMap;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::animation::{Animator, Effect, FloatingText, TextTone};
use super::generator::{self, DropZone};
use super::input::{self, DragState, GameKey, InputEvent};
use super::question::{self, Question};
use super::scheduler::{Scheduler, TaskId, TaskKind};
use super::score::ScoreBoard;
use super::shape::{Shape, topmost_at};
use super::timer::{Countdown, TimerDisplay};
use crate::consts::*;
use crate::persistence::ProgressSink;
use crate::settings::Settings;
use crate::tuning::{LevelCatalog, LevelConfig};

/// Points granted by the debug "add points" command
pub const DEBUG_POINTS: u64 = 100;
/// Seconds granted by the debug "add time" command
pub const DEBUG_SECONDS: u32 = 30;
/// Hint text floats this far above the shape
const HINT_TEXT_RISE: f32 = 50.0;

/// Current phase of a level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// No level loaded
    Idle,
    /// Level loaded, waiting for the start action
    Splash,
    /// Countdown running, answers accepted
    Playing,
    /// Countdown and frame updates frozen
    Paused,
    /// Correct answer given, next question pending
    RoundResolved,
    LevelComplete,
    LevelFailed,
}

impl GamePhase {
    pub fn is_over(self) -> bool {
        matches!(self, GamePhase::LevelComplete | GamePhase::LevelFailed)
    }
}

/// Notifications for the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    LevelStarted { level: u8, name: String },
    QuestionShown { index: usize, prompt: String },
    Correct { points: u64 },
    Wrong { penalty: u64 },
    /// Fired once per countdown
    TimerWarning { remaining_secs: u32 },
    /// Enough questions answered to finish the level
    FinishAvailable,
    BonusQuestion { ordinal: u32, multiplier: f64 },
    Paused,
    Resumed,
    LevelComplete {
        level: u8,
        level_score: u64,
        total: u64,
        bonus: u64,
    },
    LevelFailed { level: u8, answered: usize },
    AllLevelsComplete,
}

/// One player's run through the levels
pub struct GameSession {
    catalog: LevelCatalog,
    settings: Settings,
    rng: Pcg32,
    scheduler: Scheduler,
    timer: Countdown,
    coarse_task: Option<TaskId>,
    fine_task: Option<TaskId>,
    frame_task: Option<TaskId>,
    advance_task: Option<TaskId>,
    phase: GamePhase,
    level: u8,
    questions: Vec<Question>,
    question_index: usize,
    bonus_count: u32,
    timer_started: bool,
    shapes: Vec<Shape>,
    drop_zone: Option<DropZone>,
    drag: Option<DragState>,
    animator: Animator,
    score: ScoreBoard,
    events: Vec<GameEvent>,
    player: Option<String>,
    sink: Option<Box<dyn ProgressSink>>,
}

impl GameSession {
    pub fn new(catalog: LevelCatalog, settings: Settings, seed: u64) -> Self {
        Self {
            catalog,
            settings,
            rng: Pcg32::seed_from_u64(seed),
            scheduler: Scheduler::new(),
            timer: Countdown::new(),
            coarse_task: None,
            fine_task: None,
            frame_task: None,
            advance_task: None,
            phase: GamePhase::Idle,
            level: 1,
            questions: Vec::new(),
            question_index: 0,
            bonus_count: 0,
            timer_started: false,
            shapes: Vec::new(),
            drop_zone: None,
            drag: None,
            animator: Animator::new(),
            score: ScoreBoard::new(),
            events: Vec::new(),
            player: None,
            sink: None,
        }
    }

    /// Persist results for `player` through `sink`
    pub fn with_sink(mut self, player: impl Into<String>, sink: Box<dyn ProgressSink>) -> Self {
        self.player = Some(player.into());
        self.sink = Some(sink);
        self
    }

    // === Accessors ===

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn config(&self) -> &LevelConfig {
        self.catalog.get(self.level)
    }

    pub fn catalog(&self) -> &LevelCatalog {
        &self.catalog
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn drop_zone(&self) -> Option<&DropZone> {
        self.drop_zone.as_ref()
    }

    pub fn floating_texts(&self) -> &[FloatingText] {
        self.animator.floating_texts()
    }

    pub fn timer_display(&self) -> TimerDisplay {
        if self.timer_started {
            self.timer.display()
        } else {
            TimerDisplay {
                seconds: self.config().time_limit_secs,
                hundredths: 0,
            }
        }
    }

    pub fn remaining_secs(&self) -> u32 {
        self.timer.remaining_secs()
    }

    pub fn timer_started(&self) -> bool {
        self.timer_started
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.question_index)
    }

    /// Questions answered so far this level
    pub fn question_index(&self) -> usize {
        self.question_index
    }

    pub fn bonus_count(&self) -> u32 {
        self.bonus_count
    }

    pub fn score(&self) -> &ScoreBoard {
        &self.score
    }

    /// Whether the player may end the level now
    pub fn finish_available(&self) -> bool {
        self.question_index >= self.config().min_questions
            && !matches!(self.phase, GamePhase::Idle | GamePhase::Splash)
            && !self.phase.is_over()
    }

    /// An answer was accepted and the next question is scheduled
    pub fn advance_pending(&self) -> bool {
        self.advance_task.is_some()
    }

    /// Virtual time in milliseconds
    pub fn now_ms(&self) -> u64 {
        self.scheduler.now()
    }

    pub fn selected(&self) -> Vec<usize> {
        input::selected_indices(&self.shapes)
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    // === Level lifecycle ===

    /// Cancel every live task and stop the countdown
    fn stop_all(&mut self) {
        for task in [
            self.coarse_task.take(),
            self.fine_task.take(),
            self.frame_task.take(),
            self.advance_task.take(),
        ]
        .into_iter()
        .flatten()
        {
            self.scheduler.cancel(task);
        }
        self.timer.stop();
    }

    /// Load `level` and show its splash. Unknown levels load the first one.
    pub fn start_level(&mut self, level: u8) {
        self.stop_all();
        if !self.catalog.contains(level) {
            log::warn!("Level {level} does not exist, loading the first level");
        }

        let config = self.catalog.get(level);
        self.level = config.level;
        self.score
            .set_level_points(config.level, config.correct_points, config.penalty_points);
        self.score.reset_multiplier();
        self.questions =
            question::draw_question_set(&config.questions, config.min_questions, &mut self.rng);
        let name = config.name.clone();

        self.question_index = 0;
        self.bonus_count = 0;
        self.timer_started = false;
        self.timer = Countdown::new();
        self.animator.clear();
        self.load_round();

        self.frame_task = Some(self.scheduler.schedule_every(TaskKind::Frame, FRAME_MS));
        self.phase = GamePhase::Splash;

        log::info!("Starting level {}: {name}", self.level);
        self.events.push(GameEvent::LevelStarted {
            level: self.level,
            name,
        });
        self.emit_question();
    }

    /// Leave the splash: fresh shapes for the first question and the
    /// countdown starts
    pub fn begin(&mut self) -> bool {
        if self.phase != GamePhase::Splash {
            return false;
        }
        self.load_round();
        self.start_timer();
        self.phase = GamePhase::Playing;
        true
    }

    fn start_timer(&mut self) {
        if self.timer_started {
            return;
        }
        let limit = self.config().time_limit_secs;
        self.timer.start(limit);
        // Coarse first so both ticks at a shared instant see the same second
        self.coarse_task = Some(self.scheduler.schedule_every(TaskKind::CoarseTick, COARSE_TICK_MS));
        self.fine_task = Some(self.scheduler.schedule_every(TaskKind::FineTick, FINE_TICK_MS));
        self.timer_started = true;
        log::debug!("Countdown started: {limit}s");
    }

    /// Build shapes (and drop zone) for the current question
    fn load_round(&mut self) {
        self.drag = None;
        self.drop_zone = None;
        self.animator.clear_effects();

        let config = self.catalog.get(self.level);
        let Some(question) = self.questions.get(self.question_index) else {
            self.shapes.clear();
            return;
        };
        let canvas = self.settings.canvas();
        self.shapes = generator::populate(config, question, canvas, &mut self.rng);

        if config.mechanics.movement {
            generator::apply_movement(&mut self.shapes, &mut self.rng);
            self.drop_zone = Some(generator::place_drop_zone(
                canvas,
                &question.prompt,
                &mut self.rng,
            ));
        }
        if config.mechanics.text_labels && self.settings.effective_flicker() {
            let now = self.scheduler.now();
            for i in 0..self.shapes.len() {
                self.animator.start(i, Effect::Flicker, now);
            }
        }
    }

    fn emit_question(&mut self) {
        if let Some(question) = self.questions.get(self.question_index) {
            self.events.push(GameEvent::QuestionShown {
                index: self.question_index,
                prompt: question.prompt.clone(),
            });
        }
    }

    /// Judge the current selection (or drop zone). `None` when no answer
    /// is accepted right now.
    pub fn check_answer(&mut self) -> Option<bool> {
        if self.phase != GamePhase::Playing {
            return None;
        }
        let config = self.catalog.get(self.level);
        let question = self.questions.get(self.question_index)?;

        let (correct, judged) = if config.mechanics.drag_and_drop {
            match &self.drop_zone {
                Some(zone) => (
                    input::zone_matches(question, &self.shapes, zone),
                    input::zone_contents(&self.shapes, zone),
                ),
                None => (false, Vec::new()),
            }
        } else {
            let selected = input::selected_indices(&self.shapes);
            (question.selection_matches(&selected, &self.shapes), selected)
        };

        if correct {
            self.on_correct(&judged);
        } else {
            self.on_wrong();
        }
        Some(correct)
    }

    fn on_correct(&mut self, judged: &[usize]) {
        let points = self.score.credit_correct(self.level);
        log::debug!("Correct answer on question {}: +{points}", self.question_index + 1);
        self.events.push(GameEvent::Correct { points });

        let now = self.scheduler.now();
        if self.settings.floating_text {
            self.animator.float_text(FloatingText::new(
                format!("+{points}"),
                self.settings.canvas().center(),
                TextTone::Positive,
            ));
        }
        if self.settings.effective_pulse() {
            for &i in judged {
                self.animator.start(i, Effect::Pulse, now);
            }
        }

        self.advance_task = Some(
            self.scheduler
                .schedule_once(TaskKind::AdvanceQuestion, ADVANCE_DELAY_MS),
        );
        self.phase = GamePhase::RoundResolved;
    }

    fn on_wrong(&mut self) {
        let penalty = self.score.apply_penalty(self.level).unsigned_abs();
        log::debug!("Wrong answer on question {}: -{penalty}", self.question_index + 1);
        self.events.push(GameEvent::Wrong { penalty });

        let now = self.scheduler.now();
        if self.settings.floating_text {
            self.animator.float_text(FloatingText::new(
                format!("-{penalty}"),
                self.settings.canvas().center(),
                TextTone::Negative,
            ));
        }
        if self.settings.effective_shake() {
            for i in 0..self.shapes.len() {
                self.animator.start(i, Effect::Shake, now);
            }
        }
    }

    /// Move to the next question, a bonus question, or completion
    pub fn advance_question(&mut self) {
        if self.phase.is_over() || self.phase == GamePhase::Idle {
            return;
        }
        self.question_index += 1;
        let min = self.config().min_questions;

        if self.question_index >= min {
            if self.question_index == min {
                self.events.push(GameEvent::FinishAvailable);
            }
            if self.question_index >= self.questions.len() {
                let pool = &self.catalog.get(self.level).questions;
                match question::bonus_question(pool, &self.questions, &mut self.rng) {
                    Some(bonus) => self.questions.push(bonus),
                    None => {
                        log::info!("Question pool exhausted");
                        self.complete_level();
                        return;
                    }
                }
            }
            self.bonus_count = (self.question_index - min + 1) as u32;
            self.score.set_bonus_multiplier(self.bonus_count);
            self.events.push(GameEvent::BonusQuestion {
                ordinal: self.bonus_count,
                multiplier: self.score.multiplier(),
            });
        } else if self.question_index >= self.questions.len() {
            self.complete_level();
            return;
        }

        self.load_round();
        if self.phase != GamePhase::Paused {
            self.phase = GamePhase::Playing;
        }
        self.emit_question();
    }

    /// Win the level: stop everything, add the completion bonus, persist
    pub fn complete_level(&mut self) {
        if self.phase.is_over() || self.phase == GamePhase::Idle {
            return;
        }
        self.stop_all();
        self.drag = None;
        let bonus = self.score.apply_completion_bonus(self.level);
        self.phase = GamePhase::LevelComplete;

        let level_score = self.score.level_score(self.level);
        log::info!(
            "Level {} complete: {level_score} points (bonus {bonus})",
            self.level
        );
        self.events.push(GameEvent::LevelComplete {
            level: self.level,
            level_score,
            total: self.score.total(),
            bonus,
        });
        self.persist();
    }

    /// Player asked to end the level; honoured once enough questions are
    /// answered
    pub fn finish_level(&mut self) -> bool {
        if !self.finish_available() {
            return false;
        }
        self.complete_level();
        true
    }

    /// Countdown ran out
    fn expire(&mut self) {
        if self.question_index >= self.config().min_questions {
            self.complete_level();
            return;
        }
        self.stop_all();
        self.drag = None;
        self.phase = GamePhase::LevelFailed;
        log::info!(
            "Level {} failed: time ran out after {} answers",
            self.level,
            self.question_index
        );
        self.events.push(GameEvent::LevelFailed {
            level: self.level,
            answered: self.question_index,
        });
        self.persist();
    }

    fn persist(&mut self) {
        let (Some(player), Some(sink)) = (self.player.as_deref(), self.sink.as_mut()) else {
            return;
        };
        let scores = BTreeMap::from([(self.level, self.score.level_score(self.level))]);
        sink.save_session(player, &scores, self.score.total());
    }

    // === Pause ===

    pub fn pause(&mut self) -> bool {
        if !matches!(self.phase, GamePhase::Playing | GamePhase::RoundResolved) {
            return false;
        }
        self.phase = GamePhase::Paused;
        self.timer.pause();
        self.drop_drag();
        self.events.push(GameEvent::Paused);
        true
    }

    /// Let go of the dragged shape where it is, moving again as before
    /// the grab
    fn drop_drag(&mut self) {
        let Some(drag) = self.drag.take() else {
            return;
        };
        if let (Some(vel), Some(shape)) = (drag.saved_velocity, self.shapes.get_mut(drag.shape)) {
            shape.vel = vel;
        }
    }

    pub fn resume(&mut self) -> bool {
        if self.phase != GamePhase::Paused {
            return false;
        }
        self.timer.resume();
        self.phase = if self.advance_task.is_some() {
            GamePhase::RoundResolved
        } else {
            GamePhase::Playing
        };
        self.events.push(GameEvent::Resumed);
        true
    }

    pub fn toggle_pause(&mut self) -> bool {
        if self.phase == GamePhase::Paused {
            self.resume()
        } else {
            self.pause()
        }
    }

    // === Navigation ===

    pub fn restart_level(&mut self) {
        self.start_level(self.level);
    }

    /// Unlock and start the following level. Returns false (and emits
    /// `AllLevelsComplete`) when there is none.
    pub fn next_level(&mut self) -> bool {
        let next = self.level.saturating_add(1);
        if !self.catalog.contains(next) {
            log::info!("All levels complete");
            self.events.push(GameEvent::AllLevelsComplete);
            return false;
        }
        self.unlock(next);
        self.start_level(next);
        true
    }

    fn unlock(&mut self, level: u8) {
        if let (Some(player), Some(sink)) = (self.player.as_deref(), self.sink.as_mut()) {
            sink.unlock_level(player, level);
        }
    }

    // === Debug commands ===

    pub fn debug_add_points(&mut self) {
        self.score.add_points(self.level, DEBUG_POINTS);
        log::debug!("Debug: +{DEBUG_POINTS} points");
    }

    pub fn debug_add_time(&mut self) -> bool {
        if !self.timer.is_running() {
            return false;
        }
        self.timer.add_time(DEBUG_SECONDS);
        log::debug!("Debug: +{DEBUG_SECONDS}s");
        true
    }

    pub fn debug_skip_question(&mut self) -> bool {
        if !matches!(
            self.phase,
            GamePhase::Playing | GamePhase::RoundResolved | GamePhase::Paused
        ) {
            return false;
        }
        if let Some(task) = self.advance_task.take() {
            self.scheduler.cancel(task);
        }
        log::debug!("Debug: skipping question {}", self.question_index + 1);
        self.advance_question();
        true
    }

    pub fn debug_jump_to_level(&mut self, level: u8) -> bool {
        if !self.catalog.contains(level) {
            return false;
        }
        self.unlock(level);
        self.start_level(level);
        true
    }

    // === Input ===

    pub fn handle_input(&mut self, event: InputEvent) {
        if event == InputEvent::Key(GameKey::Escape) {
            self.toggle_pause();
            return;
        }
        if self.phase != GamePhase::Playing {
            return;
        }

        let mechanics = self.config().mechanics;
        match event {
            InputEvent::PointerDown { x, y } if mechanics.drag_and_drop => {
                self.drag = DragState::grab(&mut self.shapes, Vec2::new(x, y));
            }
            InputEvent::PointerMove { x, y } => {
                let point = Vec2::new(x, y);
                if mechanics.drag_and_drop {
                    if let Some(drag) = self.drag.as_mut() {
                        drag.aim(point);
                    }
                } else {
                    input::update_hover(&mut self.shapes, point);
                }
            }
            InputEvent::PointerUp { .. } if mechanics.drag_and_drop => self.release_drag(),
            InputEvent::Click { x, y } if mechanics.click_selection => {
                input::toggle_at(&mut self.shapes, Vec2::new(x, y));
            }
            InputEvent::DoubleClick { .. } if mechanics.drag_and_drop => {
                if let (Some(question), Some(zone)) =
                    (self.questions.get(self.question_index), self.drop_zone.as_ref())
                {
                    input::snap_correct_into_zone(question, &mut self.shapes, zone);
                }
            }
            InputEvent::ContextMenu { x, y } if mechanics.right_click_hint => {
                self.hint_at(Vec2::new(x, y));
            }
            InputEvent::Key(GameKey::Digit(n)) if mechanics.keyboard_shortcuts && self.timer_started => {
                input::toggle_ordinal(&mut self.shapes, n);
            }
            InputEvent::Key(GameKey::Enter) if self.timer_started => {
                self.check_answer();
            }
            _ => {}
        }
    }

    /// Drop the dragged shape: park it if it landed correctly in the zone,
    /// otherwise set it moving again
    fn release_drag(&mut self) {
        let Some(drag) = self.drag.take() else {
            return;
        };
        let (Some(question), Some(zone)) =
            (self.questions.get(self.question_index), self.drop_zone.as_ref())
        else {
            return;
        };
        let Some(shape) = self.shapes.get_mut(drag.shape) else {
            return;
        };

        let in_zone = zone.contains(shape.pos);
        if in_zone && question.kind.accepts(shape) {
            shape.vel = Vec2::ZERO;
        } else {
            shape.vel = drag
                .saved_velocity
                .unwrap_or_else(|| generator::random_velocity(&mut self.rng));
        }

        if in_zone && input::zone_matches(question, &self.shapes, zone) {
            self.check_answer();
        }
    }

    /// Reveal the true color of the shape under `point`
    fn hint_at(&mut self, point: Vec2) {
        let Some(index) = topmost_at(&self.shapes, point) else {
            return;
        };
        let shape = &self.shapes[index];
        let text = FloatingText::new(
            shape.color.label(),
            shape.pos - Vec2::new(0.0, HINT_TEXT_RISE),
            TextTone::Hint(shape.color),
        );
        self.animator.float_text(text);
        if self.settings.effective_pulse() {
            let now = self.scheduler.now();
            self.animator.start(index, Effect::Pulse, now);
        }
    }

    // === Clock ===

    /// Run the virtual clock forward by `ms`, firing every due task
    pub fn advance(&mut self, ms: u64) {
        let until = self.scheduler.now() + ms;
        while let Some((id, kind)) = self.scheduler.pop_due(until) {
            match kind {
                TaskKind::CoarseTick => {
                    if self.timer.on_coarse_tick() {
                        let remaining_secs = self.timer.remaining_secs();
                        log::info!("{remaining_secs} seconds left");
                        self.events.push(GameEvent::TimerWarning { remaining_secs });
                    }
                }
                TaskKind::FineTick => {
                    if self.timer.on_fine_tick() {
                        self.expire();
                    }
                }
                TaskKind::Frame => self.frame(FRAME_MS as f32),
                TaskKind::AdvanceQuestion => {
                    if self.advance_task == Some(id) {
                        self.advance_task = None;
                        self.advance_question();
                    }
                }
            }
        }
        self.scheduler.settle(until);
    }

    /// One frame: drag easing, drift, effects and floating text
    fn frame(&mut self, dt_ms: f32) {
        if !matches!(
            self.phase,
            GamePhase::Splash | GamePhase::Playing | GamePhase::RoundResolved
        ) {
            return;
        }
        if self.config().mechanics.movement {
            if let Some(drag) = &self.drag {
                drag.ease(&mut self.shapes);
            }
            let held = self.drag.as_ref().map(|d| d.shape);
            let canvas = self.settings.canvas();
            generator::step_movement(&mut self.shapes, held, canvas, dt_ms / REFERENCE_FRAME_MS);
        }
        let now = self.scheduler.now();
        self.animator.apply(&mut self.shapes, now);
        self.animator.step_texts();
    }
}

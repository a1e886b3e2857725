//! Find The Shape entry point
//!
//! The browser build exposes `WebGame` to the page script, which owns the
//! canvas and DOM. The native build plays through the levels headlessly.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use serde::Serialize;
    use wasm_bindgen::prelude::*;

    use find_the_shape::Settings;
    use find_the_shape::persistence::ProfileStore;
    use find_the_shape::platform::{self, LocalStorage};
    use find_the_shape::sim::shape::Decoration;
    use find_the_shape::sim::{
        DropZone, FloatingText, GameKey, GamePhase, GameSession, InputEvent, Shape,
    };
    use find_the_shape::tuning::LevelCatalog;

    /// Longest frame gap fed to the clock (tab switches, breakpoints)
    const MAX_FRAME_GAP_MS: f64 = 250.0;

    /// Everything the page needs to draw one frame
    #[derive(Serialize)]
    struct View<'a> {
        phase: GamePhase,
        level: u8,
        level_name: &'a str,
        prompt: Option<&'a str>,
        question: usize,
        timer: String,
        level_score: u64,
        total_score: u64,
        multiplier: f64,
        finish_available: bool,
        shapes: Vec<ShapeView<'a>>,
        drop_zone: Option<&'a DropZone>,
        floating_texts: &'a [FloatingText],
    }

    /// One shape ready to draw
    #[derive(Serialize)]
    struct ShapeView<'a> {
        #[serde(flatten)]
        shape: &'a Shape,
        fill: &'static str,
        outline: Vec<Vec2>,
        decoration: Decoration,
    }

    impl<'a> ShapeView<'a> {
        fn new(shape: &'a Shape) -> Self {
            Self {
                shape,
                fill: shape.color.hex(),
                outline: shape.outline(),
                decoration: shape.decoration,
            }
        }
    }

    /// Game instance driven by the page's animation frame loop
    #[wasm_bindgen]
    pub struct WebGame {
        session: Rc<RefCell<GameSession>>,
        last_time: Option<f64>,
        carry_ms: f64,
    }

    #[wasm_bindgen]
    impl WebGame {
        /// Progress is saved to LocalStorage when a player name is given
        #[wasm_bindgen(constructor)]
        pub fn new(player: Option<String>) -> WebGame {
            let storage = LocalStorage::open();
            let settings = storage
                .as_ref()
                .map(|s| Settings::load(s))
                .unwrap_or_default();

            let seed = platform::entropy_seed();
            let mut session = GameSession::new(LevelCatalog::builtin(), settings, seed);
            match (player, storage) {
                (Some(player), Some(storage)) => {
                    log::info!("Playing as {player}");
                    session = session.with_sink(player, Box::new(ProfileStore::new(storage)));
                }
                (Some(_), None) => log::warn!("LocalStorage unavailable, progress will not be saved"),
                (None, _) => log::info!("Playing as guest"),
            }

            let session = Rc::new(RefCell::new(session));
            setup_auto_pause(session.clone());
            WebGame {
                session,
                last_time: None,
                carry_ms: 0.0,
            }
        }

        /// Levels the stored player may select
        pub fn unlocked_levels(player: &str) -> u8 {
            LocalStorage::open()
                .map(|s| ProfileStore::new(s).unlocked_levels(player))
                .unwrap_or(1)
        }

        /// 1-based place on the global leaderboard
        pub fn player_rank(player: &str) -> Option<usize> {
            LocalStorage::open().and_then(|s| ProfileStore::new(s).player_rank(player))
        }

        pub fn start_level(&mut self, level: u8) {
            self.session.borrow_mut().start_level(level);
        }

        /// Splash start button
        pub fn begin(&mut self) -> bool {
            self.session.borrow_mut().begin()
        }

        /// Feed a `requestAnimationFrame` timestamp
        pub fn tick(&mut self, time_ms: f64) {
            let dt = self
                .last_time
                .map(|last| (time_ms - last).clamp(0.0, MAX_FRAME_GAP_MS))
                .unwrap_or(0.0);
            self.last_time = Some(time_ms);

            self.carry_ms += dt;
            let whole = self.carry_ms.floor();
            self.carry_ms -= whole;
            self.session.borrow_mut().advance(whole as u64);
        }

        pub fn pointer_down(&mut self, x: f32, y: f32) {
            self.input(InputEvent::PointerDown { x, y });
        }

        pub fn pointer_move(&mut self, x: f32, y: f32) {
            self.input(InputEvent::PointerMove { x, y });
        }

        pub fn pointer_up(&mut self, x: f32, y: f32) {
            self.input(InputEvent::PointerUp { x, y });
        }

        pub fn click(&mut self, x: f32, y: f32) {
            self.input(InputEvent::Click { x, y });
        }

        pub fn double_click(&mut self, x: f32, y: f32) {
            self.input(InputEvent::DoubleClick { x, y });
        }

        pub fn context_menu(&mut self, x: f32, y: f32) {
            self.input(InputEvent::ContextMenu { x, y });
        }

        /// `KeyboardEvent.key`; returns whether the game uses the key
        pub fn key(&mut self, name: &str) -> bool {
            match GameKey::from_key_name(name) {
                Some(key) => {
                    self.input(InputEvent::Key(key));
                    true
                }
                None => false,
            }
        }

        fn input(&mut self, event: InputEvent) {
            self.session.borrow_mut().handle_input(event);
        }

        /// Check button; `undefined` when no answer is accepted
        pub fn check_answer(&mut self) -> Option<bool> {
            self.session.borrow_mut().check_answer()
        }

        pub fn finish_level(&mut self) -> bool {
            self.session.borrow_mut().finish_level()
        }

        pub fn toggle_pause(&mut self) -> bool {
            self.session.borrow_mut().toggle_pause()
        }

        pub fn restart_level(&mut self) {
            self.session.borrow_mut().restart_level();
        }

        pub fn next_level(&mut self) -> bool {
            self.session.borrow_mut().next_level()
        }

        pub fn debug_add_points(&mut self) {
            self.session.borrow_mut().debug_add_points();
        }

        pub fn debug_add_time(&mut self) -> bool {
            self.session.borrow_mut().debug_add_time()
        }

        pub fn debug_skip_question(&mut self) -> bool {
            self.session.borrow_mut().debug_skip_question()
        }

        pub fn debug_jump_to_level(&mut self, level: u8) -> bool {
            self.session.borrow_mut().debug_jump_to_level(level)
        }

        /// Current frame as JSON
        pub fn state_json(&self) -> Result<String, JsValue> {
            let session = self.session.borrow();
            let config = session.config();
            let view = View {
                phase: session.phase(),
                level: session.level(),
                level_name: &config.name,
                prompt: session.current_question().map(|q| q.prompt.as_str()),
                question: session.question_index(),
                timer: session.timer_display().to_string(),
                level_score: session.score().level_score(session.level()),
                total_score: session.score().total(),
                multiplier: session.score().multiplier(),
                finish_available: session.finish_available(),
                shapes: session.shapes().iter().map(ShapeView::new).collect(),
                drop_zone: session.drop_zone(),
                floating_texts: session.floating_texts(),
            };
            serde_json::to_string(&view).map_err(|e| JsValue::from_str(&e.to_string()))
        }

        /// Events since the last call, as a JSON array
        pub fn drain_events_json(&mut self) -> Result<String, JsValue> {
            let events = self.session.borrow_mut().drain_events();
            serde_json::to_string(&events).map_err(|e| JsValue::from_str(&e.to_string()))
        }
    }

    /// Pause when the tab is hidden
    fn setup_auto_pause(session: Rc<RefCell<GameSession>>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        let document_clone = document.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            if document_clone.visibility_state() != web_sys::VisibilityState::Hidden {
                return;
            }
            if let Ok(mut session) = session.try_borrow_mut() {
                if session.pause() {
                    log::info!("Auto-paused (tab hidden)");
                }
            }
        });
        let _ = document.add_event_listener_with_callback(
            "visibilitychange",
            closure.as_ref().unchecked_ref(),
        );
        closure.forget();
    }

    pub fn init() {
        console_error_panic_hook::set_once();
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::warn_1(&format!("Logger init failed: {e}").into());
        }
        log::info!("Find The Shape starting...");
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::init();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use find_the_shape::Settings;
    use find_the_shape::consts::ADVANCE_DELAY_MS;
    use find_the_shape::persistence::{MemoryStore, ProfileStore};
    use find_the_shape::platform;
    use find_the_shape::sim::{GamePhase, GameSession};
    use find_the_shape::tuning::LevelCatalog;

    env_logger::init();
    log::info!("Find The Shape (native) starting...");
    log::info!("Native mode plays headlessly - serve the web build for the real game");

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(platform::entropy_seed);
    log::info!("Seed: {seed}");

    let store = MemoryStore::new();
    let profiles = ProfileStore::new(store.clone());
    let mut session = GameSession::new(LevelCatalog::builtin(), Settings::load(&store), seed)
        .with_sink(DEMO_PLAYER, Box::new(profiles.clone()));

    session.start_level(1);
    loop {
        session.begin();
        while !session.phase().is_over() {
            if session.question_index() >= DEMO_TARGET && session.finish_level() {
                break;
            }
            autoplay_round(&mut session);
            session.advance(ADVANCE_DELAY_MS);
            for event in session.drain_events() {
                log::info!("{event:?}");
            }
        }
        for event in session.drain_events() {
            log::info!("{event:?}");
        }
        if session.phase() != GamePhase::LevelComplete || !session.next_level() {
            break;
        }
    }

    let profile = profiles.profile(DEMO_PLAYER);
    println!("\n{} played {} levels", DEMO_PLAYER, profile.total_games_played);
    println!("Total score: {}", session.score().total());
    for (level, score) in session.score().level_scores() {
        println!("  Level {level}: {score}");
    }
    println!("Levels unlocked: {}", profile.levels_unlocked);
    if let Some(rank) = profiles.player_rank(DEMO_PLAYER) {
        println!("Leaderboard rank: {rank}");
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
const DEMO_PLAYER: &str = "demo";

/// Questions answered before the demo finishes a level (one bonus)
#[cfg(not(target_arch = "wasm32"))]
const DEMO_TARGET: usize = find_the_shape::consts::MIN_QUESTIONS_TO_COMPLETE + 1;

/// Answer the current question the way a player would
#[cfg(not(target_arch = "wasm32"))]
fn autoplay_round(session: &mut find_the_shape::sim::GameSession) {
    use find_the_shape::sim::{GameKey, InputEvent};

    let Some(question) = session.current_question().cloned() else {
        return;
    };
    if session.config().mechanics.drag_and_drop {
        session.handle_input(InputEvent::DoubleClick { x: 0.0, y: 0.0 });
    } else {
        for index in question.correct_indices(session.shapes()) {
            let shape = &session.shapes()[index];
            let event = match shape.ordinal_label {
                Some(n) => InputEvent::Key(GameKey::Digit(n)),
                None => InputEvent::Click {
                    x: shape.pos.x,
                    y: shape.pos.y,
                },
            };
            session.handle_input(event);
        }
    }
    session.handle_input(InputEvent::Key(GameKey::Enter));
}

//! Game settings and preferences
//!
//! Persisted separately from player data in the key-value store.

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_CANVAS_HEIGHT, DEFAULT_CANVAS_WIDTH};
use crate::persistence::{KeyValueStore, StorageError, load_json, save_json};
use crate::sim::Canvas;

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Canvas ===
    pub canvas_width: f32,
    pub canvas_height: f32,

    // === Visual Effects ===
    /// Shake every shape on a wrong answer
    pub shake: bool,
    /// Pulse shapes on a correct answer or hint
    pub pulse: bool,
    /// Opacity flicker on label circles
    pub flicker: bool,
    /// Rising "+10" / "-5" feedback text
    pub floating_text: bool,

    // === Accessibility ===
    /// Reduced motion (no shake or pulse)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            canvas_width: DEFAULT_CANVAS_WIDTH,
            canvas_height: DEFAULT_CANVAS_HEIGHT,

            // Visual effects - all on by default
            shake: true,
            pulse: true,
            flicker: true,
            floating_text: true,

            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "find_the_shape_settings";

    pub fn canvas(&self) -> Canvas {
        Canvas::new(self.canvas_width, self.canvas_height)
    }

    /// Effective shake (respects reduced_motion)
    pub fn effective_shake(&self) -> bool {
        self.shake && !self.reduced_motion
    }

    /// Effective pulse (respects reduced_motion)
    pub fn effective_pulse(&self) -> bool {
        self.pulse && !self.reduced_motion
    }

    pub fn effective_flicker(&self) -> bool {
        self.flicker
    }

    /// Stored settings, `Ok(None)` when nothing has been saved yet
    pub fn try_load<S: KeyValueStore + ?Sized>(store: &S) -> Result<Option<Self>, StorageError> {
        load_json(store, Self::STORAGE_KEY)
    }

    /// Stored settings, falling back to defaults
    pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> Self {
        match Self::try_load(store) {
            Ok(Some(settings)) => {
                log::info!("Loaded settings");
                settings
            }
            Ok(None) => {
                log::info!("Using default settings");
                Self::default()
            }
            Err(e) => {
                log::warn!("Stored settings are unreadable, using defaults: {e}");
                Self::default()
            }
        }
    }

    pub fn save<S: KeyValueStore + ?Sized>(&self, store: &S) -> Result<(), StorageError> {
        save_json(store, Self::STORAGE_KEY, self)?;
        log::info!("Settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    #[test]
    fn test_reduced_motion() {
        let mut settings = Settings::default();
        assert!(settings.effective_shake() && settings.effective_pulse());
        settings.reduced_motion = true;
        assert!(!settings.effective_shake());
        assert!(!settings.effective_pulse());
        assert!(settings.effective_flicker());
    }

    #[test]
    fn test_load_save() {
        let store = MemoryStore::new();
        assert_eq!(Settings::load(&store), Settings::default());

        let settings = Settings {
            canvas_width: 800.0,
            shake: false,
            ..Default::default()
        };
        settings.save(&store).unwrap();
        assert_eq!(Settings::load(&store), settings);
        assert_eq!(Settings::load(&store).canvas().width, 800.0);
    }

    #[test]
    fn test_partial_and_corrupt_data() {
        let store = MemoryStore::new();
        store.set(Settings::STORAGE_KEY, r#"{"pulse": false}"#).unwrap();
        let settings = Settings::load(&store);
        assert!(!settings.pulse);
        assert!(settings.shake);

        store.set(Settings::STORAGE_KEY, "][").unwrap();
        assert_eq!(Settings::load(&store), Settings::default());
        assert!(Settings::try_load(&store).is_err());
    }
}

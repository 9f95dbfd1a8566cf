//! Save checkpoints
//!
//! Key-value store с int значениями (флаги уровней). Store инжектится как
//! resource (`SaveState`), никаких глобалов: тесты используют
//! `MemorySaveStore`, headless runner пишет JSON файл.

use bevy::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::boss::EncounterResolved;
use crate::combat::EntityDied;
use crate::error::SimError;

/// Флаги прохождения уровней (правило win-сцены: все == 1)
pub const LEVEL_KEYS: [&str; 4] = [
    "Level1Completed",
    "Level2Completed",
    "Level3Completed",
    "Level4Completed",
];

pub trait SaveStore: Send + Sync {
    fn get_int(&self, key: &str) -> Option<i64>;
    fn set_int(&mut self, key: &str, value: i64);
    fn delete_all(&mut self);
    /// Flush на диск (no-op для in-memory)
    fn save(&mut self) -> Result<(), SimError>;

    fn get_int_or(&self, key: &str, default: i64) -> i64 {
        self.get_int(key).unwrap_or(default)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemorySaveStore {
    values: BTreeMap<String, i64>,
}

impl SaveStore for MemorySaveStore {
    fn get_int(&self, key: &str) -> Option<i64> {
        self.values.get(key).copied()
    }

    fn set_int(&mut self, key: &str, value: i64) {
        self.values.insert(key.to_string(), value);
    }

    fn delete_all(&mut self) {
        self.values.clear();
    }

    fn save(&mut self) -> Result<(), SimError> {
        Ok(())
    }
}

/// Плоский JSON объект `{ "Level1Completed": 1, ... }`
#[derive(Debug, Clone)]
pub struct JsonFileSaveStore {
    path: PathBuf,
    values: BTreeMap<String, i64>,
}

impl JsonFileSaveStore {
    /// Открыть store. Отсутствующий файл = пустой save.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let path = path.as_ref().to_path_buf();

        let values = if path.exists() {
            let contents = std::fs::read_to_string(&path).map_err(|source| SimError::SaveIo {
                path: path.display().to_string(),
                source,
            })?;
            serde_json::from_str(&contents).map_err(|source| SimError::SaveFormat {
                path: path.display().to_string(),
                source,
            })?
        } else {
            BTreeMap::new()
        };

        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SaveStore for JsonFileSaveStore {
    fn get_int(&self, key: &str) -> Option<i64> {
        self.values.get(key).copied()
    }

    fn set_int(&mut self, key: &str, value: i64) {
        self.values.insert(key.to_string(), value);
    }

    fn delete_all(&mut self) {
        self.values.clear();
    }

    fn save(&mut self) -> Result<(), SimError> {
        let contents = serde_json::to_string_pretty(&self.values).map_err(|source| SimError::SaveFormat {
            path: self.path.display().to_string(),
            source,
        })?;
        std::fs::write(&self.path, contents).map_err(|source| SimError::SaveIo {
            path: self.path.display().to_string(),
            source,
        })
    }
}

/// Все ли уровни пройдены
pub fn campaign_complete(store: &dyn SaveStore, keys: &[&str]) -> bool {
    keys.iter().all(|key| store.get_int_or(key, 0) == 1)
}

/// Resource: активный save store
#[derive(Resource)]
pub struct SaveState {
    pub store: Box<dyn SaveStore>,
}

impl SaveState {
    pub fn new(store: impl SaveStore + 'static) -> Self {
        Self {
            store: Box::new(store),
        }
    }
}

/// Победа над этим entity ставит флаг `key = 1`
#[derive(Component, Debug, Clone, PartialEq, Eq)]
pub struct LevelCompletion {
    pub key: String,
}

/// Событие: чекпоинт записан
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct LevelCompleted {
    pub key: String,
    pub campaign_complete: bool,
}

/// Система: смерть / resolve группы с LevelCompletion → флаг + flush
///
/// Бежит до деспавна, пока LevelCompletion еще на entity.
pub fn record_level_completion(
    mut death_events: EventReader<EntityDied>,
    mut resolved_events: EventReader<EncounterResolved>,
    completions: Query<&LevelCompletion>,
    save: Option<ResMut<SaveState>>,
    mut completed_events: EventWriter<LevelCompleted>,
    mut warned: Local<bool>,
) {
    let defeated: Vec<Entity> = death_events
        .read()
        .map(|e| e.entity)
        .chain(resolved_events.read().map(|e| e.group))
        .collect();

    let keys: Vec<String> = defeated
        .into_iter()
        .filter_map(|entity| completions.get(entity).ok())
        .map(|completion| completion.key.clone())
        .collect();
    if keys.is_empty() {
        return;
    }

    let Some(mut save) = save else {
        if !*warned {
            *warned = true;
            crate::logger::log_warning("LevelCompletion: no SaveState resource, checkpoints disabled");
        }
        return;
    };

    for key in keys {
        save.store.set_int(&key, 1);
        if let Err(err) = save.store.save() {
            crate::logger::log_error(&format!("Checkpoint '{}' not flushed: {}", key, err));
        }

        let campaign_complete = campaign_complete(&*save.store, &LEVEL_KEYS);
        crate::logger::log_info(&format!(
            "💾 Checkpoint '{}' saved (campaign complete: {})",
            key, campaign_complete
        ));
        completed_events.write(LevelCompleted {
            key,
            campaign_complete,
        });
    }
}

//! Encounter configuration
//!
//! Все designer-параметры в одном serde дереве. Default = значения из
//! оригинальных префабов; JSON файл может переопределить любое поле.
//!
//! ```json
//! {
//!   "boss": { "max_hp": 1500, "spawn_step_percent": 4 },
//!   "radio_boss": { "shield_count": 9 }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use bevy::prelude::*;

use crate::error::SimError;
use crate::loot::{LootTable, WeightedTable};

/// Глобальные параметры симуляции
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Частота FixedUpdate (тиков в секунду)
    pub tick_hz: f64,
    /// Сколько труп остается в мире после смерти (секунды)
    pub corpse_linger_secs: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_hz: 60.0,
            corpse_linger_secs: 0.0,
        }
    }
}

/// Вариант подкрепления с вероятностью
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnVariantConfig {
    pub variant: String,
    pub chance: f32,
}

/// Главный босс: подкрепление по накопленному урону
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BossConfig {
    pub max_hp: u32,
    pub contact_damage: u32,
    /// Волна после урона в X% текущего HP
    pub spawn_step_percent: u32,
    pub spawn_cooldown_secs: f32,
    pub spawn_variants: Vec<SpawnVariantConfig>,
    /// Смещения точек спавна относительно босса
    pub spawn_points: Vec<[f32; 2]>,
    /// UI панель, которую скрыть после победы
    pub panel: Option<String>,
    pub level_key: Option<String>,
}

impl Default for BossConfig {
    fn default() -> Self {
        Self {
            max_hp: 1000,
            contact_damage: 10,
            spawn_step_percent: 5,
            spawn_cooldown_secs: 5.0,
            spawn_variants: vec![
                SpawnVariantConfig {
                    variant: "EnemyMele".to_string(),
                    chance: 0.3,
                },
                SpawnVariantConfig {
                    variant: "EnemyShooter".to_string(),
                    chance: 0.6,
                },
            ],
            spawn_points: vec![[-3.0, 2.0], [3.0, 2.0], [0.0, -3.0]],
            panel: Some("PanelJefes".to_string()),
            level_key: Some("Level4Completed".to_string()),
        }
    }
}

impl BossConfig {
    pub fn spawn_table(&self) -> Result<WeightedTable<String>, SimError> {
        WeightedTable::new(
            self.spawn_variants
                .iter()
                .map(|v| (v.chance, v.variant.clone()))
                .collect(),
        )
    }
}

/// Дракон: регенерация + подкрепление на входе в фазу
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragonConfig {
    pub base_hp: u32,
    pub contact_damage: u32,
    pub regen_interval: f32,
    pub regen_duration: f32,
    pub regen_heal_fraction: f32,
    pub spawnable_enemies: Vec<String>,
    pub spawn_points: Vec<[f32; 2]>,
    pub drop: Option<String>,
    pub level_key: Option<String>,
}

impl Default for DragonConfig {
    fn default() -> Self {
        Self {
            base_hp: 200,
            contact_damage: 5,
            regen_interval: 5.0,
            regen_duration: 3.0,
            regen_heal_fraction: 0.5,
            spawnable_enemies: vec!["EnemyMele".to_string(), "EnemyMeleAcid".to_string()],
            spawn_points: vec![[-2.5, 0.0], [2.5, 0.0]],
            drop: Some("DragonKey".to_string()),
            level_key: Some("Level2Completed".to_string()),
        }
    }
}

/// Радио-босс: кольцо щитов + взрыв при смерти
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadioBossConfig {
    pub max_hp: u32,
    pub contact_damage: u32,
    pub contact_damage_cooldown: f32,
    pub shield_count: usize,
    pub damage_allowed_shield_fraction: f32,
    pub shield_disable_duration: f32,
    /// Урон игроку от касания активного щита
    pub shield_contact_damage: u32,
    pub explosion_bullet_count: u32,
    pub explosion_bursts: u32,
    pub explosion_delay: f32,
    pub bullet_damage: u32,
    pub drop: Option<String>,
    pub level_key: Option<String>,
}

impl Default for RadioBossConfig {
    fn default() -> Self {
        Self {
            max_hp: 100,
            contact_damage: 2,
            contact_damage_cooldown: 0.75,
            shield_count: 7,
            damage_allowed_shield_fraction: 0.5,
            shield_disable_duration: 3.5,
            shield_contact_damage: 1,
            explosion_bullet_count: 20,
            explosion_bursts: 2,
            explosion_delay: 1.0,
            bullet_damage: 10,
            drop: Some("RadioCore".to_string()),
            level_key: Some("Level3Completed".to_string()),
        }
    }
}

/// Босс-из-клонов
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloneGroupConfig {
    pub clone_hp: Vec<u32>,
    /// Смещения клонов относительно центра группы
    pub clone_offsets: Vec<[f32; 2]>,
    pub reward: Option<String>,
    pub level_key: Option<String>,
}

impl Default for CloneGroupConfig {
    fn default() -> Self {
        Self {
            clone_hp: vec![50, 50, 100],
            clone_offsets: vec![[-2.0, 0.0], [2.0, 0.0], [0.0, 2.0]],
            reward: Some("MirrorShard".to_string()),
            level_key: Some("Level1Completed".to_string()),
        }
    }
}

/// Вся встреча целиком
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncounterConfig {
    pub simulation: SimulationConfig,
    pub boss: BossConfig,
    pub dragon: DragonConfig,
    pub radio_boss: RadioBossConfig,
    pub clones: CloneGroupConfig,
}

fn invalid(field: &'static str, reason: impl Into<String>) -> SimError {
    SimError::InvalidConfig {
        field,
        reason: reason.into(),
    }
}

fn check_fraction(field: &'static str, value: f32) -> Result<(), SimError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(invalid(field, format!("must be in [0, 1], got {}", value)));
    }
    Ok(())
}

fn check_non_negative(field: &'static str, value: f32) -> Result<(), SimError> {
    if !value.is_finite() || value < 0.0 {
        return Err(invalid(field, format!("must be >= 0, got {}", value)));
    }
    Ok(())
}

impl EncounterConfig {
    /// Load configuration from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, SimError> {
        let contents = std::fs::read_to_string(path).map_err(|source| SimError::ConfigRead {
            path: path.display().to_string(),
            source,
        })?;

        let config: EncounterConfig =
            serde_json::from_str(&contents).map_err(|source| SimError::ConfigParse {
                path: path.display().to_string(),
                source,
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), SimError> {
        if !(self.simulation.tick_hz.is_finite() && self.simulation.tick_hz > 0.0) {
            return Err(invalid("simulation.tick_hz", "must be positive"));
        }
        check_non_negative("simulation.corpse_linger_secs", self.simulation.corpse_linger_secs)?;

        // Boss
        if self.boss.max_hp == 0 {
            return Err(invalid("boss.max_hp", "must be > 0"));
        }
        if !(1..=100).contains(&self.boss.spawn_step_percent) {
            return Err(invalid("boss.spawn_step_percent", "must be in 1..=100"));
        }
        check_non_negative("boss.spawn_cooldown_secs", self.boss.spawn_cooldown_secs)?;
        for variant in &self.boss.spawn_variants {
            check_fraction("boss.spawn_variants.chance", variant.chance)?;
        }
        self.boss.spawn_table()?;

        // Dragon
        if self.dragon.base_hp == 0 {
            return Err(invalid("dragon.base_hp", "must be > 0"));
        }
        if !(self.dragon.regen_interval.is_finite() && self.dragon.regen_interval > 0.0) {
            return Err(invalid("dragon.regen_interval", "must be positive"));
        }
        check_non_negative("dragon.regen_duration", self.dragon.regen_duration)?;
        check_fraction("dragon.regen_heal_fraction", self.dragon.regen_heal_fraction)?;

        // Radio boss
        if self.radio_boss.max_hp == 0 {
            return Err(invalid("radio_boss.max_hp", "must be > 0"));
        }
        check_non_negative(
            "radio_boss.contact_damage_cooldown",
            self.radio_boss.contact_damage_cooldown,
        )?;
        check_fraction(
            "radio_boss.damage_allowed_shield_fraction",
            self.radio_boss.damage_allowed_shield_fraction,
        )?;
        check_non_negative(
            "radio_boss.shield_disable_duration",
            self.radio_boss.shield_disable_duration,
        )?;
        check_non_negative("radio_boss.explosion_delay", self.radio_boss.explosion_delay)?;

        // Clones
        if self.clones.clone_hp.iter().any(|&hp| hp == 0) {
            return Err(invalid("clones.clone_hp", "every clone needs HP > 0"));
        }

        Ok(())
    }
}

/// Лут из одного опционального предмета
pub fn single_drop(item: &Option<String>) -> Option<LootTable> {
    item.as_ref().map(|item| LootTable::single(item.clone()))
}

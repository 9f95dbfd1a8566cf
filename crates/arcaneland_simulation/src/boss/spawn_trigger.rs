//! Spawn trigger: подкрепление по накопленному урону
//!
//! Шаг считается от HP *после* удара: чем слабее босс, тем меньше абсолютный
//! урон до следующей волны. При срабатывании из бюджета вычитается шаг
//! (а не обнуление), overflow переносится на следующую волну.
//! Смертельный удар проверяется один раз (шаг при 0 HP = 1): финальная волна.

use bevy::prelude::*;

use crate::clock::SimClock;
use crate::components::{Health, SpawnPoints};
use crate::loot::WeightedTable;
use crate::DeterministicRng;

const DEFAULT_STEP_PERCENT: u32 = 5;

#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct SpawnBudget {
    accumulated_damage: u32,
    last_spawn_time: Option<f32>,
    /// Процент текущего HP, который надо снять для волны (1..=100)
    pub step_percent: u32,
    /// Минимальная пауза между волнами (секунды)
    pub cooldown_secs: f32,
    warned_missing: bool,
    final_wave_checked: bool,
}

impl Default for SpawnBudget {
    fn default() -> Self {
        Self::new(DEFAULT_STEP_PERCENT, 5.0)
    }
}

impl SpawnBudget {
    pub fn new(step_percent: u32, cooldown_secs: f32) -> Self {
        Self {
            accumulated_damage: 0,
            last_spawn_time: None,
            step_percent: if step_percent == 0 {
                DEFAULT_STEP_PERCENT
            } else {
                step_percent
            },
            cooldown_secs: cooldown_secs.max(0.0),
            warned_missing: false,
            final_wave_checked: false,
        }
    }

    pub fn accumulated_damage(&self) -> u32 {
        self.accumulated_damage
    }

    pub fn last_spawn_time(&self) -> Option<f32> {
        self.last_spawn_time
    }

    pub fn record_damage(&mut self, applied: u32) {
        self.accumulated_damage = self.accumulated_damage.saturating_add(applied);
    }

    /// max(1, round(hp × percent / 100))
    pub fn step_threshold(&self, current_hp: u32) -> u32 {
        let step = (current_hp as f32 * self.step_percent as f32 / 100.0).round() as u32;
        step.max(1)
    }

    pub fn cooldown_ready(&self, now: f32) -> bool {
        match self.last_spawn_time {
            None => true,
            Some(last) => now - last >= self.cooldown_secs,
        }
    }

    /// true ровно один раз: мертвый босс получает последнюю проверку
    pub fn take_final_check(&mut self) -> bool {
        !std::mem::replace(&mut self.final_wave_checked, true)
    }

    /// Попытка волны. true → вызывающий спавнит по одному юниту на точку.
    pub fn try_fire(&mut self, current_hp: u32, now: f32) -> bool {
        let step = self.step_threshold(current_hp);
        if !self.cooldown_ready(now) || self.accumulated_damage < step {
            return false;
        }

        self.accumulated_damage = self.accumulated_damage.saturating_sub(step);
        self.last_spawn_time = Some(now);
        true
    }
}

/// Таблица вариантов подкрепления (prefab id + вес)
#[derive(Component, Debug, Clone, Default)]
pub struct SpawnTable {
    pub table: WeightedTable<String>,
}

/// Событие для spawner сервиса хоста (fire and forget)
#[derive(Event, Debug, Clone, PartialEq)]
pub struct SpawnRequested {
    pub source: Entity,
    pub variant: String,
    pub position: Vec2,
}

/// По одному независимому draw на каждую точку спавна
pub fn roll_spawns(
    source: Entity,
    points: &SpawnPoints,
    table: &WeightedTable<String>,
    rng: &mut DeterministicRng,
) -> Vec<SpawnRequested> {
    points
        .points
        .iter()
        .filter_map(|&position| {
            table.roll(&mut rng.rng).map(|variant| SpawnRequested {
                source,
                variant: variant.clone(),
                position,
            })
        })
        .collect()
}

/// Система: spawn trigger (poll каждый тик, после damage pipeline)
pub fn tick_spawn_triggers(
    mut bosses: Query<(
        Entity,
        &mut SpawnBudget,
        &Health,
        Option<&SpawnPoints>,
        Option<&SpawnTable>,
    )>,
    mut spawn_events: EventWriter<SpawnRequested>,
    mut rng: ResMut<DeterministicRng>,
    clock: Res<SimClock>,
) {
    let now = clock.now();

    for (entity, mut budget, health, points, table) in bosses.iter_mut() {
        if health.is_dead() && !budget.take_final_check() {
            continue;
        }

        // Нет точек или вариантов → фича выключена, бюджет не трогаем
        let (Some(points), Some(table)) = (
            points.filter(|p| !p.is_empty()),
            table.filter(|t| !t.table.is_empty()),
        ) else {
            if !budget.warned_missing {
                budget.warned_missing = true;
                crate::logger::log_warning(&format!(
                    "SpawnBudget on {:?}: no spawn points or spawn table assigned, reinforcements disabled",
                    entity
                ));
            }
            continue;
        };

        if !budget.try_fire(health.current(), now) {
            continue;
        }

        let requests = roll_spawns(entity, points, &table.table, &mut rng);
        crate::logger::log_info(&format!(
            "📣 {:?} calls reinforcements: {} spawned ({} budget left)",
            entity,
            requests.len(),
            budget.accumulated_damage()
        ));
        spawn_events.write_batch(requests);
    }
}

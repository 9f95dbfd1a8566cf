//! Weighted branching: loot drops и выбор варианта подкрепления
//!
//! Одна таблица `(weight, outcome)` + один uniform draw из `[0, 1)`.
//! Tie-break: выигрывает первый bucket, чья кумулятивная сумма весов > draw.
//! Сумма весов ≤ 1.0; остаток вероятности = "ничего".
//!
//! Сундук: `OpenChest` от хоста → один draw из таблицы → `LootDropped`,
//! сундук исчезает.

use bevy::prelude::*;
use rand::Rng;

use crate::combat::{CombatSet, CombatTick};
use crate::components::WorldPosition;
use crate::error::SimError;
use crate::DeterministicRng;

// Допуск на f32 погрешность при сумме весов
const WEIGHT_EPSILON: f32 = 1e-4;

#[derive(Debug, Clone, PartialEq)]
pub struct WeightedTable<T> {
    entries: Vec<(f32, T)>,
    total: f32,
}

impl<T> Default for WeightedTable<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            total: 0.0,
        }
    }
}

impl<T> WeightedTable<T> {
    pub fn new(entries: Vec<(f32, T)>) -> Result<Self, SimError> {
        let mut total = 0.0;
        for (weight, _) in &entries {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(SimError::InvalidWeights { total: *weight });
            }
            total += weight;
        }

        if total > 1.0 + WEIGHT_EPSILON {
            return Err(SimError::InvalidWeights { total });
        }

        Ok(Self { entries, total })
    }

    /// Равновероятный выбор без "пустого" остатка
    pub fn uniform(outcomes: impl IntoIterator<Item = T>) -> Self {
        let outcomes: Vec<T> = outcomes.into_iter().collect();
        if outcomes.is_empty() {
            return Self::default();
        }

        let weight = 1.0 / outcomes.len() as f32;
        let entries: Vec<(f32, T)> = outcomes.into_iter().map(|o| (weight, o)).collect();
        let total = weight * entries.len() as f32;
        Self { entries, total }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn total_weight(&self) -> f32 {
        self.total
    }

    /// Выбор по готовому draw ∈ [0, 1)
    pub fn pick(&self, draw: f32) -> Option<&T> {
        let mut cumulative = 0.0;
        for (weight, outcome) in &self.entries {
            cumulative += weight;
            if draw < cumulative {
                return Some(outcome);
            }
        }

        // Полная таблица (сумма ≈ 1.0): draw мог проскочить из-за округления
        if (self.total - 1.0).abs() <= WEIGHT_EPSILON {
            return self.entries.last().map(|(_, outcome)| outcome);
        }

        None
    }

    pub fn roll<R: Rng>(&self, rng: &mut R) -> Option<&T> {
        let draw: f32 = rng.gen();
        self.pick(draw)
    }
}

/// Таблица лута, которую юнит роняет при поражении
#[derive(Component, Debug, Clone, Default)]
pub struct LootTable {
    pub table: WeightedTable<String>,
    /// Предмет на случай, если draw попал в пустой остаток
    pub fallback: Option<String>,
}

impl LootTable {
    /// Гарантированный дроп одного предмета
    pub fn single(item: impl Into<String>) -> Self {
        Self {
            table: WeightedTable::uniform([item.into()]),
            fallback: None,
        }
    }

    pub fn roll<R: Rng>(&self, rng: &mut R) -> Option<String> {
        self.table
            .roll(rng)
            .cloned()
            .or_else(|| self.fallback.clone())
    }
}

/// Событие: предмет выпал в мир
#[derive(Event, Debug, Clone, PartialEq)]
pub struct LootDropped {
    pub source: Entity,
    pub item: String,
    pub position: Vec2,
}

/// Сундук: четыре предмета по 25%
pub fn chest_table() -> WeightedTable<String> {
    WeightedTable::uniform(
        ["Map", "Coin", "HealthPotion", "Staff"]
            .into_iter()
            .map(String::from),
    )
}

/// Сундук открывается один раз
#[derive(Component, Debug, Clone, Default, PartialEq)]
pub struct Chest {
    opened: bool,
}

impl Chest {
    pub fn is_opened(&self) -> bool {
        self.opened
    }

    /// true только при первом открытии
    pub fn open(&mut self) -> bool {
        !std::mem::replace(&mut self.opened, true)
    }
}

/// Событие от хоста: игрок открыл сундук
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenChest {
    pub chest: Entity,
}

pub fn spawn_chest(commands: &mut Commands, position: Vec2) -> Entity {
    commands
        .spawn((
            Name::new("Chest"),
            Chest::default(),
            LootTable {
                table: chest_table(),
                fallback: None,
            },
            WorldPosition(position),
        ))
        .id()
}

/// Система: OpenChest → LootDropped + despawn сундука
pub fn open_chests(
    mut commands: Commands,
    mut open_events: EventReader<OpenChest>,
    mut chests: Query<(&mut Chest, &LootTable, Option<&WorldPosition>)>,
    mut loot_events: EventWriter<LootDropped>,
    mut rng: ResMut<DeterministicRng>,
) {
    for event in open_events.read() {
        let Ok((mut chest, loot, position)) = chests.get_mut(event.chest) else {
            continue;
        };
        if !chest.open() {
            continue;
        }

        let position = position.map(|p| p.0).unwrap_or_default();
        match loot.roll(&mut rng.rng) {
            Some(item) => {
                crate::logger::log(&format!("🎁 Chest {:?} opened: {}", event.chest, item));
                loot_events.write(LootDropped {
                    source: event.chest,
                    item,
                    position,
                });
            }
            None => crate::logger::log_warning(&format!("Chest {:?} is empty", event.chest)),
        }

        commands.entity(event.chest).despawn();
    }
}

pub struct LootPlugin;

impl Plugin for LootPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<LootDropped>()
            .add_event::<OpenChest>()
            .add_systems(CombatTick, open_chests.in_set(CombatSet::Death));
    }
}

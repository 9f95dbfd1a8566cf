//! Combat module: damage pipeline, contact damage, смерть
//!
//! ECS ответственность:
//! - Game state: Health, ContactDamage, DeathSequence
//! - Combat rules: порядок pipeline, cooldown касаний, death burst
//! - Events: DamageDealt, DamageBlocked, EntityDied, LootDropped, ProjectileBurst
//!
//! Хост (движок) ответственность:
//! - коллизии → DamageEvent / ContactEvent
//! - рендер пуль из ProjectileBurst, спавн лута из LootDropped

use bevy::ecs::schedule::ScheduleLabel;
use bevy::prelude::*;

pub mod contact;
pub mod damage;
pub mod death;

#[cfg(test)]
mod damage_tests;

// Re-export основных типов
pub use contact::{ContactDamage, ContactEvent};
pub use damage::{
    resolve_damage, DamageBlock, DamageBlocked, DamageDealt, DamageEvent, DamageResolution,
    EntityDied, HealthChanged,
};
pub use death::{
    radial_directions, DeathBurst, DeathSequence, Dead, DespawnAfter, ProjectileBurst,
    SequenceStep,
};

/// Schedule одного тика боевой симуляции
///
/// Запускается из FixedUpdate (`run_combat_tick`) или вручную (`advance_tick`).
#[derive(ScheduleLabel, Debug, Clone, PartialEq, Eq, Hash)]
pub struct CombatTick;

/// Фазы тика (выполняются строго по порядку)
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum CombatSet {
    /// Регистрация клонов в группах
    Registration,
    /// Касания → DamageEvent
    Contact,
    /// Таймеры щитов + удары по щитам
    Shields,
    /// Damage pipeline
    Damage,
    /// Spawn trigger по накопленному урону
    Triggers,
    /// Регенерация (polling + интерполяция)
    Regeneration,
    /// Смерть, лут, чекпоинты
    Death,
    /// Клон-агрегатор (строго после всего урона тика)
    Aggregation,
    /// Деспавн
    Cleanup,
}

/// Combat Plugin
///
/// Порядок выполнения внутри тика:
/// 1. apply_contact_damage: касания с cooldown → DamageEvent
/// 2. apply_damage: pipeline (shield gate → intangible → ledger)
/// 3. tick_death_sequences / begin_death: залпы, лут
/// 4. despawn_after_timeout: уборка трупов
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        // Регистрация событий
        app.add_event::<DamageEvent>()
            .add_event::<ContactEvent>()
            .add_event::<DamageDealt>()
            .add_event::<DamageBlocked>()
            .add_event::<HealthChanged>()
            .add_event::<EntityDied>()
            .add_event::<ProjectileBurst>();

        app.add_systems(
            CombatTick,
            (
                contact::apply_contact_damage.in_set(CombatSet::Contact),
                damage::apply_damage.in_set(CombatSet::Damage),
                // Sequence тикается до begin_death: свежая смерть не теряет dt
                (death::tick_death_sequences, death::begin_death)
                    .chain()
                    .in_set(CombatSet::Death),
                death::despawn_after_timeout.in_set(CombatSet::Cleanup),
            ),
        );
    }
}

//! Boss mechanics
//!
//! Четыре независимых контроллера поверх Health, комбинируются компонентами:
//! - shield: кольцо щитов (gate перед damage pipeline)
//! - spawn_trigger: подкрепление по накопленному урону
//! - regeneration: периодическая неосязаемая регенерация
//! - clones: один босс из нескольких клонов
//!
//! encounter собирает архетипы из конфига.

use bevy::prelude::*;

pub mod clones;
pub mod encounter;
pub mod regeneration;
pub mod shield;
pub mod spawn_trigger;


pub use clones::{
    CloneGroup, CloneGroupReport, CloneGroupUpdated, CloneMember, EncounterResolved, RegisterClone,
};
pub use encounter::{
    spawn_boss, spawn_clone_group, spawn_dragon, spawn_radio_boss, BossDefeated, BossEncounter,
};
pub use regeneration::{
    RegenState, RegenStep, RegenerationConfig, RegenerationEnded, RegenerationPhase,
    RegenerationStarted,
};
pub use shield::{ShieldContact, ShieldHit, ShieldRestored, ShieldSet, ShieldSlot, ShieldStruck};
pub use spawn_trigger::{roll_spawns, SpawnBudget, SpawnRequested, SpawnTable};

use crate::combat::{CombatSet, CombatTick};

/// Boss Plugin
///
/// Порядок внутри CombatTick (через CombatSet):
/// 1. register_clones (Registration), apply_shield_contact (Contact)
/// 2. tick_shields → strike_shields (Shields, до damage: gate видит свежие щиты)
/// 3. tick_spawn_triggers (Triggers, после damage)
/// 4. tick_regeneration (Regeneration)
/// 5. notify_boss_defeated (Death)
/// 6. tick_clone_groups (Aggregation)
pub struct BossPlugin;

impl Plugin for BossPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<ShieldHit>()
            .add_event::<ShieldContact>()
            .add_event::<ShieldStruck>()
            .add_event::<ShieldRestored>()
            .add_event::<SpawnRequested>()
            .add_event::<RegenerationStarted>()
            .add_event::<RegenerationEnded>()
            .add_event::<RegisterClone>()
            .add_event::<CloneGroupUpdated>()
            .add_event::<EncounterResolved>()
            .add_event::<BossDefeated>();

        app.add_systems(
            CombatTick,
            (
                clones::register_clones.in_set(CombatSet::Registration),
                shield::apply_shield_contact.in_set(CombatSet::Contact),
                (shield::tick_shields, shield::strike_shields)
                    .chain()
                    .in_set(CombatSet::Shields),
                spawn_trigger::tick_spawn_triggers.in_set(CombatSet::Triggers),
                regeneration::tick_regeneration.in_set(CombatSet::Regeneration),
                encounter::notify_boss_defeated.in_set(CombatSet::Death),
                clones::tick_clone_groups.in_set(CombatSet::Aggregation),
            ),
        );
    }
}

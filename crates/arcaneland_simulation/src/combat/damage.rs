//! Damage pipeline
//!
//! Порядок проверок (строго):
//! 1. мертв / нулевой урон → no-op
//! 2. Shield gate закрыт → 0 урона, без side effects
//! 3. Intangible (фаза регенерации) → 0 урона
//! 4. Health ledger снимает HP
//! 5. Applied урон копится в RegenerationPhase и SpawnBudget
//! 6. Смерть → EntityDied ровно один раз

use bevy::prelude::*;

use crate::boss::{RegenerationPhase, ShieldSet, SpawnBudget};
use crate::components::{Health, WorldPosition};

/// Входное событие: намерение нанести урон
///
/// Хост (коллизии движка) или contact damage пишут его; pipeline потребляет
/// синхронно в том же тике, в порядке поступления.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct DamageEvent {
    pub source: Option<Entity>,
    pub target: Entity,
    pub amount: u32,
    pub timestamp: f32,
}

impl DamageEvent {
    pub fn new(source: Option<Entity>, target: Entity, amount: u32, timestamp: f32) -> Self {
        Self {
            source,
            target,
            amount,
            timestamp,
        }
    }
}

/// Событие: урон нанесен (applied > 0)
///
/// Используется для UI, звуков, эффектов.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct DamageDealt {
    pub attacker: Option<Entity>,
    pub target: Entity,
    pub damage: u32,
    pub remaining_hp: u32,
    pub target_died: bool,
}

/// Событие: урон отклонен щитом или неосязаемостью
#[derive(Event, Debug, Clone, PartialEq)]
pub struct DamageBlocked {
    pub target: Entity,
    pub reason: DamageBlock,
}

/// Событие: HP изменилось (health bar)
#[derive(Event, Debug, Clone, PartialEq)]
pub struct HealthChanged {
    pub entity: Entity,
    pub current: u32,
    pub max: u32,
}

/// Событие: entity умер (HP достигло 0)
///
/// Гарантия: не более одного раза на entity.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct EntityDied {
    pub entity: Entity,
    pub killer: Option<Entity>,
    pub position: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageBlock {
    AlreadyDead,
    ZeroAmount,
    Shielded,
    Intangible,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DamageResolution {
    pub applied: u32,
    pub entity_died: bool,
    pub blocked: Option<DamageBlock>,
}

impl DamageResolution {
    fn blocked(reason: DamageBlock) -> Self {
        Self {
            applied: 0,
            entity_died: false,
            blocked: Some(reason),
        }
    }
}

/// Шаги 1–4 pipeline (чистая функция, без ECS)
pub fn resolve_damage(
    health: &mut Health,
    shields: Option<&ShieldSet>,
    intangible: bool,
    raw_damage: u32,
) -> DamageResolution {
    if health.is_dead() {
        return DamageResolution::blocked(DamageBlock::AlreadyDead);
    }
    if raw_damage == 0 {
        return DamageResolution::blocked(DamageBlock::ZeroAmount);
    }
    if shields.is_some_and(|s| !s.can_take_damage()) {
        return DamageResolution::blocked(DamageBlock::Shielded);
    }
    if intangible {
        return DamageResolution::blocked(DamageBlock::Intangible);
    }

    let outcome = health.apply_damage(raw_damage);
    DamageResolution {
        applied: outcome.applied,
        entity_died: outcome.died,
        blocked: None,
    }
}

/// Система: apply damage от DamageEvent
///
/// Events одного тика обрабатываются строго в порядке поступления.
pub fn apply_damage(
    mut damage_events: EventReader<DamageEvent>,
    mut damage_dealt_events: EventWriter<DamageDealt>,
    mut damage_blocked_events: EventWriter<DamageBlocked>,
    mut health_events: EventWriter<HealthChanged>,
    mut entity_died_events: EventWriter<EntityDied>,
    mut targets: Query<(
        &mut Health,
        Option<&ShieldSet>,
        Option<&mut RegenerationPhase>,
        Option<&mut SpawnBudget>,
        Option<&WorldPosition>,
    )>,
) {
    for event in damage_events.read() {
        let Ok((mut health, shields, regen, budget, position)) = targets.get_mut(event.target) else {
            crate::logger::log(&format!(
                "DamageEvent: target {:?} has no Health (despawned?)",
                event.target
            ));
            continue;
        };

        let intangible = regen.as_deref().is_some_and(|r| r.is_intangible());
        let resolution = resolve_damage(&mut health, shields, intangible, event.amount);

        match resolution.blocked {
            Some(reason @ (DamageBlock::Shielded | DamageBlock::Intangible)) => {
                damage_blocked_events.write(DamageBlocked {
                    target: event.target,
                    reason,
                });
                continue;
            }
            Some(_) => continue,
            None => {}
        }

        // Шаг 5: applied урон (не raw) копится для регенерации и спавна
        if let Some(mut regen) = regen {
            regen.record_damage(resolution.applied);
        }
        if let Some(mut budget) = budget {
            budget.record_damage(resolution.applied);
        }

        damage_dealt_events.write(DamageDealt {
            attacker: event.source,
            target: event.target,
            damage: resolution.applied,
            remaining_hp: health.current(),
            target_died: resolution.entity_died,
        });
        health_events.write(HealthChanged {
            entity: event.target,
            current: health.current(),
            max: health.max(),
        });

        // Шаг 6: терминальный сигнал, ровно один раз (Health гарантирует)
        if resolution.entity_died {
            entity_died_events.write(EntityDied {
                entity: event.target,
                killer: event.source,
                position: position.map(|p| p.0).unwrap_or_default(),
            });

            crate::logger::log_info(&format!(
                "💀 Entity {:?} killed by {:?}",
                event.target, event.source
            ));
        }
    }
}

//! Shield gate: кольцо щитов вокруг радио-босса
//!
//! Босс получает урон только когда активных щитов ≤ floor(total × fraction).
//! Удар заклинанием по активному щиту гасит его на `disable_duration`,
//! у каждого щита свой независимый таймер (циклы могут перекрываться).
//! Активный щит сам бьет игрока при касании (`ShieldContact`).

use bevy::prelude::*;

use crate::clock::SimClock;
use crate::combat::{ContactDamage, DamageEvent};
use crate::components::Health;

/// Один щит из кольца
#[derive(Debug, Clone, Copy, Default, PartialEq, Reflect)]
pub struct ShieldSlot {
    /// Сколько секунд еще выключен (0 = активен)
    disabled_for: f32,
}

impl ShieldSlot {
    pub fn is_active(&self) -> bool {
        self.disabled_for <= 0.0
    }

    pub fn disabled_for(&self) -> f32 {
        self.disabled_for.max(0.0)
    }
}

#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct ShieldSet {
    shields: Vec<ShieldSlot>,
    /// Доля щитов, которая может оставаться активной при уязвимом боссе
    pub allowed_active_fraction: f32,
    /// Время выключения щита после удара (секунды)
    pub disable_duration: f32,
    /// Урон игроку при касании активного щита (None = щиты безвредны)
    pub contact: Option<ContactDamage>,
}

impl Default for ShieldSet {
    fn default() -> Self {
        Self::new(7, 0.5, 3.5)
    }
}

impl ShieldSet {
    pub fn new(count: usize, allowed_active_fraction: f32, disable_duration: f32) -> Self {
        Self {
            shields: vec![ShieldSlot::default(); count],
            allowed_active_fraction: allowed_active_fraction.clamp(0.0, 1.0),
            disable_duration: disable_duration.max(0.0),
            contact: None,
        }
    }

    pub fn with_contact_damage(mut self, contact: ContactDamage) -> Self {
        self.contact = Some(contact);
        self
    }

    pub fn is_active(&self, index: usize) -> bool {
        self.shields.get(index).is_some_and(|slot| slot.is_active())
    }

    pub fn total(&self) -> usize {
        self.shields.len()
    }

    pub fn shields(&self) -> &[ShieldSlot] {
        &self.shields
    }

    pub fn active_count(&self) -> usize {
        self.shields.iter().filter(|s| s.is_active()).count()
    }

    /// Максимум активных щитов, при котором босс уязвим
    pub fn threshold(&self) -> usize {
        (self.total() as f32 * self.allowed_active_fraction).floor() as usize
    }

    pub fn can_take_damage(&self) -> bool {
        if self.shields.is_empty() {
            return true;
        }
        self.active_count() <= self.threshold()
    }

    /// Удар по щиту. false если индекс невалиден или щит уже выключен
    /// (выключенный щит не коллайдится, удар проходит мимо).
    pub fn strike(&mut self, index: usize) -> bool {
        let duration = self.disable_duration;
        match self.shields.get_mut(index) {
            Some(slot) if slot.is_active() => {
                slot.disabled_for = duration;
                true
            }
            _ => false,
        }
    }

    /// Продвинуть таймеры, вернуть индексы щитов, включившихся в этом тике
    pub fn tick(&mut self, delta: f32) -> Vec<usize> {
        let mut restored = Vec::new();
        for (index, slot) in self.shields.iter_mut().enumerate() {
            if slot.is_active() {
                continue;
            }
            slot.disabled_for -= delta;
            if slot.is_active() {
                slot.disabled_for = 0.0;
                restored.push(index);
            }
        }
        restored
    }
}

/// Событие от хоста: заклинание попало в щит `index` босса `owner`
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShieldHit {
    pub owner: Entity,
    pub index: usize,
}

/// Событие от хоста: щит `index` босса `owner` задел `target`
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShieldContact {
    pub owner: Entity,
    pub index: usize,
    pub target: Entity,
}

/// Событие: щит погас
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct ShieldStruck {
    pub owner: Entity,
    pub index: usize,
    pub active_remaining: usize,
    pub owner_vulnerable: bool,
}

/// Событие: щит снова активен
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct ShieldRestored {
    pub owner: Entity,
    pub index: usize,
}

/// Система: таймеры реактивации щитов
pub fn tick_shields(
    mut owners: Query<(Entity, &mut ShieldSet)>,
    mut restored_events: EventWriter<ShieldRestored>,
    clock: Res<SimClock>,
) {
    let delta = clock.delta();

    for (owner, mut shields) in owners.iter_mut() {
        for index in shields.tick(delta) {
            restored_events.write(ShieldRestored { owner, index });
        }
    }
}

/// Система: касание щита → DamageEvent от имени владельца
///
/// Погасший щит не коллайдится, мертвый владелец щитами не бьет.
pub fn apply_shield_contact(
    mut contact_events: EventReader<ShieldContact>,
    mut damage_events: EventWriter<DamageEvent>,
    mut owners: Query<(&mut ShieldSet, Option<&Health>)>,
    clock: Res<SimClock>,
) {
    let now = clock.now();

    for contact in contact_events.read() {
        let Ok((mut shields, health)) = owners.get_mut(contact.owner) else {
            continue;
        };
        if health.is_some_and(|h| h.is_dead()) || !shields.is_active(contact.index) {
            continue;
        }

        let Some(amount) = shields.contact.as_mut().and_then(|c| c.try_hit(now)) else {
            continue;
        };
        damage_events.write(DamageEvent::new(
            Some(contact.owner),
            contact.target,
            amount,
            now,
        ));
    }
}

/// Система: удары по щитам (ShieldHit → выключение)
pub fn strike_shields(
    mut hit_events: EventReader<ShieldHit>,
    mut struck_events: EventWriter<ShieldStruck>,
    mut owners: Query<&mut ShieldSet>,
) {
    for hit in hit_events.read() {
        let Ok(mut shields) = owners.get_mut(hit.owner) else {
            continue;
        };

        if !shields.strike(hit.index) {
            continue;
        }

        let active_remaining = shields.active_count();
        let owner_vulnerable = shields.can_take_damage();
        crate::logger::log(&format!(
            "🛡️ Shield {} of {:?} down ({} active, vulnerable: {})",
            hit.index, hit.owner, active_remaining, owner_vulnerable
        ));

        struck_events.write(ShieldStruck {
            owner: hit.owner,
            index: hit.index,
            active_remaining,
            owner_vulnerable,
        });
    }
}

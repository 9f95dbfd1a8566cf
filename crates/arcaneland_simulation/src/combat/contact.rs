//! Contact damage: урон при касании враждебного юнита
//!
//! Движок сообщает о касании (`ContactEvent`), здесь решается только
//! "можно ли ударить сейчас" по cooldown. Сам урон идет обычным DamageEvent.

use bevy::prelude::*;

use crate::clock::SimClock;
use crate::combat::DamageEvent;
use crate::components::Health;

#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct ContactDamage {
    pub amount: u32,
    /// Минимальный интервал между ударами (0 = каждое касание)
    pub cooldown: f32,
    next_allowed: f32,
}

impl ContactDamage {
    pub fn new(amount: u32, cooldown: f32) -> Self {
        Self {
            amount,
            cooldown: cooldown.max(0.0),
            next_allowed: 0.0,
        }
    }

    /// Урон, если cooldown истек (и сразу запускает новый)
    pub fn try_hit(&mut self, now: f32) -> Option<u32> {
        if now < self.next_allowed || self.amount == 0 {
            return None;
        }
        self.next_allowed = now + self.cooldown;
        Some(self.amount)
    }
}

/// Событие от хоста: attacker коснулся target
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct ContactEvent {
    pub attacker: Entity,
    pub target: Entity,
}

/// Система: ContactEvent → DamageEvent (с учетом cooldown и смерти атакующего)
pub fn apply_contact_damage(
    mut contact_events: EventReader<ContactEvent>,
    mut damage_events: EventWriter<DamageEvent>,
    mut attackers: Query<(&mut ContactDamage, Option<&Health>)>,
    clock: Res<SimClock>,
) {
    let now = clock.now();

    for contact in contact_events.read() {
        let Ok((mut contact_damage, health)) = attackers.get_mut(contact.attacker) else {
            continue;
        };

        // Мертвые не кусаются
        if health.is_some_and(|h| h.is_dead()) {
            continue;
        }

        if let Some(amount) = contact_damage.try_hit(now) {
            damage_events.write(DamageEvent::new(
                Some(contact.attacker),
                contact.target,
                amount,
                now,
            ));
        }
    }
}

//! Death handling: Dead маркер, death burst, лут, деспавн
//!
//! EntityDied приходит ровно один раз на entity, поэтому и лут, и деспавн
//! происходят ровно один раз. Юнит с DeathBurst сначала отстреливает
//! радиальные залпы и только потом роняет лут.

use bevy::prelude::*;

use crate::clock::SimClock;
use crate::combat::EntityDied;
use crate::components::WorldPosition;
use crate::config::SimulationConfig;
use crate::loot::{LootDropped, LootTable};
use crate::DeterministicRng;

/// Компонент-маркер: entity мертв (HP == 0)
///
/// Используется для визуальных эффектов (death animation, fade-out).
#[derive(Component, Debug)]
pub struct Dead;

/// Компонент-маркер: деспавн entity после указанного времени
#[derive(Component, Debug)]
pub struct DespawnAfter {
    /// Время деспавна (SimClock секунды)
    pub despawn_time: f32,
}

/// Радиальный взрыв снарядами при смерти (радио-босс)
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct DeathBurst {
    pub projectile_count: u32,
    pub bursts: u32,
    /// Пауза между залпами (секунды)
    pub interval: f32,
    pub damage: u32,
}

impl Default for DeathBurst {
    fn default() -> Self {
        Self {
            projectile_count: 20,
            bursts: 2,
            interval: 1.0,
            damage: 10,
        }
    }
}

/// Событие: залп снарядов (хост спавнит пули)
#[derive(Event, Debug, Clone, PartialEq)]
pub struct ProjectileBurst {
    pub source: Entity,
    pub origin: Vec2,
    pub directions: Vec<Vec2>,
    pub damage: u32,
}

/// Идущая последовательность залпов после смерти
#[derive(Component, Debug, Clone, PartialEq)]
pub struct DeathSequence {
    bursts_remaining: u32,
    timer: f32,
    interval: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SequenceStep {
    pub burst: bool,
    pub finished: bool,
}

impl DeathSequence {
    /// Первый залп стреляется в момент смерти, здесь только оставшиеся
    pub fn start(burst: &DeathBurst) -> Self {
        Self {
            bursts_remaining: burst.bursts.saturating_sub(1),
            timer: burst.interval.max(0.0),
            interval: burst.interval.max(0.0),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.bursts_remaining == 0
    }

    pub fn advance(&mut self, delta: f32) -> SequenceStep {
        if self.is_finished() {
            return SequenceStep {
                burst: false,
                finished: true,
            };
        }

        self.timer -= delta;
        if self.timer > 0.0 {
            return SequenceStep::default();
        }

        self.bursts_remaining -= 1;
        self.timer += self.interval;
        SequenceStep {
            burst: true,
            finished: self.is_finished(),
        }
    }
}

/// Направления радиального залпа: count лучей через равные углы, с 0°
pub fn radial_directions(count: u32) -> Vec<Vec2> {
    if count == 0 {
        return Vec::new();
    }
    let step = std::f32::consts::TAU / count as f32;
    (0..count).map(|i| Vec2::from_angle(step * i as f32)).collect()
}

fn burst_event(source: Entity, origin: Vec2, burst: &DeathBurst) -> ProjectileBurst {
    ProjectileBurst {
        source,
        origin,
        directions: radial_directions(burst.projectile_count),
        damage: burst.damage,
    }
}

/// Лут + отложенный деспавн. Вызывается ровно один раз на смерть.
fn finalize_defeat(
    commands: &mut Commands,
    entity: Entity,
    position: Vec2,
    loot: Option<&LootTable>,
    rng: &mut DeterministicRng,
    loot_events: &mut EventWriter<LootDropped>,
    despawn_time: f32,
) {
    match loot.and_then(|table| table.roll(&mut rng.rng)) {
        Some(item) => {
            crate::logger::log_info(&format!("🎁 {:?} dropped '{}' at {:?}", entity, item, position));
            loot_events.write(LootDropped {
                source: entity,
                item,
                position,
            });
        }
        None => {
            if loot.is_some() {
                crate::logger::log(&format!("{:?}: loot roll landed on empty mass", entity));
            }
        }
    }

    if let Ok(mut entity_commands) = commands.get_entity(entity) {
        entity_commands.insert(DespawnAfter { despawn_time });
    }
}

/// Система: начало смерти (EntityDied → Dead + первый залп или сразу лут)
pub fn begin_death(
    mut commands: Commands,
    mut death_events: EventReader<EntityDied>,
    units: Query<(Option<&DeathBurst>, Option<&LootTable>)>,
    mut rng: ResMut<DeterministicRng>,
    mut loot_events: EventWriter<LootDropped>,
    mut burst_events: EventWriter<ProjectileBurst>,
    clock: Res<SimClock>,
    config: Res<SimulationConfig>,
) {
    let despawn_time = clock.now() + config.corpse_linger_secs;

    for event in death_events.read() {
        let Ok((burst, loot)) = units.get(event.entity) else {
            continue;
        };

        if let Ok(mut entity_commands) = commands.get_entity(event.entity) {
            entity_commands.insert(Dead);
        }

        let burst = burst.filter(|b| b.bursts > 0);
        if let Some(burst) = burst {
            burst_events.write(burst_event(event.entity, event.position, burst));

            let sequence = DeathSequence::start(burst);
            if !sequence.is_finished() {
                commands.entity(event.entity).insert(sequence);
                continue;
            }
        }

        finalize_defeat(
            &mut commands,
            event.entity,
            event.position,
            loot,
            &mut rng,
            &mut loot_events,
            despawn_time,
        );
    }
}

/// Система: тик death sequences (оставшиеся залпы, потом лут и деспавн)
pub fn tick_death_sequences(
    mut commands: Commands,
    mut sequences: Query<(
        Entity,
        &mut DeathSequence,
        &DeathBurst,
        Option<&LootTable>,
        Option<&WorldPosition>,
    )>,
    mut rng: ResMut<DeterministicRng>,
    mut loot_events: EventWriter<LootDropped>,
    mut burst_events: EventWriter<ProjectileBurst>,
    clock: Res<SimClock>,
    config: Res<SimulationConfig>,
) {
    let despawn_time = clock.now() + config.corpse_linger_secs;

    for (entity, mut sequence, burst, loot, position) in sequences.iter_mut() {
        let origin = position.map(|p| p.0).unwrap_or_default();
        let step = sequence.advance(clock.delta());

        if step.burst {
            burst_events.write(burst_event(entity, origin, burst));
        }

        if step.finished {
            commands.entity(entity).remove::<DeathSequence>();
            finalize_defeat(
                &mut commands,
                entity,
                origin,
                loot,
                &mut rng,
                &mut loot_events,
                despawn_time,
            );
        }
    }
}

/// Система: деспавн entities с истёкшим DespawnAfter
pub fn despawn_after_timeout(
    mut commands: Commands,
    query: Query<(Entity, &DespawnAfter)>,
    clock: Res<SimClock>,
) {
    let now = clock.now();

    for (entity, despawn_after) in query.iter() {
        if now >= despawn_after.despawn_time {
            crate::logger::log(&format!("⚰️ Despawning entity {:?}", entity));
            commands.entity(entity).despawn();
        }
    }
}

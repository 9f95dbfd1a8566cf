//! Regeneration controller (дракон)
//!
//! FSM: Idle → (poll AND накоплен урон AND HP < max) → Regenerating → Idle
//!
//! - Poll раз в `regen_interval`, а не на каждый удар: повторный вход посреди
//!   фазы невозможен.
//! - Во время фазы юнит неосязаем, HP линейно растет от start до target за
//!   `regen_duration`.
//! - Лечится только доля урона, полученного с прошлой фазы.

use bevy::prelude::*;

use crate::boss::spawn_trigger::{roll_spawns, SpawnRequested, SpawnTable};
use crate::clock::SimClock;
use crate::combat::HealthChanged;
use crate::components::{Health, SpawnPoints};
use crate::DeterministicRng;

/// Параметры регенерации
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct RegenerationConfig {
    /// Период опроса (секунды)
    pub regen_interval: f32,
    /// Длительность фазы (секунды)
    pub regen_duration: f32,
    /// Доля накопленного урона, которая восстанавливается (0..1)
    pub heal_fraction: f32,
    /// Звать подкрепление на входе в фазу
    pub spawn_on_entry: bool,
}

impl Default for RegenerationConfig {
    fn default() -> Self {
        Self {
            regen_interval: 5.0,
            regen_duration: 3.0,
            heal_fraction: 0.5,
            spawn_on_entry: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub enum RegenState {
    Idle,
    Regenerating {
        elapsed: f32,
        start_hp: u32,
        target_hp: u32,
    },
}

/// Результат одного тика контроллера
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegenStep {
    Nothing,
    /// Poll увидел полное HP: накопленный урон сброшен
    ResetAtFullHealth,
    /// Вход и мгновенный выход: лечить нечего
    Skipped,
    Entered { start_hp: u32, target_hp: u32 },
    Healed { hp: u32 },
    Finished { hp: u32 },
    /// Юнит умер посреди фазы
    Aborted,
}

#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct RegenerationPhase {
    accumulated_damage: u32,
    state: RegenState,
    poll_elapsed: f32,
    last_trigger_time: Option<f32>,
}

impl Default for RegenerationPhase {
    fn default() -> Self {
        Self {
            accumulated_damage: 0,
            state: RegenState::Idle,
            poll_elapsed: 0.0,
            last_trigger_time: None,
        }
    }
}

impl RegenerationPhase {
    pub fn accumulated_damage(&self) -> u32 {
        self.accumulated_damage
    }

    pub fn state(&self) -> RegenState {
        self.state
    }

    pub fn last_trigger_time(&self) -> Option<f32> {
        self.last_trigger_time
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, RegenState::Regenerating { .. })
    }

    /// Инвариант: активная фаза ⇒ неосязаемость
    pub fn is_intangible(&self) -> bool {
        self.is_active()
    }

    pub fn elapsed(&self) -> f32 {
        match self.state {
            RegenState::Regenerating { elapsed, .. } => elapsed,
            RegenState::Idle => 0.0,
        }
    }

    pub fn record_damage(&mut self, applied: u32) {
        self.accumulated_damage = self.accumulated_damage.saturating_add(applied);
    }

    fn exit(&mut self) {
        self.state = RegenState::Idle;
        self.accumulated_damage = 0;
    }

    /// Вход в фазу (вызывается на poll)
    pub fn try_enter(&mut self, health: &Health, config: &RegenerationConfig, now: f32) -> RegenStep {
        if self.is_active() || health.is_dead() || self.accumulated_damage == 0 {
            return RegenStep::Nothing;
        }
        if health.is_full() {
            self.accumulated_damage = 0;
            return RegenStep::ResetAtFullHealth;
        }

        self.last_trigger_time = Some(now);

        let heal_amount = (self.accumulated_damage as f32 * config.heal_fraction.clamp(0.0, 1.0))
            .round() as u32;
        let start_hp = health.current();
        let target_hp = start_hp.saturating_add(heal_amount).min(health.max());

        if target_hp <= start_hp {
            self.exit();
            return RegenStep::Skipped;
        }

        self.state = RegenState::Regenerating {
            elapsed: 0.0,
            start_hp,
            target_hp,
        };
        RegenStep::Entered { start_hp, target_hp }
    }

    /// Интерполяция HP внутри активной фазы
    pub fn advance(&mut self, health: &mut Health, delta: f32, duration: f32) -> RegenStep {
        let RegenState::Regenerating {
            elapsed,
            start_hp,
            target_hp,
        } = self.state
        else {
            return RegenStep::Nothing;
        };

        if health.is_dead() {
            self.exit();
            return RegenStep::Aborted;
        }

        let elapsed = elapsed + delta;
        let t = if duration > 0.0 {
            (elapsed / duration).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let hp = (start_hp as f32 + (target_hp as f32 - start_hp as f32) * t).round() as u32;
        if hp > health.current() {
            health.heal(hp - health.current());
        }

        if t >= 1.0 {
            self.exit();
            return RegenStep::Finished {
                hp: health.current(),
            };
        }

        self.state = RegenState::Regenerating {
            elapsed,
            start_hp,
            target_hp,
        };
        RegenStep::Healed {
            hp: health.current(),
        }
    }

    /// Полный тик: активная фаза интерполируется, иначе poll по интервалу
    pub fn tick(
        &mut self,
        health: &mut Health,
        config: &RegenerationConfig,
        delta: f32,
        now: f32,
    ) -> RegenStep {
        // Poll-таймер идет всегда; poll во время фазы просто пропускается
        self.poll_elapsed += delta;
        let poll_due = config.regen_interval <= 0.0 || self.poll_elapsed >= config.regen_interval;
        if poll_due {
            self.poll_elapsed = if config.regen_interval > 0.0 {
                self.poll_elapsed - config.regen_interval
            } else {
                0.0
            };
        }

        if self.is_active() {
            return self.advance(health, delta, config.regen_duration);
        }
        if poll_due {
            return self.try_enter(health, config, now);
        }
        RegenStep::Nothing
    }
}

/// Событие: фаза регенерации началась
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct RegenerationStarted {
    pub entity: Entity,
    pub start_hp: u32,
    pub target_hp: u32,
}

/// Событие: фаза закончилась (aborted = юнит умер посреди фазы)
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct RegenerationEnded {
    pub entity: Entity,
    pub hp: u32,
    pub aborted: bool,
}

/// Система: регенерация + подкрепление на входе в фазу
pub fn tick_regeneration(
    mut units: Query<(
        Entity,
        &mut RegenerationPhase,
        &RegenerationConfig,
        &mut Health,
        Option<&SpawnPoints>,
        Option<&SpawnTable>,
    )>,
    mut started_events: EventWriter<RegenerationStarted>,
    mut ended_events: EventWriter<RegenerationEnded>,
    mut health_events: EventWriter<HealthChanged>,
    mut spawn_events: EventWriter<SpawnRequested>,
    mut rng: ResMut<DeterministicRng>,
    clock: Res<SimClock>,
) {
    for (entity, mut phase, config, mut health, points, table) in units.iter_mut() {
        let step = phase.tick(&mut health, config, clock.delta(), clock.now());

        match step {
            RegenStep::Nothing | RegenStep::ResetAtFullHealth | RegenStep::Skipped => {}
            RegenStep::Entered { start_hp, target_hp } => {
                crate::logger::log_info(&format!(
                    "🐉 {:?} regenerating: {} → {} HP (intangible)",
                    entity, start_hp, target_hp
                ));
                started_events.write(RegenerationStarted {
                    entity,
                    start_hp,
                    target_hp,
                });

                if config.spawn_on_entry {
                    match (points, table) {
                        (Some(points), Some(table)) => {
                            spawn_events.write_batch(roll_spawns(entity, points, &table.table, &mut rng));
                        }
                        _ => crate::logger::log(&format!(
                            "{:?}: regeneration spawns skipped (no spawn points/table)",
                            entity
                        )),
                    }
                }
            }
            RegenStep::Healed { hp } => {
                health_events.write(HealthChanged {
                    entity,
                    current: hp,
                    max: health.max(),
                });
            }
            RegenStep::Finished { hp } => {
                health_events.write(HealthChanged {
                    entity,
                    current: hp,
                    max: health.max(),
                });
                ended_events.write(RegenerationEnded {
                    entity,
                    hp,
                    aborted: false,
                });
                crate::logger::log_info(&format!("🐉 {:?} regeneration finished at {} HP", entity, hp));
            }
            RegenStep::Aborted => {
                ended_events.write(RegenerationEnded {
                    entity,
                    hp: health.current(),
                    aborted: true,
                });
                crate::logger::log_warning(&format!("{:?}: regeneration aborted (entity died)", entity));
            }
        }
    }
}

//! Clone aggregator: один концептуальный босс из нескольких клонов
//!
//! - `register` идемпотентен, max HP группы только растет (шкала health bar
//!   стабильна, даже когда клоны умирают и исчезают)
//! - тик: prune исчезнувших → сумма HP живых → resolved, если никого нет
//!   или у всех HP ≤ 0
//! - resolved срабатывает ровно один раз, потом группа разбирается

use bevy::prelude::*;

use crate::clock::SimClock;
use crate::combat::DespawnAfter;
use crate::components::{CloneBossUnit, Health, UnitView, WorldPosition};
use crate::loot::{LootDropped, LootTable};
use crate::DeterministicRng;

#[derive(Component, Debug, Clone, Default, PartialEq)]
pub struct CloneGroup {
    members: Vec<Entity>,
    max_total_hp: u32,
    aggregate_hp: u32,
    resolved: bool,
}

/// Снимок состояния группы после тика
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CloneGroupReport {
    pub aggregate_hp: u32,
    pub aggregate_max_hp: u32,
    pub resolved: bool,
    /// true только на тике, где группа стала resolved
    pub newly_resolved: bool,
    /// Позиция первого оставшегося клона (для дропа награды)
    pub drop_position: Option<Vec2>,
}

impl CloneGroup {
    /// false: уже зарегистрирован или группа уже resolved
    pub fn register(&mut self, member: Entity, max_hp: u32) -> bool {
        if self.resolved || self.members.contains(&member) {
            return false;
        }
        self.members.push(member);
        self.max_total_hp = self.max_total_hp.saturating_add(max_hp);
        true
    }

    pub fn contains(&self, member: Entity) -> bool {
        self.members.contains(&member)
    }

    pub fn members(&self) -> &[Entity] {
        &self.members
    }

    /// Max HP для health bar (не меньше 1)
    pub fn aggregate_max_hp(&self) -> u32 {
        self.max_total_hp.max(1)
    }

    pub fn aggregate_hp(&self) -> u32 {
        self.aggregate_hp
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    fn report(&self, newly_resolved: bool, drop_position: Option<Vec2>) -> CloneGroupReport {
        CloneGroupReport {
            aggregate_hp: self.aggregate_hp,
            aggregate_max_hp: self.aggregate_max_hp(),
            resolved: self.resolved,
            newly_resolved,
            drop_position,
        }
    }

    /// Prune → пересчет → resolve. `lookup` отдает None для исчезнувших клонов.
    pub fn evaluate<U, F>(&mut self, lookup: F) -> CloneGroupReport
    where
        U: CloneBossUnit,
        F: Fn(Entity) -> Option<U>,
    {
        if self.resolved {
            return self.report(false, None);
        }

        let live: Vec<U> = self.members.iter().filter_map(|&member| lookup(member)).collect();
        self.members = live.iter().map(|unit| unit.unit_id()).collect();

        self.aggregate_hp = live
            .iter()
            .map(|unit| unit.current_hp())
            .fold(0u32, u32::saturating_add)
            .min(self.aggregate_max_hp());

        let all_down = live.iter().all(|unit| unit.is_down());
        if !all_down {
            return self.report(false, None);
        }

        self.resolved = true;
        let drop_position = live.first().map(|unit| unit.location());
        self.report(true, drop_position)
    }
}

/// Маркер на клоне: к какой группе принадлежит (не больше одной)
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloneMember {
    pub group: Entity,
}

/// Запрос на регистрацию клона в группе
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterClone {
    pub group: Entity,
    pub member: Entity,
}

/// Событие: обновился health bar группы
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct CloneGroupUpdated {
    pub group: Entity,
    pub aggregate_hp: u32,
    pub aggregate_max_hp: u32,
}

/// Событие: все клоны повержены
#[derive(Event, Debug, Clone, PartialEq)]
pub struct EncounterResolved {
    pub group: Entity,
    pub position: Vec2,
}

/// Система: RegisterClone → CloneGroup (один клон: одна группа)
pub fn register_clones(
    mut commands: Commands,
    mut register_events: EventReader<RegisterClone>,
    mut groups: Query<&mut CloneGroup>,
    candidates: Query<(&Health, Option<&CloneMember>)>,
) {
    for event in register_events.read() {
        let Ok((health, membership)) = candidates.get(event.member) else {
            crate::logger::log_warning(&format!(
                "RegisterClone: {:?} has no Health, ignored",
                event.member
            ));
            continue;
        };

        // CloneMember ставится через Commands, поэтому в этом же тике
        // проверяем и сами списки групп
        let in_target = groups
            .get(event.group)
            .is_ok_and(|group| group.contains(event.member));
        // Resolved или исчезнувшая группа клона больше не держит
        let holds = |group: &CloneGroup| !group.is_resolved() && group.contains(event.member);
        let owned_elsewhere = membership.is_some_and(|m| {
            m.group != event.group && groups.get(m.group).is_ok_and(|group| holds(group))
        }) || (!in_target && groups.iter().any(|group| holds(group)));
        if owned_elsewhere {
            crate::logger::log_warning(&format!(
                "RegisterClone: {:?} already belongs to another group, ignored",
                event.member
            ));
            continue;
        }

        let Ok(mut group) = groups.get_mut(event.group) else {
            crate::logger::log_warning(&format!(
                "RegisterClone: group {:?} does not exist",
                event.group
            ));
            continue;
        };

        if group.register(event.member, health.max()) {
            commands
                .entity(event.member)
                .insert(CloneMember { group: event.group });
            crate::logger::log(&format!(
                "👥 Clone {:?} joined {:?} (max HP {})",
                event.member,
                event.group,
                group.aggregate_max_hp()
            ));
        }
    }
}

/// Система: агрегация групп (после всего урона тика)
pub fn tick_clone_groups(
    mut commands: Commands,
    mut groups: Query<(Entity, &mut CloneGroup, Option<&LootTable>, Option<&WorldPosition>)>,
    units: Query<(&Health, Option<&WorldPosition>)>,
    mut updated_events: EventWriter<CloneGroupUpdated>,
    mut resolved_events: EventWriter<EncounterResolved>,
    mut loot_events: EventWriter<LootDropped>,
    mut rng: ResMut<DeterministicRng>,
    clock: Res<SimClock>,
) {
    for (group_entity, mut group, loot, group_position) in groups.iter_mut() {
        let before = (group.aggregate_hp(), group.aggregate_max_hp(), group.members().len());

        let report = group.evaluate(|member| {
            units.get(member).ok().map(|(health, position)| UnitView {
                entity: member,
                health: *health,
                position: position.map(|p| p.0).unwrap_or_default(),
            })
        });

        if before != (report.aggregate_hp, report.aggregate_max_hp, group.members().len()) {
            updated_events.write(CloneGroupUpdated {
                group: group_entity,
                aggregate_hp: report.aggregate_hp,
                aggregate_max_hp: report.aggregate_max_hp,
            });
        }

        if !report.newly_resolved {
            continue;
        }

        let position = report
            .drop_position
            .or(group_position.map(|p| p.0))
            .unwrap_or_default();

        crate::logger::log_info(&format!("🏆 Clone group {:?} defeated", group_entity));
        resolved_events.write(EncounterResolved {
            group: group_entity,
            position,
        });

        match loot.and_then(|table| table.roll(&mut rng.rng)) {
            Some(item) => {
                loot_events.write(LootDropped {
                    source: group_entity,
                    item,
                    position,
                });
            }
            None => crate::logger::log_warning(&format!(
                "Clone group {:?}: no reward assigned",
                group_entity
            )),
        }

        // Группа отработала: разбирается в Cleanup (после чекпоинта)
        commands.entity(group_entity).insert(DespawnAfter {
            despawn_time: clock.now(),
        });
    }
}

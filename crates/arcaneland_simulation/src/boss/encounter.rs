//! Boss encounters: сборка архетипов из конфига + UI сигнал победы
//!
//! Архетипы (все на одних и тех же компонентах, без иерархии):
//! - главный босс: SpawnBudget + SpawnTable + BossEncounter
//! - дракон: RegenerationPhase + подкрепление на входе в фазу
//! - радио-босс: ShieldSet + DeathBurst
//! - клоны: CloneGroup + N юнитов с CloneMember

use bevy::prelude::*;

use crate::boss::{CloneGroup, CloneMember, RegenerationConfig, RegenerationPhase, ShieldSet, SpawnBudget, SpawnTable};
use crate::combat::{ContactDamage, DeathBurst, EntityDied};
use crate::components::{Health, SpawnPoints, WorldPosition};
use crate::config::{single_drop, BossConfig, CloneGroupConfig, DragonConfig, RadioBossConfig};
use crate::error::SimError;
use crate::loot::WeightedTable;
use crate::save::LevelCompletion;

/// Маркер босса с UI панелью (health bar на весь экран)
#[derive(Component, Debug, Clone, Default, PartialEq)]
pub struct BossEncounter {
    /// Имя панели, которую хост скрывает после победы
    pub panel: Option<String>,
}

/// Событие: босс повержен, хост прячет панель
#[derive(Event, Debug, Clone, PartialEq)]
pub struct BossDefeated {
    pub entity: Entity,
    pub panel: Option<String>,
}

/// Система: EntityDied → BossDefeated (для BossEncounter)
pub fn notify_boss_defeated(
    mut death_events: EventReader<EntityDied>,
    bosses: Query<&BossEncounter>,
    mut defeated_events: EventWriter<BossDefeated>,
) {
    for event in death_events.read() {
        let Ok(encounter) = bosses.get(event.entity) else {
            continue;
        };

        if encounter.panel.is_none() {
            crate::logger::log_warning(&format!(
                "BossEncounter {:?}: no UI panel assigned",
                event.entity
            ));
        }

        crate::logger::log_info(&format!("👑 Boss {:?} defeated", event.entity));
        defeated_events.write(BossDefeated {
            entity: event.entity,
            panel: encounter.panel.clone(),
        });
    }
}

fn spawn_points_around(origin: Vec2, offsets: &[[f32; 2]]) -> SpawnPoints {
    SpawnPoints::new(offsets.iter().map(|&offset| origin + Vec2::from(offset)))
}

fn insert_level_key(commands: &mut Commands, entity: Entity, key: &Option<String>) {
    if let Some(key) = key {
        commands
            .entity(entity)
            .insert(LevelCompletion { key: key.clone() });
    }
}

/// Главный босс: волны подкрепления по накопленному урону
pub fn spawn_boss(commands: &mut Commands, config: &BossConfig, origin: Vec2) -> Result<Entity, SimError> {
    let table = config.spawn_table()?;

    let entity = commands
        .spawn((
            Name::new("Boss"),
            Health::new(config.max_hp),
            WorldPosition(origin),
            SpawnBudget::new(config.spawn_step_percent, config.spawn_cooldown_secs),
            SpawnTable { table },
            spawn_points_around(origin, &config.spawn_points),
            ContactDamage::new(config.contact_damage, 0.0),
            BossEncounter {
                panel: config.panel.clone(),
            },
        ))
        .id();

    insert_level_key(commands, entity, &config.level_key);
    crate::logger::log(&format!("Spawned boss {:?} ({} HP)", entity, config.max_hp));
    Ok(entity)
}

/// Дракон: регенерация и подкрепление на входе в фазу
pub fn spawn_dragon(commands: &mut Commands, config: &DragonConfig, origin: Vec2) -> Entity {
    let regen = RegenerationConfig {
        regen_interval: config.regen_interval,
        regen_duration: config.regen_duration,
        heal_fraction: config.regen_heal_fraction,
        spawn_on_entry: true,
    };

    let entity = commands
        .spawn((
            Name::new("Dragon"),
            Health::new(config.base_hp),
            WorldPosition(origin),
            RegenerationPhase::default(),
            regen,
            SpawnTable {
                table: WeightedTable::uniform(config.spawnable_enemies.iter().cloned()),
            },
            spawn_points_around(origin, &config.spawn_points),
            ContactDamage::new(config.contact_damage, 0.0),
        ))
        .id();

    if let Some(loot) = single_drop(&config.drop) {
        commands.entity(entity).insert(loot);
    }
    insert_level_key(commands, entity, &config.level_key);
    crate::logger::log(&format!("Spawned dragon {:?} ({} HP)", entity, config.base_hp));
    entity
}

/// Радио-босс: щиты + взрыв снарядами после смерти
pub fn spawn_radio_boss(commands: &mut Commands, config: &RadioBossConfig, origin: Vec2) -> Entity {
    let entity = commands
        .spawn((
            Name::new("RadioBoss"),
            Health::new(config.max_hp),
            WorldPosition(origin),
            ShieldSet::new(
                config.shield_count,
                config.damage_allowed_shield_fraction,
                config.shield_disable_duration,
            )
            .with_contact_damage(ContactDamage::new(config.shield_contact_damage, 0.0)),
            ContactDamage::new(config.contact_damage, config.contact_damage_cooldown),
            DeathBurst {
                projectile_count: config.explosion_bullet_count,
                bursts: config.explosion_bursts,
                interval: config.explosion_delay,
                damage: config.bullet_damage,
            },
        ))
        .id();

    if let Some(loot) = single_drop(&config.drop) {
        commands.entity(entity).insert(loot);
    }
    insert_level_key(commands, entity, &config.level_key);
    crate::logger::log(&format!(
        "Spawned radio boss {:?} ({} HP, {} shields)",
        entity, config.max_hp, config.shield_count
    ));
    entity
}

/// Группа клонов: entity группы + по юниту на каждую запись `clone_hp`
///
/// Клоны регистрируются сразу (без RegisterClone), группа готова к первому тику.
pub fn spawn_clone_group(commands: &mut Commands, config: &CloneGroupConfig, origin: Vec2) -> (Entity, Vec<Entity>) {
    let group_entity = commands.spawn((Name::new("CloneGroup"), WorldPosition(origin))).id();

    let mut group = CloneGroup::default();
    let mut members = Vec::with_capacity(config.clone_hp.len());

    for (index, &hp) in config.clone_hp.iter().enumerate() {
        let offset = config
            .clone_offsets
            .get(index)
            .map(|&o| Vec2::from(o))
            .unwrap_or_default();

        let member = commands
            .spawn((
                Name::new(format!("Clone{}", index)),
                Health::new(hp),
                WorldPosition(origin + offset),
                CloneMember {
                    group: group_entity,
                },
            ))
            .id();

        group.register(member, hp);
        members.push(member);
    }

    commands.entity(group_entity).insert(group);
    if let Some(loot) = single_drop(&config.reward) {
        commands.entity(group_entity).insert(loot);
    }
    insert_level_key(commands, group_entity, &config.level_key);

    crate::logger::log(&format!(
        "Spawned clone group {:?} with {} clones",
        group_entity,
        members.len()
    ));
    (group_entity, members)
}

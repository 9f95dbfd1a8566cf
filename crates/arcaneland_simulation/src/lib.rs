//! Arcaneland Simulation Core
//!
//! ECS-симуляция боссов на Bevy 0.16 (headless, без рендера и физики)
//!
//! HYBRID ARCHITECTURE:
//! - ECS = game rules (health ledger, damage pipeline, boss mechanics)
//! - Движок = коллизии, движение, рендер, спавн префабов
//!
//! Хост пишет входные события (DamageEvent, ContactEvent, ShieldHit,
//! ShieldContact, RegisterClone, OpenChest), тикает `CombatTick` и читает выходные (SpawnRequested,
//! LootDropped, ProjectileBurst, BossDefeated, ...).

use bevy::ecs::event::event_update_system;
use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// Публичные модули
pub mod boss;
pub mod clock;
pub mod combat;
pub mod components;
pub mod config;
pub mod error;
pub mod logger;
pub mod loot;
pub mod save;

// Re-export базовых типов для удобства
pub use boss::{
    BossDefeated, BossEncounter, BossPlugin, CloneGroup, CloneGroupUpdated, CloneMember,
    EncounterResolved, RegenerationConfig, RegenerationEnded, RegenerationPhase,
    RegenerationStarted, RegisterClone, ShieldContact, ShieldHit, ShieldRestored, ShieldSet,
    ShieldStruck, SpawnBudget, SpawnRequested, SpawnTable,
};
pub use clock::SimClock;
pub use combat::{
    CombatPlugin, CombatSet, CombatTick, ContactDamage, ContactEvent, DamageBlocked, DamageDealt,
    DamageEvent, Dead, DeathBurst, EntityDied, HealthChanged, ProjectileBurst,
};
pub use components::*;
pub use config::{EncounterConfig, SimulationConfig};
pub use error::SimError;
pub use logger::{init_logger, log, log_error, log_info, log_warning};
pub use loot::{Chest, LootDropped, LootPlugin, LootTable, OpenChest, WeightedTable};
pub use save::{LevelCompleted, LevelCompletion, SaveState, SaveStore};

/// Главный plugin симуляции (объединяет все подсистемы)
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        let tick_hz = app
            .world()
            .get_resource::<SimulationConfig>()
            .map(|config| config.tick_hz)
            .unwrap_or_else(|| SimulationConfig::default().tick_hz);

        // Seed мог прийти из create_headless_app, не перетираем
        if !app.world().contains_resource::<DeterministicRng>() {
            app.insert_resource(DeterministicRng::new(42));
        }

        app
            // Fixed timestep (60Hz по умолчанию)
            .insert_resource(Time::<Fixed>::from_hz(tick_hz))
            .init_resource::<SimClock>()
            .init_resource::<SimulationConfig>()
            .add_event::<LevelCompleted>()
            .init_schedule(CombatTick)
            // Фазы тика строго по порядку
            .configure_sets(
                CombatTick,
                (
                    CombatSet::Registration,
                    CombatSet::Contact,
                    CombatSet::Shields,
                    CombatSet::Damage,
                    CombatSet::Triggers,
                    CombatSet::Regeneration,
                    CombatSet::Death,
                    CombatSet::Aggregation,
                    CombatSet::Cleanup,
                )
                    .chain(),
            )
            // Подсистемы
            .add_plugins((CombatPlugin, BossPlugin, LootPlugin))
            // Чекпоинт до деспавна (LevelCompletion еще на entity)
            .add_systems(
                CombatTick,
                save::record_level_completion
                    .in_set(CombatSet::Cleanup)
                    .before(combat::death::despawn_after_timeout),
            )
            .add_systems(FixedUpdate, run_combat_tick);
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .insert_resource(Time::<Fixed>::from_hz(60.0)); // 60Hz FixedUpdate

    app
}

/// Headless App + SimulationPlugin (все системы зарегистрированы)
pub fn create_simulation_app(seed: u64) -> App {
    let mut app = create_headless_app(seed);
    app.add_plugins(SimulationPlugin);
    app
}

/// Exclusive system: один CombatTick на каждый шаг FixedUpdate
pub fn run_combat_tick(world: &mut World) {
    let delta = world
        .get_resource::<Time<Fixed>>()
        .map(|time| time.delta_secs())
        .unwrap_or(0.0);
    advance_tick(world, delta);
}

/// Один тик с явным dt (тесты, replay, headless runner)
///
/// Команды хоста (спавны) применяются до тика, часы двигаются до систем.
/// Event буферы свопаются в начале тика: выход тика N читается до конца
/// тика N+1, потом отбрасывается.
pub fn advance_tick(world: &mut World, delta: f32) {
    world.flush();
    if let Err(err) = world.run_system_cached(event_update_system) {
        logger::log_error(&format!("Event update failed: {:?}", err));
    }
    world
        .get_resource_or_insert_with(SimClock::default)
        .advance(delta);

    if let Err(err) = world.try_run_schedule(CombatTick) {
        logger::log_error(&format!("CombatTick not initialized: {:?}", err));
    }
}

/// Snapshot мира для сравнения детерминизма
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    // Собираем все компоненты в детерминированный формат
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    // Сериализуем в байты через Debug (простейший способ)
    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}

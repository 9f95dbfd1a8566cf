//! Encounter integration test
//!
//! Полный CombatTick через `advance_tick`: хост пишет входные события,
//! тест дренит выходные из `Events<T>`.
//!
//! Проверяем:
//! - shield gate, contact cooldown, death burst
//! - подкрепление босса и дракона
//! - клон-агрегатор и чекпоинты
//! - порядок урона в тике, сундуки, event буферы

use bevy::prelude::*;
use arcaneland_simulation::boss::{spawn_boss, spawn_clone_group, spawn_dragon, spawn_radio_boss};
use arcaneland_simulation::combat::DamageBlock;
use arcaneland_simulation::config::{
    BossConfig, CloneGroupConfig, DragonConfig, RadioBossConfig, SpawnVariantConfig,
};
use arcaneland_simulation::loot::spawn_chest;
use arcaneland_simulation::save::MemorySaveStore;
use arcaneland_simulation::*;

const DT: f32 = 0.25;

/// Helper: App с SimulationPlugin и in-memory save
fn create_encounter_app(seed: u64) -> App {
    let mut app = create_simulation_app(seed);
    app.insert_resource(SaveState::new(MemorySaveStore::default()));
    app
}

/// Helper: забрать все события типа E
fn drain<E: Event>(app: &mut App) -> Vec<E> {
    app.world_mut().resource_mut::<Events<E>>().drain().collect()
}

fn hit(app: &mut App, target: Entity, amount: u32) {
    let now = app.world().resource::<SimClock>().now();
    app.world_mut()
        .send_event(DamageEvent::new(None, target, amount, now));
}

fn tick(app: &mut App, delta: f32) {
    advance_tick(app.world_mut(), delta);
}

fn hp(app: &App, entity: Entity) -> u32 {
    app.world()
        .get::<Health>(entity)
        .map(|h| h.current())
        .unwrap_or(0)
}

fn saved_flag(app: &App, key: &str) -> Option<i64> {
    app.world().resource::<SaveState>().store.get_int(key)
}

/// Test: щиты закрыты → урон блокируется; 4 удара по щитам → урон проходит
#[test]
fn test_radio_boss_shield_gate() {
    let mut app = create_encounter_app(42);
    let radio = spawn_radio_boss(
        &mut app.world_mut().commands(),
        &RadioBossConfig::default(),
        Vec2::ZERO,
    );

    hit(&mut app, radio, 10);
    tick(&mut app, DT);

    assert_eq!(hp(&app, radio), 100);
    let blocked = drain::<DamageBlocked>(&mut app);
    assert_eq!(blocked.len(), 1);
    assert_eq!(blocked[0].reason, DamageBlock::Shielded);

    // Щиты тикаются до damage: удары и урон в одном тике
    for index in 0..4 {
        app.world_mut().send_event(ShieldHit { owner: radio, index });
    }
    hit(&mut app, radio, 10);
    tick(&mut app, DT);

    assert_eq!(hp(&app, radio), 90);
    let struck = drain::<ShieldStruck>(&mut app);
    assert_eq!(struck.len(), 4);
    assert!(struck[3].owner_vulnerable);
    assert!(!struck[2].owner_vulnerable);

    // 3.5 сек спустя щиты снова активны
    for _ in 0..14 {
        tick(&mut app, DT);
    }
    assert_eq!(drain::<ShieldRestored>(&mut app).len(), 4);
    assert!(!app.world().get::<ShieldSet>(radio).unwrap().can_take_damage());
}

/// Test: contact damage не чаще раза в cooldown
#[test]
fn test_contact_damage_cooldown() {
    let mut app = create_encounter_app(42);
    let radio = spawn_radio_boss(
        &mut app.world_mut().commands(),
        &RadioBossConfig::default(),
        Vec2::ZERO,
    );
    let player = app.world_mut().spawn(Health::new(100)).id();

    // Касание каждый тик в течение секунды
    for _ in 0..4 {
        app.world_mut().send_event(ContactEvent {
            attacker: radio,
            target: player,
        });
        tick(&mut app, DT);
    }

    // t=0.25 и t=1.0 (cooldown 0.75)
    assert_eq!(hp(&app, player), 96);
}

/// Test: смерть радио-босса → 2 залпа по 20 пуль, потом лут и деспавн
#[test]
fn test_radio_boss_death_burst() {
    let mut app = create_encounter_app(42);
    let radio = spawn_radio_boss(
        &mut app.world_mut().commands(),
        &RadioBossConfig::default(),
        Vec2::new(3.0, 4.0),
    );

    for index in 0..7 {
        app.world_mut().send_event(ShieldHit { owner: radio, index });
    }
    hit(&mut app, radio, 100);
    tick(&mut app, DT);

    let died = drain::<EntityDied>(&mut app);
    assert_eq!(died.len(), 1);
    assert_eq!(died[0].position, Vec2::new(3.0, 4.0));

    let bursts = drain::<ProjectileBurst>(&mut app);
    assert_eq!(bursts.len(), 1);
    assert_eq!(bursts[0].directions.len(), 20);
    assert!(drain::<LootDropped>(&mut app).is_empty());
    assert!(app.world().get::<Dead>(radio).is_some());
    assert_eq!(saved_flag(&app, "Level3Completed"), Some(1));

    // Удар по трупу ничего не меняет
    hit(&mut app, radio, 50);
    tick(&mut app, 0.5);
    assert!(drain::<EntityDied>(&mut app).is_empty());
    assert!(drain::<ProjectileBurst>(&mut app).is_empty());

    // Второй залп через explosion_delay, потом лут
    tick(&mut app, 0.5);
    assert_eq!(drain::<ProjectileBurst>(&mut app).len(), 1);
    let loot = drain::<LootDropped>(&mut app);
    assert_eq!(loot.len(), 1);
    assert_eq!(loot[0].item, "RadioCore");

    tick(&mut app, DT);
    assert!(app.world().get_entity(radio).is_err());
}

/// Test: босс зовет подкрепление по накопленному урону
#[test]
fn test_boss_reinforcement_waves() {
    let mut app = create_encounter_app(7);
    let config = BossConfig {
        spawn_variants: vec![SpawnVariantConfig {
            variant: "EnemyMele".to_string(),
            chance: 1.0,
        }],
        ..Default::default()
    };
    let boss = spawn_boss(&mut app.world_mut().commands(), &config, Vec2::ZERO).unwrap();

    // 60 урона: HP 940 → шаг round(47) → волна, в бюджете 13
    hit(&mut app, boss, 60);
    tick(&mut app, DT);

    let spawned = drain::<SpawnRequested>(&mut app);
    assert_eq!(spawned.len(), 3);
    assert!(spawned.iter().all(|s| s.variant == "EnemyMele" && s.source == boss));
    let budget = app.world().get::<SpawnBudget>(boss).unwrap();
    assert_eq!(budget.accumulated_damage(), 13);

    // Cooldown 5 сек: следующая волна не раньше
    hit(&mut app, boss, 100);
    tick(&mut app, DT);
    assert!(drain::<SpawnRequested>(&mut app).is_empty());

    for _ in 0..20 {
        tick(&mut app, DT);
    }
    assert_eq!(drain::<SpawnRequested>(&mut app).len(), 3);
}

/// Test: смерть главного босса → BossDefeated с панелью + чекпоинт
#[test]
fn test_boss_defeat_hides_panel() {
    let mut app = create_encounter_app(42);
    let boss = spawn_boss(
        &mut app.world_mut().commands(),
        &BossConfig::default(),
        Vec2::ZERO,
    )
    .unwrap();

    hit(&mut app, boss, 5000);
    tick(&mut app, DT);

    let defeated = drain::<BossDefeated>(&mut app);
    assert_eq!(defeated.len(), 1);
    assert_eq!(defeated[0].panel.as_deref(), Some("PanelJefes"));
    assert_eq!(saved_flag(&app, "Level4Completed"), Some(1));
    drain::<SpawnRequested>(&mut app);

    // После смерти волн больше нет, даже когда cooldown истек
    for _ in 0..24 {
        hit(&mut app, boss, 10);
        tick(&mut app, DT);
        assert!(drain::<SpawnRequested>(&mut app).is_empty());
    }
}

/// Test: смертельный удар при готовом cooldown зовет последнюю волну
#[test]
fn test_killing_blow_calls_final_wave() {
    let mut app = create_encounter_app(42);
    let config = BossConfig {
        max_hp: 10,
        spawn_variants: vec![SpawnVariantConfig {
            variant: "EnemyShooter".to_string(),
            chance: 1.0,
        }],
        ..Default::default()
    };
    let boss = spawn_boss(&mut app.world_mut().commands(), &config, Vec2::ZERO).unwrap();

    hit(&mut app, boss, 10);
    tick(&mut app, DT);

    assert_eq!(drain::<EntityDied>(&mut app).len(), 1);
    let spawned = drain::<SpawnRequested>(&mut app);
    assert_eq!(spawned.len(), 3);
    assert!(spawned.iter().all(|s| s.variant == "EnemyShooter"));
}

/// Test: дракон регенерирует половину урона, неосязаем во время фазы
#[test]
fn test_dragon_regeneration_phase() {
    let mut app = create_encounter_app(42);
    let dragon = spawn_dragon(
        &mut app.world_mut().commands(),
        &DragonConfig::default(),
        Vec2::ZERO,
    );

    hit(&mut app, dragon, 100);
    tick(&mut app, DT);
    assert_eq!(hp(&app, dragon), 100);

    // Poll на 5-й секунде
    for _ in 0..19 {
        tick(&mut app, DT);
    }
    let started = drain::<RegenerationStarted>(&mut app);
    assert_eq!(started.len(), 1);
    assert_eq!(started[0].target_hp, 150);

    // Подкрепление на входе: по одному на каждую точку
    let spawned = drain::<SpawnRequested>(&mut app);
    assert_eq!(spawned.len(), 2);
    assert!(spawned
        .iter()
        .all(|s| s.variant == "EnemyMele" || s.variant == "EnemyMeleAcid"));

    // Неосязаем посреди фазы
    hit(&mut app, dragon, 30);
    tick(&mut app, DT);
    let blocked = drain::<DamageBlocked>(&mut app);
    assert_eq!(blocked.len(), 1);
    assert_eq!(blocked[0].reason, DamageBlock::Intangible);

    for _ in 0..11 {
        tick(&mut app, DT);
    }
    let ended = drain::<RegenerationEnded>(&mut app);
    assert_eq!(ended.len(), 1);
    assert!(!ended[0].aborted);
    assert_eq!(hp(&app, dragon), 150);
    assert_eq!(
        app.world()
            .get::<RegenerationPhase>(dragon)
            .unwrap()
            .accumulated_damage(),
        0
    );
}

/// Test: клоны 50/50/100 → один босс, resolve ровно один раз
#[test]
fn test_clone_group_resolves_once() {
    let mut app = create_encounter_app(42);
    let (group, clones) = spawn_clone_group(
        &mut app.world_mut().commands(),
        &CloneGroupConfig::default(),
        Vec2::ZERO,
    );

    hit(&mut app, clones[0], 50);
    hit(&mut app, clones[1], 50);
    tick(&mut app, DT);

    let updates = drain::<CloneGroupUpdated>(&mut app);
    let last = updates.last().unwrap();
    assert_eq!(last.aggregate_hp, 100);
    assert_eq!(last.aggregate_max_hp, 200);
    assert!(drain::<EncounterResolved>(&mut app).is_empty());

    hit(&mut app, clones[2], 100);
    tick(&mut app, DT);

    let resolved = drain::<EncounterResolved>(&mut app);
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].group, group);

    let loot = drain::<LootDropped>(&mut app);
    assert_eq!(loot.len(), 1);
    assert_eq!(loot[0].item, "MirrorShard");
    assert_eq!(saved_flag(&app, "Level1Completed"), Some(1));

    for _ in 0..4 {
        tick(&mut app, DT);
    }
    assert!(drain::<EncounterResolved>(&mut app).is_empty());
    assert!(app.world().get_entity(group).is_err());
}

/// Test: RegisterClone идемпотентен, клон не может быть в двух группах
#[test]
fn test_dynamic_clone_registration() {
    let mut app = create_encounter_app(42);
    let group_a = app.world_mut().spawn(CloneGroup::default()).id();
    let group_b = app.world_mut().spawn(CloneGroup::default()).id();
    let clone = app.world_mut().spawn(Health::new(80)).id();
    // group_b нужен живой член, иначе пустая группа сразу резолвится
    let other = app.world_mut().spawn(Health::new(20)).id();

    for event in [
        RegisterClone { group: group_a, member: clone },
        RegisterClone { group: group_a, member: clone },
        RegisterClone { group: group_b, member: clone },
        RegisterClone { group: group_b, member: other },
    ] {
        app.world_mut().send_event(event);
    }
    tick(&mut app, DT);

    let a = app.world().get::<CloneGroup>(group_a).unwrap();
    assert_eq!(a.members(), &[clone]);
    assert_eq!(a.aggregate_max_hp(), 80);

    let b = app.world().get::<CloneGroup>(group_b).unwrap();
    assert_eq!(b.members(), &[other]);
    assert_eq!(
        app.world().get::<CloneMember>(clone).unwrap().group,
        group_a
    );
}

/// Test: HP инварианты под случайным потоком урона
#[test]
fn test_health_invariants_under_fire() {
    let mut app = create_encounter_app(123);
    let config = EncounterConfig::default();
    let (boss, dragon, radio) = {
        let mut commands = app.world_mut().commands();
        (
            spawn_boss(&mut commands, &config.boss, Vec2::ZERO).unwrap(),
            spawn_dragon(&mut commands, &config.dragon, Vec2::X),
            spawn_radio_boss(&mut commands, &config.radio_boss, Vec2::Y),
        )
    };

    let mut died = Vec::new();
    for step in 0..400u32 {
        for (i, &target) in [boss, dragon, radio].iter().enumerate() {
            hit(&mut app, target, (step * 7 + i as u32 * 13) % 40);
        }
        if step % 10 == 0 {
            app.world_mut().send_event(ShieldHit {
                owner: radio,
                index: (step / 10) as usize % 7,
            });
        }
        tick(&mut app, DT);
        died.extend(drain::<EntityDied>(&mut app));

        let world = app.world_mut();
        let mut query = world.query::<&Health>();
        for health in query.iter(world) {
            assert!(health.current() <= health.max(), "Step {}: HP above max", step);
            if health.is_dead() {
                assert_eq!(health.current(), 0);
            }
        }
    }

    // Каждая смерть сигналится не больше одного раза
    assert!(!died.is_empty());
    let mut entities: Vec<Entity> = died.iter().map(|d| d.entity).collect();
    entities.sort();
    entities.dedup();
    assert_eq!(entities.len(), died.len());
}

/// Test: урон по одной цели в тике применяется в порядке поступления
#[test]
fn test_damage_resolves_in_arrival_order() {
    let mut app = create_encounter_app(42);
    let target = app.world_mut().spawn(Health::new(100)).id();

    // Частичный удар → смертельный → удар по трупу
    hit(&mut app, target, 30);
    hit(&mut app, target, 100);
    hit(&mut app, target, 20);
    tick(&mut app, DT);

    let dealt: Vec<(u32, u32, bool)> = drain::<DamageDealt>(&mut app)
        .iter()
        .map(|d| (d.damage, d.remaining_hp, d.target_died))
        .collect();
    assert_eq!(dealt, vec![(30, 70, false), (70, 0, true)]);

    let changed: Vec<u32> = drain::<HealthChanged>(&mut app)
        .iter()
        .map(|c| c.current)
        .collect();
    assert_eq!(changed, vec![70, 0]);

    assert_eq!(drain::<EntityDied>(&mut app).len(), 1);
    assert!(drain::<DamageBlocked>(&mut app).is_empty());
}

/// Test: event буферы не растут при долгом ручном тиканье
#[test]
fn test_event_buffers_stay_bounded() {
    let mut app = create_encounter_app(42);
    let target = app.world_mut().spawn(Health::new(1_000_000)).id();

    for _ in 0..5000 {
        hit(&mut app, target, 1);
        tick(&mut app, DT);
    }

    assert_eq!(hp(&app, target), 995_000);
    let world = app.world();
    assert!(world.resource::<Events<DamageEvent>>().len() <= 2);
    assert!(world.resource::<Events<DamageDealt>>().len() <= 2);
    assert!(world.resource::<Events<HealthChanged>>().len() <= 2);
}

/// Test: выход тика доступен еще один тик, потом отбрасывается
#[test]
fn test_events_survive_one_extra_tick() {
    let mut app = create_encounter_app(42);
    let target = app.world_mut().spawn(Health::new(100)).id();

    hit(&mut app, target, 10);
    tick(&mut app, DT);
    tick(&mut app, DT);
    assert_eq!(drain::<DamageDealt>(&mut app).len(), 1);

    hit(&mut app, target, 10);
    for _ in 0..3 {
        tick(&mut app, DT);
    }
    assert!(drain::<DamageDealt>(&mut app).is_empty());
}

/// Test: сундук открывается один раз, роняет один предмет и исчезает
#[test]
fn test_chest_drops_one_item() {
    let mut app = create_encounter_app(42);
    let chest = spawn_chest(&mut app.world_mut().commands(), Vec2::new(1.0, 2.0));

    app.world_mut().send_event(OpenChest { chest });
    app.world_mut().send_event(OpenChest { chest });
    tick(&mut app, DT);

    let loot = drain::<LootDropped>(&mut app);
    assert_eq!(loot.len(), 1);
    assert!(["Map", "Coin", "HealthPotion", "Staff"].contains(&loot[0].item.as_str()));
    assert_eq!(loot[0].position, Vec2::new(1.0, 2.0));
    assert!(app.world().get_entity(chest).is_err());
}

/// Test: активный щит бьет игрока, погасший нет
#[test]
fn test_shield_contact_damages_player() {
    let mut app = create_encounter_app(42);
    let radio = spawn_radio_boss(
        &mut app.world_mut().commands(),
        &RadioBossConfig::default(),
        Vec2::ZERO,
    );
    let player = app.world_mut().spawn(Health::new(100)).id();

    for index in 0..2 {
        app.world_mut().send_event(ShieldContact {
            owner: radio,
            index,
            target: player,
        });
    }
    tick(&mut app, DT);
    assert_eq!(hp(&app, player), 98);

    app.world_mut().send_event(ShieldHit { owner: radio, index: 0 });
    tick(&mut app, DT);

    app.world_mut().send_event(ShieldContact {
        owner: radio,
        index: 0,
        target: player,
    });
    tick(&mut app, DT);
    assert_eq!(hp(&app, player), 98);
}

/// Test: клон из разобранной группы можно зарегистрировать заново
#[test]
fn test_clone_from_resolved_group_can_rejoin() {
    let mut app = create_encounter_app(42);
    // Трупы остаются в мире, группа деспавнится сразу
    app.insert_resource(SimulationConfig {
        corpse_linger_secs: 60.0,
        ..Default::default()
    });

    let group_a = app.world_mut().spawn(CloneGroup::default()).id();
    let clone = app.world_mut().spawn(Health::new(10)).id();
    app.world_mut().send_event(RegisterClone { group: group_a, member: clone });
    tick(&mut app, DT);

    hit(&mut app, clone, 10);
    tick(&mut app, DT);
    tick(&mut app, DT);
    assert!(app.world().get_entity(group_a).is_err());
    assert!(app.world().get_entity(clone).is_ok());

    let group_b = app.world_mut().spawn(CloneGroup::default()).id();
    let other = app.world_mut().spawn(Health::new(20)).id();
    for member in [clone, other] {
        app.world_mut().send_event(RegisterClone { group: group_b, member });
    }
    tick(&mut app, DT);

    let b = app.world().get::<CloneGroup>(group_b).unwrap();
    assert_eq!(b.members(), &[clone, other]);
    assert_eq!(b.aggregate_max_hp(), 30);
    assert_eq!(
        app.world().get::<CloneMember>(clone).unwrap().group,
        group_b
    );
}

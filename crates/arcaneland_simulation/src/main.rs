//! Headless симуляция Arcaneland
//!
//! Спавнит всех боссов (босс, дракон, радио-босс, клоны) и прогоняет
//! скриптовый бой без рендера: игрок бьет всех по таймеру, сбивает щиты,
//! открывает сундук.

use bevy::prelude::*;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use arcaneland_simulation::boss::{spawn_boss, spawn_clone_group, spawn_dragon, spawn_radio_boss};
use arcaneland_simulation::loot::spawn_chest;
use arcaneland_simulation::save::{campaign_complete, JsonFileSaveStore, MemorySaveStore, LEVEL_KEYS};
use arcaneland_simulation::*;

/// Arcaneland boss encounter simulator
#[derive(Parser, Debug)]
#[command(name = "arcaneland_simulation")]
#[command(about = "Headless boss encounter simulator")]
#[command(version)]
struct Args {
    /// JSON encounter config (defaults if omitted)
    #[arg(long, value_name = "CONFIG_FILE")]
    config: Option<PathBuf>,

    /// RNG seed
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Number of simulation ticks
    #[arg(long, default_value = "3600")]
    ticks: u64,

    /// JSON save file for level checkpoints (in-memory if omitted)
    #[arg(long, value_name = "SAVE_FILE")]
    save: Option<PathBuf>,
}

// Скрипт игрока
const ATTACK_INTERVAL_TICKS: u64 = 30;
const ATTACK_DAMAGE: u32 = 25;
const REPORT_INTERVAL_TICKS: u64 = 300;

struct Targets {
    player: Entity,
    bosses: Vec<Entity>,
    radio_boss: Entity,
    shield_count: usize,
    chest: Entity,
}

/// Выход симуляции между отчетами (буферы событий живут два тика)
#[derive(Default)]
struct Tally {
    spawned: usize,
    loot: Vec<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logger();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log_error(&format!("Simulation failed: {}", err));
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), SimError> {
    let config = match &args.config {
        Some(path) => EncounterConfig::load_from_file(path)?,
        None => EncounterConfig::default(),
    };

    let save = match &args.save {
        Some(path) => SaveState::new(JsonFileSaveStore::open(path)?),
        None => SaveState::new(MemorySaveStore::default()),
    };

    log_info(&format!(
        "Starting Arcaneland headless simulation (seed: {}, ticks: {})",
        args.seed, args.ticks
    ));

    let mut app = create_headless_app(args.seed);
    app.insert_resource(config.simulation.clone())
        .insert_resource(save)
        .add_plugins(SimulationPlugin);

    let targets = spawn_encounter(app.world_mut(), &config)?;
    let delta = (1.0 / config.simulation.tick_hz) as f32;

    let mut tally = Tally::default();
    for tick in 0..args.ticks {
        script_player(app.world_mut(), &targets, tick);
        advance_tick(app.world_mut(), delta);
        collect(app.world_mut(), &mut tally);

        if tick % REPORT_INTERVAL_TICKS == 0 {
            report(app.world_mut(), tick, &mut tally);
        }
    }

    report(app.world_mut(), args.ticks, &mut tally);

    let world = app.world();
    let campaign_done = world
        .get_resource::<SaveState>()
        .is_some_and(|save| campaign_complete(&*save.store, &LEVEL_KEYS));
    log_info(&format!(
        "Simulation complete! (campaign complete: {})",
        campaign_done
    ));
    Ok(())
}

fn spawn_encounter(world: &mut World, config: &EncounterConfig) -> Result<Targets, SimError> {
    let (player, boss, dragon, radio_boss, clones, chest) = {
        let mut commands = world.commands();

        let player = commands
            .spawn((Name::new("Player"), Health::new(100), WorldPosition(Vec2::ZERO)))
            .id();
        let boss = spawn_boss(&mut commands, &config.boss, Vec2::new(0.0, 20.0))?;
        let dragon = spawn_dragon(&mut commands, &config.dragon, Vec2::new(20.0, 0.0));
        let radio_boss = spawn_radio_boss(&mut commands, &config.radio_boss, Vec2::new(-20.0, 0.0));
        let (_, clones) = spawn_clone_group(&mut commands, &config.clones, Vec2::new(0.0, -20.0));
        let chest = spawn_chest(&mut commands, Vec2::new(5.0, 5.0));
        (player, boss, dragon, radio_boss, clones, chest)
    };

    let mut bosses = vec![boss, dragon, radio_boss];
    bosses.extend(clones);

    world.flush();

    Ok(Targets {
        player,
        bosses,
        radio_boss,
        shield_count: config.radio_boss.shield_count,
        chest,
    })
}

/// Игрок бьет все цели по таймеру и сбивает щиты радио-босса
fn script_player(world: &mut World, targets: &Targets, tick: u64) {
    if tick == 0 {
        world.send_event(OpenChest {
            chest: targets.chest,
        });
    }

    if tick % ATTACK_INTERVAL_TICKS != 0 {
        return;
    }

    let now = world.resource::<SimClock>().now();

    for index in 0..targets.shield_count {
        world.send_event(ShieldHit {
            owner: targets.radio_boss,
            index,
        });
    }

    for &boss in &targets.bosses {
        let alive = world.get::<Health>(boss).is_some_and(|h| h.is_alive());
        if alive {
            world.send_event(DamageEvent::new(
                Some(targets.player),
                boss,
                ATTACK_DAMAGE,
                now,
            ));
        }
    }
}

fn collect(world: &mut World, tally: &mut Tally) {
    tally.spawned += world
        .resource_mut::<Events<SpawnRequested>>()
        .drain()
        .count();
    tally.loot.extend(
        world
            .resource_mut::<Events<LootDropped>>()
            .drain()
            .map(|drop| drop.item),
    );
}

fn report(world: &mut World, tick: u64, tally: &mut Tally) {
    let Tally { spawned, loot } = std::mem::take(tally);

    let mut query = world.query::<(&Name, &Health)>();
    let mut status: Vec<String> = query
        .iter(world)
        .map(|(name, health)| format!("{} {}/{}", name, health.current(), health.max()))
        .collect();
    status.sort();

    log_info(&format!(
        "Tick {}: [{}] reinforcements: {}, loot: {:?}",
        tick,
        status.join(", "),
        spawned,
        loot
    ));
}

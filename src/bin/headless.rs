// Headless runner: load the demo room, tick it, save the chunks
//
// usage: headless [config.json] [ticks]

use std::env;
use std::error::Error;

use tile_world::db::save_chunks;
use tile_world::world::map_loader::{load_char_map, DEMO_MAP};
use tile_world::{logging, InputState, World, WorldConfig};

const DEFAULT_TICKS: u32 = 600;
const TICK_MS: u64 = 16;

fn main() -> Result<(), Box<dyn Error>> {
    logging::init();

    let args: Vec<String> = env::args().collect();
    let config = match args.get(1) {
        Some(path) => WorldConfig::load(path)?,
        None => WorldConfig::default(),
    };
    let ticks = match args.get(2) {
        Some(value) => value.parse()?,
        None => DEFAULT_TICKS,
    };
    let save_path = config.save_path.clone();

    let mut world = World::new(config)?;
    load_char_map(&mut world, &DEMO_MAP)?;

    let input = InputState::new();
    let mut last = None;
    for _ in 0..ticks {
        let report = world.tick(TICK_MS, &input);
        last = Some(report);
        if report.game_over {
            break;
        }
    }

    for event in world.event_queue().drain() {
        tracing::info!(?event, "event");
    }
    if let Some(report) = last {
        tracing::info!(
            now_ms = report.now_ms,
            objects = world.objects().len(),
            chunks = world.index().chunk_count(),
            sprites = report.sprites,
            game_over = report.game_over,
            "run finished"
        );
    }

    let chunks = save_chunks(&world, &save_path)?;
    println!("saved {chunks} chunks to {save_path}");
    Ok(())
}

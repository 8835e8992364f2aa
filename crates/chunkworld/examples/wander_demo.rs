//! Walks a focus across the origin and streams chunks around it.
//!
//! Run with `RUST_LOG=chunkworld=debug` to see every crossing.

use std::sync::Arc;

use chunkworld::{
    ChunkConfiguration, ChunkHandler, ChunkSystem, ChunkSystemEvent, ChunkSystemListener,
    ChunkTarget, GridIndex, PositionTarget,
};
use tracing_subscriber::EnvFilter;

/// Generates chunks as the focus approaches and drops the ones it left.
struct Generator;

impl ChunkHandler<String> for Generator {
    fn on_enter(&self, system: &ChunkSystem<String>, _index: GridIndex) {
        let visible = system.visible_indices();
        for index in system.chunk_indices() {
            if !visible.contains(&index) {
                system.remove_chunk(index);
            }
        }
        for index in visible {
            if !system.contains_chunk(index) {
                system.insert_chunk(index, format!("terrain {index}"));
            }
        }
    }

    fn on_leave(&self, _system: &ChunkSystem<String>, _index: GridIndex) {}
}

struct Printer;

impl ChunkSystemListener for Printer {
    fn on_event(&self, event: &ChunkSystemEvent) {
        match event {
            ChunkSystemEvent::TargetEntered { target, index } => {
                println!("  {target} entered {index}")
            }
            ChunkSystemEvent::TargetLeft { target, index } => println!("  {target} left {index}"),
            ChunkSystemEvent::ChunkCreated(_) | ChunkSystemEvent::ChunkRemoved(_) => {}
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chunkworld=info")),
        )
        .init();

    let focus = Arc::new(PositionTarget::new(-12.0, 4.0));
    let config = ChunkConfiguration::new(16.0, 16.0)
        .with_radius(1)
        .with_focus(focus.clone());
    let system = ChunkSystem::new(config)?;
    system.set_handler(Arc::new(Generator));

    let printer: Arc<dyn ChunkSystemListener> = Arc::new(Printer);
    system.add_listener(&printer);

    let npc = Arc::new(PositionTarget::new(30.0, -30.0));
    let npc_target: Arc<dyn ChunkTarget> = npc.clone();
    system.bind_target(&npc_target);

    for step in 0..8 {
        println!("=== Tick {step} ===");
        system.update(1.0 / 60.0);
        println!(
            "  active chunk: {}, resident chunks: {}",
            system.active_chunk().as_deref().map_or("none", String::as_str),
            system.chunk_count()
        );
        focus.translate_by(7.0, 0.0);
        npc.translate_by(-9.0, 9.0);
    }

    // Doubling the chunk size re-maps everyone on the next tick
    println!("=== Resizing chunks ===");
    system.set_configuration(
        ChunkConfiguration::new(32.0, 32.0)
            .with_radius(1)
            .with_focus(focus),
    )?;
    system.tick();

    Ok(())
}

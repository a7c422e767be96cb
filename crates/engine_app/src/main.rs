//! # engine_app: selector demo
//!
//! Spawns a particle world and runs a few ticks over it, exercising live
//! selectors, a cached join, tag toggles, deferred removal, entity creation,
//! and raw array scans.
//!
//! ## Usage
//!
//! ```text
//! engine_app --entities 5000 --passes 10 --log-filter engine_app=debug
//! ```

mod components;
mod tick;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use engine_store::{EntityStore, StoreConfig};
use tick::{DemoConfig, TickLoop};

#[derive(Parser)]
#[command(name = "engine_app", about = "Statically typed selector demo")]
struct Args {
    /// Number of particles to spawn
    #[arg(short, long, default_value_t = 1000)]
    entities: usize,

    /// Number of ticks to run
    #[arg(short, long, default_value_t = 3)]
    passes: u64,

    /// Ticks per second; sets the time step
    #[arg(long, default_value_t = 60.0)]
    tick_rate: f32,

    /// Maximum number of live join caches
    #[arg(long, default_value_t = 64)]
    max_caches: usize,

    /// Log filter directives; overrides RUST_LOG
    #[arg(short, long)]
    log_filter: Option<String>,

    /// Print the component registry as JSON before exiting
    #[arg(long)]
    dump_registry: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = match &args.log_filter {
        Some(directives) => EnvFilter::try_new(directives)?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = DemoConfig::default()
        .with_entities(args.entities)
        .with_ticks(args.passes)
        .with_tick_rate(args.tick_rate)
        .with_store(
            StoreConfig::default()
                .with_entity_capacity(args.entities)
                .with_max_caches(args.max_caches),
        );
    info!(?config, "selector demo starting");

    let mut tick_loop = TickLoop::new(config);
    tick_loop.populate()?;
    let reports = tick_loop.run()?;

    if let Some(last) = reports.last() {
        info!(report = %serde_json::to_string(last)?, "final tick");
    }

    if args.dump_registry {
        let descriptors: Vec<_> = tick_loop.world().registry().iter().collect();
        println!("{}", serde_json::to_string_pretty(&descriptors)?);
    }

    info!(ticks = tick_loop.tick_id(), "selector demo finished");
    Ok(())
}

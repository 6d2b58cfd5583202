//! # keepregion — console host
//!
//! Hosts the region registry on an in-process sharded runtime and exposes the
//! `keepregion` command on standard input.
//!
//! ## Startup Sequence
//!
//! 1. Load (or write) `config.json` from the data directory.
//! 2. Start the shard workers and load the configured partitions.
//! 3. Load stored regions and claim all of their tiles.
//! 4. Read commands until `quit`, end of input or Ctrl-C.
//! 5. Release every claim and drain the shard queues.

mod command;
mod config;
mod console;
mod runtime;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use keepregion_core::{ClaimOwner, ClaimReconciler, RegionRegistry};
use keepregion_store::JsonRegionStore;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use command::Actor;
use config::AppConfig;
use console::{Console, Outcome};
use runtime::ShardedRuntime;

/// Owner token for every claim this process places.
const CLAIM_OWNER: &str = "keepregion";

#[derive(Parser)]
#[command(name = "keepregion", about = "Keep tile regions active in a sharded runtime")]
struct Args {
    /// Directory holding config.json and regions.json
    #[arg(short, long, default_value = "data")]
    data_dir: PathBuf,

    /// Number of shard workers
    #[arg(short, long, default_value_t = 4)]
    shards: usize,

    /// Partitions to load (repeatable); the first is where the console starts
    #[arg(short, long = "partition", default_values = ["world", "world_nether", "world_the_end"])]
    partitions: Vec<String>,

    /// Name recorded as the creator of regions
    #[arg(long, default_value = "console")]
    actor: String,

    /// Grant admin limits to the console actor
    #[arg(long)]
    admin: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries command replies.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("keepregion=info".parse()?)
                .add_directive("keepregion_core=info".parse()?)
                .add_directive("keepregion_store=info".parse()?),
        )
        .init();

    let args = Args::parse();
    info!(data_dir = %args.data_dir.display(), "keepregion starting");

    let config = AppConfig::load_or_init(&args.data_dir);

    let runtime = ShardedRuntime::start(args.shards);
    let handles: Vec<_> = args
        .partitions
        .iter()
        .map(|name| runtime.load_partition(name))
        .collect();
    let Some(home) = handles.first().cloned() else {
        anyhow::bail!("at least one partition must be loaded");
    };

    let reconciler = ClaimReconciler::new(
        ClaimOwner::new(CLAIM_OWNER),
        runtime.clone(),
        runtime.clone(),
        runtime.clone(),
    );
    let mut registry = RegionRegistry::new(JsonRegionStore::in_dir(&args.data_dir), reconciler);
    registry.load_regions();
    registry.apply_all_tickets();

    let actor = Actor {
        name: args.actor,
        partition: home,
        block_x: 0,
        block_z: 0,
        can_use: true,
        is_admin: args.admin,
    };
    let mut console = Console::new(actor, registry, Arc::clone(&runtime), config.limits);

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = input.next_line() => match line {
                Ok(Some(line)) => match console.handle_line(&line) {
                    Outcome::Continue(lines) => {
                        for line in lines {
                            println!("{line}");
                        }
                    }
                    Outcome::Quit => break,
                },
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "failed to read input");
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
        }
    }

    let registry = console.into_registry();
    registry.remove_all_tickets();
    runtime.shutdown().await;

    info!("keepregion shut down");
    Ok(())
}

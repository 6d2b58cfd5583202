//! Line-oriented console front-end.
//!
//! Each input line is either a `keepregion` command (with or without the
//! `/keepregion` or `keepregion` prefix) or a console extra:
//!
//! - `goto <partition> <blockX> <blockZ>` — move the console actor.
//! - `complete <args...>` — show completions for a partial command.
//! - `load <partition>` / `unload <partition>` — change the loaded partitions.
//! - `status` — shard activity and claimed tiles per partition.
//! - `help`, `quit`.

use std::sync::Arc;

use keepregion_core::{PartitionDirectory, RegionRegistry};
use keepregion_store::RegionStore;

use crate::command::{self, Actor};
use crate::config::Limits;
use crate::runtime::ShardedRuntime;

/// Result of handling one console line.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Print these lines and keep reading.
    Continue(Vec<String>),
    /// Stop the console.
    Quit,
}

/// Console session state.
#[derive(Debug)]
pub struct Console<S> {
    actor: Actor,
    registry: RegionRegistry<S>,
    runtime: Arc<ShardedRuntime>,
    limits: Limits,
}

impl<S: RegionStore> Console<S> {
    /// Create a console acting as `actor`.
    #[must_use]
    pub fn new(
        actor: Actor,
        registry: RegionRegistry<S>,
        runtime: Arc<ShardedRuntime>,
        limits: Limits,
    ) -> Self {
        Self {
            actor,
            registry,
            runtime,
            limits,
        }
    }

    #[cfg(test)]
    pub fn registry(&self) -> &RegionRegistry<S> {
        &self.registry
    }

    /// Consume the console, returning the registry for shutdown.
    #[must_use]
    pub fn into_registry(self) -> RegionRegistry<S> {
        self.registry
    }

    /// Handle one input line.
    pub fn handle_line(&mut self, line: &str) -> Outcome {
        let mut words: Vec<&str> = line.split_whitespace().collect();
        if matches!(words.first(), Some(&("/keepregion" | "keepregion" | "/kr" | "kr"))) {
            words.remove(0);
        }

        let lines = match words.as_slice() {
            [] => Vec::new(),
            ["quit" | "exit" | "stop"] => return Outcome::Quit,
            ["help"] => help(),
            ["status"] => self.status(),
            ["goto", partition, x, z] => self.goto(partition, x, z),
            ["goto", ..] => vec!["Usage: goto <partition> <blockX> <blockZ>".to_string()],
            ["load", partition] => {
                let handle = self.runtime.load_partition(partition);
                vec![format!("Loaded {} ({})", handle.name(), handle.id())]
            }
            ["unload", partition] => match self.runtime.by_name(partition) {
                Some(handle) => {
                    self.runtime.unload_partition(handle.id());
                    vec![format!("Unloaded {}", handle.name())]
                }
                None => vec![format!("Unknown partition: {partition}")],
            },
            ["complete", rest @ ..] => {
                // A trailing space starts a new, still empty argument.
                let mut args = rest.to_vec();
                if line.ends_with(char::is_whitespace) {
                    args.push("");
                }
                let completions = command::complete(&self.registry, &args);
                vec![completions.join(" ")]
            }
            args => command::execute(&self.actor, &mut self.registry, &self.limits, args),
        };
        Outcome::Continue(lines)
    }

    fn goto(&mut self, partition: &str, x: &str, z: &str) -> Vec<String> {
        let Some(handle) = self.runtime.by_name(partition) else {
            return vec![format!("Unknown partition: {partition}")];
        };
        let (Ok(block_x), Ok(block_z)) = (x.parse::<i32>(), z.parse::<i32>()) else {
            return vec!["Block coordinates must be whole numbers.".to_string()];
        };
        self.actor.partition = handle;
        self.actor.block_x = block_x;
        self.actor.block_z = block_z;
        let tile = self.actor.tile();
        vec![format!(
            "Now in {} at block ({block_x},{block_z}), tile {tile}",
            self.actor.partition.name()
        )]
    }

    fn status(&self) -> Vec<String> {
        let mut lines = vec![format!(
            "{} regions, {} shards, executed per shard: {:?}",
            self.registry.total_regions(),
            self.runtime.shard_count(),
            self.runtime.executed_per_shard()
        )];
        for partition in self.runtime.partitions() {
            lines.push(format!(
                "{}: {} claimed tiles",
                partition.name(),
                self.runtime.claimed_tiles(partition.id())
            ));
        }
        lines
    }
}

fn help() -> Vec<String> {
    [
        "create <radius>                 keep the square around your tile active",
        "list                            show stored regions",
        "remove [id]                     remove by id prefix, or at your tile",
        "goto <partition> <bx> <bz>      move to a block position",
        "complete <args...>              show completions",
        "load | unload <partition>       change loaded partitions",
        "status                          shard and claim overview",
        "quit                            release claims and exit",
    ]
    .iter()
    .map(ToString::to_string)
    .collect()
}

#[cfg(test)]
mod tests {
    use keepregion_core::{ClaimOwner, ClaimReconciler};
    use keepregion_store::MemoryRegionStore;

    use super::*;

    fn console(runtime: &Arc<ShardedRuntime>) -> Console<Arc<MemoryRegionStore>> {
        let world = runtime.load_partition("world");
        runtime.load_partition("world_nether");
        let reconciler = ClaimReconciler::new(
            ClaimOwner::new("keepregion"),
            runtime.clone(),
            runtime.clone(),
            runtime.clone(),
        );
        let registry = RegionRegistry::new(Arc::new(MemoryRegionStore::new()), reconciler);
        let actor = Actor {
            name: "console".to_string(),
            partition: world,
            block_x: 0,
            block_z: 0,
            can_use: true,
            is_admin: true,
        };
        Console::new(actor, registry, runtime.clone(), Limits::default())
    }

    fn lines(outcome: Outcome) -> Vec<String> {
        match outcome {
            Outcome::Continue(lines) => lines,
            Outcome::Quit => panic!("unexpected quit"),
        }
    }

    #[tokio::test]
    async fn test_prefixes_and_quit() {
        let runtime = ShardedRuntime::start(2);
        let mut console = console(&runtime);
        assert!(lines(console.handle_line("/keepregion create 0"))[0].contains("Region created"));
        assert!(lines(console.handle_line("kr list")).len() > 1);
        assert_eq!(lines(console.handle_line("   ")), Vec::<String>::new());
        assert_eq!(console.handle_line("quit"), Outcome::Quit);
        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_goto_moves_actor() {
        let runtime = ShardedRuntime::start(2);
        let mut console = console(&runtime);
        assert_eq!(
            lines(console.handle_line("goto WORLD_NETHER -17 40")),
            vec!["Now in world_nether at block (-17,40), tile (-2,2)"]
        );
        assert_eq!(lines(console.handle_line("goto end 0 0")), vec!["Unknown partition: end"]);
        assert_eq!(
            lines(console.handle_line("goto world x 0")),
            vec!["Block coordinates must be whole numbers."]
        );

        console.handle_line("create 1");
        let region = &console.registry().list_regions()[0];
        assert_eq!(region.partition().name(), "world_nether");
        assert_eq!(region.center(), keepregion_model::TileCoord::new(-2, 2));
        runtime.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_console_claims_through_shards() {
        let runtime = ShardedRuntime::start(2);
        let mut console = console(&runtime);
        console.handle_line("create 1");
        let registry = console.into_registry();
        runtime.shutdown().await;

        assert_eq!(registry.total_regions(), 1);
        let world = runtime.by_name("world").unwrap();
        assert_eq!(runtime.claimed_tiles(world.id()), 9);
    }

    #[tokio::test]
    async fn test_complete_after_trailing_space_lists_ids() {
        let runtime = ShardedRuntime::start(2);
        let mut console = console(&runtime);
        console.handle_line("create 0");
        let short = console.registry().list_regions()[0].short_id();

        assert_eq!(lines(console.handle_line("complete remove ")), vec![short.clone()]);
        assert_eq!(lines(console.handle_line("kr complete remove\t")), vec![short]);
        assert_eq!(lines(console.handle_line("complete remove")), vec!["remove"]);
        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_status_and_complete_lines() {
        let runtime = ShardedRuntime::start(3);
        let mut console = console(&runtime);
        let status = lines(console.handle_line("status"));
        assert!(status[0].starts_with("0 regions, 3 shards"));
        assert_eq!(status[1], "world: 0 claimed tiles");
        assert_eq!(status[2], "world_nether: 0 claimed tiles");
        assert_eq!(lines(console.handle_line("complete l")), vec!["list"]);
        assert_eq!(lines(console.handle_line("complete ")), vec!["create list remove"]);

        assert_eq!(
            lines(console.handle_line("unload world_nether")),
            vec!["Unloaded world_nether"]
        );
        assert_eq!(lines(console.handle_line("status")).len(), 2);
        assert!(lines(console.handle_line("load the_end"))[0].starts_with("Loaded the_end"));
        assert_eq!(lines(console.handle_line("status")).len(), 3);
        runtime.shutdown().await;
    }
}

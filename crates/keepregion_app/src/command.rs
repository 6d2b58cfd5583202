//! The `keepregion` command: `create <radius>`, `list`, `remove [id]`.
//!
//! Commands act on behalf of an [`Actor`] standing at a block position in a
//! loaded partition. Replies are returned as lines for the front-end to show.

use keepregion_core::{PartitionHandle, RegionRegistry};
use keepregion_model::{PartitionRef, Region, TileCoord};
use keepregion_store::RegionStore;
use tracing::debug;

use crate::config::Limits;

const PREFIX: &str = "[KeepRegion] ";
const SUBCOMMANDS: [&str; 3] = ["create", "list", "remove"];

/// Who is running a command and where they stand.
#[derive(Debug, Clone)]
pub struct Actor {
    /// Display name, recorded as the region creator.
    pub name: String,
    /// The partition the actor is in.
    pub partition: PartitionHandle,
    /// Block x position.
    pub block_x: i32,
    /// Block z position.
    pub block_z: i32,
    /// May use the command at all.
    pub can_use: bool,
    /// Exempt from the region cap and uses the admin radius limit.
    pub is_admin: bool,
}

impl Actor {
    /// The tile the actor stands in.
    #[must_use]
    pub fn tile(&self) -> TileCoord {
        TileCoord::from_block(self.block_x, self.block_z)
    }
}

/// Run a `keepregion` command. `args` excludes the command name itself.
pub fn execute<S: RegionStore>(
    actor: &Actor,
    registry: &mut RegionRegistry<S>,
    limits: &Limits,
    args: &[&str],
) -> Vec<String> {
    if !actor.can_use {
        return reply("No permission.");
    }
    let Some(sub) = args.first() else {
        return usage();
    };
    debug!(actor = %actor.name, command = %sub, "keepregion command");
    match sub.to_lowercase().as_str() {
        "create" => create(actor, registry, limits, args),
        "list" => list(actor, registry),
        "remove" => remove(actor, registry, args),
        _ => usage(),
    }
}

/// Suggestions for the argument currently being typed.
#[must_use]
pub fn complete<S: RegionStore>(registry: &RegionRegistry<S>, args: &[&str]) -> Vec<String> {
    match args {
        [partial] => filter(partial, SUBCOMMANDS.iter().map(ToString::to_string)),
        [sub, partial] if sub.eq_ignore_ascii_case("remove") => {
            filter(partial, registry.list_regions().iter().map(Region::short_id))
        }
        _ => Vec::new(),
    }
}

fn create<S: RegionStore>(
    actor: &Actor,
    registry: &mut RegionRegistry<S>,
    limits: &Limits,
    args: &[&str],
) -> Vec<String> {
    let Some(raw) = args.get(1) else {
        return reply("Usage: /keepregion create <radius>");
    };
    let Ok(radius) = raw.parse::<i64>() else {
        return reply("Radius must be a whole number.");
    };
    let allowed = limits.allowed_radius(actor.is_admin);
    let radius = match u32::try_from(radius) {
        Ok(radius) if radius <= allowed => radius,
        _ => return reply(&format!("Radius must be between 0 and {allowed}.")),
    };
    if !actor.is_admin && limits.region_cap_reached(registry.total_regions()) {
        return reply("Maximum number of regions reached.");
    }

    let center = actor.tile();
    let region = Region::declare(
        PartitionRef::identified(actor.partition.name(), actor.partition.id()),
        center,
        radius,
        actor.name.as_str(),
    );
    if registry.has_region(&region) {
        return reply("This region already exists.");
    }
    let tiles = region.tile_count();
    registry.add_region(region);
    reply(&format!(
        "Region created: center=({},{}) r={radius} tiles={tiles}",
        center.x, center.z
    ))
}

fn list<S: RegionStore>(actor: &Actor, registry: &RegionRegistry<S>) -> Vec<String> {
    let regions = registry.list_regions();
    if regions.is_empty() {
        return reply("No regions stored.");
    }

    // Group by partition name, keeping first-seen order.
    let mut groups: Vec<(&str, Vec<&Region>)> = Vec::new();
    for region in regions {
        let name = region.partition().name();
        match groups.iter_mut().find(|(group, _)| *group == name) {
            Some((_, members)) => members.push(region),
            None => groups.push((name, vec![region])),
        }
    }

    let here = actor.tile();
    let mut lines = reply("Stored regions (grouped by partition):");
    for (name, members) in groups {
        lines.push(format!("Partition: {name}"));
        for region in members {
            let mut line = format!(
                "{} center=({},{}) r={} tiles={}",
                region.short_id(),
                region.center().x,
                region.center().z,
                region.radius(),
                region.tile_count()
            );
            if actor.partition.name().eq_ignore_ascii_case(name) {
                line.push_str(&format!(
                    " dist={} tiles",
                    here.chebyshev_distance(region.center())
                ));
            }
            lines.push(line);
        }
    }
    lines
}

fn remove<S: RegionStore>(
    actor: &Actor,
    registry: &mut RegionRegistry<S>,
    args: &[&str],
) -> Vec<String> {
    if let Some(id) = args.get(1) {
        return match registry.remove_by_id(id) {
            Some(region) => removed_line(&region),
            None => reply("No unique region found with that id."),
        };
    }

    let removed = registry.remove_by_center(&actor.partition, actor.tile());
    match removed.as_slice() {
        [] => reply("No region found with this center."),
        [region] => removed_line(region),
        many => reply(&format!("Removed {} regions with this center.", many.len())),
    }
}

fn removed_line(region: &Region) -> Vec<String> {
    reply(&format!(
        "Region removed: {} center=({},{}) r={}",
        region.short_id(),
        region.center().x,
        region.center().z,
        region.radius()
    ))
}

fn usage() -> Vec<String> {
    reply("Usage: /keepregion <create|list|remove>")
}

fn reply(message: &str) -> Vec<String> {
    vec![format!("{PREFIX}{message}")]
}

fn filter(partial: &str, options: impl Iterator<Item = String>) -> Vec<String> {
    let partial = partial.to_lowercase();
    options
        .filter(|option| option.to_lowercase().starts_with(&partial))
        .collect()
}

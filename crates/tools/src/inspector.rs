use gq_common::{ActorId, ActorKind, Position};
use gq_kernel::World;
use serde::Serialize;

/// World inspector for developer tooling.
///
/// Provides read-only queries against the world state for debugging and
/// the CLI.
pub struct WorldInspector;

impl WorldInspector {
    /// Produce a summary of the world state.
    pub fn summary(world: &World) -> WorldSummary {
        let actors = world.actors().values();
        let mut summary = WorldSummary {
            name: world.name().to_owned(),
            tick: world.now(),
            seed: world.seed(),
            hash: world.content_hash(),
            tile_count: world.tiles().len(),
            levels: world.tiles().levels(),
            actor_count: world.actor_count(),
            hidden: 0,
            falling: 0,
            scheduled_tasks: world.scheduler().len(),
            pending_events: world.events().len(),
            goal_tiles: world.win_tiles().len(),
            won: world.has_won(),
        };
        for actor in actors {
            summary.hidden += usize::from(actor.is_hidden());
            summary.falling += usize::from(actor.is_falling());
        }
        summary
    }

    /// Detailed info about one actor, if it exists.
    pub fn inspect_actor(world: &World, id: ActorId) -> Option<ActorInfo> {
        world.actor(id).map(|a| ActorInfo {
            id,
            kind: a.kind(),
            name: a.display_name().to_owned(),
            art: a.art().to_owned(),
            position: (!a.is_hidden()).then(|| a.position()),
            holding: a.holding(),
            held_by: a.held_by(),
            falling: a.is_falling(),
            pushable: a.is_pushable(),
        })
    }

    /// All actor ids, optionally restricted to one kind.
    pub fn list_actors(world: &World, kind: Option<ActorKind>) -> Vec<ActorId> {
        world
            .actors()
            .values()
            .filter(|a| kind.is_none_or(|k| a.kind() == k))
            .map(|a| a.id())
            .collect()
    }
}

/// Summary of world state for the inspector.
#[derive(Debug, Clone, Serialize)]
pub struct WorldSummary {
    pub name: String,
    pub tick: u64,
    pub seed: u64,
    pub hash: u32,
    pub tile_count: usize,
    pub levels: Vec<i32>,
    pub actor_count: usize,
    pub hidden: usize,
    pub falling: usize,
    pub scheduled_tasks: usize,
    pub pending_events: usize,
    pub goal_tiles: usize,
    pub won: bool,
}

impl std::fmt::Display for WorldSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "World '{}': tick={} seed={} hash={} tiles={} levels={} actors={} hidden={} falling={} tasks={} won={}",
            self.name,
            self.tick,
            self.seed,
            self.hash,
            self.tile_count,
            self.levels.len(),
            self.actor_count,
            self.hidden,
            self.falling,
            self.scheduled_tasks,
            self.won,
        )
    }
}

/// Detailed info about a single actor.
#[derive(Debug, Clone, Serialize)]
pub struct ActorInfo {
    pub id: ActorId,
    pub kind: ActorKind,
    pub name: String,
    pub art: String,
    /// `None` while hidden.
    pub position: Option<Position>,
    pub holding: Option<ActorId>,
    pub held_by: Option<ActorId>,
    pub falling: bool,
    pub pushable: bool,
}

impl std::fmt::Display for ActorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} '{}' {}", self.id, self.kind, self.name, self.art)?;
        match self.position {
            Some(p) => write!(f, " at ({}, {}, {})", p.x, p.y, p.z)?,
            None => write!(f, " hidden")?,
        }
        if let Some(item) = self.holding {
            write!(f, " holding {item}")?;
        }
        if self.falling {
            write!(f, " falling")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::IVec3;
    use gq_kernel::{ActorSpec, Tile};

    fn small_world() -> World {
        let mut world = World::new("inspect", 9);
        for x in -2..=2 {
            for y in -2..=2 {
                world.tiles_mut().insert(Tile::floor(IVec3::new(x, y, 0)));
            }
        }
        world
    }

    #[test]
    fn summary_empty_world() {
        let world = World::new("empty", 1);
        let summary = WorldInspector::summary(&world);
        assert_eq!(summary.tick, 0);
        assert_eq!(summary.actor_count, 0);
        assert_eq!(summary.tile_count, 0);
        assert!(!summary.won);
    }

    #[test]
    fn summary_counts_hidden_and_pending() {
        let mut world = small_world();
        let p = world.spawn(ActorSpec::new(ActorKind::Player), IVec3::ZERO);
        let g = world.spawn(ActorSpec::new(ActorKind::Garbage), IVec3::X);
        world.grab(p, g).unwrap();
        world.tick();

        let summary = WorldInspector::summary(&world);
        assert_eq!(summary.tick, 1);
        assert_eq!(summary.actor_count, 2);
        assert_eq!(summary.hidden, 1);
        assert_eq!(summary.pending_events, 4); // 2 spawns, hide, grab
        assert_eq!(summary.levels, vec![0]);
    }

    #[test]
    fn inspect_actor_found_and_missing() {
        let mut world = small_world();
        let id = world.spawn(
            ActorSpec::new(ActorKind::Furniture).name("Bed").pushable(true),
            IVec3::new(1, 2, 0),
        );
        let info = WorldInspector::inspect_actor(&world, id).unwrap();
        assert_eq!(info.position, Some(IVec3::new(1, 2, 0)));
        assert!(info.pushable);
        assert!(format!("{info}").contains("'Bed'"));
        assert!(WorldInspector::inspect_actor(&world, ActorId(77)).is_none());
    }

    #[test]
    fn list_actors_by_kind() {
        let mut world = small_world();
        let p = world.spawn(ActorSpec::new(ActorKind::Player), IVec3::ZERO);
        world.spawn(ActorSpec::new(ActorKind::Garbage), IVec3::ZERO);
        assert_eq!(WorldInspector::list_actors(&world, None).len(), 2);
        assert_eq!(
            WorldInspector::list_actors(&world, Some(ActorKind::Player)),
            vec![p]
        );
    }

    #[test]
    fn summary_display_and_json() {
        let world = gq_mapgen::generate("shown", 42);
        let summary = WorldInspector::summary(&world);
        let s = format!("{summary}");
        assert!(s.contains("tick=0"));
        assert!(s.contains(&format!("hash={}", world.content_hash())));
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["goal_tiles"], 6);
    }
}

use crate::catalog;
use crate::config::GeneratorConfig;
use crate::corridor::{carve_corridor, validate_doors};
use crate::room::{CoreRoom, RectangleRoom, RoomBlueprint, RoomPlan};
use glam::IVec3;
use gq_common::{Position, RandomSource, SeededRandom};
use gq_kernel::World;

const DIRECTIONS: [IVec3; 4] = [IVec3::X, IVec3::NEG_X, IVec3::Y, IVec3::NEG_Y];

/// A generated dungeon and the rooms it was built from.
#[derive(Debug, Clone)]
pub struct Dungeon {
    pub world: World,
    pub rooms: Vec<RoomPlan>,
}

/// Seeded multi-level dungeon generator.
///
/// One [`SeededRandom`] drives every level in order, so the same seed and
/// config always produce the same tiles, the same content and the same ids.
#[derive(Debug, Clone, Default)]
pub struct Generator {
    config: GeneratorConfig,
}

impl Generator {
    /// Generator with explicit layout parameters.
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Build and populate every level for `seed`.
    pub fn generate(&self, name: &str, seed: u64) -> Dungeon {
        let _span = tracing::info_span!("generate", name, seed).entered();
        let mut rng = SeededRandom::new(seed);
        let mut world = World::new(name, seed);

        let mut rooms = Vec::new();
        for z in 0..self.config.levels.max(1) {
            rooms.extend(self.generate_level(&mut world, z, &mut rng));
        }
        let demoted = validate_doors(world.tiles_mut());
        self.populate(&mut world, &rooms, &mut rng);
        // Generation is not news to anyone.
        world.drain_events();

        tracing::info!(
            tiles = world.tiles().len(),
            rooms = rooms.len(),
            actors = world.actor_count(),
            demoted_doors = demoted,
            hash = world.content_hash(),
            "dungeon generated"
        );
        Dungeon { world, rooms }
    }

    fn generate_level(&self, world: &mut World, z: i32, rng: &mut dyn RandomSource) -> Vec<RoomPlan> {
        let core = CoreRoom::new(z, &self.config);
        let origin = core.anchor();
        let mut placed = vec![core.instantiate(world, rng)];
        let radius = self.config.corridor_radius();

        let mut attempts = 0;
        while placed.len() <= self.config.rooms_per_level && attempts < self.config.max_attempts {
            attempts += 1;
            let candidate = self.propose_anchor(origin, rng);
            let crowded = placed
                .iter()
                .any(|r| r.distance_to(candidate) <= self.config.min_room_distance);
            if crowded {
                continue;
            }

            let plan = RectangleRoom::new(candidate, &self.config).instantiate(world, rng);
            let mut nearest: Vec<&RoomPlan> = placed.iter().collect();
            nearest.sort_by(|a, b| a.distance_to(candidate).total_cmp(&b.distance_to(candidate)));
            let targets: Vec<Position> = nearest
                .into_iter()
                .take(self.config.connections)
                .map(|r| r.anchor)
                .collect();
            for target in targets {
                carve_corridor(world.tiles_mut(), target, candidate, radius, rng);
            }
            placed.push(plan);
        }

        if placed.len() <= self.config.rooms_per_level {
            tracing::debug!(
                level = z,
                rooms = placed.len() - 1,
                attempts,
                "room placement gave up early"
            );
        }
        placed
    }

    /// Random walk of a few long strides out from `origin`.
    fn propose_anchor(&self, origin: Position, rng: &mut dyn RandomSource) -> Position {
        let (lo, hi) = self.config.walk_strides;
        let (len_lo, len_hi) = self.config.stride_length;
        let strides = rng.range_inclusive(lo, hi);
        let mut pos = origin;
        for _ in 0..strides {
            let dir = DIRECTIONS[rng.index(DIRECTIONS.len())];
            pos += dir * rng.range_inclusive(len_lo, len_hi);
        }
        pos
    }

    /// One piece of garbage per ordinary room, and sometimes furniture.
    fn populate(&self, world: &mut World, rooms: &[RoomPlan], rng: &mut dyn RandomSource) {
        let (num, den) = self.config.furniture_chance;
        for room in rooms.iter().filter(|r| !r.is_core && !r.interior.is_empty()) {
            let spec = catalog::random_garbage(rng);
            let spot = room.interior[rng.index(room.interior.len())];
            world.spawn(spec, spot);

            if rng.chance(num, den) {
                let spec = catalog::random_furniture(rng);
                let spot = room.interior[rng.index(room.interior.len())];
                world.spawn(spec, spot);
            }
        }
    }
}

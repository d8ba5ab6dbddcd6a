use crate::actor::{Actor, ActorSpec};
use crate::config::SimConfig;
use crate::error::ActionError;
use crate::grid::{TileGrid, TileKey};
use crate::movement::Interaction;
use crate::schedule::{Scheduler, TaskKind};
use crate::tile::Tile;
use gq_common::{ActorId, ActorKind, OFF_GRID, Occupancy, Position};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// An event record produced by every mutation to the world.
///
/// The protocol layer drains these to build outbound updates; tests use them
/// to observe what a single operation did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorldEvent {
    Spawned {
        id: ActorId,
        kind: ActorKind,
        position: Position,
    },
    Moved {
        id: ActorId,
        from: Position,
        to: Position,
    },
    Hidden {
        id: ActorId,
    },
    Shown {
        id: ActorId,
        position: Position,
    },
    Removed {
        id: ActorId,
    },
    Rekeyed {
        old: ActorId,
        new: ActorId,
    },
    Grabbed {
        holder: ActorId,
        item: ActorId,
    },
    Dropped {
        holder: ActorId,
        item: ActorId,
        position: Position,
    },
    FallStarted {
        id: ActorId,
    },
    Landed {
        id: ActorId,
        position: Position,
    },
    DoorOpened {
        position: Position,
    },
    DoorClosed {
        position: Position,
    },
    Interacted {
        actor: ActorId,
        other: ActorId,
        outcome: Interaction,
    },
    /// Every designated tile holds an item. Emitted once.
    Won,
}

/// One generated dungeon plus its live actor registry.
///
/// All mutations go through explicit operations on this type. Every client
/// holds its own copy; copies generated from the same seed start out equal
/// and are kept close by applying the same updates.
#[derive(Debug, Clone)]
pub struct World {
    name: String,
    seed: u64,
    /// Lowest id not yet handed out.
    next_id: u32,
    pub(crate) tiles: TileGrid,
    pub(crate) actors: BTreeMap<ActorId, Actor>,
    win_tiles: BTreeSet<TileKey>,
    won: bool,
    pub(crate) config: SimConfig,
    pub(crate) scheduler: Scheduler,
    event_log: Vec<WorldEvent>,
}

impl World {
    /// Empty world with default simulation settings.
    pub fn new(name: impl Into<String>, seed: u64) -> Self {
        Self::with_config(name, seed, SimConfig::default())
    }

    /// Empty world with explicit simulation settings.
    pub fn with_config(name: impl Into<String>, seed: u64, config: SimConfig) -> Self {
        Self {
            name: name.into(),
            seed,
            next_id: 1,
            tiles: TileGrid::new(),
            actors: BTreeMap::new(),
            win_tiles: BTreeSet::new(),
            won: false,
            config,
            scheduler: Scheduler::new(),
            event_log: Vec::new(),
        }
    }

    /// Display name of this world.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the world, e.g. when the relay assigns a name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Seed the world was generated from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Simulation settings.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Current logical time in ticks.
    pub fn now(&self) -> u64 {
        self.scheduler.now()
    }

    /// Pending timed tasks.
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// All tiles.
    pub fn tiles(&self) -> &TileGrid {
        &self.tiles
    }

    /// Direct tile access for generation. Do not move occupied tiles.
    pub fn tiles_mut(&mut self) -> &mut TileGrid {
        &mut self.tiles
    }

    /// Tile at `pos`, if any. Absent tiles are impassable.
    pub fn tile(&self, pos: Position) -> Option<&Tile> {
        self.tiles.get(pos)
    }

    pub(crate) fn is_passable(&self, pos: Position) -> bool {
        self.tiles.get(pos).is_some_and(Tile::is_passable)
    }

    // --- Events ---

    pub(crate) fn record(&mut self, event: WorldEvent) {
        self.event_log.push(event);
    }

    /// Read-only access to the event log.
    pub fn events(&self) -> &[WorldEvent] {
        &self.event_log
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.event_log)
    }

    // --- Identity ---

    /// The id the next spawned actor will receive.
    pub fn next_id(&self) -> ActorId {
        ActorId(self.next_id)
    }

    /// Take the next id and advance the counter.
    pub fn allocate_id(&mut self) -> ActorId {
        let id = ActorId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Raise the id counter to at least `watermark`. Never lowers it.
    pub fn adopt_watermark(&mut self, watermark: ActorId) {
        if watermark.0 > self.next_id {
            tracing::debug!(from = self.next_id, to = watermark.0, "adopting id watermark");
            self.next_id = watermark.0;
        }
    }

    /// Actor registry in id order.
    pub fn actors(&self) -> &BTreeMap<ActorId, Actor> {
        &self.actors
    }

    /// Look up one actor.
    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(&id)
    }

    /// Number of registered actors, hidden ones included.
    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    /// Whether `id` is registered.
    pub fn contains_actor(&self, id: ActorId) -> bool {
        self.actors.contains_key(&id)
    }

    fn actor_mut(&mut self, id: ActorId) -> Result<&mut Actor, ActionError> {
        self.actors.get_mut(&id).ok_or(ActionError::UnknownActor(id))
    }

    /// Set the display name of an actor.
    pub fn set_actor_name(&mut self, id: ActorId, name: impl Into<String>) -> Result<(), ActionError> {
        self.actor_mut(id)?.name = Some(name.into());
        Ok(())
    }

    /// Change how an actor is drawn.
    pub fn set_art(&mut self, id: ActorId, art: impl Into<String>) -> Result<(), ActionError> {
        self.actor_mut(id)?.art = art.into();
        Ok(())
    }

    // --- Lifecycle ---

    /// Register a new actor with the next free id, placed on the nearest
    /// legal tile to `near`.
    pub fn spawn(&mut self, spec: ActorSpec, near: Position) -> ActorId {
        let id = self.allocate_id();
        // A freshly allocated id cannot be in use: the counter only grows
        // and every explicit id raises it.
        let _ = self.spawn_with_id(id, spec, near);
        id
    }

    /// Register an actor under an externally chosen id. If no legal tile is
    /// found near `near`, the actor is registered hidden.
    pub fn spawn_with_id(
        &mut self,
        id: ActorId,
        spec: ActorSpec,
        near: Position,
    ) -> Result<ActorId, ActionError> {
        if self.actors.contains_key(&id) {
            return Err(ActionError::IdInUse(id));
        }
        let kind = spec.kind;
        self.actors.insert(id, Actor::from_spec(id, spec));
        self.adopt_watermark(id.next());

        let position = match self.find_free_spot(kind.occupancy(), near) {
            Some(spot) if self.attach(id, spot) => spot,
            _ => {
                tracing::debug!(%id, ?near, "no room to place spawned actor; left hidden");
                OFF_GRID
            }
        };
        tracing::trace!(%id, %kind, ?position, "spawned");
        self.record(WorldEvent::Spawned { id, kind, position });
        Ok(id)
    }

    /// Take an actor off the grid without forgetting it.
    pub fn hide(&mut self, id: ActorId) -> bool {
        let Some(actor) = self.actors.get(&id) else {
            return false;
        };
        if !actor.on_grid {
            return false;
        }
        self.detach(id);
        self.record(WorldEvent::Hidden { id });
        true
    }

    /// Put a hidden actor back on the nearest legal tile to `near`. An item
    /// that was being held is released from its holder.
    pub fn show(&mut self, id: ActorId, near: Position) -> bool {
        let Some(actor) = self.actors.get(&id) else {
            return false;
        };
        if actor.on_grid {
            return false;
        }
        let class = actor.kind.occupancy();
        let Some(spot) = self.find_free_spot(class, near) else {
            tracing::debug!(%id, ?near, "nowhere to show actor");
            return false;
        };
        self.release_from_holder(id);
        if !self.attach(id, spot) {
            return false;
        }
        self.record(WorldEvent::Shown { id, position: spot });
        true
    }

    /// Forget an actor entirely. Anything it was holding is dropped where it
    /// stood.
    pub fn remove(&mut self, id: ActorId) -> Option<Actor> {
        if !self.actors.contains_key(&id) {
            return None;
        }
        if self.actors.get(&id).is_some_and(|a| a.holding.is_some()) && !self.drop_held(id, None) {
            // Nowhere to put it; the item stays hidden but unowned.
            if let Some(item) = self.actors.get_mut(&id).and_then(|a| a.holding.take()) {
                if let Some(it) = self.actors.get_mut(&item) {
                    it.held_by = None;
                }
            }
        }
        self.release_from_holder(id);
        self.detach(id);
        let actor = self.actors.remove(&id);
        self.record(WorldEvent::Removed { id });
        actor
    }

    /// Reassign an actor's id, keeping tile and holder references intact.
    pub fn rekey(&mut self, old: ActorId, new: ActorId) -> Result<(), ActionError> {
        if old == new {
            return Ok(());
        }
        if self.actors.contains_key(&new) {
            return Err(ActionError::IdInUse(new));
        }
        let mut actor = self.actors.remove(&old).ok_or(ActionError::UnknownActor(old))?;
        actor.id = new;
        if actor.on_grid {
            if let Some(tile) = self.tiles.get_mut(actor.position) {
                tile.rename_occupant(old, new);
            }
        }
        if let Some(item) = actor.holding {
            if let Some(it) = self.actors.get_mut(&item) {
                it.held_by = Some(new);
            }
        }
        if let Some(holder) = actor.held_by {
            if let Some(h) = self.actors.get_mut(&holder) {
                h.holding = Some(new);
            }
        }
        self.actors.insert(new, actor);
        self.scheduler.rename_actor(old, new);
        self.adopt_watermark(new.next());
        self.record(WorldEvent::Rekeyed { old, new });
        Ok(())
    }

    /// Clear the tile slot holding `id` and park it off-grid.
    pub(crate) fn detach(&mut self, id: ActorId) {
        let Some(actor) = self.actors.get_mut(&id) else {
            return;
        };
        if actor.on_grid {
            if let Some(tile) = self.tiles.get_mut(actor.position) {
                tile.remove(id);
            }
        }
        actor.on_grid = false;
        actor.position = OFF_GRID;
        actor.falling = false;
        self.scheduler.cancel(TaskKind::Fall(id));
    }

    pub(crate) fn release_from_holder(&mut self, id: ActorId) {
        let Some(holder) = self.actors.get_mut(&id).and_then(|a| a.held_by.take()) else {
            return;
        };
        if let Some(h) = self.actors.get_mut(&holder) {
            if h.holding == Some(id) {
                h.holding = None;
            }
        }
    }

    /// Place `id` on the tile at `to`, leaving its old tile. Handles the
    /// vertical-status transition and the win check; records no move event.
    pub(crate) fn attach(&mut self, id: ActorId, to: Position) -> bool {
        let Some(actor) = self.actors.get(&id) else {
            return false;
        };
        let (class, from, was_on_grid) = (actor.kind.occupancy(), actor.position, actor.on_grid);
        if was_on_grid && from == to {
            return false;
        }
        let Some(tile) = self.tiles.get_mut(to) else {
            return false;
        };
        if !tile.place(id, class) {
            return false;
        }
        let has_floor = tile.has_floor();
        if was_on_grid {
            if let Some(old) = self.tiles.get_mut(from) {
                old.remove(id);
            }
        }

        let Some(actor) = self.actors.get_mut(&id) else {
            return false;
        };
        actor.position = to;
        actor.on_grid = true;
        self.settle(id, has_floor);

        if class == Occupancy::Item {
            self.check_win();
        }
        true
    }

    /// Enter or leave the falling state for an actor that has just arrived
    /// on a tile with or without floor.
    pub(crate) fn settle(&mut self, id: ActorId, has_floor: bool) {
        let fall_period = self.config.fall_period;
        let Some(actor) = self.actors.get_mut(&id) else {
            return;
        };
        let at = actor.position;
        if !has_floor && !actor.falling {
            actor.falling = true;
            self.scheduler.schedule(TaskKind::Fall(id), fall_period);
            tracing::debug!(%id, ?at, "no floor; falling");
            self.record(WorldEvent::FallStarted { id });
        } else if has_floor && actor.falling {
            actor.falling = false;
            self.scheduler.cancel(TaskKind::Fall(id));
            tracing::debug!(%id, ?at, "landed");
            self.record(WorldEvent::Landed { id, position: at });
        }
    }

    /// Replicated position: move normally, and if that is refused put the
    /// actor on the nearest legal tile instead.
    pub fn force_position(&mut self, id: ActorId, to: Position) -> bool {
        let Some(actor) = self.actors.get(&id) else {
            return false;
        };
        if actor.held_by.is_some() {
            return false;
        }
        if actor.on_grid && actor.position == to {
            return true;
        }
        if self.move_actor(id, to) {
            return true;
        }
        let Some(actor) = self.actors.get(&id) else {
            return false;
        };
        let from = actor.position;
        match self.find_free_spot(actor.kind.occupancy(), to) {
            Some(spot) if spot == from => true,
            Some(spot) if self.attach(id, spot) => {
                self.record(WorldEvent::Moved { id, from, to: spot });
                true
            }
            _ => false,
        }
    }

    // --- Consistency ---

    /// Content hash of the tile set; see [`hash_tiles`].
    pub fn content_hash(&self) -> u32 {
        hash_tiles(self.tiles.iter())
    }

    // --- Win condition ---

    /// Add a tile that must hold an item for the game to be won.
    pub fn designate_win_tile(&mut self, pos: Position) {
        if let Some(key) = TileKey::pack(pos) {
            self.win_tiles.insert(key);
        }
    }

    /// Designated win tiles, in key order.
    pub fn win_tiles(&self) -> Vec<Position> {
        self.win_tiles.iter().map(|k| k.unpack()).collect()
    }

    /// Whether the win has latched.
    pub fn has_won(&self) -> bool {
        self.won
    }

    /// Latch the win if every designated tile holds an item. Once won,
    /// always won.
    pub fn check_win(&mut self) -> bool {
        if self.won {
            return true;
        }
        if self.win_tiles.is_empty() {
            return false;
        }
        let all_filled = self.win_tiles.iter().all(|key| {
            self.tiles
                .get(key.unpack())
                .and_then(Tile::ground_item)
                .and_then(|id| self.actors.get(&id))
                .is_some_and(|a| a.kind.is_item())
        });
        if all_filled {
            self.won = true;
            tracing::info!(world = %self.name, "every goal tile is filled");
            self.record(WorldEvent::Won);
        }
        self.won
    }

    // --- Appearance ---

    /// What a viewer sees at `pos`: the top occupant's art, else the glyph,
    /// or the remembered appearance while the tile is out of view.
    pub fn appearance(&self, pos: Position) -> Option<String> {
        let tile = self.tiles.get(pos)?;
        if !tile.is_visible() {
            return Some(tile.last_seen().to_owned());
        }
        let art = tile
            .top_occupant()
            .and_then(|id| self.actors.get(&id))
            .map(|a| a.art.clone());
        Some(art.unwrap_or_else(|| tile.glyph().to_string()))
    }

    /// Toggle fog on a tile, remembering what was last seen there.
    pub fn set_visible(&mut self, pos: Position, visible: bool) -> bool {
        let Some(current) = self.appearance(pos) else {
            return false;
        };
        match self.tiles.get_mut(pos) {
            Some(tile) => {
                tile.set_visibility(visible, current);
                true
            }
            None => false,
        }
    }

    // --- Time ---

    /// Advance one tick, firing every due task. A task runs again only while
    /// its triggering condition still holds.
    pub fn tick(&mut self) {
        let _span = tracing::trace_span!("world_tick", now = self.scheduler.now() + 1).entered();
        for task in self.scheduler.advance() {
            if !self.task_active(task.kind) {
                continue;
            }
            self.run_task(task.kind);
            if self.task_active(task.kind) {
                self.scheduler.requeue(task);
            }
        }
    }

    fn task_active(&self, kind: TaskKind) -> bool {
        match kind {
            TaskKind::Fall(id) => self
                .actors
                .get(&id)
                .is_some_and(|a| a.on_grid && a.falling),
            TaskKind::DoorClose(key) => self.tiles.get(key.unpack()).is_some_and(Tile::is_open_door),
        }
    }

    fn run_task(&mut self, kind: TaskKind) {
        match kind {
            TaskKind::Fall(id) => self.fall_one_level(id),
            TaskKind::DoorClose(key) => {
                let position = key.unpack();
                let closed = self
                    .tiles
                    .get_mut(position)
                    .is_some_and(|t| t.is_unoccupied() && t.close_door());
                if closed {
                    tracing::trace!(?position, "door closed");
                    self.record(WorldEvent::DoorClosed { position });
                }
            }
        }
    }
}

/// Hash a tile set the way every client does.
///
/// Each tile contributes the string `"x,y,z"` followed by its base glyph.
/// The strings are sorted, then their UTF-16 code units are folded with
/// `h = 31 * h + c` in wrapping 32-bit arithmetic.
pub fn hash_tiles<'a>(tiles: impl IntoIterator<Item = &'a Tile>) -> u32 {
    let mut keys: Vec<String> = tiles
        .into_iter()
        .map(|t| {
            let p = t.position();
            format!("{},{},{}{}", p.x, p.y, p.z, t.glyph())
        })
        .collect();
    keys.sort_unstable();
    keys.iter()
        .flat_map(|k| k.encode_utf16())
        .fold(0u32, |h, c| h.wrapping_mul(31).wrapping_add(u32::from(c)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::IVec3;

    fn room(world: &mut World, half: i32) {
        for x in -half..=half {
            for y in -half..=half {
                world.tiles_mut().insert(Tile::floor(IVec3::new(x, y, 0)));
            }
        }
    }

    fn garbage() -> ActorSpec {
        ActorSpec::new(ActorKind::Garbage).art("%")
    }

    #[test]
    fn world_starts_empty() {
        let w = World::new("test", 1);
        assert_eq!(w.actor_count(), 0);
        assert_eq!(w.next_id(), ActorId(1));
        assert_eq!(w.now(), 0);
        assert!(w.events().is_empty());
    }

    #[test]
    fn ids_are_monotonic_and_unique() {
        let mut w = World::new("test", 1);
        room(&mut w, 3);
        let mut seen = BTreeSet::new();
        for _ in 0..20 {
            let id = w.spawn(garbage(), IVec3::ZERO);
            assert!(seen.insert(id));
        }
        let ids: Vec<_> = w.actors().keys().copied().collect();
        assert!(ids.windows(2).all(|p| p[0] < p[1]));
    }

    #[test]
    fn explicit_ids_raise_the_watermark() {
        let mut w = World::new("test", 1);
        room(&mut w, 2);
        w.spawn_with_id(ActorId(40), garbage(), IVec3::ZERO).unwrap();
        assert_eq!(w.next_id(), ActorId(41));
        assert_eq!(w.spawn(garbage(), IVec3::ZERO), ActorId(41));
        assert_eq!(
            w.spawn_with_id(ActorId(40), garbage(), IVec3::ZERO),
            Err(ActionError::IdInUse(ActorId(40)))
        );
    }

    #[test]
    fn watermark_never_lowers() {
        let mut w = World::new("test", 1);
        w.adopt_watermark(ActorId(10));
        w.adopt_watermark(ActorId(3));
        assert_eq!(w.next_id(), ActorId(10));
    }

    #[test]
    fn spawn_finds_free_tile_nearby() {
        let mut w = World::new("test", 1);
        room(&mut w, 2);
        let a = w.spawn(ActorSpec::new(ActorKind::Player), IVec3::ZERO);
        let b = w.spawn(ActorSpec::new(ActorKind::Player), IVec3::ZERO);
        assert_eq!(w.actor(a).unwrap().position(), IVec3::ZERO);
        let pb = w.actor(b).unwrap().position();
        assert_ne!(pb, IVec3::ZERO);
        assert_eq!((pb - IVec3::ZERO).abs().max_element(), 1);
        assert_eq!(w.tile(pb).unwrap().blocking(), Some(b));
    }

    #[test]
    fn spawn_without_room_is_hidden() {
        let mut w = World::new("test", 1);
        let id = w.spawn(ActorSpec::new(ActorKind::Player), IVec3::ZERO);
        let actor = w.actor(id).unwrap();
        assert!(actor.is_hidden());
        assert_eq!(actor.position(), OFF_GRID);
    }

    #[test]
    fn hash_of_single_tile() {
        let mut w = World::new("test", 1);
        w.tiles_mut().insert(Tile::floor(IVec3::ZERO));
        // "0,0,0." folded by hand
        assert_eq!(w.content_hash(), 1_416_307_958);
    }

    #[test]
    fn hash_is_order_independent() {
        let tiles = [
            Tile::floor(IVec3::new(1, 2, 0)),
            Tile::wall(IVec3::new(-5, 0, 1)),
            Tile::door(IVec3::new(3, 3, 0)),
            Tile::chute(IVec3::new(0, 3, 2)),
        ];
        let forward = hash_tiles(tiles.iter());
        let backward = hash_tiles(tiles.iter().rev());
        assert_eq!(forward, backward);
    }

    #[test]
    fn hash_ignores_occupants_but_sees_glyphs() {
        let mut w = World::new("test", 1);
        room(&mut w, 1);
        w.tiles_mut().insert(Tile::door(IVec3::new(2, 0, 0)));
        let before = w.content_hash();
        w.spawn(garbage(), IVec3::ZERO);
        assert_eq!(w.content_hash(), before);
        w.tiles_mut().get_mut(IVec3::new(2, 0, 0)).unwrap().open_door();
        assert_ne!(w.content_hash(), before);
    }

    #[test]
    fn hide_and_show() {
        let mut w = World::new("test", 1);
        room(&mut w, 2);
        let id = w.spawn(garbage(), IVec3::ZERO);
        assert!(w.hide(id));
        assert!(!w.hide(id));
        assert!(w.tile(IVec3::ZERO).unwrap().is_unoccupied());
        assert_eq!(w.actor(id).unwrap().position(), OFF_GRID);
        assert!(w.show(id, IVec3::new(1, 1, 0)));
        assert_eq!(w.actor(id).unwrap().position(), IVec3::new(1, 1, 0));
        assert_eq!(w.tile(IVec3::new(1, 1, 0)).unwrap().ground_item(), Some(id));
    }

    #[test]
    fn remove_clears_tile_and_registry() {
        let mut w = World::new("test", 1);
        room(&mut w, 2);
        let id = w.spawn(ActorSpec::new(ActorKind::Player), IVec3::ZERO);
        let removed = w.remove(id).unwrap();
        assert_eq!(removed.id(), id);
        assert!(w.actor(id).is_none());
        assert!(w.tile(IVec3::ZERO).unwrap().is_unoccupied());
        assert!(w.remove(id).is_none());
    }

    #[test]
    fn remove_drops_held_item() {
        let mut w = World::new("test", 1);
        room(&mut w, 2);
        let p = w.spawn(ActorSpec::new(ActorKind::Player), IVec3::ZERO);
        let g = w.spawn(garbage(), IVec3::new(1, 0, 0));
        w.grab(p, g).unwrap();
        w.remove(p);
        let item = w.actor(g).unwrap();
        assert!(!item.is_hidden());
        assert!(item.held_by().is_none());
    }

    #[test]
    fn rekey_keeps_tile_reference() {
        let mut w = World::new("test", 1);
        room(&mut w, 2);
        let id = w.spawn(ActorSpec::new(ActorKind::Player), IVec3::ZERO);
        w.rekey(id, ActorId(99)).unwrap();
        assert!(w.actor(id).is_none());
        assert_eq!(w.actor(ActorId(99)).unwrap().id(), ActorId(99));
        assert_eq!(w.tile(IVec3::ZERO).unwrap().blocking(), Some(ActorId(99)));
        assert_eq!(w.next_id(), ActorId(100));
        assert_eq!(
            w.rekey(ActorId(5), ActorId(6)),
            Err(ActionError::UnknownActor(ActorId(5)))
        );
    }

    #[test]
    fn win_latches() {
        let mut w = World::new("test", 1);
        room(&mut w, 2);
        w.designate_win_tile(IVec3::new(1, 1, 0));
        w.designate_win_tile(IVec3::new(2, 2, 0));
        assert!(!w.check_win());
        let a = w.spawn(garbage(), IVec3::new(1, 1, 0));
        assert!(!w.has_won());
        w.spawn(garbage(), IVec3::new(2, 2, 0));
        assert!(w.has_won());
        assert!(w.events().contains(&WorldEvent::Won));
        w.hide(a);
        assert!(w.has_won());
    }

    #[test]
    fn no_goal_tiles_never_wins() {
        let mut w = World::new("test", 1);
        room(&mut w, 1);
        w.spawn(garbage(), IVec3::ZERO);
        assert!(!w.has_won());
    }

    #[test]
    fn appearance_priority_and_memory() {
        let mut w = World::new("test", 1);
        room(&mut w, 1);
        assert_eq!(w.appearance(IVec3::ZERO).as_deref(), Some("."));
        w.spawn(garbage(), IVec3::ZERO);
        assert_eq!(w.appearance(IVec3::ZERO).as_deref(), Some("%"));
        let p = w.spawn(ActorSpec::new(ActorKind::Player), IVec3::ZERO);
        assert_eq!(w.appearance(IVec3::ZERO).as_deref(), Some("@"));
        assert!(w.set_visible(IVec3::ZERO, false));
        w.remove(p);
        assert_eq!(w.appearance(IVec3::ZERO).as_deref(), Some("@"));
        w.set_visible(IVec3::ZERO, true);
        assert_eq!(w.appearance(IVec3::ZERO).as_deref(), Some("%"));
        assert!(w.appearance(IVec3::new(9, 9, 9)).is_none());
    }

    #[test]
    fn drain_events_clears_log() {
        let mut w = World::new("test", 1);
        room(&mut w, 1);
        w.spawn(garbage(), IVec3::ZERO);
        let events = w.drain_events();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], WorldEvent::Spawned { .. }));
        assert!(w.events().is_empty());
    }

    #[test]
    fn force_position_relocates_when_blocked() {
        let mut w = World::new("test", 1);
        room(&mut w, 2);
        let a = w.spawn(ActorSpec::new(ActorKind::Npc), IVec3::ZERO);
        let b = w.spawn(ActorSpec::new(ActorKind::Npc), IVec3::new(2, 2, 0));
        assert!(w.force_position(b, IVec3::ZERO));
        let pb = w.actor(b).unwrap().position();
        assert_ne!(pb, IVec3::ZERO);
        assert_eq!(w.actor(a).unwrap().position(), IVec3::ZERO);
        assert_eq!((pb).abs().max_element(), 1);
    }
}

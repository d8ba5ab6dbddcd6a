use crate::error::ActionError;
use crate::grid::{TileKey, neighbours4};
use crate::schedule::TaskKind;
use crate::tile::glyph;
use crate::world::{World, WorldEvent};
use gq_common::{ActorId, ActorKind, Occupancy, Position};
use glam::IVec3;
use serde::{Deserialize, Serialize};

/// How a bump between two blocking actors was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interaction {
    /// The other actor was shoved one tile further along the line of motion.
    Pushed,
    /// A player traded places with the other actor.
    Swapped,
    /// The other actor's custom hook ran.
    Hooked,
    Nothing,
}

impl World {
    /// Try to move `id` onto the tile at `target`.
    ///
    /// Closed doors open on contact. A blocking mover that bumps another
    /// blocking actor interacts with it first. Moving onto the tile the actor
    /// already occupies changes nothing and reports `false`.
    pub fn move_actor(&mut self, id: ActorId, target: Position) -> bool {
        let Some(actor) = self.actors.get(&id) else {
            return false;
        };
        if actor.held_by.is_some() {
            return false;
        }
        let (kind, from, on_grid) = (actor.kind, actor.position, actor.on_grid);
        let Some(tile) = self.tiles.get(target) else {
            tracing::trace!(%id, ?target, "no tile");
            return false;
        };
        if on_grid && from == target {
            return false;
        }

        if tile.is_closed_door() {
            self.open_door(target);
        }

        if kind.is_blocking() {
            let other = self.tiles.get(target).and_then(|t| t.blocking());
            if let Some(other) = other.filter(|&o| o != id) {
                if self.interact(id, other) == Interaction::Swapped {
                    return true;
                }
            }
        }

        if self.attach(id, target) {
            self.record(WorldEvent::Moved {
                id,
                from,
                to: target,
            });
            return true;
        }

        // A falling actor always lands somewhere.
        if self.actors.get(&id).is_some_and(|a| a.falling) {
            if let Some(spot) = self
                .find_free_spot(kind.occupancy(), target)
                .filter(|&s| s != target)
            {
                return self.move_actor(id, spot);
            }
        }
        false
    }

    /// Resolve a bump of `actor` into `other`: push, then swap, then hook.
    pub fn interact(&mut self, actor: ActorId, other: ActorId) -> Interaction {
        let (Some(a), Some(o)) = (self.actors.get(&actor), self.actors.get(&other)) else {
            return Interaction::Nothing;
        };
        let (a_pos, a_kind, a_falling, a_on_grid) = (a.position, a.kind, a.falling, a.on_grid);
        let (o_pos, o_pushable, o_on_grid) = (o.position, o.pushable, o.on_grid);
        let hook = o.hook.clone();
        let placed = a_on_grid && o_on_grid;

        let outcome = 'resolve: {
            if placed && o_pushable {
                let mirror = o_pos + (o_pos - a_pos);
                if self.move_actor(other, mirror) {
                    break 'resolve Interaction::Pushed;
                }
            }
            if placed
                && a_kind == ActorKind::Player
                && !a_falling
                && self.is_passable(a_pos)
                && self.is_passable(o_pos)
                && self.swap(actor, other)
            {
                break 'resolve Interaction::Swapped;
            }
            if let Some(hook) = hook {
                hook(self, actor, other);
                break 'resolve Interaction::Hooked;
            }
            Interaction::Nothing
        };

        if outcome != Interaction::Nothing {
            tracing::debug!(%actor, %other, ?outcome, "interaction");
            self.record(WorldEvent::Interacted {
                actor,
                other,
                outcome,
            });
        }
        outcome
    }

    /// Exchange the positions of two blocking actors.
    fn swap(&mut self, a: ActorId, b: ActorId) -> bool {
        let (Some(pa), Some(pb)) = (
            self.actors.get(&a).map(|x| x.position),
            self.actors.get(&b).map(|x| x.position),
        ) else {
            return false;
        };
        let (Some(ta), Some(tb)) = (TileKey::pack(pa), TileKey::pack(pb)) else {
            return false;
        };
        if ta == tb {
            return false;
        }
        let mut floor_a = false;
        if let Some(tile) = self.tiles.get_mut(pa) {
            tile.remove(a);
            tile.place(b, Occupancy::Blocking);
            floor_a = tile.has_floor();
        }
        let mut floor_b = false;
        if let Some(tile) = self.tiles.get_mut(pb) {
            tile.remove(b);
            tile.place(a, Occupancy::Blocking);
            floor_b = tile.has_floor();
        }
        if let Some(x) = self.actors.get_mut(&a) {
            x.position = pb;
        }
        if let Some(x) = self.actors.get_mut(&b) {
            x.position = pa;
        }
        self.record(WorldEvent::Moved {
            id: a,
            from: pa,
            to: pb,
        });
        self.record(WorldEvent::Moved {
            id: b,
            from: pb,
            to: pa,
        });
        self.settle(a, floor_b);
        self.settle(b, floor_a);
        true
    }

    /// Move by a relative offset. Changing level requires standing on the
    /// matching staircase.
    pub fn step(&mut self, id: ActorId, delta: IVec3) -> bool {
        let Some(actor) = self.actors.get(&id) else {
            return false;
        };
        if !actor.on_grid {
            return false;
        }
        let here = actor.position;
        let glyph_here = self.tiles.get(here).map(|t| t.glyph());
        let allowed = match delta.z {
            z if z < 0 => glyph_here == Some(glyph::STAIRS_DOWN),
            z if z > 0 => glyph_here == Some(glyph::STAIRS_UP),
            _ => true,
        };
        if !allowed {
            tracing::trace!(%id, ?delta, "not on stairs");
            return false;
        }
        self.move_actor(id, here + delta)
    }

    /// Nearest passable tile on `near`'s level that can host `class`,
    /// searching square rings of growing radius. Positions outside the tile
    /// key range have no neighbourhood.
    pub fn find_free_spot(&self, class: Occupancy, near: Position) -> Option<Position> {
        TileKey::pack(near)?;
        for d in 0..self.config.landing_rings {
            for dy in -d..=d {
                for dx in -d..=d {
                    if dx.abs() != d && dy.abs() != d {
                        continue;
                    }
                    let p = near + IVec3::new(dx, dy, 0);
                    let free = self
                        .tiles
                        .get(p)
                        .is_some_and(|t| t.is_passable() && t.can_host(class));
                    if free {
                        return Some(p);
                    }
                }
            }
        }
        None
    }

    /// Pick up `item`. Anything already held is put down first.
    pub fn grab(&mut self, holder: ActorId, item: ActorId) -> Result<(), ActionError> {
        if holder == item {
            return Err(ActionError::SelfGrab(holder));
        }
        let h = self.actors.get(&holder).ok_or(ActionError::UnknownActor(holder))?;
        let previous = h.holding;
        let it = self.actors.get(&item).ok_or(ActionError::UnknownActor(item))?;
        if it.kind.is_blocking() {
            return Err(ActionError::NotCarriable {
                item,
                kind: it.kind,
            });
        }
        match it.held_by {
            Some(current) if current == holder => return Ok(()),
            Some(current) => {
                return Err(ActionError::AlreadyHeld {
                    item,
                    holder: current,
                });
            }
            None => {}
        }
        let item_pos = it.position;

        let mut stranded = None;
        if let Some(prev) = previous {
            if !self.drop_held(holder, None) {
                stranded = Some(prev);
            }
        }

        self.hide(item);
        if let Some(prev) = stranded {
            // The grabbed item's tile just freed up.
            self.release_from_holder(prev);
            self.show(prev, item_pos);
        }
        if let Some(h) = self.actors.get_mut(&holder) {
            h.holding = Some(item);
        }
        if let Some(it) = self.actors.get_mut(&item) {
            it.held_by = Some(holder);
        }
        tracing::debug!(%holder, %item, "grabbed");
        self.record(WorldEvent::Grabbed { holder, item });
        Ok(())
    }

    /// Put the held item down on the nearest free tile to `target`, or to
    /// the holder when no target is given.
    pub fn drop_held(&mut self, holder: ActorId, target: Option<Position>) -> bool {
        let Some(h) = self.actors.get(&holder) else {
            return false;
        };
        let Some(item) = h.holding else {
            return false;
        };
        let anchor = target.unwrap_or(h.position);
        let Some(class) = self.actors.get(&item).map(|a| a.kind.occupancy()) else {
            return false;
        };
        let Some(spot) = self.find_free_spot(class, anchor) else {
            tracing::debug!(%holder, %item, ?anchor, "nowhere to drop");
            return false;
        };

        self.release_from_holder(item);
        if !self.attach(item, spot) {
            if let Some(h) = self.actors.get_mut(&holder) {
                h.holding = Some(item);
            }
            if let Some(it) = self.actors.get_mut(&item) {
                it.held_by = Some(holder);
            }
            return false;
        }
        self.record(WorldEvent::Shown {
            id: item,
            position: spot,
        });
        self.record(WorldEvent::Dropped {
            holder,
            item,
            position: spot,
        });
        true
    }

    /// First orthogonal neighbour of the actor that has no floor.
    pub fn adjacent_drop_shaft(&self, id: ActorId) -> Option<Position> {
        let actor = self.actors.get(&id).filter(|a| a.on_grid)?;
        neighbours4(actor.position)
            .into_iter()
            .find(|&p| self.tiles.get(p).is_some_and(|t| !t.has_floor()))
    }

    fn open_door(&mut self, position: Position) {
        let opened = self
            .tiles
            .get_mut(position)
            .is_some_and(|t| t.open_door());
        if !opened {
            return;
        }
        tracing::trace!(?position, "door opened");
        self.record(WorldEvent::DoorOpened { position });
        if let Some(key) = TileKey::pack(position) {
            let period = self.config.door_close_period;
            self.scheduler.schedule(TaskKind::DoorClose(key), period);
        }
    }

    /// Drop a falling actor one level. With nothing below, the fall ends
    /// where it is.
    pub(crate) fn fall_one_level(&mut self, id: ActorId) {
        let Some(actor) = self.actors.get(&id) else {
            return;
        };
        let below = actor.position - IVec3::Z;
        if self.tiles.contains(below) {
            self.move_actor(id, below);
            return;
        }
        tracing::warn!(%id, ?below, "fell out of the dungeon; stopping");
        if let Some(actor) = self.actors.get_mut(&id) {
            actor.falling = false;
        }
        self.scheduler.cancel(TaskKind::Fall(id));
    }
}

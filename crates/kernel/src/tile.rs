use gq_common::{ActorId, Occupancy, Position};
use std::collections::{BTreeSet, VecDeque};

/// Base glyphs used by generation and movement rules.
pub mod glyph {
    pub const WALL: char = '#';
    pub const FLOOR: char = '.';
    pub const DOOR_CLOSED: char = '+';
    pub const DOOR_OPEN: char = '\'';
    pub const STAIRS_UP: char = '<';
    pub const STAIRS_DOWN: char = '>';
    /// Nothing underfoot: chutes and shafts.
    pub const NO_FLOOR: char = ' ';
}

/// Classification tags attached to a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TileTag {
    Wall,
    Floor,
    Room,
    Corridor,
    Core,
    Door,
    Open,
    StairsUp,
    StairsDown,
    Chute,
    Goal,
}

/// One addressable grid cell.
///
/// Occupants are referenced by id; the world keeps each actor's position in
/// step with the slot that holds it.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    position: Position,
    glyph: char,
    tags: BTreeSet<TileTag>,
    passable: bool,
    replaceable: bool,
    blocking: Option<ActorId>,
    ground_item: Option<ActorId>,
    /// Most recent first.
    passive: VecDeque<ActorId>,
    visible: bool,
    last_seen: String,
}

impl Tile {
    /// Bare tile with no tags and no occupants.
    pub fn new(position: Position, glyph: char, passable: bool, replaceable: bool) -> Self {
        Self {
            position,
            glyph,
            tags: BTreeSet::new(),
            passable,
            replaceable,
            blocking: None,
            ground_item: None,
            passive: VecDeque::new(),
            visible: true,
            last_seen: glyph.to_string(),
        }
    }

    /// Add tags while building a tile.
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = TileTag>) -> Self {
        self.tags.extend(tags);
        self
    }

    /// Impassable wall, replaceable by later carving.
    pub fn wall(position: Position) -> Self {
        Self::new(position, glyph::WALL, false, true).with_tags([TileTag::Wall])
    }

    /// Plain walkable floor.
    pub fn floor(position: Position) -> Self {
        Self::new(position, glyph::FLOOR, true, false).with_tags([TileTag::Floor])
    }

    /// Closed door. Passable; opens on contact.
    pub fn door(position: Position) -> Self {
        Self::new(position, glyph::DOOR_CLOSED, true, true).with_tags([TileTag::Floor, TileTag::Door])
    }

    /// Staircase to the level above.
    pub fn stairs_up(position: Position) -> Self {
        Self::new(position, glyph::STAIRS_UP, true, false).with_tags([TileTag::StairsUp])
    }

    /// Staircase to the level below.
    pub fn stairs_down(position: Position) -> Self {
        Self::new(position, glyph::STAIRS_DOWN, true, false).with_tags([TileTag::StairsDown])
    }

    /// Open shaft: passable, nothing to stand on.
    pub fn chute(position: Position) -> Self {
        Self::new(position, glyph::NO_FLOOR, true, false).with_tags([TileTag::Chute])
    }

    /// Where this tile sits.
    pub fn position(&self) -> Position {
        self.position
    }

    /// Base glyph, which also feeds the content hash.
    pub fn glyph(&self) -> char {
        self.glyph
    }

    pub fn tags(&self) -> &BTreeSet<TileTag> {
        &self.tags
    }

    /// Whether the tile carries `tag`.
    pub fn has_tag(&self, tag: TileTag) -> bool {
        self.tags.contains(&tag)
    }

    /// Whether blocking actors may stand here.
    pub fn is_passable(&self) -> bool {
        self.passable
    }

    /// Whether generation may overwrite this tile.
    pub fn is_replaceable(&self) -> bool {
        self.replaceable
    }

    pub fn set_replaceable(&mut self, replaceable: bool) {
        self.replaceable = replaceable;
    }

    /// False for chutes and other drops.
    pub fn has_floor(&self) -> bool {
        self.glyph != glyph::NO_FLOOR
    }

    /// Open or closed door.
    pub fn is_door(&self) -> bool {
        self.has_tag(TileTag::Door)
    }

    pub fn is_closed_door(&self) -> bool {
        self.is_door() && !self.has_tag(TileTag::Open)
    }

    pub fn is_open_door(&self) -> bool {
        self.is_door() && self.has_tag(TileTag::Open)
    }

    /// Open a closed door. Returns whether anything changed.
    pub fn open_door(&mut self) -> bool {
        if !self.is_closed_door() {
            return false;
        }
        self.glyph = glyph::DOOR_OPEN;
        self.tags.insert(TileTag::Open);
        true
    }

    /// Close an open door. Returns whether anything changed.
    pub fn close_door(&mut self) -> bool {
        if !self.is_open_door() {
            return false;
        }
        self.glyph = glyph::DOOR_CLOSED;
        self.tags.remove(&TileTag::Open);
        true
    }

    /// Turn a door into plain floor, keeping its occupants.
    pub fn demote_to_floor(&mut self) {
        self.glyph = glyph::FLOOR;
        self.tags.remove(&TileTag::Door);
        self.tags.remove(&TileTag::Open);
        self.tags.insert(TileTag::Floor);
        self.passable = true;
    }

    /// The blocking occupant, if any.
    pub fn blocking(&self) -> Option<ActorId> {
        self.blocking
    }

    /// The item lying here, if any.
    pub fn ground_item(&self) -> Option<ActorId> {
        self.ground_item
    }

    /// Passive occupants, most recent first.
    pub fn passive(&self) -> impl Iterator<Item = ActorId> + '_ {
        self.passive.iter().copied()
    }

    /// Ids of everything on this tile in rendering priority order.
    pub fn occupants(&self) -> Vec<ActorId> {
        self.blocking
            .into_iter()
            .chain(self.ground_item)
            .chain(self.passive.iter().copied())
            .collect()
    }

    /// No occupants of any class.
    pub fn is_unoccupied(&self) -> bool {
        self.blocking.is_none() && self.ground_item.is_none() && self.passive.is_empty()
    }

    /// Whether `id` occupies this tile.
    pub fn holds(&self, id: ActorId) -> bool {
        self.blocking == Some(id) || self.ground_item == Some(id) || self.passive.contains(&id)
    }

    /// Whether `place` would succeed for an actor of this class.
    pub fn can_host(&self, class: Occupancy) -> bool {
        match class {
            Occupancy::Blocking => self.passable && self.blocking.is_none(),
            Occupancy::Item => self.ground_item.is_none(),
            Occupancy::Passive => true,
        }
    }

    /// Add an occupant in its class slot. Fails when the slot is taken or,
    /// for blocking actors, when the tile is impassable.
    pub fn place(&mut self, id: ActorId, class: Occupancy) -> bool {
        if !self.can_host(class) {
            return false;
        }
        match class {
            Occupancy::Blocking => self.blocking = Some(id),
            Occupancy::Item => self.ground_item = Some(id),
            Occupancy::Passive => self.passive.push_front(id),
        }
        true
    }

    /// Clear whichever slot holds `id`. Returns false if it was not here.
    pub fn remove(&mut self, id: ActorId) -> bool {
        if self.blocking == Some(id) {
            self.blocking = None;
            true
        } else if self.ground_item == Some(id) {
            self.ground_item = None;
            true
        } else if let Some(index) = self.passive.iter().position(|&p| p == id) {
            self.passive.remove(index);
            true
        } else {
            false
        }
    }

    /// Swap an occupant's id in place.
    pub(crate) fn rename_occupant(&mut self, old: ActorId, new: ActorId) {
        if self.blocking == Some(old) {
            self.blocking = Some(new);
        }
        if self.ground_item == Some(old) {
            self.ground_item = Some(new);
        }
        for p in self.passive.iter_mut() {
            if *p == old {
                *p = new;
            }
        }
    }

    /// Id whose art is shown here, if any.
    pub fn top_occupant(&self) -> Option<ActorId> {
        self.blocking
            .or(self.ground_item)
            .or_else(|| self.passive.front().copied())
    }

    /// Whether the tile is currently in view.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Appearance remembered from the last time the tile was in view.
    pub fn last_seen(&self) -> &str {
        &self.last_seen
    }

    pub(crate) fn set_visibility(&mut self, visible: bool, appearance: String) {
        if self.visible && !visible {
            self.last_seen = appearance;
        }
        self.visible = visible;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::IVec3;

    fn floor() -> Tile {
        Tile::floor(IVec3::ZERO)
    }

    #[test]
    fn one_blocking_actor_per_tile() {
        let mut t = floor();
        assert!(t.place(ActorId(1), Occupancy::Blocking));
        assert!(!t.place(ActorId(2), Occupancy::Blocking));
        assert_eq!(t.blocking(), Some(ActorId(1)));
    }

    #[test]
    fn walls_refuse_blocking_but_accept_items() {
        let mut t = Tile::wall(IVec3::ZERO);
        assert!(!t.place(ActorId(1), Occupancy::Blocking));
        assert!(t.place(ActorId(2), Occupancy::Item));
    }

    #[test]
    fn one_ground_item_per_tile() {
        let mut t = floor();
        assert!(t.place(ActorId(1), Occupancy::Item));
        assert!(!t.place(ActorId(2), Occupancy::Item));
    }

    #[test]
    fn passive_stack_is_most_recent_first() {
        let mut t = floor();
        assert!(t.place(ActorId(1), Occupancy::Passive));
        assert!(t.place(ActorId(2), Occupancy::Passive));
        assert_eq!(t.passive().collect::<Vec<_>>(), vec![ActorId(2), ActorId(1)]);
        assert_eq!(t.top_occupant(), Some(ActorId(2)));
    }

    #[test]
    fn rendering_priority() {
        let mut t = floor();
        t.place(ActorId(3), Occupancy::Passive);
        assert_eq!(t.top_occupant(), Some(ActorId(3)));
        t.place(ActorId(2), Occupancy::Item);
        assert_eq!(t.top_occupant(), Some(ActorId(2)));
        t.place(ActorId(1), Occupancy::Blocking);
        assert_eq!(t.top_occupant(), Some(ActorId(1)));
        assert_eq!(t.occupants(), vec![ActorId(1), ActorId(2), ActorId(3)]);
    }

    #[test]
    fn remove_clears_matching_slot() {
        let mut t = floor();
        t.place(ActorId(1), Occupancy::Blocking);
        t.place(ActorId(2), Occupancy::Item);
        t.place(ActorId(3), Occupancy::Passive);
        assert!(t.remove(ActorId(2)));
        assert!(t.ground_item().is_none());
        assert!(t.remove(ActorId(3)));
        assert!(!t.remove(ActorId(3)));
        assert!(t.remove(ActorId(1)));
        assert!(t.is_unoccupied());
    }

    #[test]
    fn door_open_close_cycle() {
        let mut t = Tile::door(IVec3::ZERO);
        assert!(t.is_closed_door());
        assert!(t.open_door());
        assert_eq!(t.glyph(), glyph::DOOR_OPEN);
        assert!(!t.open_door());
        assert!(t.close_door());
        assert_eq!(t.glyph(), glyph::DOOR_CLOSED);
        t.demote_to_floor();
        assert!(!t.is_door());
        assert_eq!(t.glyph(), glyph::FLOOR);
    }

    #[test]
    fn chute_has_no_floor() {
        assert!(!Tile::chute(IVec3::ZERO).has_floor());
        assert!(Tile::chute(IVec3::ZERO).is_passable());
        assert!(floor().has_floor());
    }

    #[test]
    fn last_seen_captured_when_hidden() {
        let mut t = floor();
        t.set_visibility(false, "@".into());
        assert_eq!(t.last_seen(), "@");
        t.set_visibility(false, "x".into());
        assert_eq!(t.last_seen(), "@");
    }
}

use glam::IVec3;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Integer grid coordinate: x and y span a level, z selects the level.
pub type Position = IVec3;

/// Where hidden actors are parked. No tile is ever generated here.
pub const OFF_GRID: Position = IVec3::new(-1_000_000, -1_000_000, -1_000_000);

/// Identifier of an actor, unique within one world.
///
/// Allocated from a monotonic per-world counter, so ordering by id is
/// ordering by registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(pub u32);

impl ActorId {
    /// The id that follows this one.
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which occupancy slot of a tile an actor competes for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occupancy {
    /// At most one per tile, and only on passable tiles.
    Blocking,
    /// At most one per tile; passability is irrelevant.
    Item,
    /// Unlimited, stacked most-recent-first.
    Passive,
}

/// Kind tag carried by every actor and exchanged on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActorKind {
    #[serde(rename = "player")]
    Player,
    #[serde(rename = "npc-entity")]
    Npc,
    #[serde(rename = "garbage-item")]
    Garbage,
    #[serde(rename = "furniture")]
    Furniture,
    #[serde(rename = "decoration")]
    Decoration,
}

impl ActorKind {
    /// Which tile slot actors of this kind use.
    pub fn occupancy(self) -> Occupancy {
        match self {
            Self::Player | Self::Npc | Self::Furniture => Occupancy::Blocking,
            Self::Garbage => Occupancy::Item,
            Self::Decoration => Occupancy::Passive,
        }
    }

    /// Players, creatures and furniture.
    pub fn is_blocking(self) -> bool {
        self.occupancy() == Occupancy::Blocking
    }

    pub fn is_item(self) -> bool {
        self.occupancy() == Occupancy::Item
    }

    /// Wire name of this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::Npc => "npc-entity",
            Self::Garbage => "garbage-item",
            Self::Furniture => "furniture",
            Self::Decoration => "decoration",
        }
    }

    /// Default display art for actors that do not carry their own.
    pub fn default_art(self) -> &'static str {
        match self {
            Self::Player => "@",
            Self::Npc => "&",
            Self::Garbage => "*",
            Self::Furniture => "?",
            Self::Decoration => "~",
        }
    }
}

impl fmt::Display for ActorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown actor kind: {0:?}")]
pub struct UnknownKind(pub String);

impl FromStr for ActorKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "player" => Ok(Self::Player),
            "npc-entity" | "entity" => Ok(Self::Npc),
            "garbage-item" | "garbage" => Ok(Self::Garbage),
            "furniture" => Ok(Self::Furniture),
            "decoration" | "thing" => Ok(Self::Decoration),
            other => Err(UnknownKind(other.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn occupancy_classes() {
        assert_eq!(ActorKind::Player.occupancy(), Occupancy::Blocking);
        assert_eq!(ActorKind::Furniture.occupancy(), Occupancy::Blocking);
        assert_eq!(ActorKind::Garbage.occupancy(), Occupancy::Item);
        assert_eq!(ActorKind::Decoration.occupancy(), Occupancy::Passive);
    }

    #[test]
    fn kind_wire_names_parse_back() {
        for kind in [
            ActorKind::Player,
            ActorKind::Npc,
            ActorKind::Garbage,
            ActorKind::Furniture,
            ActorKind::Decoration,
        ] {
            assert_eq!(kind.as_str().parse::<ActorKind>(), Ok(kind));
        }
        assert!("dragon".parse::<ActorKind>().is_err());
    }

    #[test]
    fn legacy_kind_names_accepted() {
        assert_eq!("garbage".parse::<ActorKind>(), Ok(ActorKind::Garbage));
        assert_eq!("entity".parse::<ActorKind>(), Ok(ActorKind::Npc));
    }

    #[test]
    fn off_grid_is_far_away() {
        assert!(OFF_GRID.x < -100_000);
        assert_eq!(ActorId(4).next(), ActorId(5));
    }
}

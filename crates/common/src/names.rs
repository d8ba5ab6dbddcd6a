//! Cosmetic name generation for players and sessions.

use crate::random::RandomSource;

const NAME_PREFIXES: &[&str] = &[
    "Orange", "Yellow", "Blue", "Green", "Purple", "Violet", "Red", "Indigo", "Wooden", "Grassy",
];

const NAME_SUFFIXES: &[&str] = &[
    "Cat", "Dog", "Mouse", "Pie", "Cereal", "Squash", "Pigeon", "Dove", "Phone", "Sock", "Couch",
];

const STREETS: &[&str] = &[
    "Fake", "Cool", "Gamer", "Spiffy", "Long", "Short", "King", "Queen", "Fuzzy", "Damp",
];

const STREET_TYPES: &[&str] = &["road", "street", "crescent", "boulevard"];

/// A player name such as "Orange Cat".
pub fn player_name(rng: &mut dyn RandomSource) -> String {
    let prefix = NAME_PREFIXES[rng.index(NAME_PREFIXES.len())];
    let suffix = NAME_SUFFIXES[rng.index(NAME_SUFFIXES.len())];
    format!("{prefix} {suffix}")
}

/// A session name such as "Damp crescent".
pub fn street_name(rng: &mut dyn RandomSource) -> String {
    let street = STREETS[rng.index(STREETS.len())];
    let kind = STREET_TYPES[rng.index(STREET_TYPES.len())];
    format!("{street} {kind}")
}

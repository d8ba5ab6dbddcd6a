use gq_common::{ActorKind, RandomSource};
use gq_kernel::ActorSpec;

/// A named piece of content and how it is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    pub name: &'static str,
    pub art: &'static str,
}

const fn entry(name: &'static str, art: &'static str) -> CatalogEntry {
    CatalogEntry { name, art }
}

pub const GARBAGE: &[CatalogEntry] = &[
    entry("banana", "🍌"),
    entry("waste", "💩"),
    entry("lost socks", "🧦"),
    entry("useless floppy disk", "💾"),
    entry("used bandage", "🩹"),
    entry("funged token", "💸"),
    entry("unexplained moistness", "💦"),
    entry("old pizza", "🍕"),
    entry("glitter", "✨"),
    entry("worthless rock", "💎"),
    entry("spam", "📧"),
    entry("bad album", "💿"),
];

pub const FURNITURE: &[CatalogEntry] = &[
    entry("Toilet", "🚽"),
    entry("Bed", "🛏"),
    entry("Chair", "🪑"),
    entry("Bathtub", "🛁"),
    entry("TV", "📺"),
    entry("Radio", "📻"),
    entry("Telephone", "☎"),
];

fn lookup(table: &[CatalogEntry], name: &str) -> Option<CatalogEntry> {
    table.iter().copied().find(|e| e.name == name)
}

fn garbage_from(entry: CatalogEntry) -> ActorSpec {
    ActorSpec::new(ActorKind::Garbage).art(entry.art).name(entry.name)
}

/// A named piece of garbage, if the catalog knows it.
pub fn garbage(name: &str) -> Option<ActorSpec> {
    lookup(GARBAGE, name).map(garbage_from)
}

/// Any piece of garbage from the table.
pub fn random_garbage(rng: &mut dyn RandomSource) -> ActorSpec {
    garbage_from(GARBAGE[rng.index(GARBAGE.len())])
}

/// Pushable furniture. Unknown names still make furniture, drawn as `?`.
pub fn furniture(name: &str) -> ActorSpec {
    let art = lookup(FURNITURE, name).map_or("?", |e| e.art);
    ActorSpec::new(ActorKind::Furniture)
        .art(art)
        .name(name)
        .pushable(true)
}

/// Any furniture from the table.
pub fn random_furniture(rng: &mut dyn RandomSource) -> ActorSpec {
    furniture(FURNITURE[rng.index(FURNITURE.len())].name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gq_common::SeededRandom;

    #[test]
    fn named_garbage() {
        let spec = garbage("old pizza").unwrap();
        assert_eq!(spec.kind, ActorKind::Garbage);
        assert_eq!(spec.art.as_deref(), Some("🍕"));
        assert!(garbage("banana").is_some());
        assert!(garbage("Toilet").is_none());
    }

    #[test]
    fn random_garbage_comes_from_the_table() {
        let mut rng = SeededRandom::new(5);
        let name = random_garbage(&mut rng).name.unwrap();
        assert!(garbage(&name).is_some());
    }

    #[test]
    fn furniture_is_pushable() {
        let bed = furniture("Bed");
        assert!(bed.pushable);
        assert_eq!(bed.kind, ActorKind::Furniture);
        assert_eq!(bed.art.as_deref(), Some("🛏"));
        assert_eq!(furniture("Piano").art.as_deref(), Some("?"));
    }

    #[test]
    fn random_picks_are_seeded() {
        let picks = |seed| {
            let mut rng = SeededRandom::new(seed);
            (0..8)
                .map(|_| random_furniture(&mut rng).name.unwrap())
                .collect::<Vec<_>>()
        };
        assert_eq!(picks(11), picks(11));
    }
}

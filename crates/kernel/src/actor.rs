use crate::world::World;
use gq_common::{ActorId, ActorKind, OFF_GRID, Position};
use std::fmt;
use std::sync::Arc;

/// Custom interaction run when another actor bumps into the owner.
///
/// Called as `hook(world, acting, owner)`.
pub type InteractHook = Arc<dyn Fn(&mut World, ActorId, ActorId) + Send + Sync>;

/// Vertical status of an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalStatus {
    Idle,
    Falling,
}

/// Everything needed to register a new actor.
#[derive(Clone)]
pub struct ActorSpec {
    pub kind: ActorKind,
    pub art: Option<String>,
    pub name: Option<String>,
    pub pushable: bool,
    pub hook: Option<InteractHook>,
}

impl ActorSpec {
    /// Spec for an actor of `kind` with default art.
    pub fn new(kind: ActorKind) -> Self {
        Self {
            kind,
            art: None,
            name: None,
            pushable: false,
            hook: None,
        }
    }

    /// Override the default art.
    pub fn art(mut self, art: impl Into<String>) -> Self {
        self.art = Some(art.into());
        self
    }

    /// Give the actor a display name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Allow other actors to push this one.
    pub fn pushable(mut self, pushable: bool) -> Self {
        self.pushable = pushable;
        self
    }

    /// Run `hook` when something bumps into this actor.
    pub fn on_interact(mut self, hook: InteractHook) -> Self {
        self.hook = Some(hook);
        self
    }
}

impl fmt::Debug for ActorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorSpec")
            .field("kind", &self.kind)
            .field("art", &self.art)
            .field("name", &self.name)
            .field("pushable", &self.pushable)
            .field("hook", &self.hook.is_some())
            .finish()
    }
}

/// Anything id-bearing that lives on (or is carried around) the grid.
#[derive(Clone)]
pub struct Actor {
    pub(crate) id: ActorId,
    pub(crate) kind: ActorKind,
    pub(crate) art: String,
    pub(crate) name: Option<String>,
    pub(crate) position: Position,
    pub(crate) on_grid: bool,
    pub(crate) holding: Option<ActorId>,
    pub(crate) held_by: Option<ActorId>,
    pub(crate) falling: bool,
    pub(crate) pushable: bool,
    pub(crate) hook: Option<InteractHook>,
}

impl Actor {
    pub(crate) fn from_spec(id: ActorId, spec: ActorSpec) -> Self {
        let art = spec
            .art
            .unwrap_or_else(|| spec.kind.default_art().to_owned());
        Self {
            id,
            kind: spec.kind,
            art,
            name: spec.name,
            position: OFF_GRID,
            on_grid: false,
            holding: None,
            held_by: None,
            falling: false,
            pushable: spec.pushable,
            hook: spec.hook,
        }
    }

    pub fn id(&self) -> ActorId {
        self.id
    }

    /// Kind tag.
    pub fn kind(&self) -> ActorKind {
        self.kind
    }

    /// Text drawn for this actor.
    pub fn art(&self) -> &str {
        &self.art
    }

    /// Display name, if one was given.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Name if set, kind otherwise.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(self.kind.as_str())
    }

    /// Grid position; [`OFF_GRID`] while hidden.
    pub fn position(&self) -> Position {
        self.position
    }

    /// Off the grid: held, removed from view, or never placed.
    pub fn is_hidden(&self) -> bool {
        !self.on_grid
    }

    /// Item this actor carries.
    pub fn holding(&self) -> Option<ActorId> {
        self.holding
    }

    /// Actor carrying this one.
    pub fn held_by(&self) -> Option<ActorId> {
        self.held_by
    }

    /// Whether a fall is in progress.
    pub fn is_falling(&self) -> bool {
        self.falling
    }

    /// Idle or falling.
    pub fn vertical_status(&self) -> VerticalStatus {
        if self.falling {
            VerticalStatus::Falling
        } else {
            VerticalStatus::Idle
        }
    }

    /// Whether bumping into this actor pushes it.
    pub fn is_pushable(&self) -> bool {
        self.pushable
    }

    pub fn has_hook(&self) -> bool {
        self.hook.is_some()
    }
}

impl fmt::Debug for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Actor")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("art", &self.art)
            .field("name", &self.name)
            .field("position", &self.position)
            .field("on_grid", &self.on_grid)
            .field("holding", &self.holding)
            .field("falling", &self.falling)
            .field("pushable", &self.pushable)
            .finish_non_exhaustive()
    }
}

use crate::error::ProtocolError;
use crate::messages::{
    ActorUpdate, EntityDetails, GameId, GameList, GameRequest, KIND_YOU, Message, NameAssignment,
    STATUS_DISCONNECTED, STATUS_HIDDEN, STATUS_SHOW, SessionDetails, SpawnDetails, UpdateBundle,
};
use glam::IVec3;
use gq_common::{ActorId, ActorKind, EntropyRandom, Position, names};
use gq_kernel::{ActorSpec, TileKey, World, WorldEvent};
use gq_mapgen::{Generator, catalog};
use std::collections::VecDeque;

/// Where the client is in the join handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    /// Asked the relay for its game list.
    Browsing,
    /// Sent a join request; waiting for session details.
    Joining { game: GameId },
    /// In a game. The id is unknown to a creator until the relay names it.
    Playing { game: Option<GameId> },
}

impl SessionState {
    fn label(self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Browsing => "browsing",
            SessionState::Joining { .. } => "joining",
            SessionState::Playing { .. } => "playing",
        }
    }
}

/// Things the front end should know about.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    GamesListed(GameList),
    Joined { game: GameId, local: ActorId },
    /// The advertised world hash differs from ours. We keep playing on the
    /// local copy.
    HashMismatch { advertised: u32, computed: u32 },
    PlayerJoined(ActorId),
    PlayerLeft(ActorId),
    Chat { from: ActorId, key: String },
    NameAssigned(NameAssignment),
    Won,
}

/// Client side of the relay protocol, without any I/O.
///
/// Feed inbound text to [`Session::handle`], call local actions, and send
/// whatever [`Session::take_outbound`] hands back.
pub struct Session {
    state: SessionState,
    generator: Generator,
    world: Option<World>,
    local: Option<ActorId>,
    player_name: String,
    art: u32,
    win_seen: bool,
    outbound: VecDeque<Message>,
}

impl Session {
    /// Idle session with a random player name.
    pub fn new(generator: Generator) -> Self {
        let player_name = names::player_name(&mut EntropyRandom);
        Self {
            state: SessionState::Idle,
            generator,
            world: None,
            local: None,
            player_name,
            art: 0,
            win_seen: false,
            outbound: VecDeque::new(),
        }
    }

    /// Use a fixed name and avatar instead of random ones.
    pub fn with_identity(mut self, name: impl Into<String>, art: u32) -> Self {
        self.player_name = name.into();
        self.art = art;
        self
    }

    /// Current handshake state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The local world, once created or joined.
    pub fn world(&self) -> Option<&World> {
        self.world.as_ref()
    }

    /// This client's avatar.
    pub fn local_actor(&self) -> Option<ActorId> {
        self.local
    }

    /// Display name sent with join requests.
    pub fn player_name(&self) -> &str {
        &self.player_name
    }

    /// Messages waiting to go to the relay, oldest first.
    pub fn take_outbound(&mut self) -> Vec<Message> {
        self.outbound.drain(..).collect()
    }

    fn send(&mut self, message: Message) {
        tracing::trace!(kind = message.request_type(), "queued outbound");
        self.outbound.push_back(message);
    }

    fn invalid(&self, op: &'static str) -> ProtocolError {
        ProtocolError::InvalidState {
            op,
            state: self.state.label(),
        }
    }

    // --- Handshake ---

    /// Ask the relay for its game list.
    pub fn request_games(&mut self) -> Result<(), ProtocolError> {
        match self.state {
            SessionState::Idle | SessionState::Browsing => {
                self.state = SessionState::Browsing;
                self.send(Message::Request(GameRequest::games()));
                Ok(())
            }
            _ => Err(self.invalid("list games")),
        }
    }

    /// Ask to join `game`; the world arrives with the session details.
    pub fn join(&mut self, game: GameId) -> Result<(), ProtocolError> {
        match self.state {
            SessionState::Idle | SessionState::Browsing => {
                tracing::info!(game, name = %self.player_name, "joining game");
                self.state = SessionState::Joining { game };
                let request = GameRequest::join(game, self.player_name.clone(), self.art);
                self.send(Message::Request(request));
                Ok(())
            }
            _ => Err(self.invalid("join")),
        }
    }

    /// Generate a fresh world locally and announce it to the relay.
    pub fn create(&mut self, name: &str, seed: u64) -> Result<ActorId, ProtocolError> {
        if !matches!(self.state, SessionState::Idle | SessionState::Browsing) {
            return Err(self.invalid("create"));
        }
        let mut world = self.generator.generate(name, seed).world;
        let spec = ActorSpec::new(ActorKind::Player).name(self.player_name.clone());
        let local = world.spawn(spec, IVec3::ZERO);
        world.drain_events();

        let details = SessionDetails {
            name: name.to_owned(),
            seed,
            hash: world.content_hash(),
            id: 0,
            entities: entity_list(&world, |_| true),
            creator_id: Some(local),
        };
        tracing::info!(name, seed, hash = details.hash, %local, "created game");
        self.world = Some(world);
        self.local = Some(local);
        self.win_seen = false;
        self.state = SessionState::Playing { game: None };
        self.send(Message::SessionDetails(details));
        Ok(local)
    }

    /// Abandon whatever is in progress and return to idle. Nothing is sent.
    pub fn cancel(&mut self) {
        if self.state != SessionState::Idle {
            tracing::info!(state = self.state.label(), "session cancelled");
        }
        self.state = SessionState::Idle;
        self.world = None;
        self.local = None;
        self.win_seen = false;
        self.outbound.clear();
    }

    /// Session details for this game without any players, suitable for
    /// caching and re-creating the layout later.
    pub fn cached_layout(&self) -> Option<SessionDetails> {
        let world = self.world.as_ref()?;
        let game = match self.state {
            SessionState::Playing { game } => game.unwrap_or(0),
            _ => 0,
        };
        Some(SessionDetails {
            name: world.name().to_owned(),
            seed: world.seed(),
            hash: world.content_hash(),
            id: game,
            entities: entity_list(world, |k| k != ActorKind::Player),
            creator_id: None,
        })
    }

    // --- Inbound ---

    /// Apply one inbound message. Malformed or unexpected input is logged
    /// and dropped.
    pub fn handle(&mut self, raw: &str) -> Vec<SessionEvent> {
        let message = match Message::decode(raw) {
            Ok(m) => m,
            Err(err) => {
                tracing::warn!(%err, "dropping malformed message");
                return Vec::new();
            }
        };
        self.handle_message(message)
    }

    /// Apply an already decoded message.
    pub fn handle_message(&mut self, message: Message) -> Vec<SessionEvent> {
        let _span = tracing::debug_span!("inbound", kind = message.request_type()).entered();
        let mut events = Vec::new();
        match (self.state, message) {
            (_, Message::GameList(list)) => events.push(SessionEvent::GamesListed(list)),
            (SessionState::Joining { game }, Message::SessionDetails(details)) => {
                self.enter_game(game, details, &mut events);
            }
            (SessionState::Playing { .. }, Message::Spawn(spawn)) => {
                self.apply_spawn(spawn, &mut events);
            }
            (SessionState::Playing { .. }, Message::Updates(bundle)) => {
                self.apply_updates(bundle, &mut events);
            }
            (_, Message::NameAssignment(assignment)) => {
                self.apply_name(&assignment);
                events.push(SessionEvent::NameAssigned(assignment));
            }
            (state, other) => {
                tracing::debug!(
                    state = state.label(),
                    kind = other.request_type(),
                    "ignoring message"
                );
            }
        }
        // Remote changes are already known to everyone else.
        if let Some(world) = self.world.as_mut() {
            world.drain_events();
            if world.has_won() && !self.win_seen {
                self.win_seen = true;
                events.push(SessionEvent::Won);
            }
        }
        events
    }

    fn enter_game(&mut self, game: GameId, details: SessionDetails, events: &mut Vec<SessionEvent>) {
        let mut world = self.generator.generate(&details.name, details.seed).world;
        let computed = world.content_hash();
        if computed != details.hash {
            tracing::warn!(
                advertised = details.hash,
                computed,
                "world hash mismatch; continuing with local copy"
            );
            events.push(SessionEvent::HashMismatch {
                advertised: details.hash,
                computed,
            });
        }

        if let Some(max) = details.entities.iter().map(|e| e.id).max() {
            world.adopt_watermark(max.next());
        }
        let mut local = None;
        for entity in &details.entities {
            let merged = merge_entity(&mut world, entity, &mut local);
            if entity.kind == KIND_YOU {
                local = merged;
            }
        }

        let Some(local) = local else {
            tracing::warn!(game, "session details did not include our avatar");
            self.state = SessionState::Idle;
            return;
        };
        if let Err(err) = world.set_actor_name(local, self.player_name.clone()) {
            tracing::debug!(%err, "could not name local avatar");
        }
        world.drain_events();
        let position = world.actor(local).map(|a| a.position());
        tracing::info!(game, %local, ?position, "joined game");

        self.world = Some(world);
        self.local = Some(local);
        self.win_seen = false;
        self.state = SessionState::Playing { game: Some(game) };
        events.push(SessionEvent::Joined { game, local });

        // The relay placed us at the origin; tell everyone where we really are.
        self.send(Message::Updates(UpdateBundle {
            sender: Some(local),
            updates: vec![ActorUpdate {
                id: local,
                position,
                message: None,
            }],
        }));
    }

    fn apply_spawn(&mut self, spawn: SpawnDetails, events: &mut Vec<SessionEvent>) {
        let Some(world) = self.world.as_mut() else {
            return;
        };
        let entity = EntityDetails {
            id: spawn.id,
            kind: spawn.kind,
            position: spawn.position,
            status: None,
            art: spawn.art,
            name: spawn.name,
        };
        if let Some(id) = merge_entity(world, &entity, &mut self.local) {
            if world.actor(id).is_some_and(|a| a.kind() == ActorKind::Player) {
                tracing::info!(%id, "player joined");
                events.push(SessionEvent::PlayerJoined(id));
            }
        }
    }

    fn apply_updates(&mut self, bundle: UpdateBundle, events: &mut Vec<SessionEvent>) {
        let Some(world) = self.world.as_mut() else {
            return;
        };
        for update in bundle.updates {
            let id = update.id;
            if !world.contains_actor(id) {
                tracing::debug!(%id, "update for unknown actor skipped");
                continue;
            }
            let mut position = update.position.filter(|&at| addressable(id, at));
            match update.message.as_deref() {
                Some(STATUS_DISCONNECTED) => {
                    world.remove(id);
                    tracing::info!(%id, "player left");
                    events.push(SessionEvent::PlayerLeft(id));
                    continue;
                }
                Some(STATUS_HIDDEN) => {
                    world.hide(id);
                }
                Some(STATUS_SHOW) => {
                    // Already visible: the position still applies below.
                    if let Some(at) = position {
                        if world.show(id, at) {
                            position = None;
                        }
                    }
                }
                Some(key) => events.push(SessionEvent::Chat {
                    from: bundle.sender.unwrap_or(id),
                    key: key.to_owned(),
                }),
                None => {}
            }
            if let Some(at) = position {
                if !world.force_position(id, at) {
                    tracing::debug!(%id, ?at, "could not apply remote position");
                }
            }
        }
    }

    fn apply_name(&mut self, assignment: &NameAssignment) {
        self.player_name = assignment.name.clone();
        if let SessionState::Playing { game } = &mut self.state {
            *game = Some(assignment.server_id);
        }
        if let Some(world) = self.world.as_mut() {
            world.set_name(assignment.game_name.clone());
            if let Some(local) = self.local {
                let _ = world.set_actor_name(local, assignment.name.clone());
            }
        }
    }

    // --- Local actions ---

    fn playing(&mut self) -> Result<(&mut World, ActorId), ProtocolError> {
        match (self.state, self.world.as_mut(), self.local) {
            (SessionState::Playing { .. }, Some(world), Some(local)) => Ok((world, local)),
            _ => Err(ProtocolError::NotPlaying),
        }
    }

    /// Move the local avatar by `delta`.
    pub fn step(&mut self, delta: IVec3) -> Result<bool, ProtocolError> {
        let (world, local) = self.playing()?;
        let moved = world.step(local, delta);
        self.flush_local(|_| true);
        Ok(moved)
    }

    /// Pick up `item` with the local avatar.
    pub fn grab(&mut self, item: ActorId) -> Result<(), ProtocolError> {
        let (world, local) = self.playing()?;
        let result = world.grab(local, item);
        self.flush_local(|_| true);
        Ok(result?)
    }

    /// Pick up whatever item lies under the avatar.
    pub fn grab_underfoot(&mut self) -> Result<bool, ProtocolError> {
        let (world, local) = self.playing()?;
        let item = world
            .actor(local)
            .and_then(|a| world.tile(a.position()))
            .and_then(|t| t.ground_item());
        match item {
            Some(item) => self.grab(item).map(|()| true),
            None => Ok(false),
        }
    }

    /// Put down the held item near `target`, or underfoot.
    pub fn drop_item(&mut self, target: Option<Position>) -> Result<bool, ProtocolError> {
        let (world, local) = self.playing()?;
        let dropped = world.drop_held(local, target);
        self.flush_local(|_| true);
        Ok(dropped)
    }

    /// Throw the held item down the nearest shaft, if one is adjacent.
    pub fn drop_down_shaft(&mut self) -> Result<bool, ProtocolError> {
        let (world, local) = self.playing()?;
        match world.adjacent_drop_shaft(local) {
            Some(shaft) => self.drop_item(Some(shaft)),
            None => Ok(false),
        }
    }

    /// Broadcast a chat key from the local avatar.
    pub fn chat(&mut self, key: &str) -> Result<(), ProtocolError> {
        let (_, local) = self.playing()?;
        self.send(Message::Updates(UpdateBundle {
            sender: Some(local),
            updates: vec![ActorUpdate {
                id: local,
                position: None,
                message: Some(key.to_owned()),
            }],
        }));
        Ok(())
    }

    /// Advance the local clock. Only the local avatar's own movement is
    /// broadcast; every client simulates falling objects itself.
    pub fn tick(&mut self) -> Result<(), ProtocolError> {
        let (world, local) = self.playing()?;
        world.tick();
        self.flush_local(|id| id == local);
        Ok(())
    }

    /// Turn the events of a local action into one outbound update batch.
    fn flush_local(&mut self, keep: impl Fn(ActorId) -> bool) {
        let (Some(world), Some(local)) = (self.world.as_mut(), self.local) else {
            return;
        };
        let events = world.drain_events();
        let updates: Vec<ActorUpdate> = coalesce_updates(&events)
            .into_iter()
            .filter(|u| keep(u.id))
            .collect();
        let newly_won = world.has_won() && !self.win_seen;
        let game = match self.state {
            SessionState::Playing { game } => game,
            _ => None,
        };

        if !updates.is_empty() {
            self.send(Message::Updates(UpdateBundle {
                sender: Some(local),
                updates,
            }));
        }
        if newly_won {
            self.win_seen = true;
            tracing::info!("game won");
            self.send(Message::Request(GameRequest::game_won(game)));
        }
    }
}

/// Collapse a run of world events into at most one update per actor, in
/// order of first appearance.
pub fn coalesce_updates(events: &[WorldEvent]) -> Vec<ActorUpdate> {
    let mut updates: Vec<ActorUpdate> = Vec::new();
    let mut entry = |id: ActorId| -> usize {
        match updates.iter().position(|u| u.id == id) {
            Some(i) => i,
            None => {
                updates.push(ActorUpdate {
                    id,
                    position: None,
                    message: None,
                });
                updates.len() - 1
            }
        }
    };
    let mut apply = Vec::new();
    for event in events {
        match *event {
            WorldEvent::Moved { id, to, .. } | WorldEvent::Landed { id, position: to } => {
                apply.push((entry(id), Some(to), None));
            }
            WorldEvent::Hidden { id } => {
                apply.push((entry(id), None, Some(STATUS_HIDDEN)));
            }
            WorldEvent::Shown { id, position } => {
                apply.push((entry(id), Some(position), Some(STATUS_SHOW)));
            }
            _ => {}
        }
    }
    for (index, position, status) in apply {
        let update = &mut updates[index];
        match status {
            Some(STATUS_HIDDEN) => {
                update.position = None;
                update.message = Some(STATUS_HIDDEN.to_owned());
            }
            Some(status) => {
                update.position = position;
                update.message = Some(status.to_owned());
            }
            None => {
                if update.message.as_deref() == Some(STATUS_HIDDEN) {
                    continue;
                }
                update.position = position;
            }
        }
    }
    updates
}

fn entity_list(world: &World, include: impl Fn(ActorKind) -> bool) -> Vec<EntityDetails> {
    world
        .actors()
        .values()
        .filter(|a| include(a.kind()))
        .map(|a| EntityDetails {
            id: a.id(),
            kind: a.kind().as_str().to_owned(),
            position: a.position(),
            status: a.is_hidden().then(|| STATUS_HIDDEN.to_owned()),
            art: Some(a.art().to_owned()),
            name: a.name().map(str::to_owned),
        })
        .collect()
}

fn entity_kind(entity: &EntityDetails) -> Option<ActorKind> {
    if entity.kind == KIND_YOU {
        return Some(ActorKind::Player);
    }
    match entity.kind.parse() {
        Ok(kind) => Some(kind),
        Err(err) => {
            tracing::debug!(id = %entity.id, %err, "skipping entity of unknown kind");
            None
        }
    }
}

/// If a local actor of a different kind holds `entity.id`, move it to a
/// fresh id. Returns `(old, new)` when something was moved.
fn make_room(world: &mut World, entity: &EntityDetails) -> Option<(ActorId, ActorId)> {
    let kind = entity_kind(entity)?;
    let existing = world.actor(entity.id)?;
    if existing.kind() == kind {
        return None;
    }
    let fresh = world.allocate_id();
    match world.rekey(entity.id, fresh) {
        Ok(()) => {
            tracing::debug!(old = %entity.id, new = %fresh, "rekeyed local actor to avoid collision");
            Some((entity.id, fresh))
        }
        Err(err) => {
            tracing::warn!(%err, "rekey failed");
            None
        }
    }
}

/// Bring one remote entity into the local world. Returns its id when it is
/// present afterwards. `local` follows the local avatar if it has to be
/// rekeyed out of the way.
/// Remote positions outside the tile key range are dropped.
fn addressable(id: ActorId, at: Position) -> bool {
    let ok = TileKey::pack(at).is_some();
    if !ok {
        tracing::debug!(%id, ?at, "remote position out of range; dropped");
    }
    ok
}

fn merge_entity(
    world: &mut World,
    entity: &EntityDetails,
    local: &mut Option<ActorId>,
) -> Option<ActorId> {
    let kind = entity_kind(entity)?;
    if entity.status.as_deref() == Some(STATUS_DISCONNECTED)
        || !addressable(entity.id, entity.position)
    {
        return None;
    }
    if let Some((old, new)) = make_room(world, entity) {
        if *local == Some(old) {
            *local = Some(new);
        }
    }
    let id = entity.id;
    if world.contains_actor(id) {
        world.force_position(id, entity.position);
    } else {
        let mut spec = match (kind, entity.name.as_deref()) {
            (ActorKind::Garbage, Some(name)) => {
                catalog::garbage(name).unwrap_or_else(|| ActorSpec::new(kind))
            }
            (ActorKind::Furniture, Some(name)) => catalog::furniture(name),
            _ => ActorSpec::new(kind),
        };
        if let Some(art) = &entity.art {
            spec = spec.art(art.clone());
        }
        if let Some(name) = &entity.name {
            spec = spec.name(name.clone());
        }
        if let Err(err) = world.spawn_with_id(id, spec, entity.position) {
            tracing::warn!(%err, "could not register remote entity");
            return None;
        }
    }
    if entity.status.as_deref() == Some(STATUS_HIDDEN) {
        world.hide(id);
    }
    Some(id)
}

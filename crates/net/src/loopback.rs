//! In-memory relay for local play and tests.
//!
//! Behaves like the production relay: it hands out avatar ids above the
//! highest id it has seen, forwards update bundles verbatim to everyone else
//! in the game, and keeps a loose copy of each entity for late joiners.

use crate::error::ProtocolError;
use crate::messages::{
    ActorUpdate, EntityDetails, GameId, GameList, GameSummary, KIND_YOU, Message, RequestDetails,
    STATUS_DISCONNECTED, SessionDetails, SpawnDetails, UpdateBundle,
};
use crate::session::{Session, SessionEvent};
use gq_common::{ActorId, ActorKind};
use std::collections::{BTreeMap, VecDeque};

/// Index of a connected client. Also its index into the session slice
/// handed to [`LoopbackRelay::pump`].
pub type ClientId = usize;

#[derive(Debug)]
struct HostedGame {
    name: String,
    seed: u64,
    hash: u32,
    entities: BTreeMap<ActorId, EntityDetails>,
    max_id: u32,
    clients: Vec<ClientId>,
}

#[derive(Debug, Default)]
pub struct LoopbackRelay {
    games: BTreeMap<GameId, HostedGame>,
    last_game: GameId,
    members: BTreeMap<ClientId, (GameId, ActorId)>,
    inboxes: Vec<VecDeque<String>>,
    corrupt_hashes: bool,
}

impl LoopbackRelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a connection and return its client id.
    pub fn connect(&mut self) -> ClientId {
        self.inboxes.push(VecDeque::new());
        self.inboxes.len() - 1
    }

    /// Fault injection: advertise a wrong hash to joiners.
    pub fn corrupt_hashes(&mut self, on: bool) {
        self.corrupt_hashes = on;
    }

    /// Number of games currently hosted.
    pub fn game_count(&self) -> usize {
        self.games.len()
    }

    /// Clients connected to `game`, or zero if it does not exist.
    pub fn players_in(&self, game: GameId) -> usize {
        self.games.get(&game).map_or(0, |g| g.clients.len())
    }

    /// Next message waiting for `client`.
    pub fn poll(&mut self, client: ClientId) -> Option<String> {
        self.inboxes.get_mut(client)?.pop_front()
    }

    fn send(&mut self, client: ClientId, message: &Message) -> Result<(), ProtocolError> {
        let raw = message.encode()?;
        if let Some(inbox) = self.inboxes.get_mut(client) {
            inbox.push_back(raw);
        }
        Ok(())
    }

    /// Take one message from `client`.
    pub fn receive(&mut self, client: ClientId, raw: &str) -> Result<(), ProtocolError> {
        match Message::decode(raw)? {
            Message::Request(req) => match req.details {
                RequestDetails::Games => self.list_games(client),
                RequestDetails::Join => {
                    let game = req.id.ok_or(ProtocolError::UnknownGame(0))?;
                    self.join(client, game)
                }
                RequestDetails::GameWon => {
                    tracing::info!(client, game = ?req.id, "game reported won");
                    Ok(())
                }
            },
            Message::SessionDetails(details) => {
                self.host(client, details);
                Ok(())
            }
            Message::Updates(bundle) => {
                self.forward(client, raw, &bundle);
                Ok(())
            }
            other => Err(ProtocolError::Unexpected(other.request_type())),
        }
    }

    fn list_games(&mut self, client: ClientId) -> Result<(), ProtocolError> {
        let games = self
            .games
            .iter()
            .map(|(id, g)| GameSummary {
                id: *id,
                name: g.name.clone(),
                players: g.clients.len() as u32,
            })
            .collect();
        self.send(client, &Message::GameList(GameList { games }))
    }

    fn host(&mut self, client: ClientId, details: SessionDetails) {
        self.last_game += 1;
        let max_id = details.entities.iter().map(|e| e.id.0).max().unwrap_or(0);
        let creator = details.creator_id.unwrap_or(ActorId(0));
        tracing::debug!(client, game = self.last_game, name = %details.name, "hosting game");
        self.games.insert(
            self.last_game,
            HostedGame {
                name: details.name,
                seed: details.seed,
                hash: details.hash,
                entities: details.entities.into_iter().map(|e| (e.id, e)).collect(),
                max_id,
                clients: vec![client],
            },
        );
        self.members.insert(client, (self.last_game, creator));
    }

    fn join(&mut self, client: ClientId, game_id: GameId) -> Result<(), ProtocolError> {
        let corrupt = self.corrupt_hashes;
        let game = self
            .games
            .get_mut(&game_id)
            .ok_or(ProtocolError::UnknownGame(game_id))?;
        game.max_id += 1;
        let avatar = ActorId(game.max_id);
        let origin = glam::IVec3::ZERO;
        game.entities.insert(
            avatar,
            EntityDetails {
                id: avatar,
                kind: KIND_YOU.into(),
                position: origin,
                status: None,
                art: None,
                name: None,
            },
        );
        let details = SessionDetails {
            name: game.name.clone(),
            seed: game.seed,
            hash: if corrupt { game.hash.wrapping_add(1) } else { game.hash },
            id: game_id,
            entities: game.entities.values().cloned().collect(),
            creator_id: None,
        };
        if let Some(e) = game.entities.get_mut(&avatar) {
            e.kind = ActorKind::Player.as_str().into();
        }
        let others = game.clients.clone();
        game.clients.push(client);
        self.members.insert(client, (game_id, avatar));
        tracing::debug!(client, game = game_id, %avatar, "client joined");

        self.send(client, &Message::SessionDetails(details))?;
        let spawn = Message::Spawn(SpawnDetails {
            id: avatar,
            kind: ActorKind::Player.as_str().into(),
            name: None,
            art: None,
            position: origin,
        });
        for other in others {
            self.send(other, &spawn)?;
        }
        Ok(())
    }

    fn forward(&mut self, client: ClientId, raw: &str, bundle: &UpdateBundle) {
        let Some(&(game_id, _)) = self.members.get(&client) else {
            return;
        };
        let Some(game) = self.games.get_mut(&game_id) else {
            return;
        };
        for update in &bundle.updates {
            if let Some(entity) = game.entities.get_mut(&update.id) {
                if update.message.is_some() {
                    entity.status = update.message.clone();
                }
                if let Some(p) = update.position {
                    entity.position = p;
                }
            }
        }
        for &other in game.clients.iter().filter(|&&c| c != client) {
            if let Some(inbox) = self.inboxes.get_mut(other) {
                inbox.push_back(raw.to_owned());
            }
        }
    }

    /// Drop `client`. Everyone left in its game hears that it disconnected;
    /// a game with nobody left is forgotten.
    pub fn disconnect(&mut self, client: ClientId) -> Result<(), ProtocolError> {
        let Some((game_id, avatar)) = self.members.remove(&client) else {
            return Ok(());
        };
        let Some(game) = self.games.get_mut(&game_id) else {
            return Ok(());
        };
        game.clients.retain(|&c| c != client);
        if game.clients.is_empty() {
            self.games.remove(&game_id);
            return Ok(());
        }
        game.entities.remove(&avatar);
        let remaining = game.clients.clone();
        let bye = Message::Updates(UpdateBundle {
            sender: None,
            updates: vec![ActorUpdate {
                id: avatar,
                position: None,
                message: Some(STATUS_DISCONNECTED.into()),
            }],
        });
        for other in remaining {
            self.send(other, &bye)?;
        }
        Ok(())
    }

    /// Shuttle messages between the relay and `sessions` until nobody has
    /// anything left to say. Session `i` is client `i`.
    pub fn pump(
        &mut self,
        sessions: &mut [Session],
    ) -> Result<Vec<(ClientId, SessionEvent)>, ProtocolError> {
        let mut events = Vec::new();
        loop {
            let mut quiet = true;
            for (client, session) in sessions.iter_mut().enumerate() {
                for message in session.take_outbound() {
                    quiet = false;
                    self.receive(client, &message.encode()?)?;
                }
            }
            for (client, session) in sessions.iter_mut().enumerate() {
                while let Some(raw) = self.poll(client) {
                    quiet = false;
                    events.extend(session.handle(&raw).into_iter().map(|e| (client, e)));
                }
            }
            if quiet {
                return Ok(events);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::GameRequest;

    fn hosted(relay: &mut LoopbackRelay) -> ClientId {
        let host = relay.connect();
        let details = SessionDetails {
            name: "Puddle row".into(),
            seed: 9,
            hash: 77,
            id: 0,
            entities: vec![EntityDetails {
                id: ActorId(12),
                kind: "player".into(),
                position: glam::IVec3::ZERO,
                status: None,
                art: None,
                name: None,
            }],
            creator_id: Some(ActorId(12)),
        };
        relay
            .receive(host, &Message::SessionDetails(details).encode().unwrap())
            .unwrap();
        host
    }

    fn request(relay: &mut LoopbackRelay, client: ClientId, req: GameRequest) {
        relay
            .receive(client, &Message::Request(req).encode().unwrap())
            .unwrap();
    }

    #[test]
    fn join_assigns_next_id_and_announces() {
        let mut relay = LoopbackRelay::new();
        let host = hosted(&mut relay);
        let guest = relay.connect();
        request(&mut relay, guest, GameRequest::join(1, "Guest", 0));

        let Message::SessionDetails(details) = Message::decode(&relay.poll(guest).unwrap()).unwrap()
        else {
            panic!("expected session details");
        };
        let you = details.entities.iter().find(|e| e.kind == KIND_YOU).unwrap();
        assert_eq!(you.id, ActorId(13));
        assert_eq!(details.hash, 77);

        let Message::Spawn(spawn) = Message::decode(&relay.poll(host).unwrap()).unwrap() else {
            panic!("expected spawn");
        };
        assert_eq!(spawn.id, ActorId(13));
        assert_eq!(spawn.kind, "player");
        assert_eq!(relay.players_in(1), 2);
    }

    #[test]
    fn game_list_uses_string_safe_ids() {
        let mut relay = LoopbackRelay::new();
        hosted(&mut relay);
        let browser = relay.connect();
        request(&mut relay, browser, GameRequest::games());
        let Message::GameList(list) = Message::decode(&relay.poll(browser).unwrap()).unwrap()
        else {
            panic!("expected game list");
        };
        assert_eq!(list.games[0].id, 1);
        assert_eq!(list.games[0].players, 1);
    }

    #[test]
    fn joining_a_missing_game_fails() {
        let mut relay = LoopbackRelay::new();
        let c = relay.connect();
        let raw = Message::Request(GameRequest::join(5, "x", 0)).encode().unwrap();
        assert!(matches!(
            relay.receive(c, &raw),
            Err(ProtocolError::UnknownGame(5))
        ));
    }

    #[test]
    fn updates_are_forwarded_verbatim() {
        let mut relay = LoopbackRelay::new();
        let host = hosted(&mut relay);
        let guest = relay.connect();
        request(&mut relay, guest, GameRequest::join(1, "Guest", 0));
        while relay.poll(guest).is_some() {}
        while relay.poll(host).is_some() {}

        let raw = r#"{"requestType":"Updates","updates":[{"id":13,"position":[2,0,0]}]}"#;
        relay.receive(guest, raw).unwrap();
        assert_eq!(relay.poll(host).as_deref(), Some(raw));
        assert!(relay.poll(guest).is_none());
    }

    #[test]
    fn last_client_leaving_closes_the_game() {
        let mut relay = LoopbackRelay::new();
        let host = hosted(&mut relay);
        let guest = relay.connect();
        request(&mut relay, guest, GameRequest::join(1, "Guest", 0));
        while relay.poll(host).is_some() {}

        relay.disconnect(guest).unwrap();
        let Message::Updates(bundle) = Message::decode(&relay.poll(host).unwrap()).unwrap() else {
            panic!("expected updates");
        };
        assert_eq!(bundle.updates[0].message.as_deref(), Some(STATUS_DISCONNECTED));

        relay.disconnect(host).unwrap();
        assert_eq!(relay.game_count(), 0);
    }

    #[test]
    fn client_only_messages_are_rejected() {
        let mut relay = LoopbackRelay::new();
        let c = relay.connect();
        let raw = r#"{"requestType":"GameList","games":[]}"#;
        assert!(matches!(
            relay.receive(c, raw),
            Err(ProtocolError::Unexpected("GameList"))
        ));
    }
}

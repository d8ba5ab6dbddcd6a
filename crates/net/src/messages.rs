//! Relay message types.
//!
//! Every message is a JSON object tagged by `requestType`. The relay is a
//! thin forwarder, so these are also exactly what clients send each other.

use crate::error::ProtocolError;
use gq_common::{ActorId, Position};
use serde::{Deserialize, Deserializer, Serialize};

/// Relay-side game identifier.
pub type GameId = u64;

/// Chat/status token: the sender left the game.
pub const STATUS_DISCONNECTED: &str = "disconnected";
/// Status token: the actor was taken off the grid.
pub const STATUS_HIDDEN: &str = "status:hidden";
/// Status token: the actor came back onto the grid.
pub const STATUS_SHOW: &str = "status:show";
/// Kind the relay gives the joining client's own avatar.
pub const KIND_YOU: &str = "you";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "requestType")]
pub enum Message {
    Request(GameRequest),
    GameList(GameList),
    SessionDetails(SessionDetails),
    Spawn(SpawnDetails),
    Updates(UpdateBundle),
    NameAssignment(NameAssignment),
}

impl Message {
    /// Parse one JSON message.
    pub fn decode(raw: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Serialize to the JSON text sent over the relay.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Tag value, for logging.
    pub fn request_type(&self) -> &'static str {
        match self {
            Message::Request(_) => "Request",
            Message::GameList(_) => "GameList",
            Message::SessionDetails(_) => "SessionDetails",
            Message::Spawn(_) => "Spawn",
            Message::Updates(_) => "Updates",
            Message::NameAssignment(_) => "NameAssignment",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RequestDetails {
    Games,
    Join,
    GameWon,
}

/// Ask the relay for something.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRequest {
    pub details: RequestDetails,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<GameId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Index into the client's avatar table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub art: Option<u32>,
}

impl GameRequest {
    /// Ask for the list of open games.
    pub fn games() -> Self {
        Self {
            details: RequestDetails::Games,
            id: None,
            name: None,
            art: None,
        }
    }

    /// Ask to join `game` under a display name and avatar index.
    pub fn join(game: GameId, name: impl Into<String>, art: u32) -> Self {
        Self {
            details: RequestDetails::Join,
            id: Some(game),
            name: Some(name.into()),
            art: Some(art),
        }
    }

    /// Report that the win condition latched.
    pub fn game_won(game: Option<GameId>) -> Self {
        Self {
            details: RequestDetails::GameWon,
            id: game,
            name: None,
            art: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSummary {
    #[serde(deserialize_with = "lenient_id")]
    pub id: GameId,
    pub name: String,
    pub players: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameList {
    pub games: Vec<GameSummary>,
}

/// One actor as listed in session details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDetails {
    pub id: ActorId,
    pub kind: String,
    pub position: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub art: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Everything needed to rebuild a game: sent by a creator to the relay and
/// by the relay to each joiner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDetails {
    pub name: String,
    pub seed: u64,
    #[serde(deserialize_with = "lenient_hash")]
    pub hash: u32,
    pub id: GameId,
    pub entities: Vec<EntityDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator_id: Option<ActorId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnDetails {
    pub id: ActorId,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub art: Option<String>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorUpdate {
    pub id: ActorId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    /// Chat key or status token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateBundle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<ActorId>,
    pub updates: Vec<ActorUpdate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NameAssignment {
    pub name: String,
    pub game_name: String,
    pub server_id: GameId,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(u64),
    Text(String),
}

/// The relay lists games keyed by object key, so ids may arrive as strings.
fn lenient_id<'de, D: Deserializer<'de>>(de: D) -> Result<GameId, D::Error> {
    match NumberOrString::deserialize(de)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::Text(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

/// Hashes computed with signed 32-bit arithmetic arrive negative; keep the
/// same bits.
fn lenient_hash<'de, D: Deserializer<'de>>(de: D) -> Result<u32, D::Error> {
    let raw = i64::deserialize(de)?;
    Ok(raw as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::IVec3;

    #[test]
    fn request_wire_shape() {
        let msg = Message::Request(GameRequest::join(3, "Orange Cat", 2));
        let json: serde_json::Value = serde_json::from_str(&msg.encode().unwrap()).unwrap();
        assert_eq!(json["requestType"], "Request");
        assert_eq!(json["details"], "join");
        assert_eq!(json["id"], 3);
        assert_eq!(json["art"], 2);

        let won = Message::Request(GameRequest::game_won(None)).encode().unwrap();
        assert_eq!(won, r#"{"requestType":"Request","details":"gameWon"}"#);
    }

    #[test]
    fn session_details_from_relay() {
        let raw = r#"{"requestType":"SessionDetails","name":"Damp crescent","seed":42,
            "hash":-5,"id":1,"entities":[{"id":7,"kind":"you","position":[0,0,0]},
            {"id":3,"kind":"garbage-item","position":[1,-2,0],"art":"x"}]}"#;
        let Message::SessionDetails(details) = Message::decode(raw).unwrap() else {
            panic!("wrong variant");
        };
        assert_eq!(details.hash, (-5i64) as u32);
        assert_eq!(details.entities.len(), 2);
        assert_eq!(details.entities[0].id, ActorId(7));
        assert_eq!(details.entities[1].position, IVec3::new(1, -2, 0));
        assert!(details.creator_id.is_none());
    }

    #[test]
    fn creator_id_is_camel_case() {
        let details = SessionDetails {
            name: "g".into(),
            seed: 1,
            hash: 2,
            id: 0,
            entities: vec![],
            creator_id: Some(ActorId(4)),
        };
        let text = Message::SessionDetails(details).encode().unwrap();
        assert!(text.contains(r#""creatorId":4"#));
    }

    #[test]
    fn game_list_accepts_string_ids() {
        let raw = r#"{"requestType":"GameList","games":[{"name":"a","id":"12","players":2}]}"#;
        let Message::GameList(list) = Message::decode(raw).unwrap() else {
            panic!("wrong variant");
        };
        assert_eq!(list.games[0].id, 12);
    }

    #[test]
    fn updates_omit_empty_fields() {
        let bundle = Message::Updates(UpdateBundle {
            sender: None,
            updates: vec![ActorUpdate {
                id: ActorId(5),
                position: Some(IVec3::new(1, 2, 3)),
                message: None,
            }],
        });
        assert_eq!(
            bundle.encode().unwrap(),
            r#"{"requestType":"Updates","updates":[{"id":5,"position":[1,2,3]}]}"#
        );
    }

    #[test]
    fn malformed_input_is_an_error() {
        assert!(matches!(
            Message::decode("{not json"),
            Err(ProtocolError::Malformed(_))
        ));
        assert!(Message::decode(r#"{"requestType":"Nope"}"#).is_err());
        assert!(Message::decode(r#"{"requestType":"Request","details":"dance"}"#).is_err());
    }
}

use serde::Deserialize;

use crate::events::{TrackEndReason, TrackException};

/// Envolvente de los mensajes que manda el nodo por el WebSocket,
/// discriminada por `op`.
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum IncomingMessage {
    /// El nodo aceptó la sesión y asignó un session id
    #[serde(rename_all = "camelCase")]
    Ready {
        session_id: String,
        #[serde(default)]
        resumed: bool,
    },

    /// Ping periódico con el estado del player de un guild
    #[serde(rename_all = "camelCase")]
    PlayerUpdate {
        guild_id: String,
        state: PlayerUpdateState,
    },

    /// Estadísticas del nodo
    Stats(NodeStats),

    /// Evento de reproducción, sub-discriminado por `type`
    Event(EventMessage),
}

/// Estado embebido en un frame `playerUpdate`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerUpdateState {
    pub connected: bool,
    #[serde(default)]
    pub position: u64,
    #[serde(default)]
    pub time: u64,
    #[serde(default)]
    pub ping: i64,
}

/// Último frame `stats` del nodo
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStats {
    #[serde(default)]
    pub players: u32,
    #[serde(default)]
    pub playing_players: u32,
    /// Uptime del nodo en milisegundos
    #[serde(default)]
    pub uptime: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMessage {
    pub guild_id: String,
    #[serde(flatten)]
    pub event: EventKind,
}

/// Eventos de reproducción que reporta el nodo
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum EventKind {
    #[serde(rename = "TrackStartEvent")]
    TrackStart {},

    #[serde(rename = "TrackEndEvent")]
    TrackEnd { reason: TrackEndReason },

    #[serde(rename = "TrackExceptionEvent")]
    TrackException { exception: TrackException },

    #[serde(rename = "TrackStuckEvent")]
    #[serde(rename_all = "camelCase")]
    TrackStuck { threshold_ms: u64 },

    #[serde(rename = "WebSocketClosedEvent")]
    #[serde(rename_all = "camelCase")]
    WebSocketClosed {
        #[serde(default)]
        code: u16,
        #[serde(default)]
        reason: String,
        #[serde(default)]
        by_remote: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ExceptionSeverity;

    #[test]
    fn test_parse_ready() {
        let message: IncomingMessage =
            serde_json::from_str(r#"{"op":"ready","resumed":false,"sessionId":"abc"}"#).unwrap();
        match message {
            IncomingMessage::Ready {
                session_id,
                resumed,
            } => {
                assert_eq!(session_id, "abc");
                assert!(!resumed);
            }
            other => panic!("mensaje inesperado: {:?}", other),
        }
    }

    #[test]
    fn test_parse_player_update() {
        let message: IncomingMessage = serde_json::from_str(
            r#"{"op":"playerUpdate","guildId":"42","state":{"time":1,"position":32400,"connected":true,"ping":5}}"#,
        )
        .unwrap();
        match message {
            IncomingMessage::PlayerUpdate { guild_id, state } => {
                assert_eq!(guild_id, "42");
                assert!(state.connected);
                assert_eq!(state.position, 32_400);
            }
            other => panic!("mensaje inesperado: {:?}", other),
        }
    }

    #[test]
    fn test_parse_stats() {
        let message: IncomingMessage = serde_json::from_str(
            r#"{"op":"stats","players":3,"playingPlayers":1,"uptime":123456,"memory":{"free":1}}"#,
        )
        .unwrap();
        match message {
            IncomingMessage::Stats(stats) => {
                assert_eq!(stats.players, 3);
                assert_eq!(stats.playing_players, 1);
                assert_eq!(stats.uptime, 123_456);
            }
            other => panic!("mensaje inesperado: {:?}", other),
        }
    }

    #[test]
    fn test_parse_track_end_event() {
        let message: IncomingMessage = serde_json::from_str(
            r#"{"op":"event","guildId":"42","type":"TrackEndEvent","reason":"FINISHED"}"#,
        )
        .unwrap();
        match message {
            IncomingMessage::Event(EventMessage { guild_id, event }) => {
                assert_eq!(guild_id, "42");
                match event {
                    EventKind::TrackEnd { reason } => {
                        assert_eq!(reason, TrackEndReason::Finished);
                        assert!(reason.may_start_next());
                    }
                    other => panic!("evento inesperado: {:?}", other),
                }
            }
            other => panic!("mensaje inesperado: {:?}", other),
        }
    }

    #[test]
    fn test_parse_track_exception_event() {
        let message: IncomingMessage = serde_json::from_str(
            r#"{"op":"event","guildId":"42","type":"TrackExceptionEvent","exception":{"message":"se rompió","severity":"fault","cause":"copyright"}}"#,
        )
        .unwrap();
        match message {
            IncomingMessage::Event(EventMessage { event, .. }) => match event {
                EventKind::TrackException { exception } => {
                    assert_eq!(exception.message.as_deref(), Some("se rompió"));
                    assert_eq!(exception.severity, ExceptionSeverity::Fault);
                    assert_eq!(exception.cause, "copyright");
                }
                other => panic!("evento inesperado: {:?}", other),
            },
            other => panic!("mensaje inesperado: {:?}", other),
        }
    }

    #[test]
    fn test_parse_track_stuck_event() {
        let message: IncomingMessage = serde_json::from_str(
            r#"{"op":"event","guildId":"42","type":"TrackStuckEvent","thresholdMs":10000}"#,
        )
        .unwrap();
        match message {
            IncomingMessage::Event(EventMessage { event, .. }) => match event {
                EventKind::TrackStuck { threshold_ms } => assert_eq!(threshold_ms, 10_000),
                other => panic!("evento inesperado: {:?}", other),
            },
            other => panic!("mensaje inesperado: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_op_is_an_error() {
        let result = serde_json::from_str::<IncomingMessage>(r#"{"op":"banana"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_event_type_is_an_error() {
        let result = serde_json::from_str::<IncomingMessage>(
            r#"{"op":"event","guildId":"42","type":"BananaEvent"}"#,
        );
        assert!(result.is_err());
    }
}

use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::debug;

use crate::audio::player::Player;

/// Razón por la que terminó un track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrackEndReason {
    Finished,
    LoadFailed,
    Stopped,
    Replaced,
    Cleanup,
}

impl TrackEndReason {
    /// Indica si después de esta razón puede arrancar el siguiente track
    pub fn may_start_next(self) -> bool {
        matches!(self, TrackEndReason::Finished | TrackEndReason::LoadFailed)
    }
}

/// Severidad de una excepción reportada por el nodo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExceptionSeverity {
    #[serde(alias = "COMMON")]
    Common,
    #[serde(alias = "SUSPICIOUS")]
    Suspicious,
    #[serde(alias = "FAULT")]
    Fault,
}

/// Excepción de un track, tal como la reporta el nodo
#[derive(Debug, Clone, Deserialize)]
pub struct TrackException {
    pub message: Option<String>,
    pub severity: ExceptionSeverity,
    pub cause: String,
}

/// Eventos públicos del nodo
#[derive(Debug, Clone)]
pub enum NodeEvent {
    /// Falla no fatal del nodo (frame malformado, respuesta REST con error, etc.)
    NodeException { message: String },

    /// Un track empezó a reproducirse
    TrackStarted { player: Arc<Player> },

    /// Un track terminó
    TrackEnded {
        player: Arc<Player>,
        reason: TrackEndReason,
    },

    /// El nodo reportó una excepción durante la reproducción
    TrackException {
        player: Arc<Player>,
        exception: TrackException,
    },

    /// El track quedó trabado más tiempo que el umbral configurado
    TrackStuck {
        player: Arc<Player>,
        threshold: Duration,
    },
}

/// Fan-out de eventos del nodo hacia cualquier cantidad de suscriptores.
///
/// Cada suscriptor recibe su propio `broadcast::Receiver`: todos ven todos
/// los eventos y un suscriptor lento o caído no bloquea a los demás.
#[derive(Debug, Clone)]
pub struct NodeEvents {
    sender: broadcast::Sender<NodeEvent>,
}

const EVENT_CHANNEL_CAPACITY: usize = 64;

impl NodeEvents {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Crea un nuevo suscriptor
    pub fn subscribe(&self) -> broadcast::Receiver<NodeEvent> {
        self.sender.subscribe()
    }

    /// Publica un evento a todos los suscriptores
    pub fn emit(&self, event: NodeEvent) {
        if self.sender.send(event).is_err() {
            debug!("Evento descartado: no hay suscriptores");
        }
    }
}

impl Default for NodeEvents {
    fn default() -> Self {
        Self::new()
    }
}

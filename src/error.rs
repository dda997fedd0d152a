use thiserror::Error;

use crate::ids::GuildId;

/// Alias de resultado para las operaciones del cliente
pub type Result<T> = std::result::Result<T, NodeError>;

/// Errores del nodo y de los players
#[derive(Error, Debug)]
pub enum NodeError {
    /// El nodo no está conectado al servidor remoto
    #[error("el nodo no está conectado al servidor remoto")]
    NotConnected,

    /// El nodo ya tiene una conexión abierta
    #[error("el nodo ya está conectado")]
    AlreadyConnected,

    /// Ya existe un player para el guild
    #[error("ya existe un player para el guild {0}")]
    PlayerAlreadyExists(GuildId),

    /// No hay player para el guild
    #[error("no hay player para el guild {0}")]
    NoPlayer(GuildId),

    /// Todavía no se recibió el mensaje `ready` con el session id
    #[error("la sesión del nodo todavía no está lista")]
    NoSessionId,

    /// La cola no tiene track actual
    #[error("la cola no tiene un track actual")]
    NullTrack,

    /// Operación inválida para el estado actual del player
    #[error("operación inválida en el estado {0:?}")]
    InvalidState(crate::audio::player::PlayerState),

    /// Volumen fuera del rango permitido (0 a 1000)
    #[error("el volumen {0} está fuera del rango 0..=1000")]
    VolumeOutOfRange(u16),

    /// La posición buscada supera la duración del track
    #[error("la posición {position:?} supera la duración {duration:?}")]
    SeekOutOfBounds {
        position: std::time::Duration,
        duration: std::time::Duration,
    },

    /// El track actual no admite seek
    #[error("el track actual no admite seek")]
    NotSeekable,

    /// Índice fuera del rango de la cola
    #[error("el índice {index} está fuera del rango de la cola (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// Banda o ganancia de ecualizador inválida
    #[error("banda de ecualizador inválida: {0}")]
    InvalidEqualizerBand(String),

    /// `loadType` desconocido en la respuesta del nodo
    #[error("loadType desconocido: {0}")]
    UnsupportedLoadType(String),

    /// Se agotaron los reintentos de conexión
    #[error("no se pudo conectar al nodo después de {attempts} intentos")]
    ConnectionFailed { attempts: u32 },

    /// La conexión en curso fue cancelada por un disconnect
    #[error("la conexión fue cancelada")]
    Cancelled,

    /// Configuración inválida
    #[error("configuración inválida: {0}")]
    InvalidConfig(String),

    /// Error del gateway de voz
    #[error("error del gateway de voz: {0}")]
    Gateway(String),

    #[error("error de WebSocket: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("error HTTP: {0}")]
    Http(#[from] reqwest::Error),

    #[error("error de JSON: {0}")]
    Json(#[from] serde_json::Error),
}

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{NodeError, Result};
use crate::ids::UserId;

/// Configuración del nodo Lavalink
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NodeConfig {
    // Conexión
    pub hostname: String,
    pub port: u16,
    pub authorization: String,
    pub secure: bool,

    // Identidad del bot
    pub user_id: UserId,
    pub shard_count: u32,

    // Comportamiento en el canal de voz
    pub self_deaf: bool,
    pub self_mute: bool,

    // Reintentos
    pub reconnect_attempts: u32,
    pub reconnect_delay: Duration,

    // Auto-desconexión cuando el canal queda vacío
    pub leave_delay: Duration,
}

impl NodeConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            hostname: std::env::var("LAVALINK_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("LAVALINK_PORT")
                .unwrap_or_else(|_| "2333".to_string())
                .parse()
                .map_err(|_| NodeError::InvalidConfig("LAVALINK_PORT inválido".to_string()))?,
            authorization: std::env::var("LAVALINK_PASSWORD")
                .unwrap_or_else(|_| "youshallnotpass".to_string()),
            secure: std::env::var("LAVALINK_SECURE")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),

            user_id: UserId(
                std::env::var("BOT_USER_ID")
                    .map_err(|_| NodeError::InvalidConfig("falta BOT_USER_ID".to_string()))?
                    .parse()
                    .map_err(|_| NodeError::InvalidConfig("BOT_USER_ID inválido".to_string()))?,
            ),
            shard_count: std::env::var("SHARD_COUNT")
                .unwrap_or_else(|_| "1".to_string())
                .parse()
                .map_err(|_| NodeError::InvalidConfig("SHARD_COUNT inválido".to_string()))?,

            self_deaf: std::env::var("SELF_DEAF")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
            self_mute: std::env::var("SELF_MUTE")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),

            reconnect_attempts: std::env::var("RECONNECT_ATTEMPTS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .map_err(|_| NodeError::InvalidConfig("RECONNECT_ATTEMPTS inválido".to_string()))?,
            reconnect_delay: Duration::from_millis(
                std::env::var("RECONNECT_DELAY_MS")
                    .unwrap_or_else(|_| "10000".to_string())
                    .parse()
                    .map_err(|_| {
                        NodeError::InvalidConfig("RECONNECT_DELAY_MS inválido".to_string())
                    })?,
            ),
            leave_delay: Duration::from_millis(
                std::env::var("LEAVE_DELAY_MS")
                    .unwrap_or_else(|_| "120000".to_string())
                    .parse()
                    .map_err(|_| NodeError::InvalidConfig("LEAVE_DELAY_MS inválido".to_string()))?,
            ),
        };

        config.validate()?;

        Ok(config)
    }

    /// Validates configuration values for correctness.
    ///
    /// Performs sanity checks on configuration values to catch
    /// common mistakes before attempting to open the connection.
    ///
    /// # Validation Rules
    ///
    /// - Hostname and authorization must be non-empty
    /// - Shard count must be at least 1
    /// - At least one reconnect attempt must be allowed
    pub fn validate(&self) -> Result<()> {
        if self.hostname.is_empty() {
            return Err(NodeError::InvalidConfig(
                "hostname must not be empty".to_string(),
            ));
        }

        if self.authorization.is_empty() {
            return Err(NodeError::InvalidConfig(
                "authorization must not be empty".to_string(),
            ));
        }

        if self.shard_count == 0 {
            return Err(NodeError::InvalidConfig(
                "shard count must be at least 1".to_string(),
            ));
        }

        if self.reconnect_attempts == 0 {
            return Err(NodeError::InvalidConfig(
                "at least one reconnect attempt is required".to_string(),
            ));
        }

        Ok(())
    }

    /// Returns a summary of the current configuration for logging.
    ///
    /// Excludes the authorization token.
    pub fn summary(&self) -> String {
        format!(
            "Node Summary:\n  \
            Endpoint: {} (REST: {})\n  \
            Bot: user {} ({} shards)\n  \
            Voice: deaf={}, mute={}\n  \
            Retries: {} attempts, {}ms base delay\n  \
            Idle leave: {}ms",
            self.ws_endpoint(),
            self.rest_endpoint(),
            self.user_id,
            self.shard_count,
            self.self_deaf,
            self.self_mute,
            self.reconnect_attempts,
            self.reconnect_delay.as_millis(),
            self.leave_delay.as_millis(),
        )
    }

    /// Endpoint del WebSocket de control
    pub fn ws_endpoint(&self) -> String {
        let scheme = if self.secure { "wss" } else { "ws" };
        format!("{}://{}:{}/v4/websocket", scheme, self.hostname, self.port)
    }

    /// Base de la API REST del nodo
    pub fn rest_endpoint(&self) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        format!("{}://{}:{}/v4", scheme, self.hostname, self.port)
    }
}

/// Default configuration values.
///
/// Matches a local Lavalink node with its stock password.
impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            hostname: "127.0.0.1".to_string(),
            port: 2333,
            authorization: "youshallnotpass".to_string(),
            secure: false,

            user_id: UserId(0),
            shard_count: 1,

            self_deaf: true,
            self_mute: false,

            reconnect_attempts: 10,
            reconnect_delay: Duration::from_secs(10),

            leave_delay: Duration::from_secs(2 * 60),
        }
    }
}

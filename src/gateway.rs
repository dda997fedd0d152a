use async_trait::async_trait;

use crate::error::Result;
use crate::ids::{ChannelId, GuildId, UserId};

/// Notificación voice-server-update del gateway anfitrión.
///
/// Trae las credenciales que el nodo necesita para unirse a la llamada
/// de voz real.
#[derive(Debug, Clone)]
pub struct VoiceServerUpdate {
    pub guild_id: GuildId,
    pub token: String,
    pub endpoint: String,
}

/// Notificación voice-state-update del gateway anfitrión
#[derive(Debug, Clone)]
pub struct VoiceStateUpdate {
    pub guild_id: GuildId,
    pub user_id: UserId,
    pub is_bot: bool,
    /// Canal de voz del usuario después del cambio (`None` = salió)
    pub channel_id: Option<ChannelId>,
    /// Session id de voz del usuario, si el gateway lo conoce
    pub session_id: Option<String>,
}

/// Frontera con el gateway del chat anfitrión.
///
/// El crate nunca habla con Discord directamente: el bot implementa este
/// trait sobre su propio cliente de gateway y el nodo lo usa para pedir
/// entrar/salir de canales de voz y para consultar ocupación.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VoiceGateway: Send + Sync {
    /// Pide al gateway que el bot se conecte a un canal de voz.
    ///
    /// El `VoiceSessionId` resultante no se devuelve acá: llega después por
    /// la notificación voice-state-update del propio bot.
    async fn join(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
        self_deaf: bool,
        self_mute: bool,
    ) -> Result<()>;

    /// Pide al gateway que el bot salga del canal de voz del guild
    async fn leave(&self, guild_id: GuildId) -> Result<()>;

    /// Indica si queda algún usuario que no sea bot en los canales de voz
    /// del guild
    async fn has_non_bot_listeners(&self, guild_id: GuildId) -> bool;
}

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::audio::filters::{EqualizerBand, Filter, FilterPreset};
use crate::audio::queue::TrackQueue;
use crate::audio::track::Track;
use crate::error::{NodeError, Result};
use crate::gateway::VoiceGateway;
use crate::ids::{ChannelId, GuildId};
use crate::protocol::outgoing::{FilterPayload, PlayerUpdatePayload, VoiceStatePayload};
use crate::protocol::rest::RestClient;

/// Volumen mínimo aceptado por el nodo
pub const MIN_VOLUME: u16 = 0;
/// Volumen máximo aceptado por el nodo
pub const MAX_VOLUME: u16 = 1000;
/// Volumen inicial de un player recién creado
pub const DEFAULT_VOLUME: u16 = 100;

/// Estado de un player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Disconnected,
    Connected,
    Playing,
    Paused,
    Stopped,
}

/// Sesión de reproducción de un guild.
///
/// Cada player pertenece a exactamente una entrada del registro del nodo y
/// es dueño exclusivo de su cola. Las operaciones de control se traducen a
/// PATCHs sobre el endpoint de player del nodo; ninguna espera más que la
/// respuesta HTTP y ninguna reintenta (los reintentos viven en la capa
/// WebSocket del nodo).
pub struct Player {
    guild_id: GuildId,
    voice_channel: RwLock<ChannelId>,
    text_channel: ChannelId,
    state: RwLock<PlayerState>,
    volume: RwLock<u16>,
    voice_session_id: RwLock<Option<String>>,
    queue: RwLock<TrackQueue>,
    rest: Arc<RestClient>,
    gateway: Arc<dyn VoiceGateway>,
    self_deaf: bool,
    self_mute: bool,
}

impl Player {
    pub(crate) fn new(
        guild_id: GuildId,
        voice_channel: ChannelId,
        text_channel: ChannelId,
        rest: Arc<RestClient>,
        gateway: Arc<dyn VoiceGateway>,
        self_deaf: bool,
        self_mute: bool,
    ) -> Self {
        Self {
            guild_id,
            voice_channel: RwLock::new(voice_channel),
            text_channel,
            state: RwLock::new(PlayerState::Disconnected),
            volume: RwLock::new(DEFAULT_VOLUME),
            voice_session_id: RwLock::new(None),
            queue: RwLock::new(TrackQueue::new()),
            rest,
            gateway,
            self_deaf,
            self_mute,
        }
    }

    pub fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    pub fn state(&self) -> PlayerState {
        *self.state.read()
    }

    pub fn volume(&self) -> u16 {
        *self.volume.read()
    }

    pub fn voice_channel(&self) -> ChannelId {
        *self.voice_channel.read()
    }

    pub fn text_channel(&self) -> ChannelId {
        self.text_channel
    }

    pub fn voice_session_id(&self) -> Option<String> {
        self.voice_session_id.read().clone()
    }

    /// Acceso de lectura a la cola
    pub fn queue(&self) -> RwLockReadGuard<'_, TrackQueue> {
        self.queue.read()
    }

    /// Acceso de escritura a la cola. Las operaciones compuestas sobre un
    /// mismo player deben serializarse (un comando en vuelo por guild).
    pub fn queue_mut(&self) -> RwLockWriteGuard<'_, TrackQueue> {
        self.queue.write()
    }

    /// Track que está sonando, si hay
    pub fn now_playing(&self) -> Option<Track> {
        self.queue.read().current_track().cloned()
    }

    /// Avanza la cola y reproduce el track resultante
    pub async fn play_next(&self) -> Result<()> {
        self.queue.write().move_next();
        self.play_current().await
    }

    /// Retrocede la cola y reproduce el track resultante
    pub async fn play_previous(&self) -> Result<()> {
        self.queue.write().move_previous();
        self.play_current().await
    }

    /// Reproduce el track actual de la cola
    pub async fn play_current(&self) -> Result<()> {
        let (encoded, title) = {
            let queue = self.queue.read();
            let track = queue.current_track().ok_or(NodeError::NullTrack)?;
            (track.encoded.clone(), track.title.clone())
        };

        self.rest
            .update_player(
                self.guild_id,
                &PlayerUpdatePayload {
                    encoded_track: Some(Some(encoded)),
                    ..PlayerUpdatePayload::default()
                },
            )
            .await?;

        *self.state.write() = PlayerState::Playing;
        info!("🎵 Reproduciendo: {} (guild {})", title, self.guild_id);
        Ok(())
    }

    /// Detiene la reproducción mandando el centinela `encodedTrack: null`
    pub async fn stop(&self) -> Result<()> {
        self.ensure_state(&[PlayerState::Playing, PlayerState::Paused])?;

        self.rest
            .update_player(
                self.guild_id,
                &PlayerUpdatePayload {
                    encoded_track: Some(None),
                    ..PlayerUpdatePayload::default()
                },
            )
            .await?;

        *self.state.write() = PlayerState::Stopped;
        info!("⏹️ Reproducción detenida (guild {})", self.guild_id);
        Ok(())
    }

    /// Pausa la reproducción
    pub async fn pause(&self) -> Result<()> {
        self.ensure_state(&[PlayerState::Playing])?;

        self.rest
            .update_player(
                self.guild_id,
                &PlayerUpdatePayload {
                    paused: Some(true),
                    ..PlayerUpdatePayload::default()
                },
            )
            .await?;

        *self.state.write() = PlayerState::Paused;
        info!("⏸️ Reproducción pausada (guild {})", self.guild_id);
        Ok(())
    }

    /// Reanuda la reproducción
    pub async fn resume(&self) -> Result<()> {
        self.ensure_state(&[PlayerState::Paused])?;

        self.rest
            .update_player(
                self.guild_id,
                &PlayerUpdatePayload {
                    paused: Some(false),
                    ..PlayerUpdatePayload::default()
                },
            )
            .await?;

        *self.state.write() = PlayerState::Playing;
        info!("▶️ Reproducción reanudada (guild {})", self.guild_id);
        Ok(())
    }

    /// Salta a `position` dentro del track actual.
    ///
    /// La cota es inclusiva: `position == duration` vale, pasarse no.
    pub async fn seek(&self, position: Duration) -> Result<()> {
        self.ensure_state(&[PlayerState::Playing, PlayerState::Paused])?;

        {
            let queue = self.queue.read();
            let track = queue.current_track().ok_or(NodeError::NullTrack)?;

            if !track.is_seekable || track.is_stream {
                return Err(NodeError::NotSeekable);
            }

            if position > track.duration {
                return Err(NodeError::SeekOutOfBounds {
                    position,
                    duration: track.duration,
                });
            }
        }

        self.rest
            .update_player(
                self.guild_id,
                &PlayerUpdatePayload {
                    position: Some(position.as_millis() as u64),
                    ..PlayerUpdatePayload::default()
                },
            )
            .await
    }

    /// Cambia el volumen (0 a 1000; 100 = sin amplificar)
    pub async fn set_volume(&self, volume: u16) -> Result<()> {
        if volume > MAX_VOLUME {
            return Err(NodeError::VolumeOutOfRange(volume));
        }

        self.rest
            .update_player(
                self.guild_id,
                &PlayerUpdatePayload {
                    volume: Some(volume),
                    ..PlayerUpdatePayload::default()
                },
            )
            .await?;

        *self.volume.write() = volume;
        info!("🔊 Volumen ajustado a {} (guild {})", volume, self.guild_id);
        Ok(())
    }

    /// Aplica un filtro con su multiplicador de volumen y bandas de EQ
    pub async fn apply_filter(
        &self,
        filter: Filter,
        volume: f32,
        bands: Vec<EqualizerBand>,
    ) -> Result<()> {
        self.apply_filters(vec![filter], volume, bands).await
    }

    /// Aplica un conjunto de filtros compuesto en un solo payload
    pub async fn apply_filters(
        &self,
        filters: Vec<Filter>,
        volume: f32,
        bands: Vec<EqualizerBand>,
    ) -> Result<()> {
        self.rest
            .update_player(
                self.guild_id,
                &PlayerUpdatePayload {
                    filters: Some(FilterPayload::new(filters, volume, bands)),
                    ..PlayerUpdatePayload::default()
                },
            )
            .await?;

        // El multiplicador del filtro reescala el volumen del player
        let rescaled = {
            let mut current = self.volume.write();
            *current = ((*current as f32 * volume) as u16).min(MAX_VOLUME);
            *current
        };
        debug!("🎛️ Filtros aplicados, volumen reescalado a {}", rescaled);
        Ok(())
    }

    /// Aplica un preset del catálogo
    pub async fn apply_preset(&self, preset: &FilterPreset) -> Result<()> {
        info!("🎛️ Aplicando preset '{}' (guild {})", preset.name, self.guild_id);
        self.apply_filters(preset.filters.clone(), preset.volume, preset.bands.clone())
            .await
    }

    pub(crate) async fn connect(&self) -> Result<()> {
        self.gateway
            .join(
                self.guild_id,
                self.voice_channel(),
                self.self_deaf,
                self.self_mute,
            )
            .await?;

        *self.state.write() = PlayerState::Connected;
        info!(
            "🔌 Player conectado al canal {} (guild {})",
            self.voice_channel(),
            self.guild_id
        );
        Ok(())
    }

    pub(crate) async fn disconnect(&self) -> Result<()> {
        self.ensure_state(&[
            PlayerState::Connected,
            PlayerState::Playing,
            PlayerState::Paused,
            PlayerState::Stopped,
        ])?;

        // Si la sesión nunca llegó a ready no hay player que borrar en el nodo
        match self.rest.destroy_player(self.guild_id).await {
            Err(NodeError::NoSessionId) => {
                debug!("Player {} sin sesión de nodo, se omite el DELETE", self.guild_id)
            }
            other => other?,
        }

        self.gateway.leave(self.guild_id).await?;
        *self.state.write() = PlayerState::Disconnected;
        info!("👋 Player desconectado (guild {})", self.guild_id);
        Ok(())
    }

    /// Reenvía las credenciales de voz al nodo (voice-server-update)
    pub(crate) async fn update_voice_server(&self, token: &str, endpoint: &str) -> Result<()> {
        let session_id = self.voice_session_id();
        self.rest
            .update_player(
                self.guild_id,
                &PlayerUpdatePayload {
                    voice: Some(VoiceStatePayload {
                        token: Some(token.to_string()),
                        endpoint: Some(endpoint.to_string()),
                        session_id,
                    }),
                    ..PlayerUpdatePayload::default()
                },
            )
            .await
    }

    /// Reenvía solo el voice session id cacheado (cambio de canal)
    pub(crate) async fn update_session_id(&self) -> Result<()> {
        self.rest
            .update_player(
                self.guild_id,
                &PlayerUpdatePayload {
                    voice: Some(VoiceStatePayload {
                        session_id: self.voice_session_id(),
                        ..VoiceStatePayload::default()
                    }),
                    ..PlayerUpdatePayload::default()
                },
            )
            .await
    }

    pub(crate) fn set_voice_session_id(&self, session_id: String) {
        *self.voice_session_id.write() = Some(session_id);
    }

    pub(crate) fn set_voice_channel(&self, channel: ChannelId) {
        *self.voice_channel.write() = channel;
    }

    pub(crate) fn update_track_position(&self, position_ms: u64) {
        if let Some(track) = self.queue.write().current_track_mut() {
            track.update_position(position_ms);
        }
    }

    fn ensure_state(&self, allowed: &[PlayerState]) -> Result<()> {
        let state = self.state();
        if allowed.contains(&state) {
            Ok(())
        } else {
            Err(NodeError::InvalidState(state))
        }
    }

    #[cfg(test)]
    pub(crate) fn force_state(&self, state: PlayerState) {
        *self.state.write() = state;
    }
}

impl fmt::Debug for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Player")
            .field("guild_id", &self.guild_id)
            .field("state", &self.state())
            .field("volume", &self.volume())
            .field("voice_channel", &self.voice_channel())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::filters::FilterPresets;
    use crate::audio::track::test_track;
    use crate::config::NodeConfig;
    use crate::events::NodeEvents;
    use crate::gateway::MockVoiceGateway;

    fn test_player() -> Player {
        let rest = Arc::new(RestClient::new(&NodeConfig::default(), NodeEvents::new()).unwrap());
        // Sesión lista: los PATCH fallan en transporte y se tratan como best-effort
        rest.set_session_id("test-session".to_string());

        Player::new(
            GuildId(42),
            ChannelId(1),
            ChannelId(2),
            rest,
            Arc::new(MockVoiceGateway::new()),
            true,
            false,
        )
    }

    fn playing_player() -> Player {
        let player = test_player();
        player.queue_mut().add(test_track("abc"));
        player.queue_mut().move_next();
        player.force_state(PlayerState::Playing);
        player
    }

    #[tokio::test]
    async fn test_play_current_without_track_fails() {
        let player = test_player();
        let err = player.play_current().await.unwrap_err();
        assert!(matches!(err, NodeError::NullTrack));
    }

    #[tokio::test]
    async fn test_play_pause_resume_stop_transitions() {
        let player = test_player();
        player.queue_mut().add(test_track("abc"));

        player.play_next().await.unwrap();
        assert_eq!(player.state(), PlayerState::Playing);

        player.pause().await.unwrap();
        assert_eq!(player.state(), PlayerState::Paused);

        player.resume().await.unwrap();
        assert_eq!(player.state(), PlayerState::Playing);

        player.stop().await.unwrap();
        assert_eq!(player.state(), PlayerState::Stopped);

        // Desde Stopped se puede volver a reproducir
        player.play_current().await.unwrap();
        assert_eq!(player.state(), PlayerState::Playing);
    }

    #[tokio::test]
    async fn test_pause_requires_playing() {
        let player = test_player();
        let err = player.pause().await.unwrap_err();
        assert!(matches!(err, NodeError::InvalidState(PlayerState::Disconnected)));
    }

    #[tokio::test]
    async fn test_resume_requires_paused() {
        let player = playing_player();
        let err = player.resume().await.unwrap_err();
        assert!(matches!(err, NodeError::InvalidState(PlayerState::Playing)));
    }

    #[tokio::test]
    async fn test_stop_requires_playback() {
        let player = test_player();
        player.force_state(PlayerState::Connected);
        let err = player.stop().await.unwrap_err();
        assert!(matches!(err, NodeError::InvalidState(PlayerState::Connected)));
    }

    #[tokio::test]
    async fn test_volume_bounds() {
        let player = playing_player();

        player.set_volume(0).await.unwrap();
        assert_eq!(player.volume(), 0);

        player.set_volume(1000).await.unwrap();
        assert_eq!(player.volume(), 1000);

        let err = player.set_volume(1001).await.unwrap_err();
        assert!(matches!(err, NodeError::VolumeOutOfRange(1001)));
        assert_eq!(player.volume(), 1000, "un volumen inválido no se guarda");
    }

    #[tokio::test]
    async fn test_seek_boundary_is_inclusive() {
        let player = playing_player();
        let duration = Duration::from_secs(180);

        player.seek(duration).await.unwrap();

        let err = player.seek(duration + Duration::from_millis(1)).await.unwrap_err();
        assert!(matches!(err, NodeError::SeekOutOfBounds { .. }));
    }

    #[tokio::test]
    async fn test_seek_requires_playback() {
        let player = test_player();
        let err = player.seek(Duration::from_secs(1)).await.unwrap_err();
        assert!(matches!(err, NodeError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_seek_rejects_streams() {
        let player = test_player();
        {
            let mut queue = player.queue_mut();
            let mut track = test_track("radio");
            track.is_stream = true;
            track.is_seekable = false;
            queue.add(track);
            queue.move_next();
        }
        player.force_state(PlayerState::Playing);

        let err = player.seek(Duration::ZERO).await.unwrap_err();
        assert!(matches!(err, NodeError::NotSeekable));
    }

    #[tokio::test]
    async fn test_filters_rescale_volume() {
        let player = playing_player();
        assert_eq!(player.volume(), DEFAULT_VOLUME);

        player
            .apply_filter(
                Filter::LowPass(crate::audio::filters::LowPass { smoothing: 20.0 }),
                0.5,
                Vec::new(),
            )
            .await
            .unwrap();
        assert_eq!(player.volume(), 50);

        player.apply_preset(&FilterPresets::flat()).await.unwrap();
        assert_eq!(player.volume(), 50, "multiplicador 1.0 no cambia el volumen");
    }

    #[tokio::test]
    async fn test_update_track_position() {
        let player = playing_player();
        player.update_track_position(9_000);
        assert_eq!(
            player.now_playing().unwrap().position(),
            Duration::from_secs(9)
        );
    }
}

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::{SinkExt, StreamExt};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::audio::player::Player;
use crate::config::NodeConfig;
use crate::error::{NodeError, Result};
use crate::events::{NodeEvent, NodeEvents};
use crate::gateway::{VoiceGateway, VoiceServerUpdate, VoiceStateUpdate};
use crate::ids::{ChannelId, GuildId};
use crate::protocol::incoming::{EventKind, EventMessage, IncomingMessage, NodeStats};
use crate::protocol::load_result::LoadResult;
use crate::protocol::rest::RestClient;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Tipo de búsqueda para `Node::search`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    /// URL directa, se manda tal cual
    Direct,
    YouTube,
    YouTubeMusic,
    SoundCloud,
}

impl SearchKind {
    /// Reescribe la consulta con el prefijo de la fuente
    pub fn wrap_query(self, query: &str) -> String {
        match self {
            SearchKind::Direct => query.to_string(),
            SearchKind::YouTube => format!("ytsearch:{query}"),
            SearchKind::YouTubeMusic => format!("ytmsearch:{query}"),
            SearchKind::SoundCloud => format!("scsearch:{query}"),
        }
    }
}

/// Resultado de una sesión de WebSocket: le dice al loop externo qué hacer.
enum SessionOutcome {
    /// El socket se cerró o falló: reintentar con backoff
    Dropped,
    /// Desconexión pedida localmente: terminar sin reconectar
    Shutdown,
}

/// Cliente del nodo Lavalink.
///
/// Una instancia por proceso de bot: mantiene la conexión WebSocket de
/// control, el cliente REST y el registro de players por guild. Clonarlo
/// es barato (comparte el mismo estado interno).
#[derive(Debug, Clone)]
pub struct Node {
    inner: Arc<NodeInner>,
}

struct NodeInner {
    config: NodeConfig,
    rest: Arc<RestClient>,
    gateway: Arc<dyn VoiceGateway>,
    players: DashMap<GuildId, Arc<Player>>,
    events: NodeEvents,
    connected: AtomicBool,
    stats: RwLock<Option<NodeStats>>,
    shutdown: RwLock<CancellationToken>,
    idle_timers: DashMap<GuildId, CancellationToken>,
    recv_task: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for NodeInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeInner")
            .field("endpoint", &self.config.ws_endpoint())
            .field("connected", &self.connected.load(Ordering::SeqCst))
            .field("players", &self.players.len())
            .finish()
    }
}

impl Node {
    pub fn new(config: NodeConfig, gateway: Arc<dyn VoiceGateway>) -> Result<Self> {
        config.validate()?;

        let events = NodeEvents::new();
        let rest = Arc::new(RestClient::new(&config, events.clone())?);

        Ok(Self {
            inner: Arc::new(NodeInner {
                config,
                rest,
                gateway,
                players: DashMap::new(),
                events,
                connected: AtomicBool::new(false),
                stats: RwLock::new(None),
                shutdown: RwLock::new(CancellationToken::new()),
                idle_timers: DashMap::new(),
                recv_task: Mutex::new(None),
            }),
        })
    }

    /// Crea un suscriptor del stream de eventos del nodo
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<NodeEvent> {
        self.inner.events.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::SeqCst)
    }

    /// Session id asignado por el nodo, una vez recibido el `ready`
    pub fn session_id(&self) -> Option<String> {
        self.inner.rest.session_id()
    }

    /// Último frame `stats` reportado por el nodo
    pub fn stats(&self) -> Option<NodeStats> {
        self.inner.stats.read().clone()
    }

    /// Abre la sesión con el nodo y arranca el loop de recepción.
    ///
    /// Reintenta el handshake hasta `reconnect_attempts` veces con backoff
    /// lineal (`reconnect_delay × intento` entre intentos) antes de fallar
    /// con `ConnectionFailed`. `disconnect` aborta el backoff en curso.
    pub async fn connect(&self) -> Result<()> {
        if self.is_connected() {
            return Err(NodeError::AlreadyConnected);
        }

        let cancel = CancellationToken::new();
        *self.inner.shutdown.write() = cancel.clone();

        info!("🎼 Conectando al nodo {}", self.inner.config.ws_endpoint());
        let ws = Self::connect_with_backoff(&self.inner, &cancel).await?;

        self.inner.connected.store(true, Ordering::SeqCst);
        info!("✅ Conexión de control establecida");

        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(Self::run(inner, ws, cancel));
        *self.inner.recv_task.lock() = Some(handle);

        Ok(())
    }

    /// Cierra la sesión: cancela el loop de recepción, espera a que termine
    /// y recién entonces devuelve. Ningún evento puede despacharse después.
    pub async fn disconnect(&self) -> Result<()> {
        if !self.is_connected() {
            return Err(NodeError::NotConnected);
        }

        self.inner.shutdown.read().cancel();

        let handle = self.inner.recv_task.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }

        self.inner.connected.store(false, Ordering::SeqCst);
        self.inner.rest.clear_session_id();
        info!("🔌 Nodo desconectado");
        Ok(())
    }

    /// Player del guild, si existe
    pub fn get_player(&self, guild_id: GuildId) -> Option<Arc<Player>> {
        self.inner
            .players
            .get(&guild_id)
            .map(|entry| Arc::clone(entry.value()))
    }

    pub fn has_player(&self, guild_id: GuildId) -> bool {
        self.inner.players.contains_key(&guild_id)
    }

    /// Cantidad de players activos
    pub fn player_count(&self) -> usize {
        self.inner.players.len()
    }

    /// Crea el player del guild y conecta el bot al canal de voz.
    ///
    /// Un guild admite un solo player: un `join` sobre un guild ocupado
    /// falla con `PlayerAlreadyExists` en lugar de pisar el existente.
    pub async fn join(
        &self,
        guild_id: GuildId,
        voice_channel: ChannelId,
        text_channel: ChannelId,
    ) -> Result<Arc<Player>> {
        if !self.is_connected() {
            return Err(NodeError::NotConnected);
        }

        let player = Arc::new(Player::new(
            guild_id,
            voice_channel,
            text_channel,
            Arc::clone(&self.inner.rest),
            Arc::clone(&self.inner.gateway),
            self.inner.config.self_deaf,
            self.inner.config.self_mute,
        ));

        match self.inner.players.entry(guild_id) {
            Entry::Occupied(_) => return Err(NodeError::PlayerAlreadyExists(guild_id)),
            Entry::Vacant(entry) => {
                entry.insert(Arc::clone(&player));
            }
        }

        if let Err(error) = player.connect().await {
            self.inner.players.remove(&guild_id);
            return Err(error);
        }

        Ok(player)
    }

    /// Destruye el player del guild: borra el player del nodo, saca al bot
    /// del canal de voz y elimina la entrada del registro.
    pub async fn leave(&self, guild_id: GuildId) -> Result<()> {
        self.cancel_idle_timer(guild_id);

        let (_, player) = self
            .inner
            .players
            .remove(&guild_id)
            .ok_or(NodeError::NoPlayer(guild_id))?;

        player.disconnect().await
    }

    /// Busca tracks en el nodo, reescribiendo la consulta según `kind`
    pub async fn search(&self, query: &str, kind: SearchKind) -> Result<LoadResult> {
        if !self.is_connected() {
            return Err(NodeError::NotConnected);
        }

        self.inner.rest.load_tracks(&kind.wrap_query(query)).await
    }

    /// Notificación voice-server-update del gateway anfitrión.
    ///
    /// Reenvía token/endpoint junto con el voice session id cacheado para
    /// que el nodo pueda unirse a la llamada. Sin player, se ignora.
    pub async fn handle_voice_server_update(&self, update: VoiceServerUpdate) -> Result<()> {
        let Some(player) = self.get_player(update.guild_id) else {
            return Ok(());
        };

        debug!("🛰️ voice-server-update para guild {}", update.guild_id);
        player
            .update_voice_server(&update.token, &update.endpoint)
            .await
    }

    /// Notificación voice-state-update del gateway anfitrión.
    ///
    /// Para el propio bot actualiza session id y canal (o hace el leave
    /// implícito si lo sacaron del canal). Para el resto de los usuarios
    /// maneja el timer de auto-desconexión por canal vacío.
    pub async fn handle_voice_state_update(&self, update: VoiceStateUpdate) -> Result<()> {
        if update.user_id == self.inner.config.user_id {
            return self.handle_own_voice_state(update).await;
        }

        if update.is_bot || !self.has_player(update.guild_id) {
            return Ok(());
        }

        match update.channel_id {
            // Alguien volvió a un canal: se cancela la auto-desconexión
            Some(_) => {
                self.cancel_idle_timer(update.guild_id);
                Ok(())
            }
            None => {
                if !self
                    .inner
                    .gateway
                    .has_non_bot_listeners(update.guild_id)
                    .await
                {
                    self.schedule_idle_leave(update.guild_id);
                }
                Ok(())
            }
        }
    }

    async fn handle_own_voice_state(&self, update: VoiceStateUpdate) -> Result<()> {
        match update.channel_id {
            Some(channel) => {
                let Some(player) = self.get_player(update.guild_id) else {
                    return Ok(());
                };

                if let Some(session_id) = update.session_id {
                    player.set_voice_session_id(session_id);
                }

                if player.voice_channel() != channel {
                    player.set_voice_channel(channel);
                    player.update_session_id().await?;
                }
                Ok(())
            }
            // Al bot lo sacaron del canal: leave implícito
            None => {
                if self.has_player(update.guild_id) {
                    info!(
                        "👋 El bot salió del canal de voz, limpiando player (guild {})",
                        update.guild_id
                    );
                    self.leave(update.guild_id).await
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Programa la auto-desconexión del guild. Reemplaza cualquier timer
    /// pendiente; la cancelación es idempotente.
    fn schedule_idle_leave(&self, guild_id: GuildId) {
        let token = CancellationToken::new();
        if let Some(previous) = self.inner.idle_timers.insert(guild_id, token.clone()) {
            previous.cancel();
        }

        let delay = self.inner.config.leave_delay;
        let node = self.clone();
        info!(
            "⏳ Canal sin oyentes, auto-desconexión en {}s (guild {})",
            delay.as_secs(),
            guild_id
        );

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    node.inner.idle_timers.remove(&guild_id);
                    if let Err(error) = node.leave(guild_id).await {
                        warn!("Error en la auto-desconexión de {}: {}", guild_id, error);
                    }
                }
            }
        });
    }

    fn cancel_idle_timer(&self, guild_id: GuildId) {
        if let Some((_, token)) = self.inner.idle_timers.remove(&guild_id) {
            token.cancel();
        }
    }

    fn build_request(config: &NodeConfig) -> Result<Request> {
        let header = |value: &str| {
            value
                .parse()
                .map_err(|_| NodeError::InvalidConfig(format!("header inválido: {value}")))
        };

        let mut request = config.ws_endpoint().into_client_request()?;
        let headers = request.headers_mut();
        headers.insert("User-Id", header(&config.user_id.to_string())?);
        headers.insert(
            "Client-Name",
            header(&format!("open-lavalink/{}", env!("CARGO_PKG_VERSION")))?,
        );
        headers.insert("Num-Shards", header(&config.shard_count.to_string())?);
        headers.insert("Authorization", header(&config.authorization)?);
        Ok(request)
    }

    async fn connect_with_backoff(
        inner: &Arc<NodeInner>,
        cancel: &CancellationToken,
    ) -> Result<WsStream> {
        let attempts = inner.config.reconnect_attempts;
        let base_delay = inner.config.reconnect_delay;

        for attempt in 1..=attempts {
            let request = Self::build_request(&inner.config)?;

            let result = tokio::select! {
                _ = cancel.cancelled() => return Err(NodeError::Cancelled),
                result = connect_async(request) => result,
            };

            match result {
                Ok((ws, _)) => return Ok(ws),
                Err(error) => {
                    let delay = base_delay * attempt;
                    warn!(
                        "⚠️ Handshake fallido (intento {}/{}): {}. Reintento en {:?}",
                        attempt, attempts, error, delay
                    );

                    tokio::select! {
                        _ = cancel.cancelled() => return Err(NodeError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }

        error!("❌ No se pudo conectar al nodo después de {} intentos", attempts);
        Err(NodeError::ConnectionFailed { attempts })
    }

    /// Loop externo de la conexión: corre sesiones y reconecta con el mismo
    /// backoff cuando una se cae sin que nadie pidiera desconectar.
    async fn run(inner: Arc<NodeInner>, ws: WsStream, cancel: CancellationToken) {
        let mut ws = ws;

        loop {
            match Self::run_session(&inner, ws, &cancel).await {
                SessionOutcome::Shutdown => break,
                SessionOutcome::Dropped => {
                    inner.rest.clear_session_id();
                    inner.events.emit(NodeEvent::NodeException {
                        message: "la conexión con el nodo se cortó, reconectando".to_string(),
                    });

                    match Self::connect_with_backoff(&inner, &cancel).await {
                        Ok(new_ws) => {
                            info!("🔄 Reconectado al nodo");
                            ws = new_ws;
                        }
                        Err(NodeError::Cancelled) => break,
                        Err(error) => {
                            error!("❌ Reconexión agotada: {}", error);
                            inner.events.emit(NodeEvent::NodeException {
                                message: error.to_string(),
                            });
                            break;
                        }
                    }
                }
            }
        }

        inner.connected.store(false, Ordering::SeqCst);
    }

    /// Una sesión de WebSocket: lee frames hasta que el socket se cierra o
    /// piden desconectar. Los frames malformados no tiran el loop.
    async fn run_session(
        inner: &Arc<NodeInner>,
        ws: WsStream,
        cancel: &CancellationToken,
    ) -> SessionOutcome {
        let (mut write, mut read) = ws.split();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    let _ = write.send(Message::Close(None)).await;
                    return SessionOutcome::Shutdown;
                }
                frame = read.next() => match frame {
                    Some(Ok(Message::Text(text))) => Self::handle_payload(inner, &text),
                    Some(Ok(Message::Ping(data))) => {
                        let _ = write.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(frame))) => {
                        info!("🔌 El nodo cerró la conexión: {:?}", frame);
                        return SessionOutcome::Dropped;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(error)) => {
                        warn!("⚠️ Error de lectura del WebSocket: {}", error);
                        inner.events.emit(NodeEvent::NodeException {
                            message: error.to_string(),
                        });
                        return SessionOutcome::Dropped;
                    }
                    None => {
                        debug!("El stream del WebSocket terminó sin frame de cierre");
                        return SessionOutcome::Dropped;
                    }
                }
            }
        }
    }

    /// Despacha un payload entrante según su `op`
    fn handle_payload(inner: &Arc<NodeInner>, text: &str) {
        let message: IncomingMessage = match serde_json::from_str(text) {
            Ok(message) => message,
            Err(error) => {
                warn!("⚠️ Payload inválido del nodo: {} ({})", error, text);
                inner.events.emit(NodeEvent::NodeException {
                    message: format!("payload inválido del nodo: {error}"),
                });
                return;
            }
        };

        match message {
            IncomingMessage::Ready {
                session_id,
                resumed,
            } => {
                info!("🎶 Sesión lista: {} (resumed: {})", session_id, resumed);
                inner.rest.set_session_id(session_id);
            }

            IncomingMessage::PlayerUpdate { guild_id, state } => {
                if !state.connected {
                    return;
                }

                // Un ping puede cruzarse con un leave: guild desconocido se ignora
                let Some(player) = Self::parse_guild(&guild_id)
                    .and_then(|id| inner.players.get(&id).map(|p| Arc::clone(p.value())))
                else {
                    return;
                };

                player.update_track_position(state.position);
            }

            IncomingMessage::Stats(stats) => {
                *inner.stats.write() = Some(stats);
            }

            IncomingMessage::Event(event) => Self::handle_event(inner, event),
        }
    }

    fn handle_event(inner: &Arc<NodeInner>, message: EventMessage) {
        let Some(player) = Self::parse_guild(&message.guild_id)
            .and_then(|id| inner.players.get(&id).map(|p| Arc::clone(p.value())))
        else {
            debug!("Evento para guild sin player: {}", message.guild_id);
            return;
        };

        match message.event {
            EventKind::TrackStart {} => {
                inner.events.emit(NodeEvent::TrackStarted { player });
            }
            EventKind::TrackEnd { reason } => {
                inner.events.emit(NodeEvent::TrackEnded { player, reason });
            }
            EventKind::TrackException { exception } => {
                inner
                    .events
                    .emit(NodeEvent::TrackException { player, exception });
            }
            EventKind::TrackStuck { threshold_ms } => {
                inner.events.emit(NodeEvent::TrackStuck {
                    player,
                    threshold: Duration::from_millis(threshold_ms),
                });
            }
            EventKind::WebSocketClosed { code, reason, .. } => {
                debug!(
                    "La conexión de voz del guild {} se cerró: {} {}",
                    message.guild_id, code, reason
                );
            }
        }
    }

    fn parse_guild(raw: &str) -> Option<GuildId> {
        raw.parse::<u64>().ok().map(GuildId)
    }
}

use parking_lot::RwLock;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Method;
use tracing::{debug, warn};

use crate::config::NodeConfig;
use crate::error::{NodeError, Result};
use crate::events::{NodeEvent, NodeEvents};
use crate::ids::GuildId;
use crate::protocol::load_result::{parse_load_result, LoadResult};
use crate::protocol::outgoing::PlayerUpdatePayload;

/// Cliente REST del nodo.
///
/// Compartido entre el nodo y sus players. Guarda el session id asignado
/// por el mensaje `ready`: hasta que llega, cualquier operación de player
/// falla con `NoSessionId` porque la URL sería inválida.
///
/// Las actualizaciones de player son best-effort: una respuesta con error
/// se publica como `NodeException` y no corta la operación que la originó.
/// El nodo sigue siendo la fuente de verdad vía `playerUpdate`.
#[derive(Debug)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
    events: NodeEvents,
    session_id: RwLock<Option<String>>,
}

impl RestClient {
    pub(crate) fn new(config: &NodeConfig, events: NodeEvents) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&config.authorization)
                .map_err(|_| NodeError::InvalidConfig("authorization no es ASCII".to_string()))?,
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base_url: config.rest_endpoint(),
            events,
            session_id: RwLock::new(None),
        })
    }

    pub(crate) fn set_session_id(&self, session_id: String) {
        *self.session_id.write() = Some(session_id);
    }

    pub(crate) fn session_id(&self) -> Option<String> {
        self.session_id.read().clone()
    }

    pub(crate) fn clear_session_id(&self) {
        *self.session_id.write() = None;
    }

    fn player_endpoint(&self, guild_id: GuildId) -> Result<String> {
        let session_id = self.session_id().ok_or(NodeError::NoSessionId)?;
        Ok(format!(
            "{}/sessions/{}/players/{}",
            self.base_url, session_id, guild_id
        ))
    }

    /// `PATCH sessions/{sessionId}/players/{guildId}`
    pub(crate) async fn update_player(
        &self,
        guild_id: GuildId,
        payload: &PlayerUpdatePayload,
    ) -> Result<()> {
        let endpoint = self.player_endpoint(guild_id)?;
        debug!("📤 PATCH {}", endpoint);

        self.send_best_effort(self.http.patch(&endpoint).json(payload))
            .await;
        Ok(())
    }

    /// `DELETE sessions/{sessionId}/players/{guildId}`
    pub(crate) async fn destroy_player(&self, guild_id: GuildId) -> Result<()> {
        let endpoint = self.player_endpoint(guild_id)?;
        debug!("📤 DELETE {}", endpoint);

        self.send_best_effort(self.http.request(Method::DELETE, &endpoint))
            .await;
        Ok(())
    }

    /// `GET loadtracks?identifier={query}`
    pub(crate) async fn load_tracks(&self, identifier: &str) -> Result<LoadResult> {
        let endpoint = format!(
            "{}/loadtracks?identifier={}",
            self.base_url,
            urlencoding::encode(identifier)
        );
        debug!("🔍 GET {}", endpoint);

        let response = self.http.get(&endpoint).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // El cuerpo de error suele traer igual un envelope loadType=error
            warn!("⚠️ loadtracks devolvió {}: {}", status, body);
            self.events.emit(NodeEvent::NodeException {
                message: body.clone(),
            });
        }

        parse_load_result(&body)
    }

    async fn send_best_effort(&self, request: reqwest::RequestBuilder) {
        match request.send().await {
            Ok(response) if response.status().is_success() => {}
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                warn!("⚠️ El nodo rechazó la actualización ({}): {}", status, body);
                self.events.emit(NodeEvent::NodeException {
                    message: if body.is_empty() {
                        format!("player update rechazado con {status}")
                    } else {
                        body
                    },
                });
            }
            Err(error) => {
                warn!("⚠️ Falla de transporte hacia el nodo: {}", error);
                self.events.emit(NodeEvent::NodeException {
                    message: error.to_string(),
                });
            }
        }
    }
}

//! Cliente Lavalink para bots de música de Discord.
//!
//! Mantiene la conexión de control (WebSocket + REST) con un nodo Lavalink
//! y un player por guild con su cola de reproducción. El gateway de Discord
//! queda del lado del bot, detrás del trait [`VoiceGateway`]: este crate
//! solo habla el protocolo del nodo.
//!
//! ```no_run
//! use std::sync::Arc;
//! use open_lavalink::{Node, NodeConfig, SearchKind, VoiceGateway};
//!
//! # async fn demo(gateway: Arc<dyn VoiceGateway>) -> open_lavalink::Result<()> {
//! let node = Node::new(NodeConfig::from_env()?, gateway)?;
//! node.connect().await?;
//!
//! let player = node.join(42.into(), 100.into(), 200.into()).await?;
//! let result = node.search("lofi hip hop", SearchKind::YouTube).await?;
//! if let Some(track) = result.tracks().first() {
//!     player.queue_mut().add(track.clone());
//!     player.play_next().await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod audio;
pub mod config;
pub mod error;
pub mod events;
pub mod gateway;
pub mod ids;
pub mod protocol;

pub use audio::filters::{EqualizerBand, Filter, FilterPreset, FilterPresets};
pub use audio::node::{Node, SearchKind};
pub use audio::player::{Player, PlayerState, DEFAULT_VOLUME, MAX_VOLUME, MIN_VOLUME};
pub use audio::queue::{LoopMode, TrackQueue};
pub use audio::track::Track;
pub use config::NodeConfig;
pub use error::{NodeError, Result};
pub use events::{ExceptionSeverity, NodeEvent, TrackEndReason, TrackException};
pub use gateway::{VoiceGateway, VoiceServerUpdate, VoiceStateUpdate};
pub use ids::{ChannelId, GuildId, UserId};
pub use protocol::load_result::LoadResult;
pub use protocol::incoming::NodeStats;

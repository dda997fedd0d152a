pub mod filters;
pub mod node;
pub mod player;
pub mod queue;
pub mod track;

pub use filters::{EqualizerBand, Filter, FilterPreset, FilterPresets};
pub use node::{Node, SearchKind};
pub use player::{Player, PlayerState, DEFAULT_VOLUME, MAX_VOLUME, MIN_VOLUME};
pub use queue::{LoopMode, TrackQueue};
pub use track::Track;

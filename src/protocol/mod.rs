pub mod incoming;
pub mod load_result;
pub mod outgoing;
pub mod rest;

pub use incoming::{EventKind, EventMessage, IncomingMessage, NodeStats, PlayerUpdateState};
pub use load_result::{parse_load_result, LoadResult};
pub use outgoing::{FilterPayload, PlayerUpdatePayload, VoiceStatePayload};
pub use rest::RestClient;

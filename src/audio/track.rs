use std::time::Duration;

/// Un track resuelto por el nodo, listo para reproducirse.
///
/// Inmutable salvo `position`, que solo actualiza el nodo cuando llegan
/// frames `playerUpdate`. La igualdad es por `identifier`.
#[derive(Debug, Clone)]
pub struct Track {
    /// Token opaco del nodo, requerido para iniciar la reproducción
    pub encoded: String,
    pub identifier: String,
    pub title: String,
    pub author: String,
    pub source_name: String,
    pub url: Option<String>,
    pub artwork_url: Option<String>,
    pub is_seekable: bool,
    pub is_stream: bool,
    /// Duración total. Es cero si el track es un stream en vivo.
    pub duration: Duration,
    position: Duration,
}

impl Track {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        encoded: String,
        identifier: String,
        title: String,
        author: String,
        source_name: String,
        url: Option<String>,
        artwork_url: Option<String>,
        is_seekable: bool,
        is_stream: bool,
        duration: Duration,
        position: Duration,
    ) -> Self {
        Self {
            encoded,
            identifier,
            title,
            author,
            source_name,
            url,
            artwork_url,
            is_seekable,
            is_stream,
            duration,
            position,
        }
    }

    /// Posición de reproducción reportada por el nodo
    pub fn position(&self) -> Duration {
        self.position
    }

    pub(crate) fn update_position(&mut self, position_ms: u64) {
        self.position = Duration::from_millis(position_ms);
    }
}

impl PartialEq for Track {
    fn eq(&self, other: &Self) -> bool {
        self.identifier == other.identifier
    }
}

impl Eq for Track {}

impl std::hash::Hash for Track {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.identifier.hash(state);
    }
}

#[cfg(test)]
pub(crate) fn test_track(identifier: &str) -> Track {
    Track::new(
        format!("encoded:{identifier}"),
        identifier.to_string(),
        format!("title {identifier}"),
        "author".to_string(),
        "youtube".to_string(),
        None,
        None,
        true,
        false,
        Duration::from_secs(180),
        Duration::ZERO,
    )
}

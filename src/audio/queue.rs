use rand::seq::SliceRandom;
use tracing::debug;

use crate::audio::track::Track;
use crate::error::{NodeError, Result};

/// Modo de repetición de la cola
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopMode {
    #[default]
    None,
    One,
    All,
}

impl LoopMode {
    /// Siguiente modo en el ciclo None -> One -> All -> None
    pub fn next(self) -> Self {
        match self {
            LoopMode::None => LoopMode::One,
            LoopMode::One => LoopMode::All,
            LoopMode::All => LoopMode::None,
        }
    }
}

/// Cola de tracks con cursor de reproducción.
///
/// El cursor `current` vale -1 cuando todavía no se reprodujo nada y puede
/// quedar en `len` (uno después del último) para señalar fin de cola.
/// Insertar o borrar antes del cursor lo desplaza para que el track actual
/// siga siendo el mismo. La cola no sincroniza nada: el dueño (el player)
/// serializa el acceso.
#[derive(Debug)]
pub struct TrackQueue {
    tracks: Vec<Track>,
    current: isize,
    pub loop_mode: LoopMode,
}

impl Default for TrackQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackQueue {
    pub fn new() -> Self {
        Self {
            tracks: Vec::new(),
            current: -1,
            loop_mode: LoopMode::None,
        }
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Índice del track actual (-1 = ninguno, len = fin de cola)
    pub fn current(&self) -> isize {
        self.current
    }

    /// Track actual, si el cursor apunta a uno
    pub fn current_track(&self) -> Option<&Track> {
        if self.current >= 0 && (self.current as usize) < self.tracks.len() {
            self.tracks.get(self.current as usize)
        } else {
            None
        }
    }

    pub(crate) fn current_track_mut(&mut self) -> Option<&mut Track> {
        if self.current >= 0 && (self.current as usize) < self.tracks.len() {
            self.tracks.get_mut(self.current as usize)
        } else {
            None
        }
    }

    /// Agrega un track al final de la cola
    pub fn add(&mut self, track: Track) {
        debug!("➕ Track agregado a la cola: {}", track.title);
        self.tracks.push(track);
    }

    /// Agrega varios tracks al final (playlist)
    pub fn add_all(&mut self, tracks: impl IntoIterator<Item = Track>) {
        let before = self.tracks.len();
        self.tracks.extend(tracks);
        debug!("➕ {} tracks agregados a la cola", self.tracks.len() - before);
    }

    /// Inserta un track en `index`, desplazando el cursor si hace falta
    pub fn insert_at(&mut self, track: Track, index: usize) -> Result<()> {
        if index > self.tracks.len() {
            return Err(NodeError::IndexOutOfRange {
                index,
                len: self.tracks.len(),
            });
        }

        self.tracks.insert(index, track);
        if index as isize <= self.current {
            self.current += 1;
        }

        Ok(())
    }

    /// Quita y devuelve el track en `index`, desplazando el cursor si hace falta
    pub fn remove_at(&mut self, index: usize) -> Result<Track> {
        if index >= self.tracks.len() {
            return Err(NodeError::IndexOutOfRange {
                index,
                len: self.tracks.len(),
            });
        }

        let removed = self.tracks.remove(index);
        if index as isize <= self.current {
            self.current -= 1;
        }

        Ok(removed)
    }

    /// Quita el primer track con el mismo identificador; devuelve si lo encontró
    pub fn remove(&mut self, track: &Track) -> bool {
        match self.tracks.iter().position(|t| t == track) {
            Some(index) => self.remove_at(index).is_ok(),
            None => false,
        }
    }

    pub fn contains(&self, track: &Track) -> bool {
        self.tracks.iter().any(|t| t == track)
    }

    /// Vacía la cola y resetea el cursor
    pub fn clear(&mut self) {
        self.tracks.clear();
        self.current = -1;
        debug!("🗑️ Cola limpiada");
    }

    /// Avanza el cursor. Con `LoopMode::All` da la vuelta; si no, se queda
    /// en `len` (fin de cola, sin track actual).
    pub fn move_next(&mut self) {
        if self.tracks.is_empty() || self.loop_mode == LoopMode::One {
            return;
        }

        self.current += 1;
        if self.current as usize >= self.tracks.len() {
            self.current = if self.loop_mode == LoopMode::All {
                0
            } else {
                self.tracks.len() as isize
            };
        }
    }

    /// Retrocede el cursor. Con `LoopMode::All` da la vuelta; si no, se queda
    /// en -1.
    pub fn move_previous(&mut self) {
        if self.tracks.is_empty() || self.loop_mode == LoopMode::One {
            return;
        }

        self.current -= 1;
        if self.current < 0 {
            self.current = if self.loop_mode == LoopMode::All {
                self.tracks.len() as isize - 1
            } else {
                -1
            };
        }
    }

    pub fn has_next(&self) -> bool {
        self.loop_mode == LoopMode::All || self.current < self.tracks.len() as isize - 1
    }

    pub fn has_previous(&self) -> bool {
        self.loop_mode == LoopMode::All || self.current > 0
    }

    /// Mezcla la cola dejando el track actual donde está
    pub fn shuffle(&mut self) {
        if self.tracks.len() <= 1 {
            return;
        }

        let mut rng = rand::thread_rng();
        if self.current_track().is_some() {
            let current = self.current as usize;
            let (before, rest) = self.tracks.split_at_mut(current);
            before.shuffle(&mut rng);
            rest[1..].shuffle(&mut rng);
        } else {
            // Sin track actual no hay nada que preservar
            self.tracks.shuffle(&mut rng);
        }
        debug!("🔀 Cola mezclada");
    }

    /// Pasa al siguiente modo de repetición y lo devuelve
    pub fn cycle_loop_mode(&mut self) -> LoopMode {
        self.loop_mode = self.loop_mode.next();
        self.loop_mode
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Track> {
        self.tracks.iter()
    }
}

impl<'a> IntoIterator for &'a TrackQueue {
    type Item = &'a Track;
    type IntoIter = std::slice::Iter<'a, Track>;

    fn into_iter(self) -> Self::IntoIter {
        self.tracks.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::track::test_track;
    use pretty_assertions::assert_eq;

    fn queue_of(ids: &[&str]) -> TrackQueue {
        let mut queue = TrackQueue::new();
        queue.add_all(ids.iter().map(|id| test_track(id)));
        queue
    }

    #[test]
    fn test_starts_empty_without_current() {
        let queue = TrackQueue::new();
        assert_eq!(queue.len(), 0);
        assert_eq!(queue.current(), -1);
        assert!(queue.current_track().is_none());
    }

    #[test]
    fn test_move_next_selects_first_track() {
        let mut queue = queue_of(&["a", "b"]);
        queue.move_next();
        assert_eq!(queue.current(), 0);
        assert_eq!(queue.current_track().unwrap().identifier, "a");
    }

    #[test]
    fn test_insert_before_current_shifts_cursor() {
        let mut queue = queue_of(&["a", "b", "c"]);
        queue.move_next();
        queue.move_next(); // current = 1 ("b")

        queue.insert_at(test_track("x"), 0).unwrap();
        assert_eq!(queue.current(), 2);
        assert_eq!(queue.current_track().unwrap().identifier, "b");
    }

    #[test]
    fn test_insert_after_current_keeps_cursor() {
        let mut queue = queue_of(&["a", "b", "c"]);
        queue.move_next(); // current = 0

        queue.insert_at(test_track("x"), 2).unwrap();
        assert_eq!(queue.current(), 0);
        assert_eq!(queue.current_track().unwrap().identifier, "a");
    }

    #[test]
    fn test_remove_before_current_shifts_cursor() {
        let mut queue = queue_of(&["a", "b", "c"]);
        queue.move_next();
        queue.move_next(); // current = 1 ("b")

        let removed = queue.remove_at(0).unwrap();
        assert_eq!(removed.identifier, "a");
        assert_eq!(queue.current(), 0);
        assert_eq!(queue.current_track().unwrap().identifier, "b");
    }

    #[test]
    fn test_remove_at_out_of_range() {
        let mut queue = queue_of(&["a"]);
        let err = queue.remove_at(3).unwrap_err();
        assert!(matches!(
            err,
            NodeError::IndexOutOfRange { index: 3, len: 1 }
        ));
    }

    #[test]
    fn test_remove_by_identity() {
        let mut queue = queue_of(&["a", "b"]);
        assert!(queue.remove(&test_track("b")));
        assert!(!queue.remove(&test_track("zzz")));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_move_next_stops_past_last() {
        let mut queue = queue_of(&["a", "b", "c"]);
        for _ in 0..3 {
            queue.move_next();
        }
        assert_eq!(queue.current(), 2);

        queue.move_next();
        assert_eq!(queue.current(), 3);
        assert!(queue.current_track().is_none());

        // Un move_next más no pasa de ahí
        queue.move_next();
        assert_eq!(queue.current(), 3);
    }

    #[test]
    fn test_move_previous_stops_before_first() {
        let mut queue = queue_of(&["a", "b"]);
        queue.move_previous();
        assert_eq!(queue.current(), -1);
        queue.move_previous();
        assert_eq!(queue.current(), -1);
    }

    #[test]
    fn test_loop_all_wraps_both_ways() {
        let mut queue = queue_of(&["a", "b", "c"]);
        queue.loop_mode = LoopMode::All;
        for _ in 0..3 {
            queue.move_next();
        }
        // current = 2, el siguiente da la vuelta
        queue.move_next();
        assert_eq!(queue.current(), 0);

        queue.move_previous();
        assert_eq!(queue.current(), 2);
    }

    #[test]
    fn test_loop_one_freezes_cursor() {
        let mut queue = queue_of(&["a", "b"]);
        queue.move_next();
        queue.loop_mode = LoopMode::One;

        queue.move_next();
        queue.move_previous();
        assert_eq!(queue.current(), 0);
    }

    #[test]
    fn test_has_next_and_previous() {
        let mut queue = queue_of(&["a", "b"]);
        queue.move_next(); // current = 0
        assert!(queue.has_next());
        assert!(!queue.has_previous());

        queue.move_next(); // current = 1
        assert!(!queue.has_next());
        assert!(queue.has_previous());

        queue.loop_mode = LoopMode::All;
        assert!(queue.has_next());
        assert!(queue.has_previous());
    }

    #[test]
    fn test_shuffle_preserves_current() {
        let ids: Vec<String> = (0..40).map(|i| format!("t{i}")).collect();
        let mut queue = TrackQueue::new();
        queue.add_all(ids.iter().map(|id| test_track(id)));
        for _ in 0..20 {
            queue.move_next();
        }
        let current_before = queue.current_track().unwrap().identifier.clone();

        queue.shuffle();

        assert_eq!(queue.len(), 40);
        assert_eq!(
            queue.current_track().unwrap().identifier,
            current_before,
            "el track actual tiene que sobrevivir al shuffle"
        );
    }

    #[test]
    fn test_shuffle_single_track_is_noop() {
        let mut queue = queue_of(&["a"]);
        queue.move_next();
        queue.shuffle();
        assert_eq!(queue.current_track().unwrap().identifier, "a");
    }

    #[test]
    fn test_clear_resets_cursor() {
        let mut queue = queue_of(&["a", "b"]);
        queue.move_next();
        queue.clear();
        assert!(queue.is_empty());
        assert_eq!(queue.current(), -1);
    }

    #[test]
    fn test_cycle_loop_mode() {
        let mut queue = TrackQueue::new();
        assert_eq!(queue.cycle_loop_mode(), LoopMode::One);
        assert_eq!(queue.cycle_loop_mode(), LoopMode::All);
        assert_eq!(queue.cycle_loop_mode(), LoopMode::None);
    }
}

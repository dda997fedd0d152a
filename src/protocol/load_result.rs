use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use crate::audio::track::Track;
use crate::error::{NodeError, Result};
use crate::events::TrackException;

/// Resultado de una búsqueda o resolución de tracks en el nodo
#[derive(Debug, Clone)]
pub enum LoadResult {
    /// Sin resultados
    Empty,
    /// La carga falló en el nodo
    Error(TrackException),
    /// Un único track (URL directa)
    Track(Track),
    /// Resultados de búsqueda, sin metadata de playlist
    Search(Vec<Track>),
    /// Una playlist completa
    Playlist {
        name: String,
        selected_track: i64,
        tracks: Vec<Track>,
    },
}

impl LoadResult {
    /// Tracks del resultado, sin importar la variante
    pub fn tracks(&self) -> &[Track] {
        match self {
            LoadResult::Track(track) => std::slice::from_ref(track),
            LoadResult::Search(tracks) => tracks,
            LoadResult::Playlist { tracks, .. } => tracks,
            _ => &[],
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoadResultEnvelope {
    load_type: String,
    #[serde(default)]
    data: Value,
}

#[derive(Deserialize)]
struct TrackData {
    encoded: String,
    info: TrackInfo,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrackInfo {
    identifier: String,
    title: String,
    author: String,
    source_name: String,
    #[serde(default)]
    uri: Option<String>,
    #[serde(default)]
    artwork_url: Option<String>,
    is_seekable: bool,
    is_stream: bool,
    #[serde(default)]
    length: u64,
    #[serde(default)]
    position: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistData {
    info: PlaylistInfo,
    tracks: Vec<TrackData>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistInfo {
    name: String,
    #[serde(default)]
    selected_track: i64,
}

impl From<TrackData> for Track {
    fn from(data: TrackData) -> Self {
        let info = data.info;

        // El nodo no reporta duración ni posición con sentido para streams
        let (duration, position) = if info.is_stream {
            (Duration::ZERO, Duration::ZERO)
        } else {
            (
                Duration::from_millis(info.length),
                Duration::from_millis(info.position),
            )
        };

        Track::new(
            data.encoded,
            info.identifier,
            info.title,
            info.author,
            info.source_name,
            info.uri,
            info.artwork_url,
            info.is_seekable,
            info.is_stream,
            duration,
            position,
        )
    }
}

/// Interpreta la respuesta del endpoint `loadtracks`, discriminada por
/// `loadType`. Un discriminador desconocido es un error de parseo fatal.
pub fn parse_load_result(body: &str) -> Result<LoadResult> {
    let envelope: LoadResultEnvelope = serde_json::from_str(body)?;

    match envelope.load_type.as_str() {
        "empty" => Ok(LoadResult::Empty),
        "error" => {
            let exception: TrackException = serde_json::from_value(envelope.data)?;
            Ok(LoadResult::Error(exception))
        }
        "track" => {
            let track: TrackData = serde_json::from_value(envelope.data)?;
            Ok(LoadResult::Track(track.into()))
        }
        "search" => {
            let tracks: Vec<TrackData> = serde_json::from_value(envelope.data)?;
            Ok(LoadResult::Search(tracks.into_iter().map(Track::from).collect()))
        }
        "playlist" => {
            let playlist: PlaylistData = serde_json::from_value(envelope.data)?;
            Ok(LoadResult::Playlist {
                name: playlist.info.name,
                selected_track: playlist.info.selected_track,
                tracks: playlist.tracks.into_iter().map(Track::from).collect(),
            })
        }
        other => Err(NodeError::UnsupportedLoadType(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ExceptionSeverity;
    use pretty_assertions::assert_eq;

    fn track_json(identifier: &str, is_stream: bool) -> String {
        format!(
            r#"{{
                "encoded": "enc:{identifier}",
                "info": {{
                    "identifier": "{identifier}",
                    "isSeekable": {seekable},
                    "author": "Autor",
                    "length": 212000,
                    "isStream": {is_stream},
                    "position": 1000,
                    "title": "Una canción",
                    "uri": "https://youtu.be/{identifier}",
                    "artworkUrl": null,
                    "sourceName": "youtube"
                }}
            }}"#,
            seekable = !is_stream,
        )
    }

    #[test]
    fn test_parse_empty() {
        let result = parse_load_result(r#"{"loadType":"empty","data":{}}"#).unwrap();
        assert!(matches!(result, LoadResult::Empty));
    }

    #[test]
    fn test_parse_error() {
        let body = r#"{
            "loadType": "error",
            "data": {"message": "no se pudo", "severity": "common", "cause": "upstream"}
        }"#;
        match parse_load_result(body).unwrap() {
            LoadResult::Error(exception) => {
                assert_eq!(exception.message.as_deref(), Some("no se pudo"));
                assert_eq!(exception.severity, ExceptionSeverity::Common);
                assert_eq!(exception.cause, "upstream");
            }
            other => panic!("resultado inesperado: {:?}", other),
        }
    }

    #[test]
    fn test_parse_single_track() {
        let body = format!(
            r#"{{"loadType":"track","data":{}}}"#,
            track_json("dQw4w9WgXcQ", false)
        );
        match parse_load_result(&body).unwrap() {
            LoadResult::Track(track) => {
                assert_eq!(track.identifier, "dQw4w9WgXcQ");
                assert_eq!(track.encoded, "enc:dQw4w9WgXcQ");
                assert_eq!(track.duration, Duration::from_millis(212_000));
                assert!(track.is_seekable);
            }
            other => panic!("resultado inesperado: {:?}", other),
        }
    }

    #[test]
    fn test_parse_search_list() {
        let body = format!(
            r#"{{"loadType":"search","data":[{},{}]}}"#,
            track_json("aaa", false),
            track_json("bbb", false)
        );
        match parse_load_result(&body).unwrap() {
            LoadResult::Search(tracks) => {
                assert_eq!(tracks.len(), 2);
                assert_eq!(tracks[0].identifier, "aaa");
                assert_eq!(tracks[1].identifier, "bbb");
            }
            other => panic!("resultado inesperado: {:?}", other),
        }
    }

    #[test]
    fn test_parse_playlist() {
        let body = format!(
            r#"{{
                "loadType": "playlist",
                "data": {{
                    "info": {{"name": "Mi playlist", "selectedTrack": 1}},
                    "pluginInfo": {{}},
                    "tracks": [{},{}]
                }}
            }}"#,
            track_json("aaa", false),
            track_json("bbb", false)
        );
        match parse_load_result(&body).unwrap() {
            LoadResult::Playlist {
                name,
                selected_track,
                tracks,
            } => {
                assert_eq!(name, "Mi playlist");
                assert_eq!(selected_track, 1);
                assert_eq!(tracks.len(), 2);
            }
            other => panic!("resultado inesperado: {:?}", other),
        }
    }

    #[test]
    fn test_stream_tracks_get_zero_duration() {
        let body = format!(
            r#"{{"loadType":"track","data":{}}}"#,
            track_json("radio", true)
        );
        match parse_load_result(&body).unwrap() {
            LoadResult::Track(track) => {
                assert!(track.is_stream);
                assert_eq!(track.duration, Duration::ZERO);
                assert_eq!(track.position(), Duration::ZERO);
            }
            other => panic!("resultado inesperado: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_load_type_fails() {
        let err = parse_load_result(r#"{"loadType":"banana","data":{}}"#).unwrap_err();
        assert!(matches!(err, NodeError::UnsupportedLoadType(kind) if kind == "banana"));
    }

    #[test]
    fn test_tracks_accessor() {
        assert!(LoadResult::Empty.tracks().is_empty());

        let body = format!(
            r#"{{"loadType":"search","data":[{}]}}"#,
            track_json("aaa", false)
        );
        let result = parse_load_result(&body).unwrap();
        assert_eq!(result.tracks().len(), 1);
    }
}

use serde::Serialize;

use crate::audio::filters::{
    ChannelMix, Distortion, EqualizerBand, Filter, Karaoke, LowPass, Rotation, Timescale, Tremolo,
    Vibrato,
};

/// Cuerpo del `PATCH sessions/{sessionId}/players/{guildId}`.
///
/// Todos los campos son opcionales: solo se serializa lo presente.
/// `encoded_track` distingue tres casos: ausente (no tocar el track),
/// `Some(Some(t))` (reproducir `t`) y `Some(None)` (el centinela `null`
/// que detiene la reproducción).
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerUpdatePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoded_track: Option<Option<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<u16>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub paused: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<FilterPayload>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<VoiceStatePayload>,
}

/// Credenciales de voz que el nodo necesita para unirse a la llamada
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceStatePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Payload `filters` compuesto: cada filtro del conjunto cae en su campo
/// del wire.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub equalizer: Option<Vec<EqualizerBand>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub karaoke: Option<Karaoke>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub timescale: Option<Timescale>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tremolo: Option<Tremolo>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub vibrato: Option<Vibrato>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<Rotation>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub distortion: Option<Distortion>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_mix: Option<ChannelMix>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_pass: Option<LowPass>,
}

impl FilterPayload {
    pub fn new(
        filters: impl IntoIterator<Item = Filter>,
        volume: f32,
        bands: Vec<EqualizerBand>,
    ) -> Self {
        let mut payload = Self {
            volume: Some(volume),
            equalizer: Some(bands),
            ..Self::default()
        };

        for filter in filters {
            payload.set(filter);
        }

        payload
    }

    fn set(&mut self, filter: Filter) {
        match filter {
            Filter::Karaoke(karaoke) => self.karaoke = Some(karaoke),
            Filter::Timescale(timescale) => self.timescale = Some(timescale),
            Filter::Tremolo(tremolo) => self.tremolo = Some(tremolo),
            Filter::Vibrato(vibrato) => self.vibrato = Some(vibrato),
            Filter::Rotation(rotation) => self.rotation = Some(rotation),
            Filter::Distortion(distortion) => self.distortion = Some(distortion),
            Filter::ChannelMix(channel_mix) => self.channel_mix = Some(channel_mix),
            Filter::LowPass(low_pass) => self.low_pass = Some(low_pass),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::filters::flat_bands;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_absent_fields_are_omitted() {
        let payload = PlayerUpdatePayload {
            paused: Some(true),
            ..PlayerUpdatePayload::default()
        };
        let json = serde_json::to_string(&payload).unwrap();
        assert_eq!(json, r#"{"paused":true}"#);
    }

    #[test]
    fn test_play_serializes_encoded_track() {
        let payload = PlayerUpdatePayload {
            encoded_track: Some(Some("XYZ".to_string())),
            ..PlayerUpdatePayload::default()
        };
        let json = serde_json::to_string(&payload).unwrap();
        assert_eq!(json, r#"{"encodedTrack":"XYZ"}"#);
    }

    #[test]
    fn test_stop_sentinel_is_literal_null() {
        let payload = PlayerUpdatePayload {
            encoded_track: Some(None),
            ..PlayerUpdatePayload::default()
        };
        let json = serde_json::to_string(&payload).unwrap();
        assert_eq!(json, r#"{"encodedTrack":null}"#);
    }

    #[test]
    fn test_filter_payload_composition() {
        use crate::audio::filters::{Filter, LowPass, Timescale};

        let payload = FilterPayload::new(
            [
                Filter::Timescale(Timescale {
                    speed: 1.3,
                    pitch: 1.3,
                    rate: 1.0,
                }),
                Filter::LowPass(LowPass { smoothing: 20.0 }),
            ],
            1.0,
            flat_bands(),
        );

        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("timescale").is_some());
        assert!(json.get("lowPass").is_some());
        assert!(json.get("karaoke").is_none());
        assert_eq!(json["equalizer"].as_array().unwrap().len(), 15);
    }

    #[test]
    fn test_voice_payload_session_only() {
        let payload = VoiceStatePayload {
            session_id: Some("abc".to_string()),
            ..VoiceStatePayload::default()
        };
        let json = serde_json::to_string(&payload).unwrap();
        assert_eq!(json, r#"{"sessionId":"abc"}"#);
    }
}

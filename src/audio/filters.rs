use serde::Serialize;

use crate::error::{NodeError, Result};

/// Banda del ecualizador de 15 bandas del nodo.
///
/// La ganancia va de -0.25 (banda silenciada) a 1.0 (cuadruplica la banda).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EqualizerBand {
    band: u8,
    gain: f32,
}

impl EqualizerBand {
    pub fn new(band: u8, gain: f32) -> Result<Self> {
        if band > 14 {
            return Err(NodeError::InvalidEqualizerBand(format!(
                "hay 15 bandas (0 a 14), se pidió la {band}"
            )));
        }

        if !(-0.25..=1.0).contains(&gain) {
            return Err(NodeError::InvalidEqualizerBand(format!(
                "la ganancia {gain} está fuera del rango -0.25..=1.0"
            )));
        }

        Ok(Self { band, gain })
    }

    pub fn band(&self) -> u8 {
        self.band
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }
}

/// Ecualizador plano de 15 bandas
pub fn flat_bands() -> Vec<EqualizerBand> {
    (0..15).map(|band| EqualizerBand { band, gain: 0.0 }).collect()
}

fn bands_from(gains: [f32; 15]) -> Vec<EqualizerBand> {
    gains
        .into_iter()
        .enumerate()
        .map(|(band, gain)| EqualizerBand {
            band: band as u8,
            gain,
        })
        .collect()
}

/// Elimina parte de una banda por ecualización, normalmente las voces
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Karaoke {
    pub level: f32,
    pub mono_level: f32,
    pub filter_band: f32,
    pub filter_width: f32,
}

/// Cambia velocidad, tono y rate. Todos arrancan en 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Timescale {
    pub speed: f32,
    pub pitch: f32,
    pub rate: f32,
}

impl Default for Timescale {
    fn default() -> Self {
        Self {
            speed: 1.0,
            pitch: 1.0,
            rate: 1.0,
        }
    }
}

/// Oscila el volumen rápidamente (efecto de temblor)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tremolo {
    pub frequency: f32,
    pub depth: f32,
}

/// Como el tremolo, pero oscila el tono en lugar del volumen
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Vibrato {
    pub frequency: f32,
    pub depth: f32,
}

/// Rota el audio entre los canales estéreo (audio panning)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rotation {
    pub rotation_hz: f32,
}

/// Distorsión trigonométrica del audio
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Distortion {
    pub sin_offset: f32,
    pub sin_scale: f32,
    pub cos_offset: f32,
    pub cos_scale: f32,
    pub tan_offset: f32,
    pub tan_scale: f32,
    pub offset: f32,
    pub scale: f32,
}

/// Mezcla ambos canales entre sí. Con 0.5 en todos los factores los dos
/// canales reciben el mismo audio.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelMix {
    pub left_to_left: f32,
    pub left_to_right: f32,
    pub right_to_left: f32,
    pub right_to_right: f32,
}

/// Suprime las frecuencias altas. Smoothing <= 1.0 desactiva el filtro.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LowPass {
    pub smoothing: f32,
}

/// Conjunto cerrado de filtros DSP que entiende el nodo
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Filter {
    Karaoke(Karaoke),
    Timescale(Timescale),
    Tremolo(Tremolo),
    Vibrato(Vibrato),
    Rotation(Rotation),
    Distortion(Distortion),
    ChannelMix(ChannelMix),
    LowPass(LowPass),
}

/// Preset de filtros: multiplicador de volumen, 15 bandas de ecualizador
/// y cero o más filtros DSP. Inmutable una vez construido.
#[derive(Debug, Clone)]
pub struct FilterPreset {
    pub name: &'static str,
    pub volume: f32,
    pub bands: Vec<EqualizerBand>,
    pub filters: Vec<Filter>,
}

/// Catálogo fijo de presets
pub struct FilterPresets;

impl FilterPresets {
    pub fn flat() -> FilterPreset {
        FilterPreset {
            name: "Flat",
            volume: 1.0,
            bands: flat_bands(),
            filters: Vec::new(),
        }
    }

    pub fn bass() -> FilterPreset {
        FilterPreset {
            name: "Bass",
            volume: 1.0,
            bands: bands_from([
                0.6, 0.7, 0.8, 0.55, 0.25, 0.0, -0.25, -0.25, -0.25, -0.25, -0.25, -0.25, 0.0,
                0.0, 0.0,
            ]),
            filters: Vec::new(),
        }
    }

    pub fn classical() -> FilterPreset {
        FilterPreset {
            name: "Classical",
            volume: 1.0,
            bands: bands_from([
                0.375, 0.35, 0.125, 0.0, 0.0, 0.125, 0.55, 0.5, 0.125, 0.25, 0.2, 0.25, 0.3,
                0.25, 0.3,
            ]),
            filters: Vec::new(),
        }
    }

    pub fn electronic() -> FilterPreset {
        FilterPreset {
            name: "Electronic",
            volume: 1.0,
            bands: bands_from([
                0.375, 0.35, 0.125, 0.0, 0.0, -0.125, -0.125, 0.0, 0.25, 0.125, 0.15, 0.2, 0.25,
                0.35, 0.4,
            ]),
            filters: Vec::new(),
        }
    }

    pub fn rock() -> FilterPreset {
        FilterPreset {
            name: "Rock",
            volume: 1.0,
            bands: bands_from([
                0.3, 0.25, 0.2, 0.1, 0.05, -0.05, -0.15, -0.2, -0.1, -0.05, 0.05, 0.1, 0.2, 0.25,
                0.3,
            ]),
            filters: Vec::new(),
        }
    }

    pub fn soft() -> FilterPreset {
        FilterPreset {
            name: "Soft",
            volume: 1.0,
            bands: flat_bands(),
            filters: vec![Filter::LowPass(LowPass { smoothing: 20.0 })],
        }
    }

    pub fn eight_dimensional() -> FilterPreset {
        FilterPreset {
            name: "8D",
            volume: 1.0,
            bands: flat_bands(),
            filters: vec![Filter::Rotation(Rotation { rotation_hz: 0.2 })],
        }
    }

    pub fn nightcore() -> FilterPreset {
        FilterPreset {
            name: "Nightcore",
            volume: 1.0,
            bands: flat_bands(),
            filters: vec![Filter::Timescale(Timescale {
                speed: 1.3,
                pitch: 1.3,
                rate: 1.0,
            })],
        }
    }

    pub fn love_nightcore() -> FilterPreset {
        FilterPreset {
            name: "LoveNightcore",
            volume: 1.0,
            bands: flat_bands(),
            filters: vec![Filter::Timescale(Timescale {
                speed: 1.1,
                pitch: 1.2,
                rate: 1.0,
            })],
        }
    }

    pub fn tremolo() -> FilterPreset {
        FilterPreset {
            name: "Tremolo",
            volume: 1.0,
            bands: flat_bands(),
            filters: vec![Filter::Tremolo(Tremolo {
                frequency: 10.0,
                depth: 0.5,
            })],
        }
    }

    pub fn vibrato() -> FilterPreset {
        FilterPreset {
            name: "Vibrato",
            volume: 1.0,
            bands: flat_bands(),
            filters: vec![Filter::Vibrato(Vibrato {
                frequency: 10.0,
                depth: 0.9,
            })],
        }
    }

    /// Busca un preset por nombre
    pub fn get(name: &str) -> Option<FilterPreset> {
        match name.to_lowercase().as_str() {
            "flat" => Some(Self::flat()),
            "bass" => Some(Self::bass()),
            "classical" => Some(Self::classical()),
            "electronic" => Some(Self::electronic()),
            "rock" => Some(Self::rock()),
            "soft" => Some(Self::soft()),
            "8d" => Some(Self::eight_dimensional()),
            "nightcore" => Some(Self::nightcore()),
            "lovenightcore" => Some(Self::love_nightcore()),
            "tremolo" => Some(Self::tremolo()),
            "vibrato" => Some(Self::vibrato()),
            _ => None,
        }
    }

    /// Lista todos los presets disponibles
    pub fn names() -> &'static [&'static str] {
        &[
            "flat",
            "bass",
            "classical",
            "electronic",
            "rock",
            "soft",
            "8d",
            "nightcore",
            "lovenightcore",
            "tremolo",
            "vibrato",
        ]
    }
}

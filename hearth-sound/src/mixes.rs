//! Soundscape mix catalog
//!
//! A mix is a named set of looping layers, each with its own base gain.
//! The catalog is read-only once built.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Kind of sound a layer carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerType {
    Nature,
    White,
    Brown,
    Pink,
    Music,
}

/// One looping layer of a mix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerConfig {
    pub id: String,
    #[serde(rename = "type")]
    pub layer_type: LayerType,
    /// Asset reference, e.g. `/audio/soundscapes/rain.ogg`
    pub file: String,
    /// Base gain, 0.0-1.0
    pub gain: f32,
    /// Loop region start in seconds
    #[serde(default)]
    pub loop_start: Option<f64>,
    /// Loop region end in seconds
    #[serde(default)]
    pub loop_end: Option<f64>,
}

/// A named soundscape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixConfig {
    pub id: String,
    pub title: String,
    pub layers: Vec<LayerConfig>,
}

/// Read-only set of mixes, looked up by id
#[derive(Debug, Clone, Default)]
pub struct MixCatalog {
    mixes: Vec<MixConfig>,
}

fn layer(id: &str, layer_type: LayerType, file: &str, gain: f32) -> LayerConfig {
    LayerConfig {
        id: id.to_string(),
        layer_type,
        file: format!("/audio/soundscapes/{}", file),
        gain,
        loop_start: None,
        loop_end: None,
    }
}

impl MixCatalog {
    pub fn new(mixes: Vec<MixConfig>) -> Self {
        Self { mixes }
    }

    /// The shipped mixes: focus, reading, calm play and bedtime
    pub fn builtin() -> Self {
        Self::new(vec![
            MixConfig {
                id: "focus".to_string(),
                title: "Focus".to_string(),
                layers: vec![
                    layer("pink", LayerType::Pink, "pink-noise.ogg", 0.35),
                    layer("keys", LayerType::Music, "soft-keys.ogg", 0.25),
                ],
            },
            MixConfig {
                id: "reading".to_string(),
                title: "Reading".to_string(),
                layers: vec![
                    layer("white", LayerType::White, "white-noise.ogg", 0.3),
                    layer("rain", LayerType::Nature, "rain.ogg", 0.2),
                ],
            },
            MixConfig {
                id: "calm-play".to_string(),
                title: "Calm Play".to_string(),
                layers: vec![
                    layer("brown", LayerType::Brown, "brown-noise.ogg", 0.3),
                    layer("birds", LayerType::Nature, "birds.ogg", 0.15),
                ],
            },
            MixConfig {
                id: "bedtime".to_string(),
                title: "Bedtime".to_string(),
                layers: vec![
                    layer("soft-music", LayerType::Music, "lullaby.ogg", 0.2),
                    layer("pink", LayerType::Pink, "pink-noise.ogg", 0.15),
                ],
            },
        ])
    }

    pub fn get(&self, mix_id: &str) -> Option<&MixConfig> {
        self.mixes.iter().find(|m| m.id == mix_id)
    }

    pub fn mixes(&self) -> &[MixConfig] {
        &self.mixes
    }

    /// Distinct asset files referenced by any mix, sorted
    pub fn asset_files(&self) -> Vec<String> {
        self.mixes
            .iter()
            .flat_map(|m| m.layers.iter().map(|l| l.file.clone()))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_mixes_present() {
        let catalog = MixCatalog::builtin();
        for id in ["focus", "reading", "calm-play", "bedtime"] {
            let mix = catalog.get(id).unwrap_or_else(|| panic!("missing mix {}", id));
            assert_eq!(mix.layers.len(), 2);
        }
        assert!(catalog.get("nonexistent-id").is_none());
    }

    #[test]
    fn test_layer_gains_within_unit_range() {
        for mix in MixCatalog::builtin().mixes() {
            for layer in &mix.layers {
                assert!((0.0..=1.0).contains(&layer.gain), "{}/{}", mix.id, layer.id);
            }
        }
    }

    #[test]
    fn test_asset_files_are_deduplicated() {
        let files = MixCatalog::builtin().asset_files();
        // pink-noise is shared by focus and bedtime
        assert_eq!(files.len(), 7);
        assert!(files.contains(&"/audio/soundscapes/pink-noise.ogg".to_string()));
    }

    #[test]
    fn test_layer_type_serializes_as_type_field() {
        let json = serde_json::to_value(&MixCatalog::builtin().mixes()[0].layers[0]).unwrap();
        assert_eq!(json["type"], "pink");
        assert_eq!(json["file"], "/audio/soundscapes/pink-noise.ogg");
    }
}

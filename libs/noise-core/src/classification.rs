//! Noise classification model and the per-name image cache

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub const UNKNOWN_NAME: &str = "Unknown";
pub const LISTENING_DESCRIPTION: &str = "Listening for ambient noise...";
pub const NO_DOMINANT_SOURCE: &str = "Could not identify a dominant noise source.";
pub const CLASSIFICATION_FAILED: &str = "Cannot identify the primary noise source.";

/// Noise types the dashboard knows how to present
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoiseKind {
    Traffic,
    Construction,
    HumanChatter,
    Wind,
    Music,
    Siren,
    DogBarking,
    Unknown,
}

impl NoiseKind {
    pub const ALL: [NoiseKind; 8] = [
        NoiseKind::Traffic,
        NoiseKind::Construction,
        NoiseKind::HumanChatter,
        NoiseKind::Wind,
        NoiseKind::Music,
        NoiseKind::Siren,
        NoiseKind::DogBarking,
        NoiseKind::Unknown,
    ];

    /// Name as produced by the classifier
    pub fn label(&self) -> &'static str {
        match self {
            NoiseKind::Traffic => "Traffic",
            NoiseKind::Construction => "Construction",
            NoiseKind::HumanChatter => "Human Chatter",
            NoiseKind::Wind => "Wind",
            NoiseKind::Music => "Music",
            NoiseKind::Siren => "Siren",
            NoiseKind::DogBarking => "Dog Barking",
            NoiseKind::Unknown => UNKNOWN_NAME,
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            NoiseKind::Traffic => "🚗",
            NoiseKind::Construction => "🏗",
            NoiseKind::HumanChatter => "👥",
            NoiseKind::Wind => "🌬",
            NoiseKind::Music => "🎵",
            NoiseKind::Siren => "🚨",
            NoiseKind::DogBarking => "🐕",
            NoiseKind::Unknown => "❔",
        }
    }

    /// Exact label match; anything else presents as `Unknown`
    pub fn from_name(name: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|kind| kind.label() == name)
            .unwrap_or(NoiseKind::Unknown)
    }
}

impl fmt::Display for NoiseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One classifier candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifierResult {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_human: bool,
    #[serde(default)]
    pub confidence: f32,
}

/// Current classification of the ambient noise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub name: String,
    pub description: String,
    pub is_human: bool,
}

impl Classification {
    pub fn new(name: impl Into<String>, description: impl Into<String>, is_human: bool) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            is_human,
        }
    }

    pub fn unknown(description: impl Into<String>) -> Self {
        Self::new(UNKNOWN_NAME, description, false)
    }

    pub fn kind(&self) -> NoiseKind {
        NoiseKind::from_name(&self.name)
    }

    pub fn is_unknown(&self) -> bool {
        self.name == UNKNOWN_NAME
    }

    /// Pick the highest-confidence candidate, the first one on ties
    pub fn from_results(results: Vec<ClassifierResult>) -> Self {
        let mut best: Option<ClassifierResult> = None;
        for candidate in results {
            let better = best
                .as_ref()
                .map_or(true, |current| candidate.confidence > current.confidence);
            if better {
                best = Some(candidate);
            }
        }

        match best {
            Some(result) => Self::new(result.name, result.description, result.is_human),
            None => Self::unknown(NO_DOMINANT_SOURCE),
        }
    }
}

impl Default for Classification {
    fn default() -> Self {
        Self::unknown(LISTENING_DESCRIPTION)
    }
}

/// Image references by classification name, kept for the session
#[derive(Debug, Clone, Default)]
pub struct ImageCache {
    entries: HashMap<String, String>,
}

impl ImageCache {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn insert(&mut self, name: impl Into<String>, image: impl Into<String>) {
        self.entries.insert(name.into(), image.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str, confidence: f32) -> ClassifierResult {
        ClassifierResult {
            name: name.to_string(),
            description: format!("{name} nearby"),
            is_human: name == "Human Chatter",
            confidence,
        }
    }

    #[test]
    fn test_label_table_round_trips() {
        for kind in NoiseKind::ALL {
            assert_eq!(NoiseKind::from_name(kind.label()), kind);
        }
        assert_eq!(NoiseKind::from_name("Leaf Blower"), NoiseKind::Unknown);
    }

    #[test]
    fn test_highest_confidence_wins() {
        let picked = Classification::from_results(vec![
            result("Wind", 0.3),
            result("Siren", 0.9),
            result("Traffic", 0.9),
        ]);
        assert_eq!(picked.name, "Siren");
        assert_eq!(picked.kind(), NoiseKind::Siren);
    }

    #[test]
    fn test_empty_results_are_unknown() {
        let picked = Classification::from_results(Vec::new());
        assert!(picked.is_unknown());
        assert_eq!(picked.description, NO_DOMINANT_SOURCE);
    }

    #[test]
    fn test_unlisted_name_is_kept() {
        let picked = Classification::from_results(vec![result("Leaf Blower", 0.8)]);
        assert_eq!(picked.name, "Leaf Blower");
        assert_eq!(picked.kind(), NoiseKind::Unknown);
        assert!(!picked.is_unknown());
    }

    #[test]
    fn test_classifier_json_shape() {
        let parsed: Vec<ClassifierResult> = serde_json::from_str(
            r#"[{"name":"Human Chatter","description":"People talking","isHuman":true,"confidence":0.7}]"#,
        )
        .unwrap();
        assert!(parsed[0].is_human);
        assert_eq!(Classification::from_results(parsed).kind(), NoiseKind::HumanChatter);
    }
}

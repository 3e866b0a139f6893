//! Collaborator traits
//!
//! The engine never talks to the network or devices itself. The runtime holds these as
//! `Arc<dyn ...>` and feeds their results back into the session.

use async_trait::async_trait;
use std::time::Duration;

use errors::NoiseResult;

use crate::classification::{Classification, ClassifierResult};
use crate::location::{Coordinates, ResolvedLocation};
use crate::suggestions::Suggestion;

/// Encoded audio clip handed to the classifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioSample {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl AudioSample {
    pub fn wav(data: Vec<u8>) -> Self {
        Self {
            mime_type: "audio/wav".to_string(),
            data,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Audio capture; sensor failures must come back as `NoiseError::Microphone`
#[async_trait]
pub trait AudioSource: Send + Sync {
    async fn capture(&self, duration: Duration) -> NoiseResult<AudioSample>;
}

/// Noise classifier; candidates may come in any order
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, sample: &AudioSample) -> NoiseResult<Vec<ClassifierResult>>;
}

/// Health suggestion generator
#[async_trait]
pub trait SuggestionGenerator: Send + Sync {
    async fn suggest_general(&self) -> NoiseResult<Vec<Suggestion>>;

    async fn suggest_for_condition(
        &self,
        noise_type: &str,
        level: u8,
    ) -> NoiseResult<Vec<Suggestion>>;
}

/// Decorative image for a classification
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn image_for(&self, classification: &Classification) -> NoiseResult<String>;
}

/// Device position
#[async_trait]
pub trait PositionSource: Send + Sync {
    async fn current_position(&self) -> NoiseResult<Coordinates>;
}

/// Position plus city label
#[async_trait]
pub trait LocationResolver: Send + Sync {
    async fn resolve(&self) -> NoiseResult<ResolvedLocation>;
}

//! Placeholder image generator

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use errors::NoiseResult;
use noise_core::{Classification, ImageGenerator};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    pub placeholder_url: String,
    /// Background for human-made sounds
    pub human_image: String,
    pub size: u32,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            placeholder_url: "https://picsum.photos".to_string(),
            human_image: "/human-chatter.jpg".to_string(),
            size: 400,
        }
    }
}

/// Seeded placeholder photos, one stable image per noise name
#[derive(Debug, Clone, Default)]
pub struct PlaceholderImages {
    config: ImageConfig,
}

impl PlaceholderImages {
    pub fn new(config: ImageConfig) -> Self {
        Self { config }
    }

    pub fn url_for(&self, classification: &Classification) -> String {
        if classification.is_human {
            return self.config.human_image.clone();
        }
        format!(
            "{}/seed/{}/{size}/{size}",
            self.config.placeholder_url.trim_end_matches('/'),
            seed(&classification.name),
            size = self.config.size
        )
    }
}

/// Whitespace runs become `-`, then lowercase
fn seed(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
}

#[async_trait]
impl ImageGenerator for PlaceholderImages {
    async fn image_for(&self, classification: &Classification) -> NoiseResult<String> {
        Ok(self.url_for(classification))
    }
}

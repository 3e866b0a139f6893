//! Location resolution: device position plus Nominatim reverse geocoding

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use errors::{NoiseError, NoiseResult};
use noise_core::location::GEOLOCATION_UNSUPPORTED;
use noise_core::{city_label, Coordinates, LocationResolver, PositionSource, ResolvedLocation};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    /// Device coordinates; lookups fail as unsupported when either is missing
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub nominatim_url: String,
    /// Nominatim's usage policy requires an identifying agent
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            latitude: None,
            longitude: None,
            nominatim_url: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: concat!("noisemon/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: 10,
        }
    }
}

impl LocationConfig {
    pub fn coordinates(&self) -> Option<Coordinates> {
        Some(Coordinates::new(self.latitude?, self.longitude?))
    }
}

/// Position taken from configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedPosition {
    coordinates: Option<Coordinates>,
}

impl FixedPosition {
    pub fn new(coordinates: Option<Coordinates>) -> Self {
        Self { coordinates }
    }
}

#[async_trait]
impl PositionSource for FixedPosition {
    async fn current_position(&self) -> NoiseResult<Coordinates> {
        self.coordinates
            .ok_or_else(|| NoiseError::Geolocation(GEOLOCATION_UNSUPPORTED.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    address: Address,
}

#[derive(Debug, Default, Deserialize)]
struct Address {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    country_code: Option<String>,
}

impl Address {
    fn label(&self) -> String {
        let place = self
            .city
            .as_deref()
            .or(self.town.as_deref())
            .or(self.village.as_deref());
        city_label(place, self.country_code.as_deref())
    }
}

pub struct NominatimResolver {
    position: Arc<dyn PositionSource>,
    client: Client,
    base_url: String,
}

impl NominatimResolver {
    pub fn new(config: &LocationConfig, position: Arc<dyn PositionSource>) -> NoiseResult<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            position,
            client,
            base_url: config.nominatim_url.trim_end_matches('/').to_string(),
        })
    }

    async fn reverse(&self, coordinates: Coordinates) -> Result<String, String> {
        let url = format!("{}/reverse", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("format", "json".to_string()),
                ("lat", coordinates.lat.to_string()),
                ("lon", coordinates.lng.to_string()),
            ])
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            return Err(format!("HTTP {}", response.status().as_u16()));
        }

        let body: ReverseResponse = response.json().await.map_err(|e| e.to_string())?;
        Ok(body.address.label())
    }
}

#[async_trait]
impl LocationResolver for NominatimResolver {
    async fn resolve(&self) -> NoiseResult<ResolvedLocation> {
        let coordinates = self.position.current_position().await?;
        debug!(
            "Reverse geocoding ({}, {})",
            coordinates.lat, coordinates.lng
        );

        let city = self
            .reverse(coordinates)
            .await
            .map_err(|reason| NoiseError::ReverseGeocoding {
                latitude: coordinates.lat,
                longitude: coordinates.lng,
                reason,
            })?;
        info!("Resolved position to {}", city);

        Ok(ResolvedLocation { coordinates, city })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_label_precedence() {
        let address = Address {
            city: None,
            town: Some("Annecy".into()),
            village: Some("Sevrier".into()),
            country_code: Some("fr".into()),
        };
        assert_eq!(address.label(), "Annecy, FR");
        assert_eq!(Address::default().label(), "Unknown Location, ");
    }

    #[tokio::test]
    async fn test_missing_position_is_unsupported() {
        let err = FixedPosition::default().current_position().await.unwrap_err();
        assert!(err.is_sensor());
        assert!(err.to_string().contains(GEOLOCATION_UNSUPPORTED));
    }
}

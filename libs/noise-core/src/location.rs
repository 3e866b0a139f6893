//! Location model

use serde::{Deserialize, Serialize};

/// Used in alert records when no city is known
pub const FALLBACK_LOCATION: &str = "Current Location";
pub const UNKNOWN_CITY: &str = "Unknown Location";
pub const GEOLOCATION_UNSUPPORTED: &str = "Geolocation is not available on this device.";
pub const CITY_UNRESOLVED: &str = "Could not determine your city.";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedLocation {
    pub coordinates: Coordinates,
    /// Display label, e.g. "Lyon, FR"
    pub city: String,
}

/// Location card state
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum LocationStatus {
    #[default]
    Locating,
    Resolved(ResolvedLocation),
    Failed {
        coordinates: Option<Coordinates>,
        error: String,
    },
}

impl LocationStatus {
    pub fn city(&self) -> Option<&str> {
        match self {
            LocationStatus::Resolved(location) => Some(location.city.as_str()),
            _ => None,
        }
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        match self {
            LocationStatus::Resolved(location) => Some(location.coordinates),
            LocationStatus::Failed { coordinates, .. } => *coordinates,
            LocationStatus::Locating => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            LocationStatus::Failed { error, .. } => Some(error.as_str()),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, LocationStatus::Locating)
    }

    /// Label for alert records
    pub fn alert_label(&self) -> &str {
        self.city().unwrap_or(FALLBACK_LOCATION)
    }
}

/// Format a reverse-geocoded place as "City, CC"
pub fn city_label(city: Option<&str>, country_code: Option<&str>) -> String {
    let city = city
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(UNKNOWN_CITY);
    let country = country_code.unwrap_or_default().trim().to_uppercase();
    format!("{}, {}", city, country)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_city_label() {
        assert_eq!(city_label(Some("Lyon"), Some("fr")), "Lyon, FR");
        assert_eq!(city_label(None, Some("de")), "Unknown Location, DE");
        assert_eq!(city_label(Some(" "), None), "Unknown Location, ");
    }

    #[test]
    fn test_alert_label_falls_back() {
        assert_eq!(LocationStatus::Locating.alert_label(), FALLBACK_LOCATION);

        let failed = LocationStatus::Failed {
            coordinates: Some(Coordinates::new(1.0, 2.0)),
            error: CITY_UNRESOLVED.to_string(),
        };
        assert_eq!(failed.alert_label(), FALLBACK_LOCATION);
        assert_eq!(failed.coordinates(), Some(Coordinates::new(1.0, 2.0)));

        let resolved = LocationStatus::Resolved(ResolvedLocation {
            coordinates: Coordinates::new(45.76, 4.84),
            city: "Lyon, FR".to_string(),
        });
        assert_eq!(resolved.alert_label(), "Lyon, FR");
    }
}

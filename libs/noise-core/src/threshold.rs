//! Threshold Table - day/night decibel limits per environment

use std::fmt;
use std::str::FromStr;

use chrono::Timelike;
use errors::NoiseError;
use serde::{Deserialize, Serialize};

/// First hour (inclusive) using the day limit
pub const DAY_START_HOUR: u32 = 7;
/// First hour (inclusive) using the night limit again
pub const DAY_END_HOUR: u32 = 22;

/// Environment category that selects the applicable limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Environment {
    #[default]
    Residential,
    Commercial,
    Industrial,
}

impl Environment {
    pub const ALL: [Environment; 3] = [
        Environment::Residential,
        Environment::Commercial,
        Environment::Industrial,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Residential => "Residential",
            Environment::Commercial => "Commercial",
            Environment::Industrial => "Industrial",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = NoiseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "residential" | "r" => Ok(Environment::Residential),
            "commercial" | "c" => Ok(Environment::Commercial),
            "industrial" | "i" => Ok(Environment::Industrial),
            _ => Err(NoiseError::UnknownEnvironment(s.to_string())),
        }
    }
}

/// Part of the day a limit applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Period {
    Day,
    Night,
}

impl Period {
    /// Day is the half-open local hour range [7, 22)
    pub fn at_hour(hour: u32) -> Self {
        if (DAY_START_HOUR..DAY_END_HOUR).contains(&hour) {
            Period::Day
        } else {
            Period::Night
        }
    }
}

/// Day and night limits in dB
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Threshold {
    pub day: u8,
    pub night: u8,
}

impl Threshold {
    pub const fn new(day: u8, night: u8) -> Self {
        Self { day, night }
    }

    pub fn for_period(&self, period: Period) -> u8 {
        match period {
            Period::Day => self.day,
            Period::Night => self.night,
        }
    }
}

/// Limits for every environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdTable {
    pub residential: Threshold,
    pub commercial: Threshold,
    pub industrial: Threshold,
}

impl Default for ThresholdTable {
    fn default() -> Self {
        Self {
            residential: Threshold::new(55, 45),
            commercial: Threshold::new(65, 55),
            industrial: Threshold::new(75, 65),
        }
    }
}

impl ThresholdTable {
    /// The same limit day and night for every environment
    pub fn uniform(residential: u8, commercial: u8, industrial: u8) -> Self {
        Self {
            residential: Threshold::new(residential, residential),
            commercial: Threshold::new(commercial, commercial),
            industrial: Threshold::new(industrial, industrial),
        }
    }

    pub fn get(&self, environment: Environment) -> Threshold {
        match environment {
            Environment::Residential => self.residential,
            Environment::Commercial => self.commercial,
            Environment::Industrial => self.industrial,
        }
    }

    /// Active threshold for an environment at a local time
    pub fn active(&self, environment: Environment, now: &impl Timelike) -> u8 {
        self.get(environment).for_period(Period::at_hour(now.hour()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn at(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    #[test]
    fn test_day_window_is_half_open() {
        assert_eq!(Period::at_hour(6), Period::Night);
        assert_eq!(Period::at_hour(7), Period::Day);
        assert_eq!(Period::at_hour(21), Period::Day);
        assert_eq!(Period::at_hour(22), Period::Night);
        assert_eq!(Period::at_hour(0), Period::Night);
    }

    #[test]
    fn test_default_table() {
        let table = ThresholdTable::default();
        assert_eq!(table.active(Environment::Residential, &at(12, 0)), 55);
        assert_eq!(table.active(Environment::Residential, &at(23, 30)), 45);
        assert_eq!(table.active(Environment::Commercial, &at(7, 0)), 65);
        assert_eq!(table.active(Environment::Commercial, &at(6, 59)), 55);
        assert_eq!(table.active(Environment::Industrial, &at(21, 59)), 75);
        assert_eq!(table.active(Environment::Industrial, &at(22, 0)), 65);
    }

    #[test]
    fn test_environment_parsing() {
        assert_eq!(
            "Industrial".parse::<Environment>().unwrap(),
            Environment::Industrial
        );
        assert_eq!(" c ".parse::<Environment>().unwrap(), Environment::Commercial);
        assert!(matches!(
            "suburban".parse::<Environment>(),
            Err(NoiseError::UnknownEnvironment(_))
        ));
        assert_eq!(Environment::default(), Environment::Residential);
    }
}

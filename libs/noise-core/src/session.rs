//! Session - the single owner of monitoring state
//!
//! Handlers take an input (a reading, an environment change, a collaborator response),
//! update state and return the [`Effect`]s the runtime has to carry out. Nothing here
//! performs I/O.

use std::collections::HashSet;

use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::{debug, info, warn};

use errors::{NoiseError, NoiseResult};

use crate::classification::{
    Classification, ClassifierResult, ImageCache, CLASSIFICATION_FAILED,
};
use crate::engine::{AlertEngine, AlertState, Transition};
use crate::ledger::{AlertLedger, AlertRecord};
use crate::location::{Coordinates, LocationStatus, ResolvedLocation, CITY_UNRESOLVED};
use crate::simulator::Reading;
use crate::suggestions::{SpecificSuggestions, Suggestion, SuggestionBoard, Ticket};
use crate::threshold::{Environment, ThresholdTable};

/// Background used while no classification image is available
pub const DEFAULT_BACKGROUND: &str = "/noise-card-bg.jpg";

#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    pub environment: Environment,
    pub thresholds: ThresholdTable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeSeverity {
    Destructive,
    Info,
}

/// Transient user-facing message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub severity: NoticeSeverity,
    pub title: String,
    pub description: String,
}

impl Notice {
    pub fn destructive(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            severity: NoticeSeverity::Destructive,
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            severity: NoticeSeverity::Info,
            title: title.into(),
            description: description.into(),
        }
    }

    fn breach(level: u8, threshold: u8, environment: Environment) -> Self {
        Self::destructive(
            "Noise Limit Breached",
            format!(
                "Noise level reached {}dB, exceeding the {}dB limit for a {} area.",
                level, threshold, environment
            ),
        )
    }
}

/// Work the runtime performs on behalf of the session
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    FetchGeneralSuggestions {
        ticket: Ticket,
    },
    /// Breach-time fetch; fill the general pool first when `include_general` is set
    FetchSuggestions {
        ticket: Ticket,
        noise_type: String,
        level: u8,
        include_general: bool,
    },
    FetchImage {
        classification: Classification,
    },
    Notify(Notice),
}

/// Gauge caption
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LoudnessStatus {
    ExceededLimit,
    Quiet,
    Moderate,
    Loud,
}

impl LoudnessStatus {
    pub fn for_level(level: u8, threshold: u8) -> Self {
        if level > threshold {
            LoudnessStatus::ExceededLimit
        } else if level < 50 {
            LoudnessStatus::Quiet
        } else if level < 70 {
            LoudnessStatus::Moderate
        } else {
            LoudnessStatus::Loud
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LoudnessStatus::ExceededLimit => "Exceeded Limit",
            LoudnessStatus::Quiet => "Quiet",
            LoudnessStatus::Moderate => "Moderate",
            LoudnessStatus::Loud => "Loud",
        }
    }
}

/// Read-only copy of the session for subscribers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub environment: Environment,
    pub level: Option<u8>,
    pub threshold: u8,
    pub state: AlertState,
    pub status: Option<LoudnessStatus>,
    pub alerts: Vec<AlertRecord>,
    pub classification: Classification,
    pub classifying: bool,
    pub microphone_error: Option<String>,
    pub image: String,
    pub location: LocationStatus,
    pub suggestions: Vec<Suggestion>,
    pub suggestions_loading: bool,
    pub suggestions_error: Option<String>,
    pub updated_at: Option<DateTime<Local>>,
}

impl SessionSnapshot {
    pub fn is_alerting(&self) -> bool {
        self.state == AlertState::Alerting
    }
}

pub struct Session {
    environment: Environment,
    engine: AlertEngine,
    reading: Option<Reading>,
    threshold: u8,
    ledger: AlertLedger,
    classification: Classification,
    classifying: Option<Ticket>,
    classification_seq: u64,
    microphone_error: Option<String>,
    image: Option<String>,
    images: ImageCache,
    images_pending: HashSet<String>,
    location: LocationStatus,
    suggestions: SuggestionBoard,
    updated_at: Option<DateTime<Local>>,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            environment: config.environment,
            engine: AlertEngine::new(config.thresholds),
            reading: None,
            threshold: 0,
            ledger: AlertLedger::new(),
            classification: Classification::default(),
            classifying: None,
            classification_seq: 0,
            microphone_error: None,
            image: None,
            images: ImageCache::default(),
            images_pending: HashSet::new(),
            location: LocationStatus::Locating,
            suggestions: SuggestionBoard::new(),
            updated_at: None,
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn level(&self) -> Option<u8> {
        self.reading.map(|r| r.value)
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    pub fn state(&self) -> AlertState {
        self.engine.state()
    }

    pub fn is_alerting(&self) -> bool {
        self.engine.is_alerting()
    }

    pub fn alerts(&self) -> &AlertLedger {
        &self.ledger
    }

    pub fn classification(&self) -> &Classification {
        &self.classification
    }

    pub fn is_classifying(&self) -> bool {
        self.classifying.is_some()
    }

    pub fn microphone_error(&self) -> Option<&str> {
        self.microphone_error.as_deref()
    }

    pub fn image(&self) -> &str {
        self.image.as_deref().unwrap_or(DEFAULT_BACKGROUND)
    }

    pub fn location(&self) -> &LocationStatus {
        &self.location
    }

    pub fn suggestions(&self) -> &SuggestionBoard {
        &self.suggestions
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            environment: self.environment,
            level: self.level(),
            threshold: self.threshold,
            state: self.state(),
            status: self
                .level()
                .map(|level| LoudnessStatus::for_level(level, self.threshold)),
            alerts: self.ledger.list(),
            classification: self.classification.clone(),
            classifying: self.is_classifying(),
            microphone_error: self.microphone_error.clone(),
            image: self.image().to_string(),
            location: self.location.clone(),
            suggestions: self.suggestions.current().to_vec(),
            suggestions_loading: self.suggestions.is_loading(),
            suggestions_error: self.suggestions.error().map(str::to_string),
            updated_at: self.updated_at,
        }
    }

    // ------------------------------------------------------------------
    // Readings and thresholds
    // ------------------------------------------------------------------

    /// Session start: publish the first threshold and request the general pool
    pub fn start(&mut self, now: DateTime<Local>) -> Vec<Effect> {
        self.threshold = self.engine.threshold(self.environment, &now);
        self.updated_at = Some(now);
        info!(
            "Session started: {} area, limit {}dB",
            self.environment, self.threshold
        );

        self.suggestions
            .begin_general()
            .map(|ticket| vec![Effect::FetchGeneralSuggestions { ticket }])
            .unwrap_or_default()
    }

    pub fn on_reading(&mut self, reading: Reading) -> Vec<Effect> {
        self.reading = Some(reading);
        debug!("Reading {}dB", reading.value);
        self.evaluate(reading.timestamp)
    }

    /// Switch environment and re-check the current reading against the new limit
    pub fn set_environment(
        &mut self,
        environment: Environment,
        now: DateTime<Local>,
    ) -> Vec<Effect> {
        if environment != self.environment {
            info!("Environment changed: {} -> {}", self.environment, environment);
        }
        self.environment = environment;
        self.evaluate(now)
    }

    /// Periodic threshold refresh (day/night changeover)
    pub fn refresh_threshold(&mut self, now: DateTime<Local>) -> Vec<Effect> {
        self.evaluate(now)
    }

    /// The one transition function; every caller goes through here
    fn evaluate(&mut self, now: DateTime<Local>) -> Vec<Effect> {
        self.updated_at = Some(now);

        let Some(reading) = self.reading else {
            self.threshold = self.engine.threshold(self.environment, &now);
            return Vec::new();
        };

        let evaluation = self
            .engine
            .evaluate(reading.value, self.environment, &now);
        self.threshold = evaluation.threshold;

        match evaluation.transition {
            Some(Transition::Breach { level, threshold }) => self.on_breach(level, threshold, now),
            Some(Transition::Recovery { level, threshold }) => {
                info!(
                    "Noise back to normal: {}dB <= {}dB limit",
                    level, threshold
                );
                self.suggestions.restore_general();
                Vec::new()
            },
            None => Vec::new(),
        }
    }

    fn on_breach(&mut self, level: u8, threshold: u8, now: DateTime<Local>) -> Vec<Effect> {
        let record = AlertRecord::new(
            self.location.alert_label(),
            self.classification.name.clone(),
            level,
            threshold,
            now,
        );
        warn!(
            "Noise limit breached: {}dB > {}dB ({} area, {}, {:?})",
            level, threshold, self.environment, record.noise_type, record.severity
        );
        self.ledger.record(record);

        let include_general = self.suggestions.needs_general();
        let ticket = self.suggestions.begin_specific();

        vec![
            Effect::Notify(Notice::breach(level, threshold, self.environment)),
            Effect::FetchSuggestions {
                ticket,
                noise_type: self.classification.name.clone(),
                level,
                include_general,
            },
        ]
    }

    // ------------------------------------------------------------------
    // Suggestions
    // ------------------------------------------------------------------

    pub fn complete_general(&mut self, ticket: Ticket, result: NoiseResult<Vec<Suggestion>>) {
        if let Err(e) = &result {
            warn!("General suggestions unavailable: {}", e);
        }
        if !self.suggestions.complete_general(ticket, result) {
            debug!("General suggestions {:?} arrived after a newer request", ticket);
        }
    }

    pub fn complete_suggestions(&mut self, ticket: Ticket, result: SpecificSuggestions) {
        if let Err(e) = &result.specific {
            warn!("Health suggestions unavailable: {}", e);
        }
        if !self.suggestions.complete_specific(ticket, result) {
            debug!("Discarding stale suggestions for {:?}", ticket);
        }
    }

    // ------------------------------------------------------------------
    // Classification and images
    // ------------------------------------------------------------------

    /// Claim the classifier; `None` while one is in flight or after a sensor failure
    pub fn begin_classification(&mut self) -> Option<Ticket> {
        if self.microphone_error.is_some() || self.classifying.is_some() {
            return None;
        }
        self.classification_seq += 1;
        let ticket = Ticket(self.classification_seq);
        self.classifying = Some(ticket);
        Some(ticket)
    }

    pub fn complete_classification(
        &mut self,
        ticket: Ticket,
        result: NoiseResult<Vec<ClassifierResult>>,
    ) -> Vec<Effect> {
        if self.classifying != Some(ticket) {
            debug!("Discarding stale classification {:?}", ticket);
            return Vec::new();
        }
        self.classifying = None;

        match result {
            Ok(results) => self.apply_classification(Classification::from_results(results)),
            Err(e) if e.is_sensor() => {
                warn!("Classification disabled: {}", e);
                self.microphone_error = Some(e.to_string());
                vec![Effect::Notify(Notice::destructive(
                    "Microphone Access Denied",
                    "Please allow microphone access to enable noise classification.",
                ))]
            },
            Err(e) => {
                warn!("Noise classification failed: {}", e);
                let mut effects = vec![Effect::Notify(Notice::destructive(
                    "Error Classifying Noise",
                    "The AI classification service might be temporarily unavailable.",
                ))];
                effects.extend(self.apply_classification(Classification::unknown(
                    CLASSIFICATION_FAILED,
                )));
                effects
            },
        }
    }

    fn apply_classification(&mut self, classification: Classification) -> Vec<Effect> {
        if classification.name == self.classification.name {
            self.classification.description = classification.description;
            self.classification.is_human = classification.is_human;
            return Vec::new();
        }

        info!(
            "Noise classified as {} (was {})",
            classification.name, self.classification.name
        );
        self.classification = classification;

        if self.classification.is_unknown() {
            self.image = None;
            return Vec::new();
        }

        if let Some(cached) = self.images.get(&self.classification.name) {
            self.image = Some(cached.to_string());
            return Vec::new();
        }

        if !self.images_pending.insert(self.classification.name.clone()) {
            return Vec::new();
        }

        vec![Effect::FetchImage {
            classification: self.classification.clone(),
        }]
    }

    /// Image responses are cached by name; they only show if the name is still current
    pub fn complete_image(&mut self, name: &str, result: NoiseResult<String>) {
        self.images_pending.remove(name);
        match result {
            Ok(image) => {
                if self.classification.name == name {
                    self.image = Some(image.clone());
                }
                self.images.insert(name, image);
            },
            Err(e) => debug!("Image for {} unavailable: {}", name, e),
        }
    }

    pub fn cached_images(&self) -> usize {
        self.images.len()
    }

    // ------------------------------------------------------------------
    // Location
    // ------------------------------------------------------------------

    pub fn set_location(&mut self, result: NoiseResult<ResolvedLocation>) {
        self.location = match result {
            Ok(location) => {
                info!("Location resolved: {}", location.city);
                LocationStatus::Resolved(location)
            },
            Err(NoiseError::ReverseGeocoding {
                latitude,
                longitude,
                reason,
            }) => {
                warn!("Reverse geocoding failed: {}", reason);
                LocationStatus::Failed {
                    coordinates: Some(Coordinates::new(latitude, longitude)),
                    error: CITY_UNRESOLVED.to_string(),
                }
            },
            Err(NoiseError::Geolocation(message)) => {
                warn!("Geolocation unavailable: {}", message);
                LocationStatus::Failed {
                    coordinates: None,
                    error: message,
                }
            },
            Err(e) => {
                warn!("Location lookup failed: {}", e);
                LocationStatus::Failed {
                    coordinates: None,
                    error: CITY_UNRESOLVED.to_string(),
                }
            },
        };
    }
}

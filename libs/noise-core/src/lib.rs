//! Noise monitoring core
//!
//! Domain model and state machine for the noise dashboard: decibel sources, the
//! day/night threshold table, the edge-triggered alert engine, the alert ledger and the
//! session aggregate that ties them together. All I/O lives behind the traits in
//! [`traits`].

pub mod classification;
pub mod engine;
pub mod history;
pub mod ledger;
pub mod location;
pub mod session;
pub mod simulator;
pub mod suggestions;
pub mod threshold;
pub mod traits;

pub use classification::{Classification, ClassifierResult, ImageCache, NoiseKind};
pub use engine::{AlertEngine, AlertState, Evaluation, Transition};
pub use ledger::{AlertLedger, AlertRecord, Severity, LEDGER_CAPACITY};
pub use location::{city_label, Coordinates, LocationStatus, ResolvedLocation};
pub use session::{
    Effect, LoudnessStatus, Notice, NoticeSeverity, Session, SessionConfig, SessionSnapshot,
};
pub use simulator::{DecibelSource, RandomWalkSimulator, Reading, ReplaySource};
pub use suggestions::{SpecificSuggestions, Suggestion, SuggestionBoard, Ticket};
pub use threshold::{Environment, Period, Threshold, ThresholdTable};
pub use traits::{
    AudioSample, AudioSource, Classifier, ImageGenerator, LocationResolver, PositionSource,
    SuggestionGenerator,
};

//! Collaborator implementations for the noise monitor
//!
//! - `genai`: Gemini-backed suggestion generator and noise classifier
//! - `nominatim`: configured position plus OpenStreetMap reverse geocoding
//! - `images`: seeded placeholder images per noise name
//! - `audio`: WAV clips from a file or the default microphone

pub mod audio;
pub mod genai;
pub mod images;
pub mod nominatim;
pub mod prompts;

pub use audio::{build_source, encode_wav, AudioConfig, AudioSourceKind, UnavailableSource, WavFileSource};
pub use genai::{GenAiClient, GenAiConfig};
pub use images::{ImageConfig, PlaceholderImages};
pub use nominatim::{FixedPosition, LocationConfig, NominatimResolver};

#[cfg(feature = "microphone")]
pub use audio::MicrophoneSource;

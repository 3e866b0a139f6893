//! HTTP collaborator tests against a mock server
//!
//! - Gemini request shape and JSON reply parsing
//! - Error mapping for HTTP failures, bad payloads and timeouts
//! - Nominatim reverse geocoding and its fallbacks
//! - WAV file capture

#![allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use errors::NoiseError;
use noise_clients::{
    encode_wav, FixedPosition, GenAiClient, GenAiConfig, LocationConfig, NominatimResolver,
    WavFileSource,
};
use noise_core::{
    AudioSample, AudioSource, Classifier, Coordinates, LocationResolver, SuggestionGenerator,
};
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODEL_PATH: &str = "/v1beta/models/gemini-test:generateContent";

fn genai(server: &MockServer) -> GenAiClient {
    GenAiClient::new(GenAiConfig {
        base_url: server.uri(),
        model: "gemini-test".to_string(),
        api_key: Some("test-key".to_string()),
        timeout_secs: 1,
    })
    .unwrap()
}

/// Gemini envelope around a JSON text reply
fn reply(payload: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": payload.to_string()}]}
        }]
    }))
}

async fn request_body(server: &MockServer) -> Value {
    let requests = server.received_requests().await.unwrap();
    serde_json::from_slice(&requests[0].body).unwrap()
}

// ============================================================================
// Generative service
// ============================================================================

#[tokio::test]
async fn test_condition_suggestions_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .and(header("x-goog-api-key", "test-key"))
        .respond_with(reply(json!({
            "suggestions": [
                {"title": "Use Earplugs", "description": "Block out loud traffic."},
                {"title": "Take Breaks", "description": "Step into a quiet room."}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let suggestions = genai(&server)
        .suggest_for_condition("Traffic", 78)
        .await
        .unwrap();
    assert_eq!(suggestions.len(), 2);
    assert_eq!(suggestions[0].title, "Use Earplugs");

    let body = request_body(&server).await;
    assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
    let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
    assert!(prompt.contains("Noise Type: Traffic"));
    assert!(prompt.contains("Noise Level: 78 dB"));
}

#[tokio::test]
async fn test_general_suggestions_prompt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(reply(json!({
            "suggestions": [{"title": "Green Spaces", "description": "Visit a park."}]
        })))
        .mount(&server)
        .await;

    let suggestions = genai(&server).suggest_general().await.unwrap();
    assert_eq!(suggestions[0].title, "Green Spaces");

    let body = request_body(&server).await;
    let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
    assert!(prompt.contains("urban well-being"));
}

#[tokio::test]
async fn test_classifier_sends_inline_audio() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(reply(json!([
            {"name": "Traffic", "description": "Cars passing", "isHuman": false, "confidence": 0.6},
            {"name": "Human Chatter", "description": "Voices", "isHuman": true, "confidence": 0.8}
        ])))
        .mount(&server)
        .await;

    let sample = AudioSample::wav(encode_wav(&[0.0; 160], 16_000).unwrap());
    let results = genai(&server).classify(&sample).await.unwrap();
    assert_eq!(results.len(), 2);
    assert!(results[1].is_human);

    let body = request_body(&server).await;
    let inline = &body["contents"][0]["parts"][1]["inline_data"];
    assert_eq!(inline["mime_type"], "audio/wav");
    assert!(!inline["data"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_http_error_is_service_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let err = genai(&server).suggest_general().await.unwrap_err();
    assert!(matches!(err, NoiseError::ExternalService { .. }));
    assert!(err.to_string().contains("503"));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_malformed_reply_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(reply(json!({"tips": []})))
        .mount(&server)
        .await;

    let err = genai(&server).suggest_general().await.unwrap_err();
    assert!(matches!(err, NoiseError::InvalidResponse { .. }));
}

#[tokio::test]
async fn test_empty_candidates_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
        .mount(&server)
        .await;

    let err = genai(&server)
        .suggest_for_condition("Siren", 90)
        .await
        .unwrap_err();
    assert!(matches!(err, NoiseError::InvalidResponse { .. }));
}

#[tokio::test]
async fn test_slow_service_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(reply(json!({"suggestions": []})).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let err = genai(&server).suggest_general().await.unwrap_err();
    assert!(matches!(err, NoiseError::Timeout(_)));
}

// ============================================================================
// Reverse geocoding
// ============================================================================

fn resolver(server: &MockServer, coordinates: Option<Coordinates>) -> NominatimResolver {
    let config = LocationConfig {
        nominatim_url: server.uri(),
        user_agent: "noisemon-tests".to_string(),
        ..LocationConfig::default()
    };
    NominatimResolver::new(&config, Arc::new(FixedPosition::new(coordinates))).unwrap()
}

#[tokio::test]
async fn test_reverse_geocoding_label() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/reverse"))
        .and(query_param("format", "json"))
        .and(query_param("lat", "45.76"))
        .and(query_param("lon", "4.84"))
        .and(header("user-agent", "noisemon-tests"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "address": {"village": "Fourvière", "country_code": "fr"}
        })))
        .mount(&server)
        .await;

    let location = resolver(&server, Some(Coordinates::new(45.76, 4.84)))
        .resolve()
        .await
        .unwrap();
    assert_eq!(location.city, "Fourvière, FR");
    assert_eq!(location.coordinates, Coordinates::new(45.76, 4.84));
}

#[tokio::test]
async fn test_geocoding_failure_keeps_coordinates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = resolver(&server, Some(Coordinates::new(1.5, 2.5)))
        .resolve()
        .await
        .unwrap_err();
    match err {
        NoiseError::ReverseGeocoding {
            latitude,
            longitude,
            ..
        } => {
            assert_eq!(latitude, 1.5);
            assert_eq!(longitude, 2.5);
        },
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_position_skips_geocoding() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = resolver(&server, None).resolve().await.unwrap_err();
    assert!(matches!(err, NoiseError::Geolocation(_)));
}

// ============================================================================
// WAV capture
// ============================================================================

#[tokio::test]
async fn test_wav_file_source_trims_clip() {
    let samples: Vec<f32> = (0..32_000).map(|i| (i as f32 * 0.01).sin()).collect();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&encode_wav(&samples, 16_000).unwrap()).unwrap();

    let sample = WavFileSource::new(file.path())
        .capture(Duration::from_secs(1))
        .await
        .unwrap();
    assert_eq!(sample.mime_type, "audio/wav");
    let reader = hound::WavReader::new(std::io::Cursor::new(sample.data)).unwrap();
    assert_eq!(reader.len(), 16_000);
}

#[tokio::test]
async fn test_missing_wav_file_is_sensor_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = WavFileSource::new(dir.path().join("missing.wav"))
        .capture(Duration::from_secs(3))
        .await
        .unwrap_err();
    assert!(err.is_sensor());
}

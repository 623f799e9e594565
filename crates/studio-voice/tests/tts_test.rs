use axum::{
    extract::{Path, Query},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use studio_types::{AudioMediaType, ErrorKind};
use studio_voice::{ContentType, ElevenLabsConfig, SpeechRequest, TtsService, VoiceError};
use tokio::net::TcpListener;

#[derive(Debug, Clone)]
struct SeenRequest {
    voice_id: String,
    output_format: Option<String>,
    api_key: Option<String>,
    text: String,
}

async fn mock_elevenlabs(status: StatusCode) -> (String, Arc<Mutex<Vec<SeenRequest>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();

    let app = Router::new().route(
        "/v1/text-to-speech/{voice_id}",
        post(
            move |Path(voice_id): Path<String>,
                  Query(query): Query<HashMap<String, String>>,
                  headers: HeaderMap,
                  Json(body): Json<Value>| {
                let sink = sink.clone();
                async move {
                    sink.lock().unwrap().push(SeenRequest {
                        voice_id,
                        output_format: query.get("output_format").cloned(),
                        api_key: headers
                            .get("xi-api-key")
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string),
                        text: body["text"].as_str().unwrap_or_default().to_string(),
                    });
                    let response: Response = if status.is_success() {
                        ([(header::CONTENT_TYPE, "audio/mpeg")], b"ID3fake-mp3".to_vec())
                            .into_response()
                    } else {
                        (status, "nope").into_response()
                    };
                    response
                }
            },
        ),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/v1", addr), seen)
}

#[tokio::test]
async fn synthesizes_with_catalog_voice() {
    let (base_url, seen) = mock_elevenlabs(StatusCode::OK).await;
    let service = TtsService::new(ElevenLabsConfig::new("xi-test", base_url));

    let mut request = SpeechRequest::new("Welcome. We are here to help.");
    request.voice = Some("Aria".to_string());
    let speech = service.synthesize(&request).await.unwrap();

    assert_eq!(speech.media_type, AudioMediaType::Mpeg);
    assert_eq!(speech.voice_name, "Aria");
    assert_eq!(&speech.audio[..3], b"ID3");

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].voice_id, "XB0fDUnXU5powFXDhCwa");
    assert_eq!(seen[0].output_format.as_deref(), Some("mp3_44100_128"));
    assert_eq!(seen[0].api_key.as_deref(), Some("xi-test"));
    assert_eq!(seen[0].text, "Welcome.\nWe are here to **help**.");
}

#[tokio::test]
async fn unshaped_text_is_sent_verbatim() {
    let (base_url, seen) = mock_elevenlabs(StatusCode::OK).await;
    let service = TtsService::new(ElevenLabsConfig::new("xi-test", base_url));

    let mut request = SpeechRequest::new("Click next. Then confirm.");
    request.content_type = ContentType::Accessibility;
    request.shape = false;
    service.synthesize(&request).await.unwrap();

    assert_eq!(seen.lock().unwrap()[0].text, "Click next. Then confirm.");
}

#[tokio::test]
async fn missing_key_is_credentials_error() {
    let (base_url, seen) = mock_elevenlabs(StatusCode::OK).await;
    let service = TtsService::new(ElevenLabsConfig::new("", base_url));

    let err = service
        .synthesize(&SpeechRequest::new("Hello"))
        .await
        .unwrap_err();
    assert!(matches!(err, VoiceError::MissingCredentials));
    assert_eq!(err.kind(), ErrorKind::Credentials);
    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn empty_and_oversized_text_rejected() {
    let service = TtsService::new(ElevenLabsConfig::new("xi-test", "http://127.0.0.1:9"));

    let err = service.synthesize(&SpeechRequest::new("  ")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = service
        .synthesize(&SpeechRequest::new("a".repeat(2001)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn unknown_voice_rejected() {
    let service = TtsService::new(ElevenLabsConfig::new("xi-test", "http://127.0.0.1:9"));

    let mut request = SpeechRequest::new("Hello");
    request.voice = Some("zeus".to_string());
    match service.synthesize(&request).await {
        Err(VoiceError::ProfileNotFound(name)) => assert_eq!(name, "zeus"),
        other => panic!("Expected ProfileNotFound error, got {:?}", other),
    }
}

#[tokio::test]
async fn rejected_key_and_server_errors_are_distinct() {
    let (base_url, _) = mock_elevenlabs(StatusCode::UNAUTHORIZED).await;
    let service = TtsService::new(ElevenLabsConfig::new("xi-bad", base_url));
    let err = service.synthesize(&SpeechRequest::new("Hi")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Credentials);

    let (base_url, _) = mock_elevenlabs(StatusCode::BAD_GATEWAY).await;
    let service = TtsService::new(ElevenLabsConfig::new("xi-test", base_url));
    let err = service.synthesize(&SpeechRequest::new("Hi")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ExternalService);
}

#[tokio::test]
async fn slow_service_times_out() {
    let app = Router::new().route(
        "/v1/text-to-speech/{voice_id}",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(3)).await;
            ([(header::CONTENT_TYPE, "audio/mpeg")], b"ID3late".to_vec())
        }),
    );
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let mut config = ElevenLabsConfig::new("test-xi-key", format!("http://{}/v1", addr));
    config.timeout_secs = 1;
    let err = TtsService::new(config)
        .synthesize(&SpeechRequest::new("Karibu"))
        .await
        .unwrap_err();
    assert!(matches!(err, VoiceError::Timeout(1)));
    assert_eq!(err.kind(), ErrorKind::Timeout);
}

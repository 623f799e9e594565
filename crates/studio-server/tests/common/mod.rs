#![allow(dead_code)]

use axum::{
    body::Body,
    extract::{ConnectInfo, Multipart},
    http::{header, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use studio_media::{AnimationConfig, ImagenConfig};
use studio_server::config::Config;
use studio_server::{app, AppState};
use studio_voice::ElevenLabsConfig;
use tempfile::TempDir;
use tokio::net::TcpListener;

// "iVBORw0KGgo=" decodes to the PNG signature.
pub const PNG_B64: &str = "iVBORw0KGgo=";
pub const PNG: &[u8] = &[137, 80, 78, 71, 13, 10, 26, 10, 0, 0, 0, 13];
pub const MP3: &[u8] = b"ID3\x03\x00fake-mp3-frames";
pub const VIDEO: &[u8] = b"\x00\x00\x00\x18ftypmp42fake-video-bytes";

pub const BOUNDARY: &str = "studio-test-boundary";

async fn spawn(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// Mock Imagen API answering every predict call with `reply`.
pub async fn mock_imagen(status: StatusCode, reply: Value) -> (String, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let router = Router::new().route(
        "/v1beta/models/{model}",
        post(move || {
            let counter = counter.clone();
            let reply = reply.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                (status, Json(reply))
            }
        }),
    );
    let addr = spawn(router).await;
    (format!("http://{}/v1beta", addr), calls)
}

pub fn png_prediction() -> Value {
    json!({"predictions": [{"bytesBase64Encoded": PNG_B64, "mimeType": "image/png"}]})
}

#[derive(Clone, Copy)]
pub enum AnimationBehavior {
    Video,
    NoFace,
    Unavailable,
}

/// What the mock animation service received.
#[derive(Default, Debug)]
pub struct AnimationCalls {
    pub count: usize,
    /// (field name, content type, byte length) of every part.
    pub fields: Vec<(String, Option<String>, usize)>,
}

/// Mock SadTalker HTTP endpoint.
pub async fn mock_animation(behavior: AnimationBehavior) -> (String, Arc<Mutex<AnimationCalls>>) {
    let calls = Arc::new(Mutex::new(AnimationCalls::default()));
    let sink = calls.clone();
    let router = Router::new().route(
        "/animate",
        post(move |mut multipart: Multipart| {
            let sink = sink.clone();
            async move {
                let mut fields = Vec::new();
                while let Some(field) = multipart.next_field().await.unwrap() {
                    let name = field.name().unwrap_or_default().to_string();
                    let content_type = field.content_type().map(str::to_string);
                    let data = field.bytes().await.unwrap();
                    fields.push((name, content_type, data.len()));
                }
                {
                    let mut calls = sink.lock().unwrap();
                    calls.count += 1;
                    calls.fields.extend(fields);
                }
                let response: Response = match behavior {
                    AnimationBehavior::Video => {
                        ([(header::CONTENT_TYPE, "video/mp4")], VIDEO.to_vec()).into_response()
                    }
                    AnimationBehavior::NoFace => (
                        StatusCode::BAD_REQUEST,
                        "Error: face not detected in source image",
                    )
                        .into_response(),
                    AnimationBehavior::Unavailable => {
                        (StatusCode::SERVICE_UNAVAILABLE, "GPU pool exhausted").into_response()
                    }
                };
                response
            }
        }),
    );
    let addr = spawn(router).await;
    (format!("http://{}/animate", addr), calls)
}

/// Mock ElevenLabs text-to-speech API; records the text of every call.
pub async fn mock_elevenlabs() -> (String, Arc<Mutex<Vec<String>>>) {
    let texts = Arc::new(Mutex::new(Vec::new()));
    let sink = texts.clone();
    let router = Router::new().route(
        "/v1/text-to-speech/{voice_id}",
        post(move |Json(body): Json<Value>| {
            let sink = sink.clone();
            async move {
                sink.lock()
                    .unwrap()
                    .push(body["text"].as_str().unwrap_or_default().to_string());
                ([(header::CONTENT_TYPE, "audio/mpeg")], MP3.to_vec())
            }
        }),
    );
    let addr = spawn(router).await;
    (format!("http://{}/v1", addr), texts)
}

/// Endpoints the test app talks to. `None` leaves a service unconfigured.
#[derive(Default)]
pub struct Services {
    pub imagen: Option<String>,
    pub animation: Option<String>,
    pub elevenlabs: Option<String>,
}

pub struct TestApp {
    pub router: Router,
    pub media: TempDir,
}

pub fn test_app(services: Services) -> TestApp {
    test_app_with(services, |_| {})
}

pub fn test_app_with(services: Services, tweak: impl FnOnce(&mut Config)) -> TestApp {
    let media = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.media.dir = media.path().to_path_buf();

    config.imagen = match services.imagen {
        Some(base) => ImagenConfig::new("test-gemini-key", base),
        None => ImagenConfig::default(),
    };
    config.animation = match services.animation {
        Some(endpoint) => AnimationConfig::remote(endpoint),
        None => AnimationConfig::remote(""),
    };
    config.elevenlabs = match services.elevenlabs {
        Some(base) => ElevenLabsConfig::new("test-xi-key", base),
        None => ElevenLabsConfig::default(),
    };
    tweak(&mut config);

    TestApp {
        router: app(AppState::from_config(&config)),
        media,
    }
}

pub fn peer() -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 40000)
}

pub fn json_request(uri: &str, body: Value) -> Request<Body> {
    let mut request = Request::builder()
        .uri(uri)
        .method("POST")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    request.extensions_mut().insert(ConnectInfo(peer()));
    request
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// One part of a multipart form.
pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        file_name: &'a str,
        content_type: Option<&'a str>,
        data: &'a [u8],
    },
}

pub fn multipart_request(uri: &str, parts: &[Part<'_>]) -> Request<Body> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                        .as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                file_name,
                content_type,
                data,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                        name, file_name
                    )
                    .as_bytes(),
                );
                if let Some(ct) = content_type {
                    body.extend_from_slice(format!("Content-Type: {}\r\n", ct).as_bytes());
                }
                body.extend_from_slice(b"\r\n");
                body.extend_from_slice(data);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    let mut request = Request::builder()
        .uri(uri)
        .method("POST")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap();
    request.extensions_mut().insert(ConnectInfo(peer()));
    request
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

//! Test helpers: an in-process storage origin and audio fixture generation.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone, Default)]
struct OriginState {
    files: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    /// Remaining injected 500s per path
    failures: Arc<RwLock<HashMap<String, usize>>>,
}

/// Loopback HTTP server standing in for the asset CDN and storage origin.
///
/// Serves seeded files on GET, stores uploads on PUT, and can inject
/// transient failures for retry tests.
pub struct TestOrigin {
    pub base_url: String,
    state: OriginState,
}

impl TestOrigin {
    pub async fn start() -> Self {
        let state = OriginState::default();
        let app = Router::new()
            .route("/*path", get(get_file).put(put_file))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    pub async fn seed(&self, path: &str, bytes: Vec<u8>) {
        self.state
            .files
            .write()
            .await
            .insert(path.to_string(), bytes);
    }

    /// Make the next `times` GETs of `path` return 500.
    pub async fn fail_next(&self, path: &str, times: usize) {
        self.state
            .failures
            .write()
            .await
            .insert(path.to_string(), times);
    }

    pub async fn stored(&self, path: &str) -> Option<Vec<u8>> {
        self.state.files.read().await.get(path).cloned()
    }

    pub async fn stored_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.state.files.read().await.keys().cloned().collect();
        paths.sort();
        paths
    }
}

async fn get_file(
    State(state): State<OriginState>,
    Path(path): Path<String>,
) -> Result<Vec<u8>, StatusCode> {
    {
        let mut failures = state.failures.write().await;
        if let Some(remaining) = failures.get_mut(&path) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(StatusCode::INTERNAL_SERVER_ERROR);
            }
        }
    }

    state
        .files
        .read()
        .await
        .get(&path)
        .cloned()
        .ok_or(StatusCode::NOT_FOUND)
}

async fn put_file(
    State(state): State<OriginState>,
    Path(path): Path<String>,
    body: Bytes,
) -> StatusCode {
    state.files.write().await.insert(path, body.to_vec());
    StatusCode::OK
}

/// A mono 22.05 kHz WAV tone, deliberately non-canonical so downloads
/// exercise the transcode path.
pub fn tone_wav(duration_secs: f64, freq: f32) -> Vec<u8> {
    const RATE: u32 = 22_050;
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        let frames = (duration_secs * RATE as f64) as usize;
        for i in 0..frames {
            let t = i as f32 / RATE as f32;
            let sample = (2.0 * std::f32::consts::PI * freq * t).sin() * 0.3;
            writer
                .write_sample((sample * i16::MAX as f32) as i16)
                .unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

//! Test doubles for the remote fetcher and the derivative generator

use async_trait::async_trait;
use bytes::Bytes;
use depot_core::models::{ContentKind, JobKind, RemoteCredentials};
use depot_import::{FetchError, RemoteFetcher};
use depot_processing::{Derivative, DerivativeError, DerivativeGenerator};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Serves configured payloads, optionally after a delay; unknown URIs fail with 404.
#[derive(Default)]
pub struct FakeFetcher {
    payloads: Mutex<HashMap<String, (Bytes, Duration)>>,
    calls: AtomicUsize,
    seen_users: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn serve(&self, uri: &str, body: Bytes) {
        self.serve_after(uri, body, Duration::ZERO);
    }

    pub fn serve_after(&self, uri: &str, body: Bytes, delay: Duration) {
        self.payloads
            .lock()
            .unwrap()
            .insert(uri.to_string(), (body, delay));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen_users(&self) -> Vec<String> {
        self.seen_users.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteFetcher for FakeFetcher {
    async fn fetch(&self, uri: &str, credentials: &RemoteCredentials) -> Result<Bytes, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_users
            .lock()
            .unwrap()
            .push(credentials.username().to_string());

        let entry = self.payloads.lock().unwrap().get(uri).cloned();
        match entry {
            Some((body, delay)) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Ok(body)
            }
            None => Err(FetchError::Status { status: 404 }),
        }
    }
}

/// Records requested derivatives and returns small placeholder outputs
#[derive(Default)]
pub struct StubGenerator {
    requests: Mutex<Vec<(JobKind, ContentKind)>>,
    fail_recoverably: Mutex<bool>,
}

impl StubGenerator {
    pub fn requests(&self) -> Vec<(JobKind, ContentKind)> {
        self.requests.lock().unwrap().clone()
    }

    pub fn fail_recoverably(&self, fail: bool) {
        *self.fail_recoverably.lock().unwrap() = fail;
    }
}

#[async_trait]
impl DerivativeGenerator for StubGenerator {
    async fn generate(
        &self,
        job: JobKind,
        kind: ContentKind,
        _content: &[u8],
    ) -> Result<Vec<Derivative>, DerivativeError> {
        self.requests.lock().unwrap().push((job, kind));
        if *self.fail_recoverably.lock().unwrap() {
            return Err(DerivativeError::ToolFailed {
                tool: "ffmpeg".to_string(),
                message: "simulated crash".to_string(),
            });
        }
        let name = match job {
            JobKind::GenerateThumbnail => "thumbnail.png",
            JobKind::TranscodeAudio => "audio.mp3",
            JobKind::TranscodeVideo => "video.mp4",
            JobKind::Characterize => return Err(DerivativeError::Unsupported { job, kind }),
        };
        Ok(vec![Derivative::new(name, Bytes::from_static(b"derived"))])
    }
}

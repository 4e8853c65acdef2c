// SPDX-License-Identifier: MIT OR Apache-2.0
//! In-memory media backend for tests.

use crate::error::MediaError;
use crate::media::{ImageInfo, MediaBackend, VideoHandle};
use futures::future::{BoxFuture, FutureExt};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::watch;

pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Decoder state of a fake video, shared with the test
#[derive(Debug, Default)]
pub(crate) struct FakeVideoState {
    pub position: f64,
    pub playing: bool,
    pub closed: bool,
    pub error: Option<String>,
}

struct FakeVideo {
    duration: f64,
    state: Arc<Mutex<FakeVideoState>>,
}

impl VideoHandle for FakeVideo {
    fn duration_ms(&self) -> f64 {
        self.duration
    }

    fn seek(&mut self, position_ms: f64) {
        self.state.lock().position = position_ms;
    }

    fn play(&mut self) {
        self.state.lock().playing = true;
    }

    fn pause(&mut self) {
        self.state.lock().playing = false;
    }

    fn position_ms(&self) -> f64 {
        self.state.lock().position
    }

    fn error(&self) -> Option<String> {
        self.state.lock().error.clone()
    }

    fn close(&mut self) {
        let mut state = self.state.lock();
        state.playing = false;
        state.closed = true;
    }
}

#[derive(Default)]
pub(crate) struct FakeBackend {
    failing: Mutex<HashSet<String>>,
    held: Mutex<HashMap<String, watch::Sender<bool>>>,
    durations: Mutex<HashMap<String, f64>>,
    videos: Mutex<HashMap<String, Arc<Mutex<FakeVideoState>>>>,
    opened: Mutex<Vec<String>>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make loads of `src` fail
    pub fn fail(&self, src: &str) {
        self.failing.lock().insert(src.to_string());
    }

    /// Keep loads of `src` pending until [`FakeBackend::release`]
    pub fn hold(&self, src: &str) {
        self.held
            .lock()
            .insert(src.to_string(), watch::channel(false).0);
    }

    pub fn release(&self, src: &str) {
        if let Some(gate) = self.held.lock().get(src) {
            gate.send_replace(true);
        }
    }

    pub fn set_video_duration(&self, src: &str, duration: f64) {
        self.durations.lock().insert(src.to_string(), duration);
    }

    pub fn video(&self, src: &str) -> Option<Arc<Mutex<FakeVideoState>>> {
        self.videos.lock().get(src).cloned()
    }

    /// Every src opened so far, in order
    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().clone()
    }

    fn gate(&self, src: &str) -> BoxFuture<'static, ()> {
        let gate = self.held.lock().get(src).map(watch::Sender::subscribe);
        async move {
            if let Some(mut rx) = gate {
                let _ = rx.wait_for(|released| *released).await;
            }
        }
        .boxed()
    }

    fn check(&self, src: &str) -> Result<(), MediaError> {
        self.opened.lock().push(src.to_string());
        if self.failing.lock().contains(src) {
            Err(MediaError::load(src, "not found"))
        } else {
            Ok(())
        }
    }
}

impl MediaBackend for FakeBackend {
    fn open_video(&self, src: &str) -> BoxFuture<'static, Result<Box<dyn VideoHandle>, MediaError>> {
        let gate = self.gate(src);
        let result = self.check(src).map(|()| {
            let state = Arc::new(Mutex::new(FakeVideoState::default()));
            self.videos.lock().insert(src.to_string(), state.clone());
            let duration = self.durations.lock().get(src).copied().unwrap_or(1000.0);
            Box::new(FakeVideo { duration, state }) as Box<dyn VideoHandle>
        });
        async move {
            gate.await;
            result
        }
        .boxed()
    }

    fn open_image(&self, src: &str) -> BoxFuture<'static, Result<ImageInfo, MediaError>> {
        let gate = self.gate(src);
        let result = self.check(src).map(|()| ImageInfo {
            width: 1920,
            height: 1080,
        });
        async move {
            gate.await;
            result
        }
        .boxed()
    }
}

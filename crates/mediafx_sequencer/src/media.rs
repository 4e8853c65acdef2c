// SPDX-License-Identifier: MIT OR Apache-2.0
//! Media resources: the contract the sequencer plays against, the host
//! backend they load through, and the factory creating them.

use crate::animation::{AnimationWindow, PropertyAnimation};
use crate::clock::MediaClock;
use crate::error::MediaError;
use crate::image::ImageResource;
use crate::playable::{AnimationTarget, Completion, Finished, Playable};
use crate::playlist::{MediaClipSpec, MediaType};
use crate::video::VideoResource;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// A loadable, playable media clip
pub trait MediaResource: Playable {
    /// Start loading. The returned future only observes the load, so it can
    /// be stored and awaited later. Calling again returns another observer.
    fn load(&mut self) -> Finished;

    /// Current position within the source (ms)
    fn current_time(&self) -> f64;

    /// Playable duration (ms), known once loaded
    fn duration(&self) -> Option<f64>;

    /// Property sink of the clip's animations
    fn target(&self) -> AnimationTarget;

    /// The clip being played
    fn spec(&self) -> &MediaClipSpec;
}

/// Intrinsic image information
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImageInfo {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

/// An opened video, decoded and painted by the host
pub trait VideoHandle: Send {
    /// Intrinsic duration (ms)
    fn duration_ms(&self) -> f64;
    /// Seek to a position (ms)
    fn seek(&mut self, position_ms: f64);
    /// Start or resume decoding
    fn play(&mut self);
    /// Pause decoding
    fn pause(&mut self);
    /// Current decode position (ms)
    fn position_ms(&self) -> f64;
    /// Error raised by the decoder since opening, if any
    fn error(&self) -> Option<String>;
    /// Release the decoder
    fn close(&mut self);
}

/// Host services that open media
pub trait MediaBackend: Send + Sync {
    /// Open a video for playback
    fn open_video(&self, src: &str) -> BoxFuture<'static, Result<Box<dyn VideoHandle>, MediaError>>;
    /// Open an image for display
    fn open_image(&self, src: &str) -> BoxFuture<'static, Result<ImageInfo, MediaError>>;
}

/// Creates media resources for clips
pub trait MediaFactory: Send + Sync {
    /// Create an unloaded resource for `spec`
    fn create(&self, spec: Arc<MediaClipSpec>) -> Box<dyn MediaResource>;
}

/// Factory creating [`VideoResource`]s and [`ImageResource`]s over a backend
#[derive(Clone)]
pub struct BackendMediaFactory {
    backend: Arc<dyn MediaBackend>,
    image_duration_ms: f64,
}

impl BackendMediaFactory {
    /// Create a factory
    pub fn new(backend: Arc<dyn MediaBackend>, image_duration_ms: f64) -> Self {
        Self {
            backend,
            image_duration_ms,
        }
    }
}

impl MediaFactory for BackendMediaFactory {
    fn create(&self, spec: Arc<MediaClipSpec>) -> Box<dyn MediaResource> {
        match spec.media_type {
            MediaType::Video => Box::new(VideoResource::new(spec, self.backend.clone())),
            MediaType::Image => Box::new(ImageResource::new(
                spec,
                self.backend.clone(),
                self.image_duration_ms,
            )),
        }
    }
}

/// Clock and attached animations of a loaded clip
#[derive(Debug)]
struct Playback {
    clock: MediaClock,
    start_time: f64,
    duration: f64,
    effective_end: f64,
    animations: Vec<PropertyAnimation>,
}

impl Playback {
    fn new(spec: &MediaClipSpec, duration: f64, target: &AnimationTarget) -> Result<Self, MediaError> {
        if !duration.is_finite() || duration <= 0.0 {
            return Err(MediaError::load(&spec.src, format!("invalid duration {duration}ms")));
        }

        let mut animations = Vec::new();
        let transform = spec.transform.as_ref().map(|t| t.to_animation());
        for animation in transform.iter().chain(&spec.animations) {
            let window =
                AnimationWindow::resolve(animation.start_offset, animation.end_offset, duration)
                    .map_err(|message| MediaError::load(&spec.src, message))?;
            let animation = PropertyAnimation::from_spec(animation, window, target.clone())
                .map_err(|e| MediaError::load(&spec.src, e.to_string()))?;
            animations.push(animation);
        }

        Ok(Self {
            clock: MediaClock::new(spec.start_time),
            start_time: spec.start_time,
            duration,
            effective_end: (duration - spec.overlap()).max(0.0),
            animations,
        })
    }

    fn local_time(&self) -> f64 {
        self.clock.current_time() - self.start_time
    }

    /// Apply animations at the current time; true once the effective end is
    /// reached
    fn advance(&mut self) -> bool {
        let local = self.local_time();
        for animation in &mut self.animations {
            animation.update(local);
        }
        local >= self.effective_end
    }
}

#[derive(Default)]
struct ClipState {
    playback: Option<Playback>,
    handle: Option<Box<dyn VideoHandle>>,
    wants_play: bool,
    cancelled: bool,
}

/// What a finished load hands back
pub(crate) struct Opened {
    pub duration: f64,
    pub handle: Option<Box<dyn VideoHandle>>,
}

/// State shared by every clip variant: loading, clock, animations, and the
/// load and finished settlements
pub(crate) struct ClipCore {
    spec: Arc<MediaClipSpec>,
    target: AnimationTarget,
    state: Arc<Mutex<ClipState>>,
    loaded: Arc<Completion>,
    completion: Completion,
    task: Option<JoinHandle<()>>,
}

impl ClipCore {
    pub fn new(spec: Arc<MediaClipSpec>) -> Self {
        let target = AnimationTarget::new(spec.src.clone());
        Self {
            spec,
            target,
            state: Arc::new(Mutex::new(ClipState::default())),
            loaded: Arc::new(Completion::new()),
            completion: Completion::new(),
            task: None,
        }
    }

    pub fn spec(&self) -> &MediaClipSpec {
        &self.spec
    }

    pub fn target(&self) -> AnimationTarget {
        self.target.clone()
    }

    /// Spawn `open` once and return an observer of its outcome
    pub fn load(
        &mut self,
        open: impl FnOnce() -> BoxFuture<'static, Result<Opened, MediaError>>,
    ) -> Finished {
        if self.task.is_some() || self.state.lock().cancelled {
            return self.loaded.wait();
        }
        let open = open();

        let spec = self.spec.clone();
        let target = self.target.clone();
        let state = self.state.clone();
        let loaded = self.loaded.clone();
        self.task = Some(tokio::spawn(async move {
            let result = open.await;
            let mut state = state.lock();
            if state.cancelled {
                if let Ok(Opened { handle: Some(mut handle), .. }) = result {
                    handle.close();
                }
                return;
            }

            let Opened {
                duration,
                mut handle,
            } = match result {
                Ok(opened) => opened,
                Err(e) => {
                    drop(state);
                    tracing::warn!("Failed to load {}: {}", spec.src, e);
                    loaded.fail(e);
                    return;
                }
            };

            match Playback::new(&spec, duration, &target) {
                Ok(mut playback) => {
                    if let Some(handle) = &mut handle {
                        handle.seek(spec.start_time);
                        if state.wants_play {
                            handle.play();
                        }
                    }
                    if state.wants_play {
                        playback.clock.play();
                    }
                    tracing::debug!("Loaded {} ({}ms)", spec.src, playback.duration);
                    state.playback = Some(playback);
                    state.handle = handle;
                    drop(state);
                    loaded.finish();
                }
                Err(e) => {
                    if let Some(handle) = &mut handle {
                        handle.close();
                    }
                    drop(state);
                    tracing::warn!("Failed to load {}: {}", spec.src, e);
                    loaded.fail(e);
                }
            }
        }));
        self.loaded.wait()
    }

    pub fn current_time(&self) -> f64 {
        self.state
            .lock()
            .playback
            .as_ref()
            .map_or(self.spec.start_time, |p| p.clock.current_time())
    }

    pub fn duration(&self) -> Option<f64> {
        self.state.lock().playback.as_ref().map(|p| p.duration)
    }
}

impl Playable for ClipCore {
    fn play(&mut self) {
        let mut state = self.state.lock();
        if state.cancelled {
            return;
        }
        state.wants_play = true;
        if let Some(playback) = &mut state.playback {
            playback.clock.play();
        }
        if let Some(handle) = &mut state.handle {
            handle.play();
        }
    }

    fn pause(&mut self) {
        let mut state = self.state.lock();
        state.wants_play = false;
        if let Some(playback) = &mut state.playback {
            playback.clock.pause();
        }
        if let Some(handle) = &mut state.handle {
            handle.pause();
        }
    }

    fn cancel(&mut self) {
        {
            let mut state = self.state.lock();
            state.cancelled = true;
            state.wants_play = false;
            if let Some(playback) = &mut state.playback {
                playback.clock.stop();
            }
            if let Some(mut handle) = state.handle.take() {
                handle.close();
            }
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.loaded.cancel();
        self.completion.cancel();
    }

    fn finished(&self) -> Finished {
        self.completion.wait()
    }

    fn set_animation_time(&mut self, timestamp: f64) {
        let mut state = self.state.lock();
        let ClipState {
            playback, handle, ..
        } = &mut *state;
        let Some(playback) = playback else {
            return;
        };
        if !playback.clock.is_playing() {
            return;
        }
        playback.clock.tick(timestamp);

        if let Some(message) = handle.as_ref().and_then(|h| h.error()) {
            playback.clock.stop();
            if let Some(mut handle) = handle.take() {
                handle.close();
            }
            drop(state);
            tracing::warn!("Playback error in {}: {}", self.spec.src, message);
            self.completion
                .fail(MediaError::playback(&self.spec.src, message));
            return;
        }
        if let Some(handle) = handle {
            playback.clock.synchronize(handle.position_ms());
            if playback.local_time() >= playback.duration {
                handle.pause();
            }
        }

        if playback.advance() {
            drop(state);
            self.completion.finish();
        }
    }
}

impl Drop for ClipCore {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        if let Some(mut handle) = self.state.lock().handle.take() {
            handle.close();
        }
    }
}

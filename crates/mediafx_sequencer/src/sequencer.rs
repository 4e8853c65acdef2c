// SPDX-License-Identifier: MIT OR Apache-2.0
//! Playlist sequencer.
//!
//! Plays clips back to back through a two-slot pipeline: the active item
//! plays while the next one preloads. At each boundary the loading item is
//! promoted, optionally after a transition during which both play.
//!
//! All state sits behind one lock that is never held across an `.await`. The
//! run loop is a spawned task tied to a session epoch; `stop` and
//! `set_playlist` bump the epoch and the loop re-checks it before every
//! mutation, so a stale loop can never act on a newer session.

use crate::config::SequencerConfig;
use crate::error::{MediaError, ValidationError};
use crate::keyframe::PropertyMap;
use crate::media::{BackendMediaFactory, MediaBackend, MediaFactory, MediaResource};
use crate::playable::{Finished, Playable};
use crate::playlist::{MediaClipSpec, Playlist};
use crate::presets::TransitionRegistry;
use crate::transition::{TransitionEngine, TransitionRun};
use futures::future::{FutureExt, Shared};
use parking_lot::Mutex;
use serde::Serialize;
use std::future::Future;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use uuid::Uuid;

/// Unique identifier for a media item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct MediaItemId(pub Uuid);

impl MediaItemId {
    /// Create a new random item ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MediaItemId {
    fn default() -> Self {
        Self::new()
    }
}

/// Load state of a media item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LoadState {
    /// Created, not loading yet
    Unloaded,
    /// Load in flight
    Loading,
    /// Loaded and playable
    Ready,
    /// Cancelled and released
    Disposed,
}

/// Pipeline slot of a media item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Slot {
    /// The playing, visible item
    Active,
    /// The preloading next item
    Loading,
}

/// Sequencer lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SequencerStatus {
    /// Nothing playing
    #[default]
    Idle,
    /// Loading the first item
    Initializing,
    /// Only the active item playing
    Running,
    /// Active and loading items playing with a transition
    Transitioning,
    /// A failure is being reported
    Error,
}

/// Notifications for the host
#[derive(Debug, Clone, PartialEq)]
pub enum SequencerEvent {
    /// Playback stopped on a load or playback failure
    Error {
        /// Human readable description
        message: String,
        /// The failure
        cause: MediaError,
    },
    /// Lifecycle state changed
    StateChanged(SequencerStatus),
    /// Playlist item became the active item
    Activated {
        /// Playlist index
        index: usize,
    },
    /// Transition between two items started
    TransitionStarted {
        /// Outgoing index
        from: usize,
        /// Incoming index
        to: usize,
    },
    /// The last item finished
    PlaylistFinished,
}

/// Host view of a media item
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemView {
    /// Playlist index
    pub index: usize,
    /// Item ID
    pub id: MediaItemId,
    /// Media source
    pub src: String,
    /// Load state
    pub load_state: LoadState,
    /// Whether the item is on screen
    pub mounted: bool,
    /// Current animated properties
    pub properties: PropertyMap,
}

/// Everything the host needs to paint a frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameSnapshot {
    /// Lifecycle state
    pub status: SequencerStatus,
    /// Index of the active item
    pub cursor: Option<usize>,
    /// The active item
    pub active: Option<ItemView>,
    /// The loading item
    pub loading: Option<ItemView>,
    /// Whether a transition is running
    pub transitioning: bool,
}

impl FrameSnapshot {
    /// View of one slot
    pub fn slot(&self, slot: Slot) -> Option<&ItemView> {
        match slot {
            Slot::Active => self.active.as_ref(),
            Slot::Loading => self.loading.as_ref(),
        }
    }

    /// Number of items alive in the pipeline
    pub fn live_items(&self) -> usize {
        usize::from(self.active.is_some()) + usize::from(self.loading.is_some())
    }
}

struct MediaItem {
    id: MediaItemId,
    index: usize,
    resource: Box<dyn MediaResource>,
    load_state: LoadState,
    ready: Option<Shared<Finished>>,
    mounted: bool,
}

impl MediaItem {
    /// Create the resource for playlist entry `index` without loading it
    fn new(factory: &dyn MediaFactory, index: usize, spec: Arc<MediaClipSpec>) -> Self {
        Self {
            id: MediaItemId::new(),
            index,
            resource: factory.create(spec),
            load_state: LoadState::Unloaded,
            ready: None,
            mounted: false,
        }
    }

    /// Create the item for playlist entry `index` and start loading it
    fn preload(factory: &dyn MediaFactory, index: usize, spec: Arc<MediaClipSpec>) -> Self {
        let mut item = Self::new(factory, index, spec);
        let _ = item.ready();
        item
    }

    /// The item's load, started on first use
    fn ready(&mut self) -> Shared<Finished> {
        if let Some(ready) = &self.ready {
            return ready.clone();
        }
        tracing::debug!("Loading item {} ({})", self.index, self.resource.spec().src);
        let ready = self.resource.load().shared();
        if self.load_state == LoadState::Unloaded {
            self.load_state = LoadState::Loading;
        }
        self.ready = Some(ready.clone());
        ready
    }

    fn refresh_load_state(&mut self) {
        if self.load_state == LoadState::Loading
            && matches!(
                self.ready.clone().and_then(FutureExt::now_or_never),
                Some(Ok(()))
            )
        {
            self.load_state = LoadState::Ready;
        }
    }

    fn dispose(&mut self) {
        if self.load_state != LoadState::Disposed {
            tracing::debug!("Disposing item {} ({})", self.index, self.resource.spec().src);
            self.resource.cancel();
            self.load_state = LoadState::Disposed;
            self.mounted = false;
        }
    }

    fn view(&mut self) -> ItemView {
        self.refresh_load_state();
        ItemView {
            index: self.index,
            id: self.id,
            src: self.resource.spec().src.clone(),
            load_state: self.load_state,
            mounted: self.mounted,
            properties: self.resource.target().properties(),
        }
    }
}

impl Drop for MediaItem {
    fn drop(&mut self) {
        self.dispose();
    }
}

struct State {
    playlist: Vec<Arc<MediaClipSpec>>,
    cursor: Option<usize>,
    active: Option<MediaItem>,
    loading: Option<MediaItem>,
    transition: Option<TransitionRun>,
    status: SequencerStatus,
    epoch: u64,
    paused: bool,
    run_loop: Option<JoinHandle<()>>,
    frame_clock: Option<JoinHandle<()>>,
    events: mpsc::UnboundedSender<SequencerEvent>,
}

impl State {
    fn emit(&self, event: SequencerEvent) {
        let _ = self.events.send(event);
    }

    fn set_status(&mut self, status: SequencerStatus) {
        if self.status != status {
            tracing::debug!("Sequencer {:?} -> {:?}", self.status, status);
            self.status = status;
            self.emit(SequencerEvent::StateChanged(status));
        }
    }

    /// Create item 0, preload item 1, and return item 0's load
    fn begin_session(&mut self, factory: &dyn MediaFactory) -> Option<Shared<Finished>> {
        let first = self.playlist.first()?.clone();
        self.set_status(SequencerStatus::Initializing);
        self.cursor = Some(0);
        let mut active = MediaItem::new(factory, 0, first);
        let ready = active.ready();
        self.active = Some(active);
        self.loading = self
            .playlist
            .get(1)
            .map(|spec| MediaItem::preload(factory, 1, spec.clone()));
        Some(ready)
    }

    fn activate_first(&mut self) {
        let paused = self.paused;
        if let Some(active) = &mut self.active {
            active.load_state = LoadState::Ready;
            active.mounted = true;
            if !paused {
                active.resource.play();
            }
            tracing::info!("Activated item {} ({})", active.index, active.resource.spec().src);
            let index = active.index;
            self.emit(SequencerEvent::Activated { index });
        }
        self.set_status(SequencerStatus::Running);
    }

    /// Mount the loading item and start the active item's transition, if
    /// it declares one
    fn begin_transition(
        &mut self,
        registry: &TransitionRegistry,
    ) -> Result<Option<Finished>, MediaError> {
        let (Some(active), Some(loading)) = (&mut self.active, &mut self.loading) else {
            return Ok(None);
        };
        let spec = active.resource.spec();
        let Some(resolved) = spec.transition.as_ref().and_then(|t| t.resolve(registry)) else {
            return Ok(None);
        };
        let mut run = TransitionEngine::begin_resolved(
            &resolved,
            active.resource.target(),
            loading.resource.target(),
        )
        .map_err(|e| MediaError::load(&spec.src, e.to_string()))?;

        loading.load_state = LoadState::Ready;
        loading.mounted = true;
        if !self.paused {
            loading.resource.play();
            run.play();
        }
        let (from, to) = (active.index, loading.index);
        let finished = run.finished();
        self.transition = Some(run);

        tracing::info!("Transition {} -> {} ({}ms)", from, to, resolved.overlap);
        self.emit(SequencerEvent::TransitionStarted { from, to });
        self.set_status(SequencerStatus::Transitioning);
        Ok(Some(finished))
    }

    /// Promote the loading item and preload the one after it.
    ///
    /// Returns false when the playlist is exhausted.
    fn advance(&mut self, factory: &dyn MediaFactory) -> bool {
        if let Some(run) = self.transition.take() {
            run.release();
        }
        let Some(mut next) = self.loading.take() else {
            if let Some(mut active) = self.active.take() {
                active.dispose();
            }
            self.cursor = None;
            tracing::info!("Playlist finished");
            self.emit(SequencerEvent::PlaylistFinished);
            self.set_status(SequencerStatus::Idle);
            return false;
        };

        next.load_state = LoadState::Ready;
        next.mounted = true;
        if !self.paused {
            next.resource.play();
        }
        let index = next.index;
        if let Some(mut previous) = self.active.replace(next) {
            previous.dispose();
        }
        self.cursor = Some(index);
        self.loading = self
            .playlist
            .get(index + 1)
            .map(|spec| MediaItem::preload(factory, index + 1, spec.clone()));

        tracing::info!("Activated item {}", index);
        self.emit(SequencerEvent::Activated { index });
        self.set_status(SequencerStatus::Running);
        true
    }

    /// Cancel and drop everything in the pipeline
    fn teardown(&mut self) {
        if let Some(mut run) = self.transition.take() {
            run.cancel();
        }
        for mut item in [self.active.take(), self.loading.take()].into_iter().flatten() {
            item.dispose();
        }
        self.cursor = None;
    }
}

enum SessionEnd {
    Exhausted,
    Empty,
}

struct Inner {
    factory: Arc<dyn MediaFactory>,
    registry: Arc<TransitionRegistry>,
    config: SequencerConfig,
    cancel: watch::Sender<u64>,
    state: Mutex<State>,
}

async fn superseded(cancel: &mut watch::Receiver<u64>, epoch: u64) {
    let _ = cancel.wait_for(|current| *current != epoch).await;
}

/// Wait for `future` unless the session `epoch` is superseded first
async fn until_cancelled<T>(
    cancel: &mut watch::Receiver<u64>,
    epoch: u64,
    future: impl Future<Output = Result<T, MediaError>>,
) -> Result<T, MediaError> {
    tokio::select! {
        biased;
        () = superseded(cancel, epoch) => Err(MediaError::Cancelled),
        result = future => result,
    }
}

impl Inner {
    /// Run `f` on the state if `epoch` is still current
    fn with_state<T>(&self, epoch: u64, f: impl FnOnce(&mut State) -> T) -> Result<T, MediaError> {
        let mut state = self.state.lock();
        if state.epoch != epoch {
            return Err(MediaError::Cancelled);
        }
        Ok(f(&mut state))
    }

    /// Supersede the current session, release its items and clear any pause
    fn halt(&self, state: &mut State) -> Option<JoinHandle<()>> {
        state.epoch += 1;
        self.cancel.send_replace(state.epoch);
        state.teardown();
        state.paused = false;
        state.set_status(SequencerStatus::Idle);
        state.run_loop.take()
    }

    async fn run(
        self: Arc<Self>,
        epoch: u64,
        previous: Option<JoinHandle<()>>,
        started: oneshot::Sender<()>,
    ) {
        if let Some(previous) = previous {
            let _ = previous.await;
        }
        let mut cancel = self.cancel.subscribe();
        let mut started = Some(started);

        loop {
            match self.run_session(epoch, &mut cancel, &mut started).await {
                Ok(SessionEnd::Exhausted) if self.config.loops() => {
                    tracing::info!("Restarting playlist");
                }
                Ok(_) => break,
                Err(e) if e.is_cancelled() => {
                    tracing::debug!("Run loop {} cancelled", epoch);
                    break;
                }
                Err(e) => {
                    self.fail(epoch, e);
                    break;
                }
            }
        }
    }

    async fn run_session(
        &self,
        epoch: u64,
        cancel: &mut watch::Receiver<u64>,
        started: &mut Option<oneshot::Sender<()>>,
    ) -> Result<SessionEnd, MediaError> {
        let factory = self.factory.as_ref();
        let Some(ready) = self.with_state(epoch, |s| s.begin_session(factory))? else {
            return Ok(SessionEnd::Empty);
        };
        until_cancelled(cancel, epoch, ready).await?;
        self.with_state(epoch, State::activate_first)?;
        if let Some(started) = started.take() {
            let _ = started.send(());
        }

        loop {
            let finished = self.with_state(epoch, |s| {
                s.active.as_ref().map(|item| item.resource.finished())
            })?;
            let Some(finished) = finished else {
                return Ok(SessionEnd::Exhausted);
            };
            until_cancelled(cancel, epoch, finished).await?;

            let next =
                self.with_state(epoch, |s| s.loading.as_mut().map(MediaItem::ready))?;
            if let Some(ready) = next {
                until_cancelled(cancel, epoch, ready).await?;
                let run = self.with_state(epoch, |s| s.begin_transition(&self.registry))??;
                if let Some(run) = run {
                    until_cancelled(cancel, epoch, run).await?;
                }
            }

            if !self.with_state(epoch, |s| s.advance(factory))? {
                return Ok(SessionEnd::Exhausted);
            }
        }
    }

    /// Report a failure once and release everything
    fn fail(&self, epoch: u64, error: MediaError) {
        let mut state = self.state.lock();
        if state.epoch != epoch {
            return;
        }
        tracing::error!("Sequence stopped: {}", error);
        state.teardown();
        state.set_status(SequencerStatus::Error);
        state.emit(SequencerEvent::Error {
            message: error.to_string(),
            cause: error,
        });
        state.set_status(SequencerStatus::Idle);
    }
}

/// Plays a playlist through media resources created by a factory
#[derive(Clone)]
pub struct Sequencer {
    inner: Arc<Inner>,
}

impl Sequencer {
    /// Create an idle sequencer and the receiver of its events
    pub fn new(
        factory: Arc<dyn MediaFactory>,
        registry: Arc<TransitionRegistry>,
        config: SequencerConfig,
    ) -> (Self, mpsc::UnboundedReceiver<SequencerEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let state = State {
            playlist: Vec::new(),
            cursor: None,
            active: None,
            loading: None,
            transition: None,
            status: SequencerStatus::Idle,
            epoch: 0,
            paused: false,
            run_loop: None,
            frame_clock: None,
            events,
        };
        let inner = Inner {
            factory,
            registry,
            config,
            cancel: watch::channel(0).0,
            state: Mutex::new(state),
        };
        (
            Self {
                inner: Arc::new(inner),
            },
            receiver,
        )
    }

    /// Create a sequencer over a media backend with the built-in transitions
    pub fn with_backend(
        backend: Arc<dyn MediaBackend>,
        config: SequencerConfig,
    ) -> (Self, mpsc::UnboundedReceiver<SequencerEvent>) {
        let factory = BackendMediaFactory::new(backend, config.image_duration_ms);
        Self::new(
            Arc::new(factory),
            Arc::new(TransitionRegistry::with_builtins()),
            config,
        )
    }

    /// Replace the playlist and start playing it.
    ///
    /// Invalid playlists are rejected before anything is touched. Otherwise
    /// the previous session is cancelled and this returns once the first
    /// item is playing, has failed (reported as an event) or the session was
    /// superseded.
    pub async fn set_playlist(&self, items: Vec<MediaClipSpec>) -> Result<(), ValidationError> {
        let playlist = Playlist::new(items);
        playlist.validate(&self.inner.registry)?;

        let (started_tx, started_rx) = oneshot::channel();
        let previous = {
            let mut state = self.inner.state.lock();
            let previous = self.inner.halt(&mut state);
            let registry = self.inner.registry.as_ref();
            state.playlist = playlist
                .iter()
                .map(|spec| Arc::new(spec.clone().without_empty_transition(registry)))
                .collect();
            tracing::info!("Playlist set ({} items)", state.playlist.len());
            if state.playlist.is_empty() {
                previous
            } else {
                let epoch = state.epoch;
                let run = self.inner.clone().run(epoch, previous, started_tx);
                state.run_loop = Some(tokio::spawn(run));
                None
            }
        };

        match previous {
            Some(previous) => {
                let _ = previous.await;
            }
            None => {
                let _ = started_rx.await;
            }
        }
        Ok(())
    }

    /// Resume every playing unit
    pub fn play(&self) {
        let mut state = self.inner.state.lock();
        state.paused = false;
        let State {
            active,
            loading,
            transition,
            ..
        } = &mut *state;
        if let Some(item) = active.as_mut().filter(|item| item.mounted) {
            item.resource.play();
        }
        if let Some(item) = loading.as_mut().filter(|item| item.mounted) {
            item.resource.play();
        }
        if let Some(run) = transition {
            run.play();
        }
    }

    /// Pause every playing unit
    pub fn pause(&self) {
        let mut state = self.inner.state.lock();
        state.paused = true;
        let State {
            active,
            loading,
            transition,
            ..
        } = &mut *state;
        for item in [active.as_mut(), loading.as_mut()].into_iter().flatten() {
            item.resource.pause();
        }
        if let Some(run) = transition {
            run.pause();
        }
    }

    /// Cancel everything and return to idle; waits for the run loop to exit
    pub async fn stop(&self) {
        let (run_loop, frame_clock) = {
            let mut state = self.inner.state.lock();
            let run_loop = self.inner.halt(&mut state);
            (run_loop, state.frame_clock.take())
        };
        if let Some(frame_clock) = frame_clock {
            frame_clock.abort();
        }
        if let Some(run_loop) = run_loop {
            if let Err(e) = run_loop.await {
                if e.is_panic() {
                    tracing::error!("Run loop panicked: {}", e);
                }
            }
        }
        tracing::info!("Sequencer stopped");
    }

    /// Forward a host animation timestamp (ms) to everything on screen
    pub fn set_animation_time(&self, timestamp: f64) {
        let mut state = self.inner.state.lock();
        let State {
            active,
            loading,
            transition,
            ..
        } = &mut *state;
        if let Some(item) = active.as_mut().filter(|item| item.mounted) {
            item.resource.set_animation_time(timestamp);
        }
        if let Some(item) = loading.as_mut().filter(|item| item.mounted) {
            item.resource.set_animation_time(timestamp);
        }
        if let Some(run) = transition {
            run.set_animation_time(timestamp);
        }
    }

    /// Drive [`Sequencer::set_animation_time`] from a ticker until
    /// [`Sequencer::stop`]
    pub fn spawn_frame_clock(&self, interval: Duration) {
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let task = tokio::spawn(async move {
            let origin = Instant::now();
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                Sequencer { inner }.set_animation_time(origin.elapsed().as_secs_f64() * 1000.0);
            }
        });
        if let Some(previous) = self.inner.state.lock().frame_clock.replace(task) {
            previous.abort();
        }
    }

    /// Frame clock at the configured interval
    pub fn spawn_default_frame_clock(&self) {
        self.spawn_frame_clock(self.inner.config.frame_interval);
    }

    /// Current lifecycle state
    pub fn status(&self) -> SequencerStatus {
        self.inner.state.lock().status
    }

    /// The configuration
    pub fn config(&self) -> &SequencerConfig {
        &self.inner.config
    }

    /// Capture what the host needs to paint
    pub fn snapshot(&self) -> FrameSnapshot {
        let mut state = self.inner.state.lock();
        FrameSnapshot {
            status: state.status,
            cursor: state.cursor,
            transitioning: state.transition.is_some(),
            active: state.active.as_mut().map(MediaItem::view),
            loading: state.loading.as_mut().map(MediaItem::view),
        }
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0
//! Video clips decoded by the host.

use crate::error::MediaError;
use crate::media::{ClipCore, MediaBackend, MediaResource, Opened};
use crate::playable::{AnimationTarget, Finished, Playable};
use crate::playlist::MediaClipSpec;
use futures::FutureExt;
use std::sync::Arc;

/// Video clip.
///
/// The clock follows the decoder: every animation tick synchronizes it to the
/// handle's position. The duration is `(endTime or intrinsic duration) -
/// startTime`. Decoder errors settle [`Playable::finished`] with
/// [`MediaError::Playback`].
pub struct VideoResource {
    core: ClipCore,
    backend: Arc<dyn MediaBackend>,
}

impl VideoResource {
    /// Create an unloaded video
    pub fn new(spec: Arc<MediaClipSpec>, backend: Arc<dyn MediaBackend>) -> Self {
        Self {
            core: ClipCore::new(spec),
            backend,
        }
    }
}

impl Playable for VideoResource {
    fn play(&mut self) {
        self.core.play();
    }

    fn pause(&mut self) {
        self.core.pause();
    }

    fn cancel(&mut self) {
        self.core.cancel();
    }

    fn finished(&self) -> Finished {
        self.core.finished()
    }

    fn set_animation_time(&mut self, timestamp: f64) {
        self.core.set_animation_time(timestamp);
    }
}

impl MediaResource for VideoResource {
    fn load(&mut self) -> Finished {
        let backend = self.backend.clone();
        let spec = self.core.spec().clone();
        self.core.load(move || {
            backend
                .open_video(&spec.src)
                .map(move |opened| {
                    let mut handle = opened?;
                    let end_time = spec.end_time.unwrap_or_else(|| handle.duration_ms());
                    if end_time <= spec.start_time {
                        handle.close();
                        return Err(MediaError::load(
                            &spec.src,
                            format!("startTime {} is past the end {end_time}", spec.start_time),
                        ));
                    }
                    Ok(Opened {
                        duration: end_time - spec.start_time,
                        handle: Some(handle),
                    })
                })
                .boxed()
        })
    }

    fn current_time(&self) -> f64 {
        self.core.current_time()
    }

    fn duration(&self) -> Option<f64> {
        self.core.duration()
    }

    fn target(&self) -> AnimationTarget {
        self.core.target()
    }

    fn spec(&self) -> &MediaClipSpec {
        self.core.spec()
    }
}

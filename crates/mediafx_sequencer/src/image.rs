// SPDX-License-Identifier: MIT OR Apache-2.0
//! Still images shown for a fixed time.

use crate::media::{ClipCore, MediaBackend, MediaResource, Opened};
use crate::playable::{AnimationTarget, Finished, Playable};
use crate::playlist::MediaClipSpec;
use futures::FutureExt;
use std::sync::Arc;

/// Image clip. Its clock is driven purely by host timestamps; the duration is
/// `endTime - startTime`, or the configured image duration without an end
/// time.
pub struct ImageResource {
    core: ClipCore,
    backend: Arc<dyn MediaBackend>,
    default_duration: f64,
}

impl ImageResource {
    /// Create an unloaded image
    pub fn new(spec: Arc<MediaClipSpec>, backend: Arc<dyn MediaBackend>, default_duration: f64) -> Self {
        Self {
            core: ClipCore::new(spec),
            backend,
            default_duration,
        }
    }

    fn playable_duration(&self) -> f64 {
        let spec = self.core.spec();
        match spec.end_time {
            Some(end_time) => end_time - spec.start_time,
            None => self.default_duration,
        }
    }
}

impl Playable for ImageResource {
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

impl MediaResource for ImageResource {
    fn load(&mut self) -> Finished {
        let duration = self.playable_duration();
        let backend = self.backend.clone();
        let src = self.core.spec().src.clone();
        self.core.load(move || {
            backend
                .open_image(&src)
                .map(move |info| {
                    info.map(|_| Opened {
                        duration,
                        handle: None,
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MediaError;
    use crate::keyframe::Keyframe;
    use crate::playlist::{AnimationSpec, TransitionSpec};
    use crate::testing::FakeBackend;

    fn image(spec: MediaClipSpec, backend: &Arc<FakeBackend>) -> ImageResource {
        ImageResource::new(Arc::new(spec), backend.clone(), 5000.0)
    }

    #[tokio::test]
    async fn test_default_duration() {
        let backend = FakeBackend::new();
        let mut resource = image(MediaClipSpec::image("a.png"), &backend);
        assert_eq!(resource.duration(), None);
        resource.load().await.unwrap();
        assert_eq!(resource.duration(), Some(5000.0));
    }

    #[tokio::test]
    async fn test_finishes_before_overlap() {
        let backend = FakeBackend::new();
        let spec = MediaClipSpec::image("a.png")
            .with_times(1000.0, Some(3000.0))
            .with_transition(TransitionSpec::preset("crossFade", 500.0));
        let mut resource = image(spec, &backend);
        resource.load().await.unwrap();
        let finished = resource.finished();

        resource.play();
        resource.set_animation_time(0.0);
        assert_eq!(resource.current_time(), 1000.0);
        resource.set_animation_time(1499.0);
        assert_eq!(resource.current_time(), 2499.0);
        resource.set_animation_time(1500.0);
        assert_eq!(finished.await, Ok(()));
    }

    #[tokio::test]
    async fn test_drives_attached_animations() {
        let backend = FakeBackend::new();
        let spec = MediaClipSpec::image("a.png")
            .with_times(0.0, Some(2000.0))
            .with_animation(AnimationSpec {
                start_offset: Some(1000.0),
                ..AnimationSpec::new(vec![
                    Keyframe::new(0.0).with("opacity", 0.0),
                    Keyframe::new(1.0).with("opacity", 1.0),
                ])
            });
        let mut resource = image(spec, &backend);
        resource.load().await.unwrap();
        let target = resource.target();

        resource.play();
        resource.set_animation_time(0.0);
        resource.set_animation_time(500.0);
        assert_eq!(target.get("opacity"), None);
        resource.set_animation_time(1500.0);
        assert_eq!(target.get("opacity"), Some(0.5));

        resource.pause();
        resource.set_animation_time(9000.0);
        assert_eq!(resource.current_time(), 1500.0);
    }

    #[tokio::test]
    async fn test_animation_outside_clip_fails_load() {
        let backend = FakeBackend::new();
        let spec = MediaClipSpec::image("a.png")
            .with_times(0.0, Some(1000.0))
            .with_animation(AnimationSpec {
                start_offset: Some(2000.0),
                ..AnimationSpec::new(vec![Keyframe::new(0.0).with("opacity", 0.0)])
            });
        let mut resource = image(spec, &backend);
        assert!(matches!(resource.load().await, Err(MediaError::Load { .. })));
    }

    #[tokio::test]
    async fn test_cancel_settles_pending_load_and_finished() {
        let backend = FakeBackend::new();
        backend.hold("a.png");
        let mut resource = image(MediaClipSpec::image("a.png"), &backend);
        let load = resource.load();
        let finished = resource.finished();

        resource.cancel();
        resource.cancel();
        assert_eq!(load.await, Err(MediaError::Cancelled));
        assert_eq!(finished.await, Err(MediaError::Cancelled));
        assert_eq!(resource.load().await, Err(MediaError::Cancelled));
    }
}

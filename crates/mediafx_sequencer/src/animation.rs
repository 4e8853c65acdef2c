// SPDX-License-Identifier: MIT OR Apache-2.0
//! Property animations and the playables that drive them.

use crate::clock::MediaClock;
use crate::error::TimelineError;
use crate::keyframe::Easing;
use crate::playable::{AnimationTarget, Completion, Finished, Playable};
use crate::playlist::AnimationSpec;
use crate::timeline::Timeline;
use futures::future::{try_join_all, FutureExt};
use serde::{Deserialize, Serialize};

/// Whether an animation's values apply outside its window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillMode {
    /// Same as `Forwards`: values stay on the target until it is released
    #[default]
    Auto,
    /// Values are removed once the window ends
    None,
    /// Final values are held after the window
    Forwards,
    /// Start values are applied during the delay
    Backwards,
    /// Both `Forwards` and `Backwards`
    Both,
}

impl FillMode {
    /// Whether final values are held after the window
    pub fn holds_end(&self) -> bool {
        matches!(self, Self::Auto | Self::Forwards | Self::Both)
    }

    /// Whether start values apply before the window
    pub fn holds_start(&self) -> bool {
        matches!(self, Self::Backwards | Self::Both)
    }
}

/// How an iteration builds on the previous ones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IterationComposite {
    /// Every iteration starts from the keyframe values
    #[default]
    Replace,
    /// Each iteration adds the previous iteration's final values
    Accumulate,
}

/// Composite operation of an animation or keyframe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompositeOperation {
    /// Replace the underlying value
    Replace,
    /// Add to the underlying value
    Add,
    /// Accumulate onto the underlying value
    Accumulate,
    /// Use the animation's operation
    Auto,
}

/// Active window of an animation inside its owner's playback (ms)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationWindow {
    /// Time from the owner's start to the first frame
    pub delay: f64,
    /// Length of the window
    pub duration: f64,
}

impl AnimationWindow {
    /// Window covering `duration` from the start
    pub fn full(duration: f64) -> Self {
        Self {
            delay: 0.0,
            duration,
        }
    }

    /// Resolve start/end offsets against a clip of `clip_duration`.
    ///
    /// Non-negative offsets count from the clip start, negative ones back
    /// from its end. Missing offsets default to the clip bounds.
    pub fn resolve(
        start_offset: Option<f64>,
        end_offset: Option<f64>,
        clip_duration: f64,
    ) -> Result<Self, String> {
        let position = |offset: f64| {
            if offset >= 0.0 {
                offset
            } else {
                clip_duration + offset
            }
        };
        let start = start_offset.map_or(0.0, position);
        let end = end_offset.map_or(clip_duration, position);

        if !(0.0..=clip_duration).contains(&start) {
            return Err(format!(
                "animation start {start}ms is outside the clip (0..{clip_duration}ms)"
            ));
        }
        if !(start..=clip_duration).contains(&end) {
            return Err(format!(
                "animation end {end}ms is outside the clip ({start}..{clip_duration}ms)"
            ));
        }
        Ok(Self {
            delay: start,
            duration: end - start,
        })
    }
}

/// A keyframe timeline played over a window, possibly several times.
///
/// Sampled values are merged into the target. The fill mode decides what
/// the target holds before and after the window.
#[derive(Debug, Clone)]
pub struct PropertyAnimation {
    timeline: Timeline,
    delay: f64,
    iteration_duration: f64,
    iterations: f64,
    easing: Easing,
    fill: FillMode,
    iteration_composite: IterationComposite,
    target: AnimationTarget,
    iteration: u64,
    progress: f64,
    released: bool,
}

impl PropertyAnimation {
    /// Create an animation.
    ///
    /// Each iteration lasts `window / max(1, iterations)`, so a fractional
    /// count below one plays that fraction of a single pass.
    pub fn new(
        timeline: Timeline,
        window: AnimationWindow,
        iterations: f64,
        target: AnimationTarget,
    ) -> Self {
        Self {
            timeline,
            delay: window.delay,
            iteration_duration: window.duration / iterations.max(1.0),
            iterations,
            easing: Easing::Linear,
            fill: FillMode::default(),
            iteration_composite: IterationComposite::default(),
            target,
            iteration: 0,
            progress: 0.0,
            released: false,
        }
    }

    /// Build from a playlist animation
    pub fn from_spec(
        spec: &AnimationSpec,
        window: AnimationWindow,
        target: AnimationTarget,
    ) -> Result<Self, TimelineError> {
        Ok(Self::new(spec.timeline()?, window, spec.iterations, target)
            .with_easing(spec.easing)
            .with_fill(spec.fill)
            .with_iteration_composite(spec.iteration_composite))
    }

    /// Set the easing applied to each iteration's progress
    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Set the fill mode
    pub fn with_fill(mut self, fill: FillMode) -> Self {
        self.fill = fill;
        self
    }

    /// Set how iterations accumulate
    pub fn with_iteration_composite(mut self, iteration_composite: IterationComposite) -> Self {
        self.iteration_composite = iteration_composite;
        self
    }

    /// End of the last iteration, relative to the owner's start
    pub fn end_time(&self) -> f64 {
        self.delay + self.iteration_duration * self.iterations
    }

    /// Whether `local_time` is past the window
    pub fn is_finished(&self, local_time: f64) -> bool {
        local_time >= self.end_time()
    }

    /// Property names this animation writes
    pub fn property_names(&self) -> Vec<String> {
        self.timeline
            .property_names()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// The target written to
    pub fn target(&self) -> &AnimationTarget {
        &self.target
    }

    fn position(&self, active: f64) -> (u64, f64) {
        if self.iteration_duration <= 0.0 || active >= self.iteration_duration * self.iterations {
            let last = (self.iterations.ceil() as u64).saturating_sub(1);
            let fraction = self.iterations - self.iterations.floor();
            return (last, if fraction > 0.0 { fraction } else { 1.0 });
        }
        let iteration = (active / self.iteration_duration).floor();
        let progress = (active - iteration * self.iteration_duration) / self.iteration_duration;
        (iteration as u64, progress)
    }

    /// Sample at `local_time` (ms since the owner started) and apply
    pub fn update(&mut self, local_time: f64) {
        let active = local_time - self.delay;
        if active < 0.0 {
            if self.fill.holds_start() {
                self.apply(0, 0.0);
            }
            return;
        }
        if active >= self.iteration_duration * self.iterations && !self.fill.holds_end() {
            if !self.released {
                let names = self.property_names();
                self.target.remove(names.iter().map(String::as_str));
                self.released = true;
            }
            return;
        }
        let (iteration, progress) = self.position(active);
        self.apply(iteration, progress);
    }

    fn apply(&mut self, iteration: u64, progress: f64) {
        let progress = self.easing.apply(progress).clamp(0.0, 1.0);
        if iteration != self.iteration || progress < self.progress {
            self.timeline.rewind();
        }
        self.iteration = iteration;
        self.progress = progress;
        self.released = false;

        let mut values = self.timeline.sample(progress);
        if self.iteration_composite == IterationComposite::Accumulate && iteration > 0 {
            if let Some(last) = self.timeline.keyframes().last() {
                for (name, value) in values.iter_mut() {
                    if let Some(end) = last.properties.get(name) {
                        *value += iteration as f64 * end;
                    }
                }
            }
        }
        self.target.apply(&values);
    }
}

/// A single animation with its own clock, playable on its own
#[derive(Debug)]
pub struct AnimationPlayer {
    animation: PropertyAnimation,
    clock: MediaClock,
    completion: Completion,
}

impl AnimationPlayer {
    /// Create a stopped player
    pub fn new(animation: PropertyAnimation) -> Self {
        Self {
            animation,
            clock: MediaClock::new(0.0),
            completion: Completion::new(),
        }
    }

    /// The driven animation
    pub fn animation(&self) -> &PropertyAnimation {
        &self.animation
    }

    /// Elapsed time on the player's clock
    pub fn current_time(&self) -> f64 {
        self.clock.current_time()
    }

    /// Whether the player has settled
    pub fn is_settled(&self) -> bool {
        self.completion.is_settled()
    }
}

impl Playable for AnimationPlayer {
    fn play(&mut self) {
        if !self.completion.is_settled() {
            self.clock.play();
        }
    }

    fn pause(&mut self) {
        self.clock.pause();
    }

    fn cancel(&mut self) {
        self.clock.stop();
        self.completion.cancel();
    }

    fn finished(&self) -> Finished {
        self.completion.wait()
    }

    fn set_animation_time(&mut self, timestamp: f64) {
        if !self.clock.is_playing() {
            return;
        }
        let time = self.clock.tick(timestamp);
        self.animation.update(time);
        if self.animation.is_finished(time) {
            self.clock.stop();
            self.completion.finish();
        }
    }
}

/// All players bound to one target, driven as one unit
#[derive(Debug)]
pub struct PairedAnimation {
    target: AnimationTarget,
    players: Vec<AnimationPlayer>,
}

impl PairedAnimation {
    /// Group players for `target`
    pub fn new(target: AnimationTarget, players: Vec<AnimationPlayer>) -> Self {
        Self { target, players }
    }

    /// Shared target
    pub fn target(&self) -> &AnimationTarget {
        &self.target
    }

    /// Grouped players
    pub fn players(&self) -> &[AnimationPlayer] {
        &self.players
    }

    /// Number of players not yet settled
    pub fn live_count(&self) -> usize {
        self.players.iter().filter(|p| !p.is_settled()).count()
    }

    /// Remove every property the players wrote
    pub fn release(&self) {
        let names: Vec<String> = self
            .players
            .iter()
            .flat_map(|p| p.animation().property_names())
            .collect();
        self.target.remove(names.iter().map(String::as_str));
    }
}

impl Playable for PairedAnimation {
    fn play(&mut self) {
        self.players.iter_mut().for_each(Playable::play);
    }

    fn pause(&mut self) {
        self.players.iter_mut().for_each(Playable::pause);
    }

    fn cancel(&mut self) {
        self.players.iter_mut().for_each(Playable::cancel);
    }

    fn finished(&self) -> Finished {
        try_join_all(self.players.iter().map(Playable::finished))
            .map(|result| result.map(|_| ()))
            .boxed()
    }

    fn set_animation_time(&mut self, timestamp: f64) {
        for player in &mut self.players {
            player.set_animation_time(timestamp);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MediaError;
    use crate::keyframe::{Keyframe, StepPosition};

    fn fade(target: &AnimationTarget, window: AnimationWindow, iterations: f64) -> PropertyAnimation {
        let timeline = Timeline::build(&[
            Keyframe::new(0.0).with("opacity", 0.0),
            Keyframe::new(1.0).with("opacity", 1.0),
        ])
        .unwrap();
        PropertyAnimation::new(timeline, window, iterations, target.clone())
    }

    #[test]
    fn test_window_resolution() {
        assert_eq!(
            AnimationWindow::resolve(None, None, 4000.0),
            Ok(AnimationWindow::full(4000.0))
        );
        assert_eq!(
            AnimationWindow::resolve(Some(1000.0), Some(-1000.0), 4000.0),
            Ok(AnimationWindow {
                delay: 1000.0,
                duration: 2000.0
            })
        );
        assert!(AnimationWindow::resolve(Some(5000.0), None, 4000.0).is_err());
        assert!(AnimationWindow::resolve(Some(-500.0), Some(1000.0), 4000.0).is_err());
    }

    #[test]
    fn test_delay_and_final_state() {
        let target = AnimationTarget::new("image");
        let mut animation = fade(
            &target,
            AnimationWindow {
                delay: 100.0,
                duration: 200.0,
            },
            1.0,
        );

        animation.update(50.0);
        assert_eq!(target.get("opacity"), None);
        animation.update(200.0);
        assert_eq!(target.get("opacity"), Some(0.5));
        animation.update(1000.0);
        assert_eq!(target.get("opacity"), Some(1.0));
        assert!(animation.is_finished(300.0));
    }

    #[test]
    fn test_iterations_restart_timeline() {
        let target = AnimationTarget::new("image");
        let mut animation = fade(&target, AnimationWindow::full(1000.0), 2.0);

        animation.update(250.0);
        assert_eq!(target.get("opacity"), Some(0.5));
        animation.update(499.0);
        animation.update(750.0);
        assert_eq!(target.get("opacity"), Some(0.5));
        animation.update(1000.0);
        assert_eq!(target.get("opacity"), Some(1.0));
    }

    #[test]
    fn test_fractional_iterations_play_part_of_a_pass() {
        let target = AnimationTarget::new("image");
        let mut animation = fade(&target, AnimationWindow::full(1000.0), 0.5);
        assert_eq!(animation.end_time(), 500.0);

        animation.update(250.0);
        assert_eq!(target.get("opacity"), Some(0.25));
        assert!(!animation.is_finished(499.0));
        animation.update(1000.0);
        assert_eq!(target.get("opacity"), Some(0.5));
        assert!(animation.is_finished(500.0));
    }

    #[test]
    fn test_easing_shapes_iteration_progress() {
        let target = AnimationTarget::new("image");
        let mut animation = fade(&target, AnimationWindow::full(1000.0), 2.0)
            .with_easing(Easing::Steps(2, StepPosition::JumpEnd));

        animation.update(200.0);
        assert_eq!(target.get("opacity"), Some(0.0));
        animation.update(300.0);
        assert_eq!(target.get("opacity"), Some(0.5));
        animation.update(600.0);
        assert_eq!(target.get("opacity"), Some(0.0));
    }

    #[test]
    fn test_fill_modes() {
        let window = AnimationWindow {
            delay: 100.0,
            duration: 200.0,
        };

        let target = AnimationTarget::new("none");
        let mut none = fade(&target, window, 1.0).with_fill(FillMode::None);
        none.update(50.0);
        assert_eq!(target.get("opacity"), None);
        none.update(200.0);
        assert_eq!(target.get("opacity"), Some(0.5));
        none.update(300.0);
        assert_eq!(target.get("opacity"), None);

        let target = AnimationTarget::new("both");
        let mut both = fade(&target, window, 1.0).with_fill(FillMode::Both);
        both.update(50.0);
        assert_eq!(target.get("opacity"), Some(0.0));
        both.update(400.0);
        assert_eq!(target.get("opacity"), Some(1.0));
    }

    #[test]
    fn test_accumulating_iterations() {
        let target = AnimationTarget::new("image");
        let timeline = Timeline::build(&[
            Keyframe::new(0.0).with("rotate", 0.0),
            Keyframe::new(1.0).with("rotate", 90.0),
        ])
        .unwrap();
        let mut animation =
            PropertyAnimation::new(timeline, AnimationWindow::full(300.0), 3.0, target.clone())
                .with_iteration_composite(IterationComposite::Accumulate);

        animation.update(50.0);
        assert_eq!(target.get("rotate"), Some(45.0));
        animation.update(150.0);
        assert_eq!(target.get("rotate"), Some(135.0));
        animation.update(300.0);
        assert_eq!(target.get("rotate"), Some(270.0));
    }

    #[tokio::test]
    async fn test_player_finishes_from_timestamps() {
        let target = AnimationTarget::new("incoming");
        let mut player = AnimationPlayer::new(fade(&target, AnimationWindow::full(100.0), 1.0));
        let finished = player.finished();

        player.set_animation_time(0.0);
        assert_eq!(player.current_time(), 0.0);
        player.play();
        player.set_animation_time(1000.0);
        player.set_animation_time(1040.0);
        assert_eq!(target.get("opacity"), Some(0.4));
        player.set_animation_time(1100.0);

        assert_eq!(finished.await, Ok(()));
        assert!(player.is_settled());
    }

    #[tokio::test]
    async fn test_paired_cancel_rejects() {
        let target = AnimationTarget::new("outgoing");
        let mut paired = PairedAnimation::new(
            target.clone(),
            vec![
                AnimationPlayer::new(fade(&target, AnimationWindow::full(100.0), 1.0)),
                AnimationPlayer::new(fade(&target, AnimationWindow::full(300.0), 1.0)),
            ],
        );
        let finished = paired.finished();
        paired.play();
        paired.set_animation_time(0.0);
        paired.set_animation_time(150.0);
        assert_eq!(paired.live_count(), 1);

        paired.cancel();
        assert_eq!(finished.await, Err(MediaError::Cancelled));
        assert_eq!(paired.live_count(), 0);

        paired.release();
        assert!(target.properties().is_empty());
    }
}

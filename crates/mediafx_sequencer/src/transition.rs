// SPDX-License-Identifier: MIT OR Apache-2.0
//! Transitions between two clips over their overlap window.

use crate::animation::{AnimationPlayer, AnimationWindow, PairedAnimation, PropertyAnimation};
use crate::error::TimelineError;
use crate::playable::{AnimationTarget, Finished, Playable};
use crate::playlist::{AnimationSet, ResolvedTransition};
use futures::future::{try_join_all, FutureExt};

/// Builds transition runs
#[derive(Debug, Clone, Copy, Default)]
pub struct TransitionEngine;

impl TransitionEngine {
    /// Build a run animating `outgoing` with `source` and `incoming` with
    /// `dest`, all iterations fitting inside `overlap` (ms)
    pub fn begin(
        overlap: f64,
        source: &AnimationSet,
        dest: &AnimationSet,
        outgoing: AnimationTarget,
        incoming: AnimationTarget,
    ) -> Result<TransitionRun, TimelineError> {
        Ok(TransitionRun {
            outgoing: Self::pair(overlap, source, outgoing)?,
            incoming: Self::pair(overlap, dest, incoming)?,
        })
    }

    /// Build a run from a resolved transition
    pub fn begin_resolved(
        transition: &ResolvedTransition,
        outgoing: AnimationTarget,
        incoming: AnimationTarget,
    ) -> Result<TransitionRun, TimelineError> {
        Self::begin(
            transition.overlap,
            &transition.source,
            &transition.dest,
            outgoing,
            incoming,
        )
    }

    fn pair(
        overlap: f64,
        set: &AnimationSet,
        target: AnimationTarget,
    ) -> Result<PairedAnimation, TimelineError> {
        let players = set
            .animations()
            .iter()
            .map(|spec| {
                PropertyAnimation::from_spec(spec, AnimationWindow::full(overlap), target.clone())
                    .map(AnimationPlayer::new)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(PairedAnimation::new(target, players))
    }
}

/// Live transition: outgoing and incoming animations played together
#[derive(Debug)]
pub struct TransitionRun {
    outgoing: PairedAnimation,
    incoming: PairedAnimation,
}

impl TransitionRun {
    /// Animations of the outgoing clip
    pub fn outgoing(&self) -> &PairedAnimation {
        &self.outgoing
    }

    /// Animations of the incoming clip
    pub fn incoming(&self) -> &PairedAnimation {
        &self.incoming
    }

    /// Number of players not yet settled
    pub fn live_count(&self) -> usize {
        self.outgoing.live_count() + self.incoming.live_count()
    }

    /// Remove the properties written by the run from both targets
    pub fn release(&self) {
        self.outgoing.release();
        self.incoming.release();
    }
}

impl Playable for TransitionRun {
    fn play(&mut self) {
        self.outgoing.play();
        self.incoming.play();
    }

    fn pause(&mut self) {
        self.outgoing.pause();
        self.incoming.pause();
    }

    fn cancel(&mut self) {
        self.outgoing.cancel();
        self.incoming.cancel();
    }

    fn finished(&self) -> Finished {
        try_join_all([self.outgoing.finished(), self.incoming.finished()])
            .map(|result| result.map(|_| ()))
            .boxed()
    }

    fn set_animation_time(&mut self, timestamp: f64) {
        self.outgoing.set_animation_time(timestamp);
        self.incoming.set_animation_time(timestamp);
    }
}

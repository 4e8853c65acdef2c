// SPDX-License-Identifier: MIT OR Apache-2.0
//! Gapless media playlist sequencer.
//!
//! This crate plays an ordered list of video and image clips back to back:
//! - Two-slot pipeline preloading the next clip while the current one plays
//! - Transitions over the overlap between consecutive clips
//! - Keyframe property animations synchronized to each clip's own clock
//!
//! ## Architecture
//!
//! The sequencer is built on:
//! - Gap-filled keyframe timelines with forward-only sampling
//! - Media resources loaded through a host-supplied backend
//! - A transition engine fed by a preset registry
//! - A cancellable run loop on tokio

pub mod animation;
pub mod clock;
pub mod config;
pub mod error;
pub mod image;
pub mod keyframe;
pub mod media;
pub mod playable;
pub mod playlist;
pub mod presets;
pub mod sequencer;
pub mod timeline;
pub mod transition;
pub mod video;

#[cfg(test)]
mod testing;

pub use animation::{
    AnimationPlayer, AnimationWindow, CompositeOperation, FillMode, IterationComposite,
    PairedAnimation, PropertyAnimation,
};
pub use clock::{MediaClock, PlaybackState};
pub use config::{EndOfPlaylist, SequencerConfig};
pub use error::{MediaError, TimelineError, ValidationError};
pub use image::ImageResource;
pub use keyframe::{
    distribute_offsets, Easing, Interpolation, Keyframe, PropertyMap, StepPosition,
};
pub use media::{BackendMediaFactory, ImageInfo, MediaBackend, MediaFactory, MediaResource, VideoHandle};
pub use playable::{AnimationTarget, Completion, Finished, Playable, Settlement, TargetId};
pub use playlist::{
    AnimationSet, AnimationSpec, KeyframeSpec, MediaClipSpec, MediaType, ObjectFit, Playlist,
    ResolvedTransition, TransformKeyframe, TransformSpec, TransitionSpec,
};
pub use presets::{TransitionPreset, TransitionRegistry};
pub use sequencer::{
    FrameSnapshot, ItemView, LoadState, MediaItemId, Sequencer, SequencerEvent, SequencerStatus,
    Slot,
};
pub use timeline::Timeline;
pub use transition::{TransitionEngine, TransitionRun};
pub use video::VideoResource;

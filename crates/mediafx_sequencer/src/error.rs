// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types for playlists, timelines, media and the sequencer.

use thiserror::Error;

/// Errors raised while canonicalizing a keyframe list
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimelineError {
    /// Two keyframes share the same offset
    #[error("Duplicate keyframe offset: {0}")]
    DuplicateOffset(f64),

    /// A keyframe offset is outside `[0, 1]`
    #[error("Keyframe offset out of range: {0}")]
    OffsetOutOfRange(f64),
}

/// Errors raised when a playlist is rejected before playback starts
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Clip has no source
    #[error("Item {index}: empty src")]
    EmptySource {
        /// Playlist index
        index: usize,
    },

    /// Clip start time is negative or not finite
    #[error("Item {index}: invalid startTime {start_time}")]
    InvalidStartTime {
        /// Playlist index
        index: usize,
        /// Offending value
        start_time: f64,
    },

    /// Clip end time does not come after its start time
    #[error("Item {index}: endTime {end_time} must be greater than startTime {start_time}")]
    InvalidEndTime {
        /// Playlist index
        index: usize,
        /// Clip start
        start_time: f64,
        /// Offending value
        end_time: f64,
    },

    /// Transition overlap is not positive
    #[error("Item {index}: transition overlap must be > 0, got {overlap}")]
    InvalidOverlap {
        /// Playlist index
        index: usize,
        /// Offending value
        overlap: f64,
    },

    /// Transition names a preset that is not registered
    #[error("Item {index}: invalid transition name {name:?}")]
    UnknownTransition {
        /// Playlist index
        index: usize,
        /// Requested preset
        name: String,
    },

    /// Animation iteration count is not positive
    #[error("Item {index}: iterations must be > 0, got {iterations}")]
    InvalidIterations {
        /// Playlist index
        index: usize,
        /// Offending value
        iterations: f64,
    },

    /// Keyframes could not be turned into a timeline
    #[error("Item {index}: {source}")]
    Keyframes {
        /// Playlist index
        index: usize,
        /// Underlying timeline error
        #[source]
        source: TimelineError,
    },

    /// JSON decoding error
    #[error("Invalid playlist JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// RON decoding error
    #[error("Invalid playlist RON: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// Settlement errors of media resources and playables.
///
/// Cloneable because the same settlement is observed by every waiter.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MediaError {
    /// Resource failed to become ready
    #[error("Media load error ({src}): {message}")]
    Load {
        /// Source of the failing clip
        src: String,
        /// Backend message
        message: String,
    },

    /// Resource failed after becoming ready
    #[error("Media playback error ({src}): {message}")]
    Playback {
        /// Source of the failing clip
        src: String,
        /// Backend message
        message: String,
    },

    /// Deliberate teardown, never reported to the host
    #[error("Cancelled")]
    Cancelled,
}

impl MediaError {
    /// Build a load error
    pub fn load(src: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Load {
            src: src.into(),
            message: message.into(),
        }
    }

    /// Build a playback error
    pub fn playback(src: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Playback {
            src: src.into(),
            message: message.into(),
        }
    }

    /// Whether this settlement signals teardown rather than failure
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0
//! Sequencer configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What happens after the last clip finishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EndOfPlaylist {
    /// Start again from the first clip
    Loop,
    /// Settle in idle
    #[default]
    Stop,
}

/// Configuration for the sequencer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SequencerConfig {
    /// End of playlist policy
    pub end_of_playlist: EndOfPlaylist,
    /// Tick period of the built-in frame clock
    #[serde(with = "millis")]
    pub frame_interval: Duration,
    /// Display time of images without an end time (ms)
    pub image_duration_ms: f64,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            end_of_playlist: EndOfPlaylist::Stop,
            frame_interval: Duration::from_millis(16),
            image_duration_ms: 5000.0,
        }
    }
}

impl SequencerConfig {
    /// Create a config that restarts the playlist when it runs out
    pub fn looping() -> Self {
        Self {
            end_of_playlist: EndOfPlaylist::Loop,
            ..Self::default()
        }
    }

    /// Whether the playlist restarts after the last clip
    pub fn loops(&self) -> bool {
        self.end_of_playlist == EndOfPlaylist::Loop
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

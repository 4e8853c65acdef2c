// SPDX-License-Identifier: MIT OR Apache-2.0
//! Playback clocks driven by host animation timestamps.

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Not started, or cancelled
    #[default]
    Stopped,
    /// Advancing with each timestamp
    Playing,
    /// Holding its current time
    Paused,
}

/// A clock advanced by host timestamps (milliseconds).
///
/// Timestamps are only deltas: the first timestamp after [`MediaClock::play`]
/// anchors the clock without advancing it, so time spent paused is never
/// added back on resume.
#[derive(Debug, Clone)]
pub struct MediaClock {
    time: f64,
    state: PlaybackState,
    last_timestamp: Option<f64>,
}

impl MediaClock {
    /// Create a stopped clock at `start_time`
    pub fn new(start_time: f64) -> Self {
        Self {
            time: start_time,
            state: PlaybackState::Stopped,
            last_timestamp: None,
        }
    }

    /// Start or resume
    pub fn play(&mut self) {
        if self.state != PlaybackState::Playing {
            self.state = PlaybackState::Playing;
            self.last_timestamp = None;
        }
    }

    /// Pause, forgetting the timestamp anchor
    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
            self.last_timestamp = None;
        }
    }

    /// Stop; the clock ignores timestamps until played again
    pub fn stop(&mut self) {
        self.state = PlaybackState::Stopped;
        self.last_timestamp = None;
    }

    /// Advance from a host timestamp and return the new time
    pub fn tick(&mut self, timestamp: f64) -> f64 {
        if self.state == PlaybackState::Playing {
            if let Some(last) = self.last_timestamp {
                self.time += (timestamp - last).max(0.0);
            }
            self.last_timestamp = Some(timestamp);
        }
        self.time
    }

    /// Jump to an externally reported time
    pub fn synchronize(&mut self, time: f64) {
        self.time = time;
    }

    /// Current time
    pub fn current_time(&self) -> f64 {
        self.time
    }

    /// Current state
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Whether the clock is advancing
    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }
}

impl Default for MediaClock {
    fn default() -> Self {
        Self::new(0.0)
    }
}

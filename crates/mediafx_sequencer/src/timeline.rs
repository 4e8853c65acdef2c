// SPDX-License-Identifier: MIT OR Apache-2.0
//! Gap-filled keyframe timeline with forward-only sampling.

use crate::error::TimelineError;
use crate::keyframe::{Interpolation, Keyframe, PropertyMap};
use indexmap::IndexMap;

/// A canonicalized keyframe sequence.
///
/// Every keyframe carries every property defined at or before it. Sampling
/// keeps a cursor into the keyframes, so query times must not decrease
/// between calls (call [`Timeline::rewind`] to start over).
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    keyframes: Vec<Keyframe>,
    cursor: usize,
}

impl Timeline {
    /// Build a timeline from raw, possibly partial, keyframes
    pub fn build(keyframes: &[Keyframe]) -> Result<Self, TimelineError> {
        if let Some(kf) = keyframes
            .iter()
            .find(|k| !k.offset.is_finite() || !(0.0..=1.0).contains(&k.offset))
        {
            return Err(TimelineError::OffsetOutOfRange(kf.offset));
        }

        let mut sorted = keyframes.to_vec();
        sorted.sort_by(|a, b| a.offset.total_cmp(&b.offset));
        if let Some(pair) = sorted.windows(2).find(|w| w[0].offset == w[1].offset) {
            return Err(TimelineError::DuplicateOffset(pair[0].offset));
        }

        // Property name -> index of the last keyframe that defined it
        let mut last_defined: IndexMap<String, usize> = IndexMap::new();
        let mut resolved = Vec::with_capacity(sorted.len());

        for (i, current) in sorted.iter().enumerate() {
            let mut properties = PropertyMap::with_capacity(last_defined.len());
            for (name, &last) in &last_defined {
                if current.defines(name) {
                    continue;
                }
                let source = &sorted[last];
                let a = source.properties[name];
                let value = sorted[i + 1..]
                    .iter()
                    .find_map(|next| next.properties.get(name))
                    .map_or(a, |&b| {
                        Interpolation::lerp(a, b, source.offset, current.offset)
                    });
                properties.insert(name.clone(), value);
            }
            for (name, &value) in &current.properties {
                properties.insert(name.clone(), value);
                last_defined.insert(name.clone(), i);
            }
            resolved.push(Keyframe {
                offset: current.offset,
                properties,
                easing: current.easing,
            });
        }

        Ok(Self {
            keyframes: resolved,
            cursor: 0,
        })
    }

    /// Sample interpolated properties at normalized time `t`.
    ///
    /// Returns an empty map before the first keyframe and the last keyframe's
    /// properties at or after the last offset. A keyframe's easing shapes the
    /// segment up to the next keyframe.
    pub fn sample(&mut self, t: f64) -> PropertyMap {
        let Some(first) = self.keyframes.get(self.cursor) else {
            return PropertyMap::new();
        };
        if first.offset > t {
            return PropertyMap::new();
        }

        while self
            .keyframes
            .get(self.cursor + 1)
            .is_some_and(|next| next.offset <= t)
        {
            self.cursor += 1;
        }

        let current = &self.keyframes[self.cursor];
        let Some(next) = self.keyframes.get(self.cursor + 1) else {
            return current.properties.clone();
        };

        let t = current.easing.ease_between(current.offset, next.offset, t);
        current
            .properties
            .iter()
            .map(|(name, &a)| {
                let b = next.properties.get(name).copied().unwrap_or(a);
                (name.clone(), Interpolation::lerp(a, b, current.offset, t))
            })
            .collect()
    }

    /// Reset the sampling cursor to the first keyframe
    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    /// Current cursor position
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The canonicalized keyframes
    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    /// Whether the timeline has no keyframes
    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    /// All property names, in first-seen order
    pub fn property_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for kf in &self.keyframes {
            for name in kf.properties.keys() {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
        }
        names
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0
//! Named transition presets.
//!
//! Presets animate plain numeric properties. The host maps them to its own
//! rendering: `opacity`, `translateX`/`translateY` (fraction of the size),
//! `insetTop`/`insetRight`/`insetBottom`/`insetLeft` (clip inset, percent),
//! `clipRadius`/`clipCenterX`/`clipCenterY` (circle clip, percent) and
//! `chevronShift`/`chevronDepth` (chevron clip, percent).

use crate::keyframe::Keyframe;
use crate::playlist::{AnimationSet, AnimationSpec};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Outgoing and incoming animations of a transition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransitionPreset {
    /// Animations of the outgoing clip
    #[serde(default)]
    pub source: AnimationSet,
    /// Animations of the incoming clip
    #[serde(default)]
    pub dest: AnimationSet,
}

impl TransitionPreset {
    /// Create a preset
    pub fn new(source: AnimationSet, dest: AnimationSet) -> Self {
        Self { source, dest }
    }
}

/// Lookup of transition presets by name
#[derive(Debug, Clone, Default)]
pub struct TransitionRegistry {
    presets: IndexMap<String, TransitionPreset>,
}

impl TransitionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in presets
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(
            "crossFade",
            TransitionPreset::new(
                single(&[(0.0, &[("opacity", 1.0)]), (1.0, &[("opacity", 0.0)])]),
                single(&[(0.0, &[("opacity", 0.0)]), (1.0, &[("opacity", 1.0)])]),
            ),
        );
        for (name, edge) in [
            ("wipeLeft", "insetLeft"),
            ("wipeRight", "insetRight"),
            ("wipeTop", "insetTop"),
            ("wipeBottom", "insetBottom"),
        ] {
            registry.register(name, TransitionPreset::new(AnimationSet::default(), wipe(edge)));
        }
        for (name, property, direction) in [
            ("slideLeft", "translateX", -1.0),
            ("slideRight", "translateX", 1.0),
            ("slideUp", "translateY", -1.0),
            ("slideDown", "translateY", 1.0),
        ] {
            registry.register(
                name,
                TransitionPreset::new(
                    single(&[(0.0, &[(property, 0.0)]), (1.0, &[(property, direction)])]),
                    single(&[(0.0, &[(property, -direction)]), (1.0, &[(property, 0.0)])]),
                ),
            );
        }
        registry.register(
            "spotlight",
            TransitionPreset::new(
                AnimationSet::default(),
                single(&[
                    (0.0, &[("clipRadius", 0.0), ("clipCenterX", 50.0), ("clipCenterY", 50.0)]),
                    (0.25, &[("clipRadius", 20.0), ("clipCenterX", 80.0), ("clipCenterY", 80.0)]),
                    (0.5, &[("clipRadius", 20.0), ("clipCenterX", 12.0), ("clipCenterY", 84.0)]),
                    (0.75, &[("clipRadius", 20.0), ("clipCenterX", 93.0), ("clipCenterY", 51.0)]),
                    (0.87, &[("clipRadius", 20.0), ("clipCenterX", 20.0), ("clipCenterY", 20.0)]),
                    (1.0, &[("clipRadius", 100.0), ("clipCenterX", 50.0), ("clipCenterY", 50.0)]),
                ]),
            ),
        );
        registry.register(
            "chevron",
            TransitionPreset::new(
                single(&[
                    (0.0, &[("chevronShift", 0.0), ("chevronDepth", 0.0)]),
                    (0.25, &[("chevronShift", 0.0), ("chevronDepth", 25.0)]),
                    (1.0, &[("chevronShift", 100.0), ("chevronDepth", 25.0)]),
                ]),
                single(&[
                    (0.0, &[("chevronShift", -200.0), ("chevronDepth", 25.0)]),
                    (0.8, &[("chevronShift", 0.0), ("chevronDepth", 25.0)]),
                    (1.0, &[("chevronShift", 0.0), ("chevronDepth", 0.0)]),
                ]),
            ),
        );
        registry
    }

    /// Register or replace a preset
    pub fn register(&mut self, name: impl Into<String>, preset: TransitionPreset) {
        let name = name.into();
        if self.presets.insert(name.clone(), preset).is_some() {
            tracing::debug!("Replaced transition preset {}", name);
        }
    }

    /// Look up a preset
    pub fn get(&self, name: &str) -> Option<&TransitionPreset> {
        self.presets.get(name)
    }

    /// Whether a preset is registered
    pub fn contains(&self, name: &str) -> bool {
        self.presets.contains_key(name)
    }

    /// Registered names, in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.presets.keys().map(String::as_str)
    }

    /// Number of presets
    pub fn len(&self) -> usize {
        self.presets.len()
    }

    /// Whether no presets are registered
    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}

fn single(frames: &[(f64, &[(&str, f64)])]) -> AnimationSet {
    let keyframes = frames
        .iter()
        .map(|(offset, values)| {
            values
                .iter()
                .fold(Keyframe::new(*offset), |kf, (name, value)| kf.with(*name, *value))
        })
        .collect();
    AnimationSet::from(vec![AnimationSpec::new(keyframes)])
}

fn wipe(edge: &str) -> AnimationSet {
    let edges = ["insetTop", "insetRight", "insetBottom", "insetLeft"];
    let from: Vec<(&str, f64)> = edges
        .iter()
        .map(|&name| (name, if name == edge { 100.0 } else { 0.0 }))
        .collect();
    let to: Vec<(&str, f64)> = edges.iter().map(|&name| (name, 0.0)).collect();
    single(&[(0.0, from.as_slice()), (1.0, to.as_slice())])
}

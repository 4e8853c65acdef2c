// SPDX-License-Identifier: MIT OR Apache-2.0
//! Playlist model: clip specs, their animations and transitions.

use crate::animation::{CompositeOperation, FillMode, IterationComposite};
use crate::error::{TimelineError, ValidationError};
use crate::keyframe::{distribute_offsets, Easing, Keyframe, PropertyMap};
use crate::presets::TransitionRegistry;
use crate::timeline::Timeline;
use serde::{Deserialize, Serialize};

/// Kind of media a clip plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    /// Video with its own decoder clock
    Video,
    /// Still image shown for a fixed duration
    Image,
}

impl MediaType {
    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Image => "image",
        }
    }
}

/// How media is fitted into its box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectFit {
    /// Stretch to fill
    Fill,
    /// Letterbox
    #[default]
    Contain,
    /// Crop to fill
    Cover,
    /// Natural size
    None,
    /// Smaller of `None` and `Contain`
    ScaleDown,
}

/// A keyframe as written in a playlist, with an optional offset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyframeSpec {
    /// Normalized position, computed when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<f64>,
    /// Timing of the segment towards the next keyframe
    #[serde(default, skip_serializing_if = "Easing::is_linear")]
    pub easing: Easing,
    /// Accepted for compatibility; values always replace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub composite: Option<CompositeOperation>,
    /// Property values
    #[serde(flatten)]
    pub properties: PropertyMap,
}

impl KeyframeSpec {
    /// Resolve offsets and produce timeline keyframes
    pub fn resolve(specs: &[KeyframeSpec]) -> Vec<Keyframe> {
        let offsets: Vec<Option<f64>> = specs.iter().map(|k| k.offset).collect();
        specs
            .iter()
            .zip(distribute_offsets(&offsets))
            .map(|(spec, offset)| Keyframe {
                offset,
                properties: spec.properties.clone(),
                easing: spec.easing,
            })
            .collect()
    }
}

/// Pan/zoom/rotate keyframe
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TransformKeyframe {
    /// Normalized position, computed when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<f64>,
    /// Timing of the segment towards the next keyframe
    #[serde(default, skip_serializing_if = "Easing::is_linear")]
    pub easing: Easing,
    /// Uniform scale factor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
    /// Rotation in degrees
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotate: Option<f64>,
    /// Horizontal translation, as a fraction of the width
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translate_x: Option<f64>,
    /// Vertical translation, as a fraction of the height
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translate_y: Option<f64>,
}

impl TransformKeyframe {
    fn properties(&self) -> PropertyMap {
        [
            ("scale", self.scale),
            ("rotate", self.rotate),
            ("translateX", self.translate_x),
            ("translateY", self.translate_y),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name.to_string(), v)))
        .collect()
    }
}

/// Transform animation of a clip
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TransformSpec {
    /// Window start; negative values count back from the clip end
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_offset: Option<f64>,
    /// Window end; negative values count back from the clip end
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_offset: Option<f64>,
    /// Transform keyframes
    pub keyframes: Vec<TransformKeyframe>,
}

impl TransformSpec {
    /// Timeline keyframes over `scale`, `rotate`, `translateX`, `translateY`
    pub fn keyframes(&self) -> Vec<Keyframe> {
        let offsets: Vec<Option<f64>> = self.keyframes.iter().map(|k| k.offset).collect();
        self.keyframes
            .iter()
            .zip(distribute_offsets(&offsets))
            .map(|(kf, offset)| Keyframe {
                offset,
                properties: kf.properties(),
                easing: kf.easing,
            })
            .collect()
    }

    /// Equivalent generic animation, holding its final values
    pub fn to_animation(&self) -> AnimationSpec {
        AnimationSpec {
            start_offset: self.start_offset,
            end_offset: self.end_offset,
            ..AnimationSpec::new(self.keyframes()).with_fill(FillMode::Forwards)
        }
    }
}

fn default_iterations() -> f64 {
    1.0
}

fn is_one(value: &f64) -> bool {
    *value == 1.0
}

fn is_default<T: Default + PartialEq>(value: &T) -> bool {
    *value == T::default()
}

/// Keyframed property animation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AnimationSpec {
    /// Keyframes, offsets optional
    pub keyframes: Vec<KeyframeSpec>,
    /// Number of times the keyframes repeat inside the window
    #[serde(default = "default_iterations", skip_serializing_if = "is_one")]
    pub iterations: f64,
    /// Window start; negative values count back from the clip end
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_offset: Option<f64>,
    /// Window end; negative values count back from the clip end
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_offset: Option<f64>,
    /// Timing of each iteration
    #[serde(default, skip_serializing_if = "Easing::is_linear")]
    pub easing: Easing,
    /// Whether values apply outside the window
    #[serde(default, skip_serializing_if = "is_default")]
    pub fill: FillMode,
    /// How later iterations build on earlier ones
    #[serde(default, skip_serializing_if = "is_default")]
    pub iteration_composite: IterationComposite,
    /// Accepted for compatibility; values always replace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub composite: Option<CompositeOperation>,
}

impl AnimationSpec {
    /// Create a single-iteration animation over the whole window
    pub fn new(keyframes: Vec<Keyframe>) -> Self {
        Self {
            keyframes: keyframes
                .into_iter()
                .map(|kf| KeyframeSpec {
                    offset: Some(kf.offset),
                    easing: kf.easing,
                    composite: None,
                    properties: kf.properties,
                })
                .collect(),
            iterations: 1.0,
            start_offset: None,
            end_offset: None,
            easing: Easing::Linear,
            fill: FillMode::default(),
            iteration_composite: IterationComposite::default(),
            composite: None,
        }
    }

    /// Set the iteration count
    pub fn with_iterations(mut self, iterations: f64) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set the easing of each iteration
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

    /// Build the timeline for one iteration
    pub fn timeline(&self) -> Result<Timeline, TimelineError> {
        Timeline::build(&KeyframeSpec::resolve(&self.keyframes))
    }
}

/// Ordered animations applied to one transition target
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnimationSet(pub Vec<AnimationSpec>);

impl AnimationSet {
    /// Whether the set animates nothing
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Animations in the set
    pub fn animations(&self) -> &[AnimationSpec] {
        &self.0
    }
}

impl From<Vec<AnimationSpec>> for AnimationSet {
    fn from(animations: Vec<AnimationSpec>) -> Self {
        Self(animations)
    }
}

/// Transition from a clip into the next one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TransitionSpec {
    /// Time both clips play together
    pub overlap: f64,
    /// Preset from the transition registry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Animations of the outgoing clip, overriding the preset's
    #[serde(default, skip_serializing_if = "AnimationSet::is_empty")]
    pub source: AnimationSet,
    /// Animations of the incoming clip, overriding the preset's
    #[serde(default, skip_serializing_if = "AnimationSet::is_empty")]
    pub dest: AnimationSet,
}

/// A transition with its preset resolved
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTransition {
    /// Time both clips play together
    pub overlap: f64,
    /// Outgoing animations
    pub source: AnimationSet,
    /// Incoming animations
    pub dest: AnimationSet,
}

impl TransitionSpec {
    /// Transition using a registered preset
    pub fn preset(name: impl Into<String>, overlap: f64) -> Self {
        Self {
            overlap,
            name: Some(name.into()),
            source: AnimationSet::default(),
            dest: AnimationSet::default(),
        }
    }

    /// Transition with inline animations
    pub fn custom(overlap: f64, source: AnimationSet, dest: AnimationSet) -> Self {
        Self {
            overlap,
            name: None,
            source,
            dest,
        }
    }

    /// Whether the transition names no preset and animates nothing inline
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.source.is_empty() && self.dest.is_empty()
    }

    /// Resolve against the registry.
    ///
    /// Returns `None` when neither side animates anything or the preset is
    /// unknown.
    pub fn resolve(&self, registry: &TransitionRegistry) -> Option<ResolvedTransition> {
        let (mut source, mut dest) = (AnimationSet::default(), AnimationSet::default());
        if let Some(name) = &self.name {
            let preset = registry.get(name)?;
            source = preset.source.clone();
            dest = preset.dest.clone();
        }
        if !self.source.is_empty() {
            source = self.source.clone();
        }
        if !self.dest.is_empty() {
            dest = self.dest.clone();
        }
        if source.is_empty() && dest.is_empty() {
            return None;
        }
        Some(ResolvedTransition {
            overlap: self.overlap,
            source,
            dest,
        })
    }
}

/// One playlist entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MediaClipSpec {
    /// Media kind
    #[serde(rename = "type")]
    pub media_type: MediaType,
    /// Source locator, interpreted by the media backend
    pub src: String,
    /// Start position within the source (ms)
    #[serde(default)]
    pub start_time: f64,
    /// End position within the source (ms)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<f64>,
    /// Fit mode
    #[serde(default)]
    pub object_fit: ObjectFit,
    /// Pan/zoom/rotate animation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<TransformSpec>,
    /// Other property animations
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub animations: Vec<AnimationSpec>,
    /// Transition into the next clip
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition: Option<TransitionSpec>,
}

impl MediaClipSpec {
    /// Create a clip with default timing
    pub fn new(media_type: MediaType, src: impl Into<String>) -> Self {
        Self {
            media_type,
            src: src.into(),
            start_time: 0.0,
            end_time: None,
            object_fit: ObjectFit::default(),
            transform: None,
            animations: Vec::new(),
            transition: None,
        }
    }

    /// Create a video clip
    pub fn video(src: impl Into<String>) -> Self {
        Self::new(MediaType::Video, src)
    }

    /// Create an image clip
    pub fn image(src: impl Into<String>) -> Self {
        Self::new(MediaType::Image, src)
    }

    /// Set the start and end positions
    pub fn with_times(mut self, start_time: f64, end_time: Option<f64>) -> Self {
        self.start_time = start_time;
        self.end_time = end_time;
        self
    }

    /// Set the transform
    pub fn with_transform(mut self, transform: TransformSpec) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Add a property animation
    pub fn with_animation(mut self, animation: AnimationSpec) -> Self {
        self.animations.push(animation);
        self
    }

    /// Set the transition into the next clip
    pub fn with_transition(mut self, transition: TransitionSpec) -> Self {
        self.transition = Some(transition);
        self
    }

    /// Overlap with the next clip, or 0 when there is no transition to play
    pub fn overlap(&self) -> f64 {
        self.transition
            .as_ref()
            .filter(|t| !t.is_empty())
            .map_or(0.0, |t| t.overlap)
    }

    /// Drop a transition that resolves to nothing, so the clip plays to its
    /// end instead of stopping `overlap` early
    pub fn without_empty_transition(mut self, registry: &TransitionRegistry) -> Self {
        if self
            .transition
            .as_ref()
            .is_some_and(|t| t.resolve(registry).is_none())
        {
            tracing::debug!("{}: transition animates nothing, ignoring it", self.src);
            self.transition = None;
        }
        self
    }

    /// Check one clip; `index` is used in error messages
    pub fn validate(
        &self,
        index: usize,
        registry: &TransitionRegistry,
    ) -> Result<(), ValidationError> {
        if self.src.trim().is_empty() {
            return Err(ValidationError::EmptySource { index });
        }
        if !self.start_time.is_finite() || self.start_time < 0.0 {
            return Err(ValidationError::InvalidStartTime {
                index,
                start_time: self.start_time,
            });
        }
        if let Some(end_time) = self.end_time {
            if !end_time.is_finite() || end_time <= self.start_time {
                return Err(ValidationError::InvalidEndTime {
                    index,
                    start_time: self.start_time,
                    end_time,
                });
            }
        }

        let keyframe_error = |source| ValidationError::Keyframes { index, source };
        if let Some(transform) = &self.transform {
            Timeline::build(&transform.keyframes()).map_err(keyframe_error)?;
        }
        let mut animations: Vec<&AnimationSpec> = self.animations.iter().collect();

        if let Some(transition) = &self.transition {
            if !transition.overlap.is_finite() || transition.overlap <= 0.0 {
                return Err(ValidationError::InvalidOverlap {
                    index,
                    overlap: transition.overlap,
                });
            }
            if let Some(name) = &transition.name {
                if !registry.contains(name) {
                    return Err(ValidationError::UnknownTransition {
                        index,
                        name: name.clone(),
                    });
                }
            }
            animations.extend(transition.source.animations());
            animations.extend(transition.dest.animations());
        }

        for animation in animations {
            if !animation.iterations.is_finite() || animation.iterations <= 0.0 {
                return Err(ValidationError::InvalidIterations {
                    index,
                    iterations: animation.iterations,
                });
            }
            animation.timeline().map_err(keyframe_error)?;
        }
        Ok(())
    }
}

/// Ordered list of clips; order is playback order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Playlist {
    items: Vec<MediaClipSpec>,
}

impl Playlist {
    /// Create a playlist
    pub fn new(items: Vec<MediaClipSpec>) -> Self {
        Self { items }
    }

    /// Parse a JSON array of clips
    pub fn from_json(json: &str) -> Result<Self, ValidationError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse a RON list of clips
    pub fn from_ron(text: &str) -> Result<Self, ValidationError> {
        Ok(ron::from_str(text)?)
    }

    /// Check every clip
    pub fn validate(&self, registry: &TransitionRegistry) -> Result<(), ValidationError> {
        self.items
            .iter()
            .enumerate()
            .try_for_each(|(index, item)| item.validate(index, registry))
    }

    /// Clip at `index`
    pub fn get(&self, index: usize) -> Option<&MediaClipSpec> {
        self.items.get(index)
    }

    /// Number of clips
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether there are no clips
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate over the clips
    pub fn iter(&self) -> impl Iterator<Item = &MediaClipSpec> {
        self.items.iter()
    }
}

impl From<Vec<MediaClipSpec>> for Playlist {
    fn from(items: Vec<MediaClipSpec>) -> Self {
        Self::new(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let playlist = Playlist::from_json(r#"[{ "type": "video", "src": "video.mp4" }]"#).unwrap();
        assert_eq!(playlist.get(0), Some(&MediaClipSpec::video("video.mp4")));
        let clip = playlist.get(0).unwrap();
        assert_eq!(clip.start_time, 0.0);
        assert_eq!(clip.object_fit, ObjectFit::Contain);
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(Playlist::from_json(r#"[{ "type": "image" }]"#).is_err());
        assert!(Playlist::from_json(r#"[{ "type": "audio", "src": "a.mp3" }]"#).is_err());
        assert!(Playlist::from_json(r#"[{ "type": "image", "src": "a.png", "bogus": 1 }]"#).is_err());
    }

    #[test]
    fn test_parses_animations_and_transition() {
        let json = r#"[
            {
                "type": "image",
                "src": "a.png",
                "endTime": 4000,
                "objectFit": "scale-down",
                "transform": {
                    "startOffset": 1000,
                    "keyframes": [{ "translateY": 0 }, { "translateY": 1, "scale": 2 }]
                },
                "animations": [
                    { "keyframes": [{ "opacity": 0 }, { "opacity": 1 }], "iterations": 2 }
                ],
                "transition": { "overlap": 500, "name": "crossFade" }
            },
            { "type": "video", "src": "b.mp4", "startTime": 100 }
        ]"#;
        let playlist = Playlist::from_json(json).unwrap();
        assert_eq!(playlist.len(), 2);
        let clip = playlist.get(0).unwrap();
        assert_eq!(clip.object_fit, ObjectFit::ScaleDown);
        assert_eq!(clip.overlap(), 500.0);
        assert_eq!(clip.animations[0].iterations, 2.0);

        let keyframes = clip.transform.as_ref().unwrap().keyframes();
        assert_eq!(keyframes[0].offset, 0.0);
        assert_eq!(keyframes[1].offset, 1.0);
        assert_eq!(keyframes[1].properties.get("scale"), Some(&2.0));

        playlist.validate(&TransitionRegistry::with_builtins()).unwrap();
    }

    #[test]
    fn test_ron_playlist() {
        let playlist = Playlist::new(vec![
            MediaClipSpec::image("a.png").with_times(0.0, Some(2000.0)),
            MediaClipSpec::video("b.mp4")
                .with_transform(TransformSpec {
                    start_offset: None,
                    end_offset: Some(-500.0),
                    keyframes: vec![
                        TransformKeyframe {
                            scale: Some(1.0),
                            ..Default::default()
                        },
                        TransformKeyframe {
                            scale: Some(1.5),
                            ..Default::default()
                        },
                    ],
                })
                .with_transition(TransitionSpec::preset("wipeLeft", 250.0)),
        ]);
        let text = ron::to_string(&playlist).unwrap();
        assert_eq!(Playlist::from_ron(&text).unwrap(), playlist);
        assert!(Playlist::from_ron("[(type: image)]").is_err());
    }

    #[test]
    fn test_validation() {
        let registry = TransitionRegistry::with_builtins();
        let check = |clip: MediaClipSpec| Playlist::new(vec![clip]).validate(&registry);

        assert!(matches!(
            check(MediaClipSpec::video("")),
            Err(ValidationError::EmptySource { index: 0 })
        ));
        assert!(matches!(
            check(MediaClipSpec::video("a.mp4").with_times(-1.0, None)),
            Err(ValidationError::InvalidStartTime { .. })
        ));
        assert!(matches!(
            check(MediaClipSpec::video("a.mp4").with_times(500.0, Some(500.0))),
            Err(ValidationError::InvalidEndTime { .. })
        ));
        assert!(matches!(
            check(MediaClipSpec::video("a.mp4").with_transition(TransitionSpec::preset("crossFade", 0.0))),
            Err(ValidationError::InvalidOverlap { .. })
        ));
        assert!(matches!(
            check(MediaClipSpec::video("a.mp4").with_transition(TransitionSpec::preset("nope", 100.0))),
            Err(ValidationError::UnknownTransition { .. })
        ));
        assert!(matches!(
            check(MediaClipSpec::video("a.mp4").with_animation(
                AnimationSpec::new(vec![Keyframe::new(0.5), Keyframe::new(0.5)])
            )),
            Err(ValidationError::Keyframes {
                source: TimelineError::DuplicateOffset(_),
                ..
            })
        ));
        assert!(matches!(
            check(MediaClipSpec::video("a.mp4").with_animation(
                AnimationSpec::new(vec![Keyframe::new(0.0)]).with_iterations(0.0)
            )),
            Err(ValidationError::InvalidIterations { .. })
        ));
    }

    #[test]
    fn test_resolve_transition() {
        let registry = TransitionRegistry::with_builtins();
        let fade = TransitionSpec::preset("crossFade", 300.0).resolve(&registry).unwrap();
        assert_eq!(fade.overlap, 300.0);
        assert!(!fade.source.is_empty());
        assert!(!fade.dest.is_empty());

        let custom_dest = AnimationSet::from(vec![AnimationSpec::new(vec![
            Keyframe::new(0.0).with("opacity", 0.0),
            Keyframe::new(1.0).with("opacity", 1.0),
        ])]);
        let mixed = TransitionSpec {
            dest: custom_dest.clone(),
            ..TransitionSpec::preset("crossFade", 300.0)
        }
        .resolve(&registry)
        .unwrap();
        assert_eq!(mixed.dest, custom_dest);

        let empty = TransitionSpec::custom(300.0, AnimationSet::default(), AnimationSet::default());
        assert!(empty.resolve(&registry).is_none());
    }

    #[test]
    fn test_parses_timing_options() {
        let json = r#"[{
            "type": "image",
            "src": "a.png",
            "transform": {
                "keyframes": [{ "scale": 1, "easing": "ease-out" }, { "scale": 2 }]
            },
            "animations": [{
                "keyframes": [
                    { "opacity": 0, "easing": "steps(4, jump-start)", "composite": "add" },
                    { "opacity": 1 }
                ],
                "easing": "ease-in-out",
                "fill": "both",
                "composite": "replace",
                "iterationComposite": "accumulate"
            }]
        }]"#;
        let playlist = Playlist::from_json(json).unwrap();
        let clip = playlist.get(0).unwrap();

        let animation = &clip.animations[0];
        assert_eq!(animation.easing, Easing::EaseInOut);
        assert_eq!(animation.fill, FillMode::Both);
        assert_eq!(animation.composite, Some(CompositeOperation::Replace));
        assert_eq!(animation.iteration_composite, IterationComposite::Accumulate);
        assert_eq!(
            animation.keyframes[0].easing,
            "steps(4, jump-start)".parse::<Easing>().unwrap()
        );
        assert_eq!(animation.keyframes[0].properties.get("opacity"), Some(&0.0));
        assert!(!animation.keyframes[0].properties.contains_key("composite"));

        let transform = clip.transform.as_ref().unwrap();
        assert_eq!(transform.keyframes()[0].easing, Easing::EaseOut);
        assert_eq!(transform.to_animation().fill, FillMode::Forwards);

        playlist.validate(&TransitionRegistry::with_builtins()).unwrap();
        assert!(Playlist::from_json(
            r#"[{ "type": "image", "src": "a.png", "animations": [{ "keyframes": [], "easing": "wobbly" }] }]"#
        )
        .is_err());
    }

    #[test]
    fn test_empty_transition_has_no_overlap() {
        let registry = TransitionRegistry::with_builtins();
        let empty = MediaClipSpec::image("a.png").with_transition(TransitionSpec::custom(
            500.0,
            AnimationSet::default(),
            AnimationSet::default(),
        ));
        assert_eq!(empty.overlap(), 0.0);
        assert_eq!(empty.clone().without_empty_transition(&registry).transition, None);

        let fade = MediaClipSpec::image("a.png").with_transition(TransitionSpec::preset("crossFade", 500.0));
        assert_eq!(fade.overlap(), 500.0);
        assert_eq!(fade.clone().without_empty_transition(&registry), fade);

        let unknown = MediaClipSpec::image("a.png").with_transition(TransitionSpec::preset("nope", 500.0));
        assert_eq!(unknown.without_empty_transition(&registry).overlap(), 0.0);
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0
//! Keyframe definitions for property animations.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Named numeric properties, in first-seen order
pub type PropertyMap = IndexMap<String, f64>;

/// A keyframe in an animation.
///
/// `offset` is a normalized position in `[0, 1]` within one iteration of the
/// animation. `properties` may be partial; [`crate::Timeline`] fills the gaps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    /// Normalized position
    pub offset: f64,
    /// Property values defined at this keyframe
    pub properties: PropertyMap,
    /// Timing of the segment towards the next keyframe
    #[serde(default, skip_serializing_if = "Easing::is_linear")]
    pub easing: Easing,
}

impl Keyframe {
    /// Create an empty keyframe
    pub fn new(offset: f64) -> Self {
        Self {
            offset,
            properties: PropertyMap::new(),
            easing: Easing::Linear,
        }
    }

    /// Set the easing of the segment starting here
    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Set a property value
    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.properties.insert(name.into(), value);
        self
    }

    /// Whether this keyframe defines `name`
    pub fn defines(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }
}

/// Interpolation utilities
pub struct Interpolation;

impl Interpolation {
    /// Interpolate from `a` (defined at `t0`) towards `b` at time `t`.
    ///
    /// The distance from `t0` is used as-is, without normalizing by the
    /// span to the next keyframe.
    pub fn lerp(a: f64, b: f64, t0: f64, t: f64) -> f64 {
        a + (t - t0) * (b - a)
    }

    /// Cubic bezier interpolation
    pub fn bezier(p0: f64, p1: f64, p2: f64, p3: f64, t: f64) -> f64 {
        let t2 = t * t;
        let t3 = t2 * t;
        let mt = 1.0 - t;
        let mt2 = mt * mt;
        let mt3 = mt2 * mt;

        p0 * mt3 + 3.0 * p1 * mt2 * t + 3.0 * p2 * mt * t2 + p3 * t3
    }

    /// Evaluate the CSS timing curve through `(x1, y1)` and `(x2, y2)` at
    /// input progress `x`
    pub fn cubic_bezier(x1: f64, y1: f64, x2: f64, y2: f64, x: f64) -> f64 {
        if x <= 0.0 {
            return 0.0;
        }
        if x >= 1.0 {
            return 1.0;
        }

        let curve_x = |s: f64| Self::bezier(0.0, x1, x2, 1.0, s);
        let slope_x = |s: f64| {
            let ms = 1.0 - s;
            3.0 * ms * ms * x1 + 6.0 * ms * s * (x2 - x1) + 3.0 * s * s * (1.0 - x2)
        };

        // Newton first, bisection when the slope flattens out
        let mut s = x;
        for _ in 0..8 {
            let error = curve_x(s) - x;
            if error.abs() < 1e-7 {
                return Self::bezier(0.0, y1, y2, 1.0, s);
            }
            let slope = slope_x(s);
            if slope.abs() < 1e-6 {
                break;
            }
            s -= error / slope;
        }

        let (mut lo, mut hi) = (0.0, 1.0);
        s = x;
        for _ in 0..64 {
            let value = curve_x(s);
            if (value - x).abs() < 1e-7 {
                break;
            }
            if value < x {
                lo = s;
            } else {
                hi = s;
            }
            s = (lo + hi) / 2.0;
        }
        Self::bezier(0.0, y1, y2, 1.0, s)
    }
}

/// Where the jumps of a `steps()` easing happen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StepPosition {
    /// Jump at the start of each step
    JumpStart,
    /// Jump at the end of each step
    #[default]
    JumpEnd,
    /// No jump at either end
    JumpNone,
    /// Jump at both ends
    JumpBoth,
}

impl StepPosition {
    /// CSS keyword
    pub fn name(&self) -> &'static str {
        match self {
            Self::JumpStart => "jump-start",
            Self::JumpEnd => "jump-end",
            Self::JumpNone => "jump-none",
            Self::JumpBoth => "jump-both",
        }
    }
}

/// Timing function shaping progress, written as a CSS easing string
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Easing {
    /// Progress unchanged
    #[default]
    Linear,
    /// `cubic-bezier(0.25, 0.1, 0.25, 1)`
    Ease,
    /// `cubic-bezier(0.42, 0, 1, 1)`
    EaseIn,
    /// `cubic-bezier(0, 0, 0.58, 1)`
    EaseOut,
    /// `cubic-bezier(0.42, 0, 0.58, 1)`
    EaseInOut,
    /// Custom curve through `(x1, y1)` and `(x2, y2)`
    CubicBezier(f64, f64, f64, f64),
    /// Stepped progress
    Steps(u32, StepPosition),
}

impl Easing {
    /// Whether progress passes through unchanged
    pub fn is_linear(&self) -> bool {
        matches!(self, Self::Linear)
    }

    /// Eased progress for input progress `p`
    pub fn apply(&self, p: f64) -> f64 {
        match *self {
            Self::Linear => p,
            Self::Ease => Interpolation::cubic_bezier(0.25, 0.1, 0.25, 1.0, p),
            Self::EaseIn => Interpolation::cubic_bezier(0.42, 0.0, 1.0, 1.0, p),
            Self::EaseOut => Interpolation::cubic_bezier(0.0, 0.0, 0.58, 1.0, p),
            Self::EaseInOut => Interpolation::cubic_bezier(0.42, 0.0, 0.58, 1.0, p),
            Self::CubicBezier(x1, y1, x2, y2) => Interpolation::cubic_bezier(x1, y1, x2, y2, p),
            Self::Steps(count, position) => steps(count, position, p),
        }
    }

    /// Ease time `t` inside the segment `[t0, t1]`, keeping it in the
    /// segment's time scale
    pub fn ease_between(&self, t0: f64, t1: f64, t: f64) -> f64 {
        let span = t1 - t0;
        if self.is_linear() || span <= 0.0 {
            return t;
        }
        t0 + self.apply((t - t0) / span) * span
    }
}

fn steps(count: u32, position: StepPosition, p: f64) -> f64 {
    let count = f64::from(count.max(1));
    let mut step = (p * count).floor();
    if matches!(position, StepPosition::JumpStart | StepPosition::JumpBoth) {
        step += 1.0;
    }
    if p >= 0.0 && step < 0.0 {
        step = 0.0;
    }
    let jumps = match position {
        StepPosition::JumpBoth => count + 1.0,
        StepPosition::JumpNone => (count - 1.0).max(1.0),
        StepPosition::JumpStart | StepPosition::JumpEnd => count,
    };
    if p <= 1.0 && step > jumps {
        step = jumps;
    }
    step / jumps
}

fn number(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|v| v.is_finite())
}

impl FromStr for Easing {
    type Err = String;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let text = text.trim();
        let keyword = match text {
            "linear" => Some(Self::Linear),
            "ease" => Some(Self::Ease),
            "ease-in" => Some(Self::EaseIn),
            "ease-out" => Some(Self::EaseOut),
            "ease-in-out" => Some(Self::EaseInOut),
            "step-start" => Some(Self::Steps(1, StepPosition::JumpStart)),
            "step-end" => Some(Self::Steps(1, StepPosition::JumpEnd)),
            _ => None,
        };
        if let Some(easing) = keyword {
            return Ok(easing);
        }

        let invalid = || format!("invalid easing '{text}'");
        let (function, args) = text
            .strip_suffix(')')
            .and_then(|rest| rest.split_once('('))
            .ok_or_else(invalid)?;
        let args: Vec<&str> = args.split(',').map(str::trim).collect();

        match (function.trim(), args.as_slice()) {
            ("cubic-bezier", [x1, y1, x2, y2]) => {
                match (number(x1), number(y1), number(x2), number(y2)) {
                    (Some(x1), Some(y1), Some(x2), Some(y2))
                        if (0.0..=1.0).contains(&x1) && (0.0..=1.0).contains(&x2) =>
                    {
                        Ok(Self::CubicBezier(x1, y1, x2, y2))
                    }
                    _ => Err(invalid()),
                }
            }
            ("steps", [count, rest @ ..]) if rest.len() <= 1 => {
                let count: u32 = count.parse().map_err(|_| invalid())?;
                let position = match rest.first().copied() {
                    None | Some("end" | "jump-end") => StepPosition::JumpEnd,
                    Some("start" | "jump-start") => StepPosition::JumpStart,
                    Some("jump-none") => StepPosition::JumpNone,
                    Some("jump-both") => StepPosition::JumpBoth,
                    Some(_) => return Err(invalid()),
                };
                let minimum = if position == StepPosition::JumpNone { 2 } else { 1 };
                if count < minimum {
                    return Err(invalid());
                }
                Ok(Self::Steps(count, position))
            }
            _ => Err(invalid()),
        }
    }
}

impl TryFrom<String> for Easing {
    type Error = String;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        text.parse()
    }
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linear => f.write_str("linear"),
            Self::Ease => f.write_str("ease"),
            Self::EaseIn => f.write_str("ease-in"),
            Self::EaseOut => f.write_str("ease-out"),
            Self::EaseInOut => f.write_str("ease-in-out"),
            Self::CubicBezier(x1, y1, x2, y2) => write!(f, "cubic-bezier({x1}, {y1}, {x2}, {y2})"),
            Self::Steps(count, position) => write!(f, "steps({count}, {})", position.name()),
        }
    }
}

impl From<Easing> for String {
    fn from(easing: Easing) -> Self {
        easing.to_string()
    }
}

/// Resolve optional keyframe offsets.
///
/// A missing first offset becomes 0 and a missing last offset becomes 1 (a
/// lone keyframe becomes 1). Runs of missing offsets in between are spaced
/// evenly between the defined offsets around them.
pub fn distribute_offsets(offsets: &[Option<f64>]) -> Vec<f64> {
    let len = offsets.len();
    let mut resolved: Vec<Option<f64>> = offsets.to_vec();
    match len {
        0 => return Vec::new(),
        1 => return vec![resolved[0].unwrap_or(1.0)],
        _ => {}
    }
    if resolved[0].is_none() {
        resolved[0] = Some(0.0);
    }
    if resolved[len - 1].is_none() {
        resolved[len - 1] = Some(1.0);
    }

    let mut start = 0;
    while start < len - 1 {
        let Some(end) = (start + 1..len).find(|&i| resolved[i].is_some()) else {
            break;
        };
        if let (Some(a), Some(b)) = (resolved[start], resolved[end]) {
            let gaps = (end - start) as f64;
            for i in start + 1..end {
                resolved[i] = Some(a + (b - a) * (i - start) as f64 / gaps);
            }
        }
        start = end;
    }

    resolved.into_iter().map(|o| o.unwrap_or(0.0)).collect()
}

//! Easing curves for position transitions
//!
//! The named curves are the CSS timing functions, evaluated as cubic Bézier
//! curves through `(0, 0)`, `(x1, y1)`, `(x2, y2)` and `(1, 1)`.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Easing function type
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Easing {
    Linear,
    Ease,
    EaseIn,
    EaseOut,
    #[default]
    EaseInOut,
}

impl Easing {
    /// Control points `(x1, y1, x2, y2)` of the curve
    fn control_points(self) -> Option<(f64, f64, f64, f64)> {
        match self {
            Easing::Linear => None,
            Easing::Ease => Some((0.25, 0.1, 0.25, 1.0)),
            Easing::EaseIn => Some((0.42, 0.0, 1.0, 1.0)),
            Easing::EaseOut => Some((0.0, 0.0, 0.58, 1.0)),
            Easing::EaseInOut => Some((0.42, 0.0, 0.58, 1.0)),
        }
    }

    /// Maps linear progress `t` to eased progress; both in `[0, 1]`
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self.control_points() {
            None => t,
            Some((x1, y1, x2, y2)) => cubic_bezier(x1, y1, x2, y2, t),
        }
    }

    /// CSS name of the curve
    pub fn css_name(self) -> &'static str {
        match self {
            Easing::Linear => "linear",
            Easing::Ease => "ease",
            Easing::EaseIn => "ease-in",
            Easing::EaseOut => "ease-out",
            Easing::EaseInOut => "ease-in-out",
        }
    }
}

/// One coordinate of a cubic Bézier whose end points are 0 and 1
#[inline]
fn bezier_coord(p1: f64, p2: f64, s: f64) -> f64 {
    let inv = 1.0 - s;
    3.0 * inv * inv * s * p1 + 3.0 * inv * s * s * p2 + s * s * s
}

#[inline]
fn bezier_slope(p1: f64, p2: f64, s: f64) -> f64 {
    let inv = 1.0 - s;
    3.0 * inv * inv * p1 + 6.0 * inv * s * (p2 - p1) + 3.0 * s * s * (1.0 - p2)
}

/// Solves the curve for `x` and returns the matching `y`
fn cubic_bezier(x1: f64, y1: f64, x2: f64, y2: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }

    // Newton's method, falling back to bisection when the slope flattens out
    let mut s = x;
    for _ in 0..8 {
        let err = bezier_coord(x1, x2, s) - x;
        if err.abs() < 1e-7 {
            return bezier_coord(y1, y2, s);
        }
        let slope = bezier_slope(x1, x2, s);
        if slope.abs() < 1e-6 {
            break;
        }
        s -= err / slope;
    }

    let (mut lo, mut hi) = (0.0, 1.0);
    s = x;
    for _ in 0..64 {
        let value = bezier_coord(x1, x2, s);
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

    bezier_coord(y1, y2, s)
}

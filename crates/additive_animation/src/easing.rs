//! Easing functions for animations
//!
//! Curves are evaluated against the *remaining* fraction of an animation: a
//! freshly started record sees `t = 1.0` and an expired one `t = 0.0`. Every
//! built-in curve satisfies `f(0) = 0` and `f(1) = 1`.

use crate::error::AnimationError;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// A resolved easing curve, shared between records
pub type EasingFn = Arc<dyn Fn(f64) -> f64 + Send + Sync>;

/// Built-in easing curves
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Easing {
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
    EaseInQuad,
    EaseOutQuad,
    #[default]
    EaseInOutQuad,
    EaseInCubic,
    EaseOutCubic,
    EaseInOutCubic,
    EaseInQuart,
    EaseOutQuart,
    EaseInOutQuart,
    EaseInQuint,
    EaseOutQuint,
    EaseInOutQuint,
    CubicBezier(f64, f64, f64, f64),
}

impl Easing {
    /// Every named curve, in lookup order
    pub const NAMED: [Easing; 16] = [
        Easing::Linear,
        Easing::EaseIn,
        Easing::EaseOut,
        Easing::EaseInOut,
        Easing::EaseInQuad,
        Easing::EaseOutQuad,
        Easing::EaseInOutQuad,
        Easing::EaseInCubic,
        Easing::EaseOutCubic,
        Easing::EaseInOutCubic,
        Easing::EaseInQuart,
        Easing::EaseOutQuart,
        Easing::EaseInOutQuart,
        Easing::EaseInQuint,
        Easing::EaseOutQuint,
        Easing::EaseInOutQuint,
    ];

    /// Apply the easing function to a fraction (nominally 0.0 to 1.0)
    pub fn apply(&self, t: f64) -> f64 {
        match self {
            Easing::Linear => t,
            Easing::EaseIn | Easing::EaseInCubic => t * t * t,
            Easing::EaseOut | Easing::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
            Easing::EaseInOut | Easing::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Easing::EaseInQuad => t * t,
            Easing::EaseOutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::EaseInOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Easing::EaseInQuart => t * t * t * t,
            Easing::EaseOutQuart => 1.0 - (1.0 - t).powi(4),
            Easing::EaseInOutQuart => {
                if t < 0.5 {
                    8.0 * t * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(4) / 2.0
                }
            }
            Easing::EaseInQuint => t.powi(5),
            Easing::EaseOutQuint => 1.0 - (1.0 - t).powi(5),
            Easing::EaseInOutQuint => {
                if t < 0.5 {
                    16.0 * t.powi(5)
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(5) / 2.0
                }
            }
            Easing::CubicBezier(x1, y1, x2, y2) => cubic_bezier_ease(t, *x1, *y1, *x2, *y2),
        }
    }

    /// Canonical camelCase name
    pub fn name(&self) -> &'static str {
        match self {
            Easing::Linear => "linear",
            Easing::EaseIn => "easeIn",
            Easing::EaseOut => "easeOut",
            Easing::EaseInOut => "easeInOut",
            Easing::EaseInQuad => "easeInQuad",
            Easing::EaseOutQuad => "easeOutQuad",
            Easing::EaseInOutQuad => "easeInOutQuad",
            Easing::EaseInCubic => "easeInCubic",
            Easing::EaseOutCubic => "easeOutCubic",
            Easing::EaseInOutCubic => "easeInOutCubic",
            Easing::EaseInQuart => "easeInQuart",
            Easing::EaseOutQuart => "easeOutQuart",
            Easing::EaseInOutQuart => "easeInOutQuart",
            Easing::EaseInQuint => "easeInQuint",
            Easing::EaseOutQuint => "easeOutQuint",
            Easing::EaseInOutQuint => "easeInOutQuint",
            Easing::CubicBezier(..) => "cubicBezier",
        }
    }

    /// Wrap into a shareable function value
    pub fn to_fn(self) -> EasingFn {
        Arc::new(move |t| self.apply(t))
    }
}

impl FromStr for Easing {
    type Err = AnimationError;

    /// Parse `easeInOutQuad`, `ease_in_out_quad` or `ease-in-out-quad`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_name(s);
        Easing::NAMED
            .into_iter()
            .find(|easing| normalize_name(easing.name()) == wanted)
            .ok_or_else(|| AnimationError::UnknownEasing(s.to_string()))
    }
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_' && *c != '-')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// How a caller selects the easing for one `animate` call
#[derive(Clone, Default)]
pub enum EasingRef {
    /// No easing given: use [`Easing::default`]
    #[default]
    Default,
    /// Look a curve up by name, falling back to the default when unknown
    Named(String),
    /// A built-in curve
    Curve(Easing),
    /// A caller-supplied function
    Custom(EasingFn),
}

impl EasingRef {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        EasingRef::Custom(Arc::new(f))
    }

    /// Resolve into a concrete function
    ///
    /// Unknown names silently fall back to `easeInOutQuad`.
    pub fn resolve(&self) -> EasingFn {
        match self {
            EasingRef::Default => Easing::default().to_fn(),
            EasingRef::Named(name) => match name.parse::<Easing>() {
                Ok(easing) => easing.to_fn(),
                Err(_) => {
                    tracing::warn!(
                        "Unknown easing `{}`, falling back to {}",
                        name,
                        Easing::default()
                    );
                    Easing::default().to_fn()
                }
            },
            EasingRef::Curve(easing) => easing.to_fn(),
            EasingRef::Custom(f) => Arc::clone(f),
        }
    }
}

impl fmt::Debug for EasingRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EasingRef::Default => f.write_str("Default"),
            EasingRef::Named(name) => f.debug_tuple("Named").field(name).finish(),
            EasingRef::Curve(easing) => f.debug_tuple("Curve").field(easing).finish(),
            EasingRef::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl From<Easing> for EasingRef {
    fn from(easing: Easing) -> Self {
        EasingRef::Curve(easing)
    }
}

impl From<&str> for EasingRef {
    fn from(name: &str) -> Self {
        EasingRef::Named(name.to_string())
    }
}

impl From<String> for EasingRef {
    fn from(name: String) -> Self {
        EasingRef::Named(name)
    }
}

impl From<Option<Easing>> for EasingRef {
    fn from(easing: Option<Easing>) -> Self {
        easing.map_or(EasingRef::Default, EasingRef::Curve)
    }
}

/// Cubic bezier easing calculation (matches CSS spec / browser implementations).
///
/// Uses Newton-Raphson with binary-search fallback for robustness.
fn cubic_bezier_ease(t: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    // Endpoints are always exact
    if t <= 0.0 {
        return 0.0;
    }
    if t >= 1.0 {
        return 1.0;
    }

    // Solve for parameter `p` where bezier_x(p) == t, falling back to
    // binary search if the slope is too flat.
    let mut p = t;
    for _ in 0..8 {
        let err = bezier_sample(p, x1, x2) - t;
        if err.abs() < 1e-7 {
            return bezier_sample(p, y1, y2);
        }
        let slope = bezier_slope(p, x1, x2);
        if slope.abs() < 1e-7 {
            break;
        }
        p -= err / slope;
    }

    let mut lo = 0.0_f64;
    let mut hi = 1.0_f64;
    p = t;
    for _ in 0..20 {
        let val = bezier_sample(p, x1, x2);
        if (val - t).abs() < 1e-7 {
            break;
        }
        if val < t {
            lo = p;
        } else {
            hi = p;
        }
        p = (lo + hi) * 0.5;
    }

    bezier_sample(p, y1, y2)
}

/// Evaluate cubic bezier at parameter t: B(t) = 3(1-t)²t·p1 + 3(1-t)t²·p2 + t³
#[inline]
fn bezier_sample(t: f64, p1: f64, p2: f64) -> f64 {
    let a = 1.0 - 3.0 * p2 + 3.0 * p1;
    let b = 3.0 * p2 - 6.0 * p1;
    let c = 3.0 * p1;
    ((a * t + b) * t + c) * t
}

/// Derivative of cubic bezier: B'(t) = 3(1-t)²·p1 + 6(1-t)t·(p2-p1) + 3t²·(1-p2)
#[inline]
fn bezier_slope(t: f64, p1: f64, p2: f64) -> f64 {
    let a = 1.0 - 3.0 * p2 + 3.0 * p1;
    let b = 3.0 * p2 - 6.0 * p1;
    let c = 3.0 * p1;
    (3.0 * a * t + 2.0 * b) * t + c
}

//! Settings → preview transform mapping.
//!
//! The preview renderer composes five scalar filter passes in a fixed order
//! (hue-rotate and sepia do not commute) and blends a separate colour layer
//! for tint. [`map_to_transform`] is a pure function of the vector; rounding
//! happens only when rendering strings, never in the stored values.

use serde::Serialize;

use crate::settings::AdjustmentVector;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Brightness lost at `blackPoint = 100`.
pub const BLACK_POINT_BRIGHTNESS_SCALE: f64 = 0.3;

/// Sepia amount at `warmth = 100`.
pub const WARMTH_SEPIA_SCALE: f64 = 0.4;

/// Hue shift in degrees at `warmth = -100` (applied with the sign of warmth).
pub const WARMTH_HUE_SCALE_DEG: f64 = 30.0;

/// Overlay alpha at `|tint| = 180`.
pub const TINT_MAX_ALPHA: f64 = 0.25;

/// Overlay colour for positive tint.
pub const MAGENTA: [u8; 3] = [255, 0, 255];

/// Overlay colour for negative tint.
pub const GREEN: [u8; 3] = [0, 255, 0];

/// Decimal places used when rendering the four scalar ops.
pub const SCALAR_DISPLAY_PLACES: usize = 3;

/// Decimal places used when rendering hue degrees.
pub const HUE_DISPLAY_PLACES: usize = 1;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One primitive filter pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "op", content = "value", rename_all = "kebab-case")]
pub enum TransformOp {
    Brightness(f64),
    Contrast(f64),
    Saturate(f64),
    Sepia(f64),
    HueRotate(f64),
}

impl TransformOp {
    /// CSS filter function for this pass, e.g. `sepia(0.200)`.
    pub fn css(&self) -> String {
        match *self {
            Self::Brightness(v) => format!("brightness({})", fixed(v, SCALAR_DISPLAY_PLACES)),
            Self::Contrast(v) => format!("contrast({})", fixed(v, SCALAR_DISPLAY_PLACES)),
            Self::Saturate(v) => format!("saturate({})", fixed(v, SCALAR_DISPLAY_PLACES)),
            Self::Sepia(v) => format!("sepia({})", fixed(v, SCALAR_DISPLAY_PLACES)),
            Self::HueRotate(v) => format!("hue-rotate({}deg)", fixed(v, HUE_DISPLAY_PLACES)),
        }
    }
}

/// Colour layer blended over the filtered image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Overlay {
    Transparent,
    Color { rgb: [u8; 3], alpha: f64 },
}

impl Overlay {
    /// CSS colour value, `transparent` or `rgba(r, g, b, a)`.
    pub fn css(&self) -> String {
        match *self {
            Self::Transparent => "transparent".to_string(),
            Self::Color { rgb: [r, g, b], alpha } => format!("rgba({r}, {g}, {b}, {alpha})"),
        }
    }
}

/// Full preview transform for one vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Transform {
    pub brightness: f64,
    pub contrast: f64,
    pub saturate: f64,
    pub sepia: f64,
    pub hue_rotate_deg: f64,
    pub overlay: Overlay,
}

impl Transform {
    /// The five scalar passes in application order.
    pub fn ops(&self) -> [TransformOp; 5] {
        [
            TransformOp::Brightness(self.brightness),
            TransformOp::Contrast(self.contrast),
            TransformOp::Saturate(self.saturate),
            TransformOp::Sepia(self.sepia),
            TransformOp::HueRotate(self.hue_rotate_deg),
        ]
    }

    /// Space-separated CSS `filter` value.
    pub fn filter_string(&self) -> String {
        self.ops()
            .iter()
            .map(TransformOp::css)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

// ---------------------------------------------------------------------------
// Mapping
// ---------------------------------------------------------------------------

/// Map an adjustment vector to its preview transform.
///
/// Warmth has two mutually exclusive branches: positive warmth becomes
/// sepia, negative warmth becomes a small negative hue shift. Black point is
/// folded into brightness.
pub fn map_to_transform(vector: &AdjustmentVector) -> Transform {
    let black_point_factor = 1.0 - (vector.black_point / 100.0) * BLACK_POINT_BRIGHTNESS_SCALE;

    let sepia = if vector.warmth > 0.0 {
        (vector.warmth / 100.0) * WARMTH_SEPIA_SCALE
    } else {
        0.0
    };

    let warmth_hue = if vector.warmth < 0.0 {
        (vector.warmth / 100.0) * WARMTH_HUE_SCALE_DEG
    } else {
        0.0
    };

    Transform {
        brightness: vector.brightness * black_point_factor,
        contrast: vector.contrast,
        saturate: vector.saturation,
        sepia,
        hue_rotate_deg: vector.hue + warmth_hue,
        overlay: tint_overlay(vector.tint),
    }
}

/// Overlay for a tint value: magenta above zero, green below.
pub fn tint_overlay(tint: f64) -> Overlay {
    if tint == 0.0 {
        return Overlay::Transparent;
    }
    let alpha = (tint.abs() / 180.0) * TINT_MAX_ALPHA;
    let rgb = if tint > 0.0 { MAGENTA } else { GREEN };
    Overlay::Color { rgb, alpha }
}

/// Render `value` with exactly `places` decimals, rounding the exact binary
/// value to nearest with ties going away from zero (the `toFixed` rule used
/// by browser-side previews). Negative zero renders as zero.
fn fixed(value: f64, places: usize) -> String {
    let value = if value == 0.0 { 0.0 } else { value };
    if !is_exact_tie(value.abs(), places) {
        // std rounds the exact decimal expansion; only exact ties differ.
        return format!("{value:.places$}");
    }
    let sign = if value < 0.0 { "-" } else { "" };
    let away = value.abs() + 0.5 / 10f64.powi(places as i32);
    format!("{sign}{away:.places$}")
}

/// Digits needed to print any finite `f64` exactly.
const EXACT_DIGITS: usize = 1074;

/// True when `abs` lies exactly halfway between two `places`-decimal values.
fn is_exact_tie(abs: f64, places: usize) -> bool {
    let scaled = abs * 10f64.powi(places as i32);
    if (scaled.fract() - 0.5).abs() > 1e-6 {
        return false;
    }
    let exact = format!("{abs:.EXACT_DIGITS$}");
    let Some((_, fraction)) = exact.split_once('.') else {
        return false;
    };
    match fraction.as_bytes().get(places..) {
        Some([b'5', rest @ ..]) => rest.iter().all(|&b| b == b'0'),
        _ => false,
    }
}

//! Adjustment vectors: the field set, its bounds, and the default template.
//!
//! [`AdjustmentVector`] is always complete (every field has a value).
//! [`PartialAdjustmentVector`] carries an explicit `Option` per field; a
//! `Some` slot is "present" and wins over inheritance even when it holds the
//! default value, a `None` slot inherits. Serialized overrides never contain
//! `null` keys: absent slots are skipped on write and `null` reads back as
//! absent.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Fields
// ---------------------------------------------------------------------------

/// One named adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AdjustmentField {
    Brightness,
    Contrast,
    Saturation,
    Tint,
    Warmth,
    Hue,
    BlackPoint,
}

/// Every field, in canonical order.
pub const ALL_FIELDS: [AdjustmentField; 7] = [
    AdjustmentField::Brightness,
    AdjustmentField::Contrast,
    AdjustmentField::Saturation,
    AdjustmentField::Tint,
    AdjustmentField::Warmth,
    AdjustmentField::Hue,
    AdjustmentField::BlackPoint,
];

/// Inclusive numeric range of a field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldBounds {
    pub min: f64,
    pub max: f64,
}

impl FieldBounds {
    pub fn contains(self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn clamp(self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

impl AdjustmentField {
    /// Key used in stored JSON and on the wire.
    pub fn key(self) -> &'static str {
        match self {
            Self::Brightness => "brightness",
            Self::Contrast => "contrast",
            Self::Saturation => "saturation",
            Self::Tint => "tint",
            Self::Warmth => "warmth",
            Self::Hue => "hue",
            Self::BlackPoint => "blackPoint",
        }
    }

    /// Parse a stored/wire key.
    pub fn from_key(key: &str) -> Option<Self> {
        ALL_FIELDS.into_iter().find(|f| f.key() == key)
    }

    pub fn bounds(self) -> FieldBounds {
        let (min, max) = match self {
            Self::Brightness => (0.5, 2.0),
            Self::Contrast => (0.5, 2.0),
            Self::Saturation => (0.0, 3.0),
            Self::Tint => (-180.0, 180.0),
            Self::Warmth => (-100.0, 100.0),
            Self::Hue => (0.0, 360.0),
            Self::BlackPoint => (0.0, 100.0),
        };
        FieldBounds { min, max }
    }

    /// Value of this field in the default template.
    pub fn default_value(self) -> f64 {
        match self {
            Self::Brightness | Self::Contrast | Self::Saturation => 1.0,
            Self::Tint | Self::Warmth | Self::Hue | Self::BlackPoint => 0.0,
        }
    }
}

impl std::fmt::Display for AdjustmentField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

// ---------------------------------------------------------------------------
// AdjustmentVector
// ---------------------------------------------------------------------------

/// A complete set of adjustments.
///
/// Deserialization requires every field; a template or an edited vector
/// with a missing field is rejected before it reaches the engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AdjustmentVector {
    pub brightness: f64,
    pub contrast: f64,
    pub saturation: f64,
    pub tint: f64,
    pub warmth: f64,
    pub hue: f64,
    pub black_point: f64,
}

impl Default for AdjustmentVector {
    fn default() -> Self {
        Self {
            brightness: AdjustmentField::Brightness.default_value(),
            contrast: AdjustmentField::Contrast.default_value(),
            saturation: AdjustmentField::Saturation.default_value(),
            tint: AdjustmentField::Tint.default_value(),
            warmth: AdjustmentField::Warmth.default_value(),
            hue: AdjustmentField::Hue.default_value(),
            black_point: AdjustmentField::BlackPoint.default_value(),
        }
    }
}

impl AdjustmentVector {
    pub fn get(&self, field: AdjustmentField) -> f64 {
        match field {
            AdjustmentField::Brightness => self.brightness,
            AdjustmentField::Contrast => self.contrast,
            AdjustmentField::Saturation => self.saturation,
            AdjustmentField::Tint => self.tint,
            AdjustmentField::Warmth => self.warmth,
            AdjustmentField::Hue => self.hue,
            AdjustmentField::BlackPoint => self.black_point,
        }
    }

    pub fn set(&mut self, field: AdjustmentField, value: f64) {
        let slot = match field {
            AdjustmentField::Brightness => &mut self.brightness,
            AdjustmentField::Contrast => &mut self.contrast,
            AdjustmentField::Saturation => &mut self.saturation,
            AdjustmentField::Tint => &mut self.tint,
            AdjustmentField::Warmth => &mut self.warmth,
            AdjustmentField::Hue => &mut self.hue,
            AdjustmentField::BlackPoint => &mut self.black_point,
        };
        *slot = value;
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, field: AdjustmentField, value: f64) -> Self {
        self.set(field, value);
        self
    }

    /// `(field, value)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (AdjustmentField, f64)> + '_ {
        ALL_FIELDS.into_iter().map(move |f| (f, self.get(f)))
    }

    /// True when every field equals the default template.
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

// ---------------------------------------------------------------------------
// PartialAdjustmentVector
// ---------------------------------------------------------------------------

/// A subset of fields: a per-image override or a diff.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PartialAdjustmentVector {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brightness: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contrast: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saturation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tint: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warmth: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hue: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub black_point: Option<f64>,
}

impl PartialAdjustmentVector {
    /// An override with no present fields (everything inherits).
    pub fn empty() -> Self {
        Self::default()
    }

    fn slot(&self, field: AdjustmentField) -> &Option<f64> {
        match field {
            AdjustmentField::Brightness => &self.brightness,
            AdjustmentField::Contrast => &self.contrast,
            AdjustmentField::Saturation => &self.saturation,
            AdjustmentField::Tint => &self.tint,
            AdjustmentField::Warmth => &self.warmth,
            AdjustmentField::Hue => &self.hue,
            AdjustmentField::BlackPoint => &self.black_point,
        }
    }

    fn slot_mut(&mut self, field: AdjustmentField) -> &mut Option<f64> {
        match field {
            AdjustmentField::Brightness => &mut self.brightness,
            AdjustmentField::Contrast => &mut self.contrast,
            AdjustmentField::Saturation => &mut self.saturation,
            AdjustmentField::Tint => &mut self.tint,
            AdjustmentField::Warmth => &mut self.warmth,
            AdjustmentField::Hue => &mut self.hue,
            AdjustmentField::BlackPoint => &mut self.black_point,
        }
    }

    /// The value of `field` if present.
    pub fn get(&self, field: AdjustmentField) -> Option<f64> {
        *self.slot(field)
    }

    pub fn contains(&self, field: AdjustmentField) -> bool {
        self.slot(field).is_some()
    }

    /// Mark `field` present with `value`.
    pub fn set(&mut self, field: AdjustmentField, value: f64) {
        *self.slot_mut(field) = Some(value);
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, field: AdjustmentField, value: f64) -> Self {
        self.set(field, value);
        self
    }

    /// Present `(field, value)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (AdjustmentField, f64)> + '_ {
        ALL_FIELDS
            .into_iter()
            .filter_map(move |f| self.get(f).map(|v| (f, v)))
    }

    /// Names of the present fields in canonical order.
    pub fn present_fields(&self) -> Vec<AdjustmentField> {
        self.iter().map(|(f, _)| f).collect()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<AdjustmentVector> for PartialAdjustmentVector {
    /// Every field present.
    fn from(vector: AdjustmentVector) -> Self {
        vector
            .iter()
            .fold(Self::empty(), |acc, (field, value)| acc.with(field, value))
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// What to do with a finite value outside its field's bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundsPolicy {
    /// Pull the value to the nearest bound.
    Clamp,
    /// Fail with [`CoreError::Validation`].
    Reject,
}

fn check_value(
    field: AdjustmentField,
    value: f64,
    policy: BoundsPolicy,
) -> Result<f64, CoreError> {
    if !value.is_finite() {
        return Err(CoreError::Validation(format!(
            "Field '{field}' must be a finite number, got {value}"
        )));
    }
    let bounds = field.bounds();
    if bounds.contains(value) {
        return Ok(value);
    }
    match policy {
        BoundsPolicy::Clamp => Ok(bounds.clamp(value)),
        BoundsPolicy::Reject => Err(CoreError::Validation(format!(
            "Field '{field}' out of range: {value} (expected {}..={})",
            bounds.min, bounds.max
        ))),
    }
}

/// Gate every complete vector passes before it reaches the engine.
///
/// Non-finite values are always rejected; out-of-range values are clamped
/// or rejected according to `policy`. Nothing is dropped silently.
pub fn clamp_or_reject(
    vector: &AdjustmentVector,
    policy: BoundsPolicy,
) -> Result<AdjustmentVector, CoreError> {
    let mut checked = *vector;
    for (field, value) in vector.iter() {
        checked.set(field, check_value(field, value, policy)?);
    }
    Ok(checked)
}

/// Same gate for overrides and diffs: only present fields are checked.
pub fn clamp_or_reject_partial(
    partial: &PartialAdjustmentVector,
    policy: BoundsPolicy,
) -> Result<PartialAdjustmentVector, CoreError> {
    let mut checked = *partial;
    for (field, value) in partial.iter() {
        checked.set(field, check_value(field, value, policy)?);
    }
    Ok(checked)
}

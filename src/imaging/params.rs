//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between configuration parsing (which reads them out of JSON
//! option bags) and the [`engine`](super::engine) (which does the actual
//! pixel work). Field names follow the camelCase keys configurations use.
//!
//! ## Types
//!
//! - [`Quality`]: lossy encoding quality (1–100). Clamped on construction.
//! - [`ResizeOptions`], [`QuantOptions`], [`RotateOptions`]: preprocess steps.
//! - [`JpegOptions`], [`PngOptions`], [`WebpOptions`], [`AvifOptions`],
//!   [`JxlOptions`]: typed views of the opaque per-codec option bags.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(75)
    }
}

impl<'de> Deserialize<'de> for Quality {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Accept fractional values from hand-written configs, then clamp
        let raw = f64::deserialize(deserializer)?;
        Ok(Quality::new(raw.round().max(0.0) as u32))
    }
}

/// Read a whole number that may arrive as a float (`40.0`, `39.6`).
///
/// Fractional values round to the nearest integer. Non-finite and
/// out-of-range values fail.
fn rounded<'de, D: Deserializer<'de>>(
    deserializer: D,
    min: f64,
    max: f64,
) -> Result<f64, D::Error> {
    let raw = f64::deserialize(deserializer)?;
    let value = raw.round();
    if !raw.is_finite() || value < min || value > max {
        return Err(D::Error::custom(format!(
            "expected a number between {min} and {max}, got {raw}"
        )));
    }
    Ok(value)
}

fn rounded_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    Ok(rounded(deserializer, 0.0, u32::MAX as f64)? as u32)
}

fn rounded_opt_u32<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<u32>, D::Error> {
    #[derive(Deserialize)]
    struct Wrapper(#[serde(deserialize_with = "rounded_u32")] u32);

    Ok(Option::<Wrapper>::deserialize(deserializer)?.map(|Wrapper(v)| v))
}

fn rounded_i32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i32, D::Error> {
    Ok(rounded(deserializer, i32::MIN as f64, i32::MAX as f64)? as i32)
}

/// Resampling filter used by resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeMethod {
    Triangle,
    Catrom,
    Mitchell,
    #[default]
    Lanczos3,
}

/// How a resize with both width and height treats the aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitMethod {
    /// Exactly the requested size.
    #[default]
    Stretch,
    /// Largest aspect-preserving size inside the requested box.
    Contain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct ResizeOptions {
    pub enabled: bool,
    #[serde(deserialize_with = "rounded_opt_u32")]
    pub width: Option<u32>,
    #[serde(deserialize_with = "rounded_opt_u32")]
    pub height: Option<u32>,
    pub method: ResizeMethod,
    pub fit_method: FitMethod,
}

impl ResizeOptions {
    pub fn validate(&self) -> Result<(), String> {
        if self.enabled && self.width.is_none() && self.height.is_none() {
            return Err("width or height is required".into());
        }
        Ok(())
    }
}

/// Palette reduction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct QuantOptions {
    pub enabled: bool,
    /// Target palette size, 2–256.
    #[serde(deserialize_with = "rounded_u32")]
    pub num_colors: u32,
    /// Dither strength, 0.0–1.0.
    pub dither: f32,
}

impl Default for QuantOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            num_colors: 255,
            dither: 1.0,
        }
    }
}

impl QuantOptions {
    pub fn validate(&self) -> Result<(), String> {
        if !(2..=256).contains(&self.num_colors) {
            return Err(format!("numColors must be 2-256, got {}", self.num_colors));
        }
        if !(0.0..=1.0).contains(&self.dither) {
            return Err(format!("dither must be 0-1, got {}", self.dither));
        }
        Ok(())
    }
}

/// Clockwise quarter-turn rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct RotateOptions {
    pub enabled: bool,
    #[serde(deserialize_with = "rounded_i32")]
    pub num_rotations: i32,
}

impl RotateOptions {
    /// Effective quarter turns, 0–3.
    pub fn quarter_turns(&self) -> u32 {
        self.num_rotations.rem_euclid(4) as u32
    }
}

// =============================================================================
// Codec options
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct JpegOptions {
    pub quality: Quality,
}

/// `level` follows oxipng's 0–6 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PngOptions {
    pub level: u8,
}

impl Default for PngOptions {
    fn default() -> Self {
        Self { level: 2 }
    }
}

/// Only lossless WebP is available; `quality` is accepted and ignored.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct WebpOptions {
    pub lossless: bool,
    pub quality: Option<f32>,
}

/// Only lossless JPEG XL is available; `quality` is accepted and ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct JxlOptions {
    pub quality: Option<Quality>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AvifOptions {
    pub quality: Quality,
    /// rav1e speed, 1 (slowest) – 10 (fastest).
    pub speed: u8,
}

impl Default for AvifOptions {
    fn default() -> Self {
        Self {
            quality: Quality::new(80),
            speed: 6,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn quality_deserializes_fractional() {
        let q: Quality = serde_json::from_value(json!(74.6)).unwrap();
        assert_eq!(q.value(), 75);
    }

    #[test]
    fn resize_parses_camel_case() {
        let r: ResizeOptions = serde_json::from_value(json!({
            "enabled": true,
            "width": 200,
            "method": "triangle",
            "fitMethod": "contain"
        }))
        .unwrap();
        assert!(r.enabled);
        assert_eq!(r.width, Some(200));
        assert_eq!(r.height, None);
        assert_eq!(r.method, ResizeMethod::Triangle);
        assert_eq!(r.fit_method, FitMethod::Contain);
    }

    #[test]
    fn resize_accepts_float_dimensions() {
        let r: ResizeOptions = serde_json::from_value(json!({
            "enabled": true,
            "width": 40.0,
            "height": 19.6
        }))
        .unwrap();
        assert_eq!(r.width, Some(40));
        assert_eq!(r.height, Some(20));

        let r: ResizeOptions = serde_json::from_value(json!({ "width": null })).unwrap();
        assert_eq!(r.width, None);
    }

    #[test]
    fn resize_rejects_negative_dimensions() {
        let r: Result<ResizeOptions, _> = serde_json::from_value(json!({ "width": -8.0 }));
        assert!(r.is_err());
        let r: Result<ResizeOptions, _> = serde_json::from_value(json!({ "height": "wide" }));
        assert!(r.is_err());
    }

    #[test]
    fn counts_accept_whole_floats() {
        let q: QuantOptions = serde_json::from_value(json!({ "numColors": 16.0 })).unwrap();
        assert_eq!(q.num_colors, 16);
        let r: RotateOptions = serde_json::from_value(json!({ "numRotations": -1.0 })).unwrap();
        assert_eq!(r.quarter_turns(), 3);
    }

    #[test]
    fn resize_rejects_unknown_fields() {
        let r: Result<ResizeOptions, _> = serde_json::from_value(json!({ "widht": 10 }));
        assert!(r.is_err());
    }

    #[test]
    fn enabled_resize_needs_a_dimension() {
        let r = ResizeOptions {
            enabled: true,
            ..Default::default()
        };
        assert!(r.validate().is_err());
        assert!(ResizeOptions::default().validate().is_ok());
    }

    #[test]
    fn quant_defaults_and_bounds() {
        let q: QuantOptions = serde_json::from_value(json!({ "enabled": true })).unwrap();
        assert_eq!(q.num_colors, 255);
        assert_eq!(q.dither, 1.0);
        assert!(q.validate().is_ok());

        let q = QuantOptions {
            num_colors: 1,
            ..Default::default()
        };
        assert!(q.validate().is_err());
    }

    #[test]
    fn rotate_turns_wrap() {
        let turns = |n| {
            RotateOptions {
                enabled: true,
                num_rotations: n,
            }
            .quarter_turns()
        };
        assert_eq!(turns(1), 1);
        assert_eq!(turns(4), 0);
        assert_eq!(turns(6), 2);
        assert_eq!(turns(-1), 3);
    }

    #[test]
    fn avif_defaults() {
        let o: AvifOptions = serde_json::from_value(json!({})).unwrap();
        assert_eq!(o.quality.value(), 80);
        assert_eq!(o.speed, 6);
    }
}
